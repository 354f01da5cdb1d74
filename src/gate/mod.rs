//! Action gate: cooldown, penalty block and funds check
//!
//! Computes the live state of each care action from wall-clock
//! timestamps. Cooldowns derive from the pet's last-action stamps;
//! penalty blocks (failed feed/play quiz) are persisted separately so
//! both survive restarts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::GameRules;
use crate::pet::Tacomon;
use crate::storage::JsonStore;
use crate::types::{ActionKind, Clock};

pub const BLOCKS_KEY: &str = "tacomon-blocks";

/// Gate state for one action. `Blocked` wins over `OnCooldown`;
/// `InsufficientFunds` is only reported when the action is otherwise
/// ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Ready,
    OnCooldown { remaining_secs: u64 },
    Blocked { remaining_secs: u64 },
    InsufficientFunds,
}

impl GateState {
    pub fn is_ready(&self) -> bool {
        matches!(self, GateState::Ready)
    }
}

/// Persisted penalty locks, one optional expiry per action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockBook {
    #[serde(default)]
    blocked_until: HashMap<ActionKind, DateTime<Utc>>,
}

impl BlockBook {
    pub fn load(store: &JsonStore) -> Self {
        store.get(BLOCKS_KEY).unwrap_or_default()
    }

    pub fn save(&self, store: &JsonStore) {
        store.put(BLOCKS_KEY, self);
    }

    pub fn block(&mut self, action: ActionKind, until: DateTime<Utc>) {
        self.blocked_until.insert(action, until);
    }

    pub fn blocked_until(&self, action: ActionKind) -> Option<DateTime<Utc>> {
        self.blocked_until.get(&action).copied()
    }
}

/// Stateless gate computation over injected time
pub struct ActionGate {
    rules: GameRules,
    clock: Arc<dyn Clock>,
}

impl ActionGate {
    pub fn new(rules: GameRules, clock: Arc<dyn Clock>) -> Self {
        Self { rules, clock }
    }

    /// Current state of `action` for this pet and balance
    pub fn state(
        &self,
        action: ActionKind,
        pet: &Tacomon,
        blocks: &BlockBook,
        balance: u32,
    ) -> GateState {
        let now = self.clock.now();

        if let Some(until) = blocks.blocked_until(action) {
            if until > now {
                return GateState::Blocked {
                    remaining_secs: remaining(now, until),
                };
            }
        }

        if let Some(last) = pet.last_action(action.stat()) {
            let ready_at = last + Duration::seconds(self.rules.cooldown_secs as i64);
            if ready_at > now {
                return GateState::OnCooldown {
                    remaining_secs: remaining(now, ready_at),
                };
            }
        }

        if action.has_cost() && balance < self.rules.action_cost {
            return GateState::InsufficientFunds;
        }

        GateState::Ready
    }

    /// Record the penalty lock after a failed quiz. No-op for chat,
    /// which never blocks.
    pub fn record_block(&self, action: ActionKind, blocks: &mut BlockBook, store: &JsonStore) {
        if !action.blockable() {
            return;
        }
        let until = self.clock.now() + Duration::seconds(self.rules.block_secs as i64);
        blocks.block(action, until);
        blocks.save(store);
    }
}

fn remaining(now: DateTime<Utc>, until: DateTime<Utc>) -> u64 {
    let millis = (until - now).num_milliseconds().max(0) as u64;
    millis.div_ceil(1000)
}
