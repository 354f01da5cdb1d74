//! $SALSA currency ledger
//!
//! Balance, earn streak and a bounded history log, namespaced per
//! identity (anonymous play and each signed-in user keep independent
//! state). Every mutation is a single read-modify-write transition
//! over the in-memory state under one lock and is persisted before the
//! lock is released, so interleaved async completions cannot lose an
//! update.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::config::GameRules;
use crate::storage::{scoped_key, JsonStore};
use crate::types::{Clock, SystemClock};

pub const BALANCE_KEY: &str = "tacomon-salsa";
pub const HISTORY_KEY: &str = "tacomon-salsa-history";
pub const STREAK_KEY: &str = "tacomon-salsa-streak";

const CHAT_REASON: &str = "Chat con Tacomon";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Earn,
    Spend,
}

/// One ledger movement, insertion-ordered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub amount: u32,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct LedgerState {
    balance: u32,
    streak: u32,
    history: Vec<HistoryEntry>,
}

/// The spendable-points subsystem. Cheap to clone handles are not
/// provided; share it behind an `Arc` like the other stores.
pub struct SalsaLedger {
    store: Arc<JsonStore>,
    clock: Arc<dyn Clock>,
    rules: GameRules,
    identity: Option<String>,
    state: Mutex<LedgerState>,
}

impl SalsaLedger {
    pub fn new(store: Arc<JsonStore>, rules: GameRules, identity: Option<String>) -> Self {
        Self::with_clock(store, rules, identity, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<JsonStore>,
        rules: GameRules,
        identity: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let id = identity.as_deref();
        let balance = store
            .get(&scoped_key(BALANCE_KEY, id))
            .unwrap_or(rules.starting_balance);
        let history = store.get(&scoped_key(HISTORY_KEY, id)).unwrap_or_default();
        let streak = store.get(&scoped_key(STREAK_KEY, id)).unwrap_or(0);
        Self {
            store,
            clock,
            rules,
            identity,
            state: Mutex::new(LedgerState {
                balance,
                streak,
                history,
            }),
        }
    }

    pub fn balance(&self) -> u32 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).balance
    }

    pub fn streak(&self) -> u32 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).streak
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .history
            .clone()
    }

    /// Unconditionally add to the balance and log the movement
    pub fn earn(&self, amount: u32, reason: &str) {
        self.transition(|state, now| {
            state.balance += amount;
            state.history.push(HistoryEntry {
                entry_type: EntryType::Earn,
                amount,
                reason: reason.to_string(),
                timestamp: now,
            });
        });
    }

    /// Deduct if covered. Insufficient funds is a normal `false`
    /// outcome with no state change, never an error.
    pub fn spend(&self, amount: u32, reason: &str) -> bool {
        let mut ok = false;
        self.transition(|state, now| {
            if state.balance >= amount {
                state.balance -= amount;
                state.history.push(HistoryEntry {
                    entry_type: EntryType::Spend,
                    amount,
                    reason: reason.to_string(),
                    timestamp: now,
                });
                ok = true;
            }
        });
        ok
    }

    /// Randomized chat reward. Below the comfort balance the reward is
    /// always granted; above it, only with the configured probability,
    /// as an anti-inflation throttle. A nonzero grant bumps the streak.
    pub fn earn_from_chat(&self, rng: &mut impl Rng) -> u32 {
        let base = rng.random_range(self.rules.chat_reward_min..=self.rules.chat_reward_max);
        let roll: f64 = rng.random();
        let mut earned = 0;
        // the throttle check and the grant happen under the same lock
        self.transition(|state, now| {
            if state.balance > self.rules.comfort_balance
                && roll >= self.rules.chat_reward_probability
            {
                return;
            }
            state.balance += base;
            state.streak += 1;
            state.history.push(HistoryEntry {
                entry_type: EntryType::Earn,
                amount: base,
                reason: CHAT_REASON.to_string(),
                timestamp: now,
            });
            earned = base;
        });
        earned
    }

    /// Apply one atomic state transition, trim history to the ring
    /// size and persist before releasing the lock.
    fn transition(&self, f: impl FnOnce(&mut LedgerState, DateTime<Utc>)) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state, self.clock.now());
        let overflow = state.history.len().saturating_sub(self.rules.max_history);
        if overflow > 0 {
            state.history.drain(..overflow);
        }
        let id = self.identity.as_deref();
        self.store.put(&scoped_key(BALANCE_KEY, id), &state.balance);
        self.store.put(&scoped_key(HISTORY_KEY, id), &state.history);
        self.store.put(&scoped_key(STREAK_KEY, id), &state.streak);
    }
}
