//! Pet state store
//!
//! Owns the single Tacomon of this profile: creation, stat updates
//! with clamping, action timestamps, and reset. Name, type and
//! specialty are immutable after creation. Older saves without a
//! specialty are backfilled from the type on load (one-way migration).

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::storage::JsonStore;
use crate::types::{Clock, Specialty, Stat, SystemClock, TacoType};

pub const PET_KEY: &str = "tacomon-data";

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 10;

/// The virtual pet record. Serialized field names match the original
/// save format so the hub wire shapes line up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tacomon {
    pub name: String,
    #[serde(rename = "type")]
    pub taco_type: TacoType,
    pub specialty: Specialty,
    pub happiness: u8,
    pub energy: u8,
    pub hunger: u8,
    pub created_at: DateTime<Utc>,
    pub last_fed: Option<DateTime<Utc>>,
    pub last_chatted: Option<DateTime<Utc>>,
    pub last_played: Option<DateTime<Utc>>,
}

impl Tacomon {
    /// A freshly hatched pet with all stats at the midpoint
    pub fn hatch(
        name: String,
        taco_type: TacoType,
        specialty: Specialty,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name,
            taco_type,
            specialty,
            happiness: 50,
            energy: 50,
            hunger: 50,
            created_at: now,
            last_fed: None,
            last_chatted: None,
            last_played: None,
        }
    }

    pub fn stat(&self, stat: Stat) -> u8 {
        match stat {
            Stat::Happiness => self.happiness,
            Stat::Energy => self.energy,
            Stat::Hunger => self.hunger,
        }
    }

    /// Last completion time of the action that feeds this stat
    pub fn last_action(&self, stat: Stat) -> Option<DateTime<Utc>> {
        match stat {
            Stat::Hunger => self.last_fed,
            Stat::Happiness => self.last_chatted,
            Stat::Energy => self.last_played,
        }
    }
}

/// Persistent store for the one pet of this profile
pub struct PetStore {
    store: Arc<JsonStore>,
    clock: Arc<dyn Clock>,
}

impl PetStore {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<JsonStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Validate and persist a new pet. Persistence failure is silent
    /// (store contract): the pet simply appears absent next load.
    pub fn create(&self, name: &str, taco_type: TacoType, specialty: Specialty) -> Result<Tacomon> {
        let name = name.trim();
        let len = name.chars().count();
        if !(NAME_MIN..=NAME_MAX).contains(&len) {
            bail!("El nombre debe tener entre {} y {} caracteres", NAME_MIN, NAME_MAX);
        }
        if specialty.taco_type() != taco_type {
            bail!(
                "La especialidad {} no pertenece al tipo {}",
                specialty,
                taco_type
            );
        }
        let pet = Tacomon::hatch(name.to_string(), taco_type, specialty, self.clock.now());
        self.store.put(PET_KEY, &pet);
        Ok(pet)
    }

    /// Load the active pet. Saves from before specialties existed get
    /// the first specialty of their type filled in.
    pub fn load(&self) -> Option<Tacomon> {
        let mut raw: serde_json::Value = self.store.get(PET_KEY)?;
        if raw.get("specialty").map_or(true, |s| s.is_null()) {
            let taco_type: TacoType = serde_json::from_value(raw.get("type")?.clone()).ok()?;
            raw["specialty"] =
                serde_json::to_value(Specialty::default_for(taco_type)).ok()?;
        }
        serde_json::from_value(raw).ok()
    }

    /// Apply a clamped stat delta. When `record_timestamp` is set the
    /// matching last-action field is stamped with "now"; that stamp is
    /// the single trigger for cooldowns, so passive boosts (chat,
    /// training) pass `false` and never start one.
    pub fn update_stat(&self, stat: Stat, delta: i32, record_timestamp: bool) -> Option<Tacomon> {
        let mut pet = self.load()?;
        let clamped = (pet.stat(stat) as i32 + delta).clamp(0, 100) as u8;
        match stat {
            Stat::Happiness => pet.happiness = clamped,
            Stat::Energy => pet.energy = clamped,
            Stat::Hunger => pet.hunger = clamped,
        }
        if record_timestamp {
            let now = self.clock.now();
            match stat {
                Stat::Hunger => pet.last_fed = Some(now),
                Stat::Happiness => pet.last_chatted = Some(now),
                Stat::Energy => pet.last_played = Some(now),
            }
        }
        self.store.put(PET_KEY, &pet);
        Some(pet)
    }

    /// Delete the pet entirely. Irreversible; confirmation is a CLI
    /// concern, not handled here.
    pub fn reset(&self) {
        self.store.remove(PET_KEY);
    }
}
