//! Tacomon - Taco Virtual Pet Library
//!
//! A Tamagotchi-style taco pet with:
//! - Quiz-gated care actions over a cooldown/block gate
//! - A $SALSA token ledger with bounded history
//! - LLM chat with persistent extracted memories
//! - Vision-scored training with staged evolution
//! - HUB registration, periodic sync and leaderboard
//! - A per-wallet tacodex collection log
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tacomon::pet::PetStore;
//! use tacomon::storage::JsonStore;
//! use tacomon::types::{Specialty, TacoType};
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(JsonStore::default_store()?);
//!     let pets = PetStore::new(store);
//!     let pet = pets.create("Paco", TacoType::Carne, Specialty::Pastor)?;
//!     println!("{} ha nacido", pet.name);
//!     Ok(())
//! }
//! ```

// Core modules (order matters for cross-module dependencies)
pub mod types;
pub mod storage; // Must come before the stores since they all persist through it
pub mod config;
pub mod security;
pub mod pet;
pub mod ledger;
pub mod gate;
pub mod quiz;
pub mod chat;
pub mod training;
pub mod hub;
pub mod tacodex;
pub mod cli;

// Re-export commonly used types for convenience
pub use config::{Config, GameRules};
pub use gate::{ActionGate, GateState};
pub use ledger::SalsaLedger;
pub use pet::{PetStore, Tacomon};
pub use storage::JsonStore;
pub use types::{ActionKind, Specialty, Stat, TacoType};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
