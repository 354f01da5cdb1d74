//! Shared types used across modules
//!
//! This module contains types that are used by multiple modules
//! to avoid circular dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three taco families a pet can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TacoType {
    Vegetariano,
    Mariscos,
    Carne,
}

impl TacoType {
    pub fn all() -> &'static [TacoType] {
        &[TacoType::Vegetariano, TacoType::Mariscos, TacoType::Carne]
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vegetariano" | "veggie" => Some(TacoType::Vegetariano),
            "mariscos" | "seafood" => Some(TacoType::Mariscos),
            "carne" | "meat" => Some(TacoType::Carne),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TacoType::Vegetariano => "Taco Vegetariano",
            TacoType::Mariscos => "Taco de Mariscos",
            TacoType::Carne => "Taco de Carne",
        }
    }

    /// The three specialties of this type, in canonical order
    pub fn specialties(&self) -> &'static [Specialty] {
        match self {
            TacoType::Vegetariano => {
                &[Specialty::Frijoles, Specialty::Nopal, Specialty::Champinones]
            }
            TacoType::Mariscos => &[Specialty::Pescado, Specialty::Camaron, Specialty::Pulpo],
            TacoType::Carne => &[Specialty::Pastor, Specialty::Asada, Specialty::Carnitas],
        }
    }
}

impl std::fmt::Display for TacoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TacoType::Vegetariano => write!(f, "vegetariano"),
            TacoType::Mariscos => write!(f, "mariscos"),
            TacoType::Carne => write!(f, "carne"),
        }
    }
}

/// Flavor sub-variant of a pet. Three per type, nine total.
/// Determines the chat personality and visual theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Specialty {
    // Vegetariano
    Frijoles,
    Nopal,
    Champinones,
    // Mariscos
    Pescado,
    Camaron,
    Pulpo,
    // Carne
    Pastor,
    Asada,
    Carnitas,
}

impl Specialty {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "frijoles" => Some(Specialty::Frijoles),
            "nopal" => Some(Specialty::Nopal),
            "champinones" => Some(Specialty::Champinones),
            "pescado" => Some(Specialty::Pescado),
            "camaron" => Some(Specialty::Camaron),
            "pulpo" => Some(Specialty::Pulpo),
            "pastor" => Some(Specialty::Pastor),
            "asada" => Some(Specialty::Asada),
            "carnitas" => Some(Specialty::Carnitas),
            _ => None,
        }
    }

    /// The taco type this specialty belongs to
    pub fn taco_type(&self) -> TacoType {
        match self {
            Specialty::Frijoles | Specialty::Nopal | Specialty::Champinones => {
                TacoType::Vegetariano
            }
            Specialty::Pescado | Specialty::Camaron | Specialty::Pulpo => TacoType::Mariscos,
            Specialty::Pastor | Specialty::Asada | Specialty::Carnitas => TacoType::Carne,
        }
    }

    /// Default specialty for a type (used when migrating older saves)
    pub fn default_for(taco_type: TacoType) -> Self {
        taco_type.specialties()[0]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Specialty::Frijoles => "Frijoles",
            Specialty::Nopal => "Nopal",
            Specialty::Champinones => "Champiñones",
            Specialty::Pescado => "Pescado",
            Specialty::Camaron => "Camarón",
            Specialty::Pulpo => "Pulpo",
            Specialty::Pastor => "Al Pastor",
            Specialty::Asada => "Asada",
            Specialty::Carnitas => "Carnitas",
        }
    }
}

impl std::fmt::Display for Specialty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Specialty::Frijoles => "frijoles",
            Specialty::Nopal => "nopal",
            Specialty::Champinones => "champinones",
            Specialty::Pescado => "pescado",
            Specialty::Camaron => "camaron",
            Specialty::Pulpo => "pulpo",
            Specialty::Pastor => "pastor",
            Specialty::Asada => "asada",
            Specialty::Carnitas => "carnitas",
        };
        write!(f, "{}", s)
    }
}

/// One of the pet's three bounded stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Happiness,
    Energy,
    Hunger,
}

/// A gated care action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Feed,
    Play,
    Chat,
}

impl ActionKind {
    /// The stat this action rewards
    pub fn stat(&self) -> Stat {
        match self {
            ActionKind::Feed => Stat::Hunger,
            ActionKind::Play => Stat::Energy,
            ActionKind::Chat => Stat::Happiness,
        }
    }

    /// Spanish action label, matches the quiz categories
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Feed => "alimentar",
            ActionKind::Play => "jugar",
            ActionKind::Chat => "charlar",
        }
    }

    /// Whether a wrong quiz answer locks this action (feed/play only)
    pub fn blockable(&self) -> bool {
        !matches!(self, ActionKind::Chat)
    }

    /// Whether this action costs $SALSA up front (feed/play only)
    pub fn has_cost(&self) -> bool {
        !matches!(self, ActionKind::Chat)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Injectable time source so cooldown, block and streak logic can be
/// driven by a simulated clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specialty_round_trips_to_its_type() {
        for taco_type in TacoType::all() {
            for specialty in taco_type.specialties() {
                assert_eq!(specialty.taco_type(), *taco_type);
            }
        }
    }

    #[test]
    fn default_specialty_is_first_of_type() {
        assert_eq!(Specialty::default_for(TacoType::Carne), Specialty::Pastor);
        assert_eq!(
            Specialty::default_for(TacoType::Vegetariano),
            Specialty::Frijoles
        );
        assert_eq!(Specialty::default_for(TacoType::Mariscos), Specialty::Pescado);
    }

    #[test]
    fn action_target_stats() {
        assert_eq!(ActionKind::Feed.stat(), Stat::Hunger);
        assert_eq!(ActionKind::Play.stat(), Stat::Energy);
        assert_eq!(ActionKind::Chat.stat(), Stat::Happiness);
        assert!(!ActionKind::Chat.blockable());
        assert!(!ActionKind::Chat.has_cost());
    }
}
