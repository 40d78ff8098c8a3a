//! Human-readable combat events emitted by the kernel, returned as an
//! ordered list for the caller to render. Kept as a typed enum rather
//! than raw strings, so callers can
//! render per-locale text and tests can assert on structure instead of
//! scraping prose.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    ExtraTriggered { actor: String, effect: String },
    AttackRolled { actor: String, weapon: String, damage: i64 },
    CriticalHit { actor: String },
    BoostConsumed { actor: String },
    ReductionApplied { defender: String },
    Dodged { defender: String },
    HelmetBlocked { defender: String, blocked: i64 },
    DamageDealt { defender: String, damage: i64, remaining_hp: i64 },
    Vampirism { actor: String, healed: i64 },
    SavedByRadiationSign { defender: String },
    SavedByFinalSign { defender: String },
    Stunned { actor: String },
}
