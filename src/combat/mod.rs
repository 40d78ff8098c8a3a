pub mod events;
pub mod kernel;

pub use events::CombatEvent;
pub use kernel::{resolve_attack, Attacker, Defender};
