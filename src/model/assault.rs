//! Chat-occupation (base) state.

use serde::{Deserialize, Serialize};

pub const ASSAULT_MIN_CHAT_MEMBERS: i64 = 4;
pub const ASSAULT_EXPEDITION_WINDOW_SECS: i64 = 5 * 60;
pub const ASSAULT_EXPEDITION_CADENCE_SECS: i64 = 35 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingExpedition {
    pub id: String,
    pub member_id: i64,
    pub message_id: Option<i64>,
    pub attacked_by: Option<i64>,
    pub created_at: i64,
}

impl PendingExpedition {
    pub fn is_expired(&self, now: i64) -> bool {
        now - self.created_at >= ASSAULT_EXPEDITION_WINDOW_SECS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssaultState {
    pub chat_id: i64,
    pub clan_id: String,
    pub pending_expedition: Option<PendingExpedition>,
    pub next_expedition_at: i64,
}

impl AssaultState {
    pub fn new(chat_id: i64, clan_id: String, now: i64) -> Self {
        Self {
            chat_id,
            clan_id,
            pending_expedition: None,
            next_expedition_at: now + ASSAULT_EXPEDITION_CADENCE_SECS,
        }
    }
}

/// Outcome weights for an unanswered expedition: 34% positive / 40%
/// neutral / 26% negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnansweredOutcome {
    Positive,
    Neutral,
    Negative,
}

impl UnansweredOutcome {
    pub fn points(self) -> i64 {
        match self {
            UnansweredOutcome::Positive => 300,
            UnansweredOutcome::Neutral => 100,
            UnansweredOutcome::Negative => 30,
        }
    }

    pub fn roll() -> Self {
        let r = crate::rng::roll_unit();
        if r < 0.34 {
            UnansweredOutcome::Positive
        } else if r < 0.74 {
            UnansweredOutcome::Neutral
        } else {
            UnansweredOutcome::Negative
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng;

    #[test]
    fn unanswered_outcome_boundaries() {
        rng::clear_forced();
        rng::force_unit(0.0);
        assert_eq!(UnansweredOutcome::roll(), UnansweredOutcome::Positive);
        rng::force_unit(0.73);
        assert_eq!(UnansweredOutcome::roll(), UnansweredOutcome::Neutral);
        rng::force_unit(0.99);
        assert_eq!(UnansweredOutcome::roll(), UnansweredOutcome::Negative);
    }

    #[test]
    fn pending_expedition_expires_at_window() {
        let exp = PendingExpedition {
            id: "e1".into(),
            member_id: 1,
            message_id: None,
            attacked_by: None,
            created_at: 0,
        };
        assert!(!exp.is_expired(ASSAULT_EXPEDITION_WINDOW_SECS - 1));
        assert!(exp.is_expired(ASSAULT_EXPEDITION_WINDOW_SECS));
    }
}
