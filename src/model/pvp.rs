//! Open PvP challenge records.

use serde::{Deserialize, Serialize};

pub const PVP_REQUEST_TTL_SECS: i64 = 60;
pub const PVP_REQUEST_SWEEP_INTERVAL_SECS: i64 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvpRequest {
    pub challenger_id: i64,
    pub username: Option<String>,
    pub chat_id: i64,
    pub created_at: i64,
}

impl PvpRequest {
    pub fn new(challenger_id: i64, username: Option<String>, chat_id: i64, now: i64) -> Self {
        Self {
            challenger_id,
            username,
            chat_id,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now - self.created_at >= PVP_REQUEST_TTL_SECS
    }
}
