//! Error taxonomy for the engine.
//!
//! [`EngineError`] is the control-flow error returned by fallible engine
//! operations and propagated with `?`. [`FaultLog`] is a separate,
//! best-effort diagnostic trail for the "programmer bug" / transient-I/O
//! class of fault that should never surface to a chat user but is still
//! worth keeping around for a postmortem.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use thiserror::Error;

/// Errors that can propagate out of engine operations.
///
/// Transient I/O (DB down, HTTP timeout) and transport idempotency quirks
/// like a "message not modified" edit failure are recovered at the call
/// site and never reach this type; everything here is meant to be shown
/// to a user or logged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("player {0} not found")]
    PlayerNotFound(i64),
    #[error("clan {0} not found")]
    ClanNotFound(String),
    #[error("clan name '{0}' is already taken")]
    ClanNameTaken(String),
    #[error("player is already in a clan")]
    AlreadyInClan,
    #[error("player is not in a clan")]
    NotInClan,
    #[error("only the clan leader may do this")]
    NotClanLeader,
    #[error("no pending invite for this player")]
    NoPendingInvite,
    #[error("no pending clan battle challenge")]
    NoPendingClanBattle,
    #[error("hunt is on cooldown for {remaining_secs}s")]
    HuntCooldown { remaining_secs: i64 },
    #[error("pvp start is on cooldown for {remaining_secs}s")]
    PvpStartCooldown { remaining_secs: i64 },
    #[error("no open pvp request for '{0}'")]
    NoPvpRequest(String),
    #[error("player already has an active combat session")]
    AlreadyInCombat,
    #[error("player has no active combat session")]
    NotInCombat,
    #[error("cannot flee after the first attack")]
    CannotFlee,
    #[error("no pending drop to take or discard")]
    NoPendingDrop,
    #[error("raid session is not in the expected state")]
    RaidStateMismatch,
    #[error("raid lobby is full")]
    RaidLobbyFull,
    #[error("chat does not have enough members for an assault")]
    AssaultChatTooSmall,
    #[error("chat is not currently occupied by a clan")]
    NoActiveAssault,
    #[error("unknown item '{0}'")]
    UnknownItem(String),
    #[error("this action is not allowed outside a private chat")]
    NotPrivateChat,
    #[error("caller is not authorized for this admin action")]
    NotAdmin,
    #[error("underlying store error: {0}")]
    Store(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Structured context attached to a logged fault, mirroring what a request
/// handler knows at the point of failure.
#[derive(Debug, Clone)]
pub struct FaultContext {
    pub player_id: Option<i64>,
    pub session_kind: Option<&'static str>,
    pub detail: Option<String>,
}

impl FaultContext {
    pub fn new() -> Self {
        Self {
            player_id: None,
            session_kind: None,
            detail: None,
        }
    }

    pub fn with_player(mut self, id: i64) -> Self {
        self.player_id = Some(id);
        self
    }

    pub fn with_session(mut self, kind: &'static str) -> Self {
        self.session_kind = Some(kind);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl Default for FaultContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct FaultEntry {
    error: String,
    context: FaultContext,
}

/// Rotating in-memory fault log, capped to avoid unbounded growth across a
/// long-lived process. Transient errors are logged here rather than
/// propagated to the user.
pub struct FaultLog {
    entries: Vec<FaultEntry>,
    cap: usize,
}

impl FaultLog {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: Vec::with_capacity(cap),
            cap,
        }
    }

    pub fn record(&mut self, error: impl std::fmt::Display, context: FaultContext) {
        log::error!("engine fault: {} ({:?})", error, context);
        let entry = FaultEntry {
            error: error.to_string(),
            context,
        };
        if self.entries.len() >= self.cap {
            self.entries.remove(0);
        }
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for entry in &self.entries {
            *counts.entry(entry.error.clone()).or_insert(0) += 1;
        }
        counts
    }
}

static GLOBAL_FAULT_LOG: OnceLock<Mutex<FaultLog>> = OnceLock::new();

pub fn global_fault_log() -> &'static Mutex<FaultLog> {
    GLOBAL_FAULT_LOG.get_or_init(|| Mutex::new(FaultLog::new(1000)))
}

pub fn log_fault(error: impl std::fmt::Display, context: FaultContext) {
    if let Ok(mut log) = global_fault_log().lock() {
        log.record(error, context);
    }
}
