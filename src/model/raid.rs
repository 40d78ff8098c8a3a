//! Clan raid mission session. In-memory only, discarded on process exit.

use serde::{Deserialize, Serialize};

use super::player::CombatantState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaidStatus {
    Lobby,
    StyleSelection,
    Preparing,
    Choice,
    Battle,
    Transition,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaidStyle {
    Stealth,
    Intellect,
    Aggression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Battle,
    Choice,
}

#[derive(Debug, Clone, Copy)]
pub struct RaidStageDef {
    pub hp: i64,
    pub dmg: u32,
    pub reward: i64,
    pub kind: StageKind,
}

/// The fixed 9-stage ladder. Stealth chance for choice stages defaults to
/// 10%, boosted to 70% under the stealth style; see
/// `RaidSession::stealth_success_chance()`.
pub const RAID_STAGES: [RaidStageDef; 9] = [
    RaidStageDef { hp: 370, dmg: 30, reward: 100, kind: StageKind::Battle },
    RaidStageDef { hp: 1650, dmg: 320, reward: 350, kind: StageKind::Battle },
    RaidStageDef { hp: 3000, dmg: 440, reward: 700, kind: StageKind::Choice },
    RaidStageDef { hp: 6300, dmg: 555, reward: 1500, kind: StageKind::Battle },
    RaidStageDef { hp: 8300, dmg: 710, reward: 3000, kind: StageKind::Choice },
    RaidStageDef { hp: 9500, dmg: 800, reward: 5000, kind: StageKind::Battle },
    RaidStageDef { hp: 10000, dmg: 830, reward: 7500, kind: StageKind::Battle },
    RaidStageDef { hp: 12000, dmg: 900, reward: 15000, kind: StageKind::Battle },
    RaidStageDef { hp: 17500, dmg: 1300, reward: 25000, kind: StageKind::Battle },
];

pub const RAID_LOBBY_CAP: usize = 5;
pub const RAID_LOBBY_SECS: i64 = 130;
pub const RAID_STAGE_TRANSITION_SECS: i64 = 3;
pub const RAID_BATTLE_TICK_SECS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaidMember {
    pub player_id: i64,
    pub state: CombatantState,
    pub dead: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaidEnemy {
    pub state: CombatantState,
    pub dmg: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaidSession {
    pub clan_id: String,
    pub leader_id: i64,
    pub chat_id: i64,
    pub status: RaidStatus,
    pub members: Vec<RaidMember>,
    pub style: Option<RaidStyle>,
    /// 0-indexed stage pointer into `RAID_STAGES`.
    pub stage_pointer: usize,
    pub current_enemy: Option<RaidEnemy>,
    pub turn_index: usize,
    pub last_cleared_stage_index: Option<usize>,
    pub reward_granted: bool,
    pub double_reward: bool,
}

impl RaidSession {
    pub fn new(clan_id: String, leader_id: i64, chat_id: i64, double_reward: bool) -> Self {
        Self {
            clan_id,
            leader_id,
            chat_id,
            status: RaidStatus::Lobby,
            members: Vec::new(),
            style: None,
            stage_pointer: 0,
            current_enemy: None,
            turn_index: 0,
            last_cleared_stage_index: None,
            reward_granted: false,
            double_reward,
        }
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= RAID_LOBBY_CAP
    }

    pub fn alive_members_mut(&mut self) -> impl Iterator<Item = &mut RaidMember> {
        self.members.iter_mut().filter(|m| !m.dead)
    }

    pub fn all_dead(&self) -> bool {
        self.members.iter().all(|m| m.dead)
    }

    pub fn current_stage(&self) -> Option<&'static RaidStageDef> {
        RAID_STAGES.get(self.stage_pointer)
    }

    /// Base 10%, boosted to 70% by the stealth style.
    pub fn stealth_success_chance(&self) -> f64 {
        match self.style {
            Some(RaidStyle::Stealth) => 0.70,
            _ => 0.10,
        }
    }

    /// 20% chance of a medkit drop between stages, boosted to 70% by the
    /// intellect style.
    pub fn medkit_chance(&self) -> f64 {
        match self.style {
            Some(RaidStyle::Intellect) => 0.70,
            _ => 0.20,
        }
    }

    /// Finalize once; repeated calls are a no-op so a raid or assault never
    /// grants its reward twice.
    pub fn finalize_reward(&mut self) -> Option<i64> {
        if self.reward_granted {
            return None;
        }
        self.reward_granted = true;
        let reward = self
        .last_cleared_stage_index
        .and_then(|idx| RAID_STAGES.get(idx))
        .map(|stage| stage.reward)
        .unwrap_or(0);
        let reward = if self.double_reward { reward * 2 } else { reward };
        Some(reward)
    }
}
