//! Clan, invite, and clan-battle records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clan {
    pub id: String,
    pub name: String,
    pub points: i64,
    pub members: Vec<i64>,
    pub leader_id: Option<i64>,
    #[serde(default)]
    pub extra: serde_json::Map<String, Value>,
}

impl Clan {
    pub fn new(id: impl Into<String>, name: impl Into<String>, founder: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            points: 0,
            members: vec![founder],
            leader_id: Some(founder),
            extra: serde_json::Map::new(),
        }
    }

    pub fn remove_member(&mut self, player_id: i64) {
        self.members.retain(|&m| m != player_id);
        if self.leader_id == Some(player_id) {
            self.leader_id = self.members.first().copied();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn add_points(&mut self, delta: i64) {
        self.points = (self.points + delta).max(0);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClanInvite {
    pub player_id: i64,
    pub clan_id: String,
    pub from_id: i64,
    pub expires_at: i64,
    #[serde(default)]
    pub extra: serde_json::Map<String, Value>,
}

pub const CLAN_INVITE_TTL_SECS: i64 = 5 * 60;
pub const CLAN_INVITE_SWEEP_INTERVAL_SECS: i64 = 60;

impl ClanInvite {
    pub fn new(player_id: i64, clan_id: String, from_id: i64, now: i64) -> Self {
        Self {
            player_id,
            clan_id,
            from_id,
            expires_at: now + CLAN_INVITE_TTL_SECS,
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClanBattleStatus {
    Pending,
    Active,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClanBattle {
    pub id: String,
    pub clan_id: String,
    pub opponent_clan_id: String,
    pub status: ClanBattleStatus,
    pub created_at: i64,
    pub accepted_by: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClanBattleQueue {
    pub queued: Vec<i64>,
}

pub const CLAN_BATTLE_MIN_PLAYERS: usize = 2;
pub const CLAN_BATTLE_COUNTDOWN_SECS: i64 = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_leader_promotes_list_head() {
        let mut clan = Clan::new("c1", "Reapers", 1);
        clan.members.push(2);
        clan.remove_member(1);
        assert_eq!(clan.leader_id, Some(2));
        assert_eq!(clan.members, vec![2]);
    }

    #[test]
    fn removing_last_member_empties_clan() {
        let mut clan = Clan::new("c1", "Reapers", 1);
        clan.remove_member(1);
        assert!(clan.is_empty());
    }

    #[test]
    fn points_never_go_negative() {
        let mut clan = Clan::new("c1", "Reapers", 1);
        clan.add_points(-500);
        assert_eq!(clan.points, 0);
    }

    #[test]
    fn invite_expires_at_ttl_boundary() {
        let invite = ClanInvite::new(2, "c1".into(), 1, 1000);
        assert_eq!(invite.expires_at, 1000 + CLAN_INVITE_TTL_SECS);
        assert!(!invite.is_expired(1000 + CLAN_INVITE_TTL_SECS - 1));
        assert!(invite.is_expired(1000 + CLAN_INVITE_TTL_SECS));
    }
}
