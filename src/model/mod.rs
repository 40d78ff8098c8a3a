pub mod assault;
pub mod clan;
pub mod item;
pub mod player;
pub mod pvp;
pub mod raid;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use clan::{Clan, ClanBattle, ClanInvite};
use player::Player;
use pvp::PvpRequest;

/// The full persistent world: players, clans, invites, and the
/// clan-battle append-only log. Raid sessions and assault state are
/// intentionally excluded; they're in-memory-only and discarded on exit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub players: HashMap<i64, Player>,
    pub clans: HashMap<String, Clan>,
    pub clan_invites: HashMap<i64, ClanInvite>,
    pub clan_battles: Vec<ClanBattle>,
    #[serde(default)]
    pub pvp_requests: HashMap<i64, PvpRequest>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every member id in a clan maps to a player whose clan_id equals the
    /// clan's id, and vice versa.
    pub fn check_clan_membership_invariant(&self) -> bool {
        for (clan_id, clan) in &self.clans {
            for member_id in &clan.members {
                match self.players.get(member_id) {
                    Some(p) if p.clan_id.as_deref() == Some(clan_id.as_str()) => {}
                    _ => return false,
                }
            }
        }
        for player in self.players.values() {
            if let Some(clan_id) = &player.clan_id {
                match self.clans.get(clan_id) {
                    Some(clan) if clan.members.contains(&player.id) => {}
                    _ => return false,
                }
            }
        }
        true
    }

    /// Remove expired clan invites and PvP requests (sweepers).
    pub fn sweep_expired(&mut self, now: i64) {
        self.clan_invites.retain(|_, invite| !invite.is_expired(now));
        self.pvp_requests.retain(|_, req| !req.is_expired(now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_world_satisfies_clan_membership_invariant() {
        let world = WorldState::new();
        assert!(world.check_clan_membership_invariant());
    }

    #[test]
    fn consistent_membership_passes_invariant() {
        let mut world = WorldState::new();
        let mut player = Player::new(1, None, "a".into());
        player.clan_id = Some("c1".into());
        world.players.insert(1, player);
        world.clans.insert("c1".into(), Clan::new("c1", "Reapers", 1));
        assert!(world.check_clan_membership_invariant());
    }

    #[test]
    fn dangling_clan_reference_fails_invariant() {
        let mut world = WorldState::new();
        let mut player = Player::new(1, None, "a".into());
        player.clan_id = Some("c1".into());
        world.players.insert(1, player);
        // Clan "c1" never created.
        assert!(!world.check_clan_membership_invariant());
    }
}
