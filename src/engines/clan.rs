//! Clan CRUD, invites, and membership changes.

use crate::error::{EngineError, EngineResult};
use crate::model::clan::{Clan, ClanInvite};
use crate::model::WorldState;

fn clan_name_taken(state: &WorldState, name: &str) -> bool {
    state
    .clans
    .values()
    .any(|c| c.name.eq_ignore_ascii_case(name))
}

pub fn create_clan(state: &mut WorldState, founder_id: i64, clan_id: String, name: String) -> EngineResult<()> {
    let founder = state
    .players
    .get(&founder_id)
    .ok_or(EngineError::PlayerNotFound(founder_id))?;
    if founder.clan_id.is_some() {
        return Err(EngineError::AlreadyInClan);
    }
    if clan_name_taken(state, &name) {
        return Err(EngineError::ClanNameTaken(name));
    }
    let clan = Clan::new(clan_id.clone(), name, founder_id);
    state.clans.insert(clan_id.clone(), clan);
    state.players.get_mut(&founder_id).unwrap().clan_id = Some(clan_id);
    Ok(())
}

pub fn invite_to_clan(state: &mut WorldState,
    inviter_id: i64,
    invitee_id: i64,
    now: i64) -> EngineResult<()> {
    let inviter = state
    .players
    .get(&inviter_id)
    .ok_or(EngineError::PlayerNotFound(inviter_id))?;
    let clan_id = inviter.clan_id.clone().ok_or(EngineError::NotInClan)?;
    state
    .players
    .get(&invitee_id)
    .ok_or(EngineError::PlayerNotFound(invitee_id))?;

    // Duplicate invites overwrite.
    state
    .clan_invites
    .insert(invitee_id, ClanInvite::new(invitee_id, clan_id, inviter_id, now));
    Ok(())
}

pub fn accept_invite(state: &mut WorldState, invitee_id: i64, now: i64) -> EngineResult<String> {
    let invite = state
    .clan_invites
    .get(&invitee_id)
    .cloned()
    .ok_or(EngineError::NoPendingInvite)?;
    if invite.is_expired(now) {
        state.clan_invites.remove(&invitee_id);
        return Err(EngineError::NoPendingInvite);
    }
    let clan = state
    .clans
    .get_mut(&invite.clan_id)
    .ok_or_else(|| EngineError::ClanNotFound(invite.clan_id.clone()))?;
    clan.members.push(invitee_id);
    if clan.leader_id.is_none() {
        clan.leader_id = Some(invitee_id);
    }
    state.players.get_mut(&invitee_id).unwrap().clan_id = Some(invite.clan_id.clone());
    state.clan_invites.remove(&invitee_id);
    Ok(invite.clan_id)
}

pub fn decline_invite(state: &mut WorldState, invitee_id: i64) -> EngineResult<()> {
    if state.clan_invites.remove(&invitee_id).is_none() {
        return Err(EngineError::NoPendingInvite);
    }
    Ok(())
}

/// `/clan_leave`: drop from members; promote list head if the leaver was
/// leader; delete the clan if it's now empty (lifecycle).
pub fn leave_clan(state: &mut WorldState, player_id: i64) -> EngineResult<()> {
    let clan_id = {
        let player = state.players.get(&player_id).ok_or(EngineError::PlayerNotFound(player_id))?;
        player.clan_id.clone().ok_or(EngineError::NotInClan)?
    };
    let empty = {
        let clan = state
        .clans
        .get_mut(&clan_id)
        .ok_or_else(|| EngineError::ClanNotFound(clan_id.clone()))?;
        clan.remove_member(player_id);
        clan.is_empty()
    };
    state.players.get_mut(&player_id).unwrap().clan_id = None;
    if empty {
        state.clans.remove(&clan_id);
    }
    Ok(())
}

/// `/kick <ident>`: leader-only.
pub fn kick_member(state: &mut WorldState, leader_id: i64, target_id: i64) -> EngineResult<()> {
    let clan_id = {
        let leader = state.players.get(&leader_id).ok_or(EngineError::PlayerNotFound(leader_id))?;
        leader.clan_id.clone().ok_or(EngineError::NotInClan)?
    };
    {
        let clan = state
        .clans
        .get_mut(&clan_id)
        .ok_or_else(|| EngineError::ClanNotFound(clan_id.clone()))?;
        if clan.leader_id != Some(leader_id) {
            return Err(EngineError::NotClanLeader);
        }
        if !clan.members.contains(&target_id) {
            return Err(EngineError::PlayerNotFound(target_id));
        }
        clan.remove_member(target_id);
    }
    if let Some(target) = state.players.get_mut(&target_id) {
        target.clan_id = None;
    }
    Ok(())
}
