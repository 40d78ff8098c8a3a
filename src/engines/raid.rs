//! Cooperative clan raid: lobby, style selection, 9-stage ladder.

use crate::combat::{resolve_attack, Attacker, CombatEvent, Defender};
use crate::error::{EngineError, EngineResult};
use crate::model::player::{CombatantState, Player};
use crate::model::raid::{
    RaidEnemy, RaidMember, RaidSession, RaidStatus, RaidStyle, StageKind, RAID_STAGES,
};
use crate::model::WorldState;
use crate::rng;

pub const RAID_MEDKIT_HEAL: i64 = 200;

/// `/raid`: open a lobby. Leader joins automatically.
pub fn open_lobby(clan_id: String, leader: &Player, chat_id: i64, double_reward: bool) -> RaidSession {
    let mut session = RaidSession::new(clan_id, leader.id, chat_id, double_reward);
    session.members.push(RaidMember {
        player_id: leader.id,
        state: leader.as_combatant_state(),
        dead: false,
    });
    session
}

/// `/acceptmission`: a clan member joins the lobby (cap 5).
pub fn join_lobby(session: &mut RaidSession, player: &Player) -> EngineResult<()> {
    if session.status != RaidStatus::Lobby {
        return Err(EngineError::RaidStateMismatch);
    }
    if session.is_full() {
        return Err(EngineError::RaidLobbyFull);
    }
    if session.members.iter().any(|m| m.player_id == player.id) {
        return Ok(());
    }
    session.members.push(RaidMember {
        player_id: player.id,
        state: player.as_combatant_state(),
        dead: false,
    });
    Ok(())
}

/// Lobby timeout fires: move to style selection.
pub fn close_lobby(session: &mut RaidSession) {
    if session.status == RaidStatus::Lobby {
        session.status = RaidStatus::StyleSelection;
    }
}

/// Leader picks a style; spawn the first stage's enemy.
pub fn choose_style(session: &mut RaidSession, leader_id: i64, style: RaidStyle) -> EngineResult<()> {
    if session.status != RaidStatus::StyleSelection {
        return Err(EngineError::RaidStateMismatch);
    }
    if session.leader_id != leader_id {
        return Err(EngineError::NotClanLeader);
    }
    session.style = Some(style);
    enter_stage(session, 0);
    Ok(())
}

fn enter_stage(session: &mut RaidSession, index: usize) {
    session.stage_pointer = index;
    session.turn_index = 0;
    let Some(stage) = RAID_STAGES.get(index) else {
        session.status = RaidStatus::Finished;
        return;
    };
    let dmg = apply_aggression_reduction(session.style, stage.dmg);
    session.current_enemy = Some(RaidEnemy {
        state: CombatantState::new(stage.hp, stage.hp),
        dmg,
    });
    session.status = match stage.kind {
        StageKind::Battle => RaidStatus::Battle,
        StageKind::Choice => RaidStatus::Choice,
    };
}

/// Aggression style: on battle start, 50% chance to reduce enemy
/// DMG by 25% (multiplicative, floored at 1).
fn apply_aggression_reduction(style: Option<RaidStyle>, dmg: u32) -> u32 {
    if style == Some(RaidStyle::Aggression) && rng::roll_chance(0.5) {
        (((dmg as f64) * 0.75).floor() as u32).max(1)
    } else {
        dmg
    }
}

/// Choice-stage resolution: leader taps Attack or Stealth.
pub fn resolve_choice(session: &mut RaidSession, attempt_stealth: bool) {
    if session.status != RaidStatus::Choice {
        return;
    }
    if attempt_stealth && rng::roll_chance(session.stealth_success_chance()) {
        clear_current_stage(session);
        return;
    }
    session.status = RaidStatus::Battle;
}

fn clear_current_stage(session: &mut RaidSession) {
    session.last_cleared_stage_index = Some(session.stage_pointer);
    session.current_enemy = None;
    maybe_medkit(session);
    advance_to_next_stage(session);
}

fn maybe_medkit(session: &mut RaidSession) {
    if rng::roll_chance(session.medkit_chance()) {
        for member in session.alive_members_mut() {
            member.state.hp = (member.state.hp + RAID_MEDKIT_HEAL).min(member.state.max_hp);
        }
    }
}

fn advance_to_next_stage(session: &mut RaidSession) {
    let next = session.stage_pointer + 1;
    if next >= RAID_STAGES.len() {
        session.status = RaidStatus::Finished;
    } else {
        session.status = RaidStatus::Transition;
        enter_stage(session, next);
    }
}

/// One round-robin battle turn: the next alive member attacks the shared
/// enemy state; if the enemy survives, it retaliates against that same
/// member with a simplified resolve.
pub fn battle_turn(session: &mut RaidSession, attacker: &Player) -> EngineResult<Vec<CombatEvent>> {
    if session.status != RaidStatus::Battle {
        return Err(EngineError::RaidStateMismatch);
    }
    session.current_stage().ok_or(EngineError::RaidStateMismatch)?;
    let mut enemy = session.current_enemy.take().ok_or(EngineError::RaidStateMismatch)?;

    let member_idx = session
    .members
    .iter()
    .position(|m| m.player_id == attacker.id && !m.dead)
    .ok_or(EngineError::PlayerNotFound(attacker.id))?;

    let mut events = Vec::new();
    let mut unused = false;
    {
        let atk = Attacker {
            name: &attacker.name,
            weapon: attacker.inventory.weapon.as_ref(),
            crit_chance: attacker.crit_chance(),
            extra: attacker.inventory.extra.as_ref(),
            sign: attacker.inventory.sign.as_ref(),
        };
        let def = Defender {
            name: "Enemy",
            helmet_block_percent: 0,
            sign: None,
        };
        events.extend(resolve_attack(&atk, &mut session.members[member_idx].state, &def, &mut enemy.state, &mut unused));
    }

    if enemy.state.is_dead() {
        session.current_enemy = Some(enemy);
        clear_current_stage(session);
        return Ok(events);
    }

    {
        // Simplified retaliation: flat enemy damage fixed at stage entry, no
        // crit/extra/boost, still subject to the member's dodge/helmet/sign.
        let mut damage = enemy.dmg as i64;
        let helmet_block = attacker.helmet_block_percent();
        let sign = attacker.inventory.sign.as_ref();
        if let Some(chance) = sign.and_then(|s| s.sign.as_ref()).and_then(|e| e.dodge_chance) {
            if rng::roll_chance(chance) {
                damage = 0;
                events.push(CombatEvent::Dodged { defender: attacker.name.clone() });
            }
        }
        if damage > 0 && helmet_block > 0 {
            let blocked = ((damage as f64) * (helmet_block as f64) / 100.0).ceil() as i64;
            damage -= blocked;
            events.push(CombatEvent::HelmetBlocked { defender: attacker.name.clone(), blocked });
        }
        session.members[member_idx].state.hp = (session.members[member_idx].state.hp - damage).max(0);
        events.push(CombatEvent::DamageDealt {
            defender: attacker.name.clone(),
            damage,
            remaining_hp: session.members[member_idx].state.hp,
        });
    }

    session.current_enemy = Some(enemy);
    if session.members[member_idx].state.is_dead() {
        session.members[member_idx].dead = true;
    }
    if session.all_dead() {
        session.status = RaidStatus::Finished;
    }
    Ok(events)
}

/// Bank the last-cleared stage's reward, once: clan points += reward, and
/// every participant (surviving or dead) gets infection += reward.
pub fn finalize(state: &mut WorldState, session: &mut RaidSession) -> Option<i64> {
    let reward = session.finalize_reward()?;
    if let Some(clan) = state.clans.get_mut(&session.clan_id) {
        clan.add_points(reward);
    }
    for member in &session.members {
        if let Some(player) = state.players.get_mut(&member.player_id) {
            player.infection += reward;
        }
    }
    Some(reward)
}
