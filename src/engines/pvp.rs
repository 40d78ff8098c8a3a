//! 1v1 PvP: open challenges between two real players, and solo duels
//! against a synthesized opponent (random or ranked).
//!
//! Random and ranked duels run against a synthetic loadout parked in the
//! challenger's own `pvp` snapshot field, reusing the exact same combat
//! loop the PvE engine uses against a `monster` snapshot. Only an accepted
//! open challenge pits two real players against each other, which needs
//! both `Player` records mutated in lock-step.

use crate::catalog::Catalog;
use crate::combat::{resolve_attack, Attacker, CombatEvent, Defender};
use crate::error::{EngineError, EngineResult};
use crate::model::item::ItemKind;
use crate::model::player::{MonsterSnapshot, Player, PVP_START_COOLDOWN_SECS, RANKED_RATING_STEP};
use crate::model::pvp::PvpRequest;
use crate::model::WorldState;
use crate::rng;

pub const NON_RANKED_WIN_INFECTION: i64 = 300;

fn find_request_by_ident<'a>(state: &'a WorldState,
    ident: &str) -> Option<(i64, &'a PvpRequest)> {
    if let Ok(id) = ident.parse::<i64>() {
        if let Some(req) = state.pvp_requests.get(&id) {
            return Some((id, req));
        }
    }
    state
    .pvp_requests
    .iter()
    .find(|(_, req)| req.username.as_deref() == Some(ident))
    .map(|(&id, req)| (id, req))
}

/// `/pvp` with no argument: open an un-targeted challenge.
pub fn open_challenge(state: &mut WorldState,
    challenger_id: i64,
    username: Option<String>,
    chat_id: i64,
    now: i64) -> EngineResult<()> {
    let challenger = state
    .players
    .get(&challenger_id)
    .ok_or(EngineError::PlayerNotFound(challenger_id))?;
    if let Some(remaining) = challenger.is_pvp_start_on_cooldown(now) {
        return Err(EngineError::PvpStartCooldown {
            remaining_secs: remaining,
        });
    }
    state
    .pvp_requests
    .insert(challenger_id, PvpRequest::new(challenger_id, username, chat_id, now));
    Ok(())
}

/// `/pvp <ident>`: accept a pending open challenge, starting a real
/// two-player duel. Neither participant may have started a PvP in the
/// last 20 seconds.
pub fn accept_challenge(state: &mut WorldState, accepter_id: i64, ident: &str, now: i64) -> EngineResult<i64> {
    let Some((challenger_id, _)) = find_request_by_ident(state, ident) else {
        return Err(EngineError::NoPvpRequest(ident.to_string()));
    };
    if challenger_id == accepter_id {
        return Err(EngineError::NoPvpRequest(ident.to_string()));
    }

    {
        let accepter = state
        .players
        .get(&accepter_id)
        .ok_or(EngineError::PlayerNotFound(accepter_id))?;
        if let Some(remaining) = accepter.is_pvp_start_on_cooldown(now) {
            return Err(EngineError::PvpStartCooldown { remaining_secs: remaining });
        }
        let challenger = state
        .players
        .get(&challenger_id)
        .ok_or(EngineError::PlayerNotFound(challenger_id))?;
        if let Some(remaining) = challenger.is_pvp_start_on_cooldown(now) {
            return Err(EngineError::PvpStartCooldown { remaining_secs: remaining });
        }
    }

    state.pvp_requests.remove(&challenger_id);
    mirror_real_opponents(state, challenger_id, accepter_id)?;

    for id in [challenger_id, accepter_id] {
        let p = state.players.get_mut(&id).unwrap();
        p.last_pvp_start_at = now;
    }
    Ok(challenger_id)
}

fn player_as_opponent_snapshot(p: &Player) -> MonsterSnapshot {
    MonsterSnapshot {
        name: p.name.clone(),
        weapon: p.inventory.weapon.clone(),
        helmet: p.inventory.helmet.clone(),
        sign: p.inventory.sign.clone(),
        state: p.as_combatant_state(),
        infection_reward: NON_RANKED_WIN_INFECTION,
        drop_chance: 0.0,
        guaranteed_sign: false,
    }
}

fn mirror_real_opponents(state: &mut WorldState, a_id: i64, b_id: i64) -> EngineResult<()> {
    let a = state.players.get(&a_id).cloned().ok_or(EngineError::PlayerNotFound(a_id))?;
    let b = state.players.get(&b_id).cloned().ok_or(EngineError::PlayerNotFound(b_id))?;
    state.players.get_mut(&a_id).unwrap().pvp = Some(player_as_opponent_snapshot(&b));
    state.players.get_mut(&b_id).unwrap().pvp = Some(player_as_opponent_snapshot(&a));
    Ok(())
}

/// Synthesize a random opponent: uniform inventory picks, 50% chance of a
/// sign, zeroed counters.
pub fn start_random(state: &mut WorldState, catalog: &Catalog, player_id: i64, now: i64) -> EngineResult<()> {
    let player = state.players.get(&player_id).ok_or(EngineError::PlayerNotFound(player_id))?;
    if let Some(remaining) = player.is_pvp_start_on_cooldown(now) {
        return Err(EngineError::PvpStartCooldown { remaining_secs: remaining });
    }
    let weapon = crate::loot::uniform_pick(&catalog.items_by_kind(ItemKind::Weapon)).cloned();
    let helmet = crate::loot::uniform_pick(&catalog.items_by_kind(ItemKind::Helmet)).cloned();
    let sign = if rng::roll_chance(0.5) {
        crate::loot::uniform_pick(&catalog.items_by_kind(ItemKind::Sign)).cloned()
    } else {
        None
    };

    let player = state.players.get_mut(&player_id).unwrap();
    player.pvp = Some(MonsterSnapshot {
        name: "Противник".to_string(),
        weapon,
        helmet,
        sign,
        state: crate::model::player::CombatantState::new(player.max_hp, player.max_hp),
        infection_reward: NON_RANKED_WIN_INFECTION,
        drop_chance: 0.0,
        guaranteed_sign: false,
    });
    player.last_pvp_start_at = now;
    Ok(())
}

/// Synthesize a ranked opponent via the stage-windowed pickers.
/// Rating is granted/reset only for the real participant; the opponent is
/// a bot and never touches the store.
pub fn start_ranked(state: &mut WorldState, catalog: &Catalog, player_id: i64, now: i64) -> EngineResult<()> {
    let player = state.players.get(&player_id).ok_or(EngineError::PlayerNotFound(player_id))?;
    if let Some(remaining) = player.is_pvp_start_on_cooldown(now) {
        return Err(EngineError::PvpStartCooldown { remaining_secs: remaining });
    }
    let stage = player.ranked_stage();

    let weapons = catalog.items_by_kind(ItemKind::Weapon);
    let helmets = catalog.items_by_kind(ItemKind::Helmet);
    let signs = catalog.items_by_kind(ItemKind::Sign);
    let weapon = crate::loot::pick_ranked_item(&weapons, stage);
    let helmet = crate::loot::pick_ranked_item(&helmets, stage);
    let sign = crate::loot::pick_ranked_sign(&signs, stage);

    let player = state.players.get_mut(&player_id).unwrap();
    player.pvp = Some(MonsterSnapshot {
        name: "Ranked Opponent".to_string(),
        weapon,
        helmet,
        sign,
        state: crate::model::player::CombatantState::new(player.max_hp, player.max_hp),
        infection_reward: 0,
        drop_chance: 0.0,
        guaranteed_sign: false,
    });
    player.current_event = Some("pvp_ranked".to_string());
    player.last_pvp_start_at = now;
    Ok(())
}

fn is_ranked(player: &Player) -> bool {
    player.current_event.as_deref() == Some("pvp_ranked")
}

/// One exchange against a synthetic opponent, mirroring the PvE combat loop
/// (duel loop + simplified retaliation).
pub fn solo_attack(state: &mut WorldState, player_id: i64) -> EngineResult<Vec<CombatEvent>> {
    let player = state.players.get_mut(&player_id).ok_or(EngineError::PlayerNotFound(player_id))?;
    let mut opponent = player.pvp.take().ok_or(EngineError::NotInCombat)?;
    let ranked = is_ranked(player);

    let mut events = Vec::new();
    let mut player_state = player.as_combatant_state();
    let mut unused_radiation = false;
    {
        let attacker = Attacker {
            name: &player.name,
            weapon: player.inventory.weapon.as_ref(),
            crit_chance: player.crit_chance(),
            extra: player.inventory.extra.as_ref(),
            sign: player.inventory.sign.as_ref(),
        };
        let defender = Defender {
            name: &opponent.name,
            helmet_block_percent: opponent.helmet.as_ref().and_then(|h| h.block).unwrap_or(0),
            sign: opponent.sign.as_ref(),
        };
        events.extend(resolve_attack(&attacker, &mut player_state, &defender, &mut opponent.state, &mut unused_radiation));
    }
    player.apply_combatant_state(&player_state);

    if opponent.state.is_dead() {
        finish_solo_win(player, ranked);
        return Ok(events);
    }

    {
        let attacker = Attacker {
            name: &opponent.name,
            weapon: opponent.weapon.as_ref(),
            crit_chance: 0.0,
            extra: None,
            sign: None,
        };
        let defender = Defender {
            name: &player.name,
            helmet_block_percent: player.helmet_block_percent(),
            sign: player.inventory.sign.as_ref(),
        };
        let mut unused = false;
        events.extend(resolve_attack(&attacker, &mut opponent.state, &defender, &mut player_state, &mut unused));
    }
    player.apply_combatant_state(&player_state);

    if player.hp <= 0 {
        finish_solo_loss(player, ranked);
    } else {
        player.pvp = Some(opponent);
    }
    Ok(events)
}

fn finish_solo_win(player: &mut Player, ranked: bool) {
    if ranked {
        player.grant_ranked_pvp_points(RANKED_RATING_STEP);
    } else {
        player.infection += NON_RANKED_WIN_INFECTION;
    }
    player.pvp_wins += 1;
    player.pvp = None;
    player.sign_radiation_used = false;
    player.sign_final_used = false;
    player.current_event = None;
}

fn finish_solo_loss(player: &mut Player, ranked: bool) {
    if ranked {
        player.reset_pvp_rating();
    }
    player.pvp_losses += 1;
    player.pvp = None;
    player.sign_radiation_used = false;
    player.sign_final_used = false;
    player.current_event = None;
}

/// One exchange of a real two-player duel: `actor_id` attacks `target_id`.
/// Pulls both records out of the map to satisfy the borrow checker, then
/// reinserts, acceptable at this scale since a duel only ever touches two
/// entries and there is a single logical writer.
pub fn duel_attack(state: &mut WorldState, actor_id: i64, target_id: i64) -> EngineResult<Vec<CombatEvent>> {
    let actor = state.players.remove(&actor_id).ok_or(EngineError::PlayerNotFound(actor_id))?;
    let target = match state.players.remove(&target_id) {
        Some(t) => t,
        None => {
            state.players.insert(actor_id, actor);
            return Err(EngineError::PlayerNotFound(target_id));
        }
    };
    let mut actor = actor;
    let mut target = target;

    let mut events = Vec::new();
    let mut actor_state = actor.as_combatant_state();
    let mut target_state = target.as_combatant_state();
    let mut unused_radiation = false;
    if actor_state.try_consume_stun() {
        events.push(CombatEvent::Stunned { actor: actor.name.clone() });
    } else {
        let attacker = Attacker {
            name: &actor.name,
            weapon: actor.inventory.weapon.as_ref(),
            crit_chance: actor.crit_chance(),
            extra: actor.inventory.extra.as_ref(),
            sign: actor.inventory.sign.as_ref(),
        };
        let defender = Defender {
            name: &target.name,
            helmet_block_percent: target.helmet_block_percent(),
            sign: target.inventory.sign.as_ref(),
        };
        events.extend(resolve_attack(&attacker, &mut actor_state, &defender, &mut target_state, &mut unused_radiation));
    }
    actor.apply_combatant_state(&actor_state);
    target.apply_combatant_state(&target_state);

    if target_state.is_dead() {
        actor.infection += NON_RANKED_WIN_INFECTION;
        actor.pvp_wins += 1;
        target.pvp_losses += 1;
        for p in [&mut actor, &mut target] {
            p.pvp = None;
            p.sign_radiation_used = false;
            p.sign_final_used = false;
        }
    } else {
        actor.pvp = Some(player_as_opponent_snapshot(&target));
        target.pvp = Some(player_as_opponent_snapshot(&actor));
    }

    state.players.insert(actor_id, actor);
    state.players.insert(target_id, target);
    Ok(events)
}
