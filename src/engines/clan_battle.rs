//! Clan-vs-clan team battle: queue, pairing, sequential duel chain.

use crate::combat::{resolve_attack, Attacker, CombatEvent, Defender};
use crate::error::{EngineError, EngineResult};
use crate::model::clan::{ClanBattle, ClanBattleStatus, CLAN_BATTLE_MIN_PLAYERS};
use crate::model::player::CombatantState;
use crate::model::WorldState;

pub const CLAN_BATTLE_POINTS_DELTA: i64 = 500;

/// `/clan_battle`: enqueue the player under their clan.
pub fn enqueue(state: &mut WorldState, queues: &mut std::collections::HashMap<String, Vec<i64>>, player_id: i64) -> EngineResult<()> {
    let clan_id = state
    .players
    .get(&player_id)
    .ok_or(EngineError::PlayerNotFound(player_id))?
    .clan_id
    .clone()
    .ok_or(EngineError::NotInClan)?;
    let queue = queues.entry(clan_id).or_default();
    if !queue.contains(&player_id) {
        queue.push(player_id);
    }
    Ok(())
}

/// Once two distinct clans each have `CLAN_BATTLE_MIN_PLAYERS` queued,
/// announce the pairing and record a pending `ClanBattle` row awaiting the
/// opposing clan's `/acceptbattle`.
pub fn try_pair(queues: &std::collections::HashMap<String, Vec<i64>>) -> Option<(String, String)> {
    let ready: Vec<&String> = queues
    .iter()
    .filter(|(_, q)| q.len() >= CLAN_BATTLE_MIN_PLAYERS)
    .map(|(id, _)| id)
    .collect();
    if ready.len() < 2 {
        return None;
    }
    Some((ready[0].clone(), ready[1].clone()))
}

pub fn propose_battle(state: &mut WorldState, id: String, clan_a: String, clan_b: String, now: i64) {
    state.clan_battles.push(ClanBattle {
        id,
        clan_id: clan_a,
        opponent_clan_id: clan_b,
        status: ClanBattleStatus::Pending,
        created_at: now,
        accepted_by: None,
    });
}

/// `/acceptbattle`: the opposing clan's leader confirms; the battle moves
/// to `active`.
pub fn accept_battle(state: &mut WorldState, battle_id: &str, accepter_id: i64) -> EngineResult<()> {
    let battle = state
    .clan_battles
    .iter_mut()
    .find(|b| b.id == battle_id)
    .ok_or(EngineError::NoPendingClanBattle)?;
    if battle.status != ClanBattleStatus::Pending {
        return Err(EngineError::NoPendingClanBattle);
    }
    battle.status = ClanBattleStatus::Active;
    battle.accepted_by = Some(accepter_id);
    Ok(())
}

/// Countdown abort: if either queue dropped below the minimum by the time
/// the 20 s timer fires, the battle never starts.
pub fn countdown_should_abort(queue_a: &[i64], queue_b: &[i64]) -> bool {
    queue_a.len() < CLAN_BATTLE_MIN_PLAYERS || queue_b.len() < CLAN_BATTLE_MIN_PLAYERS
}

/// Run the full sequential-duel chain to completion: front-vs-front using
/// the shared combat kernel, losing side's index advances on a KO, until
/// one side runs out of fighters. Returns the winning clan id and the
/// full event log.
pub fn run_sequential_duel(state: &mut WorldState,
    queue_a: &[i64],
    queue_b: &[i64]) -> EngineResult<(usize, usize, Vec<CombatEvent>)> {
    let mut idx_a = 0usize;
    let mut idx_b = 0usize;
    let mut all_events = Vec::new();

    let mut states_a: Vec<CombatantState> = queue_a
    .iter()
    .map(|id| state.players.get(id).map(|p| p.as_combatant_state()).unwrap_or_default())
    .collect();
    let mut states_b: Vec<CombatantState> = queue_b
    .iter()
    .map(|id| state.players.get(id).map(|p| p.as_combatant_state()).unwrap_or_default())
    .collect();

    while idx_a < queue_a.len() && idx_b < queue_b.len() {
        let a_id = queue_a[idx_a];
        let b_id = queue_b[idx_b];
        let a_player = state.players.get(&a_id).cloned().ok_or(EngineError::PlayerNotFound(a_id))?;
        let b_player = state.players.get(&b_id).cloned().ok_or(EngineError::PlayerNotFound(b_id))?;
        let mut unused = false;

        {
            let attacker = Attacker {
                name: &a_player.name,
                weapon: a_player.inventory.weapon.as_ref(),
                crit_chance: a_player.crit_chance(),
                extra: a_player.inventory.extra.as_ref(),
                sign: a_player.inventory.sign.as_ref(),
            };
            let defender = Defender {
                name: &b_player.name,
                helmet_block_percent: b_player.helmet_block_percent(),
                sign: b_player.inventory.sign.as_ref(),
            };
            all_events.extend(resolve_attack(&attacker, &mut states_a[idx_a], &defender, &mut states_b[idx_b], &mut unused));
        }

        if states_b[idx_b].is_dead() {
            idx_b += 1;
            continue;
        }

        {
            let attacker = Attacker {
                name: &b_player.name,
                weapon: b_player.inventory.weapon.as_ref(),
                crit_chance: b_player.crit_chance(),
                extra: b_player.inventory.extra.as_ref(),
                sign: b_player.inventory.sign.as_ref(),
            };
            let defender = Defender {
                name: &a_player.name,
                helmet_block_percent: a_player.helmet_block_percent(),
                sign: a_player.inventory.sign.as_ref(),
            };
            all_events.extend(resolve_attack(&attacker, &mut states_b[idx_b], &defender, &mut states_a[idx_a], &mut unused));
        }

        if states_a[idx_a].is_dead() {
            idx_a += 1;
        }
    }

    Ok((idx_a, idx_b, all_events))
}

/// Apply the point transfer and clear both queues. `a_exhausted`
/// means clan A ran out of fighters (lost).
pub fn settle(state: &mut WorldState, clan_a: &str, clan_b: &str, a_exhausted: bool) {
    let (winner, loser) = if a_exhausted { (clan_b, clan_a) } else { (clan_a, clan_b) };
    if let Some(clan) = state.clans.get_mut(winner) {
        clan.add_points(CLAN_BATTLE_POINTS_DELTA);
    }
    if let Some(clan) = state.clans.get_mut(loser) {
        clan.add_points(-CLAN_BATTLE_POINTS_DELTA);
    }
}
