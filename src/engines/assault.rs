//! Chat occupation (base capture) and expeditions.

use crate::combat::{resolve_attack, Attacker, CombatEvent, Defender};
use crate::error::{EngineError, EngineResult};
use crate::model::assault::{AssaultState, PendingExpedition, UnansweredOutcome, ASSAULT_MIN_CHAT_MEMBERS};
use crate::model::player::CombatantState;
use crate::model::WorldState;
use crate::rng;

pub const ASSAULT_WIN_POINTS: i64 = 150;

/// `/assault`: place the caller's clan as occupier of this chat. Multiple
/// clans may co-occupy the same chat, since state is keyed by
/// (chat, clan).
pub fn assault_chat(state: &WorldState, caller_id: i64, chat_id: i64, chat_member_count: i64, now: i64) -> EngineResult<AssaultState> {
    if chat_member_count < ASSAULT_MIN_CHAT_MEMBERS {
        return Err(EngineError::AssaultChatTooSmall);
    }
    let clan_id = state
    .players
    .get(&caller_id)
    .ok_or(EngineError::PlayerNotFound(caller_id))?
    .clan_id
    .clone()
    .ok_or(EngineError::NotInClan)?;
    Ok(AssaultState::new(chat_id, clan_id, now))
}

/// `/unassault`: only a member of the occupying clan may remove the base.
pub fn unassault_chat(state: &WorldState, caller_id: i64, assault: &AssaultState) -> EngineResult<()> {
    let clan_id = state
    .players
    .get(&caller_id)
    .ok_or(EngineError::PlayerNotFound(caller_id))?
    .clan_id
    .clone()
    .ok_or(EngineError::NotInClan)?;
    if clan_id != assault.clan_id {
        return Err(EngineError::NoActiveAssault);
    }
    Ok(())
}

/// 35-minute cadence timer fires: pick a random active clan member as the
/// scout and open the attack window.
pub fn begin_expedition(assault: &mut AssaultState, id: String, active_member_ids: &[i64], now: i64) -> Option<()> {
    let idx = rng::roll_index(active_member_ids.len())?;
    let member_id = active_member_ids[idx];
    assault.pending_expedition = Some(PendingExpedition {
        id,
        member_id,
        message_id: None,
        attacked_by: None,
        created_at: now,
    });
    Some(())
}

/// 5-minute window closes with no attacker: roll the unanswered outcome and
/// award the occupying clan.
pub fn resolve_unanswered(state: &mut WorldState, assault: &mut AssaultState) -> Option<i64> {
    let expedition = assault.pending_expedition.take()?;
    let _ = expedition;
    let outcome = UnansweredOutcome::roll();
    let points = outcome.points;
    if let Some(clan) = state.clans.get_mut(&assault.clan_id) {
        clan.add_points(points);
    }
    assault.next_expedition_at += crate::model::assault::ASSAULT_EXPEDITION_CADENCE_SECS;
    Some(points)
}

/// An attacker from a different clan taps "Attack": both sides must be
/// free of any other combat and the attacker's clan must differ from the
/// occupier's.
pub fn claim_attack(state: &WorldState,
    assault: &AssaultState,
    attacker_id: i64) -> EngineResult<i64> {
    let expedition = assault.pending_expedition.as_ref().ok_or(EngineError::NoActiveAssault)?;
    let attacker = state.players.get(&attacker_id).ok_or(EngineError::PlayerNotFound(attacker_id))?;
    let scout = state.players.get(&expedition.member_id).ok_or(EngineError::PlayerNotFound(expedition.member_id))?;
    if attacker.clan_id == Some(assault.clan_id.clone()) {
        return Err(EngineError::NoActiveAssault);
    }
    if attacker.pvp.is_some() || attacker.monster.is_some() {
        return Err(EngineError::AlreadyInCombat);
    }
    if scout.pvp.is_some() || scout.monster.is_some() {
        return Err(EngineError::AlreadyInCombat);
    }
    Ok(expedition.member_id)
}

/// Result of a single automatic attacker-vs-scout exchange (one resolver
/// call per 5-second tick). Whichever side's HP hits zero ends the duel.
pub struct AssaultDuelOutcome {
    pub events: Vec<CombatEvent>,
    pub attacker_won: Option<bool>,
}

pub fn attack_tick(attacker_name: &str,
    attacker_weapon: Option<&crate::model::item::Item>,
    attacker_crit: f64,
    attacker_sign: Option<&crate::model::item::Item>,
    attacker_state: &mut CombatantState,
    scout_name: &str,
    scout_helmet_block: u32,
    scout_sign: Option<&crate::model::item::Item>,
    scout_state: &mut CombatantState) -> AssaultDuelOutcome {
    let mut events = Vec::new();
    let mut unused = false;
    let attacker = Attacker {
        name: attacker_name,
        weapon: attacker_weapon,
        crit_chance: attacker_crit,
        extra: None,
        sign: attacker_sign,
    };
    let defender = Defender {
        name: scout_name,
        helmet_block_percent: scout_helmet_block,
        sign: scout_sign,
    };
    events.extend(resolve_attack(&attacker, attacker_state, &defender, scout_state, &mut unused));

    if scout_state.is_dead() {
        return AssaultDuelOutcome { events, attacker_won: Some(true) };
    }

    let attacker_def = Defender {
        name: attacker_name,
        helmet_block_percent: 0,
        sign: attacker_sign,
    };
    let scout_atk = Attacker {
        name: scout_name,
        weapon: None,
        crit_chance: 0.0,
        extra: None,
        sign: scout_sign,
    };
    events.extend(resolve_attack(&scout_atk, scout_state, &attacker_def, attacker_state, &mut unused));

    if attacker_state.is_dead() {
        AssaultDuelOutcome { events, attacker_won: Some(false) }
    } else {
        AssaultDuelOutcome { events, attacker_won: None }
    }
}

/// Credit the winning side's clan once the duel concludes: attacker
/// win gives the attacker's clan +150, otherwise the defending/occupying
/// clan gets +150.
pub fn settle_duel(state: &mut WorldState, assault: &AssaultState, attacker_clan_id: &str, attacker_won: bool) {
    let winner_clan = if attacker_won { attacker_clan_id } else { assault.clan_id.as_str() };
    if let Some(clan) = state.clans.get_mut(winner_clan) {
        clan.add_points(ASSAULT_WIN_POINTS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::clan::Clan;
    use crate::model::player::Player;

    fn world_with(players: Vec<Player>) -> WorldState {
        let mut w = WorldState::new();
        for p in players {
            w.players.insert(p.id, p);
        }
        w
    }

    #[test]
    fn assault_rejects_small_chat() {
        let mut p = Player::new(1, None, "a".into());
        p.clan_id = Some("c1".into());
        let world = world_with(vec![p]);
        let err = assault_chat(&world, 1, 100, ASSAULT_MIN_CHAT_MEMBERS - 1, 0).unwrap_err();
        assert!(matches!(err, EngineError::AssaultChatTooSmall));
    }

    #[test]
    fn unassault_requires_same_clan() {
        let mut p1 = Player::new(1, None, "a".into());
        p1.clan_id = Some("c1".into());
        let mut p2 = Player::new(2, None, "b".into());
        p2.clan_id = Some("c2".into());
        let world = world_with(vec![p1, p2]);
        let assault = AssaultState::new(100, "c1".into(), 0);
        assert!(unassault_chat(&world, 1, &assault).is_ok());
        let err = unassault_chat(&world, 2, &assault).unwrap_err();
        assert!(matches!(err, EngineError::NoActiveAssault));
    }

    #[test]
    fn claim_attack_rejects_same_clan_attacker() {
        let mut scout = Player::new(1, None, "scout".into());
        scout.clan_id = Some("c1".into());
        let mut attacker = Player::new(2, None, "att".into());
        attacker.clan_id = Some("c1".into());
        let world = world_with(vec![scout, attacker]);
        let mut assault = AssaultState::new(100, "c1".into(), 0);
        assault.pending_expedition = Some(PendingExpedition {
            id: "e1".into(),
            member_id: 1,
            message_id: None,
            attacked_by: None,
            created_at: 0,
        });
        let err = claim_attack(&world, &assault, 2).unwrap_err();
        assert!(matches!(err, EngineError::NoActiveAssault));
    }

    #[test]
    fn unanswered_outcome_awards_occupying_clan() {
        let mut state = WorldState::new();
        state.clans.insert("c1".into(), Clan::new("c1", "C1", 1));
        let mut assault = AssaultState::new(100, "c1".into(), 0);
        assault.pending_expedition = Some(PendingExpedition {
            id: "e1".into(),
            member_id: 1,
            message_id: None,
            attacked_by: None,
            created_at: 0,
        });
        rng::clear_forced();
        rng::force_unit(0.0); // positive outcome
        let points = resolve_unanswered(&mut state, &mut assault).unwrap();
        assert_eq!(points, 300);
        assert_eq!(state.clans.get("c1").unwrap().points, 300);
        assert!(assault.pending_expedition.is_none());
    }

    #[test]
    fn settle_duel_credits_attacker_clan_on_win() {
        let mut state = WorldState::new();
        state.clans.insert("attackers".into(), Clan::new("attackers", "Att", 1));
        state.clans.insert("c1".into(), Clan::new("c1", "C1", 2));
        let assault = AssaultState::new(100, "c1".into(), 0);
        settle_duel(&mut state, &assault, "attackers", true);
        assert_eq!(state.clans.get("attackers").unwrap().points, ASSAULT_WIN_POINTS);
        assert_eq!(state.clans.get("c1").unwrap().points, 0);
    }
}
