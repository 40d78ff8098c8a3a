//! Row shapes for the four structured tables plus the legacy single-row
//! blob. Every JSON-valued column is carried as a `String` here and parsed
//! with `serde_json` at the call site, so the SQL layer never needs its own
//! copy of the nested inventory/invite/battle types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRow {
    pub id: i64,
    pub username: Option<String>,
    pub name: String,
    pub hp: i64,
    pub max_hp: i64,
    pub infection: i64,
    pub crimecoins: i64,
    pub survival_days: i64,
    pub best_survival_days: i64,
    pub clan_id: Option<String>,
    pub inventory: String,
    pub monster: Option<String>,
    pub monster_stun: i64,
    pub damage_boost_turns: i64,
    pub damage_reduction_turns: i64,
    pub radiation_boost: bool,
    pub first_attack: bool,
    pub last_hunt: i64,
    pub pending_drop: Option<String>,
    pub pvp_wins: i64,
    pub pvp_losses: i64,
    pub pvp_rating: i64,
    pub pvp_rating_best: i64,
    pub last_gift_time: i64,
    pub hunt_cooldown_warned: bool,
    pub current_danger: Option<String>,
    pub pvp: Option<String>,
    pub last_pvp_start_at: i64,
    pub current_event: Option<String>,
    pub pending_rescue_gift: bool,
    pub pending_hunt_raid: bool,
    pub invite_cases_available: i64,
    pub invite_cases_opened: i64,
    pub invited_user_ids: String,
    pub extra: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClanRow {
    pub id: String,
    pub name: String,
    pub points: i64,
    pub members: String,
    pub extra: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClanBattleRow {
    pub id: String,
    pub clan_id: String,
    pub opponent_clan_id: String,
    pub status: String,
    pub created_at: i64,
    pub accepted_by: Option<i64>,
    pub data: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClanInviteRow {
    pub player_id: i64,
    pub clan_id: String,
    pub from_id: i64,
    pub expires: i64,
    pub extra: String,
    pub updated_at: i64,
}

/// Read-only migration source: `bot_state(id=1, state JSON)`, the legacy
/// single-row blob. Migrated on first read, then left untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyBotStateRow {
    pub id: i64,
    pub state: String,
}

use crate::model::clan::{Clan, ClanBattle, ClanInvite};
use crate::model::player::{Inventory, MonsterSnapshot, Player};
use crate::store::StoreError;

pub fn player_to_row(player: &Player, now: i64) -> Result<PlayerRow, StoreError> {
    Ok(PlayerRow {
        id: player.id,
        username: player.username.clone(),
        name: player.name.clone(),
        hp: player.hp,
        max_hp: player.max_hp,
        infection: player.infection,
        crimecoins: player.crimecoins,
        survival_days: player.survival_days,
        best_survival_days: player.best_survival_days,
        clan_id: player.clan_id.clone(),
        inventory: serde_json::to_string(&player.inventory)?,
        monster: player
        .monster
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?,
        monster_stun: player.monster_stun as i64,
        damage_boost_turns: player.damage_boost_turns as i64,
        damage_reduction_turns: player.damage_reduction_turns as i64,
        radiation_boost: player.radiation_boost,
        first_attack: player.first_attack,
        last_hunt: player.last_hunt,
        pending_drop: player
        .pending_drop
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?,
        pvp_wins: player.pvp_wins,
        pvp_losses: player.pvp_losses,
        pvp_rating: player.pvp_rating,
        pvp_rating_best: player.pvp_rating_best,
        last_gift_time: player.last_gift_time,
        hunt_cooldown_warned: player.hunt_cooldown_warned,
        current_danger: player
        .current_danger
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?,
        pvp: player.pvp.as_ref().map(serde_json::to_string).transpose()?,
        last_pvp_start_at: player.last_pvp_start_at,
        current_event: player.current_event.clone(),
        pending_rescue_gift: player.pending_rescue_gift,
        pending_hunt_raid: player.pending_hunt_raid,
        invite_cases_available: player.invite_cases_available,
        invite_cases_opened: player.invite_cases_opened,
        invited_user_ids: serde_json::to_string(&player.invited_user_ids)?,
        extra: serde_json::to_string(&player.extra)?,
        updated_at: now,
    })
}

pub fn player_from_row(row: PlayerRow) -> Result<Player, StoreError> {
    let inventory: Inventory = serde_json::from_str(&row.inventory)?;
    let monster: Option<MonsterSnapshot> = row
    .monster
    .as_deref()
    .map(serde_json::from_str)
    .transpose()?;
    let pending_drop = row
    .pending_drop
    .as_deref()
    .map(serde_json::from_str)
    .transpose()?;
    let current_danger = row
    .current_danger
    .as_deref()
    .map(serde_json::from_str)
    .transpose()?;
    let pvp = row.pvp.as_deref().map(serde_json::from_str).transpose()?;
    let invited_user_ids = serde_json::from_str(&row.invited_user_ids).unwrap_or_default();
    let extra = serde_json::from_str(&row.extra).unwrap_or_default();

    let mut player = Player::new(row.id, row.username, row.name);
    player.hp = row.hp;
    player.max_hp = row.max_hp.max(crate::model::player::BASE_MAX_HP);
    player.hp = player.hp.clamp(0, player.max_hp);
    player.infection = row.infection.max(0);
    player.crimecoins = row.crimecoins;
    player.survival_days = row.survival_days;
    player.best_survival_days = row.best_survival_days.max(row.survival_days);
    player.clan_id = row.clan_id;
    player.inventory = inventory;
    player.monster = monster;
    player.monster_stun = row.monster_stun.max(0) as u32;
    player.damage_boost_turns = row.damage_boost_turns.max(0) as u32;
    player.damage_reduction_turns = row.damage_reduction_turns.max(0) as u32;
    player.radiation_boost = row.radiation_boost;
    player.first_attack = row.first_attack;
    player.last_hunt = row.last_hunt;
    player.pending_drop = pending_drop;
    player.pvp_wins = row.pvp_wins;
    player.pvp_losses = row.pvp_losses;
    player.pvp_rating = row.pvp_rating;
    player.pvp_rating_best = row.pvp_rating_best.max(row.pvp_rating);
    player.last_gift_time = row.last_gift_time;
    player.hunt_cooldown_warned = row.hunt_cooldown_warned;
    player.current_danger = current_danger;
    player.pvp = pvp;
    player.last_pvp_start_at = row.last_pvp_start_at;
    player.current_event = row.current_event;
    player.pending_rescue_gift = row.pending_rescue_gift;
    player.pending_hunt_raid = row.pending_hunt_raid;
    player.invite_cases_available = row.invite_cases_available.max(0);
    player.invite_cases_opened = row.invite_cases_opened.max(0);
    player.invited_user_ids = invited_user_ids;
    player.extra = extra;
    Ok(player)
}

pub fn clan_to_row(clan: &Clan, now: i64) -> Result<ClanRow, StoreError> {
    Ok(ClanRow {
        id: clan.id.clone(),
        name: clan.name.clone(),
        points: clan.points,
        members: serde_json::to_string(&clan.members)?,
        extra: serde_json::to_string(&clan.extra)?,
        updated_at: now,
    })
}

pub fn clan_from_row(row: ClanRow) -> Result<Clan, StoreError> {
    let members: Vec<i64> = serde_json::from_str(&row.members)?;
    let extra = serde_json::from_str(&row.extra).unwrap_or_default();
    let leader_id = members.first().copied();
    Ok(Clan {
        id: row.id,
        name: row.name,
        points: row.points.max(0),
        members,
        leader_id,
        extra,
    })
}

pub fn clan_invite_to_row(invite: &ClanInvite, now: i64) -> Result<ClanInviteRow, StoreError> {
    Ok(ClanInviteRow {
        player_id: invite.player_id,
        clan_id: invite.clan_id.clone(),
        from_id: invite.from_id,
        expires: invite.expires_at,
        extra: serde_json::to_string(&invite.extra)?,
        updated_at: now,
    })
}

pub fn clan_invite_from_row(row: ClanInviteRow) -> Result<ClanInvite, StoreError> {
    Ok(ClanInvite {
        player_id: row.player_id,
        clan_id: row.clan_id,
        from_id: row.from_id,
        expires_at: row.expires,
        extra: serde_json::from_str(&row.extra).unwrap_or_default(),
    })
}

pub fn clan_battle_to_row(battle: &ClanBattle, now: i64) -> Result<ClanBattleRow, StoreError> {
    Ok(ClanBattleRow {
        id: battle.id.clone(),
        clan_id: battle.clan_id.clone(),
        opponent_clan_id: battle.opponent_clan_id.clone(),
        status: format!("{:?}", battle.status).to_lowercase(),
        created_at: battle.created_at,
        accepted_by: battle.accepted_by,
        data: "{}".to_string(),
        updated_at: now,
    })
}

pub fn clan_battle_from_row(row: ClanBattleRow) -> Result<ClanBattle, StoreError> {
    use crate::model::clan::ClanBattleStatus;
    let status = match row.status.as_str() {
        "active" => ClanBattleStatus::Active,
        "finished" => ClanBattleStatus::Finished,
        _ => ClanBattleStatus::Pending,
    };
    Ok(ClanBattle {
        id: row.id,
        clan_id: row.clan_id,
        opponent_clan_id: row.opponent_clan_id,
        status,
        created_at: row.created_at,
        accepted_by: row.accepted_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_row_round_trip_preserves_infection() {
        let mut player = Player::new(123456, Some("u".into()), "name".into());
        player.infection = 77;
        let row = player_to_row(&player, 1000).unwrap();
        let restored = player_from_row(row).unwrap();
        assert_eq!(restored.infection, 77);
        assert_eq!(restored.id, 123456);
    }

    #[test]
    fn clan_row_round_trip_preserves_members() {
        let clan = Clan::new("c1", "Reapers", 42);
        let row = clan_to_row(&clan, 1000).unwrap();
        let restored = clan_from_row(row).unwrap();
        assert_eq!(restored.members, vec![42]);
        assert_eq!(restored.leader_id, Some(42));
    }
}
