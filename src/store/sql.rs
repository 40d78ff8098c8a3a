//! SQL-backed store engine, fronting either Postgres or MySQL through
//! `sqlx::Any`: one query surface, bind placeholders normalized by the
//! driver.

use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{Any, Row, Transaction};

use crate::model::clan::{Clan, ClanBattle, ClanInvite};
use crate::model::player::Player;
use crate::model::WorldState;

use super::schema::{
    clan_battle_from_row, clan_battle_to_row, clan_from_row, clan_invite_from_row,
    clan_invite_to_row, clan_to_row, player_from_row, player_to_row, ClanBattleRow, ClanInviteRow,
    ClanRow, LegacyBotStateRow, PlayerRow,
};
use super::{Store, StoreError, StoreResult};

pub struct SqlStore {
    pool: sqlx::Pool<Any>,
}

impl SqlStore {
    pub async fn connect(url: &str) -> StoreResult<Self> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(Self { pool })
    }

    fn player_row_from_sql(row: &AnyRow) -> Result<PlayerRow, StoreError> {
        Ok(PlayerRow {
            id: row.try_get("id").map_err(db_err)?,
            username: row.try_get("username").map_err(db_err)?,
            name: row.try_get("name").map_err(db_err)?,
            hp: row.try_get("hp").map_err(db_err)?,
            max_hp: row.try_get("maxHp").map_err(db_err)?,
            infection: row.try_get("infection").map_err(db_err)?,
            crimecoins: row.try_get("crimecoins").map_err(db_err)?,
            survival_days: row.try_get("survivalDays").map_err(db_err)?,
            best_survival_days: row.try_get("bestSurvivalDays").map_err(db_err)?,
            clan_id: row.try_get("clanId").map_err(db_err)?,
            inventory: row.try_get("inventory").map_err(db_err)?,
            monster: row.try_get("monster").map_err(db_err)?,
            monster_stun: row.try_get("monsterStun").map_err(db_err)?,
            damage_boost_turns: row.try_get("damageBoostTurns").map_err(db_err)?,
            damage_reduction_turns: row.try_get("damageReductionTurns").map_err(db_err)?,
            radiation_boost: row.try_get("radiationBoost").map_err(db_err)?,
            first_attack: row.try_get("firstAttack").map_err(db_err)?,
            last_hunt: row.try_get("lastHunt").map_err(db_err)?,
            pending_drop: row.try_get("pendingDrop").map_err(db_err)?,
            pvp_wins: row.try_get("pvpWins").map_err(db_err)?,
            pvp_losses: row.try_get("pvpLosses").map_err(db_err)?,
            pvp_rating: row.try_get("pvpRating").map_err(db_err)?,
            pvp_rating_best: row.try_get("pvpRatingBest").map_err(db_err)?,
            last_gift_time: row.try_get("lastGiftTime").map_err(db_err)?,
            hunt_cooldown_warned: row.try_get("huntCooldownWarned").map_err(db_err)?,
            current_danger: row.try_get("currentDanger").map_err(db_err)?,
            pvp: row.try_get("pvp").map_err(db_err)?,
            last_pvp_start_at: row.try_get("lastPvpStartAt").map_err(db_err)?,
            current_event: row.try_get("currentEvent").map_err(db_err)?,
            pending_rescue_gift: row.try_get("pendingRescueGift").map_err(db_err)?,
            pending_hunt_raid: row.try_get("pendingHuntRaid").map_err(db_err)?,
            invite_cases_available: row.try_get("inviteCasesAvailable").map_err(db_err)?,
            invite_cases_opened: row.try_get("inviteCasesOpened").map_err(db_err)?,
            invited_user_ids: row.try_get("invitedUserIds").map_err(db_err)?,
            extra: row.try_get("extra").map_err(db_err)?,
            updated_at: row.try_get("updated_at").map_err(db_err)?,
        })
    }

    async fn load_legacy(&self) -> StoreResult<Option<WorldState>> {
        let row = sqlx::query("SELECT id, state FROM bot_state WHERE id = 1")
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        let Some(row) = row else { return Ok(None) };
        let legacy = LegacyBotStateRow {
            id: row.try_get("id").map_err(db_err)?,
            state: row.try_get("state").map_err(db_err)?,
        };
        let state: WorldState = serde_json::from_str(&legacy.state)?;
        Ok(Some(state))
    }

    async fn clear_table(tx: &mut Transaction<'_, Any>, table: &str) -> StoreResult<()> {
        let sql = format!("DELETE FROM {table}");
        sqlx::query(&sql).execute(&mut **tx).await.map_err(db_err)?;
        Ok(())
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

#[async_trait]
impl Store for SqlStore {
    /// `loadAll`: read the four structured tables; fall back to the
    /// legacy `bot_state` blob if they're empty; otherwise a zero-value
    /// state. Reconciliation (default-filling, HP clamping) happens in
    /// `schema::player_from_row`.
    async fn load_all(&self) -> StoreResult<WorldState> {
        let player_rows = sqlx::query("SELECT * FROM players")
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let clan_rows = sqlx::query("SELECT * FROM clans")
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let invite_rows = sqlx::query("SELECT * FROM clan_invites")
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let battle_rows = sqlx::query("SELECT * FROM clan_battles")
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        if player_rows.is_empty() && clan_rows.is_empty() {
            if let Some(legacy) = self.load_legacy().await? {
                return Ok(legacy);
            }
            return Ok(WorldState::new());
        }

        let mut state = WorldState::new();
        for row in &player_rows {
            let row = Self::player_row_from_sql(row)?;
            let player = player_from_row(row)?;
            state.players.insert(player.id, player);
        }
        for row in &clan_rows {
            let row = ClanRow {
                id: row.try_get("id").map_err(db_err)?,
                name: row.try_get("name").map_err(db_err)?,
                points: row.try_get("points").map_err(db_err)?,
                members: row.try_get("members").map_err(db_err)?,
                extra: row.try_get("extra").map_err(db_err)?,
                updated_at: row.try_get("updated_at").map_err(db_err)?,
            };
            let clan = clan_from_row(row)?;
            state.clans.insert(clan.id.clone(), clan);
        }
        for row in &invite_rows {
            let row = ClanInviteRow {
                player_id: row.try_get("playerId").map_err(db_err)?,
                clan_id: row.try_get("clanId").map_err(db_err)?,
                from_id: row.try_get("fromId").map_err(db_err)?,
                expires: row.try_get("expires").map_err(db_err)?,
                extra: row.try_get("extra").map_err(db_err)?,
                updated_at: row.try_get("updated_at").map_err(db_err)?,
            };
            let invite = clan_invite_from_row(row)?;
            state.clan_invites.insert(invite.player_id, invite);
        }
        for row in &battle_rows {
            let row = ClanBattleRow {
                id: row.try_get("id").map_err(db_err)?,
                clan_id: row.try_get("clanId").map_err(db_err)?,
                opponent_clan_id: row.try_get("opponentClanId").map_err(db_err)?,
                status: row.try_get("status").map_err(db_err)?,
                created_at: row.try_get("createdAt").map_err(db_err)?,
                accepted_by: row.try_get("acceptedBy").map_err(db_err)?,
                data: row.try_get("data").map_err(db_err)?,
                updated_at: row.try_get("updated_at").map_err(db_err)?,
            };
            state.clan_battles.push(clan_battle_from_row(row)?);
        }
        Ok(state)
    }

    /// Wrapped in a transaction: `DELETE FROM` plus re-insert every row.
    /// `sqlx::Any` supports transactions for both Postgres and MySQL, so
    /// this never needs to tolerate a missing BEGIN/COMMIT.
    async fn save_all(&self, state: &WorldState) -> StoreResult<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        Self::clear_table(&mut tx, "players").await?;
        Self::clear_table(&mut tx, "clans").await?;
        Self::clear_table(&mut tx, "clan_invites").await?;
        Self::clear_table(&mut tx, "clan_battles").await?;

        for player in state.players.values() {
            let row = player_to_row(player, now)?;
            insert_player(&mut tx, &row).await?;
        }
        for clan in state.clans.values() {
            let row = clan_to_row(clan, now)?;
            insert_clan(&mut tx, &row).await?;
        }
        for invite in state.clan_invites.values() {
            let row = clan_invite_to_row(invite, now)?;
            insert_invite(&mut tx, &row).await?;
        }
        for battle in &state.clan_battles {
            let row = clan_battle_to_row(battle, now)?;
            insert_battle(&mut tx, &row).await?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn clear_all(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        Self::clear_table(&mut tx, "players").await?;
        Self::clear_table(&mut tx, "clans").await?;
        Self::clear_table(&mut tx, "clan_invites").await?;
        Self::clear_table(&mut tx, "clan_battles").await?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}

async fn insert_player(tx: &mut Transaction<'_, Any>, row: &PlayerRow) -> StoreResult<()> {
    sqlx::query("INSERT INTO players (id, username, name, hp, maxHp, infection, crimecoins, \
        survivalDays, bestSurvivalDays, clanId, inventory, monster, monsterStun, \
        damageBoostTurns, damageReductionTurns, radiationBoost, firstAttack, lastHunt, \
        pendingDrop, pvpWins, pvpLosses, pvpRating, pvpRatingBest, lastGiftTime, \
        huntCooldownWarned, currentDanger, pvp, lastPvpStartAt, currentEvent, \
        pendingRescueGift, pendingHuntRaid, inviteCasesAvailable, inviteCasesOpened, \
        invitedUserIds, extra, updated_at) \
    VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)")
    .bind(row.id)
    .bind(&row.username)
    .bind(&row.name)
    .bind(row.hp)
    .bind(row.max_hp)
    .bind(row.infection)
    .bind(row.crimecoins)
    .bind(row.survival_days)
    .bind(row.best_survival_days)
    .bind(&row.clan_id)
    .bind(&row.inventory)
    .bind(&row.monster)
    .bind(row.monster_stun)
    .bind(row.damage_boost_turns)
    .bind(row.damage_reduction_turns)
    .bind(row.radiation_boost)
    .bind(row.first_attack)
    .bind(row.last_hunt)
    .bind(&row.pending_drop)
    .bind(row.pvp_wins)
    .bind(row.pvp_losses)
    .bind(row.pvp_rating)
    .bind(row.pvp_rating_best)
    .bind(row.last_gift_time)
    .bind(row.hunt_cooldown_warned)
    .bind(&row.current_danger)
    .bind(&row.pvp)
    .bind(row.last_pvp_start_at)
    .bind(&row.current_event)
    .bind(row.pending_rescue_gift)
    .bind(row.pending_hunt_raid)
    .bind(row.invite_cases_available)
    .bind(row.invite_cases_opened)
    .bind(&row.invited_user_ids)
    .bind(&row.extra)
    .bind(row.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(())
}

async fn insert_clan(tx: &mut Transaction<'_, Any>, row: &ClanRow) -> StoreResult<()> {
    sqlx::query("INSERT INTO clans (id, name, points, members, extra, updated_at) VALUES (?,?,?,?,?,?)")
    .bind(&row.id)
    .bind(&row.name)
    .bind(row.points)
    .bind(&row.members)
    .bind(&row.extra)
    .bind(row.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(())
}

async fn insert_invite(tx: &mut Transaction<'_, Any>, row: &ClanInviteRow) -> StoreResult<()> {
    sqlx::query("INSERT INTO clan_invites (playerId, clanId, fromId, expires, extra, updated_at) \
        VALUES (?,?,?,?,?,?)")
        .bind(row.player_id)
        .bind(&row.clan_id)
        .bind(row.from_id)
        .bind(row.expires)
        .bind(&row.extra)
        .bind(row.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn insert_battle(tx: &mut Transaction<'_, Any>, row: &ClanBattleRow) -> StoreResult<()> {
        sqlx::query("INSERT INTO clan_battles (id, clanId, opponentClanId, status, createdAt, acceptedBy, \
            data, updated_at) VALUES (?,?,?,?,?,?,?,?)")
        .bind(&row.id)
        .bind(&row.clan_id)
        .bind(&row.opponent_clan_id)
        .bind(&row.status)
        .bind(row.created_at)
        .bind(row.accepted_by)
        .bind(&row.data)
        .bind(row.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    // Silence unused-import warnings for types only referenced through the
    // schema conversion helpers above.
    #[allow(unused_imports)]
    use {Clan as _ClanAlias, ClanBattle as _ClanBattleAlias, ClanInvite as _ClanInviteAlias, Player as _PlayerAlias};
