//! The player entity.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::item::Item;

/// A single snapshot of a combat opponent (the player's current monster,
/// or the opponent state mirrored during a PvP duel). HP/stun/boost
/// counters live alongside the template so the kernel can mutate them
/// without touching the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatantState {
    pub hp: i64,
    pub max_hp: i64,
    pub stun: u32,
    pub damage_boost_turns: u32,
    pub damage_reduction_turns: u32,
    pub sign_radiation_used: bool,
    pub sign_final_used: bool,
}

impl CombatantState {
    pub fn new(hp: i64, max_hp: i64) -> Self {
        Self {
            hp,
            max_hp,
            ..Default::default()
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    pub fn reset_sign_one_shots(&mut self) {
        self.sign_radiation_used = false;
        self.sign_final_used = false;
    }

    /// If stunned, consume one stun turn and report that this turn is
    /// skipped. Decrements the counter whether or not the caller acts on
    /// the result.
    pub fn try_consume_stun(&mut self) -> bool {
        if self.stun > 0 {
            self.stun -= 1;
            true
        } else {
            false
        }
    }
}

/// The six exclusive inventory slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub armor: Option<Item>,
    pub helmet: Option<Item>,
    pub weapon: Option<Item>,
    pub mutation: Option<Item>,
    pub extra: Option<Item>,
    pub sign: Option<Item>,
}

impl Inventory {
    /// Place `item` into the slot matching its kind, replacing whatever was
    /// there.
    pub fn equip(&mut self, item: Item) {
        use super::item::ItemKind;
        let slot = match item.kind {
            ItemKind::Armor => &mut self.armor,
            ItemKind::Helmet => &mut self.helmet,
            ItemKind::Weapon => &mut self.weapon,
            ItemKind::Mutation => &mut self.mutation,
            ItemKind::Extra => &mut self.extra,
            ItemKind::Sign => &mut self.sign,
        };
        *slot = Some(item);
    }
}

/// A monster/opponent snapshot parked on the player while a PvE fight is
/// in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterSnapshot {
    pub name: String,
    pub weapon: Option<Item>,
    pub helmet: Option<Item>,
    pub sign: Option<Item>,
    pub state: CombatantState,
    pub infection_reward: i64,
    /// Chance of a kill-drop roll: weak 20% / medium 35% / fat 60%.
    #[serde(default)]
    pub drop_chance: f64,
    /// Boss kills always drop the final-sign template instead of rolling
    /// the regular drop pool.
    #[serde(default)]
    pub guaranteed_sign: bool,
}

/// Position within the danger-room branching tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerPosition {
    pub scenario_id: u32,
    pub branch_id: u32,
    pub step: u32,
}

/// An item proposed after a kill/event, awaiting a Take/Discard choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDrop {
    pub item: Item,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub username: Option<String>,
    pub name: String,

    pub hp: i64,
    pub max_hp: i64,
    pub infection: i64,
    pub crimecoins: i64,
    pub survival_days: i64,
    pub best_survival_days: i64,
    pub pvp_wins: i64,
    pub pvp_losses: i64,
    pub pvp_rating: i64,
    pub pvp_rating_best: i64,
    pub clan_id: Option<String>,

    pub inventory: Inventory,

    pub monster: Option<MonsterSnapshot>,
    pub monster_stun: u32,
    pub damage_boost_turns: u32,
    pub damage_reduction_turns: u32,
    pub radiation_boost: bool,
    pub first_attack: bool,
    pub pending_drop: Option<PendingDrop>,
    pub current_event: Option<String>,
    pub current_danger: Option<DangerPosition>,
    pub pending_rescue_gift: bool,
    pub pending_hunt_raid: bool,
    pub pvp: Option<MonsterSnapshot>,
    pub sign_radiation_used: bool,
    pub sign_final_used: bool,

    pub last_hunt: i64,
    pub last_gift_time: i64,
    pub last_pvp_start_at: i64,
    pub hunt_cooldown_warned: bool,
    pub invite_cases_available: i64,
    pub invite_cases_opened: i64,
    pub invited_user_ids: HashSet<i64>,

    /// Forward-compatible bag for unknown/legacy fields, kept as a typed
    /// map that survives a round trip through storage.
    #[serde(default)]
    pub extra: serde_json::Map<String, Value>,
}

pub const BASE_MAX_HP: i64 = 100;
pub const HUNT_COOLDOWN_SECS: i64 = 15;
pub const HUNT_COOLDOWN_ADMIN_SECS: i64 = 1;
pub const PVP_START_COOLDOWN_SECS: i64 = 20;
pub const RANKED_RATING_STEP: i64 = 35;

impl Player {
    /// Fresh defaults, idempotent by construction (callers never call this
    /// twice for the same row; the refresh path is `refresh_identity`).
    pub fn new(id: i64, username: Option<String>, name: String) -> Self {
        Self {
            id,
            username,
            name,
            hp: BASE_MAX_HP,
            max_hp: BASE_MAX_HP,
            first_attack: true,
            ..Default::default()
        }
    }

    /// Refresh path: update display identity without resetting any other
    /// field.
    pub fn refresh_identity(&mut self, username: Option<String>, name: String) {
        self.username = username;
        self.name = name;
    }

    /// Recompute `max_hp` from armor and clamp `hp` into `[0, max_hp]`.
    pub fn apply_armor_helmet_bonuses(&mut self) {
        let armor_hp = self.inventory.armor.as_ref().and_then(|a| a.hp).unwrap_or(0) as i64;
        self.max_hp = BASE_MAX_HP + armor_hp;
        self.hp = self.hp.clamp(0, self.max_hp);
    }

    pub fn helmet_block_percent(&self) -> u32 {
        self.inventory.helmet.as_ref().and_then(|h| h.block).unwrap_or(0)
    }

    pub fn weapon_dmg(&self) -> u32 {
        self.inventory.weapon.as_ref().and_then(|w| w.dmg).unwrap_or(0)
    }

    pub fn crit_chance(&self) -> f64 {
        self.inventory.mutation.as_ref().and_then(|m| m.crit).unwrap_or(0.0)
    }

    /// Clear every field that marks an active combat/event session so a
    /// fresh hunt starts from a clean slate.
    pub fn clear_combat_fields(&mut self) {
        self.monster = None;
        self.monster_stun = 0;
        self.damage_boost_turns = 0;
        self.damage_reduction_turns = 0;
        self.radiation_boost = false;
        self.first_attack = true;
        self.pending_drop = None;
        self.current_event = None;
        self.current_danger = None;
        self.pending_rescue_gift = false;
        self.pending_hunt_raid = false;
        self.pvp = None;
        self.sign_radiation_used = false;
        self.sign_final_used = false;
    }

    pub fn as_combatant_state(&self) -> CombatantState {
        CombatantState {
            hp: self.hp,
            max_hp: self.max_hp,
            stun: self.monster_stun,
            damage_boost_turns: self.damage_boost_turns,
            damage_reduction_turns: self.damage_reduction_turns,
            sign_radiation_used: self.sign_radiation_used,
            sign_final_used: self.sign_final_used,
        }
    }

    pub fn apply_combatant_state(&mut self, state: &CombatantState) {
        self.hp = state.hp.clamp(0, self.max_hp.max(state.max_hp));
        self.monster_stun = state.stun;
        self.damage_boost_turns = state.damage_boost_turns;
        self.damage_reduction_turns = state.damage_reduction_turns;
        self.sign_radiation_used = state.sign_radiation_used;
        self.sign_final_used = state.sign_final_used;
    }

    /// Winning a PvE fight or escaping a danger room (survival
    /// accounting).
    pub fn record_survival_win(&mut self) {
        self.survival_days += 1;
        self.best_survival_days = self.best_survival_days.max(self.survival_days);
    }

    /// Dying resets the streak but never the record.
    pub fn record_death(&mut self) {
        self.survival_days = 0;
    }

    pub fn grant_ranked_pvp_points(&mut self, amount: i64) {
        self.pvp_rating += amount;
        self.pvp_rating_best = self.pvp_rating_best.max(self.pvp_rating);
    }

    pub fn reset_pvp_rating(&mut self) {
        self.pvp_rating = 0;
    }

    pub fn is_hunt_on_cooldown(&self, now: i64, is_admin: bool) -> Option<i64> {
        let cooldown = if is_admin {
            HUNT_COOLDOWN_ADMIN_SECS
        } else {
            HUNT_COOLDOWN_SECS
        };
        let elapsed = now - self.last_hunt;
        if elapsed < cooldown {
            Some(cooldown - elapsed)
        } else {
            None
        }
    }

    pub fn is_pvp_start_on_cooldown(&self, now: i64) -> Option<i64> {
        let elapsed = now - self.last_pvp_start_at;
        if elapsed < PVP_START_COOLDOWN_SECS {
            Some(PVP_START_COOLDOWN_SECS - elapsed)
        } else {
            None
        }
    }

    pub fn ranked_stage(&self) -> usize {
        (self.pvp_rating.max(0) / RANKED_RATING_STEP) as usize
    }
}
