//! Solo PvE hunt loop. Danger-room branching lives in [`super::danger`];
//! this module owns the event ladder, the monster combat loop, and drop
//! resolution.

use crate::catalog::Catalog;
use crate::combat::{resolve_attack, Attacker, CombatEvent, Defender};
use crate::error::{EngineError, EngineResult};
use crate::model::item::{CaseType, Item, ItemKind};
use crate::model::player::{MonsterSnapshot, PendingDrop, Player};
use crate::model::WorldState;
use crate::rng;

/// Cumulative-probability ladder checked in order. Each branch consumes
/// its own roll; the remainder falls through to a normal monster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuntEvent {
    Rescue,
    HuntRaidInvite,
    SupplyDrop,
    Boss,
    Special,
    Danger,
    Story,
    NormalMonster,
}

const RESCUE_CHANCE: f64 = 0.01;
const HUNT_RAID_CHANCE: f64 = 0.05;
const SUPPLY_DROP_CHANCE: f64 = 0.12;
const BOSS_CHANCE: f64 = 0.05;
const SPECIAL_CHANCE: f64 = 0.01;
const DANGER_CHANCE: f64 = 0.10;
const STORY_CHANCE: f64 = 0.075;

pub fn roll_hunt_event() -> HuntEvent {
    let r = rng::roll_unit();
    let mut cumulative = 0.0;
    cumulative += RESCUE_CHANCE;
    if r < cumulative {
        return HuntEvent::Rescue;
    }
    cumulative += HUNT_RAID_CHANCE;
    if r < cumulative {
        return HuntEvent::HuntRaidInvite;
    }
    cumulative += SUPPLY_DROP_CHANCE;
    if r < cumulative {
        return HuntEvent::SupplyDrop;
    }
    cumulative += BOSS_CHANCE;
    if r < cumulative {
        return HuntEvent::Boss;
    }
    cumulative += SPECIAL_CHANCE;
    if r < cumulative {
        return HuntEvent::Special;
    }
    cumulative += DANGER_CHANCE;
    if r < cumulative {
        return HuntEvent::Danger;
    }
    cumulative += STORY_CHANCE;
    if r < cumulative {
        return HuntEvent::Story;
    }
    HuntEvent::NormalMonster
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonsterTier {
    Weak,
    Medium,
    Fat,
}

impl MonsterTier {
    pub fn roll() -> Self {
        let r = rng::roll_unit();
        if r < 0.80 {
            MonsterTier::Weak
        } else if r < 0.96 {
            MonsterTier::Medium
        } else {
            MonsterTier::Fat
        }
    }

    pub fn hp_range(self) -> (i64, i64) {
        match self {
            MonsterTier::Weak => (50, 130),
            MonsterTier::Medium => (201, 400),
            MonsterTier::Fat => (701, 900),
        }
    }

    pub fn dmg_range(self) -> (u32, u32) {
        match self {
            MonsterTier::Weak => (11, 26),
            MonsterTier::Medium => (51, 86),
            MonsterTier::Fat => (301, 351),
        }
    }

    pub fn base_infection_reward(self) -> i64 {
        match self {
            MonsterTier::Weak => 20,
            MonsterTier::Medium => 35,
            MonsterTier::Fat => 60,
        }
    }

    pub fn drop_chance(self) -> f64 {
        match self {
            MonsterTier::Weak => 0.20,
            MonsterTier::Medium => 0.35,
            MonsterTier::Fat => 0.60,
        }
    }
}

pub const BOSS_HP: i64 = 5300;
pub const BOSS_DMG: u32 = 600;
pub const BOSS_INFECTION_REWARD: i64 = 200;
pub const SPECIAL_HP: i64 = 2222;
pub const SPECIAL_DMG: u32 = 333;
pub const SPECIAL_KILL_INFECTION: i64 = 200;
pub const SPECIAL_DEATH_INFECTION_PENALTY: i64 = 100;
pub const SUPPLY_MEDKIT_HP: i64 = 100;
pub const SUPPLY_FOOD_HP: i64 = 30;

pub(crate) fn weapon_helmet_mutation_extra_armor_pool(catalog: &Catalog) -> Vec<&Item> {
    let mut pool = Vec::new();
    pool.extend(catalog.items_by_kind(ItemKind::Weapon));
    pool.extend(catalog.items_by_kind(ItemKind::Helmet));
    pool.extend(catalog.items_by_kind(ItemKind::Mutation));
    pool.extend(catalog.items_by_kind(ItemKind::Extra));
    pool.extend(catalog.items_by_kind(ItemKind::Armor));
    pool
}

/// `hunt` entry point: cooldown-gated, clears stale combat state, rolls
/// the event ladder and applies the resulting branch.
pub fn hunt(state: &mut WorldState,
    catalog: &Catalog,
    player_id: i64,
    now: i64,
    is_admin: bool) -> EngineResult<HuntEvent> {
    let player = state
    .players
    .get_mut(&player_id)
    .ok_or(EngineError::PlayerNotFound(player_id))?;

    if let Some(remaining) = player.is_hunt_on_cooldown(now, is_admin) {
        if !player.hunt_cooldown_warned {
            player.hunt_cooldown_warned = true;
        }
        return Err(EngineError::HuntCooldown {
            remaining_secs: remaining,
        });
    }
    player.hunt_cooldown_warned = false;
    player.last_hunt = now;
    player.clear_combat_fields();
    player.apply_armor_helmet_bonuses();

    let event = roll_hunt_event();
    match event {
        HuntEvent::Rescue => {
            player.current_event = Some("rescue".to_string());
        }
        HuntEvent::HuntRaidInvite => {
            player.pending_hunt_raid = true;
        }
        HuntEvent::SupplyDrop => apply_supply_drop(player),
        HuntEvent::Boss => spawn_boss(player),
        HuntEvent::Special => spawn_special(player),
        HuntEvent::Danger => {
            crate::engines::danger::enter(player, now);
        }
        HuntEvent::Story => {
            player.current_event = Some("story".to_string());
        }
        HuntEvent::NormalMonster => spawn_normal_monster(player),
    }
    Ok(event)
}

fn apply_supply_drop(player: &mut Player) {
    let heal = if rng::roll_chance(0.5) {
        SUPPLY_MEDKIT_HP
    } else {
        SUPPLY_FOOD_HP
    };
    player.hp = (player.hp + heal).min(player.max_hp);
    player.record_survival_win();
}

fn spawn_boss(player: &mut Player) {
    player.monster = Some(MonsterSnapshot {
        name: "Босс".to_string(),
        weapon: Some(Item {
            dmg: Some(BOSS_DMG),
            ..Item::new("Boss Fists", ItemKind::Weapon, 0.0)
        }),
        helmet: None,
        sign: None,
        state: crate::model::player::CombatantState::new(BOSS_HP, BOSS_HP),
        infection_reward: BOSS_INFECTION_REWARD,
        drop_chance: 1.0,
        guaranteed_sign: true,
    });
}

fn spawn_special(player: &mut Player) {
    player.monster = Some(MonsterSnapshot {
        name: "Особь".to_string(),
        weapon: Some(Item {
            dmg: Some(SPECIAL_DMG),
            ..Item::new("Special Claws", ItemKind::Weapon, 0.0)
        }),
        helmet: None,
        sign: None,
        state: crate::model::player::CombatantState::new(SPECIAL_HP, SPECIAL_HP),
        infection_reward: SPECIAL_KILL_INFECTION,
        drop_chance: 1.0,
        guaranteed_sign: false,
    });
}

fn spawn_normal_monster(player: &mut Player) {
    let tier = MonsterTier::roll();
    let (lo_hp, hi_hp) = tier.hp_range();
    let (lo_dmg, hi_dmg) = tier.dmg_range();
    let hp = rng::roll_range(lo_hp, hi_hp);
    let dmg = rng::roll_range(lo_dmg as i64, hi_dmg as i64) as u32;
    let mut reward = tier.base_infection_reward();
    if player.radiation_boost {
        reward *= 2;
        player.radiation_boost = false;
    }
    player.monster = Some(MonsterSnapshot {
        name: match tier {
            MonsterTier::Weak => "Слабый мутант".to_string(),
            MonsterTier::Medium => "Мутант".to_string(),
            MonsterTier::Fat => "Жирный мутант".to_string(),
        },
        weapon: Some(Item {
            dmg: Some(dmg),
            ..Item::new("Monster Claws", ItemKind::Weapon, 0.0)
        }),
        helmet: None,
        sign: None,
        state: crate::model::player::CombatantState::new(hp, hp),
        infection_reward: reward,
        drop_chance: tier.drop_chance(),
        guaranteed_sign: false,
    });
}

/// One attack exchange: player hits the monster via the shared combat
/// kernel; if the monster survives, it retaliates with a simplified
/// inverse resolution (block/dodge/sign-save only, no extra-item or crit).
pub fn attack(state: &mut WorldState,
    catalog: &Catalog,
    player_id: i64) -> EngineResult<Vec<CombatEvent>> {
    let player = state
    .players
    .get_mut(&player_id)
    .ok_or(EngineError::PlayerNotFound(player_id))?;
    let mut monster = player.monster.take().ok_or(EngineError::NotInCombat)?;
    player.first_attack = false;

    let mut all_events = Vec::new();
    let mut player_state = player.as_combatant_state();
    let mut radiation_triggered = false;

    if player_state.try_consume_stun() {
        all_events.push(CombatEvent::Stunned { actor: player.name.clone() });
    } else {
        let attacker = Attacker {
            name: &player.name,
            weapon: player.inventory.weapon.as_ref(),
            crit_chance: player.crit_chance(),
            extra: player.inventory.extra.as_ref(),
            sign: player.inventory.sign.as_ref(),
        };
        let defender = Defender {
            name: &monster.name,
            helmet_block_percent: monster.helmet.as_ref().and_then(|h| h.block).unwrap_or(0),
            sign: monster.sign.as_ref(),
        };
        all_events.extend(resolve_attack(&attacker,
            &mut player_state,
            &defender,
            &mut monster.state,
            &mut radiation_triggered));
    }

    if radiation_triggered {
        player.radiation_boost = true;
    }
    player.apply_combatant_state(&player_state);

    if monster.state.is_dead() {
        let reward = monster.infection_reward;
        player.infection += reward;
        player.record_survival_win();
        let drop = if monster.guaranteed_sign {
            let signs = catalog.items_by_kind(ItemKind::Sign);
            crate::loot::pick_random_sign(&signs)
        } else {
            roll_drop_with_catalog(catalog, monster.drop_chance)
        };
        player.monster = None;
        if let Some(item) = drop {
            player.pending_drop = Some(PendingDrop { item });
        }
        return Ok(all_events);
    }

    // Monster retaliates: simplified inverse of the shared combat kernel, no extra/crit.
    let mut monster_state = monster.state.clone();
    if monster_state.try_consume_stun() {
        all_events.push(CombatEvent::Stunned { actor: monster.name.clone() });
    } else {
        let attacker = Attacker {
            name: &monster.name,
            weapon: monster.weapon.as_ref(),
            crit_chance: 0.0,
            extra: None,
            sign: None,
        };
        let defender = Defender {
            name: &player.name,
            helmet_block_percent: player.helmet_block_percent(),
            sign: player.inventory.sign.as_ref(),
        };
        let mut unused_radiation = false;
        all_events.extend(resolve_attack(&attacker,
            &mut monster_state,
            &defender,
            &mut player_state,
            &mut unused_radiation));
    }
    monster.state = monster_state;
    player.apply_combatant_state(&player_state);
    player.monster = Some(monster);

    if player.hp <= 0 {
        player.infection = (player.infection - 0).max(0);
        player.record_death();
        player.monster = None;
    }

    Ok(all_events)
}

/// Flee is only legal before the first attack lands.
pub fn flee(state: &mut WorldState, player_id: i64) -> EngineResult<()> {
    let player = state
    .players
    .get_mut(&player_id)
    .ok_or(EngineError::PlayerNotFound(player_id))?;
    if !player.first_attack {
        return Err(EngineError::CannotFlee);
    }
    player.monster = None;
    Ok(())
}

/// Kill-drop resolution: the drop pool is the union of weapon, helmet,
/// mutation, extra, and armor templates.
pub fn roll_drop_with_catalog(catalog: &Catalog, tier_drop_chance: f64) -> Option<Item> {
    if !rng::roll_chance(tier_drop_chance) {
        return None;
    }
    let pool = weapon_helmet_mutation_extra_armor_pool(catalog);
    crate::loot::pick_random_item(&pool)
}

pub fn handle_story_tap(player: &mut Player) -> bool {
    let good = rng::roll_chance(0.5);
    if good {
        let reward = rng::roll_range(100, 250);
        player.infection += reward;
        player.record_survival_win();
    } else {
        let penalty = rng::roll_range(20, 80);
        player.infection = (player.infection - penalty).max(0);
    }
    player.current_event = None;
    good
}

pub fn fight_special_death(player: &mut Player) {
    player.infection = (player.infection - SPECIAL_DEATH_INFECTION_PENALTY).max(0);
    player.record_death();
    player.monster = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::player::{Player, HUNT_COOLDOWN_SECS};

    fn world_with(player: Player) -> WorldState {
        let mut w = WorldState::new();
        w.players.insert(player.id, player);
        w
    }

    #[test]
    fn hunt_refuses_within_cooldown_window() {
        let mut p = Player::new(1, None, "a".into());
        p.last_hunt = 1000;
        let mut world = world_with(p);
        let catalog = Catalog::new();
        let err = hunt(&mut world, &catalog, 1, 1000 + HUNT_COOLDOWN_SECS - 1, false).unwrap_err();
        assert!(matches!(err, EngineError::HuntCooldown { .. }));
    }

    #[test]
    fn hunt_allows_at_cooldown_boundary() {
        let mut p = Player::new(1, None, "a".into());
        p.last_hunt = 1000;
        let mut world = world_with(p);
        let catalog = Catalog::new();
        rng::clear_forced();
        rng::force_unit(0.99); // forces normal-monster branch
        rng::force_unit(0.5); // tier roll
        rng::force_range(50, 130, 80);
        rng::force_range(11, 26, 15);
        let event = hunt(&mut world, &catalog, 1, 1000 + HUNT_COOLDOWN_SECS, false).unwrap();
        assert_eq!(event, HuntEvent::NormalMonster);
    }

    #[test]
    fn normal_monster_kill_grants_survival_and_infection() {
        let mut p = Player::new(1, None, "a".into());
        p.monster = Some(MonsterSnapshot {
            name: "Test".into(),
            weapon: None,
            helmet: None,
            sign: None,
            state: crate::model::player::CombatantState::new(1, 100),
            infection_reward: 20,
            drop_chance: 0.0,
            guaranteed_sign: false,
        });
        let mut world = world_with(p);

        rng::clear_forced();
        rng::force_unit(0.99); // no extra trigger
        rng::force_range(10, 39, 39); // lethal base damage

        let catalog = Catalog::new();
        attack(&mut world, &catalog, 1).unwrap();
        let player = world.players.get(&1).unwrap();
        assert!(player.monster.is_none());
        assert_eq!(player.infection, 20);
        assert_eq!(player.survival_days, 1);
    }

    #[test]
    fn flee_rejected_after_first_attack() {
        let mut p = Player::new(1, None, "a".into());
        p.first_attack = false;
        let mut world = world_with(p);
        let err = flee(&mut world, 1).unwrap_err();
        assert!(matches!(err, EngineError::CannotFlee));
    }

    #[test]
    fn flee_allowed_before_first_attack() {
        let mut p = Player::new(1, None, "a".into());
        p.monster = Some(MonsterSnapshot {
            name: "Test".into(),
            weapon: None,
            helmet: None,
            sign: None,
            state: crate::model::player::CombatantState::new(10, 10),
            infection_reward: 0,
            drop_chance: 0.0,
            guaranteed_sign: false,
        });
        let mut world = world_with(p);
        flee(&mut world, 1).unwrap();
        assert!(world.players.get(&1).unwrap().monster.is_none());
    }

    #[test]
    fn monster_tier_boundaries_match_spec_weights() {
        rng::clear_forced();
        rng::force_unit(0.79);
        assert_eq!(MonsterTier::roll(), MonsterTier::Weak);
        rng::force_unit(0.80);
        assert_eq!(MonsterTier::roll(), MonsterTier::Medium);
        rng::force_unit(0.96);
        assert_eq!(MonsterTier::roll(), MonsterTier::Fat);
    }
}
