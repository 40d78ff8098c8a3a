//! Danger-room branching state machine.
//!
//! Scenario/branch selection is a uniform roll over a small static count;
//! the actual flavor text tables are out of scope here. This module owns
//! the mechanical walk: damage-per-step, exit-chance curve, and the
//! death/success terminal paths.

use crate::catalog::Catalog;
use crate::model::player::{DangerPosition, PendingDrop, Player};
use crate::rng;

use super::pve::weapon_helmet_mutation_extra_armor_pool;

/// Number of static scenarios/branches the content tables define. Only the
/// mechanical walk is in scope here; scenario/branch ids are opaque beyond
/// this bound.
pub const DANGER_SCENARIO_COUNT: u32 = 6;
pub const DANGER_BRANCH_COUNT: u32 = 3;
pub const DANGER_STEPS_PER_BRANCH: u32 = 3;

pub const DANGER_STEP_DAMAGE_FRACTION: f64 = 0.34;
pub const DANGER_DEATH_INFECTION_PENALTY: i64 = 100;
pub const DANGER_SUCCESS_INFECTION_REWARD: i64 = 100;
pub const DANGER_SUCCESS_DROP_CHANCE: f64 = 0.12;
pub const DANGER_EXIT_CHANCE_CAP: f64 = 0.70;

pub fn step_damage(max_hp: i64) -> i64 {
    ((max_hp as f64) * DANGER_STEP_DAMAGE_FRACTION).ceil() as i64
}

/// exit-chance table: 0.10 / 0.30 / 0.60 for steps 1–3, then
/// `0.60 + 0.10*(step-3)` capped at 0.70 beyond.
pub fn exit_chance(step: u32) -> f64 {
    match step {
        1 => 0.10,
        2 => 0.30,
        3 => 0.60,
        n => (0.60 + 0.10 * ((n - 3) as f64)).min(DANGER_EXIT_CHANCE_CAP),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DangerOutcome {
    Death,
    Success,
    Continue,
}

/// Enter the danger room: uniform scenario/branch, step reset to 1.
pub fn enter(player: &mut Player, _now: i64) {
    let scenario_id = rng::roll_index(DANGER_SCENARIO_COUNT as usize).unwrap_or(0) as u32;
    let branch_id = rng::roll_index(DANGER_BRANCH_COUNT as usize).unwrap_or(0) as u32;
    player.current_danger = Some(DangerPosition {
        scenario_id,
        branch_id,
        step: 1,
    });
}

/// Resolve one move (steps 1–3):
/// 1. apply step damage; death path on HP hitting 0 before the exit roll.
/// 2. otherwise roll exit chance; success path on hit, with a 12% chance
/// of an item drop from the catalog.
/// 3. otherwise advance to the next step and stay in the room.
pub fn resolve_move(player: &mut Player, catalog: &Catalog) -> DangerOutcome {
    let Some(mut pos) = player.current_danger else {
        return DangerOutcome::Continue;
    };

    let damage = step_damage(player.max_hp);
    player.hp = (player.hp - damage).max(0);

    if player.hp <= 0 {
        player.infection = (player.infection - DANGER_DEATH_INFECTION_PENALTY).max(0);
        player.record_death();
        player.hp = player.max_hp;
        player.current_danger = None;
        return DangerOutcome::Death;
    }

    if rng::roll_chance(exit_chance(pos.step)) {
        player.infection += DANGER_SUCCESS_INFECTION_REWARD;
        player.record_survival_win();
        player.current_danger = None;
        if rolls_item_drop() {
            let pool = weapon_helmet_mutation_extra_armor_pool(catalog);
            if let Some(item) = crate::loot::pick_random_item(&pool) {
                player.pending_drop = Some(PendingDrop { item });
            }
        }
        return DangerOutcome::Success;
    }

    pos.step += 1;
    player.current_danger = Some(pos);
    DangerOutcome::Continue
}

pub fn rolls_item_drop() -> bool {
    rng::roll_chance(DANGER_SUCCESS_DROP_CHANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn player_at(step: u32, max_hp: i64) -> Player {
        let mut p = Player::new(1, None, "a".into());
        p.max_hp = max_hp;
        p.hp = max_hp;
        p.current_danger = Some(DangerPosition {
            scenario_id: 0,
            branch_id: 0,
            step,
        });
        p
    }

    #[test]
    fn exit_chance_matches_static_table() {
        assert_eq!(exit_chance(1), 0.10);
        assert_eq!(exit_chance(2), 0.30);
        assert_eq!(exit_chance(3), 0.60);
        assert_eq!(exit_chance(4), 0.70);
        assert_eq!(exit_chance(10), 0.70);
    }

    #[test]
    fn concrete_scenario_walk_matches_table() {
        // scenario 4: maxHp=100, step1, force exit-roll fail, then succeed.
        let catalog = Catalog::new();
        let mut p = player_at(1, 100);
        rng::clear_forced();
        rng::force_unit(0.99); // exit roll fails
        let outcome = resolve_move(&mut p, &catalog);
        assert_eq!(outcome, DangerOutcome::Continue);
        assert_eq!(p.hp, 66);
        assert_eq!(p.current_danger.unwrap().step, 2);

        rng::force_unit(0.01); // exit roll succeeds
        rng::force_unit(0.99); // drop roll fails
        let before_infection = p.infection;
        let outcome = resolve_move(&mut p, &catalog);
        assert_eq!(outcome, DangerOutcome::Success);
        assert_eq!(p.infection, before_infection + DANGER_SUCCESS_INFECTION_REWARD);
        assert_eq!(p.survival_days, 1);
        assert!(p.current_danger.is_none());
    }

    #[test]
    fn successful_exit_with_drop_roll_grants_pending_drop() {
        let catalog = Catalog::load(vec![crate::model::item::Item::new(
            "Scrap Knife",
            crate::model::item::ItemKind::Weapon,
            1.0,
        )]);
        let mut p = player_at(3, 100);
        rng::clear_forced();
        rng::force_unit(0.01); // exit roll succeeds
        rng::force_unit(0.0); // drop roll succeeds
        rng::force_unit(0.0); // item pick
        let outcome = resolve_move(&mut p, &catalog);
        assert_eq!(outcome, DangerOutcome::Success);
        assert!(p.pending_drop.is_some());
    }

    #[test]
    fn death_path_resets_survival_and_clears_danger() {
        let catalog = Catalog::new();
        let mut p = player_at(1, 100);
        p.hp = 10; // step damage (34) will kill
        p.survival_days = 5;
        rng::clear_forced();
        let outcome = resolve_move(&mut p, &catalog);
        assert_eq!(outcome, DangerOutcome::Death);
        assert_eq!(p.hp, p.max_hp);
        assert_eq!(p.survival_days, 0);
        assert!(p.current_danger.is_none());
    }
}
