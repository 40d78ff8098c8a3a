//! Property tests for core invariants: clan membership stays a bijection
//! under any sequence of membership ops, clan points never go negative,
//! and the combat kernel never drives HP below zero regardless of roll
//! outcomes.

use proptest::prelude::*;

use wasteland_bot::combat::{resolve_attack, Attacker, Defender};
use wasteland_bot::engines::clan;
use wasteland_bot::model::clan::Clan;
use wasteland_bot::model::player::{CombatantState, Player};
use wasteland_bot::model::WorldState;
use wasteland_bot::rng;

#[derive(Debug, Clone, Copy)]
enum ClanOp {
    Create(u8),
    Invite { inviter: u8, invitee: u8 },
    Accept(u8),
    Leave(u8),
    Kick { leader: u8, target: u8 },
}

fn clan_op_strategy() -> impl Strategy<Value = ClanOp> {
    prop_oneof![
        (0u8..6).prop_map(ClanOp::Create),
        (0u8..6, 0u8..6).prop_map(|(inviter, invitee)| ClanOp::Invite { inviter, invitee }),
        (0u8..6).prop_map(ClanOp::Accept),
        (0u8..6).prop_map(ClanOp::Leave),
        (0u8..6, 0u8..6).prop_map(|(leader, target)| ClanOp::Kick { leader, target }),
    ]
}

proptest! {
    /// However a sequence of create/invite/accept/leave/kick plays out
    /// (including on invalid preconditions, which just return an `Err`
    /// that's ignored here), the membership invariant never breaks.
    #[test]
    fn clan_membership_invariant_survives_any_op_sequence(ops in prop::collection::vec(clan_op_strategy(), 0..40)) {
        let mut world = WorldState::new();
        for id in 0u8..6 {
            world.players.insert(id as i64, Player::new(id as i64, None, format!("p{id}")));
        }

        for op in ops {
            match op {
                ClanOp::Create(id) => {
                    let _ = clan::create_clan(&mut world, id as i64, format!("clan-{id}"), format!("Clan{id}"));
                }
                ClanOp::Invite { inviter, invitee } => {
                    let _ = clan::invite_to_clan(&mut world, inviter as i64, invitee as i64, 0);
                }
                ClanOp::Accept(id) => {
                    let _ = clan::accept_invite(&mut world, id as i64, 0);
                }
                ClanOp::Leave(id) => {
                    let _ = clan::leave_clan(&mut world, id as i64);
                }
                ClanOp::Kick { leader, target } => {
                    let _ = clan::kick_member(&mut world, leader as i64, target as i64);
                }
            }
            prop_assert!(world.check_clan_membership_invariant());
        }
    }

    /// `Clan::add_points` floors at zero no matter how large or negative
    /// the delta sequence ("a clan's points never go negative").
    #[test]
    fn clan_points_never_go_negative(deltas in prop::collection::vec(-2000i64..2000, 1..50)) {
        let mut clan = Clan::new("c1", "Clan", 1);
        for delta in deltas {
            clan.add_points(delta);
            prop_assert!(clan.points >= 0);
        }
    }

    /// Regardless of roll outcomes (forced or free), the combat kernel
    /// never leaves either combatant's HP outside `[0, max_hp]` after one
    /// exchange (invariant).
    #[test]
    fn resolve_attack_keeps_hp_within_bounds(attacker_hp in 1i64..200,
        defender_hp in 1i64..200,
        weapon_dmg in 0u32..100,
        crit_chance in 0.0f64..1.0,
        helmet_block in 0u32..100) {
        rng::clear_rng();
        let weapon = wasteland_bot::model::item::Item {
            dmg: Some(weapon_dmg),
            ..wasteland_bot::model::item::Item::new("W", wasteland_bot::model::item::ItemKind::Weapon, 1.0)
        };
        let attacker = Attacker {
            name: "A",
            weapon: Some(&weapon),
            crit_chance,
            extra: None,
            sign: None,
        };
        let defender = Defender {
            name: "D",
            helmet_block_percent: helmet_block,
            sign: None,
        };
        let mut attacker_state = CombatantState::new(attacker_hp, attacker_hp.max(1));
        let mut defender_state = CombatantState::new(defender_hp, defender_hp.max(1));
        let mut radiation = false;

        resolve_attack(&attacker, &mut attacker_state, &defender, &mut defender_state, &mut radiation);

        prop_assert!(attacker_state.hp >= 0 && attacker_state.hp <= attacker_state.max_hp);
        prop_assert!(defender_state.hp >= 0 && defender_state.hp <= defender_state.max_hp);
    }
}
