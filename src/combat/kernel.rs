//! The shared attack resolver, used verbatim by PvE, PvP, clan battles and
//! raids. This is the one place damage math lives; every engine calls into
//! it instead of reimplementing the formula.

use crate::model::item::{ExtraEffect, Item, PreventLethal};
use crate::model::player::CombatantState;
use crate::rng;

use super::events::CombatEvent;

pub struct Attacker<'a> {
    pub name: &'a str,
    pub weapon: Option<&'a Item>,
    pub crit_chance: f64,
    pub extra: Option<&'a Item>,
    pub sign: Option<&'a Item>,
}

pub struct Defender<'a> {
    pub name: &'a str,
    pub helmet_block_percent: u32,
    pub sign: Option<&'a Item>,
}

fn ceil_div_percent(value: i64, percent: u32) -> i64 {
    ((value as f64) * (percent as f64) / 100.0).ceil() as i64
}

/// Apply a first-applicable unused sign protection if `state.hp <= 0`.
/// Returns the protection event if one fired.
fn try_sign_save(defender: &Defender,
    defender_state: &mut CombatantState,
    attacker_state: &mut CombatantState,
    events: &mut Vec<CombatEvent>) {
    if defender_state.hp > 0 {
        return;
    }
    let Some(sign) = defender.sign else { return };
    let Some(effect) = &sign.sign else { return };
    match effect.prevent_lethal {
        Some(PreventLethal::Radiation) if !defender_state.sign_radiation_used => {
            defender_state.sign_radiation_used = true;
            defender_state.hp = 1;
            if effect.extra_turn {
                attacker_state.stun = attacker_state.stun.max(1);
            }
            events.push(CombatEvent::SavedByRadiationSign {
                defender: defender.name.to_string(),
            });
        }
        Some(PreventLethal::Final) if effect.full_heal && !defender_state.sign_final_used => {
            defender_state.sign_final_used = true;
            defender_state.hp = defender_state.max_hp;
            events.push(CombatEvent::SavedByFinalSign {
                defender: defender.name.to_string(),
            });
        }
        _ => {}
    }
}

/// Run one full attack exchange: `attacker` hits `defender`. Mutates both
/// combat states in place and returns the ordered event trail.
pub fn resolve_attack(attacker: &Attacker,
    attacker_state: &mut CombatantState,
    defender: &Defender,
    defender_state: &mut CombatantState,
    radiation_boost_triggered: &mut bool) -> Vec<CombatEvent> {
    let mut events = Vec::new();

    // 1. Extra-item chance (30%).
    if let Some(extra) = attacker.extra {
        if rng::roll_chance(0.30) {
            if let Some(effect) = extra.effect {
                events.push(CombatEvent::ExtraTriggered {
                    actor: attacker.name.to_string(),
                    effect: format!("{effect:?}"),
                });
                match effect {
                    ExtraEffect::Stun2 => {
                        defender_state.stun = extra.turns.unwrap_or(2);
                    }
                    ExtraEffect::Damage50 => {
                        defender_state.hp = (defender_state.hp - 50).max(0);
                        try_sign_save(defender, defender_state, attacker_state, &mut events);
                    }
                    ExtraEffect::Damage100 => {
                        defender_state.hp = (defender_state.hp - 100).max(0);
                        try_sign_save(defender, defender_state, attacker_state, &mut events);
                    }
                    ExtraEffect::HalfDamage1 => {
                        attacker_state.damage_reduction_turns = extra.turns.unwrap_or(1);
                    }
                    ExtraEffect::DoubleDamage1 => {
                        attacker_state.damage_boost_turns = extra.turns.unwrap_or(1);
                    }
                    ExtraEffect::DoubleInfection => {
                        *radiation_boost_triggered = true;
                    }
                }
            }
        }
    }

    if defender_state.is_dead() {
        return events;
    }

    // 2. Base damage.
    let weapon_name = Item::weapon_name_or_fists(attacker.weapon);
    let weapon_dmg = attacker.weapon.and_then(|w| w.dmg).unwrap_or(0) as i64;
    let mut damage = rng::roll_range(10, 39) + weapon_dmg;
    events.push(CombatEvent::AttackRolled {
        actor: attacker.name.to_string(),
        weapon: weapon_name.to_string(),
        damage,
    });

    // 3. Crit.
    if attacker.crit_chance > 0.0 && rng::roll_chance(attacker.crit_chance) {
        damage *= 2;
        events.push(CombatEvent::CriticalHit {
            actor: attacker.name.to_string(),
        });
    }

    // 4. Boost consumption.
    if attacker_state.damage_boost_turns > 0 {
        damage *= 2;
        attacker_state.damage_boost_turns -= 1;
        events.push(CombatEvent::BoostConsumed {
            actor: attacker.name.to_string(),
        });
    }

    // 5. Defender reduction.
    if defender_state.damage_reduction_turns > 0 {
        damage = ((damage as f64) / 2.0).ceil() as i64;
        defender_state.damage_reduction_turns -= 1;
        events.push(CombatEvent::ReductionApplied {
            defender: defender.name.to_string(),
        });
    }

    // 6. Dodge.
    let mut dodged = false;
    if let Some(sign) = defender.sign {
        if let Some(effect) = &sign.sign {
            if let Some(chance) = effect.dodge_chance {
                if rng::roll_chance(chance) {
                    dodged = true;
                    damage = 0;
                    events.push(CombatEvent::Dodged {
                        defender: defender.name.to_string(),
                    });
                }
            }
        }
    }

    // 7. Helmet block.
    if !dodged && defender.helmet_block_percent > 0 {
        let blocked = ceil_div_percent(damage, defender.helmet_block_percent);
        damage -= blocked;
        if blocked > 0 {
            events.push(CombatEvent::HelmetBlocked {
                defender: defender.name.to_string(),
                blocked,
            });
        }
    }

    // 8. Apply.
    defender_state.hp = (defender_state.hp - damage).max(0);
    events.push(CombatEvent::DamageDealt {
        defender: defender.name.to_string(),
        damage,
        remaining_hp: defender_state.hp,
    });

    // 9. Vampirism.
    if damage > 0 {
        if let Some(sign) = attacker.sign {
            if let Some(effect) = &sign.sign {
                if let Some(fraction) = effect.vampirism {
                    let healed = ((damage as f64) * fraction).ceil() as i64;
                    if healed > 0 {
                        attacker_state.hp = (attacker_state.hp + healed).min(attacker_state.max_hp);
                        events.push(CombatEvent::Vampirism {
                            actor: attacker.name.to_string(),
                            healed,
                        });
                    }
                }
            }
        }
    }

    // 10. Sign save-from-death.
    try_sign_save(defender, defender_state, attacker_state, &mut events);

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::{ItemKind, SignEffect};

    fn state(hp: i64, max_hp: i64) -> CombatantState {
        CombatantState::new(hp, max_hp)
    }

    #[test]
    fn dodge_prevents_vampirism_heal() {
        rng::clear_forced();
        rng::force_unit(0.99); // no extra trigger
        rng::force_range(10, 39, 20);
        rng::force_unit(0.0); // dodge roll succeeds (chance 1.0 below)

        let sign = Item {
            sign: Some(SignEffect {
                vampirism: Some(0.5),
                ..Default::default()
            }),
            ..Item::new("Vamp Sign", ItemKind::Sign, 1.0)
        };
        let dodge_sign = Item {
            sign: Some(SignEffect {
                dodge_chance: Some(1.0),
                ..Default::default()
            }),
            ..Item::new("Dodge Sign", ItemKind::Sign, 1.0)
        };

        let attacker = Attacker {
            name: "A",
            weapon: None,
            crit_chance: 0.0,
            extra: None,
            sign: Some(&sign),
        };
        let defender = Defender {
            name: "D",
            helmet_block_percent: 0,
            sign: Some(&dodge_sign),
        };
        let mut attacker_state = state(100, 100);
        let mut defender_state = state(100, 100);
        let mut radiation = false;

        let events = resolve_attack(&attacker, &mut attacker_state, &defender, &mut defender_state, &mut radiation);

        assert_eq!(defender_state.hp, 100);
        assert_eq!(attacker_state.hp, 100);
        assert!(events.iter().any(|e| matches!(e, CombatEvent::Dodged { .. })));
        assert!(!events.iter().any(|e| matches!(e, CombatEvent::Vampirism { .. })));
    }

    #[test]
    fn sign_save_from_death_consumes_one_shot() {
        rng::clear_forced();
        rng::force_unit(0.99); // no extra trigger
        rng::force_range(10, 39, 39);

        let sign = Item {
            sign: Some(SignEffect {
                prevent_lethal: Some(PreventLethal::Radiation),
                extra_turn: true,
                ..Default::default()
            }),
            ..Item::new("Знак радиации", ItemKind::Sign, 1.0)
        };

        let attacker = Attacker {
            name: "Monster",
            weapon: Some(&Item { dmg: Some(11), ..Item::new("Club", ItemKind::Weapon, 1.0) }),
            crit_chance: 0.0,
            extra: None,
            sign: None,
        };
        let defender = Defender {
            name: "Player",
            helmet_block_percent: 0,
            sign: Some(&sign),
        };

        let mut attacker_state = state(100, 100);
        let mut defender_state = state(5, 100);
        let mut radiation = false;

        let events = resolve_attack(&attacker, &mut attacker_state, &defender, &mut defender_state, &mut radiation);
        assert_eq!(defender_state.hp, 1);
        assert!(defender_state.sign_radiation_used);
        assert!(attacker_state.stun >= 1);
        assert!(events.iter().any(|e| matches!(e, CombatEvent::SavedByRadiationSign { .. })));

        // A second lethal hit does not trigger the one-shot again.
        rng::force_unit(0.99);
        rng::force_range(10, 39, 39);
        attacker_state.stun = 0;
        resolve_attack(&attacker, &mut attacker_state, &defender, &mut defender_state, &mut radiation);
        assert_eq!(defender_state.hp, 0);
    }

    #[test]
    fn helmet_blocks_partial_damage() {
        rng::clear_forced();
        rng::force_unit(0.99);
        rng::force_range(10, 39, 20);

        let attacker = Attacker { name: "A", weapon: None, crit_chance: 0.0, extra: None, sign: None };
        let defender = Defender { name: "D", helmet_block_percent: 50, sign: None };
        let mut attacker_state = state(100, 100);
        let mut defender_state = state(100, 100);
        let mut radiation = false;
        resolve_attack(&attacker, &mut attacker_state, &defender, &mut defender_state, &mut radiation);
        // 20 damage, 50% blocked -> ceil(10) = 10 blocked, 10 applied
        assert_eq!(defender_state.hp, 90);
    }
}
