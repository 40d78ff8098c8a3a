//! Item templates: immutable catalog entries copied by value
//! into a player's inventory slot.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    Armor,
    Helmet,
    Weapon,
    Mutation,
    Extra,
    Sign,
}

impl ItemKind {
    pub fn slot_name(self) -> &'static str {
        match self {
            ItemKind::Armor => "armor",
            ItemKind::Helmet => "helmet",
            ItemKind::Weapon => "weapon",
            ItemKind::Mutation => "mutation",
            ItemKind::Extra => "extra",
            ItemKind::Sign => "sign",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RarityKey {
    Common,
    Rare,
    VeryRare,
    Legendary,
}

impl RarityKey {
    /// Display emoji for this rarity tier.
    pub fn emoji(self) -> &'static str {
        match self {
            RarityKey::Common => "⚪",
            RarityKey::Rare => "🔵",
            RarityKey::VeryRare => "🟣",
            RarityKey::Legendary => "🟡",
        }
    }
}

/// One-shot extra-item effect (Item, `extra.effect`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraEffect {
    Stun2,
    Damage50,
    Damage100,
    HalfDamage1,
    DoubleDamage1,
    DoubleInfection,
}

/// What a defender's sign is allowed to block lethal damage with (Item,
/// `sign.preventLethal`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreventLethal {
    Radiation,
    Final,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignEffect {
    /// Fraction of damage dealt healed back to the attacker, e.g. `0.3`.
    #[serde(default)]
    pub vampirism: Option<f64>,
    /// Probability in `[0, 1]` of negating incoming damage entirely.
    #[serde(default)]
    pub dodge_chance: Option<f64>,
    #[serde(default)]
    pub prevent_lethal: Option<PreventLethal>,
    /// Only meaningful with `prevent_lethal == Radiation`: stun the killer.
    #[serde(default)]
    pub extra_turn: bool,
    /// Only meaningful with `prevent_lethal == Final`: heal to max instead
    /// of surviving on 1 HP.
    #[serde(default)]
    pub full_heal: bool,
}

/// Which loot case a template is allowed to drop from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    FreeGift,
    Invite,
    Infection,
    Sign,
    Basic,
    Legend,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    pub rarity_key: Option<RarityKey>,
    /// Weight used by the weighted picker; stripped once an item is copied
    /// into a player's inventory.
    pub chance: f64,

    #[serde(default)]
    pub hp: Option<u32>,
    /// Percent, `0..=100`.
    #[serde(default)]
    pub block: Option<u32>,
    #[serde(default)]
    pub dmg: Option<u32>,
    /// Probability in `[0, 1]`.
    #[serde(default)]
    pub crit: Option<f64>,
    #[serde(default)]
    pub effect: Option<ExtraEffect>,
    #[serde(default)]
    pub turns: Option<u32>,
    #[serde(default)]
    pub sign: Option<SignEffect>,

    #[serde(default)]
    pub case_eligible: bool,
    #[serde(default)]
    pub case_types: Vec<CaseType>,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind, chance: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            chance,
            ..Default::default()
        }
    }

    pub fn weapon_name_or_fists(weapon: Option<&Item>) -> &str {
        weapon.map(|w| w.name.as_str()).unwrap_or("кулаки")
    }
}
