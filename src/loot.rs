//! Loot draw primitives.
//!
//! A single weighted-pick primitive underlies every draw; ranked and
//! case-specific pickers layer their own windowing/uniformity rules on top.

use crate::model::item::Item;
use crate::rng;

/// Weighted pick over a pool keyed by `item.chance`. Draws `r` uniformly in
/// `[0, sum)` and returns the first entry whose cumulative weight covers
/// `r`. Returns `None` for an empty pool or a pool whose weights sum to 0.
pub fn weighted_pick<'a>(pool: &'a [&'a Item]) -> Option<&'a Item> {
    let total: f64 = pool.iter().map(|i| i.chance).sum();
    if pool.is_empty() || total <= 0.0 {
        return None;
    }
    let r = rng::roll_unit() * total;
    let mut cumulative = 0.0;
    for item in pool {
        cumulative += item.chance;
        if r < cumulative {
            return Some(item);
        }
    }
    pool.last().copied()
}

/// Uniform pick over a pool, ignoring `chance`.
pub fn uniform_pick<'a>(pool: &'a [&'a Item]) -> Option<&'a Item> {
    let idx = rng::roll_index(pool.len())?;
    pool.get(idx).copied()
}

/// Weighted draw, returned as an inventory-ready copy (template stripped of
/// its `chance` weight (copy the template, zero the weight).
pub fn pick_random_item(pool: &[&Item]) -> Option<Item> {
    weighted_pick(pool).map(|item| {
        let mut copy = item.clone();
        copy.chance = 0.0;
        copy
    })
}

/// Signs are drawn uniformly, never weighted (`pickRandomSign`).
pub fn pick_random_sign(pool: &[&Item]) -> Option<Item> {
    uniform_pick(pool).map(|item| {
        let mut copy = item.clone();
        copy.chance = 0.0;
        copy
    })
}

use crate::model::item::CaseType;

/// Case-aware picker (`pickCaseItem`): SIGN and LEGEND cases draw
/// uniformly; everything else is weighted with a uniform fallback if the
/// weighted draw fails (e.g. a zero-weight pool).
pub fn pick_case_item(pool: &[&Item], case_type: CaseType) -> Option<Item> {
    let uniform_case = matches!(case_type, CaseType::Sign | CaseType::Legend);
    if uniform_case {
        return pick_random_sign(pool);
    }
    pick_random_item(pool).or_else(|| pick_random_sign(pool))
}

/// Ranked-PvP opponent item picker (`pickRankedItem`).
///
/// `pool` is assumed sorted ascending by rarity, as delivered by the
/// catalog. For `stage <= max_index` picks uniformly from a 3-wide window
/// `[max(0, stage-1), min(max_index, stage+1)]`; beyond that, picks
/// uniformly from the last `min(3, max_index) + 1` entries.
pub fn pick_ranked_item(pool: &[&Item], stage: usize) -> Option<Item> {
    if pool.is_empty() {
        return None;
    }
    let max_index = pool.len() - 1;
    let window: &[&Item] = if stage <= max_index {
        let lo = stage.saturating_sub(1);
        let hi = (stage + 1).min(max_index);
        &pool[lo..=hi]
    } else {
        let span = 3.min(max_index) + 1;
        &pool[pool.len() - span..]
    };
    uniform_pick(window).map(|item| {
        let mut copy = item.clone();
        copy.chance = 0.0;
        copy
    })
}

/// Ranked-PvP sign picker (`pickRankedSign`): `None` for `stage <= 1`,
/// otherwise uniform over a 3-wide window centered on `min(stage-1, max_index)`.
pub fn pick_ranked_sign(pool: &[&Item], stage: usize) -> Option<Item> {
    if stage <= 1 || pool.is_empty() {
        return None;
    }
    let max_index = pool.len() - 1;
    let center = (stage - 1).min(max_index);
    let lo = center.saturating_sub(1);
    let hi = (center + 1).min(max_index);
    uniform_pick(&pool[lo..=hi]).map(|item| {
        let mut copy = item.clone();
        copy.chance = 0.0;
        copy
    })
}
