//! Deterministic RNG management for the engine.
//!
//! Thread-local RNG storage that can be optionally seeded for reproducible
//! tests, plus "forced roll" support so a test can pin the outcome of the
//! next draw of a given bound without reaching into the caller's logic.

use rand::prelude::*;
use std::cell::RefCell;
use std::collections::VecDeque;

thread_local! {
    static RNG: RefCell<Option<StdRng>> = const { RefCell::new(None) };
    static FORCED_UNIT: RefCell<VecDeque<f64>> = const { RefCell::new(VecDeque::new()) };
    static FORCED_RANGE: RefCell<VecDeque<(i64, i64, i64)>> = const { RefCell::new(VecDeque::new()) };
}

/// Seed the thread-local RNG for deterministic output.
pub fn seed_rng(seed: u64) {
    RNG.with(|rng| {
        *rng.borrow_mut() = Some(StdRng::seed_from_u64(seed));
    });
}

/// Clear any seeded RNG and forced rolls.
pub fn clear_rng() {
    RNG.with(|rng| *rng.borrow_mut() = None);
    clear_forced();
}

/// Force the next `roll_unit()` call to return `value` (must be in `[0, 1)`).
pub fn force_unit(value: f64) {
    FORCED_UNIT.with(|f| f.borrow_mut().push_back(value));
}

/// Force the next `roll_range(lo, hi)` call matching these exact bounds to
/// return `value`.
pub fn force_range(lo: i64, hi: i64, value: i64) {
    FORCED_RANGE.with(|f| f.borrow_mut().push_back((lo, hi, value)));
}

pub fn clear_forced() {
    FORCED_UNIT.with(|f| f.borrow_mut().clear());
    FORCED_RANGE.with(|f| f.borrow_mut().clear());
}

fn with_rng<R>(f: impl FnOnce(&mut StdRng) -> R) -> R {
    RNG.with(|rng_opt| {
        let mut opt = rng_opt.borrow_mut();
        match opt.as_mut() {
            Some(rng) => f(rng),
            None => {
                let mut rng = StdRng::from_entropy();
                let result = f(&mut rng);
                result
            }
        }
    })
}

/// Roll a uniform float in `[0, 1)`. Respects a forced value if one is queued.
pub fn roll_unit() -> f64 {
    let forced = FORCED_UNIT.with(|f| f.borrow_mut().pop_front());
    if let Some(v) = forced {
        return v;
    }
    with_rng(|rng| rng.gen_range(0.0..1.0))
}

/// Roll whether an event with the given probability (`[0, 1]`) fires.
pub fn roll_chance(probability: f64) -> bool {
    roll_unit() < probability
}

/// Roll an inclusive integer range `[lo, hi]`. Respects a forced value
/// queued for the exact same bounds.
pub fn roll_range(lo: i64, hi: i64) -> i64 {
    let forced = FORCED_RANGE.with(|f| {
        let mut queue = f.borrow_mut();
        if let Some(pos) = queue.iter().position(|&(l, h, _)| l == lo && h == hi) {
            return queue.remove(pos).map(|(_, _, v)| v);
        }
        None
    });
    if let Some(v) = forced {
        return v;
    }
    if lo >= hi {
        return lo;
    }
    with_rng(|rng| rng.gen_range(lo..=hi))
}

/// Pick a uniformly random index in `[0, len)`. Returns `None` for `len == 0`.
pub fn roll_index(len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(roll_range(0, len as i64 - 1) as usize)
}
