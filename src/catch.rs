//! Catch probability roll
//!
//! Stronger Pokemon (higher base experience) are harder to catch. With base
//! experience `b` a number is drawn from `[0, 2b)` and the catch succeeds when
//! it does not exceed `b`.

use rand::Rng;

use crate::data::Pokemon;

/// Rolls a catch attempt against the given Pokemon
pub fn attempt_catch<R: Rng>(pokemon: &Pokemon, rng: &mut R) -> bool {
    roll(pokemon.base_experience.unwrap_or(0), rng)
}

/// Rolls against a raw base experience value
///
/// A base experience of zero always succeeds.
pub fn roll<R: Rng>(base_experience: u32, rng: &mut R) -> bool {
    if base_experience == 0 {
        return true;
    }
    let upper = u64::from(base_experience) * 2;
    rng.random_range(0..upper) <= u64::from(base_experience)
}
