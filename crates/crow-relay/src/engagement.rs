use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform draws used for spontaneous engagement.
pub trait EngagementRoll: Send + Sync {
    /// Returns a uniform integer in `[0, upper)`; `upper` is always at least 1.
    fn draw(&self, upper: u32) -> u32;
}

/// Draws from the thread-local OS-seeded generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngRoll;

impl EngagementRoll for ThreadRngRoll {
    fn draw(&self, upper: u32) -> u32 {
        rand::thread_rng().gen_range(0..upper.max(1))
    }
}

/// Deterministic generator for reproducible runs.
#[derive(Debug)]
pub struct SeededRoll {
    rng: Mutex<StdRng>,
}

impl SeededRoll {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl EngagementRoll for SeededRoll {
    fn draw(&self, upper: u32) -> u32 {
        let upper = upper.max(1);
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..upper),
            Err(poisoned) => poisoned.into_inner().gen_range(0..upper),
        }
    }
}

/// Two independent draws in `[0, range)` that land on the same value; odds are `1/range`.
pub fn spontaneous_draw(roll: &dyn EngagementRoll, range: u32) -> bool {
    if range == 0 {
        return false;
    }
    let first = roll.draw(range);
    let second = roll.draw(range);
    first == second
}
