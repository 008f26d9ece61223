//! Counter-based generators: sequential scan, noisy scan, disjoint blocks.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{KeyGenerator, KeySequence};

/// Size of the private key block each `disjoint` worker owns.
const DISJOINT_BLOCK: u64 = 1 << 30;

/// Strictly increasing counter, a pure sequential scan.
///
/// `set_thread` is a no-op: every worker scans from the shared prototype's
/// counter value onward, so concurrent workers race through overlapping keys
/// on purpose.
#[derive(Debug, Clone, Default)]
pub struct SameGenerator {
    state: u64,
}

impl SameGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyGenerator for SameGenerator {
    fn name(&self) -> String {
        "same".to_string()
    }

    fn clone_box(&self) -> Box<dyn KeyGenerator> {
        Box::new(self.clone())
    }

    fn set_thread(&mut self, _id: usize, _count: usize) {}

    fn next_batch(&mut self) -> KeySequence {
        let key = self.state;
        self.state += 1;
        KeySequence::new(key, 1)
    }
}

/// Near-sequential scan: increasing counter plus per-draw jitter in `[0, 40]`.
#[derive(Debug, Clone)]
pub struct VarSameGenerator {
    state: u64,
    rng: SmallRng,
}

impl VarSameGenerator {
    pub fn new() -> Self {
        Self {
            state: 0,
            rng: SmallRng::seed_from_u64(42),
        }
    }
}

impl Default for VarSameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyGenerator for VarSameGenerator {
    fn name(&self) -> String {
        "varsame".to_string()
    }

    fn clone_box(&self) -> Box<dyn KeyGenerator> {
        Box::new(self.clone())
    }

    fn set_thread(&mut self, id: usize, _count: usize) {
        self.rng = SmallRng::seed_from_u64(id as u64);
    }

    fn next_batch(&mut self) -> KeySequence {
        self.state += 1;
        let jitter: u64 = self.rng.random_range(0..=40);
        KeySequence::new(self.state + jitter, 1)
    }
}

/// Each worker scans a private, non-overlapping `2^30`-sized key block.
///
/// Worker `i` starts at `i · 2^30`, guaranteeing zero cross-thread key
/// overlap for the first `2^30` draws.
#[derive(Debug, Clone, Default)]
pub struct DisjointGenerator {
    state: u64,
}

impl DisjointGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyGenerator for DisjointGenerator {
    fn name(&self) -> String {
        "disjoint".to_string()
    }

    fn clone_box(&self) -> Box<dyn KeyGenerator> {
        Box::new(self.clone())
    }

    fn set_thread(&mut self, id: usize, _count: usize) {
        self.state = id as u64 * DISJOINT_BLOCK;
    }

    fn next_batch(&mut self) -> KeySequence {
        let key = self.state;
        self.state += 1;
        KeySequence::new(key, 1)
    }
}
