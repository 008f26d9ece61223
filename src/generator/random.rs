//! Random-distribution generators: uniform, normal, exponential.
//!
//! Each clone reseeds its RNG from the worker id in `set_thread`, so two
//! workers drawing from the same prototype produce independent, reproducible
//! streams while any single worker's stream is identical run to run.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};

use super::{KeyGenerator, KeySequence};
use crate::error::ConfigError;

/// Seed used before `set_thread` pins a clone to its worker.
const PROTOTYPE_SEED: u64 = 42;

/// Keys drawn uniformly from `[0, max_key)`.
#[derive(Debug, Clone)]
pub struct UniformGenerator {
    max_key: u64,
    rng: SmallRng,
}

impl UniformGenerator {
    pub fn new(max_key: u64) -> Result<Self, ConfigError> {
        if max_key == 0 {
            return Err(ConfigError::new("uniform generator needs max_key > 0"));
        }
        Ok(Self {
            max_key,
            rng: SmallRng::seed_from_u64(PROTOTYPE_SEED),
        })
    }
}

impl KeyGenerator for UniformGenerator {
    fn name(&self) -> String {
        "uniform".to_string()
    }

    fn clone_box(&self) -> Box<dyn KeyGenerator> {
        Box::new(self.clone())
    }

    fn set_thread(&mut self, id: usize, _count: usize) {
        self.rng = SmallRng::seed_from_u64(id as u64);
    }

    fn next_batch(&mut self) -> KeySequence {
        KeySequence::new(self.rng.random_range(0..self.max_key), 1)
    }

    fn unique_key_estimate(&self) -> u64 {
        self.max_key
    }
}

/// Hot-key skew: keys drawn from `|Normal(max/2, 0.315·max/2)|`, clamped to
/// `max_key`, so the middle of the key space is much hotter than the edges.
#[derive(Debug, Clone)]
pub struct NormalGenerator {
    max_key: u64,
    dist: Normal<f64>,
    rng: SmallRng,
}

impl NormalGenerator {
    pub fn new(max_key: u64) -> Result<Self, ConfigError> {
        if max_key == 0 {
            return Err(ConfigError::new("normal generator needs max_key > 0"));
        }
        let mean = max_key as f64 / 2.0;
        let dist = Normal::new(mean, 0.315 * mean)
            .map_err(|e| ConfigError::new(format!("normal generator: {e}")))?;
        Ok(Self {
            max_key,
            dist,
            rng: SmallRng::seed_from_u64(PROTOTYPE_SEED),
        })
    }
}

impl KeyGenerator for NormalGenerator {
    fn name(&self) -> String {
        "normal".to_string()
    }

    fn clone_box(&self) -> Box<dyn KeyGenerator> {
        Box::new(self.clone())
    }

    fn set_thread(&mut self, id: usize, _count: usize) {
        self.rng = SmallRng::seed_from_u64(id as u64);
    }

    fn next_batch(&mut self) -> KeySequence {
        let sample = self.dist.sample(&mut self.rng).abs() as u64;
        KeySequence::new(sample.min(self.max_key), 1)
    }

    fn unique_key_estimate(&self) -> u64 {
        self.max_key
    }
}

/// Keys drawn from `Exponential(λ)` with λ chosen so the probability mass on
/// `[0, interval)` equals `area`: λ = −ln(1 − area) / interval.
#[derive(Debug, Clone)]
pub struct ExponentialGenerator {
    unique_count: u64,
    dist: Exp<f64>,
    rng: SmallRng,
}

impl ExponentialGenerator {
    pub fn new(interval: u64, area: f64) -> Result<Self, ConfigError> {
        if interval == 0 {
            return Err(ConfigError::new("exp generator needs interval > 0"));
        }
        if !(0.0..1.0).contains(&area) || area == 0.0 {
            return Err(ConfigError::new(format!(
                "exp generator area must be in (0, 1), got {area}"
            )));
        }
        let lambda = -(1.0 - area).ln() / interval as f64;
        let dist =
            Exp::new(lambda).map_err(|e| ConfigError::new(format!("exp generator: {e}")))?;
        Ok(Self {
            unique_count: (interval as f64 * area) as u64,
            dist,
            rng: SmallRng::seed_from_u64(PROTOTYPE_SEED),
        })
    }
}

impl KeyGenerator for ExponentialGenerator {
    fn name(&self) -> String {
        "exp".to_string()
    }

    fn clone_box(&self) -> Box<dyn KeyGenerator> {
        Box::new(self.clone())
    }

    fn set_thread(&mut self, id: usize, _count: usize) {
        self.rng = SmallRng::seed_from_u64(id as u64);
    }

    fn next_batch(&mut self) -> KeySequence {
        KeySequence::new(self.dist.sample(&mut self.rng) as u64, 1)
    }

    fn unique_key_estimate(&self) -> u64 {
        self.unique_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(gen: &mut dyn KeyGenerator, n: usize) -> Vec<u64> {
        (0..n).map(|_| gen.next_batch().start_index).collect()
    }

    #[test]
    fn uniform_stays_in_range() {
        let mut gen = UniformGenerator::new(1000).unwrap();
        gen.set_thread(0, 1);
        assert!(draw(&mut gen, 10_000).iter().all(|&k| k < 1000));
    }

    #[test]
    fn uniform_rejects_empty_key_space() {
        assert!(UniformGenerator::new(0).is_err());
    }

    #[test]
    fn threads_get_independent_reproducible_streams() {
        let proto = UniformGenerator::new(1 << 20).unwrap();

        let mut a = proto.clone_box();
        let mut b = proto.clone_box();
        let mut a_again = proto.clone_box();
        a.set_thread(0, 2);
        b.set_thread(1, 2);
        a_again.set_thread(0, 2);

        let sa = draw(a.as_mut(), 100);
        let sb = draw(b.as_mut(), 100);
        let sa2 = draw(a_again.as_mut(), 100);

        assert_eq!(sa, sa2, "same thread id replays the same stream");
        assert_ne!(sa, sb, "different thread ids diverge");
    }

    #[test]
    fn clones_never_share_rng_state() {
        let mut proto = UniformGenerator::new(1 << 20).unwrap();
        proto.set_thread(3, 4);

        let mut clone = proto.clone_box();
        let from_clone = draw(clone.as_mut(), 50);
        let from_proto = draw(&mut proto, 50);

        // Clone captured the state at clone time; advancing it does not
        // advance the prototype.
        assert_eq!(from_clone, from_proto);
    }

    #[test]
    fn normal_clamps_to_max_key() {
        let mut gen = NormalGenerator::new(100).unwrap();
        gen.set_thread(0, 1);
        assert!(draw(&mut gen, 10_000).iter().all(|&k| k <= 100));
    }

    #[test]
    fn normal_concentrates_around_the_mean() {
        let mut gen = NormalGenerator::new(10_000).unwrap();
        gen.set_thread(0, 1);
        let keys = draw(&mut gen, 20_000);
        let inside = keys
            .iter()
            .filter(|&&k| (2_500..7_500).contains(&k))
            .count();
        // ±1.59σ around the mean covers most of the mass.
        assert!(inside as f64 / keys.len() as f64 > 0.8);
    }

    #[test]
    fn exp_estimate_follows_area() {
        let gen = ExponentialGenerator::new(1000, 0.8).unwrap();
        assert_eq!(gen.unique_key_estimate(), 800);
    }

    #[test]
    fn exp_mass_matches_configured_area() {
        let mut gen = ExponentialGenerator::new(1000, 0.8).unwrap();
        gen.set_thread(0, 1);
        let keys = draw(&mut gen, 50_000);
        let inside = keys.iter().filter(|&&k| k < 1000).count();
        let fraction = inside as f64 / keys.len() as f64;
        assert!((fraction - 0.8).abs() < 0.02, "got {fraction}");
    }

    #[test]
    fn exp_rejects_degenerate_parameters() {
        assert!(ExponentialGenerator::new(0, 0.8).is_err());
        assert!(ExponentialGenerator::new(1000, 0.0).is_err());
        assert!(ExponentialGenerator::new(1000, 1.0).is_err());
    }
}
