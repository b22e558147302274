//! Random instance generation

use super::Instance;
use crate::AgentId;
use crate::preferences::Agent;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::debug;

/// Parameters for [`Instance::random`]
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Agents per side
    pub size: usize,
    /// Length of each left agent's list
    pub pref_length: usize,
    /// Probability that a preference ties with the one before it
    pub tie_density: f64,
    /// Random seed (None draws one from the OS)
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            size: 10,
            pref_length: 5,
            tie_density: 0.5,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn new(size: usize, pref_length: usize, tie_density: f64) -> Self {
        Self {
            size,
            pref_length,
            tie_density,
            seed: None,
        }
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_tie_density(mut self, tie_density: f64) -> Self {
        self.tie_density = tie_density;
        self
    }
}

impl Instance {
    /// Generate a random instance with ids `1..=size` on both sides.
    pub fn random(config: &GeneratorConfig) -> Self {
        let mut rng: ChaCha8Rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        Self::random_with_rng(config, &mut rng)
    }

    /// Generate a random instance from a caller-supplied generator.
    ///
    /// Left lists are sampled from the whole right side. Each right list is
    /// then the set of left agents that chose it, so the result is symmetric.
    pub fn random_with_rng<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Self {
        let pool: Vec<AgentId> = (1..=config.size as AgentId).collect();

        let mut left = BTreeMap::new();
        for &id in &pool {
            let agent = Agent::random(id, &pool, config.pref_length, config.tie_density, rng);
            left.insert(id, agent);
        }

        let mut chosen_by: BTreeMap<AgentId, Vec<AgentId>> =
            pool.iter().map(|&id| (id, Vec::new())).collect();
        for agent in left.values() {
            for partner in agent.prefs() {
                chosen_by.entry(*partner).or_default().push(agent.id());
            }
        }

        let mut right = BTreeMap::new();
        for (id, partners) in chosen_by {
            right.insert(id, Agent::shuffled(id, partners, config.tie_density, rng));
        }

        debug!(
            "Generated {} agents per side, {} pairs",
            config.size,
            left.values().map(Agent::len).sum::<usize>()
        );
        Self::from_sides(left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_is_symmetric() {
        let instance = Instance::random(&GeneratorConfig::new(12, 5, 0.3).with_seed(42));
        assert_eq!(instance.num_left(), 12);
        assert_eq!(instance.num_right(), 12);
        for (l, agent) in instance.left() {
            assert_eq!(agent.len(), 5);
            for r in agent.prefs() {
                assert!(instance.agent_right(*r).unwrap().is_compatible(*l));
            }
        }
        for (r, agent) in instance.right() {
            for l in agent.prefs() {
                assert!(instance.agent_left(*l).unwrap().is_compatible(*r));
            }
        }
    }

    #[test]
    fn test_same_seed_same_instance() {
        let config = GeneratorConfig::new(8, 3, 0.5).with_seed(9);
        assert_eq!(Instance::random(&config), Instance::random(&config));
    }

    #[test]
    fn test_pref_length_capped_by_size() {
        let instance = Instance::random(&GeneratorConfig::new(3, 10, 0.0).with_seed(1));
        assert!(instance.left().values().all(|a| a.len() == 3));
        assert_eq!(instance.num_pairs(), 9);
    }

    #[test]
    fn test_nan_tie_density_gives_strict_lists() {
        let config = GeneratorConfig::new(6, 4, 0.5)
            .with_tie_density(f64::NAN)
            .with_seed(4);
        let instance = Instance::random(&config);
        for agent in instance.left().values().chain(instance.right().values()) {
            assert_eq!(agent.group_count(), agent.len());
        }
    }
}
