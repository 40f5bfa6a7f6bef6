//! Ask/tell parameter samplers.
//!
//! Samplers work in the unit-cube genome space of `SearchSpace` and decode
//! every proposal through it, so anything they ask is inside the bounds.
//! All randomness comes from one seeded stream; given the same seed and the
//! same sequence of `tell` calls, a sampler proposes the same sequence.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use fxlab_core::domain::{ParameterSet, SearchSpace, DIMENSIONS};
use fxlab_core::error::ConfigError;
use fxlab_core::rng::RngHierarchy;

use crate::config::SamplerKind;

type Genome = [f64; DIMENSIONS];

/// Black-box proposal source driven by reward feedback.
pub trait Sampler: Send {
    fn name(&self) -> &'static str;

    /// Next parameter set to evaluate.
    fn ask(&mut self) -> ParameterSet;

    /// Report the reward of a parameter set previously asked.
    fn tell(&mut self, params: &ParameterSet, reward: f64);
}

/// Build the configured sampler, seeded from `seed`.
pub fn make_sampler(
    kind: SamplerKind,
    space: &SearchSpace,
    seed: u64,
    evolution: &EvolutionConfig,
) -> Box<dyn Sampler> {
    let rng = RngHierarchy::new(seed).rng_for("sampler", 0);
    match kind {
        SamplerKind::Random => Box::new(RandomSampler::new(space.clone(), rng)),
        SamplerKind::Evolutionary => {
            Box::new(EvolutionarySampler::new(space.clone(), evolution.clone(), rng))
        }
    }
}

fn random_genome(rng: &mut StdRng) -> Genome {
    let mut genome = [0.0; DIMENSIONS];
    for gene in genome.iter_mut() {
        *gene = rng.gen::<f64>();
    }
    genome
}

// ─── Random ──────────────────────────────────────────────────────────

/// Uniform proposals inside the bounds; ignores feedback.
pub struct RandomSampler {
    space: SearchSpace,
    rng: StdRng,
}

impl RandomSampler {
    pub fn new(space: SearchSpace, rng: StdRng) -> Self {
        Self { space, rng }
    }
}

impl Sampler for RandomSampler {
    fn name(&self) -> &'static str {
        "random"
    }

    fn ask(&mut self) -> ParameterSet {
        self.space.decode(&random_genome(&mut self.rng))
    }

    fn tell(&mut self, _params: &ParameterSet, _reward: f64) {}
}

// ─── Evolutionary ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Size of the elite pool; also the number of random initial proposals.
    pub population: usize,
    pub tournament: usize,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
    /// Half-width of the uniform mutation step.
    pub mutation_scale: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population: 20,
            tournament: 3,
            mutation_rate: 0.2,
            mutation_scale: 0.2,
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population < 2 {
            return Err(ConfigError::invalid(
                "optimizer.evolution.population",
                "must be at least 2",
            ));
        }
        if self.tournament == 0 || self.tournament > self.population {
            return Err(ConfigError::invalid(
                "optimizer.evolution.tournament",
                "must be between 1 and the population size",
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::invalid(
                "optimizer.evolution.mutation_rate",
                "must be a probability",
            ));
        }
        if !(self.mutation_scale > 0.0 && self.mutation_scale <= 1.0) {
            return Err(ConfigError::invalid(
                "optimizer.evolution.mutation_scale",
                "must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

/// Steady-state genetic search: tournament selection over an elite pool,
/// uniform crossover, clamped uniform mutation.
///
/// Until the pool is full, proposals are uniform random. Each `tell` inserts
/// the scored genome; the pool keeps the best `population` members, earlier
/// members first among equal rewards.
pub struct EvolutionarySampler {
    space: SearchSpace,
    config: EvolutionConfig,
    rng: StdRng,
    pool: Vec<(Genome, f64)>,
    told: usize,
}

impl EvolutionarySampler {
    pub fn new(space: SearchSpace, config: EvolutionConfig, rng: StdRng) -> Self {
        Self {
            pool: Vec::with_capacity(config.population + 1),
            space,
            config,
            rng,
            told: 0,
        }
    }

    /// Rewards in the elite pool, best first.
    pub fn pool_rewards(&self) -> Vec<f64> {
        self.pool.iter().map(|(_, r)| *r).collect()
    }

    fn tournament_select(&mut self) -> Genome {
        let n = self.pool.len();
        let k = self.config.tournament.min(n);
        let mut best_rank = self.rng.gen_range(0..n);
        for _ in 1..k {
            let r = self.rng.gen_range(0..n);
            if r < best_rank {
                best_rank = r;
            }
        }
        self.pool[best_rank].0
    }

    fn crossover(&mut self, p1: &Genome, p2: &Genome) -> Genome {
        let mut child = [0.0; DIMENSIONS];
        for i in 0..DIMENSIONS {
            child[i] = if self.rng.gen::<bool>() { p1[i] } else { p2[i] };
        }
        child
    }

    fn mutate(&mut self, genome: &mut Genome) {
        let scale = self.config.mutation_scale;
        for gene in genome.iter_mut() {
            if self.rng.gen::<f64>() < self.config.mutation_rate {
                *gene = (*gene + self.rng.gen_range(-scale..=scale)).clamp(0.0, 1.0);
            }
        }
    }
}

impl Sampler for EvolutionarySampler {
    fn name(&self) -> &'static str {
        "evolutionary"
    }

    fn ask(&mut self) -> ParameterSet {
        if self.told < self.config.population || self.pool.is_empty() {
            return self.space.decode(&random_genome(&mut self.rng));
        }
        let p1 = self.tournament_select();
        let p2 = self.tournament_select();
        let mut child = self.crossover(&p1, &p2);
        self.mutate(&mut child);
        self.space.decode(&child)
    }

    fn tell(&mut self, params: &ParameterSet, reward: f64) {
        self.told += 1;
        if reward.is_nan() {
            return;
        }
        let genome = self.space.encode(params);
        let at = self.pool.partition_point(|(_, r)| *r >= reward);
        self.pool.insert(at, (genome, reward));
        self.pool.truncate(self.config.population);
    }
}
