//! Optimization loop — ask/tell search over the parameter space.
//!
//! Each batch asks `batch_size` proposals, evaluates them in parallel on a
//! rayon pool of `workers` threads, then tells the rewards back in trial-id
//! order. Every trial is a pure function of its parameter set and the shared
//! read-only bars and calendar; the only shared mutable state is the
//! `BestTracker`, updated from the workers through one locked
//! compare-and-update.
//!
//! Budget, deadline and cancellation are checked between batches only, so a
//! trial that started always finishes and is recorded.
//!
//! Trial outcomes:
//! - `Scored`: simulated on the walk-forward slice (reward may be the sentinel)
//! - `Rejected`: the parameter set failed validation, scored at the sentinel
//! - `Failed`: the simulation hit a numeric fault, scored at the sentinel
//! - `Unstable`: infeasible on the training slice with the pre-screen enabled

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use fxlab_core::calendar::NewsCalendar;
use fxlab_core::domain::{Bar, ParameterSet, SearchSpace, TrialId};
use fxlab_core::engine::EngineConfig;
use fxlab_core::error::{BacktestError, ConfigError, DataError};
use fxlab_core::features::warmup_bars;
use fxlab_core::strategy::EntryGate;

use crate::best::{BestTracker, BestTrial, UpdateResult};
use crate::config::{LabConfig, OptimizerConfig};
use crate::export::ExportError;
use crate::metrics::Metrics;
use crate::reward::SENTINEL;
use crate::runner::evaluate;
use crate::sampler::make_sampler;
use crate::walk_forward::TrainTestSplit;

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

// ─── Trial records ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrialOutcome {
    Scored,
    Rejected,
    Failed,
    Unstable,
}

/// One evaluated proposal. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTrial {
    pub id: TrialId,
    pub params: ParameterSet,
    /// Walk-forward metrics; training metrics for `Unstable` trials.
    pub metrics: Option<Metrics>,
    pub train_reward: Option<f64>,
    /// Ranking reward, from the walk-forward slice.
    pub reward: f64,
    pub outcome: TrialOutcome,
}

impl SearchTrial {
    fn sentinel(id: TrialId, params: ParameterSet, outcome: TrialOutcome) -> Self {
        Self {
            id,
            params,
            metrics: None,
            train_reward: None,
            reward: SENTINEL,
            outcome,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.reward > SENTINEL
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    Budget,
    Deadline,
    Cancelled,
}

/// Trial and wall-clock limits of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    pub trials: usize,
    pub deadline: Option<Duration>,
}

impl SearchBudget {
    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self {
            trials: config.trials,
            deadline: config.deadline_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    /// Every recorded trial, in id order.
    pub trials: Vec<SearchTrial>,
    pub best: Option<BestTrial>,
    pub stop_reason: StopReason,
    pub split: TrainTestSplit,
    pub sampler: &'static str,
    pub elapsed: Duration,
}

impl OptimizationOutcome {
    /// The winning parameter set, if any trial beat the sentinel.
    pub fn best_params(&self) -> Result<ParameterSet, ExportError> {
        match &self.best {
            Some(best) if best.reward > SENTINEL => Ok(best.params),
            _ => Err(ExportError::NoFeasibleTrial {
                trials: self.trials.len(),
            }),
        }
    }

    pub fn feasible_count(&self) -> usize {
        self.trials.iter().filter(|t| t.is_feasible()).count()
    }

    pub fn count(&self, outcome: TrialOutcome) -> usize {
        self.trials.iter().filter(|t| t.outcome == outcome).count()
    }
}

// ─── Core loop ───────────────────────────────────────────────────────

/// Search `space` for the parameter set with the highest walk-forward reward.
///
/// Fatal errors: no bars, an inconsistent search space or settings, or a
/// slice too short for the largest parameters in `space`. Everything else
/// is scored per trial.
pub fn optimize(
    space: &SearchSpace,
    bars: &[Bar],
    calendar: Option<&NewsCalendar>,
    config: &LabConfig,
    budget: SearchBudget,
    cancel: Option<&AtomicBool>,
) -> Result<OptimizationOutcome, OptimizeError> {
    if bars.is_empty() {
        return Err(DataError::Empty.into());
    }
    space.validate()?;
    let settings = &config.optimizer;
    settings.validate()?;
    let engine = EngineConfig {
        bounds: space.clone(),
        ..config.engine_config()
    };
    engine.validate()?;

    let split = TrainTestSplit::new(bars.len(), settings.train_fraction)?;
    split.check_history(max_warmup(space, &engine))?;
    let (train, test) = (split.train(bars), split.test(bars));

    EntryGate::new(&engine.execution, calendar).warn_if_unguarded();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.workers)
        .build()?;
    let mut sampler = make_sampler(settings.sampler, space, settings.seed, &settings.evolution);
    let tracker = BestTracker::new();

    info!(
        trials = budget.trials,
        workers = settings.workers,
        batch = settings.batch_size,
        sampler = sampler.name(),
        train_bars = split.train_len(),
        test_bars = split.test_len(),
        "starting parameter search"
    );

    let start = Instant::now();
    let mut trials: Vec<SearchTrial> = Vec::with_capacity(budget.trials);
    let stop_reason = loop {
        if trials.len() >= budget.trials {
            break StopReason::Budget;
        }
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            break StopReason::Cancelled;
        }
        if budget.deadline.is_some_and(|d| start.elapsed() >= d) {
            break StopReason::Deadline;
        }

        let size = settings.batch_size.min(budget.trials - trials.len());
        let batch: Vec<(TrialId, ParameterSet)> = (0..size)
            .map(|i| (TrialId((trials.len() + i) as u64), sampler.ask()))
            .collect();

        let ctx = TrialContext {
            train,
            test,
            calendar,
            engine: &engine,
            require_train_feasible: settings.require_train_feasible,
        };
        let results: Vec<Result<SearchTrial, DataError>> = pool.install(|| {
            batch
                .par_iter()
                .map(|&(id, params)| run_batch_trial(&ctx, &tracker, id, params))
                .collect()
        });

        for result in results {
            let trial = result?;
            sampler.tell(&trial.params, trial.reward);
            trials.push(trial);
        }
    };

    let elapsed = start.elapsed();
    let best = tracker.into_inner();
    let outcome = OptimizationOutcome {
        trials,
        best,
        stop_reason,
        split,
        sampler: sampler.name(),
        elapsed,
    };
    info!(
        ?stop_reason,
        trials = outcome.trials.len(),
        feasible = outcome.feasible_count(),
        rejected = outcome.count(TrialOutcome::Rejected),
        failed = outcome.count(TrialOutcome::Failed),
        unstable = outcome.count(TrialOutcome::Unstable),
        best_reward = outcome.best.as_ref().map(|b| b.reward),
        elapsed_secs = elapsed.as_secs_f64(),
        "parameter search finished"
    );
    Ok(outcome)
}

/// History the largest parameters in `space` need before the first decision.
fn max_warmup(space: &SearchSpace, engine: &EngineConfig) -> usize {
    let widest = ParameterSet {
        ema_fast: space.ema_fast.max,
        ema_slow: space.ema_slow.max,
        rsi_period: space.rsi_period.max,
        ..ParameterSet::default()
    };
    warmup_bars(&widest, &engine.signal)
}

// ─── Single trial ────────────────────────────────────────────────────

struct TrialContext<'a> {
    train: &'a [Bar],
    test: &'a [Bar],
    calendar: Option<&'a NewsCalendar>,
    engine: &'a EngineConfig,
    require_train_feasible: bool,
}

fn run_batch_trial(
    ctx: &TrialContext<'_>,
    tracker: &BestTracker,
    id: TrialId,
    params: ParameterSet,
) -> Result<SearchTrial, DataError> {
    let trial = run_trial(ctx, id, params)?;
    let candidate = BestTrial {
        trial_id: trial.id,
        params: trial.params,
        reward: trial.reward,
        metrics: trial.metrics,
    };
    if tracker.offer(candidate) == UpdateResult::Improved && trial.is_feasible() {
        info!(trial = %id, reward = trial.reward, "new best");
    }
    Ok(trial)
}

fn run_trial(
    ctx: &TrialContext<'_>,
    id: TrialId,
    params: ParameterSet,
) -> Result<SearchTrial, DataError> {
    let mut train_reward = None;
    if ctx.require_train_feasible {
        match evaluate(&params, ctx.train, ctx.engine, ctx.calendar) {
            Ok(report) if report.reward <= SENTINEL => {
                debug!(trial = %id, violation = ?report.violation, "infeasible on training slice");
                return Ok(SearchTrial {
                    metrics: Some(report.metrics),
                    train_reward: Some(report.reward),
                    ..SearchTrial::sentinel(id, params, TrialOutcome::Unstable)
                });
            }
            Ok(report) => train_reward = Some(report.reward),
            Err(err) => return classify_failure(id, params, err),
        }
    }

    match evaluate(&params, ctx.test, ctx.engine, ctx.calendar) {
        Ok(report) => Ok(SearchTrial {
            id,
            params,
            metrics: Some(report.metrics),
            train_reward,
            reward: report.reward,
            outcome: TrialOutcome::Scored,
        }),
        Err(err) => classify_failure(id, params, err),
    }
}

fn classify_failure(
    id: TrialId,
    params: ParameterSet,
    err: BacktestError,
) -> Result<SearchTrial, DataError> {
    match err {
        BacktestError::Config(e) => {
            debug!(trial = %id, error = %e, "trial rejected");
            Ok(SearchTrial::sentinel(id, params, TrialOutcome::Rejected))
        }
        BacktestError::Simulation(e) => {
            warn!(trial = %id, error = %e, "trial failed");
            Ok(SearchTrial::sentinel(id, params, TrialOutcome::Failed))
        }
        BacktestError::Data(e) => Err(e),
    }
}
