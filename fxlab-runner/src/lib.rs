//! fxlab runner — loading, scoring and parameter search on top of `fxlab-core`.
//!
//! This crate builds on `fxlab-core` to provide:
//! - TOML lab configuration and CSV loaders for bars and the news calendar
//! - Performance metrics and the constrained reward
//! - Walk-forward split, ask/tell samplers and the parallel optimization loop
//! - Export of the winning parameter record and the trial log

pub mod best;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod optimizer;
pub mod reward;
pub mod runner;
pub mod sampler;
pub mod walk_forward;

pub use best::{BestTracker, BestTrial, UpdateResult};
pub use config::{AccountConfig, LabConfig, OptimizerConfig, SamplerKind, SettingsError};
pub use data_loader::{dataset_hash, load_bars, load_calendar, LoadError, LoadedBars};
pub use export::{render_params, write_params, write_trials_file, ExportError, ExportFormat};
pub use metrics::Metrics;
pub use optimizer::{
    optimize, OptimizationOutcome, OptimizeError, SearchBudget, SearchTrial, StopReason,
    TrialOutcome,
};
pub use reward::{check_constraints, reward, ConstraintViolation, SENTINEL};
pub use runner::{backtest, evaluate, BacktestReport};
pub use sampler::{make_sampler, EvolutionConfig, EvolutionarySampler, RandomSampler, Sampler};
pub use walk_forward::TrainTestSplit;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<LabConfig>();
        assert_sync::<LabConfig>();
        assert_send::<EvolutionConfig>();
        assert_sync::<EvolutionConfig>();
    }

    #[test]
    fn best_tracker_is_send_sync() {
        assert_send::<BestTracker>();
        assert_sync::<BestTracker>();
    }

    #[test]
    fn trial_records_are_send_sync() {
        assert_send::<SearchTrial>();
        assert_sync::<SearchTrial>();
        assert_send::<BacktestReport>();
        assert_sync::<BacktestReport>();
        assert_send::<Metrics>();
        assert_sync::<Metrics>();
    }

    #[test]
    fn samplers_are_send() {
        assert_send::<RandomSampler>();
        assert_send::<EvolutionarySampler>();
        assert_send::<Box<dyn Sampler>>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<OptimizeError>();
        assert_sync::<OptimizeError>();
        assert_send::<ExportError>();
        assert_sync::<ExportError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
    }
}
