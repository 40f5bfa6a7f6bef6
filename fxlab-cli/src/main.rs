//! fxlab CLI — single backtests and parameter search on EURUSD M15 bars.
//!
//! Commands:
//! - `backtest` — run one parameter set and print metrics and reward
//! - `optimize` — search the configured space and export the best record

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fxlab_core::calendar::NewsCalendar;
use fxlab_core::domain::{ParameterSet, Timeframe};
use fxlab_runner::{
    backtest, load_bars, load_calendar, optimize, render_params, write_params, write_trials_file,
    BacktestReport, ExportFormat, LabConfig, OptimizationOutcome, SearchBudget,
};

#[derive(Parser)]
#[command(name = "fxlab", about = "fxlab — EURUSD M15 rule+ML scalping lab")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one parameter set over a bars CSV.
    Backtest {
        /// Bars CSV: timestamp,open,high,low,close,volume[,spread].
        #[arg(long)]
        bars: PathBuf,

        /// Lab config TOML. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Parameter set as a JSON record. Defaults to the built-in set.
        #[arg(long)]
        params: Option<PathBuf>,

        /// Economic calendar CSV: timestamp,currency,impact.
        #[arg(long)]
        calendar: Option<PathBuf>,

        /// Print the full report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Search the config's search space and export the best parameter set.
    Optimize {
        #[arg(long)]
        bars: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        calendar: Option<PathBuf>,

        /// Trial budget. Overrides `optimizer.trials`.
        #[arg(long)]
        trials: Option<usize>,

        /// Wall-clock budget in seconds. Overrides `optimizer.deadline_secs`.
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Worker threads. Overrides `optimizer.workers`.
        #[arg(long)]
        workers: Option<usize>,

        /// Where to write the best record. Printed to stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Record format: json or kv.
        #[arg(long, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Also write every trial as CSV.
        #[arg(long)]
        trials_csv: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Backtest {
            bars,
            config,
            params,
            calendar,
            json,
        } => run_backtest_cmd(&bars, config.as_deref(), params.as_deref(), calendar.as_deref(), json),
        Commands::Optimize {
            bars,
            config,
            calendar,
            trials,
            deadline_secs,
            workers,
            out,
            format,
            trials_csv,
        } => {
            let mut lab = load_config(config.as_deref())?;
            if let Some(trials) = trials {
                lab.optimizer.trials = trials;
            }
            if deadline_secs.is_some() {
                lab.optimizer.deadline_secs = deadline_secs;
            }
            if let Some(workers) = workers {
                lab.optimizer.workers = workers;
            }
            lab.validate().context("invalid optimizer overrides")?;
            run_optimize_cmd(
                &bars,
                &lab,
                calendar.as_deref(),
                out.as_deref(),
                format,
                trials_csv.as_deref(),
            )
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<LabConfig> {
    match path {
        Some(path) => LabConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(LabConfig::default()),
    }
}

fn load_params(path: Option<&Path>) -> Result<ParameterSet> {
    let Some(path) = path else {
        return Ok(ParameterSet::default());
    };
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing parameter record {}", path.display()))
}

fn load_news(path: Option<&Path>, lab: &LabConfig) -> Result<Option<NewsCalendar>> {
    path.map(|p| {
        load_calendar(p, &lab.instrument)
            .with_context(|| format!("loading calendar {}", p.display()))
    })
    .transpose()
}

fn run_backtest_cmd(
    bars_path: &Path,
    config_path: Option<&Path>,
    params_path: Option<&Path>,
    calendar_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let lab = load_config(config_path)?;
    let params = load_params(params_path)?;
    let calendar = load_news(calendar_path, &lab)?;
    let loaded = load_bars(bars_path, Timeframe::M15)
        .with_context(|| format!("loading bars {}", bars_path.display()))?;

    let report = backtest(&params, &loaded.bars, &lab.engine_config(), calendar.as_ref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &loaded.dataset_hash);
    }
    Ok(())
}

fn run_optimize_cmd(
    bars_path: &Path,
    lab: &LabConfig,
    calendar_path: Option<&Path>,
    out: Option<&Path>,
    format: ExportFormat,
    trials_csv: Option<&Path>,
) -> Result<()> {
    let calendar = load_news(calendar_path, lab)?;
    let loaded = load_bars(bars_path, Timeframe::M15)
        .with_context(|| format!("loading bars {}", bars_path.display()))?;

    let outcome = optimize(
        &lab.search_space,
        &loaded.bars,
        calendar.as_ref(),
        lab,
        SearchBudget::from_config(&lab.optimizer),
        None,
    )?;

    if let Some(path) = trials_csv {
        write_trials_file(&outcome.trials, path)?;
        info!(path = %path.display(), "wrote trial log");
    }

    print_outcome(&outcome);

    let best = outcome.best_params()?;
    match out {
        Some(path) => {
            write_params(&best, format, path)?;
            info!(path = %path.display(), %format, "wrote best parameters");
        }
        None => println!("{}", render_params(&best, format)?.trim_end()),
    }
    Ok(())
}

fn print_report(report: &BacktestReport, dataset_hash: &str) {
    let m = &report.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Dataset:        {}", &dataset_hash[..12.min(dataset_hash.len())]);
    println!(
        "Bars:           {} ({} warmup)",
        report.run.bar_count, report.run.warmup_bars
    );
    println!("Trades:         {}", m.trade_count);
    println!("Trading Days:   {}", m.trading_days);
    println!("Halts:          {}", report.run.halts.len());
    println!();
    println!("--- Performance ---");
    println!("Net Profit:     {:.2}%", m.net_profit_pct);
    println!("Final Equity:   {:.2}", m.final_equity);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown_pct);
    println!("Max Daily DD:   {:.2}%", m.max_daily_drawdown_pct);
    println!("Win Rate:       {:.1}%", m.win_rate_pct);
    println!("Sharpe:         {:.3}", m.sharpe);
    println!("Volatility:     {:.2}%", m.volatility_pct);
    println!();
    match report.violation {
        Some(v) => println!("Reward:         {:.3} ({v:?})", report.reward),
        None => println!("Reward:         {:.3}", report.reward),
    }
    if let Some(at) = report.run.account_halted_at {
        println!("WARNING: account floor breached at {at}; trading stopped");
    }
    println!();
}

fn print_outcome(outcome: &OptimizationOutcome) {
    eprintln!();
    eprintln!("=== Search Result ===");
    eprintln!("Sampler:        {}", outcome.sampler);
    eprintln!("Stopped by:     {:?}", outcome.stop_reason);
    eprintln!(
        "Trials:         {} ({} feasible)",
        outcome.trials.len(),
        outcome.feasible_count()
    );
    eprintln!(
        "Split:          {} train / {} walk-forward bars",
        outcome.split.train_len(),
        outcome.split.test_len()
    );
    eprintln!("Elapsed:        {:.1}s", outcome.elapsed.as_secs_f64());
    match &outcome.best {
        Some(best) => {
            eprintln!("Best:           {} reward {:.3}", best.trial_id, best.reward);
            if let Some(m) = &best.metrics {
                eprintln!(
                    "                net {:.2}%  dd {:.2}%  trades {}  win {:.1}%",
                    m.net_profit_pct, m.max_drawdown_pct, m.trade_count, m.win_rate_pct
                );
            }
        }
        None => eprintln!("Best:           none"),
    }
    eprintln!();
}
