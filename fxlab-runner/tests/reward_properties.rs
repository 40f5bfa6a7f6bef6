//! Property tests for the reward.
//!
//! 1. Any violated hard constraint scores exactly the sentinel
//! 2. Feasible runs score above the sentinel and within the term bounds
//! 3. With everything else fixed, more net profit never scores lower
//! 4. Penalties grow strictly with drawdown, volatility and trade excess
//! 5. Bonuses are non-negative and each depends on its own input only

use fxlab_runner::metrics::Metrics;
use fxlab_runner::reward::{
    bonus, check_constraints, penalty, reward, sharpe_bonus, trade_excess_penalty,
    volatility_penalty, win_rate_bonus, SENTINEL,
};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn metrics(
    net_profit_pct: f64,
    max_daily_drawdown_pct: f64,
    max_drawdown_pct: f64,
    trade_count: usize,
    trading_days: usize,
) -> Metrics {
    Metrics {
        net_profit_pct,
        max_daily_drawdown_pct,
        max_drawdown_pct,
        trade_count,
        win_rate_pct: 55.0,
        sharpe: 1.0,
        trading_days,
        volatility_pct: 1.0,
        span_days: 20,
        final_equity: 10_000.0 * (1.0 + net_profit_pct / 100.0),
    }
}

/// Metrics that pass every hard constraint.
fn arb_feasible() -> impl Strategy<Value = Metrics> {
    (
        10.0..80.0_f64,
        0.0..2.99_f64,
        0.0..5.99_f64,
        35usize..400,
        5usize..60,
        0.0..100.0_f64,
        -2.0..8.0_f64,
        0.0..30.0_f64,
    )
        .prop_map(|(np, ddd, dd, n, days, win, sharpe, vol)| Metrics {
            win_rate_pct: win,
            sharpe,
            volatility_pct: vol,
            ..metrics(np, ddd, dd.max(ddd), n, days)
        })
}

/// Metrics that fail at least one hard constraint.
fn arb_infeasible() -> impl Strategy<Value = Metrics> {
    prop_oneof![
        (-50.0..9.99_f64).prop_map(|np| metrics(np, 1.0, 2.0, 60, 10)),
        (3.0..20.0_f64).prop_map(|ddd| metrics(20.0, ddd, ddd, 60, 10)),
        (6.0..30.0_f64).prop_map(|dd| metrics(20.0, 1.0, dd, 60, 10)),
        (0usize..35).prop_map(|n| metrics(20.0, 1.0, 2.0, n, 10)),
        (0usize..5).prop_map(|days| metrics(20.0, 1.0, 2.0, 60, days)),
    ]
}

proptest! {
    #[test]
    fn violations_score_exactly_sentinel(m in arb_infeasible()) {
        prop_assert!(check_constraints(&m).is_some());
        prop_assert_eq!(reward(&m), SENTINEL);
    }

    #[test]
    fn feasible_runs_stay_within_term_bounds(m in arb_feasible()) {
        prop_assert!(check_constraints(&m).is_none());
        let r = reward(&m);
        prop_assert!(r > SENTINEL);
        prop_assert!(r.is_finite());
        let p = penalty(&m);
        let b = bonus(&m);
        prop_assert!((0.0..12.0 + 10.0 + 5.0).contains(&p), "penalty {}", p);
        prop_assert!((0.0..=10.0 + 20.0).contains(&b), "bonus {}", b);
        prop_assert!((r - (m.net_profit_pct - p + b)).abs() < 1e-9);
    }

    #[test]
    fn reward_is_non_decreasing_in_net_profit(
        m in arb_feasible(),
        d in 0.0..50.0_f64,
    ) {
        let higher = Metrics {
            net_profit_pct: m.net_profit_pct + d,
            ..m
        };
        prop_assert!(check_constraints(&higher).is_none());
        prop_assert!(reward(&higher) >= reward(&m));
    }

    #[test]
    fn more_drawdown_scores_lower(
        m in arb_feasible(),
        extra in 0.01..1.0_f64,
    ) {
        let worse = Metrics {
            max_drawdown_pct: (m.max_drawdown_pct + extra).min(5.999),
            ..m
        };
        prop_assume!(worse.max_drawdown_pct > m.max_drawdown_pct);
        prop_assert!(reward(&worse) < reward(&m));
    }

    #[test]
    fn volatility_penalty_is_strictly_increasing(
        v in 0.0..20.0_f64,
        dv in 0.01..5.0_f64,
    ) {
        prop_assert!(volatility_penalty(v + dv) > volatility_penalty(v));
        prop_assert!(volatility_penalty(v + dv) < 10.0);
    }

    #[test]
    fn trade_excess_penalty_is_strictly_increasing(n in 35usize..300, dn in 1usize..50) {
        prop_assert!(trade_excess_penalty(n + dn) > trade_excess_penalty(n));
        prop_assert!(trade_excess_penalty(n + dn) < 5.0);
    }

    #[test]
    fn bonuses_are_independent(
        sharpe in -5.0..10.0_f64,
        win in 0.0..100.0_f64,
    ) {
        prop_assert!(sharpe_bonus(sharpe) >= 0.0);
        prop_assert!(win_rate_bonus(win) >= 0.0);
        let a = Metrics { sharpe, win_rate_pct: win, ..metrics(20.0, 1.0, 2.0, 60, 10) };
        let b = Metrics { win_rate_pct: 0.0, ..a };
        // dropping the win rate removes exactly its own bonus
        prop_assert!((bonus(&a) - bonus(&b) - win_rate_bonus(win)).abs() < 1e-12);
    }
}
