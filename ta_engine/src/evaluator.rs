/// evaluator.rs — Strategy vs. buy-and-hold performance evaluation
///
/// ARCHITECTURE
/// ┌─────────────────────────────────────────────────────┐
/// │  PriceSeries (n closes)     SignalSeries (n pos.)   │
/// │        │                          │                 │
/// │        ▼                          │                 │
/// │  r[t] = p[t]/p[t-1] − 1           │                 │
/// │        │                          ▼                 │
/// │        └──► sr[t] = r[t] × mult(signal[t-1])        │
/// │                    │                                │
/// │   ┌────────────────┴─────────────────────┐          │
/// │   │ ReturnStats(sr)   ReturnStats(r)     │          │
/// │   │ extract_trades(signals, sr)          │          │
/// │   │ win rate / avg trade / verdict       │          │
/// │   └──────────────────────────────────────┘          │
/// └─────────────────────────────────────────────────────┘
///
/// The position used for period t is the one recorded at bar t−1, so a
/// signal computed from the close of bar t−1 never earns that bar's move.
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::EvalError;
use crate::metrics::{
    annualized_mean, annualized_volatility, compound, equity_curve, max_drawdown, mean,
    sharpe_ratio, simple_returns, TRADING_DAYS_PER_YEAR,
};
use crate::series::{Position, PriceSeries, SignalSeries};

/// Evaluation parameters (separate from strategy parameters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvalConfig {
    /// Bars per year, for annualisation (252 for daily bars)
    pub periods_per_year: f64,
    /// Annual risk-free rate as a fraction
    pub risk_free_rate: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self { periods_per_year: TRADING_DAYS_PER_YEAR, risk_free_rate: 0.0 }
    }
}

/// Non-fatal degenerate-metric conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricWarning {
    /// Strategy returns have zero volatility; Sharpe reported as 0.
    ZeroVolatility,
    /// Buy-and-hold returns have zero volatility; Sharpe reported as 0.
    BenchmarkZeroVolatility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Outperforms,
    Underperforms,
}

impl Verdict {
    /// Strict comparison; ties are `Underperforms`.
    pub fn compare(strategy_total: f64, benchmark_total: f64) -> Self {
        if strategy_total > benchmark_total {
            Verdict::Outperforms
        } else {
            Verdict::Underperforms
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Outperforms   => f.write_str("OUTPERFORMS"),
            Verdict::Underperforms => f.write_str("UNDERPERFORMS"),
        }
    }
}

/// Aggregate statistics of one return stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnStats {
    pub total_return:      f64,  // compounded fraction
    pub annualized_return: f64,  // mean × periods_per_year
    pub volatility:        f64,  // annualised sample std
    pub sharpe:            f64,  // 0 when volatility is 0
    pub max_drawdown:      f64,  // fraction (≤ 0)
}

impl ReturnStats {
    /// Returns the stats plus `false` when the Sharpe ratio was undefined.
    fn from_returns(returns: &[f64], cfg: &EvalConfig) -> (Self, bool) {
        let sharpe = sharpe_ratio(returns, cfg.periods_per_year, cfg.risk_free_rate);
        let stats = Self {
            total_return:      compound(returns),
            annualized_return: annualized_mean(returns, cfg.periods_per_year),
            volatility:        annualized_volatility(returns, cfg.periods_per_year),
            sharpe:            sharpe.unwrap_or(0.0),
            max_drawdown:      max_drawdown(&equity_curve(returns)),
        };
        (stats, sharpe.is_some())
    }
}

/// One directional run of the signal series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub direction:   Position,
    /// Bar whose signal opened the trade
    pub entry_index: usize,
    /// Bar at which the trade is marked out (first differing signal or last bar)
    pub exit_index:  usize,
    pub entry_date:  NaiveDate,
    pub exit_date:   NaiveDate,
    pub entry_price: f64,
    pub exit_price:  f64,
    /// Compounded strategy return over the trade's periods
    pub return_frac: f64,
}

impl TradeRecord {
    pub fn periods(&self) -> usize {
        self.exit_index - self.entry_index
    }

    pub fn is_win(&self) -> bool {
        self.return_frac > 0.0
    }
}

/// Complete evaluation of one strategy over one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub strategy:       ReturnStats,
    pub buy_and_hold:   ReturnStats,
    pub trades:         Vec<TradeRecord>,
    pub n_trades:       usize,
    pub win_rate:       f64,  // fraction in [0, 1]
    pub avg_trade:      f64,  // arithmetic mean of trade returns
    pub verdict:        Verdict,
    pub current_signal: Position,
    pub current_score:  Option<f64>,
    pub warnings:       Vec<MetricWarning>,
}

impl PerformanceReport {
    /// Strategy minus buy-and-hold total return.
    pub fn excess_return(&self) -> f64 {
        self.strategy.total_return - self.buy_and_hold.total_return
    }
}

impl std::fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "════════════════════════════════════════════")?;
        writeln!(f, "  STRATEGY PERFORMANCE REPORT")?;
        writeln!(f, "════════════════════════════════════════════")?;
        writeln!(f, "  Total Return   : {:.2}%", self.strategy.total_return * 100.0)?;
        writeln!(f, "  Buy & Hold     : {:.2}%", self.buy_and_hold.total_return * 100.0)?;
        writeln!(f, "  Volatility     : {:.2}%", self.strategy.volatility * 100.0)?;
        writeln!(f, "  Sharpe Ratio   : {:.3}", self.strategy.sharpe)?;
        writeln!(f, "  Max Drawdown   : {:.2}%", self.strategy.max_drawdown * 100.0)?;
        writeln!(f, "  Trades         : {}", self.n_trades)?;
        writeln!(f, "  Win Rate       : {:.2}%", self.win_rate * 100.0)?;
        writeln!(f, "  Avg Trade      : {:.4}%", self.avg_trade * 100.0)?;
        writeln!(f, "  Verdict        : {}", self.verdict)?;
        writeln!(f, "  Current Signal : {}", self.current_signal.action())?;
        match self.current_score {
            Some(s) if s.is_finite() => writeln!(f, "  Current Score  : {:.4}", s)?,
            _ => writeln!(f, "  Current Score  : n/a")?,
        }
        writeln!(f, "════════════════════════════════════════════")
    }
}

/// Stateless evaluator; holds only its configuration.
#[derive(Debug, Clone, Default)]
pub struct PerformanceEvaluator {
    config: EvalConfig,
}

impl PerformanceEvaluator {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    /// Evaluate `signals` against `prices`.
    ///
    /// Fails with `InsufficientData` unless both series have the same
    /// length of at least two bars.
    pub fn evaluate(
        &self,
        prices:  &PriceSeries,
        signals: &SignalSeries,
    ) -> Result<PerformanceReport, EvalError> {
        if prices.len() != signals.len() || prices.len() < 2 {
            return Err(EvalError::InsufficientData {
                prices:  prices.len(),
                signals: signals.len(),
            });
        }

        let market = simple_returns(&prices.closes());
        let strat  = strategy_returns(&market, signals.positions());

        let (strategy, strat_sharpe_ok) = ReturnStats::from_returns(&strat, &self.config);
        let (buy_and_hold, bh_sharpe_ok) = ReturnStats::from_returns(&market, &self.config);

        let mut warnings = Vec::new();
        if !strat_sharpe_ok {
            warn!("strategy volatility is zero; Sharpe ratio reported as 0");
            warnings.push(MetricWarning::ZeroVolatility);
        }
        if !bh_sharpe_ok {
            warn!("buy-and-hold volatility is zero; Sharpe ratio reported as 0");
            warnings.push(MetricWarning::BenchmarkZeroVolatility);
        }

        let trades = extract_trades(prices, signals.positions(), &strat);
        let returns: Vec<f64> = trades.iter().map(|t| t.return_frac).collect();
        let n_trades = trades.len();
        let win_rate = if n_trades == 0 {
            0.0
        } else {
            trades.iter().filter(|t| t.is_win()).count() as f64 / n_trades as f64
        };
        let avg_trade = mean(&returns);

        let verdict = Verdict::compare(strategy.total_return, buy_and_hold.total_return);

        debug!(
            bars = prices.len(),
            trades = n_trades,
            strategy_return = strategy.total_return,
            benchmark_return = buy_and_hold.total_return,
            "evaluation complete"
        );

        Ok(PerformanceReport {
            strategy,
            buy_and_hold,
            trades,
            n_trades,
            win_rate,
            avg_trade,
            verdict,
            current_signal: signals.current().unwrap_or_default(),
            current_score:  signals.current_score().filter(|s| s.is_finite()),
            warnings,
        })
    }
}

/// sr[t] = r[t] × mult(signal[t−1]); `market[k]` is the return of period k+1.
fn strategy_returns(market: &[f64], positions: &[Position]) -> Vec<f64> {
    market
        .iter()
        .zip(positions)
        .map(|(r, pos)| r * pos.multiplier())
        .collect()
}

/// Split the signal series into maximal runs of one directional position.
///
/// A run on bars `[a, b)` is exposed to periods `a+1 ..= min(b, n−1)`.
/// A run that starts on the final bar has no period yet and is not a trade.
fn extract_trades(
    prices:    &PriceSeries,
    positions: &[Position],
    strat:     &[f64],
) -> Vec<TradeRecord> {
    let n = positions.len();
    let last = n - 1;
    let mut trades = Vec::new();
    let mut i = 0;

    while i < n {
        let dir = positions[i];
        let mut j = i + 1;
        while j < n && positions[j] == dir {
            j += 1;
        }

        let exit = j.min(last);
        if dir.is_directional() && exit > i {
            // strat[k] is the return of period k+1
            let return_frac = compound(&strat[i..exit]);
            trades.push(TradeRecord {
                direction:   dir,
                entry_index: i,
                exit_index:  exit,
                entry_date:  prices.date(i),
                exit_date:   prices.date(exit),
                entry_price: prices.close(i),
                exit_price:  prices.close(exit),
                return_frac,
            });
        }
        i = j;
    }
    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use Position::{Flat, Long, Short};

    fn prices(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PriceSeries::from_closes(start, closes).unwrap()
    }

    fn signals(p: &[Position]) -> SignalSeries {
        SignalSeries::from_positions(p.to_vec())
    }

    fn eval(closes: &[f64], pos: &[Position]) -> PerformanceReport {
        PerformanceEvaluator::default()
            .evaluate(&prices(closes), &signals(pos))
            .unwrap()
    }

    fn close_to(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let err = PerformanceEvaluator::default()
            .evaluate(&prices(&[1.0, 2.0, 3.0]), &signals(&[Long, Long]))
            .unwrap_err();
        assert_eq!(err, EvalError::InsufficientData { prices: 3, signals: 2 });
    }

    #[test]
    fn rejects_single_bar() {
        let err = PerformanceEvaluator::default()
            .evaluate(&prices(&[1.0]), &signals(&[Long]))
            .unwrap_err();
        assert!(matches!(err, EvalError::InsufficientData { .. }));
    }

    #[test]
    fn worked_example_fully_long() {
        let r = eval(&[100.0, 110.0, 99.0, 108.9], &[Long, Long, Long, Long]);
        assert!(close_to(r.strategy.total_return, 0.089));
        assert!(close_to(r.buy_and_hold.total_return, 0.089));
        // peak 1.10, trough 0.99 → −10%
        assert!(close_to(r.strategy.max_drawdown, -0.10));
        assert_eq!(r.n_trades, 1);
        assert!(close_to(r.avg_trade, r.strategy.total_return));
        assert_eq!(r.win_rate, 1.0);
    }

    #[test]
    fn flat_first_period_is_not_earned() {
        // Flat entering period 1, long afterwards: 0.90 × 1.10 − 1
        let r = eval(&[100.0, 110.0, 99.0, 108.9], &[Flat, Long, Long, Long]);
        assert!(close_to(r.strategy.total_return, -0.01));
        assert_eq!(r.verdict, Verdict::Underperforms);
        assert_eq!(r.trades[0].entry_index, 1);
        assert_eq!(r.trades[0].exit_index, 3);
        assert!(close_to(r.trades[0].entry_price, 110.0));
    }

    #[test]
    fn all_long_equals_buy_and_hold_and_tie_underperforms() {
        let closes = [50.0, 52.0, 51.0, 55.0, 53.5, 60.0];
        let r = eval(&closes, &[Long; 6]);
        assert_eq!(r.strategy.total_return, r.buy_and_hold.total_return);
        assert_eq!(r.verdict, Verdict::Underperforms);
    }

    #[test]
    fn all_short_is_compounded_negative() {
        let closes = [100.0, 110.0, 99.0, 108.9];
        let r = eval(&closes, &[Short; 4]);
        let expected = (1.0 - 0.10) * (1.0 + 0.10) * (1.0 - 0.10) - 1.0;
        assert!(close_to(r.strategy.total_return, expected));
        assert_eq!(r.n_trades, 1);
        assert_eq!(r.trades[0].direction, Short);
    }

    #[test]
    fn constant_prices_have_zero_return_and_volatility() {
        let r = eval(&[10.0; 5], &[Long, Flat, Short, Long, Flat]);
        for s in [r.strategy, r.buy_and_hold] {
            assert_eq!(s.total_return, 0.0);
            assert_eq!(s.volatility, 0.0);
            assert_eq!(s.sharpe, 0.0);
            assert_eq!(s.max_drawdown, 0.0);
        }
        assert!(r.warnings.contains(&MetricWarning::ZeroVolatility));
        assert!(r.warnings.contains(&MetricWarning::BenchmarkZeroVolatility));
    }

    #[test]
    fn all_flat_has_no_trades() {
        let r = eval(&[100.0, 105.0, 95.0, 120.0], &[Flat; 4]);
        assert_eq!(r.strategy.total_return, 0.0);
        assert_eq!(r.strategy.sharpe, 0.0);
        assert_eq!(r.n_trades, 0);
        assert_eq!(r.win_rate, 0.0);
        assert_eq!(r.avg_trade, 0.0);
        assert_eq!(r.verdict, Verdict::Underperforms);
        assert_eq!(r.warnings, vec![MetricWarning::ZeroVolatility]);
    }

    #[test]
    fn outperforms_when_strictly_better() {
        // Short through a decline beats holding it
        let r = eval(&[100.0, 90.0, 80.0], &[Short, Short, Flat]);
        assert!(r.strategy.total_return > 0.0);
        assert_eq!(r.verdict, Verdict::Outperforms);
        assert!(r.excess_return() > 0.0);
    }

    #[test]
    fn direction_flip_starts_new_trade() {
        // periods: +10%, −10%, +10%, −10%
        let closes = [100.0, 110.0, 99.0, 108.9, 98.01];
        let r = eval(&closes, &[Long, Short, Flat, Long, Long]);
        assert_eq!(r.n_trades, 3);
        assert!(close_to(r.trades[0].return_frac, 0.10));
        assert!(close_to(r.trades[1].return_frac, 0.10));
        assert!(close_to(r.trades[2].return_frac, -0.10));
        assert!(close_to(r.win_rate, 2.0 / 3.0));
        assert!(close_to(r.avg_trade, 0.10 / 3.0));
    }

    #[test]
    fn zero_return_trade_is_not_a_win() {
        let r = eval(&[10.0, 10.0, 12.0], &[Long, Flat, Flat]);
        assert_eq!(r.n_trades, 1);
        assert_eq!(r.win_rate, 0.0);
    }

    #[test]
    fn position_opened_on_last_bar_is_not_a_trade() {
        let r = eval(&[10.0, 11.0, 12.0], &[Flat, Flat, Long]);
        assert_eq!(r.n_trades, 0);
        assert_eq!(r.current_signal, Long);
    }

    #[test]
    fn sharpe_uses_risk_free_rate() {
        let cfg = EvalConfig { periods_per_year: 252.0, risk_free_rate: 0.05 };
        let p = prices(&[100.0, 101.0, 103.0, 102.0, 104.0]);
        let s = signals(&[Long; 5]);
        let with_rf = PerformanceEvaluator::new(cfg).evaluate(&p, &s).unwrap();
        let without = PerformanceEvaluator::default().evaluate(&p, &s).unwrap();
        let vol = without.strategy.volatility;
        assert!(close_to(without.strategy.sharpe - with_rf.strategy.sharpe, 0.05 / vol));
    }

    #[test]
    fn current_score_skips_nan() {
        let p = prices(&[1.0, 2.0]);
        let s = SignalSeries::new(vec![Flat, Long], vec![0.3, f64::NAN]);
        let r = PerformanceEvaluator::default().evaluate(&p, &s).unwrap();
        assert_eq!(r.current_score, None);
        let s = SignalSeries::new(vec![Flat, Long], vec![0.3, 1.5]);
        let r = PerformanceEvaluator::default().evaluate(&p, &s).unwrap();
        assert_eq!(r.current_score, Some(1.5));
    }

    #[test]
    fn display_contains_headline_fields() {
        let r = eval(&[100.0, 110.0], &[Long, Long]);
        let text = r.to_string();
        assert!(text.contains("Total Return   : 10.00%"));
        assert!(text.contains("UNDERPERFORMS"));
        assert!(text.contains("Current Signal : BUY"));
    }
}
