/// metrics.rs — Return-series statistics
///
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
/// SIMPLE RETURNS
///   r_t = P_t / P_{t-1} − 1,   t = 1..n−1
///
/// COMPOUNDED TOTAL RETURN
///   R = ∏(1 + r_t) − 1
///
/// ANNUALISED VOLATILITY
///   σ_r   = sample std(r)            (n − 1 denominator)
///   σ_ann = σ_r × √N_annual          (N_annual = 252 for daily bars)
///
/// SHARPE RATIO
///   μ_ann = mean(r) × N_annual
///   SR    = (μ_ann − r_f) / σ_ann    (0 when σ_ann = 0)
///
/// MAXIMUM DRAWDOWN
///   Equity curve: E_0 = 1, E_t = E_{t-1}·(1 + r_t)
///   Running peak: peak_t = max_{s ≤ t}(E_s)
///   DD_t  = (E_t − peak_t) / peak_t
///   MaxDD = min_t(DD_t)   ∈ [−1, 0]
/// ─────────────────────────────────────────────────────────────────────────
use statrs::statistics::Statistics;

/// Volatility below this is treated as zero (Sharpe undefined).
const VOL_EPSILON: f64 = 1e-12;

/// Daily trading-day convention.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Per-period simple returns of a close series.
pub fn simple_returns(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// ∏(1 + r) − 1.  Empty input compounds to 0.
pub fn compound(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Equity curve starting at 1.0; has `returns.len() + 1` points.
pub fn equity_curve(returns: &[f64]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(returns.len() + 1);
    let mut equity = 1.0;
    curve.push(equity);
    for r in returns {
        equity *= 1.0 + r;
        curve.push(equity);
    }
    curve
}

/// Maximum drawdown from an equity curve.
/// Returns a non-positive value (e.g. −0.15 = −15% drawdown).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0f64;

    for &e in equity_curve {
        if e > peak {
            peak = e;
        }
        if peak > 0.0 {
            let dd = (e - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd.max(-1.0)
}

/// Arithmetic mean, 0 for empty input.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().mean()
}

/// Sample standard deviation, 0 for fewer than two observations.
pub fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    data.iter().std_dev()
}

/// σ × √N_annual.
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    std_dev(returns) * periods_per_year.sqrt()
}

/// mean × N_annual.
pub fn annualized_mean(returns: &[f64], periods_per_year: f64) -> f64 {
    mean(returns) * periods_per_year
}

/// Sharpe ratio; `None` when volatility is (numerically) zero.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64, risk_free_rate: f64) -> Option<f64> {
    let vol = annualized_volatility(returns, periods_per_year);
    if vol < VOL_EPSILON {
        return None;
    }
    Some((annualized_mean(returns, periods_per_year) - risk_free_rate) / vol)
}
