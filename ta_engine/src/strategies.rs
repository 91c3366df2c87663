/// strategies.rs — Pluggable signal generators
///
/// Each strategy turns a `PriceSeries` into an aligned `SignalSeries`.
/// They know nothing about evaluation; the evaluator knows nothing about
/// their rules.
pub mod bollinger_fibonacci;
pub mod bollinger_zscore;
pub mod connors_zscore;
pub mod dual_ma;
pub mod macd_donchian;

use std::sync::Arc;

use ahash::AHashMap;
use serde::Serialize;

use crate::error::StrategyError;
use crate::series::{Position, PriceSeries, SignalSeries};

pub use bollinger_fibonacci::BollingerFibonacci;
pub use bollinger_zscore::BollingerZScore;
pub use connors_zscore::ConnorsZScore;
pub use dual_ma::{DualMovingAverage, MaType};
pub use macd_donchian::MacdDonchian;

/// Capability: produce a signal series from prices and the strategy's own
/// parameters.
pub trait Strategy: Send + Sync + std::fmt::Debug {
    /// Stable identifier, e.g. `bollinger_zscore`.
    fn key(&self) -> &'static str;

    /// Human-readable title used in reports.
    fn name(&self) -> &'static str;

    /// One-line parameter summary.
    fn parameters(&self) -> String;

    fn generate(&self, prices: &PriceSeries) -> SignalSeries;

    /// Optional reading of a score in the strategy's own terms.
    fn describe_score(&self, _score: f64) -> Option<String> {
        None
    }
}

/// Parameters of every built-in strategy.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StrategyConfig {
    pub bollinger_zscore:    BollingerZScore,
    pub bollinger_fibonacci: BollingerFibonacci,
    pub macd_donchian:       MacdDonchian,
    pub connors_zscore:      ConnorsZScore,
    pub dual_ma:             DualMovingAverage,
}

impl StrategyConfig {
    /// All five strategies in report order.
    pub fn build_all(&self) -> Vec<Arc<dyn Strategy>> {
        vec![
            Arc::new(self.bollinger_zscore.clone()),
            Arc::new(self.bollinger_fibonacci.clone()),
            Arc::new(self.macd_donchian.clone()),
            Arc::new(self.connors_zscore.clone()),
            Arc::new(self.dual_ma.clone()),
        ]
    }

    /// Subset by key, in the order requested.  An empty selection means all.
    pub fn select(&self, keys: &[String]) -> Result<Vec<Arc<dyn Strategy>>, StrategyError> {
        let all = self.build_all();
        if keys.is_empty() {
            return Ok(all);
        }
        let by_key: AHashMap<&'static str, Arc<dyn Strategy>> =
            all.into_iter().map(|s| (s.key(), s)).collect();

        keys.iter()
            .map(|k| {
                by_key
                    .get(k.trim().to_lowercase().as_str())
                    .cloned()
                    .ok_or_else(|| StrategyError::Unknown(k.clone()))
            })
            .collect()
    }
}

/// Keys of the built-in strategies.
pub const STRATEGY_KEYS: [&str; 5] = [
    "bollinger_zscore",
    "bollinger_fibonacci",
    "macd_donchian",
    "connors_zscore",
    "dual_ma",
];

/// Walk a score series with a position state machine.
///
/// `step(current, score)` returns the next position; bars whose score is
/// NaN are Flat and reset the state.
pub(crate) fn latch<F>(scores: &[f64], mut step: F) -> Vec<Position>
where
    F: FnMut(Position, f64) -> Position,
{
    let mut pos = Position::Flat;
    scores
        .iter()
        .map(|&s| {
            pos = if s.is_nan() { Position::Flat } else { step(pos, s) };
            pos
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::series::PriceSeries;

    pub fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        PriceSeries::from_closes(start, closes).unwrap()
    }

    /// `n` bars alternating 100 / 101 (even / odd index).
    pub fn alternating(n: usize) -> Vec<f64> {
        (0..n).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect()
    }

    pub fn geometric(n: usize, start: f64, growth: f64) -> Vec<f64> {
        (0..n).map(|i| start * growth.powi(i as i32)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_all_in_report_order() {
        let keys: Vec<&str> = StrategyConfig::default().build_all().iter().map(|s| s.key()).collect();
        assert_eq!(keys, STRATEGY_KEYS.to_vec());
    }

    #[test]
    fn select_by_key_keeps_requested_order() {
        let cfg = StrategyConfig::default();
        let picked = cfg.select(&["dual_ma".into(), " MACD_Donchian ".into()]).unwrap();
        let keys: Vec<&str> = picked.iter().map(|s| s.key()).collect();
        assert_eq!(keys, vec!["dual_ma", "macd_donchian"]);
        assert_eq!(cfg.select(&[]).unwrap().len(), 5);
    }

    #[test]
    fn select_unknown_fails() {
        let err = StrategyConfig::default().select(&["rsi_magic".into()]).unwrap_err();
        assert!(matches!(err, StrategyError::Unknown(k) if k == "rsi_magic"));
    }

    #[test]
    fn latch_resets_on_nan() {
        let pos = latch(&[1.0, f64::NAN, 1.0], |cur, s| {
            if s > 0.0 && cur == Position::Flat { Position::Long } else { cur }
        });
        assert_eq!(pos, vec![Position::Long, Position::Flat, Position::Long]);
    }

    #[test]
    fn every_strategy_is_aligned_and_flat_in_warmup() {
        let prices = fixtures::series(&fixtures::alternating(30));
        for s in StrategyConfig::default().build_all() {
            let sig = s.generate(&prices);
            assert_eq!(sig.len(), prices.len(), "{}", s.key());
            assert_eq!(sig.positions()[0], Position::Flat, "{}", s.key());
            assert!(!s.parameters().is_empty());
        }
    }
}
