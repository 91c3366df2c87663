/// strategies/bollinger_fibonacci.rs — Bollinger bands graded by Fibonacci levels
///
/// The band is read as a 0..1 retracement range via %B:
///
///   %B_t = (P_t − Lower_t) / (Upper_t − Lower_t)
///
/// With the default levels [0, .236, .382, .5, .618, .786, 1]:
///   Entry LONG:  %B ≤ 0.236   (second level)
///   Entry SHORT: %B ≥ 0.786   (second-to-last level)
///   Exit:        %B crosses the middle level (0.5)
use serde::Serialize;

use super::{latch, Strategy};
use crate::indicators::bollinger;
use crate::series::{Position, PriceSeries, SignalSeries};

pub const DEFAULT_FIB_LEVELS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

#[derive(Debug, Clone, Serialize)]
pub struct BollingerFibonacci {
    pub window:  usize,
    pub num_std: f64,
    /// Ascending retracement levels within the band
    pub fibonacci_levels: Vec<f64>,
}

impl Default for BollingerFibonacci {
    fn default() -> Self {
        Self { window: 20, num_std: 2.0, fibonacci_levels: DEFAULT_FIB_LEVELS.to_vec() }
    }
}

impl BollingerFibonacci {
    /// (buy, middle, sell) thresholds derived from the level list.
    fn thresholds(&self) -> (f64, f64, f64) {
        let lv = &self.fibonacci_levels;
        if lv.len() < 3 {
            return (DEFAULT_FIB_LEVELS[1], DEFAULT_FIB_LEVELS[3], DEFAULT_FIB_LEVELS[5]);
        }
        (lv[1], lv[lv.len() / 2], lv[lv.len() - 2])
    }

    /// The Fibonacci level closest to a %B reading.
    pub fn nearest_level(&self, percent_b: f64) -> Option<f64> {
        self.fibonacci_levels
            .iter()
            .copied()
            .min_by(|a, b| (a - percent_b).abs().total_cmp(&(b - percent_b).abs()))
    }
}

impl Strategy for BollingerFibonacci {
    fn key(&self) -> &'static str {
        "bollinger_fibonacci"
    }

    fn name(&self) -> &'static str {
        "Bollinger-Fibonacci"
    }

    fn parameters(&self) -> String {
        format!(
            "window={}, num_std={}, fibonacci_levels={:?}",
            self.window, self.num_std, self.fibonacci_levels
        )
    }

    fn generate(&self, prices: &PriceSeries) -> SignalSeries {
        let closes = prices.closes();
        let bands = bollinger(&closes, self.window, self.num_std);
        let pct_b: Vec<f64> = closes
            .iter()
            .enumerate()
            .map(|(i, &p)| bands.percent_b(i, p))
            .collect();

        let (buy, mid, sell) = self.thresholds();
        let positions = latch(&pct_b, |pos, b| match pos {
            _ if b <= buy => Position::Long,
            _ if b >= sell => Position::Short,
            Position::Long if b >= mid => Position::Flat,
            Position::Short if b <= mid => Position::Flat,
            other => other,
        });
        SignalSeries::new(positions, pct_b)
    }

    fn describe_score(&self, score: f64) -> Option<String> {
        self.nearest_level(score).map(|lv| format!("nearest Fibonacci level {lv}"))
    }
}
