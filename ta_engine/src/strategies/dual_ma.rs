/// strategies/dual_ma.rs — Dual moving-average crossover
///
///   LONG  when MA_short > MA_long   (golden-cross regime)
///   SHORT when MA_short < MA_long   (death-cross regime)
///
/// Score = (MA_short − MA_long) / MA_long.
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::indicators::{ema, sma};
use crate::series::{Position, PriceSeries, SignalSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaType {
    Sma,
    Ema,
}

impl MaType {
    fn apply(self, data: &[f64], period: usize) -> Vec<f64> {
        match self {
            MaType::Sma => sma(data, period),
            MaType::Ema => ema(data, period),
        }
    }
}

impl FromStr for MaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SMA" => Ok(MaType::Sma),
            "EMA" => Ok(MaType::Ema),
            other => Err(format!("unknown moving-average type `{other}` (expected SMA or EMA)")),
        }
    }
}

impl std::fmt::Display for MaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaType::Sma => f.write_str("SMA"),
            MaType::Ema => f.write_str("EMA"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DualMovingAverage {
    pub short_period: usize,
    pub long_period:  usize,
    pub ma_type:      MaType,
}

impl Default for DualMovingAverage {
    fn default() -> Self {
        Self { short_period: 50, long_period: 200, ma_type: MaType::Ema }
    }
}

impl Strategy for DualMovingAverage {
    fn key(&self) -> &'static str {
        "dual_ma"
    }

    fn name(&self) -> &'static str {
        "Dual Moving Average"
    }

    fn parameters(&self) -> String {
        format!("short={}, long={}, ma_type={}", self.short_period, self.long_period, self.ma_type)
    }

    fn generate(&self, prices: &PriceSeries) -> SignalSeries {
        let closes = prices.closes();
        let fast = self.ma_type.apply(&closes, self.short_period);
        let slow = self.ma_type.apply(&closes, self.long_period);

        let spread: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| (f - s) / s).collect();
        let positions = spread
            .iter()
            .map(|&d| {
                if d > 0.0 {
                    Position::Long
                } else if d < 0.0 {
                    Position::Short
                } else {
                    Position::Flat
                }
            })
            .collect();
        SignalSeries::new(positions, spread)
    }
}
