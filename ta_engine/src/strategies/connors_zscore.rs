/// strategies/connors_zscore.rs — Connors RSI filtered by a price z-score
///
///   CRSI = (RSI(close, 3) + RSI(streak, 2) + PercentRank(ROC₁, 100)) / 3
///   Z    = rolling z-score of close (window 20)
///
///   Entry LONG:  CRSI < oversold   and Z < −z_entry
///   Entry SHORT: CRSI > overbought and Z > +z_entry
///   Exit LONG:   CRSI > 50
///   Exit SHORT:  CRSI < 50
///
/// Score = CRSI.
use serde::Serialize;

use super::Strategy;
use crate::indicators::{connors_rsi, zscore};
use crate::series::{Position, PriceSeries, SignalSeries};

const CRSI_MIDLINE: f64 = 50.0;

#[derive(Debug, Clone, Serialize)]
pub struct ConnorsZScore {
    pub rsi_period:    usize,
    pub streak_period: usize,
    pub rank_period:   usize,
    pub zscore_window: usize,
    pub oversold:      f64,
    pub overbought:    f64,
    pub z_entry:       f64,
}

impl Default for ConnorsZScore {
    fn default() -> Self {
        Self {
            rsi_period:    3,
            streak_period: 2,
            rank_period:   100,
            zscore_window: 20,
            oversold:      20.0,
            overbought:    80.0,
            z_entry:       1.0,
        }
    }
}

impl ConnorsZScore {
    fn step(&self, pos: Position, crsi: f64, z: f64) -> Position {
        match pos {
            _ if crsi < self.oversold && z < -self.z_entry => Position::Long,
            _ if crsi > self.overbought && z > self.z_entry => Position::Short,
            Position::Long if crsi > CRSI_MIDLINE => Position::Flat,
            Position::Short if crsi < CRSI_MIDLINE => Position::Flat,
            other => other,
        }
    }
}

impl Strategy for ConnorsZScore {
    fn key(&self) -> &'static str {
        "connors_zscore"
    }

    fn name(&self) -> &'static str {
        "Connors RSI + Z-Score"
    }

    fn parameters(&self) -> String {
        format!(
            "rsi_period={}, streak_period={}, rank_period={}, zscore_window={}, \
             oversold={}, overbought={}, z_entry={}",
            self.rsi_period,
            self.streak_period,
            self.rank_period,
            self.zscore_window,
            self.oversold,
            self.overbought,
            self.z_entry
        )
    }

    fn generate(&self, prices: &PriceSeries) -> SignalSeries {
        let closes = prices.closes();
        let crsi = connors_rsi(&closes, self.rsi_period, self.streak_period, self.rank_period);
        let z = zscore(&closes, self.zscore_window);

        let mut pos = Position::Flat;
        let positions = crsi
            .iter()
            .zip(&z)
            .map(|(&c, &zv)| {
                pos = if c.is_nan() || zv.is_nan() { Position::Flat } else { self.step(pos, c, zv) };
                pos
            })
            .collect();
        SignalSeries::new(positions, crsi)
    }
}
