/// strategies/bollinger_zscore.rs — Bollinger Z-Score mean reversion
///
///   Z_t = (P_t − SMA_w) / σ_w
///
///   Entry LONG:  Z_t < −entry_z   (price stretched below the band centre)
///   Entry SHORT: Z_t > +entry_z
///   Exit LONG:   Z_t ≥ −exit_z    (reverted to the centre)
///   Exit SHORT:  Z_t ≤ +exit_z
///   A stretch through the opposite entry threshold flips the position.
use serde::Serialize;

use super::{latch, Strategy};
use crate::indicators::zscore;
use crate::series::{Position, PriceSeries, SignalSeries};

#[derive(Debug, Clone, Serialize)]
pub struct BollingerZScore {
    pub window:  usize,
    pub entry_z: f64,
    pub exit_z:  f64,
}

impl Default for BollingerZScore {
    fn default() -> Self {
        Self { window: 20, entry_z: 2.0, exit_z: 0.5 }
    }
}

impl BollingerZScore {
    fn step(&self, pos: Position, z: f64) -> Position {
        match pos {
            _ if z < -self.entry_z => Position::Long,
            _ if z > self.entry_z => Position::Short,
            Position::Long if z >= -self.exit_z => Position::Flat,
            Position::Short if z <= self.exit_z => Position::Flat,
            other => other,
        }
    }
}

impl Strategy for BollingerZScore {
    fn key(&self) -> &'static str {
        "bollinger_zscore"
    }

    fn name(&self) -> &'static str {
        "Bollinger Z-Score"
    }

    fn parameters(&self) -> String {
        format!("window={}, entry_z={}, exit_z={}", self.window, self.entry_z, self.exit_z)
    }

    fn generate(&self, prices: &PriceSeries) -> SignalSeries {
        let z = zscore(&prices.closes(), self.window);
        let positions = latch(&z, |pos, s| self.step(pos, s));
        SignalSeries::new(positions, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::fixtures::{alternating, series};

    #[test]
    fn quiet_market_stays_flat() {
        // alternating 100/101 → |z| = 1 everywhere
        let sig = BollingerZScore::default().generate(&series(&alternating(40)));
        assert!(sig.positions().iter().all(|p| *p == Position::Flat));
        assert!(sig.scores()[18].is_nan());
        assert!((sig.scores()[19].abs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sell_off_goes_long_then_reverts_flat() {
        let mut closes = alternating(25);
        closes.push(90.0);
        closes.push(101.0);
        let sig = BollingerZScore::default().generate(&series(&closes));
        assert_eq!(sig.positions()[25], Position::Long);
        assert!(sig.scores()[25] < -4.0);
        assert_eq!(sig.positions()[26], Position::Flat);
    }

    #[test]
    fn spike_goes_short() {
        let mut closes = alternating(25);
        closes.push(111.0);
        let sig = BollingerZScore::default().generate(&series(&closes));
        assert_eq!(sig.current(), Some(Position::Short));
    }

    #[test]
    fn holds_between_thresholds() {
        let s = BollingerZScore::default();
        assert_eq!(s.step(Position::Long, -1.0), Position::Long);
        assert_eq!(s.step(Position::Short, 1.0), Position::Short);
        assert_eq!(s.step(Position::Flat, 1.5), Position::Flat);
        assert_eq!(s.step(Position::Long, 2.5), Position::Short);
    }
}
