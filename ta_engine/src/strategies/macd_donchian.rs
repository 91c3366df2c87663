/// strategies/macd_donchian.rs — MACD momentum confirmed by Donchian position
///
///   LONG  when MACD > signal  and  close > Donchian mid
///   SHORT when MACD < signal  and  close < Donchian mid
///   FLAT  otherwise (momentum and channel disagree, or warm-up)
///
/// Score = MACD histogram.
use serde::Serialize;

use super::Strategy;
use crate::indicators::{donchian, macd};
use crate::series::{Position, PriceSeries, SignalSeries};

#[derive(Debug, Clone, Serialize)]
pub struct MacdDonchian {
    pub fast_period:     usize,
    pub slow_period:     usize,
    pub signal_period:   usize,
    pub donchian_window: usize,
}

impl Default for MacdDonchian {
    fn default() -> Self {
        Self { fast_period: 12, slow_period: 26, signal_period: 9, donchian_window: 20 }
    }
}

impl Strategy for MacdDonchian {
    fn key(&self) -> &'static str {
        "macd_donchian"
    }

    fn name(&self) -> &'static str {
        "MACD-Donchian"
    }

    fn parameters(&self) -> String {
        format!(
            "fast={}, slow={}, signal={}, donchian_window={}",
            self.fast_period, self.slow_period, self.signal_period, self.donchian_window
        )
    }

    fn generate(&self, prices: &PriceSeries) -> SignalSeries {
        let closes = prices.closes();
        let m = macd(&closes, self.fast_period, self.slow_period, self.signal_period);
        let channel = donchian(&closes, self.donchian_window);

        // NaN comparisons are false, so warm-up bars fall through to Flat.
        let positions = closes
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let (line, sig, mid) = (m.macd_line[i], m.signal_line[i], channel.middle[i]);
                if line > sig && p > mid {
                    Position::Long
                } else if line < sig && p < mid {
                    Position::Short
                } else {
                    Position::Flat
                }
            })
            .collect();
        SignalSeries::new(positions, m.histogram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::fixtures::{geometric, series};

    #[test]
    fn uptrend_is_long_after_warmup() {
        let sig = MacdDonchian::default().generate(&series(&geometric(60, 100.0, 1.01)));
        // signal line first valid at 26 − 1 + 9 − 1 = 33
        assert!(sig.positions()[..33].iter().all(|p| *p == Position::Flat));
        assert!(sig.positions()[33..].iter().all(|p| *p == Position::Long));
        assert!(sig.current_score().unwrap() > 0.0);
    }

    #[test]
    fn rally_then_sell_off_flips_short() {
        // 40 bars +1%/day, then 20 bars −2%/day
        let mut closes = geometric(40, 100.0, 1.01);
        let top = closes[39];
        closes.extend((1..=20).map(|k| top * 0.98f64.powi(k)));
        let sig = MacdDonchian::default().generate(&series(&closes));
        assert_eq!(sig.positions()[35], Position::Long);
        assert_eq!(sig.current(), Some(Position::Short));
        assert!(sig.current_score().unwrap() < 0.0);
    }

    #[test]
    fn steady_momentum_is_flat() {
        // linear trend: MACD converges onto its signal line
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let sig = MacdDonchian::default().generate(&series(&closes));
        assert!(sig.current_score().unwrap().abs() < 1e-9);
    }

    #[test]
    fn too_short_series_is_all_flat() {
        let sig = MacdDonchian::default().generate(&series(&geometric(20, 100.0, 1.01)));
        assert!(sig.positions().iter().all(|p| *p == Position::Flat));
    }
}
