/// analysis.rs — Run every strategy over one price window
///
/// Each strategy is generated and evaluated independently; the fan-out is
/// a rayon parallel iterator and the output keeps the input order.  One
/// strategy failing does not affect the others.
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::EvalError;
use crate::evaluator::{PerformanceEvaluator, PerformanceReport};
use crate::series::{Position, PriceSeries};
use crate::strategies::Strategy;

/// Result of one strategy on one window.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyOutcome {
    pub key:        &'static str,
    pub name:       &'static str,
    pub parameters: String,
    pub result:     Result<PerformanceReport, EvalError>,
    /// Strategy-specific reading of the current score, if it has one
    pub score_note: Option<String>,
}

impl StrategyOutcome {
    pub fn report(&self) -> Option<&PerformanceReport> {
        self.result.as_ref().ok()
    }
}

/// Evaluate all `strategies` against `prices`.
pub fn run_analysis(
    prices:     &PriceSeries,
    strategies: &[Arc<dyn Strategy>],
    evaluator:  &PerformanceEvaluator,
) -> Vec<StrategyOutcome> {
    info!("Evaluating {} strategies over {} bars", strategies.len(), prices.len());

    strategies
        .par_iter()
        .map(|s| {
            let signals = s.generate(prices);
            let result = evaluator.evaluate(prices, &signals);
            match &result {
                Ok(r) => info!(
                    strategy = s.key(),
                    total_return = r.strategy.total_return,
                    sharpe = r.strategy.sharpe,
                    trades = r.n_trades,
                    signal = r.current_signal.action(),
                    "strategy evaluated"
                ),
                Err(e) => warn!(strategy = s.key(), "evaluation failed: {e}"),
            }
            let score_note = result
                .as_ref()
                .ok()
                .and_then(|r| r.current_score)
                .and_then(|score| s.describe_score(score));
            StrategyOutcome {
                key:        s.key(),
                name:       s.name(),
                parameters: s.parameters(),
                result,
                score_note,
            }
        })
        .collect()
}

/// Signal tally across successful outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Consensus {
    pub buy:  usize,
    pub sell: usize,
    pub hold: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarketBias {
    Bullish,
    Bearish,
    Neutral,
}

impl std::fmt::Display for MarketBias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketBias::Bullish => f.write_str("BULLISH"),
            MarketBias::Bearish => f.write_str("BEARISH"),
            MarketBias::Neutral => f.write_str("NEUTRAL"),
        }
    }
}

impl Consensus {
    pub fn from_outcomes(outcomes: &[StrategyOutcome]) -> Self {
        let mut c = Self::default();
        for r in outcomes.iter().filter_map(StrategyOutcome::report) {
            match r.current_signal {
                Position::Long  => c.buy += 1,
                Position::Short => c.sell += 1,
                Position::Flat  => c.hold += 1,
            }
        }
        c
    }

    pub fn total(&self) -> usize {
        self.buy + self.sell + self.hold
    }

    /// Bullish/bearish only on a strict majority of all votes.
    pub fn bias(&self) -> MarketBias {
        let total = self.total();
        if total > 0 && self.buy * 2 > total {
            MarketBias::Bullish
        } else if total > 0 && self.sell * 2 > total {
            MarketBias::Bearish
        } else {
            MarketBias::Neutral
        }
    }
}
