pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod indicators;
pub mod metrics;
pub mod report;
pub mod series;
pub mod strategies;

pub use analysis::{run_analysis, Consensus, MarketBias, StrategyOutcome};
pub use config::AppConfig;
pub use error::{DataError, EvalError, ReportError, StrategyError};
pub use evaluator::{
    EvalConfig, MetricWarning, PerformanceEvaluator, PerformanceReport, ReturnStats, TradeRecord,
    Verdict,
};
pub use series::{Position, PricePoint, PriceSeries, SignalSeries};
pub use strategies::{Strategy, StrategyConfig};
