/// error.rs — Typed errors for the engine library
///
/// The binary wraps these in `anyhow::Error`; inside the library every
/// fallible call returns one of the enums below.
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Failure of a single evaluation call.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum EvalError {
    /// Series too short or of mismatched lengths.
    #[error("insufficient data: {prices} prices vs {signals} signals (need equal lengths >= 2)")]
    InsufficientData { prices: usize, signals: usize },
}

/// Failure while building or loading a price series.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] polars::prelude::PolarsError),

    #[error("missing column `{0}`")]
    MissingColumn(&'static str),

    #[error("cannot parse {field} from `{value}`")]
    Parse { field: &'static str, value: String },

    #[error("dates must be strictly increasing: {prev} is followed by {next}")]
    NonMonotonicDate { prev: NaiveDate, next: NaiveDate },

    #[error("invalid close price {price} on {date}")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("no price data for {0}")]
    NoData(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid symbol `{0}`")]
    InvalidSymbol(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StrategyError {
    #[error("unknown strategy `{0}` (expected one of: bollinger_zscore, bollinger_fibonacci, macd_donchian, connors_zscore, dual_ma)")]
    Unknown(String),
}

/// Failure while rendering or writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot render report: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("cannot write report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
