/// data.rs — Price data sources
///
/// Two ways to obtain a `PriceSeries`:
///   * `load_csv`    — frozen files (fixtures, offline runs); polars CSV reader
///   * `YahooClient` — daily closes from the Yahoo Finance chart endpoint
///
/// Both end in `PriceSeries::new`, so ordering and price validity are
/// checked in one place.
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::DataError;
use crate::series::{PricePoint, PriceSeries};

pub const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com";

// ── Symbol validation ─────────────────────────────────────────────────────

/// Normalise a ticker: trim, upper-case, allow `A-Z 0-9 . ^ = -`.
pub fn validate_symbol(raw: &str) -> Result<String, DataError> {
    let symbol = raw.trim().to_ascii_uppercase();
    let valid = !symbol.is_empty()
        && symbol.len() <= 16
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'));
    if valid {
        Ok(symbol)
    } else {
        Err(DataError::InvalidSymbol(raw.to_owned()))
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────

/// Load `date` / `close` columns from a CSV file (header names are matched
/// case-insensitively).  Rows with an empty close are skipped; rows are
/// sorted by date before validation.
pub fn load_csv(path: &Path) -> Result<PriceSeries, DataError> {
    if !path.exists() {
        return Err(DataError::Io {
            path:   path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let date_col = find_column(&df, "date")?;
    let close_col = find_column(&df, "close")?;

    let dates = df.column(&date_col)?.as_materialized_series().cast(&DataType::String)?;
    let closes = df.column(&close_col)?.as_materialized_series().cast(&DataType::Float64)?;

    let mut points = Vec::with_capacity(df.height());
    for (d, c) in dates.str()?.into_iter().zip(closes.f64()?.into_iter()) {
        let (Some(d), Some(c)) = (d, c) else {
            continue;
        };
        points.push(PricePoint::new(parse_date(d)?, c));
    }
    points.sort_by_key(|p| p.date);

    info!("Loaded {} bars from {}", points.len(), path.display());
    PriceSeries::new(points)
}

fn find_column(df: &DataFrame, wanted: &'static str) -> Result<String, DataError> {
    df.get_column_names()
        .into_iter()
        .find(|name| name.as_str().trim().eq_ignore_ascii_case(wanted))
        .map(|name| name.to_string())
        .ok_or(DataError::MissingColumn(wanted))
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(raw: &str) -> Result<NaiveDate, DataError> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| DataError::Parse {
        field: "date",
        value: raw.to_owned(),
    })
}

// ── Yahoo Finance ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error:  Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code:        String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta:       ChartMeta,
    timestamp:  Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

/// Decode a chart-API body into a price series.  Null closes are skipped.
pub fn parse_chart(symbol: &str, body: &str) -> Result<PriceSeries, DataError> {
    let resp: ChartResponse = serde_json::from_str(body).map_err(|e| DataError::Parse {
        field: "chart response",
        value: e.to_string(),
    })?;

    if let Some(err) = resp.chart.error {
        return Err(DataError::NoData(format!("{symbol}: {} ({})", err.description, err.code)));
    }

    let result = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DataError::NoData(symbol.to_owned()))?;

    let offset = result.meta.gmtoffset.unwrap_or(0);
    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .and_then(|q| q.close)
        .unwrap_or_default();

    let mut points: Vec<PricePoint> = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.iter().zip(closes) {
        let Some(close) = close else { continue };
        let date = DateTime::from_timestamp(ts + offset, 0)
            .ok_or(DataError::Parse { field: "timestamp", value: ts.to_string() })?
            .date_naive();
        // Yahoo appends the live bar with the same date as the last close
        if points.last().is_some_and(|p| p.date == date) {
            points.pop();
        }
        points.push(PricePoint::new(date, close));
    }

    if points.is_empty() {
        return Err(DataError::NoData(symbol.to_owned()));
    }
    PriceSeries::new(points)
}

/// Daily-bar client for the Yahoo Finance chart endpoint.
pub struct YahooClient {
    client:   Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DataError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; stock-analyzer)")
            .build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    /// Fetch daily closes for `symbol` over `range` (e.g. `1y`, `6mo`).
    pub async fn fetch_daily(&self, symbol: &str, range: &str) -> Result<PriceSeries, DataError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        debug!("GET {url} range={range}");

        let body = self
            .client
            .get(&url)
            .query(&[("range", range), ("interval", "1d")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let series = parse_chart(symbol, &body)?;
        info!("Fetched {} daily bars for {} ({})", series.len(), symbol, range);
        Ok(series)
    }
}
