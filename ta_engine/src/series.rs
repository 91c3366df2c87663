/// series.rs — Price and signal series
///
/// A `PriceSeries` is the immutable evaluation window: daily closes in
/// strictly increasing date order.  A `SignalSeries` is aligned 1:1 with
/// it; entry `t` is the position held *entering* period `t+1`, so the
/// evaluator never looks ahead.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// One bar of the price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date:  NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Validated, immutable sequence of closing prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, rejecting non-increasing dates and non-positive or
    /// non-finite closes.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, DataError> {
        for p in &points {
            if !p.close.is_finite() || p.close <= 0.0 {
                return Err(DataError::InvalidPrice { date: p.date, price: p.close });
            }
        }
        for w in points.windows(2) {
            if w[1].date <= w[0].date {
                return Err(DataError::NonMonotonicDate { prev: w[0].date, next: w[1].date });
            }
        }
        Ok(Self { points })
    }

    /// Convenience constructor for consecutive calendar days starting at
    /// `start`.  Mostly used for literal fixtures.
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Result<Self, DataError> {
        let points = closes
            .iter()
            .zip(start.iter_days())
            .map(|(&close, date)| PricePoint::new(date, close))
            .collect();
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn close(&self, idx: usize) -> f64 {
        self.points[idx].close
    }

    pub fn date(&self, idx: usize) -> NaiveDate {
        self.points[idx].date
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

/// Position held entering the next period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Position {
    Long,
    Short,
    #[default]
    Flat,
}

impl Position {
    /// +1 long, −1 short, 0 flat.
    pub fn multiplier(self) -> f64 {
        match self {
            Position::Long  => 1.0,
            Position::Short => -1.0,
            Position::Flat  => 0.0,
        }
    }

    pub fn is_directional(self) -> bool {
        self != Position::Flat
    }

    /// Label used in reports: BUY / SELL / HOLD.
    pub fn action(self) -> &'static str {
        match self {
            Position::Long  => "BUY",
            Position::Short => "SELL",
            Position::Flat  => "HOLD",
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Position::Long  => "LONG",
            Position::Short => "SHORT",
            Position::Flat  => "FLAT",
        };
        f.write_str(s)
    }
}

/// Strategy output aligned with a `PriceSeries`.
///
/// `scores` holds the strategy's raw indicator per bar (NaN during
/// warm-up); it is only read for the "current score" of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSeries {
    positions: Vec<Position>,
    scores:    Vec<f64>,
}

impl SignalSeries {
    /// Pair positions with scores.  A shorter score vector is padded with NaN.
    pub fn new(positions: Vec<Position>, mut scores: Vec<f64>) -> Self {
        scores.resize(positions.len(), f64::NAN);
        Self { positions, scores }
    }

    pub fn from_positions(positions: Vec<Position>) -> Self {
        Self::new(positions, Vec::new())
    }

    /// Same position repeated `len` times.
    pub fn constant(position: Position, len: usize) -> Self {
        Self::from_positions(vec![position; len])
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn current(&self) -> Option<Position> {
        self.positions.last().copied()
    }

    pub fn current_score(&self) -> Option<f64> {
        self.scores.last().copied()
    }
}
