/// config.rs — Runtime configuration loaded from .env
///
/// Every key is optional; missing keys fall back to the defaults below.
/// Loading happens once at startup and the binary lets CLI flags
/// override individual fields afterwards.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::data::DEFAULT_YAHOO_URL;
use crate::evaluator::EvalConfig;
use crate::metrics::TRADING_DAYS_PER_YEAR;
use crate::strategies::{MaType, StrategyConfig};

pub const DEFAULT_RANGE: &str = "1y";
pub const DEFAULT_REPORT_DIR: &str = "analysis";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    // ── Data source ──────────────────────────────────────────────────
    /// Yahoo range string (`6mo`, `1y`, `2y`, …)
    pub analysis_range:    String,
    pub yahoo_base_url:    String,
    pub http_timeout_secs: u64,

    // ── Evaluation ───────────────────────────────────────────────────
    pub eval: EvalConfig,

    // ── Output ───────────────────────────────────────────────────────
    pub report_dir: PathBuf,

    // ── Strategy parameters ──────────────────────────────────────────
    pub strategies: StrategyConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analysis_range:    DEFAULT_RANGE.into(),
            yahoo_base_url:    DEFAULT_YAHOO_URL.into(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            eval:              EvalConfig::default(),
            report_dir:        PathBuf::from(DEFAULT_REPORT_DIR),
            strategies:        StrategyConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables (after dotenv).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // ignore missing .env
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let mut strategies = d.strategies;
        let bz = &mut strategies.bollinger_zscore;
        bz.window  = parse_key(&lookup, "BZ_WINDOW",  bz.window)?;
        bz.entry_z = parse_key(&lookup, "BZ_ENTRY_Z", bz.entry_z)?;
        bz.exit_z  = parse_key(&lookup, "BZ_EXIT_Z",  bz.exit_z)?;

        let ma = &mut strategies.dual_ma;
        ma.short_period = parse_key(&lookup, "DUAL_MA_SHORT", ma.short_period)?;
        ma.long_period  = parse_key(&lookup, "DUAL_MA_LONG",  ma.long_period)?;
        if let Some(raw) = lookup("DUAL_MA_TYPE") {
            ma.ma_type = raw
                .parse::<MaType>()
                .map_err(|e| anyhow::anyhow!("Config key DUAL_MA_TYPE: {e}"))?;
        }

        let cfg = Self {
            analysis_range:    text("ANALYSIS_RANGE", DEFAULT_RANGE),
            yahoo_base_url:    text("YAHOO_BASE_URL", DEFAULT_YAHOO_URL),
            http_timeout_secs: parse_key(&lookup, "HTTP_TIMEOUT_SECS", d.http_timeout_secs)?,
            eval: EvalConfig {
                periods_per_year: parse_key(&lookup, "PERIODS_PER_YEAR", TRADING_DAYS_PER_YEAR)?,
                risk_free_rate:   parse_key(&lookup, "RISK_FREE_RATE",   0.0)?,
            },
            report_dir: lookup("REPORT_DIR").map(PathBuf::from).unwrap_or(d.report_dir),
            strategies,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject parameter combinations no strategy or metric can use.
    pub fn validate(&self) -> Result<()> {
        let ppy = self.eval.periods_per_year;
        if !ppy.is_finite() || ppy <= 0.0 {
            bail!("PERIODS_PER_YEAR must be finite and positive, got {ppy}");
        }
        if self.http_timeout_secs == 0 {
            bail!("HTTP_TIMEOUT_SECS must be at least 1");
        }
        if !self.eval.risk_free_rate.is_finite() {
            bail!("RISK_FREE_RATE must be finite");
        }
        if self.analysis_range.trim().is_empty() {
            bail!("ANALYSIS_RANGE must not be empty");
        }
        let bz = &self.strategies.bollinger_zscore;
        if bz.window < 2 {
            bail!("BZ_WINDOW must be at least 2, got {}", bz.window);
        }
        if !(bz.exit_z >= 0.0 && bz.exit_z < bz.entry_z) {
            bail!("BZ_EXIT_Z ({}) must lie in [0, BZ_ENTRY_Z = {})", bz.exit_z, bz.entry_z);
        }
        let ma = &self.strategies.dual_ma;
        if ma.short_period == 0 || ma.short_period >= ma.long_period {
            bail!(
                "DUAL_MA_SHORT ({}) must be positive and below DUAL_MA_LONG ({})",
                ma.short_period,
                ma.long_period
            );
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_key<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Config key {key}: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_source(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.analysis_range, "1y");
        assert_eq!(cfg.eval.periods_per_year, 252.0);
        assert_eq!(cfg.eval.risk_free_rate, 0.0);
        assert_eq!(cfg.report_dir, PathBuf::from("analysis"));
        assert_eq!(cfg.http_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.strategies.bollinger_zscore.window, 20);
        assert_eq!(cfg.strategies.dual_ma.ma_type, MaType::Ema);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = load(&[
            ("ANALYSIS_RANGE", "6mo"),
            ("RISK_FREE_RATE", "0.04"),
            ("PERIODS_PER_YEAR", "52"),
            ("REPORT_DIR", "/tmp/reports"),
            ("BZ_WINDOW", " 30 "),
            ("BZ_ENTRY_Z", "2.5"),
            ("DUAL_MA_SHORT", "20"),
            ("DUAL_MA_LONG", "100"),
            ("DUAL_MA_TYPE", "sma"),
        ])
        .unwrap();
        assert_eq!(cfg.analysis_range, "6mo");
        assert_eq!(cfg.eval.risk_free_rate, 0.04);
        assert_eq!(cfg.eval.periods_per_year, 52.0);
        assert_eq!(cfg.report_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(cfg.strategies.bollinger_zscore.window, 30);
        assert_eq!(cfg.strategies.bollinger_zscore.entry_z, 2.5);
        assert_eq!(cfg.strategies.dual_ma.short_period, 20);
        assert_eq!(cfg.strategies.dual_ma.ma_type, MaType::Sma);
    }

    #[test]
    fn malformed_value_names_the_key() {
        let err = load(&[("BZ_WINDOW", "twenty")]).unwrap_err();
        assert!(err.to_string().contains("BZ_WINDOW"));
        let err = load(&[("DUAL_MA_TYPE", "wma")]).unwrap_err();
        assert!(err.to_string().contains("DUAL_MA_TYPE"));
    }

    #[test]
    fn inconsistent_parameters_rejected() {
        assert!(load(&[("DUAL_MA_SHORT", "200")]).is_err());
        assert!(load(&[("BZ_EXIT_Z", "3.0")]).is_err());
        assert!(load(&[("PERIODS_PER_YEAR", "0")]).is_err());
        assert!(load(&[("BZ_WINDOW", "1")]).is_err());
        assert!(load(&[("PERIODS_PER_YEAR", "inf")]).is_err());
        assert!(load(&[("PERIODS_PER_YEAR", "NaN")]).is_err());
        assert!(load(&[("HTTP_TIMEOUT_SECS", "0")]).is_err());
    }
}
