/// report.rs — Markdown technical-analysis report
///
/// Layout:
///   header → performance summary table → signal consensus → risk overview
///   → one detail section per strategy (trades included) → failed
///   strategies, if any.
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::analysis::{Consensus, StrategyOutcome};
use crate::error::ReportError;
use crate::evaluator::PerformanceReport;
use crate::series::PriceSeries;

/// Trades listed per strategy in the detail section.
const MAX_TRADES_LISTED: usize = 10;

fn pct(x: f64) -> String {
    format!("{:+.2}%", x * 100.0)
}

fn score(r: &PerformanceReport) -> String {
    r.current_score.map_or_else(|| "n/a".to_owned(), |s| format!("{s:.4}"))
}

/// Render the full report.
pub fn render_markdown(
    symbol:       &str,
    prices:       &PriceSeries,
    outcomes:     &[StrategyOutcome],
    generated_at: DateTime<Local>,
) -> Result<String, ReportError> {
    let mut md = String::new();
    write_report(&mut md, symbol, prices, outcomes, generated_at)?;
    Ok(md)
}

fn write_report(
    md:           &mut String,
    symbol:       &str,
    prices:       &PriceSeries,
    outcomes:     &[StrategyOutcome],
    generated_at: DateTime<Local>,
) -> std::fmt::Result {
    let last = prices.last();
    let first = prices.first();

    writeln!(md, "# Technical Analysis Report: {symbol}")?;
    writeln!(md)?;
    writeln!(md, "- **Symbol:** {symbol}")?;
    match last {
        Some(p) => writeln!(md, "- **Last Close:** ${:.2} ({})", p.close, p.date)?,
        None => writeln!(md, "- **Last Close:** N/A")?,
    }
    if let (Some(a), Some(b)) = (first, last) {
        writeln!(md, "- **Window:** {} → {} ({} bars)", a.date, b.date, prices.len())?;
    }
    writeln!(md, "- **Generated:** {}", generated_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(md, "- **Strategies:** {}", outcomes.len())?;
    writeln!(md)?;

    // ── Summary table ────────────────────────────────────────────────────
    writeln!(md, "## Performance Summary")?;
    writeln!(md)?;
    writeln!(
        md,
        "| Strategy | Total Return | Buy & Hold | Sharpe | Max Drawdown | Win Rate | Trades | Signal | Verdict |"
    )?;
    writeln!(md, "|---|---:|---:|---:|---:|---:|---:|:---:|:---:|")?;
    for o in outcomes {
        match &o.result {
            Ok(r) => writeln!(
                md,
                "| {} | {} | {} | {:.2} | {} | {:.1}% | {} | {} | {} |",
                o.name,
                pct(r.strategy.total_return),
                pct(r.buy_and_hold.total_return),
                r.strategy.sharpe,
                pct(r.strategy.max_drawdown),
                r.win_rate * 100.0,
                r.n_trades,
                r.current_signal.action(),
                r.verdict,
            )?,
            Err(_) => writeln!(md, "| {} | — | — | — | — | — | — | — | ERROR |", o.name)?,
        }
    }
    writeln!(md)?;

    // ── Consensus ────────────────────────────────────────────────────────
    let consensus = Consensus::from_outcomes(outcomes);
    writeln!(md, "## Signal Consensus")?;
    writeln!(md)?;
    writeln!(md, "- **BUY:** {}", consensus.buy)?;
    writeln!(md, "- **SELL:** {}", consensus.sell)?;
    writeln!(md, "- **HOLD:** {}", consensus.hold)?;
    writeln!(md, "- **Overall Bias:** {}", consensus.bias())?;

    let evaluated: Vec<(&StrategyOutcome, &PerformanceReport)> =
        outcomes.iter().filter_map(|o| o.report().map(|r| (o, r))).collect();
    let best = evaluated.iter().max_by(|a, b| a.1.strategy.total_return.total_cmp(&b.1.strategy.total_return));
    let worst = evaluated.iter().min_by(|a, b| a.1.strategy.total_return.total_cmp(&b.1.strategy.total_return));
    if let (Some(best), Some(worst)) = (best, worst) {
        writeln!(md, "- **Best:** {} ({})", best.0.name, pct(best.1.strategy.total_return))?;
        writeln!(md, "- **Worst:** {} ({})", worst.0.name, pct(worst.1.strategy.total_return))?;
    }
    writeln!(md)?;

    // ── Risk ─────────────────────────────────────────────────────────────
    if let Some((_, first)) = evaluated.first() {
        writeln!(md, "## Risk Overview")?;
        writeln!(md)?;
        writeln!(md, "- **Buy & Hold Volatility:** {:.2}%", first.buy_and_hold.volatility * 100.0)?;
        writeln!(md, "- **Buy & Hold Max Drawdown:** {}", pct(first.buy_and_hold.max_drawdown))?;
        let n = evaluated.len() as f64;
        let avg_vol = evaluated.iter().map(|(_, r)| r.strategy.volatility).sum::<f64>() / n;
        writeln!(md, "- **Average Strategy Volatility:** {:.2}%", avg_vol * 100.0)?;
        if let Some((o, r)) = evaluated.iter().max_by(|a, b| a.1.strategy.sharpe.total_cmp(&b.1.strategy.sharpe)) {
            writeln!(md, "- **Highest Sharpe:** {} ({:.2})", o.name, r.strategy.sharpe)?;
        }
        if let Some((o, r)) = evaluated
            .iter()
            .min_by(|a, b| a.1.strategy.max_drawdown.total_cmp(&b.1.strategy.max_drawdown))
        {
            writeln!(md, "- **Deepest Drawdown:** {} ({})", o.name, pct(r.strategy.max_drawdown))?;
        }
        writeln!(md)?;
    }

    // ── Details ──────────────────────────────────────────────────────────
    writeln!(md, "## Strategy Details")?;
    for o in outcomes {
        writeln!(md)?;
        writeln!(md, "### {}", o.name)?;
        writeln!(md)?;
        writeln!(md, "Parameters: `{}`", o.parameters)?;
        writeln!(md)?;
        match &o.result {
            Ok(r) => write_detail(md, r, o.score_note.as_deref())?,
            Err(e) => writeln!(md, "Evaluation failed: {e}")?,
        }
    }

    let failed: Vec<&StrategyOutcome> = outcomes.iter().filter(|o| o.result.is_err()).collect();
    if !failed.is_empty() {
        writeln!(md)?;
        writeln!(md, "## Failed Strategies")?;
        writeln!(md)?;
        for o in failed {
            if let Err(e) = &o.result {
                writeln!(md, "- `{}`: {e}", o.key)?;
            }
        }
    }
    Ok(())
}

fn write_detail(md: &mut String, r: &PerformanceReport, score_note: Option<&str>) -> std::fmt::Result {
    writeln!(md, "| Metric | Strategy | Buy & Hold |")?;
    writeln!(md, "|---|---:|---:|")?;
    writeln!(md, "| Total Return | {} | {} |", pct(r.strategy.total_return), pct(r.buy_and_hold.total_return))?;
    writeln!(md, "| Annualized Return | {} | {} |", pct(r.strategy.annualized_return), pct(r.buy_and_hold.annualized_return))?;
    writeln!(md, "| Volatility | {:.2}% | {:.2}% |", r.strategy.volatility * 100.0, r.buy_and_hold.volatility * 100.0)?;
    writeln!(md, "| Sharpe Ratio | {:.2} | {:.2} |", r.strategy.sharpe, r.buy_and_hold.sharpe)?;
    writeln!(md, "| Max Drawdown | {} | {} |", pct(r.strategy.max_drawdown), pct(r.buy_and_hold.max_drawdown))?;
    writeln!(md)?;
    writeln!(md, "- **Trades:** {}", r.n_trades)?;
    writeln!(md, "- **Win Rate:** {:.1}%", r.win_rate * 100.0)?;
    writeln!(md, "- **Avg Return per Trade:** {}", pct(r.avg_trade))?;
    writeln!(md, "- **Verdict:** {} buy-and-hold by {}", r.verdict, pct(r.excess_return()))?;
    match score_note {
        Some(note) => writeln!(
            md,
            "- **Current Signal:** {} (score {}, {note})",
            r.current_signal.action(),
            score(r)
        )?,
        None => writeln!(md, "- **Current Signal:** {} (score {})", r.current_signal.action(), score(r))?,
    }
    for w in &r.warnings {
        writeln!(md, "- **Warning:** {w:?}")?;
    }

    if !r.trades.is_empty() {
        writeln!(md)?;
        writeln!(md, "| # | Side | Entry | Exit | Periods | Entry Price | Exit Price | Return |")?;
        writeln!(md, "|---:|:---:|---|---|---:|---:|---:|---:|")?;
        let skip = r.trades.len().saturating_sub(MAX_TRADES_LISTED);
        for (i, t) in r.trades.iter().enumerate().skip(skip) {
            writeln!(
                md,
                "| {} | {} | {} | {} | {} | {:.2} | {:.2} | {} |",
                i + 1,
                t.direction,
                t.entry_date,
                t.exit_date,
                t.periods(),
                t.entry_price,
                t.exit_price,
                pct(t.return_frac),
            )?;
        }
        if skip > 0 {
            writeln!(md)?;
            writeln!(md, "_{} earlier trades omitted._", skip)?;
        }
    }
    Ok(())
}

/// `Technical_analysis_{SYMBOL}_{YYYYmmdd_HHMMSS}.md`
pub fn report_filename(symbol: &str, now: DateTime<Local>) -> String {
    format!("Technical_analysis_{}_{}.md", symbol, now.format("%Y%m%d_%H%M%S"))
}

/// Write `body` under `dir` (created if missing) and return the file path.
pub fn save_report(
    dir:    &Path,
    symbol: &str,
    body:   &str,
    now:    DateTime<Local>,
) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Io { path: dir.to_path_buf(), source })?;
    let path = dir.join(report_filename(symbol, now));
    fs::write(&path, body).map_err(|source| ReportError::Io { path: path.clone(), source })?;
    info!("Report saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::analysis::run_analysis;
    use crate::evaluator::PerformanceEvaluator;
    use crate::series::{Position, SignalSeries};
    use crate::strategies::Strategy;

    #[derive(Debug)]
    struct AlwaysLong;

    impl Strategy for AlwaysLong {
        fn key(&self) -> &'static str {
            "always_long"
        }
        fn name(&self) -> &'static str {
            "Always Long"
        }
        fn parameters(&self) -> String {
            "none".into()
        }
        fn generate(&self, prices: &PriceSeries) -> SignalSeries {
            SignalSeries::constant(Position::Long, prices.len())
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Strategy for Broken {
        fn key(&self) -> &'static str {
            "broken"
        }
        fn name(&self) -> &'static str {
            "Broken"
        }
        fn parameters(&self) -> String {
            String::new()
        }
        fn generate(&self, _prices: &PriceSeries) -> SignalSeries {
            SignalSeries::constant(Position::Flat, 0)
        }
    }

    fn stamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 7, 9, 5, 1).unwrap()
    }

    fn fixture() -> (PriceSeries, Vec<StrategyOutcome>) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let prices = PriceSeries::from_closes(start, &[100.0, 110.0, 99.0, 108.9]).unwrap();
        let strategies: Vec<Arc<dyn Strategy>> = vec![Arc::new(AlwaysLong), Arc::new(Broken)];
        let outcomes = run_analysis(&prices, &strategies, &PerformanceEvaluator::default());
        (prices, outcomes)
    }

    #[test]
    fn filename_format() {
        assert_eq!(report_filename("AAPL", stamp()), "Technical_analysis_AAPL_20250307_090501.md");
    }

    #[test]
    fn markdown_contains_sections_and_rows() {
        let (prices, outcomes) = fixture();
        let md = render_markdown("AAPL", &prices, &outcomes, stamp()).unwrap();
        assert!(md.starts_with("# Technical Analysis Report: AAPL"));
        assert!(md.contains("- **Last Close:** $108.90 (2024-01-04)"));
        assert!(md.contains("## Performance Summary"));
        assert!(md.contains("| Always Long | +8.90% | +8.90% |"));
        assert!(md.contains("| BUY | UNDERPERFORMS |"));
        assert!(md.contains("| Broken | — |"));
        assert!(md.contains("- **BUY:** 1"));
        assert!(md.contains("- **Overall Bias:** BULLISH"));
        assert!(md.contains("### Always Long"));
        assert!(md.contains("Evaluation failed: insufficient data"));
        assert!(md.contains("## Failed Strategies"));
        assert!(md.contains("- `broken`: insufficient data"));
        assert!(md.contains("| 1 | LONG | 2024-01-01 | 2024-01-04 | 3 | 100.00 | 108.90 | +8.90% |"));
        assert!(md.contains("- **Current Signal:** BUY (score n/a)"));
    }

    #[test]
    fn risk_overview_ranks_evaluated_strategies() {
        let (prices, outcomes) = fixture();
        let md = render_markdown("AAPL", &prices, &outcomes, stamp()).unwrap();
        assert!(md.contains("## Risk Overview"));
        assert!(md.contains("- **Buy & Hold Max Drawdown:** -10.00%"));
        assert!(md.contains("- **Highest Sharpe:** Always Long"));
        assert!(md.contains("- **Deepest Drawdown:** Always Long (-10.00%)"));
        assert!(!md.contains("Broken ("));
    }

    #[test]
    fn score_note_is_appended_to_current_signal() {
        let (prices, mut outcomes) = fixture();
        outcomes[0].score_note = Some("nearest Fibonacci level 0.618".into());
        let md = render_markdown("AAPL", &prices, &outcomes, stamp()).unwrap();
        assert!(md.contains("- **Current Signal:** BUY (score n/a, nearest Fibonacci level 0.618)"));
    }

    #[test]
    fn no_risk_section_without_evaluated_strategies() {
        let (prices, mut outcomes) = fixture();
        outcomes.remove(0);
        let md = render_markdown("AAPL", &prices, &outcomes, stamp()).unwrap();
        assert!(!md.contains("## Risk Overview"));
        assert!(md.contains("## Failed Strategies"));
    }

    #[test]
    fn save_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("analysis");
        let path = save_report(&dir, "MSFT", "# body\n", stamp()).unwrap();
        assert!(path.starts_with(&dir));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# body\n");
    }
}
