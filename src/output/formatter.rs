use std::io::IsTerminal;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::api::Organization;
use crate::audit::{Audit, AuditResult, Site};
use crate::insights::{DeltaPoint, DistributionRow, MetricKey, PerformancePair};
use crate::scoring::{LeaderboardEntry, Metric, MetricDelta, TbtMetric};

/// Traffic-light rating of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Good,
    Average,
    Poor,
}

/// Rate a category score in `[0, 1]`: 0.9 and up is good, below 0.5 is poor.
pub fn score_badge(score: f64) -> Badge {
    if score >= 0.9 {
        Badge::Good
    } else if score >= 0.5 {
        Badge::Average
    } else {
        Badge::Poor
    }
}

/// Rate a Total Blocking Time in milliseconds.
pub fn tbt_badge(total_blocking_time: f64) -> Badge {
    if total_blocking_time <= 200.0 {
        Badge::Good
    } else if total_blocking_time <= 500.0 {
        Badge::Average
    } else {
        Badge::Poor
    }
}

/// Rate a percent change. For metrics where lower is better (TBT) a
/// decrease is the good direction.
pub fn change_badge(percent_change: f64, lower_is_better: bool) -> Badge {
    let change = if lower_is_better {
        -percent_change
    } else {
        percent_change
    };
    if change > 0.0 {
        Badge::Good
    } else if change == 0.0 {
        Badge::Average
    } else {
        Badge::Poor
    }
}

fn paint(text: &str, badge: Badge, use_colors: bool) -> String {
    if !use_colors {
        return text.to_string();
    }
    match badge {
        Badge::Good => text.green().to_string(),
        Badge::Average => text.yellow().to_string(),
        Badge::Poor => text.red().to_string(),
    }
}

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a `[0, 1]` score as a whole percent ("85%")
pub fn format_percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

/// Format an already-scaled percent change with sign ("+33.3%")
pub fn format_change(percent: f64) -> String {
    if percent > 0.0 {
        format!("+{:.1}%", percent)
    } else {
        format!("{:.1}%", percent)
    }
}

/// Format a number with explicit sign and two decimals ("+5.00")
pub fn format_signed(value: f64) -> String {
    format!("{:+.2}", value)
}

/// Format milliseconds as seconds with two decimals ("0.25")
pub fn format_seconds(milliseconds: f64) -> String {
    format!("{:.2}", milliseconds / 1000.0)
}

/// Format an audit timestamp as "YYYY-MM-DD HH:MM:SS" (UTC)
pub fn format_audited_at(audited_at: &DateTime<Utc>) -> String {
    audited_at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Render a Lighthouse runtime error. Errors usually arrive as
/// `{ "code": ..., "message": ... }`.
pub fn format_runtime_error(error: Option<&serde_json::Value>) -> String {
    match error {
        None | Some(serde_json::Value::Null) => "Unknown error".to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(value) => {
            let code = value.get("code").and_then(|c| c.as_str());
            let message = value.get("message").and_then(|m| m.as_str());
            match (code, message) {
                (Some(code), Some(message)) => format!("{}: {}", code, message),
                (None, Some(message)) => message.to_string(),
                (Some(code), None) => code.to_string(),
                (None, None) => value.to_string(),
            }
        }
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Shorten `url` so a row with `fixed_width` other characters fits the terminal.
fn fit_url(url: &str, fixed_width: usize) -> String {
    match get_terminal_width() {
        Some(width) if width > fixed_width + 10 => truncate(url, width - fixed_width),
        // Very narrow terminal, show truncated
        Some(_) => truncate(url, 20),
        // No terminal (pipe), don't truncate
        None => url.to_string(),
    }
}

const CHANGE_WIDTH: usize = 8;
const SCORE_WIDTH: usize = 7;

fn metric_cell(metric: &MetricDelta, use_colors: bool) -> String {
    let text = format!("{:>width$}", format_change(metric.percent_change), width = CHANGE_WIDTH);
    paint(&text, change_badge(metric.percent_change, false), use_colors)
}

fn tbt_cell(metric: &TbtMetric, use_colors: bool) -> String {
    let text = format!("{:>width$}", format_change(metric.percent_change), width = CHANGE_WIDTH);
    paint(&text, change_badge(metric.percent_change, true), use_colors)
}

/// Format the leaderboard as a table with columns: Index, Score, per-metric
/// percent change (Perf, TBT, SEO, A11Y, BP), Site
pub fn format_leaderboard_table(entries: &[LeaderboardEntry], use_colors: bool) -> String {
    if entries.is_empty() {
        return "No sites with a previous audit to compare.".to_string();
    }

    let separator = "  ";
    let header = format!(
        "{:>3} {:>score$}{sep}{:>w$}{sep}{:>w$}{sep}{:>w$}{sep}{:>w$}{sep}{:>w$}{sep}Site",
        "#",
        "Score",
        Metric::Performance.label(),
        "TBT",
        Metric::Seo.label(),
        Metric::Accessibility.label(),
        Metric::BestPractices.label(),
        score = SCORE_WIDTH,
        w = CHANGE_WIDTH,
        sep = separator,
    );
    // Index + score + five change columns with separators
    let fixed_width = 4 + SCORE_WIDTH + (CHANGE_WIDTH + separator.len()) * 5 + separator.len();

    let rows = entries.iter().enumerate().map(|(idx, entry)| {
        let m = &entry.metrics;
        let index_str = format!("{:>2}.", idx + 1);
        let score_str = format!("{:>width$.2}", m.total_score, width = SCORE_WIDTH);
        let url = fit_url(&entry.site.base_url, fixed_width);

        let cells = [
            metric_cell(&m.performance, use_colors),
            tbt_cell(&m.total_blocking_time, use_colors),
            metric_cell(&m.seo, use_colors),
            metric_cell(&m.accessibility, use_colors),
            metric_cell(&m.best_practices, use_colors),
        ]
        .join(separator);

        if use_colors {
            format!(
                "{} {}{}{}{}{}",
                index_str.dimmed(),
                score_str.bold(),
                separator,
                cells,
                separator,
                url.underline()
            )
        } else {
            format!("{} {}{}{}{}{}", index_str, score_str, separator, cells, separator, url)
        }
    });

    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the leaderboard as tab-separated values for scripting
/// Columns: total score, base URL, then the delta of performance, TBT (ms),
/// seo, accessibility, best-practices (no headers, no colors)
pub fn format_leaderboard_tsv(entries: &[LeaderboardEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let m = &entry.metrics;
            format!(
                "{:.4}\t{}\t{:.4}\t{:.0}\t{:.4}\t{:.4}\t{:.4}",
                m.total_score,
                entry.site.base_url,
                m.performance.delta,
                m.total_blocking_time.delta,
                m.seo.delta,
                m.accessibility.delta,
                m.best_practices.delta
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Perf, SEO, A11Y, BP and TBT cells of one result, "-" where missing
fn result_cells(result: Option<&AuditResult>, use_colors: bool) -> Vec<String> {
    let scores = result.and_then(|r| r.scores.as_ref());

    let mut cells: Vec<String> = Metric::ALL
        .iter()
        .map(|metric| match scores.and_then(|s| s.get(*metric)) {
            Some(score) => paint(
                &format!("{:>5}", format_percent(score)),
                score_badge(score),
                use_colors,
            ),
            None => format!("{:>5}", "-"),
        })
        .collect();
    cells.push(match result.and_then(|r| r.total_blocking_time) {
        Some(tbt) => paint(
            &format!("{:>5}", format_seconds(tbt)),
            tbt_badge(tbt),
            use_colors,
        ),
        None => format!("{:>5}", "-"),
    });
    cells
}

/// Format current scores: Perf, SEO, A11Y, BP, TBT (seconds), Base URL
pub fn format_scores_table(sites: &[Site], use_colors: bool) -> String {
    if sites.is_empty() {
        return "No sites found.".to_string();
    }

    let separator = "  ";
    let fixed_width = 4 + (5 + separator.len()) * 5;

    sites
        .iter()
        .enumerate()
        .map(|(idx, site)| {
            let result = site.latest_audit().and_then(|a| a.audit_result.as_ref());
            let cells = result_cells(result, use_colors);

            format!(
                "{:>2}. {}{}{}",
                idx + 1,
                cells.join(separator),
                separator,
                fit_url(&site.base_url, fixed_width)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format errored audits as "Base URL  error", one per line
pub fn format_errors(sites: &[Site], use_colors: bool) -> String {
    if sites.is_empty() {
        return "No failed audits.".to_string();
    }

    sites
        .iter()
        .map(|site| {
            let error = format_runtime_error(
                site.latest_audit()
                    .and_then(|a| a.audit_result.as_ref())
                    .and_then(|r| r.runtime_error.as_ref()),
            );
            if use_colors {
                format!("{}  {}", site.base_url.underline(), error.red())
            } else {
                format!("{}  {}", site.base_url, error)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a list of sites as one base URL per line, with live marker
pub fn format_site_list(sites: &[Site]) -> String {
    if sites.is_empty() {
        return "No sites found.".to_string();
    }

    sites
        .iter()
        .map(|site| {
            let live = if site.is_live { "live" } else { "non-live" };
            format!("{}  ({})", site.base_url, live)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one site's audit history: audited at (UTC), scores, TBT, error
pub fn format_audit_history(audits: &[Audit], use_colors: bool) -> String {
    if audits.is_empty() {
        return "No audits found.".to_string();
    }

    let separator = "  ";
    let header = format!(
        "{:<19}{sep}{:>5}{sep}{:>5}{sep}{:>5}{sep}{:>5}{sep}{:>5}",
        "Audited At (UTC)",
        Metric::Performance.label(),
        Metric::Seo.label(),
        Metric::Accessibility.label(),
        Metric::BestPractices.label(),
        "TBT",
        sep = separator
    );

    let rows = audits.iter().map(|audit| {
        let audited_at = audit
            .audited_at
            .as_ref()
            .map(format_audited_at)
            .unwrap_or_else(|| "-".to_string());
        let result = audit.audit_result.as_ref();
        let mut line = format!(
            "{:<19}{}{}",
            audited_at,
            separator,
            result_cells(result, use_colors).join(separator)
        );
        if audit.is_error {
            let error = format_runtime_error(result.and_then(|r| r.runtime_error.as_ref()));
            line.push_str(separator);
            if use_colors {
                line.push_str(&error.red().to_string());
            } else {
                line.push_str(&error);
            }
        }
        line
    });

    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format organizations as "id  name  IMS org", one per line
pub fn format_organizations(organizations: &[Organization]) -> String {
    if organizations.is_empty() {
        return "No organizations found.".to_string();
    }

    organizations
        .iter()
        .map(|org| {
            format!(
                "{}  {}  {}",
                org.id,
                org.name,
                org.ims_org_id.as_deref().unwrap_or("-")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the score histogram, one line per range
pub fn format_distribution(rows: &[DistributionRow]) -> String {
    let header = format!(
        "{:<8}{:>6}{:>6}{:>6}{:>6}",
        "Range",
        Metric::Performance.label(),
        Metric::Seo.label(),
        Metric::Accessibility.label(),
        Metric::BestPractices.label()
    );

    std::iter::once(header)
        .chain(rows.iter().map(|row| {
            format!(
                "{:<8}{:>6}{:>6}{:>6}{:>6}",
                row.name, row.performance, row.seo, row.accessibility, row.best_practices
            )
        }))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a delta series as "index  previous -> current (delta)  Base URL"
pub fn format_delta_series(points: &[DeltaPoint], key: MetricKey) -> String {
    if points.is_empty() {
        return "No audited sites.".to_string();
    }

    let value = |v: Option<f64>| match (v, key) {
        (None, _) => "-".to_string(),
        (Some(s), MetricKey::TotalBlockingTime) => format!("{:.2}s", s),
        (Some(s), MetricKey::Score(_)) => format_percent(s),
    };
    let delta = |d: Option<f64>| match (d, key) {
        (None, _) => "-".to_string(),
        (Some(d), MetricKey::TotalBlockingTime) => format!("{:+.2}s", d),
        (Some(d), MetricKey::Score(_)) => format_signed(d * 100.0),
    };

    points
        .iter()
        .map(|p| {
            format!(
                "{:>3}  {:>6} -> {:<6} ({:>7})  {}",
                p.index,
                value(p.previous),
                value(p.current),
                delta(p.delta),
                p.base_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format mobile/desktop performance pairs as "mobile%  desktop%  name"
pub fn format_performance_pairs(pairs: &[PerformancePair]) -> String {
    if pairs.is_empty() {
        return "No sites audited on both strategies.".to_string();
    }

    let header = format!("{:>6}  {:>7}  Site", "Mobile", "Desktop");
    std::iter::once(header)
        .chain(pairs.iter().map(|p| {
            format!(
                "{:>5}%  {:>6}%  {}",
                p.mobile_score, p.desktop_score, p.name
            )
        }))
        .collect::<Vec<_>>()
        .join("\n")
}
