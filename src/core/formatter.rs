use chrono::{DateTime, Local, Utc};

use crate::core::cache_savings::finite_or_zero;

/// Returns "1,234,567" style grouping.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Compact token count for stat cards: "950", "12.3K", "4.5M".
pub fn format_tokens(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Dollar amount with four decimals, the precision used for costs.
pub fn format_cost(dollars: f64) -> String {
    format!("${:.4}", finite_or_zero(dollars))
}

/// Dollar amount with two decimals, used for monthly projections.
pub fn format_dollars(dollars: f64) -> String {
    format!("${:.2}", finite_or_zero(dollars))
}

/// Returns "25.0%".
pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", finite_or_zero(percent))
}

/// Table cell for a last-request timestamp, "N/A" when absent.
pub fn format_last_request(at: Option<&DateTime<Utc>>) -> String {
    match at {
        Some(at) => at
            .with_timezone(&Local)
            .format("%b %-d, %Y, %-I:%M %p")
            .to_string(),
        None => "N/A".to_string(),
    }
}

/// Detail line variant of [`format_last_request`].
pub fn format_last_activity(at: Option<&DateTime<Utc>>) -> String {
    match at {
        Some(_) => format!("Last active {}", format_last_request(at)),
        None => "No recent activity".to_string(),
    }
}

/// Horizontal bar of `width` cells filled in proportion to `value / max`.
pub fn format_bar(value: f64, max: f64, width: usize) -> String {
    let value = finite_or_zero(value).max(0.0);
    let ratio = if max > 0.0 { (value / max).min(1.0) } else { 0.0 };
    let filled = (ratio * width as f64).round() as usize;
    // Non-zero values always get at least one cell.
    let filled = if value > 0.0 { filled.max(1) } else { filled };
    "█".repeat(filled.min(width))
}
