// Date expression parsing and display for deal and prospect dates

use anyhow::Result;
use chrono::{Local, NaiveDate, TimeDelta};

/// Parse a date expression relative to `today`.
///
/// Accepts `YYYY-MM-DD`, `today`, `tomorrow`, `yesterday` and offsets such
/// as `+3d` or `+2w`.
pub fn parse_date_expr_from(expr: &str, today: NaiveDate) -> Result<NaiveDate> {
    let expr = expr.trim();
    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        return Ok(date);
    }

    let shifted = match expr.to_lowercase().as_str() {
        "today" => Some(today),
        "tomorrow" => today.checked_add_signed(TimeDelta::days(1)),
        "yesterday" => today.checked_sub_signed(TimeDelta::days(1)),
        _ => parse_offset(expr).and_then(|delta| today.checked_add_signed(delta)),
    };
    if let Some(date) = shifted {
        return Ok(date);
    }

    anyhow::bail!(
        "Unrecognized date '{}'. Use YYYY-MM-DD, today, tomorrow, or an offset like +3d / +2w.",
        expr
    )
}

/// `+Nd` / `+Nw`; None when malformed or out of range
fn parse_offset(expr: &str) -> Option<TimeDelta> {
    let offset = expr.strip_prefix('+')?;
    let unit = offset.chars().last()?;
    let count: i64 = offset[..offset.len() - unit.len_utf8()].parse().ok()?;
    match unit {
        'd' => TimeDelta::try_days(count),
        'w' => TimeDelta::try_weeks(count),
        _ => None,
    }
}

/// Parse a date expression relative to the local current date
pub fn parse_date_expr(expr: &str) -> Result<NaiveDate> {
    parse_date_expr_from(expr, today())
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Relative description of `date` as seen from `today`
pub fn format_relative_date(date: NaiveDate, today: NaiveDate) -> String {
    let days = (date - today).num_days();
    match days {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        d if d < 0 => format!("{} days ago", -d),
        d if d <= 365 => format!("in {} days", d),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}
