use std::collections::BTreeMap;

use time::{Date, Duration};

use super::dto::{
    DateRange, DaySummary, MacroAverages, MacroRecord, MacroTotals, SaveMacrosRequest, StoredMacro,
    WeeklyMacrosResponse,
};
use crate::dates::{format_date, parse_date};
use crate::error::AppError;

/// Validates the request and truncates every macro value toward zero.
pub fn into_record(req: SaveMacrosRequest, today: Date) -> Result<MacroRecord, AppError> {
    let username = req.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::bad_request("Username is required"));
    }
    let date_added = match req.date_added.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => format_date(parse_date(raw)?),
        _ => format_date(today),
    };
    Ok(MacroRecord {
        username,
        meal_name: req.meal_name,
        food_name: req.food_name,
        calories: req.calories as i64,
        proteins: req.proteins as i64,
        fats: req.fats as i64,
        carbs: req.carbs as i64,
        date_added,
    })
}

/// Without `start`, the range is the week ending today. With `start` only, it is
/// the week starting there. `end` is ignored when `start` is missing.
pub fn resolve_range(start: Option<&str>, end: Option<&str>, today: Date) -> Result<(Date, Date), AppError> {
    let start = start.map(str::trim).filter(|s| !s.is_empty());
    let end = end.map(str::trim).filter(|s| !s.is_empty());
    let (start, end) = match (start, end) {
        (None, _) => (today - Duration::days(6), today),
        (Some(s), None) => {
            let s = parse_date(s)?;
            (s, s + Duration::days(6))
        }
        (Some(s), Some(e)) => (parse_date(s)?, parse_date(e)?),
    };
    if end < start {
        return Err(AppError::bad_request("end_date must not be before start_date"));
    }
    Ok((start, end))
}

/// Keeps entries dated within `[start, end]` and aggregates them per day.
/// Averages divide by the number of days that have at least one entry.
pub fn summarize(entries: Vec<StoredMacro>, start: Date, end: Date) -> WeeklyMacrosResponse {
    let (start_str, end_str) = (format_date(start), format_date(end));

    let mut daily_summary: BTreeMap<String, DaySummary> = BTreeMap::new();
    for entry in entries {
        let date = entry.record.date_added.as_str();
        if date < start_str.as_str() || date > end_str.as_str() {
            continue;
        }
        let day = daily_summary.entry(date.to_string()).or_default();
        // Stored values are unbounded; saturate rather than wrap.
        day.calories = day.calories.saturating_add(entry.record.calories);
        day.proteins = day.proteins.saturating_add(entry.record.proteins);
        day.carbs = day.carbs.saturating_add(entry.record.carbs);
        day.fats = day.fats.saturating_add(entry.record.fats);
        day.meals.push(entry);
    }

    let weekly_totals = daily_summary.values().fold(MacroTotals::default(), |acc, d| MacroTotals {
        calories: acc.calories.saturating_add(d.calories),
        proteins: acc.proteins.saturating_add(d.proteins),
        carbs: acc.carbs.saturating_add(d.carbs),
        fats: acc.fats.saturating_add(d.fats),
    });

    let days = daily_summary.len().max(1) as f64;
    let daily_averages = MacroAverages {
        calories: weekly_totals.calories as f64 / days,
        proteins: weekly_totals.proteins as f64 / days,
        carbs: weekly_totals.carbs as f64 / days,
        fats: weekly_totals.fats as f64 / days,
    };

    WeeklyMacrosResponse {
        success: true,
        daily_summary,
        weekly_totals,
        daily_averages,
        date_range: DateRange {
            start_date: start_str,
            end_date: end_str,
        },
    }
}
