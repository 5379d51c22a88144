use time::{macros::format_description, Date, OffsetDateTime};

use crate::error::AppError;

/// Current calendar day in UTC.
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::bad_request("Invalid date format. Use YYYY-MM-DD"))
}

pub fn format_date(date: Date) -> String {
    // Numeric components only, so formatting cannot fail.
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}
