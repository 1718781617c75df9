use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

/// Total decimal conversion: blank or invalid input yields zero.
pub fn parse_decimal(text: &str) -> Decimal {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

/// Invoice header dates are `dd.mm.yyyy`; the result is at midnight.
pub fn parse_invoice_date(text: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(text.trim(), "%d.%m.%Y")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// RFC 3339 timestamp, with the first `Z` rewritten to `+00:00`.
pub fn parse_card_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let normalized = text.trim().replacen('Z', "+00:00", 1);
    DateTime::parse_from_rfc3339(&normalized).ok()
}

/// First run of ASCII digits, if any.
pub fn first_digit_run(text: &str) -> Option<&str> {
    DIGIT_RUN.find(text).map(|m| m.as_str())
}
