//! Season strings.
//!
//! A football season runs from July to June and is written with both
//! calendar years, e.g. `"2023/2024"`.

use crate::error::CoreError;
use chrono::{Datelike, NaiveDate};

/// The first month that belongs to a new season.
pub const SEASON_START_MONTH: u32 = 7;

/// Infers the season a date falls in.
///
/// July or later belongs to `YEAR/YEAR+1`, anything earlier to `YEAR-1/YEAR`.
pub fn season_for_date(date: NaiveDate) -> String {
    let start_year = season_start_year(date);
    format_season(start_year)
}

pub fn season_start_year(date: NaiveDate) -> i32 {
    if date.month() >= SEASON_START_MONTH {
        date.year()
    } else {
        date.year() - 1
    }
}

pub fn format_season(start_year: i32) -> String {
    format!("{}/{}", start_year, start_year + 1)
}

/// Parses a `"YYYY/YYYY"` season string and returns its start year.
pub fn parse_season(season: &str) -> Result<i32, CoreError> {
    let invalid = || CoreError::invalid("season", format!("'{season}' is not in YYYY/YYYY form"));

    let (start, end) = season.trim().split_once('/').ok_or_else(invalid)?;
    let four_digits = |part: &str| part.len() == 4 && part.chars().all(|c| c.is_ascii_digit());
    if !four_digits(start) || !four_digits(end) {
        return Err(invalid());
    }
    let start: i32 = start.parse().map_err(|_| invalid())?;
    let end: i32 = end.parse().map_err(|_| invalid())?;
    if end != start + 1 {
        return Err(CoreError::invalid(
            "season",
            format!("'{season}' must span two consecutive years"),
        ));
    }
    Ok(start)
}

/// First and last day of a season (1 July to 30 June).
pub fn season_bounds(season: &str) -> Result<(NaiveDate, NaiveDate), CoreError> {
    let start_year = parse_season(season)?;
    let out_of_range = || CoreError::invalid("season", format!("'{season}' is out of range"));
    let start = NaiveDate::from_ymd_opt(start_year, SEASON_START_MONTH, 1).ok_or_else(out_of_range)?;
    let end = NaiveDate::from_ymd_opt(start_year + 1, SEASON_START_MONTH - 1, 30).ok_or_else(out_of_range)?;
    Ok((start, end))
}

/// Every season the interval `[start, end]` touches, oldest first.
pub fn seasons_between(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    if end < start {
        return Vec::new();
    }
    (season_start_year(start)..=season_start_year(end))
        .map(format_season)
        .collect()
}
