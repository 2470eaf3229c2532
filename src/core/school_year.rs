//! School year strings ("2024-2025")

use crate::error::{ImportError, ImportResult};
use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

/// First month of a new school year (September)
const SCHOOL_YEAR_START_MONTH: u32 = 9;

/// School year containing `date`; the year rolls over in September
pub fn school_year_for(date: NaiveDate) -> String {
    let year = date.year();
    if date.month() >= SCHOOL_YEAR_START_MONTH {
        format!("{}-{}", year, year + 1)
    } else {
        format!("{}-{}", year - 1, year)
    }
}

/// School year for today's local date
pub fn current_school_year() -> String {
    school_year_for(Local::now().date_naive())
}

/// Validate an explicit `--year`, or fall back to the current school year
pub fn resolve_school_year(explicit: Option<&str>) -> ImportResult<String> {
    let Some(raw) = explicit else {
        return Ok(current_school_year());
    };

    let year = raw.trim();
    let re = Regex::new(r"^(\d{4})-(\d{4})$")
        .map_err(|e| ImportError::InvalidArgument(e.to_string()))?;

    let caps = re.captures(year).ok_or_else(|| {
        ImportError::InvalidArgument(format!(
            "school year '{}' is not in YYYY-YYYY form",
            raw
        ))
    })?;

    let start: i32 = caps[1].parse().unwrap_or_default();
    let end: i32 = caps[2].parse().unwrap_or_default();
    if end != start + 1 {
        return Err(ImportError::InvalidArgument(format!(
            "school year '{}' must span two consecutive years",
            raw
        )));
    }

    Ok(year.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_school_year_before_september() {
        assert_eq!(school_year_for(date(2025, 1, 15)), "2024-2025");
        assert_eq!(school_year_for(date(2025, 8, 31)), "2024-2025");
    }

    #[test]
    fn test_school_year_from_september() {
        assert_eq!(school_year_for(date(2025, 9, 1)), "2025-2026");
        assert_eq!(school_year_for(date(2025, 12, 31)), "2025-2026");
    }

    #[test]
    fn test_resolve_explicit_year() {
        assert_eq!(resolve_school_year(Some("2023-2024")).unwrap(), "2023-2024");
        assert_eq!(resolve_school_year(Some(" 2023-2024 ")).unwrap(), "2023-2024");
    }

    #[test]
    fn test_resolve_rejects_bad_years() {
        assert!(matches!(
            resolve_school_year(Some("2023")),
            Err(ImportError::InvalidArgument(_))
        ));
        assert!(matches!(
            resolve_school_year(Some("2023-2025")),
            Err(ImportError::InvalidArgument(_))
        ));
        assert!(resolve_school_year(Some("23-24")).is_err());
    }

    #[test]
    fn test_resolve_defaults_to_current() {
        assert_eq!(resolve_school_year(None).unwrap(), current_school_year());
    }
}
