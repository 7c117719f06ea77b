//! A cell value that may not have parsed.
//!
//! Rows are read in full and written back in full, so a cell we cannot understand must survive the
//! round trip untouched. `Lenient<T>` holds either the parsed value or the original text.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Lenient<T> {
    Parsed(T),
    Unparsed(String),
}

impl<T> Default for Lenient<T> {
    fn default() -> Self {
        Lenient::Unparsed(String::new())
    }
}

impl<T> Lenient<T> {
    /// Parses `s` with `f`. Blank input and parse failures keep the original text.
    pub fn parse_with<F>(s: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(&str) -> Option<T>,
    {
        let s = s.into();
        if s.trim().is_empty() {
            return Lenient::Unparsed(s);
        }
        match f(&s) {
            Some(value) => Lenient::Parsed(value),
            None => Lenient::Unparsed(s),
        }
    }

    pub fn parsed(&self) -> Option<&T> {
        match self {
            Lenient::Parsed(value) => Some(value),
            Lenient::Unparsed(_) => None,
        }
    }

    /// True when the cell held something that could not be parsed. Blank cells are not invalid.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Lenient::Unparsed(s) if !s.trim().is_empty())
    }
}

impl<T: Display> Display for Lenient<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Lenient::Parsed(value) => Display::fmt(value, f),
            Lenient::Unparsed(s) => f.write_str(s),
        }
    }
}

/// Serializes as the cell text, so JSON output looks like the sheet.
impl<T: Display> Serialize for Lenient<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(value: T) -> Self {
        Lenient::Parsed(value)
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parses the date formats we see in budget sheets: ISO dates, US `M/D/YYYY` dates, and ISO dates
/// with a time part (which is what dataframe exports write).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.split([' ', 'T']).next().unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 10, 5).unwrap();
        for s in [
            "2025-10-05",
            "10/5/2025",
            "10/05/2025",
            "2025/10/05",
            "2025-10-05 00:00:00",
            "2025-10-05T13:45:00",
            " 2025-10-05 ",
        ] {
            assert_eq!(parse_date(s), Some(expected), "{s}");
        }
        assert_eq!(parse_date("next tuesday"), None);
        assert_eq!(parse_date("2025-13-01"), None);
    }

    #[test]
    fn test_lenient_keeps_original_text() {
        let cell: Lenient<NaiveDate> = Lenient::parse_with("sometime in May", parse_date);
        assert!(cell.parsed().is_none());
        assert!(cell.is_invalid());
        assert_eq!(cell.to_string(), "sometime in May");
    }

    #[test]
    fn test_lenient_blank_is_not_invalid() {
        let cell: Lenient<NaiveDate> = Lenient::parse_with("", parse_date);
        assert!(cell.parsed().is_none());
        assert!(!cell.is_invalid());
        assert_eq!(cell.to_string(), "");
    }

    #[test]
    fn test_lenient_parsed_date_writes_iso() {
        let cell: Lenient<NaiveDate> = Lenient::parse_with("1/9/2025", parse_date);
        assert_eq!(cell.to_string(), "2025-01-09");
    }
}
