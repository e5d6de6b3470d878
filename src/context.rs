use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::Serialize;

/// Coarse daypart derived from the hour of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Maps a 24h hour onto a daypart.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        };
        f.write_str(s)
    }
}

/// Northern-hemisphere season derived from the month of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Maps a calendar month (1-12) onto a season.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        };
        f.write_str(s)
    }
}

/// Context derived from the requested moment, recomputed per request and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoemContext {
    pub time_of_day: TimeOfDay,
    pub season: Season,
    pub iso_datetime: String,
}

/// Derives a [`PoemContext`] from `"HH:MM"` and `"YYYY-MM-DD"` strings.
///
/// Returns `None` when either string does not form a real clock time or
/// calendar date; callers substitute generic placeholders downstream.
pub fn derive_context(time: &str, date: &str) -> Option<PoemContext> {
    let t = NaiveTime::parse_from_str(time, "%H:%M").ok()?;
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(PoemContext {
        time_of_day: TimeOfDay::from_hour(t.hour()),
        season: Season::from_month(d.month()),
        iso_datetime: d.and_time(t).format("%Y-%m-%dT%H:%M:%S").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daypart_band_edges() {
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(16), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(20), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Night);
    }

    #[test]
    fn season_band_edges() {
        assert_eq!(Season::from_month(2), Season::Winter);
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(5), Season::Spring);
        assert_eq!(Season::from_month(6), Season::Summer);
        assert_eq!(Season::from_month(8), Season::Summer);
        assert_eq!(Season::from_month(9), Season::Autumn);
        assert_eq!(Season::from_month(11), Season::Autumn);
        assert_eq!(Season::from_month(12), Season::Winter);
    }

    #[test]
    fn derives_iso_datetime() {
        let ctx = derive_context("09:57", "2025-03-01").unwrap();
        assert_eq!(ctx.time_of_day, TimeOfDay::Morning);
        assert_eq!(ctx.season, Season::Spring);
        assert_eq!(ctx.iso_datetime, "2025-03-01T09:57:00");
    }

    #[test]
    fn unparseable_input_yields_none() {
        assert!(derive_context("9am", "2025-03-01").is_none());
        assert!(derive_context("09:57", "March 1st").is_none());
        assert!(derive_context("25:00", "2025-03-01").is_none());
        assert!(derive_context("09:57", "2025-02-30").is_none());
        assert!(derive_context("", "").is_none());
    }
}
