//! Wall Clocks
//!
//! The clock bar shows the current time in four US zones. Readings are
//! computed from the console tick's shared "now" so every clock and
//! counter moves together.
//!
//! Daylight saving follows the US rule in force since 2007: from the second
//! Sunday of March to the first Sunday of November, switching at 02:00
//! local time. Dates before 2007 get the same rule.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// A continental US timezone
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsTimeZone {
    /// America/New_York
    Eastern,
    /// America/Chicago
    Central,
    /// America/Denver
    Mountain,
    /// America/Los_Angeles
    Pacific,
}

impl UsTimeZone {
    /// Zones shown in the clock bar, east to west
    pub const ALL: [UsTimeZone; 4] = [Self::Eastern, Self::Central, Self::Mountain, Self::Pacific];

    /// Column label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Eastern => "EST",
            Self::Central => "CST",
            Self::Mountain => "MST",
            Self::Pacific => "PST",
        }
    }

    fn standard_offset_hours(self) -> i64 {
        match self {
            Self::Eastern => -5,
            Self::Central => -6,
            Self::Mountain => -7,
            Self::Pacific => -8,
        }
    }

    /// Whether daylight saving time is in effect at `now`
    #[must_use]
    pub fn is_dst(&self, now: DateTime<Utc>) -> bool {
        let year = now.year();
        let (Some(start_day), Some(end_day)) = (
            NaiveDate::from_weekday_of_month_opt(year, 3, Weekday::Sun, 2),
            NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Sun, 1),
        ) else {
            return false;
        };
        let (Some(start_local), Some(end_local)) =
            (start_day.and_hms_opt(2, 0, 0), end_day.and_hms_opt(2, 0, 0))
        else {
            return false;
        };

        let standard = Duration::hours(self.standard_offset_hours());
        // Starts at 02:00 standard time, ends at 02:00 daylight time
        let start_utc = (start_local - standard).and_utc();
        let end_utc = (end_local - standard - Duration::hours(1)).and_utc();

        now >= start_utc && now < end_utc
    }

    /// UTC offset in effect at `now`
    #[must_use]
    pub fn offset_at(&self, now: DateTime<Utc>) -> FixedOffset {
        let hours = self.standard_offset_hours() + i64::from(self.is_dst(now));
        // Offsets are a few hours, always in range
        FixedOffset::east_opt((hours * 3600) as i32).unwrap_or_else(|| Utc.fix())
    }

    /// Local wall time at `now`
    #[must_use]
    pub fn local_time(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.offset_at(now))
    }

    /// Local time as `hh:mm:ss AM`
    #[must_use]
    pub fn format_time(&self, now: DateTime<Utc>) -> String {
        self.local_time(now).format("%I:%M:%S %p").to_string()
    }
}

/// One clock in the clock bar
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneReading {
    /// Column label (EST, CST, ...)
    pub label: &'static str,
    /// Formatted local time
    pub time: String,
}

/// Readings for every zone in the clock bar at `now`
#[must_use]
pub fn clock_bar(now: DateTime<Utc>) -> Vec<ZoneReading> {
    UsTimeZone::ALL
        .iter()
        .map(|zone| ZoneReading {
            label: zone.label(),
            time: zone.format_time(now),
        })
        .collect()
}
