//! Call History
//!
//! The capped list of recent call records shown in the activity log.
//! Every refresh replaces the list wholesale.
//!
//! Refreshes are asynchronous and can complete out of order. Each one is
//! tagged with a [`RefreshTicket`]; a response whose ticket is older than
//! the newest applied one is dropped.

use chrono::{DateTime, TimeZone, Utc};

use crate::call::CallRecord;

/// Default number of records kept
pub const DEFAULT_HISTORY_LIMIT: usize = 15;

/// Generation tag for one history refresh
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshTicket(pub u64);

/// Recent call records, newest first
#[derive(Clone, Debug)]
pub struct CallHistory {
    records: Vec<CallRecord>,
    limit: usize,
    issued: u64,
    applied: u64,
}

impl Default for CallHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl CallHistory {
    /// Create an empty history holding at most `limit` records
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            records: Vec::new(),
            limit,
            issued: 0,
            applied: 0,
        }
    }

    /// Maximum number of records kept
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Records, newest first
    #[must_use]
    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }

    /// Issue a ticket for a new refresh
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    /// Whether a response for `ticket` would be discarded
    #[must_use]
    pub fn is_stale(&self, ticket: RefreshTicket) -> bool {
        ticket.0 <= self.applied
    }

    /// Apply a refresh result
    ///
    /// Returns `false` (and changes nothing) for a stale ticket.
    pub fn apply(&mut self, ticket: RefreshTicket, mut records: Vec<CallRecord>) -> bool {
        if self.is_stale(ticket) {
            tracing::debug!(
                ticket = ticket.0,
                applied = self.applied,
                "Discarding stale history refresh"
            );
            return false;
        }
        records.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        records.truncate(self.limit);
        self.records = records;
        self.applied = ticket.0;
        true
    }
}

/// Format when a call was received, relative to `now`
///
/// Calls from today (in `now`'s timezone) show the time only, e.g.
/// `02:05 PM`; older calls add the date, e.g. `Mar 4, 09:30 AM`.
pub fn format_received<Tz: TimeZone>(start: &DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let local = start.with_timezone(&now.timezone());
    if local.date_naive() == now.date_naive() {
        local.format("%I:%M %p").to_string()
    } else {
        local.format("%b %-d, %I:%M %p").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::{NewCallRecord, RecordId};
    use chrono::{Duration, FixedOffset};
    use pretty_assertions::assert_eq;

    fn record(id: u32, minutes_ago: i64) -> CallRecord {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        NewCallRecord::answered(format!("555-{id:04}"), base - Duration::minutes(minutes_ago))
            .into_record(RecordId::new(id.to_string()))
    }

    #[test]
    fn test_apply_sorts_and_caps() {
        let mut history = CallHistory::default();
        let records: Vec<_> = (0..20).map(|i| record(i, i64::from(i * 7 % 20))).collect();

        let ticket = history.begin_refresh();
        assert!(history.apply(ticket, records));

        let applied = history.records();
        assert_eq!(applied.len(), DEFAULT_HISTORY_LIMIT);
        assert!(applied
            .windows(2)
            .all(|pair| pair[0].start_time >= pair[1].start_time));
    }

    #[test]
    fn test_stale_refresh_is_discarded() {
        let mut history = CallHistory::new(5);
        let first = history.begin_refresh();
        let second = history.begin_refresh();

        assert!(history.apply(second, vec![record(2, 0), record(1, 5)]));
        assert!(history.is_stale(first));
        assert!(!history.apply(first, vec![record(1, 5)]));

        assert_eq!(history.records().len(), 2);
        assert_eq!(history.records()[0].id, RecordId::new("2"));
    }

    #[test]
    fn test_format_received_today_and_earlier() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap();

        let today = Utc.with_ymd_and_hms(2024, 6, 1, 19, 5, 0).unwrap();
        assert_eq!(format_received(&today, &now), "02:05 PM");

        let earlier = Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap();
        assert_eq!(format_received(&earlier, &now), "Mar 4, 09:30 AM");
    }
}
