//! Call Types
//!
//! Persisted call records and the transient state of a ringing or active
//! call. The console owns the transient state; the store owns records.
//!
//! The persisted column names follow the `call_logs` table: direction is
//! stored as `status` and disposition as `call_status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Duration written for a call that has not ended (or never connected)
pub const ZERO_DURATION: &str = "00:00";

/// Record identifier assigned by the store
///
/// Stores may hand out text (uuid) or integer keys; both are kept as text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Create a record ID from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

/// Which way the call went
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    /// Caller reached the agent
    Inbound,
    /// Agent dialed out
    Outbound,
}

impl CallDirection {
    /// Wire value (`inbound` / `outbound`)
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inbound => "Inbound",
            Self::Outbound => "Outbound",
        }
    }
}

/// Outcome of a call attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDisposition {
    /// The call connected
    Answered,
    /// The agent rejected the call
    Declined,
}

impl CallDisposition {
    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Answered => "Answered",
            Self::Declined => "Declined",
        }
    }
}

/// A call record as stored
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Store-assigned identity
    pub id: RecordId,
    /// Free-form phone number as typed or received
    pub phone_number: String,
    /// When the call was answered, declined or dialed
    pub start_time: DateTime<Utc>,
    /// Talk time as `mm:ss`
    pub duration: String,
    /// Inbound or outbound
    #[serde(rename = "status")]
    pub direction: CallDirection,
    /// Answered or declined
    #[serde(rename = "call_status")]
    pub disposition: CallDisposition,
}

/// A call record about to be inserted
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewCallRecord {
    /// Free-form phone number
    pub phone_number: String,
    /// When the attempt happened
    pub start_time: DateTime<Utc>,
    /// Always `00:00` at insert time
    pub duration: String,
    /// Inbound or outbound
    #[serde(rename = "status")]
    pub direction: CallDirection,
    /// Answered or declined
    #[serde(rename = "call_status")]
    pub disposition: CallDisposition,
}

impl NewCallRecord {
    fn new(
        phone_number: impl Into<String>,
        start_time: DateTime<Utc>,
        direction: CallDirection,
        disposition: CallDisposition,
    ) -> Self {
        Self {
            phone_number: phone_number.into(),
            start_time,
            duration: ZERO_DURATION.to_string(),
            direction,
            disposition,
        }
    }

    /// An incoming call the agent picked up
    pub fn answered(phone_number: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self::new(
            phone_number,
            start_time,
            CallDirection::Inbound,
            CallDisposition::Answered,
        )
    }

    /// An incoming call the agent rejected
    pub fn declined(phone_number: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self::new(
            phone_number,
            start_time,
            CallDirection::Inbound,
            CallDisposition::Declined,
        )
    }

    /// A call the agent dialed
    pub fn dialed(phone_number: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self::new(
            phone_number,
            start_time,
            CallDirection::Outbound,
            CallDisposition::Answered,
        )
    }

    /// Attach a store-assigned id
    #[must_use]
    pub fn into_record(self, id: RecordId) -> CallRecord {
        CallRecord {
            id,
            phone_number: self.phone_number,
            start_time: self.start_time,
            duration: self.duration,
            direction: self.direction,
            disposition: self.disposition,
        }
    }
}

/// A call waiting to be answered or declined
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingCall {
    /// Caller's number
    pub number: String,
    /// When it started ringing
    pub arrived_at: DateTime<Utc>,
}

/// The call in progress
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveCall {
    /// Remote party's number
    pub number: String,
    /// Inbound or outbound
    pub direction: CallDirection,
    /// Seconds since the call connected
    pub elapsed_secs: u64,
    /// Microphone muted (simulated)
    pub muted: bool,
    /// Call on hold (simulated)
    pub on_hold: bool,
}

impl ActiveCall {
    /// A freshly connected call
    pub fn new(number: impl Into<String>, direction: CallDirection) -> Self {
        Self {
            number: number.into(),
            direction,
            elapsed_secs: 0,
            muted: false,
            on_hold: false,
        }
    }

    /// Elapsed time as `mm:ss`
    #[must_use]
    pub fn formatted_duration(&self) -> String {
        format_duration(self.elapsed_secs)
    }
}

/// Where the call lifecycle currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallPhase {
    /// No call ringing or connected
    Idle,
    /// An incoming call is waiting
    Ringing,
    /// A call is connected
    Active,
}

impl CallPhase {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Ringing => "Ringing",
            Self::Active => "On a call",
        }
    }
}

/// Format seconds as zero-padded `mm:ss`
///
/// Minutes are not wrapped into hours, so long sessions read `125:03`.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(7), "00:07");
        assert_eq!(format_duration(65), "01:05");
        assert_eq!(format_duration(3599), "59:59");
        assert_eq!(format_duration(7503), "125:03");
    }

    #[test]
    fn test_new_record_constructors() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let answered = NewCallRecord::answered("+1 234-567-8900", now);
        assert_eq!(answered.direction, CallDirection::Inbound);
        assert_eq!(answered.disposition, CallDisposition::Answered);
        assert_eq!(answered.duration, ZERO_DURATION);

        let declined = NewCallRecord::declined("+1 234-567-8900", now);
        assert_eq!(declined.direction, CallDirection::Inbound);
        assert_eq!(declined.disposition, CallDisposition::Declined);

        let dialed = NewCallRecord::dialed("5551234", now);
        assert_eq!(dialed.direction, CallDirection::Outbound);
        assert_eq!(dialed.disposition, CallDisposition::Answered);
    }

    #[test]
    fn test_record_uses_table_column_names() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_value(NewCallRecord::dialed("5551234", now)).unwrap();

        assert_eq!(json["phone_number"], "5551234");
        assert_eq!(json["status"], "outbound");
        assert_eq!(json["call_status"], "answered");
        assert_eq!(json["duration"], "00:00");
        assert!(json.get("direction").is_none());
    }

    #[test]
    fn test_record_accepts_numeric_and_text_ids() {
        let numeric = r#"{"id": 42, "phone_number": "1", "start_time": "2024-05-01T12:00:00+00:00",
            "duration": "00:10", "status": "inbound", "call_status": "declined"}"#;
        let record: CallRecord = serde_json::from_str(numeric).unwrap();
        assert_eq!(record.id, RecordId::new("42"));
        assert_eq!(record.disposition, CallDisposition::Declined);

        let text = r#"{"id": "9b2f", "phone_number": "1", "start_time": "2024-05-01T12:00:00Z",
            "duration": "00:10", "status": "outbound", "call_status": "answered"}"#;
        let record: CallRecord = serde_json::from_str(text).unwrap();
        assert_eq!(record.id.as_str(), "9b2f");
        assert_eq!(record.direction, CallDirection::Outbound);
    }
}
