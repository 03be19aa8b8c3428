use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// A candidate meeting window on a single calendar day, interpreted in the
/// poll's reference time zone. Identified by its position in
/// `Poll::time_slots`; that index is the stable key used everywhere else.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub date: NaiveDate,
    #[serde(rename = "startTime", with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(rename = "endTime", with = "hhmm")]
    pub end_time: NaiveTime,
}

impl TimeSlot {
    /// Construct a new TimeSlot
    ///
    /// # Examples
    /// ```
    /// use chrono::{NaiveDate, NaiveTime};
    /// use meetsync_engine::poll::TimeSlot;
    ///
    /// let slot = TimeSlot::new(
    ///     NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    ///     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    ///     NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
    /// );
    ///
    /// assert_eq!(slot.date.to_string(), "2024-01-15");
    /// ```
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> TimeSlot {
        TimeSlot {
            date,
            start_time,
            end_time,
        }
    }
}

/// A poll definition: an ordered sequence of candidate slots anchored to a
/// reference time zone. The slot ordering defines the index keys and is
/// never re-sorted after creation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Poll {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "timeSlots")]
    pub time_slots: Vec<TimeSlot>,
    #[serde(rename = "referenceTimeZone")]
    pub reference_time_zone: String,
    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Poll {
    pub fn new(
        id: &str,
        title: &str,
        time_slots: Vec<TimeSlot>,
        reference_time_zone: &str,
    ) -> Poll {
        Poll {
            id: id.to_string(),
            title: title.to_string(),
            time_slots,
            reference_time_zone: reference_time_zone.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Checks the slot invariants: each slot must end after it starts, and
    /// the `(date, startTime, endTime)` tuples must be unique. A poll with
    /// zero slots is valid; it yields empty results downstream.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::with_capacity(self.time_slots.len());

        for (index, slot) in self.time_slots.iter().enumerate() {
            if slot.start_time >= slot.end_time {
                return Err(EngineError::InvalidTimeSlot { index });
            }

            if !seen.insert((slot.date, slot.start_time, slot.end_time)) {
                return Err(EngineError::DuplicateTimeSlot { index });
            }
        }

        Ok(())
    }
}

/// Optional participant geolocation. Carried through for display; never
/// used by the scorer (geodesic weighting is an extension point).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(
        rename = "displayName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
}

/// One participant's submission: an ordered boolean vector over the poll's
/// slots, tagged with the participant's own IANA time zone.
///
/// The external store owns replace-on-resubmit semantics; the engine
/// consumes whatever snapshot it is handed.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ParticipantResponse {
    #[serde(rename = "participantId")]
    pub participant_id: String,
    pub name: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub availability: Vec<bool>,
    #[serde(rename = "submittedAt", default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

impl ParticipantResponse {
    pub fn new(
        participant_id: &str,
        name: &str,
        time_zone: &str,
        availability: Vec<bool>,
    ) -> ParticipantResponse {
        ParticipantResponse {
            participant_id: participant_id.to_string(),
            name: name.to_string(),
            time_zone: time_zone.to_string(),
            location: None,
            availability,
            submitted_at: Utc::now(),
        }
    }

    pub fn with_location(mut self, lat: f64, lng: f64, display_name: Option<&str>) -> Self {
        self.location = Some(Location {
            lat,
            lng,
            display_name: display_name.map(str::to_string),
        });
        self
    }
}

#[derive(Serialize, Error, Debug, Clone, Eq, PartialEq)]
pub enum EngineError {
    #[error("Unrecognized time zone identifier: {zone}")]
    InvalidTimeZone { zone: String },
    #[error("Availability vector of {participant} has {found} entries, poll has {expected} slots")]
    AvailabilityLengthMismatch {
        participant: String,
        expected: usize,
        found: usize,
    },
    #[error("Time slot {index} ends at or before its start")]
    InvalidTimeSlot { index: usize },
    #[error("Time slot {index} duplicates an earlier (date, startTime, endTime) tuple")]
    DuplicateTimeSlot { index: usize },
}

/// Wall-clock times cross the JSON boundary as "HH:MM", matching the poll
/// creation payloads.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}
