//! Calendar integration
//!
//! Two halves:
//! - [`client`]: the [`CalendarApi`] collaborator and its Google Calendar v3 implementation
//! - [`exporter`]: projection of the weekly model onto concrete dated events, inserted one
//!   at a time with progress reporting
//!
//! ## Usage
//!
//! Point the client at a calendar in `~/.config/weekplan/config.toml`:
//!
//! ```toml
//! [calendar]
//! calendar_id = "primary"
//! time_zone = "America/Los_Angeles"
//! # or export WEEKPLAN_CALENDAR_TOKEN
//! access_token = "ya29...."
//! ```

pub mod client;
pub mod exporter;

use serde::{Deserialize, Serialize};

pub use client::{CalendarApi, GoogleCalendarClient};
pub use exporter::{CalendarExporter, ExportProgress, ExportReport, ProgressSink};

/// Start or end of an event.
///
/// Timed events carry `dateTime`; all-day events carry `date` only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    /// A timed instant: local `date_time` (no offset) interpreted in `time_zone`.
    pub fn local(date_time: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            date: None,
            time_zone: Some(time_zone.into()),
        }
    }
}

/// Body of an event insert request. Built per exported task, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventPayload {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    /// Palette index `"1"`..`"11"`
    pub color_id: String,
}

/// An event as reported by the calendar service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
    /// RFC 5545 lines (`RRULE:FREQ=WEEKLY;BYDAY=MO,WE`) on recurring events
    #[serde(default)]
    pub recurrence: Option<Vec<String>>,
}

impl CalendarEvent {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.as_ref().is_some_and(|rules| !rules.is_empty())
    }
}
