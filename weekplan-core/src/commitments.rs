//! Fixed commitments: the user's standing work/class/personal blocks.
//!
//! Commitments are filed per day, one copy for each weekday they apply to, which is the
//! shape prompt construction consumes. All copies of one commitment share its id.

use chrono::{DateTime, Datelike, Duration, NaiveDate, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarEvent;
use crate::types::{CommitmentSchedule, EventType, Recurrence, ScheduleEvent, Weekday};

/// Days covered by a calendar import, counted from the Sunday that starts the current week
pub const IMPORT_WINDOW_DAYS: i64 = 38;

/// A commitment as entered, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentDraft {
    pub title: String,
    /// Used when `days` is empty
    pub day: Weekday,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub recurrence: Recurrence,
    #[serde(default)]
    pub days: Vec<Weekday>,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// File `draft` under each of its days and return the stored event.
pub fn add_commitment(schedule: &mut CommitmentSchedule, draft: CommitmentDraft) -> ScheduleEvent {
    let event = ScheduleEvent {
        id: new_id(),
        title: draft.title,
        day: draft.day,
        start_time: draft.start_time,
        end_time: draft.end_time,
        kind: draft.kind,
        recurrence: draft.recurrence,
        days: draft.days,
    };

    file_under_days(schedule, &event);
    tracing::debug!(id = %event.id, title = %event.title, "Added commitment");
    event
}

fn file_under_days(schedule: &mut CommitmentSchedule, event: &ScheduleEvent) {
    if event.days.is_empty() {
        schedule.day_mut(event.day).push(event.clone());
        return;
    }

    for &day in &event.days {
        let entries = schedule.day_mut(day);
        if entries.iter().any(|existing| existing.id == event.id) {
            continue;
        }
        entries.push(ScheduleEvent {
            day,
            ..event.clone()
        });
    }
}

/// Remove the commitment with `id` from `day`. Returns whether anything was removed.
pub fn remove_commitment(schedule: &mut CommitmentSchedule, day: Weekday, id: &str) -> bool {
    let entries = schedule.day_mut(day);
    let before = entries.len();
    entries.retain(|event| event.id != id);
    before != entries.len()
}

pub fn clear_commitments(schedule: &mut CommitmentSchedule) {
    *schedule = CommitmentSchedule::default();
}

/// Convert listed calendar events into `work` commitments.
///
/// Recurring events become weekly on their `BYDAY` days (or the start day when the rule
/// names none); one-off events become `once` on their start day. All-day events and events
/// without an id are skipped. Re-importing an event already on a day does not duplicate it.
/// Returns the number of events imported.
pub fn import_calendar_events(
    schedule: &mut CommitmentSchedule,
    events: &[CalendarEvent],
    tz: Tz,
) -> usize {
    let mut imported = 0;

    for event in events {
        match commitment_from_event(event, tz) {
            Some(commitment) => {
                file_under_days(schedule, &commitment);
                imported += 1;
            }
            None => tracing::debug!(id = %event.id, "Skipping calendar event without a usable time"),
        }
    }

    tracing::info!(imported, listed = events.len(), "Imported calendar events");
    imported
}

fn commitment_from_event(event: &CalendarEvent, tz: Tz) -> Option<ScheduleEvent> {
    if event.id.is_empty() {
        return None;
    }
    let start = local_time(event.start.date_time.as_deref()?, tz)?;
    let end = local_time(event.end.date_time.as_deref()?, tz)?;
    let day = Weekday::from(start.weekday());

    let (recurrence, days) = if event.is_recurring() {
        let mut days = event
            .recurrence
            .as_deref()
            .and_then(|rules| rules.first())
            .map(|rule| byday_days(rule))
            .unwrap_or_default();
        if days.is_empty() {
            days.push(day);
        }
        (Recurrence::Weekly, days)
    } else {
        (Recurrence::Once, vec![day])
    };

    Some(ScheduleEvent {
        id: event.id.clone(),
        title: event.summary.clone().unwrap_or_default(),
        day,
        start_time: format_clock(&start),
        end_time: format_clock(&end),
        kind: EventType::Work,
        recurrence,
        days,
    })
}

fn local_time(date_time: &str, tz: Tz) -> Option<DateTime<Tz>> {
    DateTime::parse_from_rfc3339(date_time)
        .ok()
        .map(|dt| dt.with_timezone(&tz))
}

/// `9:05 AM` style, no leading zero
fn format_clock(dt: &DateTime<Tz>) -> String {
    dt.format("%-I:%M %p").to_string()
}

/// Weekdays named by the `BYDAY=` part of an RRULE line.
fn byday_days(rule: &str) -> Vec<Weekday> {
    let rule = rule.strip_prefix("RRULE:").unwrap_or(rule);
    rule.split(';')
        .find_map(|part| part.strip_prefix("BYDAY="))
        .map(|codes| codes.split(',').filter_map(Weekday::from_byday_code).collect())
        .unwrap_or_default()
}

/// `(timeMin, timeMax)` for a calendar import around `today`.
pub fn import_window(today: NaiveDate) -> (String, String) {
    let sunday = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
    let start = Utc.from_utc_datetime(&sunday.and_time(chrono::NaiveTime::MIN));
    let end = start + Duration::days(IMPORT_WINDOW_DAYS);
    (
        start.to_rfc3339_opts(SecondsFormat::Secs, true),
        end.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::EventTime;

    fn draft(days: Vec<Weekday>) -> CommitmentDraft {
        CommitmentDraft {
            title: "Lecture".to_string(),
            day: Weekday::Tuesday,
            start_time: "10:00 AM".to_string(),
            end_time: "11:30 AM".to_string(),
            kind: EventType::Class,
            recurrence: Recurrence::Weekly,
            days,
        }
    }

    fn timed(id: &str, start: &str, end: &str) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            summary: Some(format!("Event {}", id)),
            start: EventTime {
                date_time: Some(start.to_string()),
                ..Default::default()
            },
            end: EventTime {
                date_time: Some(end.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_add_commitment_files_a_copy_per_day() {
        let mut schedule = CommitmentSchedule::default();
        let event = add_commitment(
            &mut schedule,
            draft(vec![Weekday::Monday, Weekday::Thursday]),
        );

        assert_eq!(schedule.len(), 2);
        let monday = &schedule.day(Weekday::Monday)[0];
        let thursday = &schedule.day(Weekday::Thursday)[0];
        assert_eq!(monday.id, event.id);
        assert_eq!(thursday.id, event.id);
        assert_eq!(monday.day, Weekday::Monday);
        assert_eq!(thursday.day, Weekday::Thursday);
        assert!(schedule.day(Weekday::Tuesday).is_empty());
    }

    #[test]
    fn test_add_commitment_without_days_uses_day() {
        let mut schedule = CommitmentSchedule::default();
        add_commitment(&mut schedule, draft(Vec::new()));
        assert_eq!(schedule.day(Weekday::Tuesday).len(), 1);
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut schedule = CommitmentSchedule::default();
        let a = add_commitment(&mut schedule, draft(Vec::new()));
        let b = add_commitment(&mut schedule, draft(Vec::new()));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut schedule = CommitmentSchedule::default();
        let event = add_commitment(
            &mut schedule,
            draft(vec![Weekday::Monday, Weekday::Friday]),
        );

        assert!(remove_commitment(&mut schedule, Weekday::Monday, &event.id));
        assert!(!remove_commitment(&mut schedule, Weekday::Monday, &event.id));
        assert_eq!(schedule.day(Weekday::Friday).len(), 1);

        clear_commitments(&mut schedule);
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_import_recurring_and_single_events() {
        let mut schedule = CommitmentSchedule::default();
        let mut standup = timed(
            "standup",
            "2025-03-10T16:00:00Z",
            "2025-03-10T16:15:00Z",
        );
        standup.recurrence = Some(vec!["RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR".to_string()]);
        let dentist = timed("dentist", "2025-03-13T21:30:00Z", "2025-03-13T22:00:00Z");
        let all_day = CalendarEvent {
            id: "holiday".to_string(),
            start: EventTime {
                date: Some("2025-03-14".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let anonymous = timed("", "2025-03-11T16:00:00Z", "2025-03-11T17:00:00Z");

        let imported = import_calendar_events(
            &mut schedule,
            &[standup, dentist, all_day, anonymous],
            chrono_tz::America::Los_Angeles,
        );
        assert_eq!(imported, 2);

        let monday = &schedule.day(Weekday::Monday)[0];
        assert_eq!(monday.title, "Event standup");
        assert_eq!(monday.start_time, "9:00 AM");
        assert_eq!(monday.end_time, "9:15 AM");
        assert_eq!(monday.kind, EventType::Work);
        assert_eq!(monday.recurrence, Recurrence::Weekly);
        assert_eq!(
            monday.days,
            vec![Weekday::Monday, Weekday::Wednesday, Weekday::Friday]
        );
        assert_eq!(schedule.day(Weekday::Friday)[0].day, Weekday::Friday);

        let thursday = &schedule.day(Weekday::Thursday)[0];
        assert_eq!(thursday.recurrence, Recurrence::Once);
        assert_eq!(thursday.start_time, "2:30 PM");
        assert_eq!(schedule.len(), 4);
    }

    #[test]
    fn test_reimport_does_not_duplicate() {
        let mut schedule = CommitmentSchedule::default();
        let event = timed("gym", "2025-03-11T07:00:00Z", "2025-03-11T08:00:00Z");
        import_calendar_events(&mut schedule, &[event.clone()], chrono_tz::UTC);
        import_calendar_events(&mut schedule, &[event], chrono_tz::UTC);
        assert_eq!(schedule.day(Weekday::Tuesday).len(), 1);
    }

    #[test]
    fn test_recurring_event_without_byday_uses_start_day() {
        let mut schedule = CommitmentSchedule::default();
        let mut monthly = timed("book", "2025-03-12T18:00:00Z", "2025-03-12T19:00:00Z");
        monthly.recurrence = Some(vec!["RRULE:FREQ=MONTHLY;BYMONTHDAY=12".to_string()]);
        import_calendar_events(&mut schedule, &[monthly], chrono_tz::UTC);

        let wednesday = &schedule.day(Weekday::Wednesday)[0];
        assert_eq!(wednesday.recurrence, Recurrence::Weekly);
        assert_eq!(wednesday.days, vec![Weekday::Wednesday]);
    }

    #[test]
    fn test_import_window() {
        // Wednesday 2025-03-12 -> Sunday 2025-03-09 .. +38 days
        let (min, max) = import_window(NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());
        assert_eq!(min, "2025-03-09T00:00:00Z");
        assert_eq!(max, "2025-04-16T00:00:00Z");

        let (min, _) = import_window(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        assert_eq!(min, "2025-03-09T00:00:00Z");
    }

    #[test]
    fn test_byday_days() {
        assert_eq!(
            byday_days("RRULE:FREQ=WEEKLY;BYDAY=TU,TH;UNTIL=20250601T000000Z"),
            vec![Weekday::Tuesday, Weekday::Thursday]
        );
        assert!(byday_days("RRULE:FREQ=DAILY").is_empty());
    }
}
