//! Project the weekly model onto dated calendar events and insert them.
//!
//! Every weekday is mapped to its next occurrence strictly after today, so exporting on a
//! Wednesday puts Wednesday's tasks a week out and Thursday's tasks tomorrow. Insertion is
//! sequential and best-effort: a failed insert is counted and logged, and the run carries on.

use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::time::{parse_clock_time, RANGE_SEPARATOR};
use crate::types::{ScheduleTask, Weekday, WeeklySchedule};

use super::client::CalendarApi;
use super::{CalendarEventPayload, EventTime};

/// Summary shown when nothing in the schedule could be exported
pub const NOTHING_TO_EXPORT: &str = "No valid tasks found to export";

/// Running totals after each insertion attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportProgress {
    pub inserted: usize,
    pub failed: usize,
    pub total: usize,
    /// Title of the event just attempted
    pub current: Option<String>,
}

impl ExportProgress {
    pub fn attempted(&self) -> usize {
        self.inserted + self.failed
    }

    /// Rounded share of events attempted so far
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        (self.attempted() * 100 + self.total / 2) / self.total
    }

    /// One-line status, e.g. `Added 2 of 8 events (25%)`
    pub fn message(&self) -> String {
        format!(
            "Added {} of {} events ({}%)",
            self.attempted(),
            self.total,
            self.percent()
        )
    }
}

/// Outcome of an export run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub inserted: usize,
    pub failed: usize,
    pub total: usize,
    /// Tasks left out because their time did not parse
    pub skipped: usize,
    /// Ids of the events the service created
    pub event_ids: Vec<String>,
    pub message: String,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Receives export progress. The CLI draws a progress bar; tests record updates.
pub trait ProgressSink: Send {
    fn on_progress(&mut self, progress: &ExportProgress);

    fn on_finished(&mut self, report: &ExportReport);

    /// Called once the settle delay has passed after [`ProgressSink::on_finished`].
    fn on_cleared(&mut self) {}
}

/// A sink that discards everything.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _progress: &ExportProgress) {}

    fn on_finished(&mut self, _report: &ExportReport) {}
}

/// Today's date in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Next date strictly after `today` that falls on `day`.
pub fn target_date(day: Weekday, today: NaiveDate) -> NaiveDate {
    let today_native = today.weekday().num_days_from_sunday() as i64;
    let mut offset = day.native_index() - today_native;
    if offset <= 0 {
        offset += 7;
    }
    today + chrono::Duration::days(offset)
}

/// Build insert payloads for every exportable task.
///
/// Returns the payloads in Monday-first, stored order together with the number of
/// tasks that were skipped because their time range did not parse.
pub fn build_payloads(
    schedule: &WeeklySchedule,
    today: NaiveDate,
    time_zone: &str,
    rng: &mut fastrand::Rng,
) -> (Vec<CalendarEventPayload>, usize) {
    let mut payloads = Vec::new();
    let mut skipped = 0;

    for (day, tasks) in schedule.iter() {
        if tasks.is_empty() {
            continue;
        }
        let date = target_date(day, today);

        for (index, task) in tasks.iter().enumerate() {
            match payload_for(task, date, time_zone, rng) {
                Some(payload) => payloads.push(payload),
                None => {
                    tracing::warn!(day = %day, index, time = %task.time, "Skipping task with invalid time range");
                    skipped += 1;
                }
            }
        }
    }

    (payloads, skipped)
}

fn payload_for(
    task: &ScheduleTask,
    date: NaiveDate,
    time_zone: &str,
    rng: &mut fastrand::Rng,
) -> Option<CalendarEventPayload> {
    let parts: Vec<&str> = task.time.split(RANGE_SEPARATOR).collect();
    let [start, end] = parts.as_slice() else {
        return None;
    };
    let start = parse_clock_time(start).ok()?.to_iso_datetime(date);
    let end = parse_clock_time(end).ok()?.to_iso_datetime(date);

    Some(CalendarEventPayload {
        summary: task.task.clone(),
        description: format!("{}\n\nReason: {}", task.description, task.reason),
        start: EventTime::local(start, time_zone),
        end: EventTime::local(end, time_zone),
        color_id: rng.u8(1..=11).to_string(),
    })
}

/// Drives an export against a [`CalendarApi`].
pub struct CalendarExporter<'a> {
    api: &'a dyn CalendarApi,
    time_zone: Tz,
    settle_delay: Duration,
}

impl<'a> CalendarExporter<'a> {
    pub fn new(api: &'a dyn CalendarApi, time_zone: Tz) -> Self {
        Self {
            api,
            time_zone,
            settle_delay: Duration::from_millis(2000),
        }
    }

    /// How long the final summary stays up before progress is cleared
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Export `schedule` relative to today in the configured zone.
    pub async fn export(
        &self,
        schedule: &WeeklySchedule,
        sink: &mut dyn ProgressSink,
    ) -> ExportReport {
        self.export_from(schedule, today_in(self.time_zone), sink)
            .await
    }

    /// Export `schedule` treating `today` as the current date.
    ///
    /// Never fails: insert errors are counted in the report.
    pub async fn export_from(
        &self,
        schedule: &WeeklySchedule,
        today: NaiveDate,
        sink: &mut dyn ProgressSink,
    ) -> ExportReport {
        let mut rng = fastrand::Rng::new();
        let (payloads, skipped) = build_payloads(schedule, today, self.time_zone.name(), &mut rng);

        let mut progress = ExportProgress {
            total: payloads.len(),
            ..Default::default()
        };
        let mut event_ids = Vec::new();

        tracing::info!(total = progress.total, skipped, %today, "Starting calendar export");

        for payload in &payloads {
            match self.api.insert(payload).await {
                Ok(event) => {
                    progress.inserted += 1;
                    event_ids.push(event.id);
                }
                Err(e) => {
                    progress.failed += 1;
                    tracing::warn!(summary = %payload.summary, start = ?payload.start.date_time, error = %e, "Failed to insert event");
                }
            }
            progress.current = Some(payload.summary.clone());
            tracing::debug!(status = %progress.message(), "Export progress");
            sink.on_progress(&progress);
        }

        let message = summary_message(&progress);
        let report = ExportReport {
            inserted: progress.inserted,
            failed: progress.failed,
            total: progress.total,
            skipped,
            event_ids,
            message,
        };

        tracing::info!(
            inserted = report.inserted,
            failed = report.failed,
            total = report.total,
            "Calendar export finished"
        );
        sink.on_finished(&report);

        tokio::time::sleep(self.settle_delay).await;
        sink.on_cleared();

        report
    }
}

fn summary_message(progress: &ExportProgress) -> String {
    if progress.total == 0 {
        NOTHING_TO_EXPORT.to_string()
    } else if progress.failed == 0 {
        format!(
            "Successfully added {} events to your calendar",
            progress.inserted
        )
    } else {
        format!(
            "Added {} of {} events ({} failed)",
            progress.inserted, progress.total, progress.failed
        )
    }
}
