//! The editable weekly model.
//!
//! [`ScheduleModel`] owns one [`WeeklySchedule`] and is the only place that mutates it.
//! Failed operations leave the schedule untouched.

use crate::error::{Error, Result};
use crate::time::{parse_clock_time, DayBucket};
use crate::types::{GeneratedPlan, ScheduleTask, Weekday, WeeklySchedule};

/// Default number of tasks shown by [`ScheduleModel::project_upcoming`]
pub const DEFAULT_UPCOMING: usize = 3;

/// A task tagged with its position in the day's list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketedTask {
    /// Index into the day's stored order; stable until the next mutation
    pub id: usize,
    pub task: ScheduleTask,
}

/// One day's tasks grouped by time of day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayBuckets {
    pub morning: Vec<BucketedTask>,
    pub afternoon: Vec<BucketedTask>,
    pub evening: Vec<BucketedTask>,
    /// Indices of tasks whose start time could not be parsed
    pub skipped: Vec<usize>,
}

impl DayBuckets {
    pub fn bucket(&self, bucket: DayBucket) -> &[BucketedTask] {
        match bucket {
            DayBucket::Morning => &self.morning,
            DayBucket::Afternoon => &self.afternoon,
            DayBucket::Evening => &self.evening,
        }
    }

    fn bucket_mut(&mut self, bucket: DayBucket) -> &mut Vec<BucketedTask> {
        match bucket {
            DayBucket::Morning => &mut self.morning,
            DayBucket::Afternoon => &mut self.afternoon,
            DayBucket::Evening => &mut self.evening,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleModel {
    schedule: WeeklySchedule,
}

impl ScheduleModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_schedule(schedule: WeeklySchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &WeeklySchedule {
        &self.schedule
    }

    pub fn into_schedule(self) -> WeeklySchedule {
        self.schedule
    }

    pub fn tasks(&self, day: Weekday) -> &[ScheduleTask] {
        self.schedule.day(day)
    }

    /// Append `task` to `day`, then re-sort that day by start time.
    ///
    /// Ordering compares the start tokens as plain strings, so `"01:00 PM"` sorts before
    /// `"09:00 AM"`. Stored plans were ordered this way and the display keeps it.
    pub fn add_task(&mut self, day: Weekday, task: ScheduleTask) -> &WeeklySchedule {
        let tasks = self.schedule.day_mut(day);
        tasks.push(task);
        tasks.sort_by(|a, b| a.start_token().cmp(b.start_token()));

        tracing::debug!(day = %day, count = tasks.len(), "Added task");
        &self.schedule
    }

    /// Replace the task at `index` on `day`.
    pub fn edit_task(
        &mut self,
        day: Weekday,
        index: usize,
        patch: ScheduleTask,
    ) -> Result<&WeeklySchedule> {
        let tasks = self.schedule.day_mut(day);
        let len = tasks.len();
        let slot = tasks
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { day, index, len })?;
        *slot = patch;

        tracing::debug!(day = %day, index, "Edited task");
        Ok(&self.schedule)
    }

    /// Remove the task at `index` on `day`.
    pub fn delete_task(&mut self, day: Weekday, index: usize) -> Result<&WeeklySchedule> {
        let tasks = self.schedule.day_mut(day);
        let len = tasks.len();
        if index >= len {
            return Err(Error::IndexOutOfRange { day, index, len });
        }
        tasks.remove(index);

        tracing::debug!(day = %day, index, "Deleted task");
        Ok(&self.schedule)
    }

    /// Replace the whole schedule with a successful plan's weekly schedule.
    ///
    /// Plans carrying an error are ignored, as are plans with no weekly schedule.
    pub fn merge_generated_plan(&mut self, plan: &GeneratedPlan) -> &WeeklySchedule {
        if let Some(error) = &plan.error {
            tracing::info!(error = %error, "Not merging failed plan");
            return &self.schedule;
        }

        match &plan.weekly_schedule {
            Some(week) => {
                self.schedule = week.clone();
                tracing::info!(tasks = self.schedule.len(), "Merged generated plan");
            }
            None => tracing::warn!("Generated plan has no weekly schedule; keeping current one"),
        }
        &self.schedule
    }

    /// Group `day`'s tasks into morning, afternoon and evening by start time.
    pub fn bucket_day_by_time_of_day(&self, day: Weekday) -> DayBuckets {
        let mut buckets = DayBuckets::default();

        for (id, task) in self.schedule.day(day).iter().enumerate() {
            match parse_clock_time(task.start_token()) {
                Ok(start) => buckets.bucket_mut(start.bucket()).push(BucketedTask {
                    id,
                    task: task.clone(),
                }),
                Err(e) => {
                    tracing::warn!(day = %day, index = id, time = %task.time, error = %e, "Skipping task with unparseable time");
                    buckets.skipped.push(id);
                }
            }
        }

        buckets
    }

    /// Up to `count` tasks of the day after `from_day`, in stored order.
    pub fn project_upcoming(&self, from_day: Weekday, count: usize) -> Vec<ScheduleTask> {
        self.schedule
            .day(from_day.next())
            .iter()
            .take(count)
            .cloned()
            .collect()
    }
}
