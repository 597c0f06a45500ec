//! # weekplan-core
//!
//! Core library for weekplan - turns a goal into a weekly plan and keeps it in sync with
//! a calendar.
//!
//! This library provides:
//! - Time-string parsing for `hh:mm AM/PM` ranges
//! - Extraction of structured plans from model output
//! - The editable weekly schedule model and its dashboard projection
//! - Fixed-commitment editing and calendar import
//! - Calendar export with per-event failure isolation
//! - A SQLite key-value store and the planner session on top of it
//! - Configuration management and logging infrastructure
//!
//! ## Data flow
//!
//! goal + preferences + commitments → prompt → model → [`extract`] → [`schedule`] →
//! [`calendar::exporter`] → calendar service
//!
//! ## Example
//!
//! ```rust,no_run
//! use weekplan_core::{Config, Planner, SqliteStore, Weekday};
//!
//! let store = SqliteStore::open(&Config::store_path()).expect("failed to open store");
//! let planner = Planner::load(store).expect("failed to load planner");
//!
//! let today = planner.dashboard(Weekday::Monday);
//! println!("{} task(s) today", today.tasks.len());
//! ```

// Re-export commonly used items at the crate root
pub use calendar::{CalendarApi, CalendarExporter, GoogleCalendarClient};
pub use config::Config;
pub use error::{Error, Result};
pub use extract::extract_plan;
pub use schedule::ScheduleModel;
pub use store::{KeyValueStore, Planner, SqliteStore};
pub use types::*;

// Public modules
pub mod calendar;
pub mod commitments;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod extract;
pub mod generator;
pub mod logging;
pub mod schedule;
pub mod store;
pub mod time;
pub mod types;
