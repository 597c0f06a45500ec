//! Persistence for the planning session
//!
//! Everything lives in a small key-value store, one JSON snapshot per key. Each write
//! replaces the previous snapshot in full; there is no history.
//!
//! | Key | Value |
//! |-----|-------|
//! | `userSchedule` | fixed commitments, `Week<ScheduleEvent>` |
//! | `generatedSchedule` | the current [`crate::types::GeneratedPlan`]; its `weekly_schedule` is the editable model |
//! | `userPreferences` | string map of preference answers |
//! | `userWish` | the goal text |
//! | `generatedPromptHash` | hash of the prompt that produced `generatedSchedule` |

mod planner;
pub mod schema;
mod sqlite;

use crate::error::Result;

pub use planner::{GenerationOutcome, Planner};
pub use sqlite::SqliteStore;

/// Store keys
pub mod keys {
    pub const COMMITMENTS: &str = "userSchedule";
    pub const GENERATED_PLAN: &str = "generatedSchedule";
    pub const PREFERENCES: &str = "userPreferences";
    pub const GOAL: &str = "userWish";
    pub const PROMPT_HASH: &str = "generatedPromptHash";
}

/// String key to string value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Returns whether the key existed.
    fn delete(&self, key: &str) -> Result<bool>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }
}
