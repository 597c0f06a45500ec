//! The planning session: all user state, loaded from and written back to a store.

use std::collections::BTreeMap;

use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::calendar::CalendarEvent;
use crate::commitments::{self, CommitmentDraft};
use crate::dashboard::DashboardView;
use crate::error::Result;
use crate::generator::{build_prompt, generate_plan, prompt_hash, PlanGenerator, PlanRequest};
use crate::schedule::ScheduleModel;
use crate::types::{
    CommitmentSchedule, GeneratedPlan, ScheduleEvent, ScheduleTask, Weekday, WeeklySchedule,
};

use super::{keys, KeyValueStore};

/// What [`Planner::generate`] did
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// Request unchanged since the stored plan was generated
    Unchanged,
    /// A new plan was generated and stored
    Applied(GeneratedPlan),
    /// Generation produced an error plan; stored state was left alone
    Failed(String),
}

/// One user's planning state.
///
/// Every mutating call writes the affected snapshot back to the store in full.
pub struct Planner<S: KeyValueStore> {
    store: S,
    goal: String,
    preferences: BTreeMap<String, String>,
    commitments: CommitmentSchedule,
    plan: Option<GeneratedPlan>,
    prompt_hash: Option<String>,
    model: ScheduleModel,
}

impl<S: KeyValueStore> Planner<S> {
    /// Load every key from `store`. Missing keys give defaults.
    pub fn load(store: S) -> Result<Self> {
        let goal: String = read_json_or_default(&store, keys::GOAL)?;
        let preferences = read_json_or_default(&store, keys::PREFERENCES)?;
        let commitments = read_json_or_default(&store, keys::COMMITMENTS)?;
        let plan: Option<GeneratedPlan> = read_json_or_default(&store, keys::GENERATED_PLAN)?;
        let prompt_hash = read_json_or_default(&store, keys::PROMPT_HASH)?;

        let model = ScheduleModel::from_schedule(
            plan.as_ref()
                .and_then(|p| p.weekly_schedule.clone())
                .unwrap_or_default(),
        );

        tracing::debug!(
            has_goal = !goal.is_empty(),
            has_plan = plan.is_some(),
            tasks = model.schedule().len(),
            "Loaded planner state"
        );

        Ok(Self {
            store,
            goal,
            preferences,
            commitments,
            plan,
            prompt_hash,
            model,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ============================================
    // Goal and preferences
    // ============================================

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn set_goal(&mut self, goal: impl Into<String>) -> Result<()> {
        self.goal = goal.into();
        write_json(&self.store, keys::GOAL, &self.goal)
    }

    pub fn preferences(&self) -> &BTreeMap<String, String> {
        &self.preferences
    }

    pub fn set_preference(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.preferences.insert(key.into(), value.into());
        write_json(&self.store, keys::PREFERENCES, &self.preferences)
    }

    pub fn remove_preference(&mut self, key: &str) -> Result<bool> {
        let removed = self.preferences.remove(key).is_some();
        if removed {
            write_json(&self.store, keys::PREFERENCES, &self.preferences)?;
        }
        Ok(removed)
    }

    // ============================================
    // Commitments
    // ============================================

    pub fn commitments(&self) -> &CommitmentSchedule {
        &self.commitments
    }

    pub fn add_commitment(&mut self, draft: CommitmentDraft) -> Result<ScheduleEvent> {
        let event = commitments::add_commitment(&mut self.commitments, draft);
        self.save_commitments()?;
        Ok(event)
    }

    pub fn remove_commitment(&mut self, day: Weekday, id: &str) -> Result<bool> {
        let removed = commitments::remove_commitment(&mut self.commitments, day, id);
        if removed {
            self.save_commitments()?;
        }
        Ok(removed)
    }

    pub fn clear_commitments(&mut self) -> Result<()> {
        commitments::clear_commitments(&mut self.commitments);
        self.save_commitments()
    }

    /// Merge listed calendar events into the commitments. Returns how many were imported.
    pub fn import_calendar_events(&mut self, events: &[CalendarEvent], tz: Tz) -> Result<usize> {
        let imported = commitments::import_calendar_events(&mut self.commitments, events, tz);
        self.save_commitments()?;
        Ok(imported)
    }

    fn save_commitments(&self) -> Result<()> {
        write_json(&self.store, keys::COMMITMENTS, &self.commitments)
    }

    // ============================================
    // Generation
    // ============================================

    pub fn plan_request(&self) -> PlanRequest {
        PlanRequest {
            goal: self.goal.clone(),
            preferences: self.preferences.clone(),
            commitments: self.commitments.clone(),
        }
    }

    pub fn plan(&self) -> Option<&GeneratedPlan> {
        self.plan.as_ref()
    }

    /// Generate a plan for the current request and apply it.
    ///
    /// Skips the model call when the prompt hash matches the stored plan, unless `force`.
    pub fn generate(
        &mut self,
        generator: &dyn PlanGenerator,
        force: bool,
    ) -> Result<GenerationOutcome> {
        let prompt = build_prompt(&self.plan_request());
        let hash = prompt_hash(&prompt);

        if !force && self.plan.is_some() && self.prompt_hash.as_deref() == Some(hash.as_str()) {
            tracing::info!(prompt_hash = %hash, "Request unchanged; keeping stored plan");
            return Ok(GenerationOutcome::Unchanged);
        }

        let plan = generate_plan(generator, &prompt);
        if let Some(error) = plan.error.clone() {
            return Ok(GenerationOutcome::Failed(error));
        }

        self.apply_generated_plan(plan.clone(), Some(hash))?;
        Ok(GenerationOutcome::Applied(plan))
    }

    /// Merge a successful plan into the model and persist it.
    ///
    /// Error plans change nothing and return false.
    pub fn apply_generated_plan(
        &mut self,
        plan: GeneratedPlan,
        prompt_hash: Option<String>,
    ) -> Result<bool> {
        if plan.is_error() {
            tracing::warn!(error = ?plan.error, "Not applying failed plan");
            return Ok(false);
        }

        self.model.merge_generated_plan(&plan);
        self.plan = Some(plan);
        self.save_plan()?;

        self.prompt_hash = prompt_hash;
        match &self.prompt_hash {
            Some(hash) => write_json(&self.store, keys::PROMPT_HASH, hash)?,
            None => {
                self.store.delete(keys::PROMPT_HASH)?;
            }
        }
        Ok(true)
    }

    // ============================================
    // Task editing
    // ============================================

    pub fn schedule(&self) -> &WeeklySchedule {
        self.model.schedule()
    }

    pub fn add_task(&mut self, day: Weekday, task: ScheduleTask) -> Result<&WeeklySchedule> {
        self.model.add_task(day, task);
        self.save_plan()?;
        Ok(self.model.schedule())
    }

    pub fn edit_task(
        &mut self,
        day: Weekday,
        index: usize,
        patch: ScheduleTask,
    ) -> Result<&WeeklySchedule> {
        self.model.edit_task(day, index, patch)?;
        self.save_plan()?;
        Ok(self.model.schedule())
    }

    pub fn delete_task(&mut self, day: Weekday, index: usize) -> Result<&WeeklySchedule> {
        self.model.delete_task(day, index)?;
        self.save_plan()?;
        Ok(self.model.schedule())
    }

    /// Write the plan back with the model as its weekly schedule.
    fn save_plan(&mut self) -> Result<()> {
        let plan = self.plan.get_or_insert_with(GeneratedPlan::default);
        plan.weekly_schedule = Some(self.model.schedule().clone());
        write_json(&self.store, keys::GENERATED_PLAN, plan)
    }

    // ============================================
    // Views
    // ============================================

    pub fn dashboard(&self, today: Weekday) -> DashboardView {
        let mut plan = self.plan.clone().unwrap_or_default();
        plan.weekly_schedule = Some(self.model.schedule().clone());
        DashboardView::build(&plan, today)
    }
}

fn read_json_or_default<S, T>(store: &S, key: &str) -> Result<T>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key)? else {
        return Ok(T::default());
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring corrupt stored value");
            Ok(T::default())
        }
    }
}

fn write_json<S, T>(store: &S, key: &str, value: &T) -> Result<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    store.put(key, &serde_json::to_string(value)?)
}
