//! Read-only "today" view of a generated plan.

use crate::schedule::{DayBuckets, ScheduleModel, DEFAULT_UPCOMING};
use crate::types::{
    EnergyInsights, GeneratedPlan, LearningResource, ProgressMetrics, ScheduleTask, Weekday,
};

/// Everything the daily overview shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardView {
    pub day: Option<Weekday>,
    /// Today's tasks by time of day
    pub schedule: DayBuckets,
    /// Today's tasks in stored order
    pub tasks: Vec<ScheduleTask>,
    /// First few tasks of tomorrow
    pub upcoming: Vec<ScheduleTask>,
    pub challenge: Option<String>,
    pub motivation: Option<String>,
    pub quote: Option<String>,
    pub tip: Option<String>,
    pub weekly_goals: Vec<String>,
    pub monthly_goals: Vec<String>,
    pub learning_resources: Vec<LearningResource>,
    /// Empty strings when the plan had none
    pub energy_insights: EnergyInsights,
    pub progress_metrics: ProgressMetrics,
}

impl DashboardView {
    /// Project `plan` onto `today`. Missing plan fields leave the view empty.
    pub fn build(plan: &GeneratedPlan, today: Weekday) -> Self {
        let model = ScheduleModel::from_schedule(plan.weekly_schedule.clone().unwrap_or_default());
        let tips = plan.productivity_tips.as_deref().unwrap_or_default();

        Self {
            day: Some(today),
            schedule: model.bucket_day_by_time_of_day(today),
            tasks: model.tasks(today).to_vec(),
            upcoming: model.project_upcoming(today, DEFAULT_UPCOMING),
            challenge: plan.challenge_for(today).map(ToString::to_string),
            motivation: plan.summary.clone(),
            quote: tips.first().cloned(),
            tip: tips.get(1).cloned(),
            weekly_goals: plan.weekly_goals.clone().unwrap_or_default(),
            monthly_goals: plan.monthly_goals.clone().unwrap_or_default(),
            learning_resources: plan.learning_resources.clone().unwrap_or_default(),
            energy_insights: plan.energy_insights.clone().unwrap_or_default(),
            progress_metrics: plan.progress_metrics.clone().unwrap_or_default(),
        }
    }
}

/// Salutation for a 24-hour clock hour.
pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Good morning",
        12..=17 => "Good afternoon",
        _ => "Good evening",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_plan;

    const PLAN: &str = r#"{
        "summary": "Small steps every day",
        "weekly_schedule": {
            "Tuesday": [
                {"time": "07:00 AM - 07:30 AM", "task": "Journal", "description": "Morning pages", "reason": "Clear head"},
                {"time": "03:00 PM - 04:00 PM", "task": "Practice", "description": "Scales", "reason": "Warm"},
                {"time": "08:00 PM - 08:30 PM", "task": "Review", "description": "", "reason": ""}
            ],
            "Wednesday": [
                {"time": "06:00 AM - 06:30 AM", "task": "W1"},
                {"time": "07:00 AM - 07:30 AM", "task": "W2"},
                {"time": "08:00 AM - 08:30 AM", "task": "W3"},
                {"time": "09:00 AM - 09:30 AM", "task": "W4"}
            ]
        },
        "weekly_goals": ["Practice 5 days"],
        "productivity_tips": ["Start small", "Batch errands", "Rest"],
        "daily_challenges": {"Tuesday": "No phone before 9"},
        "learning_resources": [
            {"title": "The Practice of Practice", "url": "https://example.com/practice", "description": "Deliberate practice"}
        ],
        "energy_insights": {"peak_hours": "7-10 AM", "rest_periods": "After lunch", "optimizations": "Hard work first"},
        "progress_metrics": {"focus_areas": ["Technique"], "key_milestones": ["Play a full piece"]}
    }"#;

    #[test]
    fn test_build_from_full_plan() {
        let plan = extract_plan(PLAN);
        let view = DashboardView::build(&plan, Weekday::Tuesday);

        assert_eq!(view.tasks.len(), 3);
        assert_eq!(view.schedule.morning[0].task.task, "Journal");
        assert_eq!(view.schedule.afternoon[0].id, 1);
        assert_eq!(view.schedule.evening[0].task.task, "Review");
        let upcoming: Vec<_> = view.upcoming.iter().map(|t| t.task.as_str()).collect();
        assert_eq!(upcoming, vec!["W1", "W2", "W3"]);
        assert_eq!(view.challenge.as_deref(), Some("No phone before 9"));
        assert_eq!(view.motivation.as_deref(), Some("Small steps every day"));
        assert_eq!(view.quote.as_deref(), Some("Start small"));
        assert_eq!(view.tip.as_deref(), Some("Batch errands"));
        assert_eq!(view.weekly_goals, vec!["Practice 5 days".to_string()]);
        assert!(view.monthly_goals.is_empty());

        assert_eq!(view.learning_resources.len(), 1);
        assert_eq!(view.learning_resources[0].title, "The Practice of Practice");
        assert_eq!(view.energy_insights.peak_hours, "7-10 AM");
        assert_eq!(view.energy_insights.optimizations, "Hard work first");
        assert_eq!(view.progress_metrics.focus_areas, vec!["Technique".to_string()]);
        assert!(view.progress_metrics.success_indicators.is_empty());
    }

    #[test]
    fn test_build_from_error_plan_is_empty() {
        let plan = GeneratedPlan::failure("nope");
        let view = DashboardView::build(&plan, Weekday::Sunday);
        assert!(view.tasks.is_empty());
        assert!(view.upcoming.is_empty());
        assert!(view.challenge.is_none());
        assert!(view.quote.is_none());
        assert!(view.tip.is_none());
        assert!(view.learning_resources.is_empty());
        assert_eq!(view.energy_insights, EnergyInsights::default());
        assert_eq!(view.progress_metrics, ProgressMetrics::default());
    }

    #[test]
    fn test_greeting() {
        assert_eq!(greeting(6), "Good morning");
        assert_eq!(greeting(12), "Good afternoon");
        assert_eq!(greeting(17), "Good afternoon");
        assert_eq!(greeting(18), "Good evening");
    }
}
