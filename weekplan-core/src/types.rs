//! Core domain types for weekplan
//!
//! These types describe the weekly model that every other module reads or writes.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Week** | A 7-day container keyed by weekday, Monday first; every day is always present |
//! | **Task** | One time-boxed entry of a generated plan (`"09:00 AM - 10:00 AM"`, title, description, reason) |
//! | **Plan** | The structured result we expect (but do not trust) from the generation model |
//! | **Commitment** | A user-declared recurring block (work, class, ...) the plan must respect |
//! | **Bucket** | Coarse time-of-day grouping (morning / afternoon / evening) used by the dashboard |

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

// ============================================
// Weekday
// ============================================

/// One of the seven canonical English weekday names, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays in display order.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Monday-based index (Monday = 0 .. Sunday = 6)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`Weekday::index`], wrapping past Sunday.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 7]
    }

    /// The following day; Sunday wraps to Monday.
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Sunday-based numbering used by most calendar hosts (Sunday = 0 .. Saturday = 6)
    pub fn native_index(self) -> i64 {
        match self.index() {
            6 => 0,
            i => i as i64 + 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Map an RFC 5545 `BYDAY` code (`MO`, `TU`, ...) to a weekday.
    pub fn from_byday_code(code: &str) -> Option<Self> {
        // Codes may carry an ordinal prefix such as `1MO` or `-1FR`.
        let code = code.trim().trim_start_matches(|c: char| c == '-' || c == '+' || c.is_ascii_digit());
        match code.to_ascii_uppercase().as_str() {
            "MO" => Some(Weekday::Monday),
            "TU" => Some(Weekday::Tuesday),
            "WE" => Some(Weekday::Wednesday),
            "TH" => Some(Weekday::Thursday),
            "FR" => Some(Weekday::Friday),
            "SA" => Some(Weekday::Saturday),
            "SU" => Some(Weekday::Sunday),
            _ => None,
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Self::from_index(day.num_days_from_monday() as usize)
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown weekday: {}", s))
    }
}

// ============================================
// Week container
// ============================================

/// Seven-day container keyed by weekday.
///
/// Every day is always present. On the wire this is a JSON object whose keys are the
/// weekday names in Monday-first order. Decoding is forgiving: day keys match in any
/// case, missing or `null` days decode as empty, and entries that fail to decode are
/// dropped one at a time rather than failing the whole week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Week<T> {
    #[serde(rename = "Monday")]
    monday: Vec<T>,
    #[serde(rename = "Tuesday")]
    tuesday: Vec<T>,
    #[serde(rename = "Wednesday")]
    wednesday: Vec<T>,
    #[serde(rename = "Thursday")]
    thursday: Vec<T>,
    #[serde(rename = "Friday")]
    friday: Vec<T>,
    #[serde(rename = "Saturday")]
    saturday: Vec<T>,
    #[serde(rename = "Sunday")]
    sunday: Vec<T>,
}

impl<T> Default for Week<T> {
    fn default() -> Self {
        Self {
            monday: Vec::new(),
            tuesday: Vec::new(),
            wednesday: Vec::new(),
            thursday: Vec::new(),
            friday: Vec::new(),
            saturday: Vec::new(),
            sunday: Vec::new(),
        }
    }
}

impl<T> Week<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day(&self, day: Weekday) -> &Vec<T> {
        match day {
            Weekday::Monday => &self.monday,
            Weekday::Tuesday => &self.tuesday,
            Weekday::Wednesday => &self.wednesday,
            Weekday::Thursday => &self.thursday,
            Weekday::Friday => &self.friday,
            Weekday::Saturday => &self.saturday,
            Weekday::Sunday => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, day: Weekday) -> &mut Vec<T> {
        match day {
            Weekday::Monday => &mut self.monday,
            Weekday::Tuesday => &mut self.tuesday,
            Weekday::Wednesday => &mut self.wednesday,
            Weekday::Thursday => &mut self.thursday,
            Weekday::Friday => &mut self.friday,
            Weekday::Saturday => &mut self.saturday,
            Weekday::Sunday => &mut self.sunday,
        }
    }

    /// Iterate days in Monday-first order.
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &Vec<T>)> {
        Weekday::ALL.into_iter().map(move |day| (day, self.day(day)))
    }

    /// Total number of entries across all days
    pub fn len(&self) -> usize {
        self.iter().map(|(_, items)| items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'de, T> Deserialize<'de> for Week<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut week = Week::new();

        for (key, value) in raw {
            let day = match key.parse::<Weekday>() {
                Ok(day) => day,
                Err(_) => {
                    tracing::warn!(key = %key, "Ignoring unknown weekday key");
                    continue;
                }
            };

            let entries = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::Array(entries) => entries,
                other => {
                    tracing::warn!(day = %day, value = %other, "Ignoring non-list day entry");
                    continue;
                }
            };

            let items = week.day_mut(day);
            for (index, entry) in entries.into_iter().enumerate() {
                match serde_json::from_value::<T>(entry) {
                    Ok(item) => items.push(item),
                    Err(e) => {
                        tracing::warn!(day = %day, index, error = %e, "Dropping malformed entry");
                    }
                }
            }
        }

        Ok(week)
    }
}

// ============================================
// Schedule tasks
// ============================================

/// One entry of a generated plan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleTask {
    /// `"<start> - <end>"`, expected as `hh:mm AM/PM` on both sides
    #[serde(default, deserialize_with = "text_or_empty")]
    pub time: String,
    /// Short title
    #[serde(default, deserialize_with = "text_or_empty")]
    pub task: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub description: String,
    /// Why the task sits at this time
    #[serde(default, deserialize_with = "text_or_empty")]
    pub reason: String,
}

/// `null` reads as empty and scalars keep their text, so a task with an odd field is
/// still stored (and later reported as unparseable) instead of being lost.
fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text,
        serde_json::Value::Number(number) => number.to_string(),
        serde_json::Value::Bool(flag) => flag.to_string(),
        other => {
            tracing::warn!(value = %other, "Ignoring non-text task field");
            String::new()
        }
    })
}

impl ScheduleTask {
    /// Text before the first `" - "` of `time`.
    pub fn start_token(&self) -> &str {
        self.time.split(crate::time::RANGE_SEPARATOR).next().unwrap_or_default()
    }
}

/// The canonical editable weekly model.
pub type WeeklySchedule = Week<ScheduleTask>;

// ============================================
// Generated plan
// ============================================

/// A learning resource suggested by the plan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LearningResource {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnergyInsights {
    #[serde(default)]
    pub peak_hours: String,
    #[serde(default)]
    pub rest_periods: String,
    #[serde(default)]
    pub optimizations: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressMetrics {
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub key_milestones: Vec<String>,
    #[serde(default)]
    pub success_indicators: Vec<String>,
}

/// Structured result of a plan generation.
///
/// Every field may be absent. A model can omit a field or emit it with the wrong
/// shape; either way the field decodes as `None` and the rest of the plan survives.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratedPlan {
    #[serde(default, deserialize_with = "lenient")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub summary: Option<String>,
    /// Single-day schedule emitted by older prompts
    #[serde(default, deserialize_with = "lenient")]
    pub daily_schedule: Option<Vec<ScheduleTask>>,
    #[serde(default, deserialize_with = "lenient")]
    pub weekly_schedule: Option<WeeklySchedule>,
    #[serde(default, deserialize_with = "lenient")]
    pub weekly_goals: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub monthly_goals: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub productivity_tips: Option<Vec<String>>,
    /// Keyed by weekday name as the model wrote it
    #[serde(default, deserialize_with = "lenient")]
    pub daily_challenges: Option<BTreeMap<String, String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub learning_resources: Option<Vec<LearningResource>>,
    #[serde(default, deserialize_with = "lenient")]
    pub energy_insights: Option<EnergyInsights>,
    #[serde(default, deserialize_with = "lenient")]
    pub progress_metrics: Option<ProgressMetrics>,
}

impl GeneratedPlan {
    /// A plan carrying only an error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Challenge for `day`, matching the weekday key case-insensitively.
    pub fn challenge_for(&self, day: Weekday) -> Option<&str> {
        self.daily_challenges
            .as_ref()?
            .iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(day.as_str()))
            .map(|(_, challenge)| challenge.as_str())
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(value) => value,
    };

    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed plan field");
            Ok(None)
        }
    }
}

// ============================================
// Fixed commitments
// ============================================

/// Kind of fixed commitment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Work,
    Class,
    Personal,
    Other,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Work => "work",
            EventType::Class => "class",
            EventType::Personal => "personal",
            EventType::Other => "other",
        }
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(EventType::Work),
            "class" => Ok(EventType::Class),
            "personal" => Ok(EventType::Personal),
            "other" => Ok(EventType::Other),
            _ => Err(format!("unknown event type: {}", s)),
        }
    }
}

/// How often a commitment repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Weekly,
    Biweekly,
    Monthly,
    Once,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Weekly => "weekly",
            Recurrence::Biweekly => "biweekly",
            Recurrence::Monthly => "monthly",
            Recurrence::Once => "once",
        }
    }
}

impl std::str::FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Recurrence::Weekly),
            "biweekly" => Ok(Recurrence::Biweekly),
            "monthly" => Ok(Recurrence::Monthly),
            "once" => Ok(Recurrence::Once),
            _ => Err(format!("unknown recurrence: {}", s)),
        }
    }
}

/// A user-declared time block that generated plans must work around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    /// Unique identifier
    pub id: String,
    pub title: String,
    /// Day this copy is filed under
    pub day: Weekday,
    /// e.g. `"9:00 AM"`
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub recurrence: Recurrence,
    /// Every weekday the commitment repeats on
    #[serde(default)]
    pub days: Vec<Weekday>,
}

/// Fixed commitments filed per day, one copy per applicable day.
pub type CommitmentSchedule = Week<ScheduleEvent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_numbering() {
        assert_eq!(Weekday::Monday.index(), 0);
        assert_eq!(Weekday::Sunday.index(), 6);
        assert_eq!(Weekday::Monday.native_index(), 1);
        assert_eq!(Weekday::Saturday.native_index(), 6);
        assert_eq!(Weekday::Sunday.native_index(), 0);
        assert_eq!(Weekday::Sunday.next(), Weekday::Monday);
        assert_eq!(Weekday::from(chrono::Weekday::Wed), Weekday::Wednesday);
    }

    #[test]
    fn test_weekday_parsing() {
        assert_eq!("monday".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert_eq!(" Friday ".parse::<Weekday>().unwrap(), Weekday::Friday);
        assert!("Funday".parse::<Weekday>().is_err());
        assert_eq!(Weekday::from_byday_code("TH"), Some(Weekday::Thursday));
        assert_eq!(Weekday::from_byday_code("-1FR"), Some(Weekday::Friday));
        assert_eq!(Weekday::from_byday_code("XX"), None);
    }

    #[test]
    fn test_week_serializes_all_days_in_order() {
        let week: WeeklySchedule = Week::new();
        let json = serde_json::to_string(&week).unwrap();
        assert_eq!(
            json,
            r#"{"Monday":[],"Tuesday":[],"Wednesday":[],"Thursday":[],"Friday":[],"Saturday":[],"Sunday":[]}"#
        );
    }

    #[test]
    fn test_week_missing_and_null_days_decode_empty() {
        let json = r#"{"Monday":[{"time":"09:00 AM - 10:00 AM","task":"Study"}],"Tuesday":null}"#;
        let week: WeeklySchedule = serde_json::from_str(json).unwrap();
        assert_eq!(week.day(Weekday::Monday).len(), 1);
        assert_eq!(week.day(Weekday::Monday)[0].description, "");
        assert!(week.day(Weekday::Tuesday).is_empty());
        assert!(week.day(Weekday::Sunday).is_empty());
        assert_eq!(week.len(), 1);
    }

    #[test]
    fn test_week_day_keys_match_any_case() {
        let json = r#"{"monday":[{"time":"09:00 AM - 10:00 AM","task":"Study"}],"SUNDAY":[{"task":"Rest"}],"Someday":[{"task":"Lost"}]}"#;
        let week: WeeklySchedule = serde_json::from_str(json).unwrap();
        assert_eq!(week.day(Weekday::Monday)[0].task, "Study");
        assert_eq!(week.day(Weekday::Sunday)[0].task, "Rest");
        assert_eq!(week.len(), 2);
    }

    #[test]
    fn test_week_keeps_tasks_with_odd_fields() {
        let json = r#"{
            "Tuesday":[
                {"time":"09:00 AM - 10:00 AM","task":"Draft","description":null},
                {"time":900,"task":"Edit","reason":["not","text"]},
                "not a task"
            ],
            "Friday":"not a list"
        }"#;
        let week: WeeklySchedule = serde_json::from_str(json).unwrap();
        let tuesday = week.day(Weekday::Tuesday);
        assert_eq!(tuesday.len(), 2);
        assert_eq!(tuesday[0].description, "");
        assert_eq!(tuesday[1].time, "900");
        assert_eq!(tuesday[1].reason, "");
        assert!(week.day(Weekday::Friday).is_empty());
    }

    #[test]
    fn test_plan_ignores_malformed_fields() {
        let json = r#"{"summary":"ok","weekly_goals":"not a list","productivity_tips":["a","b"]}"#;
        let plan: GeneratedPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.summary.as_deref(), Some("ok"));
        assert!(plan.weekly_goals.is_none());
        assert_eq!(plan.productivity_tips.unwrap().len(), 2);
    }

    #[test]
    fn test_challenge_lookup_is_case_insensitive() {
        let json = r#"{"summary":"ok","daily_challenges":{"monday":"Walk 5k","Tuesday":"Read"}}"#;
        let plan: GeneratedPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.challenge_for(Weekday::Monday), Some("Walk 5k"));
        assert_eq!(plan.challenge_for(Weekday::Tuesday), Some("Read"));
        assert_eq!(plan.challenge_for(Weekday::Sunday), None);
    }

    #[test]
    fn test_schedule_event_wire_format() {
        let event = ScheduleEvent {
            id: "abc1234".to_string(),
            title: "Standup".to_string(),
            day: Weekday::Monday,
            start_time: "9:00 AM".to_string(),
            end_time: "9:15 AM".to_string(),
            kind: EventType::Work,
            recurrence: Recurrence::Weekly,
            days: vec![Weekday::Monday, Weekday::Wednesday],
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["startTime"], "9:00 AM");
        assert_eq!(value["type"], "work");
        assert_eq!(value["days"][1], "Wednesday");

        let back: ScheduleEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }
}
