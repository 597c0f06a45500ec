//! Recover a [`GeneratedPlan`] from free-form model output.
//!
//! Models wrap JSON in markdown fences, prefix it with chatter, or trail off after the
//! closing brace. Extraction is forgiving about all of that but never raises: anything it
//! cannot make sense of becomes a plan whose `error` explains why.

use serde_json::Value;

use crate::types::{GeneratedPlan, Week};

/// Prefix of the `error` message on plans that could not be decoded
pub const PARSE_FAILURE_PREFIX: &str =
    "Failed to generate a valid schedule. The AI response could not be parsed correctly. Technical details: ";

const FENCE_OPEN: &str = "```json";
const FENCE: &str = "```";

/// Extract a plan from raw model text.
pub fn extract_plan(raw: &str) -> GeneratedPlan {
    let cleaned = strip_fences(raw);
    let candidate = json_candidate(&cleaned);

    tracing::debug!(
        raw_len = raw.len(),
        candidate_len = candidate.len(),
        "Extracting plan from model output"
    );

    match decode(candidate) {
        Ok(plan) => plan,
        Err(details) => {
            tracing::warn!(error = %details, "Model output did not contain a usable plan");
            GeneratedPlan::failure(format!("{}{}", PARSE_FAILURE_PREFIX, details))
        }
    }
}

/// Trim, drop every ```` ```json ```` opener with the whitespace after it, and drop one
/// trailing ```` ``` ````.
fn strip_fences(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw.trim();

    while let Some(pos) = rest.find(FENCE_OPEN) {
        out.push_str(&rest[..pos]);
        rest = rest[pos + FENCE_OPEN.len()..].trim_start();
    }
    out.push_str(rest);

    let trimmed = out.trim_end();
    match trimmed.strip_suffix(FENCE) {
        Some(body) => body.to_string(),
        None => out,
    }
}

/// First `{` through last `}`, or the whole input when there is no such span.
fn json_candidate(cleaned: &str) -> &str {
    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => cleaned,
    }
}

fn decode(candidate: &str) -> Result<GeneratedPlan, String> {
    let value: Value = serde_json::from_str(candidate).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err("expected a JSON object".to_string());
    }

    let mut plan: GeneratedPlan = serde_json::from_value(value).map_err(|e| e.to_string())?;

    if !present(&plan.summary) && !present(&plan.error) {
        return Err("Missing required fields in the generated schedule".to_string());
    }

    if plan.weekly_schedule.is_none() {
        if let Some(daily) = plan.daily_schedule.clone() {
            let mut week = Week::new();
            *week.day_mut(crate::types::Weekday::Monday) = daily;
            plan.weekly_schedule = Some(week);
        }
    }

    Ok(plan)
}

// Empty strings count as absent.
fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.is_empty())
}
