//! Plan generation: prompt construction and the model collaborator.
//!
//! The model is opaque to us: a prompt goes in, text comes out, and [`crate::extract`]
//! decides whether the text holds a plan. [`generate_plan`] never fails; transport and
//! provider errors come back as an error plan.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{Error, Result};
use crate::extract::extract_plan;
use crate::types::{CommitmentSchedule, GeneratedPlan};

/// Prefix of the `error` message when the model could not be reached
pub const GENERATION_FAILURE_PREFIX: &str = "An error occurred while generating your schedule: ";

const NOT_SPECIFIED: &str = "Not specified";
const SYSTEM_PROMPT: &str = "You are a planning assistant that turns personal goals into realistic weekly schedules. Reply with one valid JSON object and nothing else.";

const OUTPUT_SHAPE: &str = r#"{
  "error": null,
  "summary": "How this schedule moves the user toward the goal",
  "daily_schedule": [
    {"time": "08:00 AM - 09:00 AM", "task": "Task name", "description": "What the task involves", "reason": "Why it sits at this time"}
  ],
  "weekly_schedule": {
    "Monday": [
      {"time": "08:00 AM - 09:00 AM", "task": "Task name", "description": "What the task involves", "reason": "Why it sits at this time"}
    ],
    "Tuesday": [], "Wednesday": [], "Thursday": [], "Friday": [], "Saturday": [], "Sunday": []
  },
  "weekly_goals": ["Goal 1", "Goal 2", "Goal 3"],
  "monthly_goals": ["Longer goal 1", "Longer goal 2", "Longer goal 3"],
  "productivity_tips": ["Tip 1", "Tip 2", "Tip 3"],
  "daily_challenges": {"Monday": "Challenge", "Tuesday": "Challenge", "Wednesday": "Challenge", "Thursday": "Challenge", "Friday": "Challenge", "Saturday": "Challenge", "Sunday": "Challenge"},
  "learning_resources": [{"title": "Resource", "url": "https://example.com/resource", "description": "Why it helps"}],
  "energy_insights": {"peak_hours": "When focus is highest", "rest_periods": "Recommended breaks", "optimizations": "Energy suggestions"},
  "progress_metrics": {"focus_areas": ["Area"], "key_milestones": ["Milestone"], "success_indicators": ["Indicator"]}
}"#;

/// Everything a prompt is built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanRequest {
    pub goal: String,
    /// Keys such as `chronotype`, `energy_waves`, `wellness`, `break_type`
    pub preferences: BTreeMap<String, String>,
    pub commitments: CommitmentSchedule,
}

/// Text completion interface for plan generation.
pub trait PlanGenerator: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Create the default HTTP-backed generator.
pub fn create_generator(llm: &LlmConfig) -> Result<Box<dyn PlanGenerator>> {
    Ok(Box::new(HttpPlanGenerator::new(llm)?))
}

/// Run `prompt` through `generator` and extract a plan from the reply.
pub fn generate_plan(generator: &dyn PlanGenerator, prompt: &str) -> GeneratedPlan {
    match generator.complete(prompt) {
        Ok(raw) => {
            tracing::debug!(response_len = raw.len(), "Received model response");
            extract_plan(&raw)
        }
        Err(e) => {
            tracing::error!(error = %e, "Plan generation failed");
            GeneratedPlan::failure(format!("{}{}", GENERATION_FAILURE_PREFIX, e))
        }
    }
}

/// SHA-256 of the prompt, hex encoded.
pub fn prompt_hash(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hex::encode(hasher.finalize())
}

fn preference<'a>(request: &'a PlanRequest, key: &str) -> Option<&'a str> {
    request
        .preferences
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn describe(
    request: &PlanRequest,
    key: &str,
    known: &[(&str, &'static str)],
) -> String {
    match preference(request, key) {
        Some(value) => known
            .iter()
            .find(|(raw, _)| *raw == value)
            .map(|(_, phrase)| phrase.to_string())
            .unwrap_or_else(|| value.to_string()),
        None => NOT_SPECIFIED.to_string(),
    }
}

/// Build the generation prompt for `request`.
pub fn build_prompt(request: &PlanRequest) -> String {
    let productivity_style = describe(
        request,
        "chronotype",
        &[("early_bird", "Morning person"), ("night_owl", "Night owl")],
    );
    let focus_times = describe(
        request,
        "energy_waves",
        &[
            ("morning_peak", "Morning"),
            ("afternoon_peak", "Afternoon"),
            ("night_peak", "Evening"),
        ],
    );
    let wellness = describe(
        request,
        "wellness",
        &[
            ("exercise", "Daily exercise"),
            ("meditation", "Daily meditation"),
            ("both", "Both exercise and meditation"),
        ],
    );
    let breaks = describe(request, "break_type", &[]);
    let focus_style = describe(request, "focus_style", &[]);
    let sleep = describe(request, "sleep", &[]);

    let commitments =
        serde_json::to_string(&request.commitments).unwrap_or_else(|_| "{}".to_string());
    let goal = match request.goal.trim() {
        "" => NOT_SPECIFIED,
        goal => goal,
    };

    format!(
        "{SYSTEM_PROMPT}

Instructions:
1. Break the user's goal into concrete, actionable tasks.
2. Respect the user's preferences (morning person or night owl, focus hours, breaks).
3. Never overlap existing commitments; place tasks around them.
4. Balance daily, weekly and monthly goals so the plan is sustainable.
5. Use proven techniques where they fit: Pomodoro, deep work blocks, habit stacking, the Eisenhower matrix, time blocking.
6. If the goal is inappropriate or offensive, set \"error\" to a short explanation and \"summary\" to null.

User goal: {goal}
Preferences:
- Productivity style: {productivity_style}
- Best focus times: {focus_times}
- Preferred break intervals: {breaks}
- Exercise/Meditation: {wellness}
- Focus style: {focus_style}
- Sleep schedule: {sleep}
Existing commitments (by day): {commitments}

Write every \"time\" as \"hh:mm AM - hh:mm PM\". Respond with JSON in exactly this shape:
{OUTPUT_SHAPE}

Output only the JSON object, with no markdown fences or commentary. Include daily_schedule for older clients, but put the real plan in weekly_schedule."
    )
}

/// [`PlanGenerator`] backed by an Ollama, Claude or OpenAI endpoint.
///
/// Owns a current-thread runtime so callers can stay synchronous.
pub struct HttpPlanGenerator {
    model: String,
    provider: LlmProvider,
    endpoint: String,
    api_key: Option<String>,
    max_tokens: u32,
    temperature: f32,
    runtime: tokio::runtime::Runtime,
    http: reqwest::Client,
}

impl HttpPlanGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| config.provider.default_endpoint().to_string());
        let api_key = match config.provider.api_key_env() {
            None => None,
            Some(env) => config.api_key.clone().or_else(|| std::env::var(env).ok()),
        };

        if config.provider.api_key_env().is_some() && api_key.is_none() {
            return Err(Error::Config(
                "llm.api_key (or provider env var) is required".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Llm(format!("failed to build tokio runtime: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::Llm(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            model: config.model.clone(),
            provider: config.provider,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            runtime,
            http,
        })
    }

    async fn post(
        &self,
        name: &str,
        url: String,
        headers: HeaderMap,
        body: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("{name} request failed: {e}")))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::Llm(format!("{name} read body failed: {e}")))?;
        if !status.is_success() {
            return Err(Error::Llm(format!(
                "{name} returned {}: {}",
                status.as_u16(),
                text
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn complete_async(&self, prompt: &str) -> Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = self.api_key.as_deref().unwrap_or_default();

        match self.provider {
            LlmProvider::Ollama => {
                let json = self
                    .post(
                        "ollama",
                        format!("{}/api/generate", self.endpoint),
                        headers,
                        json!({
                            "model": self.model,
                            "system": SYSTEM_PROMPT,
                            "prompt": prompt,
                            "stream": false,
                            "options": {
                                "temperature": self.temperature,
                                "num_predict": self.max_tokens,
                            },
                        }),
                    )
                    .await?;
                json.get("response")
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string)
                    .ok_or_else(|| {
                        Error::Llm("ollama response missing string field `response`".to_string())
                    })
            }
            LlmProvider::Claude => {
                headers.insert(
                    "x-api-key",
                    HeaderValue::from_str(key)
                        .map_err(|e| Error::Llm(format!("invalid claude api key header: {e}")))?,
                );
                headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));

                let json = self
                    .post(
                        "claude",
                        format!("{}/v1/messages", self.endpoint),
                        headers,
                        json!({
                            "model": self.model,
                            "max_tokens": self.max_tokens,
                            "temperature": self.temperature,
                            "system": SYSTEM_PROMPT,
                            "messages": [{ "role": "user", "content": prompt }],
                        }),
                    )
                    .await?;
                json.get("content")
                    .and_then(|v| v.as_array())
                    .and_then(|arr| arr.first())
                    .and_then(|v| v.get("text"))
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string)
                    .ok_or_else(|| Error::Llm("claude response missing content[0].text".to_string()))
            }
            LlmProvider::OpenAI => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {key}"))
                        .map_err(|e| Error::Llm(format!("invalid auth header: {e}")))?,
                );

                let json = self
                    .post(
                        "openai",
                        format!("{}/v1/chat/completions", self.endpoint),
                        headers,
                        json!({
                            "model": self.model,
                            "max_tokens": self.max_tokens,
                            "temperature": self.temperature,
                            "messages": [
                                { "role": "system", "content": SYSTEM_PROMPT },
                                { "role": "user", "content": prompt }
                            ]
                        }),
                    )
                    .await?;
                json.get("choices")
                    .and_then(|v| v.as_array())
                    .and_then(|arr| arr.first())
                    .and_then(|v| v.get("message"))
                    .and_then(|v| v.get("content"))
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string)
                    .ok_or_else(|| {
                        Error::Llm("openai response missing choices[0].message.content".to_string())
                    })
            }
        }
    }
}

impl PlanGenerator for HttpPlanGenerator {
    fn complete(&self, prompt: &str) -> Result<String> {
        tracing::info!(provider = ?self.provider, model = %self.model, "Requesting plan");
        self.runtime.block_on(self.complete_async(prompt))
    }
}
