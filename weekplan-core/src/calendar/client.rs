//! HTTP client for the Google Calendar v3 events API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;

use crate::config::CalendarConfig;
use crate::error::{Error, Result};

use super::{CalendarEvent, CalendarEventPayload};

/// Calendar operations the exporter and importer depend on.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// Create an event and return it as stored by the service.
    async fn insert(&self, payload: &CalendarEventPayload) -> Result<CalendarEvent>;

    /// Delete an event. Returns false if it did not exist.
    async fn delete(&self, event_id: &str) -> Result<bool>;

    /// Events overlapping `[time_min, time_max)`, both RFC 3339.
    async fn list(&self, time_min: &str, time_max: &str) -> Result<Vec<CalendarEvent>>;
}

/// Response from GET /calendars/{calendarId}/events
#[derive(Debug, Deserialize)]
struct EventsListResponse {
    #[serde(default)]
    items: Vec<CalendarEvent>,
}

/// Google Calendar v3 client
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    events_url: String,
}

impl GoogleCalendarClient {
    /// Create a client from configuration
    ///
    /// Fails when no access token is configured or available from the environment.
    pub fn new(config: &CalendarConfig) -> Result<Self> {
        config.validate()?;

        let token = config.access_token().ok_or_else(|| {
            Error::Config(format!(
                "calendar.access_token (or {}) is required",
                crate::config::CALENDAR_TOKEN_ENV
            ))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| Error::Config(format!("invalid access_token: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        let events_url = format!(
            "{}/calendars/{}/events",
            config.api_base_url.trim_end_matches('/'),
            urlencoding::encode(&config.calendar_id)
        );

        Ok(Self {
            http_client,
            events_url,
        })
    }

    async fn api_error(response: reqwest::Response) -> Error {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown".to_string());
        Error::Calendar(format!("API error ({}): {}", status, error_text))
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn insert(&self, payload: &CalendarEventPayload) -> Result<CalendarEvent> {
        let response = self
            .http_client
            .post(&self.events_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::Calendar(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| Error::Calendar(format!("failed to parse response: {}", e)))
    }

    async fn delete(&self, event_id: &str) -> Result<bool> {
        let url = format!("{}/{}", self.events_url, urlencoding::encode(event_id));

        let response = self
            .http_client
            .delete(&url)
            .send()
            .await
            .map_err(|e| Error::Calendar(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE
        {
            tracing::debug!(event_id, %status, "Event already gone");
            Ok(false)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn list(&self, time_min: &str, time_max: &str) -> Result<Vec<CalendarEvent>> {
        let response = self
            .http_client
            .get(&self.events_url)
            .query(&[
                ("timeMin", time_min),
                ("timeMax", time_max),
                ("singleEvents", "false"),
            ])
            .send()
            .await
            .map_err(|e| Error::Calendar(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body: EventsListResponse = response
            .json()
            .await
            .map_err(|e| Error::Calendar(format!("failed to parse response: {}", e)))?;
        tracing::debug!(count = body.items.len(), "Listed calendar events");
        Ok(body.items)
    }
}
