//! `reqwest`-backed implementation of [`ChecklistApi`].
//!
//! # Invariants
//! - Every request emits one `api_request` log line with path, status and
//!   duration; request bodies (notes, names) are never logged.
//! - Non-2xx responses map to `ApiError::Status` carrying the server's
//!   `error`/`detail` message when the body has one.

use super::{
    parse_last_completions, ApiError, ApiResult, CatalogResponse, ChecklistApi, HealthResponse,
    LastCompletionsResponse, PhotoUpload, ScheduleResponse, SubmitRequest, SuccessEnvelope,
    UploadResponse,
};
use crate::engine::summary::CalendarSummary;
use crate::model::completion::{DayKey, DayState, LastCompletionIndex, PhotoRef};
use crate::model::item::ChecklistItem;
use crate::model::schedule::ScheduleEntry;
use async_trait::async_trait;
use chrono::{NaiveDate, SecondsFormat, Utc};
use log::{error, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// HTTP client for the checklist API rooted at `base_url` (e.g.
/// `https://host/api`).
#[derive(Debug, Clone)]
pub struct HttpChecklistApi {
    client: Client,
    base_url: String,
}

impl HttpChecklistApi {
    /// Builds a client with the given per-request timeout.
    ///
    /// # Errors
    /// - `InvalidBaseUrl` when `base_url` is not an absolute http(s) URL.
    /// - `Transport` when the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = reqwest::Url::parse(trimmed)
            .map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let started_at = Instant::now();
        let result = self.client.get(self.endpoint(path)).query(query).send().await;
        finish(path, "GET", started_at, result).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let started_at = Instant::now();
        let result = self.client.post(self.endpoint(path)).json(body).send().await;
        finish(path, "POST", started_at, result).await
    }
}

#[async_trait]
impl ChecklistApi for HttpChecklistApi {
    async fn fetch_items(&self) -> ApiResult<Vec<ChecklistItem>> {
        let response: CatalogResponse = self.get_json("checklist/items", &[]).await?;
        Ok(response.items)
    }

    async fn fetch_last_completions(&self) -> ApiResult<LastCompletionIndex> {
        let response: LastCompletionsResponse =
            self.get_json("checklist/last-completions", &[]).await?;
        Ok(parse_last_completions(response.last_completions))
    }

    async fn fetch_day_state(&self, key: &DayKey) -> ApiResult<DayState> {
        self.get_json("checklist", &[("date", key.to_string())]).await
    }

    async fn submit_day_state(
        &self,
        key: &DayKey,
        items: &[ChecklistItem],
        state: &DayState,
    ) -> ApiResult<()> {
        let request = SubmitRequest {
            date: key.to_string(),
            items,
            checked: &state.checked,
        };
        let envelope: SuccessEnvelope = self.post_json("checklist", &request).await?;
        envelope.into_result("Submit failed")
    }

    async fn upload_photo(&self, upload: &PhotoUpload) -> ApiResult<PhotoRef> {
        let file_part = Part::bytes(upload.bytes.clone())
            .file_name(upload.filename.clone())
            .mime_str(&upload.content_type)
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let form = Form::new()
            .part("file", file_part)
            .text("date", upload.day_key.to_string())
            .text("item_id", upload.item_id.clone())
            .text("user", upload.user.clone());

        let path = "checklist/upload-photo";
        let started_at = Instant::now();
        let result = self
            .client
            .post(self.endpoint(path))
            .multipart(form)
            .send()
            .await;
        let response: UploadResponse = finish(path, "POST", started_at, result).await?;

        if !response.success {
            return Err(ApiError::Rejected(
                response.error.unwrap_or_else(|| "Upload failed".to_string()),
            ));
        }
        let url = response
            .photo_url
            .ok_or_else(|| ApiError::Decode("upload response is missing photo_url".to_string()))?;
        Ok(PhotoRef {
            url,
            filename: upload.filename.clone(),
            uploaded_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        })
    }

    async fn fetch_schedule(&self, date: NaiveDate, line: &str) -> ApiResult<Option<ScheduleEntry>> {
        let query = [
            ("date", date.format("%Y-%m-%d").to_string()),
            ("line", line.to_string()),
        ];
        match self.get_json::<ScheduleResponse>("schedule", &query).await {
            Ok(response) => Ok(response.entry),
            Err(ApiError::Status { status: 404, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn save_schedule(&self, entry: &ScheduleEntry) -> ApiResult<()> {
        let envelope: SuccessEnvelope = self.post_json("schedule", entry).await?;
        envelope.into_result("Schedule save failed")
    }

    async fn fetch_calendar_summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResult<CalendarSummary> {
        let query = [
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
        ];
        self.get_json("summary/calendar", &query).await
    }

    async fn health(&self) -> ApiResult<String> {
        let response: HealthResponse = self.get_json("health", &[]).await?;
        Ok(response.status)
    }
}

async fn finish<T: DeserializeOwned>(
    path: &str,
    method: &str,
    started_at: Instant,
    result: Result<Response, reqwest::Error>,
) -> ApiResult<T> {
    let outcome = match result {
        Ok(response) => decode_response(response).await,
        Err(err) => Err(ApiError::from(err)),
    };

    match &outcome {
        Ok(_) => info!(
            "event=api_request module=api status=ok method={} path={} duration_ms={}",
            method,
            path,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=api_request module=api status=error method={} path={} duration_ms={} error={}",
            method,
            path,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    outcome
}

async fn decode_response<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(status, &body),
        });
    }
    serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
}

/// Extracts `error` (handler errors) or `detail` (framework errors) from a
/// JSON error body, falling back to a truncated raw body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "detail"] {
            if let Some(message) = value.get(key).and_then(serde_json::Value::as_str) {
                return message.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }
    trimmed.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}
