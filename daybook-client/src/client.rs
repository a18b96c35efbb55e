use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::dto::{
    OkResponse, PushAllRequest, PushTaskRequest, PushTaskResponse, StartSessionRequest,
    StartSessionResponse, TaskDto, TodayResponse,
};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Network: {0}")]
    Network(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Parsing: {0}")]
    Parsing(String),
    #[error("Other: {0}")]
    Other(String),
}

/// HTTP client for the daybook backend. All requests carry the bearer token
/// and share one fixed timeout; a timed-out call surfaces as `Network`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| FetchError::Other(format!("invalid API URL {}: {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Other(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token: token.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::Other(format!("failed to build URL for {}: {}", path, e)))
    }

    async fn send(&self, request: RequestBuilder, call_name: &str) -> Result<Response, FetchError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("{} failed: {}", call_name, e);
                FetchError::Network(format!("{} failed: {}", call_name, e))
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FetchError::Unauthorized)
            }
            StatusCode::CONFLICT => {
                let detail = response.text().await.unwrap_or_default();
                return Err(FetchError::Conflict(format!("{}: {}", call_name, detail)));
            }
            _ => {}
        }

        response
            .error_for_status()
            .map_err(|e| FetchError::Network(format!("{} returned error: {}", call_name, e)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        call_name: &str,
    ) -> Result<T, FetchError> {
        let response = self.send(request, call_name).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Parsing(format!("failed to parse {} response: {}", call_name, e)))
    }

    pub async fn get_today(&self) -> Result<TodayResponse, FetchError> {
        self.get_json(
            self.client.get(self.endpoint("/sessions/today")?),
            "GET /sessions/today",
        )
        .await
    }

    pub async fn start_session(&self, user_id: i32) -> Result<StartSessionResponse, FetchError> {
        self.get_json(
            self.client
                .post(self.endpoint("/sessions")?)
                .json(&StartSessionRequest { user_id }),
            "POST /sessions",
        )
        .await
    }

    pub async fn stop_session(&self, session_id: &str) -> Result<(), FetchError> {
        let response: OkResponse = self
            .get_json(
                self.client
                    .post(self.endpoint(&format!("/sessions/{}/stop", session_id))?),
                "POST /sessions/:id/stop",
            )
            .await?;

        ensure_ok(response, "POST /sessions/:id/stop")
    }

    pub async fn push_task(&self, session_id: &str, task: &TaskDto) -> Result<TaskDto, FetchError> {
        let response: PushTaskResponse = self
            .get_json(
                self.client
                    .put(self.endpoint(&format!("/sessions/{}/tasks", session_id))?)
                    .json(&PushTaskRequest { task }),
                "PUT /sessions/:id/tasks",
            )
            .await?;

        Ok(response.task)
    }

    pub async fn push_all(&self, session_id: &str, tasks: &[TaskDto]) -> Result<(), FetchError> {
        let response: OkResponse = self
            .get_json(
                self.client
                    .put(self.endpoint(&format!("/sessions/{}/tasks/bulk", session_id))?)
                    .json(&PushAllRequest { tasks }),
                "PUT /sessions/:id/tasks/bulk",
            )
            .await?;

        ensure_ok(response, "PUT /sessions/:id/tasks/bulk")
    }

    pub async fn delete_task(&self, session_id: &str, task_id: &str) -> Result<(), FetchError> {
        let response: OkResponse = self
            .get_json(
                self.client.delete(
                    self.endpoint(&format!("/sessions/{}/tasks/{}", session_id, task_id))?,
                ),
                "DELETE /sessions/:id/tasks/:taskId",
            )
            .await?;

        ensure_ok(response, "DELETE /sessions/:id/tasks/:taskId")
    }
}

fn ensure_ok(response: OkResponse, call_name: &str) -> Result<(), FetchError> {
    if response.ok {
        Ok(())
    } else {
        Err(FetchError::Other(format!("{} reported failure", call_name)))
    }
}
