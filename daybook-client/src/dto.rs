use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityDto {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusDto {
    NotStarted,
    InProgress,
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateDto {
    pub hours: u32,
    pub minutes: u32,
}

/// Wire shape of a task. `id` is absent until the backend has assigned one,
/// which is how a create is distinguished from an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub priority: PriorityDto,
    pub status: StatusDto,
    pub estimate: EstimateDto,
    pub elapsed_seconds: u64,
    pub is_timer_running: bool,
    pub owner_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub id: String,
    pub owner_id: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: time::OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub ended_at: Option<time::OffsetDateTime>,
}

/// `session` is null when the user has not started a day yet.
#[derive(Debug, Deserialize)]
pub struct TodayResponse {
    pub session: Option<SessionDto>,
    #[serde(default)]
    pub tasks: Vec<TaskDto>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub user_id: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: String,
}

#[derive(Serialize)]
pub struct PushTaskRequest<'a> {
    pub task: &'a TaskDto,
}

#[derive(Debug, Deserialize)]
pub struct PushTaskResponse {
    pub task: TaskDto,
}

#[derive(Serialize)]
pub struct PushAllRequest<'a> {
    pub tasks: &'a [TaskDto],
}

#[derive(Debug, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}
