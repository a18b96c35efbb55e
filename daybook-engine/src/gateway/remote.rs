use async_trait::async_trait;

use daybook_client::{ApiClient, EstimateDto, FetchError, PriorityDto, StatusDto, TaskDto};

use crate::error::SyncError;
use crate::gateway::SyncGateway;
use crate::model::{
    Estimate, Priority, SessionId, SessionSnapshot, Task, TaskId, TaskStatus, UserId,
};

impl From<FetchError> for SyncError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Conflict(msg) => SyncError::Conflict(msg),
            // Token refresh is not handled here; an auth failure degrades
            // like an unreachable backend.
            FetchError::Unauthorized => SyncError::network("unauthorized"),
            other => SyncError::Network(other.to_string()),
        }
    }
}

/// Gateway backed by the daybook HTTP API. The whole local/wire
/// translation happens here; nothing else in the engine sees a DTO or
/// branches on id flavor.
pub struct RemoteGateway {
    client: ApiClient,
}

impl RemoteGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SyncGateway for RemoteGateway {
    async fn start_session(&self, user: UserId) -> Result<SessionId, SyncError> {
        let response = self.client.start_session(user.as_i32()).await?;
        Ok(SessionId::new(response.session_id))
    }

    async fn pull(&self, user: UserId) -> Result<Option<SessionSnapshot>, SyncError> {
        let today = self.client.get_today().await?;
        let Some(session) = today.session else {
            return Ok(None);
        };
        if session.owner_id != user.as_i32() {
            tracing::warn!(
                "pulled session {} belongs to user {}, expected {}",
                session.id,
                session.owner_id,
                user
            );
        }

        let tasks = today
            .tasks
            .into_iter()
            .map(task_from_dto)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(SessionSnapshot {
            session_id: SessionId::new(session.id),
            started_at: session.started_at,
            ended_at: session.ended_at,
            tasks,
        }))
    }

    async fn push_task(&self, session_id: &SessionId, task: &Task) -> Result<Task, SyncError> {
        let dto = task_to_dto(task);
        let confirmed = self.client.push_task(session_id.as_str(), &dto).await?;
        task_from_dto(confirmed)
    }

    async fn push_all(&self, session_id: &SessionId, tasks: &[Task]) -> Result<(), SyncError> {
        let dtos: Vec<TaskDto> = tasks.iter().map(task_to_dto).collect();
        self.client.push_all(session_id.as_str(), &dtos).await?;
        Ok(())
    }

    async fn stop_session(&self, session_id: &SessionId) -> Result<(), SyncError> {
        self.client.stop_session(session_id.as_str()).await?;
        Ok(())
    }

    async fn delete_task(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
    ) -> Result<(), SyncError> {
        let Some(remote_id) = task_id.as_remote() else {
            // Never created remotely, nothing to delete there.
            return Ok(());
        };
        self.client.delete_task(session_id.as_str(), remote_id).await?;
        Ok(())
    }
}

fn task_to_dto(task: &Task) -> TaskDto {
    TaskDto {
        id: task.id.as_remote().map(str::to_string),
        title: task.title.clone(),
        priority: priority_to_dto(task.priority),
        status: status_to_dto(task.status),
        estimate: EstimateDto {
            hours: task.estimate.hours,
            minutes: task.estimate.minutes,
        },
        elapsed_seconds: task.elapsed_seconds,
        is_timer_running: task.timer_running,
        owner_id: task.owner.as_i32(),
    }
}

fn task_from_dto(dto: TaskDto) -> Result<Task, SyncError> {
    let id = dto
        .id
        .map(TaskId::remote)
        .ok_or_else(|| SyncError::network("task in response is missing its id"))?;

    Ok(Task {
        id,
        title: dto.title,
        priority: priority_from_dto(dto.priority),
        status: status_from_dto(dto.status),
        estimate: Estimate::new(dto.estimate.hours, dto.estimate.minutes),
        elapsed_seconds: dto.elapsed_seconds,
        timer_running: dto.is_timer_running,
        owner: UserId::new(dto.owner_id),
    })
}

fn priority_to_dto(priority: Priority) -> PriorityDto {
    match priority {
        Priority::Low => PriorityDto::Low,
        Priority::Medium => PriorityDto::Medium,
        Priority::High => PriorityDto::High,
    }
}

fn priority_from_dto(dto: PriorityDto) -> Priority {
    match dto {
        PriorityDto::Low => Priority::Low,
        PriorityDto::Medium => Priority::Medium,
        PriorityDto::High => Priority::High,
    }
}

fn status_to_dto(status: TaskStatus) -> StatusDto {
    match status {
        TaskStatus::NotStarted => StatusDto::NotStarted,
        TaskStatus::InProgress => StatusDto::InProgress,
        TaskStatus::Pending => StatusDto::Pending,
        TaskStatus::Completed => StatusDto::Completed,
    }
}

fn status_from_dto(dto: StatusDto) -> TaskStatus {
    match dto {
        StatusDto::NotStarted => TaskStatus::NotStarted,
        StatusDto::InProgress => TaskStatus::InProgress,
        StatusDto::Pending => TaskStatus::Pending,
        StatusDto::Completed => TaskStatus::Completed,
    }
}
