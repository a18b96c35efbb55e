//! Mock gateway implementation for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;

use crate::error::SyncError;
use crate::gateway::SyncGateway;
use crate::model::{SessionId, SessionSnapshot, Task, TaskId, UserId};

/// Everything a test might want to assert about wire traffic.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    StartSession(UserId),
    Pull(UserId),
    PushTask(Task),
    PushAll(Vec<Task>),
    StopSession(SessionId),
    DeleteTask(TaskId),
}

#[derive(Debug, Default)]
struct FailSwitches {
    start: bool,
    pull: bool,
    push_task: bool,
    push_task_conflict: bool,
    push_all: bool,
    stop: bool,
    stop_conflict: bool,
    delete: bool,
}

/// Mock gateway backed by an in-memory day record.
///
/// Failure switches flip individual operations into network or conflict
/// errors, and the call log lets tests assert exactly what reached the
/// wire. Clones share state, so a test can keep a handle while the engine
/// owns another.
#[derive(Clone, Default)]
pub struct MockGateway {
    today: Arc<Mutex<Option<SessionSnapshot>>>,
    calls: Arc<Mutex<Vec<GatewayCall>>>,
    fail: Arc<Mutex<FailSwitches>>,
    next_task_id: Arc<AtomicU64>,
    next_session_id: Arc<AtomicU64>,
    confirmed_elapsed: Arc<Mutex<Option<u64>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the server-side view of today.
    pub fn with_today(self, snapshot: SessionSnapshot) -> Self {
        *self.today.lock().unwrap() = Some(snapshot);
        self
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.fail.lock().unwrap().start = fail;
    }

    pub fn set_fail_pull(&self, fail: bool) {
        self.fail.lock().unwrap().pull = fail;
    }

    pub fn set_fail_push_task(&self, fail: bool) {
        self.fail.lock().unwrap().push_task = fail;
    }

    pub fn set_conflict_push_task(&self, conflict: bool) {
        self.fail.lock().unwrap().push_task_conflict = conflict;
    }

    pub fn set_fail_push_all(&self, fail: bool) {
        self.fail.lock().unwrap().push_all = fail;
    }

    pub fn set_fail_stop(&self, fail: bool) {
        self.fail.lock().unwrap().stop = fail;
    }

    pub fn set_conflict_stop(&self, conflict: bool) {
        self.fail.lock().unwrap().stop_conflict = conflict;
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail.lock().unwrap().delete = fail;
    }

    /// Make every push_task response carry this elapsed value, standing in
    /// for a server-side drift correction.
    pub fn set_confirmed_elapsed(&self, elapsed: Option<u64>) {
        *self.confirmed_elapsed.lock().unwrap() = elapsed;
    }

    pub fn today(&self) -> Option<SessionSnapshot> {
        self.today.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Tasks sent through push_task, in order.
    pub fn pushed_tasks(&self) -> Vec<Task> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::PushTask(task) => Some(task),
                _ => None,
            })
            .collect()
    }

    /// Payloads sent through push_all, in order.
    pub fn bulk_payloads(&self) -> Vec<Vec<Task>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::PushAll(tasks) => Some(tasks),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_ids(&self) -> Vec<TaskId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::DeleteTask(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn push_task_calls(&self) -> usize {
        self.pushed_tasks().len()
    }

    pub fn stop_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, GatewayCall::StopSession(_)))
            .count()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SyncGateway for MockGateway {
    async fn start_session(&self, user: UserId) -> Result<SessionId, SyncError> {
        self.record(GatewayCall::StartSession(user));
        if self.fail.lock().unwrap().start {
            return Err(SyncError::network("mock: start_session refused"));
        }

        let n = self.next_session_id.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = SessionId::new(format!("s-{}", n));
        *self.today.lock().unwrap() = Some(SessionSnapshot {
            session_id: session_id.clone(),
            started_at: OffsetDateTime::now_utc(),
            ended_at: None,
            tasks: vec![],
        });
        Ok(session_id)
    }

    async fn pull(&self, user: UserId) -> Result<Option<SessionSnapshot>, SyncError> {
        self.record(GatewayCall::Pull(user));
        if self.fail.lock().unwrap().pull {
            return Err(SyncError::network("mock: pull refused"));
        }
        Ok(self.today.lock().unwrap().clone())
    }

    async fn push_task(&self, session_id: &SessionId, task: &Task) -> Result<Task, SyncError> {
        self.record(GatewayCall::PushTask(task.clone()));
        {
            let fail = self.fail.lock().unwrap();
            if fail.push_task_conflict {
                return Err(SyncError::Conflict("mock: push_task conflict".to_string()));
            }
            if fail.push_task {
                return Err(SyncError::network("mock: push_task refused"));
            }
        }

        let mut today = self.today.lock().unwrap();
        let snapshot = match today.as_mut() {
            Some(snapshot) if snapshot.session_id == *session_id && !snapshot.is_ended() => {
                snapshot
            }
            _ => return Err(SyncError::Conflict("mock: no such open session".to_string())),
        };

        let mut confirmed = task.clone();
        if confirmed.id.is_local() {
            let n = self.next_task_id.fetch_add(1, Ordering::SeqCst) + 1;
            confirmed.id = TaskId::remote(format!("t-{}", n));
        }
        if let Some(elapsed) = *self.confirmed_elapsed.lock().unwrap() {
            confirmed.elapsed_seconds = elapsed;
        }

        match snapshot.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(stored) => *stored = confirmed.clone(),
            None => snapshot.tasks.push(confirmed.clone()),
        }
        Ok(confirmed)
    }

    async fn push_all(&self, session_id: &SessionId, tasks: &[Task]) -> Result<(), SyncError> {
        self.record(GatewayCall::PushAll(tasks.to_vec()));
        if self.fail.lock().unwrap().push_all {
            return Err(SyncError::network("mock: push_all refused"));
        }

        let mut today = self.today.lock().unwrap();
        match today.as_mut() {
            Some(snapshot) if snapshot.session_id == *session_id && !snapshot.is_ended() => {
                snapshot.tasks = tasks.to_vec();
                Ok(())
            }
            _ => Err(SyncError::Conflict("mock: no such open session".to_string())),
        }
    }

    async fn stop_session(&self, session_id: &SessionId) -> Result<(), SyncError> {
        self.record(GatewayCall::StopSession(session_id.clone()));
        {
            let fail = self.fail.lock().unwrap();
            if fail.stop_conflict {
                return Err(SyncError::Conflict("mock: stop_session conflict".to_string()));
            }
            if fail.stop {
                return Err(SyncError::network("mock: stop_session refused"));
            }
        }

        let mut today = self.today.lock().unwrap();
        match today.as_mut() {
            Some(snapshot) if snapshot.session_id == *session_id && !snapshot.is_ended() => {
                snapshot.ended_at = Some(OffsetDateTime::now_utc());
                Ok(())
            }
            _ => Err(SyncError::Conflict("mock: no such open session".to_string())),
        }
    }

    async fn delete_task(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
    ) -> Result<(), SyncError> {
        self.record(GatewayCall::DeleteTask(task_id.clone()));
        if self.fail.lock().unwrap().delete {
            return Err(SyncError::network("mock: delete_task refused"));
        }

        let mut today = self.today.lock().unwrap();
        match today.as_mut() {
            Some(snapshot) if snapshot.session_id == *session_id => {
                snapshot.tasks.retain(|t| t.id != *task_id);
                Ok(())
            }
            _ => Err(SyncError::Conflict("mock: no such session".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(id: TaskId, title: &str) -> Task {
        Task::new(id, title, UserId::new(7))
    }

    #[tokio::test]
    async fn assigns_sequential_remote_ids_to_local_tasks() {
        let gateway = MockGateway::new();
        let session_id = gateway.start_session(UserId::new(7)).await.unwrap();

        let first = gateway
            .push_task(&session_id, &make_task(TaskId::Local(1), "a"))
            .await
            .unwrap();
        let second = gateway
            .push_task(&session_id, &make_task(TaskId::Local(2), "b"))
            .await
            .unwrap();

        assert_eq!(first.id, TaskId::remote("t-1"));
        assert_eq!(second.id, TaskId::remote("t-2"));
        assert_eq!(gateway.today().unwrap().tasks.len(), 2);
    }

    #[tokio::test]
    async fn push_task_rejects_unknown_session() {
        let gateway = MockGateway::new();

        let err = gateway
            .push_task(&SessionId::new("s-99"), &make_task(TaskId::Local(1), "a"))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Conflict(_)));
    }

    #[tokio::test]
    async fn failure_switch_turns_pushes_into_network_errors() {
        let gateway = MockGateway::new();
        let session_id = gateway.start_session(UserId::new(7)).await.unwrap();
        gateway.set_fail_push_task(true);

        let err = gateway
            .push_task(&session_id, &make_task(TaskId::Local(1), "a"))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Network(_)));
        assert_eq!(gateway.push_task_calls(), 1);
    }

    #[tokio::test]
    async fn push_all_replaces_the_day_tasks() {
        let gateway = MockGateway::new();
        let session_id = gateway.start_session(UserId::new(7)).await.unwrap();
        gateway
            .push_task(&session_id, &make_task(TaskId::Local(1), "old"))
            .await
            .unwrap();

        let replacement = vec![make_task(TaskId::remote("t-9"), "new")];
        gateway.push_all(&session_id, &replacement).await.unwrap();

        let stored = gateway.today().unwrap().tasks;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "new");
    }

    #[tokio::test]
    async fn stop_marks_the_session_ended() {
        let gateway = MockGateway::new();
        let session_id = gateway.start_session(UserId::new(7)).await.unwrap();

        gateway.stop_session(&session_id).await.unwrap();

        assert!(gateway.today().unwrap().is_ended());
        let err = gateway.stop_session(&session_id).await.unwrap_err();
        assert!(matches!(err, SyncError::Conflict(_)));
    }
}
