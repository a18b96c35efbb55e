use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use time::OffsetDateTime;

use crate::edit_buffer::EditBuffer;
use crate::error::SyncError;
use crate::gateway::SyncGateway;
use crate::history::{DayHistory, DayRecord};
use crate::model::{
    Estimate, Priority, SessionId, SessionPhase, Task, TaskEdit, TaskId, TaskPatch, UserId,
};
use crate::registry::TaskRegistry;
use crate::scheduler::{SharedRegistry, TimerScheduler};
use crate::snapshot::EngineSnapshot;

/// The session controller: owns the day lifecycle, the task registry, the
/// edit buffer and the timer scheduler for one user. Constructed once per
/// user session; there is no process-wide store.
///
/// Remote failures on non-destructive calls are absorbed into a degraded
/// local-only mode. Failures while starting or stopping the day are
/// terminal for that transition and change nothing locally.
pub struct SyncEngine<G: SyncGateway> {
    gateway: G,
    user: UserId,
    registry: SharedRegistry,
    buffer: EditBuffer,
    history: DayHistory,
    phase: SessionPhase,
    session_id: Option<SessionId>,
    started_at: Option<OffsetDateTime>,
    needs_reconcile: bool,
    degraded: bool,
    next_local_id: u64,
    scheduler: TimerScheduler,
    snapshot_path: Option<PathBuf>,
}

impl<G: SyncGateway> SyncEngine<G> {
    pub fn new(gateway: G, user: UserId) -> Self {
        Self {
            gateway,
            user,
            registry: Arc::new(Mutex::new(TaskRegistry::new())),
            buffer: EditBuffer::new(),
            history: DayHistory::new(),
            phase: SessionPhase::Closed,
            session_id: None,
            started_at: None,
            needs_reconcile: false,
            degraded: false,
            next_local_id: 1,
            scheduler: TimerScheduler::new(),
            snapshot_path: None,
        }
    }

    /// Rebuilds an engine from a persisted snapshot. The restored day
    /// starts closed; call `reconcile` to adopt server truth.
    pub fn restore(gateway: G, user: UserId, snapshot: EngineSnapshot) -> Self {
        let engine = Self::new(gateway, user);
        engine.lock_registry().load(snapshot.tasks);
        Self {
            session_id: snapshot.session_id,
            started_at: snapshot.started_at,
            history: DayHistory::from_records(snapshot.history),
            next_local_id: snapshot.next_local_id.max(1),
            ..engine
        }
    }

    /// Writes lifecycle snapshots to this path.
    pub fn with_snapshot_path(mut self, path: PathBuf) -> Self {
        self.snapshot_path = Some(path);
        self
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_session_open(&self) -> bool {
        self.phase == SessionPhase::Open
    }

    pub fn is_dirty(&self) -> bool {
        self.buffer.is_dirty()
    }

    pub fn needs_reconcile(&self) -> bool {
        self.needs_reconcile
    }

    /// True while the backend is unreachable and changes are only local.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Today's working view: this user's non-completed tasks.
    pub fn tasks_view(&self) -> Vec<Task> {
        self.lock_registry().list(self.user)
    }

    /// Today's completed tasks.
    pub fn completed_view(&self) -> Vec<Task> {
        self.lock_registry().completed(self.user)
    }

    pub fn history(&self) -> &[DayRecord] {
        self.history.records()
    }

    /// Serializable copy of the engine state.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            tasks: self.lock_registry().all(self.user),
            history: self.history.records().to_vec(),
            next_local_id: self.next_local_id,
        }
    }

    /// Opens today's session. On failure the day stays closed but task
    /// creation keeps working locally; remote creation is deferred until a
    /// later start succeeds.
    pub async fn start(&mut self) -> Result<SessionId, SyncError> {
        if self.phase != SessionPhase::Closed {
            return Err(SyncError::SessionAlreadyOpen);
        }

        self.phase = SessionPhase::Starting;
        match self.gateway.start_session(self.user).await {
            Ok(session_id) => {
                {
                    // Fresh day: stale remote-id tasks are dropped, while
                    // tasks created offline keep waiting for their first
                    // push under the new session.
                    let mut registry = self.lock_registry();
                    let kept: Vec<Task> = registry
                        .all(self.user)
                        .into_iter()
                        .filter(|t| t.id.is_local())
                        .collect();
                    if !kept.is_empty() {
                        tracing::debug!(
                            "carrying {} locally created task(s) into the new session",
                            kept.len()
                        );
                    }
                    registry.replace_owner(self.user, kept);
                }
                self.session_id = Some(session_id.clone());
                self.started_at = Some(OffsetDateTime::now_utc());
                self.phase = SessionPhase::Open;
                self.degraded = false;
                self.scheduler.start(self.registry.clone(), self.user);
                tracing::debug!("session {} opened for user {}", session_id, self.user);
                self.persist();
                Ok(session_id)
            }
            Err(err) => {
                self.phase = SessionPhase::Closed;
                self.degraded = true;
                tracing::warn!("failed to start session: {}", err);
                Err(err)
            }
        }
    }

    /// Closes the day. Pending edits are flushed and the remote stop must
    /// succeed before anything is archived or cleared locally; a failure
    /// at either step leaves the session open with local state intact.
    pub async fn end(&mut self) -> Result<Option<DayRecord>, SyncError> {
        if self.phase != SessionPhase::Open {
            return Err(SyncError::SessionNotOpen);
        }
        let Some(session_id) = self.session_id.clone() else {
            return Err(SyncError::SessionNotOpen);
        };

        self.phase = SessionPhase::Ending;

        if let Err(err) = self.flush_all(&session_id).await {
            self.phase = SessionPhase::Open;
            tracing::warn!("refusing to close the day with unsynced edits: {}", err);
            return Err(err);
        }

        if let Err(err) = self.gateway.stop_session(&session_id).await {
            self.phase = SessionPhase::Open;
            if matches!(err, SyncError::Conflict(_)) {
                self.needs_reconcile = true;
            }
            tracing::warn!("failed to stop session {}: {}", session_id, err);
            return Err(err);
        }

        let ended_at = OffsetDateTime::now_utc();
        let record = {
            let mut registry = self.lock_registry();
            let completed = registry.completed(self.user);
            registry.clear_owner(self.user);
            if completed.is_empty() {
                None
            } else {
                Some(DayRecord::new(self.started_at, ended_at, completed))
            }
        };
        if let Some(record) = &record {
            self.history.append(record.clone());
        }

        self.session_id = None;
        self.started_at = None;
        self.phase = SessionPhase::Closed;
        self.scheduler.stop();
        tracing::debug!("session {} closed", session_id);
        self.persist();
        Ok(record)
    }

    /// Pulls the server's view of today and adopts it. An already-ended
    /// day forces the closed state with an empty view regardless of what
    /// the payload carries. Clears any pending conflict flag on success.
    pub async fn reconcile(&mut self) -> Result<(), SyncError> {
        let pulled = match self.gateway.pull(self.user).await {
            Ok(pulled) => pulled,
            Err(err) => {
                self.note_sync_failure(&err);
                return Err(err);
            }
        };
        self.needs_reconcile = false;
        self.degraded = false;

        match pulled {
            Some(snapshot) if snapshot.is_ended() => {
                self.lock_registry().clear_owner(self.user);
                self.buffer.clear();
                self.session_id = None;
                self.started_at = None;
                self.phase = SessionPhase::Closed;
                self.scheduler.stop();
                tracing::debug!("remote session already ended, local view cleared");
                Ok(())
            }
            Some(snapshot) => {
                self.lock_registry()
                    .replace_owner(self.user, snapshot.tasks);
                self.session_id = Some(snapshot.session_id);
                self.started_at = Some(snapshot.started_at);
                self.phase = SessionPhase::Open;
                self.scheduler.start(self.registry.clone(), self.user);
                Ok(())
            }
            None => {
                self.session_id = None;
                self.started_at = None;
                if self.phase == SessionPhase::Open {
                    self.phase = SessionPhase::Closed;
                    self.scheduler.stop();
                }
                Ok(())
            }
        }
    }

    /// Creates a task locally and, when a session is open, pushes the
    /// creation through. Without a session the task stays local-only.
    pub async fn add_task(
        &mut self,
        title: &str,
        priority: Priority,
        estimate: Estimate,
    ) -> Result<TaskId, SyncError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SyncError::validation("task title must not be empty"));
        }

        let id = TaskId::Local(self.next_local_id);
        self.next_local_id += 1;
        let task = Task::new(id.clone(), title, self.user)
            .with_priority(priority)
            .with_estimate(estimate.normalized());
        self.lock_registry().insert(task.clone());

        let Some(session_id) = self.session_id.clone() else {
            tracing::debug!("no open session, task {} kept local", id);
            return Ok(id);
        };

        match self.gateway.push_task(&session_id, &task).await {
            Ok(confirmed) => {
                let confirmed_id = confirmed.id.clone();
                self.lock_registry().adopt(&id, confirmed);
                Ok(confirmed_id)
            }
            Err(err @ SyncError::Conflict(_)) => {
                self.needs_reconcile = true;
                tracing::warn!("task create conflicted: {}", err);
                Err(err)
            }
            Err(err) => {
                // Kept local; creation happens on the next sync touch.
                self.note_sync_failure(&err);
                tracing::warn!("task create not synced, kept local: {}", err);
                Ok(id)
            }
        }
    }

    /// Removes a task locally right away. The remote delete runs only for
    /// tasks the backend knows about; a failure there is logged and
    /// otherwise ignored.
    pub async fn delete_task(&mut self, id: &TaskId) -> Result<(), SyncError> {
        if self.lock_registry().remove(id).is_none() {
            return Err(SyncError::TaskNotFound(id.to_string()));
        }
        self.buffer.discard(id);

        if !id.is_local() {
            if let Some(session_id) = self.session_id.clone() {
                if let Err(err) = self.gateway.delete_task(&session_id, id).await {
                    tracing::warn!("remote delete for {} failed: {}", id, err);
                }
            }
        }
        Ok(())
    }

    /// Flips a task's timer optimistically, then confirms with the
    /// backend. Success adopts the server copy, elapsed correction
    /// included; failure rolls the flag back and leaves elapsed untouched.
    pub async fn toggle_timer(&mut self, id: &TaskId) -> Result<bool, SyncError> {
        let (task, was_running) = {
            let mut registry = self.lock_registry();
            let task = registry
                .get_mut(id)
                .ok_or_else(|| SyncError::TaskNotFound(id.to_string()))?;
            let was_running = task.timer_running;
            task.timer_running = !was_running;
            (task.clone(), was_running)
        };

        let Some(session_id) = self.session_id.clone() else {
            // Local-only day: the optimistic flip is already the truth.
            return Ok(!was_running);
        };

        match self.gateway.push_task(&session_id, &task).await {
            Ok(confirmed) => {
                let running = confirmed.timer_running;
                self.lock_registry().adopt(id, confirmed);
                self.degraded = false;
                Ok(running)
            }
            Err(err) => {
                if let Some(live) = self.lock_registry().get_mut(id) {
                    live.timer_running = was_running;
                }
                self.note_sync_failure(&err);
                tracing::warn!("timer toggle for {} rolled back: {}", id, err);
                Err(err)
            }
        }
    }

    /// Stages a field edit. Status and priority changes flush right away;
    /// title and estimate edits wait in the buffer for an explicit save.
    pub async fn edit_field(&mut self, id: &TaskId, edit: TaskEdit) -> Result<(), SyncError> {
        if self.lock_registry().get(id).is_none() {
            return Err(SyncError::TaskNotFound(id.to_string()));
        }

        let immediate = edit.syncs_immediately();
        self.buffer.stage(id.clone(), TaskPatch::from_edit(edit));
        if !immediate {
            return Ok(());
        }

        self.flush_task(id).await
    }

    /// Explicit "Save Changes": applies every staged edit and bulk-pushes
    /// the full task set. Without an open session the edits still apply
    /// locally and stay marked dirty.
    pub async fn save_all(&mut self) -> Result<(), SyncError> {
        match self.session_id.clone() {
            Some(session_id) => {
                let result = self.flush_all(&session_id).await;
                if result.is_ok() {
                    self.persist();
                }
                result
            }
            None => {
                let applied = self.apply_pending_locally();
                for (id, patch) in applied {
                    self.buffer.stage(id, patch);
                }
                tracing::warn!("no open session, changes kept locally");
                Err(SyncError::SessionNotOpen)
            }
        }
    }

    /// Flushes one task's immediately-syncing staged fields through the
    /// gateway. A failed push re-stages them so the dirty flag survives
    /// for a later save.
    async fn flush_task(&mut self, id: &TaskId) -> Result<(), SyncError> {
        let Some(mut patch) = self.buffer.drain(id) else {
            return Ok(());
        };
        let immediate = patch.take_immediate();
        if !patch.is_empty() {
            self.buffer.stage(id.clone(), patch);
        }
        if immediate.is_empty() {
            return Ok(());
        }

        let task = {
            let mut registry = self.lock_registry();
            if !registry.apply_patch(id, &immediate) {
                return Err(SyncError::TaskNotFound(id.to_string()));
            }
            match registry.get(id) {
                Some(task) => task.clone(),
                None => return Err(SyncError::TaskNotFound(id.to_string())),
            }
        };

        let Some(session_id) = self.session_id.clone() else {
            // Applied locally; the remote copy catches up on the next save.
            self.buffer.stage(id.clone(), immediate);
            return Ok(());
        };

        match self.gateway.push_task(&session_id, &task).await {
            Ok(confirmed) => {
                self.lock_registry().adopt(id, confirmed);
                self.degraded = false;
                Ok(())
            }
            Err(err) => {
                self.buffer.stage(id.clone(), immediate);
                self.note_sync_failure(&err);
                tracing::warn!("field sync for {} failed, kept locally: {}", id, err);
                Err(err)
            }
        }
    }

    /// Drains every pending edit into the registry, compacts blank-titled
    /// rows, and bulk-pushes the result. On failure the surviving patches
    /// are re-staged so nothing is silently lost.
    async fn flush_all(&mut self, session_id: &SessionId) -> Result<(), SyncError> {
        let applied = self.apply_pending_locally();
        let payload = self.lock_registry().all(self.user);
        if payload.is_empty() {
            return Ok(());
        }

        match self.gateway.push_all(session_id, &payload).await {
            Ok(()) => {
                self.degraded = false;
                Ok(())
            }
            Err(err) => {
                for (id, patch) in applied {
                    self.buffer.stage(id, patch);
                }
                self.note_sync_failure(&err);
                tracing::warn!("bulk save failed, changes kept locally: {}", err);
                Err(err)
            }
        }
    }

    /// Applies staged patches to the registry and compacts blank rows.
    /// Returns the patches whose tasks are still present, for re-staging
    /// if a following push fails.
    fn apply_pending_locally(&mut self) -> Vec<(TaskId, TaskPatch)> {
        let drained = self.buffer.drain_all();
        let mut registry = self.lock_registry();
        let mut applied = Vec::with_capacity(drained.len());
        for (id, patch) in drained {
            if registry.apply_patch(&id, &patch) {
                applied.push((id, patch));
            } else {
                tracing::debug!("dropping pending edit for removed task {}", id);
            }
        }
        registry.compact(self.user);
        applied.retain(|(id, _)| registry.get(id).is_some());
        applied
    }

    fn note_sync_failure(&mut self, err: &SyncError) {
        match err {
            SyncError::Conflict(_) => self.needs_reconcile = true,
            err if err.is_degradation() => self.degraded = true,
            _ => {}
        }
    }

    /// Writes the current snapshot to the configured path, if any. Runs
    /// automatically after a successful start, save and end; a write
    /// failure is logged, never fatal.
    pub fn persist(&self) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        if let Err(err) = crate::snapshot::save(path, &self.snapshot()) {
            tracing::warn!("failed to persist snapshot: {:#}", err);
        }
    }

    fn lock_registry(&self) -> MutexGuard<'_, TaskRegistry> {
        self.registry.lock().expect("registry lock poisoned")
    }
}
