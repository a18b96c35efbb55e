use serde::{Deserialize, Serialize};

use super::{TaskId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Pending,
    Completed,
}

/// Estimated effort. Minutes are not range-checked on input; they are
/// normalized into hours whenever a pending edit is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    pub hours: u32,
    pub minutes: u32,
}

impl Estimate {
    pub fn new(hours: u32, minutes: u32) -> Self {
        Self { hours, minutes }
    }

    pub fn normalized(self) -> Self {
        Self {
            hours: self.hours + self.minutes / 60,
            minutes: self.minutes % 60,
        }
    }
}

/// One unit of work for one user on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub estimate: Estimate,
    pub elapsed_seconds: u64,
    pub timer_running: bool,
    pub owner: UserId,
}

impl Task {
    pub fn new(id: TaskId, title: impl Into<String>, owner: UserId) -> Self {
        Self {
            id,
            title: title.into(),
            priority: Priority::Medium,
            status: TaskStatus::NotStarted,
            estimate: Estimate::default(),
            elapsed_seconds: 0,
            timer_running: false,
            owner,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_estimate(mut self, estimate: Estimate) -> Self {
        self.estimate = estimate;
        self
    }

    pub fn with_elapsed(mut self, elapsed_seconds: u64) -> Self {
        self.elapsed_seconds = elapsed_seconds;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn has_blank_title(&self) -> bool {
        self.title.trim().is_empty()
    }

    /// Elapsed time as HH:MM:SS for display.
    pub fn format_elapsed(&self) -> String {
        let hours = self.elapsed_seconds / 3600;
        let minutes = (self.elapsed_seconds % 3600) / 60;
        let seconds = self.elapsed_seconds % 60;
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// One field change coming in from the edit surface.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEdit {
    Title(String),
    Priority(Priority),
    Status(TaskStatus),
    Estimate(Estimate),
}

impl TaskEdit {
    /// Status and priority changes sync right away; title and estimate
    /// edits wait for an explicit save.
    pub fn syncs_immediately(&self) -> bool {
        matches!(self, TaskEdit::Status(_) | TaskEdit::Priority(_))
    }
}

/// Accumulated un-pushed field changes for one task. A later write to the
/// same field overwrites the earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub estimate: Option<Estimate>,
}

impl TaskPatch {
    pub fn from_edit(edit: TaskEdit) -> Self {
        let mut patch = Self::default();
        patch.set(edit);
        patch
    }

    pub fn set(&mut self, edit: TaskEdit) {
        match edit {
            TaskEdit::Title(title) => self.title = Some(title),
            TaskEdit::Priority(priority) => self.priority = Some(priority),
            TaskEdit::Status(status) => self.status = Some(status),
            TaskEdit::Estimate(estimate) => self.estimate = Some(estimate),
        }
    }

    /// Merges a later patch over this one, field by field.
    pub fn merge(&mut self, later: TaskPatch) {
        if let Some(title) = later.title {
            self.title = Some(title);
        }
        if let Some(priority) = later.priority {
            self.priority = Some(priority);
        }
        if let Some(status) = later.status {
            self.status = Some(status);
        }
        if let Some(estimate) = later.estimate {
            self.estimate = Some(estimate);
        }
    }

    /// Splits off the fields that sync immediately, leaving the
    /// save-gated ones staged.
    pub fn take_immediate(&mut self) -> TaskPatch {
        TaskPatch {
            title: None,
            priority: self.priority.take(),
            status: self.status.take(),
            estimate: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.estimate.is_none()
    }

    /// Applies the patch to a task. The estimate is normalized here so an
    /// out-of-range minutes value never reaches the wire or a snapshot.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(estimate) = self.estimate {
            task.estimate = estimate.normalized();
        }
    }
}
