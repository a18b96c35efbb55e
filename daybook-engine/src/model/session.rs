use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{SessionId, Task};

/// Lifecycle of the daily work session.
///
/// `Starting` and `Ending` cover the window where the corresponding remote
/// call is in flight; edits are frozen while `Ending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Closed,
    Starting,
    Open,
    Ending,
}

/// The server's view of today, as returned by a pull.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub started_at: OffsetDateTime,
    pub ended_at: Option<OffsetDateTime>,
    pub tasks: Vec<Task>,
}

impl SessionSnapshot {
    /// An ended day is not resumable for editing, whatever tasks the
    /// payload carries.
    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}
