//! Outbound port to the authoritative store, plus its implementations.

use async_trait::async_trait;

use crate::error::SyncError;
use crate::model::{SessionId, SessionSnapshot, Task, TaskId, UserId};

#[cfg(test)]
mod mock;
mod remote;

#[cfg(test)]
pub use mock::{GatewayCall, MockGateway};
pub use remote::RemoteGateway;

/// Contract the sync engine holds against the remote store. `RemoteGateway`
/// adapts the HTTP client; tests swap in `MockGateway`.
#[async_trait]
pub trait SyncGateway: Send + Sync + 'static {
    /// Opens today's session for the user. The returned id gates every
    /// other remote mutation.
    async fn start_session(&self, user: UserId) -> Result<SessionId, SyncError>;

    /// Fetches the server's view of today. `None` means no session exists
    /// for this user yet.
    async fn pull(&self, user: UserId) -> Result<Option<SessionSnapshot>, SyncError>;

    /// Creates or updates a single task. A local-id task comes back
    /// carrying its freshly assigned remote id; the response is the
    /// confirmed server copy, including corrected elapsed time.
    async fn push_task(&self, session_id: &SessionId, task: &Task) -> Result<Task, SyncError>;

    /// Bulk-saves the given tasks under the session.
    async fn push_all(&self, session_id: &SessionId, tasks: &[Task]) -> Result<(), SyncError>;

    /// Closes the session remotely. Nothing local may be archived until
    /// this has succeeded.
    async fn stop_session(&self, session_id: &SessionId) -> Result<(), SyncError>;

    /// Deletes a task the backend knows about.
    async fn delete_task(&self, session_id: &SessionId, task_id: &TaskId)
        -> Result<(), SyncError>;
}
