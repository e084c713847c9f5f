use async_trait::async_trait;

use crate::wait::{Polled, Status};

use super::{has_error_marker, status_enum, ApiResult};

status_enum!(
    /// Lifecycle of a volume snapshot
    SnapshotStatus {
        Creating => "creating",
        Completed => "completed",
        Deleting => "deleting",
        Deleted => "deleted",
    }
);

impl Status for SnapshotStatus {
    fn is_error(&self) -> bool {
        has_error_marker(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub id: String,
    pub volume_id: String,
    pub description: Option<String>,
    pub size_gib: Option<i64>,
    pub status: String,
    pub error_message: Option<String>,
}

impl Polled for Snapshot {
    type Status = SnapshotStatus;
    const KIND: &'static str = "snapshot";

    fn status(&self) -> SnapshotStatus {
        self.status.as_str().into()
    }

    fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SnapshotCreate {
    pub volume_id: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait SnapshotApi: Send + Sync {
    async fn get_snapshot(&self, id: &str) -> ApiResult<Snapshot>;
    /// Returns the ID of the new snapshot
    async fn create_snapshot(&self, request: SnapshotCreate) -> ApiResult<String>;
    async fn delete_snapshot(&self, id: &str) -> ApiResult<()>;
}
