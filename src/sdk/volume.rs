use async_trait::async_trait;

use crate::wait::{Polled, Status};

use super::{has_error_marker, status_enum, ApiResult, Page, PageRequest};

status_enum!(
    /// Lifecycle of a block storage volume
    VolumeStatus {
        Creating => "creating",
        Completed => "completed",
        Updating => "updating",
        Deleting => "deleting",
        Deleted => "deleted",
    }
);

impl Status for VolumeStatus {
    fn is_error(&self) -> bool {
        has_error_marker(self.as_str())
    }
}

/// Block storage volume as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Volume {
    pub id: String,
    pub name: Option<String>,
    pub size_gib: i64,
    pub volume_type: Option<String>,
    pub availability_zone: Option<String>,
    pub snapshot_id: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
}

impl Polled for Volume {
    type Status = VolumeStatus;
    const KIND: &'static str = "volume";

    fn status(&self) -> VolumeStatus {
        self.status.as_str().into()
    }

    fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VolumeCreate {
    pub name: Option<String>,
    pub size_gib: i64,
    pub volume_type: Option<String>,
    pub availability_zone: String,
    pub snapshot_id: Option<String>,
}

/// Partial update, `None` fields are left untouched
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VolumeUpdate {
    pub name: Option<String>,
    pub size_gib: Option<i64>,
}

#[async_trait]
pub trait VolumeApi: Send + Sync {
    async fn get_volume(&self, id: &str) -> ApiResult<Volume>;
    async fn list_volumes(&self, request: PageRequest) -> ApiResult<Page<Volume>>;
    /// Returns the ID of the new volume
    async fn create_volume(&self, request: VolumeCreate) -> ApiResult<String>;
    async fn update_volume(&self, id: &str, request: VolumeUpdate) -> ApiResult<()>;
    async fn delete_volume(&self, id: &str) -> ApiResult<()>;
}
