use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::wait::{Polled, Status};

use super::{has_error_marker, status_enum, ApiResult};

status_enum!(
    /// Lifecycle of a virtual machine
    InstanceStatus {
        Creating => "creating",
        Completed => "completed",
        Starting => "starting",
        Stopping => "stopping",
        Stopped => "stopped",
        Updating => "updating",
        Deleting => "deleting",
        Deleted => "deleted",
    }
);

impl Status for InstanceStatus {
    fn is_error(&self) -> bool {
        has_error_marker(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub image_id: String,
    pub instance_type: String,
    pub subnet_id: Option<String>,
    pub private_ip: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub status: String,
    pub error_message: Option<String>,
}

impl Polled for Instance {
    type Status = InstanceStatus;
    const KIND: &'static str = "instance";

    fn status(&self) -> InstanceStatus {
        self.status.as_str().into()
    }

    fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstanceCreate {
    pub name: String,
    pub image_id: String,
    pub instance_type: String,
    pub subnet_id: Option<String>,
    pub tags: BTreeMap<String, String>,
}

/// Partial update, `None` fields are left untouched
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstanceUpdate {
    pub name: Option<String>,
    pub instance_type: Option<String>,
    pub tags: Option<BTreeMap<String, String>>,
}

#[async_trait]
pub trait InstanceApi: Send + Sync {
    async fn get_instance(&self, id: &str) -> ApiResult<Instance>;
    /// Returns the ID of the new instance
    async fn create_instance(&self, request: InstanceCreate) -> ApiResult<String>;
    async fn update_instance(&self, id: &str, request: InstanceUpdate) -> ApiResult<()>;
    async fn delete_instance(&self, id: &str) -> ApiResult<()>;
}
