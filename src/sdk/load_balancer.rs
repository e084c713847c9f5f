use async_trait::async_trait;

use crate::wait::{Polled, Status};

use super::{status_enum, ApiResult};

status_enum!(
    /// Lifecycle of a load balancer
    LoadBalancerStatus {
        Creating => "creating",
        Running => "running",
        Updating => "updating",
        Deleting => "deleting",
        Deleted => "deleted",
        Error => "error",
        CreatingError => "creating_error",
        UpdatingError => "updating_error",
        DeletingError => "deleting_error",
    }
);

impl Status for LoadBalancerStatus {
    fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Error | Self::CreatingError | Self::UpdatingError | Self::DeletingError
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadBalancer {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub listeners: Vec<Listener>,
    pub acls: Vec<Acl>,
    pub health_checks: Vec<HealthCheck>,
    pub backends: Vec<Backend>,
}

impl Polled for LoadBalancer {
    type Status = LoadBalancerStatus;
    const KIND: &'static str = "load balancer";

    fn status(&self) -> LoadBalancerStatus {
        self.status.as_str().into()
    }

    fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listener {
    pub id: String,
    pub name: Option<String>,
    pub port: i64,
    pub protocol: String,
    pub backend_id: String,
    pub certificate_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Acl {
    pub id: String,
    pub name: String,
    pub action: String,
    pub cidr: String,
    pub priority: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HealthCheck {
    pub id: String,
    pub name: String,
    pub protocol: String,
    pub port: i64,
    pub path: Option<String>,
    pub interval: i64,
    pub timeout: i64,
    pub healthy_threshold: i64,
    pub unhealthy_threshold: i64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Backend {
    pub id: String,
    pub name: String,
    /// `instance` targets are NICs, `raw` targets are IP addresses
    pub targets_type: String,
    pub panic_threshold: Option<f64>,
    pub close_connections: bool,
    pub health_check_id: Option<String>,
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Target {
    pub nic_id: Option<String>,
    pub ip_address: Option<String>,
    pub port: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadBalancerCreate {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update, `None` fields are left untouched
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadBalancerUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HealthCheckSpec {
    pub name: String,
    pub protocol: String,
    pub port: i64,
    pub path: Option<String>,
    pub interval: i64,
    pub timeout: i64,
    pub healthy_threshold: i64,
    pub unhealthy_threshold: i64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BackendSpec {
    pub name: String,
    pub targets_type: String,
    pub panic_threshold: Option<f64>,
    pub close_connections: bool,
    pub health_check_id: Option<String>,
    pub targets: Vec<Target>,
}

/// Scalar fields of a backend, targets are replaced separately
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BackendUpdate {
    pub name: String,
    pub panic_threshold: Option<f64>,
    pub close_connections: bool,
    pub health_check_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AclSpec {
    pub name: String,
    pub action: String,
    pub cidr: String,
    pub priority: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListenerSpec {
    pub name: Option<String>,
    pub port: i64,
    pub protocol: String,
    pub backend_id: String,
    pub certificate_id: Option<String>,
}

/// Load balancer API
///
/// Every mutation returns once accepted: the load balancer goes through `updating`
/// before being `running` again.
#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    async fn get_load_balancer(&self, id: &str) -> ApiResult<LoadBalancer>;
    /// Returns the ID of the new load balancer
    async fn create_load_balancer(&self, request: LoadBalancerCreate) -> ApiResult<String>;
    async fn update_load_balancer(&self, id: &str, request: LoadBalancerUpdate)
        -> ApiResult<()>;
    async fn delete_load_balancer(&self, id: &str) -> ApiResult<()>;

    /// Returns the ID of the new health check
    async fn create_health_check(&self, lb_id: &str, request: HealthCheckSpec)
        -> ApiResult<String>;
    async fn update_health_check(
        &self,
        lb_id: &str,
        health_check_id: &str,
        request: HealthCheckSpec,
    ) -> ApiResult<()>;
    async fn delete_health_check(&self, lb_id: &str, health_check_id: &str) -> ApiResult<()>;

    /// Returns the ID of the new backend
    async fn create_backend(&self, lb_id: &str, request: BackendSpec) -> ApiResult<String>;
    async fn update_backend(
        &self,
        lb_id: &str,
        backend_id: &str,
        request: BackendUpdate,
    ) -> ApiResult<()>;
    async fn delete_backend(&self, lb_id: &str, backend_id: &str) -> ApiResult<()>;
    async fn replace_targets(
        &self,
        lb_id: &str,
        backend_id: &str,
        targets: Vec<Target>,
    ) -> ApiResult<()>;

    async fn update_acl(&self, lb_id: &str, acl_id: &str, request: AclSpec) -> ApiResult<()>;
    async fn replace_acls(&self, lb_id: &str, acls: Vec<AclSpec>) -> ApiResult<()>;

    async fn replace_listeners(&self, lb_id: &str, listeners: Vec<ListenerSpec>)
        -> ApiResult<()>;
}
