//! In-memory cloud used by the integration tests
//!
//! Every mutation is accepted immediately and the object goes through a transitional status:
//! the next `get` returns the transitional status, the following one the final status.
//! Deleted objects are reported as not found after one `deleting` read.

#![allow(dead_code)]

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::Value as Json;

use tf_provider_cloud::{
    sdk::{
        AclSpec, ApiError, ApiResult, Backend, BackendSpec, BackendUpdate, HealthCheck,
        HealthCheckSpec, Instance, InstanceApi, InstanceCreate, InstanceUpdate, Listener,
        ListenerSpec, LoadBalancer, LoadBalancerApi, LoadBalancerCreate, LoadBalancerUpdate, Page,
        PageRequest, Registry, RegistryApi, RegistryCreate, Snapshot, SnapshotApi, SnapshotCreate,
        Target, Volume, VolumeApi, VolumeCreate, VolumeUpdate,
    },
    Clients, CloudProvider, Diagnostics, DynamicResource, RawValue, Server,
};

/// Next observable change of an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Status(String),
    Gone,
}

pub fn status(status: &str) -> Step {
    Step::Status(status.to_owned())
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    pending: VecDeque<Step>,
}

trait HasStatus {
    fn set_status(&mut self, status: String);
}

macro_rules! has_status {
    ($($t:ty)*) => {
        $(impl HasStatus for $t {
            fn set_status(&mut self, status: String) {
                self.status = status;
            }
        })*
    };
}

has_status!(Volume Snapshot Instance LoadBalancer);

impl<T: HasStatus + Clone> Entry<T> {
    fn new(mut value: T, transitional: &str, terminal: &str) -> Self {
        value.set_status(transitional.to_owned());
        Self {
            value,
            pending: VecDeque::from([status(terminal)]),
        }
    }

    fn transition(&mut self, transitional: &str, terminal: &str) {
        self.value.set_status(transitional.to_owned());
        self.pending = VecDeque::from([status(terminal)]);
    }

    fn delete(&mut self, transitional: &str) {
        self.value.set_status(transitional.to_owned());
        self.pending = VecDeque::from([Step::Gone]);
    }
}

/// Read an object, then apply its next step
fn poll<T: HasStatus + Clone>(
    objects: &mut BTreeMap<String, Entry<T>>,
    kind: &str,
    id: &str,
) -> ApiResult<T> {
    let entry = objects
        .get_mut(id)
        .ok_or_else(|| ApiError::NotFound(format!("{} {}", kind, id)))?;
    let value = entry.value.clone();
    match entry.pending.pop_front() {
        Some(Step::Status(status)) => entry.value.set_status(status),
        Some(Step::Gone) => {
            objects.remove(id);
        }
        None => (),
    }
    Ok(value)
}

fn not_found(kind: &str, id: &str) -> ApiError {
    ApiError::NotFound(format!("{} {}", kind, id))
}

fn conflict(message: impl Into<String>) -> ApiError {
    ApiError::Api {
        status: 409,
        message: message.into(),
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u32,
    calls: Vec<String>,
    volumes: BTreeMap<String, Entry<Volume>>,
    snapshots: BTreeMap<String, Entry<Snapshot>>,
    instances: BTreeMap<String, Entry<Instance>>,
    registries: BTreeMap<String, Registry>,
    load_balancers: BTreeMap<String, Entry<LoadBalancer>>,
    page_requests: Vec<PageRequest>,
    /// Statuses of the next created object, after its transitional status
    next_creation: Option<Vec<Step>>,
}

impl Inner {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    /// Newly created object, following the scripted statuses if any
    fn created<T: HasStatus + Clone>(
        &mut self,
        value: T,
        transitional: &str,
        terminal: &str,
    ) -> Entry<T> {
        let mut entry = Entry::new(value, transitional, terminal);
        if let Some(steps) = self.next_creation.take() {
            entry.pending = steps.into();
        }
        entry
    }

    fn call(&mut self, call: impl Into<String>) {
        self.calls.push(call.into());
    }

    /// Running load balancer, ready to accept a change
    fn running(&mut self, id: &str) -> ApiResult<&mut Entry<LoadBalancer>> {
        let entry = self
            .load_balancers
            .get_mut(id)
            .ok_or_else(|| not_found("load balancer", id))?;
        if entry.value.status != "running" {
            return Err(conflict(format!(
                "load balancer {} is {}",
                id, entry.value.status
            )));
        }
        Ok(entry)
    }
}

/// Cloud API held in memory
#[derive(Debug, Default)]
pub struct FakeCloud {
    inner: Mutex<Inner>,
}

impl FakeCloud {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every mutating call, in order
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Mutating calls whose name starts with `prefix`
    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    pub fn page_requests(&self) -> Vec<PageRequest> {
        self.inner.lock().unwrap().page_requests.clone()
    }

    /// Statuses the next created object goes through after its transitional status
    pub fn script_next_creation(&self, steps: Vec<Step>) {
        self.inner.lock().unwrap().next_creation = Some(steps);
    }

    /// Replace the upcoming statuses of a volume
    pub fn script_volume(&self, id: &str, steps: Vec<Step>) {
        if let Some(entry) = self.inner.lock().unwrap().volumes.get_mut(id) {
            entry.pending = steps.into();
        }
    }

    /// Replace the upcoming statuses of a load balancer
    pub fn script_load_balancer(&self, id: &str, steps: Vec<Step>) {
        if let Some(entry) = self.inner.lock().unwrap().load_balancers.get_mut(id) {
            entry.pending = steps.into();
        }
    }

    pub fn add_volume(&self, name: &str, size_gib: i64) -> String {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.id("vol");
        let volume = Volume {
            id: id.clone(),
            name: Some(name.to_owned()),
            size_gib,
            volume_type: Some("ssd".into()),
            availability_zone: Some("zone-a".into()),
            status: "completed".into(),
            ..Default::default()
        };
        inner.volumes.insert(
            id.clone(),
            Entry {
                value: volume,
                pending: Default::default(),
            },
        );
        id
    }

    pub fn remove_volume(&self, id: &str) {
        self.inner.lock().unwrap().volumes.remove(id);
    }

    pub fn volume(&self, id: &str) -> Option<Volume> {
        let inner = self.inner.lock().unwrap();
        inner.volumes.get(id).map(|entry| entry.value.clone())
    }

    pub fn instance(&self, id: &str) -> Option<Instance> {
        let inner = self.inner.lock().unwrap();
        inner.instances.get(id).map(|entry| entry.value.clone())
    }

    pub fn registry(&self, id: &str) -> Option<Registry> {
        self.inner.lock().unwrap().registries.get(id).cloned()
    }

    pub fn load_balancer(&self, id: &str) -> Option<LoadBalancer> {
        let inner = self.inner.lock().unwrap();
        inner.load_balancers.get(id).map(|entry| entry.value.clone())
    }

    /// Change a load balancer behind the back of the provider
    pub fn edit_load_balancer(&self, id: &str, edit: impl FnOnce(&mut LoadBalancer)) {
        if let Some(entry) = self.inner.lock().unwrap().load_balancers.get_mut(id) {
            edit(&mut entry.value);
        }
    }
}

#[async_trait]
impl VolumeApi for FakeCloud {
    async fn get_volume(&self, id: &str) -> ApiResult<Volume> {
        poll(&mut self.inner.lock().unwrap().volumes, "volume", id)
    }

    async fn list_volumes(&self, request: PageRequest) -> ApiResult<Page<Volume>> {
        let mut inner = self.inner.lock().unwrap();
        inner.page_requests.push(request.clone());
        let start = request
            .page_token
            .as_deref()
            .map_or(Ok(0), str::parse::<usize>)
            .map_err(|err| ApiError::Api {
                status: 400,
                message: err.to_string(),
            })?;
        let size = request.page_size as usize;
        let items = inner
            .volumes
            .values()
            .skip(start)
            .take(size)
            .map(|entry| entry.value.clone())
            .collect::<Vec<_>>();
        let next = start + items.len();
        Ok(Page {
            next_page_token: (next < inner.volumes.len()).then(|| next.to_string()),
            items,
        })
    }

    async fn create_volume(&self, request: VolumeCreate) -> ApiResult<String> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.id("vol");
        inner.call(format!("create_volume {}", id));
        let volume = Volume {
            id: id.clone(),
            name: request.name,
            size_gib: request.size_gib,
            volume_type: Some(request.volume_type.unwrap_or_else(|| "standard".into())),
            availability_zone: Some(request.availability_zone),
            snapshot_id: request.snapshot_id,
            ..Default::default()
        };
        let entry = inner.created(volume, "creating", "completed");
        inner.volumes.insert(id.clone(), entry);
        Ok(id)
    }

    async fn update_volume(&self, id: &str, request: VolumeUpdate) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("update_volume {}", id));
        let entry = inner
            .volumes
            .get_mut(id)
            .ok_or_else(|| not_found("volume", id))?;
        if let Some(name) = request.name {
            entry.value.name = Some(name);
        }
        if let Some(size_gib) = request.size_gib {
            entry.value.size_gib = size_gib;
        }
        entry.transition("updating", "completed");
        Ok(())
    }

    async fn delete_volume(&self, id: &str) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("delete_volume {}", id));
        let entry = inner
            .volumes
            .get_mut(id)
            .ok_or_else(|| not_found("volume", id))?;
        entry.delete("deleting");
        Ok(())
    }
}

#[async_trait]
impl SnapshotApi for FakeCloud {
    async fn get_snapshot(&self, id: &str) -> ApiResult<Snapshot> {
        poll(&mut self.inner.lock().unwrap().snapshots, "snapshot", id)
    }

    async fn create_snapshot(&self, request: SnapshotCreate) -> ApiResult<String> {
        let mut inner = self.inner.lock().unwrap();
        let size_gib = inner
            .volumes
            .get(&request.volume_id)
            .map(|entry| entry.value.size_gib)
            .ok_or_else(|| not_found("volume", &request.volume_id))?;
        let id = inner.id("snap");
        inner.call(format!("create_snapshot {}", id));
        let snapshot = Snapshot {
            id: id.clone(),
            volume_id: request.volume_id,
            description: request.description,
            size_gib: Some(size_gib),
            ..Default::default()
        };
        let entry = inner.created(snapshot, "creating", "completed");
        inner.snapshots.insert(id.clone(), entry);
        Ok(id)
    }

    async fn delete_snapshot(&self, id: &str) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("delete_snapshot {}", id));
        let entry = inner
            .snapshots
            .get_mut(id)
            .ok_or_else(|| not_found("snapshot", id))?;
        entry.delete("deleting");
        Ok(())
    }
}

#[async_trait]
impl InstanceApi for FakeCloud {
    async fn get_instance(&self, id: &str) -> ApiResult<Instance> {
        poll(&mut self.inner.lock().unwrap().instances, "instance", id)
    }

    async fn create_instance(&self, request: InstanceCreate) -> ApiResult<String> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.id("i");
        inner.call(format!("create_instance {}", id));
        let instance = Instance {
            id: id.clone(),
            name: request.name,
            image_id: request.image_id,
            instance_type: request.instance_type,
            subnet_id: request.subnet_id,
            private_ip: Some(format!("10.0.0.{}", inner.next_id)),
            tags: request.tags,
            ..Default::default()
        };
        let entry = inner.created(instance, "creating", "completed");
        inner.instances.insert(id.clone(), entry);
        Ok(id)
    }

    async fn update_instance(&self, id: &str, request: InstanceUpdate) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("update_instance {}", id));
        let entry = inner
            .instances
            .get_mut(id)
            .ok_or_else(|| not_found("instance", id))?;
        if let Some(name) = request.name {
            entry.value.name = name;
        }
        if let Some(instance_type) = request.instance_type {
            entry.value.instance_type = instance_type;
        }
        if let Some(tags) = request.tags {
            entry.value.tags = tags;
        }
        entry.transition("updating", "completed");
        Ok(())
    }

    async fn delete_instance(&self, id: &str) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("delete_instance {}", id));
        let entry = inner
            .instances
            .get_mut(id)
            .ok_or_else(|| not_found("instance", id))?;
        entry.delete("deleting");
        Ok(())
    }
}

#[async_trait]
impl RegistryApi for FakeCloud {
    async fn get_registry(&self, id: &str) -> ApiResult<Registry> {
        let inner = self.inner.lock().unwrap();
        inner
            .registries
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("registry", id))
    }

    async fn create_registry(&self, request: RegistryCreate) -> ApiResult<Registry> {
        let mut inner = self.inner.lock().unwrap();
        if inner.registries.values().any(|r| r.name == request.name) {
            return Err(conflict(format!("registry {} already exists", request.name)));
        }
        let id = inner.id("reg");
        inner.call(format!("create_registry {}", id));
        let registry = Registry {
            id: id.clone(),
            endpoint: Some(format!("{}.registry.example.com", request.name)),
            name: request.name,
            public: request.public,
        };
        inner.registries.insert(id, registry.clone());
        Ok(registry)
    }

    async fn update_registry(&self, id: &str, public: bool) -> ApiResult<Registry> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("update_registry {}", id));
        let registry = inner
            .registries
            .get_mut(id)
            .ok_or_else(|| not_found("registry", id))?;
        registry.public = public;
        Ok(registry.clone())
    }

    async fn delete_registry(&self, id: &str) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("delete_registry {}", id));
        inner
            .registries
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("registry", id))
    }
}

fn health_check(id: String, spec: HealthCheckSpec) -> HealthCheck {
    HealthCheck {
        id,
        name: spec.name,
        protocol: spec.protocol,
        port: spec.port,
        path: spec.path,
        interval: spec.interval,
        timeout: spec.timeout,
        healthy_threshold: spec.healthy_threshold,
        unhealthy_threshold: spec.unhealthy_threshold,
    }
}

#[async_trait]
impl LoadBalancerApi for FakeCloud {
    async fn get_load_balancer(&self, id: &str) -> ApiResult<LoadBalancer> {
        poll(
            &mut self.inner.lock().unwrap().load_balancers,
            "load balancer",
            id,
        )
    }

    async fn create_load_balancer(&self, request: LoadBalancerCreate) -> ApiResult<String> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.id("lb");
        inner.call(format!("create_load_balancer {}", id));
        let lb = LoadBalancer {
            id: id.clone(),
            name: request.name,
            description: request.description,
            address: Some("203.0.113.10".into()),
            ..Default::default()
        };
        let entry = inner.created(lb, "creating", "running");
        inner.load_balancers.insert(id.clone(), entry);
        Ok(id)
    }

    async fn update_load_balancer(&self, id: &str, request: LoadBalancerUpdate) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("update_load_balancer {}", id));
        let entry = inner.running(id)?;
        if let Some(name) = request.name {
            entry.value.name = name;
        }
        entry.value.description = request.description;
        entry.transition("updating", "running");
        Ok(())
    }

    async fn delete_load_balancer(&self, id: &str) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("delete_load_balancer {}", id));
        let entry = inner
            .load_balancers
            .get_mut(id)
            .ok_or_else(|| not_found("load balancer", id))?;
        entry.delete("deleting");
        Ok(())
    }

    async fn create_health_check(&self, lb_id: &str, request: HealthCheckSpec) -> ApiResult<String> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.id("hc");
        inner.call(format!("create_health_check {}", request.name));
        let entry = inner.running(lb_id)?;
        entry.value.health_checks.push(health_check(id.clone(), request));
        entry.transition("updating", "running");
        Ok(id)
    }

    async fn update_health_check(
        &self,
        lb_id: &str,
        health_check_id: &str,
        request: HealthCheckSpec,
    ) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("update_health_check {}", health_check_id));
        let entry = inner.running(lb_id)?;
        let slot = entry
            .value
            .health_checks
            .iter_mut()
            .find(|hc| hc.id == health_check_id)
            .ok_or_else(|| not_found("health check", health_check_id))?;
        *slot = health_check(health_check_id.to_owned(), request);
        entry.transition("updating", "running");
        Ok(())
    }

    async fn delete_health_check(&self, lb_id: &str, health_check_id: &str) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("delete_health_check {}", health_check_id));
        let entry = inner.running(lb_id)?;
        if entry
            .value
            .backends
            .iter()
            .any(|backend| backend.health_check_id.as_deref() == Some(health_check_id))
        {
            return Err(conflict(format!("health check {} is in use", health_check_id)));
        }
        entry
            .value
            .health_checks
            .retain(|hc| hc.id != health_check_id);
        entry.transition("updating", "running");
        Ok(())
    }

    async fn create_backend(&self, lb_id: &str, request: BackendSpec) -> ApiResult<String> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.id("be");
        inner.call(format!("create_backend {}", request.name));
        let entry = inner.running(lb_id)?;
        if let Some(hc_id) = &request.health_check_id {
            if !entry.value.health_checks.iter().any(|hc| &hc.id == hc_id) {
                return Err(not_found("health check", hc_id));
            }
        }
        entry.value.backends.push(Backend {
            id: id.clone(),
            name: request.name,
            targets_type: request.targets_type,
            panic_threshold: request.panic_threshold,
            close_connections: request.close_connections,
            health_check_id: request.health_check_id,
            targets: request.targets,
        });
        entry.transition("updating", "running");
        Ok(id)
    }

    async fn update_backend(
        &self,
        lb_id: &str,
        backend_id: &str,
        request: BackendUpdate,
    ) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("update_backend {}", backend_id));
        let entry = inner.running(lb_id)?;
        if let Some(hc_id) = &request.health_check_id {
            if !entry.value.health_checks.iter().any(|hc| &hc.id == hc_id) {
                return Err(not_found("health check", hc_id));
            }
        }
        let backend = entry
            .value
            .backends
            .iter_mut()
            .find(|backend| backend.id == backend_id)
            .ok_or_else(|| not_found("backend", backend_id))?;
        backend.name = request.name;
        backend.panic_threshold = request.panic_threshold;
        backend.close_connections = request.close_connections;
        backend.health_check_id = request.health_check_id;
        entry.transition("updating", "running");
        Ok(())
    }

    async fn delete_backend(&self, lb_id: &str, backend_id: &str) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("delete_backend {}", backend_id));
        let entry = inner.running(lb_id)?;
        if entry
            .value
            .listeners
            .iter()
            .any(|listener| listener.backend_id == backend_id)
        {
            return Err(conflict(format!("backend {} is in use", backend_id)));
        }
        entry.value.backends.retain(|backend| backend.id != backend_id);
        entry.transition("updating", "running");
        Ok(())
    }

    async fn replace_targets(
        &self,
        lb_id: &str,
        backend_id: &str,
        targets: Vec<Target>,
    ) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("replace_targets {}", backend_id));
        let entry = inner.running(lb_id)?;
        let backend = entry
            .value
            .backends
            .iter_mut()
            .find(|backend| backend.id == backend_id)
            .ok_or_else(|| not_found("backend", backend_id))?;
        backend.targets = targets;
        entry.transition("updating", "running");
        Ok(())
    }

    async fn update_acl(&self, lb_id: &str, acl_id: &str, request: AclSpec) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call(format!("update_acl {}", acl_id));
        let entry = inner.running(lb_id)?;
        let acl = entry
            .value
            .acls
            .iter_mut()
            .find(|acl| acl.id == acl_id)
            .ok_or_else(|| not_found("ACL", acl_id))?;
        acl.name = request.name;
        acl.action = request.action;
        acl.cidr = request.cidr;
        acl.priority = request.priority;
        acl.description = request.description;
        entry.transition("updating", "running");
        Ok(())
    }

    async fn replace_acls(&self, lb_id: &str, acls: Vec<AclSpec>) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call("replace_acls");
        let ids = acls.iter().map(|_| inner.id("acl")).collect::<Vec<_>>();
        let entry = inner.running(lb_id)?;
        entry.value.acls = acls
            .into_iter()
            .zip(ids)
            .map(|(spec, id)| tf_provider_cloud::sdk::Acl {
                id,
                name: spec.name,
                action: spec.action,
                cidr: spec.cidr,
                priority: spec.priority,
                description: spec.description,
            })
            .collect();
        entry.transition("updating", "running");
        Ok(())
    }

    async fn replace_listeners(&self, lb_id: &str, listeners: Vec<ListenerSpec>) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.call("replace_listeners");
        let ids = listeners.iter().map(|_| inner.id("ls")).collect::<Vec<_>>();
        let entry = inner.running(lb_id)?;
        for listener in &listeners {
            if !entry
                .value
                .backends
                .iter()
                .any(|backend| backend.id == listener.backend_id)
            {
                return Err(not_found("backend", &listener.backend_id));
            }
        }
        entry.value.listeners = listeners
            .into_iter()
            .zip(ids)
            .map(|(spec, id)| Listener {
                id,
                name: spec.name,
                port: spec.port,
                protocol: spec.protocol,
                backend_id: spec.backend_id,
                certificate_id: spec.certificate_id,
            })
            .collect();
        entry.transition("updating", "running");
        Ok(())
    }
}

/// Server hosting a provider backed by `cloud`, configured with `config`
pub fn server(cloud: &Arc<FakeCloud>, config: Json) -> Server {
    let server = Server::new("cloud", CloudProvider::new(Clients::new(cloud.clone())));
    let mut diags = Diagnostics::default();
    server
        .configure_provider(&mut diags, "1.9.0".into(), raw(&config))
        .expect("provider configuration");
    assert!(diags.errors.is_empty(), "{:?}", diags);
    server
}

pub fn raw(json: &Json) -> RawValue {
    RawValue::json(json.to_string())
}

pub fn json(raw: &RawValue) -> Json {
    serde_json::from_slice(&raw.0).expect("valid JSON")
}

pub fn resource<'a>(server: &'a Server, name: &str) -> &'a dyn DynamicResource {
    let mut diags = Diagnostics::default();
    server
        .get_resource(&mut diags, name)
        .unwrap_or_else(|| panic!("resource {} exists: {:?}", name, diags))
}

/// Plan and apply the creation of a resource
pub async fn create(resource: &dyn DynamicResource, config: Json) -> Result<Json, Diagnostics> {
    let mut diags = Diagnostics::default();
    let Some(planned) = resource
        .plan_create(&mut diags, raw(&config), raw(&config))
        .await
    else {
        return Err(diags);
    };
    match resource.create(&mut diags, planned, raw(&config)).await {
        Some(state) if diags.errors.is_empty() => Ok(json(&state)),
        _ => Err(diags),
    }
}

/// Plan an update, returns the planned state and the replace triggers
pub async fn plan_update(
    resource: &dyn DynamicResource,
    prior: &Json,
    config: Json,
) -> Result<(Json, Vec<String>), Diagnostics> {
    let mut diags = Diagnostics::default();
    match resource
        .plan_update(&mut diags, raw(prior), raw(&config), raw(&config))
        .await
    {
        Some((planned, replace)) => Ok((
            json(&planned),
            replace.iter().map(ToString::to_string).collect(),
        )),
        None => Err(diags),
    }
}

/// Plan and apply an in-place update of a resource
pub async fn update(
    resource: &dyn DynamicResource,
    prior: &Json,
    config: Json,
) -> Result<Json, Diagnostics> {
    let (planned, replace) = plan_update(resource, prior, config.clone()).await?;
    assert!(replace.is_empty(), "unexpected replacement: {:?}", replace);
    let mut diags = Diagnostics::default();
    match resource
        .update(&mut diags, raw(prior), raw(&planned), raw(&config))
        .await
    {
        Some(state) if diags.errors.is_empty() => Ok(json(&state)),
        _ => Err(diags),
    }
}

pub async fn read(resource: &dyn DynamicResource, state: &Json) -> Result<Json, Diagnostics> {
    let mut diags = Diagnostics::default();
    match resource.read(&mut diags, raw(state)).await {
        Some(state) => Ok(json(&state)),
        None => Err(diags),
    }
}

pub async fn destroy(resource: &dyn DynamicResource, state: &Json) -> Result<(), Diagnostics> {
    let mut diags = Diagnostics::default();
    match resource.destroy(&mut diags, raw(state)).await {
        Some(()) => Ok(()),
        None => Err(diags),
    }
}

pub async fn validate(resource: &dyn DynamicResource, config: Json) -> Diagnostics {
    let mut diags = Diagnostics::default();
    resource.validate(&mut diags, raw(&config)).await;
    diags
}
