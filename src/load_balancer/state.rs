use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::{
    sdk,
    value::{Value, ValueBool, ValueFloat, ValueList, ValueNumber, ValueString},
};

pub const TARGETS_INSTANCE: &str = "instance";
pub const TARGETS_RAW: &str = "raw";

const DEFAULT_HEALTH_CHECK_INTERVAL: i64 = 10;
const DEFAULT_HEALTH_CHECK_TIMEOUT: i64 = 5;
const DEFAULT_HEALTHY_THRESHOLD: i64 = 3;
const DEFAULT_UNHEALTHY_THRESHOLD: i64 = 3;

/// State of a `cloud_load_balancer`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct State<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub address: ValueString<'a>,
    pub status: ValueString<'a>,
    pub listeners: ValueList<Listener<'a>>,
    pub acls: ValueList<Acl<'a>>,
    pub health_checks: ValueList<HealthCheck<'a>>,
    pub backends: ValueList<Backend<'a>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Listener<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub port: ValueNumber,
    pub protocol: ValueString<'a>,
    /// Name of the backend receiving the traffic
    pub backend: ValueString<'a>,
    pub certificate_id: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Acl<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub action: ValueString<'a>,
    pub cidr: ValueString<'a>,
    pub priority: ValueNumber,
    pub description: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheck<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub protocol: ValueString<'a>,
    pub port: ValueNumber,
    pub path: ValueString<'a>,
    pub interval: ValueNumber,
    pub timeout: ValueNumber,
    pub healthy_threshold: ValueNumber,
    pub unhealthy_threshold: ValueNumber,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Backend<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub targets_type: ValueString<'a>,
    pub panic_threshold: ValueFloat,
    pub close_connections: ValueBool,
    /// Name of the health check of the backend
    pub health_check: ValueString<'a>,
    pub targets: ValueList<Target<'a>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Target<'a> {
    pub nic_id: ValueString<'a>,
    pub ip_address: ValueString<'a>,
    pub port: ValueNumber,
}

fn owned<'a>(s: &str) -> ValueString<'a> {
    Value::Value(Cow::Owned(s.to_owned()))
}

fn owned_option<'a>(s: &Option<String>) -> ValueString<'a> {
    s.clone().into()
}

fn default_number(value: &mut ValueNumber, default: i64) {
    if value.is_null() {
        *value = Value::Value(default);
    }
}

fn default_list<T>(list: &mut ValueList<T>) {
    if list.is_null() {
        *list = Value::Value(Vec::new());
    }
}

/// Entries of a list attribute, empty if null or unknown
pub(crate) fn entries<T>(list: &ValueList<T>) -> &[T] {
    list.as_deref().unwrap_or_default()
}

impl<'a> State<'a> {
    /// Build the state from the remote load balancer
    ///
    /// References between nested objects are IDs remotely and names in the state.
    pub fn from_remote(lb: &sdk::LoadBalancer) -> Self {
        let health_check_name = |id: &Option<String>| -> ValueString<'a> {
            id.as_deref()
                .and_then(|id| lb.health_checks.iter().find(|hc| hc.id == id))
                .map_or(Value::Null, |hc| owned(&hc.name))
        };
        let backend_name = |id: &str| -> ValueString<'a> {
            lb.backends
                .iter()
                .find(|backend| backend.id == id)
                .map_or(Value::Null, |backend| owned(&backend.name))
        };

        Self {
            id: owned(&lb.id),
            name: owned(&lb.name),
            description: owned_option(&lb.description),
            address: owned_option(&lb.address),
            status: owned(&lb.status),
            listeners: Value::Value(
                lb.listeners
                    .iter()
                    .map(|listener| Listener {
                        id: owned(&listener.id),
                        name: owned_option(&listener.name),
                        port: Value::Value(listener.port),
                        protocol: owned(&listener.protocol),
                        backend: backend_name(&listener.backend_id),
                        certificate_id: owned_option(&listener.certificate_id),
                    })
                    .collect(),
            ),
            acls: Value::Value(lb.acls.iter().map(Acl::from_remote).collect()),
            health_checks: Value::Value(
                lb.health_checks
                    .iter()
                    .map(HealthCheck::from_remote)
                    .collect(),
            ),
            backends: Value::Value(
                lb.backends
                    .iter()
                    .map(|backend| Backend {
                        id: owned(&backend.id),
                        name: owned(&backend.name),
                        targets_type: owned(&backend.targets_type),
                        panic_threshold: backend.panic_threshold.into(),
                        close_connections: Value::Value(backend.close_connections),
                        health_check: health_check_name(&backend.health_check_id),
                        targets: Value::Value(
                            backend.targets.iter().map(Target::from_remote).collect(),
                        ),
                    })
                    .collect(),
            ),
        }
    }

    /// Fill the optional attributes with their default value
    pub fn normalize(&mut self) {
        if let Value::Value(health_checks) = &mut self.health_checks {
            for health_check in health_checks {
                default_number(&mut health_check.interval, DEFAULT_HEALTH_CHECK_INTERVAL);
                default_number(&mut health_check.timeout, DEFAULT_HEALTH_CHECK_TIMEOUT);
                default_number(&mut health_check.healthy_threshold, DEFAULT_HEALTHY_THRESHOLD);
                default_number(
                    &mut health_check.unhealthy_threshold,
                    DEFAULT_UNHEALTHY_THRESHOLD,
                );
            }
        }
        if let Value::Value(backends) = &mut self.backends {
            for backend in backends {
                if backend.targets_type.is_null() {
                    backend.targets_type = Value::Value(Cow::Borrowed(TARGETS_INSTANCE));
                }
                if backend.close_connections.is_null() {
                    backend.close_connections = Value::Value(false);
                }
                default_list(&mut backend.targets);
            }
        }
        default_list(&mut self.listeners);
        default_list(&mut self.acls);
        default_list(&mut self.health_checks);
        default_list(&mut self.backends);
    }
}

impl<'a> Acl<'a> {
    pub fn from_remote(acl: &sdk::Acl) -> Self {
        Self {
            id: owned(&acl.id),
            name: owned(&acl.name),
            action: owned(&acl.action),
            cidr: owned(&acl.cidr),
            priority: Value::Value(acl.priority),
            description: owned_option(&acl.description),
        }
    }

    pub fn to_spec(&self) -> sdk::AclSpec {
        sdk::AclSpec {
            name: self.name.as_str().to_owned(),
            action: self.action.as_str().to_owned(),
            cidr: self.cidr.as_str().to_owned(),
            priority: self.priority.unwrap_or_default(),
            description: self.description.to_option(),
        }
    }
}

impl<'a> HealthCheck<'a> {
    pub fn from_remote(health_check: &sdk::HealthCheck) -> Self {
        Self {
            id: owned(&health_check.id),
            name: owned(&health_check.name),
            protocol: owned(&health_check.protocol),
            port: Value::Value(health_check.port),
            path: owned_option(&health_check.path),
            interval: Value::Value(health_check.interval),
            timeout: Value::Value(health_check.timeout),
            healthy_threshold: Value::Value(health_check.healthy_threshold),
            unhealthy_threshold: Value::Value(health_check.unhealthy_threshold),
        }
    }

    pub fn to_spec(&self) -> sdk::HealthCheckSpec {
        sdk::HealthCheckSpec {
            name: self.name.as_str().to_owned(),
            protocol: self.protocol.as_str().to_owned(),
            port: self.port.unwrap_or_default(),
            path: self.path.to_option(),
            interval: self.interval.unwrap_or(DEFAULT_HEALTH_CHECK_INTERVAL),
            timeout: self.timeout.unwrap_or(DEFAULT_HEALTH_CHECK_TIMEOUT),
            healthy_threshold: self.healthy_threshold.unwrap_or(DEFAULT_HEALTHY_THRESHOLD),
            unhealthy_threshold: self
                .unhealthy_threshold
                .unwrap_or(DEFAULT_UNHEALTHY_THRESHOLD),
        }
    }
}

impl<'a> Backend<'a> {
    /// Creation payload, `health_check_id` is the remote ID of the referenced health check
    pub fn to_spec(&self, health_check_id: Option<String>) -> sdk::BackendSpec {
        sdk::BackendSpec {
            name: self.name.as_str().to_owned(),
            targets_type: match self.targets_type.as_str() {
                "" => TARGETS_INSTANCE.to_owned(),
                targets_type => targets_type.to_owned(),
            },
            panic_threshold: self.panic_threshold.as_option(),
            close_connections: self.close_connections.unwrap_or_default(),
            health_check_id,
            targets: self.remote_targets(),
        }
    }

    pub fn to_update(&self, health_check_id: Option<String>) -> sdk::BackendUpdate {
        sdk::BackendUpdate {
            name: self.name.as_str().to_owned(),
            panic_threshold: self.panic_threshold.as_option(),
            close_connections: self.close_connections.unwrap_or_default(),
            health_check_id,
        }
    }

    pub fn remote_targets(&self) -> Vec<sdk::Target> {
        entries(&self.targets).iter().map(Target::to_remote).collect()
    }
}

impl<'a> Target<'a> {
    pub fn from_remote(target: &sdk::Target) -> Self {
        Self {
            nic_id: owned_option(&target.nic_id),
            ip_address: owned_option(&target.ip_address),
            port: Value::Value(target.port),
        }
    }

    pub fn to_remote(&self) -> sdk::Target {
        sdk::Target {
            nic_id: self.nic_id.to_option(),
            ip_address: self.ip_address.to_option(),
            port: self.port.unwrap_or_default(),
        }
    }
}

impl<'a> Listener<'a> {
    /// Payload of the listener, `backend_id` is the remote ID of the referenced backend
    pub fn to_spec(&self, backend_id: String) -> sdk::ListenerSpec {
        sdk::ListenerSpec {
            name: self.name.to_option(),
            port: self.port.unwrap_or_default(),
            protocol: self.protocol.as_str().to_owned(),
            backend_id,
            certificate_id: self.certificate_id.to_option(),
        }
    }
}
