//! Changes between the planned and the current load balancer

use thiserror::Error;

use crate::{
    reconcile::{Changes, Identified, Matched, Reconcile},
    sdk,
    value::{changed, Value, ValueList},
};

use super::state::{entries, Acl, Backend, HealthCheck, Listener, State, Target};

/// A nested object references another one that does not exist
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("health check `{health_check}` used by backend `{backend}` does not exist")]
    HealthCheckNotFound {
        backend: String,
        health_check: String,
    },
    #[error("backend `{backend}` used by listener `{listener}` does not exist")]
    BackendNotFound { listener: String, backend: String },
    #[error("{kind} `{name}` does not exist on the load balancer")]
    Missing { kind: &'static str, name: String },
}

macro_rules! identified {
    ($($t:ident)*) => {
        $(
            impl Identified for $t<'_> {
                fn id(&self) -> Value<&str> {
                    self.id.as_deref()
                }
                fn name(&self) -> Value<&str> {
                    self.name.as_deref()
                }
            }
        )*
    };
}

identified!(Acl HealthCheck Backend);

impl Identified for Listener<'_> {
    fn id(&self) -> Value<&str> {
        self.id.as_deref()
    }
    fn name(&self) -> Value<&str> {
        self.name.as_deref()
    }
    /// `port/protocol`, a port accepts a single listener
    fn natural_key(&self) -> Option<String> {
        let port = self.port.as_option()?;
        match self.protocol.normalized() {
            Value::Value(protocol) => Some(format!("{}/{}", port, protocol)),
            Value::Null => Some(format!("{}/", port)),
            Value::Unknown => None,
        }
    }
}

macro_rules! remote_identified {
    ($($t:ident)*) => {
        $(
            impl Identified for sdk::$t {
                fn id(&self) -> Value<&str> {
                    Value::Value(self.id.as_str())
                }
                fn name(&self) -> Value<&str> {
                    Value::Value(self.name.as_str())
                }
            }
        )*
    };
}

remote_identified!(HealthCheck Backend Acl);

impl Reconcile for Acl<'_> {
    fn changed_from(&self, state: &Self) -> bool {
        changed(&self.name, &state.name)
            || changed(&self.action, &state.action)
            || changed(&self.cidr, &state.cidr)
            || changed(&self.priority, &state.priority)
            || changed(&self.description, &state.description)
    }
}

impl Reconcile for HealthCheck<'_> {
    fn changed_from(&self, state: &Self) -> bool {
        changed(&self.name, &state.name)
            || changed(&self.protocol, &state.protocol)
            || changed(&self.port, &state.port)
            || changed(&self.path, &state.path)
            || changed(&self.interval, &state.interval)
            || changed(&self.timeout, &state.timeout)
            || changed(&self.healthy_threshold, &state.healthy_threshold)
            || changed(&self.unhealthy_threshold, &state.unhealthy_threshold)
    }
}

impl Reconcile for Listener<'_> {
    fn changed_from(&self, state: &Self) -> bool {
        changed(&self.name, &state.name)
            || changed(&self.port, &state.port)
            || changed(&self.protocol, &state.protocol)
            || changed(&self.backend, &state.backend)
            || changed(&self.certificate_id, &state.certificate_id)
    }
}

impl Backend<'_> {
    /// Check if a scalar field of the backend changed
    pub fn fields_changed(&self, state: &Self) -> bool {
        changed(&self.name, &state.name)
            || changed(&self.panic_threshold, &state.panic_threshold)
            || changed(&self.close_connections, &state.close_connections)
            || changed(&self.health_check, &state.health_check)
    }

    /// Check if the kind of targets changed: the backend must then be recreated
    pub fn targets_type_changed(&self, state: &Self) -> bool {
        changed(&self.targets_type, &state.targets_type)
    }
}

impl Reconcile for Backend<'_> {
    fn changed_from(&self, state: &Self) -> bool {
        self.targets_type_changed(state)
            || self.fields_changed(state)
            || targets_changed(&self.targets, &state.targets)
    }
}

impl Target<'_> {
    fn has_unknown(&self) -> bool {
        self.nic_id.is_unknown() || self.ip_address.is_unknown() || self.port.is_unknown()
    }

    fn same_as(&self, state: &Self) -> bool {
        self.nic_id.normalized() == state.nic_id.normalized()
            && self.ip_address.normalized() == state.ip_address.normalized()
            && self.port.normalized() == state.port.normalized()
    }
}

/// Check if the targets of a backend changed
///
/// Targets are a set. Lists of different lengths are always changed.
/// Every known planned target must match a distinct state target.
/// Planned targets with an unknown field stand for the state targets left over.
pub fn targets_changed(plan: &ValueList<Target>, state: &ValueList<Target>) -> bool {
    if plan.is_unknown() || state.is_unknown() {
        return false;
    }
    let (plan, state) = (entries(plan), entries(state));
    if plan.len() != state.len() {
        return true;
    }
    let mut remaining = state.iter().collect::<Vec<_>>();
    for target in plan.iter().filter(|target| !target.has_unknown()) {
        match remaining.iter().position(|state| target.same_as(state)) {
            Some(i) => {
                remaining.swap_remove(i);
            }
            None => return true,
        }
    }
    false
}

/// Changes of the backends of a load balancer
#[derive(Debug)]
pub struct BackendChanges<'p, 'a> {
    pub added: Vec<&'p Backend<'a>>,
    pub removed: Vec<&'p Backend<'a>>,
    /// Backends whose `targets_type` changed, they are deleted and created again
    pub recreated: Vec<Matched<'p, 'p, Backend<'a>>>,
    /// Backends with a changed scalar field
    pub fields: Vec<Matched<'p, 'p, Backend<'a>>>,
    /// Backends with changed targets
    pub targets: Vec<Matched<'p, 'p, Backend<'a>>>,
}

impl<'p, 'a> BackendChanges<'p, 'a> {
    /// Compare planned backends with the state
    ///
    /// A backend may be listed both in `fields` and `targets`.
    /// A recreated backend is in neither of them.
    pub fn new(plan: &'p [Backend<'a>], state: &'p [Backend<'a>]) -> Self {
        let changes = Changes::new(plan, state);
        let mut recreated = Vec::new();
        let mut fields = Vec::new();
        let mut targets = Vec::new();
        for pair in changes.matched {
            if pair.plan.targets_type_changed(pair.state) {
                recreated.push(pair);
                continue;
            }
            if pair.plan.fields_changed(pair.state) {
                fields.push(pair);
            }
            if targets_changed(&pair.plan.targets, &pair.state.targets) {
                targets.push(pair);
            }
        }
        Self {
            added: changes.added,
            removed: changes.removed,
            recreated,
            fields,
            targets,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.recreated.is_empty()
            && self.fields.is_empty()
            && self.targets.is_empty()
    }
}

/// Planned backends with changed fields and planned backends with changed targets
pub fn reconcile_backends<'p, 'a>(
    plan: &'p [Backend<'a>],
    state: &'p [Backend<'a>],
) -> (Vec<&'p Backend<'a>>, Vec<&'p Backend<'a>>) {
    let changes = BackendChanges::new(plan, state);
    (
        changes.fields.iter().map(|pair| pair.plan).collect(),
        changes.targets.iter().map(|pair| pair.plan).collect(),
    )
}

/// Every change between a planned load balancer and its state
#[derive(Debug)]
pub struct LoadBalancerChanges<'p, 'a> {
    /// Name or description changed
    pub top_level: bool,
    pub health_checks: Changes<'p, 'p, HealthCheck<'a>>,
    pub backends: BackendChanges<'p, 'a>,
    pub acls: Changes<'p, 'p, Acl<'a>>,
    /// Listeners are replaced as a whole
    pub listeners: bool,
}

/// Entries of a planned list and of its state, nothing to compare if the plan is unknown
fn collections<'p, T>(plan: &'p ValueList<T>, state: &'p ValueList<T>) -> (&'p [T], &'p [T]) {
    if plan.is_unknown() {
        (Default::default(), Default::default())
    } else {
        (entries(plan), entries(state))
    }
}

impl<'p, 'a> LoadBalancerChanges<'p, 'a> {
    pub fn new(plan: &'p State<'a>, state: &'p State<'a>) -> Self {
        let (plan_listeners, state_listeners) = collections(&plan.listeners, &state.listeners);
        let listeners = Changes::new(plan_listeners, state_listeners);
        let listeners = listeners.membership_changed() || listeners.changed().next().is_some();

        let (plan_health_checks, state_health_checks) =
            collections(&plan.health_checks, &state.health_checks);
        let (plan_backends, state_backends) = collections(&plan.backends, &state.backends);
        let (plan_acls, state_acls) = collections(&plan.acls, &state.acls);

        Self {
            top_level: changed(&plan.name, &state.name)
                || changed(&plan.description, &state.description),
            health_checks: Changes::new(plan_health_checks, state_health_checks),
            backends: BackendChanges::new(plan_backends, state_backends),
            acls: Changes::new(plan_acls, state_acls),
            listeners,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.top_level
            && !self.listeners
            && !self.health_checks.membership_changed()
            && self.health_checks.changed().next().is_none()
            && self.backends.is_empty()
            && !self.acls.membership_changed()
            && self.acls.changed().next().is_none()
    }
}
