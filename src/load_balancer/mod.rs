//! `cloud_load_balancer` resource
//!
//! A load balancer owns nested collections (listeners, ACL rules, health checks, backends).
//! Each collection is reconciled against the state entry by entry, see [`diff`],
//! and the resulting calls are applied in dependency order, see [`update`].

use std::{borrow::Cow, collections::HashSet, sync::Arc};

use async_trait::async_trait;
use tracing::info;

use crate::{
    attribute_path::AttributePath,
    config::ProviderContext,
    diagnostics::Diagnostics,
    reconcile::{IdentityIndex, Identified},
    resource::Resource,
    sdk::{LoadBalancerApi, LoadBalancerCreate, LoadBalancerStatus},
    utils::StepDiagnostics,
    value::{Value, ValueList, ValueString},
    wait::{absent_when_not_found, wait_until_status, WaitConfig},
};

pub mod diff;
pub mod state;
pub mod update;

pub use diff::{reconcile_backends, targets_changed, LoadBalancerChanges, ReconcileError};
pub use state::{Acl, Backend, HealthCheck, Listener, State, Target, TARGETS_INSTANCE, TARGETS_RAW};
pub use update::UpdateError;

use state::entries;
use update::Updater;

pub struct LoadBalancerResource {
    context: Arc<ProviderContext>,
    api: Arc<dyn LoadBalancerApi>,
}

impl LoadBalancerResource {
    pub fn new(context: Arc<ProviderContext>, api: Arc<dyn LoadBalancerApi>) -> Self {
        Self { context, api }
    }

    fn wait_config(&self) -> WaitConfig {
        let settings = self.context.settings();
        settings.wait_config(settings.timeouts.load_balancer)
    }
}

/// Report entries sharing the same name, or unnamed entries sharing the same natural key
fn check_unique_names<T: Identified>(diags: &mut Diagnostics, attribute: &'static str, list: &[T]) {
    let mut seen = HashSet::new();
    let mut seen_keys = HashSet::new();
    for (i, entry) in list.iter().enumerate() {
        match entry.name() {
            Value::Value(name) if !name.is_empty() => {
                if !seen.insert(name) {
                    diags.error(
                        "Duplicate name",
                        format!("`{}` is used by several {}", name, attribute),
                        AttributePath::new(attribute).index(i).attribute("name"),
                    );
                }
            }
            Value::Unknown => (),
            _ => match entry.natural_key() {
                Some(key) if !seen_keys.insert(key.clone()) => diags.error(
                    "Duplicate entry",
                    format!("several unnamed {} are defined for `{}`", attribute, key),
                    AttributePath::new(attribute).index(i),
                ),
                _ => (),
            },
        }
    }
}

/// Names defined by a collection, `None` if the collection is unknown
fn known_names<T: Identified>(list: &ValueList<T>) -> Option<HashSet<&str>> {
    match list {
        Value::Unknown => None,
        list => Some(
            entries(list)
                .iter()
                .filter_map(|entry| entry.name().as_option())
                .collect(),
        ),
    }
}

fn validate_backend(diags: &mut Diagnostics, i: usize, backend: &Backend) {
    let path = AttributePath::new("backends").index(i);
    if let Value::Value(threshold) = backend.panic_threshold {
        if !(0.0..=1.0).contains(&threshold) {
            diags.error(
                "Invalid panic threshold",
                format!("panic_threshold must be between 0 and 1, got {}", threshold),
                path.clone().attribute("panic_threshold"),
            );
        }
    }

    let targets_type = match backend.targets_type.as_deref() {
        Value::Value(targets_type) if targets_type.is_empty() => TARGETS_INSTANCE,
        Value::Value(targets_type) => targets_type,
        Value::Null => TARGETS_INSTANCE,
        Value::Unknown => return,
    };
    if targets_type != TARGETS_INSTANCE && targets_type != TARGETS_RAW {
        diags.error(
            "Invalid targets type",
            format!(
                "targets_type must be `{}` or `{}`, got `{}`",
                TARGETS_INSTANCE, TARGETS_RAW, targets_type
            ),
            path.attribute("targets_type"),
        );
        return;
    }

    for (j, target) in entries(&backend.targets).iter().enumerate() {
        let path = path.clone().attribute("targets").index(j);
        let (required, forbidden) = if targets_type == TARGETS_INSTANCE {
            (("nic_id", &target.nic_id), ("ip_address", &target.ip_address))
        } else {
            (("ip_address", &target.ip_address), ("nic_id", &target.nic_id))
        };
        if required.1.is_null() {
            diags.error(
                "Invalid target",
                format!("{} targets need a {}", targets_type, required.0),
                path.clone().attribute(required.0),
            );
        }
        if forbidden.1.is_value() {
            diags.error(
                "Invalid target",
                format!("{} targets cannot have a {}", targets_type, forbidden.0),
                path.attribute(forbidden.0),
            );
        }
    }
}

/// Give planned entries the ID of their state counterpart, unknown for new entries
fn carry_ids<'a, T: Identified>(
    plan: &mut ValueList<T>,
    state: &ValueList<T>,
    set_id: impl Fn(&mut T, ValueString<'a>),
) {
    let Value::Value(plan) = plan else {
        return;
    };
    let index = IdentityIndex::new(entries(state));
    let ids = plan
        .iter()
        .map(|entry| match index.find(entry).map(|found| found.id()) {
            Some(id) if id.is_present() => id.map(|id| Cow::Owned(id.to_owned())),
            _ => Value::Unknown,
        })
        .collect::<Vec<_>>();
    for (entry, id) in plan.iter_mut().zip(ids) {
        set_id(entry, id);
    }
}

#[async_trait]
impl Resource for LoadBalancerResource {
    type State<'a> = State<'a>;

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if config.name.is_null() {
            diags.error_short("Missing load balancer name", AttributePath::new("name"));
        }

        check_unique_names(diags, "health_checks", entries(&config.health_checks));
        check_unique_names(diags, "backends", entries(&config.backends));
        check_unique_names(diags, "acls", entries(&config.acls));
        check_unique_names(diags, "listeners", entries(&config.listeners));

        let health_checks = known_names(&config.health_checks);
        for (i, backend) in entries(&config.backends).iter().enumerate() {
            validate_backend(diags, i, backend);
            if let (Some(health_checks), Value::Value(name)) =
                (&health_checks, backend.health_check.as_deref())
            {
                if !name.is_empty() && !health_checks.contains(name) {
                    diags.error(
                        "Unknown health check",
                        format!("health check `{}` is not defined", name),
                        AttributePath::new("backends").index(i).attribute("health_check"),
                    );
                }
            }
        }

        let backends = known_names(&config.backends);
        for (i, listener) in entries(&config.listeners).iter().enumerate() {
            match (&backends, listener.backend.as_deref()) {
                (_, Value::Null) => diags.error_short(
                    "Missing listener backend",
                    AttributePath::new("listeners").index(i).attribute("backend"),
                ),
                (Some(backends), Value::Value(name)) if !backends.contains(name) => diags.error(
                    "Unknown backend",
                    format!("backend `{}` is not defined", name),
                    AttributePath::new("listeners").index(i).attribute("backend"),
                ),
                _ => (),
            }
        }

        if diags.has_errors() {
            None
        } else {
            Some(())
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
    ) -> Option<Value<Self::State<'a>>> {
        let Some(id) = state.id.to_option() else {
            return Some(Value::Null);
        };
        match self.api.get_load_balancer(&id).await {
            Ok(lb) => Some(Value::Value(State::from_remote(&lb))),
            Err(err) if err.is_not_found() => {
                info!(%id, "load balancer is gone");
                Some(Value::Null)
            }
            Err(err) => {
                diags.root_error("Could not read load balancer", err.to_string());
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
    ) -> Option<Self::State<'a>> {
        let mut state = proposed_state;
        state.normalize();
        state.id = Value::Unknown;
        state.address = Value::Unknown;
        state.status = Value::Unknown;
        carry_ids(&mut state.listeners, &Value::Null, |e, id| e.id = id);
        carry_ids(&mut state.acls, &Value::Null, |e, id| e.id = id);
        carry_ids(&mut state.health_checks, &Value::Null, |e, id| e.id = id);
        carry_ids(&mut state.backends, &Value::Null, |e, id| e.id = id);
        Some(state)
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
    ) -> Option<(Self::State<'a>, Vec<AttributePath>)> {
        let mut state = proposed_state;
        state.normalize();
        state.id = prior_state.id.clone();
        state.address = prior_state.address.clone();
        state.status = prior_state.status.clone();

        carry_ids(&mut state.listeners, &prior_state.listeners, |e, id| e.id = id);
        carry_ids(&mut state.acls, &prior_state.acls, |e, id| e.id = id);
        carry_ids(&mut state.health_checks, &prior_state.health_checks, |e, id| {
            e.id = id
        });
        carry_ids(&mut state.backends, &prior_state.backends, |e, id| e.id = id);

        // Recreated backends get a new ID
        if let Value::Value(backends) = &mut state.backends {
            let index = IdentityIndex::new(entries(&prior_state.backends));
            for backend in backends {
                if index
                    .find(&*backend)
                    .is_some_and(|prior| backend.targets_type_changed(prior))
                {
                    backend.id = Value::Unknown;
                }
            }
        }

        Some((state, vec![]))
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
    ) -> Option<Self::State<'a>> {
        let request = LoadBalancerCreate {
            name: planned_state.name.as_str().to_owned(),
            description: planned_state.description.to_option(),
        };
        let id = self
            .api
            .create_load_balancer(request)
            .await
            .step_diagnostics(diags, "Could not create load balancer")?;
        info!(%id, "load balancer created");

        let cancellation = self.context.cancellation();
        let mut updater = Updater::start(self.api.as_ref(), self.wait_config(), &cancellation, id)
            .await
            .step_diagnostics(diags, "Load balancer did not start")?;
        let created = State::from_remote(updater.current());
        updater
            .apply(&planned_state, &created)
            .await
            .step_diagnostics(diags, "Could not configure load balancer")?;
        Some(State::from_remote(updater.current()))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
    ) -> Option<Self::State<'a>> {
        let id = prior_state.id.as_str().to_owned();
        let cancellation = self.context.cancellation();
        let mut updater = Updater::start(self.api.as_ref(), self.wait_config(), &cancellation, id)
            .await
            .step_diagnostics(diags, "Load balancer is not running")?;
        updater
            .apply(&planned_state, &prior_state)
            .await
            .step_diagnostics(diags, "Could not update load balancer")?;
        Some(State::from_remote(updater.current()))
    }

    async fn destroy<'a>(&self, diags: &mut Diagnostics, prior_state: Self::State<'a>) -> Option<()> {
        let id = prior_state.id.as_str();
        match self.api.delete_load_balancer(id).await {
            Err(err) if err.is_not_found() => return Some(()),
            result => result.step_diagnostics(diags, "Could not delete load balancer")?,
        }
        info!(id, "load balancer deletion requested");

        let api = self.api.as_ref();
        let result = wait_until_status(
            id,
            LoadBalancerStatus::Deleted,
            &self.wait_config(),
            &self.context.cancellation(),
            || api.get_load_balancer(id),
        )
        .await;
        absent_when_not_found(result).step_diagnostics(diags, "Load balancer was not deleted")?;
        Some(())
    }

    async fn import<'a>(&self, diags: &mut Diagnostics, id: String) -> Option<Self::State<'a>> {
        let lb = self
            .api
            .get_load_balancer(&id)
            .await
            .step_diagnostics(diags, "Could not import load balancer")?;
        Some(State::from_remote(&lb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(
        name: &'static str,
        targets_type: &'static str,
        targets: Vec<Target<'static>>,
    ) -> Backend<'static> {
        Backend {
            name: name.into(),
            targets_type: targets_type.into(),
            targets: Value::Value(targets),
            ..Default::default()
        }
    }

    fn nic(id: &'static str) -> Target<'static> {
        Target {
            nic_id: id.into(),
            port: Value::Value(80),
            ..Default::default()
        }
    }

    fn ip(address: &'static str) -> Target<'static> {
        Target {
            ip_address: address.into(),
            port: Value::Value(80),
            ..Default::default()
        }
    }

    #[test]
    fn targets_must_match_their_type() {
        let mut diags = Diagnostics::default();
        validate_backend(&mut diags, 0, &backend("web", TARGETS_INSTANCE, vec![nic("nic-1")]));
        validate_backend(&mut diags, 1, &backend("raw", TARGETS_RAW, vec![ip("10.0.0.1")]));
        assert!(!diags.has_errors());

        validate_backend(&mut diags, 2, &backend("bad", TARGETS_RAW, vec![nic("nic-1")]));
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn panic_threshold_is_a_ratio() {
        let mut diags = Diagnostics::default();
        let mut web = backend("web", TARGETS_INSTANCE, vec![]);
        web.panic_threshold = Value::Value(0.5);
        validate_backend(&mut diags, 0, &web);
        assert!(!diags.has_errors());

        web.panic_threshold = Value::Value(1.5);
        validate_backend(&mut diags, 0, &web);
        assert!(diags.has_errors());
    }

    #[test]
    fn duplicate_names() {
        let mut diags = Diagnostics::default();
        let backends = [
            backend("web", TARGETS_INSTANCE, vec![]),
            backend("api", TARGETS_INSTANCE, vec![]),
            backend("web", TARGETS_RAW, vec![]),
        ];
        check_unique_names(&mut diags, "backends", &backends);
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].attribute.to_string(), "backends[2].name");
    }

    #[test]
    fn ids_are_carried_by_name() {
        let prior: ValueList<Backend> = Value::Value(vec![Backend {
            id: "b-1".into(),
            ..backend("web", TARGETS_INSTANCE, vec![])
        }]);
        let mut plan: ValueList<Backend> = Value::Value(vec![
            backend("web", TARGETS_INSTANCE, vec![]),
            backend("api", TARGETS_INSTANCE, vec![]),
        ]);
        carry_ids(&mut plan, &prior, |e, id| e.id = id);
        let plan = entries(&plan);
        assert_eq!(plan[0].id, Value::Value(Cow::Borrowed("b-1")));
        assert_eq!(plan[1].id, Value::Unknown);
    }
}
