//! Apply the changes of a load balancer, one remote call at a time
//!
//! Every mutation is followed by a wait until the load balancer is `running` again.
//! The first failure stops the update: previous calls are not rolled back,
//! the next refresh compares the plan with what was actually applied.

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    reconcile::{IdentityIndex, Identified},
    sdk::{self, ApiError, LoadBalancer, LoadBalancerApi, LoadBalancerStatus},
    wait::{wait_until_status, WaitConfig, WaitError},
};

use super::{
    diff::{LoadBalancerChanges, ReconcileError},
    state::{entries, Acl, Backend, HealthCheck, State},
};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Wait(#[from] WaitError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Remote ID of the object matching `entry`
fn remote_id<R: Identified>(
    remote: &[R],
    kind: &'static str,
    entry: &impl Identified,
) -> Result<String, ReconcileError> {
    IdentityIndex::new(remote)
        .find(entry)
        .and_then(|found| found.id().as_option())
        .map(str::to_owned)
        .ok_or_else(|| ReconcileError::Missing {
            kind,
            name: entry.name().unwrap_or_default().to_owned(),
        })
}

pub(crate) struct Updater<'c> {
    api: &'c dyn LoadBalancerApi,
    wait: WaitConfig,
    cancellation: &'c CancellationToken,
    id: String,
    /// Latest version of the remote load balancer
    current: LoadBalancer,
}

impl<'c> Updater<'c> {
    /// Wait for the load balancer to be `running` before changing it
    pub async fn start(
        api: &'c dyn LoadBalancerApi,
        wait: WaitConfig,
        cancellation: &'c CancellationToken,
        id: String,
    ) -> Result<Updater<'c>, UpdateError> {
        let mut updater = Self {
            api,
            wait,
            cancellation,
            id,
            current: Default::default(),
        };
        updater.converge().await?;
        Ok(updater)
    }

    /// Latest version of the remote load balancer
    pub fn current(&self) -> &LoadBalancer {
        &self.current
    }

    async fn converge(&mut self) -> Result<(), UpdateError> {
        let api = self.api;
        let id = self.id.as_str();
        self.current = wait_until_status(
            id,
            LoadBalancerStatus::Running,
            &self.wait,
            self.cancellation,
            || api.get_load_balancer(id),
        )
        .await?;
        Ok(())
    }

    fn health_check_id(&self, backend: &Backend) -> Result<Option<String>, ReconcileError> {
        let Some(name) = backend.health_check.to_option() else {
            return Ok(None);
        };
        match IdentityIndex::new(&self.current.health_checks).by_name(&name) {
            Some(health_check) => Ok(Some(health_check.id.clone())),
            None => Err(ReconcileError::HealthCheckNotFound {
                backend: backend.name.as_str().to_owned(),
                health_check: name,
            }),
        }
    }

    fn remote_health_check(&self, entry: &HealthCheck) -> Result<String, ReconcileError> {
        remote_id(&self.current.health_checks, "health check", entry)
    }

    fn remote_backend(&self, entry: &Backend) -> Result<String, ReconcileError> {
        remote_id(&self.current.backends, "backend", entry)
    }

    fn remote_acl(&self, entry: &Acl) -> Result<String, ReconcileError> {
        remote_id(&self.current.acls, "ACL", entry)
    }

    /// Listeners of the plan, pointing to the remote backends
    fn listener_specs(&self, plan: &State) -> Result<Vec<sdk::ListenerSpec>, ReconcileError> {
        let backends = IdentityIndex::new(&self.current.backends);
        entries(&plan.listeners)
            .iter()
            .map(|listener| match backends.by_name(listener.backend.as_str()) {
                Some(backend) => Ok(listener.to_spec(backend.id.clone())),
                None => Err(ReconcileError::BackendNotFound {
                    listener: listener.name.as_str().to_owned(),
                    backend: listener.backend.as_str().to_owned(),
                }),
            })
            .collect()
    }

    /// Apply every change between `plan` and `state`
    ///
    /// Order of the remote calls:
    /// 1. name and description
    /// 2. new health checks, then changed health checks
    /// 3. backends whose kind of targets changed are deleted and created again
    /// 4. new backends, then backends with changed fields
    /// 5. targets of the backends
    /// 6. ACLs
    /// 7. listeners
    /// 8. removed backends, then removed health checks
    ///
    /// Health checks exist before backends use them, and backends exist before listeners use them.
    pub async fn apply(&mut self, plan: &State<'_>, state: &State<'_>) -> Result<(), UpdateError> {
        let changes = LoadBalancerChanges::new(plan, state);
        if changes.is_empty() {
            return Ok(());
        }
        let api = self.api;
        let id = self.id.clone();
        let id = id.as_str();

        if changes.top_level {
            info!(id, "updating load balancer");
            api.update_load_balancer(
                id,
                sdk::LoadBalancerUpdate {
                    name: plan.name.to_option(),
                    description: plan.description.to_option(),
                },
            )
            .await?;
            self.converge().await?;
        }

        for health_check in &changes.health_checks.added {
            info!(id, name = health_check.name.as_str(), "creating health check");
            api.create_health_check(id, health_check.to_spec()).await?;
            self.converge().await?;
        }
        for pair in changes.health_checks.changed() {
            let health_check_id = self.remote_health_check(pair.state)?;
            info!(id, %health_check_id, "updating health check");
            api.update_health_check(id, &health_check_id, pair.plan.to_spec())
                .await?;
            self.converge().await?;
        }

        for pair in &changes.backends.recreated {
            let backend_id = self.remote_backend(pair.state)?;
            info!(id, %backend_id, "recreating backend with new targets type");
            api.delete_backend(id, &backend_id).await?;
            self.converge().await?;
            let spec = pair.plan.to_spec(self.health_check_id(pair.plan)?);
            api.create_backend(id, spec).await?;
            self.converge().await?;
        }
        for backend in &changes.backends.added {
            info!(id, name = backend.name.as_str(), "creating backend");
            let spec = backend.to_spec(self.health_check_id(backend)?);
            api.create_backend(id, spec).await?;
            self.converge().await?;
        }
        for pair in &changes.backends.fields {
            let backend_id = self.remote_backend(pair.state)?;
            info!(id, %backend_id, "updating backend");
            let update = pair.plan.to_update(self.health_check_id(pair.plan)?);
            api.update_backend(id, &backend_id, update).await?;
            self.converge().await?;
        }
        for pair in &changes.backends.targets {
            let backend_id = self.remote_backend(pair.state)?;
            info!(id, %backend_id, "replacing backend targets");
            api.replace_targets(id, &backend_id, pair.plan.remote_targets())
                .await?;
            self.converge().await?;
        }

        if changes.acls.membership_changed() {
            info!(id, "replacing ACLs");
            let acls = entries(&plan.acls).iter().map(|acl| acl.to_spec()).collect();
            api.replace_acls(id, acls).await?;
            self.converge().await?;
        } else {
            for pair in changes.acls.changed() {
                let acl_id = self.remote_acl(pair.state)?;
                info!(id, %acl_id, "updating ACL");
                api.update_acl(id, &acl_id, pair.plan.to_spec()).await?;
                self.converge().await?;
            }
        }

        if changes.listeners {
            info!(id, "replacing listeners");
            let listeners = self.listener_specs(plan)?;
            api.replace_listeners(id, listeners).await?;
            self.converge().await?;
        }

        for backend in &changes.backends.removed {
            let backend_id = self.remote_backend(backend)?;
            info!(id, %backend_id, "deleting backend");
            api.delete_backend(id, &backend_id).await?;
            self.converge().await?;
        }
        for health_check in &changes.health_checks.removed {
            let health_check_id = self.remote_health_check(health_check)?;
            info!(id, %health_check_id, "deleting health check");
            api.delete_health_check(id, &health_check_id).await?;
            self.converge().await?;
        }

        Ok(())
    }
}
