//! [`CloudProvider`] module

use std::{collections::HashMap, sync::Arc};

use tracing::{info, warn};

use crate::{
    config::{ProviderConfig, ProviderContext},
    data_source::DynamicDataSource,
    diagnostics::Diagnostics,
    instance::InstanceResource,
    load_balancer::LoadBalancerResource,
    map,
    provider::Provider,
    registry::RegistryResource,
    resource::DynamicResource,
    sdk::{InstanceApi, LoadBalancerApi, RegistryApi, SnapshotApi, VolumeApi},
    snapshot::SnapshotResource,
    volume::{VolumeResource, VolumesDataSource},
};

/// SDK clients used by the resources, one per kind of resource
#[derive(Clone)]
pub struct Clients {
    pub volumes: Arc<dyn VolumeApi>,
    pub snapshots: Arc<dyn SnapshotApi>,
    pub instances: Arc<dyn InstanceApi>,
    pub registries: Arc<dyn RegistryApi>,
    pub load_balancers: Arc<dyn LoadBalancerApi>,
}

impl Clients {
    /// Use a single client for every kind of resource
    pub fn new<A>(api: Arc<A>) -> Self
    where
        A: VolumeApi + SnapshotApi + InstanceApi + RegistryApi + LoadBalancerApi + 'static,
    {
        Self {
            volumes: api.clone(),
            snapshots: api.clone(),
            instances: api.clone(),
            registries: api.clone(),
            load_balancers: api,
        }
    }
}

/// Provider of the cloud resources
///
/// Resources are built on demand and share the context of the provider:
/// the settings set by `configure` and the cancellation token triggered by `stop`.
pub struct CloudProvider {
    context: Arc<ProviderContext>,
    clients: Clients,
}

impl CloudProvider {
    pub fn new(clients: Clients) -> Self {
        Self {
            context: Default::default(),
            clients,
        }
    }

    /// Shared context of the resources
    pub fn context(&self) -> &Arc<ProviderContext> {
        &self.context
    }
}

impl Provider for CloudProvider {
    type Config = ProviderConfig;

    fn validate(&self, diags: &mut Diagnostics, config: Self::Config) -> Option<()> {
        config.validate(diags);
        if diags.has_errors() {
            None
        } else {
            Some(())
        }
    }

    fn configure(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config,
    ) -> Option<()> {
        config.validate(diags);
        if diags.has_errors() {
            return None;
        }
        let settings = config.settings();
        if self.context.configure(settings) {
            info!(
                %terraform_version,
                poll_interval = ?settings.poll_interval,
                page_size = settings.page_size,
                "provider configured"
            );
        } else {
            warn!("provider already configured, keeping the first configuration");
            diags.root_warning_short("Provider is already configured");
        }
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        let context = &self.context;
        let clients = &self.clients;
        Some(map! {
            "volume" => VolumeResource::new(context.clone(), clients.volumes.clone()),
            "snapshot" => SnapshotResource::new(context.clone(), clients.snapshots.clone()),
            "instance" => InstanceResource::new(context.clone(), clients.instances.clone()),
            "registry" => RegistryResource::new(clients.registries.clone()),
            "load_balancer" => LoadBalancerResource::new(context.clone(), clients.load_balancers.clone())
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        Some(map! {
            "volumes" => VolumesDataSource::new(self.context.clone(), self.clients.volumes.clone())
        })
    }

    fn stop(&self) {
        self.context.stop()
    }
}
