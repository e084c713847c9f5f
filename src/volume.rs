//! `cloud_volume` resource and `cloud_volumes` data source

use std::{borrow::Cow, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    attribute_path::AttributePath,
    config::ProviderContext,
    data_source::DataSource,
    diagnostics::Diagnostics,
    resource::Resource,
    sdk::{collect_pages, Volume, VolumeApi, VolumeCreate, VolumeStatus, VolumeUpdate},
    utils::StepDiagnostics,
    value::{changed, Value, ValueList, ValueNumber, ValueString},
    wait::{absent_when_not_found, wait_until_status, WaitConfig},
};

/// State of a `cloud_volume`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct State<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub size_gib: ValueNumber,
    pub volume_type: ValueString<'a>,
    pub availability_zone: ValueString<'a>,
    pub snapshot_id: ValueString<'a>,
    pub status: ValueString<'a>,
}

impl<'a> State<'a> {
    pub fn from_remote(volume: &Volume) -> Self {
        Self {
            id: volume.id.clone().into(),
            name: volume.name.clone().into(),
            size_gib: Value::Value(volume.size_gib),
            volume_type: volume.volume_type.clone().into(),
            availability_zone: volume.availability_zone.clone().into(),
            snapshot_id: volume.snapshot_id.clone().into(),
            status: volume.status.clone().into(),
        }
    }

    fn to_create(&self) -> VolumeCreate {
        VolumeCreate {
            name: self.name.to_option(),
            size_gib: self.size_gib.unwrap_or_default(),
            volume_type: self.volume_type.to_option(),
            availability_zone: self.availability_zone.as_str().to_owned(),
            snapshot_id: self.snapshot_id.to_option(),
        }
    }
}

pub struct VolumeResource {
    context: Arc<ProviderContext>,
    api: Arc<dyn VolumeApi>,
}

impl VolumeResource {
    pub fn new(context: Arc<ProviderContext>, api: Arc<dyn VolumeApi>) -> Self {
        Self { context, api }
    }

    fn wait_config(&self) -> WaitConfig {
        let settings = self.context.settings();
        settings.wait_config(settings.timeouts.volume)
    }

    async fn wait_completed(&self, diags: &mut Diagnostics, id: &str) -> Option<Volume> {
        let api = self.api.as_ref();
        wait_until_status(
            id,
            VolumeStatus::Completed,
            &self.wait_config(),
            &self.context.cancellation(),
            || api.get_volume(id),
        )
        .await
        .step_diagnostics(diags, "Volume did not complete")
    }
}

#[async_trait]
impl Resource for VolumeResource {
    type State<'a> = State<'a>;

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        match config.size_gib {
            Value::Value(size) if size <= 0 => diags.error(
                "Invalid volume size",
                format!("size_gib must be positive, got {}", size),
                AttributePath::new("size_gib"),
            ),
            Value::Null => diags.error_short("Missing volume size", AttributePath::new("size_gib")),
            _ => (),
        }
        if config.availability_zone.is_null() {
            diags.error_short(
                "Missing availability zone",
                AttributePath::new("availability_zone"),
            );
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
        match self.api.get_volume(&id).await {
            Ok(volume) => Some(Value::Value(State::from_remote(&volume))),
            Err(err) if err.is_not_found() => {
                info!(%id, "volume is gone");
                Some(Value::Null)
            }
            Err(err) => {
                diags.root_error("Could not read volume", err.to_string());
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
        state.id = Value::Unknown;
        state.status = Value::Unknown;
        if state.volume_type.is_null() {
            state.volume_type = Value::Unknown;
        }
        Some(state)
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
    ) -> Option<(Self::State<'a>, Vec<AttributePath>)> {
        let mut state = proposed_state;
        state.id = prior_state.id.clone();
        state.status = prior_state.status.clone();
        if state.volume_type.is_null() {
            state.volume_type = prior_state.volume_type.clone();
        }

        if let (Value::Value(planned), Value::Value(prior)) = (state.size_gib, prior_state.size_gib)
        {
            if planned < prior {
                diags.error(
                    "Volumes cannot shrink",
                    format!("size_gib cannot go from {} to {}", prior, planned),
                    AttributePath::new("size_gib"),
                );
                return None;
            }
        }

        let mut replace = Vec::new();
        if changed(&state.availability_zone, &prior_state.availability_zone) {
            replace.push(AttributePath::new("availability_zone"));
        }
        if changed(&state.snapshot_id, &prior_state.snapshot_id) {
            replace.push(AttributePath::new("snapshot_id"));
        }
        Some((state, replace))
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
    ) -> Option<Self::State<'a>> {
        let id = self
            .api
            .create_volume(planned_state.to_create())
            .await
            .step_diagnostics(diags, "Could not create volume")?;
        info!(%id, "volume created");

        let volume = self.wait_completed(diags, &id).await?;
        Some(State::from_remote(&volume))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
    ) -> Option<Self::State<'a>> {
        let id = prior_state.id.as_str();
        let update = VolumeUpdate {
            name: changed(&planned_state.name, &prior_state.name)
                .then(|| planned_state.name.as_str().to_owned()),
            size_gib: changed(&planned_state.size_gib, &prior_state.size_gib)
                .then(|| planned_state.size_gib.unwrap_or_default()),
        };
        if update == VolumeUpdate::default() {
            return Some(planned_state);
        }

        info!(id, "updating volume");
        self.api
            .update_volume(id, update)
            .await
            .step_diagnostics(diags, "Could not update volume")?;

        let volume = self.wait_completed(diags, id).await?;
        Some(State::from_remote(&volume))
    }

    async fn destroy<'a>(&self, diags: &mut Diagnostics, prior_state: Self::State<'a>) -> Option<()> {
        let id = prior_state.id.as_str();
        match self.api.delete_volume(id).await {
            Err(err) if err.is_not_found() => return Some(()),
            result => result.step_diagnostics(diags, "Could not delete volume")?,
        }
        info!(id, "volume deletion requested");

        let api = self.api.as_ref();
        let result = wait_until_status(
            id,
            VolumeStatus::Deleted,
            &self.wait_config(),
            &self.context.cancellation(),
            || api.get_volume(id),
        )
        .await;
        absent_when_not_found(result).step_diagnostics(diags, "Volume was not deleted")?;
        Some(())
    }

    async fn import<'a>(&self, diags: &mut Diagnostics, id: String) -> Option<Self::State<'a>> {
        let volume = self
            .api
            .get_volume(&id)
            .await
            .step_diagnostics(diags, "Could not import volume")?;
        Some(State::from_remote(&volume))
    }
}

/// Volume listed by the `cloud_volumes` data source
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeItem<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub size_gib: ValueNumber,
    pub volume_type: ValueString<'a>,
    pub availability_zone: ValueString<'a>,
    pub status: ValueString<'a>,
}

/// State of the `cloud_volumes` data source
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumesState<'a> {
    /// Only list the volumes with this name
    pub name: ValueString<'a>,
    pub volumes: ValueList<VolumeItem<'a>>,
}

pub struct VolumesDataSource {
    context: Arc<ProviderContext>,
    api: Arc<dyn VolumeApi>,
}

impl VolumesDataSource {
    pub fn new(context: Arc<ProviderContext>, api: Arc<dyn VolumeApi>) -> Self {
        Self { context, api }
    }
}

#[async_trait]
impl DataSource for VolumesDataSource {
    type State<'a> = VolumesState<'a>;

    async fn validate<'a>(&self, _diags: &mut Diagnostics, _config: Self::State<'a>) -> Option<()> {
        Some(())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
    ) -> Option<Self::State<'a>> {
        let api = self.api.as_ref();
        let page_size = self.context.settings().page_size;
        let volumes = collect_pages(page_size, |request| api.list_volumes(request))
            .await
            .step_diagnostics(diags, "Could not list volumes")?;

        let filter = config.name.to_option();
        let volumes = volumes
            .iter()
            .filter(|volume| match &filter {
                Some(name) => volume.name.as_deref() == Some(name.as_str()),
                None => true,
            })
            .map(|volume| VolumeItem {
                id: Value::Value(Cow::Owned(volume.id.clone())),
                name: volume.name.clone().into(),
                size_gib: Value::Value(volume.size_gib),
                volume_type: volume.volume_type.clone().into(),
                availability_zone: volume.availability_zone.clone().into(),
                status: volume.status.clone().into(),
            })
            .collect();

        Some(VolumesState {
            name: config.name,
            volumes: Value::Value(volumes),
        })
    }
}
