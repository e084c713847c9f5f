//! `cloud_snapshot` resource
//!
//! Snapshots are immutable: every change replaces the snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    attribute_path::AttributePath,
    config::ProviderContext,
    diagnostics::Diagnostics,
    resource::Resource,
    sdk::{Snapshot, SnapshotApi, SnapshotCreate, SnapshotStatus},
    utils::StepDiagnostics,
    value::{changed, Value, ValueNumber, ValueString},
    wait::{absent_when_not_found, wait_until_status, WaitConfig},
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct State<'a> {
    pub id: ValueString<'a>,
    pub volume_id: ValueString<'a>,
    pub description: ValueString<'a>,
    pub size_gib: ValueNumber,
    pub status: ValueString<'a>,
}

impl<'a> State<'a> {
    pub fn from_remote(snapshot: &Snapshot) -> Self {
        Self {
            id: snapshot.id.clone().into(),
            volume_id: snapshot.volume_id.clone().into(),
            description: snapshot.description.clone().into(),
            size_gib: snapshot.size_gib.into(),
            status: snapshot.status.clone().into(),
        }
    }
}

pub struct SnapshotResource {
    context: Arc<ProviderContext>,
    api: Arc<dyn SnapshotApi>,
}

impl SnapshotResource {
    pub fn new(context: Arc<ProviderContext>, api: Arc<dyn SnapshotApi>) -> Self {
        Self { context, api }
    }

    fn wait_config(&self) -> WaitConfig {
        let settings = self.context.settings();
        settings.wait_config(settings.timeouts.snapshot)
    }
}

#[async_trait]
impl Resource for SnapshotResource {
    type State<'a> = State<'a>;

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if config.volume_id.is_null() {
            diags.error_short("Missing volume ID", AttributePath::new("volume_id"));
            return None;
        }
        Some(())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
    ) -> Option<Value<Self::State<'a>>> {
        let Some(id) = state.id.to_option() else {
            return Some(Value::Null);
        };
        match self.api.get_snapshot(&id).await {
            Ok(snapshot) => Some(Value::Value(State::from_remote(&snapshot))),
            Err(err) if err.is_not_found() => Some(Value::Null),
            Err(err) => {
                diags.root_error("Could not read snapshot", err.to_string());
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
        Some(State {
            id: Value::Unknown,
            size_gib: Value::Unknown,
            status: Value::Unknown,
            ..proposed_state
        })
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
    ) -> Option<(Self::State<'a>, Vec<AttributePath>)> {
        let mut replace = Vec::new();
        if changed(&proposed_state.volume_id, &prior_state.volume_id) {
            replace.push(AttributePath::new("volume_id"));
        }
        if changed(&proposed_state.description, &prior_state.description) {
            replace.push(AttributePath::new("description"));
        }
        let state = if replace.is_empty() {
            prior_state
        } else {
            State {
                id: Value::Unknown,
                size_gib: Value::Unknown,
                status: Value::Unknown,
                ..proposed_state
            }
        };
        Some((state, replace))
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
    ) -> Option<Self::State<'a>> {
        let request = SnapshotCreate {
            volume_id: planned_state.volume_id.as_str().to_owned(),
            description: planned_state.description.to_option(),
        };
        let id = self
            .api
            .create_snapshot(request)
            .await
            .step_diagnostics(diags, "Could not create snapshot")?;
        info!(%id, "snapshot created");

        let api = self.api.as_ref();
        let id = id.as_str();
        let snapshot = wait_until_status(
            id,
            SnapshotStatus::Completed,
            &self.wait_config(),
            &self.context.cancellation(),
            || api.get_snapshot(id),
        )
        .await
        .step_diagnostics(diags, "Snapshot did not complete")?;
        Some(State::from_remote(&snapshot))
    }

    async fn update<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
    ) -> Option<Self::State<'a>> {
        Some(planned_state)
    }

    async fn destroy<'a>(&self, diags: &mut Diagnostics, prior_state: Self::State<'a>) -> Option<()> {
        let id = prior_state.id.as_str();
        match self.api.delete_snapshot(id).await {
            Err(err) if err.is_not_found() => return Some(()),
            result => result.step_diagnostics(diags, "Could not delete snapshot")?,
        }
        info!(id, "snapshot deletion requested");

        let api = self.api.as_ref();
        let result = wait_until_status(
            id,
            SnapshotStatus::Deleted,
            &self.wait_config(),
            &self.context.cancellation(),
            || api.get_snapshot(id),
        )
        .await;
        absent_when_not_found(result).step_diagnostics(diags, "Snapshot was not deleted")?;
        Some(())
    }
}
