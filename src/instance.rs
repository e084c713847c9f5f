//! `cloud_instance` resource

use std::{borrow::Cow, collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    attribute_path::AttributePath,
    config::ProviderContext,
    diagnostics::Diagnostics,
    resource::Resource,
    sdk::{Instance, InstanceApi, InstanceCreate, InstanceStatus, InstanceUpdate},
    utils::StepDiagnostics,
    value::{changed, Value, ValueMap, ValueString},
    wait::{absent_when_not_found, wait_until_status, WaitConfig},
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct State<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub image_id: ValueString<'a>,
    pub instance_type: ValueString<'a>,
    pub subnet_id: ValueString<'a>,
    pub private_ip: ValueString<'a>,
    pub tags: ValueMap<'a, ValueString<'a>>,
    pub status: ValueString<'a>,
}

impl<'a> State<'a> {
    pub fn from_remote(instance: &Instance) -> Self {
        let tags = instance
            .tags
            .iter()
            .map(|(key, value)| (Cow::Owned(key.clone()), Value::Value(Cow::Owned(value.clone()))))
            .collect::<BTreeMap<_, _>>();
        Self {
            id: instance.id.clone().into(),
            name: instance.name.clone().into(),
            image_id: instance.image_id.clone().into(),
            instance_type: instance.instance_type.clone().into(),
            subnet_id: instance.subnet_id.clone().into(),
            private_ip: instance.private_ip.clone().into(),
            tags: if tags.is_empty() {
                Value::Null
            } else {
                Value::Value(tags)
            },
            status: instance.status.clone().into(),
        }
    }

    fn to_create(&self) -> InstanceCreate {
        InstanceCreate {
            name: self.name.as_str().to_owned(),
            image_id: self.image_id.as_str().to_owned(),
            instance_type: self.instance_type.as_str().to_owned(),
            subnet_id: self.subnet_id.to_option(),
            tags: remote_tags(&self.tags),
        }
    }

    fn to_update(&self, prior: &State<'_>) -> InstanceUpdate {
        InstanceUpdate {
            name: changed(&self.name, &prior.name).then(|| self.name.as_str().to_owned()),
            instance_type: changed(&self.instance_type, &prior.instance_type)
                .then(|| self.instance_type.as_str().to_owned()),
            tags: tags_changed(&self.tags, &prior.tags).then(|| remote_tags(&self.tags)),
        }
    }
}

/// Tags as sent to the API, null tags are dropped
fn remote_tags(tags: &ValueMap<'_, ValueString<'_>>) -> BTreeMap<String, String> {
    tags.as_ref_option()
        .into_iter()
        .flatten()
        .filter_map(|(key, value)| {
            value
                .as_ref_option()
                .map(|value| (key.to_string(), value.to_string()))
        })
        .collect()
}

/// Null tags are the same as no tags, unknown tags cannot be compared
fn tags_changed(plan: &ValueMap<'_, ValueString<'_>>, state: &ValueMap<'_, ValueString<'_>>) -> bool {
    if plan.is_unknown() || state.is_unknown() {
        return false;
    }
    if plan
        .as_ref_option()
        .is_some_and(|tags| tags.values().any(Value::is_unknown))
    {
        return false;
    }
    remote_tags(plan) != remote_tags(state)
}

pub struct InstanceResource {
    context: Arc<ProviderContext>,
    api: Arc<dyn InstanceApi>,
}

impl InstanceResource {
    pub fn new(context: Arc<ProviderContext>, api: Arc<dyn InstanceApi>) -> Self {
        Self { context, api }
    }

    fn wait_config(&self) -> WaitConfig {
        let settings = self.context.settings();
        settings.wait_config(settings.timeouts.instance)
    }

    async fn wait_completed(&self, diags: &mut Diagnostics, id: &str) -> Option<Instance> {
        let api = self.api.as_ref();
        wait_until_status(
            id,
            InstanceStatus::Completed,
            &self.wait_config(),
            &self.context.cancellation(),
            || api.get_instance(id),
        )
        .await
        .step_diagnostics(diags, "Instance did not complete")
    }
}

#[async_trait]
impl Resource for InstanceResource {
    type State<'a> = State<'a>;

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        for (name, value) in [
            ("name", &config.name),
            ("image_id", &config.image_id),
            ("instance_type", &config.instance_type),
        ] {
            if value.is_null() {
                diags.error_short(format!("Missing {}", name), AttributePath::new(name));
            }
        }
        if let Value::Value(tags) = &config.tags {
            for key in tags.keys() {
                if key.is_empty() {
                    diags.error_short("Tag keys cannot be empty", AttributePath::new("tags"));
                }
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
        match self.api.get_instance(&id).await {
            Ok(instance) => Some(Value::Value(State::from_remote(&instance))),
            Err(err) if err.is_not_found() => {
                info!(%id, "instance is gone");
                Some(Value::Null)
            }
            Err(err) => {
                diags.root_error("Could not read instance", err.to_string());
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
        state.private_ip = Value::Unknown;
        state.status = Value::Unknown;
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

        let mut replace = Vec::new();
        if changed(&state.image_id, &prior_state.image_id) {
            replace.push(AttributePath::new("image_id"));
        }
        if changed(&state.subnet_id, &prior_state.subnet_id) {
            replace.push(AttributePath::new("subnet_id"));
        }

        if replace.is_empty() {
            state.id = prior_state.id;
            state.private_ip = prior_state.private_ip;
            state.status = prior_state.status;
        } else {
            state.id = Value::Unknown;
            state.private_ip = Value::Unknown;
            state.status = Value::Unknown;
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
            .create_instance(planned_state.to_create())
            .await
            .step_diagnostics(diags, "Could not create instance")?;
        info!(%id, "instance created");

        let instance = self.wait_completed(diags, &id).await?;
        Some(State::from_remote(&instance))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
    ) -> Option<Self::State<'a>> {
        let id = prior_state.id.as_str();
        let update = planned_state.to_update(&prior_state);
        if update == InstanceUpdate::default() {
            return Some(planned_state);
        }

        info!(id, "updating instance");
        self.api
            .update_instance(id, update)
            .await
            .step_diagnostics(diags, "Could not update instance")?;

        let instance = self.wait_completed(diags, id).await?;
        Some(State::from_remote(&instance))
    }

    async fn destroy<'a>(&self, diags: &mut Diagnostics, prior_state: Self::State<'a>) -> Option<()> {
        let id = prior_state.id.as_str();
        match self.api.delete_instance(id).await {
            Err(err) if err.is_not_found() => return Some(()),
            result => result.step_diagnostics(diags, "Could not delete instance")?,
        }
        info!(id, "instance deletion requested");

        let api = self.api.as_ref();
        let result = wait_until_status(
            id,
            InstanceStatus::Deleted,
            &self.wait_config(),
            &self.context.cancellation(),
            || api.get_instance(id),
        )
        .await;
        absent_when_not_found(result).step_diagnostics(diags, "Instance was not deleted")?;
        Some(())
    }

    async fn import<'a>(&self, diags: &mut Diagnostics, id: String) -> Option<Self::State<'a>> {
        let instance = self
            .api
            .get_instance(&id)
            .await
            .step_diagnostics(diags, "Could not import instance")?;
        Some(State::from_remote(&instance))
    }
}
