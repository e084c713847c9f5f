//! `cloud_registry` resource
//!
//! The registry API is synchronous: there is nothing to wait for.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    attribute_path::AttributePath,
    diagnostics::Diagnostics,
    resource::Resource,
    sdk::{Registry, RegistryApi, RegistryCreate},
    utils::StepDiagnostics,
    value::{changed, Value, ValueBool, ValueString},
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct State<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub public: ValueBool,
    pub endpoint: ValueString<'a>,
}

impl<'a> State<'a> {
    pub fn from_remote(registry: &Registry) -> Self {
        Self {
            id: registry.id.clone().into(),
            name: registry.name.clone().into(),
            public: Value::Value(registry.public),
            endpoint: registry.endpoint.clone().into(),
        }
    }
}

pub struct RegistryResource {
    api: Arc<dyn RegistryApi>,
}

impl RegistryResource {
    pub fn new(api: Arc<dyn RegistryApi>) -> Self {
        Self { api }
    }
}

/// Registry names: lowercase letters, digits and dashes
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
}

#[async_trait]
impl Resource for RegistryResource {
    type State<'a> = State<'a>;

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        match &config.name {
            Value::Value(name) if !is_valid_name(name) => {
                diags.error(
                    "Invalid registry name",
                    format!(
                        "`{}` must only contain lowercase letters, digits and dashes",
                        name
                    ),
                    AttributePath::new("name"),
                );
                None
            }
            Value::Null => {
                diags.error_short("Missing registry name", AttributePath::new("name"));
                None
            }
            _ => Some(()),
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
        match self.api.get_registry(&id).await {
            Ok(registry) => Some(Value::Value(State::from_remote(&registry))),
            Err(err) if err.is_not_found() => Some(Value::Null),
            Err(err) => {
                diags.root_error("Could not read registry", err.to_string());
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
        state.endpoint = Value::Unknown;
        if state.public.is_null() {
            state.public = Value::Value(false);
        }
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
        if state.public.is_null() {
            state.public = Value::Value(false);
        }
        if changed(&state.name, &prior_state.name) {
            state.id = Value::Unknown;
            state.endpoint = Value::Unknown;
            return Some((state, vec![AttributePath::new("name")]));
        }
        state.id = prior_state.id;
        state.endpoint = prior_state.endpoint;
        Some((state, vec![]))
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
    ) -> Option<Self::State<'a>> {
        let request = RegistryCreate {
            name: planned_state.name.as_str().to_owned(),
            public: planned_state.public.unwrap_or_default(),
        };
        let registry = self
            .api
            .create_registry(request)
            .await
            .step_diagnostics(diags, "Could not create registry")?;
        info!(id = registry.id.as_str(), "registry created");
        Some(State::from_remote(&registry))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
    ) -> Option<Self::State<'a>> {
        if !changed(&planned_state.public, &prior_state.public) {
            return Some(planned_state);
        }
        let registry = self
            .api
            .update_registry(prior_state.id.as_str(), planned_state.public.unwrap_or_default())
            .await
            .step_diagnostics(diags, "Could not update registry")?;
        Some(State::from_remote(&registry))
    }

    async fn destroy<'a>(&self, diags: &mut Diagnostics, prior_state: Self::State<'a>) -> Option<()> {
        match self.api.delete_registry(prior_state.id.as_str()).await {
            Err(err) if err.is_not_found() => Some(()),
            result => result.step_diagnostics(diags, "Could not delete registry"),
        }
    }

    async fn import<'a>(&self, diags: &mut Diagnostics, id: String) -> Option<Self::State<'a>> {
        let registry = self
            .api
            .get_registry(&id)
            .await
            .step_diagnostics(diags, "Could not import registry")?;
        Some(State::from_remote(&registry))
    }
}
