// This file is part of the tf-provider project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::attribute_path::AttributePath;
use crate::diagnostics::Diagnostics;
use crate::raw::RawValue;
use crate::utils::OptionFactor;
use crate::value::Value;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for implementing a resource
///
/// Every function returns [`None`] iff an error has been reported in `diags`.
#[async_trait]
pub trait Resource: Send + Sync {
    /// State of the resource
    type State<'a>: Serialize + Deserialize<'a> + Send;

    /// Validate the configuration of the resource
    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()>;
    /// Read the new state of the resource
    ///
    /// Returns [`Value::Null`] if the resource does not exist anymore.
    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
    ) -> Option<Value<Self::State<'a>>>;
    /// Plan the creation of a new resource
    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
    ) -> Option<Self::State<'a>>;
    /// Plan the changes on the resource
    ///
    /// Also returns the attributes whose change requires the resource to be replaced.
    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
    ) -> Option<(Self::State<'a>, Vec<AttributePath>)>;
    /// Create a new resource
    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        config_state: Self::State<'a>,
    ) -> Option<Self::State<'a>>;
    /// Apply the changes on the resource
    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        config_state: Self::State<'a>,
    ) -> Option<Self::State<'a>>;
    /// Destroy the resource
    async fn destroy<'a>(&self, diags: &mut Diagnostics, prior_state: Self::State<'a>)
        -> Option<()>;
    /// Import an existing resource
    async fn import<'a>(&self, diags: &mut Diagnostics, id: String) -> Option<Self::State<'a>> {
        _ = id;
        diags.root_error_short("Import is not supported");
        None
    }
}

/// Resource working on JSON encoded states
#[async_trait]
pub trait DynamicResource: Send + Sync {
    /// Validate the configuration of the resource
    async fn validate(&self, diags: &mut Diagnostics, config: RawValue) -> Option<()>;
    /// Read the new state of the resource
    async fn read(&self, diags: &mut Diagnostics, state: RawValue) -> Option<RawValue>;
    /// Plan the creation of a new resource
    async fn plan_create(
        &self,
        diags: &mut Diagnostics,
        proposed_state: RawValue,
        config_state: RawValue,
    ) -> Option<RawValue>;
    /// Plan the changes on the resource
    async fn plan_update(
        &self,
        diags: &mut Diagnostics,
        prior_state: RawValue,
        proposed_state: RawValue,
        config_state: RawValue,
    ) -> Option<(RawValue, Vec<AttributePath>)>;
    /// Create a new resource
    async fn create(
        &self,
        diags: &mut Diagnostics,
        planned_state: RawValue,
        config_state: RawValue,
    ) -> Option<RawValue>;
    /// Apply the changes on the resource
    async fn update(
        &self,
        diags: &mut Diagnostics,
        prior_state: RawValue,
        planned_state: RawValue,
        config_state: RawValue,
    ) -> Option<RawValue>;
    /// Destroy the resource
    async fn destroy(&self, diags: &mut Diagnostics, prior_state: RawValue) -> Option<()>;
    /// Import an existing resource
    async fn import(&self, diags: &mut Diagnostics, id: String) -> Option<RawValue>;
}

#[async_trait]
impl<T: Resource> DynamicResource for T {
    async fn validate(&self, diags: &mut Diagnostics, config: RawValue) -> Option<()> {
        let config = config.deserialize(diags)?;
        <T as Resource>::validate(self, diags, config).await
    }
    async fn read(&self, diags: &mut Diagnostics, state: RawValue) -> Option<RawValue> {
        let state = state.deserialize(diags)?;
        let state = <T as Resource>::read(self, diags, state).await?;
        RawValue::serialize(diags, &state)
    }
    async fn plan_create(
        &self,
        diags: &mut Diagnostics,
        proposed_state: RawValue,
        config_state: RawValue,
    ) -> Option<RawValue> {
        let (proposed_state, config_state) = (
            proposed_state.deserialize(diags),
            config_state.deserialize(diags),
        )
            .factor()?;
        let state = <T as Resource>::plan_create(self, diags, proposed_state, config_state).await?;
        RawValue::serialize(diags, &state)
    }
    async fn plan_update(
        &self,
        diags: &mut Diagnostics,
        prior_state: RawValue,
        proposed_state: RawValue,
        config_state: RawValue,
    ) -> Option<(RawValue, Vec<AttributePath>)> {
        let (prior_state, proposed_state, config_state) = (
            prior_state.deserialize(diags),
            proposed_state.deserialize(diags),
            config_state.deserialize(diags),
        )
            .factor()?;
        let (state, replace_triggers) = <T as Resource>::plan_update(
            self,
            diags,
            prior_state,
            proposed_state,
            config_state,
        )
        .await?;
        (RawValue::serialize(diags, &state), Some(replace_triggers)).factor()
    }
    async fn create(
        &self,
        diags: &mut Diagnostics,
        planned_state: RawValue,
        config_state: RawValue,
    ) -> Option<RawValue> {
        let (planned_state, config_state) = (
            planned_state.deserialize(diags),
            config_state.deserialize(diags),
        )
            .factor()?;
        let state = <T as Resource>::create(self, diags, planned_state, config_state).await?;
        RawValue::serialize(diags, &state)
    }
    async fn update(
        &self,
        diags: &mut Diagnostics,
        prior_state: RawValue,
        planned_state: RawValue,
        config_state: RawValue,
    ) -> Option<RawValue> {
        let (prior_state, planned_state, config_state) = (
            prior_state.deserialize(diags),
            planned_state.deserialize(diags),
            config_state.deserialize(diags),
        )
            .factor()?;
        let state =
            <T as Resource>::update(self, diags, prior_state, planned_state, config_state).await?;
        RawValue::serialize(diags, &state)
    }
    async fn destroy(&self, diags: &mut Diagnostics, prior_state: RawValue) -> Option<()> {
        let prior_state = prior_state.deserialize(diags)?;
        <T as Resource>::destroy(self, diags, prior_state).await
    }
    async fn import(&self, diags: &mut Diagnostics, id: String) -> Option<RawValue> {
        let state = <T as Resource>::import(self, diags, id).await?;
        RawValue::serialize(diags, &state)
    }
}

impl<T: Resource + 'static> From<T> for Box<dyn DynamicResource> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
