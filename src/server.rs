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

//! [`Server`] module

use std::collections::HashMap;

use tracing::{debug, info};

use crate::data_source::DynamicDataSource;
use crate::diagnostics::Diagnostics;
use crate::logging;
use crate::provider::DynamicProvider;
use crate::raw::RawValue;
use crate::resource::DynamicResource;

/// Host of a provider: resolves resources and data sources by their Terraform type name
///
/// Type names are prefixed with the name of the provider: `volume` becomes `cloud_volume`.
pub struct Server {
    provider: Box<dyn DynamicProvider>,
    init_diags: Diagnostics,
    resources: HashMap<String, Box<dyn DynamicResource>>,
    data_sources: HashMap<String, Box<dyn DynamicDataSource>>,
}

impl Server {
    pub fn new<P: DynamicProvider>(provider_name: &str, provider: P) -> Self {
        Self::new_dynamic(provider_name, Box::new(provider))
    }

    pub fn new_dynamic(provider_name: &str, provider: Box<dyn DynamicProvider>) -> Self {
        let mut diags = Diagnostics::default();
        if let Err(err) = logging::init() {
            diags.root_warning_short(format!("Logging is disabled: {}", err));
        }
        let mut has_errors = false;
        let resources = match provider.get_resources(&mut diags) {
            Some(resources) => resources,
            None => {
                has_errors = true;
                Default::default()
            }
        }
        .into_iter()
        .map(|(name, resource)| (format!("{}_{}", provider_name, name), resource))
        .collect::<HashMap<_, _>>();
        let data_sources = match provider.get_data_sources(&mut diags) {
            Some(data_sources) => data_sources,
            None => {
                has_errors = true;
                Default::default()
            }
        }
        .into_iter()
        .map(|(name, data_source)| (format!("{}_{}", provider_name, name), data_source))
        .collect::<HashMap<_, _>>();

        if has_errors {
            diags.internal_error()
        }
        debug!(
            provider = provider_name,
            resources = resources.len(),
            data_sources = data_sources.len(),
            "provider loaded"
        );

        Self {
            provider,
            init_diags: diags,
            resources,
            data_sources,
        }
    }

    /// Diagnostics recorded while loading the provider
    pub fn init_diagnostics(&self) -> &Diagnostics {
        &self.init_diags
    }

    /// Names of the resources, sorted
    pub fn resource_names(&self) -> Vec<&str> {
        let mut names = self.resources.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Names of the data sources, sorted
    pub fn data_source_names(&self) -> Vec<&str> {
        let mut names = self
            .data_sources
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn validate_provider(&self, diags: &mut Diagnostics, config: RawValue) -> Option<()> {
        self.provider.validate(diags, config)
    }

    pub fn configure_provider(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: RawValue,
    ) -> Option<()> {
        self.provider.configure(diags, terraform_version, config)
    }

    /// Graceful shutdown: interrupts every in-flight operation
    pub fn stop(&self) {
        info!("stopping provider");
        self.provider.stop()
    }

    pub fn get_resource<'a>(
        &'a self,
        diags: &mut Diagnostics,
        name: &str,
    ) -> Option<&'a dyn DynamicResource> {
        if let Some(resource) = self.resources.get(name) {
            Some(resource.as_ref())
        } else {
            diags.root_error_short(format!("Could not find resource `{}` in provider", name));
            None
        }
    }

    pub fn get_data_source<'a>(
        &'a self,
        diags: &mut Diagnostics,
        name: &str,
    ) -> Option<&'a dyn DynamicDataSource> {
        if let Some(data_source) = self.data_sources.get(name) {
            Some(data_source.as_ref())
        } else {
            diags.root_error_short(format!("Could not find data source `{}` in provider", name));
            None
        }
    }
}
