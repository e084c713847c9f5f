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

//! Terraform provider for a cloud platform
//!
//! Every resource drives an asynchronous cloud API: mutations return immediately
//! and the provider polls the remote objects until they converge, see [`wait`].
//! Load balancers own nested collections reconciled entry by entry, see [`reconcile`].
//!
//! The cloud API itself is reached through the traits of [`sdk`],
//! and [`Server`] resolves the resources of a [`CloudProvider`] by their Terraform type name.

mod attribute_path;
mod cloud_provider;
mod data_source;
mod diagnostics;
mod provider;
mod raw;
mod resource;
mod server;
mod utils;

pub mod config;
pub mod instance;
pub mod load_balancer;
pub mod logging;
pub mod reconcile;
pub mod registry;
pub mod sdk;
pub mod snapshot;
pub mod value;
pub mod volume;
pub mod wait;

pub use attribute_path::{AttributePath, AttributePathStep};
pub use cloud_provider::{Clients, CloudProvider};
pub use data_source::{DataSource, DynamicDataSource};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use provider::{DynamicProvider, Provider};
pub use raw::RawValue;
pub use resource::{DynamicResource, Resource};
pub use server::Server;

#[macro_export]
/// Build a hash map
///
/// # Examples
///
/// ```
/// # use tf_provider_cloud::map;
/// # use std::collections::HashMap;
/// let m: HashMap<String, String> = map!{
///     "key1" => "value1",
///     "key2" => "value2",
/// };
/// ```
///
/// # Remarks
///
/// Keys and Values are converted with [`Into::into`] to build the map.
/// Because of that, type annotations are usually required.
macro_rules! map {
    {$($key:expr => $value:expr),*} => {
        {
            let mut map = std::collections::HashMap::default();
            $(
                map.insert($key.into(), $value.into());
            )*
            map
        }
    };

    {$($key:expr => $value:expr),+ ,} => { map!{$($key => $value),+} };
}
