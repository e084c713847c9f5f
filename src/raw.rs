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

//! [`RawValue`] module

use crate::diagnostics::Diagnostics;
use serde::{Deserialize, Serialize};

/// JSON encoded dynamic value, as exchanged at the border of the provider
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct RawValue(pub Vec<u8>);

const NULL_JSON: &str = "null";

impl RawValue {
    /// Check if the encoded value is null
    pub fn is_null(&self) -> bool {
        self.0.is_empty() || self.0.as_slice() == NULL_JSON.as_bytes()
    }

    /// Build a [`RawValue`] from a JSON document
    pub fn json<S: Into<Vec<u8>>>(json: S) -> Self {
        Self(json.into())
    }

    /// Deserialize a [`RawValue`] into a concrete type
    ///
    /// # Arguments
    ///
    /// * `diags` - diagnostics where deserialization errors and warnings are reported
    ///
    /// # Remarks
    ///
    /// Returns [`None`] iff there is an error reported in diagnostics
    pub fn deserialize<'a, T>(&'a self, diags: &mut Diagnostics) -> Option<T>
    where
        T: Deserialize<'a>,
    {
        let slice = if self.0.is_empty() {
            NULL_JSON.as_bytes()
        } else {
            self.0.as_slice()
        };
        match serde_json::from_slice::<T>(slice) {
            Ok(value) => Some(value),
            Err(err) => {
                diags.root_error("Invalid JSON document", err.to_string());
                None
            }
        }
    }

    /// Serialize `value` into a [`RawValue`]
    ///
    /// # Arguments
    ///
    /// * `diags` - diagnostics where serialization errors and warnings are reported
    /// * `value` - object to encode
    ///
    /// # Remarks
    ///
    /// Returns [`None`] iff there is an error reported in diagnostics
    pub fn serialize<T>(diags: &mut Diagnostics, value: &T) -> Option<RawValue>
    where
        T: Serialize,
    {
        match serde_json::to_vec(value) {
            Ok(value) => Some(Self(value)),
            Err(err) => {
                diags.root_error("Could not encode state", err.to_string());
                None
            }
        }
    }

    /// Get the JSON text of the value
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or(NULL_JSON)
    }
}

impl Default for RawValue {
    fn default() -> Self {
        RawValue(NULL_JSON.as_bytes().to_vec())
    }
}
