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

use std::borrow::Cow;

use crate::attribute_path::AttributePath;

type Text = Cow<'static, str>;

/// Errors and warnings reported to Terraform
///
/// Operations return `None` exactly when they recorded an error.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Diagnostics {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Add an error on an attribute
    pub fn error(&mut self, summary: impl Into<Text>, detail: impl Into<Text>, attribute: AttributePath) {
        self.errors.push(Diagnostic::new(summary, detail, attribute))
    }
    /// Add an error on an attribute, without details
    pub fn error_short(&mut self, summary: impl Into<Text>, attribute: AttributePath) {
        self.error(summary, "", attribute)
    }
    /// Add an error on the whole resource
    pub fn root_error(&mut self, summary: impl Into<Text>, detail: impl Into<Text>) {
        self.error(summary, detail, AttributePath::default())
    }
    pub fn root_error_short(&mut self, summary: impl Into<Text>) {
        self.error(summary, "", AttributePath::default())
    }
    pub fn root_warning_short(&mut self, summary: impl Into<Text>) {
        self.warnings
            .push(Diagnostic::new(summary, "", AttributePath::default()))
    }
    /// Add an internal error if no error explains the failure yet
    pub fn internal_error(&mut self) {
        if self.errors.is_empty() {
            self.root_error_short("Internal error");
        }
    }
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Diagnostic {
    pub summary: Text,
    pub detail: Text,
    /// Root path when the diagnostic is not tied to an attribute
    pub attribute: AttributePath,
}

impl Diagnostic {
    pub fn new(summary: impl Into<Text>, detail: impl Into<Text>, attribute: AttributePath) -> Self {
        Self {
            summary: summary.into(),
            detail: detail.into(),
            attribute,
        }
    }
}
