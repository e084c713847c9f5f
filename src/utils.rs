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

use crate::diagnostics::Diagnostics;

/// Codec for the Terraform unknown value in JSON documents
pub(crate) mod serde_unknown {
    /// Terraform's placeholder for values that will be known after apply
    pub const UNKNOWN: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

    pub fn serialize<S>(serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(UNKNOWN)
    }

    pub fn is_unknown(s: &str) -> bool {
        s == UNKNOWN
    }
}

/// Report the error of a failed step with a summary naming the step
pub trait StepDiagnostics {
    type Output;
    fn step_diagnostics(self, diags: &mut Diagnostics, step: &str) -> Self::Output;
}

impl<T, E> StepDiagnostics for Result<T, E>
where
    E: ToString,
{
    type Output = Option<T>;
    fn step_diagnostics(self, diags: &mut Diagnostics, step: &str) -> Self::Output {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                diags.root_error(step.to_string(), err.to_string());
                None
            }
        }
    }
}

/// Turn a tuple of options into an option of a tuple
pub trait OptionFactor {
    type Output;
    fn factor(self) -> Self::Output;
}

macro_rules! impl_all {
    ($($e:ident)+) => {
        impl<$($e),+> OptionFactor for ($(Option<$e>,)+) {
            type Output = Option<($($e,)+)>;
            #[allow(non_snake_case)]
            fn factor(self) -> Self::Output {
                let ($($e,)+) = self;
                Some(($($e?,)+))
            }
        }
    };
}

impl_all!(A B);
impl_all!(A B C);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_requires_every_element() {
        assert_eq!((Some(1), Some("a")).factor(), Some((1, "a")));
        assert_eq!((Some(1), None::<&str>).factor(), None);
    }

    #[test]
    fn result_errors_become_diagnostics() {
        let mut diags = Diagnostics::default();
        let ok: Result<i32, String> = Ok(3);
        assert_eq!(ok.step_diagnostics(&mut diags, "Could not read volume"), Some(3));
        assert!(diags.errors.is_empty());

        let err: Result<i32, String> = Err("boom".into());
        assert_eq!(err.step_diagnostics(&mut diags, "Could not create volume"), None);
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].summary, "Could not create volume");
        assert!(diags.errors[0].detail.starts_with("boom"));
    }
}
