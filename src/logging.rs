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

use std::{env, fs::File, sync::Mutex};

use anyhow::{anyhow, Result};
use tracing::Level;

/// Install the tracing subscriber of the provider
///
/// Stdout belongs to Terraform, so events are only recorded when `PLUGIN_LOG_FILE` is set.
/// The level is read from `TF_LOG_PROVIDER` (defaults to `trace`),
/// and `TF_LOG_PROVIDER_JSON` switches to JSON lines.
///
/// Calling this function more than once is harmless.
pub fn init() -> Result<()> {
    let Ok(path) = env::var("PLUGIN_LOG_FILE") else {
        return Ok(());
    };
    let level = match env::var("TF_LOG_PROVIDER") {
        Ok(level) => parse_level(&level)?,
        Err(_) => Level::TRACE,
    };
    let json = env::var("TF_LOG_PROVIDER_JSON")
        .map(|json| is_truthy(&json))
        .unwrap_or(false);

    let log_file = File::create(path)?;
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file));

    // Another subscriber already installed is not an error
    _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    Ok(())
}

fn parse_level(level: &str) -> Result<Level> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" | "" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(anyhow!("Invalid log level `{}`", other)),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels() {
        assert_eq!(parse_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_level(" warn ").unwrap(), Level::WARN);
        assert_eq!(parse_level("").unwrap(), Level::TRACE);
        assert!(parse_level("verbose").is_err());
    }

    #[test]
    fn truthy() {
        assert!(is_truthy("True"));
        assert!(is_truthy("1"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }
}
