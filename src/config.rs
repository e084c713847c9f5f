//! Provider configuration

use std::{sync::OnceLock, time::Duration};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    attribute_path::AttributePath,
    diagnostics::Diagnostics,
    value::{self, Value, ValueNumber},
    wait::WaitConfig,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 1000;

const MINUTE: u64 = 60;

/// Content of the `provider` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Seconds between two status polls
    pub poll_interval: ValueNumber,
    /// Number of items requested per page when listing
    pub page_size: ValueNumber,
    #[serde(with = "value::serde_as_vec")]
    pub timeouts: Value<TimeoutsConfig>,
}

/// Content of the `timeouts` block, in minutes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub volume: ValueNumber,
    pub snapshot: ValueNumber,
    pub instance: ValueNumber,
    pub load_balancer: ValueNumber,
}

impl ProviderConfig {
    /// Check the configuration, reporting every invalid attribute
    pub fn validate(&self, diags: &mut Diagnostics) {
        if let Value::Value(poll_interval) = self.poll_interval {
            if poll_interval <= 0 {
                diags.error(
                    "Invalid poll interval",
                    format!("poll_interval must be positive, got {}", poll_interval),
                    AttributePath::new("poll_interval"),
                );
            }
        }
        if let Value::Value(page_size) = self.page_size {
            if page_size < 1 || page_size > MAX_PAGE_SIZE as i64 {
                diags.error(
                    "Invalid page size",
                    format!(
                        "page_size must be between 1 and {}, got {}",
                        MAX_PAGE_SIZE, page_size
                    ),
                    AttributePath::new("page_size"),
                );
            }
        }
        if let Value::Value(timeouts) = &self.timeouts {
            let timeouts = [
                ("volume", timeouts.volume),
                ("snapshot", timeouts.snapshot),
                ("instance", timeouts.instance),
                ("load_balancer", timeouts.load_balancer),
            ];
            for (name, minutes) in timeouts {
                if let Value::Value(minutes) = minutes {
                    if minutes <= 0 {
                        diags.error(
                            "Invalid timeout",
                            format!("{} timeout must be positive, got {}", name, minutes),
                            AttributePath::new("timeouts").index(0).attribute(name),
                        );
                    }
                }
            }
        }
    }

    /// Build the settings, falling back to defaults for null, unknown or invalid values
    pub fn settings(&self) -> Settings {
        let default = Settings::default();
        let timeouts = self.timeouts.as_ref().map_or(default.timeouts, |timeouts| {
            Timeouts {
                volume: minutes(timeouts.volume, default.timeouts.volume),
                snapshot: minutes(timeouts.snapshot, default.timeouts.snapshot),
                instance: minutes(timeouts.instance, default.timeouts.instance),
                load_balancer: minutes(timeouts.load_balancer, default.timeouts.load_balancer),
            }
        });
        Settings {
            poll_interval: match self.poll_interval {
                Value::Value(secs) if secs > 0 => Duration::from_secs(secs as u64),
                _ => default.poll_interval,
            },
            page_size: match self.page_size {
                Value::Value(size) if size >= 1 && size <= MAX_PAGE_SIZE as i64 => size as u32,
                _ => default.page_size,
            },
            timeouts,
        }
    }
}

fn minutes(value: ValueNumber, default: Duration) -> Duration {
    match value {
        Value::Value(minutes) if minutes > 0 => Duration::from_secs(minutes as u64 * MINUTE),
        _ => default,
    }
}

/// Effective configuration of the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub poll_interval: Duration,
    pub page_size: u32,
    pub timeouts: Timeouts,
}

/// Maximum time to wait for a resource kind to converge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub volume: Duration,
    pub snapshot: Duration,
    pub instance: Duration,
    pub load_balancer: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            volume: Duration::from_secs(60 * MINUTE),
            snapshot: Duration::from_secs(60 * MINUTE),
            instance: Duration::from_secs(90 * MINUTE),
            load_balancer: Duration::from_secs(90 * MINUTE),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
            timeouts: Default::default(),
        }
    }
}

impl Settings {
    /// Polling configuration for a wait bounded by `timeout`
    pub fn wait_config(&self, timeout: Duration) -> WaitConfig {
        WaitConfig {
            poll_interval: self.poll_interval,
            timeout,
        }
    }
}

/// State shared by the provider and all its resources
#[derive(Debug, Default)]
pub struct ProviderContext {
    settings: OnceLock<Settings>,
    cancellation: CancellationToken,
}

impl ProviderContext {
    /// Context already configured with `settings`
    pub fn with_settings(settings: Settings) -> Self {
        let context = Self::default();
        _ = context.settings.set(settings);
        context
    }

    /// Record the settings, returns `false` if the context was already configured
    pub fn configure(&self, settings: Settings) -> bool {
        self.settings.set(settings).is_ok()
    }

    /// Current settings, defaults until the provider is configured
    pub fn settings(&self) -> Settings {
        self.settings.get().copied().unwrap_or_default()
    }

    /// Token cancelled when Terraform asks the provider to stop
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.child_token()
    }

    /// Cancel every in-flight operation
    pub fn stop(&self) {
        self.cancellation.cancel()
    }
}
