//! Wait for remote resources to converge
//!
//! Mutations on the cloud API return before the resource is ready:
//! the resource goes through transitional statuses until it reaches a terminal one.
//! [`wait_until_status`] polls the resource until it reaches the desired status,
//! fails fast on error statuses, and gives up on timeout or cancellation.

use std::{fmt::Display, future::Future, time::Duration};

use thiserror::Error;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::sdk::ApiError;

/// Status of a remote resource
pub trait Status: Clone + PartialEq + Display + Send + Sync {
    /// Check if the status is a terminal failure
    fn is_error(&self) -> bool;
}

/// Remote resource whose status can be polled
pub trait Polled: Send {
    type Status: Status;

    /// Kind of resource, used in messages
    const KIND: &'static str;

    /// Current status of the resource
    fn status(&self) -> Self::Status;

    /// Error message reported by the API, if any
    fn error_message(&self) -> Option<&str> {
        None
    }
}

/// Polling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Time between two fetches
    pub poll_interval: Duration,
    /// Overall time budget of the wait
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum WaitError {
    /// Fetching the resource failed
    #[error(transparent)]
    Fetch(#[from] ApiError),
    /// The resource reached an error status
    #[error("{kind} `{id}` reached error status `{status}`{}", message_suffix(.message))]
    ErrorState {
        kind: &'static str,
        id: String,
        status: String,
        message: Option<String>,
    },
    /// The resource did not reach the desired status in time
    #[error("timeout after {timeout:?} waiting for {kind} `{id}` to reach status `{desired}`")]
    Timeout {
        kind: &'static str,
        id: String,
        desired: String,
        timeout: Duration,
    },
    /// The wait was interrupted
    #[error("cancelled while waiting for {kind} `{id}` to reach status `{desired}`")]
    Cancelled {
        kind: &'static str,
        id: String,
        desired: String,
    },
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(message) if !message.is_empty() => format!(": {}", message),
        _ => String::new(),
    }
}

impl WaitError {
    /// Check if the wait failed because the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, WaitError::Fetch(err) if err.is_not_found())
    }
}

/// Poll a resource until it reaches `desired`
///
/// # Arguments
///
/// * `id` - identifier of the resource, used in messages
/// * `desired` - status to reach
/// * `config` - poll interval and overall timeout
/// * `cancellation` - token interrupting the wait
/// * `fetch` - get the current remote resource
///
/// # Remarks
///
/// The first fetch happens immediately.
/// Fetch errors abort the wait and are returned as is, inside [`WaitError::Fetch`]:
/// callers waiting for a deletion are responsible for interpreting a not-found error.
pub async fn wait_until_status<T, F, Fut>(
    id: &str,
    desired: T::Status,
    config: &WaitConfig,
    cancellation: &CancellationToken,
    mut fetch: F,
) -> Result<T, WaitError>
where
    T: Polled,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let deadline = Instant::now() + config.timeout;
    let cancelled = || WaitError::Cancelled {
        kind: T::KIND,
        id: id.to_owned(),
        desired: desired.to_string(),
    };
    let timeout = || WaitError::Timeout {
        kind: T::KIND,
        id: id.to_owned(),
        desired: desired.to_string(),
        timeout: config.timeout,
    };

    let mut attempt = 0u32;
    loop {
        if cancellation.is_cancelled() {
            warn!(kind = T::KIND, id, "wait cancelled");
            return Err(cancelled());
        }
        attempt += 1;

        let resource = tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                warn!(kind = T::KIND, id, "wait cancelled");
                return Err(cancelled());
            }
            resource = fetch() => resource?,
            _ = sleep_until(deadline) => {
                warn!(kind = T::KIND, id, %desired, "wait timed out");
                return Err(timeout());
            }
        };

        let status = resource.status();
        if status == desired {
            info!(kind = T::KIND, id, %status, attempt, "resource converged");
            return Ok(resource);
        }
        if status.is_error() {
            warn!(kind = T::KIND, id, %status, "resource reached an error status");
            return Err(WaitError::ErrorState {
                kind: T::KIND,
                id: id.to_owned(),
                status: status.to_string(),
                message: resource.error_message().map(str::to_owned),
            });
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(kind = T::KIND, id, %desired, %status, "wait timed out");
            return Err(timeout());
        }
        debug!(kind = T::KIND, id, %status, %desired, attempt, "waiting for resource");

        let next = (now + config.poll_interval).min(deadline);
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                warn!(kind = T::KIND, id, "wait cancelled");
                return Err(cancelled());
            }
            _ = sleep_until(next) => (),
        }
    }
}

/// Interpret a not-found error as the absence of the resource
///
/// Meant for callers waiting for a deletion to complete.
pub fn absent_when_not_found<T>(result: Result<T, WaitError>) -> Result<Option<T>, WaitError> {
    match result {
        Ok(resource) => Ok(Some(resource)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}
