//! Cloud API client interface
//!
//! The provider does not talk HTTP itself: every call goes through the traits of this module,
//! implemented by the SDK client handed to [`CloudProvider`](crate::CloudProvider).
//! Optional fields of the remote models are plain [`Option`]s, as the SDK returns them.

use std::future::Future;

use thiserror::Error;

pub mod instance;
pub mod load_balancer;
pub mod registry;
pub mod snapshot;
pub mod volume;

pub use instance::{Instance, InstanceApi, InstanceCreate, InstanceStatus, InstanceUpdate};
pub use load_balancer::{
    Acl, AclSpec, Backend, BackendSpec, BackendUpdate, HealthCheck, HealthCheckSpec, Listener,
    ListenerSpec, LoadBalancer, LoadBalancerApi, LoadBalancerCreate, LoadBalancerStatus,
    LoadBalancerUpdate, Target,
};
pub use registry::{Registry, RegistryApi, RegistryCreate};
pub use snapshot::{Snapshot, SnapshotApi, SnapshotCreate, SnapshotStatus};
pub use volume::{Volume, VolumeApi, VolumeCreate, VolumeStatus, VolumeUpdate};

/// Errors returned by the cloud API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The requested object does not exist
    #[error("{0} not found")]
    NotFound(String),
    /// The API rejected the request
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    /// The request did not reach the API
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Check if the error means the object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApiError::NotFound(_) | ApiError::Api { status: 404, .. }
        )
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Page selection for list calls
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageRequest {
    pub page_size: u32,
    pub page_token: Option<String>,
}

/// One page of a list call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// Walk every page of a list call
///
/// The page size is passed explicitly to every request, pages are fetched sequentially.
pub async fn collect_pages<T, F, Fut>(page_size: u32, mut fetch: F) -> ApiResult<Vec<T>>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut page_token = None;
    loop {
        let page = fetch(PageRequest {
            page_size,
            page_token: page_token.take(),
        })
        .await?;
        items.extend(page.items);
        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => return Ok(items),
        }
    }
}

/// Error statuses shared by most kinds: `error`, `*_error` and `*_error_*` (eg: `creating_error_quota`)
pub(crate) fn has_error_marker(status: &str) -> bool {
    status == "error" || status.ends_with("_error") || status.contains("_error_")
}

/// Declare the status enum of a resource kind
///
/// Statuses unknown to the provider are kept verbatim in the `Other` variant.
macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $text,)*
                    Self::Other(status) => status.as_str(),
                }
            }
        }

        impl From<&str> for $name {
            fn from(status: &str) -> Self {
                match status {
                    $($text => Self::$variant,)*
                    other => Self::Other(other.to_owned()),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use status_enum;

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn not_found() {
        assert!(ApiError::NotFound("volume v-1".into()).is_not_found());
        assert!(ApiError::Api {
            status: 404,
            message: "gone".into()
        }
        .is_not_found());
        assert!(!ApiError::Api {
            status: 500,
            message: "oops".into()
        }
        .is_not_found());
    }

    #[test]
    fn error_markers() {
        assert!(has_error_marker("error"));
        assert!(has_error_marker("creating_error"));
        assert!(has_error_marker("creating_error_quota"));
        assert!(!has_error_marker("completed"));
        assert!(!has_error_marker("errored_out"));
    }

    #[tokio::test]
    async fn pages_are_walked_with_the_given_size() {
        let requests = Mutex::new(Vec::new());
        let items = collect_pages(2, |request: PageRequest| {
            requests.lock().unwrap().push(request.clone());
            async move {
                let page = match request.page_token.as_deref() {
                    None => Page {
                        items: vec![1, 2],
                        next_page_token: Some("p2".into()),
                    },
                    Some("p2") => Page {
                        items: vec![3],
                        next_page_token: Some(String::new()),
                    },
                    Some(other) => panic!("unexpected token {other}"),
                };
                Ok(page)
            }
        })
        .await
        .unwrap();
        assert_eq!(items, [1, 2, 3]);

        let requests = requests.into_inner().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|request| request.page_size == 2));
        assert_eq!(requests[1].page_token.as_deref(), Some("p2"));
    }
}
