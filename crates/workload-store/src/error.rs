//! Workload store errors

use thiserror::Error;

/// Errors that can occur when reading or writing workload objects
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object does not exist
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        /// Object kind
        kind: &'static str,
        /// Object namespace
        namespace: String,
        /// Object name
        name: String,
    },

    /// Optimistic-concurrency failure: the version token was stale, or a
    /// create collided with an existing object
    #[error("conflict writing {kind} {namespace}/{name}: {message}")]
    Conflict {
        /// Object kind
        kind: &'static str,
        /// Object namespace
        namespace: String,
        /// Object name
        name: String,
        /// Server-reported conflict detail
        message: String,
    },

    /// Object lacks metadata the store needs to address it
    #[error("object is missing metadata field: {0}")]
    MissingMetadata(&'static str),

    /// Any other Kubernetes API failure
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),
}

impl StoreError {
    /// Classify a raw API error for one addressed object
    pub(crate) fn classify(kind: &'static str, namespace: &str, name: &str, err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) if resp.code == 404 => Self::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            kube::Error::Api(resp) if resp.code == 409 => Self::Conflict {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: resp.message,
            },
            other => Self::Api(other),
        }
    }

    /// True when the object simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for optimistic-concurrency failures
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
