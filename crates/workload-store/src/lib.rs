//! Kubernetes Workload Store
//!
//! Typed access to the objects the presetter controllers read and write:
//! Deployments, Pods, and ResourcePresets. The `WorkloadStore` trait is the
//! seam between reconciliation logic and the API server, so reconcilers can
//! be unit tested against an in-memory implementation.
//!
//! # Example
//!
//! ```no_run
//! use workload_store::{KubeStore, WorkloadStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = kube::Client::try_default().await?;
//! let store = KubeStore::new(client);
//!
//! // Fetch a workload and the preset it references
//! let deployment = store.get_deployment("default", "web").await?;
//! let preset = store.get_preset("default", "small").await?;
//! # let _ = (deployment, preset);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Optimistic concurrency**: updates carry the object's version token
//!   and surface conflicts as a dedicated error
//! - **Error taxonomy**: NotFound and Conflict are first-class, everything
//!   else stays a raw API error
//! - **test-util**: in-memory `MockStore` with failure injection and
//!   operation counters

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod store_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeStore;
pub use error::StoreError;
pub use store_trait::WorkloadStore;
#[cfg(feature = "test-util")]
pub use mock::MockStore;
