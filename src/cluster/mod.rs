//! Read access to cluster objects the samplers observe.
//!
//! Samplers depend on the [`ClusterClient`] capability; the production
//! implementation is [`KubeClusterClient`].
mod error;
mod kubernetes;

use std::future::Future;

pub use error::{Error, Result};
pub use kubernetes::KubeClusterClient;

use crate::storageclass::StorageClassObject;

/// Advertised CPU capacity of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCapacity {
    pub name: String,
    /// Capacity quantity as advertised, e.g. `8` or `3920m`.
    pub cpu: String,
}

pub trait ClusterClient: Send + Sync {
    fn list_nodes(&self) -> impl Future<Output = Result<Vec<NodeCapacity>>> + Send;

    fn list_storage_classes(
        &self,
    ) -> impl Future<Output = Result<Vec<StorageClassObject>>> + Send;
}
