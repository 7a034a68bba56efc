use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::cluster::ClusterClient;
use crate::metrics::{APP_LABEL_VALUE, MetricsRegistry, STORAGE_CLASS_METRIC, Series};
use crate::reconcile::{Changes, Reconciler, SampledSet};
use crate::storageclass::{StorageClassDescriptor, describe_all};

use super::Result;

pub fn storage_class_series(descriptor: &StorageClassDescriptor, node: &str) -> Series {
    Series::new(STORAGE_CLASS_METRIC)
        .label("app", APP_LABEL_VALUE)
        .label("storageclass", &descriptor.name)
        .label("pd_type", &descriptor.composite_type)
        .label("type", &descriptor.disk_type)
        .label("replication_type", &descriptor.replication_type)
        .label("node", node)
}

/// Follows the cluster's storage classes.
///
/// A class is identified by name alone: editing the parameters of an existing
/// class does not republish its series until the class disappears.
pub struct StorageClassSampler<C, R: ?Sized> {
    client: Arc<C>,
    registry: Arc<R>,
    node_name: String,
    reconciler: Reconciler<StorageClassDescriptor>,
}

impl<C, R> StorageClassSampler<C, R>
where
    C: ClusterClient,
    R: MetricsRegistry + ?Sized,
{
    pub fn new(client: Arc<C>, registry: Arc<R>, node_name: impl Into<String>) -> Self {
        Self {
            client,
            registry,
            node_name: node_name.into(),
            reconciler: Reconciler::new(),
        }
    }

    /// Runs one cycle: lists storage classes and reconciles the registry with them.
    ///
    /// # Errors
    ///
    /// Returns the cluster error if listing fails; the registry is left untouched.
    pub async fn sample(&mut self) -> Result<Changes<String>> {
        let classes = self.client.list_storage_classes().await?;
        let latest = describe_all(&classes);
        for descriptor in latest.iter() {
            log::debug!(
                "StorageClass: {}, PD type: {}, disk type: {}, replication type: {}",
                descriptor.name,
                descriptor.composite_type,
                descriptor.disk_type,
                descriptor.replication_type
            );
        }

        let node = self.node_name.as_str();
        Ok(self
            .reconciler
            .reconcile(latest, &*self.registry, |descriptor| {
                storage_class_series(descriptor, node)
            })?)
    }

    /// Samples every `period` until `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns the first cluster error; the loop does not retry.
    pub async fn run(mut self, period: Duration, shutdown: CancellationToken) -> Result<()> {
        let mut ticker = super::ticker(period);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    log::debug!("Storage class sampler stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let changes = self.sample().await?;
                    if !changes.is_empty() {
                        log::debug!(
                            "Storage class sampler added {:?}, removed {:?}",
                            changes.added,
                            changes.removed
                        );
                    }
                }
            }
        }
    }

    pub fn published(&self) -> &SampledSet<StorageClassDescriptor> {
        self.reconciler.published()
    }
}
