//! The periodic samplers publishing observed state into the shared registry.
//!
//! - [`MountSampler`] follows the node's persistent volume mounts.
//! - [`StorageClassSampler`] follows the cluster's storage classes.
//! - [`report_node_cpus`] publishes node CPU capacities once.
//!
//! Each sampler owns its published state exclusively; only the registry is shared.
mod error;
mod mount;
mod node_cpu;
mod storage_class;

pub use error::{Error, Result};
pub use mount::{MountSampler, mount_series};
pub use node_cpu::{node_cpu_series, report_node_cpus};
pub use storage_class::{StorageClassSampler, storage_class_series};

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

/// Interval whose first tick completes immediately and which does not burst
/// to catch up after a slow cycle.
fn ticker(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
