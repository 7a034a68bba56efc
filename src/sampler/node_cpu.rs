use crate::cluster::{ClusterClient, NodeCapacity};
use crate::metrics::{APP_LABEL_VALUE, MetricsRegistry, NODE_CPU_METRIC, Series};

use super::Result;

pub fn node_cpu_series(node: &NodeCapacity) -> Series {
    Series::new(NODE_CPU_METRIC)
        .label("app", APP_LABEL_VALUE)
        .label("node", &node.name)
        .label("cpus", &node.cpu)
}

/// Publishes one `node_info_cpu_count` series per cluster node.
///
/// Runs once per process; the series are never updated or removed.
/// Returns the number of nodes reported.
///
/// # Errors
///
/// Returns the cluster error if listing nodes fails, in which case nothing is
/// registered, or the registry error of a series that cannot be registered.
pub async fn report_node_cpus<C, R>(client: &C, registry: &R) -> Result<usize>
where
    C: ClusterClient,
    R: MetricsRegistry + ?Sized,
{
    let nodes = client.list_nodes().await?;
    for node in &nodes {
        log::info!("Node: {} | CPU: {}", node.name, node.cpu);
        registry.register(node_cpu_series(node), 1.0)?;
    }
    Ok(nodes.len())
}
