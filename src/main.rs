/// Entry point for the persistent volume mount point exporter.
///
/// Publishes the node's persistent volume mounts, the cluster's storage classes
/// and the cluster nodes' CPU capacity as Prometheus metrics.
///
/// # Errors
///
/// Returns an error if initialization fails (e.g., missing environment variables
/// or no usable cluster credentials) or if any sampler fails.
///
/// # Examples
///
/// ```bash
/// METRICS_LISTEN=:9100 K8S_NODE_NAME=worker-1 MOCK_MOUNT_OUTPUT=1 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    pv_mount_point_exporter::run().await
}
