//! Persistent volume mount point exporter: publishes which block devices back
//! which persistent volume claims on a node, together with the cluster's
//! storage-class parameters and node CPU capacities, as Prometheus metrics.
//!
//! Three samplers write into one shared [`metrics::Registry`] that the HTTP
//! endpoint renders on every scrape.
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub mod api;
pub mod build_info;
pub mod cluster;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod metrics;
pub mod mountinfo;
pub mod reconcile;
pub mod sampler;
pub mod storageclass;

pub use error::{Error, Result};

/// How long in-flight sampler I/O may take to finish after a shutdown signal.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Runs the exporter until a shutdown signal arrives or a task fails.
///
/// # Errors
///
/// Possible errors include:
/// - Missing or invalid environment variables.
/// - No usable in-cluster or kubeconfig credentials.
/// - Failure to bind the metrics listener.
/// - Failure to read the mount table or to list cluster objects.
pub async fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::from_env().map_err(Error::from)?;
    log::debug!("Configuration: {config:?}");

    let registry = Arc::new(metrics::Registry::with_process_metrics().map_err(Error::from)?);
    build_info::BuildInfo::from_build_env()
        .publish(&*registry)
        .map_err(Error::from)?;

    let client = Arc::new(
        cluster::KubeClusterClient::try_default()
            .await
            .map_err(Error::from)?,
    );
    let shutdown = CancellationToken::new();
    let mut tasks = spawn_tasks(&config, client, registry, &shutdown);

    let outcome = supervise(&mut tasks, &shutdown).await;
    shutdown.cancel();
    drain(tasks).await;
    outcome.map_err(Into::into)
}

fn spawn_tasks<C>(
    config: &config::Config,
    client: Arc<C>,
    registry: Arc<metrics::Registry>,
    shutdown: &CancellationToken,
) -> JoinSet<Result<()>>
where
    C: cluster::ClusterClient + 'static,
{
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();

    {
        let server = api::MetricsServer::new(Arc::clone(&registry));
        let addr = config.listen_addr.clone();
        let shutdown = shutdown.clone();
        tasks.spawn(async move { Ok(server.listen(&addr, shutdown).await?) });
    }
    {
        let client = Arc::clone(&client);
        let registry = Arc::clone(&registry);
        tasks.spawn(async move {
            let reported = sampler::report_node_cpus(&*client, &*registry).await?;
            log::info!("Published CPU capacity of {reported} nodes");
            Ok(())
        });
    }
    {
        let source = Arc::new(mountinfo::FileMountTable::select(config.mock_mounts));
        log::debug!("Reading mount table from `{}`", source.path().display());
        let sampler = sampler::MountSampler::new(source, Arc::clone(&registry), &config.node_name);
        let period = config.mount_poll_interval;
        let shutdown = shutdown.clone();
        tasks.spawn(async move { Ok(sampler.run(period, shutdown).await?) });
    }
    {
        let sampler = sampler::StorageClassSampler::new(client, registry, &config.node_name);
        let period = config.storage_class_poll_interval;
        let shutdown = shutdown.clone();
        tasks.spawn(async move { Ok(sampler.run(period, shutdown).await?) });
    }

    tasks
}

/// Waits for a shutdown signal or the first failing task.
///
/// Tasks finishing successfully (the one-shot CPU reporter) are not a reason to stop.
async fn supervise(tasks: &mut JoinSet<Result<()>>, shutdown: &CancellationToken) -> Result<()> {
    let signal = wait_for_shutdown_signal();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            received = &mut signal => {
                received?;
                shutdown.cancel();
                return Ok(());
            }
            joined = tasks.join_next() => match joined {
                Some(Ok(Ok(()))) => {}
                Some(Ok(Err(err))) => {
                    log::error!("{err}");
                    return Err(err);
                }
                Some(Err(err)) => {
                    log::error!("Task failed: {err}");
                    return Err(Error::Task(err));
                }
                None => return Ok(()),
            },
        }
    }
}

/// Gives cancelled tasks a grace period to finish, then aborts the rest.
async fn drain(mut tasks: JoinSet<Result<()>>) {
    let finished = tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, async {
        while let Some(joined) = tasks.join_next().await {
            if let Ok(Err(err)) = joined {
                log::warn!("Task failed during shutdown: {err}");
            }
        }
    })
    .await;
    if finished.is_err() {
        log::warn!("Aborting {} tasks still running after shutdown", tasks.len());
        tasks.abort_all();
    }
}

/// Wait for SIGINT or SIGTERM.
async fn wait_for_shutdown_signal() -> Result<()> {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .map_err(Error::Signal)?;
    tokio::select! {
        received = tokio::signal::ctrl_c() => {
            received.map_err(Error::Signal)?;
            log::info!("Received SIGINT, shutting down");
        }
        _ = sigterm.recv() => log::info!("Received SIGTERM, shutting down"),
    }
    Ok(())
}
