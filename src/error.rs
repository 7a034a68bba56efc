use crate::{api, cluster, config, metrics, sampler};

/// Fatal errors ending the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] config::Error),
    #[error(transparent)]
    Cluster(#[from] cluster::Error),
    #[error(transparent)]
    Sampler(#[from] sampler::Error),
    #[error(transparent)]
    Api(#[from] api::Error),
    #[error("failed to set up metrics: {0}")]
    Metrics(#[from] metrics::Error),
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
    #[error("background task panicked or was aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;
