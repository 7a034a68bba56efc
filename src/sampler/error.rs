use crate::{cluster, metrics, mountinfo};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("mount sampler failed: {0}")]
    Mount(#[from] mountinfo::Error),
    #[error("cluster sampler failed: {0}")]
    Cluster(#[from] cluster::Error),
    #[error("failed to publish series: {0}")]
    Metrics(#[from] metrics::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
