#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create cluster client from in-cluster or kubeconfig configuration: {0}")]
    Client(#[source] Box<kube::Error>),
    #[error("failed to list nodes: {0}")]
    ListNodes(#[source] Box<kube::Error>),
    #[error("failed to list storage classes: {0}")]
    ListStorageClasses(#[source] Box<kube::Error>),
}

pub type Result<T> = std::result::Result<T, Error>;
