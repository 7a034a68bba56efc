use k8s_openapi::api::core::v1::Node;
use k8s_openapi::api::storage::v1::StorageClass;
use kube::api::{Api, ListParams};

use crate::storageclass::StorageClassObject;

use super::{ClusterClient, Error, NodeCapacity, Result};

/// Capacity reported for nodes that do not advertise a CPU quantity.
const UNKNOWN_CPU_CAPACITY: &str = "0";

/// [`ClusterClient`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: kube::Client,
}

impl KubeClusterClient {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    /// Connects using in-cluster configuration, falling back to the local kubeconfig.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Client`] if neither source yields usable credentials.
    pub async fn try_default() -> Result<Self> {
        let client = kube::Client::try_default()
            .await
            .map_err(|err| Error::Client(Box::new(err)))?;
        log::debug!(
            "Created cluster client, default namespace `{}`",
            client.default_namespace()
        );
        Ok(Self::new(client))
    }
}

impl ClusterClient for KubeClusterClient {
    async fn list_nodes(&self) -> Result<Vec<NodeCapacity>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let nodes = api
            .list(&ListParams::default())
            .await
            .map_err(|err| Error::ListNodes(Box::new(err)))?;
        Ok(nodes.items.iter().map(node_capacity).collect())
    }

    async fn list_storage_classes(&self) -> Result<Vec<StorageClassObject>> {
        let api: Api<StorageClass> = Api::all(self.client.clone());
        let classes = api
            .list(&ListParams::default())
            .await
            .map_err(|err| Error::ListStorageClasses(Box::new(err)))?;
        Ok(classes.items.into_iter().map(storage_class_object).collect())
    }
}

fn node_capacity(node: &Node) -> NodeCapacity {
    let cpu = node
        .status
        .as_ref()
        .and_then(|status| status.capacity.as_ref())
        .and_then(|capacity| capacity.get("cpu"))
        .map(|quantity| quantity.0.clone())
        .unwrap_or_else(|| UNKNOWN_CPU_CAPACITY.to_owned());

    NodeCapacity {
        name: node.metadata.name.clone().unwrap_or_default(),
        cpu,
    }
}

fn storage_class_object(class: StorageClass) -> StorageClassObject {
    StorageClassObject {
        name: class.metadata.name.unwrap_or_default(),
        parameters: class.parameters.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::api::core::v1::NodeStatus;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use super::*;

    fn meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn reads_cpu_capacity() {
        let node = Node {
            metadata: meta("worker-1"),
            status: Some(NodeStatus {
                capacity: Some(BTreeMap::from([
                    ("cpu".to_owned(), Quantity("8".to_owned())),
                    ("memory".to_owned(), Quantity("32Gi".to_owned())),
                ])),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert_eq!(
            node_capacity(&node),
            NodeCapacity {
                name: "worker-1".to_owned(),
                cpu: "8".to_owned(),
            }
        );
    }

    #[test]
    fn missing_status_reports_zero_cpus() {
        let node = Node {
            metadata: meta("worker-2"),
            ..Default::default()
        };
        assert_eq!(node_capacity(&node).cpu, "0");
    }

    #[test]
    fn maps_storage_class_parameters() {
        let class = StorageClass {
            metadata: meta("premium-rwo"),
            provisioner: "pd.csi.storage.gke.io".to_owned(),
            parameters: Some(BTreeMap::from([("type".to_owned(), "pd-ssd".to_owned())])),
            ..Default::default()
        };

        let object = storage_class_object(class);
        assert_eq!(object.name, "premium-rwo");
        assert_eq!(object.parameters.get("type").map(String::as_str), Some("pd-ssd"));
    }

    #[test]
    fn storage_class_without_parameters_maps_to_empty() {
        let class = StorageClass {
            metadata: meta("local-path"),
            ..Default::default()
        };
        assert!(storage_class_object(class).parameters.is_empty());
    }
}
