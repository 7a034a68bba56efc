//! Storage-class descriptors derived from cluster `StorageClass` parameters.
use std::collections::BTreeMap;

use crate::reconcile::{Keyed, SampledSet};

/// Parameter holding the disk type, e.g. `pd-ssd`.
pub const TYPE_PARAMETER: &str = "type";
/// Parameter holding the replication type, e.g. `regional-pd`.
pub const REPLICATION_TYPE_PARAMETER: &str = "replication-type";
/// Replication type assumed when a storage class does not set one.
pub const DEFAULT_REPLICATION_TYPE: &str = "zonal-pd";

/// A storage class as listed from the cluster, reduced to what is needed here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageClassObject {
    pub name: String,
    pub parameters: BTreeMap<String, String>,
}

/// Disk and replication type of one storage class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageClassDescriptor {
    pub name: String,
    pub disk_type: String,
    pub replication_type: String,
    /// `<disk_type>-<replication_type>`, e.g. `pd-ssd-zonal-pd`.
    pub composite_type: String,
}

impl StorageClassDescriptor {
    /// Builds a descriptor, or `None` if `parameters` has no disk type.
    pub fn from_parameters(name: &str, parameters: &BTreeMap<String, String>) -> Option<Self> {
        let disk_type = parameters.get(TYPE_PARAMETER)?;
        let replication_type = parameters
            .get(REPLICATION_TYPE_PARAMETER)
            .map(String::as_str)
            .unwrap_or(DEFAULT_REPLICATION_TYPE);

        Some(Self {
            name: name.to_owned(),
            disk_type: disk_type.clone(),
            replication_type: replication_type.to_owned(),
            composite_type: format!("{disk_type}-{replication_type}"),
        })
    }
}

impl Keyed for StorageClassDescriptor {
    type Key = String;

    fn key(&self) -> Self::Key {
        self.name.clone()
    }
}

/// Builds the observed descriptor set, dropping classes without a disk type.
pub fn describe_all<'a>(
    classes: impl IntoIterator<Item = &'a StorageClassObject>,
) -> SampledSet<StorageClassDescriptor> {
    classes
        .into_iter()
        .filter_map(|class| StorageClassDescriptor::from_parameters(&class.name, &class.parameters))
        .collect()
}
