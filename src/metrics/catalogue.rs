//! Names and help texts of the gauge families this exporter publishes.

pub const MOUNT_POINT_METRIC: &str = "persistentvolume_mount_point_info";
pub const STORAGE_CLASS_METRIC: &str = "storageclass_parameters";
pub const NODE_CPU_METRIC: &str = "node_info_cpu_count";
pub const BUILD_INFO_METRIC: &str = "signicat_build_info";
pub const BUILD_TIME_METRIC: &str = "signicat_build_time";

/// Help text emitted on the `# HELP` line of family `name`.
pub fn help_text(name: &str) -> &'static str {
    match name {
        MOUNT_POINT_METRIC => "Persistent volume claims mounted on this node, keyed by block device.",
        STORAGE_CLASS_METRIC => "Disk type and replication parameters of the cluster's storage classes.",
        NODE_CPU_METRIC => "CPU capacity of every cluster node, carried in the cpus label.",
        BUILD_INFO_METRIC => "Version, revision and branch this exporter was built from.",
        BUILD_TIME_METRIC => "Unix time this exporter was built at.",
        _ => "Gauge published by the persistent volume mount point exporter.",
    }
}
