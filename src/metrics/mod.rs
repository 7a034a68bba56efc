//! Metrics registry shared by all samplers and the exposition endpoint.
//!
//! Series are identified by a structured [`Series`] value (metric name plus ordered
//! label pairs). Label values are sanitized when the series is built; the
//! [`Registry`] maps each series onto a child of its family's
//! [`prometheus::GaugeVec`] and leaves text encoding to [`prometheus::TextEncoder`].
mod catalogue;
mod error;
mod registry;
mod sanitize;
mod series;

pub use catalogue::{
    BUILD_INFO_METRIC, BUILD_TIME_METRIC, MOUNT_POINT_METRIC, NODE_CPU_METRIC,
    STORAGE_CLASS_METRIC,
};
pub use error::{Error, Result};
pub use registry::{MetricsRegistry, Registry};
pub use sanitize::sanitize_label_value;
pub use series::Series;

/// Value of the `app` label attached to every series this exporter publishes.
pub const APP_LABEL_VALUE: &str = "pv-mount-point-exporter";
