//! Persistent-volume mounts as seen in the node's mount table.
//!
//! The mount table (`/proc/self/mounts` format) is read through a
//! [`MountTableSource`] and reduced to one [`MountRecord`] per block device
//! that backs a persistent volume claim mount.
mod error;
mod parser;
mod source;

pub use error::{Error, Result};
pub use parser::{MountRecord, parse_mount_line, parse_mount_table};
pub use source::{FileMountTable, MountTableSource, PROC_SELF_MOUNTS, TEST_FIXTURE};
