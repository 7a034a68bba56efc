use std::path::{Path, PathBuf};

use crate::fsutil;

use super::Result;

/// The kernel-exposed mount table of the current process.
pub const PROC_SELF_MOUNTS: &str = "/proc/self/mounts";

/// Fixture read instead of [`PROC_SELF_MOUNTS`] when mount mocking is enabled.
pub const TEST_FIXTURE: &str = "testing/proc-self-mounts.txt";

/// Capability providing the raw text of a mount table.
pub trait MountTableSource: Send + Sync {
    fn read_text(&self) -> Result<String>;
}

/// Reads the mount table from a file on every call.
#[derive(Debug, Clone)]
pub struct FileMountTable {
    path: PathBuf,
}

impl FileMountTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Selects the real mount table, or the test fixture if `mock` is set.
    pub fn select(mock: bool) -> Self {
        if mock {
            log::info!(
                "Mount mocking enabled, reading `{TEST_FIXTURE}` instead of `{PROC_SELF_MOUNTS}`"
            );
            Self::new(TEST_FIXTURE)
        } else {
            Self::new(PROC_SELF_MOUNTS)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MountTableSource for FileMountTable {
    fn read_text(&self) -> Result<String> {
        Ok(fsutil::read_to_string(&self.path)?)
    }
}
