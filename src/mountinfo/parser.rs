//! Mount table line parser.
//!
//! Only lines whose source is a `/dev/<device>` block device and whose mount
//! point contains a `pvc-<id>/mount` segment are of interest, e.g. the kubelet
//! CSI mount
//! `/dev/sdb1 /var/lib/kubelet/pods/<uid>/volumes/kubernetes.io~csi/pvc-<id>/mount ext4 rw 0 0`.
//! Every other line is ignored.
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::reconcile::{Keyed, SampledSet};

static PV_MOUNT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/dev/(\S+) .*/(pvc-[a-f0-9-]+)/mount").expect("mount line pattern is valid")
});

/// A block device backing a persistent volume claim mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    /// Device name without the `/dev/` prefix, e.g. `sdb1`.
    pub device: String,
    /// Volume claim identifier, e.g. `pvc-1234abcd-...`.
    pub volume_claim_id: String,
}

impl Keyed for MountRecord {
    type Key = String;

    fn key(&self) -> Self::Key {
        self.device.clone()
    }
}

/// Parses one mount table line, returning `None` if it is not a persistent volume mount.
pub fn parse_mount_line(line: &str) -> Option<MountRecord> {
    let captures = PV_MOUNT_LINE.captures(line)?;
    Some(MountRecord {
        device: captures.get(1)?.as_str().to_owned(),
        volume_claim_id: captures.get(2)?.as_str().to_owned(),
    })
}

/// Parses a whole mount table.
///
/// If a device appears on several lines, the last one wins.
pub fn parse_mount_table(text: &str) -> SampledSet<MountRecord> {
    text.lines().filter_map(parse_mount_line).collect()
}
