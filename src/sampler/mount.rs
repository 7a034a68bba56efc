use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::metrics::{APP_LABEL_VALUE, MOUNT_POINT_METRIC, MetricsRegistry, Series};
use crate::mountinfo::{self, MountRecord, MountTableSource, parse_mount_table};
use crate::reconcile::{Changes, Reconciler, SampledSet};

use super::Result;

/// Series published for one persistent volume mount on `node`.
pub fn mount_series(record: &MountRecord, node: &str) -> Series {
    Series::new(MOUNT_POINT_METRIC)
        .label("app", APP_LABEL_VALUE)
        .label("device", &record.device)
        .label("persistentvolume", &record.volume_claim_id)
        .label("volumename", &record.volume_claim_id)
        .label("node", node)
}

/// Follows the persistent volume mounts of one node.
pub struct MountSampler<S: ?Sized, R: ?Sized> {
    source: Arc<S>,
    registry: Arc<R>,
    node_name: String,
    reconciler: Reconciler<MountRecord>,
}

impl<S, R> MountSampler<S, R>
where
    S: MountTableSource + ?Sized + 'static,
    R: MetricsRegistry + ?Sized,
{
    pub fn new(source: Arc<S>, registry: Arc<R>, node_name: impl Into<String>) -> Self {
        Self {
            source,
            registry,
            node_name: node_name.into(),
            reconciler: Reconciler::new(),
        }
    }

    /// Runs one cycle: reads the mount table and reconciles the registry with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the mount table cannot be read, in which case the
    /// registry is left untouched, or if a series cannot be registered.
    pub async fn sample(&mut self) -> Result<Changes<String>> {
        let before = Instant::now();
        let source = Arc::clone(&self.source);
        let text = tokio::task::spawn_blocking(move || source.read_text())
            .await
            .map_err(mountinfo::Error::Task)??;

        let latest = parse_mount_table(&text);
        for record in latest.iter() {
            log::debug!(
                "Device: {} PVC: {}",
                record.device,
                record.volume_claim_id
            );
        }

        let node = self.node_name.as_str();
        let changes = self
            .reconciler
            .reconcile(latest, &*self.registry, |record| mount_series(record, node))?;
        log::trace!("Mount sampling took {} microseconds", before.elapsed().as_micros());
        Ok(changes)
    }

    /// Samples every `period` until `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns the first sampling error; the loop does not retry.
    pub async fn run(mut self, period: Duration, shutdown: CancellationToken) -> Result<()> {
        let mut ticker = super::ticker(period);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    log::debug!("Mount sampler stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let changes = self.sample().await?;
                    if !changes.is_empty() {
                        log::debug!(
                            "Mount sampler added {:?}, removed {:?}",
                            changes.added,
                            changes.removed
                        );
                    }
                }
            }
        }
    }

    pub fn published(&self) -> &SampledSet<MountRecord> {
        self.reconciler.published()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsutil::FileReadError;
    use crate::metrics::Registry;
    use crate::sampler::Error;
    use std::sync::Mutex;

    /// Mount table whose contents tests replace between cycles.
    #[derive(Debug, Default)]
    struct ScriptedMountTable {
        text: Mutex<Option<String>>,
    }

    impl ScriptedMountTable {
        fn set(&self, text: Option<&str>) {
            *self.text.lock().unwrap() = text.map(str::to_owned);
        }
    }

    impl MountTableSource for ScriptedMountTable {
        fn read_text(&self) -> mountinfo::Result<String> {
            self.text.lock().unwrap().clone().ok_or_else(|| {
                mountinfo::Error::Read(FileReadError::Open {
                    path: "/proc/self/mounts".into(),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                })
            })
        }
    }

    fn mount_line(device: &str, claim: &str) -> String {
        format!(
            "/dev/{device} /var/lib/kubelet/pods/uid/volumes/kubernetes.io~csi/{claim}/mount ext4 rw,relatime 0 0\n"
        )
    }

    fn record(device: &str, claim: &str) -> MountRecord {
        MountRecord {
            device: device.to_owned(),
            volume_claim_id: claim.to_owned(),
        }
    }

    #[test]
    fn series_carries_device_claim_and_node() {
        let series = mount_series(&record("sdb1", "pvc-1234abcd"), "worker-1");
        assert_eq!(
            series.to_string(),
            "persistentvolume_mount_point_info{app=\"pv-mount-point-exporter\",device=\"sdb1\",\
             persistentvolume=\"pvc-1234abcd\",volumename=\"pvc-1234abcd\",node=\"worker-1\"}"
        );
    }

    #[tokio::test]
    async fn replaces_vanished_devices_and_keeps_unchanged_ones() {
        let source = Arc::new(ScriptedMountTable::default());
        let registry = Arc::new(Registry::new());
        let mut sampler = MountSampler::new(Arc::clone(&source), Arc::clone(&registry), "node-a");

        source.set(Some(&format!(
            "{}{}",
            mount_line("sda1", "pvc-a"),
            mount_line("sdb1", "pvc-b")
        )));
        let changes = sampler.sample().await.unwrap();
        assert_eq!(changes.added, vec!["sda1".to_owned(), "sdb1".to_owned()]);
        assert!(changes.removed.is_empty());

        source.set(Some(&format!(
            "{}{}",
            mount_line("sdb1", "pvc-b"),
            mount_line("sdc1", "pvc-c")
        )));
        let changes = sampler.sample().await.unwrap();
        assert_eq!(changes.added, vec!["sdc1".to_owned()]);
        assert_eq!(changes.removed, vec!["sda1".to_owned()]);

        let mut expected = vec![
            mount_series(&record("sdb1", "pvc-b"), "node-a"),
            mount_series(&record("sdc1", "pvc-c"), "node-a"),
        ];
        expected.sort();
        assert_eq!(registry.series(), expected);
    }

    #[tokio::test]
    async fn removes_series_of_devices_with_escaped_characters() {
        let source = Arc::new(ScriptedMountTable::default());
        let registry = Arc::new(Registry::new());
        let mut sampler =
            MountSampler::new(Arc::clone(&source), Arc::clone(&registry), "node\"a\\");
        let device = "sd\"q\\z\u{1}";

        source.set(Some(&format!(
            "{}{}",
            mount_line(device, "pvc-a"),
            mount_line("sdb1", "pvc-b")
        )));
        let changes = sampler.sample().await.unwrap();
        assert_eq!(changes.added, vec![device.to_owned(), "sdb1".to_owned()]);

        let text = registry.render_text().unwrap();
        assert!(text.contains(r#"device="sd\"q\\z""#), "{text}");
        assert!(text.contains(r#"node="node\"a\\""#), "{text}");
        assert_eq!(
            registry.value(&mount_series(&record(device, "pvc-a"), "node\"a\\")),
            Some(1.0)
        );

        source.set(Some(&mount_line("sdb1", "pvc-b")));
        let changes = sampler.sample().await.unwrap();
        assert_eq!(changes.removed, vec![device.to_owned()]);

        assert_eq!(registry.len(), 1);
        let text = registry.render_text().unwrap();
        assert!(!text.contains("sd\\\"q"), "{text}");
        assert!(text.contains(r#"device="sdb1""#));
    }

    #[tokio::test]
    async fn read_failure_leaves_registry_untouched() {
        let source = Arc::new(ScriptedMountTable::default());
        let registry = Arc::new(Registry::new());
        let mut sampler = MountSampler::new(Arc::clone(&source), Arc::clone(&registry), "node-a");

        source.set(Some(&mount_line("sda1", "pvc-a")));
        sampler.sample().await.unwrap();

        source.set(None);
        let err = sampler.sample().await.unwrap_err();
        assert!(matches!(err, Error::Mount(_)));
        assert_eq!(registry.len(), 1);
        assert_eq!(sampler.published().len(), 1);
    }

    #[tokio::test]
    async fn empty_table_clears_series() {
        let source = Arc::new(ScriptedMountTable::default());
        let registry = Arc::new(Registry::new());
        let mut sampler = MountSampler::new(Arc::clone(&source), Arc::clone(&registry), "node-a");

        source.set(Some(&mount_line("sda1", "pvc-a")));
        sampler.sample().await.unwrap();
        source.set(Some("proc /proc proc rw 0 0\n"));
        let changes = sampler.sample().await.unwrap();

        assert_eq!(changes.removed, vec!["sda1".to_owned()]);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn run_samples_immediately_and_stops_on_cancel() {
        let source = Arc::new(ScriptedMountTable::default());
        source.set(Some(&mount_line("sda1", "pvc-a")));
        let registry = Arc::new(Registry::new());
        let sampler = MountSampler::new(Arc::clone(&source), Arc::clone(&registry), "node-a");
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(sampler.run(Duration::from_secs(3600), shutdown.clone()));
        while registry.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        shutdown.cancel();

        handle.await.unwrap().unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn run_stops_on_read_failure() {
        let source = Arc::new(ScriptedMountTable::default());
        let registry = Arc::new(Registry::new());
        let sampler = MountSampler::new(source, registry, "node-a");

        let result = sampler
            .run(Duration::from_secs(3600), CancellationToken::new())
            .await;
        assert!(result.is_err());
    }
}
