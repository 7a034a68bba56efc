use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, GaugeVec, Opts, TextEncoder};

use super::catalogue::help_text;
use super::sanitize::unescape_label_value;
use super::{Error, Result, Series};

/// Capability the samplers publish through.
///
/// Implementations must tolerate concurrent writers and a concurrent reader
/// gathering the exposition text.
pub trait MetricsRegistry: Send + Sync {
    /// Registers `series` with `value` unless it is already present.
    ///
    /// Returns `true` if the series was newly created. An existing series keeps
    /// the value it was first registered with.
    fn register(&self, series: Series, value: f64) -> Result<bool>;

    /// Removes `series`, returning `true` if it was present.
    fn unregister(&self, series: &Series) -> bool;

    /// Snapshot of every metric family, ready for encoding.
    fn gather(&self) -> Vec<MetricFamily>;

    /// Renders [`gather`](Self::gather) in the Prometheus text exposition format.
    fn render_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.gather(), &mut buffer)
            .map_err(Error::Encode)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl<R: MetricsRegistry + ?Sized> MetricsRegistry for Arc<R> {
    fn register(&self, series: Series, value: f64) -> Result<bool> {
        (**self).register(series, value)
    }

    fn unregister(&self, series: &Series) -> bool {
        (**self).unregister(series)
    }

    fn gather(&self) -> Vec<MetricFamily> {
        (**self).gather()
    }
}

#[derive(Clone)]
struct Family {
    label_names: Vec<&'static str>,
    gauges: GaugeVec,
}

/// Registry backed by a [`prometheus::Registry`] with one [`GaugeVec`] per
/// metric family.
///
/// A family's label names are fixed by the first series registered under it.
#[derive(Default)]
pub struct Registry {
    inner: prometheus::Registry,
    families: DashMap<&'static str, Family>,
    series: DashMap<Series, prometheus::Gauge>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that also reports CPU, memory and file descriptor usage of
    /// this process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Prometheus`] if the process collector cannot be registered.
    pub fn with_process_metrics() -> Result<Self> {
        let registry = Self::new();
        #[cfg(target_os = "linux")]
        registry
            .inner
            .register(Box::new(
                prometheus::process_collector::ProcessCollector::for_self(),
            ))
            .map_err(|source| Error::Prometheus {
                name: "process",
                source,
            })?;
        Ok(registry)
    }

    fn family(&self, series: &Series) -> Result<GaugeVec> {
        let label_names = series.label_names();
        match self.families.entry(series.name()) {
            Entry::Occupied(entry) => {
                let family = entry.get();
                if family.label_names != label_names {
                    return Err(Error::LabelMismatch {
                        series: series.to_string(),
                        expected: family.label_names.clone(),
                    });
                }
                Ok(family.gauges.clone())
            }
            Entry::Vacant(entry) => {
                let prometheus_error = |source| Error::Prometheus {
                    name: series.name(),
                    source,
                };
                let opts = Opts::new(series.name(), help_text(series.name()));
                let gauges = GaugeVec::new(opts, &label_names).map_err(prometheus_error)?;
                self.inner
                    .register(Box::new(gauges.clone()))
                    .map_err(prometheus_error)?;
                entry.insert(Family {
                    label_names,
                    gauges: gauges.clone(),
                });
                Ok(gauges)
            }
        }
    }
}

fn plain_label_values(series: &Series) -> Vec<String> {
    series.label_values().map(unescape_label_value).collect()
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

impl MetricsRegistry for Registry {
    fn register(&self, series: Series, value: f64) -> Result<bool> {
        let family = self.family(&series)?;
        match self.series.entry(series) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                let values = plain_label_values(entry.key());
                let gauge = family
                    .get_metric_with_label_values(&as_strs(&values))
                    .map_err(|source| Error::Prometheus {
                        name: entry.key().name(),
                        source,
                    })?;
                gauge.set(value);
                entry.insert(gauge);
                Ok(true)
            }
        }
    }

    fn unregister(&self, series: &Series) -> bool {
        let Entry::Occupied(entry) = self.series.entry(series.clone()) else {
            return false;
        };
        if let Some(family) = self.families.get(series.name()) {
            let values = plain_label_values(series);
            if let Err(err) = family.gauges.remove_label_values(&as_strs(&values)) {
                log::warn!("Series {series} was missing from its gauge family: {err}");
            }
        }
        entry.remove();
        true
    }

    fn gather(&self) -> Vec<MetricFamily> {
        self.inner.gather()
    }
}

#[cfg(test)]
impl Registry {
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn contains(&self, series: &Series) -> bool {
        self.series.contains_key(series)
    }

    /// Current value of `series`, if registered.
    pub fn value(&self, series: &Series) -> Option<f64> {
        self.series.get(series).map(|gauge| gauge.get())
    }

    /// Snapshot of all registered series, sorted.
    pub fn series(&self) -> Vec<Series> {
        let mut out: Vec<Series> = self.series.iter().map(|e| e.key().clone()).collect();
        out.sort();
        out
    }
}
