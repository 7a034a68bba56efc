//! Diffing of freshly observed state against the state already published as series.
//!
//! A [`Reconciler`] owns the previously published [`SampledSet`]. Each cycle it
//! receives the latest observation, registers series for new keys, unregisters
//! series for vanished keys and leaves everything else alone. After a completed
//! cycle the series owned by the reconciler are exactly the image of the
//! published set under the caller's key-to-series mapping.
use std::collections::HashMap;
use std::collections::hash_map;
use std::hash::Hash;

use crate::metrics::{self, MetricsRegistry, Series};

/// A record with a stable identity key.
pub trait Keyed {
    type Key: Clone + Eq + Hash + Ord + std::fmt::Debug;

    fn key(&self) -> Self::Key;
}

/// Mapping from identity key to record describing "what is currently true".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledSet<T: Keyed> {
    records: HashMap<T::Key, T>,
}

impl<T: Keyed> Default for SampledSet<T> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
        }
    }
}

impl<T: Keyed> SampledSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record`, replacing any record with the same key.
    pub fn insert(&mut self, record: T) -> Option<T> {
        self.records.insert(record.key(), record)
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<T::Key> {
        let mut keys: Vec<T::Key> = self.records.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.values()
    }
}

impl<T: Keyed> FromIterator<T> for SampledSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

/// Keys touched by one reconciliation cycle, each list sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changes<K> {
    pub added: Vec<K>,
    pub removed: Vec<K>,
}

impl<K> Changes<K> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Keeps a registry in sync with the latest observation of one record type.
#[derive(Debug)]
pub struct Reconciler<T: Keyed> {
    published: SampledSet<T>,
}

impl<T: Keyed> Default for Reconciler<T> {
    fn default() -> Self {
        Self {
            published: SampledSet::new(),
        }
    }
}

impl<T: Keyed> Reconciler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The set whose series are currently registered.
    pub fn published(&self) -> &SampledSet<T> {
        &self.published
    }

    /// Applies `latest` to `registry`.
    ///
    /// New keys get their series registered with a constant value of `1`;
    /// keys no longer observed get the series built from the *published*
    /// record unregistered, so removal always matches what was registered.
    /// A key present in both sets is untouched even if the record's other
    /// fields changed.
    ///
    /// # Errors
    ///
    /// Returns the registry error of the first series that cannot be
    /// registered. Removals already applied stay applied, and the failed record
    /// is left out of the published set so the next cycle retries it.
    pub fn reconcile<R>(
        &mut self,
        latest: SampledSet<T>,
        registry: &R,
        series_for: impl Fn(&T) -> Series,
    ) -> metrics::Result<Changes<T::Key>>
    where
        R: MetricsRegistry + ?Sized,
    {
        let mut removed: Vec<T::Key> = self
            .published
            .records
            .keys()
            .filter(|key| !latest.contains_key(key))
            .cloned()
            .collect();
        removed.sort();

        for key in &removed {
            if let Some(record) = self.published.records.remove(key) {
                let series = series_for(&record);
                if !registry.unregister(&series) {
                    log::warn!("Series {series} was already absent from the registry");
                }
                log::info!("Unregistered {series}");
            }
        }

        let mut added = Vec::new();
        for (key, record) in latest.records {
            if let hash_map::Entry::Vacant(entry) = self.published.records.entry(key) {
                let series = series_for(&record);
                registry.register(series.clone(), 1.0)?;
                log::info!("Registered {series}");
                added.push(entry.key().clone());
                entry.insert(record);
            }
        }
        added.sort();

        Ok(Changes { added, removed })
    }
}
