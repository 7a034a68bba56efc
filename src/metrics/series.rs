use std::fmt;

use super::sanitize::sanitize_label_value;

/// Identity of one labeled series inside the registry.
///
/// Two series are the same when they share the metric name and the exact
/// ordered label pairs. Label values are sanitized on insertion, so building a
/// series from the same record always yields the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Series {
    name: &'static str,
    labels: Vec<(&'static str, String)>,
}

impl Series {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            labels: Vec::new(),
        }
    }

    /// Appends a label, sanitizing `value`.
    pub fn label(mut self, key: &'static str, value: impl AsRef<str>) -> Self {
        self.labels.push((key, sanitize_label_value(value.as_ref())));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(super) fn label_names(&self) -> Vec<&'static str> {
        self.labels.iter().map(|(key, _)| *key).collect()
    }

    pub(super) fn label_values(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|(_, value)| value.as_str())
    }

    /// Returns the sanitized value of label `key`, if present.
    #[cfg(test)]
    pub fn label_value(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        if self.labels.is_empty() {
            return Ok(());
        }
        f.write_str("{")?;
        for (i, (key, value)) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}=\"{value}\"")?;
        }
        f.write_str("}")
    }
}
