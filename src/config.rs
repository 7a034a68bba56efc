//! Runtime configuration read from the process environment.
use std::time::Duration;

pub const METRICS_LISTEN: &str = "METRICS_LISTEN";
pub const NODE_NAME: &str = "K8S_NODE_NAME";
pub const MOCK_MOUNT_OUTPUT: &str = "MOCK_MOUNT_OUTPUT";
pub const MOUNT_POLL_INTERVAL: &str = "MOUNT_POLL_INTERVAL_SECONDS";
pub const STORAGE_CLASS_POLL_INTERVAL: &str = "STORAGE_CLASS_POLL_INTERVAL_SECONDS";

const DEFAULT_MOUNT_POLL_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_STORAGE_CLASS_POLL_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("environment variable `{0}` must be set")]
    Missing(&'static str),
    #[error("environment variable `{name}` has invalid value `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the exposition endpoint binds, e.g. `0.0.0.0:9100`.
    pub listen_addr: String,
    /// Name of the node this process runs on.
    pub node_name: String,
    /// Read the mount table fixture instead of the kernel mount table.
    pub mock_mounts: bool,
    pub mount_poll_interval: Duration,
    pub storage_class_poll_interval: Duration,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Missing`] if `METRICS_LISTEN` or `K8S_NODE_NAME` is unset
    /// or empty, and [`Error::Invalid`] for an unparseable poll interval.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(Error::Missing(name))
        };
        let listen_addr = normalize_listen_addr(required(METRICS_LISTEN)?);
        let node_name = required(NODE_NAME)?;

        let mock_mounts = lookup(MOCK_MOUNT_OUTPUT).is_some_and(|value| !value.is_empty());

        let mount_poll_interval = parse_interval(MOUNT_POLL_INTERVAL, lookup(MOUNT_POLL_INTERVAL))?
            .unwrap_or(DEFAULT_MOUNT_POLL_INTERVAL);
        let storage_class_poll_interval = parse_interval(
            STORAGE_CLASS_POLL_INTERVAL,
            lookup(STORAGE_CLASS_POLL_INTERVAL),
        )?
        .unwrap_or(DEFAULT_STORAGE_CLASS_POLL_INTERVAL);

        Ok(Self {
            listen_addr,
            node_name,
            mock_mounts,
            mount_poll_interval,
            storage_class_poll_interval,
        })
    }
}

/// Accepts the host-less `:<port>` form by binding all interfaces.
fn normalize_listen_addr(addr: String) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr
    }
}

fn parse_interval(name: &'static str, value: Option<String>) -> Result<Option<Duration>> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let seconds: u64 = value.trim().parse().map_err(|err: std::num::ParseIntError| {
        Error::Invalid {
            name,
            value: value.clone(),
            reason: err.to_string(),
        }
    })?;
    if seconds == 0 {
        return Err(Error::Invalid {
            name,
            value,
            reason: "interval must be at least one second".to_owned(),
        });
    }
    Ok(Some(Duration::from_secs(seconds)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn reads_required_values_and_defaults() {
        let config = load(&[
            (METRICS_LISTEN, "127.0.0.1:9100"),
            (NODE_NAME, "worker-1"),
        ])
        .unwrap();

        assert_eq!(
            config,
            Config {
                listen_addr: "127.0.0.1:9100".to_owned(),
                node_name: "worker-1".to_owned(),
                mock_mounts: false,
                mount_poll_interval: Duration::from_secs(10),
                storage_class_poll_interval: Duration::from_secs(300),
            }
        );
    }

    #[test]
    fn missing_listen_address_is_an_error() {
        assert_eq!(
            load(&[(NODE_NAME, "worker-1")]).unwrap_err(),
            Error::Missing(METRICS_LISTEN)
        );
    }

    #[test]
    fn empty_node_name_is_an_error() {
        assert_eq!(
            load(&[(METRICS_LISTEN, ":9100"), (NODE_NAME, "")]).unwrap_err(),
            Error::Missing(NODE_NAME)
        );
    }

    #[test]
    fn host_less_listen_address_binds_all_interfaces() {
        let config = load(&[(METRICS_LISTEN, ":9100"), (NODE_NAME, "n")]).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9100");
    }

    #[test]
    fn any_non_empty_mock_value_enables_mocking() {
        let base = [(METRICS_LISTEN, ":9100"), (NODE_NAME, "n")];
        let mocked = load(&[base[0], base[1], (MOCK_MOUNT_OUTPUT, "true")]).unwrap();
        let empty = load(&[base[0], base[1], (MOCK_MOUNT_OUTPUT, "")]).unwrap();
        assert!(mocked.mock_mounts);
        assert!(!empty.mock_mounts);
    }

    #[test]
    fn reads_poll_interval_overrides() {
        let config = load(&[
            (METRICS_LISTEN, ":9100"),
            (NODE_NAME, "n"),
            (MOUNT_POLL_INTERVAL, "5"),
            (STORAGE_CLASS_POLL_INTERVAL, " 60 "),
        ])
        .unwrap();
        assert_eq!(config.mount_poll_interval, Duration::from_secs(5));
        assert_eq!(config.storage_class_poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn rejects_invalid_intervals() {
        let err = load(&[
            (METRICS_LISTEN, ":9100"),
            (NODE_NAME, "n"),
            (MOUNT_POLL_INTERVAL, "ten"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Invalid { name: MOUNT_POLL_INTERVAL, .. }));

        let err = load(&[
            (METRICS_LISTEN, ":9100"),
            (NODE_NAME, "n"),
            (STORAGE_CLASS_POLL_INTERVAL, "0"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Invalid {
                name: STORAGE_CLASS_POLL_INTERVAL,
                ..
            }
        ));
    }
}
