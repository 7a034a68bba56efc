//! Build metadata published once at startup.
//!
//! The revision, branch and build time are taken from `BUILD_REVISION`,
//! `BUILD_BRANCH` and `BUILD_TIME` (RFC 3339) at compile time.
use chrono::DateTime;

use crate::metrics::{
    self, APP_LABEL_VALUE, BUILD_INFO_METRIC, BUILD_TIME_METRIC, MetricsRegistry, Series,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub revision: String,
    pub branch: String,
    /// Build time in unix seconds, `0` when unknown.
    pub build_time: i64,
}

impl BuildInfo {
    pub fn new(version: &str, revision: &str, branch: &str, build_time: Option<&str>) -> Self {
        Self {
            version: version.to_owned(),
            revision: revision.to_owned(),
            branch: branch.to_owned(),
            build_time: build_time.map(parse_build_time).unwrap_or_default(),
        }
    }

    /// Metadata embedded into this binary.
    pub fn from_build_env() -> Self {
        Self::new(
            env!("CARGO_PKG_VERSION"),
            option_env!("BUILD_REVISION").unwrap_or_default(),
            option_env!("BUILD_BRANCH").unwrap_or_default(),
            option_env!("BUILD_TIME"),
        )
    }

    fn series(&self, name: &'static str) -> Series {
        Series::new(name)
            .label("app", APP_LABEL_VALUE)
            .label("version", &self.version)
            .label("revision", &self.revision)
            .label("branch", &self.branch)
    }

    /// Registers the `signicat_build_info` and `signicat_build_time` series.
    ///
    /// # Errors
    ///
    /// Returns the registry error if either series cannot be registered.
    pub fn publish<R: MetricsRegistry + ?Sized>(&self, registry: &R) -> metrics::Result<()> {
        let info = self
            .series(BUILD_INFO_METRIC)
            .label("buildtime", self.build_time.to_string());
        registry.register(info, 1.0)?;

        let build_time = self.build_time as f64;
        registry.register(self.series(BUILD_TIME_METRIC), build_time)?;

        log::info!(
            "Build version={} revision={} branch={} buildtime={}",
            self.version,
            self.revision,
            self.branch,
            self.build_time
        );
        Ok(())
    }
}

fn parse_build_time(value: &str) -> i64 {
    match DateTime::parse_from_rfc3339(value) {
        Ok(time) => time.timestamp(),
        Err(err) => {
            log::warn!("Ignoring unparseable build time `{value}`: {err}");
            0
        }
    }
}
