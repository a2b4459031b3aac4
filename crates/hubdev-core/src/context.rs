//! Per-run context threaded through the build pipeline

use crate::Result;
use hubdev_config::{BackendPaths, HubConfig};
use std::time::{Duration, Instant};

/// Flags selecting which pipeline steps run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Run the build tool's `clean` task first
    pub clean: bool,
    /// Skip config mutation and the build; just mount and poll
    pub skip_build: bool,
    /// Prune dangling images before building
    pub prune_images: bool,
    /// Prune unused volumes (and drop compose volumes on removal)
    pub prune_volumes: bool,
    /// Tear down existing containers before building
    pub remove_containers: bool,
    /// Remove the backend's images before building
    pub remove_images: bool,
}

/// State for one orchestration run, created once at entry
#[derive(Debug, Clone)]
pub struct RunContext {
    started: Instant,
    pub options: BuildOptions,
    pub config: HubConfig,
    pub paths: BackendPaths,
}

impl RunContext {
    pub fn new(config: HubConfig, options: BuildOptions) -> Result<Self> {
        let paths = config.paths()?;
        Ok(Self {
            started: Instant::now(),
            options,
            config,
            paths,
        })
    }

    /// Time since the run started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Render a duration as e.g. `3 minutes, 12 seconds`
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let units = [
        (total / 3600, "hour"),
        ((total % 3600) / 60, "minute"),
        (total % 60, "second"),
    ];

    let parts: Vec<String> = units
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| {
            if *value == 1 {
                format!("1 {}", unit)
            } else {
                format!("{} {}s", value, unit)
            }
        })
        .collect();

    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(", ")
    }
}
