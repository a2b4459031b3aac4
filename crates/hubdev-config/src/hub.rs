//! User configuration for hubdev
//!
//! Located at `~/.config/hubdev/config.toml`. Every key is optional; the
//! defaults describe the standard rest-backend checkout.

use crate::{ConfigError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable locating the backend repository root
pub const REPO_DIR_ENV: &str = "HUB_REPO_DIR";

/// hubdev configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub backend: BackendConfig,
    pub runtime: RuntimeConfig,
    pub poll: PollConfig,
}

/// Where the backend lives and how it is built
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend repository root. `HUB_REPO_DIR` takes precedence.
    pub repo_dir: Option<PathBuf>,
    /// Compose project directory, relative to the repository root
    pub compose_dir: PathBuf,
    /// Compose file name inside `compose_dir`
    pub compose_file: String,
    /// Tomcat server.xml, relative to the repository root
    pub server_config: PathBuf,
    /// Compose service that receives the dev proxy port mapping
    pub app_service: String,
    /// Port mapping exposed on `app_service` for the dev proxy
    pub port_mapping: String,
    /// Wrapper build command, run from the repository root
    pub build_command: String,
    /// Gradle subproject whose `build` task produces the images
    pub docker_subproject: String,
    /// Image reference filter used by `--remove-images`
    pub image_reference: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            repo_dir: None,
            compose_dir: PathBuf::from("docker/hub-docker/build/docker-compose/dev/docker-compose"),
            compose_file: "docker-compose.yml".to_string(),
            server_config: PathBuf::from("docker/blackducksoftware/hub-tomcat/server.xml"),
            app_service: "webapp".to_string(),
            port_mapping: "8080:8080".to_string(),
            build_command: "./gradlew".to_string(),
            docker_subproject: "hub-docker".to_string(),
            image_reference: "blackducksoftware/hub*".to_string(),
        }
    }
}

/// Container runtime executables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub docker: String,
    pub compose: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            docker: "docker".to_string(),
            compose: "docker-compose".to_string(),
        }
    }
}

/// Health polling cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3,
            timeout_secs: 240,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Absolute paths derived from the backend repository root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendPaths {
    pub repo_dir: PathBuf,
    pub compose_dir: PathBuf,
    pub compose_file: PathBuf,
    pub server_config: PathBuf,
}

impl BackendPaths {
    pub fn from_root(root: &Path, backend: &BackendConfig) -> Self {
        let compose_dir = root.join(&backend.compose_dir);
        Self {
            repo_dir: root.to_path_buf(),
            compose_file: compose_dir.join(&backend.compose_file),
            compose_dir,
            server_config: root.join(&backend.server_config),
        }
    }
}

impl HubConfig {
    /// Load configuration from the default path, then apply `HUB_REPO_DIR`
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_repo_dir_override(std::env::var_os(REPO_DIR_ENV).map(PathBuf::from));
        Ok(config)
    }

    /// Load configuration from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Replace the configured repository root when an override is present.
    /// Empty values are ignored.
    pub fn apply_repo_dir_override(&mut self, repo_dir: Option<PathBuf>) {
        if let Some(dir) = repo_dir.filter(|d| !d.as_os_str().is_empty()) {
            self.backend.repo_dir = Some(dir);
        }
    }

    /// Resolve every backend path from the repository root
    pub fn paths(&self) -> Result<BackendPaths> {
        let root = self
            .backend
            .repo_dir
            .as_deref()
            .ok_or(ConfigError::MissingRepoDir(REPO_DIR_ENV))?;
        Ok(BackendPaths::from_root(root, &self.backend))
    }

    /// Serialize the effective configuration for display
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "hubdev").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}
