//! Error types for hubdev-core

use hubdev_provider::Container;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] hubdev_config::ConfigError),

    #[error(transparent)]
    Provider(#[from] hubdev_provider::ProviderError),

    #[error("Failed to parse {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Containers timed out after {} waiting for an all healthy status", describe_elapsed(.elapsed))]
    PollTimeout { elapsed: Duration },

    #[error("{}", describe_unhealthy(.containers))]
    ContainerUnhealthy { containers: Vec<Container> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_elapsed(elapsed: &Duration) -> String {
    crate::format_elapsed(*elapsed)
}

fn describe_unhealthy(containers: &[Container]) -> String {
    let mut msg = format!(
        "{} container(s) failed their health check:",
        containers.len()
    );
    for container in containers {
        msg.push_str(&format!(
            "\n  {} ({}) is {}",
            container.name,
            container.id.short(),
            container.status
        ));
    }
    msg.push_str("\nInspect the logs with:");
    for container in containers {
        msg.push_str(&format!("\n  docker logs {}", container.id));
    }
    msg
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unhealthy_message_lists_each_container() {
        let err = CoreError::ContainerUnhealthy {
            containers: vec![
                Container::new("a1b2", "hub_solr_1", "Up 1 minute (unhealthy)"),
                Container::new("c3d4", "hub_webapp_1", "Restarting (1) 5 seconds ago"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 container(s) failed"));
        assert!(msg.contains("hub_solr_1 (a1b2) is unhealthy"));
        assert!(msg.contains("hub_webapp_1 (c3d4) is restarting"));
        assert!(msg.contains("docker logs a1b2"));
        assert!(msg.contains("docker logs c3d4"));
    }

    #[test]
    fn test_timeout_message() {
        let err = CoreError::PollTimeout {
            elapsed: Duration::from_secs(241),
        };
        assert_eq!(
            err.to_string(),
            "Containers timed out after 4 minutes, 1 second waiting for an all healthy status"
        );
    }
}
