//! Container listing via `docker ps`

use crate::{
    group_by, shell_quote, CommandOptions, CommandRunner, Container, ContainerGroups, GroupKey,
    ProviderError, Result,
};
use std::sync::Arc;

/// Go template for `docker ps`: id, name and status separated by tabs.
/// Docker expands the `\t` escapes itself.
pub const LIST_FORMAT: &str = "{{.ID}}\\t{{.Names}}\\t{{.Status}}";

/// Queries the container runtime for the current container snapshot
#[derive(Clone)]
pub struct ContainerInspector {
    runner: Arc<dyn CommandRunner>,
    docker: String,
}

impl ContainerInspector {
    pub fn new(runner: Arc<dyn CommandRunner>, docker: impl Into<String>) -> Self {
        Self {
            runner,
            docker: docker.into(),
        }
    }

    /// List running containers. Any runtime failure is reported as
    /// [`ProviderError::InspectionFailed`] so pollers can retry.
    pub async fn list(&self) -> Result<Vec<Container>> {
        let options = CommandOptions::new()
            .arg("ps")
            .arg(shell_quote(&format!("--format={}", LIST_FORMAT)))
            .silent();

        let output = self
            .runner
            .run(&self.docker, &options)
            .await
            .map_err(|e| ProviderError::InspectionFailed(e.to_string()))?;

        Ok(parse_list_output(&output))
    }

    /// List containers grouped by `key`
    pub async fn list_grouped(&self, key: GroupKey) -> Result<ContainerGroups> {
        let containers = self.list().await?;
        Ok(group_by(&containers, key))
    }
}

/// Parse the tab-delimited output of `docker ps` into containers.
/// Blank lines and lines with fewer than three fields are skipped.
pub fn parse_list_output(output: &str) -> Vec<Container> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut parts = line.splitn(3, '\t');
            let id = parts.next()?.trim();
            let name = parts.next()?.trim();
            let status = parts.next()?.trim();
            Some(Container::new(id, name, status))
        })
        .collect()
}
