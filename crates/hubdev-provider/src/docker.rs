//! Image and volume housekeeping through the docker CLI

use crate::{shell_quote, CommandOptions, CommandRunner, Result};
use std::sync::Arc;

/// Runtime-wide docker operations not tied to the compose project
#[derive(Clone)]
pub struct DockerHost {
    runner: Arc<dyn CommandRunner>,
    docker: String,
}

impl DockerHost {
    pub fn new(runner: Arc<dyn CommandRunner>, docker: impl Into<String>) -> Self {
        Self {
            runner,
            docker: docker.into(),
        }
    }

    /// Remove dangling images
    pub async fn prune_images(&self) -> Result<()> {
        self.runner
            .run(&self.docker, &CommandOptions::new().args(["image", "prune", "-f"]))
            .await?;
        Ok(())
    }

    /// Remove volumes not used by any container
    pub async fn prune_volumes(&self) -> Result<()> {
        self.runner
            .run(&self.docker, &CommandOptions::new().args(["volume", "prune", "-f"]))
            .await?;
        Ok(())
    }

    /// IDs of images whose reference matches `reference` (glob patterns allowed)
    pub async fn image_ids(&self, reference: &str) -> Result<Vec<String>> {
        let options = CommandOptions::new()
            .args(["images", "-q"])
            .arg(shell_quote(&format!("--filter=reference={}", reference)))
            .silent();
        let output = self.runner.run(&self.docker, &options).await?;

        let mut ids: Vec<String> = Vec::new();
        for id in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            // Tagged twice means listed twice
            if !ids.iter().any(|existing| existing == id) {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    /// Force-remove the given images
    pub async fn remove_images(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let options = CommandOptions::new()
            .args(["rmi", "-f"])
            .args(ids.iter().cloned());
        self.runner.run(&self.docker, &options).await?;
        Ok(())
    }
}
