//! Compose project lifecycle: mount with bounded retry, teardown

use crate::Result;
use hubdev_provider::{CommandOptions, CommandRunner};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Mount attempts before giving up. A failed attempt tears the project down
/// before the next one, which clears stale container state.
pub const MAX_MOUNT_ATTEMPTS: u32 = 2;

/// Where a compose project is in its mount cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Mounting,
    Removing,
    Mounted,
    Failed,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Mounting => write!(f, "mounting"),
            Self::Removing => write!(f, "removing"),
            Self::Mounted => write!(f, "mounted"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Result of [`ComposeProject::mount`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    Mounted,
    /// Every attempt failed; containers may be partially up
    Failed,
}

/// The fixed compose project the backend build produces
pub struct ComposeProject {
    runner: Arc<dyn CommandRunner>,
    compose: String,
    compose_dir: PathBuf,
    attempts: u32,
    state: LifecycleState,
}

impl ComposeProject {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        compose: impl Into<String>,
        compose_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            compose: compose.into(),
            compose_dir: compose_dir.into(),
            attempts: 0,
            state: LifecycleState::Idle,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Failed mount attempts so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn compose_dir(&self) -> &Path {
        &self.compose_dir
    }

    /// Bring every service up detached.
    ///
    /// A failure tears the project down and tries again until
    /// [`MAX_MOUNT_ATTEMPTS`] is reached. Exhausting the attempts is not an
    /// error: the outcome is [`MountOutcome::Failed`] and health polling is
    /// expected to surface the broken containers.
    pub async fn mount(&mut self) -> Result<MountOutcome> {
        loop {
            self.state = LifecycleState::Mounting;
            let options = CommandOptions::new()
                .args(["up", "-d"])
                .cwd(&self.compose_dir);

            match self.runner.run(&self.compose, &options).await {
                Ok(_) => {
                    self.state = LifecycleState::Mounted;
                    return Ok(MountOutcome::Mounted);
                }
                Err(e) => {
                    self.attempts += 1;
                    tracing::error!("Docker containers failed to mount: {}", e);

                    if self.attempts >= MAX_MOUNT_ATTEMPTS {
                        self.state = LifecycleState::Failed;
                        return Ok(MountOutcome::Failed);
                    }

                    tracing::info!("Removing all old containers and re-creating from new images");
                    self.state = LifecycleState::Removing;
                    self.remove(false).await?;
                }
            }
        }
    }

    /// Tear the project down, dropping its volumes when `prune_volumes` is set.
    /// A missing compose directory means the backend was never built and is
    /// not an error.
    pub async fn remove(&self, prune_volumes: bool) -> Result<()> {
        if !tokio::fs::metadata(&self.compose_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            tracing::info!(
                "Backend hasn't been built yet, nothing to remove in {}",
                self.compose_dir.display()
            );
            return Ok(());
        }

        let mut options = CommandOptions::new().arg("down").cwd(&self.compose_dir);
        if prune_volumes {
            options = options.arg("-v");
        }

        self.runner.run(&self.compose, &options).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockResponse, MockRunner};
    use crate::CoreError;

    fn project(runner: &Arc<MockRunner>, dir: &Path) -> ComposeProject {
        ComposeProject::new(runner.clone(), "docker-compose", dir)
    }

    #[tokio::test]
    async fn test_mount_success_first_try() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(MockRunner::new());
        let mut project = project(&runner, tmp.path());
        assert_eq!(project.state(), LifecycleState::Idle);

        assert_eq!(project.mount().await.unwrap(), MountOutcome::Mounted);
        assert_eq!(project.state(), LifecycleState::Mounted);
        assert_eq!(project.attempts(), 0);
        assert_eq!(runner.calls(), vec!["docker-compose up -d"]);
    }

    #[tokio::test]
    async fn test_mount_retries_once_after_teardown() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(MockRunner::new());
        runner.respond("docker-compose up", MockResponse::Fail(1));
        runner.respond("docker-compose up", MockResponse::Output(String::new()));
        let mut project = project(&runner, tmp.path());

        assert_eq!(project.mount().await.unwrap(), MountOutcome::Mounted);
        assert_eq!(project.state(), LifecycleState::Mounted);
        assert_eq!(project.attempts(), 1);
        assert_eq!(runner.count("docker-compose down"), 1);
        assert_eq!(
            runner.calls(),
            vec!["docker-compose up -d", "docker-compose down", "docker-compose up -d"]
        );
    }

    #[tokio::test]
    async fn test_mount_gives_up_after_two_attempts() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(MockRunner::new());
        runner.respond("docker-compose up", MockResponse::Fail(1));
        let mut project = project(&runner, tmp.path());

        assert_eq!(project.mount().await.unwrap(), MountOutcome::Failed);
        assert_eq!(project.state(), LifecycleState::Failed);
        assert_eq!(project.attempts(), MAX_MOUNT_ATTEMPTS);
        assert_eq!(runner.count("docker-compose up"), 2);
        assert_eq!(runner.count("docker-compose down"), 1);
    }

    #[tokio::test]
    async fn test_mount_propagates_teardown_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(MockRunner::new());
        runner.respond("docker-compose up", MockResponse::Fail(1));
        runner.respond("docker-compose down", MockResponse::Fail(2));
        let mut project = project(&runner, tmp.path());

        let err = project.mount().await.unwrap_err();
        assert!(matches!(err, CoreError::Provider(_)));
        assert_eq!(runner.count("docker-compose up"), 1);
    }

    #[tokio::test]
    async fn test_remove_missing_dir_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(MockRunner::new());
        let project = project(&runner, &tmp.path().join("never-built"));

        project.remove(true).await.unwrap();
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remove_with_volumes() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(MockRunner::new());
        let project = project(&runner, tmp.path());

        project.remove(false).await.unwrap();
        project.remove(true).await.unwrap();
        assert_eq!(
            runner.calls(),
            vec!["docker-compose down", "docker-compose down -v"]
        );
        assert_eq!(runner.cwds()[0].as_deref(), Some(tmp.path()));
    }
}
