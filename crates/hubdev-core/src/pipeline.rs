//! The build-and-mount pipeline
//!
//! 1. Modify server.xml and remove old containers, concurrently
//! 2. Remove backend images, prune images, prune volumes
//! 3. Build the backend images
//! 4. Restore server.xml and expose the dev proxy port, concurrently
//! 5. Mount the compose project
//! 6. Poll until every container is healthy
//!
//! Any failure restores server.xml before it is returned.

use crate::{
    drop_exact_lines, ensure_port_mapping, format_elapsed, BuildOptions, ComposeProject,
    ConfigMutator, HealthPoller, MountOutcome, PollObserver, PollReport, Result, RunContext,
    HTTPS_CONNECTOR_ATTRIBUTES, MAX_MOUNT_ATTEMPTS,
};
use hubdev_provider::{CommandOptions, CommandRunner, ContainerInspector, DockerHost};
use std::sync::Arc;

/// Arguments for the wrapper build command
pub fn build_args(clean: bool, subproject: &str) -> Vec<String> {
    let mut args = Vec::new();
    if clean {
        args.push("clean".to_string());
    }
    args.push("docker".to_string());
    args.push(format!("docker:{}:build", subproject));
    args
}

/// Sequences one orchestration run
pub struct BuildPipeline {
    runner: Arc<dyn CommandRunner>,
    server_config: Arc<ConfigMutator>,
    project: ComposeProject,
    docker: DockerHost,
    poller: HealthPoller,
}

impl BuildPipeline {
    pub fn new(runner: Arc<dyn CommandRunner>, ctx: &RunContext) -> Self {
        let runtime = &ctx.config.runtime;
        let inspector = ContainerInspector::new(runner.clone(), runtime.docker.clone());

        Self {
            server_config: Arc::new(ConfigMutator::new(&ctx.paths.server_config)),
            project: ComposeProject::new(
                runner.clone(),
                runtime.compose.clone(),
                &ctx.paths.compose_dir,
            ),
            docker: DockerHost::new(runner.clone(), runtime.docker.clone()),
            poller: HealthPoller::from_config(inspector, &ctx.config.poll),
            runner,
        }
    }

    /// The server config under modification, for interrupt-time restore
    pub fn server_config(&self) -> Arc<ConfigMutator> {
        self.server_config.clone()
    }

    pub fn project(&self) -> &ComposeProject {
        &self.project
    }

    /// Run every step. On failure the server config is restored before the
    /// error is returned.
    pub async fn run(
        &mut self,
        ctx: &RunContext,
        observer: &mut dyn PollObserver,
    ) -> Result<PollReport> {
        let result = self.run_steps(ctx, observer).await;
        if result.is_err() {
            self.restore_server_config().await;
        }
        result
    }

    async fn run_steps(
        &mut self,
        ctx: &RunContext,
        observer: &mut dyn PollObserver,
    ) -> Result<PollReport> {
        let options = &ctx.options;

        // Both sides always finish, so a failed removal never interrupts the
        // server.xml edit halfway
        let (modified, removed) = tokio::join!(
            self.modify_server_config(options),
            self.remove_containers(options),
        );
        modified?;
        removed?;

        self.remove_backend_images(ctx).await;

        if options.prune_images {
            self.docker.prune_images().await?;
        }
        if options.prune_volumes {
            self.docker.prune_volumes().await?;
        }

        self.build(ctx).await?;

        let (restored, exposed) = tokio::join!(
            self.finish_server_config(options),
            self.expose_proxy_port(ctx),
        );
        restored?;
        exposed?;

        if self.project.mount().await? == MountOutcome::Failed {
            tracing::warn!(
                "Containers failed to mount after {} attempts, polling anyway",
                MAX_MOUNT_ATTEMPTS
            );
        }

        let report = self.poller.poll(observer).await?;
        tracing::info!("All containers are healthy");
        tracing::info!("Total setup time: {}", format_elapsed(ctx.elapsed()));
        Ok(report)
    }

    // Use http instead of https: the webapp and the dev proxy can't both bind 443
    async fn modify_server_config(&self, options: &BuildOptions) -> Result<()> {
        if options.skip_build {
            return Ok(());
        }
        tracing::info!("Modify Apache Tomcat server.xml config");
        self.server_config
            .apply(drop_exact_lines(&HTTPS_CONNECTOR_ATTRIBUTES))
            .await?;
        Ok(())
    }

    async fn remove_containers(&self, options: &BuildOptions) -> Result<()> {
        if !options.remove_containers {
            return Ok(());
        }
        self.project.remove(options.prune_volumes).await
    }

    async fn remove_backend_images(&self, ctx: &RunContext) {
        if !ctx.options.remove_images {
            return;
        }

        let reference = &ctx.config.backend.image_reference;
        let ids = match self.docker.image_ids(reference).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("Could not list {} images: {}", reference, e);
                return;
            }
        };

        if ids.is_empty() {
            tracing::info!("There are no {} images to remove", reference);
            return;
        }

        if let Err(e) = self.docker.remove_images(&ids).await {
            tracing::warn!("Failed to remove {} images: {}", reference, e);
        }
    }

    async fn build(&self, ctx: &RunContext) -> Result<()> {
        if ctx.options.skip_build {
            tracing::info!("Skipping backend build");
            return Ok(());
        }

        let backend = &ctx.config.backend;
        let options = CommandOptions::new()
            .args(build_args(ctx.options.clean, &backend.docker_subproject))
            .cwd(&ctx.paths.repo_dir);
        self.runner.run(&backend.build_command, &options).await?;
        Ok(())
    }

    async fn finish_server_config(&self, options: &BuildOptions) -> Result<()> {
        if options.skip_build {
            return Ok(());
        }
        self.server_config.restore().await?;
        Ok(())
    }

    // The dev proxy talks to the webapp on 8080
    async fn expose_proxy_port(&self, ctx: &RunContext) -> Result<()> {
        if ctx.options.skip_build {
            return Ok(());
        }
        tracing::info!("Modify Docker compose config");
        let backend = &ctx.config.backend;
        ensure_port_mapping(
            &ctx.paths.compose_file,
            &backend.app_service,
            &backend.port_mapping,
        )
        .await?;
        Ok(())
    }

    async fn restore_server_config(&self) {
        match self.server_config.restore().await {
            Ok(true) => tracing::info!("Restored {}", self.server_config.path().display()),
            Ok(false) => {}
            Err(e) => tracing::error!(
                "Failed to restore {}: {}",
                self.server_config.path().display(),
                e
            ),
        }
    }
}
