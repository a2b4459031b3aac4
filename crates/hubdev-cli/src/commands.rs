//! CLI command implementations

use crate::signals;
use crate::status_table::{self, LogActivity, StatusTable};
use anyhow::Result;
use hubdev_config::HubConfig;
use hubdev_core::{
    format_elapsed, BuildOptions, BuildPipeline, ComposeProject, CoreError, HealthPoller,
    RunContext,
};
use hubdev_provider::{CommandRunner, ContainerInspector, ShellRunner};
use std::sync::Arc;

fn shell_runner() -> Arc<dyn CommandRunner> {
    Arc::new(ShellRunner::new())
}

/// Ring the terminal bell so a long wait that ended badly gets noticed
fn ring_bell_on_timeout(err: &CoreError) {
    if matches!(err, CoreError::PollTimeout { .. }) {
        eprint!("\x07");
    }
}

/// Build, mount and poll the backend
pub async fn up(config: HubConfig, options: BuildOptions, logs: LogActivity) -> Result<()> {
    let ctx = RunContext::new(config, options)?;
    let mut pipeline = BuildPipeline::new(shell_runner(), &ctx);
    let interrupt = signals::restore_on_interrupt(pipeline.server_config());

    let mut table = StatusTable::start(logs);
    let result = pipeline.run(&ctx, &mut table).await;
    table.stop().await;
    interrupt.abort();

    if let Err(e) = &result {
        ring_bell_on_timeout(e);
    }
    result?;
    Ok(())
}

/// Tear down the compose project
pub async fn down(config: &HubConfig, prune_volumes: bool) -> Result<()> {
    let paths = config.paths()?;
    let project = ComposeProject::new(
        shell_runner(),
        config.runtime.compose.clone(),
        paths.compose_dir,
    );
    project.remove(prune_volumes).await?;
    Ok(())
}

/// Inspect once and print the table
pub async fn status(config: &HubConfig) -> Result<()> {
    let inspector = ContainerInspector::new(shell_runner(), config.runtime.docker.clone());
    let containers = inspector.list().await?;

    if containers.is_empty() {
        println!("No containers running.");
        return Ok(());
    }

    status_table::print_once(&containers)?;
    Ok(())
}

/// Poll the running containers with the live table, without building or mounting
pub async fn poll(config: &HubConfig, logs: LogActivity) -> Result<()> {
    let inspector = ContainerInspector::new(shell_runner(), config.runtime.docker.clone());
    let poller = HealthPoller::from_config(inspector, &config.poll);

    let mut table = StatusTable::start(logs);
    let result = poller.poll(&mut table).await;
    table.stop().await;

    match result {
        Ok(report) => {
            tracing::info!(
                "All containers are healthy after {}",
                format_elapsed(report.elapsed)
            );
            Ok(())
        }
        Err(e) => {
            ring_bell_on_timeout(&e);
            Err(e.into())
        }
    }
}

/// Show the effective configuration
pub fn config(config: &HubConfig) -> Result<()> {
    let config_path = HubConfig::config_path()?;

    if config_path.exists() {
        println!("# Config file: {:?}\n", config_path);
    } else {
        println!("# Config file: {:?} (not created yet, showing defaults)\n", config_path);
    }
    println!("{}", config.to_toml_string()?);

    Ok(())
}
