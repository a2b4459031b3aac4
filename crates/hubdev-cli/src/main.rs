//! hub - build, mount and health-check the Hub backend for local development

mod commands;
mod signals;
mod status_table;

use clap::{Args, Parser, Subcommand};
use hubdev_config::HubConfig;
use hubdev_core::BuildOptions;
use status_table::LogActivity;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "hub")]
#[command(author, version, about = "Hub backend dev bootstrapper", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(long, global = true)]
    verbose: bool,

    /// Backend repository root (overrides HUB_REPO_DIR and the config file)
    #[arg(long, global = true, value_name = "PATH")]
    repo_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the backend images, mount the containers and wait until healthy
    Up(UpArgs),

    /// Tear down the backend containers
    Down {
        /// Also remove the project's volumes
        #[arg(short = 'v', long)]
        prune_volumes: bool,
    },

    /// Show the current container status once
    Status,

    /// Wait for the running containers to become healthy
    Poll,

    /// Show the effective configuration
    Config,
}

#[derive(Args, Debug, Default)]
struct UpArgs {
    /// Run the build tool's clean task first
    #[arg(short, long)]
    clean: bool,

    /// Skip the build and just mount the existing images
    #[arg(short, long)]
    skip_build: bool,

    /// Prune dangling images before building
    #[arg(short, long)]
    prune_images: bool,

    /// Prune unused volumes before building
    #[arg(short = 'v', long)]
    prune_volumes: bool,

    /// Remove existing containers before building
    #[arg(short, long)]
    remove_containers: bool,

    /// Remove the backend images before building
    #[arg(short = 'i', long)]
    remove_images: bool,
}

impl From<UpArgs> for BuildOptions {
    fn from(args: UpArgs) -> Self {
        Self {
            clean: args.clean,
            skip_build: args.skip_build,
            prune_images: args.prune_images,
            prune_volumes: args.prune_volumes,
            remove_containers: args.remove_containers,
            remove_images: args.remove_images,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // The live status table needs to know when log lines land between repaints
    let logs = LogActivity::default();
    let log_marker = logs.clone();
    let log_writer = move || {
        log_marker.mark();
        std::io::stdout()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(log_writer),
        )
        .init();

    let mut config = HubConfig::load()?;
    config.apply_repo_dir_override(cli.repo_dir);

    match cli.command.unwrap_or(Commands::Up(UpArgs::default())) {
        Commands::Up(args) => commands::up(config, args.into(), logs).await?,
        Commands::Down { prune_volumes } => commands::down(&config, prune_volumes).await?,
        Commands::Status => commands::status(&config).await?,
        Commands::Poll => commands::poll(&config, logs).await?,
        Commands::Config => commands::config(&config)?,
    }

    Ok(())
}
