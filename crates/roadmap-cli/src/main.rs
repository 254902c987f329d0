mod cli;
mod context;
mod handlers;
mod output;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use context::CliContext;
use roadmap_core::{AppConfig, RoadmapError};
use tracing_subscriber::EnvFilter;

fn init_logging() -> anyhow::Result<()> {
    if let Ok(log_path) = std::env::var("ROADMAP_DEBUG_LOG") {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "roadmap", &mut std::io::stdout());
        return Ok(());
    }

    let ctx = CliContext::open(cli.file, AppConfig::load())?;

    match cli.command {
        Commands::Item(item_cmd) => handlers::item::handle(&ctx, item_cmd.action).await,
        Commands::Dep(dep_cmd) => handlers::dep::handle(&ctx, dep_cmd.action).await,
        Commands::Phases(args) => handlers::plan::handle_phases(&ctx, args).await,
        Commands::Audit(args) => handlers::plan::handle_audit(&ctx, args).await,
        Commands::Completions { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let status = err
            .downcast_ref::<RoadmapError>()
            .map(RoadmapError::status_code)
            .unwrap_or(400);
        tracing::debug!("Command failed: {:#}", err);
        output::output_error(&err.to_string(), status);
    }

    Ok(())
}
