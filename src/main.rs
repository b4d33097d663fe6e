use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;

use stevedore::cli::{Cli, Command};
use stevedore::session::runtime::{ContainerRuntime, DockerRuntime, connect_docker};
use stevedore::session::{SessionAction, SessionConfig, SessionController, SessionPhase};
use stevedore::ui::prompts::TermPrompter;
use stevedore::ui::render;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Command::Images) => list_images().await,
        Some(Command::Export { image }) => run_session(image, Some(SessionAction::Export)).await,
        Some(Command::Import { image }) => run_session(image, Some(SessionAction::Import)).await,
        None => run_session(None, None).await,
    }
}

async fn run_session(image: Option<String>, action: Option<SessionAction>) -> Result<()> {
    let docker = connect_docker().await?;
    let runtime = Arc::new(DockerRuntime::new(docker));

    let config = SessionConfig {
        image,
        action,
        ..SessionConfig::default()
    };

    let mut controller = SessionController::new(runtime, TermPrompter::default(), config);
    let summary = controller.run().await?;

    if summary.phase == SessionPhase::Done {
        render::print_summary(&summary);
    }
    Ok(())
}

async fn list_images() -> Result<()> {
    let docker = connect_docker().await?;
    let runtime = DockerRuntime::new(docker);

    let records = runtime.list_images().await?;
    if records.is_empty() {
        render::print_info("no local images");
    } else {
        println!("{}", render::image_table(&records));
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
