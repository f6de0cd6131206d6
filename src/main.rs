use anyhow::Result;
use clap::Parser;
use eval_orchestrator::broker::RedisBroker;
use eval_orchestrator::cli::{Cli, Command};
use eval_orchestrator::config::Config;
use eval_orchestrator::orchestrator::MasterOrchestrator;
use eval_orchestrator::store::InMemoryStore;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Command::Start => start(config).await,
        Command::Stop => {
            info!("stop is advisory against a running process; send SIGINT/SIGTERM to the running orchestrator instead");
            Ok(())
        }
        Command::Status => {
            let broker = Arc::new(RedisBroker::new(&config.broker.url)?);
            eval_orchestrator::cli::print_status(broker).await?;
            Ok(())
        }
    }
}

async fn start(config: Config) -> Result<()> {
    info!("starting eval-orchestrator");

    let broker = Arc::new(RedisBroker::new(&config.broker.url)?);
    // The persistent store is an external collaborator; InMemoryStore
    // stands in until a real database-backed Store is wired in.
    let store = Arc::new(InMemoryStore::new());

    let orchestrator = Arc::new(MasterOrchestrator::new(
        broker,
        store,
        config.scheduling,
        config.weights,
    ));

    tokio::select! {
        result = orchestrator.clone().run() => {
            if let Err(e) = result {
                error!("orchestrator loops exited: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            orchestrator.shutdown().await;
        }
    }

    Ok(())
}
