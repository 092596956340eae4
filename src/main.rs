use clap::Parser;
use log::info;
use std::error::Error;
use std::path::PathBuf;

use dodgers::{Agent, Config, Server, SharedAgent, STATE_SIZE, ACTION_SIZE};

/// Learns to play the obstacle game from live WebSocket telemetry.
#[derive(Parser, Debug)]
#[command(name = "dodgers")]
struct Cli {
    /// JSON config file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Transitions sampled per replay.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Telemetry frames between replays.
    #[arg(long)]
    training_interval: Option<u64>,

    /// Pause before restarting the game after a game over.
    #[arg(long)]
    restart_delay_ms: Option<u64>,
}

fn build_config(cli: Cli) -> Result<Config, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(training_interval) = cli.training_interval {
        config.training_interval = training_interval;
    }
    if let Some(restart_delay_ms) = cli.restart_delay_ms {
        config.restart_delay_ms = restart_delay_ms;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = build_config(Cli::parse())?;
    info!("starting with {:?}", config);

    let agent = SharedAgent::new(Agent::new(STATE_SIZE, ACTION_SIZE));
    let server = Server::bind(&config, agent).await?;
    server.run().await?;

    Ok(())
}
