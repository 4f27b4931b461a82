use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use waav_voice_client::{
    ClientConfig, ConsoleView, SessionController, SignalingClient, core::tools::builtin_registry,
    transport::WebRtcTransportFactory,
};

/// WaaV Voice Client - Realtime voice assistant from the terminal
#[derive(Parser, Debug)]
#[command(name = "waav-voice-client")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Start a session immediately
    #[arg(long)]
    connect: bool,
}

const HELP: &str = "Commands: /start /stop /toggle /mic /quit. Any other line is sent as a message.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            ClientConfig::from_file(path)?
        }
        None => ClientConfig::from_env()?,
    };

    info!("Backend: {}", config.backend_url);

    let http = config.http_client()?;
    let tools = builtin_registry(http.clone(), config.search_url()?)?;
    let signaling = SignalingClient::new(http, config.rtc_connect_url()?);
    let factory = Arc::new(WebRtcTransportFactory::new(config.ice_servers.clone()));

    let controller = SessionController::new(
        factory,
        signaling,
        tools,
        Arc::new(ConsoleView::new()),
        config.session_options(),
    )
    .map_err(|e| anyhow!("Failed to create session controller: {}", e))?;

    println!("{}", HELP);

    if cli.connect {
        controller.toggle().await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        // Failures are already reported through the view or the log
        let result = match line.trim() {
            "/start" => controller.start().await,
            "/stop" => controller.stop().await,
            "/toggle" => controller.toggle().await.map(|_| ()),
            "/mic" => controller.toggle_microphone().await.map(|_| ()),
            "/quit" => break,
            "/help" => {
                println!("{}", HELP);
                Ok(())
            }
            _ => controller.submit_input(&line).await,
        };
        if let Err(e) = result {
            tracing::debug!("Command failed: {}", e);
        }
    }

    controller.stop().await?;
    info!("Goodbye");
    Ok(())
}
