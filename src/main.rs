use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use virtu_avatar::{
    AvatarClient, ClientConfig,
    core::catalog::language_name,
    terminal::{self, TerminalView},
};

/// Virtu avatar client - chat with an animated avatar backend from the terminal
#[derive(Parser, Debug)]
#[command(name = "virtu-avatar")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run (defaults to `chat`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive chat session
    Chat,
    /// List the avatar models offered by the backend
    Models,
    /// List voice languages and speakers
    Voices,
    /// List language models
    Llms,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries the conversation
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = cli.config {
        info!("Loading configuration from {}", config_path.display());
        ClientConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ClientConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    let client = AvatarClient::new(config)?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => chat(&client).await,
        Commands::Models => {
            let models = client.catalog().fetch_models().await?;
            for (key, entry) in models.iter() {
                println!("{key:<16} {:<20} {}", entry.name, entry.url);
            }
            Ok(())
        }
        Commands::Voices => {
            let voices = client.catalog().fetch_voices().await?;
            for language in voices.languages() {
                let marker = if voices.current.language == *language { "*" } else { " " };
                println!("{marker} {language} ({})", language_name(language));
                for speaker in voices.speakers(language) {
                    let marker = if voices.current.speaker == *speaker { "*" } else { " " };
                    println!("    {marker} {speaker}");
                }
            }
            Ok(())
        }
        Commands::Llms => {
            let llms = client.catalog().fetch_llms().await?;
            for model in &llms.available {
                let marker = if llms.current.as_deref() == Some(model.as_str()) { "*" } else { " " };
                println!("{marker} {model}");
            }
            Ok(())
        }
    }
}

async fn chat(client: &AvatarClient) -> anyhow::Result<()> {
    let (input_tx, input_rx) = mpsc::unbounded_channel();

    println!("Connecting to {}", client.config().ws_url);
    println!("{}", terminal::HELP);

    terminal::spawn_input_reader(std::io::BufReader::new(std::io::stdin()), input_tx)?;

    let session = client.run(Box::new(TerminalView::stdout()), input_rx).await?;
    info!("Session {} finished with {} entries", session.id(), session.transcript().len());
    Ok(())
}
