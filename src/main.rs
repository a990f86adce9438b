//! gemchat - multi-conversation chat client for the Gemini API
//!
#![doc = "gemchat - multi-conversation chat client for the Gemini API"]
#![doc = "Main entry point for the gemchat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gemchat::cli::{Cli, Commands};
use gemchat::commands;
use gemchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat {
            conversation,
            model,
        } => {
            if let Some(c) = &conversation {
                tracing::debug!("Opening conversation: {}", c);
            }
            if let Some(m) = &model {
                tracing::debug!("Using model override: {}", m);
            }
            commands::chat::run_chat(config, conversation, model).await?;
            Ok(())
        }
        Commands::Conversations { command } => {
            tracing::info!("Starting conversations command");
            commands::conversations::handle_conversations(&config, command)?;
            Ok(())
        }
        Commands::Presets { command } => {
            tracing::info!("Starting presets command");
            commands::presets::handle_presets(&config, command)?;
            Ok(())
        }
        Commands::Model { command } => {
            tracing::info!("Starting model command");
            commands::model::handle_model(&config, command).await?;
            Ok(())
        }
        Commands::Auth { key, clear } => {
            tracing::info!("Starting authentication");
            commands::auth::authenticate(key, clear)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so they never interleave with chat output on stdout.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "gemchat=debug" } else { "gemchat=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
