//! Model selection commands
//!
//! The selected model is persisted with the rest of the state; listing
//! asks the Gemini API which models support `generateContent`.

use crate::cli::ModelCommand;
use crate::config::Config;
use crate::error::{GemchatError, Result};
use crate::providers::{ModelInfo, Provider};
use crate::state::AppState;
use colored::Colorize;
use prettytable::{row, Table};

/// Print the selected model
pub fn show_model(state: &AppState) {
    println!("Selected model: {}", state.selected_model().cyan());
}

/// Select a model and persist the choice
pub fn set_model(state: &mut AppState, name: &str) -> Result<()> {
    state.select_model(name)?;
    println!(
        "{}",
        format!("Selected model: {}", state.selected_model()).green()
    );
    Ok(())
}

/// Fetch and print available models
///
/// # Errors
///
/// Returns the provider error when listing fails (missing key, HTTP error)
pub async fn list_models(provider: &dyn Provider, selected: &str, json: bool) -> Result<()> {
    let models = provider.list_models().await?;

    if json {
        output_models_json(&models)?;
    } else if models.is_empty() {
        println!("{}", "No models available.".yellow());
    } else {
        output_models_table(&models, selected);
    }
    Ok(())
}

fn output_models_json(models: &[ModelInfo]) -> Result<()> {
    let json = serde_json::to_string_pretty(models).map_err(GemchatError::Serialization)?;
    println!("{}", json);
    Ok(())
}

fn output_models_table(models: &[ModelInfo], selected: &str) {
    let mut table = Table::new();
    table.add_row(row!["Model Name", "Display Name", "Input Tokens"]);

    for model in models {
        let name = if model.name == selected {
            format!("* {}", model.name).green().to_string()
        } else {
            model.name.clone()
        };
        let limit = model
            .input_token_limit
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(row![name, model.display_name, limit]);
    }

    println!("\nAvailable models:\n");
    table.printstd();
    println!();
}

/// Handle the `model` subcommand
pub async fn handle_model(config: &Config, command: ModelCommand) -> Result<()> {
    let mut state = super::open_state(config)?;
    match command {
        ModelCommand::Show => show_model(&state),
        ModelCommand::Set { name } => set_model(&mut state, &name)?,
        ModelCommand::List { json } => {
            let provider = super::build_provider(config)?;
            list_models(provider.as_ref(), state.selected_model(), json).await?;
        }
    }
    Ok(())
}
