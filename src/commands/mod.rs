/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`: Interactive chat loop with slash commands
- `conversations`: One-shot conversation management
- `presets`: System-instruction presets
- `model`: Model selection and listing
- `auth`: Store the API key in the keyring

Handlers open the state database and build the provider through the
helpers below, then delegate to the library components.
*/

use crate::chat::ChatOrchestrator;
use crate::commands::special_commands::{
    parse_special_command, print_help, InstructionAction, PresetAction, SpecialCommand,
};
use crate::config::Config;
use crate::error::Result;
use crate::providers::{create_provider, Provider};
use crate::state::AppState;
use crate::storage::{CredentialStore, Persistence, SledStorage};
use std::sync::Arc;

// Special commands parser for the chat loop
pub mod special_commands;

// Conversation management commands
pub mod conversations;

// Preset management commands
pub mod presets;

// Model selection commands
pub mod model;

/// Open the state database and load application state
///
/// # Errors
///
/// Returns `GemchatError::Storage` if the database cannot be opened
pub fn open_state(config: &Config) -> Result<AppState> {
    let storage = SledStorage::open(config.storage.data_dir.as_deref())?;
    tracing::debug!("Using state database at {}", storage.path().display());
    Ok(AppState::load(
        Persistence::new(storage),
        &config.provider.default_model,
    ))
}

/// Build the Gemini provider with the resolved API key
pub fn build_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    let api_key = CredentialStore::default().resolve(&config.provider);
    if api_key.is_none() {
        tracing::warn!("No API key configured; requests will report a missing key");
    }
    Ok(Arc::from(create_provider(&config.provider, api_key)?))
}

// Chat command handler
pub mod chat {
    //! Interactive chat loop.
    //!
    //! Plain lines are sent to the current conversation through the
    //! `ChatOrchestrator`; lines starting with `/` are parsed as special
    //! commands and applied to the shared state.

    use super::*;
    use crate::commands::conversations::{
        export_to, print_conversation_table, print_history, print_message_text, resolve_id,
    };
    use crate::commands::presets::{delete_and_report, print_preset_table, save_and_report};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::path::PathBuf;

    /// Whether the loop should keep reading input
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LoopControl {
        /// Read the next line
        Continue,
        /// Leave the loop
        Exit,
    }

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `conversation` - Optional selector of the conversation to open
    /// * `model` - Optional model to select before chatting
    ///
    /// # Examples
    ///
    /// ```
    /// use gemchat::commands::chat;
    /// use gemchat::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default(), None, None).await?;
    /// ```
    pub async fn run_chat(
        config: Config,
        conversation: Option<String>,
        model: Option<String>,
    ) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let mut state = open_state(&config)?;
        if let Some(selector) = conversation.as_deref() {
            let id = resolve_id(&state, selector)?;
            state.switch_conversation(&id);
        }
        if let Some(model) = model.as_deref() {
            state.select_model(model)?;
        }

        let provider = build_provider(&config)?;
        let orchestrator = ChatOrchestrator::new(state.into_shared(), provider);

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&orchestrator)?;

        loop {
            let prompt = format_prompt(&orchestrator)?;
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    rl.add_history_entry(trimmed)?;

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    let outcome = match command {
                        SpecialCommand::None => send_message(&orchestrator, trimmed)
                            .await
                            .map(|_| LoopControl::Continue),
                        command => {
                            handle_special_command(&orchestrator, command, &config).await
                        }
                    };

                    match outcome {
                        Ok(LoopControl::Exit) => break,
                        Ok(LoopControl::Continue) => {}
                        Err(e) => eprintln!("{}\n", format!("Error: {}", e).red()),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Send a regular line to the current conversation and print the reply
    async fn send_message(orchestrator: &ChatOrchestrator, text: &str) -> Result<()> {
        let id = current_id(orchestrator)?;
        println!("{}", "Thinking...".dimmed());
        let reply = orchestrator.send(&id, text, None).await?;
        println!();
        print_message_text(&reply);
        println!();
        Ok(())
    }

    fn current_id(orchestrator: &ChatOrchestrator) -> Result<String> {
        let state = orchestrator.read_state()?;
        super::conversations::resolve_or_current(&state, None)
    }

    /// Apply a parsed special command
    ///
    /// Returns whether the loop should continue.
    pub async fn handle_special_command(
        orchestrator: &ChatOrchestrator,
        command: SpecialCommand,
        config: &Config,
    ) -> Result<LoopControl> {
        match command {
            SpecialCommand::NewConversation => {
                let mut state = orchestrator.write_state()?;
                let id = state.create_conversation();
                if let Some(conversation) = state.conversation(&id) {
                    println!(
                        "{}\n",
                        format!("Started '{}'", conversation.name).green()
                    );
                }
            }
            SpecialCommand::ListConversations => {
                print_conversation_table(&*orchestrator.read_state()?);
            }
            SpecialCommand::Switch(selector) => {
                let mut state = orchestrator.write_state()?;
                let id = resolve_id(&state, &selector)?;
                state.switch_conversation(&id);
                if let Some(conversation) = state.current_conversation() {
                    println!(
                        "{}",
                        format!("Switched to '{}'", conversation.name).green()
                    );
                    print_history(conversation);
                }
            }
            SpecialCommand::Rename(name) => {
                let mut state = orchestrator.write_state()?;
                let id = super::conversations::resolve_or_current(&state, None)?;
                state.rename_conversation(&id, &name)?;
                println!("{}\n", format!("Renamed to '{}'", name.trim()).green());
            }
            SpecialCommand::Delete(selector) => {
                let mut state = orchestrator.write_state()?;
                let id = super::conversations::resolve_or_current(&state, selector.as_deref())?;
                if let Some(removed) = state.delete_conversation(&id) {
                    println!("{}", format!("Deleted '{}'", removed.name).green());
                }
                if let Some(current) = state.current_conversation() {
                    println!("Current conversation: {}\n", current.name.cyan());
                }
            }
            SpecialCommand::Clear => {
                let mut state = orchestrator.write_state()?;
                let id = super::conversations::resolve_or_current(&state, None)?;
                state.clear_conversation(&id)?;
                println!("{}\n", "Conversation cleared.".green());
            }
            SpecialCommand::History => {
                let state = orchestrator.read_state()?;
                if let Some(conversation) = state.current_conversation() {
                    print_history(conversation);
                }
            }
            SpecialCommand::Edit { index, text } => {
                let id = current_id(orchestrator)?;
                match orchestrator.edit(&id, index, &text).await? {
                    Some(reply) => {
                        println!();
                        print_message_text(&reply);
                        println!();
                    }
                    None => println!("{}\n", format!("Updated message {}", index + 1).green()),
                }
            }
            SpecialCommand::Resend(index) => {
                let id = current_id(orchestrator)?;
                println!("{}", "Thinking...".dimmed());
                let reply = orchestrator.resend(&id, index).await?;
                println!();
                print_message_text(&reply);
                println!();
            }
            SpecialCommand::Instruction(action) => {
                let mut state = orchestrator.write_state()?;
                let id = super::conversations::resolve_or_current(&state, None)?;
                match action {
                    InstructionAction::Show => {
                        let instruction = state
                            .conversation(&id)
                            .map(|c| c.system_instruction.clone())
                            .unwrap_or_default();
                        if instruction.is_empty() {
                            println!("{}\n", "No system instruction set.".yellow());
                        } else {
                            println!("{} {}\n", "Instruction:".yellow(), instruction);
                        }
                    }
                    InstructionAction::Set(text) => {
                        state.set_instruction(&id, &text)?;
                        println!("{}\n", "System instruction updated.".green());
                    }
                    InstructionAction::Clear => {
                        state.set_instruction(&id, "")?;
                        println!("{}\n", "System instruction cleared.".green());
                    }
                }
            }
            SpecialCommand::Preset(action) => {
                let mut state = orchestrator.write_state()?;
                match action {
                    PresetAction::List => print_preset_table(&state),
                    PresetAction::Save(name) => save_and_report(&mut state, &name, None)?,
                    PresetAction::Delete(name) => delete_and_report(&mut state, &name)?,
                    PresetAction::Apply(name) => {
                        state.apply_preset(&name)?;
                        println!("{}\n", format!("Applied preset '{}'", name).green());
                    }
                }
            }
            SpecialCommand::Model(None) => {
                super::model::show_model(&*orchestrator.read_state()?);
            }
            SpecialCommand::Model(Some(name)) => {
                super::model::set_model(&mut *orchestrator.write_state()?, &name)?;
            }
            SpecialCommand::ListModels => {
                let selected = orchestrator.read_state()?.selected_model().to_string();
                let provider = build_provider(config)?;
                super::model::list_models(provider.as_ref(), &selected, false).await?;
            }
            SpecialCommand::Export(dir) => {
                let dir = dir
                    .map(PathBuf::from)
                    .unwrap_or_else(|| config.export.directory.clone());
                let state = orchestrator.read_state()?;
                let id = super::conversations::resolve_or_current(&state, None)?;
                export_to(&state, &id, &dir)?;
            }
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit => return Ok(LoopControl::Exit),
            SpecialCommand::None => {}
        }
        Ok(LoopControl::Continue)
    }

    fn format_prompt(orchestrator: &ChatOrchestrator) -> Result<String> {
        let state = orchestrator.read_state()?;
        let name = state
            .current_conversation()
            .map(|c| c.name.clone())
            .unwrap_or_default();
        Ok(format!("[{}] >> ", name.cyan()))
    }

    /// Display welcome banner at the start of interactive chat mode
    fn print_welcome_banner(orchestrator: &ChatOrchestrator) -> Result<()> {
        let state = orchestrator.read_state()?;
        println!("{}", "gemchat".bold().green());
        println!(
            "Model: {}  Conversations: {}",
            state.selected_model().cyan(),
            state.conversations().len()
        );
        println!("Type {} for commands, {} to leave.\n", "/help".cyan(), "/exit".cyan());
        Ok(())
    }

}

// Auth command handler
pub mod auth {
    use super::*;
    use colored::Colorize;
    use std::io::{BufRead, Write};

    /// Store (or clear) the Gemini API key in the system keyring
    ///
    /// # Arguments
    ///
    /// * `key` - Key to store; read from stdin when `None`
    /// * `clear` - Remove the stored key instead
    pub fn authenticate(key: Option<String>, clear: bool) -> Result<()> {
        let store = CredentialStore::default();

        if clear {
            store.clear()?;
            println!("{}", "Removed the stored API key.".green());
            return Ok(());
        }

        let key = match key {
            Some(key) => key,
            None => prompt_for_key()?,
        };

        let key = validate_key(&key)?;
        store.store(key)?;
        println!("{}", "API key stored in the system keyring.".green());
        Ok(())
    }

    fn prompt_for_key() -> Result<String> {
        print!("Gemini API key: ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }

    /// Trim a key and reject blank input
    pub fn validate_key(key: &str) -> Result<&str> {
        let key = key.trim();
        if key.is_empty() {
            return Err(
                crate::error::GemchatError::Config("API key cannot be empty".to_string()).into(),
            );
        }
        Ok(key)
    }

}
