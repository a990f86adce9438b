//! Conversation management commands
//!
//! Shared by the `conversations` subcommand and the chat loop's slash
//! commands: selector resolution, the conversation table and the numbered
//! history view.

use crate::cli::ConversationCommand;
use crate::config::Config;
use crate::error::{GemchatError, Result};
use crate::export;
use crate::providers::{is_placeholder, Role};
use crate::state::{AppState, Conversation};
use colored::Colorize;
use prettytable::{format, Table};
use std::path::{Path, PathBuf};

/// Width at which previews are cut
const PREVIEW_WIDTH: usize = 40;

/// Resolve a selector (list number, id or id prefix) to a conversation id
///
/// # Errors
///
/// Returns `ConversationNotFound` if nothing matches
pub fn resolve_id(state: &AppState, selector: &str) -> Result<String> {
    state
        .conversations()
        .resolve(selector)
        .map(|c| c.id.clone())
        .ok_or_else(|| GemchatError::ConversationNotFound(selector.to_string()).into())
}

/// Resolve an optional selector, defaulting to the current conversation
pub fn resolve_or_current(state: &AppState, selector: Option<&str>) -> Result<String> {
    match selector {
        Some(selector) => resolve_id(state, selector),
        None => state
            .current_id()
            .ok_or_else(|| GemchatError::ConversationNotFound("<current>".to_string()).into()),
    }
}

fn preview(text: &str) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() > PREVIEW_WIDTH {
        let cut: String = single_line.chars().take(PREVIEW_WIDTH - 3).collect();
        format!("{}...", cut)
    } else {
        single_line
    }
}

/// Print all conversations as a table, marking the current one
pub fn print_conversation_table(state: &AppState) {
    let current = state.current_id();

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "#".bold(),
        "ID".bold(),
        "Name".bold(),
        "Messages".bold(),
        "Last Message".bold()
    ]);

    for (position, conversation) in state.conversations().list().iter().enumerate() {
        let marker = if current.as_deref() == Some(conversation.id.as_str()) {
            format!("*{}", position + 1).green().to_string()
        } else {
            (position + 1).to_string()
        };
        let last = conversation
            .last_message()
            .map(|m| preview(&m.text))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(prettytable::row![
            marker,
            conversation.short_id().cyan(),
            conversation.name,
            conversation.messages.len(),
            last
        ]);
    }

    println!("\nConversations:");
    table.printstd();
    println!();
}

/// Print a conversation with 1-based message numbers
pub fn print_history(conversation: &Conversation) {
    println!(
        "\n{} {}",
        conversation.name.bold(),
        format!("({})", conversation.short_id()).dimmed()
    );

    if !conversation.system_instruction.is_empty() {
        println!(
            "{} {}",
            "Instruction:".yellow(),
            conversation.system_instruction
        );
    }

    if conversation.messages.is_empty() {
        println!("{}", "No messages yet.".yellow());
        println!();
        return;
    }

    for (index, message) in conversation.messages.iter().enumerate() {
        let label = match message.role {
            Role::User => format!("[{}] You:", index + 1).cyan().bold(),
            Role::Model => format!("[{}] Model:", index + 1).magenta().bold(),
        };
        println!("\n{}", label);
        print_message_text(&message.text);
    }
    println!();
}

/// Print message text, highlighting placeholders
pub fn print_message_text(text: &str) {
    if is_placeholder(text) {
        println!("{}", text.yellow());
    } else {
        println!("{}", text);
    }
}

/// Export a conversation and report where it went
pub fn export_to(state: &AppState, id: &str, dir: &Path) -> Result<PathBuf> {
    let conversation = state
        .conversation(id)
        .ok_or_else(|| GemchatError::ConversationNotFound(id.to_string()))?;
    let path = export::export_conversation(conversation, dir)?;
    println!(
        "{}",
        format!("Exported '{}' to {}", conversation.name, path.display()).green()
    );
    Ok(path)
}

/// Apply a conversation subcommand to already loaded state
pub fn apply_conversation_command(
    state: &mut AppState,
    command: ConversationCommand,
    export_dir: &Path,
) -> Result<()> {
    match command {
        ConversationCommand::List => print_conversation_table(state),
        ConversationCommand::New { name } => {
            let id = state.create_conversation();
            if let Some(name) = name {
                state.rename_conversation(&id, &name)?;
            }
            if let Some(conversation) = state.conversation(&id) {
                println!(
                    "{}",
                    format!(
                        "Created '{}' ({})",
                        conversation.name,
                        conversation.short_id()
                    )
                    .green()
                );
            }
        }
        ConversationCommand::Rename { id, name } => {
            let id = resolve_id(state, &id)?;
            state.rename_conversation(&id, &name)?;
            println!("{}", format!("Renamed to '{}'", name.trim()).green());
        }
        ConversationCommand::Delete { id } => {
            let id = resolve_id(state, &id)?;
            if let Some(removed) = state.delete_conversation(&id) {
                println!("{}", format!("Deleted '{}'", removed.name).green());
            }
        }
        ConversationCommand::Clear { id } => {
            let id = resolve_or_current(state, id.as_deref())?;
            state.clear_conversation(&id)?;
            println!("{}", "Conversation cleared.".green());
        }
        ConversationCommand::Switch { id } => {
            let id = resolve_id(state, &id)?;
            state.switch_conversation(&id);
            if let Some(conversation) = state.current_conversation() {
                println!(
                    "{}",
                    format!("Switched to '{}'", conversation.name).green()
                );
            }
        }
        ConversationCommand::Show { id } => {
            let id = resolve_or_current(state, id.as_deref())?;
            if let Some(conversation) = state.conversation(&id) {
                print_history(conversation);
            }
        }
        ConversationCommand::Export { id, output } => {
            let id = resolve_or_current(state, id.as_deref())?;
            let dir = output.unwrap_or_else(|| export_dir.to_path_buf());
            export_to(state, &id, &dir)?;
        }
    }
    Ok(())
}

/// Handle the `conversations` subcommand
pub fn handle_conversations(config: &Config, command: ConversationCommand) -> Result<()> {
    let mut state = super::open_state(config)?;
    apply_conversation_command(&mut state, command, &config.export.directory)
}
