//! Special commands parser for interactive chat mode
//!
//! This module parses the slash commands available in the chat loop.
//! Special commands allow users to:
//! - Create, list, switch, rename, clear and delete conversations
//! - Inspect, edit and resend messages of the current conversation
//! - Manage the system instruction and presets
//! - Select the model and export transcripts
//! - Exit the session
//!
//! Command words are case-insensitive; their arguments keep their case.
//! Message indexes are 1-based as shown by `/history`.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// What to do with the current conversation's system instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionAction {
    /// Print the instruction
    Show,
    /// Replace the instruction
    Set(String),
    /// Remove the instruction
    Clear,
}

/// Preset operations available from the chat loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetAction {
    /// List presets
    List,
    /// Save the current instruction under a name
    Save(String),
    /// Delete a preset
    Delete(String),
    /// Apply a preset to the current conversation
    Apply(String),
}

/// Special commands that can be executed during interactive chat
///
/// These commands change state or print information instead of being
/// sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Create a conversation and switch to it
    NewConversation,

    /// List conversations
    ListConversations,

    /// Switch to the conversation matching the selector
    Switch(String),

    /// Rename the current conversation
    Rename(String),

    /// Delete a conversation (current one when no selector is given)
    Delete(Option<String>),

    /// Remove all messages of the current conversation
    Clear,

    /// Print the current conversation with message numbers
    History,

    /// Edit the message at a 0-based index
    Edit { index: usize, text: String },

    /// Resend the user message at a 0-based index
    Resend(usize),

    /// Show, set or clear the system instruction
    Instruction(InstructionAction),

    /// Preset management
    Preset(PresetAction),

    /// Show (None) or select (Some) the model
    Model(Option<String>),

    /// List models from the provider
    ListModels,

    /// Export the current conversation, optionally into a directory
    Export(Option<String>),

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the model as a regular message.
    None,
}

fn missing(command: &str, usage: &str) -> CommandError {
    CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

fn unsupported(command: &str, arg: &str) -> CommandError {
    CommandError::UnsupportedArgument {
        command: command.to_string(),
        arg: arg.to_string(),
    }
}

/// Parse a 1-based message number into a 0-based index
fn parse_index(command: &str, arg: &str) -> Result<usize, CommandError> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(unsupported(command, arg)),
    }
}

/// Split the first whitespace-delimited word from the rest
fn split_word(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

/// Parse a user input string into a special command
///
/// # Returns
///
/// Returns Ok(SpecialCommand) for valid commands or SpecialCommand::None for
/// regular messages.
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command receives an invalid argument.
/// Returns CommandError::MissingArgument if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use gemchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewConversation);
/// assert_eq!(
///     parse_special_command("/rename Trip Plans").unwrap(),
///     SpecialCommand::Rename("Trip Plans".to_string())
/// );
/// assert_eq!(parse_special_command("/resend 1").unwrap(), SpecialCommand::Resend(0));
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }

    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (word, rest) = split_word(trimmed);
    let word = word.to_lowercase();

    match word.as_str() {
        "/new" => Ok(SpecialCommand::NewConversation),
        "/list" | "/ls" => Ok(SpecialCommand::ListConversations),

        "/switch" | "/open" => {
            if rest.is_empty() {
                Err(missing("/switch", "/switch <number|id>"))
            } else {
                Ok(SpecialCommand::Switch(rest.to_string()))
            }
        }

        "/rename" => {
            if rest.is_empty() {
                Err(missing("/rename", "/rename <name>"))
            } else {
                Ok(SpecialCommand::Rename(rest.to_string()))
            }
        }

        "/delete" => Ok(SpecialCommand::Delete(
            (!rest.is_empty()).then(|| rest.to_string()),
        )),

        "/clear" => {
            if rest.is_empty() {
                Ok(SpecialCommand::Clear)
            } else {
                Err(unsupported("/clear", rest))
            }
        }

        "/history" => Ok(SpecialCommand::History),

        "/edit" => {
            let (index, text) = split_word(rest);
            if index.is_empty() || text.is_empty() {
                return Err(missing("/edit", "/edit <number> <new text>"));
            }
            Ok(SpecialCommand::Edit {
                index: parse_index("/edit", index)?,
                text: text.to_string(),
            })
        }

        "/resend" | "/retry" => {
            if rest.is_empty() {
                return Err(missing("/resend", "/resend <number>"));
            }
            Ok(SpecialCommand::Resend(parse_index("/resend", rest)?))
        }

        "/instruction" | "/system" => {
            let action = if rest.is_empty() {
                InstructionAction::Show
            } else if rest.eq_ignore_ascii_case("clear") {
                InstructionAction::Clear
            } else {
                InstructionAction::Set(rest.to_string())
            };
            Ok(SpecialCommand::Instruction(action))
        }

        "/preset" | "/presets" => {
            let (sub, name) = split_word(rest);
            let sub = sub.to_lowercase();
            let usage = "/preset list|save <name>|delete <name>|apply <name>";
            match sub.as_str() {
                "" | "list" => Ok(SpecialCommand::Preset(PresetAction::List)),
                "save" | "delete" | "apply" if name.is_empty() => {
                    Err(missing(&format!("/preset {}", sub), usage))
                }
                "save" => Ok(SpecialCommand::Preset(PresetAction::Save(name.to_string()))),
                "delete" => Ok(SpecialCommand::Preset(PresetAction::Delete(name.to_string()))),
                "apply" => Ok(SpecialCommand::Preset(PresetAction::Apply(name.to_string()))),
                other => Err(unsupported("/preset", other)),
            }
        }

        "/model" => Ok(SpecialCommand::Model(
            (!rest.is_empty()).then(|| rest.to_string()),
        )),

        "/models" => {
            if rest.is_empty() || rest.eq_ignore_ascii_case("list") {
                Ok(SpecialCommand::ListModels)
            } else {
                Err(unsupported("/models", rest))
            }
        }

        "/export" => Ok(SpecialCommand::Export(
            (!rest.is_empty()).then(|| rest.to_string()),
        )),

        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

/// Display help text for special commands
///
/// # Examples
///
/// ```
/// use gemchat::commands::special_commands::print_help;
///
/// print_help();
/// ```
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

CONVERSATIONS:
  /new                 - Start a new conversation
  /list                - List conversations (current one marked with *)
  /switch <n|id>       - Switch by list number, id or id prefix
  /rename <name>       - Rename the current conversation
  /delete [n|id]       - Delete a conversation (default: current)
  /clear               - Remove all messages from the current conversation

MESSAGES:
  /history             - Show the current conversation with message numbers
  /edit <n> <text>     - Edit message n; editing your own message regenerates
                         the reply, editing a model message only changes its text
  /resend <n>          - Send your message n again and regenerate from there

SYSTEM INSTRUCTION:
  /instruction         - Show the current instruction
  /instruction <text>  - Set the current instruction
  /instruction clear   - Remove the current instruction
  /preset list         - List saved presets
  /preset save <name>  - Save the current instruction as a preset
  /preset apply <name> - Use a preset for the current conversation
  /preset delete <name> - Delete a preset

MODEL:
  /model               - Show the selected model
  /model <name>        - Select a model
  /models              - List models available to your API key

OTHER:
  /export [dir]        - Write the current conversation as Markdown
  /help                - Show this help message
  /exit                - Exit (also: exit, quit)

NOTES:
  - Regular text (not starting with /) is sent to the model
  - Everything is saved automatically after each change
"#
    );
}
