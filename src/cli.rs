//! Command-line interface definition for gemchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive chat loop plus one-shot commands for
//! conversations, presets, model selection and authentication.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gemchat - multi-conversation chat client for the Gemini API
///
/// Keeps any number of named conversations, each with its own system
/// instruction, and persists them between runs.
#[derive(Parser, Debug, Clone)]
#[command(name = "gemchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory holding the state database (overrides config and env)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for gemchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive chat loop
    Chat {
        /// Conversation to open (list position, id or id prefix)
        #[arg(short, long)]
        conversation: Option<String>,

        /// Model to select before chatting
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Manage conversations
    Conversations {
        /// Conversation subcommand
        #[command(subcommand)]
        command: ConversationCommand,
    },

    /// Manage system-instruction presets
    Presets {
        /// Preset subcommand
        #[command(subcommand)]
        command: PresetCommand,
    },

    /// Show, select or list models
    Model {
        /// Model subcommand
        #[command(subcommand)]
        command: ModelCommand,
    },

    /// Store the Gemini API key in the system keyring
    Auth {
        /// API key; prompted for when omitted
        #[arg(short, long)]
        key: Option<String>,

        /// Remove the stored key instead
        #[arg(long, conflicts_with = "key")]
        clear: bool,
    },
}

/// Conversation subcommands
///
/// `ID` arguments accept a 1-based list position, a full id or a unique
/// id prefix.
#[derive(Subcommand, Debug, Clone)]
pub enum ConversationCommand {
    /// List conversations
    List,

    /// Create a conversation and make it current
    New {
        /// Name for the new conversation
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Rename a conversation
    Rename {
        /// Conversation to rename
        id: String,
        /// New name
        name: String,
    },

    /// Delete a conversation
    Delete {
        /// Conversation to delete
        id: String,
    },

    /// Remove all messages from a conversation
    Clear {
        /// Conversation to clear (defaults to the current one)
        id: Option<String>,
    },

    /// Make a conversation current
    Switch {
        /// Conversation to switch to
        id: String,
    },

    /// Print a conversation's transcript
    Show {
        /// Conversation to show (defaults to the current one)
        id: Option<String>,
    },

    /// Export a conversation as Markdown
    Export {
        /// Conversation to export (defaults to the current one)
        id: Option<String>,

        /// Output directory (defaults to export.directory from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Preset subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PresetCommand {
    /// List presets
    List,

    /// Save a preset (overwrites an existing one with the same name)
    Save {
        /// Preset name
        name: String,

        /// Instruction text (defaults to the current conversation's instruction)
        #[arg(short, long)]
        instruction: Option<String>,
    },

    /// Delete a preset
    Delete {
        /// Preset name
        name: String,
    },

    /// Apply a preset to the current conversation
    Apply {
        /// Preset name
        name: String,
    },
}

/// Model subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ModelCommand {
    /// Show the selected model
    Show,

    /// Select the model used for new requests
    Set {
        /// Model identifier (e.g. gemini-2.0-flash)
        name: String,
    },

    /// List models available to the configured API key
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            data_dir: None,
            command: Commands::Model {
                command: ModelCommand::Show,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(cli.data_dir.is_none());
    }

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["gemchat", "chat"]);
        assert!(cli.is_ok());
        let cli = cli.unwrap();
        assert!(matches!(
            cli.command,
            Commands::Chat {
                conversation: None,
                model: None
            }
        ));
    }

    #[test]
    fn test_cli_parse_chat_with_options() {
        let cli = Cli::try_parse_from(["gemchat", "chat", "-c", "2", "--model", "gemini-1.5-pro"])
            .unwrap();
        if let Commands::Chat {
            conversation,
            model,
        } = cli.command
        {
            assert_eq!(conversation.as_deref(), Some("2"));
            assert_eq!(model.as_deref(), Some("gemini-1.5-pro"));
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "gemchat",
            "--config",
            "custom.yaml",
            "-v",
            "--data-dir",
            "/tmp/state",
            "model",
            "show",
        ])
        .unwrap();
        assert_eq!(cli.config, Some("custom.yaml".to_string()));
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/state")));
    }

    #[test]
    fn test_cli_parse_conversations_rename() {
        let cli = Cli::try_parse_from(["gemchat", "conversations", "rename", "1", "Trip plans"])
            .unwrap();
        if let Commands::Conversations {
            command: ConversationCommand::Rename { id, name },
        } = cli.command
        {
            assert_eq!(id, "1");
            assert_eq!(name, "Trip plans");
        } else {
            panic!("Expected conversations rename");
        }
    }

    #[test]
    fn test_cli_parse_conversations_export_defaults() {
        let cli = Cli::try_parse_from(["gemchat", "conversations", "export"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Conversations {
                command: ConversationCommand::Export {
                    id: None,
                    output: None
                }
            }
        ));
    }

    #[test]
    fn test_cli_parse_presets_save() {
        let cli = Cli::try_parse_from([
            "gemchat",
            "presets",
            "save",
            "poet",
            "--instruction",
            "Answer in verse.",
        ])
        .unwrap();
        if let Commands::Presets {
            command: PresetCommand::Save { name, instruction },
        } = cli.command
        {
            assert_eq!(name, "poet");
            assert_eq!(instruction.as_deref(), Some("Answer in verse."));
        } else {
            panic!("Expected presets save");
        }
    }

    #[test]
    fn test_cli_parse_model_list_json() {
        let cli = Cli::try_parse_from(["gemchat", "model", "list", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Model {
                command: ModelCommand::List { json: true }
            }
        ));
    }

    #[test]
    fn test_cli_parse_auth() {
        let cli = Cli::try_parse_from(["gemchat", "auth", "--key", "abc"]).unwrap();
        if let Commands::Auth { key, clear } = cli.command {
            assert_eq!(key.as_deref(), Some("abc"));
            assert!(!clear);
        } else {
            panic!("Expected Auth command");
        }
    }

    #[test]
    fn test_cli_parse_auth_key_conflicts_with_clear() {
        let cli = Cli::try_parse_from(["gemchat", "auth", "--key", "abc", "--clear"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_missing_command() {
        let cli = Cli::try_parse_from(["gemchat"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_invalid_command() {
        let cli = Cli::try_parse_from(["gemchat", "invalid"]);
        assert!(cli.is_err());
    }
}
