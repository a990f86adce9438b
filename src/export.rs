//! Markdown transcript export

use crate::error::{GemchatError, Result};
use crate::providers::Role;
use crate::state::Conversation;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// File stem used when a conversation name sanitizes to nothing
const FALLBACK_FILE_STEM: &str = "conversation";

fn illegal_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[\\/:*?"<>|\p{Cc}]"#).expect("valid regex"))
}

/// Render a conversation as a role-labeled Markdown transcript
///
/// # Examples
///
/// ```
/// use gemchat::export::render_transcript;
/// use gemchat::providers::Message;
/// use gemchat::state::Conversation;
///
/// let mut conversation = Conversation::new("Trip");
/// conversation.messages.push(Message::user("Where to?"));
/// conversation.messages.push(Message::model("Kyoto."));
///
/// let doc = render_transcript(&conversation);
/// assert!(doc.starts_with("# Trip\n"));
/// assert!(doc.contains("**User:**\n\nWhere to?"));
/// assert!(doc.contains("**Model:**\n\nKyoto."));
/// ```
pub fn render_transcript(conversation: &Conversation) -> String {
    let mut sections = vec![format!("# {}", conversation.name)];

    if !conversation.system_instruction.trim().is_empty() {
        let quoted = conversation
            .system_instruction
            .lines()
            .map(|line| format!("> {}", line).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("**System instruction:**\n\n{}", quoted));
    }

    for message in &conversation.messages {
        let label = match message.role {
            Role::User => "User",
            Role::Model => "Model",
        };
        sections.push(format!("**{}:**\n\n{}", label, message.text));
    }

    let mut doc = sections.join("\n\n");
    doc.push('\n');
    doc
}

/// Strip characters that are illegal in file names
///
/// Removes `\ / : * ? " < > |` and control characters, trims whitespace
/// and falls back to `conversation` when nothing is left.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = illegal_chars().replace_all(name, "");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write the transcript to `{sanitized name}.md` inside `dir`
///
/// The directory is created if needed and an existing file is
/// overwritten. Returns the written path.
///
/// # Errors
///
/// Returns `GemchatError::Io` if the directory or file cannot be written
pub fn export_conversation(conversation: &Conversation, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(GemchatError::Io)?;

    let path = dir.join(format!("{}.md", sanitize_filename(&conversation.name)));
    let mut doc = render_transcript(conversation);
    doc.push_str(&format!(
        "\n---\n\n_Exported {}_\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M")
    ));

    std::fs::write(&path, doc).map_err(GemchatError::Io)?;
    tracing::info!(
        "Exported conversation {} to {}",
        conversation.short_id(),
        path.display()
    );
    Ok(path)
}
