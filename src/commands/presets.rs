//! System-instruction preset commands

use crate::cli::PresetCommand;
use crate::config::Config;
use crate::error::Result;
use crate::state::AppState;
use colored::Colorize;
use prettytable::{format, Table};

/// Print all presets, marking the one matching the current instruction
pub fn print_preset_table(state: &AppState) {
    if state.presets().is_empty() {
        println!("{}", "No presets saved.".yellow());
        return;
    }

    let active = state
        .current_conversation()
        .map(|c| c.system_instruction.as_str())
        .unwrap_or_default();

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row!["Name".bold(), "Instruction".bold()]);

    for preset in state.presets().list() {
        let name = if !active.is_empty() && preset.instruction == active {
            format!("* {}", preset.name).green().to_string()
        } else {
            preset.name.clone()
        };
        table.add_row(prettytable::row![name, preset.instruction]);
    }

    println!("\nPresets:");
    table.printstd();
    println!();
}

/// Save a preset and report whether it replaced an existing one
pub fn save_and_report(state: &mut AppState, name: &str, instruction: Option<&str>) -> Result<()> {
    let overwritten = match instruction {
        Some(text) => state.save_preset(name, text)?,
        None => state.save_current_instruction_as(name)?,
    };
    let verb = if overwritten { "Updated" } else { "Saved" };
    println!("{}", format!("{} preset '{}'", verb, name.trim()).green());
    Ok(())
}

/// Delete a preset and report whether the current instruction was cleared
pub fn delete_and_report(state: &mut AppState, name: &str) -> Result<()> {
    let before = state
        .current_conversation()
        .map(|c| c.system_instruction.clone())
        .unwrap_or_default();

    let removed = state.delete_preset(name)?;
    println!("{}", format!("Deleted preset '{}'", removed.name).green());

    if !before.is_empty() && before == removed.instruction {
        println!(
            "{}",
            "The current conversation used this instruction; it has been cleared.".yellow()
        );
    }
    Ok(())
}

/// Apply a preset subcommand to already loaded state
pub fn apply_preset_command(state: &mut AppState, command: PresetCommand) -> Result<()> {
    match command {
        PresetCommand::List => print_preset_table(state),
        PresetCommand::Save { name, instruction } => {
            save_and_report(state, &name, instruction.as_deref())?
        }
        PresetCommand::Delete { name } => delete_and_report(state, &name)?,
        PresetCommand::Apply { name } => {
            state.apply_preset(&name)?;
            println!(
                "{}",
                format!("Applied preset '{}' to the current conversation", name).green()
            );
        }
    }
    Ok(())
}

/// Handle the `presets` subcommand
pub fn handle_presets(config: &Config, command: PresetCommand) -> Result<()> {
    let mut state = super::open_state(config)?;
    apply_preset_command(&mut state, command)
}
