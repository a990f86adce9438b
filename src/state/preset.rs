//! Named, reusable system instructions

use serde::{Deserialize, Serialize};

/// A saved system instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInstructionPreset {
    /// Unique key
    pub name: String,
    /// Instruction text
    pub instruction: String,
}

/// Presets keyed by name, kept in first-save order
#[derive(Debug, Clone, Default)]
pub struct PresetStore {
    presets: Vec<SystemInstructionPreset>,
}

impl PresetStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted presets; later duplicates of a name win
    pub fn from_presets(presets: Vec<SystemInstructionPreset>) -> Self {
        let mut store = Self::new();
        for preset in presets {
            store.save(preset.name, preset.instruction);
        }
        store
    }

    /// Insert or overwrite a preset
    ///
    /// Returns true if an existing preset was overwritten.
    ///
    /// # Examples
    ///
    /// ```
    /// use gemchat::state::PresetStore;
    ///
    /// let mut presets = PresetStore::new();
    /// assert!(!presets.save("terse", "Be brief."));
    /// assert!(presets.save("terse", "Be very brief."));
    /// assert_eq!(presets.len(), 1);
    /// assert_eq!(presets.get("terse").unwrap().instruction, "Be very brief.");
    /// ```
    pub fn save(&mut self, name: impl Into<String>, instruction: impl Into<String>) -> bool {
        let name = name.into();
        let instruction = instruction.into();

        if let Some(existing) = self.presets.iter_mut().find(|p| p.name == name) {
            existing.instruction = instruction;
            return true;
        }

        self.presets.push(SystemInstructionPreset { name, instruction });
        false
    }

    /// Remove a preset, returning it if it existed
    pub fn delete(&mut self, name: &str) -> Option<SystemInstructionPreset> {
        let position = self.presets.iter().position(|p| p.name == name)?;
        Some(self.presets.remove(position))
    }

    /// Look up a preset by name
    pub fn get(&self, name: &str) -> Option<&SystemInstructionPreset> {
        self.presets.iter().find(|p| p.name == name)
    }

    /// All presets
    pub fn list(&self) -> &[SystemInstructionPreset] {
        &self.presets
    }

    /// Number of presets
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Returns true if there are no presets
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
