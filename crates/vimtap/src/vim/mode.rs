//! Vim editing modes.

use serde::{Deserialize, Serialize};

/// The current vim editing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Normal mode - navigation and commands.
    #[default]
    Normal,
    /// Insert mode - keys reach the target field.
    Insert,
    /// Visual mode - character-wise selection.
    Visual,
    /// Visual line mode - line-wise selection.
    VisualLine,
}

impl Mode {
    /// Returns true if in insert mode.
    pub fn is_insert(&self) -> bool {
        matches!(self, Mode::Insert)
    }

    /// Returns true if in normal mode.
    pub fn is_normal(&self) -> bool {
        matches!(self, Mode::Normal)
    }

    /// Returns true for either visual mode.
    pub fn is_visual(&self) -> bool {
        matches!(self, Mode::Visual | Mode::VisualLine)
    }

    /// Returns the mode name for display.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Visual => "VISUAL",
            Mode::VisualLine => "V-LINE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_default() {
        assert_eq!(Mode::default(), Mode::Normal);
    }

    #[test]
    fn test_mode_predicates() {
        assert!(Mode::Normal.is_normal());
        assert!(!Mode::Normal.is_insert());
        assert!(!Mode::Normal.is_visual());

        assert!(Mode::Insert.is_insert());
        assert!(!Mode::Insert.is_normal());

        assert!(Mode::Visual.is_visual());
        assert!(Mode::VisualLine.is_visual());
        assert!(!Mode::VisualLine.is_normal());
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(Mode::Normal.label(), "NORMAL");
        assert_eq!(Mode::Insert.label(), "INSERT");
        assert_eq!(Mode::Visual.label(), "VISUAL");
        assert_eq!(Mode::VisualLine.label(), "V-LINE");
    }

    #[test]
    fn test_mode_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: Mode,
        }
        let parsed: Wrapper = toml::from_str("mode = \"visual_line\"").unwrap();
        assert_eq!(parsed.mode, Mode::VisualLine);
    }
}
