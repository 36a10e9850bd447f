//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::vim::{Mode, SequenceConfig, VimAction};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mode the engine starts in
    pub start_mode: Mode,
    /// Insert-mode chords
    pub chords: Vec<ChordConfig>,
    /// Settle and reply timing
    pub timing: TimingConfig,
    /// Normal mode settings
    pub normal: NormalConfig,
    /// Simulated text field settings
    pub field: FieldConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_mode: Mode::Insert,
            chords: vec![ChordConfig::default()],
            timing: TimingConfig::default(),
            normal: NormalConfig::default(),
            field: FieldConfig::default(),
        }
    }
}

/// A two-key chord typed in insert mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChordConfig {
    /// The two keys, e.g. "jk"
    pub sequence: String,
    /// How long the first key waits for the second
    pub timeout_ms: u64,
    /// Mode entered when the chord matches
    pub target: Mode,
}

impl Default for ChordConfig {
    fn default() -> Self {
        Self {
            sequence: "jk".to_string(),
            timeout_ms: 140,
            target: Mode::Normal,
        }
    }
}

impl ChordConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The detector entry for this chord.
    pub fn to_sequence(&self) -> SequenceConfig<VimAction> {
        SequenceConfig::new(
            self.sequence.clone(),
            VimAction::SwitchMode(self.target),
            self.timeout(),
        )
    }
}

/// Timing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay before follow-up keystrokes (block cursor) are injected
    pub settle_ms: u64,
    /// How long the capture thread waits for a decision
    pub reply_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_ms: 5,
            reply_timeout_ms: 100,
        }
    }
}

impl TimingConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

/// Normal mode settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalConfig {
    /// Largest accepted repeat count
    pub max_count: usize,
}

impl Default for NormalConfig {
    fn default() -> Self {
        Self { max_count: 999 }
    }
}

/// Simulated text field settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Whether the field answers text and selection queries
    pub introspection: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            introspection: true,
        }
    }
}
