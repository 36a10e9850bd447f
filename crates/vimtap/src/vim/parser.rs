//! Incremental command parser.
//!
//! The parser sees the whole command buffer (every key since the last
//! clear) on each keystroke and decides whether it names a complete command,
//! is a prefix of one, or can never become one.

use super::command::{Edit, ModeSwitch, Motion, ParsedCommand, VimCommand};

/// Keys that only mean something when followed by a second key.
const OPERATOR_PREFIXES: [&str; 4] = ["g", "d", "c", "y"];

/// Result of parsing a command buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parse {
    /// A terminal command was recognized; the buffer should be cleared.
    Complete(ParsedCommand),
    /// The buffer is a valid prefix; keep accumulating.
    Pending,
    /// The buffer can never form a command; clear it.
    Invalid,
}

/// Parses command buffers, clamping counts to a configured maximum.
#[derive(Debug, Clone, Copy)]
pub struct CommandParser {
    max_count: usize,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(999)
    }
}

impl CommandParser {
    pub fn new(max_count: usize) -> Self {
        Self {
            max_count: max_count.max(1),
        }
    }

    /// Parse the full buffer.
    pub fn parse<S: AsRef<str>>(&self, buffer: &[S]) -> Parse {
        let digits = buffer.iter().map(as_key).take_while(|k| is_digit(k)).count();
        let count = extract_count(buffer)
            .map(|n| n.min(self.max_count))
            .unwrap_or(1);

        let command = match &buffer[digits..] {
            [] => return Parse::Pending,
            [key] => {
                let key = as_key(key);
                match single_key(key) {
                    Some(command) => command,
                    None if OPERATOR_PREFIXES.contains(&key) => return Parse::Pending,
                    None => return Parse::Invalid,
                }
            }
            [first, second] => match double_key(as_key(first), as_key(second)) {
                Some(command) => command,
                None => return Parse::Invalid,
            },
            _ => return Parse::Invalid,
        };

        Parse::Complete(ParsedCommand::new(command, count))
    }
}

/// Extract the repeat count from the leading digit run of `buffer`.
///
/// Returns `None` when there is no digit run or it is zero. Counts too large
/// for `usize` saturate.
pub fn extract_count<S: AsRef<str>>(buffer: &[S]) -> Option<usize> {
    let count = buffer
        .iter()
        .map(as_key)
        .take_while(|k| is_digit(k))
        .filter_map(|k| k.chars().next().and_then(|c| c.to_digit(10)))
        .fold(0usize, |acc, d| {
            acc.saturating_mul(10).saturating_add(d as usize)
        });
    (count > 0).then_some(count)
}

fn as_key<S: AsRef<str>>(key: &S) -> &str {
    key.as_ref()
}

fn is_digit(key: &str) -> bool {
    let mut chars = key.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_digit())
}

fn single_key(key: &str) -> Option<VimCommand> {
    let command = match key {
        // === Motions ===
        "h" => VimCommand::Motion(Motion::Left),
        "j" => VimCommand::Motion(Motion::Down),
        "k" => VimCommand::Motion(Motion::Up),
        "l" => VimCommand::Motion(Motion::Right),
        "w" => VimCommand::Motion(Motion::WordForward),
        "e" => VimCommand::Motion(Motion::WordEnd),
        "b" => VimCommand::Motion(Motion::WordBackward),
        "G" => VimCommand::Motion(Motion::LastLine),

        // === Mode entry ===
        "i" => VimCommand::ModeSwitch(ModeSwitch::Insert),
        "a" => VimCommand::ModeSwitch(ModeSwitch::InsertAfter),
        "I" => VimCommand::ModeSwitch(ModeSwitch::InsertLineStart),
        "A" => VimCommand::ModeSwitch(ModeSwitch::InsertLineEnd),
        "o" => VimCommand::ModeSwitch(ModeSwitch::OpenLineBelow),
        "O" => VimCommand::ModeSwitch(ModeSwitch::OpenLineAbove),
        "v" => VimCommand::ModeSwitch(ModeSwitch::Visual),
        "V" => VimCommand::ModeSwitch(ModeSwitch::VisualLine),

        // === Edits ===
        "x" => VimCommand::Edit(Edit::DeleteChar),
        "D" => VimCommand::Edit(Edit::DeleteToLineEnd),
        "s" => VimCommand::Edit(Edit::ChangeChar),
        "C" => VimCommand::Edit(Edit::ChangeToLineEnd),
        "p" => VimCommand::Edit(Edit::PasteAfter),
        "P" => VimCommand::Edit(Edit::PasteBefore),
        "u" => VimCommand::Edit(Edit::Undo),
        "r" => VimCommand::Edit(Edit::Redo),

        _ => return None,
    };
    Some(command)
}

fn double_key(first: &str, second: &str) -> Option<VimCommand> {
    let command = match (first, second) {
        ("d", "d") => VimCommand::Edit(Edit::DeleteLine),
        ("c", "c") => VimCommand::Edit(Edit::ChangeLine),
        ("y", "y") => VimCommand::Edit(Edit::YankLine),
        ("g", "g") => VimCommand::Motion(Motion::FirstLine),
        _ => return None,
    };
    Some(command)
}
