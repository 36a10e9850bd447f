//! Vim commands and motions.
//!
//! This module defines the commands the parser recognizes. They are
//! high-level operations; the executor translates each one into native
//! editing keystrokes for the focused text field.

use super::Mode;

/// A motion relocates the cursor (or extends a selection) without editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// `h`
    Left,
    /// `l`
    Right,
    /// `k`
    Up,
    /// `j`
    Down,
    /// `w` - start of the next word.
    WordForward,
    /// `e` - end of the current or next word.
    WordEnd,
    /// `b` - start of the previous word.
    WordBackward,
    /// `gg`
    FirstLine,
    /// `G`
    LastLine,
}

impl Motion {
    /// Returns true for the motions that depend on word boundaries.
    pub fn is_word_motion(&self) -> bool {
        matches!(
            self,
            Motion::WordForward | Motion::WordEnd | Motion::WordBackward
        )
    }
}

/// A command that edits text (or the clipboard/undo history).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// Delete character under cursor (x).
    DeleteChar,
    /// Delete entire line (dd).
    DeleteLine,
    /// Delete to end of line (D).
    DeleteToLineEnd,
    /// Substitute character (s) - delete and enter insert mode.
    ChangeChar,
    /// Change entire line (cc).
    ChangeLine,
    /// Change to end of line (C).
    ChangeToLineEnd,
    /// Yank the current selection (visual `y`).
    Yank,
    /// Yank entire line (yy).
    YankLine,
    /// Paste after cursor (p).
    PasteAfter,
    /// Paste before cursor (P).
    PasteBefore,
    /// Undo (u).
    Undo,
    /// Redo (r).
    Redo,
}

impl Edit {
    /// Returns true if this edit leaves the engine in insert mode.
    pub fn enters_insert_mode(&self) -> bool {
        matches!(
            self,
            Edit::ChangeChar | Edit::ChangeLine | Edit::ChangeToLineEnd
        )
    }
}

/// A command whose main effect is entering another mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSwitch {
    /// `i`
    Insert,
    /// `a`
    InsertAfter,
    /// `I`
    InsertLineStart,
    /// `A`
    InsertLineEnd,
    /// `o`
    OpenLineBelow,
    /// `O`
    OpenLineAbove,
    /// `v`
    Visual,
    /// `V`
    VisualLine,
}

impl ModeSwitch {
    /// The mode this command ends in.
    pub fn target(&self) -> Mode {
        match self {
            ModeSwitch::Visual => Mode::Visual,
            ModeSwitch::VisualLine => Mode::VisualLine,
            _ => Mode::Insert,
        }
    }
}

/// A recognized vim command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VimCommand {
    Motion(Motion),
    Edit(Edit),
    ModeSwitch(ModeSwitch),
}

/// A command together with its repeat count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: VimCommand,
    /// Repeat count, at least 1.
    pub count: usize,
}

impl ParsedCommand {
    pub fn new(command: VimCommand, count: usize) -> Self {
        Self {
            command,
            count: count.max(1),
        }
    }

    pub fn motion(motion: Motion, count: usize) -> Self {
        Self::new(VimCommand::Motion(motion), count)
    }

    pub fn edit(edit: Edit, count: usize) -> Self {
        Self::new(VimCommand::Edit(edit), count)
    }
}
