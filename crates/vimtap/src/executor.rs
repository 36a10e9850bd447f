//! Translation of parsed commands into native editing keystrokes.
//!
//! The target field only understands its platform's own editing shortcuts,
//! so every command is rewritten as arrows, shifted arrows, line/document
//! jumps and clipboard chords. The translation is a pure function of the
//! command and, for word motions, of the field's text at that instant.

use tracing::debug;

use crate::backend::{Introspector, Selection};
use crate::keys::{KeyCode, Keystroke, Modifiers};
use crate::vim::word::{self, Direction};
use crate::vim::{Edit, Motion, ParsedCommand, VimCommand};

/// Keystrokes for one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Injected immediately, in order.
    pub keys: Vec<Keystroke>,
    /// Injected after the settle delay, once the field caught up.
    pub settle: Vec<Keystroke>,
}

impl Plan {
    fn new(keys: Vec<Keystroke>) -> Self {
        Self {
            keys,
            settle: Vec::new(),
        }
    }

    /// Settle with a block cursor on the character after the caret.
    fn block_after(mut self) -> Self {
        self.settle.push(Keystroke::shift(KeyCode::RIGHT));
        self
    }

    /// Settle with a block cursor on the character before the caret.
    fn block_before(mut self) -> Self {
        self.settle.push(Keystroke::shift(KeyCode::LEFT));
        self
    }
}

/// Text and selection of the focused field, read once per motion.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TextState {
    text: Vec<char>,
    selection: Selection,
}

impl TextState {
    fn read(field: &dyn Introspector) -> Option<Self> {
        let text: Vec<char> = field.focused_text()?.chars().collect();
        let selection = field.focused_selection()?;
        if selection.end() > text.len() {
            debug!(?selection, len = text.len(), "selection outside of text");
            return None;
        }
        Some(Self { text, selection })
    }
}

const LEFT: Keystroke = Keystroke::plain(KeyCode::LEFT);
const RIGHT: Keystroke = Keystroke::plain(KeyCode::RIGHT);
const BACKSPACE: Keystroke = Keystroke::plain(KeyCode::BACKSPACE);
const LINE_START: Keystroke = Keystroke::command(KeyCode::LEFT);
const SELECT_TO_LINE_END: Keystroke =
    Keystroke::new(KeyCode::RIGHT, Modifiers::COMMAND.union(Modifiers::SHIFT));
const COPY: Keystroke = Keystroke::command(KeyCode::C);
const PASTE: Keystroke = Keystroke::command(KeyCode::V);

fn repeat(strokes: &[Keystroke], count: usize) -> Vec<Keystroke> {
    strokes
        .iter()
        .copied()
        .cycle()
        .take(strokes.len() * count)
        .collect()
}

/// Translate `parsed` into keystrokes.
///
/// Mode entries translate to nothing; the handlers express those as mode
/// switches.
pub fn plan(parsed: &ParsedCommand, field: &dyn Introspector) -> Plan {
    let count = parsed.count;
    match parsed.command {
        VimCommand::Motion(motion) if motion.is_word_motion() => {
            word_motion(motion, count, field)
        }
        VimCommand::Motion(motion) => line_motion(motion, count),
        VimCommand::Edit(edit) => edit_plan(edit, count),
        VimCommand::ModeSwitch(_) => Plan::default(),
    }
}

fn line_motion(motion: Motion, count: usize) -> Plan {
    let mut keys = vec![LEFT];
    match motion {
        Motion::Left => keys.extend(repeat(&[LEFT], count)),
        Motion::Right => keys.extend(repeat(&[RIGHT], count)),
        Motion::Up => keys.extend(repeat(&[Keystroke::plain(KeyCode::UP)], count)),
        Motion::Down => keys.extend(repeat(&[Keystroke::plain(KeyCode::DOWN)], count)),
        Motion::FirstLine => keys.push(Keystroke::command(KeyCode::UP)),
        Motion::LastLine => keys.push(Keystroke::command(KeyCode::DOWN)),
        Motion::WordForward | Motion::WordEnd | Motion::WordBackward => {}
    }
    Plan::new(keys).block_after()
}

fn word_motion(motion: Motion, count: usize, field: &dyn Introspector) -> Plan {
    let Some(state) = TextState::read(field) else {
        debug!(?motion, "no text introspection, using native word combos");
        return native_word_motion(motion, count);
    };

    let step: fn(usize, &[char]) -> Option<usize> = match motion {
        Motion::WordForward => word::next_word_start,
        Motion::WordEnd => word::current_or_next_word_end,
        _ => word::previous_word_start,
    };
    let cursor = state.selection.offset;
    let target = word::repeat_motion(cursor, &state.text, count, step);
    debug!(?motion, count, cursor, target, "word motion");

    let mut keys = Vec::new();
    if !state.selection.is_empty() {
        keys.push(LEFT);
    }
    let (steps, direction) = word::arrow_steps(cursor, target);
    let arrow = match direction {
        Direction::Left => LEFT,
        Direction::Right => RIGHT,
    };
    keys.extend(repeat(&[arrow], steps));
    Plan::new(keys).block_after()
}

fn native_word_motion(motion: Motion, count: usize) -> Plan {
    let combo: &[Keystroke] = match motion {
        Motion::WordForward => &[Keystroke::option(KeyCode::RIGHT)],
        Motion::WordEnd => &[Keystroke::option(KeyCode::RIGHT), LEFT],
        _ => &[Keystroke::option(KeyCode::LEFT)],
    };
    let mut keys = vec![LEFT];
    keys.extend(repeat(combo, count));
    Plan::new(keys).block_after()
}

fn edit_plan(edit: Edit, count: usize) -> Plan {
    match edit {
        Edit::DeleteChar => Plan::new(repeat(
            &[Keystroke::new(KeyCode::FORWARD_DELETE, Modifiers::CONTROL)],
            count,
        ))
        .block_after(),
        Edit::DeleteLine => Plan::new(repeat(
            &[
                LINE_START,
                SELECT_TO_LINE_END,
                Keystroke::shift(KeyCode::RIGHT),
                BACKSPACE,
            ],
            count,
        ))
        .block_after(),
        Edit::DeleteToLineEnd => Plan::new(vec![SELECT_TO_LINE_END, BACKSPACE]).block_after(),
        Edit::ChangeChar => Plan::new(repeat(
            &[Keystroke::plain(KeyCode::FORWARD_DELETE)],
            count,
        )),
        Edit::ChangeLine => Plan::new(repeat(
            &[LINE_START, SELECT_TO_LINE_END, BACKSPACE],
            count,
        )),
        Edit::ChangeToLineEnd => Plan::new(vec![SELECT_TO_LINE_END, BACKSPACE]),
        Edit::Yank => Plan::new(vec![COPY]),
        Edit::YankLine => {
            let mut keys = vec![LINE_START, SELECT_TO_LINE_END];
            keys.extend(repeat(
                &[Keystroke::shift(KeyCode::DOWN), SELECT_TO_LINE_END],
                count.saturating_sub(1),
            ));
            keys.extend([COPY, LEFT]);
            Plan::new(keys).block_after()
        }
        Edit::PasteAfter => {
            let mut keys = vec![RIGHT];
            keys.extend(repeat(&[PASTE], count));
            Plan::new(keys).block_before()
        }
        Edit::PasteBefore => {
            let mut keys = vec![LEFT];
            keys.extend(repeat(&[PASTE], count));
            Plan::new(keys).block_before()
        }
        Edit::Undo => Plan::new(repeat(&[Keystroke::command(KeyCode::Z)], count)),
        Edit::Redo => Plan::new(repeat(
            &[Keystroke::new(
                KeyCode::Z,
                Modifiers::COMMAND.union(Modifiers::SHIFT),
            )],
            count,
        )),
    }
}
