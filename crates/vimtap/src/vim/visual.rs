//! Visual and Visual Line modes.
//!
//! The target field's own selection is the visual selection. Motions extend
//! it with shifted navigation keys; operators act on it and leave the mode.

use std::time::Instant;

use crate::keys::{KeyCode, KeyEvent, Keystroke, Modifiers};

use super::action::VimAction;
use super::command::{Edit, ModeSwitch, Motion, ParsedCommand, VimCommand};
use super::handler::{CommandBuffer, ModeHandler};
use super::mode::Mode;
use super::parser::{CommandParser, Parse};

/// Handler for one of the two visual modes.
#[derive(Debug)]
pub struct VisualHandler {
    kind: Mode,
    buffer: CommandBuffer,
    parser: CommandParser,
    /// The selection was deleted, so there is nothing to collapse on exit.
    selection_consumed: bool,
}

impl VisualHandler {
    /// Character-wise visual mode.
    pub fn charwise(parser: CommandParser) -> Self {
        Self::new(Mode::Visual, parser)
    }

    /// Line-wise visual mode.
    pub fn linewise(parser: CommandParser) -> Self {
        Self::new(Mode::VisualLine, parser)
    }

    fn new(kind: Mode, parser: CommandParser) -> Self {
        Self {
            kind,
            buffer: CommandBuffer::default(),
            parser,
            selection_consumed: false,
        }
    }

    /// Operators that act on the selection when typed with an empty buffer.
    fn selection_operator(&mut self, key: &str) -> Option<VimAction> {
        let backspace = VimAction::InjectKey(Keystroke::plain(KeyCode::BACKSPACE));
        let action = match key {
            "y" => VimAction::Compound(vec![
                VimAction::RunCommand(ParsedCommand::edit(Edit::Yank, 1)),
                VimAction::SwitchMode(Mode::Normal),
            ]),
            "d" | "x" => {
                self.selection_consumed = true;
                VimAction::Compound(vec![backspace, VimAction::SwitchMode(Mode::Normal)])
            }
            "c" | "s" => {
                self.selection_consumed = true;
                VimAction::Compound(vec![backspace, VimAction::SwitchMode(Mode::Insert)])
            }
            _ => return None,
        };
        Some(action)
    }

    fn command(&self, parsed: ParsedCommand) -> VimAction {
        match parsed.command {
            VimCommand::Motion(motion) => {
                let stroke = extend_stroke(motion);
                VimAction::inject_all(std::iter::repeat_n(stroke, parsed.count))
            }
            VimCommand::ModeSwitch(ModeSwitch::Visual) => self.toggle(Mode::Visual),
            VimCommand::ModeSwitch(ModeSwitch::VisualLine) => self.toggle(Mode::VisualLine),
            _ => VimAction::SwitchMode(Mode::Normal),
        }
    }

    /// `v`/`V`: leave when it names the current kind, otherwise switch kind.
    fn toggle(&self, kind: Mode) -> VimAction {
        if kind == self.kind {
            VimAction::SwitchMode(Mode::Normal)
        } else {
            VimAction::SwitchMode(kind)
        }
    }
}

/// The shifted keystroke that extends the selection by one `motion`.
fn extend_stroke(motion: Motion) -> Keystroke {
    let shift = Modifiers::SHIFT;
    match motion {
        Motion::Left => Keystroke::new(KeyCode::LEFT, shift),
        Motion::Right => Keystroke::new(KeyCode::RIGHT, shift),
        Motion::Down => Keystroke::new(KeyCode::DOWN, shift),
        Motion::Up => Keystroke::new(KeyCode::UP, shift),
        Motion::FirstLine => Keystroke::new(KeyCode::UP, shift | Modifiers::COMMAND),
        Motion::LastLine => Keystroke::new(KeyCode::DOWN, shift | Modifiers::COMMAND),
        Motion::WordForward | Motion::WordEnd => {
            Keystroke::new(KeyCode::RIGHT, shift | Modifiers::OPTION)
        }
        Motion::WordBackward => Keystroke::new(KeyCode::LEFT, shift | Modifiers::OPTION),
    }
}

impl ModeHandler for VisualHandler {
    fn handle_key(&mut self, key: &KeyEvent, _now: Instant) -> Option<VimAction> {
        if key.is_escape() {
            self.buffer.clear();
            return Some(VimAction::SwitchMode(Mode::Normal));
        }

        if self.buffer.is_empty() {
            if let Some(action) = self.selection_operator(&key.key) {
                tracing::debug!(key = %key.key, mode = ?self.kind, "selection operator");
                return Some(action);
            }
        }

        self.buffer.push(key.key.as_str());
        match self.parser.parse(self.buffer.keys()) {
            Parse::Complete(parsed) => {
                self.buffer.clear();
                Some(self.command(parsed))
            }
            Parse::Pending => Some(VimAction::Consume),
            Parse::Invalid => {
                self.buffer.clear();
                Some(VimAction::Consume)
            }
        }
    }

    fn on_enter(&mut self, from: Mode) -> Vec<VimAction> {
        self.buffer.clear();
        self.selection_consumed = false;
        match (self.kind, from) {
            (Mode::VisualLine, Mode::Normal | Mode::Visual) => vec![
                VimAction::InjectKey(Keystroke::command(KeyCode::LEFT)),
                VimAction::InjectKey(Keystroke::new(
                    KeyCode::RIGHT,
                    Modifiers::COMMAND | Modifiers::SHIFT,
                )),
            ],
            // The line selection was collapsed on exit; restore the block.
            (Mode::Visual, Mode::VisualLine) => {
                vec![VimAction::InjectKey(Keystroke::shift(KeyCode::RIGHT))]
            }
            _ => Vec::new(),
        }
    }

    fn on_exit(&mut self) -> Vec<VimAction> {
        self.buffer.clear();
        if std::mem::take(&mut self.selection_consumed) {
            return Vec::new();
        }
        vec![VimAction::InjectKey(Keystroke::plain(KeyCode::LEFT))]
    }

    fn pending_keys(&self) -> String {
        self.buffer.to_string()
    }
}
