//! Mode handlers.
//!
//! Every mode has one handler. The engine routes each key to the handler of
//! the active mode and executes the [`VimAction`] it returns. Handlers own
//! their own buffers and timers; they never touch the backend directly.

use std::fmt;
use std::time::Instant;

use crate::keys::{KeyCode, KeyEvent, Keystroke};

use super::action::VimAction;
use super::command::{ModeSwitch, ParsedCommand, VimCommand};
use super::mode::Mode;
use super::parser::{CommandParser, Parse};

/// Behavior of one mode.
pub trait ModeHandler: Send {
    /// Handle a key. `None` lets the key through untouched.
    fn handle_key(&mut self, key: &KeyEvent, now: Instant) -> Option<VimAction>;

    /// Called after the engine switched into this mode from `from`.
    fn on_enter(&mut self, from: Mode) -> Vec<VimAction>;

    /// Called before the engine switches away from this mode.
    fn on_exit(&mut self) -> Vec<VimAction>;

    /// Resolve timers that are due at `now`.
    fn on_tick(&mut self, _now: Instant) -> Vec<VimAction> {
        Vec::new()
    }

    /// Release held input before shutdown.
    fn flush(&mut self) -> Vec<VimAction> {
        Vec::new()
    }

    /// The next instant [`on_tick`](Self::on_tick) has work to do.
    fn deadline(&self) -> Option<Instant> {
        None
    }

    /// Keys typed so far that are not yet resolved, for display.
    fn pending_keys(&self) -> String {
        String::new()
    }
}

/// Keys accumulated in Normal or Visual mode since the last clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBuffer {
    keys: Vec<String>,
}

impl CommandBuffer {
    pub fn push(&mut self, key: impl Into<String>) {
        self.keys.push(key.into());
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl fmt::Display for CommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.keys {
            f.write_str(key)?;
        }
        Ok(())
    }
}

/// The action a complete Normal-mode command produces.
pub fn command_action(parsed: ParsedCommand) -> VimAction {
    match parsed.command {
        VimCommand::ModeSwitch(switch) => mode_switch_action(switch),
        VimCommand::Edit(edit) if edit.enters_insert_mode() => VimAction::Compound(vec![
            VimAction::SwitchMode(Mode::Insert),
            VimAction::RunCommand(parsed),
        ]),
        VimCommand::Motion(_) | VimCommand::Edit(_) => VimAction::RunCommand(parsed),
    }
}

/// Mode entries switch first so the insert caret is in place before the
/// positioning keys run.
fn mode_switch_action(switch: ModeSwitch) -> VimAction {
    let positioning: &[Keystroke] = match switch {
        ModeSwitch::Insert | ModeSwitch::Visual | ModeSwitch::VisualLine => &[],
        ModeSwitch::InsertAfter => &[Keystroke::plain(KeyCode::RIGHT)],
        ModeSwitch::InsertLineStart => &[Keystroke::command(KeyCode::LEFT)],
        ModeSwitch::InsertLineEnd => &[Keystroke::command(KeyCode::RIGHT)],
        ModeSwitch::OpenLineBelow => &[
            Keystroke::command(KeyCode::RIGHT),
            Keystroke::plain(KeyCode::RETURN),
        ],
        ModeSwitch::OpenLineAbove => &[
            Keystroke::command(KeyCode::LEFT),
            Keystroke::plain(KeyCode::RETURN),
            Keystroke::plain(KeyCode::UP),
        ],
    };
    let switch_mode = VimAction::SwitchMode(switch.target());
    if positioning.is_empty() {
        return switch_mode;
    }
    let mut actions = vec![switch_mode];
    actions.extend(positioning.iter().copied().map(VimAction::InjectKey));
    VimAction::Compound(actions)
}

/// The deferred keystroke that turns a caret into a one-character block.
pub(crate) fn block_cursor() -> VimAction {
    VimAction::defer(VimAction::InjectKey(Keystroke::shift(KeyCode::RIGHT)))
}

/// Normal mode: every key is a command keystroke.
#[derive(Debug, Default)]
pub struct NormalHandler {
    buffer: CommandBuffer,
    parser: CommandParser,
}

impl NormalHandler {
    pub fn new(parser: CommandParser) -> Self {
        Self {
            buffer: CommandBuffer::default(),
            parser,
        }
    }

    pub fn buffer(&self) -> &CommandBuffer {
        &self.buffer
    }
}

impl ModeHandler for NormalHandler {
    fn handle_key(&mut self, key: &KeyEvent, _now: Instant) -> Option<VimAction> {
        if key.is_escape() {
            self.buffer.clear();
            return Some(VimAction::Consume);
        }

        self.buffer.push(key.key.as_str());
        match self.parser.parse(self.buffer.keys()) {
            Parse::Complete(parsed) => {
                tracing::debug!(buffer = %self.buffer, ?parsed, "normal command");
                self.buffer.clear();
                Some(command_action(parsed))
            }
            Parse::Pending => Some(VimAction::Consume),
            Parse::Invalid => {
                tracing::debug!(buffer = %self.buffer, "discarding invalid command");
                self.buffer.clear();
                Some(VimAction::Consume)
            }
        }
    }

    fn on_enter(&mut self, from: Mode) -> Vec<VimAction> {
        self.buffer.clear();
        match from {
            Mode::Insert | Mode::Visual | Mode::VisualLine => vec![block_cursor()],
            Mode::Normal => Vec::new(),
        }
    }

    fn on_exit(&mut self) -> Vec<VimAction> {
        self.buffer.clear();
        Vec::new()
    }

    fn pending_keys(&self) -> String {
        self.buffer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vim::command::{Edit, Motion};

    fn press(handler: &mut NormalHandler, keys: &str) -> Vec<Option<VimAction>> {
        let now = Instant::now();
        keys.chars()
            .map(|c| handler.handle_key(&KeyEvent::from_char(c).unwrap(), now))
            .collect()
    }

    fn last(handler: &mut NormalHandler, keys: &str) -> VimAction {
        press(handler, keys).pop().flatten().unwrap()
    }

    #[test]
    fn test_count_is_buffered_then_applied() {
        let mut handler = NormalHandler::default();
        let actions = press(&mut handler, "2w");
        assert_eq!(actions[0], Some(VimAction::Consume));
        assert_eq!(
            actions[1],
            Some(VimAction::RunCommand(ParsedCommand::motion(
                Motion::WordForward,
                2
            )))
        );
        assert!(handler.buffer().is_empty());
    }

    #[test]
    fn test_pending_keeps_buffer() {
        let mut handler = NormalHandler::default();
        press(&mut handler, "3d");
        assert_eq!(handler.pending_keys(), "3d");
        assert_eq!(
            last(&mut handler, "d"),
            VimAction::RunCommand(ParsedCommand::edit(Edit::DeleteLine, 3))
        );
        assert_eq!(handler.pending_keys(), "");
    }

    #[test]
    fn test_invalid_clears_and_intercepts() {
        let mut handler = NormalHandler::default();
        let actions = press(&mut handler, "gx");
        assert_eq!(actions[1], Some(VimAction::Consume));
        assert!(handler.buffer().is_empty());

        assert_eq!(last(&mut handler, "z"), VimAction::Consume);
        assert!(handler.buffer().is_empty());
    }

    #[test]
    fn test_escape_clears_buffer() {
        let mut handler = NormalHandler::default();
        press(&mut handler, "4g");
        let action = handler.handle_key(&KeyEvent::escape(), Instant::now());
        assert_eq!(action, Some(VimAction::Consume));
        assert!(handler.buffer().is_empty());
    }

    #[test]
    fn test_insert_after_switches_first() {
        let mut handler = NormalHandler::default();
        assert_eq!(
            last(&mut handler, "a"),
            VimAction::Compound(vec![
                VimAction::SwitchMode(Mode::Insert),
                VimAction::InjectKey(Keystroke::plain(KeyCode::RIGHT)),
            ])
        );
        assert_eq!(last(&mut handler, "i"), VimAction::SwitchMode(Mode::Insert));
    }

    #[test]
    fn test_open_line_above() {
        let mut handler = NormalHandler::default();
        assert_eq!(
            last(&mut handler, "O"),
            VimAction::Compound(vec![
                VimAction::SwitchMode(Mode::Insert),
                VimAction::InjectKey(Keystroke::command(KeyCode::LEFT)),
                VimAction::InjectKey(Keystroke::plain(KeyCode::RETURN)),
                VimAction::InjectKey(Keystroke::plain(KeyCode::UP)),
            ])
        );
    }

    #[test]
    fn test_change_enters_insert_before_editing() {
        let mut handler = NormalHandler::default();
        assert_eq!(
            last(&mut handler, "cc"),
            VimAction::Compound(vec![
                VimAction::SwitchMode(Mode::Insert),
                VimAction::RunCommand(ParsedCommand::edit(Edit::ChangeLine, 1)),
            ])
        );
    }

    #[test]
    fn test_visual_entries() {
        let mut handler = NormalHandler::default();
        assert_eq!(last(&mut handler, "v"), VimAction::SwitchMode(Mode::Visual));
        assert_eq!(
            last(&mut handler, "V"),
            VimAction::SwitchMode(Mode::VisualLine)
        );
    }

    #[test]
    fn test_on_enter_restores_block_cursor() {
        let mut handler = NormalHandler::default();
        assert_eq!(handler.on_enter(Mode::Insert), vec![block_cursor()]);
        assert_eq!(handler.on_enter(Mode::Visual), vec![block_cursor()]);
        assert!(handler.on_enter(Mode::Normal).is_empty());
    }

    #[test]
    fn test_exit_discards_buffer() {
        let mut handler = NormalHandler::default();
        press(&mut handler, "12");
        assert!(handler.on_exit().is_empty());
        assert!(handler.buffer().is_empty());
    }
}
