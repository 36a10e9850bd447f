//! Actions produced by mode handlers.

use crate::keys::Keystroke;

use super::command::ParsedCommand;
use super::Mode;

/// What the engine should do in response to a key.
///
/// Handlers return these; the engine executes each one once and drops it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VimAction {
    /// Transition the mode state machine.
    SwitchMode(Mode),
    /// Inject one keystroke verbatim.
    InjectKey(Keystroke),
    /// Translate and run a parsed command.
    RunCommand(ParsedCommand),
    /// Run the inner action after the settle delay.
    Defer(Box<VimAction>),
    /// Run each action in order.
    Compound(Vec<VimAction>),
    /// Intercept the key without any effect.
    Consume,
    /// Let the current key reach the target application.
    PassThrough,
}

impl VimAction {
    /// A compound that injects `strokes` in order.
    pub fn inject_all(strokes: impl IntoIterator<Item = Keystroke>) -> Self {
        VimAction::Compound(strokes.into_iter().map(VimAction::InjectKey).collect())
    }

    pub fn defer(action: VimAction) -> Self {
        VimAction::Defer(Box::new(action))
    }

    /// Returns false if executing this action lets the current key through.
    pub fn intercepts(&self) -> bool {
        match self {
            VimAction::PassThrough => false,
            VimAction::Compound(actions) => actions.iter().all(VimAction::intercepts),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyCode;

    #[test]
    fn test_intercepts() {
        assert!(VimAction::Consume.intercepts());
        assert!(VimAction::SwitchMode(Mode::Normal).intercepts());
        assert!(!VimAction::PassThrough.intercepts());
    }

    #[test]
    fn test_compound_with_pass_through() {
        let action = VimAction::Compound(vec![
            VimAction::InjectKey(Keystroke::plain(KeyCode(0x26))),
            VimAction::PassThrough,
        ]);
        assert!(!action.intercepts());
        assert!(VimAction::inject_all([Keystroke::plain(KeyCode::LEFT)]).intercepts());
    }
}
