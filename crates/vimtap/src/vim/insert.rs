//! Insert mode: keys reach the target field, except configured chords.

use std::time::{Duration, Instant};

use crate::keys::{KeyCode, KeyEvent, Keystroke};

use super::action::VimAction;
use super::handler::ModeHandler;
use super::mode::Mode;
use super::sequence::{SequenceConfig, SequenceDetector, SequenceResult};

/// Default chord timeout.
pub const DEFAULT_CHORD_TIMEOUT: Duration = Duration::from_millis(140);

/// Insert mode handler.
#[derive(Debug)]
pub struct InsertHandler {
    detector: SequenceDetector<VimAction>,
}

impl Default for InsertHandler {
    /// `jk` returns to Normal mode.
    fn default() -> Self {
        Self::new(vec![SequenceConfig::new(
            "jk",
            VimAction::SwitchMode(Mode::Normal),
            DEFAULT_CHORD_TIMEOUT,
        )])
    }
}

impl InsertHandler {
    pub fn new(chords: Vec<SequenceConfig<VimAction>>) -> Self {
        Self {
            detector: SequenceDetector::new(chords),
        }
    }

    fn release(key: KeyEvent) -> VimAction {
        tracing::debug!(key = %key.key, "releasing held key");
        VimAction::InjectKey(key.replay())
    }
}

impl ModeHandler for InsertHandler {
    fn handle_key(&mut self, key: &KeyEvent, now: Instant) -> Option<VimAction> {
        if key.is_escape() && !key.synthetic {
            let mut actions = self.flush();
            actions.push(VimAction::SwitchMode(Mode::Normal));
            return Some(VimAction::Compound(actions));
        }

        match self.detector.on_key(key, now) {
            SequenceResult::Waiting(_) => Some(VimAction::Consume),
            SequenceResult::Matched(action) => {
                tracing::debug!(key = %key.key, ?action, "chord matched");
                Some(action)
            }
            SequenceResult::Released(held) => Some(VimAction::Compound(vec![
                Self::release(held),
                VimAction::PassThrough,
            ])),
            SequenceResult::Mismatched | SequenceResult::Echo => None,
        }
    }

    fn on_enter(&mut self, from: Mode) -> Vec<VimAction> {
        match from {
            // Collapse the block cursor onto its left edge.
            Mode::Normal => vec![VimAction::InjectKey(Keystroke::plain(KeyCode::LEFT))],
            _ => Vec::new(),
        }
    }

    fn on_exit(&mut self) -> Vec<VimAction> {
        self.flush()
    }

    fn on_tick(&mut self, now: Instant) -> Vec<VimAction> {
        self.detector.on_tick(now).map(Self::release).into_iter().collect()
    }

    fn flush(&mut self) -> Vec<VimAction> {
        self.detector.cancel().map(Self::release).into_iter().collect()
    }

    fn deadline(&self) -> Option<Instant> {
        self.detector.deadline()
    }

    fn pending_keys(&self) -> String {
        self.detector.pending_key().unwrap_or_default().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> KeyEvent {
        KeyEvent::from_char(c).unwrap()
    }

    fn inject(c: char) -> VimAction {
        VimAction::InjectKey(Keystroke::for_char(c).unwrap())
    }

    #[test]
    fn test_plain_keys_pass_through() {
        let mut handler = InsertHandler::default();
        assert_eq!(handler.handle_key(&key('a'), Instant::now()), None);
        assert_eq!(handler.handle_key(&key('K'), Instant::now()), None);
    }

    #[test]
    fn test_jk_switches_to_normal() {
        let mut handler = InsertHandler::default();
        let start = Instant::now();
        assert_eq!(handler.handle_key(&key('j'), start), Some(VimAction::Consume));
        assert_eq!(handler.pending_keys(), "j");
        assert_eq!(
            handler.handle_key(&key('k'), start + Duration::from_millis(30)),
            Some(VimAction::SwitchMode(Mode::Normal))
        );
        assert!(handler.on_exit().is_empty());
    }

    #[test]
    fn test_j_then_other_key_releases_j() {
        let mut handler = InsertHandler::default();
        let start = Instant::now();
        handler.handle_key(&key('j'), start);
        assert_eq!(
            handler.handle_key(&key('u'), start + Duration::from_millis(30)),
            Some(VimAction::Compound(vec![inject('j'), VimAction::PassThrough]))
        );
        assert_eq!(handler.deadline(), None);
    }

    #[test]
    fn test_timeout_releases_j_once() {
        let mut handler = InsertHandler::default();
        let start = Instant::now();
        handler.handle_key(&key('j'), start);
        assert_eq!(handler.deadline(), Some(start + DEFAULT_CHORD_TIMEOUT));
        assert!(handler.on_tick(start).is_empty());
        assert_eq!(handler.on_tick(start + DEFAULT_CHORD_TIMEOUT), vec![inject('j')]);
        assert!(handler.on_tick(start + DEFAULT_CHORD_TIMEOUT * 2).is_empty());
        assert!(handler.flush().is_empty());
    }

    #[test]
    fn test_escape_flushes_held_key() {
        let mut handler = InsertHandler::default();
        let start = Instant::now();
        handler.handle_key(&key('j'), start);
        assert_eq!(
            handler.handle_key(&KeyEvent::escape(), start),
            Some(VimAction::Compound(vec![
                inject('j'),
                VimAction::SwitchMode(Mode::Normal)
            ]))
        );
        assert!(handler.on_exit().is_empty());
    }

    #[test]
    fn test_enter_from_normal_collapses_block() {
        let mut handler = InsertHandler::default();
        assert_eq!(
            handler.on_enter(Mode::Normal),
            vec![VimAction::InjectKey(Keystroke::plain(KeyCode::LEFT))]
        );
        assert!(handler.on_enter(Mode::Visual).is_empty());
    }

    #[test]
    fn test_synthetic_echo_is_not_held() {
        let mut handler = InsertHandler::default();
        let echo = key('j').into_synthetic();
        assert_eq!(handler.handle_key(&echo, Instant::now()), None);
        assert_eq!(handler.deadline(), None);
    }
}
