//! Timed multi-key sequence detection.
//!
//! A key that starts a configured sequence (the `j` of `jk`) is held back
//! until either the rest of the sequence arrives within its timeout, a
//! different key arrives, or the timeout expires. Held keys that do not
//! complete a sequence are handed back to the caller for injection, so no
//! typed character is ever lost.
//!
//! The detector never blocks and owns no timer thread: the pending key
//! records when it was pressed, and the owner polls [`SequenceDetector::on_tick`]
//! at [`SequenceDetector::deadline`]. Every resolution path takes the pending
//! key out of the detector, so a held key is resolved exactly once.

use std::time::{Duration, Instant};

use crate::keys::{KeyCode, KeyEvent};

/// A sequence to detect and the action it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceConfig<A> {
    /// The keys of the sequence, concatenated (`"jk"`).
    pub sequence: String,
    /// Returned when the sequence matches.
    pub action: A,
    /// How long the first key is held waiting for the rest.
    pub timeout: Duration,
}

impl<A> SequenceConfig<A> {
    pub fn new(sequence: impl Into<String>, action: A, timeout: Duration) -> Self {
        Self {
            sequence: sequence.into(),
            action,
            timeout,
        }
    }
}

/// A held first key.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingSequence {
    event: KeyEvent,
    since: Instant,
    timeout: Duration,
}

impl PendingSequence {
    fn deadline(&self) -> Instant {
        self.since + self.timeout
    }
}

/// Result of feeding one key to the detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceResult<A> {
    /// The key was held; nothing should happen until the deadline.
    Waiting(Instant),
    /// The key completed a sequence.
    Matched(A),
    /// The key did not complete the held sequence. The held key must be
    /// injected verbatim and the current key is not handled here.
    Released(KeyEvent),
    /// The key does not start any sequence and nothing was held.
    Mismatched,
    /// The key is the echo of an injected keystroke.
    Echo,
}

/// Detects configured key sequences under a per-sequence timeout.
#[derive(Debug)]
pub struct SequenceDetector<A> {
    configs: Vec<SequenceConfig<A>>,
    pending: Option<PendingSequence>,
    /// Code of the last released key, expected back as a synthetic echo.
    expect_echo: Option<KeyCode>,
}

impl<A: Clone> SequenceDetector<A> {
    pub fn new(configs: Vec<SequenceConfig<A>>) -> Self {
        Self {
            configs,
            pending: None,
            expect_echo: None,
        }
    }

    /// Feed one key pressed at `now`.
    ///
    /// Callers resolve due timeouts with [`on_tick`](Self::on_tick) before
    /// delivering the next key, so a late second key never completes a
    /// sequence.
    pub fn on_key(&mut self, event: &KeyEvent, now: Instant) -> SequenceResult<A> {
        if event.synthetic {
            if self.expect_echo == Some(event.code) {
                self.expect_echo = None;
            }
            return SequenceResult::Echo;
        }
        self.expect_echo = None;

        if let Some(pending) = self.pending.take() {
            let candidate = format!("{}{}", pending.event.key, event.key);
            if let Some(config) = self.configs.iter().find(|c| c.sequence == candidate) {
                return SequenceResult::Matched(config.action.clone());
            }
            return SequenceResult::Released(self.release(pending));
        }

        let starts = self.configs.iter().find(|c| {
            !event.key.is_empty()
                && c.sequence.len() > event.key.len()
                && c.sequence.starts_with(event.key.as_str())
        });
        match starts {
            Some(config) => {
                let pending = PendingSequence {
                    event: event.clone(),
                    since: now,
                    timeout: config.timeout,
                };
                let deadline = pending.deadline();
                self.pending = Some(pending);
                SequenceResult::Waiting(deadline)
            }
            None => SequenceResult::Mismatched,
        }
    }

    /// Resolve the held key if its timeout has expired by `now`.
    ///
    /// Returns the key to inject.
    pub fn on_tick(&mut self, now: Instant) -> Option<KeyEvent> {
        let expired = self.pending.as_ref().is_some_and(|p| now >= p.deadline());
        if !expired {
            return None;
        }
        self.pending.take().map(|pending| self.release(pending))
    }

    /// Flush the held key, if any, and clear all pending state.
    ///
    /// Returns the key to inject. A no-op when nothing is held.
    pub fn cancel(&mut self) -> Option<KeyEvent> {
        self.pending.take().map(|pending| self.release(pending))
    }

    /// When the held key times out.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(PendingSequence::deadline)
    }

    /// Returns true if a key is held.
    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// The held key, for display.
    pub fn pending_key(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.event.key.as_str())
    }

    fn release(&mut self, pending: PendingSequence) -> KeyEvent {
        self.expect_echo = Some(pending.event.code);
        pending.event
    }
}
