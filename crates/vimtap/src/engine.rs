//! The mode state machine and action executor.
//!
//! An [`Engine`] owns the active mode, one handler per mode, the backend and
//! a queue of deferred actions. It is not thread-safe and not async: a single
//! owner feeds it keys and ticks. [`crate::runtime`] provides that owner.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::backend::Backend;
use crate::config::Config;
use crate::executor;
use crate::keys::KeyEvent;
use crate::vim::{
    CommandParser, InsertHandler, Mode, ModeHandler, NormalHandler, VimAction, VisualHandler,
};

/// An action waiting for its settle delay.
#[derive(Debug)]
struct Deferred {
    due: Instant,
    action: VimAction,
}

/// Modal keystroke engine driving a backend.
pub struct Engine<B> {
    mode: Mode,
    normal: Box<dyn ModeHandler>,
    insert: Box<dyn ModeHandler>,
    visual: Box<dyn ModeHandler>,
    visual_line: Box<dyn ModeHandler>,
    backend: B,
    deferred: VecDeque<Deferred>,
    settle: Duration,
}

impl<B: Backend> Engine<B> {
    pub fn new(config: &Config, backend: B) -> Self {
        let parser = CommandParser::new(config.normal.max_count);
        let chords = config.chords.iter().map(|c| c.to_sequence()).collect();
        Self {
            mode: config.start_mode,
            normal: Box::new(NormalHandler::new(parser)),
            insert: Box::new(InsertHandler::new(chords)),
            visual: Box::new(VisualHandler::charwise(parser)),
            visual_line: Box::new(VisualHandler::linewise(parser)),
            backend,
            deferred: VecDeque::new(),
            settle: config.timing.settle(),
        }
    }

    /// The active mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Keys typed in the active mode that are not yet resolved.
    pub fn pending_keys(&self) -> String {
        self.handler(self.mode).pending_keys()
    }

    fn handler(&self, mode: Mode) -> &dyn ModeHandler {
        match mode {
            Mode::Normal => self.normal.as_ref(),
            Mode::Insert => self.insert.as_ref(),
            Mode::Visual => self.visual.as_ref(),
            Mode::VisualLine => self.visual_line.as_ref(),
        }
    }

    fn handler_mut(&mut self, mode: Mode) -> &mut dyn ModeHandler {
        match mode {
            Mode::Normal => self.normal.as_mut(),
            Mode::Insert => self.insert.as_mut(),
            Mode::Visual => self.visual.as_mut(),
            Mode::VisualLine => self.visual_line.as_mut(),
        }
    }

    /// Handle a physical key press now. Returns true if the key is
    /// intercepted and must not reach the target.
    pub fn on_physical_key(&mut self, event: KeyEvent) -> bool {
        self.on_key_at(event, Instant::now())
    }

    /// Handle a key press that happened at `now`.
    pub fn on_key_at(&mut self, event: KeyEvent, now: Instant) -> bool {
        // Timers due before this key resolve first.
        self.tick(now);

        if event.synthetic && !self.mode.is_insert() {
            trace!(key = %event.key, "synthetic key passes through");
            return false;
        }
        if !event.synthetic {
            // Follow-ups of the previous command land before this key's own.
            self.run_deferred(now);
        }

        let mode = self.mode;
        let Some(action) = self.handler_mut(mode).handle_key(&event, now) else {
            debug!(key = %event.key, ?mode, "pass through");
            return false;
        };
        debug!(key = %event.key, ?mode, ?action, "key handled");
        self.execute(action, now)
    }

    /// Execute one action. Returns true if it intercepts the current key.
    pub fn execute(&mut self, action: VimAction, now: Instant) -> bool {
        match action {
            VimAction::SwitchMode(mode) => {
                self.set_mode(mode, now);
                true
            }
            VimAction::InjectKey(stroke) => {
                trace!(%stroke, "inject");
                self.backend.inject(stroke);
                true
            }
            VimAction::RunCommand(parsed) => {
                let plan = executor::plan(&parsed, &self.backend);
                debug!(?parsed, keys = plan.keys.len(), "run command");
                for stroke in plan.keys {
                    trace!(%stroke, "inject");
                    self.backend.inject(stroke);
                }
                if !plan.settle.is_empty() {
                    self.schedule(VimAction::inject_all(plan.settle), now);
                }
                true
            }
            VimAction::Defer(action) => {
                self.schedule(*action, now);
                true
            }
            VimAction::Compound(actions) => actions
                .into_iter()
                .fold(true, |intercept, action| self.execute(action, now) && intercept),
            VimAction::Consume => true,
            VimAction::PassThrough => false,
        }
    }

    /// Switch to `mode`, running the exit and enter hooks.
    pub fn set_mode(&mut self, mode: Mode, now: Instant) {
        if mode == self.mode {
            return;
        }
        let from = self.mode;
        for action in self.handler_mut(from).on_exit() {
            self.execute(action, now);
        }
        self.mode = mode;
        info!(from = from.label(), to = mode.label(), "mode changed");
        for action in self.handler_mut(mode).on_enter(from) {
            self.execute(action, now);
        }
    }

    fn schedule(&mut self, action: VimAction, now: Instant) {
        self.deferred.push_back(Deferred {
            due: now + self.settle,
            action,
        });
    }

    /// Run every queued deferred action now, due or not.
    fn run_deferred(&mut self, now: Instant) {
        while let Some(deferred) = self.deferred.pop_front() {
            self.execute(deferred.action, now);
        }
    }

    /// Run everything due at `now`: deferred actions in schedule order, then
    /// the active handler's timers.
    pub fn tick(&mut self, now: Instant) {
        while let Some(index) = self.deferred.iter().position(|d| d.due <= now) {
            if let Some(deferred) = self.deferred.remove(index) {
                self.execute(deferred.action, now);
            }
        }
        let mode = self.mode;
        for action in self.handler_mut(mode).on_tick(now) {
            self.execute(action, now);
        }
    }

    /// The next instant [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let deferred = self.deferred.iter().map(|d| d.due).min();
        let handler = self.handler(self.mode).deadline();
        match (deferred, handler) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Release held keys and drop pending follow-ups.
    pub fn shutdown(&mut self) {
        let now = Instant::now();
        let mode = self.mode;
        for action in self.handler_mut(mode).flush() {
            self.execute(action, now);
        }
        let dropped = self.deferred.len();
        self.deferred.clear();
        info!(mode = mode.label(), dropped, "engine shut down");
    }
}
