//! Runs an [`Engine`] on a single tokio task.
//!
//! Capture callbacks arrive on arbitrary threads and must answer "intercept
//! or not" quickly. [`EngineHandle::on_physical_key`] forwards each key to
//! the engine task and waits for its decision for at most the configured
//! reply timeout; a late answer counts as "pass through". The task also
//! sleeps until the engine's next deadline so chord timeouts and deferred
//! keystrokes fire without any key arriving.

use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::engine::Engine;
use crate::keys::{is_ignored, KeyCode, KeyEvent};
use crate::vim::Mode;

enum Request {
    Key {
        event: KeyEvent,
        reply: oneshot::Sender<bool>,
    },
    Terminate {
        done: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a running engine task.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    requests: mpsc::UnboundedSender<Request>,
    mode: watch::Receiver<Mode>,
    reply_timeout: Duration,
    runtime: Handle,
}

impl EngineHandle {
    /// Move `engine` onto a new task of `runtime`.
    ///
    /// The join handle yields the engine back once the task stops.
    pub fn spawn<B>(
        runtime: &Handle,
        engine: Engine<B>,
        reply_timeout: Duration,
    ) -> (Self, JoinHandle<Engine<B>>)
    where
        B: Backend + Send + 'static,
    {
        let (requests, rx) = mpsc::unbounded_channel();
        let (mode_tx, mode) = watch::channel(engine.mode());
        let task = runtime.spawn(run(engine, rx, mode_tx));
        let handle = Self {
            requests,
            mode,
            reply_timeout,
            runtime: runtime.clone(),
        };
        (handle, task)
    }

    /// Deliver a key from a capture thread and wait for the decision.
    ///
    /// Returns true if the key must be swallowed. Modifier and function keys
    /// always pass. Must not be called from inside the runtime's own worker
    /// threads.
    pub fn on_physical_key(&self, key: &str, code: KeyCode) -> bool {
        if is_ignored(code) {
            return false;
        }
        self.runtime.block_on(self.deliver(KeyEvent::new(key, code)))
    }

    /// Deliver a key and wait for the decision, bounded by the reply
    /// timeout.
    pub async fn deliver(&self, event: KeyEvent) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.requests.send(Request::Key { event, reply }).is_err() {
            debug!("engine stopped, passing key through");
            return false;
        }
        match tokio::time::timeout(self.reply_timeout, rx).await {
            Ok(Ok(intercepted)) => intercepted,
            Ok(Err(_)) => false,
            Err(_) => {
                warn!(timeout = ?self.reply_timeout, "engine reply timed out, passing key through");
                false
            }
        }
    }

    /// The active mode, as last published by the engine task.
    pub fn mode(&self) -> Mode {
        *self.mode.borrow()
    }

    /// Receiver notified on every mode change.
    pub fn subscribe(&self) -> watch::Receiver<Mode> {
        self.mode.clone()
    }

    /// Flush held keys and stop the engine task.
    pub async fn terminate(&self) {
        let (done, rx) = oneshot::channel();
        if self.requests.send(Request::Terminate { done }).is_ok() {
            let _ = rx.await;
        }
    }

    /// Blocking [`terminate`](Self::terminate) for non-async callers.
    pub fn terminate_blocking(&self) {
        self.runtime.block_on(self.terminate());
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await
        }
        None => std::future::pending().await,
    }
}

async fn run<B: Backend>(
    mut engine: Engine<B>,
    mut requests: mpsc::UnboundedReceiver<Request>,
    mode: watch::Sender<Mode>,
) -> Engine<B> {
    info!(mode = engine.mode().label(), "engine started");
    loop {
        let deadline = engine.next_deadline();
        tokio::select! {
            request = requests.recv() => match request {
                Some(Request::Key { event, reply }) => {
                    if reply.is_closed() {
                        // The caller already let this key through.
                        debug!(key = %event.key, "reply abandoned, skipping key");
                    } else {
                        let intercepted = engine.on_physical_key(event);
                        let _ = reply.send(intercepted);
                    }
                }
                Some(Request::Terminate { done }) => {
                    engine.shutdown();
                    let _ = done.send(());
                    break;
                }
                None => {
                    engine.shutdown();
                    break;
                }
            },
            _ = sleep_until(deadline) => engine.tick(Instant::now()),
        }
        let current = engine.mode();
        mode.send_if_modified(|published| {
            let changed = *published != current;
            *published = current;
            changed
        });
    }
    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Injector, Introspector, Recorder, Selection};
    use crate::config::Config;
    use crate::keys::{Keystroke, Modifiers};
    use std::sync::{mpsc as std_mpsc, Arc, Mutex};

    type Shared = Arc<Mutex<Recorder>>;

    fn spawn(start_mode: Mode) -> (EngineHandle, JoinHandle<Engine<Shared>>, Shared) {
        let recorder = Shared::default();
        let config = Config {
            start_mode,
            ..Config::default()
        };
        let engine = Engine::new(&config, Arc::clone(&recorder));
        let (handle, task) = EngineHandle::spawn(
            &Handle::current(),
            engine,
            config.timing.reply_timeout(),
        );
        (handle, task, recorder)
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::from_char(c).unwrap()
    }

    fn injected(recorder: &Shared) -> Vec<Keystroke> {
        recorder.lock().unwrap().injected.clone()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_chord_timeout_fires_without_input() {
        let (handle, _task, recorder) = spawn(Mode::Insert);

        assert!(handle.deliver(key('j')).await);
        assert!(injected(&recorder).is_empty());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(injected(&recorder), vec![Keystroke::for_char('j').unwrap()]);
        assert_eq!(handle.mode(), Mode::Insert);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_chord_publishes_mode() {
        let (handle, _task, recorder) = spawn(Mode::Insert);
        let mut modes = handle.subscribe();

        assert!(handle.deliver(key('j')).await);
        assert!(handle.deliver(key('k')).await);
        modes.changed().await.unwrap();
        assert_eq!(*modes.borrow(), Mode::Normal);
        assert_eq!(handle.mode(), Mode::Normal);

        // Block cursor once the settle delay passed.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(injected(&recorder), vec![Keystroke::shift(KeyCode::RIGHT)]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blocking_delivery_from_capture_thread() {
        let (handle, _task, _recorder) = spawn(Mode::Insert);
        let capture = handle.clone();
        let intercepted = tokio::task::spawn_blocking(move || {
            capture.on_physical_key("a", KeyCode::A)
        })
        .await
        .unwrap();
        assert!(!intercepted);
    }

    /// Blocks every injection until the gate's sender is dropped.
    struct Gated {
        gate: std_mpsc::Receiver<()>,
        recorder: Shared,
    }

    impl Injector for Gated {
        fn inject(&mut self, stroke: Keystroke) {
            let _ = self.gate.recv_timeout(Duration::from_secs(5));
            self.recorder.lock().unwrap().inject(stroke);
        }
    }

    impl Introspector for Gated {
        fn focused_text(&self) -> Option<String> {
            None
        }

        fn focused_selection(&self) -> Option<Selection> {
            None
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timed_out_key_is_not_replayed() {
        let (open, gate) = std_mpsc::channel::<()>();
        let recorder = Shared::default();
        let backend = Gated {
            gate,
            recorder: Arc::clone(&recorder),
        };
        let config = Config {
            start_mode: Mode::Normal,
            ..Config::default()
        };
        let engine = Engine::new(&config, backend);
        let (handle, _task) =
            EngineHandle::spawn(&Handle::current(), engine, Duration::from_millis(20));

        // `x` stalls the engine inside its injection, so both replies time out.
        assert!(!handle.deliver(key('x')).await);
        assert!(!handle.deliver(key('i')).await);
        drop(open);

        let mut patient = handle.clone();
        patient.reply_timeout = Duration::from_secs(5);
        assert!(patient.deliver(KeyEvent::escape()).await);

        // `i` was typed by the caller; the engine must not also act on it.
        assert_eq!(handle.mode(), Mode::Normal);
        assert_eq!(
            injected(&recorder),
            vec![
                Keystroke::new(KeyCode::FORWARD_DELETE, Modifiers::CONTROL),
                Keystroke::shift(KeyCode::RIGHT),
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_abandoned_request_is_skipped() {
        let (handle, _task, recorder) = spawn(Mode::Normal);

        let (reply, rx) = oneshot::channel();
        drop(rx);
        let queued = handle.requests.send(Request::Key {
            event: key('i'),
            reply,
        });
        assert!(queued.is_ok());
        assert!(handle.deliver(KeyEvent::escape()).await);

        assert_eq!(handle.mode(), Mode::Normal);
        assert!(injected(&recorder).is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_modifier_keys_bypass_engine() {
        let (handle, _task, recorder) = spawn(Mode::Normal);
        let capture = handle.clone();
        let intercepted = tokio::task::spawn_blocking(move || {
            // Left Command, then F5.
            capture.on_physical_key("Command", KeyCode(0x37))
                || capture.on_physical_key("F5", KeyCode(0x60))
        })
        .await
        .unwrap();
        assert!(!intercepted);
        assert_eq!(handle.mode(), Mode::Normal);
        assert!(injected(&recorder).is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_terminate_flushes_and_stops() {
        let (handle, task, recorder) = spawn(Mode::Insert);

        assert!(handle.deliver(key('j')).await);
        handle.terminate().await;
        assert_eq!(injected(&recorder), vec![Keystroke::for_char('j').unwrap()]);

        let engine = task.await.unwrap();
        assert_eq!(engine.next_deadline(), None);
        assert!(!handle.deliver(key('x')).await);
        handle.terminate().await;
    }
}
