//! Collaborators the engine drives: keystroke injection and text
//! introspection of the focused control.

use std::sync::{Arc, Mutex, PoisonError};

use crate::keys::Keystroke;

/// A selection in the focused control, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub offset: usize,
    pub length: usize,
}

impl Selection {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// An empty selection (a caret) at `offset`.
    pub fn caret(offset: usize) -> Self {
        Self::new(offset, 0)
    }

    /// One past the last selected character.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Synthetic input. Fire-and-forget; must not re-enter the capture path as
/// a physical key.
pub trait Injector {
    fn inject(&mut self, stroke: Keystroke);
}

/// Best-effort view of the focused text control.
pub trait Introspector {
    fn focused_text(&self) -> Option<String>;
    fn focused_selection(&self) -> Option<Selection>;
}

/// Everything the engine needs from its environment.
pub trait Backend: Injector + Introspector {}

impl<T: Injector + Introspector> Backend for T {}

impl<T: Injector> Injector for Arc<Mutex<T>> {
    fn inject(&mut self, stroke: Keystroke) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .inject(stroke);
    }
}

impl<T: Introspector> Introspector for Arc<Mutex<T>> {
    fn focused_text(&self) -> Option<String> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .focused_text()
    }

    fn focused_selection(&self) -> Option<Selection> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .focused_selection()
    }
}

/// Records injected keystrokes and answers introspection from fixed values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recorder {
    pub injected: Vec<Keystroke>,
    pub text: Option<String>,
    pub selection: Option<Selection>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose focused control shows `text` with `selection`.
    pub fn with_text(text: impl Into<String>, selection: Selection) -> Self {
        Self {
            injected: Vec::new(),
            text: Some(text.into()),
            selection: Some(selection),
        }
    }
}

impl Injector for Recorder {
    fn inject(&mut self, stroke: Keystroke) {
        self.injected.push(stroke);
    }
}

impl Introspector for Recorder {
    fn focused_text(&self) -> Option<String> {
        self.text.clone()
    }

    fn focused_selection(&self) -> Option<Selection> {
        self.selection
    }
}
