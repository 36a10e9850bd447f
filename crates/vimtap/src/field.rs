//! An in-memory text control with native (macOS-style) editing shortcuts.
//!
//! The engine only ever speaks to a focused control through keystrokes, so
//! this field is what the terminal driver edits and what the integration
//! tests use to check the visible effect of a command.

use std::collections::VecDeque;

use crate::backend::{Injector, Introspector, Selection};
use crate::keys::{KeyCode, Keystroke, Modifiers};

/// How many injected keystrokes the field remembers for display.
const LOG_CAPACITY: usize = 32;

/// How many edits can be undone.
const UNDO_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    text: Vec<char>,
    anchor: usize,
    head: usize,
}

/// A single text control.
///
/// The selection is `anchor..head` in either direction; it is a caret when
/// both are equal.
#[derive(Debug, Clone)]
pub struct TextField {
    text: Vec<char>,
    anchor: usize,
    head: usize,
    clipboard: String,
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    introspection: bool,
    log: VecDeque<Keystroke>,
}

impl Default for TextField {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextField {
    /// A field holding `text` with the caret at the start.
    pub fn new(text: &str) -> Self {
        Self {
            text: text.chars().collect(),
            anchor: 0,
            head: 0,
            clipboard: String::new(),
            undo: VecDeque::new(),
            redo: Vec::new(),
            introspection: true,
            log: VecDeque::with_capacity(LOG_CAPACITY),
        }
    }

    /// Whether the field answers text and selection queries.
    pub fn with_introspection(mut self, enabled: bool) -> Self {
        self.introspection = enabled;
        self
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn selection(&self) -> Selection {
        let (start, end) = self.range();
        Selection::new(start, end - start)
    }

    /// The end of the selection that moves.
    pub fn head(&self) -> usize {
        self.head
    }

    pub fn select(&mut self, selection: Selection) {
        let len = self.text.len();
        self.anchor = selection.offset.min(len);
        self.head = selection.end().min(len);
    }

    pub fn selected_text(&self) -> String {
        let (start, end) = self.range();
        self.text[start..end].iter().collect()
    }

    pub fn clipboard(&self) -> &str {
        &self.clipboard
    }

    /// Recently injected keystrokes, oldest first.
    pub fn recent_keys(&self) -> impl DoubleEndedIterator<Item = &Keystroke> {
        self.log.iter()
    }

    fn range(&self) -> (usize, usize) {
        (self.anchor.min(self.head), self.anchor.max(self.head))
    }

    fn has_selection(&self) -> bool {
        self.anchor != self.head
    }

    /// Apply one keystroke.
    pub fn press(&mut self, stroke: Keystroke) {
        let modifiers = stroke.modifiers;
        let command = modifiers.contains(Modifiers::COMMAND);
        let shift = modifiers.contains(Modifiers::SHIFT);
        let option = modifiers.contains(Modifiers::OPTION);

        match stroke.code {
            KeyCode::LEFT => {
                let target = if command {
                    self.line_start(self.head)
                } else if option {
                    self.word_left(self.head)
                } else if shift || !self.has_selection() {
                    self.head.saturating_sub(1)
                } else {
                    self.range().0
                };
                self.move_to(target, shift);
            }
            KeyCode::RIGHT => {
                let target = if command {
                    self.line_end(self.head)
                } else if option {
                    self.word_right(self.head)
                } else if shift || !self.has_selection() {
                    (self.head + 1).min(self.text.len())
                } else {
                    self.range().1
                };
                self.move_to(target, shift);
            }
            KeyCode::UP => {
                let target = if command {
                    0
                } else {
                    let from = if shift { self.head } else { self.range().0 };
                    self.line_up(from)
                };
                self.move_to(target, shift);
            }
            KeyCode::DOWN => {
                let target = if command {
                    self.text.len()
                } else {
                    let from = if shift { self.head } else { self.range().1 };
                    self.line_down(from)
                };
                self.move_to(target, shift);
            }
            KeyCode::BACKSPACE => {
                if self.has_selection() {
                    self.delete_selection();
                } else {
                    let start = if command {
                        self.line_start(self.head)
                    } else if option {
                        self.word_left(self.head)
                    } else {
                        self.head.saturating_sub(1)
                    };
                    self.delete_range(start, self.head);
                }
            }
            KeyCode::FORWARD_DELETE => {
                if self.has_selection() {
                    self.delete_selection();
                } else {
                    let end = (self.head + 1).min(self.text.len());
                    self.delete_range(self.head, end);
                }
            }
            KeyCode::A if command => {
                self.anchor = 0;
                self.head = self.text.len();
            }
            KeyCode::C if command => self.copy(),
            KeyCode::X if command => {
                self.copy();
                self.delete_selection();
            }
            KeyCode::V if command => {
                let pasted: Vec<char> = self.clipboard.chars().collect();
                self.replace_selection(&pasted);
            }
            KeyCode::Z if command && shift => self.redo(),
            KeyCode::Z if command => self.undo(),
            _ => {
                if let Some(c) = stroke.typed_char() {
                    self.replace_selection(&[c]);
                }
            }
        }
    }

    fn move_to(&mut self, target: usize, extend: bool) {
        self.head = target.min(self.text.len());
        if !extend {
            self.anchor = self.head;
        }
    }

    fn line_start(&self, pos: usize) -> usize {
        self.text[..pos.min(self.text.len())]
            .iter()
            .rposition(|&c| c == '\n')
            .map_or(0, |i| i + 1)
    }

    fn line_end(&self, pos: usize) -> usize {
        let pos = pos.min(self.text.len());
        self.text[pos..]
            .iter()
            .position(|&c| c == '\n')
            .map_or(self.text.len(), |i| pos + i)
    }

    fn line_up(&self, pos: usize) -> usize {
        let start = self.line_start(pos);
        if start == 0 {
            return 0;
        }
        let column = pos - start;
        let prev_start = self.line_start(start - 1);
        (prev_start + column).min(start - 1)
    }

    fn line_down(&self, pos: usize) -> usize {
        let end = self.line_end(pos);
        if end == self.text.len() {
            return end;
        }
        let column = pos - self.line_start(pos);
        let next_start = end + 1;
        (next_start + column).min(self.line_end(next_start))
    }

    fn is_word(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    /// Option+Left: start of the word before `pos`.
    fn word_left(&self, pos: usize) -> usize {
        let mut i = pos.min(self.text.len());
        while i > 0 && !Self::is_word(self.text[i - 1]) {
            i -= 1;
        }
        while i > 0 && Self::is_word(self.text[i - 1]) {
            i -= 1;
        }
        i
    }

    /// Option+Right: end of the word after `pos`.
    fn word_right(&self, pos: usize) -> usize {
        let len = self.text.len();
        let mut i = pos.min(len);
        while i < len && !Self::is_word(self.text[i]) {
            i += 1;
        }
        while i < len && Self::is_word(self.text[i]) {
            i += 1;
        }
        i
    }

    fn copy(&mut self) {
        if self.has_selection() {
            self.clipboard = self.selected_text();
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.text.clone(),
            anchor: self.anchor,
            head: self.head,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.text = snapshot.text;
        self.anchor = snapshot.anchor;
        self.head = snapshot.head;
    }

    fn record_edit(&mut self) {
        self.push_undo();
        self.redo.clear();
    }

    fn push_undo(&mut self) {
        if self.undo.len() == UNDO_CAPACITY {
            self.undo.pop_front();
        }
        self.undo.push_back(self.snapshot());
    }

    fn undo(&mut self) {
        if let Some(previous) = self.undo.pop_back() {
            self.redo.push(self.snapshot());
            self.restore(previous);
        }
    }

    fn redo(&mut self) {
        if let Some(next) = self.redo.pop() {
            self.push_undo();
            self.restore(next);
        }
    }

    fn delete_selection(&mut self) {
        let (start, end) = self.range();
        self.delete_range(start, end);
    }

    fn delete_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        self.record_edit();
        self.text.drain(start..end);
        self.anchor = start;
        self.head = start;
    }

    fn replace_selection(&mut self, chars: &[char]) {
        let (start, end) = self.range();
        if chars.is_empty() && start == end {
            return;
        }
        self.record_edit();
        self.text.splice(start..end, chars.iter().copied());
        self.anchor = start + chars.len();
        self.head = self.anchor;
    }
}

impl Injector for TextField {
    fn inject(&mut self, stroke: Keystroke) {
        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(stroke);
        self.press(stroke);
    }
}

impl Introspector for TextField {
    fn focused_text(&self) -> Option<String> {
        self.introspection.then(|| self.text())
    }

    fn focused_selection(&self) -> Option<Selection> {
        self.introspection.then(|| self.selection())
    }
}
