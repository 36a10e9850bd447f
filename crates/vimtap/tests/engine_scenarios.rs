//! End-to-end scenarios: physical keys go through the engine, pass-through
//! keys are typed into the field, and the field's text and selection are
//! checked after the settle delay.

use std::time::{Duration, Instant};

use vimtap::config::Config;
use vimtap::vim::Mode;
use vimtap::{Engine, KeyCode, KeyEvent, Keystroke, Selection, TextField};

const SETTLE: Duration = Duration::from_millis(5);

struct Session {
    engine: Engine<TextField>,
    now: Instant,
}

impl Session {
    fn new(start_mode: Mode, field: TextField) -> Self {
        let config = Config {
            start_mode,
            ..Config::default()
        };
        Self {
            engine: Engine::new(&config, field),
            now: Instant::now(),
        }
    }

    /// Normal mode with a block cursor at `offset`.
    fn normal(text: &str, offset: usize) -> Self {
        let mut field = TextField::new(text);
        field.select(Selection::new(offset, 1));
        Self::new(Mode::Normal, field)
    }

    fn press(&mut self, event: KeyEvent) {
        let stroke = event.replay();
        if !self.engine.on_key_at(event, self.now) {
            self.engine.backend_mut().press(stroke);
        }
    }

    fn keys(&mut self, keys: &str) {
        for c in keys.chars() {
            self.press(KeyEvent::from_char(c).unwrap());
        }
    }

    fn wait(&mut self, duration: Duration) {
        self.now += duration;
        self.engine.tick(self.now);
    }

    fn settle(&mut self) {
        self.wait(SETTLE);
    }

    fn field(&self) -> &TextField {
        self.engine.backend()
    }
}

#[test]
fn test_count_word_motion_lands_on_word_start() {
    let mut session = Session::normal("the quick brown fox", 0);
    session.keys("2");
    assert_eq!(session.field().selection(), Selection::new(0, 1));
    session.keys("w");
    session.settle();
    assert_eq!(session.field().selection(), Selection::new(10, 1));

    let mut session = Session::normal("the quick brown fox", 0);
    session.keys("3w");
    session.settle();
    assert_eq!(session.field().selection(), Selection::new(16, 1));
}

#[test]
fn test_back_and_end_motions() {
    let mut session = Session::normal("foo.bar baz", 8);
    session.keys("b");
    session.settle();
    assert_eq!(session.field().selection(), Selection::new(4, 1));

    session.keys("e");
    session.settle();
    assert_eq!(session.field().selection(), Selection::new(6, 1));
}

#[test]
fn test_word_motion_falls_back_without_introspection() {
    let mut field = TextField::new("the quick brown fox").with_introspection(false);
    field.select(Selection::new(0, 1));
    let mut session = Session::new(Mode::Normal, field);

    session.keys("w");
    session.settle();
    assert!(session
        .field()
        .recent_keys()
        .any(|k| *k == Keystroke::option(KeyCode::RIGHT)));
    // Native word jumps stop at the end of the word.
    assert_eq!(session.field().selection(), Selection::new(3, 1));
}

#[test]
fn test_jk_leaves_insert_without_leaking() {
    let mut session = Session::new(Mode::Insert, TextField::new(""));
    session.keys("ab");
    session.keys("jk");
    assert_eq!(session.engine.mode(), Mode::Normal);
    session.settle();
    assert_eq!(session.field().text(), "ab");
}

#[test]
fn test_lone_j_is_typed_after_timeout() {
    let mut session = Session::new(Mode::Insert, TextField::new(""));
    session.keys("j");
    assert_eq!(session.field().text(), "");
    session.wait(Duration::from_millis(200));
    assert_eq!(session.field().text(), "j");
    session.wait(Duration::from_millis(200));
    assert_eq!(session.field().text(), "j");
}

#[test]
fn test_j_followed_by_other_key_keeps_order() {
    let mut session = Session::new(Mode::Insert, TextField::new(""));
    session.keys("jam");
    assert_eq!(session.field().text(), "jam");
    assert_eq!(session.engine.mode(), Mode::Insert);
}

#[test]
fn test_escape_from_insert() {
    let mut session = Session::new(Mode::Insert, TextField::new(""));
    session.keys("hi");
    session.press(KeyEvent::escape());
    assert_eq!(session.engine.mode(), Mode::Normal);
    session.settle();
    assert_eq!(session.field().text(), "hi");
}

#[test]
fn test_insert_collapses_block_before_typing() {
    let mut session = Session::normal("the quick", 4);
    session.keys("i");
    assert_eq!(session.engine.mode(), Mode::Insert);
    session.keys("X");
    assert_eq!(session.field().text(), "the Xquick");
}

#[test]
fn test_append_types_after_block() {
    let mut session = Session::normal("ac", 0);
    session.keys("ab");
    assert_eq!(session.field().text(), "abc");
}

#[test]
fn test_open_line_below() {
    let mut session = Session::normal("one\ntwo", 1);
    session.keys("o");
    session.keys("new");
    assert_eq!(session.field().text(), "one\nnew\ntwo");
}

#[test]
fn test_delete_line() {
    let mut session = Session::normal("one\ntwo\nthree", 5);
    session.keys("dd");
    session.settle();
    assert_eq!(session.field().text(), "one\nthree");
    assert_eq!(session.field().selection(), Selection::new(4, 1));
}

#[test]
fn test_delete_chars_with_count() {
    let mut session = Session::normal("hello", 0);
    session.keys("3x");
    session.settle();
    assert_eq!(session.field().text(), "lo");
    assert_eq!(session.field().selection(), Selection::new(0, 1));

    session.keys("u");
    assert_eq!(session.field().text(), "llo");
}

#[test]
fn test_change_line_leaves_insert_caret() {
    let mut session = Session::normal("abc\ndef", 5);
    session.keys("cc");
    assert_eq!(session.engine.mode(), Mode::Insert);
    session.keys("xy");
    assert_eq!(session.field().text(), "abc\nxy");
}

#[test]
fn test_yank_line_copies_and_parks_at_line_start() {
    let mut session = Session::normal("abc\ndef", 1);
    session.keys("yy");
    session.settle();
    assert_eq!(session.field().clipboard(), "abc");
    assert_eq!(session.field().selection(), Selection::new(0, 1));
    assert_eq!(session.field().text(), "abc\ndef");
}

#[test]
fn test_visual_word_delete() {
    let mut session = Session::normal("hello world", 0);
    session.keys("ve");
    assert_eq!(session.engine.mode(), Mode::Visual);
    assert_eq!(session.field().selected_text(), "hello");

    session.keys("d");
    assert_eq!(session.engine.mode(), Mode::Normal);
    session.settle();
    assert_eq!(session.field().text(), " world");
    assert_eq!(session.field().selection(), Selection::new(0, 1));
}

#[test]
fn test_visual_line_yank() {
    let mut session = Session::normal("one\ntwo", 5);
    session.keys("V");
    assert_eq!(session.engine.mode(), Mode::VisualLine);
    assert_eq!(session.field().selected_text(), "two");

    session.keys("y");
    session.settle();
    assert_eq!(session.engine.mode(), Mode::Normal);
    assert_eq!(session.field().clipboard(), "two");
    assert_eq!(session.field().selection(), Selection::new(4, 1));
}

#[test]
fn test_visual_change_enters_insert() {
    let mut session = Session::normal("abcdef", 1);
    session.keys("vlc");
    assert_eq!(session.engine.mode(), Mode::Insert);
    session.keys("Z");
    assert_eq!(session.field().text(), "aZdef");
}

#[test]
fn test_invalid_command_is_swallowed() {
    let mut session = Session::normal("abc", 0);
    session.keys("gqz");
    session.settle();
    assert_eq!(session.field().text(), "abc");
    assert_eq!(session.engine.pending_keys(), "");
    assert_eq!(session.engine.mode(), Mode::Normal);
}

#[test]
fn test_go_to_last_and_first_line() {
    let mut session = Session::normal("ab\ncd\nef", 0);
    session.keys("G");
    session.settle();
    assert_eq!(session.field().selection(), Selection::caret(8));

    session.keys("gg");
    session.settle();
    assert_eq!(session.field().selection(), Selection::new(0, 1));
}

#[test]
fn test_synthetic_echo_is_ignored_in_normal() {
    let mut session = Session::normal("abc", 0);
    let echo = KeyEvent::new("x", KeyCode(0x07)).into_synthetic();
    assert!(!session.engine.on_key_at(echo, session.now));
    assert_eq!(session.field().text(), "abc");
    assert_eq!(session.field().recent_keys().count(), 0);
}

#[test]
fn test_keys_inside_settle_window_keep_block_cursor() {
    let mut session = Session::normal("hello world", 0);
    session.keys("ll");
    session.wait(Duration::from_millis(50));
    assert_eq!(session.field().selection(), Selection::new(2, 1));

    session.keys("wh");
    session.settle();
    assert_eq!(session.field().selection(), Selection::new(5, 1));
}
