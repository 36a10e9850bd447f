//! Word motion analysis over a text snapshot.
//!
//! All functions are pure and work on character offsets. A *token* is a
//! maximal run of one character class; word and punctuation characters are
//! different classes, so `foo.bar` is three tokens.

/// Character class used for token boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Letters, digits and underscore.
    Word,
    /// Space and tab.
    Whitespace,
    /// Everything else, newline included.
    Punctuation,
}

impl CharClass {
    pub fn of(c: char) -> Self {
        if c.is_alphanumeric() || c == '_' {
            CharClass::Word
        } else if c == ' ' || c == '\t' {
            CharClass::Whitespace
        } else {
            CharClass::Punctuation
        }
    }
}

/// Direction of a run of arrow presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

fn class_at(text: &[char], i: usize) -> CharClass {
    CharClass::of(text[i])
}

fn skip_whitespace(text: &[char], mut i: usize) -> usize {
    while i < text.len() && class_at(text, i) == CharClass::Whitespace {
        i += 1;
    }
    i
}

/// Offset just past the token starting at `i`.
fn token_end_exclusive(text: &[char], mut i: usize) -> usize {
    let class = class_at(text, i);
    while i < text.len() && class_at(text, i) == class {
        i += 1;
    }
    i
}

/// Last offset of the token starting at `i`.
fn token_last(text: &[char], i: usize) -> usize {
    token_end_exclusive(text, i) - 1
}

/// Last offset of the first token at or after `i`, skipping whitespace.
fn next_token_last(text: &[char], i: usize) -> Option<usize> {
    let start = skip_whitespace(text, i);
    (start < text.len()).then(|| token_last(text, start))
}

/// `w`: the first character of the next token.
///
/// Always returns an offset greater than `cursor`, or `None` once the end of
/// the text is reached.
pub fn next_word_start(cursor: usize, text: &[char]) -> Option<usize> {
    if cursor >= text.len() {
        return None;
    }
    let after = if class_at(text, cursor) == CharClass::Whitespace {
        cursor
    } else {
        token_end_exclusive(text, cursor)
    };
    let next = skip_whitespace(text, after);
    (next < text.len()).then_some(next)
}

/// `e`: the last character of the current word, or of the next token when
/// the cursor already sits on a word's last character.
///
/// On punctuation the current run is skipped first. Always returns an
/// offset greater than `cursor`, or `None`.
pub fn current_or_next_word_end(cursor: usize, text: &[char]) -> Option<usize> {
    if cursor >= text.len() {
        return None;
    }
    match class_at(text, cursor) {
        CharClass::Whitespace => next_token_last(text, cursor),
        CharClass::Punctuation => {
            next_token_last(text, token_end_exclusive(text, cursor))
        }
        CharClass::Word => {
            let last = token_last(text, cursor);
            if last > cursor {
                Some(last)
            } else {
                next_token_last(text, last + 1)
            }
        }
    }
}

/// `b`: the first character of the token before `cursor`.
///
/// Never returns an offset at or past `cursor`.
pub fn previous_word_start(cursor: usize, text: &[char]) -> Option<usize> {
    let mut i = cursor.min(text.len()).checked_sub(1)?;
    while class_at(text, i) == CharClass::Whitespace {
        i = i.checked_sub(1)?;
    }
    let class = class_at(text, i);
    while i > 0 && class_at(text, i - 1) == class {
        i -= 1;
    }
    Some(i)
}

/// Applies `step` up to `count` times, stopping early when it finds no
/// target. Returns the last offset reached.
pub fn repeat_motion(
    cursor: usize,
    text: &[char],
    count: usize,
    step: fn(usize, &[char]) -> Option<usize>,
) -> usize {
    let mut position = cursor;
    for _ in 0..count {
        match step(position, text) {
            Some(next) => position = next,
            None => break,
        }
    }
    position
}

/// Number of arrow presses and their direction to move from `from` to `to`.
pub fn arrow_steps(from: usize, to: usize) -> (usize, Direction) {
    if to >= from {
        (to - from, Direction::Right)
    } else {
        (from - to, Direction::Left)
    }
}
