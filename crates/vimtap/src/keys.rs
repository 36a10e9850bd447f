//! Physical key codes, modifier flags and logical key names.
//!
//! Codes follow the macOS virtual key layout (ANSI). The capture layer
//! reports every press as a logical key string plus its physical code; the
//! injection layer consumes [`Keystroke`]s built from the same codes.

use std::fmt;

use bitflags::bitflags;

/// A physical (virtual) key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const A: KeyCode = KeyCode(0x00);
    pub const C: KeyCode = KeyCode(0x08);
    pub const V: KeyCode = KeyCode(0x09);
    pub const X: KeyCode = KeyCode(0x07);
    pub const Z: KeyCode = KeyCode(0x06);
    pub const RETURN: KeyCode = KeyCode(0x24);
    pub const TAB: KeyCode = KeyCode(0x30);
    pub const SPACE: KeyCode = KeyCode(0x31);
    /// The key labelled "delete" on Apple keyboards.
    pub const BACKSPACE: KeyCode = KeyCode(0x33);
    pub const ESCAPE: KeyCode = KeyCode(0x35);
    pub const HOME: KeyCode = KeyCode(0x73);
    pub const PAGE_UP: KeyCode = KeyCode(0x74);
    pub const FORWARD_DELETE: KeyCode = KeyCode(0x75);
    pub const END: KeyCode = KeyCode(0x77);
    pub const PAGE_DOWN: KeyCode = KeyCode(0x79);
    pub const LEFT: KeyCode = KeyCode(0x7B);
    pub const RIGHT: KeyCode = KeyCode(0x7C);
    pub const DOWN: KeyCode = KeyCode(0x7D);
    pub const UP: KeyCode = KeyCode(0x7E);
}

bitflags! {
    /// Modifier flags carried by an injected keystroke.
    ///
    /// Values are the platform event-flag masks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u64 {
        const SHIFT = 0x0002_0000;
        const CONTROL = 0x0004_0000;
        const OPTION = 0x0008_0000;
        const COMMAND = 0x0010_0000;
    }
}

/// One key press (down + up) with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keystroke {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl Keystroke {
    pub const fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// A keystroke without modifiers.
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty())
    }

    pub const fn shift(code: KeyCode) -> Self {
        Self::new(code, Modifiers::SHIFT)
    }

    pub const fn command(code: KeyCode) -> Self {
        Self::new(code, Modifiers::COMMAND)
    }

    pub const fn option(code: KeyCode) -> Self {
        Self::new(code, Modifiers::OPTION)
    }

    /// The keystroke that types `c`, if the layout has one.
    pub fn for_char(c: char) -> Option<Self> {
        match c {
            ' ' => return Some(Self::plain(KeyCode::SPACE)),
            '\n' => return Some(Self::plain(KeyCode::RETURN)),
            '\t' => return Some(Self::plain(KeyCode::TAB)),
            _ => {}
        }
        CHAR_TABLE.iter().find_map(|&(code, plain, shifted)| {
            if c == plain {
                Some(Self::plain(KeyCode(code)))
            } else if c == shifted {
                Some(Self::shift(KeyCode(code)))
            } else {
                None
            }
        })
    }

    /// The character this keystroke types into a text field, if any.
    ///
    /// Command, Option and Control chords never type text.
    pub fn typed_char(&self) -> Option<char> {
        if self
            .modifiers
            .intersects(Modifiers::COMMAND | Modifiers::OPTION | Modifiers::CONTROL)
        {
            return None;
        }
        match self.code {
            KeyCode::SPACE => return Some(' '),
            KeyCode::RETURN => return Some('\n'),
            KeyCode::TAB => return Some('\t'),
            _ => {}
        }
        let shift = self.modifiers.contains(Modifiers::SHIFT);
        CHAR_TABLE
            .iter()
            .find(|&&(code, _, _)| code == self.code.0)
            .map(|&(_, plain, shifted)| if shift { shifted } else { plain })
    }
}

impl fmt::Display for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, label) in [
            (Modifiers::COMMAND, "Cmd"),
            (Modifiers::CONTROL, "Ctrl"),
            (Modifiers::OPTION, "Opt"),
            (Modifiers::SHIFT, "Shift"),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "{label}+")?;
            }
        }
        match logical_name(self.code, false) {
            Some(name) => f.write_str(&name),
            None => write!(f, "0x{:02X}", self.code.0),
        }
    }
}

/// Logical name the capture layer reports for Escape.
pub const ESCAPE: &str = "ESC";

/// Logical key name for a physical code, as delivered by capture.
pub fn logical_name(code: KeyCode, shift: bool) -> Option<String> {
    let name = match code {
        KeyCode::ESCAPE => ESCAPE,
        KeyCode::RETURN => "Return",
        KeyCode::TAB => "Tab",
        KeyCode::SPACE => "Space",
        KeyCode::BACKSPACE => "Backspace",
        KeyCode::FORWARD_DELETE => "ForwardDelete",
        KeyCode::HOME => "Home",
        KeyCode::END => "End",
        KeyCode::PAGE_UP => "PageUp",
        KeyCode::PAGE_DOWN => "PageDown",
        KeyCode::LEFT => "Left",
        KeyCode::RIGHT => "Right",
        KeyCode::DOWN => "Down",
        KeyCode::UP => "Up",
        _ => {
            let modifiers = if shift {
                Modifiers::SHIFT
            } else {
                Modifiers::empty()
            };
            return Keystroke::new(code, modifiers)
                .typed_char()
                .map(String::from);
        }
    };
    Some(name.to_string())
}

/// Returns true for codes the capture layer filters out before delivery
/// (modifier keys, function keys).
pub fn is_ignored(code: KeyCode) -> bool {
    matches!(code.0, 0x36..=0x3F | 0x40 | 0x4F | 0x50 | 0x5A | 0x60..=0x72)
}

/// A key press delivered by the capture layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Logical key string (`"j"`, `"G"`, `"ESC"`, `"Return"`).
    pub key: String,
    /// Physical code of the press.
    pub code: KeyCode,
    /// True when the event is the echo of a keystroke this process injected.
    pub synthetic: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, code: KeyCode) -> Self {
        Self {
            key: key.into(),
            code,
            synthetic: false,
        }
    }

    /// Builds the event a physical press of `c` produces.
    pub fn from_char(c: char) -> Option<Self> {
        Keystroke::for_char(c).map(|stroke| Self::new(c.to_string(), stroke.code))
    }

    pub fn escape() -> Self {
        Self::new(ESCAPE, KeyCode::ESCAPE)
    }

    /// Marks this event as an injected echo.
    pub fn into_synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn is_escape(&self) -> bool {
        self.code == KeyCode::ESCAPE || self.key == ESCAPE
    }

    /// The keystroke that re-types this key verbatim.
    pub fn replay(&self) -> Keystroke {
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_uppercase() => Keystroke::shift(self.code),
            _ => Keystroke::plain(self.code),
        }
    }
}

/// (code, unshifted char, shifted char) for the ANSI layout.
const CHAR_TABLE: &[(u16, char, char)] = &[
    (0x00, 'a', 'A'),
    (0x01, 's', 'S'),
    (0x02, 'd', 'D'),
    (0x03, 'f', 'F'),
    (0x04, 'h', 'H'),
    (0x05, 'g', 'G'),
    (0x06, 'z', 'Z'),
    (0x07, 'x', 'X'),
    (0x08, 'c', 'C'),
    (0x09, 'v', 'V'),
    (0x0B, 'b', 'B'),
    (0x0C, 'q', 'Q'),
    (0x0D, 'w', 'W'),
    (0x0E, 'e', 'E'),
    (0x0F, 'r', 'R'),
    (0x10, 'y', 'Y'),
    (0x11, 't', 'T'),
    (0x12, '1', '!'),
    (0x13, '2', '@'),
    (0x14, '3', '#'),
    (0x15, '4', '$'),
    (0x16, '6', '^'),
    (0x17, '5', '%'),
    (0x18, '=', '+'),
    (0x19, '9', '('),
    (0x1A, '7', '&'),
    (0x1B, '-', '_'),
    (0x1C, '8', '*'),
    (0x1D, '0', ')'),
    (0x1E, ']', '}'),
    (0x1F, 'o', 'O'),
    (0x20, 'u', 'U'),
    (0x21, '[', '{'),
    (0x22, 'i', 'I'),
    (0x23, 'p', 'P'),
    (0x25, 'l', 'L'),
    (0x26, 'j', 'J'),
    (0x27, '\'', '"'),
    (0x28, 'k', 'K'),
    (0x29, ';', ':'),
    (0x2A, '\\', '|'),
    (0x2B, ',', '<'),
    (0x2C, '/', '?'),
    (0x2D, 'n', 'N'),
    (0x2E, 'm', 'M'),
    (0x2F, '.', '>'),
    (0x32, '`', '~'),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_round_trip_letters() {
        let j = Keystroke::for_char('j').unwrap();
        assert_eq!(j, Keystroke::plain(KeyCode(0x26)));
        assert_eq!(j.typed_char(), Some('j'));

        let upper = Keystroke::for_char('G').unwrap();
        assert_eq!(upper, Keystroke::shift(KeyCode(0x05)));
        assert_eq!(upper.typed_char(), Some('G'));
    }

    #[test]
    fn test_shifted_symbols() {
        assert_eq!(Keystroke::for_char('_'), Some(Keystroke::shift(KeyCode(0x1B))));
        assert_eq!(Keystroke::shift(KeyCode(0x1B)).typed_char(), Some('_'));
    }

    #[test]
    fn test_command_chords_type_nothing() {
        assert_eq!(Keystroke::command(KeyCode::V).typed_char(), None);
        assert_eq!(Keystroke::option(KeyCode::RIGHT).typed_char(), None);
    }

    #[test]
    fn test_logical_names() {
        assert_eq!(logical_name(KeyCode::ESCAPE, false).as_deref(), Some("ESC"));
        assert_eq!(logical_name(KeyCode(0x26), false).as_deref(), Some("j"));
        assert_eq!(logical_name(KeyCode(0x26), true).as_deref(), Some("J"));
        assert_eq!(logical_name(KeyCode(0x3A), false), None);
    }

    #[test]
    fn test_ignored_codes() {
        assert!(is_ignored(KeyCode(0x37)));
        assert!(is_ignored(KeyCode(0x60)));
        assert!(!is_ignored(KeyCode(0x26)));
        assert!(!is_ignored(KeyCode::LEFT));
    }

    #[test]
    fn test_keystroke_display() {
        let stroke = Keystroke::new(KeyCode::RIGHT, Modifiers::COMMAND | Modifiers::SHIFT);
        assert_eq!(stroke.to_string(), "Cmd+Shift+Right");
    }

    #[test]
    fn test_replay_preserves_case() {
        let lower = KeyEvent::from_char('j').unwrap();
        assert_eq!(lower.replay(), Keystroke::plain(KeyCode(0x26)));
        let upper = KeyEvent::from_char('J').unwrap();
        assert_eq!(upper.replay(), Keystroke::shift(KeyCode(0x26)));
    }
}
