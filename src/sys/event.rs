//! Key events as the host reports them, plus the small script format the
//! harness uses to replay them.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

bitflags! {
    /// Modifier state reported alongside a key event.
    ///
    /// The four families map onto the primary, secondary, tertiary and
    /// quaternary modifiers of the switcher settings, in that order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const META = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const SHIFT = 1 << 3;
    }
}

const MODIFIER_NAMES: [(Modifiers, &str); 4] = [
    (Modifiers::META, "Cmd"),
    (Modifiers::CONTROL, "Ctrl"),
    (Modifiers::ALT, "Alt"),
    (Modifiers::SHIFT, "Shift"),
];

impl Modifiers {
    pub fn describe(self) -> String {
        let names: Vec<&str> = MODIFIER_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        names.join(" + ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Alt,
    Control,
    Meta,
    Shift,
    ArrowLeft,
    ArrowRight,
    Other(String),
}

impl Key {
    /// The modifier family this key belongs to, if it is a modifier key.
    pub fn modifier(&self) -> Option<Modifiers> {
        match self {
            Key::Alt => Some(Modifiers::ALT),
            Key::Control => Some(Modifiers::CONTROL),
            Key::Meta => Some(Modifiers::META),
            Key::Shift => Some(Modifiers::SHIFT),
            _ => None,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            Key::ArrowLeft => Some(Direction::Left),
            Key::ArrowRight => Some(Direction::Right),
            _ => None,
        }
    }
}

impl FromStr for Key {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s.to_ascii_lowercase().as_str() {
            "alt" | "option" => Key::Alt,
            "control" | "ctrl" => Key::Control,
            "meta" | "cmd" | "command" | "win" | "super" => Key::Meta,
            "shift" => Key::Shift,
            "arrowleft" | "left" => Key::ArrowLeft,
            "arrowright" | "right" => Key::ArrowRight,
            _ => Key::Other(s.to_string()),
        };
        Ok(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Alt => f.write_str("Alt"),
            Key::Control => f.write_str("Control"),
            Key::Meta => f.write_str("Meta"),
            Key::Shift => f.write_str("Shift"),
            Key::ArrowLeft => f.write_str("ArrowLeft"),
            Key::ArrowRight => f.write_str("ArrowRight"),
            Key::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Wrapping step through `len` entries. `len` must be non-zero.
    pub fn step(self, i: usize, len: usize) -> usize {
        match self {
            Direction::Left => (i + len - 1) % len,
            Direction::Right => (i + 1) % len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self { Self { key, modifiers } }

    /// A bare key press with the modifier flag the key itself implies.
    pub fn pressed(key: Key) -> Self {
        let modifiers = key.modifier().unwrap_or_default();
        Self { key, modifiers }
    }
}

/// Whether the host should go on with its default handling of the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Propagation {
    Consume,
    Pass,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPhase {
    Down,
    Up,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedKey {
    pub phase: KeyPhase,
    pub event: KeyEvent,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseKeyError {
    #[error("line {line}: expected `down` or `up`, found `{found}`")]
    Phase { line: usize, found: String },
    #[error("line {line}: missing key name")]
    MissingKey { line: usize },
    #[error("line {line}: `{name}` is not a modifier")]
    NotModifier { line: usize, name: String },
    #[error("line {line}: unexpected trailing input `{rest}`")]
    Trailing { line: usize, rest: String },
}

/// Parses a key script.
///
/// Each non-empty line is `down|up <key> [mod+mod...]`; `#` starts a comment.
/// The modifier list is the state the host would report with the event.
pub fn parse_key_script(text: &str) -> Result<Vec<ScriptedKey>, ParseKeyError> {
    let mut keys = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let mut words = content.split_whitespace();
        let phase = match words.next() {
            Some("down") => KeyPhase::Down,
            Some("up") => KeyPhase::Up,
            Some(other) => return Err(ParseKeyError::Phase { line, found: other.to_string() }),
            None => continue,
        };
        let Some(name) = words.next() else {
            return Err(ParseKeyError::MissingKey { line });
        };
        let Ok(key) = name.parse::<Key>();
        let modifiers = match words.next() {
            Some(list) => parse_modifiers(list, line)?,
            None => Modifiers::empty(),
        };
        let rest: Vec<&str> = words.collect();
        if !rest.is_empty() {
            return Err(ParseKeyError::Trailing { line, rest: rest.join(" ") });
        }
        keys.push(ScriptedKey {
            phase,
            event: KeyEvent::new(key, modifiers),
        });
    }
    Ok(keys)
}

fn parse_modifiers(list: &str, line: usize) -> Result<Modifiers, ParseKeyError> {
    let mut modifiers = Modifiers::empty();
    for name in list.split('+').filter(|s| !s.is_empty()) {
        let Ok(key) = name.parse::<Key>();
        match key.modifier() {
            Some(flag) => modifiers |= flag,
            None => {
                return Err(ParseKeyError::NotModifier { line, name: name.to_string() });
            }
        }
    }
    Ok(modifiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wraps_both_ways() {
        assert_eq!(Direction::Left.step(0, 3), 2);
        assert_eq!(Direction::Right.step(2, 3), 0);
        assert_eq!(Direction::Right.step(0, 3), 1);
    }

    #[test]
    fn step_recovers_from_stale_index() {
        assert_eq!(Direction::Right.step(5, 2), 0);
        assert_eq!(Direction::Left.step(5, 2), 0);
    }

    #[test]
    fn key_names_are_case_insensitive() {
        assert_eq!("ctrl".parse::<Key>(), Ok(Key::Control));
        assert_eq!("Cmd".parse::<Key>(), Ok(Key::Meta));
        assert_eq!("ArrowRight".parse::<Key>(), Ok(Key::ArrowRight));
        assert_eq!("q".parse::<Key>(), Ok(Key::Other("q".into())));
    }

    #[test]
    fn parses_script_with_comments() {
        let script = "\
# hold alt and step right
down Alt alt
down ArrowRight alt   # move
up Alt
";
        let keys = parse_key_script(script).unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0].phase, KeyPhase::Down);
        assert_eq!(keys[1].event, KeyEvent::new(Key::ArrowRight, Modifiers::ALT));
        assert_eq!(keys[2].phase, KeyPhase::Up);
        assert_eq!(keys[2].event.modifiers, Modifiers::empty());
    }

    #[test]
    fn parses_combined_modifiers() {
        let keys = parse_key_script("down Shift ctrl+shift").unwrap();
        assert_eq!(keys[0].event.modifiers, Modifiers::CONTROL | Modifiers::SHIFT);
    }

    #[test]
    fn rejects_bad_lines() {
        assert_eq!(
            parse_key_script("press Alt"),
            Err(ParseKeyError::Phase { line: 1, found: "press".into() })
        );
        assert_eq!(
            parse_key_script("\ndown"),
            Err(ParseKeyError::MissingKey { line: 2 })
        );
        assert_eq!(
            parse_key_script("down Alt alt+q"),
            Err(ParseKeyError::NotModifier { line: 1, name: "q".into() })
        );
    }

    #[test]
    fn describes_modifiers_in_fixed_order() {
        let mods = Modifiers::SHIFT | Modifiers::CONTROL;
        assert_eq!(mods.describe(), "Ctrl + Shift");
        assert_eq!(Modifiers::empty().describe(), "");
    }
}
