//! Key vocabulary shared by the event source and the engine
//!
//! Keys are identified by evdev [`Key`] codes. Modifiers are classified into a
//! closed [`Modifier`] set where left and right variants collapse into one
//! canonical name:
//!
//! - `KEY_LEFTCTRL` / `KEY_RIGHTCTRL` -> `CTRL`
//! - `KEY_LEFTALT` / `KEY_RIGHTALT` -> `ALT`
//! - `KEY_LEFTSHIFT` / `KEY_RIGHTSHIFT` -> `SHIFT`
//! - `KEY_LEFTMETA` / `KEY_RIGHTMETA` -> `META`

use std::fmt;
use std::str::FromStr;

use evdev::{InputEvent, Key};

/// Event value constants for EV_KEY events.
pub mod event_value {
    /// Key release event value
    pub const RELEASE: i32 = 0;
    /// Key press event value
    pub const PRESS: i32 = 1;
    /// Key repeat event value (autorepeat)
    pub const REPEAT: i32 = 2;
}

/// The kind of a key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The key went up.
    Released,
    /// The key went down.
    Pressed,
    /// Kernel autorepeat for a key that is still down.
    Held,
}

impl EventKind {
    /// Map an EV_KEY value to an event kind.
    ///
    /// Returns `None` for values the kernel does not document for key events;
    /// callers skip those.
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            event_value::RELEASE => Some(EventKind::Released),
            event_value::PRESS => Some(EventKind::Pressed),
            event_value::REPEAT => Some(EventKind::Held),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Released => write!(f, "Release"),
            EventKind::Pressed => write!(f, "Press"),
            EventKind::Held => write!(f, "Hold"),
        }
    }
}

/// A single key transition, the unit consumed by [`ComboEngine`](crate::ComboEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub kind: EventKind,
}

impl KeyEvent {
    pub fn new(key: Key, kind: EventKind) -> Self {
        Self { key, kind }
    }

    pub fn pressed(key: Key) -> Self {
        Self::new(key, EventKind::Pressed)
    }

    pub fn released(key: Key) -> Self {
        Self::new(key, EventKind::Released)
    }

    pub fn held(key: Key) -> Self {
        Self::new(key, EventKind::Held)
    }

    /// Convert a raw evdev event.
    ///
    /// Non-key events and key events with an unknown value yield `None`.
    pub fn from_input(event: &InputEvent) -> Option<Self> {
        if event.event_type() != evdev::EventType::KEY {
            return None;
        }
        let kind = EventKind::from_value(event.value())?;
        Some(Self::new(Key::new(event.code()), kind))
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.key, self.kind)
    }
}

/// Normalized modifier key.
///
/// The derived ordering is the canonical order modifiers appear in a combo:
/// `CTRL`, `ALT`, `SHIFT`, `META`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    /// Control key (left or right)
    Ctrl,
    /// Alt key (left or right)
    Alt,
    /// Shift key (left or right)
    Shift,
    /// Meta/Super/Windows key (left or right)
    Meta,
}

impl Modifier {
    /// Check if an evdev key is a modifier and return its normalized form.
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::KEY_LEFTCTRL | Key::KEY_RIGHTCTRL => Some(Modifier::Ctrl),
            Key::KEY_LEFTALT | Key::KEY_RIGHTALT => Some(Modifier::Alt),
            Key::KEY_LEFTSHIFT | Key::KEY_RIGHTSHIFT => Some(Modifier::Shift),
            Key::KEY_LEFTMETA | Key::KEY_RIGHTMETA => Some(Modifier::Meta),
            _ => None,
        }
    }

    /// Parse a modifier token from a combo specifier (case-insensitive).
    ///
    /// Accepts the canonical names, a few common aliases, side-qualified
    /// forms (`LEFTCTRL`, `RCTRL`) and raw kernel names (`KEY_RIGHTALT`).
    pub fn from_token(token: &str) -> Option<Self> {
        let upper = token.trim().to_uppercase();
        let name = upper.strip_prefix("KEY_").unwrap_or(&upper);

        if let Some(modifier) = Self::from_bare_name(name) {
            return Some(modifier);
        }

        let unsided = name
            .strip_prefix("LEFT")
            .or_else(|| name.strip_prefix("RIGHT"))
            .or_else(|| name.strip_prefix('L'))
            .or_else(|| name.strip_prefix('R'))?;
        Self::from_bare_name(unsided)
    }

    fn from_bare_name(name: &str) -> Option<Self> {
        match name {
            "CTRL" | "CONTROL" => Some(Modifier::Ctrl),
            "ALT" => Some(Modifier::Alt),
            "SHIFT" => Some(Modifier::Shift),
            "META" | "SUPER" | "WIN" | "WINDOWS" => Some(Modifier::Meta),
            _ => None,
        }
    }

    /// Canonical name used in normalized combos.
    pub fn name(self) -> &'static str {
        match self {
            Modifier::Ctrl => "CTRL",
            Modifier::Alt => "ALT",
            Modifier::Shift => "SHIFT",
            Modifier::Meta => "META",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Human-readable name of a key: its evdev code name without the `KEY_` prefix.
pub fn key_name(key: Key) -> String {
    let name = format!("{:?}", key);
    match name.strip_prefix("KEY_") {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

/// Whether `name` exists in the evdev key vocabulary.
///
/// Raw `KEY_*` and `BTN_*` names are looked up as given; anything else is
/// looked up as `KEY_<name>`. Only used for advisory warnings; matching never
/// depends on it.
pub fn is_known_key_name(name: &str) -> bool {
    let upper = name.trim().to_uppercase();
    let raw = if upper.starts_with("KEY_") || upper.starts_with("BTN_") {
        upper
    } else {
        format!("KEY_{}", upper)
    };
    Key::from_str(&raw).is_ok()
}
