//! Combo specifiers and their canonical form
//!
//! A combo is a set of held modifiers plus exactly one trigger key, written
//! as `+`-separated tokens: `"Ctrl+Alt+T"`. Parsing is case-insensitive and
//! order-insensitive; the canonical text lists modifiers in [`Modifier`]
//! order followed by the trigger key:
//!
//! ```text
//! "alt+ctrl+t"          -> "CTRL+ALT+T"
//! "RightCtrl+KEY_ENTER" -> "CTRL+ENTER"
//! "t+super"             -> "META+T"
//! ```
//!
//! Combos built from the engine's pressed set go through the same type, so a
//! registered binding and a live key state compare equal exactly when they
//! describe the same chord.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use evdev::Key;

use crate::error::ComboError;
use crate::key::{key_name, Modifier};

/// A normalized key combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combo {
    modifiers: BTreeSet<Modifier>,
    key: String,
}

impl Combo {
    /// Parse a combo specifier.
    ///
    /// Modifier tokens may repeat or name either side (`LeftCtrl+RightCtrl+A`
    /// is `CTRL+A`). The trigger key is not checked against the evdev
    /// vocabulary; a misspelled key produces a combo that never fires.
    ///
    /// # Errors
    ///
    /// Returns [`ComboError`] if:
    /// - The input is empty
    /// - A component between `+` separators is empty
    /// - No trigger key is found (only modifiers)
    /// - More than one non-modifier key is given
    pub fn parse(input: &str) -> Result<Self, ComboError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ComboError::Empty);
        }

        let mut modifiers = BTreeSet::new();
        let mut key: Option<String> = None;

        for part in input.split('+').map(str::trim) {
            if part.is_empty() {
                return Err(ComboError::EmptyToken {
                    input: input.to_string(),
                });
            }

            if let Some(modifier) = Modifier::from_token(part) {
                modifiers.insert(modifier);
                continue;
            }

            let name = trigger_name(part);
            if let Some(first) = key.take() {
                return Err(ComboError::MultipleKeys {
                    input: input.to_string(),
                    first,
                    second: name,
                });
            }
            key = Some(name);
        }

        match key {
            Some(key) => Ok(Self { modifiers, key }),
            None => Err(ComboError::MissingKey {
                input: input.to_string(),
            }),
        }
    }

    /// Build the candidate combo for a trigger press from the keys currently held.
    ///
    /// Non-modifier keys in `pressed` are ignored.
    pub fn from_pressed<'a>(pressed: impl IntoIterator<Item = &'a Key>, trigger: Key) -> Self {
        Self {
            modifiers: pressed
                .into_iter()
                .filter_map(|key| Modifier::from_key(*key))
                .collect(),
            key: key_name(trigger),
        }
    }

    pub fn modifiers(&self) -> &BTreeSet<Modifier> {
        &self.modifiers
    }

    /// Canonical name of the trigger key (e.g. `T`).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether `key` is this combo's trigger key.
    pub fn is_triggered_by(&self, key: Key) -> bool {
        self.key == key_name(key)
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier)?;
        }
        f.write_str(&self.key)
    }
}

impl FromStr for Combo {
    type Err = ComboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Normalize a combo specifier to its canonical text.
///
/// Idempotent: `normalize(&normalize(x)?)? == normalize(x)?`.
pub fn normalize(input: &str) -> Result<String, ComboError> {
    Combo::parse(input).map(|combo| combo.to_string())
}

fn trigger_name(token: &str) -> String {
    let upper = token.trim().to_uppercase();
    match upper.strip_prefix("KEY_") {
        Some(stripped) => stripped.to_string(),
        None => upper,
    }
}
