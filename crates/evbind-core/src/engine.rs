//! Combination matching engine
//!
//! # Matching
//!
//! The engine keeps three pieces of state behind one lock:
//!
//! - `pressed`: every key currently known to be down
//! - `bindings`: normalized [`Combo`] -> [`Callback`]
//! - `fired`: combos that already fired since their trigger key went down
//!   (only maintained while repeat suppression is enabled)
//!
//! For each [`KeyEvent`]:
//!
//! 1. `Held` (autorepeat) is ignored entirely.
//! 2. `Pressed` inserts the key into `pressed`.
//! 3. `Released` removes the key; with suppression on, every fired combo
//!    whose trigger is this key is forgotten.
//! 4. A `Pressed` non-modifier key builds the candidate combo from the held
//!    modifiers plus that key.
//! 5. With suppression on, a candidate already in `fired` stops here;
//!    otherwise it is recorded, whether or not a binding exists for it.
//! 6. A matching binding's callback is cloned out, the lock is dropped and
//!    the callback goes to the [`Dispatch`] implementation.
//!
//! Matching is exact: `Ctrl+T` does not fire while `Ctrl+Shift` is held.
//!
//! # Example
//!
//! ```no_run
//! use evbind_core::{ComboEngine, KeyEvent};
//! use evdev::Key;
//!
//! let engine = ComboEngine::new();
//! engine.register_binding("Ctrl+Alt+T", || println!("terminal"))?;
//! engine.enable_repeat_suppression();
//!
//! engine.handle_event(KeyEvent::pressed(Key::KEY_LEFTCTRL));
//! engine.handle_event(KeyEvent::pressed(Key::KEY_LEFTALT));
//! engine.handle_event(KeyEvent::pressed(Key::KEY_T));
//! # Ok::<(), evbind_core::ComboError>(())
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use evdev::Key;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::combo::Combo;
use crate::dispatch::{Callback, Dispatch, ThreadDispatch};
use crate::error::ComboError;
use crate::key::{EventKind, KeyEvent, Modifier};

#[derive(Default)]
struct EngineState {
    bindings: HashMap<Combo, Callback>,
    pressed: HashSet<Key>,
    fired: HashSet<Combo>,
    suppress_repeats: bool,
}

impl EngineState {
    /// Apply one event and return the binding to fire, if any.
    fn apply(&mut self, event: KeyEvent) -> Option<(Combo, Callback)> {
        let KeyEvent { key, kind } = event;

        match kind {
            EventKind::Held => return None,
            EventKind::Pressed => {
                self.pressed.insert(key);
            }
            EventKind::Released => {
                self.pressed.remove(&key);
                if self.suppress_repeats {
                    self.fired.retain(|combo| !combo.is_triggered_by(key));
                }
                return None;
            }
        }

        if Modifier::from_key(key).is_some() {
            return None;
        }

        let combo = Combo::from_pressed(&self.pressed, key);

        if self.suppress_repeats && !self.fired.insert(combo.clone()) {
            tracing::trace!("Suppressed repeat of {}", combo);
            return None;
        }

        let callback = self.bindings.get(&combo)?.clone();
        Some((combo, callback))
    }
}

/// Matches key events against registered combos and fires their callbacks.
///
/// All methods take `&self`; share the engine behind an `Arc` between the
/// task pumping events and anything registering bindings.
pub struct ComboEngine {
    state: Mutex<EngineState>,
    dispatcher: Arc<dyn Dispatch>,
}

impl Default for ComboEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ComboEngine {
    /// Create an engine that runs callbacks on their own threads.
    pub fn new() -> Self {
        Self::with_dispatcher(Arc::new(ThreadDispatch))
    }

    /// Create an engine with a custom callback dispatcher.
    pub fn with_dispatcher(dispatcher: Arc<dyn Dispatch>) -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            dispatcher,
        }
    }

    /// Bind `callback` to a combo specifier such as `"Ctrl+Alt+T"`.
    ///
    /// A specifier that normalizes to an already registered combo replaces
    /// the earlier callback. Returns the normalized combo.
    ///
    /// # Errors
    ///
    /// Returns [`ComboError`] for an empty, modifier-only or otherwise
    /// malformed specifier; the registry is left untouched.
    pub fn register_binding<F>(&self, combo: &str, callback: F) -> Result<Combo, ComboError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let combo = Combo::parse(combo)?;
        let callback: Callback = Arc::new(callback);

        let replaced = self
            .state
            .lock()
            .bindings
            .insert(combo.clone(), callback)
            .is_some();

        if replaced {
            tracing::debug!("Replaced binding for {}", combo);
        } else {
            tracing::debug!("Registered binding for {}", combo);
        }

        Ok(combo)
    }

    /// Stop a combo from firing again until its trigger key is released.
    ///
    /// Idempotent; there is no way to turn suppression back off.
    pub fn enable_repeat_suppression(&self) {
        self.state.lock().suppress_repeats = true;
        tracing::debug!("Repeat suppression enabled");
    }

    /// Process a single key event.
    ///
    /// State changes happen under the engine lock; a fired callback is
    /// dispatched after the lock is released.
    pub fn handle_event(&self, event: KeyEvent) {
        let fired = self.state.lock().apply(event);

        if let Some((combo, callback)) = fired {
            tracing::debug!("Combo {} fired", combo);
            self.dispatcher.dispatch(callback);
        }
    }

    /// Feed events from `events` into the engine in arrival order.
    ///
    /// Returns once the sender side closes, which is how the event source
    /// signals that the device went away.
    pub async fn run(&self, mut events: mpsc::Receiver<KeyEvent>) {
        while let Some(event) = events.recv().await {
            tracing::trace!("Key event: {}", event);
            self.handle_event(event);
        }
        tracing::info!("Event source closed, no further key events");
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.state.lock().pressed.contains(&key)
    }

    /// Keys currently held, in no particular order.
    pub fn pressed_keys(&self) -> Vec<Key> {
        self.state.lock().pressed.iter().copied().collect()
    }

    /// Combos currently suppressed until their trigger key is released.
    pub fn fired_combos(&self) -> Vec<Combo> {
        self.state.lock().fired.iter().cloned().collect()
    }

    pub fn binding_count(&self) -> usize {
        self.state.lock().bindings.len()
    }

    /// Whether a binding exists for the given specifier.
    pub fn has_binding(&self, combo: &str) -> bool {
        match Combo::parse(combo) {
            Ok(combo) => self.state.lock().bindings.contains_key(&combo),
            Err(_) => false,
        }
    }

    pub fn suppresses_repeats(&self) -> bool {
        self.state.lock().suppress_repeats
    }
}
