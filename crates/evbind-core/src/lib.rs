//! Key combination matching for evdev keyboards
//!
//! This crate turns a serial stream of key transitions into callback
//! invocations. The [`ComboEngine`] tracks which keys are held, matches the
//! held modifiers plus a freshly pressed key against registered bindings, and
//! hands matching callbacks to a [`Dispatch`] implementation so they never run
//! under the engine's lock.
//!
//! The [`device`] module is the event source: it finds a keyboard under
//! `/dev/input` and streams its key events over a tokio channel.

pub mod combo;
pub mod device;
pub mod dispatch;
pub mod engine;
mod error;
pub mod key;

pub use combo::{normalize, Combo};
pub use dispatch::{Callback, Dispatch, ThreadDispatch, TokioDispatch};
pub use engine::ComboEngine;
pub use error::{ComboError, DeviceError};
pub use key::{key_name, EventKind, KeyEvent, Modifier};
