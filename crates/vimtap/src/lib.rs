//! vimtap: vim-style modal editing for text fields that only understand
//! plain keystrokes.
//!
//! The capture layer hands every physical key press to an [`Engine`], which
//! interprets it in the active [`Mode`](vim::Mode) and either lets it through
//! or swallows it and injects the native editing keystrokes that produce the
//! same effect.

pub mod backend;
pub mod config;
pub mod engine;
pub mod executor;
pub mod field;
pub mod keys;
pub mod runtime;
pub mod vim;

pub use backend::{Backend, Injector, Introspector, Recorder, Selection};
pub use engine::Engine;
pub use field::TextField;
pub use keys::{KeyCode, KeyEvent, Keystroke, Modifiers};
pub use runtime::EngineHandle;
