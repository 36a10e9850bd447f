//! Modal (vim-style) interpretation of a keystroke stream.
//!
//! Keys arrive one at a time from a capture layer that does not know about
//! modes. This module decides what each key means in the current mode and
//! describes the result as [`VimAction`] data for the engine to execute.
//!
//! # Architecture
//!
//! - `Mode`: the current editing mode (Normal, Insert, Visual, VisualLine)
//! - `CommandParser`: turns the Normal/Visual key buffer into a `ParsedCommand`
//! - `SequenceDetector`: holds the first key of a timed chord like `jk`
//! - `ModeHandler`: one implementation per mode, returning `VimAction`s
//! - `word`: pure word-boundary analysis used by `w`, `e` and `b`
//!
//! # Usage
//!
//! ```ignore
//! let mut handler = NormalHandler::default();
//! match handler.handle_key(&key, Instant::now()) {
//!     Some(action) => engine.execute(action),
//!     None => pass_through(key),
//! }
//! ```

mod action;
mod command;
mod handler;
mod insert;
mod mode;
mod parser;
mod sequence;
mod visual;
pub mod word;

pub use action::VimAction;
pub use command::{Edit, ModeSwitch, Motion, ParsedCommand, VimCommand};
pub use handler::{command_action, CommandBuffer, ModeHandler, NormalHandler};
pub use insert::{InsertHandler, DEFAULT_CHORD_TIMEOUT};
pub use mode::Mode;
pub use parser::{extract_count, CommandParser, Parse};
pub use sequence::{SequenceConfig, SequenceDetector, SequenceResult};
pub use visual::VisualHandler;
