//! # Key Press Replay
//!
//! A command-line tool that replays a configured sequence of simulated key
//! presses to whatever window currently has input focus, looping a
//! configurable number of times.
//!
//! ## Features
//!
//! - Single keys, named keys, and modifier combinations ("Ctrl+Shift+S")
//! - Per-action hold and wait timing
//! - Bounded or infinite looping with an initial focus delay
//! - Cooperative Ctrl+C cancellation that never leaves a key held down
//! - JSON configuration with comments and trailing commas
//!
//! ## Example
//!
//! ```no_run
//! use key_press_replay::{CancelToken, NullSink, ReplayConfig, ReplayEngine};
//!
//! # async fn demo() -> key_press_replay::Result<()> {
//! let config = ReplayConfig::from_file("config.json")?;
//! let engine = ReplayEngine::new(config);
//!
//! let cancel = CancelToken::new();
//! let mut sink = NullSink; // or SendInputSink on Windows
//! engine.run(&mut sink, &cancel).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```json
//! {
//!   "loopCount": 3,
//!   "initialDelayMs": 3000,
//!   "actions": [
//!     {"key": "Ctrl+S", "holdMs": 0, "waitAfterMs": 500},
//!     {"key": "F5", "holdMs": 250, "waitAfterMs": 1000}
//!   ]
//! }
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod key_map;
pub mod replay;

pub use config::{KeyAction, ReplayConfig};
pub use error::{KprError, Result};
pub use input::{InjectionFailure, InputSink, NullSink};
#[cfg(windows)]
pub use input::SendInputSink;
pub use key_map::{KeyCode, ParsedExpression};
pub use replay::{CancelToken, ReplayEngine};
