// src/lib.rs

//! Presentation layer for turn-based puzzle engines.
//!
//! The crate binds an abstract game engine (the [`Midend`]) to a windowing
//! platform (a [`Driver`]). It owns the off-screen canvas, turns raw input
//! events into the engine's command alphabet, renders the engine's drawing
//! primitives through damage-tracked render sessions, and drives the
//! animation timer.
//!
//! No game logic lives here. `testcard` is a demo engine for the binary
//! and the integration tests, hidden from the documented API.

pub mod color;
pub mod config;
pub mod error;
pub mod fonts;
pub mod frontend;
pub mod input;
pub mod keys;
pub mod midend;
pub mod platform;
pub mod render;
#[doc(hidden)]
pub mod testcard;
pub mod timer;

pub use config::Config;
pub use error::FrontendError;
pub use frontend::{Frontend, FrontendStatus};
pub use midend::{Command, Midend};
pub use platform::backends::Driver;
pub use render::DrawingApi;
