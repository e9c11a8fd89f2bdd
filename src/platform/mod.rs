//! Platform layer
//!
//! The browser backend (canvas, frame callbacks, listeners, LocalStorage).
//! Native builds run headless against `RecordingSurface` and
//! `ManualScheduler` instead.

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{CanvasSurface, GameHandle, LocalStore, RafScheduler, mount};
