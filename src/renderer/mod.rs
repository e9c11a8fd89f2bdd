//! Rendering module
//!
//! Frames are composed against the `Surface` trait; the browser backend
//! lives in `platform`.

pub mod backdrop;
pub mod scene;
pub mod surface;

pub use backdrop::{Backdrop, BackdropState};
pub use scene::{Hud, Palette, render};
pub use surface::{Color, DrawCommand, RecordingSurface, Surface};
