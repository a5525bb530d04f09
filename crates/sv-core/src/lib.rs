//! sv-core: shared foundation for stochview.
//!
//! Contains:
//! - error (shared error type)
//! - numeric (float helpers + display rounding)
//! - color (categorical palette + rgb/rgba formatting)

pub mod color;
pub mod error;
pub mod numeric;

pub use color::{Palette, Rgb, Rgba, DEFAULT_PALETTE};
pub use error::{SvError, SvResult};
pub use numeric::*;
