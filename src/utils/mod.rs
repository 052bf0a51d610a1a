//! Utilities module.
//!
//! - `interpolation`: selector template rendering with `{{name}}` placeholders.
//! - `delay`: settle pauses with optional random jitter.

pub mod delay;
pub mod interpolation;

pub use delay::settle;
pub use interpolation::{locator, render};
