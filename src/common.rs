//! Shared geometry and data records consumed by every tracker variant.

mod detection;
mod rect;
pub mod vector;

pub use detection::Detection;
pub use rect::Rect;

/// Tolerance below which areas and vector norms are treated as zero.
pub const EPSILON: f32 = 1e-6;
