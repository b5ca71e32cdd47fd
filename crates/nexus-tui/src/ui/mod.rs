//! Dashboard rendering.

mod render;
mod theme;

pub use render::render;
pub use theme::Theme;
