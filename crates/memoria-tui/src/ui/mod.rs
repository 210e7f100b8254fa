//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, tab bar, status bar and overlays
//! - `input`: keyboard event handling
//! - `sections`: per-section content
//! - `styles`: color scheme and text styling

pub mod input;
pub mod render;
pub mod sections;
pub mod styles;
