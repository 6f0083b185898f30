//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, log pane and status bar
//! - `input`: keyboard event handling
//! - `styles`: color scheme

pub mod input;
pub mod render;
pub mod styles;
