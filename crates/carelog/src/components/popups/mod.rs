/// Popup components for the Carelog TUI.
///
/// This module aggregates concrete popup types and re-exports the shared
/// helpers and trait from `components/popup.rs` so there is a single source
/// of truth for popup utilities.
pub mod form;

pub use crate::components::popup::{
    PopupComponent, centered_rect_fixed, draw_popup_frame, inner_rect, render_backdrop,
};
