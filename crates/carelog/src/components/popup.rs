use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Block, Borders, Clear},
};

use crate::{components::Component, theme::Theme, theme::UiGroup, tui::Frame};

/// Popup components and helpers.
///
/// - `PopupComponent`: a small extension over `Component` with popup-specific
///   hooks
/// - Rendering helpers: `render_backdrop`, `centered_rect_fixed`,
///   `draw_popup_frame`
///
/// Usage: draw the active page, then for an active popup call
/// `render_backdrop`, compute the dialog rect, `draw_popup_frame`, and draw
/// the popup content inside it.
pub trait PopupComponent: Component {
    /// Whether the popup blocks page interactions. Defaults to true.
    fn is_modal(&self) -> bool {
        true
    }
}

/// Dim the page behind a modal. Terminals have no real transparency, so this
/// is a solid near-black wash.
pub fn render_backdrop(frame: &mut Frame<'_>, area: Rect) {
    let backdrop = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(backdrop, area);
}

/// Centered rectangle with a fixed width/height clamped to `area`.
pub fn centered_rect_fixed(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x.saturating_add((area.width.saturating_sub(w)) / 2),
        y: area.y.saturating_add((area.height.saturating_sub(h)) / 2),
        width: w,
        height: h,
    }
}

/// Draw a rounded, bordered dialog shell with a title, clearing the area so
/// underlying content doesn't bleed through. Returns `area` for chaining.
pub fn draw_popup_frame(
    frame: &mut Frame<'_>,
    area: Rect,
    title: impl Into<String>,
    theme: &Theme,
) -> Rect {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(format!(" {} ", title.into()))
        .borders(Borders::ALL)
        .border_set(symbols::border::ROUNDED)
        .style(theme.style(UiGroup::Border));
    frame.render_widget(block, area);
    area
}

/// Inner drawable area of a framed dialog.
pub fn inner_rect(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 40, 10);
        let r = centered_rect_fixed(area, 100, 100);
        assert_eq!((r.width, r.height), (40, 10));
        let r = centered_rect_fixed(area, 20, 4);
        assert_eq!((r.x, r.y), (10, 3));
    }
}
