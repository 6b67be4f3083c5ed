use color_eyre::Result;
use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    action::Action,
    components::Component,
    state::State,
    theme::UiGroup,
    tui::Frame,
};

/// One-line footer: app identity on the left, the transient status message
/// in the middle, record totals on the right.
#[derive(Default)]
pub struct StatusBar;

impl Component for StatusBar {
    fn height_constraint(&self) -> Constraint {
        Constraint::Length(1)
    }

    fn update(&mut self, action: Action, state: &mut State) -> Result<Option<Action>> {
        if let Action::Error(message) = action {
            state.status = Some(message);
        }
        Ok(None)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect, state: &State) -> Result<()> {
        let theme = &state.theme;
        let total = state.total_saved();
        let right = if total == 1 {
            "1 record".to_string()
        } else {
            format!("{total} records")
        };
        let left = format!(" carelog {}", env!("CARGO_PKG_VERSION"));
        let status = state.status.clone().unwrap_or_default();

        let pad = (area.width as usize)
            .saturating_sub(left.len() + status.len() + right.len() + 2)
            .max(1);
        let line = Line::from(vec![
            Span::styled(left, theme.style(UiGroup::Dimmed)),
            Span::raw(" "),
            Span::styled(status, theme.style(UiGroup::Value)),
            Span::raw(" ".repeat(pad)),
            Span::styled(right, theme.style(UiGroup::Dimmed)),
        ]);
        f.render_widget(Paragraph::new(line), area);
        Ok(())
    }
}
