use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use records::EntityKind;
use strum::IntoEnumIterator;

use crate::{
    action::Action,
    components::Component,
    state::State,
    theme::UiGroup,
    tui::{EventResponse, Frame},
};

/// Landing page: one row per record type. Enter opens the add form, `e`
/// reopens the most recently saved record of that type for editing.
pub struct HomePage {
    entities: Vec<EntityKind>,
    selected: usize,
}

impl HomePage {
    pub fn new() -> Self {
        Self {
            entities: EntityKind::iter().collect(),
            selected: 0,
        }
    }

    fn selected_entity(&self) -> EntityKind {
        self.entities[self.selected]
    }
}

impl Component for HomePage {
    fn height_constraint(&self) -> Constraint {
        Constraint::Fill(1)
    }

    fn handle_key_events(
        &mut self,
        key: KeyEvent,
        state: &mut State,
    ) -> Result<Option<EventResponse<Action>>> {
        let response = match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if self.selected == 0 {
                    self.selected = self.entities.len() - 1;
                } else {
                    self.selected -= 1;
                }
                Some(EventResponse::Stop(Action::Update))
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1) % self.entities.len();
                Some(EventResponse::Stop(Action::Update))
            }
            KeyCode::Enter => Some(EventResponse::Stop(Action::OpenForm {
                entity: self.selected_entity(),
                editing: None,
            })),
            KeyCode::Char('e') => {
                let entity = self.selected_entity();
                match state.recent.get(&entity).cloned() {
                    Some(record) => Some(EventResponse::Stop(Action::OpenForm {
                        entity,
                        editing: Some(record),
                    })),
                    None => {
                        state.status =
                            Some(format!("Nothing saved yet for {}", entity.display_name()));
                        Some(EventResponse::Stop(Action::Update))
                    }
                }
            }
            KeyCode::Char('q') => Some(EventResponse::Stop(Action::Quit)),
            _ => None,
        };
        Ok(response)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect, state: &State) -> Result<()> {
        let theme = &state.theme;
        let block = Block::default()
            .title(" Carelog: your records ")
            .borders(Borders::ALL)
            .border_set(ratatui::symbols::border::ROUNDED)
            .style(theme.style(UiGroup::Border));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let mut lines: Vec<Line> = vec![Line::raw("")];
        for (idx, entity) in self.entities.iter().enumerate() {
            let count = state.saved_counts.get(entity).copied().unwrap_or(0);
            let selected = idx == self.selected;
            let marker = if selected { "> " } else { "  " };
            let name_style = if selected {
                theme.style(UiGroup::Focus)
            } else {
                theme.style(UiGroup::Label)
            };
            lines.push(Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:<14}", entity.display_name()), name_style),
                Span::styled(
                    if count == 1 {
                        "  1 entry".to_string()
                    } else {
                        format!("  {count} entries")
                    },
                    theme.style(UiGroup::Dimmed),
                ),
            ]));
        }
        lines.push(Line::raw(""));
        lines.push(
            Line::from(vec![
                Span::styled("Enter", theme.style(UiGroup::Label)),
                Span::raw(": Add   "),
                Span::styled("e", theme.style(UiGroup::Label)),
                Span::raw(": Edit last   "),
                Span::styled("q", theme.style(UiGroup::Label)),
                Span::raw(": Quit"),
            ])
            .style(theme.style(UiGroup::Dimmed)),
        );

        f.render_widget(Paragraph::new(Text::from(lines)), inner);
        Ok(())
    }
}
