//! Form rendering: grid rows, one draw arm per field kind, and the dropdown
//! overlay. All layout decisions flow from `layout.rs`; all interaction state
//! lives in `popup.rs`.

use color_eyre::Result;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tui_input::Input;

use crate::{
    components::popup::{centered_rect_fixed, draw_popup_frame, inner_rect, render_backdrop},
    state::State,
    theme::UiGroup,
    tui::Frame,
};

use super::{
    date::{effective_min_date, format_iso_date, parse_iso_date},
    field::{FieldDescriptor, FieldKind},
    layout::{
        Breakpoint, LayoutRow, ModalSize, ResourcePressure, Spacing, column_budget, option_cap,
        pack_rows,
    },
    options::{filter_options, find_exact, label_for},
    popup::{FormModal, InteractMode, options_for},
    state::FormState,
};

/// Lines a field's cell occupies: label, value (textarea gets its configured
/// rows), and one hint/error line.
fn cell_height(field: &FieldDescriptor) -> u16 {
    match field.kind {
        FieldKind::Divider => 1,
        FieldKind::TextArea { min_rows, .. } => 2 + min_rows.max(1),
        _ => 3,
    }
}

fn row_height(row: &LayoutRow, fields: &[FieldDescriptor]) -> u16 {
    row.slots
        .iter()
        .filter_map(|slot| fields.get(slot.index))
        .map(cell_height)
        .max()
        .unwrap_or(1)
}

/// Vertical thumb position for the row scrollbar; `None` when everything
/// fits.
pub fn scrollbar_thumb(total: usize, visible: usize, scroll: usize, track_height: u16) -> Option<usize> {
    if track_height == 0 || total == 0 || visible == 0 || total <= visible {
        return None;
    }
    let max_thumb = track_height.saturating_sub(1) as usize;
    let denom = total.saturating_sub(visible).max(1);
    let thumb = (scroll as f32 / denom as f32 * max_thumb as f32).round() as usize;
    Some(thumb.min(max_thumb))
}

/// Current display text for a field, independent of editing state.
///
/// This is where stale or invalid stored data degrades: an unknown select
/// value or an unparseable date renders as empty instead of leaking raw
/// identifiers or crashing.
pub(super) fn display_value(field: &FieldDescriptor, form: &FormState, app: &State) -> String {
    if let Some(key) = field.kind.dynamic_key() {
        if app.loading.is_loading(key) {
            return "Loading options…".to_string();
        }
    }
    match &field.kind {
        FieldKind::Text
        | FieldKind::Email
        | FieldKind::Tel
        | FieldKind::Url
        | FieldKind::TextArea { .. } => form.text(&field.name).to_string(),
        FieldKind::Number => form
            .get(&field.name)
            .map(super::value::FieldValue::display)
            .unwrap_or_default(),
        FieldKind::Date => {
            let raw = form.text(&field.name);
            parse_iso_date(raw).map(format_iso_date).unwrap_or_default()
        }
        FieldKind::Select { .. } => {
            let value = form.text(&field.name);
            if value.is_empty() {
                String::new()
            } else {
                label_for(options_for(field, app), value)
                    .map(|l| format!("{l} ▾"))
                    .unwrap_or_default()
            }
        }
        FieldKind::Autocomplete { .. } => form.text(&field.name).to_string(),
        FieldKind::Combobox { .. } => {
            // Display tracks the label when the value is a known option,
            // falling back to the raw (possibly just-created) value.
            let value = form.text(&field.name);
            label_for(options_for(field, app), value)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string())
        }
        FieldKind::Rating => match form.get(&field.name).and_then(super::value::FieldValue::as_number) {
            None => "No rating".to_string(),
            Some(n) => {
                let full = n.floor() as usize;
                let half = (n - n.floor()) >= 0.5;
                let mut stars = "★".repeat(full.min(5));
                if half {
                    stars.push('½');
                }
                format!("{stars} ({})", super::value::FieldValue::Number(n).display())
            }
        },
        FieldKind::Checkbox => {
            if form.get(&field.name).and_then(super::value::FieldValue::as_bool).unwrap_or(false) {
                "[x] Yes".to_string()
            } else {
                "[ ] No".to_string()
            }
        }
        FieldKind::Tags { max } => {
            let tags = form
                .get(&field.name)
                .and_then(super::value::FieldValue::as_tags)
                .unwrap_or(&[]);
            if tags.is_empty() {
                String::new()
            } else {
                format!("{} ({}/{max})", tags.join(" · "), tags.len())
            }
        }
        FieldKind::Divider => String::new(),
    }
}

pub(super) fn render_form(
    modal: &mut FormModal,
    f: &mut Frame<'_>,
    area: Rect,
    app: &State,
) -> Result<()> {
    if area.width < 20 || area.height < 8 {
        return Ok(());
    }

    let fields_len = modal.fields().len();
    let breakpoint = Breakpoint::of(area.width);
    let budget = column_budget(breakpoint, fields_len);
    let spacing = Spacing::of(breakpoint, fields_len, app.pressure);
    let (w, h) = ModalSize::classify(breakpoint, fields_len).target(area);

    if app.pressure != ResourcePressure::Critical {
        render_backdrop(f, area);
    }
    let dialog = centered_rect_fixed(area, w.max(40), h.max(12));
    draw_popup_frame(f, dialog, modal.title(), &app.theme);
    let inner = inner_rect(dialog);
    f.render_widget(Clear, inner);

    let global_h = modal.form_state().global_errors.len().min(2) as u16;
    let chunks = Layout::vertical([
        Constraint::Length(global_h),
        Constraint::Fill(1),
        Constraint::Length(2),
    ])
    .split(inner);
    let (global_area, body, footer) = (chunks[0], chunks[1], chunks[2]);

    if global_h > 0 {
        let lines: Vec<Line> = modal
            .form_state()
            .global_errors
            .iter()
            .take(global_h as usize)
            .map(|e| Line::from(Span::styled(format!("• {e}"), app.theme.style(UiGroup::Error))))
            .collect();
        f.render_widget(Paragraph::new(Text::from(lines)), global_area);
    }

    // Pack and scroll in row units.
    let rows = pack_rows(modal.fields(), budget);
    let gap = spacing.row_gap();
    let heights: Vec<u16> = rows.iter().map(|r| row_height(r, modal.fields())).collect();
    let focused_row = rows
        .iter()
        .position(|r| r.slots.iter().any(|s| s.index == modal.focused_index()))
        .unwrap_or(0);

    let fits = |start: usize| -> usize {
        // Exclusive end of the row window starting at `start`.
        let mut used = 0u16;
        let mut end = start;
        while end < rows.len() {
            let need = heights[end] + if end > start { gap } else { 0 };
            if used + need > body.height {
                break;
            }
            used += need;
            end += 1;
        }
        end.max(start + usize::from(start < rows.len()))
    };

    let mut scroll = modal.scroll().min(focused_row);
    while fits(scroll) <= focused_row {
        scroll += 1;
    }
    let end = fits(scroll);
    modal.set_scroll(scroll);
    modal.set_visible_rows(end.saturating_sub(scroll));

    // Render the visible rows; remember the focused cell for the overlay.
    let mut y = body.y;
    let mut focused_cell: Option<(Rect, &FieldDescriptor)> = None;
    for row_idx in scroll..end {
        if row_idx > scroll {
            y += gap;
        }
        let row = &rows[row_idx];
        let row_rect = Rect {
            x: body.x,
            y,
            width: body.width.saturating_sub(1),
            height: heights[row_idx].min(body.y + body.height - y),
        };
        y += heights[row_idx];

        let mut constraints: Vec<Constraint> = row
            .slots
            .iter()
            .map(|s| Constraint::Ratio(s.span.min(budget) as u32, budget as u32))
            .collect();
        if row.span_sum() < budget {
            constraints.push(Constraint::Fill(1));
        }
        let cells = Layout::horizontal(constraints).split(row_rect);

        for (slot, cell) in row.slots.iter().zip(cells.iter()) {
            let field = &modal.fields()[slot.index];
            let focused = slot.index == modal.focused_index();
            render_cell(modal, f, *cell, field, focused, app);
            if focused {
                focused_cell = Some((*cell, field));
            }
        }
    }

    render_footer(modal, f, footer, app);

    // Row scrollbar along the right edge.
    if let Some(thumb) = scrollbar_thumb(rows.len(), end.saturating_sub(scroll), scroll, body.height) {
        for i in 0..body.height {
            let glyph = if i as usize == thumb { "█" } else { "│" };
            let style = if i as usize == thumb {
                app.theme.style(UiGroup::Label)
            } else {
                app.theme.style(UiGroup::Border)
            };
            f.render_widget(
                Paragraph::new(Span::styled(glyph, style)),
                Rect {
                    x: body.x + body.width.saturating_sub(1),
                    y: body.y + i,
                    width: 1,
                    height: 1,
                },
            );
        }
    }

    if let Some((cell, field)) = focused_cell {
        if let InteractMode::Dropdown(_) = modal.mode() {
            render_dropdown(modal, f, dialog, cell, field, app);
        }
    }

    Ok(())
}

fn render_cell(
    modal: &FormModal,
    f: &mut Frame<'_>,
    cell: Rect,
    field: &FieldDescriptor,
    focused: bool,
    app: &State,
) {
    if cell.width < 3 || cell.height == 0 {
        return;
    }
    let theme = &app.theme;

    if matches!(field.kind, FieldKind::Divider) {
        let rule = if field.label.is_empty() {
            "─".repeat(cell.width as usize)
        } else {
            format!("── {} {}", field.label, "─".repeat((cell.width as usize).saturating_sub(field.label.len() + 4)))
        };
        f.render_widget(
            Paragraph::new(Span::styled(rule, theme.style(UiGroup::Dimmed))),
            Rect { height: 1, ..cell },
        );
        return;
    }

    // Label line.
    let mut label = field.label.clone();
    if field.required {
        label.push_str(" *");
    }
    let label_style = if focused {
        theme.style(UiGroup::Title)
    } else {
        theme.style(UiGroup::Label)
    };
    f.render_widget(
        Paragraph::new(Span::styled(label, label_style)),
        Rect { height: 1, ..cell },
    );

    // Value area.
    let value_rows = cell.height.saturating_sub(2).max(1);
    let value_rect = Rect {
        x: cell.x,
        y: cell.y + 1,
        width: cell.width,
        height: value_rows,
    };
    let editing_input: Option<&Input> = if focused {
        match modal.mode() {
            InteractMode::EditText(input) | InteractMode::TagEntry(input) => Some(input),
            _ => None,
        }
    } else {
        None
    };

    if let Some(input) = editing_input {
        let prefix = if matches!(field.kind, FieldKind::Tags { .. }) { "+ " } else { "" };
        let avail = value_rect.width.saturating_sub(prefix.len() as u16 + 1) as usize;
        let window = input.visual_scroll(avail);
        let shown: String = input.value().chars().skip(window).collect();
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(prefix, theme.style(UiGroup::Dimmed)),
                Span::styled(shown, theme.style(UiGroup::Focus)),
            ])),
            Rect { height: 1, ..value_rect },
        );
        let cursor_x = value_rect.x
            + prefix.len() as u16
            + input.visual_cursor().saturating_sub(window) as u16;
        f.set_cursor_position((cursor_x.min(value_rect.right().saturating_sub(1)), value_rect.y));
    } else {
        let value = display_value(field, modal.form_state(), app);
        let loading = field
            .kind
            .dynamic_key()
            .map(|k| app.loading.is_loading(k))
            .unwrap_or(false);
        let (text, style) = if loading {
            (value, theme.style(UiGroup::Dimmed))
        } else if value.is_empty() {
            let placeholder = field.placeholder.clone().unwrap_or_default();
            (placeholder, theme.style(UiGroup::Dimmed))
        } else if focused {
            (value, theme.style(UiGroup::Focus))
        } else {
            (value, theme.style(UiGroup::Value))
        };
        f.render_widget(
            Paragraph::new(Span::styled(text, style)).wrap(Wrap { trim: true }),
            value_rect,
        );
    }

    // Hint line: error beats the transient edit hint, which beats the static
    // description; a focused date field falls back to its live range.
    if cell.height >= 3 {
        let hint_rect = Rect {
            x: cell.x,
            y: cell.y + 1 + value_rows,
            width: cell.width,
            height: 1,
        };
        let (text, style) = if let Some(err) = modal.form_state().field_errors.get(&field.name) {
            (err.clone(), theme.style(UiGroup::Error))
        } else if focused && modal.edit_hint().is_some() {
            (
                modal.edit_hint().unwrap_or_default().to_string(),
                theme.style(UiGroup::Warn),
            )
        } else if let Some(desc) = &field.description {
            (desc.clone(), theme.style(UiGroup::Dimmed))
        } else if focused && matches!(field.kind, FieldKind::Date) {
            let min = effective_min_date(&field.name, field.min_date, &modal.form_state().values);
            match min {
                Some(min) => (
                    format!("On or after {}", format_iso_date(min)),
                    theme.style(UiGroup::Dimmed),
                ),
                None => (String::new(), theme.style(UiGroup::Dimmed)),
            }
        } else {
            (String::new(), theme.style(UiGroup::Dimmed))
        };
        if !text.is_empty() {
            f.render_widget(Paragraph::new(Span::styled(text, style)), hint_rect);
        }
    }
}

fn render_footer(modal: &FormModal, f: &mut Frame<'_>, footer: Rect, app: &State) {
    if footer.height == 0 {
        return;
    }
    let theme = &app.theme;
    let submit_span = if modal.is_submitting() {
        Span::styled("Saving…", theme.style(UiGroup::Dimmed))
    } else {
        Span::styled(modal.submit_label(), theme.accent_style(modal.accent()))
    };
    let hints = Line::from(vec![
        Span::styled("Ctrl+S", theme.style(UiGroup::Label)),
        Span::raw(": "),
        submit_span,
        Span::raw("   "),
        Span::styled("Esc", theme.style(UiGroup::Label)),
        Span::raw(": Cancel   "),
        Span::styled("↑↓/Tab", theme.style(UiGroup::Label)),
        Span::raw(": Navigate   "),
        Span::styled("Enter", theme.style(UiGroup::Label)),
        Span::raw(": Edit"),
    ]);
    let para = Paragraph::new(Text::from(vec![Line::raw(""), hints]))
        .style(theme.style(UiGroup::Dimmed));
    f.render_widget(para, footer);
}

fn render_dropdown(
    modal: &FormModal,
    f: &mut Frame<'_>,
    dialog: Rect,
    cell: Rect,
    field: &FieldDescriptor,
    app: &State,
) {
    let dd = match modal.mode() {
        InteractMode::Dropdown(dd) => dd,
        _ => return,
    };
    let theme = &app.theme;
    let options = options_for(field, app);
    let loading = field
        .kind
        .dynamic_key()
        .map(|k| app.loading.is_loading(k))
        .unwrap_or(false);
    let cap = option_cap(app.pressure);
    let filtered = filter_options(options, dd.query.value(), cap);
    let is_combobox = matches!(field.kind, FieldKind::Combobox { .. });
    let offer_create = is_combobox
        && !dd.query.value().trim().is_empty()
        && find_exact(options, dd.query.value()).is_none();

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(vec![
        Span::styled("/ ", theme.style(UiGroup::Dimmed)),
        Span::styled(dd.query.value().to_string(), theme.style(UiGroup::Value)),
        Span::styled("▏", theme.style(UiGroup::Dimmed)),
    ]));

    if loading {
        lines.push(Line::from(Span::styled(
            "Loading…",
            theme.style(UiGroup::Dimmed),
        )));
    } else if filtered.visible.is_empty() && !offer_create {
        lines.push(Line::from(Span::styled(
            "No matches",
            theme.style(UiGroup::Dimmed),
        )));
    } else {
        // Window the rendered rows around the highlight; navigation still
        // covers the whole capped list.
        let max_rows = 8usize.min(cap.max(1));
        let skip = dd
            .highlighted
            .min(filtered.visible.len().saturating_sub(1))
            .saturating_sub(max_rows.saturating_sub(1));
        for (offset, option) in filtered.visible.iter().skip(skip).take(max_rows).enumerate() {
            let idx = skip + offset;
            let selected = idx == dd.highlighted;
            let style = if selected {
                theme.style(UiGroup::Focus)
            } else {
                theme.style(UiGroup::Label)
            };
            let marker = if selected { "> " } else { "  " };
            let text = if option.label.is_empty() {
                option.value.clone()
            } else {
                option.label.clone()
            };
            lines.push(Line::from(vec![Span::raw(marker), Span::styled(text, style)]));
        }
        if offer_create {
            let selected = dd.highlighted == filtered.visible.len();
            let style = if selected {
                theme.style(UiGroup::Focus)
            } else {
                theme.style(UiGroup::Success)
            };
            let marker = if selected { "> " } else { "  " };
            lines.push(Line::from(vec![
                Span::raw(marker),
                Span::styled(
                    format!("+ Create \"{}\"", dd.query.value().trim()),
                    style,
                ),
            ]));
        }
        let hidden = filtered.truncated() + filtered.visible.len().saturating_sub(skip + max_rows);
        if hidden > 0 {
            lines.push(Line::from(Span::styled(
                format!("… {hidden} more, keep typing to narrow"),
                theme.style(UiGroup::Dimmed),
            )));
        }
    }

    let height = (lines.len() as u16 + 2).min(12);
    let below = dialog.bottom().saturating_sub(cell.y + 2);
    let y = if below >= height {
        cell.y + 2
    } else {
        cell.y.saturating_sub(height)
    };
    let max_width = dialog.width.saturating_sub(2).max(1);
    let overlay = Rect {
        x: cell.x.min(dialog.right().saturating_sub(max_width.min(cell.width.max(24)))),
        y: y.max(dialog.y),
        width: cell.width.max(24).min(max_width),
        height: height.min(dialog.height),
    };

    f.render_widget(Clear, overlay);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(ratatui::widgets::BorderType::Rounded)
        .style(theme.style(UiGroup::Border));
    let inner = block.inner(overlay);
    f.render_widget(block, overlay);
    f.render_widget(Paragraph::new(Text::from(lines)), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::popups::form::value::FieldValue;
    use crate::components::popups::form::options::{OptionItem, OptionsSource};
    use crate::config::Config;

    fn app_state() -> State {
        State::new(&Config::default()).unwrap()
    }

    fn select_field(name: &str) -> FieldDescriptor {
        FieldDescriptor::new(
            name,
            "Route",
            FieldKind::Select {
                source: OptionsSource::Static(vec![
                    OptionItem::new("oral", "Oral"),
                    OptionItem::new("topical", "Topical"),
                ]),
            },
        )
    }

    #[test]
    fn stale_select_value_displays_as_empty() {
        let app = app_state();
        let field = select_field("route");
        let mut form = FormState::default();
        form.set("route", FieldValue::text("oral"));
        assert_eq!(display_value(&field, &form, &app), "Oral ▾");
        form.set("route", FieldValue::text("discontinued-route"));
        assert_eq!(display_value(&field, &form, &app), "");
    }

    #[test]
    fn combobox_display_prefers_label_and_falls_back_to_raw() {
        let mut app = app_state();
        app.dynamic.insert(
            "specialties",
            vec![OptionItem::new("cardio", "Cardiology")],
        );
        let field = FieldDescriptor::new(
            "specialty",
            "Specialty",
            FieldKind::Combobox {
                source: OptionsSource::Dynamic("specialties"),
            },
        );
        let mut form = FormState::default();
        form.set("specialty", FieldValue::text("cardio"));
        assert_eq!(display_value(&field, &form, &app), "Cardiology");
        form.set("specialty", FieldValue::text("Hepatology"));
        assert_eq!(display_value(&field, &form, &app), "Hepatology");
    }

    #[test]
    fn invalid_stored_date_renders_empty() {
        let app = app_state();
        let field = FieldDescriptor::new("start_date", "Start", FieldKind::Date);
        let mut form = FormState::default();
        form.set("start_date", FieldValue::text("01/10/2024"));
        assert_eq!(display_value(&field, &form, &app), "");
        form.set("start_date", FieldValue::text("2024-01-10"));
        assert_eq!(display_value(&field, &form, &app), "2024-01-10");
    }

    #[test]
    fn rating_displays_stars_or_no_rating() {
        let app = app_state();
        let field = FieldDescriptor::new("satisfaction", "Satisfaction", FieldKind::Rating);
        let mut form = FormState::default();
        assert_eq!(display_value(&field, &form, &app), "No rating");
        form.set("satisfaction", FieldValue::Number(3.5));
        assert_eq!(display_value(&field, &form, &app), "★★★½ (3.5)");
        form.set("satisfaction", FieldValue::empty());
        assert_eq!(display_value(&field, &form, &app), "No rating");
    }

    #[test]
    fn loading_dynamic_field_shows_the_loading_placeholder() {
        let mut app = app_state();
        app.loading.set("practitioners", true);
        let field = FieldDescriptor::new(
            "prescriber",
            "Prescriber",
            FieldKind::Select {
                source: OptionsSource::Dynamic("practitioners"),
            },
        );
        let form = FormState::default();
        assert_eq!(display_value(&field, &form, &app), "Loading options…");
    }

    #[test]
    fn scrollbar_thumb_bounds() {
        assert_eq!(scrollbar_thumb(10, 10, 0, 8), None);
        assert_eq!(scrollbar_thumb(0, 5, 0, 8), None);
        assert_eq!(scrollbar_thumb(20, 5, 0, 8), Some(0));
        assert_eq!(scrollbar_thumb(20, 5, 15, 8), Some(7));
        let mid = scrollbar_thumb(20, 5, 7, 8).unwrap();
        assert!(mid > 0 && mid < 7);
    }

    #[test]
    fn tags_display_includes_the_count() {
        let app = app_state();
        let field = FieldDescriptor::new("tags", "Tags", FieldKind::tags());
        let mut form = FormState::default();
        form.set(
            "tags",
            FieldValue::Tags(vec!["diabetes".into(), "morning".into()]),
        );
        assert_eq!(display_value(&field, &form, &app), "diabetes · morning (2/15)");
    }
}
