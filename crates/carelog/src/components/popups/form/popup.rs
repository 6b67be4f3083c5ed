//! Interactive form modal: focus, editing lifecycle, change normalization,
//! and submit orchestration. Rendering lives in `render.rs`.

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use records::EntityKind;
use serde_json::Value as JsonValue;
use tui_input::{Input, backend::crossterm::EventHandler};

use crate::{
    action::Action,
    components::{Component, popup::PopupComponent},
    state::State,
    theme::Accent,
    tui::EventResponse,
};

use super::{
    date::{effective_max_date, effective_min_date, format_iso_date, parse_iso_date,
           parse_stored_date},
    field::{FieldDescriptor, FieldKind},
    layout::option_cap,
    options::{OptionItem, OptionsSource, filter_options, find_exact},
    registry::{AccentRule, DYN_SPECIALTIES},
    state::FormState,
    value::{FieldChange, FieldValue},
};

/// What the focused field is currently doing.
pub(super) enum InteractMode {
    Browse,
    /// Single-line text editing (text-like, number, date kinds).
    EditText(Input),
    /// Dropdown open for a select/autocomplete/combobox field.
    Dropdown(DropdownState),
    /// Entering one new tag for a tag-input field.
    TagEntry(Input),
}

pub(super) struct DropdownState {
    pub query: Input,
    pub highlighted: usize,
    /// Whether the user navigated the highlight away from the top; when they
    /// have not, exact typed text selects its matching option on Enter.
    pub moved: bool,
}

impl DropdownState {
    fn new(seed: String) -> Self {
        Self {
            query: Input::new(seed),
            highlighted: 0,
            moved: false,
        }
    }
}

/// Resolve a field's option list from its static source or the caller's
/// dynamic map.
pub(super) fn options_for<'a>(field: &'a FieldDescriptor, app: &'a State) -> &'a [OptionItem] {
    match field.kind.options_source() {
        Some(OptionsSource::Static(options)) => options.as_slice(),
        Some(OptionsSource::Dynamic(key)) => app.dynamic.get(key),
        None => &[],
    }
}

/// Modal popup hosting one entity form.
pub struct FormModal {
    entity: EntityKind,
    fields: Vec<FieldDescriptor>,
    state: FormState,
    accent_rule: Option<AccentRule>,

    focused: usize,
    scroll: usize,
    mode: InteractMode,
    submitting: bool,
    /// Transient inline message for the focused field (e.g. a rejected date).
    edit_hint: Option<String>,
    /// Remembered from the last render for page-jump sizing.
    visible_rows: usize,
}

impl FormModal {
    pub fn new(entity: EntityKind, fields: Vec<FieldDescriptor>, accent_rule: Option<AccentRule>) -> Self {
        let focused = fields
            .iter()
            .position(|f| f.kind.is_interactive())
            .unwrap_or(0);
        Self {
            entity,
            fields,
            state: FormState::default(),
            accent_rule,
            focused,
            scroll: 0,
            mode: InteractMode::Browse,
            submitting: false,
            edit_hint: None,
            visible_rows: 1,
        }
    }

    /// Prefill from an existing record; switches the submit label to
    /// "Update". Unusable stored dates are reported once, here.
    pub fn with_record(mut self, record: JsonValue) -> Self {
        self.state = FormState::from_record(&self.fields, record);
        for field in &self.fields {
            if matches!(field.kind, FieldKind::Date) {
                let raw = self.state.text(&field.name).to_string();
                let _ = parse_stored_date(&field.name, &raw);
            }
        }
        self
    }

    // --- Accessors used by the renderer --------------------------------------------------------

    pub(super) fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub(super) fn form_state(&self) -> &FormState {
        &self.state
    }

    pub(super) fn focused_index(&self) -> usize {
        self.focused
    }

    pub(super) fn mode(&self) -> &InteractMode {
        &self.mode
    }

    pub(super) fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub(super) fn edit_hint(&self) -> Option<&str> {
        self.edit_hint.as_deref()
    }

    pub(super) fn scroll(&self) -> usize {
        self.scroll
    }

    pub(super) fn set_scroll(&mut self, scroll: usize) {
        self.scroll = scroll;
    }

    pub(super) fn set_visible_rows(&mut self, rows: usize) {
        self.visible_rows = rows.max(1);
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn title(&self) -> String {
        self.entity.display_name().to_string()
    }

    /// "Add X" while creating, "Update X" while editing an existing record.
    pub fn submit_label(&self) -> String {
        if self.state.is_editing() {
            format!("Update {}", self.entity.display_name())
        } else {
            format!("Add {}", self.entity.display_name())
        }
    }

    /// Derived visual state of the submit control.
    pub fn accent(&self) -> Accent {
        self.accent_rule
            .map(|rule| rule(&self.state))
            .unwrap_or_default()
    }

    pub fn state_mut(&mut self) -> &mut FormState {
        &mut self.state
    }

    // --- Focus ---------------------------------------------------------------------------------

    fn focus_step(&mut self, dir: i32) {
        let len = self.fields.len();
        if len == 0 {
            return;
        }
        let mut idx = self.focused;
        for _ in 0..len {
            idx = (idx as i64 + dir as i64).rem_euclid(len as i64) as usize;
            if self.fields[idx].kind.is_interactive() {
                self.focused = idx;
                self.edit_hint = None;
                return;
            }
        }
    }

    fn focus_first(&mut self) {
        if let Some(idx) = self.fields.iter().position(|f| f.kind.is_interactive()) {
            self.focused = idx;
        }
    }

    fn focus_last(&mut self) {
        if let Some(idx) = self.fields.iter().rposition(|f| f.kind.is_interactive()) {
            self.focused = idx;
        }
    }

    fn focused_field(&self) -> Option<&FieldDescriptor> {
        self.fields.get(self.focused)
    }

    fn field_is_loading(&self, field: &FieldDescriptor, app: &State) -> bool {
        field
            .kind
            .dynamic_key()
            .map(|key| app.loading.is_loading(key))
            .unwrap_or(false)
    }

    // --- Change normalization ------------------------------------------------------------------

    /// The single funnel every mutation goes through: store the value, clear
    /// the field's stale error, and surface the normalized event.
    fn push_change(&mut self, name: &str, value: FieldValue) -> Action {
        self.state.set(name, value.clone());
        self.state.field_errors.remove(name);
        self.edit_hint = None;
        Action::FieldEdited(FieldChange::new(name, value))
    }

    // --- Submit --------------------------------------------------------------------------------

    fn submit(&mut self) -> Option<Action> {
        if self.submitting {
            return None;
        }
        self.submitting = true;
        self.state.clear_errors();
        Some(Action::SubmitRecord {
            entity: self.entity,
            payload: self.state.payload(&self.fields),
        })
    }

    // --- Browse-mode interaction ---------------------------------------------------------------

    fn begin_interaction(&mut self, app: &State) -> Option<Action> {
        let field = self.focused_field()?.clone();
        if self.field_is_loading(&field, app) {
            return Some(Action::Update);
        }
        match &field.kind {
            FieldKind::Text
            | FieldKind::Email
            | FieldKind::Tel
            | FieldKind::Url
            | FieldKind::TextArea { .. }
            | FieldKind::Number
            | FieldKind::Date => {
                let seed = self.state.get(&field.name).map(FieldValue::display).unwrap_or_default();
                self.mode = InteractMode::EditText(Input::new(seed));
                Some(Action::Update)
            }
            FieldKind::Select { .. } | FieldKind::Combobox { .. } => {
                self.mode = InteractMode::Dropdown(DropdownState::new(String::new()));
                Some(Action::Update)
            }
            FieldKind::Autocomplete { .. } => {
                let seed = self.state.text(&field.name).to_string();
                self.mode = InteractMode::Dropdown(DropdownState::new(seed));
                Some(Action::Update)
            }
            FieldKind::Checkbox => {
                let next = !self.state.get(&field.name).and_then(FieldValue::as_bool).unwrap_or(false);
                Some(self.push_change(&field.name, FieldValue::Bool(next)))
            }
            FieldKind::Tags { .. } => {
                self.mode = InteractMode::TagEntry(Input::default());
                Some(Action::Update)
            }
            FieldKind::Rating => Some(Action::Update),
            FieldKind::Divider => None,
        }
    }

    fn adjust_field(&mut self, dir: i32, app: &State) -> Option<Action> {
        let field = self.focused_field()?.clone();
        if self.field_is_loading(&field, app) {
            return Some(Action::Update);
        }
        match &field.kind {
            FieldKind::Checkbox => {
                let next = !self.state.get(&field.name).and_then(FieldValue::as_bool).unwrap_or(false);
                Some(self.push_change(&field.name, FieldValue::Bool(next)))
            }
            FieldKind::Rating => {
                let current = self.state.get(&field.name).and_then(FieldValue::as_number).unwrap_or(0.0);
                let next = ((current + dir as f64 * 0.5) * 2.0).round() / 2.0;
                let next = next.clamp(0.0, 5.0);
                Some(self.push_change(&field.name, FieldValue::Number(next)))
            }
            FieldKind::Select { .. } => {
                let values: Vec<String> = options_for(&field, app)
                    .iter()
                    .map(|o| o.value.clone())
                    .collect();
                if values.is_empty() {
                    return Some(Action::Update);
                }
                let current = self.state.text(&field.name).to_string();
                let idx = values.iter().position(|v| *v == current).unwrap_or(0) as i64;
                let next = if self.state.get(&field.name).is_none() {
                    0
                } else {
                    (idx + dir as i64).rem_euclid(values.len() as i64) as usize
                };
                let value = values[next].clone();
                Some(self.push_change(&field.name, FieldValue::Text(value)))
            }
            _ => None,
        }
    }

    fn clear_field(&mut self) -> Option<Action> {
        let field = self.focused_field()?.clone();
        match &field.kind {
            FieldKind::Rating => Some(self.push_change(&field.name, FieldValue::empty())),
            FieldKind::Tags { .. } => {
                let mut tags = self
                    .state
                    .get(&field.name)
                    .and_then(|v| v.as_tags().map(<[String]>::to_vec))
                    .unwrap_or_default();
                if tags.pop().is_some() {
                    Some(self.push_change(&field.name, FieldValue::Tags(tags)))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    // --- Text editing --------------------------------------------------------------------------

    /// Character admission per kind; browsers hint input modes, a terminal
    /// has to enforce them.
    fn accepts_char(kind: &FieldKind, current: &str, c: char) -> bool {
        match kind {
            FieldKind::Number => {
                c.is_ascii_digit()
                    || (c == '.' && !current.contains('.'))
                    || (c == '-' && current.is_empty())
            }
            FieldKind::Date => (c.is_ascii_digit() || c == '-') && current.len() < 10,
            FieldKind::Tel => c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' ' | '.'),
            _ => true,
        }
    }

    fn commit_text_edit(&mut self) -> Option<Action> {
        let field = self.focused_field()?.clone();
        let raw = match &self.mode {
            InteractMode::EditText(input) => input.value().trim().to_string(),
            _ => return None,
        };

        let outcome = match &field.kind {
            FieldKind::Number => {
                if raw.is_empty() {
                    Ok(FieldValue::empty())
                } else {
                    raw.parse::<f64>()
                        .map(FieldValue::Number)
                        .map_err(|_| "Enter a number".to_string())
                }
            }
            FieldKind::Date => {
                if raw.is_empty() {
                    Ok(FieldValue::empty())
                } else {
                    match parse_iso_date(&raw) {
                        None => Err("Use the YYYY-MM-DD format".to_string()),
                        Some(date) => {
                            let min =
                                effective_min_date(&field.name, field.min_date, &self.state.values);
                            let max = effective_max_date(field.max_date);
                            if let Some(min) = min.filter(|m| date < *m) {
                                Err(format!("Must be on or after {}", format_iso_date(min)))
                            } else if let Some(max) = max.filter(|m| date > *m) {
                                Err(format!("Must be no later than {}", format_iso_date(max)))
                            } else {
                                Ok(FieldValue::Text(format_iso_date(date)))
                            }
                        }
                    }
                }
            }
            _ => Ok(FieldValue::Text(raw)),
        };

        match outcome {
            Ok(value) => {
                self.mode = InteractMode::Browse;
                Some(self.push_change(&field.name, value))
            }
            Err(hint) => {
                self.edit_hint = Some(hint);
                Some(Action::Update)
            }
        }
    }

    fn handle_text_edit_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Enter => self.commit_text_edit(),
            KeyCode::Esc => {
                self.mode = InteractMode::Browse;
                self.edit_hint = None;
                Some(Action::Update)
            }
            KeyCode::Char(c) => {
                let kind = self.focused_field()?.kind.clone();
                if let InteractMode::EditText(input) = &mut self.mode {
                    if Self::accepts_char(&kind, input.value(), c) {
                        input.handle_event(&crossterm::event::Event::Key(key));
                    }
                }
                Some(Action::Update)
            }
            _ => {
                if let InteractMode::EditText(input) = &mut self.mode {
                    input.handle_event(&crossterm::event::Event::Key(key));
                }
                Some(Action::Update)
            }
        }
    }

    // --- Dropdown ------------------------------------------------------------------------------

    fn handle_dropdown_key(&mut self, key: KeyEvent, app: &mut State) -> Option<Action> {
        let field = self.focused_field()?.clone();
        let is_combobox = matches!(field.kind, FieldKind::Combobox { .. });
        let is_autocomplete = matches!(field.kind, FieldKind::Autocomplete { .. });

        // Snapshot the row model before touching the mutable dropdown state.
        let (visible_values, total_rows, has_create, exact_value, query_text) = {
            let options = options_for(&field, app);
            let dd = match &self.mode {
                InteractMode::Dropdown(dd) => dd,
                _ => return None,
            };
            let filtered = filter_options(options, dd.query.value(), option_cap(app.pressure));
            let visible: Vec<String> = filtered.visible.iter().map(|o| o.value.clone()).collect();
            let exact = find_exact(options, dd.query.value()).map(|o| o.value.clone());
            let has_create =
                is_combobox && !dd.query.value().trim().is_empty() && exact.is_none();
            let total = visible.len() + usize::from(has_create);
            (visible, total, has_create, exact, dd.query.value().to_string())
        };

        match key.code {
            KeyCode::Up | KeyCode::Down => {
                if let InteractMode::Dropdown(dd) = &mut self.mode {
                    if total_rows > 0 {
                        let dir: i64 = if key.code == KeyCode::Up { -1 } else { 1 };
                        dd.highlighted =
                            (dd.highlighted as i64 + dir).rem_euclid(total_rows as i64) as usize;
                        dd.moved = true;
                    }
                }
                Some(Action::Update)
            }
            KeyCode::Enter => {
                let highlighted = match &self.mode {
                    InteractMode::Dropdown(dd) => dd.highlighted,
                    _ => 0,
                };
                let moved = matches!(&self.mode, InteractMode::Dropdown(dd) if dd.moved);

                if is_combobox {
                    // Exact typed text selects its option unless the user
                    // deliberately highlighted something else.
                    if let Some(value) = exact_value.filter(|_| !moved) {
                        self.mode = InteractMode::Browse;
                        return Some(self.push_change(&field.name, FieldValue::Text(value)));
                    }
                    if has_create && highlighted == visible_values.len() {
                        return Some(self.create_option(&field, query_text.trim().to_string(), app));
                    }
                }
                if is_autocomplete && !moved {
                    // Free entry stands as typed; every keystroke already
                    // emitted the change.
                    self.mode = InteractMode::Browse;
                    return Some(Action::Update);
                }
                if let Some(value) = visible_values.get(highlighted).cloned() {
                    self.mode = InteractMode::Browse;
                    return Some(self.push_change(&field.name, FieldValue::Text(value)));
                }
                if has_create {
                    return Some(self.create_option(&field, query_text.trim().to_string(), app));
                }
                self.mode = InteractMode::Browse;
                Some(Action::Update)
            }
            KeyCode::Esc => {
                self.mode = InteractMode::Browse;
                Some(Action::Update)
            }
            _ => {
                let mut changed = false;
                if let InteractMode::Dropdown(dd) = &mut self.mode {
                    let before = dd.query.value().to_string();
                    dd.query.handle_event(&crossterm::event::Event::Key(key));
                    changed = dd.query.value() != before;
                    if changed {
                        dd.highlighted = 0;
                        dd.moved = false;
                    }
                }
                if changed && is_autocomplete {
                    // Autocomplete is free-entry: every keystroke is a change.
                    let text = match &self.mode {
                        InteractMode::Dropdown(dd) => dd.query.value().to_string(),
                        _ => String::new(),
                    };
                    return Some(self.push_change(&field.name, FieldValue::Text(text)));
                }
                Some(Action::Update)
            }
        }
    }

    /// Combobox create flow: emit the typed text as the value and register it
    /// with the caller-owned caches so future forms offer it without a
    /// refetch.
    fn create_option(&mut self, field: &FieldDescriptor, text: String, app: &mut State) -> Action {
        if text.is_empty() {
            self.mode = InteractMode::Browse;
            return Action::Update;
        }
        if let Some(key) = field.kind.dynamic_key() {
            if key == DYN_SPECIALTIES {
                app.specialties.add(text.clone());
            }
            let mut list = app.dynamic.get(key).to_vec();
            if !list.iter().any(|o| o.value.eq_ignore_ascii_case(&text)) {
                list.push(OptionItem::plain(text.clone()));
                app.dynamic.insert(key, list);
            }
        }
        self.mode = InteractMode::Browse;
        self.push_change(&field.name, FieldValue::Text(text))
    }

    // --- Tag entry -----------------------------------------------------------------------------

    fn commit_tag(&mut self) -> Option<Action> {
        let field = self.focused_field()?.clone();
        let max = match field.kind {
            FieldKind::Tags { max } => max,
            _ => return None,
        };
        let entry = match &self.mode {
            InteractMode::TagEntry(input) => input.value().trim().to_string(),
            _ => return None,
        };
        if entry.is_empty() {
            self.mode = InteractMode::Browse;
            return Some(Action::Update);
        }
        let mut tags = self
            .state
            .get(&field.name)
            .and_then(|v| v.as_tags().map(<[String]>::to_vec))
            .unwrap_or_default();
        if tags.len() >= max {
            self.edit_hint = Some(format!("Tag limit reached ({max})"));
            return Some(Action::Update);
        }
        if tags.iter().any(|t| t.eq_ignore_ascii_case(&entry)) {
            self.edit_hint = Some("Tag already added".to_string());
            return Some(Action::Update);
        }
        tags.push(entry);
        self.mode = InteractMode::Browse;
        Some(self.push_change(&field.name, FieldValue::Tags(tags)))
    }

    fn handle_tag_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Enter => self.commit_tag(),
            KeyCode::Esc => {
                self.mode = InteractMode::Browse;
                self.edit_hint = None;
                Some(Action::Update)
            }
            _ => {
                if let InteractMode::TagEntry(input) = &mut self.mode {
                    input.handle_event(&crossterm::event::Event::Key(key));
                }
                Some(Action::Update)
            }
        }
    }
}

impl Component for FormModal {
    fn height_constraint(&self) -> ratatui::layout::Constraint {
        ratatui::layout::Constraint::Min(16)
    }

    fn handle_key_events(
        &mut self,
        key: KeyEvent,
        app: &mut State,
    ) -> Result<Option<EventResponse<Action>>> {
        let action = match &self.mode {
            InteractMode::EditText(_) => self.handle_text_edit_key(key),
            InteractMode::Dropdown(_) => self.handle_dropdown_key(key, app),
            InteractMode::TagEntry(_) => self.handle_tag_key(key),
            InteractMode::Browse => match key.code {
                KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.submit().or(Some(Action::Update))
                }
                KeyCode::Up | KeyCode::BackTab => {
                    self.focus_step(-1);
                    Some(Action::Update)
                }
                KeyCode::Down | KeyCode::Tab => {
                    self.focus_step(1);
                    Some(Action::Update)
                }
                KeyCode::PageUp => {
                    for _ in 0..self.visible_rows.saturating_sub(1).max(1) {
                        self.focus_step(-1);
                    }
                    Some(Action::Update)
                }
                KeyCode::PageDown => {
                    for _ in 0..self.visible_rows.saturating_sub(1).max(1) {
                        self.focus_step(1);
                    }
                    Some(Action::Update)
                }
                KeyCode::Home => {
                    self.focus_first();
                    Some(Action::Update)
                }
                KeyCode::End => {
                    self.focus_last();
                    Some(Action::Update)
                }
                KeyCode::Enter => self.begin_interaction(app),
                KeyCode::Char(' ') => match self.focused_field().map(|f| f.kind.clone()) {
                    Some(FieldKind::Checkbox) => self.adjust_field(1, app),
                    _ => None,
                },
                KeyCode::Left => self.adjust_field(-1, app),
                KeyCode::Right => self.adjust_field(1, app),
                KeyCode::Insert => match self.focused_field().map(|f| f.kind.clone()) {
                    Some(FieldKind::Tags { .. }) => self.begin_interaction(app),
                    _ => None,
                },
                KeyCode::Backspace | KeyCode::Delete => self.clear_field(),
                KeyCode::Esc => Some(Action::ClosePopup),
                _ => None,
            },
        };
        Ok(action.map(EventResponse::Stop))
    }

    fn update(&mut self, action: Action, _state: &mut State) -> Result<Option<Action>> {
        match action {
            Action::SubmitResolved => {
                self.submitting = false;
                Ok(Some(Action::ClosePopup))
            }
            Action::SubmitRejected {
                field_errors,
                message,
            } => {
                self.submitting = false;
                self.state.set_errors(field_errors);
                if let Some(message) = message {
                    self.state.global_errors.push(message);
                }
                Ok(Some(Action::Update))
            }
            _ => Ok(None),
        }
    }

    fn draw(&mut self, f: &mut crate::tui::Frame<'_>, area: ratatui::layout::Rect, state: &State) -> Result<()> {
        super::render::render_form(self, f, area, state)?;
        Ok(())
    }
}

impl PopupComponent for FormModal {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::popups::form::TAG_LIMIT_DEFAULT;
    use crate::components::popups::form::registry::{self, DYN_PRACTITIONERS};
    use crate::config::Config;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    fn app_state() -> State {
        State::new(&Config::default()).unwrap()
    }

    fn modal(entity: EntityKind) -> FormModal {
        FormModal::new(
            entity,
            registry::fields_for(entity),
            registry::accent_rule_for(entity),
        )
    }

    fn type_text(m: &mut FormModal, app: &mut State, text: &str) {
        for c in text.chars() {
            m.handle_key_events(key(KeyCode::Char(c)), app).unwrap();
        }
    }

    fn focus_field(m: &mut FormModal, app: &mut State, name: &str) {
        for _ in 0..m.fields().len() {
            if m.fields()[m.focused_index()].name == name {
                return;
            }
            m.handle_key_events(key(KeyCode::Down), app).unwrap();
        }
        panic!("no field named {name}");
    }

    fn unwrap_action(r: Option<EventResponse<Action>>) -> Action {
        match r {
            Some(EventResponse::Stop(a)) | Some(EventResponse::Continue(a)) => a,
            None => panic!("expected an action"),
        }
    }

    #[test]
    fn checkbox_toggle_emits_a_bool_never_a_string() {
        let mut app = app_state();
        let mut m = modal(EntityKind::Medication);
        focus_field(&mut m, &mut app, "active");
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap());
        match action {
            Action::FieldEdited(change) => {
                assert_eq!(change.name, "active");
                assert_eq!(change.value, FieldValue::Bool(true));
            }
            other => panic!("unexpected action {other:?}"),
        }
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap());
        match action {
            Action::FieldEdited(change) => assert_eq!(change.value, FieldValue::Bool(false)),
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn number_clears_to_the_empty_string_not_nan() {
        let mut app = app_state();
        let mut m = modal(EntityKind::LabResult);
        focus_field(&mut m, &mut app, "value");

        m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap();
        type_text(&mut m, &mut app, "12.5");
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap());
        assert_eq!(
            action,
            Action::FieldEdited(FieldChange::new("value", FieldValue::Number(12.5)))
        );

        // Clear it again: empty string, not null and not NaN.
        m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap();
        for _ in 0..4 {
            m.handle_key_events(key(KeyCode::Backspace), &mut app).unwrap();
        }
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap());
        assert_eq!(
            action,
            Action::FieldEdited(FieldChange::new("value", FieldValue::empty()))
        );
    }

    #[test]
    fn number_editor_rejects_non_numeric_keystrokes() {
        let mut app = app_state();
        let mut m = modal(EntityKind::LabResult);
        focus_field(&mut m, &mut app, "value");
        m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap();
        type_text(&mut m, &mut app, "1a2..b3");
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap());
        assert_eq!(
            action,
            Action::FieldEdited(FieldChange::new("value", FieldValue::Number(12.3)))
        );
    }

    #[test]
    fn end_date_before_onset_is_rejected_at_commit() {
        let mut app = app_state();
        let mut m = modal(EntityKind::Condition);
        m.state_mut().set("onset_date", FieldValue::text("2024-01-10"));

        focus_field(&mut m, &mut app, "end_date");
        m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap();
        type_text(&mut m, &mut app, "2024-01-05");
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap());
        assert_eq!(action, Action::Update);
        assert!(m.edit_hint().unwrap().contains("2024-01-10"));
        assert_eq!(m.form_state().get("end_date"), None);

        // On or after the onset commits and normalizes.
        if let InteractMode::EditText(input) = &mut m.mode {
            *input = Input::new("2024-02-01".to_string());
        }
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap());
        assert_eq!(
            action,
            Action::FieldEdited(FieldChange::new("end_date", FieldValue::text("2024-02-01")))
        );
    }

    #[test]
    fn rating_moves_in_half_steps_and_clears() {
        let mut app = app_state();
        let mut m = modal(EntityKind::Visit);
        focus_field(&mut m, &mut app, "satisfaction");

        let action = unwrap_action(m.handle_key_events(key(KeyCode::Right), &mut app).unwrap());
        assert_eq!(
            action,
            Action::FieldEdited(FieldChange::new("satisfaction", FieldValue::Number(0.5)))
        );
        for _ in 0..20 {
            m.handle_key_events(key(KeyCode::Right), &mut app).unwrap();
        }
        assert_eq!(
            m.form_state().get("satisfaction"),
            Some(&FieldValue::Number(5.0))
        );
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Backspace), &mut app).unwrap());
        assert_eq!(
            action,
            Action::FieldEdited(FieldChange::new("satisfaction", FieldValue::empty()))
        );
    }

    #[test]
    fn select_cycles_with_left_right() {
        let mut app = app_state();
        let mut m = modal(EntityKind::Condition);
        focus_field(&mut m, &mut app, "status");
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Right), &mut app).unwrap());
        assert_eq!(
            action,
            Action::FieldEdited(FieldChange::new("status", FieldValue::text("active")))
        );
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Right), &mut app).unwrap());
        assert_eq!(
            action,
            Action::FieldEdited(FieldChange::new("status", FieldValue::text("remission")))
        );
    }

    #[test]
    fn loading_dynamic_field_refuses_interaction() {
        let mut app = app_state();
        app.loading.set(DYN_PRACTITIONERS, true);
        let mut m = modal(EntityKind::Medication);
        focus_field(&mut m, &mut app, "prescriber");
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap());
        assert_eq!(action, Action::Update);
        assert!(matches!(m.mode(), InteractMode::Browse));
    }

    #[test]
    fn combobox_offers_create_only_without_an_exact_match() {
        let mut app = app_state();
        app.specialties.prime(vec!["Cardiology".into(), "Neurology".into()]);
        app.dynamic.insert(DYN_SPECIALTIES, app.specialties.options());

        let mut m = modal(EntityKind::Practitioner);
        focus_field(&mut m, &mut app, "specialty");
        m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap();

        // Exact (case-insensitive) match: Enter selects, nothing is created.
        type_text(&mut m, &mut app, "cardiology");
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap());
        assert_eq!(
            action,
            Action::FieldEdited(FieldChange::new("specialty", FieldValue::text("Cardiology")))
        );
        assert_eq!(app.specialties.entries().len(), 2);
    }

    #[test]
    fn combobox_create_emits_typed_text_and_grows_the_cache() {
        let mut app = app_state();
        app.specialties.prime(vec!["Cardiology".into()]);
        app.dynamic.insert(DYN_SPECIALTIES, app.specialties.options());

        let mut m = modal(EntityKind::Practitioner);
        focus_field(&mut m, &mut app, "specialty");
        m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap();
        type_text(&mut m, &mut app, "Hepatology");
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap());
        assert_eq!(
            action,
            Action::FieldEdited(FieldChange::new("specialty", FieldValue::text("Hepatology")))
        );
        assert!(app
            .specialties
            .entries()
            .iter()
            .any(|s| s == "Hepatology"));
        assert!(app
            .dynamic
            .get(DYN_SPECIALTIES)
            .iter()
            .any(|o| o.value == "Hepatology"));
    }

    #[test]
    fn tags_respect_the_limit_and_emit_whole_arrays() {
        let mut app = app_state();
        let mut m = modal(EntityKind::Allergy);
        focus_field(&mut m, &mut app, "triggers");

        m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap();
        type_text(&mut m, &mut app, "pollen");
        let action = unwrap_action(m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap());
        assert_eq!(
            action,
            Action::FieldEdited(FieldChange::new(
                "triggers",
                FieldValue::Tags(vec!["pollen".into()])
            ))
        );

        // Fill to the limit; the next entry is refused with a hint.
        for i in 0..TAG_LIMIT_DEFAULT - 1 {
            m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap();
            type_text(&mut m, &mut app, &format!("tag{i}"));
            m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap();
        }
        assert_eq!(
            m.form_state().get("triggers").and_then(|v| v.as_tags().map(<[String]>::len)),
            Some(TAG_LIMIT_DEFAULT)
        );
        m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap();
        type_text(&mut m, &mut app, "one too many");
        m.handle_key_events(key(KeyCode::Enter), &mut app).unwrap();
        assert!(m.edit_hint().unwrap().contains("limit"));
    }

    #[test]
    fn submit_is_guarded_against_reentry() {
        let mut app = app_state();
        let mut m = modal(EntityKind::VitalSign);
        let first = m.handle_key_events(ctrl('s'), &mut app).unwrap();
        assert!(matches!(
            unwrap_action(first),
            Action::SubmitRecord { entity: EntityKind::VitalSign, .. }
        ));
        assert!(m.is_submitting());

        let second = unwrap_action(m.handle_key_events(ctrl('s'), &mut app).unwrap());
        assert_eq!(second, Action::Update);

        // Rejection re-enables and surfaces the errors.
        let next = m
            .update(
                Action::SubmitRejected {
                    field_errors: [("value".to_string(), "Result is required".to_string())].into(),
                    message: None,
                },
                &mut app,
            )
            .unwrap();
        assert_eq!(next, Some(Action::Update));
        assert!(!m.is_submitting());
        assert_eq!(
            m.form_state().field_errors.get("value").map(String::as_str),
            Some("Result is required")
        );

        // Resolution closes the popup.
        let first = m.handle_key_events(ctrl('s'), &mut app).unwrap();
        assert!(matches!(unwrap_action(first), Action::SubmitRecord { .. }));
        let next = m.update(Action::SubmitResolved, &mut app).unwrap();
        assert_eq!(next, Some(Action::ClosePopup));
    }

    #[test]
    fn submit_label_follows_editing_state() {
        let m = modal(EntityKind::Medication);
        assert_eq!(m.submit_label(), "Add Medication");
        let m = modal(EntityKind::Medication)
            .with_record(serde_json::json!({"name": "Metformin"}));
        assert_eq!(m.submit_label(), "Update Medication");
    }

    #[test]
    fn focus_skips_dividers() {
        let mut app = app_state();
        let mut m = modal(EntityKind::Practitioner);
        for _ in 0..m.fields().len() * 2 {
            assert!(m.fields()[m.focused_index()].kind.is_interactive());
            m.handle_key_events(key(KeyCode::Down), &mut app).unwrap();
        }
    }

    #[test]
    fn accent_tracks_the_severity_value() {
        let mut app = app_state();
        let mut m = modal(EntityKind::Allergy);
        assert_eq!(m.accent(), Accent::Default);
        focus_field(&mut m, &mut app, "severity");
        // Cycle to the last option: life_threatening.
        for _ in 0..4 {
            m.handle_key_events(key(KeyCode::Right), &mut app).unwrap();
        }
        assert_eq!(m.form_state().text("severity"), "life_threatening");
        assert_eq!(m.accent(), Accent::Critical);
    }
}
