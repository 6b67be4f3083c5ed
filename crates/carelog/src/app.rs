use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use records::{EntityKind, LocalApi, RecordsApi};
use serde_json::Value as JsonValue;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;

use crate::{
    action::Action,
    components::{Component, home::HomePage, status_bar::StatusBar},
    components::popups::form::{
        FieldDescriptor, FieldKind, FormModal, OptionItem,
        registry::{self, DYN_PHARMACIES, DYN_PRACTITIONERS, DYN_SPECIALTIES},
    },
    config::Config,
    state::State,
    tui::{Event, EventResponse, Tui},
};

pub struct App {
    config: Config,
    state: State,
    home: HomePage,
    status_bar: StatusBar,
    popup: Option<Box<dyn Component>>,
    api: Arc<LocalApi>,
    should_quit: bool,
    should_suspend: bool,
    pending_submit: Option<(EntityKind, JsonValue)>,
}

impl App {
    pub fn new(config: Config, api: Arc<LocalApi>) -> Result<Self> {
        let state = State::new(&config)?;
        Ok(Self {
            config,
            state,
            home: HomePage::new(),
            status_bar: StatusBar,
            popup: None,
            api,
            should_quit: false,
            should_suspend: false,
            pending_submit: None,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

        let mut tui = Tui::new()?
            .tick_rate(self.config.tick_rate)
            .frame_rate(self.config.frame_rate);
        tui.enter()?;

        self.home.init(&self.state)?;
        self.status_bar.init(&self.state)?;

        loop {
            if let Some(e) = tui.next().await {
                let mut stop_event_propagation = self
                    .popup
                    .as_mut()
                    .and_then(|popup| popup.handle_events(e.clone(), &mut self.state).ok())
                    .map(|response| match response {
                        Some(EventResponse::Continue(action)) => {
                            action_tx.send(action).ok();
                            false
                        }
                        Some(EventResponse::Stop(action)) => {
                            action_tx.send(action).ok();
                            true
                        }
                        _ => false,
                    })
                    .unwrap_or(false);

                // An open popup is modal: the page only sees events while no
                // popup is active.
                if !stop_event_propagation && self.popup.is_none() {
                    stop_event_propagation = self
                        .home
                        .handle_events(e.clone(), &mut self.state)
                        .ok()
                        .flatten()
                        .map(|response| match response {
                            EventResponse::Continue(action) => {
                                action_tx.send(action).ok();
                                false
                            }
                            EventResponse::Stop(action) => {
                                action_tx.send(action).ok();
                                true
                            }
                        })
                        .unwrap_or(false);
                }

                if !stop_event_propagation {
                    match e {
                        Event::Tick => action_tx.send(Action::Tick)?,
                        Event::Render => action_tx.send(Action::Render)?,
                        Event::Resize(w, h) => action_tx.send(Action::Resize(w, h))?,
                        Event::Quit => action_tx.send(Action::Quit)?,
                        Event::Key(key) => {
                            if key.modifiers.contains(KeyModifiers::CONTROL) {
                                match key.code {
                                    KeyCode::Char('c') => action_tx.send(Action::Quit)?,
                                    KeyCode::Char('z') => action_tx.send(Action::Suspend)?,
                                    _ => {}
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }

            while let Ok(action) = action_rx.try_recv() {
                if action != Action::Tick && action != Action::Render {
                    debug!("{action:?}");
                }
                match &action {
                    Action::Quit => self.should_quit = true,
                    Action::Suspend => self.should_suspend = true,
                    Action::Resume => self.should_suspend = false,
                    Action::Resize(w, h) => {
                        tui.resize(Rect::new(0, 0, *w, *h))?;
                        tui.draw(|f| self.render(f))?;
                    }
                    Action::Render => {
                        tui.draw(|f| self.render(f))?;
                    }
                    _ => self.dispatch(action.clone(), &action_tx)?,
                }

                // Forward to the popup and the status bar so they can react
                // (submit resolution, error display, ...).
                if let Some(popup) = &mut self.popup {
                    if let Some(next) = popup.update(action.clone(), &mut self.state)? {
                        action_tx.send(next)?;
                    }
                }
                if let Some(next) = self.status_bar.update(action.clone(), &mut self.state)? {
                    action_tx.send(next)?;
                }
            }

            if self.should_suspend {
                tui.suspend()?;
                action_tx.send(Action::Resume)?;
                tui = Tui::new()?
                    .tick_rate(self.config.tick_rate)
                    .frame_rate(self.config.frame_rate);
                tui.enter()?;
            } else if self.should_quit {
                tui.stop();
                break;
            }
        }
        tui.exit()?;
        Ok(())
    }

    /// Handle one semantic action. Pure with respect to the terminal, which
    /// keeps the interesting flows testable.
    fn dispatch(&mut self, action: Action, tx: &UnboundedSender<Action>) -> Result<()> {
        match action {
            Action::OpenForm { entity, editing } => self.open_form(entity, editing, tx),
            Action::ClosePopup => {
                if self.popup.take().is_some() {
                    // Anything still in flight for this form is now stale.
                    self.state.form_generation += 1;
                    self.state.loading.clear();
                }
            }
            Action::FieldEdited(change) => {
                debug!(field = %change.name, "field edited");
            }
            Action::SubmitRecord { entity, payload } => {
                let fields = registry::fields_for(entity);
                let field_errors = validate_payload(&fields, &payload);
                if field_errors.is_empty() {
                    self.pending_submit = Some((entity, payload.clone()));
                    let api = self.api.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        match api.save(entity, payload).await {
                            Ok(()) => tx.send(Action::SubmitResolved).ok(),
                            Err(err) => tx
                                .send(Action::SubmitRejected {
                                    field_errors: HashMap::new(),
                                    message: Some(err.to_string()),
                                })
                                .ok(),
                        };
                    });
                } else {
                    tx.send(Action::SubmitRejected {
                        field_errors,
                        message: None,
                    })?;
                }
            }
            Action::SubmitResolved => {
                if let Some((entity, payload)) = self.pending_submit.take() {
                    *self.state.saved_counts.entry(entity).or_insert(0) += 1;
                    self.state.recent.insert(entity, payload);
                    self.state.status = Some(format!("Saved {}", entity.display_name()));
                }
            }
            Action::SubmitRejected { ref message, .. } => {
                self.pending_submit = None;
                if let Some(message) = message {
                    self.state.status = Some(message.clone());
                }
            }
            Action::OptionsLoaded {
                generation,
                key,
                options,
            } => {
                if generation == self.state.form_generation && self.popup.is_some() {
                    if key == DYN_SPECIALTIES {
                        self.state
                            .specialties
                            .prime(options.iter().map(|o| o.value.clone()).collect());
                    }
                    self.state.dynamic.insert(key, options);
                    self.state.loading.set(key, false);
                } else {
                    debug!(key, generation, "discarding stale option list");
                }
            }
            Action::OptionsFailed {
                generation,
                key,
                message,
            } => {
                if generation == self.state.form_generation {
                    self.state.loading.set(key, false);
                    self.state.status = Some(format!("Could not load {key}: {message}"));
                }
            }
            Action::Error(ref message) => {
                self.state.status = Some(message.clone());
            }
            _ => {}
        }
        Ok(())
    }

    fn open_form(
        &mut self,
        entity: EntityKind,
        editing: Option<JsonValue>,
        tx: &UnboundedSender<Action>,
    ) {
        self.state.form_generation += 1;
        self.state.loading.clear();
        self.state.status = None;

        let fields = registry::fields_for(entity);
        self.spawn_option_fetches(&fields, tx);

        let mut modal = FormModal::new(entity, fields, registry::accent_rule_for(entity));
        if let Some(record) = editing {
            modal = modal.with_record(record);
        }
        self.popup = Some(Box::new(modal));
    }

    /// Kick off one fetch per dynamic key the form needs. Completions come
    /// back tagged with the current generation; anything that lands after
    /// the form closed is discarded. The specialty list is served from the
    /// cache when it is fresh, with no round trip.
    fn spawn_option_fetches(&mut self, fields: &[FieldDescriptor], tx: &UnboundedSender<Action>) {
        let keys: BTreeSet<&'static str> = fields
            .iter()
            .filter_map(|f| f.kind.dynamic_key())
            .collect();
        let generation = self.state.form_generation;

        for key in keys {
            if key == DYN_SPECIALTIES && !self.state.specialties.needs_fetch() {
                self.state.dynamic.insert(key, self.state.specialties.options());
                continue;
            }
            self.state.loading.set(key, true);
            let api = self.api.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = match key {
                    DYN_PRACTITIONERS => api
                        .practitioners()
                        .await
                        .map(|rows| rows.into_iter().map(OptionItem::from).collect()),
                    DYN_PHARMACIES => api
                        .pharmacies()
                        .await
                        .map(|rows| rows.into_iter().map(OptionItem::from).collect()),
                    DYN_SPECIALTIES => api
                        .specialties()
                        .await
                        .map(|names| names.into_iter().map(OptionItem::plain).collect()),
                    _ => Ok(Vec::new()),
                };
                let action = match result {
                    Ok(options) => Action::OptionsLoaded {
                        generation,
                        key,
                        options,
                    },
                    Err(err) => Action::OptionsFailed {
                        generation,
                        key,
                        message: err.to_string(),
                    },
                };
                tx.send(action).ok();
            });
        }
    }

    fn render(&mut self, frame: &mut crate::tui::Frame<'_>) {
        let layout =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).split(frame.area());

        if let Err(err) = self.home.draw(frame, layout[0], &self.state) {
            self.state.status = Some(format!("Failed to draw: {err:?}"));
        }
        let _ = self.status_bar.draw(frame, layout[1], &self.state);

        if let Some(popup) = &mut self.popup {
            if let Err(err) = popup.draw(frame, frame.area(), &self.state) {
                self.state.status = Some(format!("Failed to draw: {err:?}"));
            }
        }
    }
}

/// Caller-side validation from the declarative constraints. The form layer
/// renders whatever comes back; it never validates on its own.
pub fn validate_payload(
    fields: &[FieldDescriptor],
    payload: &JsonValue,
) -> HashMap<String, String> {
    let mut errors = HashMap::new();
    for field in fields {
        if matches!(field.kind, FieldKind::Divider) {
            continue;
        }
        let value = payload.get(&field.name);

        let missing = match value {
            None | Some(JsonValue::Null) => true,
            Some(JsonValue::String(s)) => s.trim().is_empty(),
            Some(JsonValue::Array(a)) => a.is_empty(),
            _ => false,
        };
        if field.required && missing {
            errors.insert(
                field.name.clone(),
                format!("{} is required", field.label),
            );
            continue;
        }

        if let Some(JsonValue::String(s)) = value {
            let chars = s.chars().count();
            if chars > 0 {
                if let Some(min) = field.min_len.filter(|min| chars < *min) {
                    errors.insert(
                        field.name.clone(),
                        format!("{} must be at least {min} characters", field.label),
                    );
                }
                if let Some(max) = field.max_len.filter(|max| chars > *max) {
                    errors.insert(
                        field.name.clone(),
                        format!("{} must be at most {max} characters", field.label),
                    );
                }
            }
        }
        if let Some(n) = value.and_then(JsonValue::as_f64) {
            if let Some(min) = field.min.filter(|min| n < *min) {
                errors.insert(
                    field.name.clone(),
                    format!("{} must be at least {min}", field.label),
                );
            }
            if let Some(max) = field.max.filter(|max| n > *max) {
                errors.insert(
                    field.name.clone(),
                    format!("{} must be at most {max}", field.label),
                );
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn app() -> (App, UnboundedSender<Action>, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(Config::default(), Arc::new(LocalApi::instant())).unwrap();
        (app, tx, rx)
    }

    #[test]
    fn required_and_range_constraints_validate() {
        let fields = registry::fields_for(EntityKind::LabResult);
        let errors = validate_payload(&fields, &json!({"test_name": "", "value": ""}));
        assert!(errors.contains_key("test_name"));
        assert!(errors.contains_key("value"));

        let errors = validate_payload(&fields, &json!({"test_name": "HbA1c", "value": 5.4}));
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn length_constraints_validate() {
        let fields = vec![
            FieldDescriptor::new("name", "Name", FieldKind::Text)
                .min_len(3)
                .max_len(5),
        ];
        assert!(validate_payload(&fields, &json!({"name": "ab"})).contains_key("name"));
        assert!(validate_payload(&fields, &json!({"name": "abcdef"})).contains_key("name"));
        assert!(validate_payload(&fields, &json!({"name": "abcd"})).is_empty());
        // Optional fields may be empty.
        assert!(validate_payload(&fields, &json!({"name": ""})).is_empty());
    }

    #[tokio::test]
    async fn stale_option_results_are_discarded() {
        let (mut app, tx, _rx) = app();
        app.dispatch(
            Action::OpenForm {
                entity: EntityKind::Medication,
                editing: None,
            },
            &tx,
        )
        .unwrap();
        let stale_generation = app.state.form_generation - 1;

        app.dispatch(
            Action::OptionsLoaded {
                generation: stale_generation,
                key: DYN_PRACTITIONERS,
                options: vec![OptionItem::new("prac-x", "Dr. Stale")],
            },
            &tx,
        )
        .unwrap();
        assert!(app.state.dynamic.get(DYN_PRACTITIONERS).is_empty());

        app.dispatch(
            Action::OptionsLoaded {
                generation: app.state.form_generation,
                key: DYN_PRACTITIONERS,
                options: vec![OptionItem::new("prac-1", "Dr. Current")],
            },
            &tx,
        )
        .unwrap();
        assert_eq!(app.state.dynamic.get(DYN_PRACTITIONERS).len(), 1);
        assert!(!app.state.loading.is_loading(DYN_PRACTITIONERS));
    }

    #[tokio::test]
    async fn closing_the_form_invalidates_in_flight_fetches() {
        let (mut app, tx, _rx) = app();
        app.dispatch(
            Action::OpenForm {
                entity: EntityKind::Medication,
                editing: None,
            },
            &tx,
        )
        .unwrap();
        let requested_generation = app.state.form_generation;
        app.dispatch(Action::ClosePopup, &tx).unwrap();

        app.dispatch(
            Action::OptionsLoaded {
                generation: requested_generation,
                key: DYN_PRACTITIONERS,
                options: vec![OptionItem::new("prac-1", "Dr. Late")],
            },
            &tx,
        )
        .unwrap();
        assert!(app.state.dynamic.get(DYN_PRACTITIONERS).is_empty());
    }

    #[tokio::test]
    async fn fresh_specialty_cache_skips_the_fetch() {
        let (mut app, tx, _rx) = app();
        app.state.specialties.prime(vec!["Cardiology".into()]);
        app.dispatch(
            Action::OpenForm {
                entity: EntityKind::Practitioner,
                editing: None,
            },
            &tx,
        )
        .unwrap();
        assert!(!app.state.loading.is_loading(DYN_SPECIALTIES));
        assert_eq!(app.state.dynamic.get(DYN_SPECIALTIES).len(), 1);
    }

    #[tokio::test]
    async fn invalid_submit_is_rejected_with_field_errors() {
        let (mut app, tx, mut rx) = app();
        app.dispatch(
            Action::SubmitRecord {
                entity: EntityKind::Allergy,
                payload: json!({"allergen": "", "severity": ""}),
            },
            &tx,
        )
        .unwrap();
        match rx.try_recv().unwrap() {
            Action::SubmitRejected { field_errors, .. } => {
                assert!(field_errors.contains_key("allergen"));
                assert!(field_errors.contains_key("severity"));
            }
            other => panic!("unexpected action {other:?}"),
        }
        assert_eq!(app.api.saved_count(), 0);
    }

    #[tokio::test]
    async fn successful_submit_saves_and_updates_recents() {
        let (mut app, tx, mut rx) = app();
        let payload = json!({"allergen": "Penicillin", "severity": "severe"});
        app.dispatch(
            Action::SubmitRecord {
                entity: EntityKind::Allergy,
                payload,
            },
            &tx,
        )
        .unwrap();

        // The save task runs to completion on the instant API.
        let action = loop {
            tokio::task::yield_now().await;
            if let Ok(action) = rx.try_recv() {
                break action;
            }
        };
        assert_eq!(action, Action::SubmitResolved);
        app.dispatch(Action::SubmitResolved, &tx).unwrap();
        assert_eq!(app.api.saved_count(), 1);
        assert_eq!(app.state.saved_counts.get(&EntityKind::Allergy), Some(&1));
        assert!(app.state.recent.contains_key(&EntityKind::Allergy));
    }
}
