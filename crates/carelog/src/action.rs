use std::collections::HashMap;

use records::EntityKind;
use serde_json::Value as JsonValue;
use strum::Display;

use crate::components::popups::form::{FieldChange, OptionItem};

#[derive(Debug, Clone, PartialEq, Display)]
pub enum Action {
    Tick,
    Render,
    Resize(u16, u16),
    Suspend,
    Resume,
    Quit,
    Error(String),
    /// Generic "state changed, redraw at the next frame" marker.
    Update,

    /// Open the form for an entity; `editing` carries the record when
    /// updating an existing one.
    OpenForm {
        entity: EntityKind,
        editing: Option<JsonValue>,
    },
    ClosePopup,

    /// A field control emitted a normalized change.
    FieldEdited(FieldChange),
    /// The form asked the caller to persist the current payload.
    SubmitRecord {
        entity: EntityKind,
        payload: JsonValue,
    },
    /// Caller verdicts on an in-flight submit.
    SubmitResolved,
    SubmitRejected {
        field_errors: HashMap<String, String>,
        message: Option<String>,
    },

    /// A dynamic option fetch finished. `generation` identifies which form
    /// instance requested it; stale results are discarded.
    OptionsLoaded {
        generation: u64,
        key: &'static str,
        options: Vec<OptionItem>,
    },
    OptionsFailed {
        generation: u64,
        key: &'static str,
        message: String,
    },
}
