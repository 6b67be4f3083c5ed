use std::collections::HashMap;

use color_eyre::eyre::Result;
use records::EntityKind;
use serde_json::Value as JsonValue;

use crate::components::popups::form::{DynamicOptions, LoadingStates, SpecialtyCache};
use crate::components::popups::form::layout::ResourcePressure;
use crate::config::Config;
use crate::theme::Theme;

/// Shared application state handed to every component.
///
/// The dynamic-options map, the loading flags, and the specialty cache are
/// deliberately owned here, by the caller, and passed into the form layer,
/// which only reads (or, for the cache, explicitly appends to) them.
pub struct State {
    pub theme: Theme,
    pub dynamic: DynamicOptions,
    pub loading: LoadingStates,
    pub specialties: SpecialtyCache,
    pub pressure: ResourcePressure,
    /// Bumped whenever a form opens or closes; async results tagged with an
    /// older generation are discarded instead of being applied to a form
    /// that no longer exists.
    pub form_generation: u64,
    /// Most recently saved record per entity, editable from the home page.
    pub recent: HashMap<EntityKind, JsonValue>,
    pub saved_counts: HashMap<EntityKind, usize>,
    /// Transient one-line message shown in the status bar.
    pub status: Option<String>,
}

impl State {
    pub fn new(config: &Config) -> Result<Self> {
        let pressure = config
            .pressure
            .as_deref()
            .and_then(ResourcePressure::parse)
            .unwrap_or_default();
        Ok(Self {
            theme: Theme::default(),
            dynamic: DynamicOptions::default(),
            loading: LoadingStates::default(),
            specialties: SpecialtyCache::default(),
            pressure,
            form_generation: 0,
            recent: HashMap::new(),
            saved_counts: HashMap::new(),
            status: None,
        })
    }

    pub fn total_saved(&self) -> usize {
        self.saved_counts.values().sum()
    }
}
