//! Option lists for enumerable fields.
//!
//! Options come from two places: a static list authored alongside the field
//! configuration, or a runtime-supplied map keyed by name and populated by
//! the caller from the records API (practitioners, pharmacies, specialties).
//! Loading flags for the dynamic lists are equally caller-owned; the form
//! layer only reads them to disable controls and show a loading placeholder.

use std::collections::HashMap;

use records::OptionRow;

/// One selectable option. `value` is what gets stored; `label` is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionItem {
    pub value: String,
    pub label: String,
}

impl OptionItem {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Option whose stored value doubles as its label.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }

    fn search_text(&self) -> &str {
        if self.label.is_empty() {
            &self.value
        } else {
            &self.label
        }
    }
}

impl From<OptionRow> for OptionItem {
    fn from(row: OptionRow) -> Self {
        Self {
            value: row.value,
            label: row.label,
        }
    }
}

/// Where a field's options come from.
#[derive(Debug, Clone)]
pub enum OptionsSource {
    Static(Vec<OptionItem>),
    /// Key into the caller-supplied [`DynamicOptions`] map.
    Dynamic(&'static str),
}

/// Runtime-supplied option lists, keyed by the `Dynamic` source key.
#[derive(Debug, Default, Clone)]
pub struct DynamicOptions {
    map: HashMap<String, Vec<OptionItem>>,
}

impl DynamicOptions {
    pub fn insert(&mut self, key: impl Into<String>, options: Vec<OptionItem>) {
        self.map.insert(key.into(), options);
    }

    pub fn get(&self, key: &str) -> &[OptionItem] {
        self.map.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

/// Per-key "fetch in flight" flags, caller-owned.
#[derive(Debug, Default, Clone)]
pub struct LoadingStates {
    map: HashMap<String, bool>,
}

impl LoadingStates {
    pub fn set(&mut self, key: impl Into<String>, loading: bool) {
        self.map.insert(key.into(), loading);
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.map.get(key).copied().unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

/// Caller-owned cache of known practitioner specialties.
///
/// The combobox create flow appends to it so later forms offer the new entry
/// without a refetch; `invalidate` marks it stale so the next full fetch
/// repopulates it from the server.
#[derive(Debug, Default, Clone)]
pub struct SpecialtyCache {
    entries: Vec<String>,
    stale: bool,
}

impl SpecialtyCache {
    /// Replace the cache contents with a freshly fetched list.
    pub fn prime(&mut self, entries: Vec<String>) {
        self.entries = entries;
        self.stale = false;
    }

    /// Append a locally created entry, keeping alphabetical order. Adding a
    /// value already present (case-insensitively) is a no-op.
    pub fn add(&mut self, value: impl Into<String>) {
        let value = value.into();
        let value = value.trim().to_string();
        if value.is_empty() {
            return;
        }
        if self
            .entries
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&value))
        {
            return;
        }
        let at = self
            .entries
            .iter()
            .position(|e| e.to_lowercase() > value.to_lowercase())
            .unwrap_or(self.entries.len());
        self.entries.insert(at, value);
    }

    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// True when the cache has never been primed or was invalidated.
    pub fn needs_fetch(&self) -> bool {
        self.stale || self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn options(&self) -> Vec<OptionItem> {
        self.entries.iter().map(OptionItem::plain).collect()
    }
}

/// Result of filtering an option list for display.
#[derive(Debug)]
pub struct OptionFilter<'a> {
    /// The capped slice of matches actually rendered.
    pub visible: Vec<&'a OptionItem>,
    /// Matches across the *full* list, before capping.
    pub total_matches: usize,
}

impl OptionFilter<'_> {
    /// How many matches were cut off by the cap.
    pub fn truncated(&self) -> usize {
        self.total_matches.saturating_sub(self.visible.len())
    }
}

/// Case-insensitive substring filter over the full list; the rendered subset
/// is capped at `cap` while matching itself is uncapped, so a query can
/// always reach the tail of a long list.
pub fn filter_options<'a>(options: &'a [OptionItem], query: &str, cap: usize) -> OptionFilter<'a> {
    let needle = query.trim().to_lowercase();
    let mut visible = Vec::new();
    let mut total = 0usize;
    for option in options {
        let hit = needle.is_empty() || option.search_text().to_lowercase().contains(&needle);
        if hit {
            total += 1;
            if visible.len() < cap {
                visible.push(option);
            }
        }
    }
    OptionFilter {
        visible,
        total_matches: total,
    }
}

/// Exact match of typed text against an option's label or value, used by the
/// combobox to treat exact entry as a selection.
pub fn find_exact<'a>(options: &'a [OptionItem], text: &str) -> Option<&'a OptionItem> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    options
        .iter()
        .find(|o| o.label.eq_ignore_ascii_case(text) || o.value.eq_ignore_ascii_case(text))
}

/// Display label for a stored value; `None` for unknown/stale values, which
/// render as empty rather than leaking the raw identifier.
pub fn label_for<'a>(options: &'a [OptionItem], value: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|o| o.value == value)
        .map(|o| o.label.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big_list(n: usize) -> Vec<OptionItem> {
        (0..n)
            .map(|i| OptionItem::new(format!("opt-{i:03}"), format!("Option {i:03}")))
            .collect()
    }

    #[test]
    fn visible_subset_never_exceeds_cap() {
        let options = big_list(140);
        let filtered = filter_options(&options, "", 50);
        assert_eq!(filtered.visible.len(), 50);
        assert_eq!(filtered.total_matches, 140);
        assert_eq!(filtered.truncated(), 90);
    }

    #[test]
    fn search_reaches_past_the_cap() {
        let options = big_list(140);
        let filtered = filter_options(&options, "139", 50);
        assert_eq!(filtered.visible.len(), 1);
        assert_eq!(filtered.visible[0].value, "opt-139");
    }

    #[test]
    fn search_is_case_insensitive_and_falls_back_to_value() {
        let options = vec![
            OptionItem::new("oral", "Oral"),
            OptionItem::new("topical", ""),
        ];
        assert_eq!(filter_options(&options, "ORAL", 10).total_matches, 1);
        assert_eq!(filter_options(&options, "topic", 10).total_matches, 1);
    }

    #[test]
    fn exact_match_hits_label_or_value() {
        let options = vec![OptionItem::new("prac-001", "Dr. Amara Okafor")];
        assert!(find_exact(&options, "dr. amara okafor").is_some());
        assert!(find_exact(&options, "PRAC-001").is_some());
        assert!(find_exact(&options, "Dr. Amara").is_none());
        assert!(find_exact(&options, "").is_none());
    }

    #[test]
    fn unknown_stored_value_has_no_label() {
        let options = vec![OptionItem::new("oral", "Oral")];
        assert_eq!(label_for(&options, "oral"), Some("Oral"));
        assert_eq!(label_for(&options, "retired-route"), None);
    }

    #[test]
    fn cache_add_is_sorted_and_idempotent() {
        let mut cache = SpecialtyCache::default();
        cache.prime(vec!["Cardiology".into(), "Neurology".into()]);
        assert!(!cache.needs_fetch());

        cache.add("Hepatology");
        cache.add("hepatology");
        assert_eq!(cache.entries(), &["Cardiology", "Hepatology", "Neurology"]);

        cache.invalidate();
        assert!(cache.needs_fetch());
    }
}
