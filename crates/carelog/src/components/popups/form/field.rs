//! Field descriptors: the declarative configuration one form field is built
//! from.
//!
//! `FieldKind` is a closed enum; the renderer and the key handler match on it
//! exhaustively, so adding a kind without a handler is a compile error. The
//! only place an *unknown* kind can appear is the string-tag parser used for
//! configuration-driven field tables, and that path degrades (warn + skip)
//! instead of failing.

use super::date::DateBound;
use super::options::OptionsSource;

/// Default upper bound on tag-input entries.
pub const TAG_LIMIT_DEFAULT: usize = 15;

/// The closed set of field kinds the form system renders.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Url,
    TextArea { min_rows: u16, max_rows: u16 },
    Select { source: OptionsSource },
    Autocomplete { source: OptionsSource },
    Combobox { source: OptionsSource },
    Number,
    Date,
    Rating,
    Checkbox,
    Divider,
    Tags { max: usize },
}

impl FieldKind {
    pub fn textarea() -> Self {
        FieldKind::TextArea {
            min_rows: 2,
            max_rows: 5,
        }
    }

    pub fn tags() -> Self {
        FieldKind::Tags {
            max: TAG_LIMIT_DEFAULT,
        }
    }

    pub fn select(source: OptionsSource) -> Self {
        FieldKind::Select { source }
    }

    /// Parse a configuration tag. Only scalar kinds are expressible as bare
    /// tags; option-carrying kinds need their source and are authored in
    /// code. Unknown tags return `None`; the caller decides how to degrade.
    pub fn parse_tag(tag: &str) -> Option<FieldKind> {
        match tag {
            "text" => Some(FieldKind::Text),
            "email" => Some(FieldKind::Email),
            "tel" => Some(FieldKind::Tel),
            "url" => Some(FieldKind::Url),
            "textarea" => Some(FieldKind::textarea()),
            "number" => Some(FieldKind::Number),
            "date" => Some(FieldKind::Date),
            "rating" => Some(FieldKind::Rating),
            "checkbox" => Some(FieldKind::Checkbox),
            "divider" => Some(FieldKind::Divider),
            "custom" | "tags" => Some(FieldKind::tags()),
            _ => None,
        }
    }

    /// Stable tag for display and diagnostics; the inverse of `parse_tag`
    /// for the scalar kinds.
    pub fn tag(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Tel => "tel",
            FieldKind::Url => "url",
            FieldKind::TextArea { .. } => "textarea",
            FieldKind::Select { .. } => "select",
            FieldKind::Autocomplete { .. } => "autocomplete",
            FieldKind::Combobox { .. } => "combobox",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Rating => "rating",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Divider => "divider",
            FieldKind::Tags { .. } => "tags",
        }
    }

    /// True for kinds edited through the single-line text editor.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldKind::Text
                | FieldKind::Email
                | FieldKind::Tel
                | FieldKind::Url
                | FieldKind::TextArea { .. }
                | FieldKind::Number
                | FieldKind::Date
        )
    }

    /// True for kinds that open a dropdown list.
    pub fn uses_dropdown(&self) -> bool {
        matches!(
            self,
            FieldKind::Select { .. } | FieldKind::Autocomplete { .. } | FieldKind::Combobox { .. }
        )
    }

    /// Dividers are layout-only and skipped by focus traversal.
    pub fn is_interactive(&self) -> bool {
        !matches!(self, FieldKind::Divider)
    }

    pub fn options_source(&self) -> Option<&OptionsSource> {
        match self {
            FieldKind::Select { source }
            | FieldKind::Autocomplete { source }
            | FieldKind::Combobox { source } => Some(source),
            _ => None,
        }
    }

    /// Key into the dynamic-options map, when this kind draws on one.
    pub fn dynamic_key(&self) -> Option<&'static str> {
        match self.options_source() {
            Some(OptionsSource::Dynamic(key)) => Some(key),
            _ => None,
        }
    }

    /// Layout span on the 12-unit scale when the field does not set one.
    pub fn default_span(&self) -> u16 {
        match self {
            FieldKind::TextArea { .. } | FieldKind::Divider | FieldKind::Tags { .. } => 12,
            FieldKind::Text
            | FieldKind::Email
            | FieldKind::Url
            | FieldKind::Select { .. }
            | FieldKind::Autocomplete { .. }
            | FieldKind::Combobox { .. }
            | FieldKind::Date => 6,
            FieldKind::Tel | FieldKind::Number | FieldKind::Rating | FieldKind::Checkbox => 4,
        }
    }
}

/// Declarative description of one form field.
///
/// Constraints (`required`, lengths, numeric bounds) are rendered as hints;
/// validation itself happens in the caller, which passes resulting messages
/// back in as per-field errors.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub placeholder: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub grid_column: Option<u16>,
    pub min_date: Option<DateBound>,
    pub max_date: Option<DateBound>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            placeholder: None,
            description: None,
            required: false,
            min_len: None,
            max_len: None,
            min: None,
            max: None,
            grid_column: None,
            min_date: None,
            max_date: None,
        }
    }

    /// Shorthand for a divider row with a section heading.
    pub fn divider(label: impl Into<String>) -> Self {
        let label = label.into();
        Self::new(format!("divider_{}", label.to_lowercase().replace(' ', "_")), label, FieldKind::Divider)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn min_len(mut self, n: usize) -> Self {
        self.min_len = Some(n);
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        self.max_len = Some(n);
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn span(mut self, columns: u16) -> Self {
        self.grid_column = Some(columns);
        self
    }

    pub fn min_date(mut self, bound: DateBound) -> Self {
        self.min_date = Some(bound);
        self
    }

    pub fn max_date(mut self, bound: DateBound) -> Self {
        self.max_date = Some(bound);
        self
    }

    /// Span actually used by the packer: the explicit `grid_column` when set,
    /// the kind default otherwise. Not clamped: an oversize span is the
    /// packer's signal to give the field its own row.
    pub fn resolved_span(&self) -> u16 {
        self.grid_column.unwrap_or_else(|| self.kind.default_span())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scalar_tag_parses() {
        for tag in [
            "text", "email", "tel", "url", "textarea", "number", "date", "rating", "checkbox",
            "divider", "custom", "tags",
        ] {
            assert!(FieldKind::parse_tag(tag).is_some(), "tag {tag:?}");
        }
    }

    #[test]
    fn unknown_tag_is_none_not_a_panic() {
        assert!(FieldKind::parse_tag("hologram").is_none());
        assert!(FieldKind::parse_tag("").is_none());
        // Option-carrying kinds are deliberately not tag-expressible.
        assert!(FieldKind::parse_tag("select").is_none());
        assert!(FieldKind::parse_tag("combobox").is_none());
    }

    #[test]
    fn explicit_span_beats_kind_default() {
        let field = FieldDescriptor::new("dose", "Dose", FieldKind::Number);
        assert_eq!(field.resolved_span(), 4);
        let field = field.span(8);
        assert_eq!(field.resolved_span(), 8);
    }

    #[test]
    fn dividers_are_not_interactive() {
        assert!(!FieldKind::Divider.is_interactive());
        assert!(FieldKind::Checkbox.is_interactive());
    }
}
