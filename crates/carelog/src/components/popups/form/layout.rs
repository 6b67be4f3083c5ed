//! Row packing and responsive sizing hints.
//!
//! Fields are packed into rows with a greedy first-fit pass in authoring
//! order (never reordered, only grouped) so left-to-right authoring order
//! always maps to top-to-bottom, left-to-right placement on screen.

use ratatui::layout::Rect;

use super::field::{FieldDescriptor, FieldKind};

/// Spans are authored on this scale; narrower terminals shrink the budget,
/// which stacks fields without touching the authored spans.
pub const COLUMN_SCALE: u16 = 12;

/// Terminal width class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    Narrow,
    Medium,
    Wide,
}

impl Breakpoint {
    pub fn of(width: u16) -> Self {
        if width < 80 {
            Breakpoint::Narrow
        } else if width < 120 {
            Breakpoint::Medium
        } else {
            Breakpoint::Wide
        }
    }
}

/// Injectable resource-pressure signal. The renderer and layout consult it to
/// shrink option-list caps and drop cosmetic work; the thresholds are tuning
/// constants, not contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourcePressure {
    #[default]
    Normal,
    Degraded,
    Critical,
}

impl ResourcePressure {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "normal" => Some(ResourcePressure::Normal),
            "degraded" => Some(ResourcePressure::Degraded),
            "critical" => Some(ResourcePressure::Critical),
            _ => None,
        }
    }
}

/// Visible dropdown cap under the given pressure.
pub fn option_cap(pressure: ResourcePressure) -> usize {
    match pressure {
        ResourcePressure::Normal => 50,
        ResourcePressure::Degraded => 25,
        ResourcePressure::Critical => 10,
    }
}

/// Columns available per row for the given width class and form size. Short
/// forms on a medium terminal get a tighter budget so two-up fields do not
/// stretch; narrow terminals stack nearly everything.
pub fn column_budget(breakpoint: Breakpoint, field_count: usize) -> u16 {
    match breakpoint {
        Breakpoint::Wide => COLUMN_SCALE,
        Breakpoint::Medium => {
            if field_count <= 4 {
                6
            } else {
                8
            }
        }
        Breakpoint::Narrow => 4,
    }
}

/// One field's place in a packed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSlot {
    /// Index into the original field list.
    pub index: usize,
    pub span: u16,
}

/// An ordered run of fields sharing one visual row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutRow {
    pub slots: Vec<RowSlot>,
}

impl LayoutRow {
    pub fn span_sum(&self) -> u16 {
        self.slots.iter().map(|s| s.span).sum()
    }
}

/// Greedy first-fit packing. Close the current row when the next field's
/// span would overflow the budget; a single field wider than the budget
/// still gets its own row (spans are never split). Dividers are packed at
/// full-row span rather than filtered, so they become natural row breaks.
pub fn pack_rows(fields: &[FieldDescriptor], budget: u16) -> Vec<LayoutRow> {
    let budget = budget.max(1);
    let mut rows: Vec<LayoutRow> = Vec::new();
    let mut current = LayoutRow::default();
    let mut used: u16 = 0;

    for (index, field) in fields.iter().enumerate() {
        let span = if matches!(field.kind, FieldKind::Divider) {
            budget
        } else {
            field.resolved_span().max(1)
        };

        if !current.slots.is_empty() && used + span > budget {
            rows.push(std::mem::take(&mut current));
            used = 0;
        }
        current.slots.push(RowSlot { index, span });
        used += span;
    }
    if !current.slots.is_empty() {
        rows.push(current);
    }
    rows
}

/// Dialog size class, a pure rendering hint for the modal shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalSize {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

impl ModalSize {
    pub fn classify(breakpoint: Breakpoint, field_count: usize) -> Self {
        if breakpoint == Breakpoint::Narrow {
            return ModalSize::ExtraLarge;
        }
        match field_count {
            0..=4 => ModalSize::Small,
            5..=8 => ModalSize::Medium,
            9..=12 => ModalSize::Large,
            _ => ModalSize::ExtraLarge,
        }
    }

    /// Target (width, height) in cells, clamped to the available area by the
    /// shell when drawing.
    pub fn target(self, area: Rect) -> (u16, u16) {
        match self {
            ModalSize::Small => (56, 16),
            ModalSize::Medium => (76, 22),
            ModalSize::Large => (92, 28),
            ModalSize::ExtraLarge => (
                area.width.saturating_mul(9) / 10,
                area.height.saturating_mul(9) / 10,
            ),
        }
    }
}

/// Vertical breathing room between rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spacing {
    Compact,
    Cozy,
    Comfortable,
}

impl Spacing {
    pub fn of(breakpoint: Breakpoint, field_count: usize, pressure: ResourcePressure) -> Self {
        if pressure == ResourcePressure::Critical || breakpoint == Breakpoint::Narrow {
            return Spacing::Compact;
        }
        if field_count <= 6 && breakpoint == Breakpoint::Wide {
            Spacing::Comfortable
        } else {
            Spacing::Cozy
        }
    }

    /// Blank lines between rows.
    pub fn row_gap(self) -> u16 {
        match self {
            Spacing::Compact => 0,
            Spacing::Cozy => 0,
            Spacing::Comfortable => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(name: &str, span: u16) -> FieldDescriptor {
        FieldDescriptor::new(name, name.to_uppercase(), FieldKind::Text).span(span)
    }

    #[test]
    fn greedy_packing_matches_the_reference_scenario() {
        // a=8 alone (8+6 would overflow), then b=6 and c=4 share a row.
        let fields = vec![f("a", 8), f("b", 6), f("c", 4)];
        let rows = pack_rows(&fields, 12);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].slots.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![0]
        );
        assert_eq!(
            rows[1].slots.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(rows[1].span_sum(), 10);
    }

    #[test]
    fn no_row_exceeds_the_budget_unless_a_single_field_does() {
        let fields = vec![f("a", 5), f("b", 5), f("c", 5), f("d", 14), f("e", 3)];
        let rows = pack_rows(&fields, 12);
        for row in &rows {
            if row.slots.len() > 1 {
                assert!(row.span_sum() <= 12, "multi-slot row overflows: {row:?}");
            }
        }
        // The oversize field sits alone.
        let oversize_row = rows
            .iter()
            .find(|r| r.slots.iter().any(|s| s.index == 3))
            .unwrap();
        assert_eq!(oversize_row.slots.len(), 1);
    }

    #[test]
    fn order_is_preserved_across_rows() {
        let fields = vec![f("a", 7), f("b", 7), f("c", 7)];
        let rows = pack_rows(&fields, 12);
        let flattened: Vec<usize> = rows
            .iter()
            .flat_map(|r| r.slots.iter().map(|s| s.index))
            .collect();
        assert_eq!(flattened, vec![0, 1, 2]);
    }

    #[test]
    fn dividers_occupy_a_full_row() {
        let fields = vec![
            f("a", 4),
            FieldDescriptor::divider("Schedule"),
            f("b", 4),
        ];
        let rows = pack_rows(&fields, 12);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].slots.len(), 1);
        assert_eq!(rows[1].span_sum(), 12);
    }

    #[test]
    fn narrow_budget_stacks_default_spans() {
        let fields = vec![
            FieldDescriptor::new("a", "A", FieldKind::Text),
            FieldDescriptor::new("b", "B", FieldKind::Text),
        ];
        let rows = pack_rows(&fields, column_budget(Breakpoint::of(60), fields.len()));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn pressure_shrinks_the_option_cap() {
        assert!(option_cap(ResourcePressure::Degraded) < option_cap(ResourcePressure::Normal));
        assert!(option_cap(ResourcePressure::Critical) < option_cap(ResourcePressure::Degraded));
    }

    #[test]
    fn breakpoints_and_modal_sizes_scale_with_width_and_count() {
        assert_eq!(Breakpoint::of(70), Breakpoint::Narrow);
        assert_eq!(Breakpoint::of(100), Breakpoint::Medium);
        assert_eq!(Breakpoint::of(160), Breakpoint::Wide);
        assert_eq!(ModalSize::classify(Breakpoint::Wide, 3), ModalSize::Small);
        assert_eq!(ModalSize::classify(Breakpoint::Wide, 11), ModalSize::Large);
        assert_eq!(
            ModalSize::classify(Breakpoint::Narrow, 3),
            ModalSize::ExtraLarge
        );
    }
}
