//! Per-entity field configuration tables.
//!
//! Pure data: each entity kind maps to an ordered, immutable list of
//! descriptors. No computation happens here beyond assembling the builders.
//! Requesting an unknown entity degrades to an empty list so callers render
//! "no fields" instead of crashing.

use std::str::FromStr;

use records::EntityKind;
use tracing::warn;

use super::date::DateBound;
use super::field::{FieldDescriptor, FieldKind};
use super::options::{OptionItem, OptionsSource};
use super::state::FormState;
use crate::theme::Accent;

/// Keys into the caller-supplied dynamic options map.
pub const DYN_PRACTITIONERS: &str = "practitioners";
pub const DYN_PHARMACIES: &str = "pharmacies";
pub const DYN_SPECIALTIES: &str = "specialties";

/// Derived visual state for the submit control, computed from live values.
pub type AccentRule = fn(&FormState) -> Accent;

fn options(pairs: &[(&str, &str)]) -> OptionsSource {
    OptionsSource::Static(
        pairs
            .iter()
            .map(|(value, label)| OptionItem::new(*value, *label))
            .collect(),
    )
}

/// Ordered field list for one entity kind.
pub fn fields_for(entity: EntityKind) -> Vec<FieldDescriptor> {
    match entity {
        EntityKind::Medication => medication_fields(),
        EntityKind::LabResult => lab_result_fields(),
        EntityKind::Condition => condition_fields(),
        EntityKind::VitalSign => vital_sign_fields(),
        EntityKind::Visit => visit_fields(),
        EntityKind::Allergy => allergy_fields(),
        EntityKind::Insurance => insurance_fields(),
        EntityKind::Practitioner => practitioner_fields(),
    }
}

/// String entry point used by the CLI. An unknown entity tag is a
/// configuration error: warn and degrade to an empty list.
pub fn fields_for_tag(tag: &str) -> Vec<FieldDescriptor> {
    match EntityKind::from_str(tag) {
        Ok(entity) => fields_for(entity),
        Err(_) => {
            warn!(entity = tag, "unknown entity kind requested; returning no fields");
            Vec::new()
        }
    }
}

/// Accent rule attached to an entity's form, if any.
pub fn accent_rule_for(entity: EntityKind) -> Option<AccentRule> {
    match entity {
        EntityKind::Allergy => Some(allergy_accent),
        EntityKind::LabResult => Some(lab_result_accent),
        _ => None,
    }
}

fn allergy_accent(state: &FormState) -> Accent {
    match state.text("severity") {
        "life_threatening" => Accent::Critical,
        "severe" => Accent::Caution,
        _ => Accent::Default,
    }
}

fn lab_result_accent(state: &FormState) -> Accent {
    match state.text("flag") {
        "critical" => Accent::Critical,
        "abnormal" => Accent::Caution,
        _ => Accent::Default,
    }
}

fn medication_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("name", "Medication", FieldKind::Text)
            .required()
            .max_len(120)
            .placeholder("e.g. Metformin"),
        FieldDescriptor::new("strength", "Strength", FieldKind::Text)
            .placeholder("e.g. 500 mg")
            .span(4),
        FieldDescriptor::new(
            "route",
            "Route",
            FieldKind::select(options(&[
                ("oral", "Oral"),
                ("topical", "Topical"),
                ("injection", "Injection"),
                ("inhalation", "Inhalation"),
                ("other", "Other"),
            ])),
        )
        .span(4),
        FieldDescriptor::new(
            "frequency",
            "Frequency",
            FieldKind::Autocomplete {
                source: options(&[
                    ("once_daily", "Once daily"),
                    ("twice_daily", "Twice daily"),
                    ("three_times_daily", "Three times daily"),
                    ("every_other_day", "Every other day"),
                    ("weekly", "Weekly"),
                    ("as_needed", "As needed"),
                ]),
            },
        )
        .description("Pick a common schedule or type your own"),
        FieldDescriptor::new(
            "prescriber",
            "Prescriber",
            FieldKind::Select {
                source: OptionsSource::Dynamic(DYN_PRACTITIONERS),
            },
        ),
        FieldDescriptor::new(
            "pharmacy",
            "Pharmacy",
            FieldKind::Select {
                source: OptionsSource::Dynamic(DYN_PHARMACIES),
            },
        ),
        FieldDescriptor::new("effectiveness", "Effectiveness", FieldKind::Rating)
            .description("How well this medication works for you"),
        FieldDescriptor::divider("Schedule"),
        FieldDescriptor::new("start_date", "Start date", FieldKind::Date)
            .max_date(DateBound::Today),
        FieldDescriptor::new("end_date", "End date", FieldKind::Date)
            .description("Leave empty while still taking it"),
        FieldDescriptor::new("active", "Currently taking", FieldKind::Checkbox),
        FieldDescriptor::new("tags", "Tags", FieldKind::tags())
            .description("Free-form labels, e.g. diabetes, morning"),
        FieldDescriptor::new("notes", "Notes", FieldKind::textarea()).max_len(2000),
    ]
}

fn lab_result_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("test_name", "Test", FieldKind::Text)
            .required()
            .placeholder("e.g. HbA1c"),
        FieldDescriptor::new("value", "Result", FieldKind::Number).required(),
        FieldDescriptor::new("unit", "Unit", FieldKind::Text)
            .placeholder("e.g. mmol/L")
            .span(4),
        FieldDescriptor::new(
            "flag",
            "Flag",
            FieldKind::select(options(&[
                ("normal", "Normal"),
                ("borderline", "Borderline"),
                ("abnormal", "Abnormal"),
                ("critical", "Critical"),
            ])),
        )
        .span(4),
        FieldDescriptor::new("collected_date", "Collected", FieldKind::Date)
            .max_date(DateBound::Today),
        FieldDescriptor::new(
            "ordered_by",
            "Ordered by",
            FieldKind::Select {
                source: OptionsSource::Dynamic(DYN_PRACTITIONERS),
            },
        ),
        FieldDescriptor::new("notes", "Notes", FieldKind::textarea()),
    ]
}

fn condition_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("name", "Condition", FieldKind::Text)
            .required()
            .placeholder("e.g. Hypertension"),
        FieldDescriptor::new(
            "status",
            "Status",
            FieldKind::select(options(&[
                ("active", "Active"),
                ("remission", "In remission"),
                ("resolved", "Resolved"),
            ])),
        )
        .span(4),
        FieldDescriptor::new(
            "severity",
            "Severity",
            FieldKind::select(options(&[
                ("mild", "Mild"),
                ("moderate", "Moderate"),
                ("severe", "Severe"),
            ])),
        )
        .span(4),
        FieldDescriptor::new("onset_date", "Onset", FieldKind::Date).max_date(DateBound::Today),
        FieldDescriptor::new("end_date", "Resolved on", FieldKind::Date)
            .description("Only for resolved conditions"),
        FieldDescriptor::new("notes", "Notes", FieldKind::textarea()),
    ]
}

fn vital_sign_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new(
            "kind",
            "Measurement",
            FieldKind::select(options(&[
                ("blood_pressure", "Blood pressure"),
                ("heart_rate", "Heart rate"),
                ("temperature", "Temperature"),
                ("weight", "Weight"),
                ("height", "Height"),
                ("glucose", "Blood glucose"),
                ("spo2", "Oxygen saturation"),
            ])),
        )
        .required(),
        FieldDescriptor::new("value", "Value", FieldKind::Number).required(),
        FieldDescriptor::new("unit", "Unit", FieldKind::Text).span(4),
        FieldDescriptor::new("measured_date", "Measured", FieldKind::Date)
            .max_date(DateBound::Today),
        FieldDescriptor::new("notes", "Notes", FieldKind::textarea()),
    ]
}

fn visit_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("reason", "Reason", FieldKind::Text)
            .required()
            .placeholder("e.g. Annual physical"),
        FieldDescriptor::new(
            "visit_type",
            "Type",
            FieldKind::select(options(&[
                ("checkup", "Check-up"),
                ("urgent", "Urgent care"),
                ("specialist", "Specialist"),
                ("telehealth", "Telehealth"),
                ("emergency", "Emergency"),
            ])),
        )
        .span(4),
        FieldDescriptor::new(
            "practitioner",
            "Seen by",
            FieldKind::Select {
                source: OptionsSource::Dynamic(DYN_PRACTITIONERS),
            },
        ),
        FieldDescriptor::new("visit_date", "Visit date", FieldKind::Date)
            .max_date(DateBound::Today)
            .required(),
        FieldDescriptor::new("follow_up_date", "Follow-up", FieldKind::Date)
            .description("Next appointment, if scheduled"),
        FieldDescriptor::new("satisfaction", "Satisfaction", FieldKind::Rating),
        FieldDescriptor::new("summary", "Summary", FieldKind::textarea()).max_len(4000),
    ]
}

fn allergy_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("allergen", "Allergen", FieldKind::Text)
            .required()
            .placeholder("e.g. Penicillin"),
        FieldDescriptor::new(
            "severity",
            "Severity",
            FieldKind::select(options(&[
                ("mild", "Mild"),
                ("moderate", "Moderate"),
                ("severe", "Severe"),
                ("life_threatening", "Life-threatening"),
            ])),
        )
        .required(),
        FieldDescriptor::new("reaction", "Reaction", FieldKind::Text)
            .placeholder("e.g. hives, swelling"),
        FieldDescriptor::new("onset_date", "First observed", FieldKind::Date)
            .max_date(DateBound::Today),
        FieldDescriptor::new("triggers", "Triggers", FieldKind::tags())
            .description("Situations or substances that set it off"),
        FieldDescriptor::new("notes", "Notes", FieldKind::textarea()),
    ]
}

/// The insurance form is authored as a plain tag table, the shape extra
/// fields take when they arrive from configuration rather than code. The
/// assembler warns and skips anything it does not recognize.
const INSURANCE_FIELD_TAGS: &[(&str, &str, &str)] = &[
    ("provider", "Provider", "text"),
    ("plan_name", "Plan name", "text"),
    ("member_id", "Member ID", "text"),
    ("group_number", "Group number", "text"),
    ("support_phone", "Support phone", "tel"),
    ("divider_coverage", "Coverage", "divider"),
    ("coverage_start_date", "Coverage start", "date"),
    ("coverage_end_date", "Coverage end", "date"),
    ("is_primary", "Primary plan", "checkbox"),
    ("notes", "Notes", "textarea"),
];

fn insurance_fields() -> Vec<FieldDescriptor> {
    descriptors_from_tag_table(INSURANCE_FIELD_TAGS)
}

/// Assemble descriptors from `(name, label, kind-tag)` triples, skipping
/// unknown tags with a warning. Configuration data evolves independently of
/// the renderer; a bad row must cost one field, not the whole form.
pub fn descriptors_from_tag_table(rows: &[(&str, &str, &str)]) -> Vec<FieldDescriptor> {
    rows.iter()
        .filter_map(|(name, label, tag)| match FieldKind::parse_tag(tag) {
            Some(kind) => Some(FieldDescriptor::new(*name, *label, kind)),
            None => {
                warn!(field = name, kind = tag, "unknown field kind tag; skipping field");
                None
            }
        })
        .collect()
}

fn practitioner_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("name", "Name", FieldKind::Text)
            .required()
            .placeholder("e.g. Dr. Jane Doe"),
        FieldDescriptor::new(
            "specialty",
            "Specialty",
            FieldKind::Combobox {
                source: OptionsSource::Dynamic(DYN_SPECIALTIES),
            },
        )
        .description("Pick one or type a new specialty"),
        FieldDescriptor::new("rating", "Care rating", FieldKind::Rating),
        FieldDescriptor::divider("Contact"),
        FieldDescriptor::new("phone", "Phone", FieldKind::Tel),
        FieldDescriptor::new("email", "Email", FieldKind::Email),
        FieldDescriptor::new("website", "Website", FieldKind::Url),
        FieldDescriptor::new("address", "Address", FieldKind::textarea()),
        FieldDescriptor::new("accepting_new", "Accepting new patients", FieldKind::Checkbox),
    ]
}
