//! Domain boundary for the Carelog terminal client.
//!
//! This crate owns the closed set of record types a patient can manage
//! (`EntityKind`), the asynchronous API contract the UI talks to
//! (`RecordsApi`), and an in-memory implementation (`LocalApi`) used by the
//! binary and by tests. The real REST transport lives behind the same trait
//! and is out of scope here.

mod api;

pub use api::{ApiError, LocalApi, OptionRow, RecordsApi};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The closed set of patient-record types the client can create and edit.
///
/// The string form (`Display`/`EnumString`, snake_case) is the CLI and wire
/// identifier; `display_name` is the human label used in titles and submit
/// buttons.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Medication,
    LabResult,
    Condition,
    VitalSign,
    Visit,
    Allergy,
    Insurance,
    Practitioner,
}

impl EntityKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Medication => "Medication",
            EntityKind::LabResult => "Lab Result",
            EntityKind::Condition => "Condition",
            EntityKind::VitalSign => "Vital Sign",
            EntityKind::Visit => "Visit",
            EntityKind::Allergy => "Allergy",
            EntityKind::Insurance => "Insurance",
            EntityKind::Practitioner => "Practitioner",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn kind_round_trips_through_snake_case() {
        for kind in EntityKind::iter() {
            let tag = kind.to_string();
            assert_eq!(EntityKind::from_str(&tag).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_tag_is_an_error_not_a_panic() {
        assert!(EntityKind::from_str("horoscope").is_err());
    }
}
