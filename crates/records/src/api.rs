use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::EntityKind;

/// One selectable entry in a server-populated list (practitioners,
/// pharmacies, specialties). `value` is the stable identifier stored in a
/// record; `label` is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRow {
    pub value: String,
    pub label: String,
}

impl OptionRow {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("record payload must be a JSON object")]
    InvalidPayload,
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Asynchronous boundary to the records backend.
///
/// Each list fetch is independent and unordered relative to the others; the
/// UI may issue them concurrently and must tolerate any completion order.
pub trait RecordsApi: Send + Sync {
    fn practitioners(&self) -> impl std::future::Future<Output = Result<Vec<OptionRow>, ApiError>> + Send;
    fn pharmacies(&self) -> impl std::future::Future<Output = Result<Vec<OptionRow>, ApiError>> + Send;
    fn specialties(&self) -> impl std::future::Future<Output = Result<Vec<String>, ApiError>> + Send;
    fn save(
        &self,
        entity: EntityKind,
        payload: Value,
    ) -> impl std::future::Future<Output = Result<(), ApiError>> + Send;
}

/// In-memory implementation backing the demo binary and the test suite.
///
/// A small artificial latency keeps the UI's loading states observable.
pub struct LocalApi {
    latency: Duration,
    saved: Mutex<Vec<(EntityKind, Value)>>,
}

impl Default for LocalApi {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(120),
            saved: Mutex::new(Vec::new()),
        }
    }
}

impl LocalApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-latency variant for tests.
    pub fn instant() -> Self {
        Self {
            latency: Duration::ZERO,
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn saved_count(&self) -> usize {
        self.saved.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn saved_for(&self, entity: EntityKind) -> Vec<Value> {
        self.saved
            .lock()
            .map(|s| {
                s.iter()
                    .filter(|(k, _)| *k == entity)
                    .map(|(_, v)| v.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn simulate_roundtrip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl RecordsApi for LocalApi {
    async fn practitioners(&self) -> Result<Vec<OptionRow>, ApiError> {
        self.simulate_roundtrip().await;
        Ok(vec![
            OptionRow::new("prac-001", "Dr. Amara Okafor"),
            OptionRow::new("prac-002", "Dr. Benjamin Hale"),
            OptionRow::new("prac-003", "Dr. Carmen Delgado"),
            OptionRow::new("prac-004", "Dr. Dana Whitfield"),
            OptionRow::new("prac-005", "Dr. Elias Brandt"),
            OptionRow::new("prac-006", "Dr. Farah Nasser"),
            OptionRow::new("prac-007", "Dr. Grace Lindqvist"),
            OptionRow::new("prac-008", "Dr. Henry Osei"),
            OptionRow::new("prac-009", "Dr. Ingrid Sommer"),
            OptionRow::new("prac-010", "Dr. Jonas Petrov"),
        ])
    }

    async fn pharmacies(&self) -> Result<Vec<OptionRow>, ApiError> {
        self.simulate_roundtrip().await;
        Ok(vec![
            OptionRow::new("pharm-01", "Corner Care Pharmacy"),
            OptionRow::new("pharm-02", "Greenleaf Apothecary"),
            OptionRow::new("pharm-03", "Harbor Health Pharmacy"),
            OptionRow::new("pharm-04", "Midtown Scripts"),
            OptionRow::new("pharm-05", "Northgate Pharmacy"),
            OptionRow::new("pharm-06", "Wellspring Drugstore"),
        ])
    }

    async fn specialties(&self) -> Result<Vec<String>, ApiError> {
        self.simulate_roundtrip().await;
        Ok([
            "Cardiology",
            "Dermatology",
            "Endocrinology",
            "Family Medicine",
            "Gastroenterology",
            "Internal Medicine",
            "Neurology",
            "Oncology",
            "Ophthalmology",
            "Orthopedics",
            "Pediatrics",
            "Psychiatry",
            "Pulmonology",
            "Rheumatology",
            "Urology",
        ]
        .into_iter()
        .map(String::from)
        .collect())
    }

    async fn save(&self, entity: EntityKind, payload: Value) -> Result<(), ApiError> {
        if !payload.is_object() {
            return Err(ApiError::InvalidPayload);
        }
        self.simulate_roundtrip().await;
        let mut saved = self
            .saved
            .lock()
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        debug!(entity = %entity, "record saved");
        saved.push((entity, payload));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn save_accepts_objects_only() {
        let api = LocalApi::instant();
        let err = api
            .save(EntityKind::Medication, json!("not an object"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidPayload));
        assert_eq!(api.saved_count(), 0);

        api.save(EntityKind::Medication, json!({"name": "Metformin"}))
            .await
            .unwrap();
        assert_eq!(api.saved_count(), 1);
        assert_eq!(api.saved_for(EntityKind::Medication).len(), 1);
    }

    #[tokio::test]
    async fn option_lists_are_non_empty_and_labelled() {
        let api = LocalApi::instant();
        let practitioners = api.practitioners().await.unwrap();
        assert!(!practitioners.is_empty());
        assert!(practitioners.iter().all(|p| !p.label.is_empty()));
        let specialties = api.specialties().await.unwrap();
        assert!(specialties.contains(&"Cardiology".to_string()));
    }
}
