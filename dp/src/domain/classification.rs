//! Classification result and request hint types

use serde::{Deserialize, Serialize};

use super::task_type::{Specialist, TaskType};

/// Outcome of classifying one query
///
/// Serialized with camelCase field names so the JSON shape matches what
/// downstream consumers already key off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskClassificationResult {
    /// Chosen task type (exactly one per classification)
    pub task_type: TaskType,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Methodology to apply, if the task type has one
    pub suggested_methodology: Option<String>,

    /// Data sources the context provider should gather
    pub required_sources: Vec<String>,
}

impl TaskClassificationResult {
    /// Build a result for a task type, filling methodology and sources from the catalog
    ///
    /// Confidence is clamped to [0, 1]; NaN becomes 0.
    pub fn for_type(task_type: TaskType, confidence: f64) -> Self {
        Self {
            task_type,
            confidence: clamp_confidence(confidence),
            suggested_methodology: task_type.suggested_methodology(),
            required_sources: task_type.required_sources().iter().map(|s| s.to_string()).collect(),
        }
    }

    /// The low-confidence catch-all used whenever the oracle cannot answer
    pub fn fallback() -> Self {
        Self::for_type(TaskType::Custom, FALLBACK_CONFIDENCE)
    }
}

/// Confidence assigned to the catch-all fallback
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Clamp a confidence value into [0, 1]
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Optional caller context accompanying a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextHint {
    /// Customer or portfolio entity the request is about
    pub entity_id: Option<String>,

    /// Specialist currently active in the conversation
    pub specialist_hint: Option<Specialist>,
}

impl ContextHint {
    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_specialist(mut self, specialist: Specialist) -> Self {
        self.specialist_hint = Some(specialist);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_type_clamps() {
        assert_eq!(TaskClassificationResult::for_type(TaskType::SavePlay, 1.7).confidence, 1.0);
        assert_eq!(TaskClassificationResult::for_type(TaskType::SavePlay, -0.2).confidence, 0.0);
        assert_eq!(TaskClassificationResult::for_type(TaskType::SavePlay, f64::NAN).confidence, 0.0);
    }

    #[test]
    fn test_fallback_shape() {
        let result = TaskClassificationResult::fallback();
        assert_eq!(result.task_type, TaskType::Custom);
        assert_eq!(result.confidence, 0.3);
        assert!(result.suggested_methodology.is_none());
        assert_eq!(result.required_sources, vec!["knowledge_base", "customer_360"]);
    }

    #[test]
    fn test_json_shape() {
        let result = TaskClassificationResult::for_type(TaskType::RenewalForecast, 0.95);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["taskType"], "renewal_forecast");
        assert_eq!(json["suggestedMethodology"], "renewal_forecast_methodology");
        assert!(json["requiredSources"].is_array());

        let fallback = serde_json::to_value(TaskClassificationResult::fallback()).unwrap();
        assert!(fallback["suggestedMethodology"].is_null());
    }

    #[test]
    fn test_context_hint_builders() {
        let hint = ContextHint::default()
            .with_entity("acme")
            .with_specialist(Specialist::Risk);
        assert_eq!(hint.entity_id.as_deref(), Some("acme"));
        assert_eq!(hint.specialist_hint, Some(Specialist::Risk));
    }
}
