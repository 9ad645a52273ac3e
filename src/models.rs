//! Core data model for the labeling pipeline.
//!
//! ## Types
//!
//! - [`LabelingTask`]: one immutable input item, owned by the caller
//! - [`LabelPrediction`]: one labeler attempt (label, confidence, reasoning, regions)
//! - [`CriticReview`]: one critic judgment of the latest prediction
//! - [`FallbackReason`]: why an item was escalated to human review
//! - [`LabelRecord`]: the caller-facing per-item result, validated or degraded
//! - [`HumanReviewItem`]: the durable escalation record persisted to the queue
//!
//! Confidence values are self-reported integers in 0–100, not calibrated
//! probabilities. Model output with a float or out-of-range confidence is
//! truncated and clamped on decode rather than rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Input modality of a labeling task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    #[default]
    Text,
    Image,
    Hybrid,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::Hybrid => "HYBRID",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Modality {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TEXT" => Ok(Self::Text),
            "IMAGE" => Ok(Self::Image),
            "HYBRID" => Ok(Self::Hybrid),
            _ => anyhow::bail!("Invalid modality '{}'. Valid values: TEXT, IMAGE, HYBRID", s),
        }
    }
}

/// One item to be labeled. Immutable once created; passed by value into a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelingTask {
    /// Unique identity per logical item.
    pub data_id: String,
    #[serde(default)]
    pub modality: Modality,
    /// Open string naming the labeling scheme (e.g. "sentiment", "ner").
    pub task_type: String,
    #[serde(default)]
    pub text_content: String,
    /// Reference to image content for IMAGE/HYBRID tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

/// Axis-aligned region with a label, for vision task types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub label: String,
}

/// Deserialize a confidence number, truncating fractions and clamping to
/// 0–100.
///
/// The upstream models occasionally report a float or an out-of-range
/// confidence; tolerating both keeps an otherwise-valid prediction
/// decodable, and `final_confidence` stays in [0,100] by construction.
fn de_confidence<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.clamp(0.0, 100.0) as u8)
}

/// One labeler attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPrediction {
    pub label: String,
    /// Self-reported certainty, 0–100.
    #[serde(deserialize_with = "de_confidence")]
    pub confidence: u8,
    pub reasoning: String,
    /// Labeled regions; empty for pure-text tasks.
    #[serde(default, rename = "bounding_boxes")]
    pub regions: Vec<BoundingBox>,
}

/// One critic judgment of the latest prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticReview {
    pub is_correct: bool,
    #[serde(deserialize_with = "de_confidence")]
    pub confidence_score: u8,
    pub critique: String,
}

impl CriticReview {
    /// The default-accept review used when the critic's output cannot be
    /// decoded after all local attempts. A transient critic failure never
    /// blocks throughput; the caller logs when this policy fires.
    pub fn default_accept() -> Self {
        Self {
            is_correct: true,
            confidence_score: 70,
            critique: "critic parse error - accepting label".to_string(),
        }
    }
}

/// Why an item was escalated to human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FallbackReason {
    /// Critique rejected the label on every attempt up to `max_retries`.
    RetryLimit,
    /// Final confidence fell below the configured floor.
    LowConfidence,
    /// The labeler's output could not be decoded after all local attempts.
    ParsingError,
    /// Legacy default: an internal fault reached fallback without a more
    /// specific reason.
    ValidationError,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RetryLimit => "RETRY_LIMIT",
            Self::LowConfidence => "LOW_CONFIDENCE",
            Self::ParsingError => "PARSING_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Compute the aggregated confidence: integer floor of the mean.
pub fn final_confidence(labeler: u8, critic: u8) -> u8 {
    ((labeler as u16 + critic as u16) / 2) as u8
}

/// The caller-facing per-item result.
///
/// Validated and degraded outcomes share this shape; a degraded record
/// carries `final_confidence = 0` and a `fallback_reason`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub data_id: String,
    pub label: String,
    /// The labeler's own confidence.
    pub confidence: u8,
    pub critic_confidence: u8,
    pub final_confidence: u8,
    pub retry_count: u32,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

impl LabelRecord {
    /// Whether this record was escalated to human review.
    pub fn is_escalated(&self) -> bool {
        self.fallback_reason.is_some()
    }

    /// Synthetic row for an item whose run failed outright (batch driver use).
    pub fn error(data_id: &str, reason: &str) -> Self {
        Self {
            data_id: data_id.to_string(),
            label: "ERROR".to_string(),
            confidence: 0,
            critic_confidence: 0,
            final_confidence: 0,
            retry_count: 0,
            reasoning: reason.to_string(),
            fallback_reason: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.label == "ERROR"
    }
}

/// The durable escalation record persisted to the review queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanReviewItem {
    pub data_id: String,
    /// The full original input, kept opaque so reviewers see exactly what
    /// the pipeline saw.
    pub original_input: serde_json::Value,
    /// Every labeler attempt, in order.
    pub labeler_attempts: Vec<LabelPrediction>,
    /// Every critic review, in order.
    pub critic_reviews: Vec<CriticReview>,
    /// Append-only diagnostics accumulated during the run.
    pub error_log: Vec<String>,
    pub fallback_reason: FallbackReason,
    /// UTC, serialized as RFC 3339.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_confidence_floors_the_mean() {
        assert_eq!(final_confidence(90, 60), 75);
        assert_eq!(final_confidence(85, 84), 84);
        assert_eq!(final_confidence(0, 0), 0);
        assert_eq!(final_confidence(100, 100), 100);
        assert_eq!(final_confidence(1, 0), 0);
    }

    #[test]
    fn fallback_reason_serializes_screaming_snake() {
        let json = serde_json::to_string(&FallbackReason::RetryLimit).unwrap();
        assert_eq!(json, "\"RETRY_LIMIT\"");
        let parsed: FallbackReason = serde_json::from_str("\"LOW_CONFIDENCE\"").unwrap();
        assert_eq!(parsed, FallbackReason::LowConfidence);
        assert_eq!(FallbackReason::ParsingError.to_string(), "PARSING_ERROR");
    }

    #[test]
    fn modality_round_trips_uppercase() {
        let json = serde_json::to_string(&Modality::Hybrid).unwrap();
        assert_eq!(json, "\"HYBRID\"");
        let parsed: Modality = serde_json::from_str("\"IMAGE\"").unwrap();
        assert_eq!(parsed, Modality::Image);
        assert_eq!("text".parse::<Modality>().unwrap(), Modality::Text);
        assert!("voice".parse::<Modality>().is_err());
    }

    #[test]
    fn prediction_deserializes_with_default_regions() {
        let pred: LabelPrediction =
            serde_json::from_str(r#"{"label":"POSITIVE","confidence":92,"reasoning":"upbeat"}"#)
                .unwrap();
        assert_eq!(pred.label, "POSITIVE");
        assert_eq!(pred.confidence, 92);
        assert!(pred.regions.is_empty());
    }

    #[test]
    fn prediction_clamps_overlarge_confidence() {
        let pred: LabelPrediction =
            serde_json::from_str(r#"{"label":"X","confidence":150,"reasoning":"sure"}"#).unwrap();
        assert_eq!(pred.confidence, 100);
    }

    #[test]
    fn prediction_truncates_float_confidence() {
        let pred: LabelPrediction =
            serde_json::from_str(r#"{"label":"X","confidence":92.0,"reasoning":"sure"}"#).unwrap();
        assert_eq!(pred.confidence, 92);

        let pred: LabelPrediction =
            serde_json::from_str(r#"{"label":"X","confidence":92.7,"reasoning":"sure"}"#).unwrap();
        assert_eq!(pred.confidence, 92);
    }

    #[test]
    fn prediction_clamps_negative_confidence_to_zero() {
        let pred: LabelPrediction =
            serde_json::from_str(r#"{"label":"X","confidence":-3,"reasoning":"?"}"#).unwrap();
        assert_eq!(pred.confidence, 0);
    }

    #[test]
    fn prediction_regions_use_bounding_boxes_field() {
        let json = r#"{
            "label": "PERSON",
            "confidence": 88,
            "reasoning": "one face",
            "bounding_boxes": [{"xmin": 0.1, "ymin": 0.2, "xmax": 0.5, "ymax": 0.9, "label": "face"}]
        }"#;
        let pred: LabelPrediction = serde_json::from_str(json).unwrap();
        assert_eq!(pred.regions.len(), 1);
        assert_eq!(pred.regions[0].label, "face");

        let back = serde_json::to_value(&pred).unwrap();
        assert!(back.get("bounding_boxes").is_some());
    }

    #[test]
    fn default_accept_review_is_the_documented_policy() {
        let review = CriticReview::default_accept();
        assert!(review.is_correct);
        assert_eq!(review.confidence_score, 70);
        assert!(review.critique.contains("accepting label"));
    }

    #[test]
    fn record_skips_absent_fallback_reason() {
        let record = LabelRecord {
            data_id: "a".into(),
            label: "POSITIVE".into(),
            confidence: 90,
            critic_confidence: 80,
            final_confidence: 85,
            retry_count: 0,
            reasoning: "ok".into(),
            fallback_reason: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("fallback_reason"));
        assert!(!record.is_escalated());

        let escalated = LabelRecord {
            fallback_reason: Some(FallbackReason::RetryLimit),
            ..record
        };
        let json = serde_json::to_string(&escalated).unwrap();
        assert!(json.contains("RETRY_LIMIT"));
        assert!(escalated.is_escalated());
    }

    #[test]
    fn error_record_shape() {
        let row = LabelRecord::error("42", "gateway unavailable");
        assert!(row.is_error());
        assert_eq!(row.final_confidence, 0);
        assert_eq!(row.reasoning, "gateway unavailable");
    }

    #[test]
    fn human_review_item_round_trips_through_json() {
        let item = HumanReviewItem {
            data_id: "item-7".into(),
            original_input: serde_json::json!({"text_content": "hello", "modality": "TEXT"}),
            labeler_attempts: vec![LabelPrediction {
                label: "NEUTRAL".into(),
                confidence: 40,
                reasoning: "unsure".into(),
                regions: vec![],
            }],
            critic_reviews: vec![CriticReview {
                is_correct: false,
                confidence_score: 55,
                critique: "too vague".into(),
            }],
            error_log: vec!["validator: confidence 47 below threshold 85".into()],
            fallback_reason: FallbackReason::LowConfidence,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&item).unwrap();
        let back: HumanReviewItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }
}
