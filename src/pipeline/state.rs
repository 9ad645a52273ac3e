//! Run state and stage transitions for a single labeling run.
//!
//! The original design expressed transitions as dynamic directive records;
//! here they are an explicit [`Stage`] enum plus transition methods on
//! [`RunState`], so routing is data the compiler can check and tests can
//! drive without a gateway. There is no process-wide machine state: each
//! run owns its `RunState` exclusively and discards it at the end.

use crate::models::{CriticReview, FallbackReason, LabelPrediction, final_confidence};

/// The states of the orchestration machine.
///
/// `Done` is terminal for both outcomes; the distinguishing output is the
/// validated-vs-degraded record assembled on the way there. A fallback
/// reason is carried structurally in the transition, never inferred from
/// log text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Labeling,
    Critiquing,
    Validating,
    Fallback(FallbackReason),
    Done,
}

/// Mutable working record for one task run. Never shared across items.
#[derive(Debug)]
pub struct RunState {
    /// Task-level critique-rejection counter; never exceeds `max_retries`.
    pub retry_count: u32,
    pub max_retries: u32,
    /// Every decoded prediction, in order.
    pub labeler_attempts: Vec<LabelPrediction>,
    /// Every critic review (decoded or default-accept), in order.
    pub critic_reviews: Vec<CriticReview>,
    /// Append-only diagnostics; never truncated.
    pub error_log: Vec<String>,
}

impl RunState {
    pub fn new(max_retries: u32) -> Self {
        Self {
            retry_count: 0,
            max_retries,
            labeler_attempts: Vec::new(),
            critic_reviews: Vec::new(),
            error_log: Vec::new(),
        }
    }

    pub fn log(&mut self, message: impl Into<String>) {
        self.error_log.push(message.into());
    }

    pub fn latest_prediction(&self) -> Option<&LabelPrediction> {
        self.labeler_attempts.last()
    }

    pub fn latest_review(&self) -> Option<&CriticReview> {
        self.critic_reviews.last()
    }

    /// The critique text to feed back into the next labeling attempt, when
    /// the latest review rejected the label.
    pub fn rejecting_feedback(&self) -> Option<&str> {
        self.latest_review()
            .filter(|review| !review.is_correct)
            .map(|review| review.critique.as_str())
    }

    /// Route after a critic review has been appended.
    ///
    /// A rejection under budget increments `retry_count` by exactly one and
    /// re-enters labeling; a rejection at the budget escalates.
    pub fn route_after_critique(&mut self, review: &CriticReview) -> Stage {
        if review.is_correct {
            Stage::Validating
        } else if self.retry_count < self.max_retries {
            self.retry_count += 1;
            Stage::Labeling
        } else {
            self.log("critic: max retries reached, escalating");
            Stage::Fallback(FallbackReason::RetryLimit)
        }
    }

    /// Route after computing the aggregated confidence in validation.
    pub fn route_after_validation(&mut self, labeler: u8, critic: u8, threshold: u8) -> Stage {
        let final_conf = final_confidence(labeler, critic);
        if final_conf < threshold {
            self.log(format!(
                "validator: confidence {} below threshold {}",
                final_conf, threshold
            ));
            Stage::Fallback(FallbackReason::LowConfidence)
        } else {
            Stage::Done
        }
    }
}
