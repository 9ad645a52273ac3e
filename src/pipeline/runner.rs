//! The orchestration state machine: Labeling → Critiquing → Validating →
//! (Fallback | Done).
//!
//! Failure policy, per stage:
//! - transient decode noise (including gateway failures) is retried
//!   in-place, bounded by [`LOCAL_DECODE_ATTEMPTS`], then escalates
//! - critique rejection is retried at task level, bounded by
//!   `max_retries`, then escalates
//! - sub-threshold confidence always escalates
//! - escalation write failures are logged and swallowed
//!
//! Nothing propagates out of [`PipelineRunner::run`]: the worst case for
//! one item is a degraded record, never an aborted batch.

use crate::config::Config;
use crate::decode::decode_as;
use crate::gateway::{CompletionGateway, ModelRole};
use crate::models::{
    CriticReview, FallbackReason, HumanReviewItem, LabelPrediction, LabelRecord, LabelingTask,
    final_confidence,
};
use crate::pipeline::state::{RunState, Stage};
use crate::prompts::{critic_prompt, labeling_prompt};
use crate::queue::ReviewQueue;
use crate::rubric::RubricProvider;
use chrono::Utc;
use tracing::{debug, warn};

/// In-place gateway+decode attempts per stage entry. Independent of the
/// task-level `max_retries` budget: this absorbs transient parsing noise,
/// `max_retries` absorbs substantive disagreement.
pub const LOCAL_DECODE_ATTEMPTS: u32 = 2;

/// Drives one task at a time through the state machine.
///
/// Holds only shared read-only collaborators, so one runner can serve many
/// sequential runs (or be constructed per worker for parallel ones).
pub struct PipelineRunner<'a> {
    gateway: &'a dyn CompletionGateway,
    config: &'a Config,
    rubrics: RubricProvider,
    queue: ReviewQueue,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(gateway: &'a dyn CompletionGateway, config: &'a Config) -> Self {
        Self {
            gateway,
            config,
            rubrics: RubricProvider::new(&config.rubric_dir),
            queue: ReviewQueue::new(&config.review_queue_dir),
        }
    }

    /// Run one task to a terminal record. Infallible by contract: every
    /// path ends in a validated or degraded [`LabelRecord`].
    pub async fn run(&self, task: &LabelingTask) -> LabelRecord {
        let mut state = RunState::new(self.config.max_retries);
        let mut stage = Stage::Labeling;
        let mut outcome: Option<LabelRecord> = None;

        while stage != Stage::Done {
            stage = match stage {
                Stage::Labeling => self.labeling(task, &mut state).await,
                Stage::Critiquing => self.critiquing(task, &mut state).await,
                Stage::Validating => self.validating(task, &mut state, &mut outcome),
                Stage::Fallback(reason) => self.fallback(task, &mut state, reason, &mut outcome),
                Stage::Done => Stage::Done,
            };
        }

        // Both terminal paths set the outcome; this guard keeps the
        // one-record-per-task contract even against an internal bug.
        outcome.unwrap_or_else(|| LabelRecord::error(&task.data_id, "run ended without outcome"))
    }

    async fn labeling(&self, task: &LabelingTask, state: &mut RunState) -> Stage {
        let feedback = state.rejecting_feedback().unwrap_or("").to_string();
        let prompt = labeling_prompt(&task.task_type, task_content(task), &feedback);

        for attempt in 1..=LOCAL_DECODE_ATTEMPTS {
            match self.gateway.complete(&prompt, ModelRole::Labeler).await {
                Ok(raw) => match decode_as::<LabelPrediction>(&raw) {
                    Some(prediction) => {
                        debug!(
                            data_id = %task.data_id,
                            label = %prediction.label,
                            confidence = prediction.confidence,
                            "labeler produced a prediction"
                        );
                        state.labeler_attempts.push(prediction);
                        return Stage::Critiquing;
                    }
                    None => state.log(format!(
                        "labeler attempt {} failed: could not decode prediction",
                        attempt
                    )),
                },
                Err(e) => state.log(format!("labeler attempt {} failed: {}", attempt, e)),
            }
        }

        state.log("labeler: all attempts failed, escalating");
        Stage::Fallback(FallbackReason::ParsingError)
    }

    async fn critiquing(&self, task: &LabelingTask, state: &mut RunState) -> Stage {
        let Some(prediction) = state.latest_prediction().cloned() else {
            state.log("critic: no prediction to review");
            return Stage::Fallback(FallbackReason::ValidationError);
        };

        let rubric = self.rubrics.load(&task.task_type);
        let prompt = critic_prompt(
            &task.task_type,
            task_content(task),
            &prediction,
            rubric.as_ref().map(|r| r.criteria.as_slice()),
        );

        let mut review: Option<CriticReview> = None;
        for attempt in 1..=LOCAL_DECODE_ATTEMPTS {
            match self.gateway.complete(&prompt, ModelRole::Critic).await {
                Ok(raw) => {
                    if let Some(decoded) = decode_as::<CriticReview>(&raw) {
                        review = Some(decoded);
                        break;
                    }
                    state.log(format!(
                        "critic attempt {} failed: could not decode review",
                        attempt
                    ));
                }
                Err(e) => state.log(format!("critic attempt {} failed: {}", attempt, e)),
            }
        }

        // Availability over strictness: a critic that cannot be decoded
        // accepts the label at reduced confidence rather than stalling the
        // item.
        let review = review.unwrap_or_else(|| {
            warn!(data_id = %task.data_id, "critic output undecodable, default-accepting label");
            CriticReview::default_accept()
        });
        state.critic_reviews.push(review.clone());
        state.route_after_critique(&review)
    }

    fn validating(
        &self,
        task: &LabelingTask,
        state: &mut RunState,
        outcome: &mut Option<LabelRecord>,
    ) -> Stage {
        let (Some(prediction), Some(review)) = (state.latest_prediction(), state.latest_review())
        else {
            state.log("validator: missing prediction or review");
            return Stage::Fallback(FallbackReason::ValidationError);
        };
        let (labeler_conf, critic_conf) = (prediction.confidence, review.confidence_score);
        let (label, reasoning) = (prediction.label.clone(), prediction.reasoning.clone());

        let next = state.route_after_validation(
            labeler_conf,
            critic_conf,
            self.config.min_confidence_threshold,
        );
        if next == Stage::Done {
            *outcome = Some(LabelRecord {
                data_id: task.data_id.clone(),
                label,
                confidence: labeler_conf,
                critic_confidence: critic_conf,
                final_confidence: final_confidence(labeler_conf, critic_conf),
                retry_count: state.retry_count,
                reasoning,
                fallback_reason: None,
            });
        }
        next
    }

    fn fallback(
        &self,
        task: &LabelingTask,
        state: &mut RunState,
        reason: FallbackReason,
        outcome: &mut Option<LabelRecord>,
    ) -> Stage {
        let item = HumanReviewItem {
            data_id: task.data_id.clone(),
            original_input: serde_json::json!({
                "text_content": task.text_content,
                "image_ref": task.image_ref,
                "modality": task.modality,
            }),
            labeler_attempts: state.labeler_attempts.clone(),
            critic_reviews: state.critic_reviews.clone(),
            error_log: state.error_log.clone(),
            fallback_reason: reason,
            timestamp: Utc::now(),
        };

        // Best effort: a full review queue disk must not abort the run.
        if let Err(e) = self.queue.write(&item) {
            warn!(data_id = %task.data_id, error = %e, "failed to persist review item, continuing");
        }

        *outcome = Some(LabelRecord {
            data_id: task.data_id.clone(),
            label: state
                .latest_prediction()
                .map(|p| p.label.clone())
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            confidence: state.latest_prediction().map(|p| p.confidence).unwrap_or(0),
            critic_confidence: state
                .latest_review()
                .map(|r| r.confidence_score)
                .unwrap_or(0),
            final_confidence: 0,
            retry_count: state.retry_count,
            reasoning: "sent to human review".to_string(),
            fallback_reason: Some(reason),
        });
        Stage::Done
    }
}

/// The content fed into prompts: the text, or the image reference when the
/// task carries no text (vision tasks arrive as descriptions either way).
fn task_content(task: &LabelingTask) -> &str {
    if !task.text_content.is_empty() {
        &task.text_content
    } else {
        task.image_ref.as_deref().unwrap_or("")
    }
}
