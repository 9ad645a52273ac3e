//! Prompt templates for the labeler and critic stages.
//!
//! Templates are keyed by task type. Every labeling template demands
//! JSON-only output in the [`crate::models::LabelPrediction`] shape; the
//! critic template demands the [`crate::models::CriticReview`] shape and
//! explicitly forbids re-labeling. Unknown task types fall back to the
//! sentiment template so an open `task_type` string can never fail prompt
//! construction.

use crate::models::LabelPrediction;

const JSON_SHAPE_HINT: &str =
    r#"Return ONLY valid JSON: {"label": "%LABEL%", "confidence": 85, "reasoning": "brief explanation", "bounding_boxes": []}"#;

/// Build the labeling prompt for one attempt.
///
/// A non-empty `critic_feedback` (the rejecting critique from the previous
/// attempt) is injected as a corrective block ahead of the instructions.
pub fn labeling_prompt(task_type: &str, text_content: &str, critic_feedback: &str) -> String {
    let feedback_block = if critic_feedback.is_empty() {
        String::new()
    } else {
        format!(
            "\nPREVIOUS ATTEMPT FEEDBACK (incorporate this into your new label):\n{}\n",
            critic_feedback
        )
    };

    let (expert, instruction, placeholder, content_label) = match task_type
        .to_lowercase()
        .as_str()
    {
        "ner" => (
            "You are a Named Entity Recognition (NER) expert.",
            "Label the primary named entity type in the following text.\nChoose one of: PERSON, ORGANIZATION, LOCATION, DATE, PRODUCT, EVENT, OTHER",
            "ENTITY_TYPE",
            "Text",
        ),
        "summarization" => (
            "You are a text summarization expert.",
            "Create a concise label/category for the following text based on its main topic.\nChoose one of: TECHNICAL, SCIENTIFIC, NEWS, OPINION, NARRATIVE, INSTRUCTIONAL, OTHER",
            "CATEGORY",
            "Text",
        ),
        "object_detection" => (
            "You are a computer vision expert describing image content.",
            "Label the primary object or scene type described.\nChoose one of: PERSON, VEHICLE, ANIMAL, BUILDING, FOOD, NATURE, OBJECT, SCENE",
            "CATEGORY",
            "Description/Text",
        ),
        "ocr" => (
            "You are an OCR classification expert.",
            "Classify the type of document or text in the following content.\nChoose one of: HANDWRITTEN, PRINTED, MIXED, FORM, TABLE, RECEIPT, LABEL, OTHER",
            "DOCUMENT_TYPE",
            "Text",
        ),
        "visual_qa" => (
            "You are a visual question answering expert.",
            "Answer the question based on the provided context.",
            "YOUR_ANSWER",
            "Context",
        ),
        "captioning" => (
            "You are an image captioning expert.",
            "Generate a concise label/category for the content described.\nChoose one of: PORTRAIT, LANDSCAPE, ACTION, GROUP, PRODUCT, ABSTRACT, DOCUMENTARY",
            "CAPTION_TYPE",
            "Content",
        ),
        "grounded_description" => (
            "You are a visual grounding expert.",
            "Classify the description type and identify key regions.",
            "DESCRIPTION_TYPE",
            "Content",
        ),
        // "sentiment" and anything unrecognized.
        _ => (
            "You are a sentiment analysis expert.",
            "Classify the sentiment of the following text.\nChoose one of: POSITIVE, NEGATIVE, NEUTRAL, MIXED",
            "SENTIMENT",
            "Text",
        ),
    };

    format!(
        "{expert}\n{feedback_block}\n{instruction}\n\n{content_label}: {text_content}\n\n{shape}",
        shape = JSON_SHAPE_HINT.replace("%LABEL%", placeholder),
    )
}

/// Build the critic's review prompt for the latest prediction.
///
/// `criteria` are optional rubric lines keyed by task type; absence is
/// normal and simply omits the rubric section.
pub fn critic_prompt(
    task_type: &str,
    original_input: &str,
    prediction: &LabelPrediction,
    criteria: Option<&[String]>,
) -> String {
    let rubric_text = match criteria {
        Some(lines) if !lines.is_empty() => {
            let mut section = String::from("Evaluation criteria:\n");
            for line in lines {
                section.push_str(&format!("- {}\n", line));
            }
            section
        }
        _ => String::new(),
    };

    format!(
        "You are a label quality critic. Evaluate whether this label is correct.\n\
         Do NOT re-label. Only judge correctness.\n\n\
         Task type: {task_type}\n\
         Original input: {original_input}\n\
         Proposed label: {label}\n\
         Reasoning: {reasoning}\n\
         {rubric_text}\n\
         Return ONLY valid JSON: {{\"is_correct\": true/false, \"confidence_score\": 85, \"critique\": \"specific feedback if incorrect, or 'Label is correct' if correct\"}}",
        label = prediction.label,
        reasoning = prediction.reasoning,
    )
}
