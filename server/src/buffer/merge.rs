//! Text Merge and Payload Reconstruction
//!
//! Joins a burst's texts and splices the result into a copy of the last
//! payload received, keeping every other field untouched.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::types::{MergeError, Shape};

/// Value written to `source` on annotated payloads.
pub const ANNOTATION_SOURCE: &str = "message-buffer-api";

/// Separator between merged message texts.
const TEXT_SEPARATOR: &str = "\n";

/// Burst timing stamped onto the merged element when annotation is enabled.
#[derive(Debug, Clone, Copy)]
pub struct Annotation {
    pub first_timestamp: DateTime<Utc>,
    pub last_timestamp: DateTime<Utc>,
}

/// Join texts in insertion order, skipping empty entries.
pub fn merge_texts(texts: &[String]) -> String {
    texts
        .iter()
        .filter(|t| !t.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(TEXT_SEPARATOR)
}

/// Deep-copy `last_payload` and replace its text with `merged_text`.
pub fn rebuild_payload(
    last_payload: &Value,
    shape: Shape,
    merged_text: &str,
    annotation: Option<&Annotation>,
) -> Result<Value, MergeError> {
    let mut payload = last_payload.clone();

    let element = match shape {
        Shape::Wrapped => {
            let element = payload
                .as_array_mut()
                .and_then(|items| items.first_mut())
                .and_then(Value::as_object_mut)
                .ok_or(MergeError::ShapeMismatch {
                    expected: shape,
                    reason: "first array element is not an object",
                })?;
            let body = element
                .get_mut("body")
                .and_then(Value::as_object_mut)
                .ok_or(MergeError::ShapeMismatch {
                    expected: shape,
                    reason: "missing body object",
                })?;
            body.insert("text".into(), Value::String(merged_text.to_string()));
            element
        }
        Shape::Flat => {
            let object = payload.as_object_mut().ok_or(MergeError::ShapeMismatch {
                expected: shape,
                reason: "payload is not an object",
            })?;
            object.insert("text".into(), Value::String(merged_text.to_string()));
            object
        }
    };

    if let Some(annotation) = annotation {
        annotate(element, annotation);
    }

    Ok(payload)
}

fn annotate(element: &mut Map<String, Value>, annotation: &Annotation) {
    element.insert("source".into(), Value::from(ANNOTATION_SOURCE));
    element.insert(
        "firstTimestamp".into(),
        Value::from(annotation.first_timestamp.timestamp_millis()),
    );
    element.insert(
        "lastTimestamp".into(),
        Value::from(annotation.last_timestamp.timestamp_millis()),
    );
}
