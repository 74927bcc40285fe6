//! Semantic event classification
//!
//! Turns one [`RawFrame`](crate::stream::RawFrame) payload into one of
//! the four analysis events, or drops it. Classification goes by payload
//! shape, never by the stream's `event:` tag: the tag is optional and
//! the service is free to mislabel or omit it, so the payload's own
//! required fields are the only authority.
//!
//! Dispatch tries each shape's required-field predicate in a fixed
//! priority order and takes the first match:
//!
//! 1. attribute: `index` + `attribute`
//! 2. complete: `image_summary` + `total_attributes`
//! 3. failure: `error` + `message`
//! 4. progress: `message`
//!
//! Failure must precede progress: a failure payload also carries a
//! `message` field and would otherwise be read as a progress update.
//!
//! ## Error handling
//!
//! A payload that is not valid JSON, matches no shape, or fails typed
//! deserialization is logged at warn level and dropped. A single corrupt
//! record never aborts an otherwise healthy stream.

use crate::types::Attribute;
use serde::Deserialize;
use serde_json::Value;

/// One classified analysis event
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    /// Human-readable status update
    Progress { message: String },
    /// One discovered attribute.
    ///
    /// `index` and `total` are advisory producer metadata; the session
    /// orders attributes by arrival, never by `index`.
    Attribute {
        index: usize,
        total: Option<usize>,
        attribute: Attribute,
    },
    /// Definitive end of a successful session
    Complete {
        image_summary: String,
        total_attributes: usize,
        processing_time_ms: f64,
    },
    /// Service-reported failure
    Failure { error: String, message: String },
}

#[derive(Deserialize)]
struct AttributePayload {
    index: usize,
    #[serde(default)]
    total: Option<usize>,
    attribute: Attribute,
}

#[derive(Deserialize)]
struct CompletePayload {
    image_summary: String,
    total_attributes: usize,
    processing_time_ms: f64,
}

#[derive(Deserialize)]
struct FailurePayload {
    error: String,
    message: String,
}

#[derive(Deserialize)]
struct ProgressPayload {
    message: String,
}

/// Classify one frame payload, or `None` if it is malformed or matches
/// no recognized shape.
pub fn classify(payload: &str) -> Option<AnalysisEvent> {
    let value: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "dropping non-JSON stream payload");
            return None;
        }
    };

    let event = if value.get("attribute").is_some() && value.get("index").is_some() {
        let p: AttributePayload = typed(value)?;
        if p.attribute.intensity > 10 {
            tracing::warn!(
                intensity = p.attribute.intensity,
                "dropping attribute with out-of-range intensity"
            );
            return None;
        }
        AnalysisEvent::Attribute {
            index: p.index,
            total: p.total,
            attribute: p.attribute,
        }
    } else if value.get("image_summary").is_some() && value.get("total_attributes").is_some() {
        let p: CompletePayload = typed(value)?;
        AnalysisEvent::Complete {
            image_summary: p.image_summary,
            total_attributes: p.total_attributes,
            processing_time_ms: p.processing_time_ms,
        }
    } else if value.get("error").is_some() && value.get("message").is_some() {
        let p: FailurePayload = typed(value)?;
        AnalysisEvent::Failure {
            error: p.error,
            message: p.message,
        }
    } else if value.get("message").map_or(false, Value::is_string) {
        let p: ProgressPayload = typed(value)?;
        AnalysisEvent::Progress { message: p.message }
    } else {
        tracing::warn!("dropping stream payload matching no recognized shape");
        return None;
    };

    Some(event)
}

/// Typed deserialization after the shape predicate matched; a mismatch
/// in field types still counts as a malformed record.
fn typed<T: serde::de::DeserializeOwned>(value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::warn!(error = %e, "dropping malformed stream payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress() {
        let event = classify(r#"{"message":"scanning image"}"#).unwrap();
        assert_eq!(
            event,
            AnalysisEvent::Progress {
                message: "scanning image".to_string()
            }
        );
    }

    #[test]
    fn test_attribute() {
        let event = classify(
            r#"{
                "index": 2,
                "total": 4,
                "attribute": {
                    "name": "vanishing-point drift",
                    "detection_rationale": "rooflines converge to two points",
                    "insight_narrative": "the scene mixes focal lengths",
                    "intensity": 9,
                    "location": {"x": 0.5, "y": 0.25, "radius": 0.1}
                }
            }"#,
        )
        .unwrap();
        match event {
            AnalysisEvent::Attribute {
                index,
                total,
                attribute,
            } => {
                assert_eq!(index, 2);
                assert_eq!(total, Some(4));
                assert_eq!(attribute.name, "vanishing-point drift");
                assert_eq!(attribute.location.unwrap().radius, 0.1);
            }
            other => panic!("expected attribute event, got {:?}", other),
        }
    }

    #[test]
    fn test_complete() {
        let event = classify(
            r#"{"image_summary":"a harbor at dusk","total_attributes":3,"processing_time_ms":842.0}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            AnalysisEvent::Complete {
                image_summary: "a harbor at dusk".to_string(),
                total_attributes: 3,
                processing_time_ms: 842.0,
            }
        );
    }

    #[test]
    fn test_failure_wins_over_progress() {
        // A failure payload also has `message`; it must not classify as
        // a progress event.
        let event = classify(r#"{"error":"QuotaExceeded","message":"daily limit hit"}"#).unwrap();
        assert_eq!(
            event,
            AnalysisEvent::Failure {
                error: "QuotaExceeded".to_string(),
                message: "daily limit hit".to_string(),
            }
        );
    }

    #[test]
    fn test_tag_is_ignored_shape_wins() {
        // Whatever the `event:` tag claimed, this payload is a progress
        // event by shape; the classifier never sees the tag at all.
        let event = classify(r#"{"message":"still working"}"#).unwrap();
        assert!(matches!(event, AnalysisEvent::Progress { .. }));
    }

    #[test]
    fn test_malformed_json_dropped() {
        assert_eq!(classify("{not json"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_unrecognized_shape_dropped() {
        assert_eq!(classify(r#"{"unknown":"shape"}"#), None);
        assert_eq!(classify(r#"{"message": 42}"#), None);
        assert_eq!(classify(r#"[1,2,3]"#), None);
    }

    #[test]
    fn test_field_type_mismatch_dropped() {
        // Shape predicate matches but typed deserialization fails
        assert_eq!(
            classify(r#"{"index":"zero","attribute":{"name":"x"}}"#),
            None
        );
        assert_eq!(
            classify(r#"{"image_summary":"s","total_attributes":"three","processing_time_ms":1.0}"#),
            None
        );
    }

    #[test]
    fn test_out_of_range_intensity_dropped() {
        let payload = r#"{
            "index": 0,
            "attribute": {
                "name": "x",
                "detection_rationale": "r",
                "insight_narrative": "n",
                "intensity": 11
            }
        }"#;
        assert_eq!(classify(payload), None);
    }

    #[test]
    fn test_negative_intensity_is_malformed() {
        let payload = r#"{
            "index": 0,
            "attribute": {
                "name": "x",
                "detection_rationale": "r",
                "insight_narrative": "n",
                "intensity": -3
            }
        }"#;
        assert_eq!(classify(payload), None);
    }
}
