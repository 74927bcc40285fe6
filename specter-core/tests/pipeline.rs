//! Integration tests for the decode → classify → apply pipeline
//!
//! These drive the full event path the way the client does — raw bytes
//! through the frame decoder, payloads through the classifier, events
//! into the session — without a network transport.

use specter_core::classify::classify;
use specter_core::session::Session;
use specter_core::stream::FrameDecoder;
use specter_core::types::{LogKind, SessionStatus};

/// A realistic service transcript: two progress updates, two attributes
/// (one without a location), completion.
const TRANSCRIPT: &str = concat!(
    "event: progress\n",
    "data: {\"message\":\"Scanning image...\"}\n",
    "\n",
    "event: progress\n",
    "data: {\"message\":\"Resolving latent attributes...\"}\n",
    "\n",
    "event: attribute\n",
    "data: {\"index\":0,\"total\":2,\"attribute\":{\"name\":\"sub-pixel light mismatch\",",
    "\"detection_rationale\":\"shadow azimuths disagree across the frame\",",
    "\"insight_narrative\":\"composited from at least two exposures\",",
    "\"intensity\":9,\"location\":{\"x\":0.42,\"y\":0.31,\"radius\":0.12}}}\n",
    "\n",
    "event: attribute\n",
    "data: {\"index\":1,\"total\":2,\"attribute\":{\"name\":\"uniform sensor noise\",",
    "\"detection_rationale\":\"noise floor is flat across depth planes\",",
    "\"insight_narrative\":\"consistent with a single capture device\",",
    "\"intensity\":3}}\n",
    "\n",
    "event: complete\n",
    "data: {\"image_summary\":\"A harbor at dusk\",\"total_attributes\":2,",
    "\"processing_time_ms\":842.0}\n",
);

/// Feed a byte stream through the full pipeline in the given chunk size.
fn run_pipeline(bytes: &[u8], chunk_size: usize) -> Session {
    let mut session = Session::new();
    let generation = session.start();
    let mut decoder = FrameDecoder::new();
    for chunk in bytes.chunks(chunk_size.max(1)) {
        for frame in decoder.push(chunk).expect("decoder should accept chunk") {
            if let Some(event) = classify(&frame.payload) {
                session.apply(generation, &event);
            }
        }
    }
    decoder.finish();
    session
}

#[test]
fn test_end_to_end_transcript() {
    specter_core::logging::init_test();
    let session = run_pipeline(TRANSCRIPT.as_bytes(), usize::MAX);

    assert_eq!(session.status(), SessionStatus::Complete);
    assert_eq!(session.attributes().len(), 2);
    assert_eq!(session.attributes()[0].name, "sub-pixel light mismatch");
    assert_eq!(session.attributes()[0].intensity, 9);
    assert!(session.attributes()[1].location.is_none());
    assert_eq!(session.summary(), Some("A harbor at dusk"));
    assert_eq!(session.elapsed_ms(), Some(842.0));

    // Two info (progress), data+success per attribute, success+info at
    // completion: eight lines
    let kinds: Vec<LogKind> = session.log().iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        [
            LogKind::Info,
            LogKind::Info,
            LogKind::Data,
            LogKind::Success,
            LogKind::Data,
            LogKind::Success,
            LogKind::Success,
            LogKind::Info,
        ]
    );
}

#[test]
fn test_pipeline_is_chunking_invariant() {
    let kinds = |s: &Session| s.log().iter().map(|l| l.kind).collect::<Vec<_>>();
    let whole = run_pipeline(TRANSCRIPT.as_bytes(), usize::MAX);
    for chunk_size in [1, 2, 3, 7, 16, 64, 1024] {
        let chunked = run_pipeline(TRANSCRIPT.as_bytes(), chunk_size);
        assert_eq!(chunked.status(), whole.status(), "chunk size {}", chunk_size);
        assert_eq!(chunked.attributes(), whole.attributes());
        assert_eq!(chunked.summary(), whole.summary());
        assert_eq!(chunked.elapsed_ms(), whole.elapsed_ms());
        assert_eq!(kinds(&chunked), kinds(&whole), "chunk size {}", chunk_size);
    }
}

#[test]
fn test_corrupt_record_between_valid_ones() {
    let bytes = concat!(
        "data: {\"index\":0,\"attribute\":{\"name\":\"first\",",
        "\"detection_rationale\":\"r\",\"insight_narrative\":\"n\",\"intensity\":5}}\n",
        "data: {\"index\":1,\"attribute\":{\"name\":\"corrupt\",\n",
        "data: {\"index\":2,\"attribute\":{\"name\":\"second\",",
        "\"detection_rationale\":\"r\",\"insight_narrative\":\"n\",\"intensity\":6}}\n",
    );
    let session = run_pipeline(bytes.as_bytes(), 11);

    // The corrupt record is omitted; everything else is unaffected
    let names: Vec<_> = session
        .attributes()
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, ["first", "second"]);
    assert_eq!(session.status(), SessionStatus::Streaming);
}

#[test]
fn test_events_after_completion_ignored() {
    let bytes = concat!(
        "data: {\"image_summary\":\"done\",\"total_attributes\":0,\"processing_time_ms\":10.0}\n",
        "data: {\"message\":\"late progress\"}\n",
        "data: {\"error\":\"Late\",\"message\":\"too late\"}\n",
    );
    let session = run_pipeline(bytes.as_bytes(), usize::MAX);

    assert_eq!(session.status(), SessionStatus::Complete);
    assert_eq!(session.summary(), Some("done"));
    assert!(session.failure_message().is_none());
    // Only the completion pair made it into the log
    assert_eq!(session.log().len(), 2);
}

#[test]
fn test_service_failure_mid_stream() {
    let bytes = concat!(
        "data: {\"message\":\"starting\"}\n",
        "data: {\"error\":\"ModelOverloaded\",\"message\":\"try again later\"}\n",
        "data: {\"message\":\"ghost\"}\n",
    );
    let session = run_pipeline(bytes.as_bytes(), 5);

    assert_eq!(session.status(), SessionStatus::Failed);
    assert_eq!(
        session.failure_message(),
        Some("ModelOverloaded: try again later")
    );
    assert_eq!(session.log().last().map(|l| l.kind), Some(LogKind::Error));
    // The post-failure progress event was ignored
    assert_eq!(session.log().len(), 2);
}

#[test]
fn test_reset_after_complete_clears_everything() {
    let mut session = run_pipeline(TRANSCRIPT.as_bytes(), 13);
    assert_eq!(session.status(), SessionStatus::Complete);

    session.reset();
    assert_eq!(session.status(), SessionStatus::Idle);
    assert!(session.attributes().is_empty());
    assert!(session.summary().is_none());
    assert!(session.elapsed_ms().is_none());
    assert!(session.log().is_empty());
    assert!(session.failure_message().is_none());
}
