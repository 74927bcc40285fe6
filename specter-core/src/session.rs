//! Analysis session state machine
//!
//! [`Session`] is the single authoritative aggregate for one analysis:
//! status, discovered attributes, completion summary and timing, the
//! terminal log, and the failure message. It moves strictly forward
//! through `idle → connecting → streaming → {complete | failed}`; only
//! [`Session::reset`] returns to `idle`, discarding everything.
//!
//! ## Single writer, stale-stream rejection
//!
//! Only the stream-consuming control path mutates a session; renderers
//! read snapshots after a mutation has fully applied. Because a reset
//! (or restart) can race an in-flight read on the old transport, every
//! `start` hands out a [`Generation`] token and every mutation requires
//! it back: a token minted before the most recent start or reset no
//! longer matches and its events are ignored rather than applied to the
//! newer session.
//!
//! ## Terminal lock
//!
//! Once `complete` or `failed`, every further event is ignored; late or
//! duplicate records after a terminal transition are not errors.

use crate::classify::AnalysisEvent;
use crate::types::{Attribute, LogKind, LogLine, SessionStatus};

/// Opaque token tying a stream to the session generation that spawned it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// One analysis session's complete state
#[derive(Debug)]
pub struct Session {
    status: SessionStatus,
    attributes: Vec<Attribute>,
    summary: Option<String>,
    elapsed_ms: Option<f64>,
    log: Vec<LogLine>,
    failure_message: Option<String>,
    generation: u64,
}

impl Session {
    /// Create an idle session with no accumulated data
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            attributes: Vec::new(),
            summary: None,
            elapsed_ms: None,
            log: Vec::new(),
            failure_message: None,
            generation: 0,
        }
    }

    // ============================================
    // Accessors (read-only snapshots)
    // ============================================

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Discovered attributes in arrival order
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Whole-image summary; set exactly once, at completion
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Total processing duration; set exactly once, at completion
    pub fn elapsed_ms(&self) -> Option<f64> {
        self.elapsed_ms
    }

    /// Terminal log in chronological order
    pub fn log(&self) -> &[LogLine] {
        &self.log
    }

    /// Failure text; set exactly once, on failure
    pub fn failure_message(&self) -> Option<&str> {
        self.failure_message.as_deref()
    }

    // ============================================
    // Transitions
    // ============================================

    /// Begin a new analysis: clear all accumulated data, move to
    /// `connecting`, and mint the generation token the stream consumer
    /// must present with every event.
    ///
    /// Starting from a non-idle state implies a reset first; the caller
    /// is responsible for tearing down any prior transport before
    /// calling this (the minted generation makes late events from that
    /// transport harmless either way).
    pub fn start(&mut self) -> Generation {
        self.clear();
        self.status = SessionStatus::Connecting;
        self.generation += 1;
        Generation(self.generation)
    }

    /// Apply one classified event.
    ///
    /// Returns `true` if the event mutated the session; `false` when it
    /// was ignored (stale generation, terminal state, or idle).
    pub fn apply(&mut self, generation: Generation, event: &AnalysisEvent) -> bool {
        if !self.accepts(generation) {
            return false;
        }

        // First event of the stream: the connection is live
        if self.status == SessionStatus::Connecting {
            self.status = SessionStatus::Streaming;
        }

        match event {
            AnalysisEvent::Progress { message } => {
                self.push_log(LogKind::Info, message.clone());
            }
            AnalysisEvent::Attribute { attribute, .. } => {
                // Arrival order is authoritative; the event's advisory
                // index is deliberately not consulted.
                self.attributes.push(attribute.clone());
                self.push_log(
                    LogKind::Data,
                    format!(
                        "Discovered attribute #{}: {}",
                        self.attributes.len(),
                        attribute.name
                    ),
                );
                self.push_log(
                    LogKind::Success,
                    format!("Intensity: {}/10", attribute.intensity),
                );
            }
            AnalysisEvent::Complete {
                image_summary,
                total_attributes,
                processing_time_ms,
            } => {
                self.summary = Some(image_summary.clone());
                self.elapsed_ms = Some(processing_time_ms.max(0.0));
                self.status = SessionStatus::Complete;
                self.push_log(
                    LogKind::Success,
                    format!(
                        "Analysis complete: {} attributes discovered",
                        total_attributes
                    ),
                );
                self.push_log(
                    LogKind::Info,
                    format!("Processing time: {:.0}ms", processing_time_ms),
                );
            }
            AnalysisEvent::Failure { error, message } => {
                self.fail_with(format!("{}: {}", error, message));
            }
        }

        true
    }

    /// Record a transport-level failure (connection refused, non-success
    /// status, stream read error, decoder overflow).
    ///
    /// Returns `true` if the session transitioned to `failed`.
    pub fn fail(&mut self, generation: Generation, message: &str) -> bool {
        if !self.accepts(generation) {
            return false;
        }
        self.fail_with(format!("Analysis failed: {}", message));
        true
    }

    /// Return to `idle`, discarding all session data and invalidating
    /// every outstanding generation token.
    pub fn reset(&mut self) {
        self.clear();
        self.status = SessionStatus::Idle;
        self.generation += 1;
    }

    // ============================================
    // Internals
    // ============================================

    /// True when a mutation presenting this token may proceed
    fn accepts(&self, generation: Generation) -> bool {
        generation.0 == self.generation
            && !self.status.is_terminal()
            && self.status != SessionStatus::Idle
    }

    fn fail_with(&mut self, message: String) {
        self.push_log(LogKind::Error, message.clone());
        self.failure_message = Some(message);
        self.status = SessionStatus::Failed;
    }

    fn clear(&mut self) {
        self.attributes.clear();
        self.summary = None;
        self.elapsed_ms = None;
        self.log.clear();
        self.failure_message = None;
    }

    fn push_log(&mut self, kind: LogKind, text: String) {
        self.log.push(LogLine::new(kind, text));
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
