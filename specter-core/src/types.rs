//! Core domain types for specter
//!
//! These types model one analysis session: the attributes the remote
//! vision service discovers in an image, the status the session moves
//! through while the response stream is consumed, and the terminal log
//! the frontends render.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Attribute** | One AI-discovered visual trait of the analyzed image |
//! | **Intensity** | 0–10 integer score attached to an attribute; drives badge text and marker color |
//! | **Location** | Normalized spatial hint (`x`, `y`, `radius`, each in [0, 1]) for the overlay |
//! | **Session** | One complete lifecycle of submitting an image and consuming its streamed analysis |
//! | **LogLine** | One append-only entry of the session's terminal log |

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================
// Attributes
// ============================================

/// Normalized spatial hint for an attribute.
///
/// `x` and `y` are fractions of image width and height; `radius` is a
/// fraction of the shorter image side. Values are expected in [0, 1]
/// but are not clamped here; the renderer maps them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// One AI-discovered visual trait.
///
/// Created once by the remote service per attribute event and immutable
/// afterwards. Attributes are appended to the session in arrival order
/// and never removed or reordered short of a full session reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Short label chosen by the service; unique only by convention
    pub name: String,
    /// Free-text explanation of how the trait was inferred
    pub detection_rationale: String,
    /// Free-text elaboration of why the trait matters
    pub insight_narrative: String,
    /// Score in [0, 10]; validated by the classifier before admission
    pub intensity: u8,
    /// Spatial hint; `None` means the attribute has no visual marker
    #[serde(default)]
    pub location: Option<Location>,
}

// ============================================
// Session status
// ============================================

/// Lifecycle state of an analysis session.
///
/// Sessions move strictly forward through
/// `idle → connecting → streaming → {complete | failed}`; only an
/// explicit reset returns to `idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No analysis started (or the session was reset)
    Idle,
    /// Request submitted, no event received yet
    Connecting,
    /// At least one event received, stream still open
    Streaming,
    /// Completion event received; summary and timing are set
    Complete,
    /// Transport failure or service-reported failure
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Streaming => "streaming",
            SessionStatus::Complete => "complete",
            SessionStatus::Failed => "failed",
        }
    }

    /// True once no further events will be accepted
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Complete | SessionStatus::Failed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(SessionStatus::Idle),
            "connecting" => Ok(SessionStatus::Connecting),
            "streaming" => Ok(SessionStatus::Streaming),
            "complete" => Ok(SessionStatus::Complete),
            "failed" => Ok(SessionStatus::Failed),
            _ => Err(format!("unknown session status: {}", s)),
        }
    }
}

// ============================================
// Terminal log
// ============================================

/// Severity/channel of a log line, mirrored in frontend colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Info,
    Success,
    Warning,
    Error,
    Data,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Success => "success",
            LogKind::Warning => "warning",
            LogKind::Error => "error",
            LogKind::Data => "data",
        }
    }
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of the session's terminal log.
///
/// Lines are appended in event-arrival order and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    pub kind: LogKind,
    pub text: String,
    /// When the line was appended (local observation time, not a
    /// service-provided timestamp)
    pub ts: DateTime<Utc>,
}

impl LogLine {
    pub fn new(kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            ts: Utc::now(),
        }
    }
}

// ============================================
// Image MIME types
// ============================================

/// The image formats the analysis service accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageMime {
    Png,
    Jpeg,
    Webp,
}

impl ImageMime {
    /// Returns the MIME string sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Png => "image/png",
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Webp => "image/webp",
        }
    }

    /// Guess the MIME type from a file extension.
    ///
    /// Returns `None` for extensions outside the supported set.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ImageMime::Png),
            "jpg" | "jpeg" => Some(ImageMime::Jpeg),
            "webp" => Some(ImageMime::Webp),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImageMime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ImageMime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image/png" | "png" => Ok(ImageMime::Png),
            "image/jpeg" | "image/jpg" | "jpeg" | "jpg" => Ok(ImageMime::Jpeg),
            "image/webp" | "webp" => Ok(ImageMime::Webp),
            _ => Err(format!("unsupported image MIME type: {}", s)),
        }
    }
}

// ============================================
// Analysis request
// ============================================

/// Request body for `POST /analyze/stream`
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    /// Base64-encoded (standard alphabet, padded) image bytes
    pub image_base64: String,
    /// One of the [`ImageMime`] strings
    pub mime_type: String,
}

impl AnalysisRequest {
    /// Encode raw image bytes into a request body
    pub fn new(image_bytes: &[u8], mime: ImageMime) -> Self {
        Self {
            image_base64: base64::engine::general_purpose::STANDARD.encode(image_bytes),
            mime_type: mime.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trip() {
        for status in [
            SessionStatus::Idle,
            SessionStatus::Connecting,
            SessionStatus::Streaming,
            SessionStatus::Complete,
            SessionStatus::Failed,
        ] {
            assert_eq!(SessionStatus::from_str(status.as_str()), Ok(status));
        }
        assert!(SessionStatus::from_str("paused").is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(SessionStatus::Complete.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(!SessionStatus::Streaming.is_terminal());
        assert!(!SessionStatus::Idle.is_terminal());
    }

    #[test]
    fn test_mime_from_path() {
        assert_eq!(
            ImageMime::from_path(&PathBuf::from("cat.PNG")),
            Some(ImageMime::Png)
        );
        assert_eq!(
            ImageMime::from_path(&PathBuf::from("shot.jpeg")),
            Some(ImageMime::Jpeg)
        );
        assert_eq!(ImageMime::from_path(&PathBuf::from("doc.pdf")), None);
        assert_eq!(ImageMime::from_path(&PathBuf::from("noext")), None);
    }

    #[test]
    fn test_request_encodes_base64() {
        let request = AnalysisRequest::new(b"\x89PNG", ImageMime::Png);
        assert_eq!(request.image_base64, "iVBORw==");
        assert_eq!(request.mime_type, "image/png");
    }

    #[test]
    fn test_attribute_deserializes_without_location() {
        let attr: Attribute = serde_json::from_str(
            r#"{
                "name": "specular asymmetry",
                "detection_rationale": "left highlight lacks a paired catchlight",
                "insight_narrative": "suggests two distinct light sources",
                "intensity": 7
            }"#,
        )
        .unwrap();
        assert_eq!(attr.intensity, 7);
        assert!(attr.location.is_none());
    }
}
