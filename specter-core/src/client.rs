//! HTTP client for the Specter Vision analysis service
//!
//! One streamed exchange per analysis: `POST /analyze/stream` with the
//! base64 image payload, answered by a server-sent-event byte stream.
//! [`AnalysisStream`] owns the response body together with a fresh
//! [`FrameDecoder`] and yields classified [`AnalysisEvent`]s; transport
//! problems surface as a single terminal error, never per record.

use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};

use crate::classify::{classify, AnalysisEvent};
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::stream::{FrameDecoder, RawFrame};
use crate::types::AnalysisRequest;

/// HTTP client for the analysis service
#[derive(Clone)]
pub struct AnalysisClient {
    http_client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl AnalysisClient {
    /// Create a new client from configuration.
    ///
    /// Returns an error if the configuration is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        // Build default headers
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        // Connect timeout only: the stream itself has no overall
        // deadline, since an analysis may legitimately run for minutes
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// The configured service base URL (scheme + authority, no trailing slash)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check whether the service answers its identity endpoint
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/", self.base_url);

        match self
            .http_client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Submit an image for analysis and open the event stream.
    ///
    /// A non-success response status is an API error carrying the body
    /// text; connection failures are transport errors. Both are fatal to
    /// the session.
    pub async fn open_stream(&self, request: &AnalysisRequest) -> Result<AnalysisStream> {
        let url = format!("{}/analyze/stream", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chunks = response
            .bytes_stream()
            .map(|r| r.map_err(|e| e.to_string()))
            .boxed();

        Ok(AnalysisStream::new(chunks))
    }
}

/// One open analysis event stream.
///
/// Not reusable across requests: the embedded decoder belongs to exactly
/// one byte stream.
pub struct AnalysisStream {
    chunks: BoxStream<'static, std::result::Result<Bytes, String>>,
    /// `None` once the stream ended or a transport error surfaced
    decoder: Option<FrameDecoder>,
    pending: VecDeque<RawFrame>,
}

impl AnalysisStream {
    fn new(chunks: BoxStream<'static, std::result::Result<Bytes, String>>) -> Self {
        Self {
            chunks,
            decoder: Some(FrameDecoder::new()),
            pending: VecDeque::new(),
        }
    }

    /// Await the next classified event.
    ///
    /// Returns `Ok(None)` on clean end-of-stream. Malformed records are
    /// skipped here (the classifier logs them); only transport failures
    /// and decoder overflow become errors, and after an error the stream
    /// yields no further events.
    pub async fn next_event(&mut self) -> Result<Option<AnalysisEvent>> {
        loop {
            // Drain already-decoded frames first
            while let Some(frame) = self.pending.pop_front() {
                if let Some(event) = classify(&frame.payload) {
                    return Ok(Some(event));
                }
            }

            if self.decoder.is_none() {
                return Ok(None);
            }

            match self.chunks.next().await {
                Some(Ok(chunk)) => {
                    if let Some(decoder) = self.decoder.as_mut() {
                        match decoder.push(&chunk) {
                            Ok(frames) => self.pending.extend(frames),
                            Err(e) => {
                                self.decoder = None;
                                return Err(e);
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    self.decoder = None;
                    return Err(Error::Transport(format!("stream read failed: {}", e)));
                }
                None => {
                    // Clean close: anything still buffered is an
                    // incomplete record and is discarded
                    if let Some(decoder) = self.decoder.take() {
                        decoder.finish();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_of(chunks: Vec<std::result::Result<&'static [u8], &'static str>>) -> AnalysisStream {
        let items: Vec<std::result::Result<Bytes, String>> = chunks
            .into_iter()
            .map(|r| r.map(Bytes::from_static).map_err(String::from))
            .collect();
        AnalysisStream::new(futures::stream::iter(items).boxed())
    }

    #[test]
    fn test_client_requires_valid_config() {
        let config = ServiceConfig {
            base_url: String::new(),
            ..Default::default()
        };
        assert!(AnalysisClient::new(&config).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ServiceConfig {
            base_url: "http://localhost:8000/".to_string(),
            ..Default::default()
        };
        let client = AnalysisClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_stream_yields_classified_events() {
        let mut stream = stream_of(vec![
            Ok(b"event: progress\ndata: {\"message\":\"scan"),
            Ok(b"ning\"}\n"),
            Ok(b"data: {\"image_summary\":\"s\",\"total_attributes\":0,\"processing_time_ms\":5.0}\n"),
        ]);

        assert_eq!(
            stream.next_event().await.unwrap(),
            Some(AnalysisEvent::Progress {
                message: "scanning".to_string()
            })
        );
        assert!(matches!(
            stream.next_event().await.unwrap(),
            Some(AnalysisEvent::Complete { .. })
        ));
        assert_eq!(stream.next_event().await.unwrap(), None);
        // Idempotent after close
        assert_eq!(stream.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_records_skipped() {
        let mut stream = stream_of(vec![
            Ok(b"data: {broken\ndata: {\"message\":\"alive\"}\n"),
        ]);
        assert_eq!(
            stream.next_event().await.unwrap(),
            Some(AnalysisEvent::Progress {
                message: "alive".to_string()
            })
        );
        assert_eq!(stream.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal() {
        let mut stream = stream_of(vec![
            Ok(b"data: {\"message\":\"one\"}\n"),
            Err("connection reset"),
            Ok(b"data: {\"message\":\"after\"}\n"),
        ]);
        assert!(matches!(
            stream.next_event().await.unwrap(),
            Some(AnalysisEvent::Progress { .. })
        ));
        assert!(matches!(
            stream.next_event().await,
            Err(Error::Transport(_))
        ));
        // No events after the failure, even though bytes followed it
        assert_eq!(stream.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unterminated_tail_discarded() {
        let mut stream = stream_of(vec![Ok(b"data: {\"message\":\"whole\"}\ndata: {\"mess")]);
        assert!(matches!(
            stream.next_event().await.unwrap(),
            Some(AnalysisEvent::Progress { .. })
        ));
        assert_eq!(stream.next_event().await.unwrap(), None);
    }
}
