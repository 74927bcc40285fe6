//! # specter-core
//!
//! Core library for Specter Vision - a streaming image analysis client.
//!
//! This library provides:
//! - An incremental frame decoder for the service's event byte stream
//! - Shape-based classification of stream payloads into analysis events
//! - The session state machine accumulating attributes, summary, and log
//! - The overlay renderer compositing attribute markers onto the image
//! - A streaming HTTP client, configuration, and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through a single pipeline:
//! transport bytes → [`stream::FrameDecoder`] → frames →
//! [`classify::classify`] → events → [`session::Session`] → snapshots
//! read by the log view and the [`overlay::OverlayRenderer`].
//!
//! The session is single-writer: only the stream-consuming path mutates
//! it, and every mutation presents the [`session::Generation`] token
//! minted at start, so a stale stream can never corrupt a newer session.
//!
//! ## Example
//!
//! ```rust,no_run
//! use specter_core::{AnalysisClient, AnalysisRequest, Config, ImageMime, Session};
//!
//! # async fn run() -> specter_core::Result<()> {
//! let config = Config::load()?;
//! let client = AnalysisClient::new(&config.service)?;
//! let request = AnalysisRequest::new(&std::fs::read("photo.png")?, ImageMime::Png);
//!
//! let mut session = Session::new();
//! let generation = session.start();
//! let mut stream = client.open_stream(&request).await?;
//! while let Some(event) = stream.next_event().await? {
//!     session.apply(generation, &event);
//! }
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use classify::AnalysisEvent;
pub use client::{AnalysisClient, AnalysisStream};
pub use config::Config;
pub use error::{Error, Result};
pub use overlay::OverlayRenderer;
pub use session::{Generation, Session};
pub use types::*;

// Public modules
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod overlay;
pub mod session;
pub mod stream;
pub mod types;
