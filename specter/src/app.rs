//! Application state for the specter TUI
//!
//! The app owns the [`Session`] and is its only writer: the background
//! stream task never touches it, it just forwards events over a channel
//! that [`App::tick`] drains on the UI thread. Applying events presents
//! the generation token minted at start, so output from an aborted or
//! superseded stream is ignored instead of corrupting the new session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use image::{DynamicImage, RgbaImage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use specter_core::classify::AnalysisEvent;
use specter_core::overlay::OverlayRenderer;
use specter_core::session::{Generation, Session};
use specter_core::types::AnalysisRequest;
use specter_core::AnalysisClient;

/// Message from the background stream task to the UI thread
pub enum StreamUpdate {
    Event(AnalysisEvent),
    TransportError(String),
    Closed,
}

pub struct App {
    pub session: Session,
    pub should_quit: bool,
    /// Transient one-line note shown in the footer (e.g. save path)
    pub notice: Option<String>,

    client: AnalysisClient,
    runtime: tokio::runtime::Runtime,
    request: AnalysisRequest,
    generation: Option<Generation>,
    stream_task: Option<JoinHandle<()>>,
    updates: Option<mpsc::UnboundedReceiver<StreamUpdate>>,

    image: DynamicImage,
    image_path: PathBuf,
    renderer: OverlayRenderer,
    overlay: RgbaImage,
}

impl App {
    pub fn new(
        client: AnalysisClient,
        runtime: tokio::runtime::Runtime,
        image: DynamicImage,
        image_path: PathBuf,
        request: AnalysisRequest,
        renderer: OverlayRenderer,
    ) -> Self {
        let overlay = renderer.render(&image, &[]);
        Self {
            session: Session::new(),
            should_quit: false,
            notice: None,
            client,
            runtime,
            request,
            generation: None,
            stream_task: None,
            updates: None,
            image,
            image_path,
            renderer,
            overlay,
        }
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub fn server_url(&self) -> &str {
        self.client.base_url()
    }

    /// Begin (or restart) an analysis.
    ///
    /// Any prior stream task is aborted first; its late output is also
    /// fenced off by the fresh generation token.
    pub fn start_analysis(&mut self) {
        self.abort_stream();

        let generation = self.session.start();
        self.generation = Some(generation);
        self.notice = None;
        self.render_overlay();

        let (tx, rx) = mpsc::unbounded_channel();
        self.updates = Some(rx);

        let client = self.client.clone();
        let request = self.request.clone();
        self.stream_task = Some(self.runtime.spawn(async move {
            match client.open_stream(&request).await {
                Ok(mut stream) => loop {
                    match stream.next_event().await {
                        Ok(Some(event)) => {
                            if tx.send(StreamUpdate::Event(event)).is_err() {
                                break;
                            }
                        }
                        Ok(None) => {
                            let _ = tx.send(StreamUpdate::Closed);
                            break;
                        }
                        Err(e) => {
                            let _ = tx.send(StreamUpdate::TransportError(e.to_string()));
                            break;
                        }
                    }
                },
                Err(e) => {
                    let _ = tx.send(StreamUpdate::TransportError(e.to_string()));
                }
            }
        }));
    }

    /// Discard the session and return to idle
    pub fn reset(&mut self) {
        self.abort_stream();
        self.session.reset();
        self.generation = None;
        self.notice = None;
        self.render_overlay();
    }

    /// Drain pending stream updates; called once per UI tick.
    ///
    /// This is the only place session mutations happen, so a render
    /// after `tick` always sees a fully applied state.
    pub fn tick(&mut self) {
        let Some(generation) = self.generation else {
            return;
        };
        let Some(rx) = self.updates.as_mut() else {
            return;
        };

        let mut attributes_changed = false;
        let mut disconnected = false;
        loop {
            match rx.try_recv() {
                Ok(StreamUpdate::Event(event)) => {
                    let before = self.session.attributes().len();
                    self.session.apply(generation, &event);
                    if self.session.attributes().len() != before {
                        attributes_changed = true;
                    }
                }
                Ok(StreamUpdate::TransportError(message)) => {
                    self.session.fail(generation, &message);
                }
                Ok(StreamUpdate::Closed) => {
                    // A clean close without a completion event means the
                    // service went away mid-analysis
                    self.session.fail(generation, "stream ended before completion");
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if disconnected {
            self.updates = None;
        }
        if attributes_changed {
            self.render_overlay();
        }
    }

    /// Write the current overlay canvas next to the source image
    pub fn save_overlay(&mut self) {
        let path = overlay_path(&self.image_path);
        match self.try_save_overlay(&path) {
            Ok(()) => {
                self.notice = Some(format!("overlay saved to {}", path.display()));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save overlay");
                self.notice = Some(format!("overlay save failed: {}", e));
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('a') | KeyCode::Enter => self.start_analysis(),
            KeyCode::Char('r') => self.reset(),
            KeyCode::Char('s') => self.save_overlay(),
            _ => {}
        }
    }

    fn try_save_overlay(&self, path: &Path) -> Result<()> {
        self.overlay
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    fn render_overlay(&mut self) {
        self.overlay = self.renderer.render(&self.image, self.session.attributes());
    }

    fn abort_stream(&mut self) {
        if let Some(task) = self.stream_task.take() {
            task.abort();
        }
        self.updates = None;
    }
}

/// Default overlay output path: `<stem>-overlay.png` beside the source
pub fn overlay_path(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    image_path.with_file_name(format!("{}-overlay.png", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_path() {
        assert_eq!(
            overlay_path(Path::new("/tmp/photo.jpg")),
            PathBuf::from("/tmp/photo-overlay.png")
        );
        assert_eq!(
            overlay_path(Path::new("shot.webp")),
            PathBuf::from("shot-overlay.png")
        );
    }
}
