//! specter - Specter Vision terminal client
//!
//! Interactive TUI for submitting an image to the analysis service and
//! watching the discovered attributes stream in live.

mod app;
mod ui;

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use specter_core::overlay::OverlayRenderer;
use specter_core::types::{AnalysisRequest, ImageMime};
use specter_core::{AnalysisClient, Config};

use crate::app::App;

#[derive(Parser)]
#[command(name = "specter")]
#[command(about = "Stream an image analysis and watch attributes arrive live")]
#[command(version)]
struct Args {
    /// Image to analyze (png, jpeg, or webp)
    image: PathBuf,

    /// Override the analysis service base URL
    #[arg(long)]
    server: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard =
        specter_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("specter TUI starting up");

    // Load the image up front; a broken input should fail before the
    // terminal is put into raw mode
    let image_bytes =
        std::fs::read(&args.image).with_context(|| format!("failed to read {:?}", args.image))?;
    let Some(mime) = ImageMime::from_path(&args.image) else {
        bail!(
            "unsupported image type {:?} (expected png, jpeg, or webp)",
            args.image
        );
    };
    let image = image::load_from_memory(&image_bytes)
        .with_context(|| format!("failed to decode {:?}", args.image))?;
    let request = AnalysisRequest::new(&image_bytes, mime);

    let mut service = config.service.clone();
    if let Some(server) = args.server {
        service.base_url = server;
    }
    let client = AnalysisClient::new(&service).context("failed to create analysis client")?;
    let renderer = OverlayRenderer::new(config.overlay.width, config.overlay.height);

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

    // Probe the service before taking over the terminal so a dead
    // endpoint is visible on plain stderr
    if !runtime.block_on(client.health_check()).unwrap_or(false) {
        eprintln!(
            "warning: analysis service at {} is not answering its health endpoint",
            client.base_url()
        );
    }

    let mut app = App::new(client, runtime, image, args.image, request, renderer);

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    tracing::info!("specter TUI shutting down");

    result
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Apply any stream events that arrived since the last tick; the
        // draw below always sees a fully applied session state
        app.tick();

        // Render
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
