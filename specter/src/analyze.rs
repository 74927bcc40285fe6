//! specter-analyze - headless CLI for one streamed analysis
//!
//! Streams the analysis transcript to stdout line by line and writes the
//! rendered overlay PNG on completion. Exits non-zero when the session
//! fails.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use specter_core::format::{format_elapsed_ms, log_kind_tag};
use specter_core::overlay::OverlayRenderer;
use specter_core::session::Session;
use specter_core::types::{AnalysisRequest, ImageMime, SessionStatus};
use specter_core::{AnalysisClient, Config};

#[derive(Parser)]
#[command(name = "specter-analyze")]
#[command(about = "Analyze one image and write its attribute overlay")]
#[command(version)]
struct Args {
    /// Image to analyze (png, jpeg, or webp)
    image: PathBuf,

    /// Overlay output path (default: <image>-overlay.png)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Override the analysis service base URL
    #[arg(long)]
    server: Option<String>,

    /// MIME type sent to the service (default: guessed from extension)
    #[arg(long)]
    mime: Option<ImageMime>,

    /// Skip writing the overlay image
    #[arg(long)]
    no_overlay: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        specter_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let image_bytes =
        std::fs::read(&args.image).with_context(|| format!("failed to read {:?}", args.image))?;
    let mime = match args.mime.or_else(|| ImageMime::from_path(&args.image)) {
        Some(mime) => mime,
        None => bail!(
            "unsupported image type {:?} (expected png, jpeg, or webp)",
            args.image
        ),
    };
    let request = AnalysisRequest::new(&image_bytes, mime);

    let mut service = config.service.clone();
    if let Some(server) = args.server {
        service.base_url = server;
    }
    let client = AnalysisClient::new(&service).context("failed to create analysis client")?;

    if !client.health_check().await? {
        eprintln!(
            "warning: analysis service at {} is not answering its health endpoint",
            client.base_url()
        );
    }

    println!("analyzing {} ({})", args.image.display(), mime);

    let mut session = Session::new();
    let generation = session.start();
    let mut printed = 0usize;

    match client.open_stream(&request).await {
        Ok(mut stream) => loop {
            match stream.next_event().await {
                Ok(Some(event)) => {
                    session.apply(generation, &event);
                    printed = print_new_log_lines(&session, printed);
                }
                Ok(None) => {
                    if !session.status().is_terminal() {
                        session.fail(generation, "stream ended before completion");
                        print_new_log_lines(&session, printed);
                    }
                    break;
                }
                Err(e) => {
                    session.fail(generation, &e.to_string());
                    print_new_log_lines(&session, printed);
                    break;
                }
            }
        },
        Err(e) => {
            session.fail(generation, &e.to_string());
            print_new_log_lines(&session, printed);
        }
    }

    match session.status() {
        SessionStatus::Complete => {
            println!();
            if let Some(summary) = session.summary() {
                println!("summary: {}", summary);
            }
            if let Some(elapsed) = session.elapsed_ms() {
                println!(
                    "{} attributes in {}",
                    session.attributes().len(),
                    format_elapsed_ms(elapsed)
                );
            }

            if !args.no_overlay {
                let image = image::load_from_memory(&image_bytes)
                    .with_context(|| format!("failed to decode {:?}", args.image))?;
                let renderer = OverlayRenderer::new(config.overlay.width, config.overlay.height);
                let overlay = renderer.render(&image, session.attributes());
                let out = args.out.unwrap_or_else(|| default_overlay_path(&args.image));
                overlay
                    .save(&out)
                    .with_context(|| format!("failed to write {}", out.display()))?;
                println!("overlay written to {}", out.display());
            }
            Ok(())
        }
        _ => {
            let reason = session
                .failure_message()
                .unwrap_or("analysis did not complete");
            bail!("{}", reason);
        }
    }
}

/// Print log lines appended since the last call; returns the new count.
fn print_new_log_lines(session: &Session, already_printed: usize) -> usize {
    for line in &session.log()[already_printed..] {
        println!("{} {}", log_kind_tag(line.kind), line.text);
    }
    session.log().len()
}

/// Default overlay output path: `<stem>-overlay.png` beside the source
fn default_overlay_path(image_path: &std::path::Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    image_path.with_file_name(format!("{}-overlay.png", stem))
}
