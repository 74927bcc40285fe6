//! TUI rendering for the specter frontend
//!
//! Layout: a status header, the scrolling terminal log on the left, the
//! discovered-attribute panel and image summary on the right, and a
//! one-line key footer. Log lines keep the same color channel per kind
//! that the session model assigns them.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use specter_core::format::{format_elapsed_ms, intensity_meter, log_kind_tag};
use specter_core::types::{LogKind, SessionStatus};

use crate::app::App;

const NEON_CYAN: Color = Color::Rgb(0x00, 0xf5, 0xff);
const NEON_MAGENTA: Color = Color::Rgb(0xff, 0x00, 0xff);
const NEON_VIOLET: Color = Color::Rgb(0x8b, 0x5c, 0xf6);
const DIM: Color = Color::DarkGray;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(3), // Status header
        Constraint::Min(5),    // Log | attributes
        Constraint::Length(1), // Footer
    ])
    .split(area);

    render_header(frame, app, chunks[0]);

    let body = Layout::horizontal([
        Constraint::Percentage(55), // Terminal log
        Constraint::Percentage(45), // Attributes + summary
    ])
    .split(chunks[1]);

    render_log_panel(frame, app, body[0]);
    render_attribute_panel(frame, app, body[1]);

    render_footer(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" SPECTER VISION ")
        .title_style(Style::default().fg(NEON_CYAN).bold())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(NEON_CYAN));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let status = app.session.status();
    let mut spans = vec![
        Span::styled("status ", Style::default().fg(DIM)),
        Span::styled(status.as_str(), status_style(status).bold()),
        Span::styled("  │  ", Style::default().fg(DIM)),
        Span::styled(
            format!("{} attributes", app.session.attributes().len()),
            Style::default().fg(NEON_MAGENTA),
        ),
        Span::styled("  │  ", Style::default().fg(DIM)),
        Span::styled(
            app.image_path().display().to_string(),
            Style::default().fg(Color::Gray),
        ),
        Span::styled("  │  ", Style::default().fg(DIM)),
        Span::styled(app.server_url().to_string(), Style::default().fg(DIM)),
    ];

    if let Some(elapsed) = app.session.elapsed_ms() {
        spans.push(Span::styled("  │  ", Style::default().fg(DIM)));
        spans.push(Span::styled(
            format_elapsed_ms(elapsed),
            Style::default().fg(Color::Green),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn render_log_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Stream ")
        .title_style(Style::default().fg(NEON_CYAN))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(DIM));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Tail the log: always show the most recent lines that fit
    let visible = inner.height as usize;
    let log = app.session.log();
    let start = log.len().saturating_sub(visible);

    let items: Vec<ListItem> = log[start..]
        .iter()
        .map(|line| {
            ListItem::new(Line::from(vec![
                Span::styled(log_kind_tag(line.kind), Style::default().fg(kind_color(line.kind))),
                Span::raw(" "),
                Span::styled(line.text.clone(), Style::default().fg(Color::Gray)),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items), inner);
}

fn render_attribute_panel(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Min(4),    // Attribute list
        Constraint::Length(6), // Summary
    ])
    .split(area);

    let block = Block::default()
        .title(" Attributes ")
        .title_style(Style::default().fg(NEON_MAGENTA))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(DIM));
    let inner = block.inner(chunks[0]);
    frame.render_widget(block, chunks[0]);

    let mut lines: Vec<Line> = Vec::new();
    for (idx, attribute) in app.session.attributes().iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:>2}. ", idx + 1),
                Style::default().fg(DIM),
            ),
            Span::styled(
                attribute.name.clone(),
                Style::default().fg(intensity_color(attribute.intensity)).bold(),
            ),
            Span::styled(
                if attribute.location.is_some() { "  ◎" } else { "" },
                Style::default().fg(NEON_CYAN),
            ),
        ]));
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled(
                intensity_meter(attribute.intensity),
                Style::default().fg(intensity_color(attribute.intensity)),
            ),
            Span::styled(
                format!(" {}/10", attribute.intensity),
                Style::default().fg(DIM),
            ),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "no attributes discovered yet",
            Style::default().fg(DIM).italic(),
        )));
    }
    frame.render_widget(Paragraph::new(lines), inner);

    render_summary_panel(frame, app, chunks[1]);
}

fn render_summary_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Summary ")
        .title_style(Style::default().fg(NEON_CYAN))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(DIM));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = match (app.session.summary(), app.session.failure_message()) {
        (_, Some(failure)) => Line::from(Span::styled(
            failure.to_string(),
            Style::default().fg(Color::Red),
        )),
        (Some(summary), None) => Line::from(Span::styled(
            summary.to_string(),
            Style::default().fg(Color::Gray),
        )),
        (None, None) => Line::from(Span::styled(
            "summary arrives on completion",
            Style::default().fg(DIM).italic(),
        )),
    };

    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let hint = match app.notice.as_deref() {
        Some(notice) => Line::from(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::Green),
        )),
        None => Line::from(vec![
            Span::styled(" a", Style::default().fg(NEON_CYAN).bold()),
            Span::styled(" analyze  ", Style::default().fg(DIM)),
            Span::styled("r", Style::default().fg(NEON_CYAN).bold()),
            Span::styled(" reset  ", Style::default().fg(DIM)),
            Span::styled("s", Style::default().fg(NEON_CYAN).bold()),
            Span::styled(" save overlay  ", Style::default().fg(DIM)),
            Span::styled("q", Style::default().fg(NEON_CYAN).bold()),
            Span::styled(" quit", Style::default().fg(DIM)),
        ]),
    };
    frame.render_widget(Paragraph::new(hint), area);
}

fn status_style(status: SessionStatus) -> Style {
    match status {
        SessionStatus::Idle => Style::default().fg(DIM),
        SessionStatus::Connecting => Style::default().fg(Color::Yellow),
        SessionStatus::Streaming => Style::default().fg(NEON_CYAN),
        SessionStatus::Complete => Style::default().fg(Color::Green),
        SessionStatus::Failed => Style::default().fg(Color::Red),
    }
}

fn kind_color(kind: LogKind) -> Color {
    match kind {
        LogKind::Info => NEON_CYAN,
        LogKind::Success => Color::Green,
        LogKind::Warning => Color::Yellow,
        LogKind::Error => Color::Red,
        LogKind::Data => NEON_MAGENTA,
    }
}

/// Attribute accent color follows the overlay marker tiers
fn intensity_color(intensity: u8) -> Color {
    if intensity >= 8 {
        NEON_MAGENTA
    } else if intensity >= 5 {
        NEON_CYAN
    } else {
        NEON_VIOLET
    }
}
