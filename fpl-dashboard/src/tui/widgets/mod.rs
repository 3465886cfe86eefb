// Widget modules for each dashboard panel, plus the styling helpers they
// share.

pub mod analysis;
pub mod dashboard;
pub mod error_banner;
pub mod header;
pub mod help_bar;
pub mod history;
pub mod league_input;
pub mod loading;
pub mod players;
pub mod pvp;
pub mod quit_confirm;
pub mod scout;

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::protocol::LlmStatus;
use crate::tui::AnalysisView;

pub const LLM_DISABLED_TEXT: &str = "AI features disabled (no API key configured)";

/// Highlight the border of the panel that has keyboard focus.
pub fn focused_border_style(focused: bool, base: Style) -> Style {
    if focused {
        base.fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        base
    }
}

/// Status text and color for an analysis.
pub fn status_indicator(status: LlmStatus) -> (&'static str, Color) {
    match status {
        LlmStatus::Idle => ("press a to analyze", Color::DarkGray),
        LlmStatus::Streaming => ("analyzing...", Color::Yellow),
        LlmStatus::Complete => ("complete", Color::Green),
        LlmStatus::Error => ("error", Color::Red),
    }
}

/// Panel title with the analysis status appended.
pub fn analysis_title(label: &str, view: Option<&AnalysisView>) -> Line<'static> {
    let status = view.map(|v| v.status).unwrap_or_default();
    let (status_text, status_color) = status_indicator(status);
    Line::from(vec![
        Span::styled(label.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(" -- ", Style::default().fg(Color::DarkGray)),
        Span::styled(status_text, Style::default().fg(status_color)),
    ])
}

/// Body for an analysis that has no parsed result yet: the error, the
/// streamed text, or a placeholder.
pub fn pending_text(view: Option<&AnalysisView>, llm_enabled: bool, idle_hint: &str) -> String {
    if !llm_enabled {
        return LLM_DISABLED_TEXT.to_string();
    }
    match view {
        Some(v) if v.error.is_some() => v.error.clone().unwrap_or_default(),
        Some(v) if v.status == LlmStatus::Streaming && v.text.is_empty() => {
            "Waiting for response...".to_string()
        }
        Some(v) if !v.text.is_empty() => v.text.clone(),
        _ => idle_hint.to_string(),
    }
}

/// Render `pending_text` in a bordered panel, auto-scrolling while streaming.
pub fn render_pending(
    frame: &mut Frame,
    area: Rect,
    title: Line<'static>,
    view: Option<&AnalysisView>,
    llm_enabled: bool,
    idle_hint: &str,
) {
    let content = pending_text(view, llm_enabled, idle_hint);
    let inner_height = area.height.saturating_sub(2) as usize;
    let line_count = content.lines().count();
    let streaming = view.is_some_and(|v| v.status == LlmStatus::Streaming);
    let scroll = if streaming && line_count > inner_height {
        (line_count - inner_height) as u16
    } else {
        0
    };
    let style = match view.map(|v| v.status) {
        Some(LlmStatus::Error) => Style::default().fg(Color::Red),
        _ if !llm_enabled => Style::default().fg(Color::DarkGray),
        _ => Style::default(),
    };
    let paragraph = Paragraph::new(content)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Colour for a 0-100 team strength score.
pub fn strength_color(score: f64) -> Color {
    if score >= 85.0 {
        Color::Green
    } else if score >= 70.0 {
        Color::Yellow
    } else if score >= 50.0 {
        Color::LightRed
    } else {
        Color::Red
    }
}

/// Colour for a 0-100 luck score; high is lucky.
pub fn luck_color(score: f64) -> Color {
    if score >= 80.0 {
        Color::Green
    } else if score >= 60.0 {
        Color::LightGreen
    } else if score >= 40.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Background colour for an FPL fixture difficulty rating.
pub fn difficulty_color(difficulty: u8) -> Color {
    match difficulty {
        1 => Color::Rgb(0, 135, 60),
        2 => Color::Rgb(1, 252, 122),
        3 => Color::Rgb(200, 200, 200),
        4 => Color::Rgb(255, 23, 81),
        5 => Color::Rgb(128, 7, 45),
        _ => Color::DarkGray,
    }
}

/// Foreground that stays readable on `difficulty_color`.
pub fn difficulty_text_color(difficulty: u8) -> Color {
    match difficulty {
        2 | 3 => Color::Black,
        _ => Color::White,
    }
}

/// Colour for a club's recent form by wins in the form window.
pub fn form_color(win_count: usize) -> Color {
    match win_count {
        3.. => Color::Green,
        2 => Color::LightGreen,
        1 => Color::Yellow,
        0 => Color::Red,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
