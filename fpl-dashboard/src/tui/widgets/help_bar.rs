// Help bar: context-sensitive keyboard shortcuts.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::{AnalysisSection, View};
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = Vec::new();
    for (key, action) in shortcuts(state) {
        spans.push(Span::styled(
            key,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {action}  "),
            Style::default().fg(Color::Gray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// `(key, action)` pairs for the current mode.
fn shortcuts(state: &ViewState) -> Vec<(&'static str, &'static str)> {
    if state.confirm_quit {
        return vec![("y", "quit"), ("n", "cancel")];
    }
    let mut keys = Vec::new();
    if state.league_loading.is_some() {
        keys.push(("q", "quit"));
    } else if state.league.is_none() {
        keys.extend([("0-9", "league id"), ("Enter", "load"), ("q", "quit")]);
    } else {
        keys.push(("1-6", "views"));
        match state.active_view {
            View::Dashboard => keys.push(("j/k", "select team")),
            View::History => keys.extend([("j/k", "scroll"), ("t", "filter transfers")]),
            View::Analysis => {
                keys.push(("Tab", "section"));
                match state.analysis_section {
                    AnalysisSection::Strength => keys.extend([("j/k", "select team"), ("a", "analyze")]),
                    AnalysisSection::Ticker => keys.push(("j/k", "scroll")),
                    _ => keys.extend([("j/k", "scroll"), ("a", "analyze")]),
                }
            }
            View::Pvp => keys.extend([("[/]", "change teams"), ("a", "compare")]),
            View::Players => keys.push(("j/k", "scroll")),
            View::Scout => keys.extend([("j/k", "select team"), ("a", "scout")]),
        }
        keys.extend([("l", "change league"), ("q", "quit")]);
    }
    if state.error.is_some() {
        keys.push(("x", "dismiss error"));
    }
    keys
}
