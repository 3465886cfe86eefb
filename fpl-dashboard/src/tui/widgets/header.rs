// Header: league name, gameweek and the view tabs.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Tabs};
use ratatui::Frame;

use crate::protocol::View;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!("{} {}", i + 1, v.label())))
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(build_title(state)))
        .select(state.active_view.index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider(Span::styled("|", Style::default().fg(Color::DarkGray)));
    frame.render_widget(tabs, area);
}

fn build_title(state: &ViewState) -> Line<'static> {
    let mut spans = vec![Span::styled(
        " FPL Mini-League ",
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
    )];
    if let Some(league) = &state.league {
        spans.push(Span::raw(format!(
            "-- {} (GW{}) ",
            league.league_name, league.current_gameweek
        )));
    }
    if state.details_loading {
        spans.push(Span::styled(
            "loading details... ",
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}
