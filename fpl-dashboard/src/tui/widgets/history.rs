// History view: cumulative points chart above the league's transfer log.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use crate::tui::ViewState;
use crate::views::history::{gameweek_label, performance_series};
use crate::views::transfers::{
    net_transfer_gain, team_transfers, transfers_by_gameweek, GameweekTransfers,
};

use super::loading;

/// Series colours, cycled when the league has more teams.
const PALETTE: [Color; 8] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
    Color::White,
    Color::LightMagenta,
];

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    if state.details_loading {
        loading::render(frame, area, "Loading team history...", state.tick);
        return;
    }
    let rows = Layout::vertical([Constraint::Percentage(60), Constraint::Percentage(40)]).split(area);
    render_chart(frame, rows[0], state);
    render_transfers(frame, rows[1], state);
}

fn render_chart(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title("Season Performance");
    let Some(chart) = performance_series(state.teams()) else {
        frame.render_widget(Paragraph::new("No gameweek history yet.").block(block), area);
        return;
    };

    let datasets: Vec<Dataset> = chart
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Dataset::default()
                .name(s.team_name.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(&s.points)
        })
        .collect();

    let [x0, x1] = chart.x_bounds;
    let [y0, y1] = chart.y_bounds;
    let x_labels = vec![gameweek_label(x0), gameweek_label((x0 + x1) / 2.0), gameweek_label(x1)];
    let y_labels = vec![
        format!("{y0:.0}"),
        format!("{:.0}", (y0 + y1) / 2.0),
        format!("{y1:.0}"),
    ];

    let widget = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds(chart.x_bounds)
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("Total")
                .style(Style::default().fg(Color::Gray))
                .bounds(chart.y_bounds)
                .labels(y_labels),
        );
    frame.render_widget(widget, area);
}

fn render_transfers(frame: &mut Frame, area: Rect, state: &ViewState) {
    let filtered = state.transfer_filter.and_then(|i| state.team_at(i));
    let (title, groups) = match filtered {
        Some(team) => (
            format!(
                "Transfers: {} (net {:+}, t to change)",
                team.team_name,
                net_transfer_gain(team)
            ),
            team_transfers(team),
        ),
        None => (
            "Transfers: all teams (t to filter)".to_string(),
            transfers_by_gameweek(state.teams()),
        ),
    };

    let lines = transfer_lines(&groups);
    let lines = if lines.is_empty() {
        vec![Line::from("No transfers made.")]
    } else {
        lines
    };
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((state.scroll("history"), 0));
    frame.render_widget(paragraph, area);
}

fn transfer_lines(groups: &[GameweekTransfers]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for group in groups {
        lines.push(Line::from(Span::styled(
            format!("GW{}", group.gameweek),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        for manager in &group.managers {
            let net = manager.net_points();
            let net_color = match net {
                n if n > 0 => Color::Green,
                n if n < 0 => Color::Red,
                _ => Color::Gray,
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {} ({})", manager.team_name, manager.manager_name),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  net {net:+}"), Style::default().fg(net_color)),
            ]));
            for t in &manager.transfers {
                lines.push(Line::from(vec![
                    Span::styled("    in ", Style::default().fg(Color::Green)),
                    Span::raw(format!("{} ({})", t.player_in, t.player_in_points)),
                    Span::styled("  out ", Style::default().fg(Color::Red)),
                    Span::raw(format!("{} ({})", t.player_out, t.player_out_points)),
                ]));
            }
        }
    }
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
