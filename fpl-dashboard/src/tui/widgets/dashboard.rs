// Dashboard view: live league table, gameweek highlights, and the selected
// team's points breakdown.
//
// +---------------------------+----------------------+
// | League table              | Highlights           |
// |                           +----------------------+
// |                           | Breakdown (selected) |
// +---------------------------+----------------------+

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::tui::layout::split_columns;
use crate::tui::ViewState;
use crate::views::breakdown::{team_breakdown, BreakdownRow};
use crate::views::standings::{gameweek_highlights, league_table, GameweekHighlights, Highlight};

use super::focused_border_style;

const HIGHLIGHTS_HEIGHT: u16 = 5;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let (left, right) = split_columns(area, 55);
    render_table(frame, left, state);

    let right_rows = Layout::vertical([Constraint::Length(HIGHLIGHTS_HEIGHT), Constraint::Min(3)])
        .split(right);
    render_highlights(frame, right_rows[0], state);
    render_breakdown(frame, right_rows[1], state);
}

// ---------------------------------------------------------------------------
// League table
// ---------------------------------------------------------------------------

fn render_table(frame: &mut Frame, area: Rect, state: &ViewState) {
    let header = Row::new(vec!["#", "Team", "Manager", "GW", "Bench", "Total", "Chip"])
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = league_table(state.teams())
        .into_iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.rank.to_string()),
                Cell::from(r.team_name),
                Cell::from(r.manager_name),
                Cell::from(r.live_gw_points.to_string()).style(Style::default().fg(Color::Green)),
                Cell::from(r.live_bench_points.to_string()).style(Style::default().fg(Color::DarkGray)),
                Cell::from(r.total_points.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(r.chip.map(|c| c.badge()).unwrap_or("")).style(Style::default().fg(Color::Magenta)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Min(14),
        Constraint::Min(12),
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(6),
        Constraint::Length(4),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("League Table")
                .border_style(focused_border_style(true, Style::default())),
        );
    let mut table_state = TableState::default().with_selected(Some(state.selected_team));
    frame.render_stateful_widget(table, area, &mut table_state);
}

// ---------------------------------------------------------------------------
// Highlights
// ---------------------------------------------------------------------------

fn render_highlights(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title("Gameweek Highlights");
    let lines = match gameweek_highlights(state.teams()) {
        Some(h) => highlight_lines(&h),
        None => vec![Line::from("No teams in this league.")],
    };
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn highlight_lines(h: &GameweekHighlights) -> Vec<Line<'static>> {
    let mut lines = vec![highlight_line("Top scorer", Color::Green, &h.top_scorer)];
    match &h.best_captain {
        Some(c) => lines.push(highlight_line("Best captain", Color::Yellow, c)),
        None => lines.push(Line::from(vec![
            Span::styled("Best captain: ", Style::default().fg(Color::Yellow)),
            Span::raw("none this gameweek"),
        ])),
    }
    lines.push(highlight_line("Bench blunder", Color::Red, &h.benching_blunder));
    lines
}

fn highlight_line(label: &str, color: Color, h: &Highlight) -> Line<'static> {
    let mut spans = vec![
        Span::styled(format!("{label}: "), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw(format!("{} ({}) ", h.team_name, h.manager_name)),
        Span::styled(format!("{} pts", h.points), Style::default().add_modifier(Modifier::BOLD)),
    ];
    if let Some(detail) = &h.detail {
        spans.push(Span::styled(format!(" - {detail}"), Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

fn render_breakdown(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(team) = state.selected() else {
        let empty = Paragraph::new("Select a team.")
            .block(Block::default().borders(Borders::ALL).title("Points Breakdown"));
        frame.render_widget(empty, area);
        return;
    };

    let header = Row::new(vec!["Player", "Pos", "Pts", "Extras"])
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let mut rows = Vec::new();
    for row in team_breakdown(team) {
        let separator = row.last_starter;
        rows.push(breakdown_row(&row));
        if separator {
            rows.push(
                Row::new(vec![Cell::from("-- bench --")])
                    .style(Style::default().fg(Color::DarkGray)),
            );
        }
    }
    let skip = usize::from(state.scroll("dashboard")).min(rows.len().saturating_sub(1));
    let rows: Vec<Row> = rows.into_iter().skip(skip).collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Min(10),
    ];
    let title = format!("Points Breakdown: {}", team.team_name);
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

fn breakdown_row(row: &BreakdownRow) -> Row<'static> {
    let name = if row.is_captain {
        format!("{} (C)", row.player_name)
    } else {
        row.player_name.clone()
    };
    Row::new(vec![
        Cell::from(name),
        Cell::from(row.position.short()),
        Cell::from(row.live_points.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format_extras(row)),
    ])
}

/// "Bonus +3, Saves +1" style summary, empty when nothing extra was scored.
pub fn format_extras(row: &BreakdownRow) -> String {
    row.extra
        .items
        .iter()
        .map(|i| format!("{} {:+}", i.label, i.points))
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
