// Players view: most owned players and differentials across the league.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use crate::tui::layout::split_columns;
use crate::tui::ViewState;
use crate::views::ownership::{ownership_summary, OwnershipRow};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(summary) = ownership_summary(state.teams()) else {
        let paragraph = Paragraph::new("Ownership needs at least two teams in the league.")
            .block(Block::default().borders(Borders::ALL).title("Players"));
        frame.render_widget(paragraph, area);
        return;
    };

    let skip = usize::from(state.scroll("players"));
    let (left, right) = split_columns(area, 50);
    render_list(frame, left, "Most Owned", &summary.most_owned, skip, Color::Cyan);
    render_list(frame, right, "Differentials", &summary.differentials, skip, Color::Magenta);
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[OwnershipRow],
    skip: usize,
    accent: Color,
) {
    let header = Row::new(vec!["Player", "Pos", "Club", "Teams", "Own%"])
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let body: Vec<Row> = rows
        .iter()
        .skip(skip.min(rows.len().saturating_sub(1)))
        .map(|r| {
            Row::new(vec![
                Cell::from(r.name.clone()),
                Cell::from(r.position.short()),
                Cell::from(r.club.clone()),
                Cell::from(r.count.to_string()),
                Cell::from(format_percentage(r.percentage)).style(Style::default().fg(accent)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(14),
        Constraint::Length(4),
        Constraint::Min(10),
        Constraint::Length(5),
        Constraint::Length(6),
    ];
    let table = Table::new(body, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(Style::default().fg(accent)),
    );
    frame.render_widget(table, area);
}

/// Whole-number percentage, e.g. `66%`.
pub fn format_percentage(percentage: f64) -> String {
    format!("{percentage:.0}%")
}
