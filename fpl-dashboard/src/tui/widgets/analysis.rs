// Analysis view: AI team strength, final-standings predictions, luck
// ratings, key matches, and the fixture ticker. Tab cycles sections.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Tabs, Wrap};
use ratatui::Frame;

use crate::protocol::{AnalysisKey, AnalysisResult, AnalysisSection};
use crate::tui::layout::split_columns;
use crate::tui::ViewState;
use crate::views::fixtures::{fixture_ticker, TickerRow};

use super::{
    analysis_title, difficulty_color, difficulty_text_color, form_color, loading, luck_color,
    render_pending, strength_color,
};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let rows = Layout::vertical([Constraint::Length(1), Constraint::Min(3)]).split(area);
    render_section_tabs(frame, rows[0], state.analysis_section);

    let body = rows[1];
    if state.details_loading && state.analysis_section != AnalysisSection::Ticker {
        loading::render(frame, body, "Loading team details...", state.tick);
        return;
    }
    match state.analysis_section {
        AnalysisSection::Strength => render_strength(frame, body, state),
        AnalysisSection::Predictions => render_predictions(frame, body, state),
        AnalysisSection::Luck => render_luck(frame, body, state),
        AnalysisSection::KeyMatches => render_key_matches(frame, body, state),
        AnalysisSection::Ticker => render_ticker(frame, body, state),
    }
}

fn render_section_tabs(frame: &mut Frame, area: Rect, active: AnalysisSection) {
    let titles: Vec<&str> = AnalysisSection::ALL.iter().map(|s| s.label()).collect();
    let selected = AnalysisSection::ALL
        .iter()
        .position(|s| *s == active)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

// ---------------------------------------------------------------------------
// Team strength
// ---------------------------------------------------------------------------

fn strength_score(state: &ViewState, team_id: u64) -> Option<f64> {
    match state.analysis(AnalysisKey::TeamStrength(team_id))?.result.as_ref()? {
        AnalysisResult::TeamStrength(r) => Some(r.score),
        _ => None,
    }
}

fn render_strength(frame: &mut Frame, area: Rect, state: &ViewState) {
    let (left, right) = split_columns(area, 35);

    let items: Vec<ListItem> = state
        .team_order
        .iter()
        .filter_map(|id| state.league.as_ref()?.team(*id))
        .map(|team| {
            let score = match strength_score(state, team.id) {
                Some(s) => Span::styled(format!("{s:>5.1}"), Style::default().fg(strength_color(s))),
                None => Span::styled("    -", Style::default().fg(Color::DarkGray)),
            };
            ListItem::new(Line::from(vec![score, Span::raw(format!("  {}", team.team_name))]))
        })
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Teams"))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    let mut list_state = ListState::default().with_selected(Some(state.selected_team));
    frame.render_stateful_widget(list, left, &mut list_state);

    let Some(team) = state.selected() else {
        return;
    };
    let key = AnalysisKey::TeamStrength(team.id);
    let view = state.analysis(key);
    let title = analysis_title(&format!("Strength: {}", team.team_name), view);
    match view.and_then(|v| v.result.as_ref()) {
        Some(AnalysisResult::TeamStrength(r)) => {
            let lines = vec![
                Line::from(vec![
                    Span::raw("Score: "),
                    Span::styled(
                        format!("{:.0}/100", r.score),
                        Style::default().fg(strength_color(r.score)).add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(""),
                Line::from(r.justification.clone()),
            ];
            render_result(frame, right, title, lines, state.scroll("analysis.strength"));
        }
        _ => render_pending(
            frame,
            right,
            title,
            view,
            state.llm_enabled,
            "Press a to rate this squad.",
        ),
    }
}

// ---------------------------------------------------------------------------
// Predictions, luck, key matches
// ---------------------------------------------------------------------------

fn render_predictions(frame: &mut Frame, area: Rect, state: &ViewState) {
    let view = state.analysis(AnalysisKey::Predictions);
    let title = analysis_title("Predicted Final Standings", view);
    match view.and_then(|v| v.result.as_ref()) {
        Some(AnalysisResult::Predictions(rows)) => {
            let mut lines = Vec::new();
            for p in rows {
                lines.push(Line::from(vec![
                    Span::styled(format!("{:>2}. ", p.rank), Style::default().fg(Color::Cyan)),
                    Span::styled(p.team_name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                ]));
                lines.push(Line::from(format!("    {}", p.justification)));
            }
            render_result(frame, area, title, lines, state.scroll("analysis.predictions"));
        }
        _ => render_pending(
            frame,
            area,
            title,
            view,
            state.llm_enabled,
            "Press a to predict the final standings.",
        ),
    }
}

fn render_luck(frame: &mut Frame, area: Rect, state: &ViewState) {
    let view = state.analysis(AnalysisKey::Luck);
    let title = analysis_title("Luck Ratings", view);
    match view.and_then(|v| v.result.as_ref()) {
        Some(AnalysisResult::Luck(rows)) => {
            let mut sorted: Vec<_> = rows.iter().collect();
            sorted.sort_by(|a, b| b.luck_score.total_cmp(&a.luck_score));
            let mut lines = Vec::new();
            for l in sorted {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{:>3.0} ", l.luck_score),
                        Style::default().fg(luck_color(l.luck_score)).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(l.team_name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                ]));
                lines.push(Line::from(format!("    {}", l.justification)));
            }
            render_result(frame, area, title, lines, state.scroll("analysis.luck"));
        }
        _ => render_pending(
            frame,
            area,
            title,
            view,
            state.llm_enabled,
            "Press a to rate each manager's luck this gameweek.",
        ),
    }
}

fn render_key_matches(frame: &mut Frame, area: Rect, state: &ViewState) {
    let view = state.analysis(AnalysisKey::KeyMatches);
    let label = match state.league.as_ref().and_then(|l| l.next_gameweek) {
        Some(gw) => format!("Key Matches: GW{gw}"),
        None => "Key Matches".to_string(),
    };
    let title = analysis_title(&label, view);
    match view.and_then(|v| v.result.as_ref()) {
        Some(AnalysisResult::KeyMatches(rows)) => {
            let mut lines = Vec::new();
            for m in rows {
                lines.push(Line::from(Span::styled(
                    m.fixture.clone(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(format!("    {}", m.justification)));
            }
            render_result(frame, area, title, lines, state.scroll("analysis.key_matches"));
        }
        _ => render_pending(
            frame,
            area,
            title,
            view,
            state.llm_enabled,
            "Press a to pick the fixtures that will swing the league.",
        ),
    }
}

fn render_result(frame: &mut Frame, area: Rect, title: Line<'static>, lines: Vec<Line<'static>>, scroll: u16) {
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Fixture ticker
// ---------------------------------------------------------------------------

fn render_ticker(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title("Fixture Ticker");
    let ticker = state
        .league
        .as_ref()
        .and_then(|l| fixture_ticker(&l.clubs, &l.fixtures, Some(l.current_gameweek)));
    let Some(rows) = ticker else {
        frame.render_widget(Paragraph::new("No fixture data available.").block(block), area);
        return;
    };

    let upcoming_len = rows.iter().map(|r| r.upcoming.len()).max().unwrap_or(0);

    // Clubs can blank or double up, so columns are fixture order, not gameweeks.
    let mut header_cells = vec![Cell::from("Club"), Cell::from("Form")];
    header_cells.extend((1..=upcoming_len).map(|i| Cell::from(format!("+{i}"))));
    let header = Row::new(header_cells)
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let skip = usize::from(state.scroll("analysis.ticker")).min(rows.len().saturating_sub(1));
    let body: Vec<Row> = rows.iter().skip(skip).map(ticker_row).collect();

    let mut widths = vec![Constraint::Length(6), Constraint::Length(6)];
    widths.extend(std::iter::repeat(Constraint::Length(7)).take(upcoming_len));

    let table = Table::new(body, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn ticker_row(row: &TickerRow) -> Row<'static> {
    let form: String = row.form.iter().map(|f| f.letter()).collect();
    let mut cells = vec![
        Cell::from(row.short_name.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(form).style(Style::default().fg(form_color(row.win_count))),
    ];
    for f in &row.upcoming {
        let text = if f.is_home {
            f.opponent.to_uppercase()
        } else {
            f.opponent.to_lowercase()
        };
        cells.push(Cell::from(text).style(
            Style::default()
                .bg(difficulty_color(f.difficulty))
                .fg(difficulty_text_color(f.difficulty)),
        ));
    }
    Row::new(cells)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
