// PvP view: two squads side by side and the AI head-to-head prediction.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::llm::results::PvpAnalysisResult;
use crate::model::Team;
use crate::protocol::{AnalysisKey, AnalysisResult};
use crate::tui::layout::split_columns;
use crate::tui::ViewState;

use super::{analysis_title, render_pending};

const RESULT_HEIGHT: u16 = 9;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let rows = Layout::vertical([Constraint::Min(6), Constraint::Length(RESULT_HEIGHT)]).split(area);

    let (left, right) = split_columns(rows[0], 50);
    let (a, b) = state.pvp_teams;
    render_squad(frame, left, state.team_at(a), "[", Color::Cyan);
    render_squad(frame, right, state.team_at(b), "]", Color::Magenta);

    render_result(frame, rows[1], state);
}

fn render_squad(frame: &mut Frame, area: Rect, team: Option<&Team>, key: &str, color: Color) {
    let title = match team {
        Some(t) => format!("{} ({key} to change)", t.team_name),
        None => "No team".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(color));
    let lines = team.map(squad_lines).unwrap_or_default();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn squad_lines(team: &Team) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::raw(format!("{}  ", team.manager_name)),
            Span::styled(
                format!("{} pts", team.total_points()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  GW {}", team.live_gw_points), Style::default().fg(Color::Green)),
        ]),
        Line::from(""),
    ];
    let mut starters: Vec<_> = team.starters().collect();
    starters.sort_by_key(|p| p.squad_position);
    for p in starters {
        let armband = if p.is_captain {
            " (C)"
        } else if p.is_vice_captain {
            " (VC)"
        } else {
            ""
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<4}", p.position.short()), Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{}{armband}", p.name)),
        ]));
    }
    if let Some(chip) = team.active_chip {
        lines.push(Line::from(Span::styled(
            format!("Chip active: {}", chip.label()),
            Style::default().fg(Color::Magenta),
        )));
    }
    lines
}

fn render_result(frame: &mut Frame, area: Rect, state: &ViewState) {
    let view = state.analysis(AnalysisKey::Pvp);
    let title = analysis_title("Head-to-Head Prediction", view);
    match view.and_then(|v| v.result.as_ref()) {
        Some(AnalysisResult::Pvp(r)) => {
            let paragraph = Paragraph::new(result_lines(r))
                .block(Block::default().borders(Borders::ALL).title(title))
                .wrap(Wrap { trim: false })
                .scroll((state.scroll("pvp"), 0));
            frame.render_widget(paragraph, area);
        }
        _ => render_pending(
            frame,
            area,
            title,
            view,
            state.llm_enabled,
            "Press a to predict this matchup.",
        ),
    }
}

fn result_lines(r: &PvpAnalysisResult) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::raw(format!("{} ", r.team1_name)),
            Span::styled(
                format!("{:.0} - {:.0}", r.team1_predicted_score, r.team2_predicted_score),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" {}", r.team2_name)),
        ]),
        Line::from(vec![
            Span::raw("Winner: "),
            Span::styled(
                r.predicted_winner.clone(),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(r.justification.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::UiUpdate;
    use crate::tui::apply_ui_update;
    use crate::tui::tests::loaded_state;

    fn pvp_result() -> PvpAnalysisResult {
        PvpAnalysisResult {
            predicted_winner: "High".into(),
            team1_name: "High".into(),
            team2_name: "Mid".into(),
            team1_predicted_score: 64.0,
            team2_predicted_score: 51.0,
            justification: "Captain edge".into(),
        }
    }

    #[test]
    fn result_lines_show_score() {
        let lines = result_lines(&pvp_result());
        assert_eq!(lines[0].to_string(), "High 64 - 51 Mid");
        assert_eq!(lines[1].to_string(), "Winner: High");
    }

    #[test]
    fn squad_lists_starters_with_armband() {
        let state = loaded_state();
        let lines = squad_lines(state.team_at(0).unwrap());
        // Manager line, blank, then eleven starters.
        assert_eq!(lines.len(), 13);
        assert!(lines[2].to_string().ends_with("(C)"));
    }

    #[test]
    fn render_does_not_panic() {
        let backend = ratatui::backend::TestBackend::new(120, 40);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = loaded_state();
        state.llm_enabled = true;
        terminal.draw(|frame| render(frame, frame.area(), &state)).unwrap();

        apply_ui_update(
            &mut state,
            UiUpdate::AnalysisReady(AnalysisKey::Pvp, Box::new(AnalysisResult::Pvp(pvp_result()))),
        );
        terminal.draw(|frame| render(frame, frame.area(), &state)).unwrap();
    }

    #[test]
    fn render_single_team_league_does_not_panic() {
        let backend = ratatui::backend::TestBackend::new(80, 20);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = loaded_state();
        state.pvp_teams = (0, 9);
        terminal.draw(|frame| render(frame, frame.area(), &state)).unwrap();
    }
}
