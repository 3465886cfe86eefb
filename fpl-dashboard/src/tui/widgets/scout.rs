// Scout view: expert strategy summaries for the selected team, with the
// web sources they were drawn from.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::llm::results::ScoutResult;
use crate::protocol::{AnalysisKey, AnalysisResult};
use crate::tui::layout::split_columns;
use crate::tui::ViewState;

use super::{analysis_title, render_pending};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let (left, right) = split_columns(area, 30);

    let items: Vec<ListItem> = state
        .team_order
        .iter()
        .filter_map(|id| state.league.as_ref()?.team(*id))
        .map(|t| ListItem::new(t.team_name.clone()))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Teams"))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    let mut list_state = ListState::default().with_selected(Some(state.selected_team));
    frame.render_stateful_widget(list, left, &mut list_state);

    // One scout report at a time; it names the team it was run for.
    let view = state.analysis(AnalysisKey::Scout);
    let title = analysis_title("Expert Scout", view);
    match view.and_then(|v| v.result.as_ref()) {
        Some(AnalysisResult::Scout(result)) => {
            let paragraph = Paragraph::new(scout_lines(result))
                .block(Block::default().borders(Borders::ALL).title(title))
                .wrap(Wrap { trim: false })
                .scroll((state.scroll("scout"), 0));
            frame.render_widget(paragraph, right);
        }
        _ => {
            let hint = match state.selected() {
                Some(t) => format!("Press a to gather expert advice for {}.", t.team_name),
                None => "Select a team.".to_string(),
            };
            render_pending(frame, right, title, view, state.llm_enabled, &hint);
        }
    }
}

fn scout_lines(result: &ScoutResult) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for s in &result.strategies {
        lines.push(Line::from(Span::styled(
            s.source_name.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        for takeaway in &s.key_takeaways {
            lines.push(Line::from(format!("  * {takeaway}")));
        }
        lines.push(Line::from(Span::styled(
            format!("  {}", s.strategy_summary),
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::from(""));
    }
    if result.strategies.is_empty() {
        lines.push(Line::from("No expert strategies found."));
        lines.push(Line::from(""));
    }

    if !result.sources.is_empty() {
        lines.push(Line::from(Span::styled(
            "Sources",
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )));
        for source in &result.sources {
            let title = if source.title.is_empty() {
                source.uri.clone()
            } else {
                source.title.clone()
            };
            lines.push(Line::from(vec![
                Span::raw(format!("  {title} ")),
                Span::styled(source.uri.clone(), Style::default().fg(Color::Blue)),
            ]));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::results::{ExpertStrategy, GroundingSource};
    use crate::protocol::UiUpdate;
    use crate::tui::apply_ui_update;
    use crate::tui::tests::loaded_state;

    fn result() -> ScoutResult {
        ScoutResult {
            strategies: vec![ExpertStrategy {
                source_name: "FPL Towers".into(),
                key_takeaways: vec!["Bench the keeper".into(), "Wildcard in GW12".into()],
                strategy_summary: "Go heavy on defence".into(),
            }],
            sources: vec![GroundingSource {
                uri: "https://example.com/a".into(),
                title: String::new(),
            }],
        }
    }

    #[test]
    fn scout_lines_include_takeaways_and_sources() {
        let text: Vec<String> = scout_lines(&result()).iter().map(|l| l.to_string()).collect();
        assert_eq!(text[0], "FPL Towers");
        assert_eq!(text[1], "  * Bench the keeper");
        assert!(text.iter().any(|l| l == "Sources"));
        assert!(text.last().unwrap().contains("https://example.com/a"));
    }

    #[test]
    fn empty_result_says_so() {
        let empty = ScoutResult {
            strategies: Vec::new(),
            sources: Vec::new(),
        };
        let text: Vec<String> = scout_lines(&empty).iter().map(|l| l.to_string()).collect();
        assert_eq!(text[0], "No expert strategies found.");
    }

    #[test]
    fn render_does_not_panic() {
        let backend = ratatui::backend::TestBackend::new(120, 30);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = loaded_state();
        state.llm_enabled = true;
        terminal.draw(|frame| render(frame, frame.area(), &state)).unwrap();

        apply_ui_update(
            &mut state,
            UiUpdate::AnalysisReady(AnalysisKey::Scout, Box::new(AnalysisResult::Scout(result()))),
        );
        terminal.draw(|frame| render(frame, frame.area(), &state)).unwrap();
    }
}
