// League id prompt shown until a league is loaded.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::layout::centered_rect;
use crate::tui::ViewState;

const PROMPT_WIDTH: u16 = 56;
const PROMPT_HEIGHT: u16 = 8;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let prompt_area = centered_rect(PROMPT_WIDTH, PROMPT_HEIGHT, area);

    let mut lines = vec![
        Line::from("Enter your FPL classic league ID:"),
        Line::from(""),
        input_line(&state.league_input),
        Line::from(""),
    ];
    let hint = if state.league_failed {
        "Loading failed. Edit the ID or press Enter to try again."
    } else {
        "Find it in the league URL on the FPL site."
    };
    match &state.input_error {
        Some(message) => lines.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        ))),
        None => lines.push(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        ))),
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" League ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(paragraph, prompt_area);
}

fn input_line(input: &str) -> Line<'static> {
    let prompt = Span::styled("> ", Style::default().fg(Color::Cyan));
    let cursor = Span::styled(
        "_",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::SLOW_BLINK),
    );
    if input.is_empty() {
        return Line::from(vec![
            prompt,
            cursor,
            Span::styled(" e.g. 155881", Style::default().fg(Color::DarkGray)),
        ]);
    }
    Line::from(vec![
        prompt,
        Span::styled(input.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        cursor,
    ])
}
