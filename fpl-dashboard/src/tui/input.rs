// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (view switching,
// team selection, scrolling).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::protocol::{AnalysisSection, UserCommand, View};
use super::ViewState;

/// Longest league id the input accepts.
const MAX_LEAGUE_DIGITS: usize = 12;

pub const INVALID_LEAGUE_MESSAGE: &str = "Please enter a valid, positive league ID.";

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when the key press was handled locally
/// by mutating `ViewState`.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // crossterm emits Release and Repeat events on some platforms.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    // Error banner dismissal works in every mode.
    if key_event.code == KeyCode::Char('x') && view_state.error.is_some() {
        return Some(UserCommand::DismissError);
    }

    if view_state.league_loading.is_some() {
        if key_event.code == KeyCode::Char('q') {
            view_state.confirm_quit = true;
        }
        return None;
    }

    if view_state.league.is_none() {
        return handle_league_input(key_event, view_state);
    }

    match key_event.code {
        KeyCode::Char(c @ '1'..='6') => {
            let index = (c as usize) - ('1' as usize);
            switch_view(view_state, View::ALL[index])
        }

        KeyCode::Tab => {
            if view_state.active_view == View::Analysis {
                view_state.analysis_section = view_state.analysis_section.next();
            }
            None
        }

        KeyCode::Up | KeyCode::Char('k') => {
            if selects_team(view_state) {
                move_selection(view_state, -1);
            } else {
                scroll_up(view_state, 1);
            }
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if selects_team(view_state) {
                move_selection(view_state, 1);
            } else {
                scroll_down(view_state, 1);
            }
            None
        }
        KeyCode::PageUp => {
            scroll_up(view_state, page_size());
            None
        }
        KeyCode::PageDown => {
            scroll_down(view_state, page_size());
            None
        }

        KeyCode::Char('[') if view_state.active_view == View::Pvp => {
            cycle_pvp_team(view_state, PvpSide::First);
            None
        }
        KeyCode::Char(']') if view_state.active_view == View::Pvp => {
            cycle_pvp_team(view_state, PvpSide::Second);
            None
        }

        KeyCode::Char('t') if view_state.active_view == View::History => {
            cycle_transfer_filter(view_state);
            None
        }

        KeyCode::Char('a') | KeyCode::Enter => analysis_command(view_state),

        KeyCode::Char('l') => Some(UserCommand::ChangeLeague),

        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }

        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

/// League id prompt: digits, Backspace, Esc to clear, Enter to submit.
fn handle_league_input(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char(c) if c.is_ascii_digit() => {
            if view_state.league_input.len() < MAX_LEAGUE_DIGITS {
                view_state.league_input.push(c);
            }
            view_state.input_error = None;
            None
        }
        KeyCode::Backspace => {
            view_state.league_input.pop();
            view_state.input_error = None;
            None
        }
        KeyCode::Esc => {
            view_state.league_input.clear();
            view_state.input_error = None;
            None
        }
        KeyCode::Enter => match parse_league_id(&view_state.league_input) {
            Some(id) => {
                view_state.input_error = None;
                Some(UserCommand::SubmitLeague(id))
            }
            None => {
                view_state.input_error = Some(INVALID_LEAGUE_MESSAGE.to_string());
                None
            }
        },
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

/// A league id must be a positive integer.
pub fn parse_league_id(input: &str) -> Option<u64> {
    input.trim().parse::<u64>().ok().filter(|id| *id > 0)
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

fn switch_view(view_state: &mut ViewState, view: View) -> Option<UserCommand> {
    view_state.active_view = view;
    let details_missing = view_state
        .league
        .as_ref()
        .is_some_and(|l| !l.details_loaded());
    if view.needs_details() && details_missing && !view_state.details_loading {
        Some(UserCommand::LoadDetails)
    } else {
        None
    }
}

/// Views where Up/Down move the team selection rather than scroll.
fn selects_team(view_state: &ViewState) -> bool {
    match view_state.active_view {
        View::Dashboard | View::Scout => true,
        View::Analysis => view_state.analysis_section == AnalysisSection::Strength,
        _ => false,
    }
}

fn move_selection(view_state: &mut ViewState, delta: i32) {
    let n = view_state.team_order.len();
    if n == 0 {
        return;
    }
    view_state.selected_team = if delta < 0 {
        view_state.selected_team.saturating_sub(1)
    } else {
        (view_state.selected_team + 1).min(n - 1)
    };
}

fn cycle_index(current: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (current + 1) % len }
}

#[derive(Clone, Copy)]
enum PvpSide {
    First,
    Second,
}

/// Advance one PvP side, skipping the team the other side holds. With two
/// teams the sides swap.
fn cycle_pvp_team(view_state: &mut ViewState, side: PvpSide) {
    let n = view_state.team_order.len();
    if n < 2 {
        return;
    }
    let (a, b) = view_state.pvp_teams;
    if n == 2 {
        view_state.pvp_teams = (b, a);
        return;
    }
    let (current, other) = match side {
        PvpSide::First => (a, b),
        PvpSide::Second => (b, a),
    };
    let mut next = cycle_index(current, n);
    if next == other {
        next = cycle_index(next, n);
    }
    match side {
        PvpSide::First => view_state.pvp_teams.0 = next,
        PvpSide::Second => view_state.pvp_teams.1 = next,
    }
}

/// None -> first team -> ... -> last team -> None
fn cycle_transfer_filter(view_state: &mut ViewState) {
    let n = view_state.team_order.len();
    view_state.transfer_filter = match view_state.transfer_filter {
        None if n > 0 => Some(0),
        Some(i) if i + 1 < n => Some(i + 1),
        _ => None,
    };
}

/// The analysis command for the active view, if it has one.
fn analysis_command(view_state: &ViewState) -> Option<UserCommand> {
    match view_state.active_view {
        View::Analysis => match view_state.analysis_section {
            AnalysisSection::Strength => view_state.selected().map(|t| UserCommand::AnalyzeTeam(t.id)),
            AnalysisSection::Predictions => Some(UserCommand::PredictStandings),
            AnalysisSection::Luck => Some(UserCommand::AnalyzeLuck),
            AnalysisSection::KeyMatches => Some(UserCommand::AnalyzeKeyMatches),
            AnalysisSection::Ticker => None,
        },
        View::Pvp => {
            let (a, b) = view_state.pvp_teams;
            let team1 = view_state.team_at(a)?.id;
            let team2 = view_state.team_at(b)?.id;
            (team1 != team2).then_some(UserCommand::AnalyzePvp(team1, team2))
        }
        View::Scout => view_state.selected().map(|t| UserCommand::Scout(t.id)),
        View::Dashboard | View::History | View::Players => None,
    }
}

// ---------------------------------------------------------------------------
// Scrolling
// ---------------------------------------------------------------------------

/// Scroll offset key for the panel that currently receives scroll input.
pub fn scroll_key(view_state: &ViewState) -> &'static str {
    match view_state.active_view {
        View::Dashboard => "dashboard",
        View::History => "history",
        View::Analysis => match view_state.analysis_section {
            AnalysisSection::Strength => "analysis.strength",
            AnalysisSection::Predictions => "analysis.predictions",
            AnalysisSection::Luck => "analysis.luck",
            AnalysisSection::KeyMatches => "analysis.key_matches",
            AnalysisSection::Ticker => "analysis.ticker",
        },
        View::Pvp => "pvp",
        View::Players => "players",
        View::Scout => "scout",
    }
}

fn scroll_up(view_state: &mut ViewState, lines: usize) {
    let key = scroll_key(view_state).to_string();
    let offset = view_state.scroll_offset.entry(key).or_insert(0);
    *offset = offset.saturating_sub(lines);
}

fn scroll_down(view_state: &mut ViewState, lines: usize) {
    let key = scroll_key(view_state).to_string();
    let offset = view_state.scroll_offset.entry(key).or_insert(0);
    *offset = offset.saturating_add(lines);
}

fn page_size() -> usize {
    20
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
