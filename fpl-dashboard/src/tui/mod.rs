// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors the loaded league and the state of
// each narrative analysis. The app orchestrator pushes `UiUpdate` messages
// over an mpsc channel; the TUI applies them to `ViewState` and re-renders
// at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::HashMap;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::model::{LeagueData, Team};
use crate::protocol::{
    AnalysisKey, AnalysisResult, AnalysisSection, LlmStatus, UiUpdate, UserCommand, View,
};
use crate::views::standings::league_table;

use layout::build_layout;

// ---------------------------------------------------------------------------
// AnalysisView
// ---------------------------------------------------------------------------

/// Display state of one narrative analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalysisView {
    pub status: LlmStatus,
    /// Raw streamed text, shown until the parsed result arrives.
    pub text: String,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the application state for rendering.
///
/// Updated incrementally via `UiUpdate` messages from the app orchestrator.
/// The `render_frame` function reads this struct to draw the dashboard.
pub struct ViewState {
    /// Digits typed into the league id prompt.
    pub league_input: String,
    /// Validation message for the league id prompt.
    pub input_error: Option<String>,
    /// League id currently being loaded.
    pub league_loading: Option<u64>,
    pub details_loading: bool,
    pub league: Option<LeagueData>,
    /// Team ids in league-table order; selection indexes into this.
    pub team_order: Vec<u64>,
    /// Error banner text.
    pub error: Option<String>,
    pub llm_enabled: bool,

    pub active_view: View,
    pub analysis_section: AnalysisSection,
    /// Selected team for the dashboard breakdown, strength and scout views.
    pub selected_team: usize,
    /// Team indexes compared in the PvP view.
    pub pvp_teams: (usize, usize),
    /// Transfer list filter; `None` shows every team.
    pub transfer_filter: Option<usize>,

    pub analyses: HashMap<AnalysisKey, AnalysisView>,
    /// Per-widget scroll offsets (keyed by widget name).
    pub scroll_offset: HashMap<String, usize>,
    /// Whether the quit confirmation dialog is showing.
    pub confirm_quit: bool,
    /// Set when the last league load failed; cleared by the next attempt.
    pub league_failed: bool,
    /// Render tick counter, drives the loading spinner.
    pub tick: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            league_input: String::new(),
            input_error: None,
            league_loading: None,
            details_loading: false,
            league: None,
            team_order: Vec::new(),
            error: None,
            llm_enabled: false,
            active_view: View::Dashboard,
            analysis_section: AnalysisSection::Strength,
            selected_team: 0,
            pvp_teams: (0, 1),
            transfer_filter: None,
            analyses: HashMap::new(),
            scroll_offset: HashMap::new(),
            confirm_quit: false,
            league_failed: false,
            tick: 0,
        }
    }
}

impl ViewState {
    pub fn teams(&self) -> &[Team] {
        self.league.as_ref().map(|l| l.teams.as_slice()).unwrap_or(&[])
    }

    /// Team at `index` in league-table order.
    pub fn team_at(&self, index: usize) -> Option<&Team> {
        let id = *self.team_order.get(index)?;
        self.league.as_ref()?.team(id)
    }

    pub fn selected(&self) -> Option<&Team> {
        self.team_at(self.selected_team)
    }

    pub fn analysis(&self, key: AnalysisKey) -> Option<&AnalysisView> {
        self.analyses.get(&key)
    }

    /// Scroll offset for the named panel, 0 if never scrolled.
    pub fn scroll(&self, panel: &str) -> u16 {
        self.scroll_offset
            .get(panel)
            .copied()
            .unwrap_or(0)
            .min(u16::MAX as usize) as u16
    }

    /// Rebuild the table order; selections follow their team, not their row.
    fn refresh_team_order(&mut self) {
        let previous = std::mem::take(&mut self.team_order);
        self.team_order = league_table(self.teams()).iter().map(|r| r.team_id).collect();
        let order = &self.team_order;
        let moved = |index: usize| {
            let id = previous.get(index)?;
            order.iter().position(|o| o == id)
        };

        self.selected_team = moved(self.selected_team).unwrap_or(0);
        self.transfer_filter = self.transfer_filter.and_then(&moved);
        self.pvp_teams = match (moved(self.pvp_teams.0), moved(self.pvp_teams.1)) {
            (Some(a), Some(b)) if a != b => (a, b),
            _ => (0, 1usize.min(order.len().saturating_sub(1))),
        };
    }

    /// Drop everything tied to the current league.
    fn reset_league(&mut self) {
        self.league = None;
        self.team_order.clear();
        self.details_loading = false;
        self.analyses.clear();
        self.scroll_offset.clear();
        self.active_view = View::Dashboard;
        self.analysis_section = AnalysisSection::Strength;
        self.selected_team = 0;
        self.pvp_teams = (0, 1);
        self.transfer_filter = None;
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::LeagueLoading(id) => {
            state.reset_league();
            state.league_loading = Some(id);
            state.league_failed = false;
            state.error = None;
            state.input_error = None;
        }
        UiUpdate::LeagueLoaded(league) => {
            state.league_loading = None;
            state.league_input = league.league_id.to_string();
            state.league = Some(*league);
            state.refresh_team_order();
        }
        UiUpdate::LeagueFailed(message) => {
            state.league_loading = None;
            state.league_failed = true;
            state.error = Some(message);
        }
        UiUpdate::LeagueCleared => {
            state.reset_league();
            state.league_loading = None;
            state.league_failed = false;
            state.league_input.clear();
        }
        UiUpdate::DetailsLoading => {
            state.details_loading = true;
        }
        UiUpdate::DetailsLoaded(teams) => {
            state.details_loading = false;
            if let Some(league) = state.league.as_mut() {
                league.teams = teams;
            }
            state.refresh_team_order();
        }
        UiUpdate::AnalysisStarted(key) => {
            state.analyses.insert(
                key,
                AnalysisView {
                    status: LlmStatus::Streaming,
                    ..AnalysisView::default()
                },
            );
        }
        UiUpdate::AnalysisToken(key, text) => {
            let view = state.analyses.entry(key).or_default();
            view.text.push_str(&text);
            view.status = LlmStatus::Streaming;
        }
        UiUpdate::AnalysisReady(key, result) => {
            let view = state.analyses.entry(key).or_default();
            view.result = Some(*result);
            view.error = None;
            view.status = LlmStatus::Complete;
        }
        UiUpdate::AnalysisFailed(key, message) => {
            let view = state.analyses.entry(key).or_default();
            view.error = Some(message);
            view.status = LlmStatus::Error;
        }
        UiUpdate::Error(message) => {
            state.error = Some(message);
        }
        UiUpdate::ErrorCleared => {
            state.error = None;
        }
        UiUpdate::LlmAvailability(enabled) => {
            state.llm_enabled = enabled;
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area(), state.error.is_some());

    widgets::header::render(frame, layout.header, state);
    if let Some(message) = &state.error {
        widgets::error_banner::render(frame, layout.banner, message);
    }

    if let Some(id) = state.league_loading {
        widgets::loading::render(
            frame,
            layout.main_panel,
            &format!("Fetching FPL League Data for ID: {id}..."),
            state.tick,
        );
    } else if state.league.is_none() {
        widgets::league_input::render(frame, layout.main_panel, state);
    } else if state.teams().is_empty() {
        widgets::loading::render_notice(
            frame,
            layout.main_panel,
            "No teams found in this league. Press l to try a different league.",
        );
    } else {
        match state.active_view {
            View::Dashboard => widgets::dashboard::render(frame, layout.main_panel, state),
            View::History => widgets::history::render(frame, layout.main_panel, state),
            View::Analysis => widgets::analysis::render(frame, layout.main_panel, state),
            View::Pvp => widgets::pvp::render(frame, layout.main_panel, state),
            View::Players => widgets::players::render(frame, layout.main_panel, state),
            View::Scout => widgets::scout::render(frame, layout.main_panel, state),
        }
    }

    widgets::help_bar::render(frame, layout.help_bar, state);

    if state.confirm_quit {
        widgets::quit_confirm::render(frame, frame.area());
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (enters raw mode, enables alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(tick_rate);
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // UI updates from the app orchestrator
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => {
                        apply_ui_update(&mut view_state, ui_update);
                    }
                    None => {
                        // Channel closed: app is shutting down
                        break;
                    }
                }
            }

            // Keyboard input
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse and resize events are picked up by the next render.
                    }
                    Some(Err(_)) | None => {
                        break;
                    }
                }
            }

            // Render tick
            _ = render_tick.tick() => {
                view_state.tick = view_state.tick.wrapping_add(1);
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::results::AiAnalysisResult;
    use crate::model::tests::{player, team};
    use crate::model::{Club, PlayerDirectory, Position};

    /// A three-team league with full squads and a little history.
    pub(crate) fn sample_league() -> LeagueData {
        let mut teams = vec![team(1, "Low", 400), team(2, "High", 600), team(3, "Mid", 500)];
        for (n, t) in teams.iter_mut().enumerate() {
            t.players = (1..=15u8)
                .map(|i| {
                    let mut p = player(u32::from(i) + n as u32 * 100, &format!("P{n}-{i}"), Position::Midfielder, i);
                    p.live_points = i32::from(i);
                    p.is_captain = i == 1;
                    p
                })
                .collect();
            t.live_gw_points = 40 + n as i32;
            t.live_bench_points = 3 * n as i32;
        }
        LeagueData {
            league_id: 77,
            league_name: "Office League".to_string(),
            teams,
            clubs: vec![Club {
                id: 1,
                name: "Arsenal".to_string(),
                short_name: "ARS".to_string(),
            }],
            current_gameweek: 10,
            next_gameweek: Some(11),
            fixtures: Vec::new(),
            directory: PlayerDirectory::default(),
        }
    }

    pub(crate) fn loaded_state() -> ViewState {
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::LeagueLoaded(Box::new(sample_league())));
        state
    }

    #[test]
    fn view_state_default_is_sensible() {
        let state = ViewState::default();
        assert!(state.league.is_none());
        assert!(state.league_loading.is_none());
        assert!(state.error.is_none());
        assert!(!state.llm_enabled);
        assert_eq!(state.active_view, View::Dashboard);
        assert!(state.analyses.is_empty());
        assert!(!state.confirm_quit);
        assert!(state.teams().is_empty());
    }

    #[test]
    fn league_loaded_orders_teams_by_total() {
        let state = loaded_state();
        assert_eq!(state.team_order, vec![2, 3, 1]);
        assert_eq!(state.selected().map(|t| t.team_name.as_str()), Some("High"));
        assert_eq!(state.league_input, "77");
    }

    #[test]
    fn league_loading_resets_previous_league() {
        let mut state = loaded_state();
        state.active_view = View::Players;
        state.error = Some("old".into());
        apply_ui_update(&mut state, UiUpdate::LeagueLoading(5));
        assert_eq!(state.league_loading, Some(5));
        assert!(state.league.is_none());
        assert!(state.error.is_none());
        assert_eq!(state.active_view, View::Dashboard);
    }

    #[test]
    fn league_failed_sets_banner() {
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::LeagueLoading(5));
        apply_ui_update(&mut state, UiUpdate::LeagueFailed("nope".into()));
        assert!(state.league_loading.is_none());
        assert_eq!(state.error.as_deref(), Some("nope"));
    }

    #[test]
    fn analysis_lifecycle() {
        let mut state = loaded_state();
        let key = AnalysisKey::TeamStrength(2);
        apply_ui_update(&mut state, UiUpdate::AnalysisStarted(key));
        apply_ui_update(&mut state, UiUpdate::AnalysisToken(key, "{\"sc".into()));
        apply_ui_update(&mut state, UiUpdate::AnalysisToken(key, "ore\"".into()));
        assert_eq!(state.analysis(key).unwrap().text, "{\"score\"");
        assert_eq!(state.analysis(key).unwrap().status, LlmStatus::Streaming);

        let result = AnalysisResult::TeamStrength(AiAnalysisResult {
            score: 81.0,
            justification: "Solid".into(),
        });
        apply_ui_update(&mut state, UiUpdate::AnalysisReady(key, Box::new(result.clone())));
        let view = state.analysis(key).unwrap();
        assert_eq!(view.status, LlmStatus::Complete);
        assert_eq!(view.result, Some(result));

        // Restarting clears the old result.
        apply_ui_update(&mut state, UiUpdate::AnalysisStarted(key));
        assert!(state.analysis(key).unwrap().result.is_none());
    }

    #[test]
    fn analysis_failed_keeps_message() {
        let mut state = loaded_state();
        apply_ui_update(&mut state, UiUpdate::AnalysisFailed(AnalysisKey::Luck, "bad".into()));
        let view = state.analysis(AnalysisKey::Luck).unwrap();
        assert_eq!(view.status, LlmStatus::Error);
        assert_eq!(view.error.as_deref(), Some("bad"));
    }

    #[test]
    fn details_loaded_replaces_teams() {
        let mut state = loaded_state();
        apply_ui_update(&mut state, UiUpdate::DetailsLoading);
        assert!(state.details_loading);
        let mut teams = state.teams().to_vec();
        teams.truncate(1);
        apply_ui_update(&mut state, UiUpdate::DetailsLoaded(teams));
        assert!(!state.details_loading);
        assert_eq!(state.team_order.len(), 1);
        assert_eq!(state.pvp_teams, (0, 0));
    }

    #[test]
    fn reorder_keeps_selections_on_their_teams() {
        let mut state = loaded_state();
        assert_eq!(state.team_order, vec![2, 3, 1]);
        state.selected_team = 1;
        state.pvp_teams = (2, 0);
        state.transfer_filter = Some(1);

        let mut teams = state.teams().to_vec();
        if let Some(low) = teams.iter_mut().find(|t| t.id == 1) {
            if let Some(last) = low.gameweek_history.last_mut() {
                last.total_points = 900;
            }
        }
        apply_ui_update(&mut state, UiUpdate::DetailsLoaded(teams));

        assert_eq!(state.team_order, vec![1, 2, 3]);
        assert_eq!(state.selected().map(|t| t.id), Some(3));
        assert_eq!(state.team_at(state.pvp_teams.0).map(|t| t.id), Some(1));
        assert_eq!(state.team_at(state.pvp_teams.1).map(|t| t.id), Some(2));
        assert_eq!(state.transfer_filter.and_then(|i| state.team_at(i)).map(|t| t.id), Some(3));
    }

    #[test]
    fn failed_load_is_flagged_until_next_attempt() {
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::LeagueFailed("nope".into()));
        assert!(state.league_failed);
        apply_ui_update(&mut state, UiUpdate::LeagueLoading(6));
        assert!(!state.league_failed);
    }

    #[test]
    fn empty_league_shows_notice() {
        let mut league = sample_league();
        league.teams.clear();
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::LeagueLoaded(Box::new(league)));
        let backend = ratatui::backend::TestBackend::new(100, 20);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal.draw(|frame| render_frame(frame, &state)).unwrap();
        let text: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("No teams found in this league."));
    }

    #[test]
    fn league_cleared_returns_to_input() {
        let mut state = loaded_state();
        apply_ui_update(&mut state, UiUpdate::LeagueCleared);
        assert!(state.league.is_none());
        assert!(state.league_input.is_empty());
    }

    #[test]
    fn error_and_availability_updates() {
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::LlmAvailability(true));
        assert!(state.llm_enabled);
        apply_ui_update(&mut state, UiUpdate::Error("boom".into()));
        assert_eq!(state.error.as_deref(), Some("boom"));
        apply_ui_update(&mut state, UiUpdate::ErrorCleared);
        assert!(state.error.is_none());
    }

    #[test]
    fn render_frame_every_view_does_not_panic() {
        let mut state = loaded_state();
        state.error = Some("Something went wrong".into());
        for view in View::ALL {
            state.active_view = view;
            let backend = ratatui::backend::TestBackend::new(120, 40);
            let mut terminal = ratatui::Terminal::new(backend).unwrap();
            terminal.draw(|frame| render_frame(frame, &state)).unwrap();
        }
    }

    #[test]
    fn render_frame_input_and_loading_do_not_panic() {
        let backend = ratatui::backend::TestBackend::new(80, 20);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState::default();
        terminal.draw(|frame| render_frame(frame, &state)).unwrap();
        state.league_loading = Some(3);
        state.confirm_quit = true;
        terminal.draw(|frame| render_frame(frame, &state)).unwrap();
    }
}
