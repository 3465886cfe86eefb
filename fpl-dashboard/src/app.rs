// Application state and orchestration logic.
//
// The central event loop that coordinates user commands from the TUI, FPL
// fetch results and LLM streaming events. Owns the loaded league and pushes
// UI updates to the TUI render loop.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{AnalysisParams, Config};
use crate::fpl::client::FplSource;
use crate::fpl::loader::{self, LoadError};
use crate::llm::client::{LlmClient, LlmRequest};
use crate::llm::prompt;
use crate::llm::results::{self, GroundingSource, ResultError};
use crate::model::{LeagueData, Team};
use crate::protocol::{AnalysisKey, AnalysisResult, LlmEvent, UiUpdate, UserCommand};
use crate::views::fixtures::{fixture_names, gameweek_fixtures};
use crate::views::luck::luck_inputs;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Result of a background FPL fetch, tagged with the league generation it
/// was started under.
#[derive(Debug)]
pub enum FetchEvent {
    League {
        generation: u64,
        result: Result<LeagueData, LoadError>,
    },
    Details {
        generation: u64,
        teams: Vec<Team>,
        /// Teams filled in by this load.
        loaded: usize,
    },
}

/// An in-flight narrative request.
struct AnalysisTask {
    generation: u64,
    /// Team name for per-team analyses, used in error banners.
    label: String,
    handle: Option<JoinHandle<()>>,
}

const FETCH_CHANNEL_CAPACITY: usize = 16;

pub const LLM_DISABLED_MESSAGE: &str = "API key is not configured.";

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub config: Config,
    source: Arc<dyn FplSource>,
    llm_client: Arc<LlmClient>,
    llm_tx: mpsc::Sender<LlmEvent>,
    fetch_tx: mpsc::Sender<FetchEvent>,
    fetch_rx: Option<mpsc::Receiver<FetchEvent>>,

    pub league: Option<LeagueData>,
    league_generation: u64,
    league_task: Option<JoinHandle<()>>,
    details_task: Option<JoinHandle<()>>,

    llm_generation: u64,
    analyses: HashMap<AnalysisKey, AnalysisTask>,
}

impl AppState {
    pub fn new(
        config: Config,
        source: Arc<dyn FplSource>,
        llm_client: LlmClient,
        llm_tx: mpsc::Sender<LlmEvent>,
    ) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel(FETCH_CHANNEL_CAPACITY);
        Self {
            config,
            source,
            llm_client: Arc::new(llm_client),
            llm_tx,
            fetch_tx,
            fetch_rx: Some(fetch_rx),
            league: None,
            league_generation: 0,
            league_task: None,
            details_task: None,
            llm_generation: 0,
            analyses: HashMap::new(),
        }
    }

    pub fn llm_enabled(&self) -> bool {
        self.llm_client.is_active()
    }

    // -- Fetch tasks --

    /// Abort the league and details fetches and every analysis.
    pub fn cancel_all(&mut self) {
        if let Some(handle) = self.league_task.take() {
            handle.abort();
        }
        if let Some(handle) = self.details_task.take() {
            handle.abort();
        }
        for (key, task) in self.analyses.drain() {
            if let Some(handle) = task.handle {
                handle.abort();
                debug!(?key, "cancelled analysis task");
            }
        }
        // Invalidates any fetch result already sitting in the channel.
        self.league_generation += 1;
    }

    /// Start loading `league_id`, replacing whatever was loaded before.
    pub fn start_league_load(&mut self, league_id: u64) {
        self.cancel_all();
        self.league = None;
        let generation = self.league_generation;

        let source = Arc::clone(&self.source);
        let tx = self.fetch_tx.clone();
        let concurrency = self.config.fpl.max_concurrent_requests;
        self.league_task = Some(tokio::spawn(async move {
            let result = loader::load_league(source.as_ref(), league_id, concurrency).await;
            let _ = tx.send(FetchEvent::League { generation, result }).await;
        }));
        info!(league_id, generation, "started league load");
    }

    /// Start stage two for the loaded league. Returns `false` when there is
    /// nothing to do.
    pub fn start_details_load(&mut self) -> bool {
        let Some(league) = &self.league else {
            debug!("details requested before a league is loaded");
            return false;
        };
        if self.details_task.is_some() || league.details_loaded() {
            debug!("team details already loading or loaded");
            return false;
        }

        let mut teams = league.teams.clone();
        let directory = league.directory.clone();
        let generation = self.league_generation;
        let source = Arc::clone(&self.source);
        let tx = self.fetch_tx.clone();
        let concurrency = self.config.fpl.max_concurrent_requests;
        self.details_task = Some(tokio::spawn(async move {
            let loaded =
                loader::load_team_details(source.as_ref(), &mut teams, &directory, concurrency)
                    .await;
            let _ = tx
                .send(FetchEvent::Details {
                    generation,
                    teams,
                    loaded,
                })
                .await;
        }));
        info!(generation, "started team details load");
        true
    }

    // -- Analysis tasks --

    /// Cancel the previous task for `key` and allocate a fresh generation.
    fn begin_analysis(&mut self, key: AnalysisKey, label: String) -> u64 {
        if let Some(task) = self.analyses.remove(&key) {
            if let Some(handle) = task.handle {
                handle.abort();
                info!(?key, "cancelled previous analysis");
            }
        }
        self.llm_generation += 1;
        let generation = self.llm_generation;
        self.analyses.insert(
            key,
            AnalysisTask {
                generation,
                label,
                handle: None,
            },
        );
        generation
    }

    fn build_request(&self, params: AnalysisParams, user_content: String, web_search: bool) -> LlmRequest {
        LlmRequest {
            system: prompt::system_prompt(),
            user_content,
            max_tokens: self.config.llm.max_tokens_for(&params),
            temperature: params.temperature,
            web_search,
        }
    }

    /// Spawn a streaming task for `key`.
    fn start_analysis(&mut self, key: AnalysisKey, label: String, request: LlmRequest) -> u64 {
        let generation = self.begin_analysis(key, label);
        let client = Arc::clone(&self.llm_client);
        let tx = self.llm_tx.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = client.stream_message(&request, tx, generation).await {
                warn!("LLM task failed: {}", e);
            }
        });
        if let Some(task) = self.analyses.get_mut(&key) {
            task.handle = Some(handle);
        }
        info!(?key, generation, "triggered analysis");
        generation
    }

    fn key_for_generation(&self, generation: u64) -> Option<AnalysisKey> {
        self.analyses
            .iter()
            .find(|(_, t)| t.generation == generation)
            .map(|(k, _)| *k)
    }

    /// Build and spawn the request for an analysis command. Returns the key
    /// when a task was started.
    pub fn trigger(&mut self, cmd: &UserCommand) -> Option<AnalysisKey> {
        let league = self.league.as_ref()?;
        let analyses = &self.config.llm.analyses;

        let (key, label, params, content, web_search) = match *cmd {
            UserCommand::AnalyzeTeam(id) => {
                let Some(team) = league.team(id) else {
                    debug!(team = id, "strength analysis for unknown team");
                    return None;
                };
                (
                    AnalysisKey::TeamStrength(id),
                    team.team_name.clone(),
                    analyses.team_strength,
                    prompt::build_team_strength_prompt(team),
                    false,
                )
            }
            UserCommand::AnalyzeKeyMatches => {
                let fixtures = league
                    .next_gameweek
                    .map(|gw| gameweek_fixtures(&league.fixtures, gw))
                    .unwrap_or_default();
                if fixtures.is_empty() || league.clubs.is_empty() {
                    debug!("no next-gameweek fixtures for key matches");
                    return None;
                }
                let names = fixture_names(&fixtures, &league.clubs);
                let gw = league.next_gameweek.unwrap_or(league.current_gameweek);
                (
                    AnalysisKey::KeyMatches,
                    String::new(),
                    analyses.key_matches,
                    prompt::build_key_matches_prompt(&names, gw),
                    false,
                )
            }
            UserCommand::PredictStandings => {
                if league.teams.is_empty() {
                    debug!("predictions requested with no teams");
                    return None;
                }
                (
                    AnalysisKey::Predictions,
                    String::new(),
                    analyses.predictions,
                    prompt::build_predictions_prompt(&league.teams, league.current_gameweek),
                    false,
                )
            }
            UserCommand::AnalyzeLuck => {
                if league.teams.is_empty() {
                    debug!("luck analysis requested with no teams");
                    return None;
                }
                (
                    AnalysisKey::Luck,
                    String::new(),
                    analyses.luck,
                    prompt::build_luck_prompt(&luck_inputs(&league.teams), league.current_gameweek),
                    false,
                )
            }
            UserCommand::AnalyzePvp(a, b) => {
                let (Some(team1), Some(team2)) = (league.team(a), league.team(b)) else {
                    debug!(a, b, "matchup with a missing team");
                    return None;
                };
                if a == b {
                    debug!(team = a, "matchup against itself");
                    return None;
                }
                let next = league
                    .next_gameweek
                    .map(|gw| gameweek_fixtures(&league.fixtures, gw))
                    .unwrap_or_default();
                (
                    AnalysisKey::Pvp,
                    String::new(),
                    analyses.pvp,
                    prompt::build_pvp_prompt(
                        team1,
                        team2,
                        &next,
                        &league.clubs,
                        league.next_gameweek,
                    ),
                    false,
                )
            }
            UserCommand::Scout(id) => {
                let Some(team) = league.team(id) else {
                    debug!(team = id, "scout for unknown team");
                    return None;
                };
                let web_search = self.config.llm.scout_web_search;
                (
                    AnalysisKey::Scout,
                    team.team_name.clone(),
                    analyses.scout,
                    prompt::build_scout_prompt(team, web_search),
                    web_search,
                )
            }
            _ => return None,
        };

        let request = self.build_request(params, content, web_search);
        self.start_analysis(key, label, request);
        Some(key)
    }
}

// ---------------------------------------------------------------------------
// Result handling
// ---------------------------------------------------------------------------

/// Parse a completed response with the parser for `key`.
pub fn parse_result(
    key: AnalysisKey,
    text: &str,
    citations: &[GroundingSource],
) -> Result<AnalysisResult, ResultError> {
    Ok(match key {
        AnalysisKey::TeamStrength(_) => AnalysisResult::TeamStrength(results::parse_team_strength(text)?),
        AnalysisKey::KeyMatches => AnalysisResult::KeyMatches(results::parse_key_matches(text)?),
        AnalysisKey::Predictions => AnalysisResult::Predictions(results::parse_predictions(text)?),
        AnalysisKey::Luck => AnalysisResult::Luck(results::parse_luck(text)?),
        AnalysisKey::Pvp => AnalysisResult::Pvp(results::parse_pvp(text)?),
        AnalysisKey::Scout => AnalysisResult::Scout(results::parse_scout(text, citations)?),
    })
}

/// Error banner text for a failed analysis.
pub fn failure_banner(key: AnalysisKey, label: &str, message: &str) -> String {
    let prefix = match key {
        AnalysisKey::TeamStrength(_) => format!("Failed to analyze {label}"),
        AnalysisKey::KeyMatches => "Failed to analyze key matches".to_string(),
        AnalysisKey::Predictions => "Failed to predict final standings".to_string(),
        AnalysisKey::Luck => "Failed to analyze league luck".to_string(),
        AnalysisKey::Pvp => "Failed to analyze matchup".to_string(),
        AnalysisKey::Scout => "Failed to fetch strategies".to_string(),
    };
    format!("{prefix}: {message}")
}

pub fn league_failed_message(error: &LoadError) -> String {
    format!(
        "Could not load league data. This might be due to the FPL API being temporarily down, \
         the league ID being invalid or private, or the relay having issues. Please try again \
         in a few moments. (Error: {error})"
    )
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Listens on three channels using `tokio::select!`:
/// 1. User commands from the TUI
/// 2. FPL fetch results
/// 3. LLM streaming events
///
/// Pushes UI updates through `ui_tx` for the TUI render loop.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut llm_rx: mpsc::Receiver<LlmEvent>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let mut fetch_rx = state
        .fetch_rx
        .take()
        .ok_or_else(|| anyhow!("application event loop is already running"))?;

    let _ = ui_tx
        .send(UiUpdate::LlmAvailability(state.llm_enabled()))
        .await;

    // When the LLM channel closes we stop polling it so tokio::select! never
    // spins on a closed receiver.
    let mut llm_open = true;

    loop {
        tokio::select! {
            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- FPL fetch results ---
            Some(event) = fetch_rx.recv() => {
                handle_fetch_event(&mut state, event, &ui_tx).await;
            }

            // --- LLM events (only poll when channel is open) ---
            llm_event = llm_rx.recv(), if llm_open => {
                match llm_event {
                    Some(event) => {
                        handle_llm_event(&mut state, event, &ui_tx).await;
                    }
                    None => {
                        info!("LLM channel closed");
                        llm_open = false;
                    }
                }
            }
        }
    }

    state.cancel_all();
    info!("Application event loop exiting");
    Ok(())
}

/// Handle a user command from the TUI.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::SubmitLeague(league_id) => {
            state.start_league_load(league_id);
            let _ = ui_tx.send(UiUpdate::LeagueLoading(league_id)).await;
        }
        UserCommand::ChangeLeague => {
            state.cancel_all();
            state.league = None;
            info!("League cleared");
            let _ = ui_tx.send(UiUpdate::LeagueCleared).await;
        }
        UserCommand::LoadDetails => {
            if state.start_details_load() {
                let _ = ui_tx.send(UiUpdate::DetailsLoading).await;
            }
        }
        UserCommand::DismissError => {
            let _ = ui_tx.send(UiUpdate::ErrorCleared).await;
        }
        UserCommand::AnalyzeTeam(_)
        | UserCommand::AnalyzeKeyMatches
        | UserCommand::PredictStandings
        | UserCommand::AnalyzeLuck
        | UserCommand::AnalyzePvp(..)
        | UserCommand::Scout(_) => {
            if !state.llm_enabled() {
                let _ = ui_tx
                    .send(UiUpdate::Error(LLM_DISABLED_MESSAGE.to_string()))
                    .await;
                return;
            }
            if let Some(key) = state.trigger(&cmd) {
                let _ = ui_tx.send(UiUpdate::AnalysisStarted(key)).await;
            }
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

/// Handle a finished background fetch.
async fn handle_fetch_event(
    state: &mut AppState,
    event: FetchEvent,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match event {
        FetchEvent::League { generation, result } => {
            if generation != state.league_generation {
                debug!(generation, current = state.league_generation, "discarding stale league load");
                return;
            }
            state.league_task = None;
            match result {
                Ok(league) => {
                    info!(
                        league_id = league.league_id,
                        teams = league.teams.len(),
                        "league loaded"
                    );
                    let _ = ui_tx
                        .send(UiUpdate::LeagueLoaded(Box::new(league.clone())))
                        .await;
                    state.league = Some(league);
                }
                Err(e) => {
                    warn!("league load failed: {}", e);
                    let _ = ui_tx
                        .send(UiUpdate::LeagueFailed(league_failed_message(&e)))
                        .await;
                }
            }
        }
        FetchEvent::Details {
            generation,
            teams,
            loaded,
        } => {
            if generation != state.league_generation {
                debug!(generation, "discarding stale details load");
                return;
            }
            state.details_task = None;
            let Some(league) = state.league.as_mut() else {
                return;
            };
            let pending = teams.iter().filter(|t| !t.details_loaded).count();
            if pending > 0 {
                warn!(loaded, pending, "some team details failed to load");
            }
            league.teams = teams.clone();
            let _ = ui_tx.send(UiUpdate::DetailsLoaded(teams)).await;
            if loaded == 0 && pending > 0 {
                let _ = ui_tx
                    .send(UiUpdate::Error(LoadError::NoTeamsLoaded.to_string()))
                    .await;
            }
        }
    }
}

/// Handle an LLM streaming event.
async fn handle_llm_event(
    state: &mut AppState,
    event: LlmEvent,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let generation = event.generation();
    let Some(key) = state.key_for_generation(generation) else {
        debug!(generation, "Discarding stale LLM event");
        return;
    };

    match event {
        LlmEvent::Token { text, .. } => {
            let _ = ui_tx.send(UiUpdate::AnalysisToken(key, text)).await;
        }
        LlmEvent::Complete {
            full_text,
            citations,
            stop_reason,
            input_tokens,
            output_tokens,
            ..
        } => {
            let label = state
                .analyses
                .remove(&key)
                .map(|t| t.label)
                .unwrap_or_default();
            info!(?key, input_tokens, output_tokens, "analysis complete");
            match parse_result(key, &full_text, &citations) {
                Ok(result) => {
                    let _ = ui_tx
                        .send(UiUpdate::AnalysisReady(key, Box::new(result)))
                        .await;
                }
                Err(e) => {
                    let mut message = e.to_string();
                    if stop_reason.as_deref() == Some("max_tokens") {
                        message.push_str(" (response truncated due to token limit)");
                    }
                    warn!(?key, "failed to parse analysis: {}", message);
                    report_failure(key, &label, message, ui_tx).await;
                }
            }
        }
        LlmEvent::Error { message, .. } => {
            let label = state
                .analyses
                .remove(&key)
                .map(|t| t.label)
                .unwrap_or_default();
            warn!(?key, "LLM error: {}", message);
            report_failure(key, &label, message, ui_tx).await;
        }
    }
}

async fn report_failure(
    key: AnalysisKey,
    label: &str,
    message: String,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let banner = failure_banner(key, label, &message);
    let _ = ui_tx.send(UiUpdate::AnalysisFailed(key, message)).await;
    let _ = ui_tx.send(UiUpdate::Error(banner)).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::fpl::client::FplError;
    use crate::fpl::wire::{
        Bootstrap, ElementSummary, EntryHistory, EntryPicks, EntryTransfer, Fixtures,
        LeagueStandings, LiveGameweek,
    };
    use async_trait::async_trait;
    use std::time::Duration;

    // -----------------------------------------------------------------------
    // Test helpers
    // -----------------------------------------------------------------------

    const BOOTSTRAP: &str = r#"{
        "events": [
            {"id": 5, "is_current": true, "is_next": false, "finished": false},
            {"id": 6, "is_current": false, "is_next": true, "finished": false}
        ],
        "element_types": [{"id": 3, "singular_name_short": "MID"}],
        "teams": [
            {"id": 1, "name": "Arsenal", "short_name": "ARS"},
            {"id": 2, "name": "Chelsea", "short_name": "CHE"}
        ],
        "elements": [
            {"id": 1, "first_name": "Bukayo", "second_name": "Saka", "team": 1, "element_type": 3},
            {"id": 2, "first_name": "Cole", "second_name": "Palmer", "team": 2, "element_type": 3}
        ]
    }"#;

    const STANDINGS: &str = r#"{
        "league": {"id": 42, "name": "Test League"},
        "standings": {"results": [
            {"entry": 1, "player_name": "Ann", "entry_name": "Gunners", "total": 300, "event_total": 50, "rank": 1},
            {"entry": 2, "player_name": "Bob", "entry_name": "Blues", "total": 280, "event_total": 40, "rank": 2}
        ]}
    }"#;

    const PICKS: &str = r#"{"active_chip": null, "picks": [
        {"element": 1, "position": 1, "is_captain": true, "is_vice_captain": false, "multiplier": 2},
        {"element": 2, "position": 2, "is_captain": false, "is_vice_captain": true, "multiplier": 1}
    ]}"#;

    const FIXTURES: &str = r#"[
        {"id": 1, "event": 6, "kickoff_time": null, "team_h": 1, "team_a": 2,
         "team_h_score": null, "team_a_score": null,
         "team_h_difficulty": 4, "team_a_difficulty": 3, "finished": false}
    ]"#;

    /// Canned FPL API. `fail_league` makes standings answer with a 404.
    struct StubSource {
        fail_league: bool,
        delay: Duration,
    }

    fn not_found() -> FplError {
        FplError::Status {
            url: "stub://".into(),
            status: 404,
            body: "Not found".into(),
        }
    }

    #[async_trait]
    impl FplSource for StubSource {
        async fn bootstrap(&self) -> Result<Bootstrap, FplError> {
            tokio::time::sleep(self.delay).await;
            Ok(serde_json::from_str(BOOTSTRAP).unwrap())
        }
        async fn league_standings(&self, _league_id: u64) -> Result<LeagueStandings, FplError> {
            if self.fail_league {
                return Err(not_found());
            }
            Ok(serde_json::from_str(STANDINGS).unwrap())
        }
        async fn entry_picks(&self, _entry: u64, _gameweek: u32) -> Result<EntryPicks, FplError> {
            Ok(serde_json::from_str(PICKS).unwrap())
        }
        async fn entry_history(&self, _entry: u64) -> Result<EntryHistory, FplError> {
            Ok(serde_json::from_str(
                r#"{"current": [{"event": 5, "points": 50, "total_points": 300}], "chips": []}"#,
            )
            .unwrap())
        }
        async fn entry_transfers(&self, _entry: u64) -> Result<Vec<EntryTransfer>, FplError> {
            Ok(Vec::new())
        }
        async fn live_gameweek(&self, _gameweek: u32) -> Result<LiveGameweek, FplError> {
            Ok(serde_json::from_str(
                r#"{"elements": [{"id": 1, "stats": {"total_points": 8}}, {"id": 2, "stats": {"total_points": 5}}]}"#,
            )
            .unwrap())
        }
        async fn fixtures(&self, _gameweek: Option<u32>) -> Result<Fixtures, FplError> {
            Ok(serde_json::from_str(FIXTURES).unwrap())
        }
        async fn element_summary(&self, _element: u32) -> Result<ElementSummary, FplError> {
            Ok(ElementSummary::default())
        }
    }

    fn stub_state(fail_league: bool, llm_client: LlmClient) -> (AppState, mpsc::Receiver<LlmEvent>) {
        let (llm_tx, llm_rx) = mpsc::channel(16);
        let source = Arc::new(StubSource {
            fail_league,
            delay: Duration::ZERO,
        });
        let state = AppState::new(test_config(None), source, llm_client, llm_tx);
        (state, llm_rx)
    }

    struct Harness {
        cmd_tx: mpsc::Sender<UserCommand>,
        llm_tx: mpsc::Sender<LlmEvent>,
        ui_rx: mpsc::Receiver<UiUpdate>,
        handle: JoinHandle<anyhow::Result<()>>,
    }

    fn spawn_loop(state: AppState, llm_rx: mpsc::Receiver<LlmEvent>) -> Harness {
        let llm_tx = state.llm_tx.clone();
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, ui_rx) = mpsc::channel(64);
        let handle = tokio::spawn(run(cmd_rx, llm_rx, ui_tx, state));
        Harness {
            cmd_tx,
            llm_tx,
            ui_rx,
            handle,
        }
    }

    async fn next_update(rx: &mut mpsc::Receiver<UiUpdate>) -> UiUpdate {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for update")
            .expect("ui channel closed")
    }

    /// An active client pointed at a closed local port.
    fn unroutable_client() -> LlmClient {
        LlmClient::Active(
            crate::llm::client::ClaudeClient::new("sk-test".into(), "m".into())
                .with_api_url("http://127.0.0.1:9/v1/messages"),
        )
    }

    async fn loaded_state(llm_client: LlmClient) -> (AppState, mpsc::Receiver<LlmEvent>) {
        let (mut state, llm_rx) = stub_state(false, llm_client);
        let league = loader::load_league(state.source.as_ref(), 42, 2)
            .await
            .unwrap();
        state.league = Some(league);
        (state, llm_rx)
    }

    // -----------------------------------------------------------------------
    // Tests: pure helpers
    // -----------------------------------------------------------------------

    #[test]
    fn failure_banners_name_the_analysis() {
        assert_eq!(
            failure_banner(AnalysisKey::TeamStrength(1), "Gunners", "boom"),
            "Failed to analyze Gunners: boom"
        );
        assert_eq!(
            failure_banner(AnalysisKey::Predictions, "", "boom"),
            "Failed to predict final standings: boom"
        );
        assert_eq!(
            failure_banner(AnalysisKey::Scout, "Gunners", "boom"),
            "Failed to fetch strategies: boom"
        );
    }

    #[test]
    fn league_failed_message_wraps_error() {
        let msg = league_failed_message(&LoadError::StandingsMissing);
        assert!(msg.starts_with("Could not load league data."));
        assert!(msg.ends_with("(Error: Standings data not found. The league may be private or the ID is incorrect.)"));
    }

    #[test]
    fn parse_result_dispatches_by_key() {
        let r = parse_result(AnalysisKey::TeamStrength(3), r#"{"score": 77, "justification": "ok"}"#, &[]).unwrap();
        assert!(matches!(r, AnalysisResult::TeamStrength(ref a) if a.score == 77.0));
        assert!(parse_result(AnalysisKey::Luck, "no json here", &[]).is_err());
    }

    // -----------------------------------------------------------------------
    // Tests: state transitions
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn begin_analysis_replaces_previous_generation() {
        let (mut state, _rx) = stub_state(false, LlmClient::Disabled);
        let g1 = state.begin_analysis(AnalysisKey::Luck, String::new());
        let g2 = state.begin_analysis(AnalysisKey::Luck, String::new());
        assert!(g2 > g1);
        assert_eq!(state.key_for_generation(g1), None);
        assert_eq!(state.key_for_generation(g2), Some(AnalysisKey::Luck));
    }

    #[tokio::test]
    async fn trigger_guards_are_noops() {
        let (mut state, _rx) = loaded_state(unroutable_client()).await;
        assert_eq!(state.trigger(&UserCommand::AnalyzeTeam(999)), None);
        assert_eq!(state.trigger(&UserCommand::AnalyzePvp(1, 1)), None);
        assert_eq!(state.trigger(&UserCommand::AnalyzePvp(1, 999)), None);
        assert_eq!(state.trigger(&UserCommand::Scout(999)), None);
        assert!(state.analyses.is_empty());
        state.cancel_all();
    }

    #[tokio::test]
    async fn trigger_without_league_is_noop() {
        let (mut state, _rx) = stub_state(false, LlmClient::Disabled);
        assert_eq!(state.trigger(&UserCommand::PredictStandings), None);
    }

    #[tokio::test]
    async fn trigger_starts_task_per_key() {
        let (mut state, _rx) = loaded_state(unroutable_client()).await;
        assert_eq!(
            state.trigger(&UserCommand::AnalyzeTeam(1)),
            Some(AnalysisKey::TeamStrength(1))
        );
        assert_eq!(
            state.trigger(&UserCommand::AnalyzeKeyMatches),
            Some(AnalysisKey::KeyMatches)
        );
        assert_eq!(state.trigger(&UserCommand::AnalyzePvp(1, 2)), Some(AnalysisKey::Pvp));
        assert_eq!(state.analyses.len(), 3);
        state.cancel_all();
        assert!(state.analyses.is_empty());
    }

    // -----------------------------------------------------------------------
    // Tests: async event loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn event_loop_handles_quit_command() {
        let (state, llm_rx) = stub_state(false, LlmClient::Disabled);
        let mut h = spawn_loop(state, llm_rx);
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::LlmAvailability(false)));
        h.cmd_tx.send(UserCommand::Quit).await.unwrap();
        assert!(h.handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn submit_league_loads_and_reports() {
        let (state, llm_rx) = stub_state(false, LlmClient::Disabled);
        let mut h = spawn_loop(state, llm_rx);
        let _ = next_update(&mut h.ui_rx).await;

        h.cmd_tx.send(UserCommand::SubmitLeague(42)).await.unwrap();
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::LeagueLoading(42)));
        match next_update(&mut h.ui_rx).await {
            UiUpdate::LeagueLoaded(league) => {
                assert_eq!(league.league_name, "Test League");
                assert_eq!(league.teams.len(), 2);
                // 8 * 2 captain + 5.
                assert_eq!(league.teams[0].live_gw_points, 21);
            }
            other => panic!("expected LeagueLoaded, got {other:?}"),
        }

        h.cmd_tx.send(UserCommand::LoadDetails).await.unwrap();
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::DetailsLoading));
        match next_update(&mut h.ui_rx).await {
            UiUpdate::DetailsLoaded(teams) => {
                assert!(teams.iter().all(|t| t.details_loaded));
            }
            other => panic!("expected DetailsLoaded, got {other:?}"),
        }

        h.cmd_tx.send(UserCommand::ChangeLeague).await.unwrap();
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::LeagueCleared));

        h.cmd_tx.send(UserCommand::Quit).await.unwrap();
        let _ = h.handle.await;
    }

    #[tokio::test]
    async fn failed_league_reports_wrapped_error() {
        let (state, llm_rx) = stub_state(true, LlmClient::Disabled);
        let mut h = spawn_loop(state, llm_rx);
        let _ = next_update(&mut h.ui_rx).await;

        h.cmd_tx.send(UserCommand::SubmitLeague(7)).await.unwrap();
        let _ = next_update(&mut h.ui_rx).await;
        match next_update(&mut h.ui_rx).await {
            UiUpdate::LeagueFailed(msg) => {
                assert!(msg.contains("Could not load league data."));
                assert!(msg.contains("Status: 404"));
            }
            other => panic!("expected LeagueFailed, got {other:?}"),
        }

        h.cmd_tx.send(UserCommand::Quit).await.unwrap();
        let _ = h.handle.await;
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_league_load_is_discarded() {
        let (llm_tx, llm_rx) = mpsc::channel(16);
        let source = Arc::new(StubSource {
            fail_league: false,
            delay: Duration::from_secs(1),
        });
        let state = AppState::new(test_config(None), source, LlmClient::Disabled, llm_tx);
        let mut h = spawn_loop(state, llm_rx);
        let _ = next_update(&mut h.ui_rx).await;

        h.cmd_tx.send(UserCommand::SubmitLeague(1)).await.unwrap();
        h.cmd_tx.send(UserCommand::SubmitLeague(2)).await.unwrap();
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::LeagueLoading(1)));
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::LeagueLoading(2)));
        // Only the second load reports back.
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::LeagueLoaded(_)));
        h.cmd_tx.send(UserCommand::Quit).await.unwrap();
        let _ = h.handle.await;
        assert!(h.ui_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn analysis_without_api_key_shows_banner() {
        let (state, llm_rx) = loaded_state(LlmClient::Disabled).await;
        let mut h = spawn_loop(state, llm_rx);
        let _ = next_update(&mut h.ui_rx).await;

        h.cmd_tx.send(UserCommand::AnalyzeLuck).await.unwrap();
        match next_update(&mut h.ui_rx).await {
            UiUpdate::Error(msg) => assert_eq!(msg, LLM_DISABLED_MESSAGE),
            other => panic!("expected Error, got {other:?}"),
        }

        h.cmd_tx.send(UserCommand::DismissError).await.unwrap();
        assert!(matches!(next_update(&mut h.ui_rx).await, UiUpdate::ErrorCleared));

        h.cmd_tx.send(UserCommand::Quit).await.unwrap();
        let _ = h.handle.await;
    }

    #[tokio::test]
    async fn llm_events_are_routed_by_generation() {
        let (mut state, llm_rx) = loaded_state(LlmClient::Disabled).await;
        let stale = state.begin_analysis(AnalysisKey::Predictions, String::new());
        let current = state.begin_analysis(AnalysisKey::Predictions, String::new());
        let strength = state.begin_analysis(AnalysisKey::TeamStrength(1), "Gunners".into());
        let mut h = spawn_loop(state, llm_rx);
        let _ = next_update(&mut h.ui_rx).await;

        // Stale generation: dropped.
        h.llm_tx
            .send(LlmEvent::Token {
                text: "old".into(),
                generation: stale,
            })
            .await
            .unwrap();
        h.llm_tx
            .send(LlmEvent::Token {
                text: "new".into(),
                generation: current,
            })
            .await
            .unwrap();
        match next_update(&mut h.ui_rx).await {
            UiUpdate::AnalysisToken(AnalysisKey::Predictions, text) => assert_eq!(text, "new"),
            other => panic!("expected AnalysisToken, got {other:?}"),
        }

        h.llm_tx
            .send(LlmEvent::Complete {
                full_text: r#"{"predicted_standings": [
                    {"rank": 2, "team_name": "Blues", "justification": "b"},
                    {"rank": 1, "team_name": "Gunners", "justification": "a"}
                ]}"#
                .into(),
                citations: vec![],
                stop_reason: Some("end_turn".into()),
                input_tokens: 10,
                output_tokens: 20,
                generation: current,
            })
            .await
            .unwrap();
        match next_update(&mut h.ui_rx).await {
            UiUpdate::AnalysisReady(AnalysisKey::Predictions, result) => match *result {
                AnalysisResult::Predictions(p) => assert_eq!(p[0].team_name, "Gunners"),
                other => panic!("unexpected result {other:?}"),
            },
            other => panic!("expected AnalysisReady, got {other:?}"),
        }

        h.llm_tx
            .send(LlmEvent::Complete {
                full_text: "I could not decide.".into(),
                citations: vec![],
                stop_reason: Some("max_tokens".into()),
                input_tokens: 10,
                output_tokens: 512,
                generation: strength,
            })
            .await
            .unwrap();
        match next_update(&mut h.ui_rx).await {
            UiUpdate::AnalysisFailed(AnalysisKey::TeamStrength(1), msg) => {
                assert!(msg.contains("truncated"));
            }
            other => panic!("expected AnalysisFailed, got {other:?}"),
        }
        match next_update(&mut h.ui_rx).await {
            UiUpdate::Error(msg) => assert!(msg.starts_with("Failed to analyze Gunners: ")),
            other => panic!("expected Error, got {other:?}"),
        }

        h.cmd_tx.send(UserCommand::Quit).await.unwrap();
        let _ = h.handle.await;
    }
}
