// Message types passed between the TUI, the app orchestrator and the LLM
// streaming tasks.
//
// The TUI sends `UserCommand`s to the app; the app sends `UiUpdate`s back.
// LLM tasks stream `LlmEvent`s to the app, tagged with a generation so
// events from superseded requests can be dropped.

use crate::llm::results::{
    AiAnalysisResult, GroundingSource, KeyMatch, LuckAnalysis, PredictedStanding,
    PvpAnalysisResult, ScoutResult,
};
use crate::model::{LeagueData, Team};

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Top-level view selected in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Dashboard,
    History,
    Analysis,
    Pvp,
    Players,
    Scout,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Dashboard,
        View::History,
        View::Analysis,
        View::Pvp,
        View::Players,
        View::Scout,
    ];

    pub fn label(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::History => "History",
            View::Analysis => "AI Analysis",
            View::Pvp => "PvP",
            View::Players => "Players",
            View::Scout => "AI Scout",
        }
    }

    pub fn index(self) -> usize {
        View::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }

    /// Views that need per-team details (history, transfers, chips) loaded.
    pub fn needs_details(self) -> bool {
        matches!(self, View::History | View::Analysis)
    }
}

/// Sub-sections of the analysis view, cycled with Tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisSection {
    #[default]
    Strength,
    Predictions,
    Luck,
    KeyMatches,
    Ticker,
}

impl AnalysisSection {
    pub const ALL: [AnalysisSection; 5] = [
        AnalysisSection::Strength,
        AnalysisSection::Predictions,
        AnalysisSection::Luck,
        AnalysisSection::KeyMatches,
        AnalysisSection::Ticker,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AnalysisSection::Strength => "Team Strength",
            AnalysisSection::Predictions => "Final Standings",
            AnalysisSection::Luck => "Luck",
            AnalysisSection::KeyMatches => "Key Matches",
            AnalysisSection::Ticker => "Fixture Ticker",
        }
    }

    pub fn next(self) -> Self {
        let i = AnalysisSection::ALL
            .iter()
            .position(|s| *s == self)
            .unwrap_or(0);
        AnalysisSection::ALL[(i + 1) % AnalysisSection::ALL.len()]
    }
}

// ---------------------------------------------------------------------------
// LLM
// ---------------------------------------------------------------------------

/// Identifies one narrative analysis. Only one request per key is in flight
/// at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKey {
    TeamStrength(u64),
    KeyMatches,
    Predictions,
    Luck,
    Pvp,
    Scout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmStatus {
    #[default]
    Idle,
    Streaming,
    Complete,
    Error,
}

/// Events produced by an LLM streaming task.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmEvent {
    Token {
        text: String,
        generation: u64,
    },
    Complete {
        full_text: String,
        /// Web sources cited while answering, in first-seen order.
        citations: Vec<GroundingSource>,
        stop_reason: Option<String>,
        input_tokens: u32,
        output_tokens: u32,
        generation: u64,
    },
    Error {
        message: String,
        generation: u64,
    },
}

impl LlmEvent {
    pub fn generation(&self) -> u64 {
        match self {
            LlmEvent::Token { generation, .. }
            | LlmEvent::Complete { generation, .. }
            | LlmEvent::Error { generation, .. } => *generation,
        }
    }
}

/// A parsed narrative result, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    TeamStrength(AiAnalysisResult),
    KeyMatches(Vec<KeyMatch>),
    Predictions(Vec<PredictedStanding>),
    Luck(Vec<LuckAnalysis>),
    Pvp(PvpAnalysisResult),
    Scout(ScoutResult),
}

// ---------------------------------------------------------------------------
// TUI <-> app
// ---------------------------------------------------------------------------

/// Commands from the TUI to the app orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    SubmitLeague(u64),
    /// Drop the loaded league and return to the league input.
    ChangeLeague,
    /// Load per-team history, transfers and chips if not already loaded.
    LoadDetails,
    AnalyzeTeam(u64),
    AnalyzeKeyMatches,
    PredictStandings,
    AnalyzeLuck,
    AnalyzePvp(u64, u64),
    Scout(u64),
    DismissError,
    Quit,
}

/// Updates from the app orchestrator to the TUI.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    LeagueLoading(u64),
    LeagueLoaded(Box<LeagueData>),
    LeagueFailed(String),
    LeagueCleared,
    DetailsLoading,
    /// Teams with history, transfers and chips attached.
    DetailsLoaded(Vec<Team>),
    AnalysisStarted(AnalysisKey),
    AnalysisToken(AnalysisKey, String),
    AnalysisReady(AnalysisKey, Box<AnalysisResult>),
    AnalysisFailed(AnalysisKey, String),
    /// Non-fatal error banner.
    Error(String),
    ErrorCleared,
    LlmAvailability(bool),
}
