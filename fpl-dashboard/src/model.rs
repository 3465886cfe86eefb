// Domain model: denormalized league, team, and player records.
//
// Built fresh by the loader on every league load and discarded when the
// user switches league. Everything downstream (views, prompts, widgets)
// reads these types and never the raw API shapes.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Squad position category as FPL reports it in `element_types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    /// Parse FPL's short element-type name (`GKP`, `DEF`, `MID`, `FWD`).
    pub fn from_short(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GKP" | "GK" => Some(Position::Goalkeeper),
            "DEF" => Some(Position::Defender),
            "MID" => Some(Position::Midfielder),
            "FWD" => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}

// ---------------------------------------------------------------------------
// Chip
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chip {
    BenchBoost,
    TripleCaptain,
    FreeHit,
    Wildcard,
    AssistantManager,
}

impl Chip {
    /// Parse an FPL chip code. Unknown codes, empty strings and the literal
    /// `"null"` yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "bboost" => Some(Chip::BenchBoost),
            "3xc" => Some(Chip::TripleCaptain),
            "freehit" => Some(Chip::FreeHit),
            "wildcard" => Some(Chip::Wildcard),
            "manager" => Some(Chip::AssistantManager),
            _ => None,
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            Chip::BenchBoost => "BB",
            Chip::TripleCaptain => "TC",
            Chip::FreeHit => "FH",
            Chip::Wildcard => "WC",
            Chip::AssistantManager => "AM",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Chip::BenchBoost => "Bench Boost",
            Chip::TripleCaptain => "Triple Captain",
            Chip::FreeHit => "Free Hit",
            Chip::Wildcard => "Wildcard",
            Chip::AssistantManager => "Assistant Manager",
        }
    }
}

// ---------------------------------------------------------------------------
// Live stats
// ---------------------------------------------------------------------------

/// Raw per-gameweek match stats for one player. Missing fields read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveStats {
    pub minutes: i32,
    pub goals_scored: i32,
    pub assists: i32,
    pub clean_sheets: i32,
    pub goals_conceded: i32,
    pub own_goals: i32,
    pub penalties_saved: i32,
    pub penalties_missed: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
    pub saves: i32,
    pub bonus: i32,
    pub bps: i32,
    pub total_points: i32,
    pub clearances_blocks_interceptions: i32,
    pub tackles: i32,
    pub recoveries: i32,
}

// ---------------------------------------------------------------------------
// Players and teams
// ---------------------------------------------------------------------------

/// A squad member with this gameweek's live data joined in.
#[derive(Debug, Clone, PartialEq)]
pub struct LivePlayer {
    pub id: u32,
    pub name: String,
    pub position: Position,
    /// Premier League club name.
    pub club: String,
    pub live_points: i32,
    pub is_captain: bool,
    pub is_vice_captain: bool,
    pub multiplier: i32,
    /// 1..=11 are starters, 12..=15 the bench.
    pub squad_position: u8,
    pub live_stats: Option<LiveStats>,
}

/// Squad positions above this are bench slots.
pub const LAST_STARTER: u8 = 11;

impl LivePlayer {
    pub fn is_starter(&self) -> bool {
        self.squad_position <= LAST_STARTER
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameweekHistory {
    pub gameweek: u32,
    pub points: i32,
    pub total_points: i32,
    pub transfer_cost: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub gameweek: u32,
    pub player_in: String,
    pub player_out: String,
    /// RFC 3339 timestamp as reported upstream.
    pub time: String,
    pub player_in_points: i32,
    pub player_out_points: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChipPlay {
    pub chip: Chip,
    pub gameweek: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptainSummary {
    pub name: String,
    pub points: i32,
    /// Points after the captaincy multiplier.
    pub captained_points: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    /// FPL entry id.
    pub id: u64,
    pub team_name: String,
    pub manager_name: String,
    /// Squad in pick order.
    pub players: Vec<LivePlayer>,
    pub gameweek_history: Vec<GameweekHistory>,
    pub transfer_history: Vec<Transfer>,
    pub chips_played: Vec<ChipPlay>,
    pub live_gw_points: i32,
    pub live_bench_points: i32,
    pub live_captain: Option<CaptainSummary>,
    pub active_chip: Option<Chip>,
    /// True once the full history and transfers have been fetched.
    pub details_loaded: bool,
}

impl Team {
    /// Season total from the latest history entry, 0 when unknown.
    pub fn total_points(&self) -> i32 {
        self.gameweek_history
            .last()
            .map(|h| h.total_points)
            .unwrap_or(0)
    }

    pub fn starters(&self) -> impl Iterator<Item = &LivePlayer> {
        self.players.iter().filter(|p| p.is_starter())
    }

    pub fn captain(&self) -> Option<&LivePlayer> {
        self.players.iter().find(|p| p.is_captain)
    }

    pub fn vice_captain(&self) -> Option<&LivePlayer> {
        self.players.iter().find(|p| p.is_vice_captain)
    }
}

// ---------------------------------------------------------------------------
// Clubs and fixtures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: u32,
    pub name: String,
    pub short_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u32,
    #[serde(default)]
    pub event: Option<u32>,
    #[serde(default)]
    pub kickoff_time: Option<String>,
    pub team_h: u32,
    pub team_a: u32,
    #[serde(default)]
    pub team_h_score: Option<i32>,
    #[serde(default)]
    pub team_a_score: Option<i32>,
    #[serde(default)]
    pub team_h_difficulty: u8,
    #[serde(default)]
    pub team_a_difficulty: u8,
    #[serde(default)]
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// Player directory
// ---------------------------------------------------------------------------

/// Bootstrap element lookup, kept after stage one for lazy detail loading.
#[derive(Debug, Clone, Default)]
pub struct PlayerDirectory {
    names: HashMap<u32, String>,
}

impl PlayerDirectory {
    pub fn new(names: HashMap<u32, String>) -> Self {
        PlayerDirectory { names }
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ---------------------------------------------------------------------------
// LeagueData
// ---------------------------------------------------------------------------

/// Everything known about one loaded mini-league.
#[derive(Debug, Clone)]
pub struct LeagueData {
    pub league_id: u64,
    pub league_name: String,
    pub teams: Vec<Team>,
    pub clubs: Vec<Club>,
    pub current_gameweek: u32,
    pub next_gameweek: Option<u32>,
    /// All season fixtures.
    pub fixtures: Vec<Fixture>,
    pub directory: PlayerDirectory,
}

impl LeagueData {
    pub fn team(&self, id: u64) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn details_loaded(&self) -> bool {
        !self.teams.is_empty() && self.teams.iter().all(|t| t.details_loaded)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
