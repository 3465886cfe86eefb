// FPL API response shapes.
//
// Only the fields the dashboard reads are declared; serde ignores the rest.
// Optional or frequently-null upstream fields carry `#[serde(default)]`.

use serde::Deserialize;

use crate::model::{Fixture, LiveStats};

// ---------------------------------------------------------------------------
// bootstrap-static/
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Bootstrap {
    pub events: Vec<Event>,
    pub elements: Vec<Element>,
    pub teams: Vec<ClubInfo>,
    pub element_types: Vec<ElementType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: u32,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_next: bool,
    #[serde(default)]
    pub finished: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    pub id: u32,
    pub first_name: String,
    pub second_name: String,
    /// Club id.
    pub team: u32,
    pub element_type: u32,
}

impl Element {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.second_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClubInfo {
    pub id: u32,
    pub name: String,
    pub short_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementType {
    pub id: u32,
    pub singular_name_short: String,
}

// ---------------------------------------------------------------------------
// leagues-classic/{id}/standings/
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueStandings {
    pub league: LeagueInfo,
    /// Absent for private or unknown leagues.
    #[serde(default)]
    pub standings: Option<StandingsPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueInfo {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandingsPage {
    #[serde(default)]
    pub results: Vec<Standing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Standing {
    pub entry: u64,
    pub player_name: String,
    pub entry_name: String,
    pub total: i32,
    #[serde(default)]
    pub event_total: i32,
    #[serde(default)]
    pub rank: u32,
}

// ---------------------------------------------------------------------------
// entry/{id}/event/{gw}/picks/
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EntryPicks {
    pub picks: Vec<Pick>,
    #[serde(default)]
    pub active_chip: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pick {
    pub element: u32,
    pub position: u8,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice_captain: bool,
    #[serde(default)]
    pub multiplier: i32,
}

// ---------------------------------------------------------------------------
// entry/{id}/history/ and entry/{id}/transfers/
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EntryHistory {
    #[serde(default)]
    pub current: Vec<HistoryEvent>,
    #[serde(default)]
    pub chips: Vec<ChipUse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEvent {
    pub event: u32,
    pub points: i32,
    pub total_points: i32,
    #[serde(default)]
    pub event_transfers_cost: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChipUse {
    pub name: String,
    pub event: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryTransfer {
    pub element_in: u32,
    pub element_out: u32,
    pub event: u32,
    #[serde(default)]
    pub time: String,
}

// ---------------------------------------------------------------------------
// event/{gw}/live/
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LiveGameweek {
    pub elements: Vec<LiveElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveElement {
    pub id: u32,
    #[serde(default)]
    pub stats: LiveStats,
}

// ---------------------------------------------------------------------------
// fixtures/ and element-summary/{id}/
// ---------------------------------------------------------------------------

pub type Fixtures = Vec<Fixture>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementSummary {
    #[serde(default)]
    pub history: Vec<ElementGameweek>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementGameweek {
    #[serde(alias = "event")]
    pub round: u32,
    pub total_points: i32,
}

impl ElementSummary {
    /// Points scored in `gameweek`, summed across double gameweeks; 0 if
    /// the player did not feature.
    pub fn points_in(&self, gameweek: u32) -> i32 {
        self.history
            .iter()
            .filter(|h| h.round == gameweek)
            .map(|h| h.total_points)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
