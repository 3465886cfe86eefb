// Staged league loading.
//
// Stage one (`load_league`) fetches enough to render the dashboard: the
// bootstrap, standings, live gameweek stats and every manager's picks.
// Stage two (`load_team_details`) is deferred until a view needs per-week
// history and transfers, because it costs two requests per team plus one
// element summary per transferred player.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::client::{FplError, FplSource};
use super::wire::{Bootstrap, ElementSummary, EntryHistory, EntryPicks, EntryTransfer, Standing};
use crate::model::{
    CaptainSummary, Chip, ChipPlay, Club, GameweekHistory, LeagueData, LivePlayer, LiveStats,
    PlayerDirectory, Position, Team, Transfer,
};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fpl(#[from] FplError),

    #[error("Standings data not found. The league may be private or the ID is incorrect.")]
    StandingsMissing,

    #[error("Could not determine the current gameweek.")]
    NoCurrentGameweek,

    #[error("Could not fetch details for any team. The API may be down or the league is private.")]
    NoTeamsLoaded,
}

/// Name used when a club id is missing from the bootstrap.
pub const UNKNOWN_CLUB: &str = "Unknown";
/// Name used when a transferred element is missing from the bootstrap.
pub const UNKNOWN_PLAYER: &str = "Unknown Player";

// ---------------------------------------------------------------------------
// Bootstrap lookups
// ---------------------------------------------------------------------------

struct Lookup<'a> {
    elements: HashMap<u32, &'a super::wire::Element>,
    clubs: HashMap<u32, &'a str>,
    positions: HashMap<u32, Position>,
}

impl<'a> Lookup<'a> {
    fn new(bootstrap: &'a Bootstrap) -> Self {
        let positions = bootstrap
            .element_types
            .iter()
            .filter_map(|t| Position::from_short(&t.singular_name_short).map(|p| (t.id, p)))
            .collect();
        Lookup {
            elements: bootstrap.elements.iter().map(|e| (e.id, e)).collect(),
            clubs: bootstrap
                .teams
                .iter()
                .map(|c| (c.id, c.name.as_str()))
                .collect(),
            positions,
        }
    }
}

// ---------------------------------------------------------------------------
// Stage one
// ---------------------------------------------------------------------------

/// Load the light view of a league: standings, live points and squads.
///
/// Individual teams whose picks fail to load are dropped with a warning;
/// the load only fails outright when every team fails.
pub async fn load_league(
    source: &dyn FplSource,
    league_id: u64,
    concurrency: usize,
) -> Result<LeagueData, LoadError> {
    info!(league_id, "loading league");

    let bootstrap = source.bootstrap().await?;
    let standings = source.league_standings(league_id).await?;
    let league_name = standings.league.name.clone();
    let results = standings
        .standings
        .ok_or(LoadError::StandingsMissing)?
        .results;

    let current_gameweek = bootstrap
        .events
        .iter()
        .find(|e| e.is_current)
        .map(|e| e.id)
        .ok_or(LoadError::NoCurrentGameweek)?;
    let next_gameweek = bootstrap.events.iter().find(|e| e.is_next).map(|e| e.id);

    let live: HashMap<u32, LiveStats> = source
        .live_gameweek(current_gameweek)
        .await?
        .elements
        .into_iter()
        .map(|e| (e.id, e.stats))
        .collect();

    let lookup = Lookup::new(&bootstrap);

    // Owned items: the load runs inside `tokio::spawn`.
    let fetched: Vec<(Standing, Result<EntryPicks, FplError>)> = stream::iter(results.iter().cloned())
        .map(|standing: Standing| async move {
            let picks = source.entry_picks(standing.entry, current_gameweek).await;
            (standing, picks)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut teams = Vec::with_capacity(fetched.len());
    for (standing, picks) in fetched {
        match picks {
            Ok(picks) => teams.push(build_team(&standing, picks, &lookup, &live, current_gameweek)),
            Err(e) => warn!(entry = standing.entry, "failed to load picks: {}", e),
        }
    }

    if teams.is_empty() && !results.is_empty() {
        return Err(LoadError::NoTeamsLoaded);
    }

    let fixtures = match source.fixtures(None).await {
        Ok(f) => f,
        Err(e) => {
            warn!("failed to load fixtures, continuing without them: {}", e);
            Vec::new()
        }
    };

    let clubs = bootstrap
        .teams
        .iter()
        .map(|c| Club {
            id: c.id,
            name: c.name.clone(),
            short_name: c.short_name.clone(),
        })
        .collect();
    let directory = PlayerDirectory::new(
        bootstrap
            .elements
            .iter()
            .map(|e| (e.id, e.full_name()))
            .collect(),
    );

    info!(
        league_id,
        teams = teams.len(),
        standings = results.len(),
        current_gameweek,
        "league loaded"
    );

    Ok(LeagueData {
        league_id,
        league_name,
        teams,
        clubs,
        current_gameweek,
        next_gameweek,
        fixtures,
        directory,
    })
}

fn build_team(
    standing: &Standing,
    picks: EntryPicks,
    lookup: &Lookup<'_>,
    live: &HashMap<u32, LiveStats>,
    current_gameweek: u32,
) -> Team {
    let mut players = Vec::with_capacity(picks.picks.len());
    for pick in &picks.picks {
        let Some(element) = lookup.elements.get(&pick.element) else {
            debug!(element = pick.element, "pick not in bootstrap, skipping");
            continue;
        };
        let Some(position) = lookup.positions.get(&element.element_type).copied() else {
            warn!(
                element = element.id,
                element_type = element.element_type,
                "unknown element type, skipping"
            );
            continue;
        };
        let stats = live.get(&pick.element).cloned();
        players.push(LivePlayer {
            id: element.id,
            name: element.full_name(),
            position,
            club: lookup
                .clubs
                .get(&element.team)
                .copied()
                .unwrap_or(UNKNOWN_CLUB)
                .to_string(),
            live_points: stats.as_ref().map(|s| s.total_points).unwrap_or(0),
            is_captain: pick.is_captain,
            is_vice_captain: pick.is_vice_captain,
            multiplier: pick.multiplier,
            squad_position: pick.position,
            live_stats: stats,
        });
    }

    let live_gw_points = players.iter().map(|p| p.live_points * p.multiplier).sum();
    let live_bench_points = players
        .iter()
        .filter(|p| !p.is_starter())
        .map(|p| p.live_points)
        .sum();
    let live_captain = players.iter().find(|p| p.is_captain).map(|p| CaptainSummary {
        name: p.name.clone(),
        points: p.live_points,
        captained_points: p.live_points * p.multiplier,
    });

    Team {
        id: standing.entry,
        team_name: standing.entry_name.clone(),
        manager_name: standing.player_name.clone(),
        players,
        gameweek_history: vec![GameweekHistory {
            gameweek: current_gameweek,
            points: standing.event_total,
            total_points: standing.total,
            transfer_cost: 0,
        }],
        transfer_history: Vec::new(),
        chips_played: Vec::new(),
        live_gw_points,
        live_bench_points,
        live_captain,
        active_chip: picks.active_chip.as_deref().and_then(Chip::from_code),
        details_loaded: false,
    }
}

// ---------------------------------------------------------------------------
// Stage two
// ---------------------------------------------------------------------------

/// Fetch full gameweek history, chips and transfers for every team in place.
///
/// Teams whose requests fail keep their light data. Returns how many teams
/// were filled in.
pub async fn load_team_details(
    source: &dyn FplSource,
    teams: &mut [Team],
    directory: &PlayerDirectory,
    concurrency: usize,
) -> usize {
    let concurrency = concurrency.max(1);
    let ids: Vec<u64> = teams.iter().filter(|t| !t.details_loaded).map(|t| t.id).collect();
    info!(teams = ids.len(), "loading team details");

    let fetched: Vec<(u64, Result<(EntryHistory, Vec<EntryTransfer>), FplError>)> =
        stream::iter(ids)
            .map(|id| async move {
                let result = futures_util::try_join!(source.entry_history(id), source.entry_transfers(id));
                (id, result)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

    let mut details = HashMap::new();
    for (id, result) in fetched {
        match result {
            Ok(d) => {
                details.insert(id, d);
            }
            Err(e) => warn!(entry = id, "failed to load team details: {}", e),
        }
    }

    let summaries = fetch_summaries(source, &details, concurrency).await;

    let mut loaded = 0;
    for team in teams.iter_mut() {
        let Some((history, transfers)) = details.remove(&team.id) else {
            continue;
        };
        apply_history(team, history);
        team.transfer_history = build_transfers(&transfers, directory, &summaries);
        team.details_loaded = true;
        loaded += 1;
    }

    info!(loaded, "team details loaded");
    loaded
}

/// Fetch one element summary per distinct transferred player. A failed
/// summary is stored as empty so each player is requested at most once.
async fn fetch_summaries(
    source: &dyn FplSource,
    details: &HashMap<u64, (EntryHistory, Vec<EntryTransfer>)>,
    concurrency: usize,
) -> HashMap<u32, ElementSummary> {
    let elements: HashSet<u32> = details
        .values()
        .flat_map(|(_, transfers)| transfers.iter())
        .flat_map(|t| [t.element_in, t.element_out])
        .collect();
    debug!(elements = elements.len(), "fetching element summaries");

    stream::iter(elements)
        .map(|element| async move {
            let summary = match source.element_summary(element).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(element, "failed to load element summary: {}", e);
                    ElementSummary::default()
                }
            };
            (element, summary)
        })
        .buffer_unordered(concurrency)
        .collect()
        .await
}

fn apply_history(team: &mut Team, history: EntryHistory) {
    team.gameweek_history = history
        .current
        .iter()
        .map(|h| GameweekHistory {
            gameweek: h.event,
            points: h.points,
            total_points: h.total_points,
            transfer_cost: h.event_transfers_cost,
        })
        .collect();

    if team
        .gameweek_history
        .windows(2)
        .any(|w| w[1].total_points < w[0].total_points)
    {
        warn!(entry = team.id, "gameweek history totals are not non-decreasing");
    }

    team.chips_played = history
        .chips
        .iter()
        .filter_map(|c| {
            Chip::from_code(&c.name).map(|chip| ChipPlay {
                chip,
                gameweek: c.event,
            })
        })
        .collect();
}

fn build_transfers(
    transfers: &[EntryTransfer],
    directory: &PlayerDirectory,
    summaries: &HashMap<u32, ElementSummary>,
) -> Vec<Transfer> {
    let name = |id: u32| directory.name(id).unwrap_or(UNKNOWN_PLAYER).to_string();
    let points = |id: u32, gw: u32| summaries.get(&id).map(|s| s.points_in(gw)).unwrap_or(0);

    let mut out: Vec<(Option<DateTime<Utc>>, Transfer)> = transfers
        .iter()
        .map(|t| {
            let parsed = DateTime::parse_from_rfc3339(&t.time)
                .ok()
                .map(|d| d.with_timezone(&Utc));
            let transfer = Transfer {
                gameweek: t.event,
                player_in: name(t.element_in),
                player_out: name(t.element_out),
                time: t.time.clone(),
                player_in_points: points(t.element_in, t.event),
                player_out_points: points(t.element_out, t.event),
            };
            (parsed, transfer)
        })
        .collect();

    out.sort_by(|(ta, a), (tb, b)| b.gameweek.cmp(&a.gameweek).then_with(|| tb.cmp(ta)));
    out.into_iter().map(|(_, t)| t).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fpl::wire::{Fixtures, LeagueStandings, LiveGameweek};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BOOTSTRAP: &str = r#"{
        "events": [
            {"id": 9, "is_current": false, "is_next": false, "finished": true},
            {"id": 10, "is_current": true, "is_next": false, "finished": false},
            {"id": 11, "is_current": false, "is_next": true, "finished": false}
        ],
        "element_types": [
            {"id": 1, "singular_name_short": "GKP"},
            {"id": 2, "singular_name_short": "DEF"},
            {"id": 3, "singular_name_short": "MID"},
            {"id": 4, "singular_name_short": "FWD"}
        ],
        "teams": [
            {"id": 1, "name": "Arsenal", "short_name": "ARS"},
            {"id": 2, "name": "Liverpool", "short_name": "LIV"}
        ],
        "elements": [
            {"id": 1, "first_name": "David", "second_name": "Raya", "team": 1, "element_type": 1},
            {"id": 2, "first_name": "Virgil", "second_name": "van Dijk", "team": 2, "element_type": 2},
            {"id": 3, "first_name": "Mohamed", "second_name": "Salah", "team": 2, "element_type": 3},
            {"id": 4, "first_name": "Bukayo", "second_name": "Saka", "team": 1, "element_type": 3},
            {"id": 5, "first_name": "Kai", "second_name": "Havertz", "team": 9, "element_type": 4}
        ]
    }"#;

    const LIVE: &str = r#"{"elements": [
        {"id": 1, "stats": {"total_points": 6, "minutes": 90}},
        {"id": 2, "stats": {"total_points": 2, "minutes": 90}},
        {"id": 3, "stats": {"total_points": 12, "minutes": 90}},
        {"id": 4, "stats": {"total_points": 3, "minutes": 70}},
        {"id": 5, "stats": {"total_points": 9, "minutes": 90}}
    ]}"#;

    fn standings_json(entries: &[(u64, &str, &str, i32)]) -> String {
        let results: Vec<String> = entries
            .iter()
            .map(|(id, manager, team, total)| {
                format!(
                    r#"{{"entry": {id}, "player_name": "{manager}", "entry_name": "{team}", "total": {total}, "event_total": 40, "rank": 1}}"#
                )
            })
            .collect();
        format!(
            r#"{{"league": {{"id": 77, "name": "Office League"}}, "standings": {{"results": [{}]}}}}"#,
            results.join(",")
        )
    }

    /// In-memory FPL API. Entries missing from `picks` answer with a 404.
    struct FakeSource {
        bootstrap: Bootstrap,
        standings: LeagueStandings,
        picks: HashMap<u64, EntryPicks>,
        history: HashMap<u64, EntryHistory>,
        transfers: HashMap<u64, Vec<EntryTransfer>>,
        summaries: HashMap<u32, ElementSummary>,
        summary_calls: AtomicUsize,
        fixtures_fail: bool,
    }

    fn not_found(what: &str) -> FplError {
        FplError::Status {
            url: format!("fake://{what}"),
            status: 404,
            body: "Not found".to_string(),
        }
    }

    #[async_trait]
    impl FplSource for FakeSource {
        async fn bootstrap(&self) -> Result<Bootstrap, FplError> {
            Ok(self.bootstrap.clone())
        }
        async fn league_standings(&self, _league_id: u64) -> Result<LeagueStandings, FplError> {
            Ok(self.standings.clone())
        }
        async fn entry_picks(&self, entry: u64, _gameweek: u32) -> Result<EntryPicks, FplError> {
            self.picks.get(&entry).cloned().ok_or_else(|| not_found("picks"))
        }
        async fn entry_history(&self, entry: u64) -> Result<EntryHistory, FplError> {
            self.history.get(&entry).cloned().ok_or_else(|| not_found("history"))
        }
        async fn entry_transfers(&self, entry: u64) -> Result<Vec<EntryTransfer>, FplError> {
            self.transfers.get(&entry).cloned().ok_or_else(|| not_found("transfers"))
        }
        async fn live_gameweek(&self, _gameweek: u32) -> Result<LiveGameweek, FplError> {
            Ok(serde_json::from_str(LIVE).unwrap())
        }
        async fn fixtures(&self, _gameweek: Option<u32>) -> Result<Fixtures, FplError> {
            if self.fixtures_fail {
                Err(not_found("fixtures"))
            } else {
                Ok(Vec::new())
            }
        }
        async fn element_summary(&self, element: u32) -> Result<ElementSummary, FplError> {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
            self.summaries.get(&element).cloned().ok_or_else(|| not_found("summary"))
        }
    }

    fn picks(chip: Option<&str>, captain: u32, captain_multiplier: i32) -> EntryPicks {
        let chip = chip.map(|c| format!("\"{c}\"")).unwrap_or_else(|| "null".into());
        let pick = |element: u32, position: u8| {
            let is_captain = element == captain;
            let multiplier = if is_captain {
                captain_multiplier
            } else if position <= 11 {
                1
            } else {
                0
            };
            format!(
                r#"{{"element": {element}, "position": {position}, "is_captain": {is_captain}, "is_vice_captain": false, "multiplier": {multiplier}}}"#
            )
        };
        let json = format!(
            r#"{{"active_chip": {chip}, "picks": [{}, {}, {}, {}, {}]}}"#,
            pick(1, 1),
            pick(2, 2),
            pick(3, 3),
            pick(4, 12),
            pick(99, 13)
        );
        serde_json::from_str(&json).unwrap()
    }

    fn fake(entries: &[(u64, &str, &str, i32)]) -> FakeSource {
        FakeSource {
            bootstrap: serde_json::from_str(BOOTSTRAP).unwrap(),
            standings: serde_json::from_str(&standings_json(entries)).unwrap(),
            picks: HashMap::new(),
            history: HashMap::new(),
            transfers: HashMap::new(),
            summaries: HashMap::new(),
            summary_calls: AtomicUsize::new(0),
            fixtures_fail: false,
        }
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn league_load_can_be_spawned() {
        let source = fake(&[(101, "Ann", "Gunners", 600)]);
        let load = load_league(&source, 1, 2);
        assert_send(&load);
        let mut teams = Vec::new();
        let directory = PlayerDirectory::default();
        assert_send(&load_team_details(&source, &mut teams, &directory, 2));
    }

    #[tokio::test]
    async fn builds_teams_with_live_points() {
        let mut source = fake(&[(101, "Ann", "Gunners", 600), (102, "Bob", "Reds", 580)]);
        source.picks.insert(101, picks(None, 3, 2));
        source.picks.insert(102, picks(Some("3xc"), 1, 3));

        let league = load_league(&source, 77, 4).await.unwrap();
        assert_eq!(league.league_name, "Office League");
        assert_eq!(league.current_gameweek, 10);
        assert_eq!(league.next_gameweek, Some(11));
        assert_eq!(league.teams.len(), 2);

        let ann = &league.teams[0];
        assert_eq!(ann.team_name, "Gunners");
        assert_eq!(ann.manager_name, "Ann");
        // Element 99 is not in the bootstrap.
        assert_eq!(ann.players.len(), 4);
        // 6 + 2 + 12*2, bench Saka contributes 0.
        assert_eq!(ann.live_gw_points, 32);
        assert_eq!(ann.live_bench_points, 3);
        let captain = ann.live_captain.as_ref().unwrap();
        assert_eq!(captain.name, "Mohamed Salah");
        assert_eq!(captain.points, 12);
        assert_eq!(captain.captained_points, 24);
        assert_eq!(ann.total_points(), 600);
        assert_eq!(ann.gameweek_history[0].points, 40);
        assert!(ann.active_chip.is_none());

        let bob = &league.teams[1];
        assert_eq!(bob.active_chip, Some(Chip::TripleCaptain));
        assert_eq!(bob.live_captain.as_ref().unwrap().captained_points, 18);
    }

    #[tokio::test]
    async fn unknown_club_falls_back() {
        let mut source = fake(&[(101, "Ann", "Gunners", 600)]);
        source.picks.insert(
            101,
            serde_json::from_str(
                r#"{"active_chip": null, "picks": [{"element": 5, "position": 1, "multiplier": 1}]}"#,
            )
            .unwrap(),
        );
        let league = load_league(&source, 77, 4).await.unwrap();
        assert_eq!(league.teams[0].players[0].club, UNKNOWN_CLUB);
        assert_eq!(league.teams[0].players[0].name, "Kai Havertz");
    }

    #[tokio::test]
    async fn missing_standings_is_specific_error() {
        let mut source = fake(&[]);
        source.standings = serde_json::from_str(r#"{"league": {"id": 77, "name": "X"}}"#).unwrap();
        let err = load_league(&source, 77, 4).await.unwrap_err();
        assert!(matches!(err, LoadError::StandingsMissing));
        assert_eq!(
            err.to_string(),
            "Standings data not found. The league may be private or the ID is incorrect."
        );
    }

    #[tokio::test]
    async fn no_current_gameweek_is_error() {
        let mut source = fake(&[(101, "Ann", "Gunners", 600)]);
        for event in &mut source.bootstrap.events {
            event.is_current = false;
        }
        let err = load_league(&source, 77, 4).await.unwrap_err();
        assert!(matches!(err, LoadError::NoCurrentGameweek));
    }

    #[tokio::test]
    async fn empty_league_yields_no_teams() {
        let source = fake(&[]);
        let league = load_league(&source, 77, 4).await.unwrap();
        assert!(league.teams.is_empty());
    }

    #[tokio::test]
    async fn partial_pick_failures_are_tolerated() {
        let mut source = fake(&[(101, "Ann", "Gunners", 600), (102, "Bob", "Reds", 580)]);
        source.picks.insert(102, picks(None, 1, 2));
        let league = load_league(&source, 77, 4).await.unwrap();
        assert_eq!(league.teams.len(), 1);
        assert_eq!(league.teams[0].id, 102);
    }

    #[tokio::test]
    async fn all_pick_failures_is_error() {
        let source = fake(&[(101, "Ann", "Gunners", 600), (102, "Bob", "Reds", 580)]);
        let err = load_league(&source, 77, 4).await.unwrap_err();
        assert!(matches!(err, LoadError::NoTeamsLoaded));
    }

    #[tokio::test]
    async fn fixture_failure_does_not_fail_load() {
        let mut source = fake(&[(101, "Ann", "Gunners", 600)]);
        source.picks.insert(101, picks(None, 1, 2));
        source.fixtures_fail = true;
        let league = load_league(&source, 77, 4).await.unwrap();
        assert!(league.fixtures.is_empty());
        assert_eq!(league.teams.len(), 1);
    }

    #[tokio::test]
    async fn details_fill_history_and_sorted_transfers() {
        let mut source = fake(&[(101, "Ann", "Gunners", 600)]);
        source.picks.insert(101, picks(None, 1, 2));
        source.history.insert(
            101,
            serde_json::from_str(
                r#"{"current": [
                    {"event": 1, "points": 70, "total_points": 70, "event_transfers_cost": 0},
                    {"event": 2, "points": 50, "total_points": 120, "event_transfers_cost": 4}
                ], "chips": [{"name": "wildcard", "event": 2}]}"#,
            )
            .unwrap(),
        );
        source.transfers.insert(
            101,
            serde_json::from_str(
                r#"[
                    {"element_in": 3, "element_out": 4, "event": 2, "time": "2024-08-20T10:00:00Z"},
                    {"element_in": 4, "element_out": 3, "event": 3, "time": "2024-08-27T09:00:00Z"},
                    {"element_in": 1, "element_out": 404, "event": 3, "time": "2024-08-28T09:00:00Z"}
                ]"#,
            )
            .unwrap(),
        );
        source.summaries.insert(
            3,
            serde_json::from_str(r#"{"history": [{"round": 2, "total_points": 13}, {"round": 3, "total_points": 2}]}"#)
                .unwrap(),
        );
        source.summaries.insert(
            4,
            serde_json::from_str(r#"{"history": [{"round": 2, "total_points": 1}, {"round": 3, "total_points": 8}]}"#)
                .unwrap(),
        );

        let league = load_league(&source, 77, 4).await.unwrap();
        let mut teams = league.teams.clone();
        let loaded = load_team_details(&source, &mut teams, &league.directory, 4).await;
        assert_eq!(loaded, 1);

        let team = &teams[0];
        assert!(team.details_loaded);
        assert_eq!(team.gameweek_history.len(), 2);
        assert_eq!(team.gameweek_history[1].transfer_cost, 4);
        assert_eq!(team.total_points(), 120);
        assert_eq!(
            team.chips_played,
            vec![ChipPlay { chip: Chip::Wildcard, gameweek: 2 }]
        );

        let t = &team.transfer_history;
        assert_eq!(t.len(), 3);
        // GW3 newest first, then GW2.
        assert_eq!(t[0].player_in, "David Raya");
        assert_eq!(t[0].player_out, UNKNOWN_PLAYER);
        assert_eq!(t[1].player_in, "Bukayo Saka");
        assert_eq!(t[1].player_in_points, 8);
        assert_eq!(t[1].player_out_points, 2);
        assert_eq!(t[2].gameweek, 2);
        assert_eq!(t[2].player_in_points, 13);
        assert_eq!(t[2].player_out_points, 1);

        // One request per distinct element (1, 3, 4, 404); failures cached as empty.
        assert_eq!(source.summary_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn failed_details_keep_light_data() {
        let mut source = fake(&[(101, "Ann", "Gunners", 600)]);
        source.picks.insert(101, picks(None, 1, 2));
        let league = load_league(&source, 77, 4).await.unwrap();
        let mut teams = league.teams.clone();

        let loaded = load_team_details(&source, &mut teams, &league.directory, 4).await;
        assert_eq!(loaded, 0);
        assert!(!teams[0].details_loaded);
        assert_eq!(teams[0].gameweek_history.len(), 1);
        assert_eq!(teams[0].total_points(), 600);
    }
}
