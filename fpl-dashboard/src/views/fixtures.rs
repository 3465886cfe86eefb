// Fixture ticker: recent form plus upcoming difficulty per club.

use std::collections::HashMap;

use crate::model::{Club, Fixture};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormResult {
    Win,
    Draw,
    Loss,
    /// Finished but the score is missing upstream.
    Unknown,
}

impl FormResult {
    pub fn letter(self) -> char {
        match self {
            FormResult::Win => 'W',
            FormResult::Draw => 'D',
            FormResult::Loss => 'L',
            FormResult::Unknown => 'U',
        }
    }

    pub fn points(self) -> u32 {
        match self {
            FormResult::Win => 3,
            FormResult::Draw => 1,
            FormResult::Loss | FormResult::Unknown => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingFixture {
    pub gameweek: u32,
    pub opponent: String,
    pub is_home: bool,
    /// FPL difficulty rating, 1 (easiest) to 5.
    pub difficulty: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerRow {
    pub club_id: u32,
    pub club_name: String,
    pub short_name: String,
    /// Oldest first.
    pub form: Vec<FormResult>,
    pub form_points: u32,
    pub win_count: usize,
    pub upcoming: Vec<UpcomingFixture>,
}

pub const FORM_LENGTH: usize = 3;
pub const UPCOMING_LENGTH: usize = 10;
pub const UNKNOWN_OPPONENT: &str = "???";

/// One row per club, best recent form first, then by name.
///
/// Returns `None` when there are no clubs, no fixtures, or no current
/// gameweek to anchor the upcoming window.
pub fn fixture_ticker(
    clubs: &[Club],
    fixtures: &[Fixture],
    current_gameweek: Option<u32>,
) -> Option<Vec<TickerRow>> {
    let current = current_gameweek?;
    if clubs.is_empty() || fixtures.is_empty() {
        return None;
    }
    let short_names: HashMap<u32, &str> =
        clubs.iter().map(|c| (c.id, c.short_name.as_str())).collect();

    let mut rows: Vec<TickerRow> = clubs
        .iter()
        .map(|club| {
            let form = recent_form(club.id, fixtures);
            let upcoming = upcoming_fixtures(club.id, fixtures, current, &short_names);
            TickerRow {
                club_id: club.id,
                club_name: club.name.clone(),
                short_name: club.short_name.clone(),
                form_points: form.iter().map(|r| r.points()).sum(),
                win_count: form.iter().filter(|r| **r == FormResult::Win).count(),
                form,
                upcoming,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.form_points
            .cmp(&a.form_points)
            .then_with(|| a.club_name.cmp(&b.club_name))
    });
    Some(rows)
}

fn recent_form(club_id: u32, fixtures: &[Fixture]) -> Vec<FormResult> {
    let mut finished: Vec<&Fixture> = fixtures
        .iter()
        .filter(|f| f.finished && (f.team_h == club_id || f.team_a == club_id))
        .collect();
    finished.sort_by(|a, b| b.event.cmp(&a.event));
    finished.truncate(FORM_LENGTH);
    finished.reverse();
    finished.into_iter().map(|f| result_for(club_id, f)).collect()
}

fn result_for(club_id: u32, f: &Fixture) -> FormResult {
    let (Some(h), Some(a)) = (f.team_h_score, f.team_a_score) else {
        return FormResult::Unknown;
    };
    let (ours, theirs) = if f.team_h == club_id { (h, a) } else { (a, h) };
    match ours.cmp(&theirs) {
        std::cmp::Ordering::Greater => FormResult::Win,
        std::cmp::Ordering::Equal => FormResult::Draw,
        std::cmp::Ordering::Less => FormResult::Loss,
    }
}

fn upcoming_fixtures(
    club_id: u32,
    fixtures: &[Fixture],
    current: u32,
    short_names: &HashMap<u32, &str>,
) -> Vec<UpcomingFixture> {
    let mut upcoming: Vec<(u32, &Fixture)> = fixtures
        .iter()
        .filter(|f| !f.finished && (f.team_h == club_id || f.team_a == club_id))
        .filter_map(|f| f.event.filter(|gw| *gw >= current).map(|gw| (gw, f)))
        .collect();
    upcoming.sort_by_key(|(gw, _)| *gw);
    upcoming.truncate(UPCOMING_LENGTH);

    upcoming
        .into_iter()
        .map(|(gameweek, f)| {
            let is_home = f.team_h == club_id;
            let (opponent_id, difficulty) = if is_home {
                (f.team_a, f.team_h_difficulty)
            } else {
                (f.team_h, f.team_a_difficulty)
            };
            UpcomingFixture {
                gameweek,
                opponent: short_names
                    .get(&opponent_id)
                    .copied()
                    .unwrap_or(UNKNOWN_OPPONENT)
                    .to_string(),
                is_home,
                difficulty,
            }
        })
        .collect()
}

/// Fixtures scheduled for `gameweek`.
pub fn gameweek_fixtures(fixtures: &[Fixture], gameweek: u32) -> Vec<Fixture> {
    fixtures
        .iter()
        .filter(|f| f.event == Some(gameweek))
        .cloned()
        .collect()
}

/// "Home vs Away" labels, with "..." standing in for unknown clubs.
pub fn fixture_names(fixtures: &[Fixture], clubs: &[Club]) -> Vec<String> {
    let names: HashMap<u32, &str> = clubs.iter().map(|c| (c.id, c.name.as_str())).collect();
    let name = |id: u32| names.get(&id).copied().unwrap_or("...");
    fixtures
        .iter()
        .map(|f| format!("{} vs {}", name(f.team_h), name(f.team_a)))
        .collect()
}
