// Player ownership across the league's squads.

use std::collections::HashMap;

use crate::model::{Position, Team};

/// How many squads in the league contain a given player.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnershipRow {
    pub player_id: u32,
    pub name: String,
    pub position: Position,
    pub club: String,
    pub count: usize,
    /// Share of league squads, 0.0..=100.0.
    pub percentage: f64,
}

/// Ownership counts over every squad player (bench included), in the order
/// players are first seen.
pub fn ownership(teams: &[Team]) -> Vec<OwnershipRow> {
    let mut index: HashMap<u32, usize> = HashMap::new();
    let mut rows: Vec<OwnershipRow> = Vec::new();

    for player in teams.iter().flat_map(|t| t.players.iter()) {
        match index.get(&player.id) {
            Some(&i) => rows[i].count += 1,
            None => {
                index.insert(player.id, rows.len());
                rows.push(OwnershipRow {
                    player_id: player.id,
                    name: player.name.clone(),
                    position: player.position,
                    club: player.club.clone(),
                    count: 1,
                    percentage: 0.0,
                });
            }
        }
    }

    let team_count = teams.len().max(1) as f64;
    for row in &mut rows {
        row.percentage = row.count as f64 / team_count * 100.0;
    }
    rows
}

pub fn most_owned(rows: &[OwnershipRow], limit: usize) -> Vec<OwnershipRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted.truncate(limit);
    sorted
}

pub fn differentials(rows: &[OwnershipRow], limit: usize) -> Vec<OwnershipRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| a.count.cmp(&b.count));
    sorted.truncate(limit);
    sorted
}

/// Number of rows shown in each ownership list.
pub const OWNERSHIP_LIST_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct OwnershipSummary {
    pub most_owned: Vec<OwnershipRow>,
    pub differentials: Vec<OwnershipRow>,
}

/// Both ownership lists, or `None` when the league has fewer than two
/// teams and ownership carries no signal.
pub fn ownership_summary(teams: &[Team]) -> Option<OwnershipSummary> {
    if teams.len() < 2 {
        return None;
    }
    let rows = ownership(teams);
    Some(OwnershipSummary {
        most_owned: most_owned(&rows, OWNERSHIP_LIST_LEN),
        differentials: differentials(&rows, OWNERSHIP_LIST_LEN),
    })
}
