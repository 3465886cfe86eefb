// Transfer history grouped for display.

use std::collections::BTreeMap;

use crate::model::{Team, Transfer};

/// One manager's moves within a gameweek.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerTransfers {
    pub team_name: String,
    pub manager_name: String,
    pub transfers: Vec<Transfer>,
}

impl ManagerTransfers {
    /// Points gained (or lost) by the moves in this gameweek.
    pub fn net_points(&self) -> i32 {
        self.transfers
            .iter()
            .map(|t| t.player_in_points - t.player_out_points)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameweekTransfers {
    pub gameweek: u32,
    pub managers: Vec<ManagerTransfers>,
}

/// All league transfers, newest gameweek first, managers by team name.
pub fn transfers_by_gameweek(teams: &[Team]) -> Vec<GameweekTransfers> {
    let mut grouped: BTreeMap<u32, Vec<ManagerTransfers>> = BTreeMap::new();

    for team in teams {
        let mut by_gw: BTreeMap<u32, Vec<Transfer>> = BTreeMap::new();
        for t in &team.transfer_history {
            by_gw.entry(t.gameweek).or_default().push(t.clone());
        }
        for (gameweek, transfers) in by_gw {
            grouped.entry(gameweek).or_default().push(ManagerTransfers {
                team_name: team.team_name.clone(),
                manager_name: team.manager_name.clone(),
                transfers,
            });
        }
    }

    grouped
        .into_iter()
        .rev()
        .map(|(gameweek, mut managers)| {
            managers.sort_by(|a, b| a.team_name.cmp(&b.team_name));
            GameweekTransfers { gameweek, managers }
        })
        .collect()
}

/// One team's transfers, grouped the same way.
pub fn team_transfers(team: &Team) -> Vec<GameweekTransfers> {
    transfers_by_gameweek(std::slice::from_ref(team))
}

/// Net points gained across all of a team's transfers.
pub fn net_transfer_gain(team: &Team) -> i32 {
    team.transfer_history
        .iter()
        .map(|t| t.player_in_points - t.player_out_points)
        .sum()
}
