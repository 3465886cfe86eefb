// Luck inputs: points a manager left on the table this gameweek.

use crate::model::Team;

#[derive(Debug, Clone, PartialEq)]
pub struct LuckInput {
    pub team_name: String,
    pub manager_name: String,
    pub bench_points: i32,
    pub captain_name: Option<String>,
    /// Captain's points after the multiplier (doubled when the multiplier
    /// is not above 1, e.g. when the captain did not play and the vice
    /// took over).
    pub captain_points: i32,
    pub best_scorer_name: Option<String>,
    /// How many points a perfect captain pick would have added.
    pub captaincy_points_lost: i32,
}

pub fn luck_input(team: &Team) -> LuckInput {
    let captain = team.captain();
    let captain_points = captain
        .map(|c| c.live_points * if c.multiplier > 1 { c.multiplier } else { 2 })
        .unwrap_or(0);

    let best = team
        .players
        .iter()
        .reduce(|best, p| if p.live_points > best.live_points { p } else { best });
    let potential = best.map(|p| p.live_points * 2).unwrap_or(0);

    LuckInput {
        team_name: team.team_name.clone(),
        manager_name: team.manager_name.clone(),
        bench_points: team.live_bench_points,
        captain_name: captain.map(|c| c.name.clone()),
        captain_points,
        best_scorer_name: best.map(|p| p.name.clone()),
        captaincy_points_lost: (potential - captain_points).max(0),
    }
}

pub fn luck_inputs(teams: &[Team]) -> Vec<LuckInput> {
    teams.iter().map(luck_input).collect()
}
