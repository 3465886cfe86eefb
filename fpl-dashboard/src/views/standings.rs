// League table and gameweek highlights.

use crate::model::{Chip, Team};

/// One row of the league table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub rank: usize,
    pub team_id: u64,
    pub team_name: String,
    pub manager_name: String,
    pub live_gw_points: i32,
    pub live_bench_points: i32,
    pub total_points: i32,
    pub chip: Option<Chip>,
}

/// Teams ordered by season total, highest first. Ties keep input order.
pub fn league_table(teams: &[Team]) -> Vec<TableRow> {
    let mut sorted: Vec<&Team> = teams.iter().collect();
    sorted.sort_by(|a, b| b.total_points().cmp(&a.total_points()));
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, t)| TableRow {
            rank: i + 1,
            team_id: t.id,
            team_name: t.team_name.clone(),
            manager_name: t.manager_name.clone(),
            live_gw_points: t.live_gw_points,
            live_bench_points: t.live_bench_points,
            total_points: t.total_points(),
            chip: t.active_chip,
        })
        .collect()
}

/// A team singled out for a highlight card.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub team_name: String,
    pub manager_name: String,
    pub points: i32,
    /// Extra context, e.g. the captain's name.
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameweekHighlights {
    pub top_scorer: Highlight,
    /// `None` when no team has a captain this gameweek.
    pub best_captain: Option<Highlight>,
    pub benching_blunder: Highlight,
}

/// Highlights for the current gameweek, or `None` for an empty league.
/// Earlier teams win ties.
pub fn gameweek_highlights(teams: &[Team]) -> Option<GameweekHighlights> {
    let first = teams.first()?;

    let mut top = first;
    for t in teams {
        if t.live_gw_points > top.live_gw_points {
            top = t;
        }
    }

    let mut best_captain: Option<(&Team, i32)> = None;
    for t in teams {
        if let Some(c) = &t.live_captain {
            if best_captain.map_or(true, |(_, best)| c.captained_points > best) {
                best_captain = Some((t, c.captained_points));
            }
        }
    }

    let mut blunder = first;
    let mut blunder_points = -1;
    for t in teams {
        if t.live_bench_points > blunder_points {
            blunder = t;
            blunder_points = t.live_bench_points;
        }
    }

    Some(GameweekHighlights {
        top_scorer: Highlight {
            team_name: top.team_name.clone(),
            manager_name: top.manager_name.clone(),
            points: top.live_gw_points,
            detail: None,
        },
        best_captain: best_captain.map(|(t, points)| Highlight {
            team_name: t.team_name.clone(),
            manager_name: t.manager_name.clone(),
            points,
            detail: t.live_captain.as_ref().map(|c| c.name.clone()),
        }),
        benching_blunder: Highlight {
            team_name: blunder.team_name.clone(),
            manager_name: blunder.manager_name.clone(),
            points: blunder.live_bench_points,
            detail: None,
        },
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::team;
    use crate::model::CaptainSummary;

    fn captain(name: &str, points: i32, multiplier: i32) -> Option<CaptainSummary> {
        Some(CaptainSummary {
            name: name.to_string(),
            points,
            captained_points: points * multiplier,
        })
    }

    #[test]
    fn table_sorted_by_total_desc_and_stable() {
        let teams = vec![team(1, "A", 500), team(2, "B", 620), team(3, "C", 500)];
        let rows = league_table(&teams);
        let order: Vec<u64> = rows.iter().map(|r| r.team_id).collect();
        assert_eq!(order, vec![2, 1, 3]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[2].rank, 3);
    }

    #[test]
    fn table_carries_chip() {
        let mut t = team(1, "A", 500);
        t.active_chip = Some(Chip::BenchBoost);
        let rows = league_table(&[t]);
        assert_eq!(rows[0].chip.map(Chip::badge), Some("BB"));
    }

    #[test]
    fn highlights_none_for_empty_league() {
        assert!(gameweek_highlights(&[]).is_none());
    }

    #[test]
    fn highlights_pick_maxima_with_first_wins() {
        let mut a = team(1, "A", 0);
        a.live_gw_points = 70;
        a.live_bench_points = 4;
        a.live_captain = captain("Haaland", 8, 2);
        let mut b = team(2, "B", 0);
        b.live_gw_points = 70;
        b.live_bench_points = 11;
        b.live_captain = captain("Salah", 9, 3);
        let mut c = team(3, "C", 0);
        c.live_gw_points = 55;
        c.live_bench_points = 11;

        let h = gameweek_highlights(&[a, b, c]).unwrap();
        assert_eq!(h.top_scorer.team_name, "A");
        assert_eq!(h.top_scorer.points, 70);
        let cap = h.best_captain.unwrap();
        assert_eq!(cap.team_name, "B");
        assert_eq!(cap.points, 27);
        assert_eq!(cap.detail.as_deref(), Some("Salah"));
        assert_eq!(h.benching_blunder.team_name, "B");
        assert_eq!(h.benching_blunder.points, 11);
    }

    #[test]
    fn zero_bench_still_selects_a_team() {
        let h = gameweek_highlights(&[team(1, "A", 0), team(2, "B", 0)]).unwrap();
        assert_eq!(h.benching_blunder.team_name, "A");
        assert_eq!(h.benching_blunder.points, 0);
        assert!(h.best_captain.is_none());
    }
}
