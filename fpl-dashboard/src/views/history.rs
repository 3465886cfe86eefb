// Cumulative points series for the performance chart.

use crate::model::Team;

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub team_name: String,
    /// `(gameweek, total_points)`, oldest first.
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceChart {
    pub series: Vec<Series>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

/// One series per team. Returns `None` when no team has any history.
pub fn performance_series(teams: &[Team]) -> Option<PerformanceChart> {
    let series: Vec<Series> = teams
        .iter()
        .filter(|t| !t.gameweek_history.is_empty())
        .map(|t| {
            let mut points: Vec<(f64, f64)> = t
                .gameweek_history
                .iter()
                .map(|h| (f64::from(h.gameweek), f64::from(h.total_points)))
                .collect();
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            Series {
                team_name: t.team_name.clone(),
                points,
            }
        })
        .collect();

    let all = || series.iter().flat_map(|s| s.points.iter());
    let (min_x, max_x) = all().fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.0), hi.max(p.0)));
    let (min_y, max_y) = all().fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
    if min_x > max_x {
        return None;
    }

    // Pad so a single gameweek still draws a visible area.
    let x_bounds = if min_x == max_x { [min_x - 1.0, max_x + 1.0] } else { [min_x, max_x] };
    let pad = ((max_y - min_y) * 0.05).max(5.0);
    Some(PerformanceChart {
        series,
        x_bounds,
        y_bounds: [(min_y - pad).max(0.0), max_y + pad],
    })
}

/// Axis label for a gameweek tick.
pub fn gameweek_label(gameweek: f64) -> String {
    format!("GW{}", gameweek.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::team;
    use crate::model::GameweekHistory;

    fn history(entries: &[(u32, i32)]) -> Vec<GameweekHistory> {
        entries
            .iter()
            .map(|(gw, total)| GameweekHistory {
                gameweek: *gw,
                points: 0,
                total_points: *total,
                transfer_cost: 0,
            })
            .collect()
    }

    #[test]
    fn series_and_bounds() {
        let mut a = team(1, "A", 0);
        a.gameweek_history = history(&[(1, 60), (2, 110), (3, 170)]);
        let mut b = team(2, "B", 0);
        b.gameweek_history = history(&[(1, 45), (2, 120), (3, 160)]);

        let chart = performance_series(&[a, b]).unwrap();
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].points, vec![(1.0, 60.0), (2.0, 110.0), (3.0, 170.0)]);
        assert_eq!(chart.x_bounds, [1.0, 3.0]);
        assert!(chart.y_bounds[0] <= 45.0 && chart.y_bounds[0] >= 0.0);
        assert!(chart.y_bounds[1] >= 170.0);
    }

    #[test]
    fn single_gameweek_is_padded() {
        let chart = performance_series(&[team(1, "A", 500)]).unwrap();
        assert_eq!(chart.x_bounds, [9.0, 11.0]);
    }

    #[test]
    fn none_without_history() {
        let mut a = team(1, "A", 0);
        a.gameweek_history.clear();
        assert!(performance_series(&[a]).is_none());
        assert!(performance_series(&[]).is_none());
    }

    #[test]
    fn labels() {
        assert_eq!(gameweek_label(7.0), "GW7");
    }
}
