// Extra-points breakdown: everything a player scored beyond appearance,
// goals and assists, derived from raw live match stats.

use crate::model::{LivePlayer, Position, Team, LAST_STARTER};

#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownItem {
    pub label: &'static str,
    pub points: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraPoints {
    pub total: i32,
    pub items: Vec<BreakdownItem>,
}

/// Clearances, blocks, interceptions and tackles a defender needs for the
/// defensive contribution bonus.
pub const DEFENDER_CONTRIBUTION_THRESHOLD: i32 = 10;
/// As above plus recoveries, for midfielders and forwards.
pub const ATTACKER_CONTRIBUTION_THRESHOLD: i32 = 12;
pub const DEFENSIVE_CONTRIBUTION_POINTS: i32 = 2;

/// Extra points scored by `player`; empty when there are no live stats.
pub fn extra_points(player: &LivePlayer) -> ExtraPoints {
    let Some(s) = &player.live_stats else {
        return ExtraPoints::default();
    };
    let pos = player.position;
    let mut items = Vec::new();
    let mut push = |label: &'static str, points: i32| {
        if points != 0 {
            items.push(BreakdownItem { label, points });
        }
    };

    push("Bonus", s.bonus);
    push("Saves", s.saves / 3);
    push("Pen Saved", s.penalties_saved * 5);

    if s.clean_sheets > 0 && s.minutes >= 60 {
        let cs = match pos {
            Position::Goalkeeper | Position::Defender => 4,
            Position::Midfielder => 1,
            Position::Forward => 0,
        };
        push("Clean Sheet", cs);
    }

    let cbit = s.clearances_blocks_interceptions + s.tackles;
    let earned_defensive = match pos {
        Position::Defender => cbit >= DEFENDER_CONTRIBUTION_THRESHOLD,
        Position::Midfielder | Position::Forward => {
            cbit + s.recoveries >= ATTACKER_CONTRIBUTION_THRESHOLD
        }
        Position::Goalkeeper => false,
    };
    if earned_defensive {
        push("Defensive", DEFENSIVE_CONTRIBUTION_POINTS);
    }

    if matches!(pos, Position::Goalkeeper | Position::Defender) {
        push("Conceded", -(s.goals_conceded / 2));
    }
    push("Yellow Card", -s.yellow_cards);
    push("Red Card", -3 * s.red_cards);
    push("Own Goal", -2 * s.own_goals);
    push("Pen Missed", -2 * s.penalties_missed);

    ExtraPoints {
        total: items.iter().map(|i| i.points).sum(),
        items,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownRow {
    pub player_name: String,
    pub position: Position,
    pub club: String,
    pub live_points: i32,
    pub is_captain: bool,
    pub extra: ExtraPoints,
    /// Draw a starters/bench separator below this row.
    pub last_starter: bool,
}

/// Breakdown rows for a squad, in squad order.
pub fn team_breakdown(team: &Team) -> Vec<BreakdownRow> {
    let mut players: Vec<&LivePlayer> = team.players.iter().collect();
    players.sort_by_key(|p| p.squad_position);
    players
        .into_iter()
        .map(|p| BreakdownRow {
            player_name: p.name.clone(),
            position: p.position,
            club: p.club.clone(),
            live_points: p.live_points,
            is_captain: p.is_captain,
            extra: extra_points(p),
            last_starter: p.squad_position == LAST_STARTER,
        })
        .collect()
}
