// Prompt templates for the narrative analyses.
//
// Every prompt ends with the JSON schema the answer must follow, and the
// shared system prompt tells the model to answer with that JSON only. The
// numbers the model needs (bench points, captaincy losses, totals) are
// computed locally and passed in, so the model spends its effort on
// judgement rather than arithmetic.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::model::{Club, Fixture, Team, LAST_STARTER};
use crate::views::luck::LuckInput;

// ---------------------------------------------------------------------------
// System prompt
// ---------------------------------------------------------------------------

/// Return the static system prompt shared by all analyses.
pub fn system_prompt() -> String {
    "You are an expert Fantasy Premier League analyst advising a private mini-league.\n\
     \n\
     Base your reasoning on current Premier League form, fixture difficulty, injuries \
     and underlying stats. Be specific and name players.\n\
     \n\
     Reply with a single JSON value that matches the schema given at the end of the \
     request. Do not add commentary before or after the JSON and do not wrap it in a \
     code fence."
        .to_string()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn schema_block(prompt: &mut String, schema: &str) {
    prompt.push_str("\n## RESPONSE SCHEMA\n");
    prompt.push_str(schema.trim());
    prompt.push('\n');
}

/// "- Name (POS from Club)" lines for a team's starting eleven.
pub fn format_starters(team: &Team) -> String {
    team.starters()
        .map(|p| format!("- {} ({} from {})", p.name, p.position, p.club))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The same line format over all fifteen squad players.
fn format_all_players(team: &Team) -> String {
    let mut players: Vec<_> = team.players.iter().collect();
    players.sort_by_key(|p| p.squad_position);
    players
        .iter()
        .map(|p| format!("- {} ({} from {})", p.name, p.position, p.club))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_squad(team: &Team) -> String {
    let mut out = String::new();
    let mut players: Vec<_> = team.players.iter().collect();
    players.sort_by_key(|p| p.squad_position);
    for p in players {
        let role = if p.is_captain {
            " [C]"
        } else if p.is_vice_captain {
            " [VC]"
        } else {
            ""
        };
        let _ = writeln!(out, "- {} ({} from {}){}", p.name, p.position, p.club, role);
        if p.squad_position == LAST_STARTER {
            out.push_str("  -- bench --\n");
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Team strength
// ---------------------------------------------------------------------------

const TEAM_STRENGTH_SCHEMA: &str = r#"
{
  "score": number,          // 0-100 overall strength
  "justification": string   // 2-3 sentences, name one strength and one weakness
}"#;

pub fn build_team_strength_prompt(team: &Team) -> String {
    let mut prompt = String::with_capacity(1024);
    let _ = write!(
        prompt,
        "## TEAM\n{} (managed by {})\n\n## STARTING XI\n{}\n\n## TASK\n\
         Rate this starting eleven for the rest of the season. Weigh each player's \
         recent form, their club's performance, the next three or four fixtures and \
         the balance of the side. Give an overall score from 0 to 100 and a short \
         justification that names one key strength and one key weakness.\n",
        team.team_name,
        team.manager_name,
        format_starters(team),
    );
    schema_block(&mut prompt, TEAM_STRENGTH_SCHEMA);
    prompt
}

// ---------------------------------------------------------------------------
// Key matches
// ---------------------------------------------------------------------------

const KEY_MATCHES_SCHEMA: &str = r#"
{
  "key_matches": [
    { "match": string, "justification": string }   // exactly 3, "Home vs Away" as given
  ]
}"#;

pub fn build_key_matches_prompt(fixture_names: &[String], gameweek: u32) -> String {
    let mut prompt = String::with_capacity(1024);
    let _ = writeln!(prompt, "## GAMEWEEK {gameweek} FIXTURES");
    for name in fixture_names {
        let _ = writeln!(prompt, "- {name}");
    }
    prompt.push_str(
        "\n## TASK\nPick the three fixtures that matter most for fantasy managers this \
         gameweek: big attacking returns, clean sheet swings or heavily owned players. \
         Give one sentence per pick explaining why.\n",
    );
    schema_block(&mut prompt, KEY_MATCHES_SCHEMA);
    prompt
}

// ---------------------------------------------------------------------------
// Predicted final standings
// ---------------------------------------------------------------------------

const PREDICTIONS_SCHEMA: &str = r#"
{
  "predicted_standings": [
    { "rank": number, "team_name": string, "justification": string }   // one per team, ranks 1..N
  ]
}"#;

/// Teams are listed by current total, highest first.
pub fn build_predictions_prompt(teams: &[Team], gameweek: u32) -> String {
    let mut sorted: Vec<&Team> = teams.iter().collect();
    sorted.sort_by(|a, b| b.total_points().cmp(&a.total_points()));

    let summaries: Vec<String> = sorted
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "Team: {} ({})\nCurrent Rank: {}\nCurrent Points: {}\nSquad Players:\n{}",
                t.team_name,
                t.manager_name,
                i + 1,
                t.total_points(),
                format_all_players(t),
            )
        })
        .collect();

    let mut prompt = String::with_capacity(4096);
    let _ = write!(
        prompt,
        "## LEAGUE AFTER GAMEWEEK {gameweek}\n{}\n\n## TASK\n\
         Predict the final league table at the end of the season. Consider the \
         current gap in points, squad quality and how each squad is set up for the \
         remaining fixtures. Give every team a rank and one sentence of justification, \
         ordered from rank 1 downwards.\n",
        summaries.join("\n---\n"),
    );
    schema_block(&mut prompt, PREDICTIONS_SCHEMA);
    prompt
}

// ---------------------------------------------------------------------------
// League luck
// ---------------------------------------------------------------------------

const LUCK_SCHEMA: &str = r#"
{
  "luck_analysis": [
    { "team_name": string, "luck_score": number, "justification": string }   // 0-100, luckiest first
  ]
}"#;

pub fn build_luck_prompt(inputs: &[LuckInput], gameweek: u32) -> String {
    let mut prompt = String::with_capacity(2048);
    let _ = writeln!(prompt, "## GAMEWEEK {gameweek} LUCK FACTORS");
    for input in inputs {
        let _ = writeln!(
            prompt,
            "Team: {} ({})\n  Points left on bench: {}\n  Captain: {} ({} pts)\n  \
             Best scorer: {}\n  Captaincy points lost: {}",
            input.team_name,
            input.manager_name,
            input.bench_points,
            input.captain_name.as_deref().unwrap_or("none"),
            input.captain_points,
            input.best_scorer_name.as_deref().unwrap_or("none"),
            input.captaincy_points_lost,
        );
    }
    prompt.push_str(
        "\n## TASK\nScore how lucky each manager was this gameweek from 0 (very unlucky) \
         to 100 (very lucky), based on the points left on the bench and the points lost \
         by not captaining the best scorer. Give one sentence per team and order the \
         list from luckiest to unluckiest.\n",
    );
    schema_block(&mut prompt, LUCK_SCHEMA);
    prompt
}

// ---------------------------------------------------------------------------
// Head to head
// ---------------------------------------------------------------------------

const PVP_SCHEMA: &str = r#"
{
  "predicted_winner": string,        // must equal team1_name or team2_name
  "team1_name": string,
  "team2_name": string,
  "team1_predicted_score": number,   // next gameweek points
  "team2_predicted_score": number,
  "justification": string            // 2-3 sentences
}"#;

fn format_pvp_side(label: &str, team: &Team) -> String {
    let chip = team
        .active_chip
        .map(|c| c.label().to_string())
        .unwrap_or_else(|| "none".to_string());
    format!(
        "## {label}: {} ({})\nSeason total: {} | Live gameweek points: {} | Active chip: {}\n\
         Captain: {} | Vice: {}\n{}",
        team.team_name,
        team.manager_name,
        team.total_points(),
        team.live_gw_points,
        chip,
        team.captain().map(|p| p.name.as_str()).unwrap_or("none"),
        team.vice_captain().map(|p| p.name.as_str()).unwrap_or("none"),
        format_squad(team),
    )
}

/// Next-gameweek fixtures involving a club that either side starts a player
/// from, with FPL difficulty ratings.
fn pvp_fixture_lines(team1: &Team, team2: &Team, fixtures: &[Fixture], clubs: &[Club]) -> Vec<String> {
    let starter_clubs: HashSet<&str> = team1
        .starters()
        .chain(team2.starters())
        .map(|p| p.club.as_str())
        .collect();
    let name = |id: u32| clubs.iter().find(|c| c.id == id).map(|c| c.name.as_str());

    fixtures
        .iter()
        .filter_map(|f| {
            let home = name(f.team_h);
            let away = name(f.team_a);
            let involved = [home, away]
                .iter()
                .flatten()
                .any(|club| starter_clubs.contains(club));
            involved.then(|| {
                format!(
                    "{} vs {} (H diff {}, A diff {})",
                    home.unwrap_or("..."),
                    away.unwrap_or("..."),
                    f.team_h_difficulty,
                    f.team_a_difficulty
                )
            })
        })
        .collect()
}

/// `next_fixtures` are the fixtures of `next_gameweek`; only those touching
/// a starter's club make it into the prompt.
pub fn build_pvp_prompt(
    team1: &Team,
    team2: &Team,
    next_fixtures: &[Fixture],
    clubs: &[Club],
    next_gameweek: Option<u32>,
) -> String {
    let mut prompt = String::with_capacity(3072);
    prompt.push_str(&format_pvp_side("TEAM 1", team1));
    prompt.push('\n');
    prompt.push_str(&format_pvp_side("TEAM 2", team2));

    let lines = pvp_fixture_lines(team1, team2, next_fixtures, clubs);
    match next_gameweek {
        Some(gw) if !lines.is_empty() => {
            let _ = writeln!(
                prompt,
                "\n## GAMEWEEK {gw} FIXTURES FOR THESE STARTERS (difficulty 1 easy to 5 hard)"
            );
            for line in &lines {
                let _ = writeln!(prompt, "- {line}");
            }
        }
        _ => prompt.push_str("\n## FIXTURES\nNo upcoming fixture list is available.\n"),
    }

    prompt.push_str(
        "\n## TASK\nPredict the head-to-head result between these two squads for the next \
         gameweek. Compare starting elevens, captaincy and chips, and use the fixtures to \
         judge who has the easier run. Predict both scores and name a winner.\n",
    );
    schema_block(&mut prompt, PVP_SCHEMA);
    prompt
}

// ---------------------------------------------------------------------------
// Scout
// ---------------------------------------------------------------------------

const SCOUT_SCHEMA: &str = r#"
{
  "strategies": [
    {
      "source_name": string,          // expert, site or podcast
      "key_takeaways": [string],      // 2-4 short bullet points
      "strategy_summary": string      // how it applies to this squad
    }
  ],
  "sources": [ { "uri": string, "title": string } ]
}"#;

pub fn build_scout_prompt(team: &Team, web_search: bool) -> String {
    let mut prompt = String::with_capacity(2048);
    let _ = write!(
        prompt,
        "## SQUAD: {} ({})\n{}\n## TASK\n",
        team.team_name,
        team.manager_name,
        format_squad(team),
    );
    if web_search {
        prompt.push_str(
            "Search for this week's strategy articles from well known FPL experts \
             (sites, columnists and podcasts). ",
        );
    } else {
        prompt.push_str("Drawing on what well known FPL experts generally advise, ");
    }
    prompt.push_str(
        "Summarise up to three distinct strategies and tailor each to this squad: who \
         to keep, who to sell and which chips to consider. Return an empty strategies \
         list if nothing relevant is found.\n",
    );
    schema_block(&mut prompt, SCOUT_SCHEMA);
    prompt
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{player, team};
    use crate::model::{Chip, Position};
    use crate::views::luck::luck_inputs;

    fn squad(id: u64, name: &str, total: i32) -> Team {
        let mut t = team(id, name, total);
        t.players = (1..=15)
            .map(|i| {
                let mut p = player(i as u32, &format!("Player {i}"), Position::Midfielder, i);
                p.is_captain = i == 3;
                p.is_vice_captain = i == 4;
                p
            })
            .collect();
        t
    }

    #[test]
    fn system_prompt_requires_json() {
        let s = system_prompt();
        assert!(s.contains("single JSON value"));
    }

    #[test]
    fn strength_prompt_lists_starting_eleven_only() {
        let prompt = build_team_strength_prompt(&squad(1, "Gunners", 500));
        assert!(prompt.contains("- Player 1 (MID from Arsenal)"));
        assert!(prompt.contains("- Player 11 (MID from Arsenal)"));
        assert!(!prompt.contains("Player 12"));
        assert!(prompt.contains("\"score\""));
        assert!(prompt.contains("0 to 100"));
    }

    #[test]
    fn key_matches_prompt_lists_fixtures() {
        let prompt = build_key_matches_prompt(
            &["Arsenal vs Chelsea".to_string(), "Spurs vs ...".to_string()],
            12,
        );
        assert!(prompt.contains("## GAMEWEEK 12 FIXTURES"));
        assert!(prompt.contains("- Arsenal vs Chelsea"));
        assert!(prompt.contains("- Spurs vs ..."));
        assert!(prompt.contains("\"key_matches\""));
    }

    #[test]
    fn predictions_prompt_orders_by_total_and_separates_teams() {
        let prompt = build_predictions_prompt(&[squad(1, "Low", 400), squad(2, "High", 600)], 20);
        let high = prompt.find("Team: High").unwrap();
        let low = prompt.find("Team: Low").unwrap();
        assert!(high < low);
        assert!(prompt.contains("Current Rank: 1\nCurrent Points: 600"));
        assert_eq!(prompt.matches("\n---\n").count(), 1);
    }

    #[test]
    fn predictions_prompt_lists_whole_squad() {
        let prompt = build_predictions_prompt(&[squad(1, "Gunners", 400)], 20);
        assert!(prompt.contains("- Player 1 (MID from Arsenal)"));
        assert!(prompt.contains("- Player 15 (MID from Arsenal)"));
    }

    #[test]
    fn luck_prompt_includes_computed_losses() {
        let mut t = squad(1, "Gunners", 500);
        t.players[2].live_points = 2;
        t.players[2].multiplier = 2;
        t.players[5].live_points = 10;
        t.live_bench_points = 7;
        let prompt = build_luck_prompt(&luck_inputs(&[t]), 9);
        assert!(prompt.contains("Points left on bench: 7"));
        assert!(prompt.contains("Captain: Player 3 (4 pts)"));
        assert!(prompt.contains("Captaincy points lost: 16"));
    }

    fn club(id: u32, name: &str) -> Club {
        Club {
            id,
            name: name.to_string(),
            short_name: name[..3].to_uppercase(),
        }
    }

    fn fixture(id: u32, home: u32, away: u32, h_diff: u8, a_diff: u8) -> Fixture {
        Fixture {
            id,
            event: Some(13),
            kickoff_time: None,
            team_h: home,
            team_a: away,
            team_h_score: None,
            team_a_score: None,
            team_h_difficulty: h_diff,
            team_a_difficulty: a_diff,
            finished: false,
        }
    }

    #[test]
    fn pvp_prompt_has_both_sides_and_fixtures() {
        let mut a = squad(1, "Gunners", 500);
        a.active_chip = Some(Chip::TripleCaptain);
        let b = squad(2, "Reds", 480);
        let clubs = [club(1, "Arsenal"), club(2, "Chelsea"), club(3, "Everton"), club(4, "Fulham")];
        let fixtures = [fixture(1, 1, 2, 4, 3), fixture(2, 3, 4, 2, 2)];
        let prompt = build_pvp_prompt(&a, &b, &fixtures, &clubs, Some(13));
        assert!(prompt.contains("## TEAM 1: Gunners"));
        assert!(prompt.contains("## TEAM 2: Reds"));
        assert!(prompt.contains("Active chip: Triple Captain"));
        assert!(prompt.contains("Captain: Player 3 | Vice: Player 4"));
        assert!(prompt.contains("difficulty"));
        assert!(prompt.contains("- Arsenal vs Chelsea (H diff 4, A diff 3)"));
        assert!(!prompt.contains("Everton vs Fulham"), "no starter plays for either club");
        assert!(prompt.contains("-- bench --"));
    }

    #[test]
    fn pvp_prompt_without_fixtures() {
        let prompt = build_pvp_prompt(&squad(1, "A", 1), &squad(2, "B", 1), &[], &[], None);
        assert!(prompt.contains("No upcoming fixture list is available."));
    }

    #[test]
    fn pvp_prompt_without_relevant_fixtures() {
        let clubs = [club(3, "Everton"), club(4, "Fulham")];
        let prompt = build_pvp_prompt(
            &squad(1, "A", 1),
            &squad(2, "B", 1),
            &[fixture(2, 3, 4, 2, 2)],
            &clubs,
            Some(13),
        );
        assert!(prompt.contains("No upcoming fixture list is available."));
        assert!(!prompt.contains("Everton"));
    }

    #[test]
    fn scout_prompt_mentions_search_only_when_enabled() {
        let t = squad(1, "Gunners", 500);
        assert!(build_scout_prompt(&t, true).contains("Search for this week's"));
        assert!(!build_scout_prompt(&t, false).contains("Search for"));
        assert!(build_scout_prompt(&t, false).contains("\"strategies\""));
    }
}
