//! Standings: per-team totals over finished matches and the ranking order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{Championship, Format, Match, TeamId, TeamRef};

/// Key of the single league table.
pub const LEAGUE_TABLE: &str = "Geral";

/// Table label → ranked rows.
pub type Standings = BTreeMap<String, Vec<TeamStanding>>;

/// One row of a standings table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub team_id: TeamId,
    pub name: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
    pub points: u32,
}

impl TeamStanding {
    fn new(team: &TeamRef) -> Self {
        Self {
            team_id: team.id,
            name: team.name.clone(),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
        }
    }

    fn add_result(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        self.goal_difference = i64::from(self.goals_for) - i64::from(self.goals_against);
        match scored.cmp(&conceded) {
            Ordering::Greater => {
                self.wins += 1;
                self.points += 3;
            }
            Ordering::Equal => {
                self.draws += 1;
                self.points += 1;
            }
            Ordering::Less => self.losses += 1,
        }
    }
}

/// Points, goal difference, goals for (all descending), then name, then id.
fn compare_ranked(a: &TeamStanding, b: &TeamStanding) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference.cmp(&a.goal_difference))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

fn compare_alphabetical(a: &TeamStanding, b: &TeamStanding) -> Ordering {
    a.name.cmp(&b.name).then_with(|| a.team_id.cmp(&b.team_id))
}

/// Rank `teams` over `matches`.
///
/// Only finished matches between two teams of `teams` count; anything else is
/// skipped. When nobody has played yet the table is alphabetical.
pub fn compute_table<'a, I>(teams: &[TeamRef], matches: I) -> Vec<TeamStanding>
where
    I: IntoIterator<Item = &'a Match>,
{
    let mut rows: Vec<TeamStanding> = teams.iter().map(TeamStanding::new).collect();
    let index: HashMap<TeamId, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (row.team_id, i))
        .collect();

    for game in matches {
        let Some((home_goals, away_goals)) = game.score() else {
            continue;
        };
        let (Some(&home), Some(&away)) =
            (index.get(&game.home_team.id), index.get(&game.away_team.id))
        else {
            continue;
        };
        rows[home].add_result(home_goals, away_goals);
        rows[away].add_result(away_goals, home_goals);
    }

    if rows.iter().all(|row| row.played == 0) {
        rows.sort_by(compare_alphabetical);
    } else {
        rows.sort_by(compare_ranked);
    }
    rows
}

/// All tables of a championship: `"Geral"` for a league, one per group label otherwise.
///
/// Group tables only see non-knockout matches, so bracket games between two former
/// group mates never change the group ranking.
pub fn compute_standings(championship: &Championship, matches: &[Match]) -> Standings {
    let mut standings = Standings::new();
    match championship.format {
        Format::League => {
            standings.insert(
                LEAGUE_TABLE.to_string(),
                compute_table(&championship.teams, matches),
            );
        }
        Format::GroupKnockout => {
            for label in championship.groups.keys() {
                let teams = championship.group_teams(label);
                let group_matches = matches.iter().filter(|m| m.round.knockout_stage().is_none());
                standings.insert(label.clone(), compute_table(&teams, group_matches));
            }
        }
    }
    standings
}
