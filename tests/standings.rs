//! Integration tests for standings: totals, ordering and group restriction.

use std::collections::BTreeMap;

use championship_manager::{
    compute_standings, compute_table, Championship, ChampionshipStatus, Format, KnockoutStage,
    Match, MatchType, Round, TeamRef,
};
use pretty_assertions::assert_eq;
use uuid::Uuid;

fn team(name: &str) -> TeamRef {
    TeamRef {
        id: Uuid::new_v4(),
        name: name.to_string(),
    }
}

fn scheduled(home: &TeamRef, away: &TeamRef, round: Round) -> Match {
    Match::new(home.clone(), away.clone(), round).unwrap()
}

fn played(home: &TeamRef, away: &TeamRef, round: Round, home_goals: u32, away_goals: u32) -> Match {
    let mut m = scheduled(home, away, round);
    m.record_score(home_goals, away_goals);
    m
}

fn league(teams: &[TeamRef]) -> Championship {
    Championship {
        id: Uuid::new_v4(),
        name: "Liga".to_string(),
        sport: "Futebol".to_string(),
        format: Format::League,
        match_type: MatchType::OneLeg,
        teams: teams.to_vec(),
        groups: BTreeMap::new(),
        num_groups: 0,
        status: ChampionshipStatus::Active,
        champion_id: None,
        champion_name: None,
    }
}

fn names(table: &[championship_manager::TeamStanding]) -> Vec<&str> {
    table.iter().map(|row| row.name.as_str()).collect()
}

#[test]
fn league_table_counts_only_finished_matches() {
    let (a, b, c) = (team("A"), team("B"), team("C"));
    let championship = league(&[a.clone(), b.clone(), c.clone()]);
    let matches = vec![
        played(&a, &b, Round::League, 2, 1),
        scheduled(&a, &c, Round::League),
        scheduled(&b, &c, Round::League),
    ];

    let standings = compute_standings(&championship, &matches);
    assert_eq!(standings.keys().collect::<Vec<_>>(), vec!["Geral"]);
    let table = &standings["Geral"];

    let row_a = &table[0];
    assert_eq!(row_a.name, "A");
    assert_eq!((row_a.played, row_a.wins, row_a.points, row_a.goal_difference), (1, 1, 3, 1));

    let row_b = table.iter().find(|r| r.name == "B").unwrap();
    assert_eq!((row_b.played, row_b.losses, row_b.points, row_b.goal_difference), (1, 1, 0, -1));

    let row_c = table.iter().find(|r| r.name == "C").unwrap();
    assert_eq!((row_c.played, row_c.points, row_c.goal_difference), (0, 0, 0));

    // C has not played, so its zero goal difference beats B's -1.
    assert_eq!(names(table), vec!["A", "C", "B"]);
}

#[test]
fn nobody_played_sorts_alphabetically() {
    let teams = [team("Vasco"), team("Bahia"), team("Santos")];
    let matches = vec![scheduled(&teams[0], &teams[1], Round::League)];
    let table = compute_table(&teams, &matches);
    assert_eq!(names(&table), vec!["Bahia", "Santos", "Vasco"]);
}

#[test]
fn ranking_uses_points_then_goal_difference_then_goals_for() {
    let (a, b, c, d) = (team("A"), team("B"), team("C"), team("D"));
    let teams = [a.clone(), b.clone(), c.clone(), d.clone()];
    let matches = vec![
        // D: win 1-0 (3 pts, GD +1, GF 1)
        played(&d, &a, Round::League, 1, 0),
        // C: win 3-0 (3 pts, GD +3, GF 3)
        played(&c, &b, Round::League, 3, 0),
        // B: win 4-1 (3 pts, GD 4-3-1 = 0 overall)
        played(&b, &a, Round::League, 4, 1),
    ];
    let table = compute_table(&teams, &matches);
    // C: 3 pts GD +3; D: 3 pts GD +1; B: 3 pts GD 0; A: 0 pts
    assert_eq!(names(&table), vec!["C", "D", "B", "A"]);

    let (e, f, g) = (team("E"), team("F"), team("G"));
    let teams = [e.clone(), f.clone(), g.clone()];
    let matches = vec![
        played(&e, &g, Round::League, 3, 2),
        played(&f, &g, Round::League, 1, 0),
    ];
    // Same points and goal difference: more goals scored wins.
    assert_eq!(names(&compute_table(&teams, &matches)), vec!["E", "F", "G"]);
}

#[test]
fn full_tie_is_broken_by_name() {
    let (zeta, alfa, x) = (team("Zeta"), team("Alfa"), team("X"));
    let teams = [zeta.clone(), alfa.clone(), x.clone()];
    let matches = vec![
        played(&zeta, &x, Round::League, 2, 0),
        played(&alfa, &x, Round::League, 2, 0),
    ];
    assert_eq!(names(&compute_table(&teams, &matches)), vec!["Alfa", "Zeta", "X"]);
}

#[test]
fn points_sum_matches_results() {
    let teams: Vec<TeamRef> = ["A", "B", "C", "D"].iter().map(|n| team(n)).collect();
    let matches = vec![
        played(&teams[0], &teams[1], Round::League, 1, 1),
        played(&teams[2], &teams[3], Round::League, 0, 2),
        played(&teams[0], &teams[2], Round::League, 3, 0),
        played(&teams[1], &teams[3], Round::League, 2, 2),
        scheduled(&teams[0], &teams[3], Round::League),
    ];
    let decisive = 2;
    let drawn = 2;
    let table = compute_table(&teams, &matches);
    let total: u32 = table.iter().map(|r| r.points).sum();
    assert_eq!(total, 3 * decisive + 2 * drawn);
    let played_total: u32 = table.iter().map(|r| r.played).sum();
    assert_eq!(played_total, 2 * 4);
}

#[test]
fn group_tables_ignore_outside_and_knockout_matches() {
    let (a1, a2, b1, b2) = (team("A1"), team("A2"), team("B1"), team("B2"));
    let mut groups = BTreeMap::new();
    groups.insert("A".to_string(), vec![a1.id, a2.id]);
    groups.insert("B".to_string(), vec![b1.id, b2.id]);
    let championship = Championship {
        format: Format::GroupKnockout,
        groups,
        num_groups: 2,
        status: ChampionshipStatus::Knockout,
        ..league(&[a1.clone(), a2.clone(), b1.clone(), b2.clone()])
    };
    let matches = vec![
        played(&a1, &a2, Round::Group("A".into()), 2, 0),
        played(&b2, &b1, Round::Group("B".into()), 1, 0),
        // Cross-group match: ignored by both tables.
        played(&a2, &b1, Round::Group("A".into()), 5, 0),
        // Final between two group A teams: not a group match.
        played(&a2, &a1, Round::Knockout(KnockoutStage::Final), 3, 0),
    ];

    let standings = compute_standings(&championship, &matches);
    assert_eq!(names(&standings["A"]), vec!["A1", "A2"]);
    assert_eq!(names(&standings["B"]), vec!["B2", "B1"]);
    assert!(standings.values().flatten().all(|row| row.played == 1));
}

#[test]
fn compute_standings_is_repeatable() {
    let teams: Vec<TeamRef> = ["A", "B", "C"].iter().map(|n| team(n)).collect();
    let championship = league(&teams);
    let matches = vec![
        played(&teams[0], &teams[1], Round::League, 0, 0),
        played(&teams[1], &teams[2], Round::League, 1, 2),
    ];
    assert_eq!(
        compute_standings(&championship, &matches),
        compute_standings(&championship, &matches)
    );
}

#[test]
fn empty_team_set_gives_empty_table() {
    let (a, b) = (team("A"), team("B"));
    let matches = vec![played(&a, &b, Round::League, 1, 0)];
    assert!(compute_table(&[], &matches).is_empty());
}
