//! End-to-end tests through the service and the in-memory store.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};

use championship_manager::{
    Advancement, BracketError, ChampionshipDraft, ChampionshipService, ChampionshipStatus, Format,
    KnockoutStage, MatchDraft, MatchStatus, MatchType, MemoryStore, Pairing, Round, ServiceError,
    Team, ValidationError,
};
use uuid::Uuid;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn service_with_teams(names: &[&str]) -> (ChampionshipService<MemoryStore>, Vec<Team>) {
    let service = ChampionshipService::new(MemoryStore::new());
    let teams = names.iter().map(|n| service.create_team(n).unwrap()).collect();
    (service, teams)
}

/// Group draft where consecutive pairs of `teams` form groups A, B, …
fn paired_groups(name: &str, teams: &[Team]) -> ChampionshipDraft {
    let mut groups = BTreeMap::new();
    for (i, pair) in teams.chunks(2).enumerate() {
        let label = char::from(b'A' + i as u8).to_string();
        groups.insert(label, pair.iter().map(|t| t.id).collect());
    }
    let mut d = draft(name, Format::GroupKnockout, teams);
    d.num_groups = groups.len();
    d.groups = Some(groups);
    d
}

fn draft(name: &str, format: Format, teams: &[Team]) -> ChampionshipDraft {
    ChampionshipDraft {
        name: name.to_string(),
        sport: "Futebol".to_string(),
        format,
        match_type: MatchType::OneLeg,
        team_ids: teams.iter().map(|t| t.id).collect(),
        num_groups: 0,
        groups: None,
    }
}

#[test]
fn championship_validation_errors() {
    let (service, teams) = service_with_teams(&["A", "B", "C"]);
    let mut rng = StdRng::seed_from_u64(0);

    let blank = draft("   ", Format::League, &teams);
    assert!(matches!(
        service.create_championship(&blank, &mut rng),
        Err(ServiceError::Validation(ValidationError::EmptyChampionshipName))
    ));

    let lonely = draft("Liga", Format::League, &teams[..1]);
    assert!(matches!(
        service.create_championship(&lonely, &mut rng),
        Err(ServiceError::Validation(ValidationError::NotEnoughTeams { selected: 1 }))
    ));

    let mut too_many_groups = draft("Copa", Format::GroupKnockout, &teams);
    too_many_groups.num_groups = 4;
    assert!(matches!(
        service.create_championship(&too_many_groups, &mut rng),
        Err(ServiceError::Validation(ValidationError::NotEnoughTeamsForGroups { teams: 3, groups: 4 }))
    ));

    assert!(service.championships().unwrap().is_empty());
}

#[test]
fn manual_match_needs_two_different_teams() {
    let (service, teams) = service_with_teams(&["A", "B"]);
    let mut rng = StdRng::seed_from_u64(0);
    let c = service
        .create_championship(&draft("Liga", Format::League, &teams), &mut rng)
        .unwrap();

    let same = MatchDraft {
        home_team_id: teams[0].id,
        away_team_id: teams[0].id,
        round: Round::League,
        match_time: None,
        venue_id: None,
    };
    assert!(matches!(
        service.create_match(c.id, &same),
        Err(ServiceError::Bracket(BracketError::Invalid(ValidationError::SameTeam)))
    ));

    let venue = service.create_venue("Maracanã").unwrap();
    let ok = MatchDraft {
        away_team_id: teams[1].id,
        venue_id: Some(venue.id),
        ..same
    };
    let game = service.create_match(c.id, &ok).unwrap();
    assert_eq!(game.venue_name.as_deref(), Some("Maracanã"));
    assert_eq!(service.matches(c.id).unwrap().len(), 1);
}

#[test]
fn renames_do_not_touch_stored_snapshots() {
    let (service, teams) = service_with_teams(&["Flamengo", "Vasco"]);
    let mut rng = StdRng::seed_from_u64(0);
    let c = service
        .create_championship(&draft("Carioca", Format::League, &teams), &mut rng)
        .unwrap();
    service.generate_fixtures(c.id).unwrap();

    service.rename_team(teams[0].id, "Mengão").unwrap();

    let stored = service.championship(c.id).unwrap();
    assert!(stored.teams.iter().any(|t| t.name == "Flamengo"));
    let game = &service.matches(c.id).unwrap()[0];
    assert_eq!(game.home_team.name, "Flamengo");
    assert_eq!(service.teams().unwrap()[0].name, "Mengão");
}

#[test]
fn league_runs_to_a_declared_champion() {
    let (service, teams) = service_with_teams(&["A", "B", "C"]);
    let mut rng = StdRng::seed_from_u64(0);
    let mut d = draft("Liga", Format::League, &teams);
    d.match_type = MatchType::TwoLegs;
    let c = service.create_championship(&d, &mut rng).unwrap();
    assert_eq!(c.status, ChampionshipStatus::Active);

    let matches = service.generate_fixtures(c.id).unwrap();
    assert_eq!(matches.len(), 6);
    // Regenerating replaces the set instead of adding to it.
    assert_eq!(service.generate_fixtures(c.id).unwrap().len(), 6);

    let matches = service.matches(c.id).unwrap();
    for m in &matches {
        let home_goals = if m.home_team.id == teams[0].id { 2 } else { 1 };
        service.record_score(c.id, m.id, home_goals, 1).unwrap();
    }
    let standings = service.standings(c.id).unwrap();
    assert_eq!(standings["Geral"][0].name, "A");

    let finished = service.declare_champion(c.id, teams[0].id).unwrap();
    assert_eq!(finished.status, ChampionshipStatus::Finished);
    assert_eq!(finished.champion_id, Some(teams[0].id));

    // Results are frozen once the champion is known.
    assert!(matches!(
        service.clear_score(c.id, matches[0].id),
        Err(ServiceError::Bracket(BracketError::ResultLocked(_)))
    ));
}

#[test]
fn group_knockout_runs_from_draw_to_champion() {
    let names = ["A1", "A2", "B1", "B2", "C1", "C2", "D1", "D2"];
    let (service, teams) = service_with_teams(&names);
    let mut rng = StdRng::seed_from_u64(11);

    let mut groups = BTreeMap::new();
    for (label, pair) in ["A", "B", "C", "D"].iter().zip(teams.chunks(2)) {
        groups.insert(label.to_string(), pair.iter().map(|t| t.id).collect());
    }
    let mut d = draft("Copa", Format::GroupKnockout, &teams);
    d.num_groups = 4;
    d.groups = Some(groups);
    let c = service.create_championship(&d, &mut rng).unwrap();
    assert_eq!(c.status, ChampionshipStatus::GroupStage);

    let fixtures = service.generate_fixtures(c.id).unwrap();
    assert_eq!(fixtures.len(), 4);
    assert!(matches!(
        service.generate_knockout(c.id, Pairing::Standard, &mut rng),
        Err(ServiceError::Bracket(BracketError::GroupStageNotFinished { .. }))
    ));

    // Team X1 always beats X2.
    for m in &fixtures {
        let home_is_first = m.home_team.name.ends_with('1');
        let (h, a) = if home_is_first { (1, 0) } else { (0, 1) };
        service.record_score(c.id, m.id, h, a).unwrap();
    }
    assert!(service.group_stage_progress(c.id).unwrap().is_finished());

    let quarters = service.generate_knockout(c.id, Pairing::Standard, &mut rng).unwrap();
    assert_eq!(quarters.len(), 4);
    assert!(quarters
        .iter()
        .all(|m| m.round == Round::Knockout(KnockoutStage::QuarterFinal)));
    assert_eq!(service.championship(c.id).unwrap().status, ChampionshipStatus::Knockout);

    // Already out of the group stage.
    assert!(matches!(
        service.generate_knockout(c.id, Pairing::Standard, &mut rng),
        Err(ServiceError::Bracket(BracketError::InvalidState(ChampionshipStatus::Knockout)))
    ));
    // Group results are locked now.
    assert!(matches!(
        service.clear_score(c.id, fixtures[0].id),
        Err(ServiceError::Bracket(BracketError::ResultLocked(_)))
    ));

    let mut champion = None;
    for _ in 0..3 {
        let bracket = service.bracket(c.id).unwrap();
        let current = bracket.last().unwrap();
        for m in &current.matches {
            service.record_score(c.id, m.id, 2, 1).unwrap();
        }
        match service.advance_knockout(c.id).unwrap() {
            Advancement::NextRound { .. } => {}
            Advancement::Champion { champion: team, .. } => champion = Some(team),
        }
    }

    let bracket = service.bracket(c.id).unwrap();
    assert_eq!(
        bracket.iter().map(|r| r.matches.len()).collect::<Vec<_>>(),
        vec![4, 2, 1]
    );
    let champion = champion.unwrap();
    // Home side won every round: A1 beats B2, B1 and C1.
    assert_eq!(champion.name, "A1");
    let stored = service.championship(c.id).unwrap();
    assert_eq!(stored.status, ChampionshipStatus::Finished);
    assert_eq!(stored.champion_name.as_deref(), Some("A1"));
}

#[test]
fn repeated_advancement_does_not_duplicate_rounds() {
    let (service, teams) = service_with_teams(&["A1", "A2", "B1", "B2"]);
    let mut rng = StdRng::seed_from_u64(5);
    let mut groups = BTreeMap::new();
    groups.insert("A".to_string(), vec![teams[0].id, teams[1].id]);
    groups.insert("B".to_string(), vec![teams[2].id, teams[3].id]);
    let mut d = draft("Copa", Format::GroupKnockout, &teams);
    d.num_groups = 2;
    d.groups = Some(groups);
    let c = service.create_championship(&d, &mut rng).unwrap();

    for m in service.generate_fixtures(c.id).unwrap() {
        service.record_score(c.id, m.id, 3, 0).unwrap();
    }
    for m in service.generate_knockout(c.id, Pairing::Random, &mut rng).unwrap() {
        service.record_score(c.id, m.id, 1, 0).unwrap();
    }

    assert!(matches!(
        service.advance_knockout(c.id).unwrap(),
        Advancement::NextRound {
            stage: KnockoutStage::Final,
            ..
        }
    ));
    assert!(matches!(
        service.advance_knockout(c.id),
        Err(ServiceError::Bracket(BracketError::RoundNotComplete(KnockoutStage::Final)))
    ));
    let finals = service
        .matches(c.id)
        .unwrap()
        .into_iter()
        .filter(|m| m.round == Round::Knockout(KnockoutStage::Final))
        .count();
    assert_eq!(finals, 1);
}

#[test]
fn clearing_a_score_returns_the_match_to_scheduled() {
    let (service, teams) = service_with_teams(&["A", "B"]);
    let mut rng = StdRng::seed_from_u64(0);
    let c = service
        .create_championship(&draft("Liga", Format::League, &teams), &mut rng)
        .unwrap();
    let m = service.generate_fixtures(c.id).unwrap().remove(0);

    let scored = service.record_score(c.id, m.id, 4, 4).unwrap();
    assert_eq!(scored.status, MatchStatus::Finished);
    let cleared = service.clear_score(c.id, m.id).unwrap();
    assert_eq!(cleared.status, MatchStatus::Scheduled);
    assert_eq!((cleared.home_score, cleared.away_score), (None, None));
    assert!(service.standings(c.id).unwrap()["Geral"]
        .iter()
        .all(|row| row.played == 0));
}

#[test]
fn deleting_a_championship_removes_its_matches_only() {
    let (service, teams) = service_with_teams(&["A", "B", "C"]);
    let mut rng = StdRng::seed_from_u64(0);
    let c = service
        .create_championship(&draft("Liga", Format::League, &teams), &mut rng)
        .unwrap();
    service.generate_fixtures(c.id).unwrap();

    service.delete_championship(c.id).unwrap();
    assert!(matches!(
        service.matches(c.id),
        Err(ServiceError::ChampionshipNotFound(_))
    ));
    assert_eq!(service.teams().unwrap().len(), 3);
}

#[test]
fn standings_export_as_csv() {
    let (service, teams) = service_with_teams(&["A", "B"]);
    let mut rng = StdRng::seed_from_u64(0);
    let c = service
        .create_championship(&draft("Liga", Format::League, &teams), &mut rng)
        .unwrap();
    let m = service.generate_fixtures(c.id).unwrap().remove(0);
    service.record_score(c.id, m.id, 1, 0).unwrap();

    let csv = service.standings_csv(c.id).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "group,position,team,played,wins,draws,losses,goals_for,goals_against,goal_difference,points"
    );
    assert_eq!(lines[1], "Geral,1,A,1,1,0,0,1,0,1,3");
    assert_eq!(lines[2], "Geral,2,B,1,0,0,1,0,1,-1,0");
}

#[test]
fn editing_keeps_the_format_and_the_status() {
    let (service, teams) = service_with_teams(&["A1", "A2", "B1", "B2"]);
    let mut rng = StdRng::seed_from_u64(2);
    let c = service.create_championship(&paired_groups("Copa", &teams), &mut rng).unwrap();
    let fixtures = service.generate_fixtures(c.id).unwrap();
    service.record_score(c.id, fixtures[0].id, 1, 0).unwrap();

    let as_league = draft("Copa", Format::League, &teams);
    assert!(matches!(
        service.edit_championship(c.id, &as_league, &mut rng),
        Err(ServiceError::Bracket(BracketError::Invalid(ValidationError::FormatChanged {
            from: Format::GroupKnockout,
            to: Format::League,
        })))
    ));
    let stored = service.championship(c.id).unwrap();
    assert_eq!(stored.format, Format::GroupKnockout);
    assert_eq!(stored.status, ChampionshipStatus::GroupStage);

    let mut renamed = paired_groups("Copa do Brasil", &teams);
    renamed.match_type = MatchType::TwoLegs;
    let edited = service.edit_championship(c.id, &renamed, &mut rng).unwrap();
    assert_eq!(edited.name, "Copa do Brasil");
    assert_eq!(edited.status, ChampionshipStatus::GroupStage);
    assert_eq!(service.championship(c.id).unwrap(), edited);
}

#[test]
fn editing_keeps_or_redraws_the_groups() {
    let names = ["T1", "T2", "T3", "T4", "T5", "T6"];
    let (service, teams) = service_with_teams(&names);
    let mut rng = StdRng::seed_from_u64(7);
    let mut d = draft("Copa", Format::GroupKnockout, &teams);
    d.num_groups = 2;
    let c = service.create_championship(&d, &mut rng).unwrap();

    // Same teams and group count: the draw survives a rename.
    d.name = "Copa Renomeada".to_string();
    let kept = service.edit_championship(c.id, &d, &mut rng).unwrap();
    assert_eq!(kept.groups, c.groups);

    // A different group count forces a new draw.
    d.num_groups = 3;
    let redrawn = service.edit_championship(c.id, &d, &mut rng).unwrap();
    assert_eq!(redrawn.groups.keys().cloned().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    assert!(redrawn.groups.values().all(|ids| ids.len() == 2));

    // Dropping a team also redraws, over the remaining five.
    d.team_ids.pop();
    let smaller = service.edit_championship(c.id, &d, &mut rng).unwrap();
    assert_eq!(smaller.teams.len(), 5);
    assert_eq!(smaller.groups.values().map(Vec::len).sum::<usize>(), 5);
}

#[test]
fn editing_is_refused_once_the_knockout_started() {
    let (service, teams) = service_with_teams(&["A1", "A2", "B1", "B2"]);
    let mut rng = StdRng::seed_from_u64(4);
    let d = paired_groups("Copa", &teams);
    let c = service.create_championship(&d, &mut rng).unwrap();
    for m in service.generate_fixtures(c.id).unwrap() {
        service.record_score(c.id, m.id, 1, 0).unwrap();
    }
    service.generate_knockout(c.id, Pairing::Standard, &mut rng).unwrap();

    assert!(matches!(
        service.edit_championship(c.id, &d, &mut rng),
        Err(ServiceError::Bracket(BracketError::InvalidState(ChampionshipStatus::Knockout)))
    ));
}

#[test]
fn manual_group_match_stays_inside_its_group() {
    let (service, teams) = service_with_teams(&["A1", "A2", "B1", "B2"]);
    let mut rng = StdRng::seed_from_u64(1);
    let c = service.create_championship(&paired_groups("Copa", &teams), &mut rng).unwrap();
    for m in service.generate_fixtures(c.id).unwrap() {
        service.record_score(c.id, m.id, 2, 1).unwrap();
    }
    let before = service.group_stage_progress(c.id).unwrap();
    assert!(before.is_finished());

    let cross = MatchDraft {
        home_team_id: teams[0].id,
        away_team_id: teams[2].id,
        round: Round::Group("A".to_string()),
        match_time: None,
        venue_id: None,
    };
    assert!(matches!(
        service.create_match(c.id, &cross),
        Err(ServiceError::Bracket(BracketError::Invalid(ValidationError::TeamNotInGroup { team, ref group })))
            if team == teams[2].id && group == "A"
    ));
    assert_eq!(service.group_stage_progress(c.id).unwrap(), before);
    assert!(service.generate_knockout(c.id, Pairing::Standard, &mut rng).is_ok());
}

#[test]
fn rescheduling_snapshots_the_venue_name() {
    let (service, teams) = service_with_teams(&["A", "B"]);
    let mut rng = StdRng::seed_from_u64(0);
    let c = service
        .create_championship(&draft("Liga", Format::League, &teams), &mut rng)
        .unwrap();
    let m = service.generate_fixtures(c.id).unwrap().remove(0);
    let venue = service.create_venue("Mineirão").unwrap();
    let kickoff = Utc.with_ymd_and_hms(2026, 5, 17, 16, 0, 0).unwrap();

    let moved = service
        .reschedule_match(c.id, m.id, Some(kickoff), Some(venue.id))
        .unwrap();
    assert_eq!(moved.match_time, Some(kickoff));
    assert_eq!(moved.venue_id, Some(venue.id));
    assert_eq!(moved.venue_name.as_deref(), Some("Mineirão"));

    // The match keeps the name it was scheduled with.
    service.rename_venue(venue.id, "Estádio Governador Magalhães Pinto").unwrap();
    let stored = service.matches(c.id).unwrap().remove(0);
    assert_eq!(stored.venue_name.as_deref(), Some("Mineirão"));

    let nowhere = Uuid::new_v4();
    assert!(matches!(
        service.reschedule_match(c.id, m.id, None, Some(nowhere)),
        Err(ServiceError::Bracket(BracketError::Invalid(ValidationError::UnknownVenue(id)))) if id == nowhere
    ));
    assert_eq!(service.matches(c.id).unwrap().remove(0).venue_id, Some(venue.id));
}
