//! Round-robin fixture generation and random group draws.

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{
    match_key, match_record, BracketError, Championship, Format, Groups, Guard, Intent, Match,
    MatchType, Round, TeamId, TeamRef,
};

/// Label of the group at `index`: `A`, `B`, … `Z`, then `G27`, `G28`, …
pub fn group_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => format!("G{}", index + 1),
    }
}

/// Shuffle `team_ids` and deal them into `num_groups` groups, one at a time, so group
/// sizes differ by at most one.
pub fn assign_groups<R: Rng + ?Sized>(team_ids: &[TeamId], num_groups: usize, rng: &mut R) -> Groups {
    let mut groups = Groups::new();
    if num_groups == 0 {
        return groups;
    }
    for i in 0..num_groups {
        groups.insert(group_label(i), Vec::new());
    }
    let mut shuffled = team_ids.to_vec();
    shuffled.shuffle(rng);
    for (i, id) in shuffled.into_iter().enumerate() {
        if let Some(group) = groups.get_mut(&group_label(i % num_groups)) {
            group.push(id);
        }
    }
    groups
}

/// Every pairing of `teams` once (`team[i]` hosts `team[j]` for i < j); with two legs
/// a second pass appends each pairing with home and away swapped.
pub fn round_robin(teams: &[TeamRef], round: &Round, match_type: MatchType) -> Result<Vec<Match>, BracketError> {
    let mut pairs = Vec::new();
    for (i, home) in teams.iter().enumerate() {
        for away in &teams[i + 1..] {
            pairs.push((home, away));
        }
    }

    let mut matches = Vec::with_capacity(pairs.len() * match_type.legs());
    for (home, away) in &pairs {
        matches.push(Match::new((*home).clone(), (*away).clone(), round.clone())?);
    }
    if match_type == MatchType::TwoLegs {
        for (home, away) in &pairs {
            matches.push(Match::new((*away).clone(), (*home).clone(), round.clone())?);
        }
    }
    Ok(matches)
}

/// All league or group fixtures of a championship, without touching storage.
pub fn build_fixtures(championship: &Championship) -> Result<Vec<Match>, BracketError> {
    match championship.format {
        Format::League => round_robin(&championship.teams, &Round::League, championship.match_type),
        Format::GroupKnockout => {
            let mut all = Vec::new();
            for label in championship.groups.keys() {
                let teams = championship.group_teams(label);
                let round = Round::Group(label.clone());
                all.extend(round_robin(&teams, &round, championship.match_type)?);
            }
            Ok(all)
        }
    }
}

/// Regenerate the fixtures: delete every existing match and insert a fresh set.
///
/// Only allowed while the championship is `active` or `group_stage`; the returned
/// intent is guarded on that status.
pub fn generate_fixtures(championship: &Championship, existing: &[Match]) -> Result<Intent, BracketError> {
    if !championship.status.allows_fixture_changes() {
        return Err(BracketError::InvalidState(championship.status));
    }
    championship.validate()?;

    let fixtures = build_fixtures(championship)?;
    let mut intent = Intent::new().guard(Guard::ChampionshipStatus {
        championship_id: championship.id,
        status: championship.status,
    });
    for game in existing {
        intent = intent.delete(match_key(championship.id, game.id));
    }
    for game in fixtures {
        intent = intent.create(match_record(championship.id, game));
    }
    info!(
        "Fixtures for championship {}: {} deleted, {} created",
        championship.id,
        intent.deleted(),
        intent.created()
    );
    Ok(intent)
}
