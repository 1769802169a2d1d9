//! Match results and manual match management.

use chrono::{DateTime, Utc};
use log::debug;
use serde::Deserialize;

use crate::logic::bracket::current_round;
use crate::models::{
    match_record, BracketError, Championship, ChampionshipStatus, Format, Guard, Intent, Match,
    Round, TeamId, ValidationError, Venue, VenueId,
};

/// A match created by hand instead of by fixture generation.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDraft {
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub round: Round,
    #[serde(default)]
    pub match_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub venue_id: Option<VenueId>,
}

fn find_venue(venues: &[Venue], venue_id: Option<VenueId>) -> Result<Option<&Venue>, ValidationError> {
    venue_id
        .map(|id| {
            venues
                .iter()
                .find(|v| v.id == id)
                .ok_or(ValidationError::UnknownVenue(id))
        })
        .transpose()
}

fn status_guard(championship: &Championship) -> Guard {
    Guard::ChampionshipStatus {
        championship_id: championship.id,
        status: championship.status,
    }
}

/// Validate and build a manual league or group match. Group matches must be played
/// between two members of that group.
pub fn create_match(
    championship: &Championship,
    draft: &MatchDraft,
    venues: &[Venue],
) -> Result<(Match, Intent), BracketError> {
    if !championship.status.allows_fixture_changes() {
        return Err(BracketError::InvalidState(championship.status));
    }
    if draft.home_team_id == draft.away_team_id {
        return Err(ValidationError::SameTeam.into());
    }
    let round_fits = match (&draft.round, championship.format) {
        (Round::League, Format::League) => true,
        (Round::Group(label), Format::GroupKnockout) => championship.groups.contains_key(label),
        _ => false,
    };
    if !round_fits {
        return Err(ValidationError::InvalidRound(draft.round.to_string()).into());
    }
    let lookup = |id: TeamId| {
        championship
            .team(id)
            .cloned()
            .ok_or(ValidationError::TeamNotInChampionship(id))
    };
    let home = lookup(draft.home_team_id)?;
    let away = lookup(draft.away_team_id)?;
    if let Round::Group(label) = &draft.round {
        let members = championship.groups.get(label).map(Vec::as_slice).unwrap_or_default();
        if let Some(outsider) = [home.id, away.id].into_iter().find(|id| !members.contains(id)) {
            return Err(ValidationError::TeamNotInGroup {
                team: outsider,
                group: label.clone(),
            }
            .into());
        }
    }
    let venue = find_venue(venues, draft.venue_id)?;

    let mut game = Match::new(home, away, draft.round.clone())?;
    game.reschedule(draft.match_time, venue);
    let intent = Intent::new()
        .guard(status_guard(championship))
        .create(match_record(championship.id, game.clone()));
    Ok((game, intent))
}

/// Refuse to touch a result that progression has already consumed: anything in a
/// finished championship, group matches once the bracket exists, and knockout matches
/// of a round that has been advanced past.
pub fn ensure_result_editable(
    championship: &Championship,
    matches: &[Match],
    game: &Match,
) -> Result<(), BracketError> {
    let locked = match championship.status {
        ChampionshipStatus::Finished => true,
        ChampionshipStatus::Knockout => match game.round.knockout_stage() {
            Some(stage) => current_round(matches) != Some(stage),
            None => true,
        },
        ChampionshipStatus::Active | ChampionshipStatus::GroupStage => false,
    };
    if locked {
        debug!("Match {} is locked in a {} championship", game.id, championship.status);
        return Err(BracketError::ResultLocked(game.id));
    }
    Ok(())
}

/// Record a final score.
pub fn record_score(
    championship: &Championship,
    matches: &[Match],
    game: &Match,
    home: u32,
    away: u32,
) -> Result<Intent, BracketError> {
    ensure_result_editable(championship, matches, game)?;
    let mut updated = game.clone();
    updated.record_score(home, away);
    Ok(Intent::new()
        .guard(status_guard(championship))
        .update(match_record(championship.id, updated)))
}

/// Take a result back; the match returns to scheduled.
pub fn clear_score(championship: &Championship, matches: &[Match], game: &Match) -> Result<Intent, BracketError> {
    ensure_result_editable(championship, matches, game)?;
    let mut updated = game.clone();
    updated.clear_score();
    Ok(Intent::new()
        .guard(status_guard(championship))
        .update(match_record(championship.id, updated)))
}

/// Change kick-off time and venue. The venue name is snapshotted now.
pub fn reschedule_match(
    championship: &Championship,
    game: &Match,
    match_time: Option<DateTime<Utc>>,
    venue_id: Option<VenueId>,
    venues: &[Venue],
) -> Result<Intent, BracketError> {
    if championship.status == ChampionshipStatus::Finished {
        return Err(BracketError::InvalidState(championship.status));
    }
    let venue = find_venue(venues, venue_id)?;
    let mut updated = game.clone();
    updated.reschedule(match_time, venue);
    Ok(Intent::new().update(match_record(championship.id, updated)))
}
