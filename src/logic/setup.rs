//! Setup phase: create, edit and delete championships.

use std::collections::HashSet;

use log::info;
use rand::Rng;
use serde::Deserialize;

use crate::logic::fixtures::assign_groups;
use crate::models::{
    match_key, BracketError, Championship, ChampionshipStatus, Format, Groups, Guard, Intent,
    Match, MatchType, Record, RecordKey, Team, TeamId, TeamRef, ValidationError,
};

/// What the user filled in on the championship form.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionshipDraft {
    pub name: String,
    #[serde(default)]
    pub sport: String,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub match_type: MatchType,
    pub team_ids: Vec<TeamId>,
    #[serde(default)]
    pub num_groups: usize,
    /// Explicit group assignment; drawn at random when absent.
    #[serde(default)]
    pub groups: Option<Groups>,
}

/// Snapshot the selected teams, rejecting duplicates and unknown ids.
fn select_teams(team_ids: &[TeamId], registered: &[Team]) -> Result<Vec<TeamRef>, ValidationError> {
    if team_ids.len() < 2 {
        return Err(ValidationError::NotEnoughTeams {
            selected: team_ids.len(),
        });
    }
    let mut seen = HashSet::new();
    team_ids
        .iter()
        .map(|id| {
            if !seen.insert(*id) {
                return Err(ValidationError::DuplicateTeam(*id));
            }
            registered
                .iter()
                .find(|t| t.id == *id)
                .map(Team::snapshot)
                .ok_or(ValidationError::UnknownTeam(*id))
        })
        .collect()
}

fn build_groups<R: Rng + ?Sized>(
    draft: &ChampionshipDraft,
    teams: &[TeamRef],
    previous: Option<&Championship>,
    rng: &mut R,
) -> Result<Groups, ValidationError> {
    match draft.format {
        Format::League => match &draft.groups {
            Some(groups) if !groups.is_empty() => Err(ValidationError::GroupsInLeague),
            _ => Ok(Groups::new()),
        },
        Format::GroupKnockout => {
            if draft.num_groups == 0 {
                return Err(ValidationError::NoGroups);
            }
            if teams.len() < draft.num_groups {
                return Err(ValidationError::NotEnoughTeamsForGroups {
                    teams: teams.len(),
                    groups: draft.num_groups,
                });
            }
            if let Some(groups) = &draft.groups {
                return Ok(groups.clone());
            }
            let ids: Vec<TeamId> = teams.iter().map(|t| t.id).collect();
            // Keep the previous draw when neither the teams nor the group count changed.
            if let Some(prev) = previous {
                let same_teams = prev.teams.len() == ids.len() && ids.iter().all(|id| prev.has_team(*id));
                if prev.format == Format::GroupKnockout && prev.num_groups == draft.num_groups && same_teams {
                    return Ok(prev.groups.clone());
                }
            }
            Ok(assign_groups(&ids, draft.num_groups, rng))
        }
    }
}

fn championship_from_draft<R: Rng + ?Sized>(
    id: uuid::Uuid,
    draft: &ChampionshipDraft,
    registered: &[Team],
    previous: Option<&Championship>,
    rng: &mut R,
) -> Result<Championship, ValidationError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyChampionshipName);
    }
    let teams = select_teams(&draft.team_ids, registered)?;
    let groups = build_groups(draft, &teams, previous, rng)?;
    let num_groups = match draft.format {
        Format::League => 0,
        Format::GroupKnockout => draft.num_groups,
    };

    let championship = Championship {
        id,
        name: name.to_string(),
        sport: draft.sport.trim().to_string(),
        format: draft.format,
        match_type: draft.match_type,
        teams,
        groups,
        num_groups,
        status: ChampionshipStatus::initial(draft.format),
        champion_id: None,
        champion_name: None,
    };
    championship.validate()?;
    Ok(championship)
}

/// Validate the draft and build the new championship plus its create intent.
pub fn create_championship<R: Rng + ?Sized>(
    draft: &ChampionshipDraft,
    registered: &[Team],
    rng: &mut R,
) -> Result<(Championship, Intent), ValidationError> {
    let championship = championship_from_draft(uuid::Uuid::new_v4(), draft, registered, None, rng)?;
    info!(
        "Created championship {} ({}, {} teams)",
        championship.name,
        championship.format,
        championship.teams.len()
    );
    let intent = Intent::new().create(Record::Championship(championship.clone()));
    Ok((championship, intent))
}

/// Rewrite a championship from an edited draft. Team snapshots are retaken from the
/// current registry. Only possible before the knockout phase starts, and the format
/// is fixed at creation.
pub fn edit_championship<R: Rng + ?Sized>(
    existing: &Championship,
    draft: &ChampionshipDraft,
    registered: &[Team],
    rng: &mut R,
) -> Result<(Championship, Intent), BracketError> {
    if !existing.status.allows_fixture_changes() {
        return Err(BracketError::InvalidState(existing.status));
    }
    if draft.format != existing.format {
        return Err(ValidationError::FormatChanged {
            from: existing.format,
            to: draft.format,
        }
        .into());
    }
    let mut championship = championship_from_draft(existing.id, draft, registered, Some(existing), rng)?;
    // Editing never moves the status machine.
    championship.status = existing.status;
    let intent = Intent::new()
        .guard(Guard::ChampionshipStatus {
            championship_id: existing.id,
            status: existing.status,
        })
        .update(Record::Championship(championship.clone()));
    Ok((championship, intent))
}

/// Delete the championship together with every match it owns.
pub fn delete_championship(championship: &Championship, matches: &[Match]) -> Intent {
    let mut intent = Intent::new();
    for game in matches {
        intent = intent.delete(match_key(championship.id, game.id));
    }
    intent.delete(RecordKey::Championship(championship.id))
}
