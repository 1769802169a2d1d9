//! Championship, its format options and the status state machine.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::error::{BracketError, ValidationError};
use crate::models::team::{TeamId, TeamRef};

/// Unique identifier for a championship.
pub type ChampionshipId = Uuid;

/// Group label → team ids, iterated in label order.
pub type Groups = BTreeMap<String, Vec<TeamId>>;

/// How the championship is played.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Everybody plays everybody, one table.
    #[default]
    League,
    /// Round-robin groups followed by an elimination bracket.
    GroupKnockout,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::League => "league",
            Format::GroupKnockout => "group_knockout",
        })
    }
}

/// How many times each pair of teams meets in round-robin play.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    #[default]
    OneLeg,
    TwoLegs,
}

impl MatchType {
    pub fn legs(self) -> usize {
        match self {
            MatchType::OneLeg => 1,
            MatchType::TwoLegs => 2,
        }
    }
}

/// Current phase of the championship.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChampionshipStatus {
    /// League in progress.
    #[default]
    Active,
    /// Groups being played.
    GroupStage,
    /// Bracket being played.
    Knockout,
    /// Champion declared.
    Finished,
}

impl ChampionshipStatus {
    /// Status a freshly created championship starts in.
    pub fn initial(format: Format) -> Self {
        match format {
            Format::League => ChampionshipStatus::Active,
            Format::GroupKnockout => ChampionshipStatus::GroupStage,
        }
    }

    /// Forward-only transitions: `active → finished`, `group_stage → knockout → finished`.
    pub fn can_transition_to(self, next: ChampionshipStatus) -> bool {
        use ChampionshipStatus::*;
        matches!(
            (self, next),
            (Active, Finished) | (GroupStage, Knockout) | (Knockout, Finished)
        )
    }

    /// Group/league fixtures may still be (re)generated or edited.
    pub fn allows_fixture_changes(self) -> bool {
        matches!(self, ChampionshipStatus::Active | ChampionshipStatus::GroupStage)
    }
}

impl fmt::Display for ChampionshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChampionshipStatus::Active => "active",
            ChampionshipStatus::GroupStage => "group_stage",
            ChampionshipStatus::Knockout => "knockout",
            ChampionshipStatus::Finished => "finished",
        })
    }
}

/// A championship record with the team snapshots taken when it was created or edited.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Championship {
    pub id: ChampionshipId,
    pub name: String,
    #[serde(default)]
    pub sport: String,
    pub format: Format,
    pub match_type: MatchType,
    pub teams: Vec<TeamRef>,
    #[serde(default)]
    pub groups: Groups,
    #[serde(default)]
    pub num_groups: usize,
    pub status: ChampionshipStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub champion_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub champion_name: Option<String>,
}

impl Championship {
    pub fn team(&self, id: TeamId) -> Option<&TeamRef> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn has_team(&self, id: TeamId) -> bool {
        self.team(id).is_some()
    }

    /// Snapshots of the teams in one group, in the group's stored order.
    /// Ids without a snapshot are skipped.
    pub fn group_teams(&self, label: &str) -> Vec<TeamRef> {
        self.groups
            .get(label)
            .map(|ids| ids.iter().filter_map(|id| self.team(*id).cloned()).collect())
            .unwrap_or_default()
    }

    /// Move to `next`, refusing anything but a forward step.
    pub fn transition(&mut self, next: ChampionshipStatus) -> Result<(), BracketError> {
        if !self.status.can_transition_to(next) {
            return Err(BracketError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Terminal transition recording the champion.
    pub fn declare_champion(&mut self, champion: &TeamRef) -> Result<(), BracketError> {
        if !self.has_team(champion.id) {
            return Err(BracketError::TeamNotInChampionship(champion.id));
        }
        self.transition(ChampionshipStatus::Finished)?;
        self.champion_id = Some(champion.id);
        self.champion_name = Some(champion.name.clone());
        Ok(())
    }

    /// Check the structural invariants of the record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyChampionshipName);
        }
        if self.teams.len() < 2 {
            return Err(ValidationError::NotEnoughTeams {
                selected: self.teams.len(),
            });
        }
        let mut seen = HashSet::new();
        for team in &self.teams {
            if !seen.insert(team.id) {
                return Err(ValidationError::DuplicateTeam(team.id));
            }
        }

        match self.format {
            Format::League => {
                if !self.groups.is_empty() {
                    return Err(ValidationError::GroupsInLeague);
                }
            }
            Format::GroupKnockout => {
                if self.num_groups == 0 {
                    return Err(ValidationError::NoGroups);
                }
                if self.teams.len() < self.num_groups {
                    return Err(ValidationError::NotEnoughTeamsForGroups {
                        teams: self.teams.len(),
                        groups: self.num_groups,
                    });
                }
                if self.groups.len() != self.num_groups {
                    return Err(ValidationError::WrongGroupCount {
                        expected: self.num_groups,
                        actual: self.groups.len(),
                    });
                }
                let mut grouped = HashSet::new();
                for id in self.groups.values().flatten() {
                    if !seen.contains(id) {
                        return Err(ValidationError::UnknownGroupedTeam(*id));
                    }
                    if !grouped.insert(*id) {
                        return Err(ValidationError::TeamInSeveralGroups(*id));
                    }
                }
                if let Some(missing) = self.teams.iter().find(|t| !grouped.contains(&t.id)) {
                    return Err(ValidationError::TeamNotGrouped(missing.id));
                }
            }
        }
        Ok(())
    }
}
