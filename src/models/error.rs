//! Errors raised by championship validation and the bracket state machine.

use thiserror::Error;

use crate::models::championship::{ChampionshipStatus, Format};
use crate::models::game::{KnockoutStage, MatchId};
use crate::models::team::TeamId;

/// Input rejected before any mutation is attempted.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ValidationError {
    #[error("Championship name must not be empty")]
    EmptyChampionshipName,
    #[error("Team name must not be empty")]
    EmptyTeamName,
    #[error("Venue name must not be empty")]
    EmptyVenueName,
    #[error("Select at least 2 teams (selected {selected})")]
    NotEnoughTeams { selected: usize },
    #[error("A group championship needs at least one group")]
    NoGroups,
    #[error("Need at least {groups} teams for {groups} groups (selected {teams})")]
    NotEnoughTeamsForGroups { teams: usize, groups: usize },
    #[error("Expected {expected} groups, got {actual}")]
    WrongGroupCount { expected: usize, actual: usize },
    #[error("Team {0} is not assigned to any group")]
    TeamNotGrouped(TeamId),
    #[error("Team {0} appears in more than one group")]
    TeamInSeveralGroups(TeamId),
    #[error("Group contains team {0} which is not part of the championship")]
    UnknownGroupedTeam(TeamId),
    #[error("League championships do not have groups")]
    GroupsInLeague,
    #[error("Team {0} was selected more than once")]
    DuplicateTeam(TeamId),
    #[error("Home and away team must be different")]
    SameTeam,
    #[error("Team {0} is not part of this championship")]
    TeamNotInChampionship(TeamId),
    #[error("Unknown team {0}")]
    UnknownTeam(TeamId),
    #[error("Unknown venue {0}")]
    UnknownVenue(uuid::Uuid),
    #[error("Unknown round name {0:?}")]
    InvalidRound(String),
    #[error("Team {team} is not in group {group}")]
    TeamNotInGroup { team: TeamId, group: String },
    #[error("Format cannot change from {from} to {to} after creation")]
    FormatChanged { from: Format, to: Format },
}

/// A progression step was requested while its preconditions do not hold.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum BracketError {
    #[error("Championship is {0}; action not allowed in this state")]
    InvalidState(ChampionshipStatus),
    #[error("Cannot move championship from {from} to {to}")]
    InvalidTransition {
        from: ChampionshipStatus,
        to: ChampionshipStatus,
    },
    #[error("Action not available for {0} championships")]
    WrongFormat(Format),
    #[error("Group stage not finished: {finished} of {expected} matches played ({scheduled} scheduled)")]
    GroupStageNotFinished {
        expected: usize,
        scheduled: usize,
        finished: usize,
    },
    #[error("Round {0} still has unfinished matches")]
    RoundNotComplete(KnockoutStage),
    #[error("Match {0} ended in a draw; knockout draws cannot be resolved")]
    DrawUnsupported(MatchId),
    #[error("Bracket with {0} teams is not supported (use 2, 4 or 8)")]
    UnsupportedBracketSize(usize),
    #[error("Group {0} does not have two teams to qualify")]
    GroupTooSmall(String),
    #[error("No knockout round has been generated")]
    NoKnockoutRound,
    #[error("Championship has no matches")]
    NoMatches,
    #[error("{pending} matches are not finished")]
    MatchesPending { pending: usize },
    #[error("Result of match {0} has already been used for progression")]
    ResultLocked(MatchId),
    #[error("Team {0} is not part of this championship")]
    TeamNotInChampionship(TeamId),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
