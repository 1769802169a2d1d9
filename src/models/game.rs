//! Match, its status and the round it belongs to.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::error::ValidationError;
use crate::models::team::{TeamId, TeamRef, Venue, VenueId};

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Whether a match has a result.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Finished,
}

/// Named knockout stages, from the widest to the final.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum KnockoutStage {
    QuarterFinal,
    SemiFinal,
    Final,
}

impl KnockoutStage {
    /// Stage played by `entrants` teams. Only 8, 4 and 2 are supported.
    pub fn for_entrants(entrants: usize) -> Option<Self> {
        match entrants {
            8 => Some(Self::QuarterFinal),
            4 => Some(Self::SemiFinal),
            2 => Some(Self::Final),
            _ => None,
        }
    }

    /// Number of teams entering this stage.
    pub fn entrants(self) -> usize {
        match self {
            Self::QuarterFinal => 8,
            Self::SemiFinal => 4,
            Self::Final => 2,
        }
    }

    /// Stage that follows, `None` after the final.
    pub fn next(self) -> Option<Self> {
        Self::for_entrants(self.entrants() / 2)
    }

    /// Display name, also the stored round string.
    pub fn name(self) -> &'static str {
        match self {
            Self::QuarterFinal => "Quartas de Final",
            Self::SemiFinal => "Semifinal",
            Self::Final => "Final",
        }
    }
}

impl fmt::Display for KnockoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const LEAGUE_ROUND: &str = "league";
const GROUP_ROUND_PREFIX: &str = "group_";

/// Which part of the competition a match belongs to.
///
/// Stored as a plain string: `"league"`, `"group_<label>"` or a knockout stage name.
/// Unknown strings are rejected on read.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Round {
    League,
    Group(String),
    Knockout(KnockoutStage),
}

impl Round {
    pub fn is_group(&self) -> bool {
        matches!(self, Round::Group(_))
    }

    pub fn knockout_stage(&self) -> Option<KnockoutStage> {
        match self {
            Round::Knockout(stage) => Some(*stage),
            _ => None,
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Round::League => f.write_str(LEAGUE_ROUND),
            Round::Group(label) => write!(f, "{GROUP_ROUND_PREFIX}{label}"),
            Round::Knockout(stage) => f.write_str(stage.name()),
        }
    }
}

impl FromStr for Round {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == LEAGUE_ROUND {
            return Ok(Round::League);
        }
        if let Some(label) = s.strip_prefix(GROUP_ROUND_PREFIX) {
            if !label.is_empty() {
                return Ok(Round::Group(label.to_string()));
            }
        }
        [
            KnockoutStage::QuarterFinal,
            KnockoutStage::SemiFinal,
            KnockoutStage::Final,
        ]
        .into_iter()
        .find(|stage| stage.name() == s)
        .map(Round::Knockout)
        .ok_or_else(|| ValidationError::InvalidRound(s.to_string()))
    }
}

impl From<Round> for String {
    fn from(round: Round) -> Self {
        round.to_string()
    }
}

impl TryFrom<String> for Round {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A single match between two teams of a championship.
///
/// Scores are all-or-nothing: both `None` while scheduled, both set once finished.
/// Mutate results through [`Match::record_score`] and [`Match::clear_score`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub home_team: TeamRef,
    pub away_team: TeamRef,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub status: MatchStatus,
    pub round: Round,
    #[serde(default)]
    pub match_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_id: Option<VenueId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knockout_index: Option<u32>,
}

impl Match {
    /// New scheduled match. Home and away must differ.
    pub fn new(home_team: TeamRef, away_team: TeamRef, round: Round) -> Result<Self, ValidationError> {
        if home_team.id == away_team.id {
            return Err(ValidationError::SameTeam);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            home_team,
            away_team,
            home_score: None,
            away_score: None,
            status: MatchStatus::Scheduled,
            round,
            match_time: None,
            venue_id: None,
            venue_name: None,
            knockout_index: None,
        })
    }

    /// New scheduled knockout match at `index` within its stage.
    pub fn knockout(
        home_team: TeamRef,
        away_team: TeamRef,
        stage: KnockoutStage,
        index: u32,
    ) -> Result<Self, ValidationError> {
        let mut game = Self::new(home_team, away_team, Round::Knockout(stage))?;
        game.knockout_index = Some(index);
        Ok(game)
    }

    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    /// `(home, away)` goals, only for a finished match with both scores present.
    pub fn score(&self) -> Option<(u32, u32)> {
        match (self.status, self.home_score, self.away_score) {
            (MatchStatus::Finished, Some(home), Some(away)) => Some((home, away)),
            _ => None,
        }
    }

    /// Team with strictly more goals. `None` for draws and unfinished matches.
    pub fn winner(&self) -> Option<&TeamRef> {
        let (home, away) = self.score()?;
        match home.cmp(&away) {
            std::cmp::Ordering::Greater => Some(&self.home_team),
            std::cmp::Ordering::Less => Some(&self.away_team),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.home_team.id == team_id || self.away_team.id == team_id
    }

    /// Set both scores and mark the match finished.
    pub fn record_score(&mut self, home: u32, away: u32) {
        self.home_score = Some(home);
        self.away_score = Some(away);
        self.status = MatchStatus::Finished;
    }

    /// Drop the result and return the match to scheduled.
    pub fn clear_score(&mut self) {
        self.home_score = None;
        self.away_score = None;
        self.status = MatchStatus::Scheduled;
    }

    /// Set kick-off time and venue; the venue name is copied at this moment.
    pub fn reschedule(&mut self, match_time: Option<DateTime<Utc>>, venue: Option<&Venue>) {
        self.match_time = match_time;
        self.venue_id = venue.map(|v| v.id);
        self.venue_name = venue.map(|v| v.name.clone());
    }

    /// True when the score fields agree with the status.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            MatchStatus::Scheduled => self.home_score.is_none() && self.away_score.is_none(),
            MatchStatus::Finished => self.home_score.is_some() && self.away_score.is_some(),
        }
    }
}
