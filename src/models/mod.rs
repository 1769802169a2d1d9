//! Data structures for championships: teams, venues, matches, intents and errors.

mod championship;
mod error;
mod game;
mod intent;
mod team;

pub use championship::{
    Championship, ChampionshipId, ChampionshipStatus, Format, Groups, MatchType,
};
pub use error::{BracketError, ValidationError};
pub use game::{KnockoutStage, Match, MatchId, MatchStatus, Round};
pub use intent::{match_key, match_record, Guard, Intent, Op, Record, RecordKey};
pub use team::{Team, TeamId, TeamRef, Venue, VenueId};
