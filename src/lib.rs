//! Championship manager: library with models, standings, the knockout bracket and a
//! store contract for applying intents atomically.

pub mod logic;
pub mod models;
pub mod service;
pub mod store;

pub use logic::{
    advance_knockout, compute_standings, compute_table, create_championship,
    declare_league_champion, generate_fixtures, generate_knockout, is_group_stage_finished,
    qualifiers, Advancement, ChampionshipDraft, MatchDraft, Pairing, Standings, TeamStanding,
};
pub use models::{
    BracketError, Championship, ChampionshipId, ChampionshipStatus, Format, Intent,
    KnockoutStage, Match, MatchId, MatchStatus, MatchType, Round, Team, TeamId, TeamRef,
    ValidationError, Venue, VenueId,
};
pub use service::{ChampionshipService, ServiceError};
pub use store::{MemoryStore, Store, StoreError};
