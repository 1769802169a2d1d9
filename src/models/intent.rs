//! Mutation intents: the record operations the persistence collaborator must apply
//! all together or not at all.

use serde::{Deserialize, Serialize};

use crate::models::championship::{Championship, ChampionshipId, ChampionshipStatus};
use crate::models::game::{Match, MatchId, Round};
use crate::models::team::{Team, TeamId, Venue, VenueId};

/// A document in one of the collections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "collection", rename_all = "snake_case")]
pub enum Record {
    Team(Team),
    Venue(Venue),
    Championship(Championship),
    Match {
        championship_id: ChampionshipId,
        #[serde(flatten)]
        game: Match,
    },
}

impl Record {
    pub fn key(&self) -> RecordKey {
        match self {
            Record::Team(t) => RecordKey::Team(t.id),
            Record::Venue(v) => RecordKey::Venue(v.id),
            Record::Championship(c) => RecordKey::Championship(c.id),
            Record::Match {
                championship_id,
                game,
            } => RecordKey::Match {
                championship_id: *championship_id,
                match_id: game.id,
            },
        }
    }
}

/// Address of a document: collection plus document id.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(tag = "collection", content = "id", rename_all = "snake_case")]
pub enum RecordKey {
    Team(TeamId),
    Venue(VenueId),
    Championship(ChampionshipId),
    Match {
        championship_id: ChampionshipId,
        match_id: MatchId,
    },
}

impl RecordKey {
    /// Collection path the document lives under.
    pub fn collection_path(&self) -> String {
        match self {
            RecordKey::Team(_) => "teams".to_string(),
            RecordKey::Venue(_) => "venues".to_string(),
            RecordKey::Championship(_) => "championships".to_string(),
            RecordKey::Match {
                championship_id, ..
            } => format!("championships/{championship_id}/matches"),
        }
    }

    pub fn doc_id(&self) -> uuid::Uuid {
        match self {
            RecordKey::Team(id) | RecordKey::Venue(id) | RecordKey::Championship(id) => *id,
            RecordKey::Match { match_id, .. } => *match_id,
        }
    }
}

/// One write. Creating an existing document or updating/deleting a missing one fails
/// the whole intent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Op {
    Create(Record),
    Update(Record),
    Delete(RecordKey),
}

impl Op {
    pub fn key(&self) -> RecordKey {
        match self {
            Op::Create(r) | Op::Update(r) => r.key(),
            Op::Delete(k) => *k,
        }
    }
}

/// Condition checked against current state inside the same atomic apply.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "guard", rename_all = "snake_case")]
pub enum Guard {
    /// The stored championship still has this status.
    ChampionshipStatus {
        championship_id: ChampionshipId,
        status: ChampionshipStatus,
    },
    /// No match of the championship is stored under this round yet.
    RoundEmpty {
        championship_id: ChampionshipId,
        round: Round,
    },
}

/// Ordered writes plus the guards that must hold when they are applied.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub guards: Vec<Guard>,
    pub ops: Vec<Op>,
}

impl Intent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn create(mut self, record: Record) -> Self {
        self.ops.push(Op::Create(record));
        self
    }

    pub fn update(mut self, record: Record) -> Self {
        self.ops.push(Op::Update(record));
        self
    }

    pub fn delete(mut self, key: RecordKey) -> Self {
        self.ops.push(Op::Delete(key));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of `Create` ops, handy for logging.
    pub fn created(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, Op::Create(_))).count()
    }

    pub fn deleted(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, Op::Delete(_))).count()
    }
}

/// Shorthand for a match record.
pub fn match_record(championship_id: ChampionshipId, game: Match) -> Record {
    Record::Match {
        championship_id,
        game,
    }
}

pub fn match_key(championship_id: ChampionshipId, match_id: MatchId) -> RecordKey {
    RecordKey::Match {
        championship_id,
        match_id,
    }
}
