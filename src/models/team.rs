//! Team, Venue and the denormalized TeamRef snapshot stored in championships and matches.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::error::ValidationError;

/// Unique identifier for a team.
pub type TeamId = Uuid;

/// Unique identifier for a venue.
pub type VenueId = Uuid;

/// A registered team. Lives independently of any championship.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}

impl Team {
    /// Create a team with a fresh id. The name is trimmed and must not be empty.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: clean_name(name.into(), ValidationError::EmptyTeamName)?,
        })
    }

    /// Rename the team. Snapshots already stored elsewhere keep the old name.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        self.name = clean_name(name.into(), ValidationError::EmptyTeamName)?;
        Ok(())
    }

    /// Snapshot of this team as it is right now.
    pub fn snapshot(&self) -> TeamRef {
        TeamRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// A place where matches are played.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
}

impl Venue {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: clean_name(name.into(), ValidationError::EmptyVenueName)?,
        })
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        self.name = clean_name(name.into(), ValidationError::EmptyVenueName)?;
        Ok(())
    }
}

/// Denormalized `{id, name}` copy of a team, taken when it was referenced.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: TeamId,
    pub name: String,
}

fn clean_name(name: String, empty: ValidationError) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(empty);
    }
    Ok(trimmed.to_string())
}
