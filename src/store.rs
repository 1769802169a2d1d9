//! Persistence collaborator: the snapshot/intent contract and an in-memory store.

use std::collections::HashMap;
use std::sync::RwLock;

use log::{debug, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Championship, ChampionshipId, Guard, Intent, Match, Op, Record, RecordKey, Team, Venue,
};

/// Errors returned by a store. Any error means no op of the intent was applied.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum StoreError {
    #[error("Document {path}/{id} already exists")]
    AlreadyExists { path: String, id: Uuid },
    #[error("Document {path}/{id} not found")]
    NotFound { path: String, id: Uuid },
    #[error("Write rejected, state changed: {0}")]
    GuardFailed(String),
    #[error("Invalid document {path}/{id}: {reason}")]
    InvalidRecord { path: String, id: Uuid, reason: String },
    #[error("Write failed at operation {0}")]
    Injected(usize),
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Reads return current snapshots; `apply_intent` writes all ops of an intent or none.
pub trait Store {
    fn list_teams(&self) -> Result<Vec<Team>, StoreError>;
    fn list_venues(&self) -> Result<Vec<Venue>, StoreError>;
    fn list_championships(&self) -> Result<Vec<Championship>, StoreError>;
    fn get_championship(&self, id: ChampionshipId) -> Result<Option<Championship>, StoreError>;
    fn list_matches(&self, championship_id: ChampionshipId) -> Result<Vec<Match>, StoreError>;
    fn apply_intent(&self, intent: &Intent) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, Default)]
struct Collections {
    teams: Vec<Team>,
    venues: Vec<Venue>,
    championships: Vec<Championship>,
    /// Matches per championship, in insertion order.
    matches: HashMap<ChampionshipId, Vec<Match>>,
}

fn not_found(key: &RecordKey) -> StoreError {
    StoreError::NotFound {
        path: key.collection_path(),
        id: key.doc_id(),
    }
}

fn already_exists(key: &RecordKey) -> StoreError {
    StoreError::AlreadyExists {
        path: key.collection_path(),
        id: key.doc_id(),
    }
}

/// Insert (`create`) or replace (`!create`) the element with the same id.
fn put<T, F>(items: &mut Vec<T>, item: T, same: F, create: bool, key: &RecordKey) -> Result<(), StoreError>
where
    F: Fn(&T) -> bool,
{
    match (items.iter().position(same), create) {
        (None, true) => items.push(item),
        (Some(i), false) => items[i] = item,
        (Some(_), true) => return Err(already_exists(key)),
        (None, false) => return Err(not_found(key)),
    }
    Ok(())
}

fn remove<T, F>(items: &mut Vec<T>, same: F, key: &RecordKey) -> Result<(), StoreError>
where
    F: Fn(&T) -> bool,
{
    let i = items.iter().position(same).ok_or_else(|| not_found(key))?;
    items.remove(i);
    Ok(())
}

impl Collections {
    fn check_guard(&self, guard: &Guard) -> Result<(), StoreError> {
        match guard {
            Guard::ChampionshipStatus {
                championship_id,
                status,
            } => {
                let current = self
                    .championships
                    .iter()
                    .find(|c| c.id == *championship_id)
                    .map(|c| c.status);
                if current != Some(*status) {
                    return Err(StoreError::GuardFailed(format!(
                        "championship {championship_id} is no longer {status}"
                    )));
                }
            }
            Guard::RoundEmpty {
                championship_id,
                round,
            } => {
                let taken = self
                    .matches
                    .get(championship_id)
                    .is_some_and(|ms| ms.iter().any(|m| m.round == *round));
                if taken {
                    return Err(StoreError::GuardFailed(format!(
                        "round {round} already exists in championship {championship_id}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_record(record: &Record) -> Result<(), StoreError> {
        let key = record.key();
        let invalid = |reason: String| StoreError::InvalidRecord {
            path: key.collection_path(),
            id: key.doc_id(),
            reason,
        };
        match record {
            Record::Championship(c) => c.validate().map_err(|e| invalid(e.to_string())),
            Record::Match { game, .. } if !game.is_consistent() => {
                Err(invalid("score fields do not match status".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn write(&mut self, record: Record, create: bool) -> Result<(), StoreError> {
        Self::validate_record(&record)?;
        let key = record.key();
        match record {
            Record::Team(team) => {
                let id = team.id;
                put(&mut self.teams, team, |t| t.id == id, create, &key)
            }
            Record::Venue(venue) => {
                let id = venue.id;
                put(&mut self.venues, venue, |v| v.id == id, create, &key)
            }
            Record::Championship(championship) => {
                let id = championship.id;
                put(&mut self.championships, championship, |c| c.id == id, create, &key)
            }
            Record::Match {
                championship_id,
                game,
            } => {
                if !self.championships.iter().any(|c| c.id == championship_id) {
                    return Err(not_found(&RecordKey::Championship(championship_id)));
                }
                let id = game.id;
                let matches = self.matches.entry(championship_id).or_default();
                put(matches, game, |m| m.id == id, create, &key)
            }
        }
    }

    fn delete(&mut self, key: RecordKey) -> Result<(), StoreError> {
        match key {
            RecordKey::Team(id) => remove(&mut self.teams, |t| t.id == id, &key),
            RecordKey::Venue(id) => remove(&mut self.venues, |v| v.id == id, &key),
            RecordKey::Championship(id) => {
                remove(&mut self.championships, |c| c.id == id, &key)?;
                // Matches are owned by the championship.
                self.matches.remove(&id);
                Ok(())
            }
            RecordKey::Match {
                championship_id,
                match_id,
            } => {
                let matches = self
                    .matches
                    .get_mut(&championship_id)
                    .ok_or_else(|| not_found(&key))?;
                remove(matches, |m| m.id == match_id, &key)
            }
        }
    }
}

#[derive(Debug, Default)]
struct State {
    data: Collections,
    /// One-shot fault: fail when reaching this op index.
    fail_at: Option<usize>,
}

/// In-memory store. Intents are staged on a copy and swapped in only when every guard
/// and op succeeded, all under one write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next intent fail when it reaches op number `ops` (0-based), after the
    /// earlier ops were staged. Used to exercise atomicity.
    pub fn fail_after_ops(&self, ops: usize) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        state.fail_at = Some(ops);
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Collections) -> T) -> Result<T, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&state.data))
    }
}

impl Store for MemoryStore {
    fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        self.read(|data| data.teams.clone())
    }

    fn list_venues(&self) -> Result<Vec<Venue>, StoreError> {
        self.read(|data| data.venues.clone())
    }

    fn list_championships(&self) -> Result<Vec<Championship>, StoreError> {
        self.read(|data| data.championships.clone())
    }

    fn get_championship(&self, id: ChampionshipId) -> Result<Option<Championship>, StoreError> {
        self.read(|data| data.championships.iter().find(|c| c.id == id).cloned())
    }

    fn list_matches(&self, championship_id: ChampionshipId) -> Result<Vec<Match>, StoreError> {
        self.read(|data| data.matches.get(&championship_id).cloned().unwrap_or_default())
    }

    fn apply_intent(&self, intent: &Intent) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        let fail_at = state.fail_at.take();
        let mut staged = state.data.clone();

        for guard in &intent.guards {
            staged.check_guard(guard)?;
        }
        for (i, op) in intent.ops.iter().enumerate() {
            if fail_at == Some(i) {
                warn!("Injected failure at op {} of {}", i, intent.ops.len());
                return Err(StoreError::Injected(i));
            }
            match op {
                Op::Create(record) => staged.write(record.clone(), true)?,
                Op::Update(record) => staged.write(record.clone(), false)?,
                Op::Delete(key) => staged.delete(*key)?,
            }
        }

        state.data = staged;
        debug!("Applied intent with {} ops", intent.ops.len());
        Ok(())
    }
}
