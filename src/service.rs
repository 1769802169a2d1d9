//! Championship service: reads snapshots from a [`Store`], runs the engines and
//! applies the resulting intents.

use chrono::{DateTime, Utc};
use log::{info, warn};
use rand::Rng;
use thiserror::Error;

use crate::logic::{
    self, Advancement, BracketRound, ChampionshipDraft, ExportError, GroupStageProgress, MatchDraft,
    Pairing, Standings,
};
use crate::models::{
    BracketError, Championship, ChampionshipId, Intent, Match, MatchId, Record, RecordKey, Team,
    TeamId, ValidationError, Venue, VenueId,
};
use crate::store::{Store, StoreError};

/// Everything a service call can fail with.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Bracket(#[from] BracketError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Championship {0} not found")]
    ChampionshipNotFound(ChampionshipId),
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),
    #[error("Team {0} not found")]
    TeamNotFound(TeamId),
    #[error("Venue {0} not found")]
    VenueNotFound(VenueId),
}

pub struct ChampionshipService<S> {
    store: S,
}

impl<S: Store> ChampionshipService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn apply(&self, intent: &Intent) -> Result<(), ServiceError> {
        self.store.apply_intent(intent).map_err(|e| {
            warn!("Intent with {} ops rejected: {}", intent.ops.len(), e);
            ServiceError::from(e)
        })
    }

    fn snapshot(&self, id: ChampionshipId) -> Result<(Championship, Vec<Match>), ServiceError> {
        let championship = self.championship(id)?;
        let matches = self.store.list_matches(id)?;
        Ok((championship, matches))
    }

    fn find_match(matches: &[Match], match_id: MatchId) -> Result<&Match, ServiceError> {
        matches
            .iter()
            .find(|m| m.id == match_id)
            .ok_or(ServiceError::MatchNotFound(match_id))
    }

    // Teams

    pub fn teams(&self) -> Result<Vec<Team>, ServiceError> {
        Ok(self.store.list_teams()?)
    }

    pub fn create_team(&self, name: &str) -> Result<Team, ServiceError> {
        let team = Team::new(name)?;
        self.apply(&Intent::new().create(Record::Team(team.clone())))?;
        info!("Registered team {}", team.name);
        Ok(team)
    }

    /// Rename a team. Championships and matches keep the name they stored.
    pub fn rename_team(&self, id: TeamId, name: &str) -> Result<Team, ServiceError> {
        let mut team = self
            .teams()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(ServiceError::TeamNotFound(id))?;
        team.rename(name)?;
        self.apply(&Intent::new().update(Record::Team(team.clone())))?;
        Ok(team)
    }

    pub fn delete_team(&self, id: TeamId) -> Result<(), ServiceError> {
        self.apply(&Intent::new().delete(RecordKey::Team(id)))
            .map_err(|e| match e {
                ServiceError::Store(StoreError::NotFound { .. }) => ServiceError::TeamNotFound(id),
                other => other,
            })
    }

    // Venues

    pub fn venues(&self) -> Result<Vec<Venue>, ServiceError> {
        Ok(self.store.list_venues()?)
    }

    pub fn create_venue(&self, name: &str) -> Result<Venue, ServiceError> {
        let venue = Venue::new(name)?;
        self.apply(&Intent::new().create(Record::Venue(venue.clone())))?;
        Ok(venue)
    }

    pub fn rename_venue(&self, id: VenueId, name: &str) -> Result<Venue, ServiceError> {
        let mut venue = self
            .venues()?
            .into_iter()
            .find(|v| v.id == id)
            .ok_or(ServiceError::VenueNotFound(id))?;
        venue.rename(name)?;
        self.apply(&Intent::new().update(Record::Venue(venue.clone())))?;
        Ok(venue)
    }

    pub fn delete_venue(&self, id: VenueId) -> Result<(), ServiceError> {
        self.apply(&Intent::new().delete(RecordKey::Venue(id)))
            .map_err(|e| match e {
                ServiceError::Store(StoreError::NotFound { .. }) => ServiceError::VenueNotFound(id),
                other => other,
            })
    }

    // Championships

    pub fn championships(&self) -> Result<Vec<Championship>, ServiceError> {
        Ok(self.store.list_championships()?)
    }

    pub fn championship(&self, id: ChampionshipId) -> Result<Championship, ServiceError> {
        self.store
            .get_championship(id)?
            .ok_or(ServiceError::ChampionshipNotFound(id))
    }

    pub fn create_championship<R: Rng + ?Sized>(
        &self,
        draft: &ChampionshipDraft,
        rng: &mut R,
    ) -> Result<Championship, ServiceError> {
        let teams = self.teams()?;
        let (championship, intent) = logic::create_championship(draft, &teams, rng)?;
        self.apply(&intent)?;
        Ok(championship)
    }

    pub fn edit_championship<R: Rng + ?Sized>(
        &self,
        id: ChampionshipId,
        draft: &ChampionshipDraft,
        rng: &mut R,
    ) -> Result<Championship, ServiceError> {
        let existing = self.championship(id)?;
        let teams = self.teams()?;
        let (championship, intent) = logic::edit_championship(&existing, draft, &teams, rng)?;
        self.apply(&intent)?;
        info!("Edited championship {}", championship.name);
        Ok(championship)
    }

    pub fn delete_championship(&self, id: ChampionshipId) -> Result<(), ServiceError> {
        let (championship, matches) = self.snapshot(id)?;
        self.apply(&logic::delete_championship(&championship, &matches))?;
        info!("Deleted championship {} and {} matches", championship.name, matches.len());
        Ok(())
    }

    // Matches

    pub fn matches(&self, id: ChampionshipId) -> Result<Vec<Match>, ServiceError> {
        Ok(self.snapshot(id)?.1)
    }

    /// Replace all matches with a freshly generated round-robin.
    pub fn generate_fixtures(&self, id: ChampionshipId) -> Result<Vec<Match>, ServiceError> {
        let (championship, matches) = self.snapshot(id)?;
        let intent = logic::generate_fixtures(&championship, &matches)?;
        self.apply(&intent)?;
        self.matches(id)
    }

    pub fn create_match(&self, id: ChampionshipId, draft: &MatchDraft) -> Result<Match, ServiceError> {
        let championship = self.championship(id)?;
        let venues = self.venues()?;
        let (game, intent) = logic::create_match(&championship, draft, &venues)?;
        self.apply(&intent)?;
        Ok(game)
    }

    pub fn record_score(
        &self,
        id: ChampionshipId,
        match_id: MatchId,
        home: u32,
        away: u32,
    ) -> Result<Match, ServiceError> {
        let (championship, matches) = self.snapshot(id)?;
        let game = Self::find_match(&matches, match_id)?;
        let intent = logic::record_score(&championship, &matches, game, home, away)?;
        self.apply(&intent)?;
        let mut updated = game.clone();
        updated.record_score(home, away);
        Ok(updated)
    }

    pub fn clear_score(&self, id: ChampionshipId, match_id: MatchId) -> Result<Match, ServiceError> {
        let (championship, matches) = self.snapshot(id)?;
        let game = Self::find_match(&matches, match_id)?;
        let intent = logic::clear_score(&championship, &matches, game)?;
        self.apply(&intent)?;
        let mut updated = game.clone();
        updated.clear_score();
        Ok(updated)
    }

    pub fn reschedule_match(
        &self,
        id: ChampionshipId,
        match_id: MatchId,
        match_time: Option<DateTime<Utc>>,
        venue_id: Option<VenueId>,
    ) -> Result<Match, ServiceError> {
        let (championship, matches) = self.snapshot(id)?;
        let game = Self::find_match(&matches, match_id)?;
        let venues = self.venues()?;
        let intent = logic::reschedule_match(&championship, game, match_time, venue_id, &venues)?;
        self.apply(&intent)?;
        let updated = self.matches(id)?;
        Ok(Self::find_match(&updated, match_id)?.clone())
    }

    // Standings and bracket

    pub fn standings(&self, id: ChampionshipId) -> Result<Standings, ServiceError> {
        let (championship, matches) = self.snapshot(id)?;
        Ok(logic::compute_standings(&championship, &matches))
    }

    pub fn standings_csv(&self, id: ChampionshipId) -> Result<String, ServiceError> {
        Ok(logic::standings_csv(&self.standings(id)?)?)
    }

    pub fn group_stage_progress(&self, id: ChampionshipId) -> Result<GroupStageProgress, ServiceError> {
        let (championship, matches) = self.snapshot(id)?;
        Ok(logic::group_stage_progress(&championship, &matches))
    }

    pub fn bracket(&self, id: ChampionshipId) -> Result<Vec<BracketRound>, ServiceError> {
        Ok(logic::bracket_rounds(&self.matches(id)?))
    }

    /// Seed the first knockout round from the group tables. Returns its matches.
    pub fn generate_knockout<R: Rng + ?Sized>(
        &self,
        id: ChampionshipId,
        pairing: Pairing,
        rng: &mut R,
    ) -> Result<Vec<Match>, ServiceError> {
        let (championship, matches) = self.snapshot(id)?;
        let intent = logic::generate_knockout(&championship, &matches, pairing, rng)?;
        self.apply(&intent)?;
        let matches = self.matches(id)?;
        let stage = logic::current_round(&matches).ok_or(BracketError::NoKnockoutRound)?;
        Ok(logic::round_matches(&matches, stage).into_iter().cloned().collect())
    }

    /// Advance the latest knockout round, or finish the championship after the final.
    pub fn advance_knockout(&self, id: ChampionshipId) -> Result<Advancement, ServiceError> {
        let (championship, matches) = self.snapshot(id)?;
        let advancement = logic::advance_knockout(&championship, &matches)?;
        self.apply(advancement.intent())?;
        Ok(advancement)
    }

    /// Crown the league champion chosen by the caller.
    pub fn declare_champion(&self, id: ChampionshipId, team_id: TeamId) -> Result<Championship, ServiceError> {
        let (championship, matches) = self.snapshot(id)?;
        let intent = logic::declare_league_champion(&championship, &matches, team_id)?;
        self.apply(&intent)?;
        self.championship(id)
    }
}
