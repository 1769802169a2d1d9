//! Knockout bracket: group-stage readiness, seeding, round advancement and champions.

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::logic::standings::compute_standings;
use crate::models::{
    match_record, BracketError, Championship, ChampionshipStatus, Format, Guard, Intent,
    KnockoutStage, Match, Record, Round, TeamId, TeamRef,
};

/// How group qualifiers are paired for the first knockout round.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pairing {
    /// Group winners meet the runner-up of the next group.
    #[default]
    Standard,
    /// Uniform shuffle of all qualifiers.
    Random,
}

/// Counts behind the group-stage readiness gate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStageProgress {
    /// Matches a complete round-robin in every group needs.
    pub expected: usize,
    /// Group matches that exist.
    pub scheduled: usize,
    /// Group matches with a result.
    pub finished: usize,
}

impl GroupStageProgress {
    pub fn is_finished(&self) -> bool {
        self.scheduled == self.expected && self.finished == self.scheduled
    }
}

/// Σ n·(n−1)/2 · legs over all groups.
pub fn expected_group_matches(championship: &Championship) -> usize {
    let legs = championship.match_type.legs();
    championship
        .groups
        .values()
        .map(|ids| ids.len() * ids.len().saturating_sub(1) / 2 * legs)
        .sum()
}

pub fn group_stage_progress(championship: &Championship, matches: &[Match]) -> GroupStageProgress {
    let group_matches: Vec<&Match> = matches.iter().filter(|m| m.round.is_group()).collect();
    GroupStageProgress {
        expected: expected_group_matches(championship),
        scheduled: group_matches.len(),
        finished: group_matches.iter().filter(|m| m.is_finished()).count(),
    }
}

/// True only when every expected group match exists and has a result.
pub fn is_group_stage_finished(championship: &Championship, matches: &[Match]) -> bool {
    group_stage_progress(championship, matches).is_finished()
}

/// Final top two of one group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPlacement {
    pub label: String,
    pub first: TeamRef,
    pub second: Option<TeamRef>,
}

/// Group winners and runners-up in group-label order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Placements {
    pub groups: Vec<GroupPlacement>,
}

impl Placements {
    pub fn first_places(&self) -> Vec<TeamRef> {
        self.groups.iter().map(|g| g.first.clone()).collect()
    }

    pub fn second_places(&self) -> Vec<TeamRef> {
        self.groups.iter().filter_map(|g| g.second.clone()).collect()
    }

    /// Top two of every group, concatenated in group-label order.
    pub fn qualifiers(&self) -> Vec<TeamRef> {
        self.groups
            .iter()
            .flat_map(|g| std::iter::once(g.first.clone()).chain(g.second.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups
            .iter()
            .map(|g| 1 + usize::from(g.second.is_some()))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn ensure_group_stage_finished(championship: &Championship, matches: &[Match]) -> Result<(), BracketError> {
    if championship.format != Format::GroupKnockout {
        return Err(BracketError::WrongFormat(championship.format));
    }
    let progress = group_stage_progress(championship, matches);
    if !progress.is_finished() {
        return Err(BracketError::GroupStageNotFinished {
            expected: progress.expected,
            scheduled: progress.scheduled,
            finished: progress.finished,
        });
    }
    Ok(())
}

/// First and second place of every group once the group stage is over.
pub fn group_placements(championship: &Championship, matches: &[Match]) -> Result<Placements, BracketError> {
    ensure_group_stage_finished(championship, matches)?;
    let mut placements = Placements::default();
    for (label, table) in compute_standings(championship, matches) {
        let mut top = table.into_iter().map(|row| TeamRef {
            id: row.team_id,
            name: row.name,
        });
        let Some(first) = top.next() else {
            return Err(BracketError::GroupTooSmall(label));
        };
        let second = top.next();
        if second.is_none() {
            debug!("Group {} has a single team; only its winner qualifies", label);
        }
        placements.groups.push(GroupPlacement { label, first, second });
    }
    Ok(placements)
}

/// Qualified teams, top two per group in group-label order.
pub fn qualifiers(championship: &Championship, matches: &[Match]) -> Result<Vec<TeamRef>, BracketError> {
    Ok(group_placements(championship, matches)?.qualifiers())
}

/// First-round pairings `(home, away)` for the bracket.
pub fn knockout_pairings<R: Rng + ?Sized>(
    championship: &Championship,
    matches: &[Match],
    pairing: Pairing,
    rng: &mut R,
) -> Result<Vec<(TeamRef, TeamRef)>, BracketError> {
    let placements = group_placements(championship, matches)?;
    if KnockoutStage::for_entrants(placements.len()).is_none() {
        return Err(BracketError::UnsupportedBracketSize(placements.len()));
    }

    match pairing {
        Pairing::Standard => {
            if let Some(short) = placements.groups.iter().find(|g| g.second.is_none()) {
                return Err(BracketError::GroupTooSmall(short.label.clone()));
            }
            let first = placements.first_places();
            let second = placements.second_places();
            let groups = first.len();
            Ok((0..groups)
                .map(|i| (first[i].clone(), second[(i + 1) % groups].clone()))
                .collect())
        }
        Pairing::Random => {
            let mut teams = placements.qualifiers();
            teams.shuffle(rng);
            Ok(teams
                .chunks_exact(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect())
        }
    }
}

/// Build the first knockout round and move the championship to `knockout`.
pub fn generate_knockout<R: Rng + ?Sized>(
    championship: &Championship,
    matches: &[Match],
    pairing: Pairing,
    rng: &mut R,
) -> Result<Intent, BracketError> {
    if championship.format != Format::GroupKnockout {
        return Err(BracketError::WrongFormat(championship.format));
    }
    if championship.status != ChampionshipStatus::GroupStage {
        return Err(BracketError::InvalidState(championship.status));
    }

    let pairs = knockout_pairings(championship, matches, pairing, rng)?;
    let stage = KnockoutStage::for_entrants(pairs.len() * 2)
        .ok_or(BracketError::UnsupportedBracketSize(pairs.len() * 2))?;

    let mut updated = championship.clone();
    updated.transition(ChampionshipStatus::Knockout)?;

    let mut intent = Intent::new()
        .guard(Guard::ChampionshipStatus {
            championship_id: championship.id,
            status: ChampionshipStatus::GroupStage,
        })
        .guard(Guard::RoundEmpty {
            championship_id: championship.id,
            round: Round::Knockout(stage),
        });
    for (index, (home, away)) in (0u32..).zip(pairs) {
        let game = Match::knockout(home, away, stage, index)?;
        intent = intent.create(match_record(championship.id, game));
    }
    intent = intent.update(Record::Championship(updated));

    info!(
        "Championship {}: {:?} pairing, {} with {} matches",
        championship.id,
        pairing,
        stage,
        intent.created()
    );
    Ok(intent)
}

/// Latest knockout stage that has matches.
pub fn current_round(matches: &[Match]) -> Option<KnockoutStage> {
    matches.iter().filter_map(|m| m.round.knockout_stage()).max()
}

/// Matches of `stage` in `knockoutIndex` order.
pub fn round_matches(matches: &[Match], stage: KnockoutStage) -> Vec<&Match> {
    let mut round: Vec<&Match> = matches
        .iter()
        .filter(|m| m.round.knockout_stage() == Some(stage))
        .collect();
    round.sort_by_key(|m| m.knockout_index);
    round
}

/// Winners of a round in `knockoutIndex` order.
///
/// Fails while any match is unfinished, and on any drawn match since knockout draws
/// have no resolution rule.
pub fn round_winners(matches: &[Match], stage: KnockoutStage) -> Result<Vec<TeamRef>, BracketError> {
    let round = round_matches(matches, stage);
    if round.iter().any(|m| !m.is_finished()) {
        return Err(BracketError::RoundNotComplete(stage));
    }
    round
        .into_iter()
        .map(|m| m.winner().cloned().ok_or(BracketError::DrawUnsupported(m.id)))
        .collect()
}

/// Outcome of advancing a completed knockout round.
#[derive(Clone, Debug, PartialEq)]
pub enum Advancement {
    /// Next round generated.
    NextRound { stage: KnockoutStage, intent: Intent },
    /// The final is decided; the intent finishes the championship.
    Champion { champion: TeamRef, intent: Intent },
}

impl Advancement {
    pub fn intent(&self) -> &Intent {
        match self {
            Advancement::NextRound { intent, .. } | Advancement::Champion { intent, .. } => intent,
        }
    }
}

/// Advance the latest knockout round: pair its winners into the next round, or
/// declare the champion when one winner is left.
///
/// Calling this again before the new round is played returns `RoundNotComplete`, so
/// advancement never duplicates matches.
pub fn advance_knockout(championship: &Championship, matches: &[Match]) -> Result<Advancement, BracketError> {
    if championship.status != ChampionshipStatus::Knockout {
        return Err(BracketError::InvalidState(championship.status));
    }
    let stage = current_round(matches).ok_or(BracketError::NoKnockoutRound)?;
    let winners = round_winners(matches, stage)?;
    let status_guard = Guard::ChampionshipStatus {
        championship_id: championship.id,
        status: ChampionshipStatus::Knockout,
    };

    if let [champion] = winners.as_slice() {
        let mut updated = championship.clone();
        updated.declare_champion(champion)?;
        info!("Championship {} won by {}", championship.id, champion.name);
        return Ok(Advancement::Champion {
            champion: champion.clone(),
            intent: Intent::new()
                .guard(status_guard)
                .update(Record::Championship(updated)),
        });
    }

    let next = KnockoutStage::for_entrants(winners.len())
        .ok_or(BracketError::UnsupportedBracketSize(winners.len()))?;
    let mut intent = Intent::new().guard(status_guard).guard(Guard::RoundEmpty {
        championship_id: championship.id,
        round: Round::Knockout(next),
    });
    for (index, pair) in (0u32..).zip(winners.chunks_exact(2)) {
        let game = Match::knockout(pair[0].clone(), pair[1].clone(), next, index)?;
        intent = intent.create(match_record(championship.id, game));
    }
    info!(
        "Championship {}: {} complete, {} generated",
        championship.id, stage, next
    );
    Ok(Advancement::NextRound { stage: next, intent })
}

/// Manually crown a league champion once every match is finished.
pub fn declare_league_champion(
    championship: &Championship,
    matches: &[Match],
    team_id: TeamId,
) -> Result<Intent, BracketError> {
    if championship.format != Format::League {
        return Err(BracketError::WrongFormat(championship.format));
    }
    if championship.status != ChampionshipStatus::Active {
        return Err(BracketError::InvalidState(championship.status));
    }
    if matches.is_empty() {
        return Err(BracketError::NoMatches);
    }
    let pending = matches.iter().filter(|m| !m.is_finished()).count();
    if pending > 0 {
        return Err(BracketError::MatchesPending { pending });
    }
    let champion = championship
        .team(team_id)
        .cloned()
        .ok_or(BracketError::TeamNotInChampionship(team_id))?;

    let mut updated = championship.clone();
    updated.declare_champion(&champion)?;
    info!("League {} won by {}", championship.id, champion.name);
    Ok(Intent::new()
        .guard(Guard::ChampionshipStatus {
            championship_id: championship.id,
            status: ChampionshipStatus::Active,
        })
        .update(Record::Championship(updated)))
}

/// One knockout round for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketRound {
    pub stage: KnockoutStage,
    pub name: &'static str,
    pub matches: Vec<Match>,
}

/// Knockout rounds generated so far, widest first.
pub fn bracket_rounds(matches: &[Match]) -> Vec<BracketRound> {
    [
        KnockoutStage::QuarterFinal,
        KnockoutStage::SemiFinal,
        KnockoutStage::Final,
    ]
    .into_iter()
    .filter_map(|stage| {
        let round: Vec<Match> = round_matches(matches, stage).into_iter().cloned().collect();
        (!round.is_empty()).then(|| BracketRound {
            stage,
            name: stage.name(),
            matches: round,
        })
    })
    .collect()
}
