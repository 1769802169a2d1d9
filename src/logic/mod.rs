//! Championship business logic: setup, fixtures, results, standings and the bracket.

mod bracket;
mod export;
mod fixtures;
mod results;
mod setup;
mod standings;

pub use bracket::{
    advance_knockout, bracket_rounds, current_round, declare_league_champion,
    expected_group_matches, generate_knockout, group_placements, group_stage_progress,
    is_group_stage_finished, knockout_pairings, qualifiers, round_matches, round_winners,
    Advancement, BracketRound, GroupPlacement, GroupStageProgress, Pairing, Placements,
};
pub use export::{standings_csv, ExportError};
pub use fixtures::{assign_groups, build_fixtures, generate_fixtures, group_label, round_robin};
pub use results::{
    clear_score, create_match, ensure_result_editable, record_score, reschedule_match, MatchDraft,
};
pub use setup::{create_championship, delete_championship, edit_championship, ChampionshipDraft};
pub use standings::{compute_standings, compute_table, Standings, TeamStanding, LEAGUE_TABLE};
