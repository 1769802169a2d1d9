//! CSV export of standings tables.

use serde::Serialize;
use thiserror::Error;

use crate::logic::standings::Standings;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV buffer error: {0}")]
    Buffer(String),
    #[error("CSV output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Serialize)]
struct CsvRow<'a> {
    group: &'a str,
    position: usize,
    team: &'a str,
    played: u32,
    wins: u32,
    draws: u32,
    losses: u32,
    goals_for: u32,
    goals_against: u32,
    goal_difference: i64,
    points: u32,
}

/// Every table as CSV, one row per team, tables in label order.
pub fn standings_csv(standings: &Standings) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (group, table) in standings {
        for (i, row) in table.iter().enumerate() {
            writer.serialize(CsvRow {
                group,
                position: i + 1,
                team: &row.name,
                played: row.played,
                wins: row.wins,
                draws: row.draws,
                losses: row.losses,
                goals_for: row.goals_for,
                goals_against: row.goals_against,
                goal_difference: row.goal_difference,
                points: row.points,
            })?;
        }
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
