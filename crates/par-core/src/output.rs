//! Fixed-column CSV output consumed by the PAR backtester.
//!
//! Column order is a contract with the backtester and must not change.

use std::io::Write;

use csv::Writer;

use crate::error::AppError;
use crate::models::{JoinedRow, TeamStanding};

/// Header of the player metrics CSV.
pub const PLAYER_METRICS_HEADER: [&str; 15] = [
    "season",
    "from_league",
    "dest_league",
    "player",
    "team",
    "position",
    "age",
    "minutes",
    "goals",
    "assists",
    "shots",
    "shots_on_target",
    "xg",
    "npxg",
    "xa",
];

/// Header of the team standings CSV.
pub const STANDINGS_HEADER: [&str; 5] = ["season", "team_id", "points", "rank", "goal_diff"];

pub fn write_player_header<W: Write>(w: &mut Writer<W>) -> Result<(), AppError> {
    w.write_record(PLAYER_METRICS_HEADER)?;
    Ok(())
}

/// Write joined rows and flush. Missing shooting metrics become empty cells.
pub fn write_player_rows<W: Write>(
    w: &mut Writer<W>,
    rows: &[JoinedRow],
) -> Result<usize, AppError> {
    for row in rows {
        w.write_record([
            row.season.clone(),
            row.from_league.clone(),
            row.dest_league.clone(),
            row.player.clone(),
            row.team.clone(),
            row.position.clone(),
            row.age.clone(),
            row.minutes.to_string(),
            row.goals.to_string(),
            row.assists.to_string(),
            optional(row.shots),
            optional(row.shots_on_target),
            optional(row.xg),
            optional(row.npxg),
            optional(row.xa),
        ])?;
    }
    w.flush()?;
    Ok(rows.len())
}

pub fn write_standings_header<W: Write>(w: &mut Writer<W>) -> Result<(), AppError> {
    w.write_record(STANDINGS_HEADER)?;
    Ok(())
}

pub fn write_standings_rows<W: Write>(
    w: &mut Writer<W>,
    rows: &[TeamStanding],
) -> Result<usize, AppError> {
    for row in rows {
        w.write_record([
            row.season.clone(),
            row.team_id.to_string(),
            row.points.to_string(),
            row.rank.to_string(),
            row.goal_diff.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(rows.len())
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
