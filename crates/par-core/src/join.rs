use std::collections::HashMap;

use crate::error::AppError;
use crate::models::{JoinedRow, PlayerRow};

/// Merge standard and shooting rows for one season by player identity.
///
/// Output follows the standard table's order, one row per standard row.
/// A standard row without a shooting match keeps all shooting metrics as
/// `None`. Shooting rows without a standard match are ignored. Duplicate
/// identity keys on either side are a `JoinAmbiguity` error.
pub fn join_standard_shooting(
    season: &str,
    standard: &[PlayerRow],
    shooting: &[PlayerRow],
    dest_league: &str,
    from_league: &str,
) -> Result<Vec<JoinedRow>, AppError> {
    let shooting_index = index_unique(shooting)?;
    // Only checked for uniqueness; the output walks `standard` directly.
    let standard_index = index_unique(standard)?;

    let unmatched_shooting = shooting_index
        .keys()
        .filter(|key| !standard_index.contains_key(*key))
        .count();
    if unmatched_shooting > 0 {
        tracing::debug!(
            %season,
            unmatched_shooting,
            "Shooting rows without a standard row were ignored"
        );
    }

    let mut missing_shooting = 0usize;
    let joined = standard
        .iter()
        .map(|std_row| {
            let shot = shooting_index.get(&std_row.identity_key()).copied();
            if shot.is_none() {
                missing_shooting += 1;
            }
            let metric = |key: &str| shot.map(|row| row.number(key).unwrap_or(0.0));

            JoinedRow {
                season: season.to_string(),
                from_league: from_league.to_string(),
                dest_league: dest_league.to_string(),
                player: std_row.player.clone(),
                team: std_row.team.clone(),
                position: std_row.raw("position").unwrap_or_default().to_string(),
                age: std_row.raw("age").unwrap_or_default().to_string(),
                minutes: std_row.number("minutes").unwrap_or(0.0),
                goals: std_row.number("goals").unwrap_or(0.0),
                assists: std_row.number("assists").unwrap_or(0.0),
                shots: metric("shots"),
                shots_on_target: metric("shots_on_target"),
                xg: metric("xg"),
                npxg: metric("npxg"),
                xa: metric("xa"),
            }
        })
        .collect();

    if missing_shooting > 0 {
        tracing::debug!(
            %season,
            missing_shooting,
            "Standard rows without shooting data kept with empty shooting metrics"
        );
    }

    Ok(joined)
}

fn index_unique(rows: &[PlayerRow]) -> Result<HashMap<String, &PlayerRow>, AppError> {
    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        let key = row.identity_key();
        if index.insert(key.clone(), row).is_some() {
            return Err(AppError::JoinAmbiguity(key));
        }
    }
    Ok(index)
}
