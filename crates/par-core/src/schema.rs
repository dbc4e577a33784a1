//! Required column sets for FBref player tables and ordered schema fallback.
//!
//! A [`ColumnSet`] names the columns a caller needs from a table: each
//! [`Column`] pairs a canonical output key with the header label it is
//! expected under. Column labels drift between seasons (FBref renamed
//! `xA` to `xAG`), so callers pass an ordered list of candidate sets to
//! [`parse_with_fallback`] and the first set that parses wins.

use crate::error::AppError;
use crate::models::{PlayerRow, TableFragment};
use crate::traits::TableReader;

/// Table id of the FBref standard stats table.
pub const STANDARD_TABLE_ID: &str = "stats_standard";

/// Table id of the FBref shooting stats table.
pub const SHOOTING_TABLE_ID: &str = "stats_shooting";

/// How a column's cells are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
}

/// A required column: canonical key plus the header label it appears under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub header: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn text(key: &'static str, header: &'static str) -> Self {
        Self {
            key,
            header,
            kind: ColumnKind::Text,
        }
    }

    pub const fn numeric(key: &'static str, header: &'static str) -> Self {
        Self {
            key,
            header,
            kind: ColumnKind::Numeric,
        }
    }
}

/// Ordered list of required columns.
///
/// Every set must contain the `player` and `team` identity columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    pub name: &'static str,
    pub columns: Vec<Column>,
}

impl ColumnSet {
    pub fn standard() -> Self {
        Self {
            name: "standard",
            columns: vec![
                Column::text("player", "Player"),
                Column::text("team", "Squad"),
                Column::text("position", "Pos"),
                Column::text("age", "Age"),
                Column::numeric("minutes", "Min"),
                Column::numeric("goals", "Gls"),
                Column::numeric("assists", "Ast"),
            ],
        }
    }

    pub fn shooting() -> Self {
        Self {
            name: "shooting",
            columns: Self::shooting_columns("xA"),
        }
    }

    /// Shooting set for seasons where expected assists is labelled `xAG`.
    pub fn shooting_xag() -> Self {
        Self {
            name: "shooting (xAG)",
            columns: Self::shooting_columns("xAG"),
        }
    }

    fn shooting_columns(xa_header: &'static str) -> Vec<Column> {
        vec![
            Column::text("player", "Player"),
            Column::text("team", "Squad"),
            Column::numeric("shots", "Sh"),
            Column::numeric("shots_on_target", "SoT"),
            Column::numeric("xg", "xG"),
            Column::numeric("npxg", "npxG"),
            Column::numeric("xa", xa_header),
        ]
    }

    /// Candidate sets tried, in order, for the standard table.
    pub fn standard_candidates() -> Vec<Self> {
        vec![Self::standard()]
    }

    /// Candidate sets tried, in order, for the shooting table.
    pub fn shooting_candidates() -> Vec<Self> {
        vec![Self::shooting(), Self::shooting_xag()]
    }
}

/// Parse `fragment` against each candidate set in order.
///
/// Returns the rows from the first set that parses together with that
/// set's name. Failures of earlier candidates are discarded; if every
/// candidate fails the result is one `SchemaMismatch` naming all attempts.
pub fn parse_with_fallback<T: TableReader>(
    reader: &T,
    fragment: &TableFragment,
    candidates: &[ColumnSet],
) -> Result<(Vec<PlayerRow>, &'static str), AppError> {
    let mut attempts = Vec::with_capacity(candidates.len());

    for set in candidates {
        match reader.parse(fragment, set) {
            Ok(rows) => {
                if !attempts.is_empty() {
                    tracing::debug!(
                        table = %fragment.table_id,
                        column_set = set.name,
                        "Parsed with fallback column set"
                    );
                }
                return Ok((rows, set.name));
            }
            Err(e) => {
                tracing::debug!(
                    table = %fragment.table_id,
                    column_set = set.name,
                    error = %e,
                    "Column set did not match"
                );
                attempts.push(format!("[{}] {}", set.name, e));
            }
        }
    }

    Err(AppError::SchemaMismatch(format!(
        "table {} matched none of {} column sets: {}",
        fragment.table_id,
        candidates.len(),
        attempts.join("; ")
    )))
}
