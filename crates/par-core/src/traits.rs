use std::future::Future;

use crate::error::AppError;
use crate::models::{FetchRequest, FetchResult, PlayerRow, TableFragment};
use crate::schema::ColumnSet;

/// Issues one HTTP request and returns the raw status and body.
///
/// Non-2xx statuses are returned as `Ok`; only transport failures,
/// timeouts and oversized bodies are errors.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<FetchResult, AppError>> + Send;
}

/// Locates stats tables in HTML documents and parses them into player rows.
pub trait TableReader: Send + Sync + Clone {
    /// Find the table whose id equals `table_id`, including tables hidden
    /// inside HTML comments. The first match in document order wins.
    fn extract(&self, html: &str, table_id: &str) -> Result<TableFragment, AppError>;

    /// Parse data rows against a required column set.
    fn parse(&self, fragment: &TableFragment, columns: &ColumnSet)
    -> Result<Vec<PlayerRow>, AppError>;
}
