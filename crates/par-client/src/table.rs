//! FBref stats table extraction and row parsing using scraper.
//!
//! FBref ships most secondary tables inside HTML comments so they are
//! rendered client-side. [`ScraperTableReader::extract`] strips comment
//! delimiters from the whole document before searching, so a commented-out
//! table is found exactly like a live one.

use par_core::error::AppError;
use par_core::models::{CellValue, PlayerRow, TableFragment, normalize_label};
use par_core::schema::{ColumnKind, ColumnSet};
use par_core::traits::TableReader;
use scraper::{ElementRef, Html, Selector};

/// Row classes FBref uses for repeated headers and separators.
const SKIPPED_ROW_CLASSES: [&str; 3] = ["thead", "over_header", "spacer"];

/// Player-cell labels of aggregate rows.
const TOTAL_ROW_LABELS: [&str; 3] = ["squad total", "opponent total", "player"];

/// Placeholder stored for blank text cells.
const BLANK_TEXT: &str = "-";

/// Raw text stored for blank numeric cells.
const BLANK_NUMBER: &str = "0";

/// Table reader backed by the `scraper` HTML parser.
#[derive(Debug, Clone, Default)]
pub struct ScraperTableReader;

impl ScraperTableReader {
    pub fn new() -> Self {
        Self
    }
}

impl TableReader for ScraperTableReader {
    fn extract(&self, html: &str, table_id: &str) -> Result<TableFragment, AppError> {
        let document = Html::parse_document(&uncomment(html));
        let tables = selector("table")?;

        let mut matches = document
            .select(&tables)
            .filter(|t| t.value().id() == Some(table_id));

        let first = matches.next().ok_or_else(|| {
            AppError::ExtractionError(format!("table '{table_id}' not found in document"))
        })?;
        let extra = matches.count();
        if extra > 0 {
            tracing::debug!(%table_id, extra, "Multiple tables share the id, using the first");
        }

        Ok(TableFragment {
            table_id: table_id.to_string(),
            html: first.html(),
        })
    }

    fn parse(
        &self,
        fragment: &TableFragment,
        columns: &ColumnSet,
    ) -> Result<Vec<PlayerRow>, AppError> {
        let document = Html::parse_fragment(&fragment.html);
        let table = document
            .select(&selector("table")?)
            .next()
            .ok_or_else(|| {
                AppError::ExtractionError(format!("fragment for '{}' has no table", fragment.table_id))
            })?;

        let header = header_labels(table)?;
        let indexes = resolve_columns(&header, columns, &fragment.table_id)?;

        let rows_sel = selector("tbody tr")?;
        let cells_sel = selector("th, td")?;
        let mut rows = Vec::new();
        let mut skipped = 0usize;

        for tr in table.select(&rows_sel) {
            if is_separator_row(tr) {
                continue;
            }
            let cells: Vec<String> = tr.select(&cells_sel).map(cell_text).collect();
            match build_row(&cells, &indexes, columns) {
                Some(row) => rows.push(row),
                None => skipped += 1,
            }
        }

        tracing::debug!(
            table = %fragment.table_id,
            column_set = columns.name,
            rows = rows.len(),
            skipped,
            "Parsed table"
        );
        Ok(rows)
    }
}

/// Remove comment delimiters so commented-out markup is parsed as content.
pub fn uncomment(html: &str) -> String {
    html.replace("<!--", "").replace("-->", "")
}

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css)
        .map_err(|e| AppError::ExtractionError(format!("invalid CSS selector '{css}': {e}")))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    let text: String = cell.text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Match keys for each cell of the last header row: visible text,
/// `aria-label` and `data-stat`, all normalized.
fn header_labels(table: ElementRef<'_>) -> Result<Vec<Vec<String>>, AppError> {
    let header_rows = selector("thead tr")?;
    let cells = selector("th, td")?;

    let Some(last) = table.select(&header_rows).last() else {
        return Ok(Vec::new());
    };

    Ok(last
        .select(&cells)
        .map(|cell| {
            let mut keys = vec![normalize_label(&cell_text(cell))];
            for attr in ["aria-label", "data-stat"] {
                if let Some(v) = cell.value().attr(attr) {
                    keys.push(normalize_label(v));
                }
            }
            keys
        })
        .collect())
}

/// Cell index of every required column, or `SchemaMismatch` naming the
/// headers that could not be found. The first matching header wins.
fn resolve_columns(
    header: &[Vec<String>],
    columns: &ColumnSet,
    table_id: &str,
) -> Result<Vec<usize>, AppError> {
    let mut indexes = Vec::with_capacity(columns.columns.len());
    let mut missing = Vec::new();

    for column in &columns.columns {
        let wanted = normalize_label(column.header);
        match header.iter().position(|keys| keys.contains(&wanted)) {
            Some(i) => indexes.push(i),
            None => missing.push(column.header),
        }
    }

    if missing.is_empty() {
        Ok(indexes)
    } else {
        Err(AppError::SchemaMismatch(format!(
            "table {table_id} is missing column(s) {} for set '{}'",
            missing.join(", "),
            columns.name
        )))
    }
}

fn is_separator_row(tr: ElementRef<'_>) -> bool {
    tr.value()
        .classes()
        .any(|c| SKIPPED_ROW_CLASSES.contains(&c))
}

/// Build one player row, or `None` for totals, blank or non-numeric noise.
fn build_row(cells: &[String], indexes: &[usize], columns: &ColumnSet) -> Option<PlayerRow> {
    let mut player = None;
    let mut team = None;
    let mut values = Vec::with_capacity(indexes.len());

    for (column, &i) in columns.columns.iter().zip(indexes) {
        let raw = cells.get(i)?.as_str();
        match column.key {
            "player" => {
                if raw.is_empty() || TOTAL_ROW_LABELS.contains(&normalize_label(raw).as_str()) {
                    return None;
                }
                player = Some(raw);
            }
            "team" => {
                if raw.is_empty() {
                    return None;
                }
                team = Some(raw);
            }
            _ => {}
        }

        let value = match column.kind {
            ColumnKind::Numeric if raw.is_empty() => CellValue::numeric(BLANK_NUMBER, 0.0),
            ColumnKind::Numeric => CellValue::numeric(raw, parse_number(raw)?),
            ColumnKind::Text if raw.is_empty() => CellValue::text(BLANK_TEXT),
            ColumnKind::Text => CellValue::text(raw),
        };
        values.push((column.key, value));
    }

    let mut row = PlayerRow::new(player?, team?);
    for (key, value) in values {
        row = row.with_value(key, value);
    }
    Some(row)
}

/// `"1,234"` -> 1234.0, blank -> 0.0, anything else non-numeric -> `None`.
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}
