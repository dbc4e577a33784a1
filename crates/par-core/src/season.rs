use std::fmt;
use std::future::Future;

use crate::error::AppError;
use crate::join::join_standard_shooting;
use crate::models::{FetchRequest, JoinedRow, season_label};
use crate::schema::{ColumnSet, SHOOTING_TABLE_ID, STANDARD_TABLE_ID, parse_with_fallback};
use crate::traits::{Fetcher, TableReader};

/// The two FBref pages for one season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonTarget {
    pub start_year: u16,
    pub label: String,
    pub standard_url: String,
    pub shooting_url: String,
}

/// A season that could not be produced, with the URL involved if any.
#[derive(Debug)]
pub struct SeasonFailure {
    pub season: String,
    pub url: Option<String>,
    pub error: AppError,
}

impl SeasonFailure {
    pub fn new(season: impl Into<String>, url: Option<&str>, error: AppError) -> Self {
        Self {
            season: season.into(),
            url: url.map(str::to_string),
            error,
        }
    }
}

impl fmt::Display for SeasonFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "season {} ({}): {}", self.season, url, self.error),
            None => write!(f, "season {}: {}", self.season, self.error),
        }
    }
}

impl std::error::Error for SeasonFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Orchestrates one season: fetch both pages, extract, parse with fallback, join.
///
/// Generic over the fetcher and table reader so the pipeline can be tested
/// without network access.
pub struct PlayerMetricsService<F, T>
where
    F: Fetcher,
    T: TableReader,
{
    fetcher: F,
    reader: T,
    dest_league: String,
    from_league: String,
}

impl<F, T> PlayerMetricsService<F, T>
where
    F: Fetcher,
    T: TableReader,
{
    pub fn new(
        fetcher: F,
        reader: T,
        dest_league: impl Into<String>,
        from_league: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            reader,
            dest_league: dest_league.into(),
            from_league: from_league.into(),
        }
    }

    /// Produce the joined rows for one season.
    ///
    /// The standard page is fetched before the shooting page; both requests
    /// go through the same fetcher.
    pub async fn fetch_season(&self, target: &SeasonTarget) -> Result<Vec<JoinedRow>, SeasonFailure> {
        let season = target.label.as_str();
        let fail = |url: &str, e: AppError| SeasonFailure::new(season, Some(url), e);

        let standard_html = self
            .fetch_html(&target.standard_url)
            .await
            .map_err(|e| fail(target.standard_url.as_str(), e))?;
        let shooting_html = self
            .fetch_html(&target.shooting_url)
            .await
            .map_err(|e| fail(target.shooting_url.as_str(), e))?;

        let standard_table = self
            .reader
            .extract(&standard_html, STANDARD_TABLE_ID)
            .map_err(|e| fail(target.standard_url.as_str(), e))?;
        let shooting_table = self
            .reader
            .extract(&shooting_html, SHOOTING_TABLE_ID)
            .map_err(|e| fail(target.shooting_url.as_str(), e))?;

        let (standard_rows, _) = parse_with_fallback(
            &self.reader,
            &standard_table,
            &ColumnSet::standard_candidates(),
        )
        .map_err(|e| fail(target.standard_url.as_str(), e))?;
        let (shooting_rows, shooting_set) = parse_with_fallback(
            &self.reader,
            &shooting_table,
            &ColumnSet::shooting_candidates(),
        )
        .map_err(|e| fail(target.shooting_url.as_str(), e))?;

        let standard_rows: Vec<_> = standard_rows
            .into_iter()
            .map(|r| r.with_season(season))
            .collect();
        let shooting_rows: Vec<_> = shooting_rows
            .into_iter()
            .map(|r| r.with_season(season))
            .collect();

        tracing::info!(
            %season,
            standard = standard_rows.len(),
            shooting = shooting_rows.len(),
            column_set = shooting_set,
            "Parsed player tables"
        );

        join_standard_shooting(
            season,
            &standard_rows,
            &shooting_rows,
            &self.dest_league,
            &self.from_league,
        )
        .map_err(|e| SeasonFailure::new(season, None, e))
    }

    async fn fetch_html(&self, url: &str) -> Result<String, AppError> {
        tracing::info!("Fetching {}", url);
        let result = self.fetcher.fetch(&FetchRequest::get(url)).await?;
        result.ensure_success(url)?;
        tracing::info!("Fetched {} bytes of HTML", result.body.len());
        Ok(result.text())
    }
}

/// Events emitted while running a multi-season job.
#[derive(Debug)]
pub enum RunEvent<'a> {
    SeasonStarted { season: &'a str },
    SeasonCompleted { season: &'a str, rows: usize },
    SeasonFailed { failure: &'a SeasonFailure, aborting: bool },
    Finished { summary: &'a RunSummary },
}

/// Receives run events (decoupled logging).
pub trait RunReporter: Send + Sync {
    fn report(&self, event: RunEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunReporter;

impl RunReporter for TracingRunReporter {
    fn report(&self, event: RunEvent<'_>) {
        match event {
            RunEvent::SeasonStarted { season } => {
                tracing::info!(%season, "Season started");
            }
            RunEvent::SeasonCompleted { season, rows } => {
                tracing::info!(%season, rows, "Season written");
            }
            RunEvent::SeasonFailed { failure, aborting } => {
                tracing::error!(
                    season = %failure.season,
                    url = failure.url.as_deref().unwrap_or("-"),
                    error = %failure.error,
                    transient = failure.error.is_transient(),
                    aborting,
                    "Season failed"
                );
            }
            RunEvent::Finished { summary } => {
                tracing::info!(
                    succeeded = summary.completed.len(),
                    failed = summary.failures.len(),
                    rows = summary.total_rows(),
                    aborted = summary.aborted,
                    "Run finished"
                );
            }
        }
    }
}

/// One season that was written successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonReport {
    pub season: String,
    pub rows: usize,
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: Vec<SeasonReport>,
    pub failures: Vec<SeasonFailure>,
    /// True if the run stopped before processing every season.
    pub aborted: bool,
}

impl RunSummary {
    pub fn total_rows(&self) -> usize {
        self.completed.iter().map(|s| s.rows).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.aborted
    }
}

/// Runs seasons strictly one after another.
///
/// A failed season is recorded and the run moves on, unless the error is
/// run-fatal ([`AppError::aborts_run`]) or `fail_fast` is set.
pub struct SeasonRunner<'a, R: RunReporter> {
    reporter: &'a R,
    fail_fast: bool,
}

impl<'a, R: RunReporter> SeasonRunner<'a, R> {
    pub fn new(reporter: &'a R, fail_fast: bool) -> Self {
        Self {
            reporter,
            fail_fast,
        }
    }

    /// For each year, await `produce` then hand its rows to `sink`.
    ///
    /// `sink` errors are attributed to the season being written.
    pub async fn run<Row, P, Fut, S>(&self, years: &[u16], produce: P, mut sink: S) -> RunSummary
    where
        P: Fn(u16) -> Fut,
        Fut: Future<Output = Result<Vec<Row>, SeasonFailure>>,
        S: FnMut(&[Row]) -> Result<usize, AppError>,
    {
        let mut summary = RunSummary::default();

        for &year in years {
            let label = season_label(year);
            self.reporter.report(RunEvent::SeasonStarted { season: &label });

            let outcome = match produce(year).await {
                Ok(rows) => sink(&rows).map_err(|e| SeasonFailure::new(label.clone(), None, e)),
                Err(failure) => Err(failure),
            };

            match outcome {
                Ok(rows) => {
                    self.reporter.report(RunEvent::SeasonCompleted {
                        season: &label,
                        rows,
                    });
                    summary.completed.push(SeasonReport {
                        season: label,
                        rows,
                    });
                }
                Err(failure) => {
                    let aborting = self.fail_fast || failure.error.aborts_run();
                    self.reporter.report(RunEvent::SeasonFailed {
                        failure: &failure,
                        aborting,
                    });
                    summary.failures.push(failure);
                    if aborting {
                        summary.aborted = true;
                        break;
                    }
                }
            }
        }

        self.reporter.report(RunEvent::Finished { summary: &summary });
        summary
    }
}
