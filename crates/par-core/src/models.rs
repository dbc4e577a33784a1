use std::collections::BTreeMap;

use crate::error::AppError;

/// An outbound HTTP request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    /// A plain GET with no extra headers.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Raw response: status code plus a body no larger than the fetcher's cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResult {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Map a throttling status to `RateLimited` and any other non-2xx to `BadStatus`.
    pub fn ensure_success(&self, url: &str) -> Result<(), AppError> {
        match self.status {
            s if (200..300).contains(&s) => Ok(()),
            429 => Err(AppError::RateLimited {
                status: self.status,
                url: url.to_string(),
            }),
            status => Err(AppError::BadStatus {
                status,
                url: url.to_string(),
            }),
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Outer markup of exactly one `<table>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFragment {
    pub table_id: String,
    pub html: String,
}

/// A parsed table cell: trimmed text plus its numeric reading, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct CellValue {
    pub raw: String,
    pub number: Option<f64>,
}

impl CellValue {
    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            number: None,
        }
    }

    pub fn numeric(raw: impl Into<String>, number: f64) -> Self {
        Self {
            raw: raw.into(),
            number: Some(number),
        }
    }
}

/// One player's row from a stats table, keyed by normalized column key.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRow {
    pub player: String,
    pub team: String,
    pub season: String,
    pub values: BTreeMap<String, CellValue>,
}

impl PlayerRow {
    pub fn new(player: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            team: team.into(),
            season: String::new(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, key: &str, value: CellValue) -> Self {
        self.values.insert(normalize_label(key), value);
        self
    }

    pub fn with_season(mut self, season: &str) -> Self {
        self.season = season.to_string();
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.values.get(&normalize_label(key))
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.number)
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.get(key).map(|v| v.raw.as_str())
    }

    /// Composite key used to match rows across tables.
    pub fn identity_key(&self) -> String {
        identity_key(&self.player, &self.team)
    }
}

/// One output record: standard metrics merged with shooting metrics.
///
/// Shooting metrics are `None` when the player had no shooting-table row.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub season: String,
    pub from_league: String,
    pub dest_league: String,
    pub player: String,
    pub team: String,
    pub position: String,
    pub age: String,
    pub minutes: f64,
    pub goals: f64,
    pub assists: f64,
    pub shots: Option<f64>,
    pub shots_on_target: Option<f64>,
    pub xg: Option<f64>,
    pub npxg: Option<f64>,
    pub xa: Option<f64>,
}

/// One team's final league position for a season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamStanding {
    pub season: String,
    pub team_id: i64,
    pub points: i64,
    pub rank: i64,
    pub goal_diff: i64,
}

/// Lowercase, trim and collapse internal whitespace.
pub fn normalize_label(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalized `player|team` key.
pub fn identity_key(player: &str, team: &str) -> String {
    format!("{}|{}", normalize_label(player), normalize_label(team))
}

/// `2020` -> `2020/21`.
pub fn season_label(start_year: u16) -> String {
    format!("{}/{:02}", start_year, (start_year + 1) % 100)
}
