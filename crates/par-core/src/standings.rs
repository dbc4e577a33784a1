use serde::Deserialize;

use crate::error::AppError;
use crate::models::{FetchRequest, TeamStanding, season_label};
use crate::season::SeasonFailure;
use crate::traits::Fetcher;

/// Header carrying the football-data.org API token.
pub const AUTH_HEADER: &str = "X-Auth-Token";

// ---- football-data.org v4 standings payload ----

#[derive(Debug, Clone, Deserialize)]
pub struct StandingsResponse {
    #[serde(default)]
    pub season: Option<SeasonField>,
    #[serde(default)]
    pub competition: Option<Competition>,
    pub standings: Vec<Standing>,
}

/// `season` is a bare start year in older payloads and an object in v4.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SeasonField {
    Year(i64),
    Info {
        #[serde(rename = "startDate", default)]
        start_date: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Competition {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Standing {
    #[serde(rename = "type")]
    pub kind: String,
    pub table: Vec<TableRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableRow {
    pub team: Team,
    pub position: i64,
    pub points: i64,
    #[serde(rename = "goalDifference")]
    pub goal_difference: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tla: Option<String>,
}

/// The authoritative league table: the first entry whose type is `TOTAL`
/// (case-insensitive). Home/away splits are skipped.
pub fn select_total_table(standings: &[Standing]) -> Result<&Standing, AppError> {
    standings
        .iter()
        .find(|s| s.kind.eq_ignore_ascii_case("TOTAL"))
        .ok_or_else(|| {
            let kinds: Vec<_> = standings.iter().map(|s| s.kind.as_str()).collect();
            AppError::ExtractionError(format!(
                "no TOTAL table in standings (found: [{}])",
                kinds.join(", ")
            ))
        })
}

/// Decode a standings payload and flatten its TOTAL table.
pub fn parse_standings(body: &[u8], season: &str) -> Result<Vec<TeamStanding>, AppError> {
    let response: StandingsResponse = serde_json::from_slice(body)?;
    let table = select_total_table(&response.standings)?;
    Ok(table
        .table
        .iter()
        .map(|row| TeamStanding {
            season: season.to_string(),
            team_id: row.team.id,
            points: row.points,
            rank: row.position,
            goal_diff: row.goal_difference,
        })
        .collect())
}

/// Fetches final standings per season from football-data.org.
pub struct StandingsService<F: Fetcher> {
    fetcher: F,
    api_base: String,
    api_key: String,
    competition: String,
}

impl<F: Fetcher> StandingsService<F> {
    pub fn new(
        fetcher: F,
        api_base: &str,
        api_key: impl Into<String>,
        competition: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            competition: competition.into(),
        }
    }

    pub fn url(&self, start_year: u16) -> String {
        format!(
            "{}/competitions/{}/standings?season={}",
            self.api_base, self.competition, start_year
        )
    }

    pub async fn fetch_season(&self, start_year: u16) -> Result<Vec<TeamStanding>, SeasonFailure> {
        let season = season_label(start_year);
        let url = self.url(start_year);
        let fail = |e: AppError| SeasonFailure::new(season.clone(), Some(url.as_str()), e);

        tracing::info!("Fetching {}", url);
        let request = FetchRequest::get(url.as_str()).with_header(AUTH_HEADER, self.api_key.as_str());
        let result = self.fetcher.fetch(&request).await.map_err(fail)?;
        result.ensure_success(&url).map_err(fail)?;

        let rows = parse_standings(&result.body, &season).map_err(fail)?;
        tracing::info!(%season, teams = rows.len(), "Parsed standings");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FetchResult;
    use crate::testutil::MockFetcher;

    fn payload() -> serde_json::Value {
        serde_json::json!({
            "competition": {"code": "PL"},
            "season": {"startDate": "2020-09-12"},
            "standings": [
                {
                    "type": "HOME",
                    "table": [
                        {"team": {"id": 57, "name": "Arsenal FC", "tla": "ARS"},
                         "position": 1, "points": 30, "goalDifference": 12}
                    ]
                },
                {
                    "type": "total",
                    "table": [
                        {"team": {"id": 65, "name": "Manchester City FC", "tla": "MCI"},
                         "position": 1, "points": 86, "goalDifference": 51},
                        {"team": {"id": 57, "name": "Arsenal FC", "tla": "ARS"},
                         "position": 8, "points": 61, "goalDifference": 16}
                    ]
                }
            ]
        })
    }

    #[test]
    fn selects_total_table_even_when_second() {
        let response: StandingsResponse = serde_json::from_value(payload()).unwrap();
        let table = select_total_table(&response.standings).unwrap();
        assert!(table.kind.eq_ignore_ascii_case("TOTAL"));
        assert_eq!(table.table.len(), 2);
        assert_eq!(table.table[0].team.id, 65);
    }

    #[test]
    fn accepts_integer_season_field() {
        let response: StandingsResponse = serde_json::from_value(serde_json::json!({
            "season": 2020,
            "standings": [{"type": "TOTAL", "table": []}]
        }))
        .unwrap();
        assert!(matches!(response.season, Some(SeasonField::Year(2020))));
    }

    #[test]
    fn missing_total_table_is_an_error() {
        let response: StandingsResponse = serde_json::from_value(serde_json::json!({
            "standings": [{"type": "HOME", "table": []}, {"type": "AWAY", "table": []}]
        }))
        .unwrap();
        let err = select_total_table(&response.standings).unwrap_err();
        assert!(matches!(err, AppError::ExtractionError(msg) if msg.contains("HOME, AWAY")));
    }

    #[test]
    fn parse_standings_flattens_rows() {
        let body = payload().to_string();
        let rows = parse_standings(body.as_bytes(), "2020/21").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1],
            TeamStanding {
                season: "2020/21".into(),
                team_id: 57,
                points: 61,
                rank: 8,
                goal_diff: 16,
            }
        );
    }

    #[test]
    fn invalid_json_is_serialization_error() {
        let err = parse_standings(b"<html>oops</html>", "2020/21").unwrap_err();
        assert!(matches!(err, AppError::SerializationError(_)));
    }

    #[tokio::test]
    async fn service_sends_token_header_and_builds_url() {
        let body = payload().to_string();
        let fetcher = MockFetcher::with_responses(vec![Ok(FetchResult::new(200, body))]);
        let svc = StandingsService::new(fetcher.clone(), "https://api.football-data.org/v4/", "secret", "PL");

        let rows = svc.fetch_season(2020).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].season, "2020/21");

        let requests = fetcher.requests();
        assert_eq!(
            requests[0].url,
            "https://api.football-data.org/v4/competitions/PL/standings?season=2020"
        );
        assert_eq!(
            requests[0].headers,
            vec![(AUTH_HEADER.to_string(), "secret".to_string())]
        );
    }

    #[tokio::test]
    async fn service_maps_forbidden_to_bad_status() {
        let fetcher = MockFetcher::with_responses(vec![Ok(FetchResult::new(403, "{}"))]);
        let svc = StandingsService::new(fetcher, "https://api.football-data.org/v4", "k", "PL");

        let failure = svc.fetch_season(2021).await.unwrap_err();
        assert_eq!(failure.season, "2021/22");
        assert!(matches!(failure.error, AppError::BadStatus { status: 403, .. }));
    }
}
