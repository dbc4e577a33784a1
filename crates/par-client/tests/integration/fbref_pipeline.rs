use par_client::{FbrefCompetition, ScraperTableReader};
use par_core::error::AppError;
use par_core::models::FetchResult;
use par_core::output::{write_player_header, write_player_rows};
use par_core::testutil::{MockFetcher, MockRunReporter};
use par_core::{PlayerMetricsService, SeasonRunner};

const STANDARD_2020: &str = include_str!("../fixtures/standard_2020.html");
const SHOOTING_2020: &str = include_str!("../fixtures/shooting_2020.html");

const HEADER: &str = "season,from_league,dest_league,player,team,position,age,minutes,goals,assists,shots,shots_on_target,xg,npxg,xa";

fn season_pages() -> Vec<Result<FetchResult, AppError>> {
    vec![
        Ok(FetchResult::new(200, STANDARD_2020)),
        Ok(FetchResult::new(200, SHOOTING_2020)),
    ]
}

fn csv_text(writer: csv::Writer<Vec<u8>>) -> String {
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}

#[tokio::test]
async fn joins_live_standard_with_commented_shooting_table() {
    let fetcher = MockFetcher::with_responses(season_pages());
    let service = PlayerMetricsService::new(fetcher.clone(), ScraperTableReader::new(), "EPL", "EPL");
    let comp = FbrefCompetition::default();

    let rows = service.fetch_season(&comp.target(2020)).await.unwrap();
    assert_eq!(rows.len(), 2);

    let a = &rows[0];
    assert_eq!(a.season, "2020/21");
    assert_eq!(a.player, "Player A");
    assert_eq!(a.team, "Arsenal");
    assert_eq!(a.minutes, 90.0);
    assert_eq!(a.shots, Some(3.0));
    assert_eq!(a.xg, Some(0.8));
    // Only the xAG header exists; the fallback set maps it to xa.
    assert_eq!(a.xa, Some(0.1));

    let b = &rows[1];
    assert_eq!(b.player, "Player B");
    assert_eq!(b.position, "MF,FW");
    assert_eq!(b.xg, None);

    let urls: Vec<_> = fetcher.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, vec![comp.standard_url(2020), comp.shooting_url(2020)]);
}

#[tokio::test]
async fn writes_expected_csv_for_one_season() {
    let service = PlayerMetricsService::new(
        MockFetcher::with_responses(season_pages()),
        ScraperTableReader::new(),
        "EPL",
        "EPL",
    );
    let rows = service
        .fetch_season(&FbrefCompetition::default().target(2020))
        .await
        .unwrap();

    let mut writer = csv::Writer::from_writer(Vec::new());
    write_player_header(&mut writer).unwrap();
    write_player_rows(&mut writer, &rows).unwrap();

    let out = csv_text(writer);
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            HEADER,
            "2020/21,EPL,EPL,Player A,Arsenal,FW,24-101,90,1,0,3,2,0.8,0.8,0.1",
            "2020/21,EPL,EPL,Player B,Arsenal,\"MF,FW\",21-033,45,0,0,,,,,",
        ]
    );
}

#[tokio::test]
async fn runner_keeps_going_after_a_missing_season_page() {
    let mut responses = vec![Ok(FetchResult::new(404, "not found"))];
    responses.extend(season_pages());
    let service = PlayerMetricsService::new(
        MockFetcher::with_responses(responses),
        ScraperTableReader::new(),
        "EPL",
        "EPL",
    );
    let comp = FbrefCompetition::default();
    let reporter = MockRunReporter::new();

    let mut writer = csv::Writer::from_writer(Vec::new());
    write_player_header(&mut writer).unwrap();

    let summary = SeasonRunner::new(&reporter, false)
        .run(
            &[2019, 2020],
            |year| {
                let target = comp.target(year);
                let service = &service;
                async move { service.fetch_season(&target).await }
            },
            |rows| write_player_rows(&mut writer, rows),
        )
        .await;

    assert!(!summary.is_success());
    assert!(!summary.aborted);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].season, "2019/20");
    assert_eq!(
        summary.failures[0].url.as_deref(),
        Some(comp.standard_url(2019).as_str())
    );
    assert_eq!(summary.total_rows(), 2);

    let out = csv_text(writer);
    assert_eq!(out.lines().count(), 3);
    assert!(out.lines().skip(1).all(|l| l.starts_with("2020/21,")));
    assert_eq!(
        reporter.labels(),
        vec![
            "SeasonStarted",
            "SeasonFailed",
            "SeasonStarted",
            "SeasonCompleted",
            "Finished"
        ]
    );
}

#[tokio::test]
async fn page_without_player_table_fails_the_season() {
    let service = PlayerMetricsService::new(
        MockFetcher::ok_html("<html><body><p>Maintenance</p></body></html>"),
        ScraperTableReader::new(),
        "EPL",
        "EPL",
    );
    let target = FbrefCompetition::default().target(2021);

    let failure = service.fetch_season(&target).await.unwrap_err();
    assert_eq!(failure.season, "2021/22");
    assert_eq!(failure.url.as_deref(), Some(target.standard_url.as_str()));
    assert!(matches!(failure.error, AppError::ExtractionError(_)));
}
