use std::time::Duration;

use par_client::polite_client;
use par_core::config::FetchConfig;
use par_core::error::AppError;
use par_core::output::{write_standings_header, write_standings_rows};
use par_core::testutil::MockRunReporter;
use par_core::{SeasonRunner, StandingsService};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const STANDINGS_2020: &str = include_str!("../fixtures/standings_2020.json");

/// Serve canned HTTP responses, one per connection, in order.
///
/// Returns the base URL and a channel yielding each raw request head.
async fn serve_sequence(responses: Vec<String>) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for response in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            }
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{addr}/v4"), rx)
}

fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

fn fast_config() -> FetchConfig {
    FetchConfig {
        requests_per_second: 50.0,
        burst: 3,
        timeout: Duration::from_secs(5),
        max_body_bytes: 1 << 20,
        user_agent: "par-test/1.0".into(),
    }
}

#[tokio::test]
async fn writes_total_table_for_each_season() {
    let (base, mut heads) = serve_sequence(vec![
        http_response("200 OK", STANDINGS_2020),
        http_response("200 OK", STANDINGS_2020),
    ])
    .await;
    let service = StandingsService::new(polite_client(&fast_config()).unwrap(), &base, "token-123", "PL");
    let reporter = MockRunReporter::new();

    let mut writer = csv::Writer::from_writer(Vec::new());
    write_standings_header(&mut writer).unwrap();
    let summary = SeasonRunner::new(&reporter, false)
        .run(
            &[2020, 2021],
            |year| {
                let service = &service;
                async move { service.fetch_season(year).await }
            },
            |rows| write_standings_rows(&mut writer, rows),
        )
        .await;

    assert!(summary.is_success());
    assert_eq!(summary.total_rows(), 6);

    let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines[0], "season,team_id,points,rank,goal_diff");
    assert_eq!(lines[1], "2020/21,65,86,1,51");
    assert_eq!(lines[3], "2020/21,356,23,20,-43");
    assert_eq!(lines[4], "2021/22,65,86,1,51");
    assert_eq!(lines.len(), 7);

    let first = heads.recv().await.unwrap().to_lowercase();
    assert!(first.starts_with("get /v4/competitions/pl/standings?season=2020 "));
    assert!(first.contains("x-auth-token: token-123"));
    let second = heads.recv().await.unwrap().to_lowercase();
    assert!(second.contains("season=2021"));
}

#[tokio::test]
async fn rate_limit_response_aborts_remaining_seasons() {
    let (base, _heads) = serve_sequence(vec![
        http_response("200 OK", STANDINGS_2020),
        http_response("429 Too Many Requests", "{\"message\":\"slow down\"}"),
    ])
    .await;
    let service = StandingsService::new(polite_client(&fast_config()).unwrap(), &base, "k", "PL");
    let reporter = MockRunReporter::new();

    let mut written = 0usize;
    let summary = SeasonRunner::new(&reporter, false)
        .run(
            &[2020, 2021, 2022],
            |year| {
                let service = &service;
                async move { service.fetch_season(year).await }
            },
            |rows| {
                written += rows.len();
                Ok(rows.len())
            },
        )
        .await;

    assert!(summary.aborted);
    assert_eq!(summary.completed.len(), 1);
    assert_eq!(written, 3);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].season, "2021/22");
    assert!(matches!(
        summary.failures[0].error,
        AppError::RateLimited { status: 429, .. }
    ));
}
