//! Crawl delay pacing and API timeouts feeding the strategy cascade

mod common;

use std::io::Write;
use std::time::{Duration, Instant};

use common::{StubServer, http_client, students_json, test_config};
use serde_json::json;
use student_crawler::CrawlerConfig;
use student_crawler::application::{ParseMode, StrategySelector};
use student_crawler::domain::{AttemptOutcome, StrategyKind};
use student_crawler::infrastructure::ApiConfig;
use tempfile::NamedTempFile;
use url::Url;

const LIST_PAGE: &str = r#"<table id="studentsTable">
  <tr><th>Mã SV</th><th>Họ tên</th><th>Điểm Toán</th></tr>
  <tr><td>SV202001001</td><td>Nguyễn Văn An</td><td>8</td></tr>
  <tr><td>SV202001002</td><td>Trần Thị Bình</td><td>9</td></tr>
  <tr><td>SV202001003</td><td>Lê Cường</td><td>7</td></tr>
</table>"#;

fn page_file(html: &str) -> (NamedTempFile, String) {
    let mut file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
    file.write_all(html.as_bytes()).unwrap();
    let locator = Url::from_file_path(file.path()).unwrap().to_string();
    (file, locator)
}

fn delayed(millis: u64) -> CrawlerConfig {
    CrawlerConfig {
        crawl_delay_ms: millis,
        ..test_config(vec![])
    }
}

#[tokio::test]
async fn crawl_delay_follows_every_network_fetch() {
    let server = StubServer::start(|_: &str| (200, "<html></html>".to_string())).await;
    let http = http_client(&delayed(200));
    let page = format!("{}/students", server.origin());

    let started = Instant::now();
    for _ in 0..3 {
        http.get_text(&page).await.unwrap();
    }

    assert_eq!(server.hits(), 3);
    assert!(started.elapsed() >= Duration::from_millis(600));
}

#[tokio::test]
async fn failed_fetches_are_paced_too() {
    let server = StubServer::start(|_: &str| (503, "{}".to_string())).await;
    let http = http_client(&delayed(200));
    let url = format!("{}/api/v1/students", server.origin());

    let started = Instant::now();
    assert!(http.get_json(&url, Duration::from_secs(2)).await.is_err());
    assert!(http.get_text(&url).await.is_err());

    assert_eq!(server.hits(), 2);
    assert!(started.elapsed() >= Duration::from_millis(400));
}

#[tokio::test]
async fn local_files_skip_the_crawl_delay() {
    let (_file, locator) = page_file(LIST_PAGE);
    let http = http_client(&delayed(10_000));

    let started = Instant::now();
    let html = http.get_text(&locator).await.unwrap();

    assert!(html.contains("studentsTable"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn api_timeout_falls_back_to_the_page_table() {
    // first page is full, the second one never arrives
    let server = StubServer::stalling(1, |_: &str| (200, json!(students_json(0..2)).to_string())).await;
    let (_file, locator) = page_file(LIST_PAGE);
    let config = CrawlerConfig {
        api: ApiConfig {
            page_size: 2,
            timeout_secs: 1,
            ..test_config(vec![server.port]).api
        },
        ..test_config(vec![server.port])
    };
    let selector = StrategySelector::new(&config, http_client(&config)).unwrap();

    let started = Instant::now();
    let result = selector.extract(&locator, ParseMode::Frontend).await;

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(server.hits(), 2);

    assert_eq!(result.attempts.len(), 2);
    assert_eq!(result.attempts[0].strategy, StrategyKind::ApiFallback);
    match &result.attempts[0].outcome {
        AttemptOutcome::Failed(reason) => assert!(reason.contains("timed out after 1s"), "{reason}"),
        other => panic!("expected a failed API attempt, got {other:?}"),
    }
    assert_eq!(result.attempts[1].outcome, AttemptOutcome::Succeeded { found: 3 });
    assert_eq!(result.strategy, Some(StrategyKind::FrontendTable));
    assert_eq!(result.source, locator);
    assert_eq!(result.records[1].get("student_id"), Some("SV202001002"));
}

#[tokio::test]
async fn silent_api_is_skipped_after_its_timeout() {
    let server = StubServer::stalling(0, |_: &str| (200, "[]".to_string())).await;
    let (_file, locator) = page_file(LIST_PAGE);
    let config = CrawlerConfig {
        api: ApiConfig {
            timeout_secs: 1,
            ..test_config(vec![server.port]).api
        },
        ..test_config(vec![server.port])
    };
    let selector = StrategySelector::new(&config, http_client(&config)).unwrap();

    let result = selector.extract(&locator, ParseMode::Frontend).await;

    assert!(matches!(result.attempts[0].outcome, AttemptOutcome::Failed(_)));
    assert_eq!(result.strategy, Some(StrategyKind::FrontendTable));
    assert_eq!(result.found, 3);
}
