//! Integration tests for the crawl loop
//!
//! These tests serve the board and item pages from a wiremock server and
//! run full cycles against a SQLite file in a temporary directory.

use serde_json::{json, Value};
use tempfile::TempDir;
use trendwatch::config::{
    Config, CrawlerConfig, IntervalConfig, LoggingConfig, SourceConfig, StorageConfig,
};
use trendwatch::crawler::{watch, CycleError, Orchestrator, RateLimiter};
use trendwatch::source::HttpSource;
use trendwatch::storage::{CrawlHistory, SqliteStorage};
use trendwatch::ItemId;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, db_path: &str) -> Config {
    Config {
        intervals: IntervalConfig {
            interval_between_item: 0,
            interval_between_cycle: 10, // Very short for testing
        },
        storage: StorageConfig {
            database_path: db_path.to_string(),
        },
        source: SourceConfig {
            board_url: format!("{}/hot", server.uri()),
            question_url_prefix: format!("{}/question/", server.uri()),
            user_agent: "TestAgent/1.0".to_string(),
            cookie: None,
            timeout_secs: 5,
        },
        crawler: CrawlerConfig::default(),
        logging: LoggingConfig::default(),
    }
}

fn page(state: &Value) -> String {
    format!(
        r#"<html><body><script id="js-initialData" type="text/json">{}</script></body></html>"#,
        state
    )
}

fn hot_item(title: &str, url: &str) -> Value {
    json!({
        "target": {
            "titleArea": { "text": title },
            "metricsArea": { "text": "100万热度" },
            "excerptArea": { "text": format!("About {}", title) },
            "link": { "url": url }
        }
    })
}

fn board_page(items: Vec<Value>) -> String {
    page(&json!({ "initialState": { "topstory": { "hotList": items } } }))
}

fn detail_page(item_id: u64, answers: i64) -> String {
    let mut questions = serde_json::Map::new();
    questions.insert(
        item_id.to_string(),
        json!({
            "created": 1657248657,
            "followerCount": 10,
            "visitCount": 1000,
            "answerCount": answers,
            "title": format!("Question {}", item_id),
            "detail": "<p>detail</p>"
        }),
    );
    page(&json!({ "initialState": { "entities": { "questions": questions } } }))
}

async fn mount_page(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

fn open_history(db_path: &str) -> SqliteStorage {
    SqliteStorage::open(std::path::Path::new(db_path)).expect("Failed to open database")
}

#[tokio::test]
async fn test_watch_records_every_board_entry() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("watch.db");
    let db_path = db_path.to_str().unwrap();

    let prefix = format!("{}/question/", server.uri());
    mount_page(
        &server,
        "/hot",
        200,
        board_page(vec![
            hot_item("First", &format!("{}11", prefix)),
            hot_item("Second", &format!("{}22", prefix)),
            hot_item("Special", "https://www.zhihu.com/special/1"),
        ]),
    )
    .await;
    mount_page(&server, "/question/11", 200, detail_page(11, 7)).await;
    mount_page(&server, "/question/22", 500, "server error".to_string()).await;

    let config = create_test_config(&server, db_path);
    watch(&config, Some(2)).await.expect("Watch failed");

    let history = open_history(db_path);
    assert_eq!(history.count_crawls().unwrap(), 2);
    assert_eq!(history.count_completed_crawls().unwrap(), 2);
    assert_eq!(history.count_records().unwrap(), 6);

    for crawl in history.latest_crawls(2).unwrap() {
        let records = history.get_records(crawl.id).unwrap();
        let rankings: Vec<u32> = records.iter().map(|r| r.ranking).collect();
        assert_eq!(rankings, vec![0, 1, 2]);

        assert_eq!(records[0].item_id, ItemId::Identified(11));
        assert_eq!(records[0].detail.answer_count, Some(7));
        assert_eq!(records[0].excerpt.as_deref(), Some("About First"));

        assert_eq!(records[1].item_id, ItemId::Identified(22));
        assert!(records[1].detail.is_empty());

        assert_eq!(records[2].item_id, ItemId::Unparsed);
        assert!(records[2].detail.is_empty());
    }

    // The unparsed entry never reaches the detail source
    let requests = server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| r.url.path() == "/hot" || r.url.path().starts_with("/question/")));
    assert_eq!(
        requests
            .iter()
            .filter(|r| r.url.path().starts_with("/question/"))
            .count(),
        4
    );
}

#[tokio::test]
async fn test_board_failure_aborts_only_that_cycle() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("abort.db");
    let db_path = db_path.to_str().unwrap();

    let prefix = format!("{}/question/", server.uri());
    Mock::given(method("GET"))
        .and(path("/hot"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/hot",
        200,
        board_page(vec![hot_item("Only", &format!("{}5", prefix))]),
    )
    .await;
    mount_page(&server, "/question/5", 200, detail_page(5, 1)).await;

    let config = create_test_config(&server, db_path);
    let source = HttpSource::new(&config.source).unwrap();
    let store = open_history(db_path);
    let mut orchestrator = Orchestrator::new(
        source.clone(),
        source,
        store,
        RateLimiter::new(config.intervals.clone()),
    );

    let outcomes = orchestrator.run_cycles(2).await.unwrap();

    let failed_crawl = match &outcomes[0] {
        Err(err @ CycleError::Board { .. }) => err.crawl_id().unwrap(),
        other => panic!("expected board failure, got {:?}", other),
    };
    let report = outcomes[1].as_ref().expect("second cycle should succeed");
    assert_eq!(report.records_written, 1);

    let history = orchestrator.store();
    let aborted = history.get_crawl(failed_crawl).unwrap();
    assert!(aborted.end_time.is_none());
    assert_eq!(history.count_records_for_crawl(failed_crawl).unwrap(), 0);
    assert!(history.get_crawl(report.crawl_id).unwrap().is_complete());
}

#[tokio::test]
async fn test_top_limits_entries_per_cycle() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("top.db");
    let db_path = db_path.to_str().unwrap();

    let prefix = format!("{}/question/", server.uri());
    mount_page(
        &server,
        "/hot",
        200,
        board_page(
            (1..=4)
                .map(|id| hot_item(&format!("Q{}", id), &format!("{}{}", prefix, id)))
                .collect(),
        ),
    )
    .await;
    for id in 1..=4 {
        mount_page(&server, &format!("/question/{}", id), 200, detail_page(id, 0)).await;
    }

    let mut config = create_test_config(&server, db_path);
    config.crawler.top = Some(2);
    watch(&config, Some(1)).await.expect("Watch failed");

    let history = open_history(db_path);
    assert_eq!(history.count_records().unwrap(), 2);
    assert_eq!(history.count_records_without_detail().unwrap(), 0);
}
