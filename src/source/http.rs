//! HTTP board and detail source
//!
//! The remote site renders its pages with the full application state embedded
//! as JSON in `<script id="js-initialData" type="text/json">`. Both the board
//! and the item pages are read from that blob rather than from the markup.

use crate::config::SourceConfig;
use crate::source::{BoardEntry, BoardSource, DetailRecord, DetailSource, ItemId};
use crate::SourceError;
use chrono::{DateTime, Utc};
use reqwest::header::COOKIE;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use std::time::Duration;

/// Longest response body excerpt kept in a [`SourceError::Status`]
const MAX_ERROR_BODY: usize = 200;

/// Board and detail source backed by the site's HTML pages
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    board_url: String,
    question_url_prefix: String,
    cookie: Option<String>,
}

/// Builds an HTTP client with the configured user agent and timeout
pub fn build_http_client(config: &SourceConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            board_url: config.board_url.clone(),
            question_url_prefix: config.question_url_prefix.clone(),
            cookie: config.cookie.clone(),
        })
    }

    /// Detail page URL of an item
    pub fn question_url(&self, item_id: u64) -> String {
        format!("{}{}", self.question_url_prefix, item_id)
    }

    /// GETs a page and returns its body, mapping non-2xx statuses to errors
    async fn get_page(&self, url: &str) -> Result<String, SourceError> {
        let mut request = self.client.get(url);
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie.as_str());
        }

        let response = request.send().await.map_err(|source| SourceError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| SourceError::Http {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        tracing::debug!(url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

impl BoardSource for HttpSource {
    async fn fetch_board(&self) -> Result<Vec<BoardEntry>, SourceError> {
        let html = self.get_page(&self.board_url).await?;
        let state = extract_page_state(&html, &self.board_url)?;
        parse_board(&state, &self.board_url, &self.question_url_prefix)
    }
}

impl DetailSource for HttpSource {
    async fn fetch_detail(&self, item_id: u64) -> Result<DetailRecord, SourceError> {
        let url = self.question_url(item_id);
        let fetched_at = Utc::now();
        let html = self.get_page(&url).await?;
        let state = extract_page_state(&html, &url)?;
        parse_detail(&state, &url, item_id, fetched_at)
    }
}

/// Extracts the JSON page state embedded in an HTML document
pub fn extract_page_state(html: &str, url: &str) -> Result<Value, SourceError> {
    let missing = || SourceError::MissingState {
        url: url.to_string(),
    };

    let selector = Selector::parse(r#"script#js-initialData"#).map_err(|_| missing())?;
    let document = Html::parse_document(html);
    let script = document.select(&selector).next().ok_or_else(missing)?;
    let text = script.text().collect::<String>();

    serde_json::from_str(&text).map_err(|source| SourceError::Json {
        url: url.to_string(),
        source,
    })
}

/// Reads the ranked board out of the page state
///
/// Entries keep the order of `initialState.topstory.hotList`, which is the
/// ranking order.
pub fn parse_board(
    state: &Value,
    url: &str,
    question_url_prefix: &str,
) -> Result<Vec<BoardEntry>, SourceError> {
    let list = lookup(state, "/initialState/topstory/hotList", url)?
        .as_array()
        .ok_or_else(|| missing_field(url, "/initialState/topstory/hotList"))?;

    list.iter()
        .map(|item| {
            let target = lookup(item, "/target", url)?;
            let entry_url = str_field(target, "/link/url", url)?;
            let excerpt = target
                .pointer("/excerptArea/text")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            Ok(BoardEntry {
                title: str_field(target, "/titleArea/text", url)?,
                heat: str_field(target, "/metricsArea/text", url)?,
                excerpt,
                item_id: ItemId::from_url(&entry_url, question_url_prefix),
                url: entry_url,
            })
        })
        .collect()
}

/// Reads one item's detail record out of its page state
pub fn parse_detail(
    state: &Value,
    url: &str,
    item_id: u64,
    fetched_at: DateTime<Utc>,
) -> Result<DetailRecord, SourceError> {
    let question = lookup(
        state,
        &format!("/initialState/entities/questions/{}", item_id),
        url,
    )?;

    Ok(DetailRecord {
        created_at: Some(int_field(question, "/created", url)?),
        visit_count: Some(int_field(question, "/visitCount", url)?),
        follower_count: Some(int_field(question, "/followerCount", url)?),
        answer_count: Some(int_field(question, "/answerCount", url)?),
        title: Some(str_field(question, "/title", url)?),
        raw_body: Some(str_field(question, "/detail", url)?),
        fetched_at: Some(fetched_at),
    })
}

fn missing_field(url: &str, field: &str) -> SourceError {
    SourceError::MissingField {
        url: url.to_string(),
        field: field.to_string(),
    }
}

fn lookup<'a>(value: &'a Value, pointer: &str, url: &str) -> Result<&'a Value, SourceError> {
    value
        .pointer(pointer)
        .filter(|v| !v.is_null())
        .ok_or_else(|| missing_field(url, pointer))
}

fn str_field(value: &Value, pointer: &str, url: &str) -> Result<String, SourceError> {
    lookup(value, pointer, url)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| missing_field(url, pointer))
}

fn int_field(value: &Value, pointer: &str, url: &str) -> Result<i64, SourceError> {
    lookup(value, pointer, url)?
        .as_i64()
        .ok_or_else(|| missing_field(url, pointer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PREFIX: &str = "https://www.zhihu.com/question/";

    fn page(state: &Value) -> String {
        format!(
            r#"<html><head><title>Hot</title></head><body>
            <div id="root"></div>
            <script id="js-initialData" type="text/json">{}</script>
            </body></html>"#,
            state
        )
    }

    fn board_state(prefix: &str) -> Value {
        json!({
            "initialState": {
                "topstory": {
                    "hotList": [
                        {
                            "target": {
                                "titleArea": { "text": "有哪些描写夏天的古诗词？" },
                                "metricsArea": { "text": "41万热度" },
                                "excerptArea": { "text": "" },
                                "link": { "url": format!("{}541032225", prefix) }
                            }
                        },
                        {
                            "target": {
                                "titleArea": { "text": "Roundtable" },
                                "metricsArea": { "text": "12万热度" },
                                "excerptArea": { "text": "An excerpt" },
                                "link": { "url": "https://www.zhihu.com/roundtable/summer" }
                            }
                        }
                    ]
                }
            }
        })
    }

    fn detail_state(item_id: u64) -> Value {
        let mut questions = serde_json::Map::new();
        questions.insert(
            item_id.to_string(),
            json!({
                "created": 1657248657,
                "followerCount": 5980,
                "visitCount": 2139067,
                "answerCount": 2512,
                "title": "Question title",
                "detail": "<p>Body</p>"
            }),
        );
        json!({ "initialState": { "entities": { "questions": questions } } })
    }

    fn source_config(server: &MockServer) -> SourceConfig {
        SourceConfig {
            board_url: format!("{}/hot", server.uri()),
            question_url_prefix: format!("{}/question/", server.uri()),
            user_agent: "TestAgent".to_string(),
            cookie: Some("z_c0=token".to_string()),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_extract_page_state() {
        let html = page(&json!({ "initialState": { "ok": true } }));
        let state = extract_page_state(&html, "https://example.com/").unwrap();
        assert_eq!(state.pointer("/initialState/ok"), Some(&json!(true)));
    }

    #[test]
    fn test_extract_page_state_missing_script() {
        let result = extract_page_state("<html><body></body></html>", "https://example.com/");
        assert!(matches!(result, Err(SourceError::MissingState { .. })));
    }

    #[test]
    fn test_extract_page_state_bad_json() {
        let html = r#"<script id="js-initialData" type="text/json">{not json</script>"#;
        let result = extract_page_state(html, "https://example.com/");
        assert!(matches!(result, Err(SourceError::Json { .. })));
    }

    #[test]
    fn test_parse_board_keeps_order_and_ids() {
        let entries = parse_board(&board_state(PREFIX), "https://www.zhihu.com/hot", PREFIX).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "有哪些描写夏天的古诗词？");
        assert_eq!(entries[0].heat, "41万热度");
        assert_eq!(entries[0].excerpt, None);
        assert_eq!(entries[0].item_id, ItemId::Identified(541032225));
        assert_eq!(entries[1].excerpt.as_deref(), Some("An excerpt"));
        assert_eq!(entries[1].item_id, ItemId::Unparsed);
    }

    #[test]
    fn test_parse_board_missing_title() {
        let mut state = board_state(PREFIX);
        state["initialState"]["topstory"]["hotList"][1]["target"]
            .as_object_mut()
            .unwrap()
            .remove("titleArea");

        let result = parse_board(&state, "https://www.zhihu.com/hot", PREFIX);
        match result {
            Err(SourceError::MissingField { field, .. }) => assert_eq!(field, "/titleArea/text"),
            other => panic!("expected missing field, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_detail() {
        let fetched_at = Utc::now();
        let detail = parse_detail(&detail_state(42), "https://x/question/42", 42, fetched_at).unwrap();

        assert_eq!(detail.created_at, Some(1657248657));
        assert_eq!(detail.visit_count, Some(2139067));
        assert_eq!(detail.follower_count, Some(5980));
        assert_eq!(detail.answer_count, Some(2512));
        assert_eq!(detail.title.as_deref(), Some("Question title"));
        assert_eq!(detail.raw_body.as_deref(), Some("<p>Body</p>"));
        assert_eq!(detail.fetched_at, Some(fetched_at));
    }

    #[test]
    fn test_parse_detail_wrong_item() {
        let result = parse_detail(&detail_state(42), "https://x/question/43", 43, Utc::now());
        assert!(matches!(result, Err(SourceError::MissingField { .. })));
    }

    #[tokio::test]
    async fn test_fetch_board_over_http() {
        let server = MockServer::start().await;
        let config = source_config(&server);

        Mock::given(method("GET"))
            .and(path("/hot"))
            .and(header("cookie", "z_c0=token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(page(&board_state(&config.question_url_prefix))),
            )
            .mount(&server)
            .await;

        let source = HttpSource::new(&config).unwrap();
        let entries = source.fetch_board().await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].item_id, ItemId::Identified(541032225));
    }

    #[tokio::test]
    async fn test_fetch_detail_over_http() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/question/42"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page(&detail_state(42))))
            .mount(&server)
            .await;

        let source = HttpSource::new(&source_config(&server)).unwrap();
        let detail = source.fetch_detail(42).await.unwrap();

        assert_eq!(detail.answer_count, Some(2512));
        assert!(detail.fetched_at.is_some());
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/hot"))
            .respond_with(ResponseTemplate::new(403).set_body_string("x".repeat(500)))
            .mount(&server)
            .await;

        let source = HttpSource::new(&source_config(&server)).unwrap();
        match source.fetch_board().await {
            Err(SourceError::Status { status, body, .. }) => {
                assert_eq!(status, 403);
                assert_eq!(body.len(), MAX_ERROR_BODY);
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }
}
