//! HTTP content source tests against a mock provider.

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oarss::config::UpstreamConfig;
use oarss::upstream::resolve_real_id_from_url;
use oarss::{ContentSource, ErrorKind, HttpContentSource, OarssError};

fn source_for(server: &MockServer, cookie: &str) -> HttpContentSource {
    let config = UpstreamConfig {
        base_url: format!("{}/", server.uri()),
        cookie: cookie.to_string(),
        connect_timeout_secs: 2,
        timeout_secs: 5,
        ..Default::default()
    };
    HttpContentSource::new(&config).unwrap()
}

#[tokio::test]
async fn test_channel_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/channel/Mzkz123abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "err": "",
            "data": {
                "name": "Daily Notes",
                "desc": "Notes every day",
                "avatar": "https://img.example.com/a.png",
                "link": "https://mp.example.com/Mzkz123abc"
            }
        })))
        .mount(&server)
        .await;

    let meta = source_for(&server, "")
        .fetch_channel_metadata("Mzkz123abc")
        .await
        .unwrap();
    assert_eq!(meta.name, "Daily Notes");
    assert_eq!(meta.description, "Notes every day");
    assert_eq!(meta.link, "https://mp.example.com/Mzkz123abc");
}

#[tokio::test]
async fn test_channel_metadata_without_name_uses_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/channel/MzEmpty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "err": "" })))
        .mount(&server)
        .await;

    let meta = source_for(&server, "")
        .fetch_channel_metadata("MzEmpty")
        .await
        .unwrap();
    assert_eq!(meta.name, "MzEmpty");
}

#[tokio::test]
async fn test_article_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("biz_id", "Mzkz123abc"))
        .and(query_param("offset", "0"))
        .and(query_param("count", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "err": "",
            "data": [
                {
                    "title": "First",
                    "desc": "<p>one</p>",
                    "content": "<p>body</p>",
                    "link": "https://mp.example.com/s/1",
                    "cover": "https://img.example.com/1.png",
                    "publishedAt": "2024-03-01T08:00:00+08:00"
                },
                {
                    "title": "Second",
                    "link": "https://mp.example.com/s/2",
                    "publishedAt": "0001-01-01T00:00:00Z"
                }
            ]
        })))
        .mount(&server)
        .await;

    let page = source_for(&server, "")
        .fetch_article_page("Mzkz123abc", 0, 2)
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page[0].title, "First");
    assert_eq!(page[0].description, "<p>one</p>");
    assert_eq!(page[0].body, "<p>body</p>");
    assert_eq!(
        page[0].published_at,
        Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(page[1].body, "");
    assert_eq!(page[1].published_at, None);
}

#[tokio::test]
async fn test_provider_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "err": "account banned",
            "data": null
        })))
        .mount(&server)
        .await;

    let err = source_for(&server, "")
        .fetch_article_page("Mzkz123abc", 0, 20)
        .await
        .unwrap_err();
    assert!(matches!(err, OarssError::Upstream(ref msg) if msg == "account banned"));
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = source_for(&server, "")
        .fetch_channel_metadata("Mzkz123abc")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
    assert!(err.to_string().contains("HTTP 500"));
}

#[tokio::test]
async fn test_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = source_for(&server, "")
        .fetch_article_page("Mzkz123abc", 0, 20)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
}

#[tokio::test]
async fn test_article_body_sends_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s/1"))
        .and(header("cookie", "session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><div class="rich_media_content" id="js_content" style="visibility: hidden;">
                <p>Hello</p>
            </div></html>"#,
        ))
        .mount(&server)
        .await;

    let body = source_for(&server, "session=abc")
        .fetch_article_body(&format!("{}/s/1", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "<p>Hello</p>");
}

#[tokio::test]
async fn test_article_body_missing_block() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>removed</html>"))
        .mount(&server)
        .await;

    let body = source_for(&server, "")
        .fetch_article_body(&format!("{}/s/2", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "");
}

#[tokio::test]
async fn test_resolve_identifier_from_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s/AbCdEf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<script>var biz = 'MzFromPage';</script>"#),
        )
        .mount(&server)
        .await;

    let source = source_for(&server, "");
    let real_id = resolve_real_id_from_url(&source, &format!("{}/s/AbCdEf", server.uri()))
        .await
        .unwrap();
    assert_eq!(real_id, "MzFromPage");

    // The query parameter wins without a request.
    let real_id = resolve_real_id_from_url(&source, "https://mp.example.com/s?biz=MzQuery")
        .await
        .unwrap();
    assert_eq!(real_id, "MzQuery");
}
