//! HTTP implementation of the content source gateway.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::header::COOKIE;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::extract::body_from_markup;
use super::{ChannelMetadata, ContentSource, UpstreamArticle};
use crate::config::UpstreamConfig;
use crate::{OarssError, Result};

/// Response envelope used by the provider API.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    err: String,
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelPayload {
    #[serde(default)]
    name: String,
    #[serde(default, alias = "desc")]
    description: String,
    #[serde(default)]
    avatar: String,
    #[serde(default)]
    link: String,
}

#[derive(Debug, Deserialize)]
struct ArticlePayload {
    #[serde(default)]
    title: String,
    #[serde(default, alias = "description")]
    desc: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    cover: String,
    #[serde(default, alias = "published_at")]
    #[serde(rename = "publishedAt")]
    published_at: Option<serde_json::Value>,
}

impl From<ArticlePayload> for UpstreamArticle {
    fn from(p: ArticlePayload) -> Self {
        UpstreamArticle {
            title: p.title,
            description: p.desc,
            body: p.content,
            link: p.link,
            cover: p.cover,
            published_at: p.published_at.as_ref().and_then(parse_publish_time),
        }
    }
}

/// Interpret a provider publish time: RFC 3339, `YYYY-MM-DD HH:MM:SS`, or
/// Unix seconds. Zero-valued times count as absent.
fn parse_publish_time(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let dt = match value {
        serde_json::Value::Number(n) => {
            let secs = n.as_i64()?;
            if secs <= 0 {
                return None;
            }
            Utc.timestamp_opt(secs, 0).single()?
        }
        serde_json::Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                dt.with_timezone(&Utc)
            } else {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .ok()?
                    .and_utc()
            }
        }
        _ => return None,
    };
    // Year 1 is what zero-valued timestamps serialize to.
    if dt.timestamp() <= 0 {
        None
    } else {
        Some(dt)
    }
}

/// Content source backed by the provider's HTTP API.
pub struct HttpContentSource {
    client: Client,
    base_url: String,
    cookie: String,
}

impl HttpContentSource {
    /// Build a client from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| OarssError::Upstream(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie: config.cookie.clone(),
        })
    }

    async fn get_text(&self, url: &str, with_cookie: bool) -> Result<String> {
        let mut request = self.client.get(url);
        if with_cookie && !self.cookie.is_empty() {
            request = request.header(COOKIE, &self.cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| OarssError::Upstream(format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(OarssError::Upstream(format!(
                "HTTP {} from {url}",
                response.status().as_u16()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| OarssError::Upstream(format!("failed to read body from {url}: {e}")))
    }

    async fn get_envelope<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let body = self.get_text(url, false).await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| OarssError::Upstream(format!("malformed response from {url}: {e}")))?;
        if !envelope.err.is_empty() {
            return Err(OarssError::Upstream(envelope.err));
        }
        Ok(envelope.data)
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch_channel_metadata(&self, real_id: &str) -> Result<ChannelMetadata> {
        let url = format!(
            "{}/api/channel/{}",
            self.base_url,
            urlencoding::encode(real_id)
        );
        let payload: ChannelPayload = self.get_envelope(&url).await?.unwrap_or_default();

        Ok(ChannelMetadata {
            name: if payload.name.is_empty() {
                real_id.to_string()
            } else {
                payload.name
            },
            description: payload.description,
            avatar: payload.avatar,
            link: payload.link,
        })
    }

    async fn fetch_article_page(
        &self,
        real_id: &str,
        offset: u32,
        count: u32,
    ) -> Result<Vec<UpstreamArticle>> {
        let url = format!(
            "{}/api/articles?biz_id={}&offset={}&count={}",
            self.base_url,
            urlencoding::encode(real_id),
            offset,
            count
        );
        let payload: Vec<ArticlePayload> = self.get_envelope(&url).await?.unwrap_or_default();
        debug!("Provider returned {} article(s) for {}", payload.len(), real_id);
        Ok(payload.into_iter().map(UpstreamArticle::from).collect())
    }

    async fn fetch_article_body(&self, link: &str) -> Result<String> {
        let html = self.get_text(link, true).await?;
        body_from_markup(&html)
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        self.get_text(url, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_publish_time_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(
            parse_publish_time(&json!("2024-01-15T18:30:00+08:00")),
            Some(expected)
        );
        assert_eq!(
            parse_publish_time(&json!("2024-01-15 10:30:00")),
            Some(expected)
        );
        assert_eq!(
            parse_publish_time(&json!(expected.timestamp())),
            Some(expected)
        );
    }

    #[test]
    fn test_parse_publish_time_zero_values() {
        assert_eq!(parse_publish_time(&json!("0001-01-01T00:00:00Z")), None);
        assert_eq!(parse_publish_time(&json!(0)), None);
        assert_eq!(parse_publish_time(&json!("")), None);
        assert_eq!(parse_publish_time(&json!(null)), None);
    }

    #[test]
    fn test_article_payload_conversion() {
        let payload: ArticlePayload = serde_json::from_value(json!({
            "title": "Hello",
            "desc": "<p>summary</p>",
            "link": "https://mp/s/1",
            "cover": "https://img/1.png",
            "publishedAt": "2024-01-15T10:30:00Z"
        }))
        .unwrap();
        let article = UpstreamArticle::from(payload);
        assert_eq!(article.title, "Hello");
        assert_eq!(article.description, "<p>summary</p>");
        assert!(article.body.is_empty());
        assert!(article.published_at.is_some());
    }
}
