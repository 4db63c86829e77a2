//! JSON Feed version 1 rendering.

use serde::Serialize;

use super::FeedDocument;
use crate::datetime::to_rfc3339;
use crate::{OarssError, Result};

/// Version URL written into every document.
pub const JSON_FEED_VERSION: &str = "https://jsonfeed.org/version/1";

#[derive(Debug, Serialize)]
struct JsonFeed<'a> {
    version: &'static str,
    title: &'a str,
    home_page_url: &'a str,
    feed_url: &'a str,
    description: &'a str,
    items: Vec<JsonFeedItem<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonFeedItem<'a> {
    id: String,
    url: &'a str,
    title: &'a str,
    content_html: &'a str,
    summary: &'a str,
    date_published: String,
}

/// Render a JSON Feed document.
pub fn render_json(doc: &FeedDocument) -> Result<String> {
    let feed = JsonFeed {
        version: JSON_FEED_VERSION,
        title: &doc.title,
        home_page_url: &doc.home_url,
        feed_url: &doc.feed_url,
        description: &doc.description,
        items: doc
            .entries
            .iter()
            .map(|entry| JsonFeedItem {
                id: entry.id.to_string(),
                url: &entry.link,
                title: &entry.title,
                content_html: &entry.content,
                summary: &entry.summary,
                date_published: to_rfc3339(&entry.published_at),
            })
            .collect(),
    };

    serde_json::to_string_pretty(&feed).map_err(|e| OarssError::Render(e.to_string()))
}
