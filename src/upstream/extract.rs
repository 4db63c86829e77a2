//! Pull identifiers and bodies out of provider URLs and markup.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use super::ContentSource;
use crate::pattern;
use crate::{OarssError, Result};

static BIZ_IN_MARKUP: OnceLock<Regex> = OnceLock::new();
static CONTENT_BLOCK: OnceLock<Regex> = OnceLock::new();

/// The `biz` query parameter of an article URL (or `__biz` as used by share
/// links), if present and non-empty.
pub fn biz_from_query(article_url: &str) -> Option<String> {
    let url = Url::parse(article_url).ok()?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    };
    param("biz").or_else(|| param("__biz"))
}

/// A `biz = "..."` assignment embedded in page markup.
pub fn biz_from_markup(html: &str) -> Result<Option<String>> {
    let re = pattern::cached(&BIZ_IN_MARKUP, r#"biz\s*=\s*["']([^"']+)["']"#)?;
    Ok(re
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string()))
}

/// Inner markup of the `js_content` element, trimmed. Empty when absent.
pub fn body_from_markup(html: &str) -> Result<String> {
    let re = pattern::cached(
        &CONTENT_BLOCK,
        r#"id=["']js_content["'][^>]*>([\s\S]*?)</div>"#,
    )?;
    Ok(re
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default())
}

/// Resolve a channel's real identifier from one of its article URLs.
///
/// The `biz` query parameter wins; otherwise the page is fetched and its
/// markup searched.
pub async fn resolve_real_id_from_url(
    source: &dyn ContentSource,
    article_url: &str,
) -> Result<String> {
    if Url::parse(article_url).is_err() {
        return Err(OarssError::Validation(format!(
            "not a valid URL: {article_url}"
        )));
    }

    if let Some(biz) = biz_from_query(article_url) {
        return Ok(biz);
    }

    debug!("No biz parameter in {}, fetching page", article_url);
    let html = source.fetch_page(article_url).await?;
    biz_from_markup(&html)?
        .ok_or_else(|| OarssError::IdentifierNotFound(article_url.to_string()))
}
