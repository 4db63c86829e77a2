//! RSS 2.0 rendering.

use chrono::{DateTime, Utc};

use super::xml::XmlDocument;
use super::FeedDocument;
use crate::datetime::to_rfc2822;
use crate::Result;

/// Namespace of the `content:encoded` element.
pub const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";

/// Render an RSS 2.0 document.
///
/// Titles, summaries and bodies go into CDATA sections, so article markup is
/// carried verbatim without breaking the document.
pub fn render_rss(doc: &FeedDocument, build_date: DateTime<Utc>) -> Result<String> {
    let mut xml = XmlDocument::new()?;
    xml.start("rss", &[("version", "2.0"), ("xmlns:content", CONTENT_NS)])?;
    xml.start("channel", &[])?;

    xml.cdata_element("title", &doc.title)?;
    xml.text_element("link", &doc.home_url)?;
    xml.cdata_element("description", &doc.description)?;
    xml.text_element("language", "zh-cn")?;
    xml.text_element("lastBuildDate", &to_rfc2822(&build_date))?;

    for entry in &doc.entries {
        xml.start("item", &[])?;
        xml.cdata_element("title", &entry.title)?;
        xml.text_element("link", &entry.link)?;
        xml.text_element_with("guid", &[("isPermaLink", "true")], &entry.link)?;
        xml.cdata_element("description", &entry.summary)?;
        xml.text_element("pubDate", &to_rfc2822(&entry.published_at))?;
        xml.cdata_element("content:encoded", &entry.content)?;
        xml.end("item")?;
    }

    xml.end("channel")?;
    xml.end("rss")?;
    xml.finish()
}
