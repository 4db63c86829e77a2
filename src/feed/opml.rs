//! OPML export of the subscription list.

use super::xml::XmlDocument;
use crate::Result;

/// Title of the exported outline.
pub const OPML_TITLE: &str = "WeChatOArss Subscriptions";

/// One subscription in the export.
#[derive(Debug, Clone)]
pub struct OpmlEntry {
    pub title: String,
    pub xml_url: String,
    /// Provider-side page, if known.
    pub html_url: Option<String>,
}

/// Render an OPML 2.0 document.
pub fn render_opml(entries: &[OpmlEntry]) -> Result<String> {
    let mut xml = XmlDocument::new()?;
    xml.start("opml", &[("version", "2.0")])?;

    xml.start("head", &[])?;
    xml.text_element("title", OPML_TITLE)?;
    xml.end("head")?;

    xml.start("body", &[])?;
    for entry in entries {
        let mut attrs = vec![
            ("text", entry.title.as_str()),
            ("title", entry.title.as_str()),
            ("type", "rss"),
            ("xmlUrl", entry.xml_url.as_str()),
        ];
        if let Some(html_url) = entry.html_url.as_deref().filter(|u| !u.is_empty()) {
            attrs.push(("htmlUrl", html_url));
        }
        xml.empty("outline", &attrs)?;
    }
    xml.end("body")?;

    xml.end("opml")?;
    xml.finish()
}
