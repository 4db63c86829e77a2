//! Plain-text summaries for feed descriptions.

use std::sync::OnceLock;

use regex::Regex;

use crate::pattern;
use crate::Result;

/// Maximum summary length in characters, before the ellipsis.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

static TAG: OnceLock<Regex> = OnceLock::new();

/// Strip markup, decode common entities, trim, and cap the length.
///
/// Only used for summaries; article bodies are published untouched.
pub fn clean_description(raw: &str) -> Result<String> {
    let tag = pattern::cached(&TAG, r"<[^>]+>")?;
    let text = tag.replace_all(raw, "");

    // &amp; goes last so "&amp;lt;" decodes to "&lt;" rather than "<".
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    let text = text.trim();

    if text.chars().count() > MAX_DESCRIPTION_CHARS {
        let cut: String = text.chars().take(MAX_DESCRIPTION_CHARS).collect();
        Ok(format!("{cut}..."))
    } else {
        Ok(text.to_string())
    }
}
