//! HTML link extraction
//!
//! This module turns fetched page bytes into the list of outbound links,
//! in three steps:
//! - Decode the bytes, falling back to Windows-1252 when they are not UTF-8
//! - Collect the href of every `<a>` tag that has one
//! - Keep only hrefs that look absolute, trimmed of surrounding whitespace
//!
//! "Looks absolute" is a substring check for `http://` or `https://`
//! anywhere in the href, not URL validation. Relative links, fragments and
//! non-HTTP schemes fall out naturally; an href that merely embeds a URL in
//! a query string is kept verbatim. Whatever survives is stored as-is and
//! judged by its own fetch later.

use scraper::{Html, Selector};
use std::borrow::Cow;

/// Decodes page bytes into text
///
/// Windows-1252 maps every byte to a character, so the fallback cannot fail
/// and extraction always gets to run, however mangled the page encoding is.
fn decode_page(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text
        }
    }
}

/// Extracts absolute-looking links from fetched page bytes
///
/// Links are returned in document order, duplicates included; the caller
/// decides how to deduplicate.
///
/// # Arguments
///
/// * `bytes` - The raw response body
///
/// # Returns
///
/// A vector of href strings that contain `http://` or `https://`
pub fn extract_links(bytes: &[u8]) -> Vec<String> {
    let text = decode_page(bytes);
    let document = Html::parse_document(&text);

    let mut links = Vec::new();
    if let Ok(anchor_selector) = Selector::parse("a[href]") {
        for element in document.select(&anchor_selector) {
            if let Some(href) = element.value().attr("href") {
                if href.contains("http://") || href.contains("https://") {
                    links.push(href.trim().to_string());
                }
            }
        }
    }

    links
}
