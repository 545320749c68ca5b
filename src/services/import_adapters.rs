//! Parsers that turn foreign link formats into native `Link`s.
//!
//! Two formats are understood:
//! - a plain-text tab dump, one candidate link per line (`title | url`, or any
//!   line containing an http(s) URL);
//! - a generic bookmark backup shaped `{ "lists": [ { "cards": [ {title, url} ] } ] }`.
//!
//! Every produced link gets a freshly generated id and an `importedAt` stamp.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::services::id_generator::{new_id, now_millis, IdKind};
use crate::types::document::Link;
use crate::types::errors::ImportError;

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"https?://[^\s|]+").expect("static URL pattern is valid"))
}

/// Hostname of `url` without a leading `www.`, or the raw url when it has none.
pub fn display_host(url: &str) -> String {
    match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(host) => host.strip_prefix("www.").map(str::to_string).unwrap_or(host),
        None => url.to_string(),
    }
}

/// Extracts `(title, url)` from one line of a tab dump, if it holds a URL.
pub fn parse_line(line: &str) -> Option<(String, String)> {
    let found = url_pattern().find(line)?;
    let url = found.as_str().to_string();

    // The title is what is left once the url and the pipes are gone.
    let rest = format!("{}{}", &line[..found.start()], &line[found.end()..]);
    let title = rest.replace('|', "").trim().to_string();

    let title = if title.is_empty() { display_host(&url) } else { title };
    Some((title, url))
}

/// Parses a plain-text tab dump. Lines without a URL are skipped.
pub fn parse_plain_text(text: &str) -> Vec<Link> {
    let imported_at = now_millis();
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_line)
        .map(|(title, url)| Link {
            id: new_id(IdKind::Link),
            title,
            url,
            imported_at: Some(imported_at),
        })
        .collect()
}

fn card_field<'a>(card: &'a Value, field: &str, index: usize) -> Result<&'a str, ImportError> {
    match card.get(field).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ImportError::Structure(format!(
            "lists[0].cards[{}].{} must be a non-empty string",
            index, field
        ))),
    }
}

/// Parses a bookmark backup. Only the first list is read; nothing is produced
/// unless every card in it is valid.
pub fn parse_bookmark_backup(text: &str) -> Result<Vec<Link>, ImportError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ImportError::InvalidJson(e.to_string()))?;

    let first_list = value
        .get("lists")
        .and_then(Value::as_array)
        .and_then(|lists| lists.first())
        .ok_or_else(|| ImportError::Structure("lists[0] is missing".to_string()))?;

    let cards = first_list
        .get("cards")
        .and_then(Value::as_array)
        .ok_or_else(|| ImportError::Structure("lists[0].cards must be an array".to_string()))?;

    let imported_at = now_millis();
    let mut links = Vec::with_capacity(cards.len());
    for (i, card) in cards.iter().enumerate() {
        let title = card_field(card, "title", i)?;
        let url = card_field(card, "url", i)?;
        links.push(Link {
            id: new_id(IdKind::Link),
            title: title.trim().to_string(),
            url: url.trim().to_string(),
            imported_at: Some(imported_at),
        });
    }
    Ok(links)
}
