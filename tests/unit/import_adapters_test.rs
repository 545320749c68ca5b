//! Unit tests for the plain-text and bookmark-backup import adapters.

use laterlist::services::import_adapters::{display_host, parse_bookmark_backup, parse_line, parse_plain_text};
use laterlist::types::errors::ImportError;
use rstest::rstest;

#[rstest]
#[case("My Site | https://example.com/page", "My Site", "https://example.com/page")]
#[case("https://example.com", "example.com", "https://example.com")]
#[case("https://www.rust-lang.org/learn", "rust-lang.org", "https://www.rust-lang.org/learn")]
#[case("https://example.com/a | Trailing Title", "Trailing Title", "https://example.com/a")]
#[case("  Spaced   out   title  |  http://plain.example  ", "Spaced   out   title", "http://plain.example")]
#[case("A   B | https://ab.example", "A   B", "https://ab.example")]
#[case("| https://pipes.example |", "pipes.example", "https://pipes.example")]
fn test_parse_line(#[case] line: &str, #[case] title: &str, #[case] url: &str) {
    assert_eq!(parse_line(line), Some((title.to_string(), url.to_string())));
}

#[rstest]
#[case("")]
#[case("just words")]
#[case("ftp://files.example/x")]
fn test_parse_line_without_url(#[case] line: &str) {
    assert_eq!(parse_line(line), None);
}

#[test]
fn test_display_host_falls_back_to_input() {
    assert_eq!(display_host("https://www.example.com/x"), "example.com");
    assert_eq!(display_host("not a url"), "not a url");
}

#[test]
fn test_parse_plain_text_skips_noise() {
    let text = "My Site | https://example.com/page\n\nnothing here\nhttps://example.com\n";
    let links = parse_plain_text(text);
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].title, "My Site");
    assert_eq!(links[1].title, "example.com");
    assert!(links.iter().all(|l| l.imported_at.is_some()));
    assert_ne!(links[0].id, links[1].id);
}

#[test]
fn test_bookmark_backup_reads_first_list() {
    let text = r#"{"lists":[
        {"cards":[{"title":"One","url":"https://one.example"},{"title":"Two","url":"https://two.example"}]},
        {"cards":[{"title":"Ignored","url":"https://ignored.example"}]}
    ]}"#;
    let links = parse_bookmark_backup(text).unwrap();
    let titles: Vec<&str> = links.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["One", "Two"]);
}

#[rstest]
#[case("not json")]
#[case(r#"{"lists":[]}"#)]
#[case(r#"{"lists":[{"cards":{}}]}"#)]
#[case(r#"{"lists":[{"cards":[{"title":"","url":"https://x.example"}]}]}"#)]
#[case(r#"{"lists":[{"cards":[{"title":"ok","url":"https://x.example"},{"title":"no url"}]}]}"#)]
fn test_bookmark_backup_rejects_malformed(#[case] text: &str) {
    let result = parse_bookmark_backup(text);
    assert!(
        matches!(result, Err(ImportError::InvalidJson(_)) | Err(ImportError::Structure(_))),
        "expected rejection for {}",
        text
    );
}
