//! Unit tests for the id-based document merge.

use laterlist::services::merge_engine::merge;
use laterlist::types::document::{Container, Document, Link, Tab};

fn link(id: &str) -> Link {
    Link::new(id.to_string(), id, &format!("https://{}.example", id))
}

fn doc(tabs: Vec<Tab>, trash: Vec<Link>) -> Document {
    Document { tabs, trash }
}

fn tab(id: &str, containers: Vec<Container>) -> Tab {
    Tab { id: id.to_string(), name: id.to_uppercase(), containers }
}

fn container(id: &str, links: Vec<Link>) -> Container {
    Container { id: id.to_string(), name: id.to_uppercase(), links }
}

#[test]
fn test_merge_with_itself_is_identity() {
    let seed = Document::seed();
    assert_eq!(merge(&seed, &seed), seed);
}

#[test]
fn test_merge_appends_new_link_to_existing_container() {
    let current = doc(vec![tab("t1", vec![container("c1", vec![link("a")])])], vec![]);
    let incoming = doc(vec![tab("t1", vec![container("c1", vec![link("a"), link("b")])])], vec![]);

    let merged = merge(&current, &incoming);
    let ids: Vec<&str> = merged.tabs[0].containers[0].links.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_existing_data_wins() {
    let current = doc(vec![tab("t1", vec![container("c1", vec![link("a")])])], vec![]);
    let mut changed = current.clone();
    changed.tabs[0].name = "Renamed".to_string();
    changed.tabs[0].containers[0].links[0].title = "Different".to_string();

    let merged = merge(&current, &changed);
    assert_eq!(merged, current);
}

#[test]
fn test_new_tabs_and_containers_are_appended_in_order() {
    let current = doc(vec![tab("t1", vec![container("c1", vec![])])], vec![]);
    let incoming = doc(
        vec![
            tab("t2", vec![container("c3", vec![link("x")])]),
            tab("t1", vec![container("c2", vec![link("y")])]),
        ],
        vec![link("z")],
    );

    let merged = merge(&current, &incoming);
    let tab_ids: Vec<&str> = merged.tabs.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(tab_ids, vec!["t1", "t2"]);
    let t1: Vec<&str> = merged.tabs[0].containers.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(t1, vec!["c1", "c2"]);
    assert_eq!(merged.trash[0].id, "z");
}

#[test]
fn test_ids_present_elsewhere_are_skipped() {
    // "a" already lives in the trash; the incoming copy in a container is dropped.
    let current = doc(vec![tab("t1", vec![container("c1", vec![])])], vec![link("a")]);
    let incoming = doc(vec![tab("t1", vec![container("c1", vec![link("a")])])], vec![]);

    let merged = merge(&current, &incoming);
    assert!(merged.tabs[0].containers[0].links.is_empty());
    assert_eq!(merged.trash.len(), 1);
}

#[test]
fn test_merge_never_removes() {
    let current = Document::seed();
    let incoming = doc(vec![tab("other", vec![])], vec![]);
    let merged = merge(&current, &incoming);
    assert_eq!(merged.total_links(), current.total_links());
    assert_eq!(merged.tabs.len(), current.tabs.len() + 1);
}
