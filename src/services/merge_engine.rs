//! Id-based union of an incoming document into the current one.
//!
//! Current data always wins: existing ids are never overwritten and nothing
//! is removed. New tabs, containers and links are appended after the
//! existing ones in incoming order. An incoming item whose id already lives
//! somewhere else in the result is skipped so ids stay globally unique.

use std::collections::HashSet;

use crate::types::document::{Container, Document, Link, Tab};

/// Merges `incoming` into a copy of `current`.
pub fn merge(current: &Document, incoming: &Document) -> Document {
    let mut result = current.clone();
    let mut seen: HashSet<String> = current.all_ids().into_iter().map(str::to_string).collect();

    for link in &incoming.trash {
        if seen.insert(link.id.clone()) {
            result.trash.push(link.clone());
        }
    }

    for incoming_tab in &incoming.tabs {
        match result.tab_index(&incoming_tab.id) {
            Some(ti) => merge_tab(&mut result.tabs[ti], incoming_tab, &mut seen),
            None => {
                if seen.insert(incoming_tab.id.clone()) {
                    result.tabs.push(fresh_tab(incoming_tab, &mut seen));
                }
            }
        }
    }

    result
}

fn merge_tab(current: &mut Tab, incoming: &Tab, seen: &mut HashSet<String>) {
    for incoming_container in &incoming.containers {
        match current.container_index(&incoming_container.id) {
            Some(ci) => merge_links(&mut current.containers[ci], &incoming_container.links, seen),
            None => {
                if seen.insert(incoming_container.id.clone()) {
                    current.containers.push(fresh_container(incoming_container, seen));
                }
            }
        }
    }
}

fn merge_links(current: &mut Container, incoming: &[Link], seen: &mut HashSet<String>) {
    for link in incoming {
        if seen.insert(link.id.clone()) {
            current.links.push(link.clone());
        }
    }
}

/// Copies a tab that is new to the result, dropping children whose ids are taken.
fn fresh_tab(tab: &Tab, seen: &mut HashSet<String>) -> Tab {
    let mut containers = Vec::with_capacity(tab.containers.len());
    for container in &tab.containers {
        if seen.insert(container.id.clone()) {
            containers.push(fresh_container(container, seen));
        }
    }
    Tab {
        id: tab.id.clone(),
        name: tab.name.clone(),
        containers,
    }
}

fn fresh_container(container: &Container, seen: &mut HashSet<String>) -> Container {
    let mut copy = Container {
        id: container.id.clone(),
        name: container.name.clone(),
        links: Vec::with_capacity(container.links.len()),
    };
    merge_links(&mut copy, &container.links, seen);
    copy
}
