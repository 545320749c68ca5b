//! Property-based tests for link and container operations.
//!
//! Moving, trashing and deleting never lose a link: every id that went in is
//! still somewhere in the document (or its trash) afterwards.

use laterlist::managers::link_manager::{LinkManager, LinkManagerTrait};
use laterlist::types::document::{Container, Document, Link, Tab};
use proptest::prelude::*;

/// Builds a document from a shape: `shape[t][c]` is the link count of
/// container `c` in tab `t`. Ids are derived from positions.
fn document_from_shape(shape: &[Vec<usize>]) -> Document {
    let tabs = shape
        .iter()
        .enumerate()
        .map(|(t, containers)| Tab {
            id: format!("t{}", t),
            name: format!("Tab {}", t),
            containers: containers
                .iter()
                .enumerate()
                .map(|(c, &links)| Container {
                    id: format!("c{}-{}", t, c),
                    name: format!("Container {}", c),
                    links: (0..links)
                        .map(|l| Link::new(format!("l{}-{}-{}", t, c, l), "", &format!("https://{}.example/{}", t, l)))
                        .collect(),
                })
                .collect(),
        })
        .collect();
    Document { tabs, trash: Vec::new() }
}

fn arb_shape() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0..5usize, 1..4), 1..4)
}

fn sorted_ids(doc: &Document) -> Vec<String> {
    let mut ids: Vec<String> = doc.all_ids().into_iter().map(str::to_string).collect();
    ids.sort();
    ids
}

fn link_ids(doc: &Document) -> Vec<String> {
    let mut ids: Vec<String> = doc
        .tabs
        .iter()
        .flat_map(|t| t.containers.iter())
        .flat_map(|c| c.links.iter())
        .chain(doc.trash.iter())
        .map(|l| l.id.clone())
        .collect();
    ids.sort();
    ids
}

/// Every (tab, container, link) position in the document.
fn positions(doc: &Document) -> Vec<(String, String, String)> {
    let mut out = Vec::new();
    for tab in &doc.tabs {
        for container in &tab.containers {
            for link in &container.links {
                out.push((tab.id.clone(), container.id.clone(), link.id.clone()));
            }
        }
    }
    out
}

fn containers(doc: &Document) -> Vec<(String, String)> {
    doc.tabs
        .iter()
        .flat_map(|t| t.containers.iter().map(move |c| (t.id.clone(), c.id.clone())))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn move_link_is_lossless(shape in arb_shape(), pick in any::<prop::sample::Index>(), dest in any::<prop::sample::Index>(), dest_index in 0..10usize) {
        let doc = document_from_shape(&shape);
        let links = positions(&doc);
        prop_assume!(!links.is_empty());
        let (from_tab, from_container, link_id) = links[pick.index(links.len())].clone();
        let targets = containers(&doc);
        let (to_tab, to_container) = targets[dest.index(targets.len())].clone();

        let before = sorted_ids(&doc);
        let mut manager = LinkManager::new(doc, None, "Restored Items");
        manager
            .move_link(&link_id, &from_tab, &from_container, &to_tab, &to_container, dest_index)
            .unwrap();

        prop_assert_eq!(sorted_ids(manager.document()), before);
        let dest_links = &manager.document().find_container(&to_tab, &to_container).unwrap().links;
        let at = dest_links.iter().position(|l| l.id == link_id).unwrap();
        prop_assert_eq!(at, dest_index.min(dest_links.len() - 1));
    }

    #[test]
    fn trash_and_restore_round_trip(shape in arb_shape(), pick in any::<prop::sample::Index>()) {
        let doc = document_from_shape(&shape);
        let links = positions(&doc);
        prop_assume!(!links.is_empty());
        let (tab_id, _, link_id) = links[pick.index(links.len())].clone();

        let before = link_ids(&doc);
        let mut manager = LinkManager::new(doc, None, "Restored Items");
        manager.switch_tab(&tab_id).unwrap();
        manager.move_to_trash(&link_id).unwrap();
        prop_assert_eq!(manager.document().trash.len(), 1);
        prop_assert_eq!(link_ids(manager.document()), before.clone());

        let receiving = manager.restore_from_trash(&link_id).unwrap();
        prop_assert!(manager.document().trash.is_empty());
        prop_assert_eq!(link_ids(manager.document()), before);
        let first_tab = &manager.document().tabs[0];
        prop_assert!(first_tab.find_container(&receiving).unwrap().find_link(&link_id).is_some());
    }

    #[test]
    fn delete_container_moves_links_to_trash(shape in arb_shape(), pick in any::<prop::sample::Index>()) {
        let doc = document_from_shape(&shape);
        let targets = containers(&doc);
        let (tab_id, container_id) = targets[pick.index(targets.len())].clone();
        let held = doc.find_container(&tab_id, &container_id).unwrap().links.len();

        let before = link_ids(&doc);
        let mut manager = LinkManager::new(doc, None, "Restored Items");
        manager.switch_tab(&tab_id).unwrap();
        manager.delete_container(&container_id).unwrap();

        prop_assert_eq!(link_ids(manager.document()), before);
        prop_assert_eq!(manager.document().trash.len(), held);
        prop_assert!(manager.document().locate_container(&container_id).is_none());
    }

    #[test]
    fn empty_trash_only_drops_trash(shape in arb_shape()) {
        let doc = document_from_shape(&shape);
        let mut manager = LinkManager::new(doc.clone(), None, "Restored Items");
        for (tab_id, _, link_id) in positions(&doc) {
            manager.switch_tab(&tab_id).unwrap();
            manager.move_to_trash(&link_id).unwrap();
        }
        let trashed = manager.document().trash.len();
        prop_assert_eq!(manager.empty_trash(), trashed);
        prop_assert_eq!(manager.document().total_links(), 0);
        prop_assert_eq!(manager.document().tabs.len(), doc.tabs.len());
    }
}
