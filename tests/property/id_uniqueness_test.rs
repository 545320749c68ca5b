//! Property-based tests for id generation.
//!
//! Ids handed out within one process never repeat, whatever mix of kinds
//! is requested and however fast they are requested.

use std::collections::HashSet;

use laterlist::services::id_generator::{new_id, IdKind};
use proptest::prelude::*;

fn arb_kind() -> impl Strategy<Value = IdKind> {
    prop_oneof![
        Just(IdKind::Tab),
        Just(IdKind::Container),
        Just(IdKind::Link),
        Just(IdKind::Request),
        Just(IdKind::Origin),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn ids_never_repeat(kinds in prop::collection::vec(arb_kind(), 1..400)) {
        let ids: Vec<String> = kinds.iter().map(|k| new_id(*k)).collect();
        let distinct: HashSet<&String> = ids.iter().collect();
        prop_assert_eq!(distinct.len(), ids.len());
    }

    #[test]
    fn ids_carry_their_kind(kind in arb_kind()) {
        let id = new_id(kind);
        let prefix = format!("{}-", kind.prefix());
        prop_assert!(id.starts_with(&prefix));
        prop_assert!(!id.contains(' '));
    }
}

#[test]
fn ids_unique_across_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| (0..250).map(|_| new_id(IdKind::Link)).collect::<Vec<_>>()))
        .collect();
    let mut all = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(all.insert(id));
        }
    }
    assert_eq!(all.len(), 1000);
}
