//! Property-based tests for the node index.

use proptest::prelude::*;
use std::collections::BTreeMap;

use crate::BTree;

#[derive(Debug, Clone)]
enum Op {
    Insert(String, u32),
    Remove(String),
}

/// Small key alphabet so that replacements and removals of present keys are common.
fn arb_key() -> impl Strategy<Value = String> {
    "[a-h]{1,3}"
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (arb_key(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        1 => arb_key().prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn last_insert_wins(
        order in 3usize..12,
        pairs in prop::collection::vec((arb_key(), any::<u32>()), 0..300),
    ) {
        let mut tree = BTree::new(order).expect("valid order");
        let mut model = BTreeMap::new();
        for (k, v) in &pairs {
            tree.insert(k.clone(), *v);
            model.insert(k.clone(), *v);
        }
        for (k, v) in &model {
            prop_assert_eq!(tree.get(k.as_str()), Some(v));
        }
        prop_assert_eq!(tree.len(), model.len());
        prop_assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn balanced_after_mixed_operations(
        order in 3usize..10,
        ops in prop::collection::vec(arb_op(), 0..400),
    ) {
        let mut tree = BTree::new(order).expect("valid order");
        let mut model = BTreeMap::new();
        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    prop_assert_eq!(tree.insert(k.clone(), v), model.insert(k, v));
                }
                Op::Remove(k) => {
                    prop_assert_eq!(tree.remove(k.as_str()), model.remove(&k));
                }
            }
            if let Err(violation) = tree.check_invariants() {
                prop_assert!(false, "{}", violation);
            }
        }
        let got: Vec<(&String, &u32)> = tree.iter().collect();
        let want: Vec<(&String, &u32)> = model.iter().collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn range_matches_model(
        keys in prop::collection::vec(arb_key(), 0..200),
        lo in arb_key(),
        hi in arb_key(),
    ) {
        let mut tree = BTree::new(4).expect("valid order");
        let mut model = BTreeMap::new();
        for k in keys {
            tree.insert(k.clone(), ());
            model.insert(k, ());
        }
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let got: Vec<&String> = tree.range(lo.clone()..hi.clone()).map(|(k, _)| k).collect();
        let want: Vec<&String> = model.range(lo..hi).map(|(k, _)| k).collect();
        prop_assert_eq!(got, want);
    }
}
