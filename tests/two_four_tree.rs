use std::collections::{BTreeMap, VecDeque};

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use two_four_tree::{Error, Position, TwoFourTree};

mod common;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

/// Keys are drawn from a narrow range so that duplicates are common.
fn key_strategy() -> impl Strategy<Value = i64> {
    -300i64..300i64
}

fn value_strategy() -> impl Strategy<Value = i64> {
    any::<i64>()
}

/// Reference multimap: each key keeps its values oldest first.
type Model = BTreeMap<i64, VecDeque<i64>>;

fn model_size(model: &Model) -> usize {
    model.values().map(VecDeque::len).sum()
}

fn model_rank(model: &Model, key: i64) -> Option<usize> {
    model.contains_key(&key).then(|| model.range(..key).map(|(_, v)| v.len()).sum::<usize>() + 1)
}

fn model_entries(model: &Model) -> Vec<(i64, i64)> {
    model.iter().flat_map(|(&k, vs)| vs.iter().map(move |&v| (k, v))).collect()
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum TreeOp {
    Insert(i64, i64),
    Remove(i64),
    Search(i64),
    Duplicates(i64),
    Rank(i64),
    Select(usize),
}

fn tree_op_strategy() -> impl Strategy<Value = TreeOp> {
    prop_oneof![
        6 => (key_strategy(), value_strategy()).prop_map(|(k, v)| TreeOp::Insert(k, v)),
        4 => key_strategy().prop_map(TreeOp::Remove),
        1 => key_strategy().prop_map(TreeOp::Search),
        1 => key_strategy().prop_map(TreeOp::Duplicates),
        1 => key_strategy().prop_map(TreeOp::Rank),
        1 => (0usize..TEST_SIZE).prop_map(TreeOp::Select),
    ]
}

// ─── Model-based tests ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Replays a random sequence of operations on both the tree and a `BTreeMap` of queues and
    /// asserts identical results and a valid tree at every step.
    #[test]
    fn tree_ops_match_model(ops in proptest::collection::vec(tree_op_strategy(), TEST_SIZE)) {
        common::init_tracing();
        let mut tree: TwoFourTree<i64, i64> = TwoFourTree::new();
        let mut model = Model::new();

        for op in &ops {
            match *op {
                TreeOp::Insert(k, v) => {
                    tree.insert(k, v);
                    model.entry(k).or_default().push_back(v);
                }
                TreeOp::Remove(k) => {
                    let expected = match model.get_mut(&k) {
                        Some(values) => {
                            values.pop_front();
                            if values.is_empty() {
                                model.remove(&k);
                            }
                            true
                        }
                        None => false,
                    };
                    prop_assert_eq!(tree.remove(&k), expected, "remove({})", k);
                }
                TreeOp::Search(k) => {
                    let expected = model.get(&k).and_then(VecDeque::front);
                    prop_assert_eq!(tree.search(&k), expected, "search({})", k);
                }
                TreeOp::Duplicates(k) => {
                    let expected = model.get(&k).map_or(0, VecDeque::len);
                    prop_assert_eq!(tree.duplicates(&k), expected, "duplicates({})", k);
                }
                TreeOp::Rank(k) => {
                    prop_assert_eq!(tree.rank(&k), model_rank(&model, k), "rank({})", k);
                }
                TreeOp::Select(p) => {
                    let expected = model_entries(&model).get(p.wrapping_sub(1)).copied();
                    let actual = tree.select_entry(p).map(|(&k, &v)| (k, v));
                    prop_assert_eq!(actual, expected, "select_entry({})", p);
                }
            }
            tree.verify();
            prop_assert_eq!(tree.size(), model_size(&model), "size mismatch after {:?}", op);
            prop_assert_eq!(tree.is_empty(), model.is_empty(), "is_empty mismatch after {:?}", op);
        }

        let entries: Vec<_> = tree.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(entries, model_entries(&model));
    }

    /// For every stored key, selecting its rank yields the key back and every position covered
    /// by its duplicates resolves to it.
    #[test]
    fn rank_select_duality(entries in proptest::collection::vec((key_strategy(), value_strategy()), 1..TEST_SIZE)) {
        let tree: TwoFourTree<i64, i64> = entries.iter().copied().collect();

        for &(key, _) in &entries {
            let rank = tree.rank(&key).unwrap();
            for position in rank..rank + tree.duplicates(&key) {
                prop_assert_eq!(tree.select(position), Some(&key));
            }
            prop_assert_eq!(tree.try_rank(&key), Ok(rank));
        }
        prop_assert_eq!(tree.select(0), None);
        prop_assert_eq!(tree.select(entries.len() + 1), None);
    }

    /// Duplicates of one key never shift the rank of any other key below it.
    #[test]
    fn duplicates_only_shift_larger_keys(
        entries in proptest::collection::vec(key_strategy(), 1..500),
        key in key_strategy(),
        extra in 1usize..20,
    ) {
        let mut tree: TwoFourTree<i64, ()> = entries.iter().map(|&k| (k, ())).collect();
        let before: Vec<_> = entries.iter().map(|k| (*k, tree.rank(k))).collect();
        let size = tree.size();

        for _ in 0..extra {
            tree.insert(key, ());
        }
        tree.verify();
        prop_assert_eq!(tree.size(), size + extra);

        for (k, rank) in before {
            let shift = if k > key { extra } else { 0 };
            prop_assert_eq!(tree.rank(&k), rank.map(|r| r + shift), "rank({})", k);
        }
    }

    /// Distinct keys inserted in one random order and removed in another.
    #[test]
    fn shuffled_insert_then_shuffled_delete(
        inserts in Just((1..=100).collect::<Vec<i64>>()).prop_shuffle(),
        deletes in Just((1..=100).collect::<Vec<i64>>()).prop_shuffle(),
    ) {
        let mut tree = TwoFourTree::new();
        for (n, &key) in inserts.iter().enumerate() {
            tree.insert(key, key * 10);
            tree.verify();
            prop_assert_eq!(tree.size(), n + 1);
        }

        for (n, key) in deletes.iter().enumerate() {
            prop_assert!(tree.remove(key));
            tree.verify();
            prop_assert_eq!(tree.size(), deletes.len() - n - 1);
            prop_assert_eq!(tree.search(key), None);
        }
        prop_assert!(tree.is_empty());
        prop_assert_eq!(tree.height(), 0);
    }
}

// ─── Fixed sequences ─────────────────────────────────────────────────────────

fn sample_tree() -> TwoFourTree<i32, &'static str> {
    let mut tree = TwoFourTree::new();
    for key in [10, 20, 5, 6, 12, 30, 7, 17] {
        tree.insert(key, "v");
    }
    tree
}

#[test]
fn sample_inorder_rank_and_select() {
    common::init_tracing();
    let tree = sample_tree();
    tree.verify();

    assert_eq!(tree.inorder(), [&5, &6, &7, &10, &12, &17, &20, &30]);
    assert_eq!(tree.rank(&12), Some(5));
    assert_eq!(tree.select(5), Some(&12));
    assert_eq!(tree.size(), 8);
}

#[test]
fn sample_remove_internal_key() {
    let mut tree = sample_tree();

    assert!(tree.remove(&10));
    tree.verify();
    assert_eq!(tree.search(&10), None);
    assert_eq!(tree.size(), 7);
    assert_eq!(tree.inorder(), [&5, &6, &7, &12, &17, &20, &30]);
    assert_eq!(tree.rank(&12), Some(4));
}

#[test]
fn duplicate_values_share_a_key() {
    let mut tree = TwoFourTree::new();
    tree.insert(5, "a");
    tree.insert(5, "b");

    assert_eq!(tree.duplicates(&5), 2);
    assert_eq!(tree.size(), 2);
    assert_eq!(tree.rank(&5), Some(1));
    assert_eq!(tree.values(&5).map(|v| v.iter().copied().collect::<Vec<_>>()), Some(vec!["a", "b"]));

    assert!(tree.remove(&5));
    tree.verify();
    assert_eq!(tree.duplicates(&5), 1);
    assert!(tree.contains_key(&5));
    assert_eq!(tree.search(&5), Some(&"b"));
    assert_eq!(tree.rank(&5), Some(1));
}

#[test]
fn empty_tree_queries() {
    let tree: TwoFourTree<i32, i32> = TwoFourTree::new();

    assert_eq!(tree.select(1), None);
    assert_eq!(tree.rank(&7), None);
    assert_eq!(tree.try_select(1), Err(Error::EmptyTree));
    assert_eq!(tree.try_rank(&7), Err(Error::EmptyTree));
    assert_eq!(tree.search(&7), None);
    assert_eq!(tree.duplicates(&7), 0);
    assert_eq!(tree.iter().next(), None);
    assert_eq!(tree.dump().to_string(), "Tree is empty\n");
    tree.verify();
}

#[test]
fn permuted_insert_then_permuted_delete() {
    // Two fixed permutations of 1..=100 from different multipliers coprime to 101.
    let inserts: Vec<i64> = (1..=100).map(|i| (i * 37) % 101).collect();
    let deletes: Vec<i64> = (1..=100).map(|i| (i * 59) % 101).collect();

    let mut tree = TwoFourTree::new();
    for (n, &key) in inserts.iter().enumerate() {
        tree.insert(key, ());
        tree.verify();
        assert_eq!(tree.size(), n + 1);
    }
    let sorted: Vec<i64> = (1..=100).collect();
    assert_eq!(tree.inorder(), sorted.iter().collect::<Vec<_>>());

    for (n, key) in deletes.iter().enumerate() {
        assert!(tree.remove(key), "remove({key})");
        tree.verify();
        assert_eq!(tree.size(), 99 - n);
    }
    assert!(tree.is_empty());
}

// ─── API surface ─────────────────────────────────────────────────────────────

#[test]
fn value_at_reports_errors() {
    let tree = TwoFourTree::from([("k", 1), ("k", 2)]);

    assert_eq!(tree.value_at("k", 0), Ok(&1));
    assert_eq!(tree.value_at("k", 1), Ok(&2));
    assert_eq!(tree.value_at("k", 2), Err(Error::IndexOutOfRange { index: 2, len: 2 }));
    assert_eq!(tree.value_at("missing", 0), Err(Error::KeyNotFound));
}

#[test]
fn index_by_position_walks_duplicates() {
    let tree = TwoFourTree::from([(2, 'b'), (1, 'a'), (2, 'c'), (3, 'd')]);
    let values: Vec<char> = (1..=tree.size()).map(|p| tree[Position(p)]).collect();
    assert_eq!(values, ['a', 'b', 'c', 'd']);
}

#[test]
fn clear_then_reuse() {
    let mut tree: TwoFourTree<u32, u32> = (0..500).map(|k| (k, k)).collect();
    assert!(tree.height() > 1);

    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);

    tree.extend((0..10).map(|k| (k, k)));
    tree.verify();
    assert_eq!(tree.size(), 10);
}

#[test]
fn debug_lists_values_per_key() {
    let tree = TwoFourTree::from([(1, 'x'), (1, 'y'), (0, 'z')]);
    assert_eq!(format!("{tree:?}"), "{0: ['z'], 1: ['x', 'y']}");
}
