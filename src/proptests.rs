use std::collections::BTreeMap;

use proptest::prelude::*;
use proptest_derive::Arbitrary;

use crate::AdaptiveRadixTree;

/// Simple model implementation using BTreeMap for comparison.
#[derive(Default, Clone)]
struct Model {
    map: BTreeMap<Vec<u8>, u64>,
}

impl Model {
    fn insert(&mut self, key: Vec<u8>, value: u64) -> Option<u64> {
        self.map.insert(key, value)
    }

    fn insert_no_replace(&mut self, key: Vec<u8>, value: u64) -> Option<u64> {
        if let Some(existing) = self.map.get(&key) {
            Some(*existing)
        } else {
            self.map.insert(key, value);
            None
        }
    }

    fn get(&self, key: &[u8]) -> Option<&u64> {
        self.map.get(key)
    }

    fn remove(&mut self, key: &[u8]) -> Option<u64> {
        self.map.remove(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn pairs(&self) -> Vec<(Vec<u8>, u64)> {
        self.map.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    fn pairs_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, u64)> {
        self.map
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}

/// Actions to test against both implementations.
#[derive(Arbitrary, Debug, Clone)]
enum Action {
    Insert(KeyValue),
    InsertNoReplace(KeyValue),
    Get(Key),
    Remove(Key),
    Iter,
    IterPrefix(Key),
}

/// Wrapper for key generation with a strategy biased toward structures that
/// exercise path compression and prefix coexistence.
#[derive(Debug, Clone)]
struct Key(Vec<u8>);

/// Wrapper for key-value pair.
#[derive(Debug, Clone)]
struct KeyValue {
    key: Key,
    value: u64,
}

impl Arbitrary for Key {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            // Empty key
            Just(Key(vec![])),
            // Short keys (1-4 bytes)
            prop::collection::vec(any::<u8>(), 1..4).prop_map(Key),
            // Medium keys (4-64 bytes), to encourage path compression
            prop::collection::vec(any::<u8>(), 4..64).prop_map(Key),
            // Keys with natural delimiters, to exercise splitting
            "[a-z]{4,8}/[a-z]{1,8}".prop_map(|s| Key(s.into_bytes())),
            "[a-z]{4,8}:[a-z]{1,8}".prop_map(|s| Key(s.into_bytes())),
            // Keys that are a proper prefix of a sibling key, to exercise
            // `own_leaf`
            "[a-z]{4,8}".prop_map(|prefix| {
                let mut key = prefix.clone().into_bytes();
                key.extend_from_slice(b"/suffix");
                Key(key)
            }),
            "[a-z]{4,8}".prop_map(|s| Key(s.into_bytes())),
        ]
        .boxed()
    }
}

impl Arbitrary for KeyValue {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<Key>(), any::<u64>())
            .prop_map(|(key, value)| KeyValue { key, value })
            .boxed()
    }
}

/// Test harness that executes actions on both the tree and the model.
#[derive(Default)]
struct Test {
    tree: AdaptiveRadixTree<u64>,
    model: Model,
}

impl Test {
    fn execute(&mut self, action: Action) {
        match action {
            Action::Insert(kv) => {
                let key = kv.key.0.clone();
                let tree_result = self.tree.insert(&key, kv.value);
                let model_result = self.model.insert(key.clone(), kv.value);
                assert_eq!(tree_result, model_result, "insert mismatch for key={:?}", key);
            }
            Action::InsertNoReplace(kv) => {
                let key = kv.key.0.clone();
                let tree_result = self.tree.insert_no_replace(&key, kv.value);
                let model_result = self.model.insert_no_replace(key.clone(), kv.value);
                assert_eq!(tree_result, model_result, "insert_no_replace mismatch for key={:?}", key);
            }
            Action::Get(key) => {
                let key_bytes = key.0.clone();
                assert_eq!(
                    self.tree.get(&key_bytes),
                    self.model.get(&key_bytes),
                    "get mismatch for key={:?}",
                    key_bytes
                );
            }
            Action::Remove(key) => {
                let key_bytes = key.0.clone();
                let tree_result = self.tree.remove(&key_bytes);
                let model_result = self.model.remove(&key_bytes);
                assert_eq!(tree_result, model_result, "remove mismatch for key={:?}", key_bytes);
            }
            Action::Iter => {
                let tree_pairs: Vec<(Vec<u8>, u64)> =
                    self.tree.pairs().map(|(k, v)| (k.to_vec(), *v)).collect();
                assert_eq!(tree_pairs, self.model.pairs(), "iter mismatch");
            }
            Action::IterPrefix(prefix) => {
                let tree_pairs: Vec<(Vec<u8>, u64)> = self
                    .tree
                    .pairs_prefix(&prefix.0)
                    .map(|(k, v)| (k.to_vec(), *v))
                    .collect();
                assert_eq!(
                    tree_pairs,
                    self.model.pairs_prefix(&prefix.0),
                    "iter_prefix mismatch for prefix={:?}",
                    prefix.0
                );
            }
        }
        assert_eq!(self.tree.len(), self.model.len(), "length mismatch after action");
        assert_eq!(self.tree.is_empty(), self.model.is_empty(), "is_empty mismatch after action");
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn proptest_vs_btreemap(actions in prop::collection::vec(any::<Action>(), 1..64)) {
        let mut test = Test::default();
        for action in actions {
            test.execute(action);
        }
    }
}
