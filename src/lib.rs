//! # art-rs
//!
//! A memory-efficient ordered map using an Adaptive Radix Tree (ART).
//!
//! Based on "The Adaptive Radix Tree: ARTful Indexing for Main-Memory
//! Databases" (Leis, Kemper, Neumann, ICDE 2013). Internal fan-out adapts
//! between four node layouts (capacity 4, 16, 48, 256) based on how many
//! distinct child bytes a node currently holds, and chains of single-child
//! nodes are collapsed into an inline compressed prefix so structural depth
//! tracks the number of distinguishing bytes rather than the full key
//! length.
//!
//! ## Example
//!
//! ```rust
//! use art_rs::AdaptiveRadixTree;
//!
//! let mut tree: AdaptiveRadixTree<u64> = AdaptiveRadixTree::new();
//! tree.insert(b"hello", 1);
//! tree.insert(b"world", 2);
//!
//! assert_eq!(tree.get(b"hello"), Some(&1));
//! assert_eq!(tree.get(b"world"), Some(&2));
//! ```

mod debug;
mod node;
#[cfg(test)]
mod proptests;

pub use debug::{debug_print, verify_integrity};
pub use node::{
    GROW_NODE16, GROW_NODE4, GROW_NODE48, MAX_PREFIX_LEN, SHRINK_NODE16, SHRINK_NODE4,
    SHRINK_NODE48, SHRINK_NODE256,
};

use node::{ChildRef, InnerNode, Leaf};

/// An ordered map from byte-string keys to values, backed by an adaptive
/// radix tree.
///
/// All mutating operations are single-threaded and non-reentrant; see the
/// crate-level docs for the concurrency contract. Read-only operations
/// (`get`, `minimum`, `maximum`, `iter`, `iter_prefix`) perform no internal
/// mutation and may be called concurrently with each other.
pub struct AdaptiveRadixTree<V> {
    root: Option<ChildRef<V>>,
    size: usize,
}

impl<V> AdaptiveRadixTree<V> {
    pub fn new() -> Self {
        Self { root: None, size: 0 }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Look up `key`, verifying the full stored key on any terminal hit.
    ///
    /// Descent trusts inline-matched prefixes longer than `MAX_PREFIX_LEN`
    /// without re-checking every byte (the "semi-lazy" contract from the
    /// node layout); a leaf or `own_leaf` reached this way is still always
    /// compared against `key` in full before being accepted.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let mut node = self.root.as_ref()?;
        let mut depth = 0usize;
        loop {
            match node {
                ChildRef::Leaf(l) => return if l.key == key { Some(&l.value) } else { None },
                ChildRef::Inner(n) => {
                    let inline = n.inline_len();
                    if inline > 0
                        && (depth + inline > key.len() || n.partial[..inline] != key[depth..depth + inline])
                    {
                        return None;
                    }
                    let new_depth = depth + n.partial_len as usize;
                    if new_depth == key.len() {
                        return n.own_leaf.as_deref().filter(|l| l.key == key).map(|l| &l.value);
                    }
                    if new_depth > key.len() {
                        return None;
                    }
                    node = n.find_child(key[new_depth])?;
                    depth = new_depth + 1;
                }
            }
        }
    }

    /// Insert `key` → `value`, overwriting and returning any previous value.
    pub fn insert(&mut self, key: &[u8], value: V) -> Option<V> {
        let (new_root, old) = match self.root.take() {
            None => (ChildRef::Leaf(Box::new(Leaf::new(key.to_vec(), value))), None),
            Some(root) => insert_recursive(root, key, 0, value),
        };
        self.root = Some(new_root);
        if old.is_none() {
            self.size += 1;
        }
        old
    }

    /// Insert `key` → `value` only if `key` is absent; an existing value is
    /// left untouched but still returned.
    pub fn insert_no_replace(&mut self, key: &[u8], value: V) -> Option<V>
    where
        V: Clone,
    {
        let (new_root, old) = match self.root.take() {
            None => (ChildRef::Leaf(Box::new(Leaf::new(key.to_vec(), value))), None),
            Some(root) => insert_no_replace_recursive(root, key, 0, value),
        };
        self.root = Some(new_root);
        if old.is_none() {
            self.size += 1;
        }
        old
    }

    /// Remove `key`, returning its value if present.
    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        let root = self.root.take()?;
        let (new_root, removed) = remove_recursive(root, key, 0);
        self.root = new_root;
        if removed.is_some() {
            self.size -= 1;
        }
        removed
    }

    /// The lexicographically smallest key and its value.
    pub fn minimum(&self) -> Option<(&[u8], &V)> {
        self.root.as_ref().map(|r| {
            let leaf = r.minimum();
            (leaf.key.as_slice(), &leaf.value)
        })
    }

    /// The lexicographically largest key and its value.
    pub fn maximum(&self) -> Option<(&[u8], &V)> {
        self.root.as_ref().map(|r| {
            let leaf = r.maximum();
            (leaf.key.as_slice(), &leaf.value)
        })
    }

    /// Visit every key in ascending lexicographic order, calling `cb(key,
    /// value)` for each. The first non-zero value returned by `cb` halts
    /// traversal and is propagated as the result; a full traversal returns
    /// `0`.
    pub fn iter<'s>(&'s self, mut cb: impl FnMut(&'s [u8], &'s V) -> i32) -> i32 {
        match &self.root {
            Some(r) => iter_rec(r, &mut cb),
            None => 0,
        }
    }

    /// Like [`iter`](Self::iter), restricted to keys starting with `prefix`.
    pub fn iter_prefix<'s>(
        &'s self,
        prefix: &[u8],
        mut cb: impl FnMut(&'s [u8], &'s V) -> i32,
    ) -> i32 {
        match &self.root {
            Some(r) => iter_prefix_rec(r, prefix, 0, &mut cb),
            None => 0,
        }
    }

    /// All entries in ascending order, as an idiomatic alternative to
    /// [`iter`](Self::iter) for callers who don't need early termination.
    pub fn pairs(&self) -> std::vec::IntoIter<(&[u8], &V)> {
        let mut out: Vec<(&[u8], &V)> = Vec::with_capacity(self.size);
        self.iter(|k, v| {
            out.push((k, v));
            0
        });
        out.into_iter()
    }

    /// All entries starting with `prefix`, in ascending order.
    pub fn pairs_prefix<'a>(&'a self, prefix: &[u8]) -> std::vec::IntoIter<(&'a [u8], &'a V)> {
        let mut out: Vec<(&'a [u8], &'a V)> = Vec::new();
        self.iter_prefix(prefix, |k, v| {
            out.push((k, v));
            0
        });
        out.into_iter()
    }
}

impl<V> Default for AdaptiveRadixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn iter_rec<'s, V>(node: &'s ChildRef<V>, cb: &mut impl FnMut(&'s [u8], &'s V) -> i32) -> i32 {
    match node {
        ChildRef::Leaf(l) => cb(&l.key, &l.value),
        ChildRef::Inner(n) => {
            if let Some(leaf) = &n.own_leaf {
                let r = cb(&leaf.key, &leaf.value);
                if r != 0 {
                    return r;
                }
            }
            n.for_each_child(|_byte, child| {
                let r = iter_rec(child, cb);
                if r != 0 {
                    Some(r)
                } else {
                    None
                }
            })
            .unwrap_or(0)
        }
    }
}

/// `depth` is how many bytes of `prefix` have already been consumed on the
/// path down to `node`.
fn iter_prefix_rec<'s, V>(
    node: &'s ChildRef<V>,
    prefix: &[u8],
    depth: usize,
    cb: &mut impl FnMut(&'s [u8], &'s V) -> i32,
) -> i32 {
    match node {
        ChildRef::Leaf(l) => {
            if l.key.len() >= prefix.len() && l.key[..prefix.len()] == *prefix {
                cb(&l.key, &l.value)
            } else {
                0
            }
        }
        ChildRef::Inner(n) => {
            let remaining = prefix.len().saturating_sub(depth);
            if remaining == 0 {
                // The prefix was fully consumed by an ancestor: every key
                // reachable from here already starts with it.
                return iter_rec(node, cb);
            }
            let total = n.partial_len as usize;
            let cmp_len = remaining.min(total);
            for i in 0..cmp_len {
                if n.prefix_byte_at(i, depth) != prefix[depth + i] {
                    return 0;
                }
            }
            let new_depth = depth + total;
            if new_depth >= prefix.len() {
                return iter_rec(node, cb);
            }
            match n.find_child(prefix[new_depth]) {
                Some(child) => iter_prefix_rec(child, prefix, new_depth + 1, cb),
                None => 0,
            }
        }
    }
}

fn insert_recursive<V>(node: ChildRef<V>, key: &[u8], depth: usize, value: V) -> (ChildRef<V>, Option<V>) {
    match node {
        ChildRef::Leaf(mut leaf) => {
            if leaf.key == key {
                let old = std::mem::replace(&mut leaf.value, value);
                (ChildRef::Leaf(leaf), Some(old))
            } else {
                (split_leaf(leaf, key, depth, value), None)
            }
        }
        ChildRef::Inner(mut inner) => {
            let total = inner.partial_len as usize;
            let matched = inner.prefix_match(key, depth);
            if matched < total {
                return (split_inner(inner, key, depth, matched, value), None);
            }
            let new_depth = depth + total;
            if new_depth == key.len() {
                if let Some(leaf) = inner.own_leaf.as_mut() {
                    let old = std::mem::replace(&mut leaf.value, value);
                    return (ChildRef::Inner(inner), Some(old));
                }
                inner.own_leaf = Some(Box::new(Leaf::new(key.to_vec(), value)));
                return (ChildRef::Inner(inner), None);
            }
            let byte = key[new_depth];
            if let Some(child) = inner.take_child(byte) {
                let (new_child, old) = insert_recursive(child, key, new_depth + 1, value);
                inner.restore_child(byte, new_child);
                (ChildRef::Inner(inner), old)
            } else {
                inner.add_child(byte, ChildRef::Leaf(Box::new(Leaf::new(key.to_vec(), value))));
                (ChildRef::Inner(inner), None)
            }
        }
    }
}

fn insert_no_replace_recursive<V: Clone>(
    node: ChildRef<V>,
    key: &[u8],
    depth: usize,
    value: V,
) -> (ChildRef<V>, Option<V>) {
    match node {
        ChildRef::Leaf(leaf) => {
            if leaf.key == key {
                let old = leaf.value.clone();
                (ChildRef::Leaf(leaf), Some(old))
            } else {
                (split_leaf(leaf, key, depth, value), None)
            }
        }
        ChildRef::Inner(mut inner) => {
            let total = inner.partial_len as usize;
            let matched = inner.prefix_match(key, depth);
            if matched < total {
                return (split_inner(inner, key, depth, matched, value), None);
            }
            let new_depth = depth + total;
            if new_depth == key.len() {
                if let Some(leaf) = inner.own_leaf.as_ref() {
                    let old = leaf.value.clone();
                    return (ChildRef::Inner(inner), Some(old));
                }
                inner.own_leaf = Some(Box::new(Leaf::new(key.to_vec(), value)));
                return (ChildRef::Inner(inner), None);
            }
            let byte = key[new_depth];
            if let Some(child) = inner.take_child(byte) {
                let (new_child, old) = insert_no_replace_recursive(child, key, new_depth + 1, value);
                inner.restore_child(byte, new_child);
                (ChildRef::Inner(inner), old)
            } else {
                inner.add_child(byte, ChildRef::Leaf(Box::new(Leaf::new(key.to_vec(), value))));
                (ChildRef::Inner(inner), None)
            }
        }
    }
}

/// Split a leaf that diverges from `key` somewhere at or after `depth` into
/// a fresh N4 holding both. Either may end up as the new node's `own_leaf`
/// if the divergence point is exactly where one key ends.
fn split_leaf<V>(existing: Box<Leaf<V>>, key: &[u8], depth: usize, value: V) -> ChildRef<V> {
    let max_common = existing.key.len().min(key.len()) - depth;
    let mut common = 0;
    while common < max_common && existing.key[depth + common] == key[depth + common] {
        common += 1;
    }

    let mut splitter = InnerNode::new_node4();
    splitter.partial_len = common as u32;
    splitter.set_inline_prefix(&key[depth..depth + common]);

    let new_depth = depth + common;
    let new_leaf = Box::new(Leaf::new(key.to_vec(), value));

    if new_depth == existing.key.len() {
        splitter.own_leaf = Some(existing);
        splitter.add_child(key[new_depth], ChildRef::Leaf(new_leaf));
    } else if new_depth == key.len() {
        splitter.own_leaf = Some(new_leaf);
        splitter.add_child(existing.key[new_depth], ChildRef::Leaf(existing));
    } else {
        splitter.add_child(existing.key[new_depth], ChildRef::Leaf(existing));
        splitter.add_child(key[new_depth], ChildRef::Leaf(new_leaf));
    }
    ChildRef::Inner(Box::new(splitter))
}

/// Split `inner`'s compressed edge at the first mismatching byte (`matched`
/// bytes in, of `inner.partial_len` total), inserting a new key that
/// diverges there. `inner`'s own prefix is trimmed to what remains past the
/// divergence byte; a fresh N4 takes its place holding the shared prefix.
fn split_inner<V>(
    mut inner: Box<InnerNode<V>>,
    key: &[u8],
    depth: usize,
    matched: usize,
    value: V,
) -> ChildRef<V> {
    let old_total = inner.partial_len as usize;
    let diverge_byte = inner.prefix_byte_at(matched, depth);

    let remaining_total = old_total - matched - 1;
    let needed = remaining_total.min(MAX_PREFIX_LEN);
    let mut new_inline = [0u8; MAX_PREFIX_LEN];
    for (i, slot) in new_inline.iter_mut().enumerate().take(needed) {
        *slot = inner.prefix_byte_at(matched + 1 + i, depth);
    }
    inner.partial_len = remaining_total as u32;
    inner.partial = new_inline;

    let mut splitter = InnerNode::new_node4();
    splitter.partial_len = matched as u32;
    splitter.set_inline_prefix(&key[depth..depth + matched.min(MAX_PREFIX_LEN)]);

    let new_leaf = Box::new(Leaf::new(key.to_vec(), value));
    if depth + matched == key.len() {
        splitter.own_leaf = Some(new_leaf);
        splitter.add_child(diverge_byte, ChildRef::Inner(inner));
    } else {
        splitter.add_child(diverge_byte, ChildRef::Inner(inner));
        splitter.add_child(key[depth + matched], ChildRef::Leaf(new_leaf));
    }
    ChildRef::Inner(Box::new(splitter))
}

fn remove_recursive<V>(node: ChildRef<V>, key: &[u8], depth: usize) -> (Option<ChildRef<V>>, Option<V>) {
    match node {
        ChildRef::Leaf(leaf) => {
            if leaf.key == key {
                (None, Some(leaf.value))
            } else {
                (Some(ChildRef::Leaf(leaf)), None)
            }
        }
        ChildRef::Inner(mut inner) => {
            let total = inner.partial_len as usize;
            let matched = inner.prefix_match(key, depth);
            if matched < total {
                return (Some(ChildRef::Inner(inner)), None);
            }
            let new_depth = depth + total;
            if new_depth == key.len() {
                let matches = inner.own_leaf.as_ref().is_some_and(|l| l.key == key);
                if !matches {
                    return (Some(ChildRef::Inner(inner)), None);
                }
                let removed = inner.own_leaf.take().expect("checked above");
                return (inner.after_removal(depth), Some(removed.value));
            }
            let byte = key[new_depth];
            match inner.take_child(byte) {
                None => (Some(ChildRef::Inner(inner)), None),
                Some(child) => {
                    let (new_child, removed) = remove_recursive(child, key, new_depth + 1);
                    match new_child {
                        Some(c) => {
                            inner.restore_child(byte, c);
                            (Some(ChildRef::Inner(inner)), removed)
                        }
                        None => {
                            inner.delete_child(byte);
                            (inner.after_removal(depth), removed)
                        }
                    }
                }
            }
        }
    }
}
