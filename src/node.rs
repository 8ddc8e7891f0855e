//! ART node types with adaptive sizing.
//!
//! The key insight of ART is using different node layouts based on the
//! actual number of children:
//!
//! - Node4: up to 4 children (most common, smallest)
//! - Node16: 5-16 children (sorted keys, linear/SIMD-style search)
//! - Node48: 17-48 children (256-byte index + 48 pointers)
//! - Node256: 49-256 children (direct array indexing)
//!
//! Growth and shrink transitions use hysteresis (the shrink thresholds sit
//! below the symmetric midpoint of the node below) so that a workload that
//! oscillates around a capacity boundary doesn't thrash between layouts.

/// Inline path-compression budget. Only the first `MAX_PREFIX_LEN` bytes of
/// a compressed edge are stored in the node; longer prefixes are recovered
/// on demand from the minimum leaf in the subtree.
pub const MAX_PREFIX_LEN: usize = 10;

/// Grow Node4 -> Node16 when a 5th child would be added.
pub const GROW_NODE4: usize = 4;
/// Grow Node16 -> Node48 when a 17th child would be added.
pub const GROW_NODE16: usize = 16;
/// Grow Node48 -> Node256 when a 49th child would be added.
pub const GROW_NODE48: usize = 48;

/// Shrink Node256 -> Node48 once the count drops to this value.
pub const SHRINK_NODE256: usize = 37;
/// Shrink Node48 -> Node16 once the count drops to this value.
pub const SHRINK_NODE48: usize = 12;
/// Shrink Node16 -> Node4 once the count drops to this value.
pub const SHRINK_NODE16: usize = 3;
/// Below this count, a Node4 collapses or is replaced by its own leaf.
pub const SHRINK_NODE4: usize = 1;

/// A terminal record: the full key and its value.
///
/// The full key is kept (not just the bytes since the last branch) so that
/// a match can always be confirmed in full, even though descent only
/// verifies a bounded number of prefix bytes per node (see
/// [`InnerNode::prefix_match`]).
#[derive(Debug, Clone)]
pub struct Leaf<V> {
    pub key: Vec<u8>,
    pub value: V,
}

impl<V> Leaf<V> {
    pub fn new(key: Vec<u8>, value: V) -> Self {
        Self { key, value }
    }
}

/// A child slot: either another inner node or a leaf, realized as a sum
/// type rather than a pointer-tag trick. The discriminant is free (it's
/// the enum tag Rust already carries), leaf-vs-inner is an O(1) pattern
/// match, and the raw leaf is recovered without any bit-twiddling.
#[derive(Debug)]
pub enum ChildRef<V> {
    Inner(Box<InnerNode<V>>),
    Leaf(Box<Leaf<V>>),
}

impl<V> ChildRef<V> {
    pub fn as_leaf(&self) -> Option<&Leaf<V>> {
        match self {
            ChildRef::Leaf(l) => Some(l),
            ChildRef::Inner(_) => None,
        }
    }

    /// The minimum leaf reachable from this slot (see spec: `own_leaf` is
    /// preferred over descending into children, since it is always
    /// lexicographically smaller than anything reachable through a child).
    pub fn minimum(&self) -> &Leaf<V> {
        match self {
            ChildRef::Leaf(l) => l,
            ChildRef::Inner(n) => n.minimum(),
        }
    }

    /// The maximum leaf reachable from this slot. Unlike `minimum`,
    /// `own_leaf` is never preferred: every child subtree extends the
    /// `own_leaf` key by at least one byte, so it is always larger.
    pub fn maximum(&self) -> &Leaf<V> {
        match self {
            ChildRef::Leaf(l) => l,
            ChildRef::Inner(n) => n.maximum(),
        }
    }
}

/// An inner node: a compressed-prefix edge plus a byte-keyed child map, one
/// of four physical layouts chosen by the number of children currently
/// present.
#[derive(Debug)]
pub struct InnerNode<V> {
    /// True length of the path-compressed prefix on the edge entering this
    /// node. May exceed `MAX_PREFIX_LEN`; only the first
    /// `min(partial_len, MAX_PREFIX_LEN)` bytes are stored in `partial`.
    pub partial_len: u32,
    pub partial: [u8; MAX_PREFIX_LEN],
    /// A leaf whose key equals the path accumulated up to and including
    /// this node's prefix (i.e. a key that is a proper prefix of some
    /// other stored key, or the sole occupant of this subtree's root).
    pub own_leaf: Option<Box<Leaf<V>>>,
    pub body: NodeBody<V>,
}

#[derive(Debug)]
pub enum NodeBody<V> {
    N4(Node4<V>),
    N16(Node16<V>),
    N48(Node48<V>),
    N256(Node256<V>),
}

#[derive(Debug)]
pub struct Node4<V> {
    pub len: u8,
    pub keys: [u8; 4],
    pub children: [Option<ChildRef<V>>; 4],
}

#[derive(Debug)]
pub struct Node16<V> {
    pub len: u8,
    pub keys: [u8; 16],
    pub children: [Option<ChildRef<V>>; 16],
}

#[derive(Debug)]
pub struct Node48<V> {
    pub len: u8,
    /// 1-based slot index per byte; 0 means absent.
    pub index: Box<[u8; 256]>,
    pub children: [Option<ChildRef<V>>; 48],
}

#[derive(Debug)]
pub struct Node256<V> {
    pub len: u16,
    pub children: Box<[Option<ChildRef<V>>; 256]>,
}

fn empty_children<V, const N: usize>() -> [Option<ChildRef<V>>; N] {
    std::array::from_fn(|_| None)
}

impl<V> InnerNode<V> {
    pub fn new_node4() -> Self {
        Self {
            partial_len: 0,
            partial: [0; MAX_PREFIX_LEN],
            own_leaf: None,
            body: NodeBody::N4(Node4 {
                len: 0,
                keys: [0; 4],
                children: empty_children(),
            }),
        }
    }

    /// Set the inline prefix from a byte slice, truncating to
    /// `MAX_PREFIX_LEN` inline bytes. `partial_len` carries the true
    /// length, which the caller is responsible for setting separately when
    /// it exceeds `MAX_PREFIX_LEN` (the extra bytes aren't available here).
    pub fn set_inline_prefix(&mut self, bytes: &[u8]) {
        let n = bytes.len().min(MAX_PREFIX_LEN);
        self.partial[..n].copy_from_slice(&bytes[..n]);
    }

    pub fn num_children(&self) -> usize {
        match &self.body {
            NodeBody::N4(n) => n.len as usize,
            NodeBody::N16(n) => n.len as usize,
            NodeBody::N48(n) => n.len as usize,
            NodeBody::N256(n) => n.len as usize,
        }
    }

    /// Number of bytes of the compressed prefix actually stored inline.
    pub fn inline_len(&self) -> usize {
        (self.partial_len as usize).min(MAX_PREFIX_LEN)
    }

    /// The minimum leaf reachable from this node: `own_leaf` if present
    /// (it precedes every child lexicographically), else the leftmost
    /// child's minimum.
    pub fn minimum(&self) -> &Leaf<V> {
        if let Some(l) = &self.own_leaf {
            return l;
        }
        match &self.body {
            NodeBody::N4(n) => n.children[0].as_ref().unwrap().minimum(),
            NodeBody::N16(n) => n.children[0].as_ref().unwrap().minimum(),
            NodeBody::N48(n) => {
                let byte = (0..256).find(|&b| n.index[b] != 0).expect("non-empty node");
                n.children[n.index[byte] as usize - 1].as_ref().unwrap().minimum()
            }
            NodeBody::N256(n) => {
                let child = n.children.iter().find_map(|c| c.as_ref()).expect("non-empty node");
                child.minimum()
            }
        }
    }

    /// The maximum leaf reachable from this node. `own_leaf` is never
    /// preferred: every child key extends it by at least one byte.
    pub fn maximum(&self) -> &Leaf<V> {
        match &self.body {
            NodeBody::N4(n) => n.children[n.len as usize - 1].as_ref().unwrap().maximum(),
            NodeBody::N16(n) => n.children[n.len as usize - 1].as_ref().unwrap().maximum(),
            NodeBody::N48(n) => {
                let byte = (0..256).rev().find(|&b| n.index[b] != 0).expect("non-empty node");
                n.children[n.index[byte] as usize - 1].as_ref().unwrap().maximum()
            }
            NodeBody::N256(n) => {
                let child = n.children.iter().rev().find_map(|c| c.as_ref()).expect("non-empty node");
                child.maximum()
            }
        }
    }

    /// Fetch the byte of the logical (possibly longer-than-inline) prefix
    /// at position `idx` (`0 <= idx < partial_len`). For `idx < MAX_PREFIX_LEN`
    /// this reads the inline cache; beyond that it recovers the byte from
    /// the minimum leaf under this node at the corresponding absolute key
    /// position: `partial` always mirrors the minimum leaf's key at this
    /// node's depth, so the two agree wherever the inline cache runs out.
    pub fn prefix_byte_at(&self, idx: usize, node_depth: usize) -> u8 {
        if idx < MAX_PREFIX_LEN {
            self.partial[idx]
        } else {
            self.minimum().key[node_depth + idx]
        }
    }

    /// Count how many bytes of `key[depth..]` match this node's logical
    /// prefix, up to the full `partial_len`. Recovers bytes beyond the
    /// inline cache from the minimum leaf only when the inline portion
    /// matched completely and the true prefix is longer. This and
    /// `collapse_prefix_into` below are the only two call sites that ever
    /// need to look past the inline cache.
    pub fn prefix_match(&self, key: &[u8], depth: usize) -> usize {
        let total = self.partial_len as usize;
        let inline = total.min(MAX_PREFIX_LEN);
        let avail = key.len().saturating_sub(depth);
        let mut matched = 0;
        while matched < inline && matched < avail && self.partial[matched] == key[depth + matched] {
            matched += 1;
        }
        if matched < inline || matched >= total {
            return matched;
        }
        // Inline portion matched in full but the true prefix is longer:
        // recover the rest from the minimum leaf.
        let min_key = &self.minimum().key;
        while matched < total && depth + matched < key.len() && depth + matched < min_key.len()
            && min_key[depth + matched] == key[depth + matched]
        {
            matched += 1;
        }
        matched
    }

    pub fn find_child(&self, byte: u8) -> Option<&ChildRef<V>> {
        match &self.body {
            NodeBody::N4(n) => (0..n.len as usize).find(|&i| n.keys[i] == byte).and_then(|i| n.children[i].as_ref()),
            NodeBody::N16(n) => (0..n.len as usize).find(|&i| n.keys[i] == byte).and_then(|i| n.children[i].as_ref()),
            NodeBody::N48(n) => {
                let slot = n.index[byte as usize];
                if slot == 0 { None } else { n.children[slot as usize - 1].as_ref() }
            }
            NodeBody::N256(n) => n.children[byte as usize].as_ref(),
        }
    }

    /// Remove and return the child at `byte`, if present, leaving the
    /// node's bookkeeping (length, index table) unchanged. Paired with
    /// either `restore_child` (recursion left the subtree non-empty) or
    /// `delete_child` (the subtree vanished).
    pub fn take_child(&mut self, byte: u8) -> Option<ChildRef<V>> {
        match &mut self.body {
            NodeBody::N4(n) => (0..n.len as usize).find(|&i| n.keys[i] == byte).and_then(|i| n.children[i].take()),
            NodeBody::N16(n) => (0..n.len as usize).find(|&i| n.keys[i] == byte).and_then(|i| n.children[i].take()),
            NodeBody::N48(n) => {
                let slot = n.index[byte as usize];
                if slot == 0 { None } else { n.children[slot as usize - 1].take() }
            }
            NodeBody::N256(n) => n.children[byte as usize].take(),
        }
    }

    /// Put a child back under `byte` after `take_child` removed it for
    /// recursion; the byte mapping and count are untouched.
    pub fn restore_child(&mut self, byte: u8, child: ChildRef<V>) {
        match &mut self.body {
            NodeBody::N4(n) => {
                let i = (0..n.len as usize).find(|&i| n.keys[i] == byte).expect("slot was taken");
                n.children[i] = Some(child);
            }
            NodeBody::N16(n) => {
                let i = (0..n.len as usize).find(|&i| n.keys[i] == byte).expect("slot was taken");
                n.children[i] = Some(child);
            }
            NodeBody::N48(n) => {
                let slot = n.index[byte as usize];
                n.children[slot as usize - 1] = Some(child);
            }
            NodeBody::N256(n) => {
                n.children[byte as usize] = Some(child);
            }
        }
    }

    /// Add a child under a byte known not to be present, growing the node
    /// to the next capacity first if it is full.
    pub fn add_child(&mut self, byte: u8, child: ChildRef<V>) {
        loop {
            match &mut self.body {
                NodeBody::N4(n) if (n.len as usize) < GROW_NODE4 => {
                    let i = n.len as usize;
                    n.keys[i] = byte;
                    n.children[i] = Some(child);
                    n.len += 1;
                    return;
                }
                NodeBody::N4(_) => self.grow_to_16(),
                NodeBody::N16(n) if (n.len as usize) < GROW_NODE16 => {
                    let i = n.len as usize;
                    n.keys[i] = byte;
                    n.children[i] = Some(child);
                    n.len += 1;
                    return;
                }
                NodeBody::N16(_) => self.grow_to_48(),
                NodeBody::N48(n) if (n.len as usize) < GROW_NODE48 => {
                    let slot = (0..48).find(|&s| n.children[s].is_none()).expect("room for a child");
                    n.children[slot] = Some(child);
                    n.index[byte as usize] = slot as u8 + 1;
                    n.len += 1;
                    return;
                }
                NodeBody::N48(_) => self.grow_to_256(),
                NodeBody::N256(n) => {
                    n.children[byte as usize] = Some(child);
                    n.len += 1;
                    return;
                }
            }
        }
    }

    fn grow_to_16(&mut self) {
        if let NodeBody::N4(n) = &mut self.body {
            let mut keys = [0u8; 16];
            keys[..4].copy_from_slice(&n.keys);
            let mut children = empty_children::<V, 16>();
            for (i, c) in n.children.iter_mut().enumerate() {
                children[i] = c.take();
            }
            self.body = NodeBody::N16(Node16 { len: n.len, keys, children });
        }
    }

    fn grow_to_48(&mut self) {
        if let NodeBody::N16(n) = &mut self.body {
            let mut index = Box::new([0u8; 256]);
            let mut children = empty_children::<V, 48>();
            for i in 0..n.len as usize {
                children[i] = n.children[i].take();
                index[n.keys[i] as usize] = i as u8 + 1;
            }
            self.body = NodeBody::N48(Node48 { len: n.len, index, children });
        }
    }

    fn grow_to_256(&mut self) {
        if let NodeBody::N48(n) = &mut self.body {
            let mut children = Box::new(empty_children::<V, 256>());
            for byte in 0..256u16 {
                let slot = n.index[byte as usize];
                if slot != 0 {
                    children[byte as usize] = n.children[slot as usize - 1].take();
                }
            }
            self.body = NodeBody::N256(Node256 { len: n.len as u16, children });
        }
    }

    /// Remove the byte mapping for a child whose subtree has vanished
    /// entirely, shrinking the node's layout per the hysteresis thresholds
    /// if needed.
    pub fn delete_child(&mut self, byte: u8) {
        match &mut self.body {
            NodeBody::N4(n) => {
                let i = (0..n.len as usize).find(|&i| n.keys[i] == byte).expect("byte present");
                for j in i..n.len as usize - 1 {
                    n.keys[j] = n.keys[j + 1];
                    n.children[j] = n.children[j + 1].take();
                }
                n.len -= 1;
            }
            NodeBody::N16(n) => {
                let i = (0..n.len as usize).find(|&i| n.keys[i] == byte).expect("byte present");
                for j in i..n.len as usize - 1 {
                    n.keys[j] = n.keys[j + 1];
                    n.children[j] = n.children[j + 1].take();
                }
                n.len -= 1;
                if n.len as usize == SHRINK_NODE16 {
                    self.shrink_to_4();
                }
            }
            NodeBody::N48(n) => {
                let slot = n.index[byte as usize];
                n.index[byte as usize] = 0;
                n.children[slot as usize - 1] = None;
                n.len -= 1;
                if n.len as usize == SHRINK_NODE48 {
                    self.shrink_to_16();
                }
            }
            NodeBody::N256(n) => {
                n.children[byte as usize] = None;
                n.len -= 1;
                if n.len as usize == SHRINK_NODE256 {
                    self.shrink_to_48();
                }
            }
        }
    }

    fn shrink_to_4(&mut self) {
        if let NodeBody::N16(n) = &mut self.body {
            let count = n.len as usize;
            let mut keys = [0u8; 4];
            let mut children = empty_children::<V, 4>();
            keys[..count].copy_from_slice(&n.keys[..count]);
            for i in 0..count {
                children[i] = n.children[i].take();
            }
            self.body = NodeBody::N4(Node4 { len: n.len, keys, children });
        }
    }

    fn shrink_to_16(&mut self) {
        if let NodeBody::N48(n) = &mut self.body {
            let mut keys = [0u8; 16];
            let mut children = empty_children::<V, 16>();
            let mut next = 0usize;
            for byte in 0..256usize {
                let slot = n.index[byte];
                if slot != 0 {
                    keys[next] = byte as u8;
                    children[next] = n.children[slot as usize - 1].take();
                    next += 1;
                }
            }
            self.body = NodeBody::N16(Node16 { len: n.len, keys, children });
        }
    }

    fn shrink_to_48(&mut self) {
        if let NodeBody::N256(n) = &mut self.body {
            let mut index = Box::new([0u8; 256]);
            let mut children = empty_children::<V, 48>();
            let mut next = 0usize;
            for byte in 0..256usize {
                if let Some(c) = n.children[byte].take() {
                    children[next] = Some(c);
                    index[byte] = next as u8 + 1;
                    next += 1;
                }
            }
            self.body = NodeBody::N48(Node48 { len: n.len as u8, index, children });
        }
    }

    /// Resolve the terminal states after a child or `own_leaf` removal has
    /// brought this node down to 0 or 1 children: an N4 left with nothing
    /// becomes its own leaf (if any) or disappears; an N4 left with exactly
    /// one child and no `own_leaf` always collapses into that child
    /// directly, concatenating prefixes when the child is itself an inner
    /// node (a leaf child carries no prefix to merge, so the concatenation
    /// step is skipped for it).
    ///
    /// `node_depth` is this node's own depth, needed to recover prefix
    /// bytes beyond the inline cache during the merge.
    pub fn after_removal(mut self, node_depth: usize) -> Option<ChildRef<V>> {
        if let NodeBody::N4(n) = &mut self.body {
            if n.len as usize == SHRINK_NODE4 - 1 {
                return self.own_leaf.take().map(ChildRef::Leaf);
            }
            if n.len as usize == SHRINK_NODE4 && self.own_leaf.is_none() {
                let byte = n.keys[0];
                let child = n.children[0].take().expect("single child present");
                return Some(match child {
                    ChildRef::Leaf(l) => ChildRef::Leaf(l),
                    ChildRef::Inner(mut inner) => {
                        self.collapse_prefix_into(byte, node_depth, &mut inner);
                        ChildRef::Inner(inner)
                    }
                });
            }
        }
        Some(ChildRef::Inner(Box::new(self)))
    }

    /// Visit children in ascending byte order, calling `f(byte, child)`.
    /// Stops and propagates as soon as `f` returns `Some`.
    pub fn for_each_child<'a, R>(&'a self, mut f: impl FnMut(u8, &'a ChildRef<V>) -> Option<R>) -> Option<R> {
        match &self.body {
            NodeBody::N4(n) => {
                for i in 0..n.len as usize {
                    if let Some(r) = f(n.keys[i], n.children[i].as_ref().unwrap()) {
                        return Some(r);
                    }
                }
                None
            }
            NodeBody::N16(n) => {
                for i in 0..n.len as usize {
                    if let Some(r) = f(n.keys[i], n.children[i].as_ref().unwrap()) {
                        return Some(r);
                    }
                }
                None
            }
            NodeBody::N48(n) => {
                for byte in 0..256usize {
                    let slot = n.index[byte];
                    if slot != 0 {
                        if let Some(r) = f(byte as u8, n.children[slot as usize - 1].as_ref().unwrap()) {
                            return Some(r);
                        }
                    }
                }
                None
            }
            NodeBody::N256(n) => {
                for byte in 0..256usize {
                    if let Some(c) = n.children[byte].as_ref() {
                        if let Some(r) = f(byte as u8, c) {
                            return Some(r);
                        }
                    }
                }
                None
            }
        }
    }

    /// Build the replacement prefix for a child absorbed by collapse: the
    /// N4 being collapsed (`self`) contributes its logical prefix plus the
    /// edge byte leading to `child`; the combined prefix is written into
    /// `child`. Recovers bytes beyond the inline cache from the minimum
    /// leaf under `self` (the other call site needing this recovery is
    /// `prefix_match`'s insert-time mismatch check).
    ///
    /// `node_depth` is `self`'s depth (bytes consumed before `self`'s own
    /// prefix begins); `child`'s prefix originally began at
    /// `node_depth + self_total + 1`.
    pub fn collapse_prefix_into(&self, edge_byte: u8, node_depth: usize, child: &mut InnerNode<V>) {
        let self_total = self.partial_len as usize;
        let child_total = child.partial_len as usize;
        let child_depth = node_depth + self_total + 1;
        let new_total = self_total + 1 + child_total;
        let needed = new_total.min(MAX_PREFIX_LEN);

        let mut new_inline = [0u8; MAX_PREFIX_LEN];
        for (p, slot) in new_inline.iter_mut().enumerate().take(needed) {
            *slot = if p < self_total {
                self.prefix_byte_at(p, node_depth)
            } else if p == self_total {
                edge_byte
            } else {
                child.prefix_byte_at(p - self_total - 1, child_depth)
            };
        }
        child.partial_len = new_total as u32;
        child.partial = new_inline;
    }
}
