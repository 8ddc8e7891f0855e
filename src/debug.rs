//! Debug utilities for ART troubleshooting: a structural dump and a
//! non-panicking integrity check, both read-only walks of the same shape
//! the invariants in the node layout describe.

use crate::node::{ChildRef, InnerNode, NodeBody};
use crate::AdaptiveRadixTree;

/// Print the tree structure to stdout for ad hoc troubleshooting.
pub fn debug_print<V: std::fmt::Debug>(tree: &AdaptiveRadixTree<V>) {
    println!("=== ART Debug ===");
    println!("size: {}", tree.len());
    match &tree.root {
        Some(root) => debug_child(root, 0),
        None => println!("(empty)"),
    }
    println!("=================");
}

fn debug_child<V: std::fmt::Debug>(node: &ChildRef<V>, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        ChildRef::Leaf(l) => {
            println!("{}Leaf {:?} -> {:?}", indent, String::from_utf8_lossy(&l.key), l.value);
        }
        ChildRef::Inner(n) => {
            let variant = match &n.body {
                NodeBody::N4(_) => "N4",
                NodeBody::N16(_) => "N16",
                NodeBody::N48(_) => "N48",
                NodeBody::N256(_) => "N256",
            };
            println!(
                "{}{} (partial_len={}, children={})",
                indent,
                variant,
                n.partial_len,
                n.num_children()
            );
            if let Some(leaf) = &n.own_leaf {
                println!("{}  [own_leaf {:?} -> {:?}]", indent, String::from_utf8_lossy(&leaf.key), leaf.value);
            }
            n.for_each_child(|byte, child| {
                println!("{}  [{:#04x}] ->", indent, byte);
                debug_child(child, depth + 2);
                None::<()>
            });
        }
    }
}

/// Walk the tree checking the structural invariants from the node layout,
/// returning a list of violations (empty if none). Unlike the rest of the
/// crate, this never panics on a malformed tree — it's meant to diagnose
/// one.
pub fn verify_integrity<V>(tree: &AdaptiveRadixTree<V>) -> Vec<String> {
    let mut issues = Vec::new();
    if let Some(root) = &tree.root {
        verify_child(root, &mut issues, Vec::new());
    }
    issues
}

fn verify_child<V>(node: &ChildRef<V>, issues: &mut Vec<String>, path: Vec<u8>) {
    match node {
        ChildRef::Leaf(l) => {
            if !path.is_empty() && !l.key.starts_with(&path) {
                issues.push(format!("leaf at path {:?} has key {:?} not extending it", path, l.key));
            }
        }
        ChildRef::Inner(n) => {
            verify_inner(n, issues, &path);
            n.for_each_child(|byte, child| {
                let mut new_path = path.clone();
                new_path.push(byte);
                verify_child(child, issues, new_path);
                None::<()>
            });
        }
    }
}

fn verify_inner<V>(n: &InnerNode<V>, issues: &mut Vec<String>, path: &[u8]) {
    let count = n.num_children();
    let has_own_leaf = n.own_leaf.is_some();
    if count == 0 && !has_own_leaf {
        issues.push(format!("inner node at {:?} has no children and no own_leaf", path));
    }
    match &n.body {
        NodeBody::N4(b) => {
            if count > 4 {
                issues.push(format!("N4 at {:?} has {} children (max 4)", path, count));
            }
            for i in 0..count {
                for j in (i + 1)..count {
                    if b.keys[i] == b.keys[j] {
                        issues.push(format!("N4 at {:?} has duplicate key {}", path, b.keys[i]));
                    }
                }
            }
        }
        NodeBody::N16(b) => {
            if count > 16 {
                issues.push(format!("N16 at {:?} has {} children (max 16)", path, count));
            }
            for i in 1..count {
                if b.keys[i - 1] >= b.keys[i] {
                    issues.push(format!("N16 at {:?} keys not strictly increasing", path));
                }
            }
        }
        NodeBody::N48(b) => {
            if count > 48 {
                issues.push(format!("N48 at {:?} has {} children (max 48)", path, count));
            }
            let indexed = b.index.iter().filter(|&&s| s != 0).count();
            if indexed != count {
                issues.push(format!(
                    "N48 at {:?} has {} indexed bytes but num_children={}",
                    path, indexed, count
                ));
            }
        }
        NodeBody::N256(b) => {
            let actual = b.children.iter().filter(|c| c.is_some()).count();
            if actual != count {
                issues.push(format!(
                    "N256 at {:?} has {} Some children but num_children={}",
                    path, actual, count
                ));
            }
        }
    }
}
