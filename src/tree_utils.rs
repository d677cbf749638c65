//! Tree traversal and validation utilities
//!
//! Diagnostics over the same page-fetch contract the engine uses: level-order
//! page collection, in-order entry collection, and a full structural check of
//! the B-tree invariants.

use crate::btree::{BTree, MAX_TREE_DEPTH};
use crate::error::{Error, PageId, Result};
use crate::io::FileStore;
use std::collections::VecDeque;

/// Summary of a validated tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    /// Levels from root to leaf (0 for an unpopulated tree)
    pub depth: usize,
    /// Reachable pages
    pub nodes: u64,
    /// Live key/value entries
    pub entries: u64,
}

/// Collect all reachable page ids in level order.
pub fn collect_pages(tree: &mut BTree) -> Result<Vec<PageId>> {
    let mut pages = Vec::new();
    let Some(root) = tree.root() else { return Ok(pages) };

    let mut queue = VecDeque::new();
    queue.push_back(root);
    while let Some(page_id) = queue.pop_front() {
        pages.push(page_id);
        let node = tree.store.read_node(page_id)?;
        if !node.is_leaf() {
            queue.extend(node.children.iter().copied());
        }
    }
    Ok(pages)
}

/// Collect all key/value entries in ascending key order.
pub fn collect_entries(tree: &mut BTree) -> Result<Vec<(i32, i32)>> {
    let mut entries = Vec::new();
    if let Some(root) = tree.root() {
        collect_in_order(&mut tree.store, root, &mut entries, 0)?;
    }
    Ok(entries)
}

fn collect_in_order(
    store: &mut FileStore,
    page_id: PageId,
    out: &mut Vec<(i32, i32)>,
    depth: usize,
) -> Result<()> {
    if depth >= MAX_TREE_DEPTH {
        return Err(Error::Corruption {
            details: format!("tree deeper than {MAX_TREE_DEPTH} levels"),
            page_id: Some(page_id),
        });
    }

    let node = store.read_node(page_id)?;
    for i in 0..node.key_count() {
        if !node.is_leaf() {
            collect_in_order(store, node.children[i], out, depth + 1)?;
        }
        out.push((node.keys[i], node.values[i]));
    }
    if !node.is_leaf() {
        collect_in_order(store, node.children[node.key_count()], out, depth + 1)?;
    }
    Ok(())
}

/// Check every structural invariant of the tree.
///
/// Verifies per-node key ordering, the separation bounds inherited from
/// parent keys, the occupancy range (non-root nodes hold at least t-1 keys,
/// no node more than order-1), and that every leaf sits at the same depth.
pub fn validate_tree(tree: &mut BTree) -> Result<TreeStats> {
    let order = tree.order();
    let Some(root) = tree.root() else { return Ok(TreeStats { depth: 0, nodes: 0, entries: 0 }) };

    let (depth, nodes, entries) =
        validate_subtree(&mut tree.store, root, None, None, order, true, 0)?;
    Ok(TreeStats { depth, nodes, entries })
}

/// Recursively validate one subtree, returning its uniform leaf depth,
/// page count and entry count.
fn validate_subtree(
    store: &mut FileStore,
    page_id: PageId,
    min: Option<i32>,
    max: Option<i32>,
    order: usize,
    is_root: bool,
    depth: usize,
) -> Result<(usize, u64, u64)> {
    if depth >= MAX_TREE_DEPTH {
        return Err(Error::Corruption {
            details: format!("tree depth exceeds maximum {MAX_TREE_DEPTH}"),
            page_id: Some(page_id),
        });
    }

    let node = store.read_node(page_id)?;
    // Occupancy floor actually guaranteed by the split procedure; equal to
    // ceil(order/2) - 1 for even orders.
    let min_keys = order / 2 - 1;
    let max_keys = order - 1;

    if node.key_count() > max_keys {
        return Err(Error::Corruption {
            details: format!("page {page_id} holds {} keys, maximum {max_keys}", node.key_count()),
            page_id: Some(page_id),
        });
    }
    if !is_root && node.key_count() < min_keys {
        return Err(Error::Corruption {
            details: format!("page {page_id} holds {} keys, minimum {min_keys}", node.key_count()),
            page_id: Some(page_id),
        });
    }

    for window in node.keys.windows(2) {
        if window[0] >= window[1] {
            return Err(Error::Corruption {
                details: format!("keys not strictly ascending in page {page_id}"),
                page_id: Some(page_id),
            });
        }
    }
    if let (Some(min), Some(&first)) = (min, node.keys.first()) {
        if first <= min {
            return Err(Error::Corruption {
                details: format!("page {page_id} violates its lower separation bound {min}"),
                page_id: Some(page_id),
            });
        }
    }
    if let (Some(max), Some(&last)) = (max, node.keys.last()) {
        if last >= max {
            return Err(Error::Corruption {
                details: format!("page {page_id} violates its upper separation bound {max}"),
                page_id: Some(page_id),
            });
        }
    }

    let mut nodes = 1u64;
    let mut entries = node.key_count() as u64;

    if node.is_leaf() {
        return Ok((1, nodes, entries));
    }

    // Each child is bounded by the separators on either side of it.
    let mut uniform_depth = None;
    for (i, &child) in node.children.iter().enumerate() {
        let child_min = if i == 0 { min } else { Some(node.keys[i - 1]) };
        let child_max = if i == node.key_count() { max } else { Some(node.keys[i]) };

        let (child_depth, child_nodes, child_entries) =
            validate_subtree(store, child, child_min, child_max, order, false, depth + 1)?;

        match uniform_depth {
            None => uniform_depth = Some(child_depth),
            Some(expected) if expected != child_depth => {
                return Err(Error::Corruption {
                    details: format!(
                        "leaves under page {page_id} sit at depths {expected} and {child_depth}"
                    ),
                    page_id: Some(page_id),
                });
            }
            Some(_) => {}
        }
        nodes += child_nodes;
        entries += child_entries;
    }

    match uniform_depth {
        Some(child_depth) => Ok((child_depth + 1, nodes, entries)),
        None => Err(Error::Corruption {
            details: format!("branch page {page_id} has no children"),
            page_id: Some(page_id),
        }),
    }
}
