//! Node records and their fixed-width binary encoding
//!
//! Every node of the tree is one fixed-size record in the backing file,
//! addressed by page id. The record width is a function of the tree order
//! alone, so a page id maps to a deterministic file offset.

use crate::error::{Error, PageId, Result};
use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Smallest tree order the on-disk format supports
pub const MIN_ORDER: usize = 3;

/// Sentinel written into unused key, value and child slots
pub const NO_SLOT: i32 = -1;

/// Fixed record header: key_count (u64) + flags (u8) + page_id (u64)
pub const NODE_HEADER_SIZE: usize = 8 + 1 + 8;

bitflags! {
    /// Flags stored in the one-byte field of a node record
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        /// Leaf node (no children)
        const LEAF = 0x01;
    }
}

/// Record width in bytes for a tree of the given order, unchecked.
///
/// Header + (order-1) key slots + (order-1) value slots + order child slots.
pub(crate) const fn raw_record_size(order: usize) -> usize {
    NODE_HEADER_SIZE + (order - 1) * 4 + (order - 1) * 4 + order * 4
}

/// Record width in bytes for a tree of the given order.
pub fn record_size(order: usize) -> Result<usize> {
    if order < MIN_ORDER {
        return Err(Error::InvalidParameter("tree order must be at least 3"));
    }
    Ok(raw_record_size(order))
}

/// One node of the tree, decoded from (or about to be encoded into) a record.
///
/// In memory the vectors are sized to the live entry count; the -1 sentinel
/// exists only in the on-disk encoding. A branch node with `n` keys holds
/// exactly `n + 1` children; a leaf holds none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// This node's own position in the file, stored redundantly in the record
    pub page_id: PageId,
    /// Node flags (leaf bit)
    pub flags: NodeFlags,
    /// Keys, strictly ascending
    pub keys: Vec<i32>,
    /// Payload parallel to `keys`
    pub values: Vec<i32>,
    /// Child page ids (branch nodes only)
    pub children: Vec<PageId>,
}

impl Node {
    /// Create an empty leaf node
    pub fn leaf(page_id: PageId) -> Self {
        Self { page_id, flags: NodeFlags::LEAF, keys: Vec::new(), values: Vec::new(), children: Vec::new() }
    }

    /// Create an empty branch (internal) node
    pub fn branch(page_id: PageId) -> Self {
        Self { page_id, flags: NodeFlags::empty(), keys: Vec::new(), values: Vec::new(), children: Vec::new() }
    }

    /// Whether this node is a leaf
    pub fn is_leaf(&self) -> bool {
        self.flags.contains(NodeFlags::LEAF)
    }

    /// Number of live keys
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Index of the first key >= `key` (the descent index for `key`)
    pub fn lower_bound(&self, key: i32) -> usize {
        self.keys.partition_point(|&k| k < key)
    }

    /// Serialize this node into one full fixed-width record.
    pub fn encode(&self, order: usize) -> Result<Vec<u8>> {
        let size = record_size(order)?;
        let capacity = order - 1;

        if self.keys.len() > capacity || self.values.len() != self.keys.len() {
            return Err(Error::Corruption {
                details: format!(
                    "node {} holds {} keys / {} values, capacity {}",
                    self.page_id,
                    self.keys.len(),
                    self.values.len(),
                    capacity
                ),
                page_id: Some(self.page_id),
            });
        }
        let expected_children = if self.is_leaf() { 0 } else { self.keys.len() + 1 };
        if self.children.len() != expected_children {
            return Err(Error::Corruption {
                details: format!(
                    "node {} holds {} children, expected {}",
                    self.page_id,
                    self.children.len(),
                    expected_children
                ),
                page_id: Some(self.page_id),
            });
        }

        let mut buf = Vec::with_capacity(size);
        buf.write_u64::<LittleEndian>(self.keys.len() as u64)?;
        buf.write_u8(self.flags.bits())?;
        buf.write_u64::<LittleEndian>(self.page_id.0)?;

        for slot in 0..capacity {
            buf.write_i32::<LittleEndian>(self.keys.get(slot).copied().unwrap_or(NO_SLOT))?;
        }
        for slot in 0..capacity {
            buf.write_i32::<LittleEndian>(self.values.get(slot).copied().unwrap_or(NO_SLOT))?;
        }
        for slot in 0..order {
            let raw = match self.children.get(slot) {
                Some(child) => i32::try_from(child.0).map_err(|_| Error::Corruption {
                    details: format!("child id {} does not fit a 4-byte slot", child),
                    page_id: Some(self.page_id),
                })?,
                None => NO_SLOT,
            };
            buf.write_i32::<LittleEndian>(raw)?;
        }

        debug_assert_eq!(buf.len(), size);
        Ok(buf)
    }

    /// Deserialize one full record read at the offset of `expected`.
    ///
    /// The stored page id must agree with the id the record was fetched by;
    /// a mismatch means the file and the offset formula disagree.
    pub fn decode(mut buf: &[u8], expected: PageId, order: usize) -> Result<Self> {
        let capacity = order - 1;

        let key_count = buf.read_u64::<LittleEndian>()?;
        let flags_raw = buf.read_u8()?;
        let page_id = PageId(buf.read_u64::<LittleEndian>()?);

        if page_id != expected {
            return Err(Error::Corruption {
                details: format!("record at page {expected} claims to be page {page_id}"),
                page_id: Some(expected),
            });
        }
        let flags = NodeFlags::from_bits(flags_raw).ok_or_else(|| Error::Corruption {
            details: format!("unknown flag bits 0x{flags_raw:02x}"),
            page_id: Some(expected),
        })?;
        if key_count > capacity as u64 {
            return Err(Error::Corruption {
                details: format!("key count {key_count} exceeds capacity {capacity}"),
                page_id: Some(expected),
            });
        }
        let key_count = key_count as usize;

        let mut keys = Vec::with_capacity(key_count);
        for slot in 0..capacity {
            let raw = buf.read_i32::<LittleEndian>()?;
            if slot < key_count {
                keys.push(raw);
            }
        }
        let mut values = Vec::with_capacity(key_count);
        for slot in 0..capacity {
            let raw = buf.read_i32::<LittleEndian>()?;
            if slot < key_count {
                values.push(raw);
            }
        }

        let is_leaf = flags.contains(NodeFlags::LEAF);
        let child_count = if is_leaf { 0 } else { key_count + 1 };
        let mut children = Vec::with_capacity(child_count);
        for slot in 0..order {
            let raw = buf.read_i32::<LittleEndian>()?;
            if slot < child_count {
                if raw < 0 {
                    return Err(Error::Corruption {
                        details: format!("branch page {expected} has an absent child in slot {slot}"),
                        page_id: Some(expected),
                    });
                }
                children.push(PageId(raw as u64));
            }
        }

        Ok(Self { page_id, flags, keys, values, children })
    }
}
