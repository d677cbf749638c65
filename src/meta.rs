//! Header page management
//!
//! Page 0 of the backing file is reserved: it never holds a node. Its record
//! slot stores the allocation counter first (the historical layout), followed
//! by file identification and the root page id, so reopening a file needs no
//! out-of-band knowledge of the tree.

use crate::error::{Error, PageId, Result};
use crate::page::{raw_record_size, MIN_ORDER};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use static_assertions::const_assert;

/// Page id of the reserved header page
pub const HEADER_PAGE: PageId = PageId(0);

/// Magic number identifying pagetree files
pub const MAGIC: u32 = 0xB7EE_F11E;

/// Version of the on-disk format
pub const FORMAT_VERSION: u32 = 1;

/// Header metadata persisted on the reserved page.
///
/// `counter` is the next page id to allocate. It only ever grows: merged-away
/// pages are orphaned, never reused, so live pages are never overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    /// Next free page id (monotonic allocation high-water mark)
    pub counter: u64,
    /// Tree order, fixed at creation
    pub order: u32,
    /// Root page id, `None` while the tree has never been populated
    pub root: Option<PageId>,
}

/// Serialized header width: counter + magic + version + order + root
pub const META_SIZE: usize = 8 + 4 + 4 + 4 + 8;

// The header must fit the smallest record slot the format allows.
const_assert!(META_SIZE <= raw_record_size(MIN_ORDER));

impl Meta {
    /// Fresh header for a newly created tree: page 0 reserved, nothing allocated yet
    pub fn new(order: u32) -> Self {
        Self { counter: 1, order, root: None }
    }

    /// Serialize the header record
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(META_SIZE);
        buf.write_u64::<LittleEndian>(self.counter)?;
        buf.write_u32::<LittleEndian>(MAGIC)?;
        buf.write_u32::<LittleEndian>(FORMAT_VERSION)?;
        buf.write_u32::<LittleEndian>(self.order)?;
        buf.write_i64::<LittleEndian>(match self.root {
            Some(id) => i64::try_from(id.0).map_err(|_| Error::Corruption {
                details: format!("root id {id} does not fit the header slot"),
                page_id: Some(HEADER_PAGE),
            })?,
            None => -1,
        })?;
        Ok(buf)
    }

    /// Deserialize and validate the header record
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        let counter = buf.read_u64::<LittleEndian>()?;
        let magic = buf.read_u32::<LittleEndian>()?;
        let version = buf.read_u32::<LittleEndian>()?;
        let order = buf.read_u32::<LittleEndian>()?;
        let root_raw = buf.read_i64::<LittleEndian>()?;

        if magic != MAGIC {
            return Err(Error::Corruption {
                details: format!("invalid magic number: 0x{magic:x}"),
                page_id: Some(HEADER_PAGE),
            });
        }
        if version != FORMAT_VERSION {
            return Err(Error::VersionMismatch { expected: FORMAT_VERSION, found: version });
        }
        if (order as usize) < MIN_ORDER {
            return Err(Error::Corruption {
                details: format!("header carries order {order}, below the minimum of {MIN_ORDER}"),
                page_id: Some(HEADER_PAGE),
            });
        }
        if counter == 0 {
            return Err(Error::Corruption {
                details: "allocation counter is zero; page 0 is reserved".into(),
                page_id: Some(HEADER_PAGE),
            });
        }

        let root = match root_raw {
            -1 => None,
            id if id > 0 => Some(PageId(id as u64)),
            id => {
                return Err(Error::Corruption {
                    details: format!("invalid root page id {id}"),
                    page_id: Some(HEADER_PAGE),
                })
            }
        };

        Ok(Self { counter, order, root })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let meta = Meta { counter: 9, order: 4, root: Some(PageId(5)) };
        let buf = meta.encode().unwrap();
        assert_eq!(buf.len(), META_SIZE);
        assert_eq!(Meta::decode(&buf).unwrap(), meta);
    }

    #[test]
    fn fresh_header_has_no_root() {
        let meta = Meta::new(4);
        assert_eq!(meta.counter, 1);
        assert_eq!(meta.root, None);

        let back = Meta::decode(&meta.encode().unwrap()).unwrap();
        assert_eq!(back.root, None);
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let meta = Meta::new(4);
        let mut buf = meta.encode().unwrap();
        buf[8] ^= 0xff; // corrupt the magic, leaving the counter intact
        assert!(matches!(Meta::decode(&buf), Err(Error::Corruption { .. })));
    }

    #[test]
    fn decode_rejects_future_version() {
        let meta = Meta::new(4);
        let mut buf = meta.encode().unwrap();
        buf[12] = 0xfe;
        assert!(matches!(
            Meta::decode(&buf),
            Err(Error::VersionMismatch { expected: FORMAT_VERSION, .. })
        ));
    }

    #[test]
    fn decode_rejects_undersized_order() {
        let meta = Meta { counter: 1, order: 2, root: None };
        let buf = meta.encode().unwrap();
        assert!(matches!(Meta::decode(&buf), Err(Error::Corruption { .. })));
    }

    #[test]
    fn root_id_zero_is_rejected() {
        let meta = Meta { counter: 3, order: 4, root: Some(HEADER_PAGE) };
        let buf = meta.encode().unwrap();
        assert!(matches!(Meta::decode(&buf), Err(Error::Corruption { .. })));
    }
}
