//! Whole-record file I/O
//!
//! `FileStore` maps a page id to a byte offset (`page_id * record_size`) and
//! transfers exactly one record per call, synchronously. It knows nothing of
//! tree semantics. All transfers block until complete; a failed seek, short
//! read or short write surfaces as [`Error::Io`] and the record is never
//! returned half-filled.

use crate::error::{Error, PageId, Result};
use crate::meta::{Meta, META_SIZE};
use crate::page::{record_size, Node};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::trace;

/// Largest page id that still fits the 4-byte child slots of the record format
const MAX_PAGE_ID: u64 = i32::MAX as u64;

/// Seek-based page accessor over a single backing file.
///
/// The file is exclusively owned by one store for the lifetime of the
/// process; no locking discipline exists for concurrent access.
#[derive(Debug)]
pub struct FileStore {
    file: File,
    order: usize,
    record_size: usize,
}

impl FileStore {
    /// Create a fresh backing file, truncating any existing content, and
    /// write the initial header page.
    pub fn create(path: impl AsRef<Path>, order: usize) -> Result<Self> {
        let record_size = record_size(order)?;
        let order_raw =
            u32::try_from(order).map_err(|_| Error::InvalidParameter("tree order out of range"))?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| Error::Io(e.to_string()))?;

        let mut store = Self { file, order, record_size };
        store.write_meta(&Meta::new(order_raw))?;
        Ok(store)
    }

    /// Open an existing backing file, recovering order and root from the
    /// header page.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::Io(e.to_string()))?;

        // Bootstrap: the header lives at offset 0 regardless of order.
        let mut store = Self { file, order: 0, record_size: 0 };
        let meta = store.read_meta()?;
        store.order = meta.order as usize;
        store.record_size = record_size(store.order)?;
        Ok(store)
    }

    /// The tree order this store was created with
    pub fn order(&self) -> usize {
        self.order
    }

    /// Width in bytes of one node record
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Read one full node record.
    pub fn read_node(&mut self, page_id: PageId) -> Result<Node> {
        if page_id == crate::meta::HEADER_PAGE {
            return Err(Error::InvalidPageId(page_id));
        }
        trace!(page = %page_id, "read node");

        let mut buf = vec![0u8; self.record_size];
        self.file.seek(SeekFrom::Start(page_id.to_offset(self.record_size)))?;
        self.file.read_exact(&mut buf).map_err(|e| Error::Io(format!("page {page_id}: {e}")))?;
        Node::decode(&buf, page_id, self.order)
    }

    /// Write one full node record and flush it, so a subsequent read from
    /// this process observes it.
    pub fn write_node(&mut self, node: &Node) -> Result<()> {
        if node.page_id == crate::meta::HEADER_PAGE {
            return Err(Error::InvalidPageId(node.page_id));
        }
        trace!(page = %node.page_id, keys = node.key_count(), "write node");

        let buf = node.encode(self.order)?;
        self.file.seek(SeekFrom::Start(node.page_id.to_offset(self.record_size)))?;
        self.file.write_all(&buf).map_err(|e| Error::Io(format!("page {}: {e}", node.page_id)))?;
        self.file.flush()?;
        Ok(())
    }

    /// Read the header page.
    pub fn read_meta(&mut self) -> Result<Meta> {
        let mut buf = [0u8; META_SIZE];
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_exact(&mut buf).map_err(|e| Error::Io(format!("header page: {e}")))?;
        Meta::decode(&buf)
    }

    /// Write and flush the header page.
    pub fn write_meta(&mut self, meta: &Meta) -> Result<()> {
        let buf = meta.encode()?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&buf).map_err(|e| Error::Io(format!("header page: {e}")))?;
        self.file.flush()?;
        Ok(())
    }

    /// Next free page id, read from the header page.
    pub fn next_page_id(&mut self) -> Result<PageId> {
        Ok(PageId(self.read_meta()?.counter))
    }

    /// Increment the allocation counter and persist it.
    ///
    /// Not atomic with the node write that follows; a crash in between
    /// leaves the counter pointing at an unwritten slot, which is benign
    /// because the slot is simply allocated again.
    pub fn advance_counter(&mut self) -> Result<()> {
        let mut meta = self.read_meta()?;
        meta.counter += 1;
        self.write_meta(&meta)
    }

    /// Allocate the next page id for a split or a fresh root.
    pub(crate) fn allocate_page(&mut self) -> Result<PageId> {
        let id = self.next_page_id()?;
        if id.0 > MAX_PAGE_ID {
            return Err(Error::Alloc("page id space exhausted"));
        }
        self.advance_counter()?;
        Ok(id)
    }

    /// Flush file contents and metadata to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all().map_err(|e| Error::Io(e.to_string()))
    }
}
