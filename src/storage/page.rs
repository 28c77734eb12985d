//! # Page Types and Header Layout
//!
//! This module defines the page structure for the storage layer. Every
//! 512-byte page begins with a 4-byte common header whose first byte is the
//! page type; the rest of the page is interpreted according to that type.
//!
//! ## Common Header Layout (4 bytes)
//!
//! ```text
//! Offset  Size  Field        Description
//! ------  ----  -----------  ----------------------------------------
//! 0       1     page_type    Type of page (Leaf, Interior, First, ...)
//! 1       3     reserved     Reserved, written as zero
//! ```
//!
//! ## Page Types
//!
//! - **Leaf** (0x01): B+tree leaf holding record cells, sibling pointer in
//!   the last 4 bytes of the page
//! - **Interior** (0x02): B+tree interior node holding separator cells and
//!   child pointers
//! - **Freelist** (0x03): entirely-free page linked into the freelist chain
//! - **First** (0x04): page 0, database-wide metadata
//! - **Overflow** (0x05): continuation page for payloads too large to inline
//!
//! ## Typed Header Views
//!
//! Each page type projects a richer header over the same buffer. All header
//! structs are `#[repr(C)]` zerocopy types that start with [`CommonHeader`],
//! so the type tag stays at offset 0 no matter which view is applied:
//!
//! ```text
//! FirstHeader    = common(4) + version:u16 + freelist_head:u32
//! FreelistHeader = common(4) + next:u32
//! OverflowHeader = common(4) + next:u32
//! BTreeHeader    = common(4) + parent:u32 + free_start:u16 + free_length:u16
//! ```
//!
//! Multibyte fields are big-endian on the page, matching the stream codec,
//! so a flushed page reloads byte-identically on any host.
//!
//! ## B+Tree Page Geometry
//!
//! ```text
//! +--------------------------+ 0
//! | CommonHeader (4 bytes)   |
//! +--------------------------+ 4
//! | parent (4 bytes)         |
//! +--------------------------+ 8
//! | free_start / free_length |   <- embedded slot-header fields
//! +--------------------------+ 12
//! | slot array ->            |
//! | ... free space ...       |
//! | <- cell heap             |
//! +--------------------------+ 508 (leaf) / 512 (interior)
//! | sibling (leaf only, 4B)  |
//! +--------------------------+ 512
//! ```
//!
//! The slot/cell region of a leaf excludes the reserved sibling tail.

use eyre::{ensure, Result};
use zerocopy::byteorder::{BigEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::{
    parse_zerocopy, parse_zerocopy_mut, PageId, BTREE_HEADER_SIZE, LEAF_RESERVED_SIZE, PAGE_SIZE,
};

pub const COMMON_HEADER_SIZE: usize = 4;

/// Slot/cell bytes available to a leaf node.
pub const LEAF_SLOT_REGION: usize = PAGE_SIZE - BTREE_HEADER_SIZE - LEAF_RESERVED_SIZE;
/// Slot/cell bytes available to an interior node.
pub const INTERIOR_SLOT_REGION: usize = PAGE_SIZE - BTREE_HEADER_SIZE;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Unknown = 0x00,
    Leaf = 0x01,
    Interior = 0x02,
    Freelist = 0x03,
    First = 0x04,
    Overflow = 0x05,
}

impl PageType {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0x01 => PageType::Leaf,
            0x02 => PageType::Interior,
            0x03 => PageType::Freelist,
            0x04 => PageType::First,
            0x05 => PageType::Overflow,
            _ => PageType::Unknown,
        }
    }

    pub fn is_btree(self) -> bool {
        matches!(self, PageType::Leaf | PageType::Interior)
    }
}

/// Marker for header shapes that may be projected over a page buffer.
///
/// Every implementor is `#[repr(C)]`, begins with [`CommonHeader`], and is
/// far smaller than a page, so projection cannot fail.
pub trait HeaderView: FromBytes + IntoBytes + KnownLayout + Immutable + Unaligned {}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct CommonHeader {
    page_type: u8,
    reserved: [u8; 3],
}

impl CommonHeader {
    pub fn page_type(&self) -> PageType {
        PageType::from_byte(self.page_type)
    }

    pub fn set_page_type(&mut self, page_type: PageType) {
        self.page_type = page_type as u8;
    }
}

impl HeaderView for CommonHeader {}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct FirstHeader {
    common: CommonHeader,
    version: U16<BigEndian>,
    freelist_head: U32<BigEndian>,
}

impl FirstHeader {
    pub fn version(&self) -> u16 {
        self.version.get()
    }

    pub fn set_version(&mut self, version: u16) {
        self.version.set(version);
    }

    pub fn freelist_head(&self) -> PageId {
        self.freelist_head.get()
    }

    pub fn set_freelist_head(&mut self, head: PageId) {
        self.freelist_head.set(head);
    }
}

impl HeaderView for FirstHeader {}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct FreelistHeader {
    common: CommonHeader,
    next: U32<BigEndian>,
}

impl FreelistHeader {
    pub fn next(&self) -> PageId {
        self.next.get()
    }

    pub fn set_next(&mut self, next: PageId) {
        self.next.set(next);
    }
}

impl HeaderView for FreelistHeader {}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct OverflowHeader {
    common: CommonHeader,
    next: U32<BigEndian>,
}

impl OverflowHeader {
    pub fn next(&self) -> PageId {
        self.next.get()
    }

    pub fn set_next(&mut self, next: PageId) {
        self.next.set(next);
    }
}

impl HeaderView for OverflowHeader {}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct BTreeHeader {
    common: CommonHeader,
    parent: U32<BigEndian>,
    free_start: U16<BigEndian>,
    free_length: U16<BigEndian>,
}

impl BTreeHeader {
    pub fn parent(&self) -> PageId {
        self.parent.get()
    }

    pub fn set_parent(&mut self, parent: PageId) {
        self.parent.set(parent);
    }

    /// A node is the root iff it has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.get() == 0
    }

    pub fn is_leaf(&self) -> bool {
        self.common.page_type() == PageType::Leaf
    }

    pub fn free_start(&self) -> u16 {
        self.free_start.get()
    }

    pub fn free_length(&self) -> u16 {
        self.free_length.get()
    }
}

impl HeaderView for BTreeHeader {}

const _: () = {
    assert!(size_of::<CommonHeader>() == COMMON_HEADER_SIZE);
    assert!(size_of::<FirstHeader>() == 10);
    assert!(size_of::<FreelistHeader>() == 8);
    assert!(size_of::<OverflowHeader>() == 8);
    assert!(size_of::<BTreeHeader>() == BTREE_HEADER_SIZE);
};

/// A fixed 512-byte page buffer.
///
/// Pages are owned by the pager and handed out by reference; typed headers
/// are projected over the same bytes via [`Page::view`]. Construction zeroes
/// the buffer and writes the per-type header defaults.
#[repr(C)]
#[derive(Debug)]
pub struct Page {
    buf: [u8; PAGE_SIZE],
}

impl Page {
    pub fn zeroed() -> Box<Self> {
        Box::new(Page {
            buf: [0u8; PAGE_SIZE],
        })
    }

    pub fn new(page_type: PageType) -> Box<Self> {
        let mut page = Self::zeroed();
        page.format(page_type);
        page
    }

    /// Zeroes the buffer and writes the typed header defaults for
    /// `page_type`. B+tree pages get an empty slot region (`free_start = 0`,
    /// `free_length` = region size); the first page gets `version = 1`.
    pub fn format(&mut self, page_type: PageType) {
        self.buf.fill(0);

        match page_type {
            PageType::Leaf => {
                let header = self.view_mut::<BTreeHeader>();
                header.free_length.set(LEAF_SLOT_REGION as u16);
            }
            PageType::Interior => {
                let header = self.view_mut::<BTreeHeader>();
                header.free_length.set(INTERIOR_SLOT_REGION as u16);
            }
            PageType::First => {
                let header = self.view_mut::<FirstHeader>();
                header.set_version(1);
            }
            PageType::Freelist | PageType::Overflow | PageType::Unknown => {}
        }

        self.view_mut::<CommonHeader>().set_page_type(page_type);
    }

    pub fn page_type(&self) -> PageType {
        self.view::<CommonHeader>().page_type()
    }

    pub fn set_page_type(&mut self, page_type: PageType) {
        self.view_mut::<CommonHeader>().set_page_type(page_type);
    }

    /// Projects a typed header over the start of the page.
    ///
    /// The common header stays at offset 0 regardless of `H`; callers must
    /// consult [`Page::page_type`] first when the page's type is ambiguous.
    pub fn view<H: HeaderView>(&self) -> &H {
        // INVARIANT: every HeaderView is unaligned and smaller than a page
        parse_zerocopy::<H>(&self.buf).unwrap()
    }

    pub fn view_mut<H: HeaderView>(&mut self) -> &mut H {
        // INVARIANT: every HeaderView is unaligned and smaller than a page
        parse_zerocopy_mut::<H>(&mut self.buf).unwrap()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Next leaf in key order, stored in the reserved tail of a leaf page.
    pub fn sibling(&self) -> Result<PageId> {
        ensure!(
            self.page_type() == PageType::Leaf,
            "expected Leaf page for sibling access, got {:?}",
            self.page_type()
        );
        let tail = &self.buf[PAGE_SIZE - LEAF_RESERVED_SIZE..];
        Ok(u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]]))
    }

    pub fn set_sibling(&mut self, sibling: PageId) -> Result<()> {
        ensure!(
            self.page_type() == PageType::Leaf,
            "expected Leaf page for sibling access, got {:?}",
            self.page_type()
        );
        self.buf[PAGE_SIZE - LEAF_RESERVED_SIZE..].copy_from_slice(&sibling.to_be_bytes());
        Ok(())
    }
}
