//! # Storage Module
//!
//! The paged storage layer: a single database file divided into fixed
//! 512-byte pages, cached in memory by the [`Pager`] and flushed back on
//! demand.
//!
//! ## Architecture Overview
//!
//! The layer is deliberately small and synchronous. The pager owns a
//! seekable byte stream (a file, or an in-memory cursor in tests) and a
//! read-through, write-back page cache keyed by page id. There is no
//! eviction: a page faulted in stays cached for the pager's lifetime.
//!
//! ```text
//! caller ──get_page(id)──> Pager ──miss──> seek + read ──> cache
//!                            │
//!                            └──flush_page(id)──> seek + write
//! ```
//!
//! ## File Layout
//!
//! The file is always an integer multiple of 512 bytes. Page 0 is the
//! [`page::FirstHeader`] page carrying the format version and the freelist
//! head; every other page declares its own type in the common header.
//! Freed pages form an intrusive LIFO list threaded through
//! [`page::FreelistHeader::next`].
//!
//! ## Module Organization
//!
//! - `page`: page buffer, page types, zerocopy header views
//! - `pager`: page cache, allocation, freelist, flushing
//! - `overflow`: forward-linked chains for payloads that do not fit a cell
//!
//! ## Thread Safety
//!
//! None. The pager is exclusively owned by one database handle and all
//! operations take `&mut self`; wrapping for concurrent use requires a
//! single external lock around the whole pager.

pub mod overflow;
mod page;
mod pager;

pub use page::{
    BTreeHeader, CommonHeader, FirstHeader, FreelistHeader, HeaderView, OverflowHeader, Page,
    PageType, COMMON_HEADER_SIZE, INTERIOR_SLOT_REGION, LEAF_SLOT_REGION,
};
pub use pager::Pager;

use eyre::{ensure, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Identifies a page by its offset-in-file divided by [`PAGE_SIZE`].
///
/// Id 0 is the first page; 0 also doubles as the null sentinel in parent,
/// sibling, freelist, and overflow links.
pub type PageId = u32;

pub const FIRST_PAGE_ID: PageId = 0;

pub const PAGE_SIZE: usize = 512;

/// Common header + parent pointer + embedded slot-header fields.
pub const BTREE_HEADER_SIZE: usize = 12;

/// Offset of the embedded `{free_start, free_length}` pair in a b-tree page.
pub const SLOT_HEADER_OFFSET: usize = 8;

/// Bytes reserved at the tail of a leaf page for the sibling pointer.
pub const LEAF_RESERVED_SIZE: usize = 4;

/// Parses a zerocopy struct from a byte slice with size validation.
#[inline]
pub fn parse_zerocopy<T: FromBytes + KnownLayout + Immutable>(bytes: &[u8]) -> Result<&T> {
    let size = size_of::<T>();
    ensure!(
        bytes.len() >= size,
        "buffer too small for {}: {} < {}",
        std::any::type_name::<T>(),
        bytes.len(),
        size
    );
    T::ref_from_bytes(&bytes[..size])
        .map_err(|e| eyre::eyre!("failed to parse {}: {:?}", std::any::type_name::<T>(), e))
}

/// Parses a mutable zerocopy struct from a byte slice with size validation.
#[inline]
pub fn parse_zerocopy_mut<T: FromBytes + KnownLayout + IntoBytes>(
    bytes: &mut [u8],
) -> Result<&mut T> {
    let size = size_of::<T>();
    ensure!(
        bytes.len() >= size,
        "buffer too small for {}: {} < {}",
        std::any::type_name::<T>(),
        bytes.len(),
        size
    );
    T::mut_from_bytes(&mut bytes[..size])
        .map_err(|e| eyre::eyre!("failed to parse {}: {:?}", std::any::type_name::<T>(), e))
}
