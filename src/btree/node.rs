//! # B+Tree Node Views
//!
//! Thin adapters between [`Page`] buffers and the slotted-page allocator.
//! A b-tree page embeds its slot header right after the common header and
//! parent pointer; leaves additionally reserve their last 4 bytes for the
//! sibling pointer, so their slot/cell region is 4 bytes shorter than an
//! interior node's.

use eyre::{bail, ensure, Result};

use crate::storage::{Page, PageType, BTreeHeader, LEAF_RESERVED_SIZE, PAGE_SIZE, SLOT_HEADER_OFFSET};

use super::slotted::{SlottedPage, SlottedPageMut};

fn slotted_end(page_type: PageType) -> Result<usize> {
    match page_type {
        PageType::Leaf => Ok(PAGE_SIZE - LEAF_RESERVED_SIZE),
        PageType::Interior => Ok(PAGE_SIZE),
        other => bail!("expected a b-tree page, got {:?}", other),
    }
}

/// Read-only slotted view over a b-tree page.
pub fn slotted(page: &Page) -> Result<SlottedPage<'_>> {
    let end = slotted_end(page.page_type())?;
    SlottedPage::open(&page.bytes()[SLOT_HEADER_OFFSET..end])
}

/// Mutable slotted view over a b-tree page.
pub fn slotted_mut(page: &mut Page) -> Result<SlottedPageMut<'_>> {
    let end = slotted_end(page.page_type())?;
    SlottedPageMut::open(&mut page.bytes_mut()[SLOT_HEADER_OFFSET..end])
}

/// Number of cells in a b-tree page.
pub fn entry_count(page: &Page) -> Result<u16> {
    ensure!(
        page.page_type().is_btree(),
        "expected a b-tree page, got {:?}",
        page.page_type()
    );
    Ok(page.view::<BTreeHeader>().free_start() / super::slotted::SLOT_SIZE as u16)
}
