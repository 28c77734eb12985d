//! # Pager
//!
//! Read-through, write-back page cache over a seekable byte stream.
//!
//! ## Design Overview
//!
//! The pager is the only component that touches the stream. Pages are
//! faulted into a `PageId -> Box<Page>` map on first access and stay there
//! for the pager's lifetime; repeated lookups alias the same buffer, so a
//! mutation made through one handle is visible through the next.
//!
//! Mutable access marks the page dirty. Nothing is written back until an
//! explicit [`Pager::flush_page`] or [`Pager::flush_all`]; the two
//! exceptions are page 0 of a freshly created database and pages appended
//! to grow the file, both written through immediately so the on-disk size
//! stays a whole number of pages.
//!
//! ## Allocation
//!
//! [`Pager::next_free`] prefers the freelist: if the first page records a
//! non-zero head and that page really is typed `Freelist`, it is unlinked
//! and returned. A head that points at a page of any other type is treated
//! as corruption: the incident is logged, the head is reset to zero (any
//! pages dangling behind it are abandoned), and allocation falls through to
//! appending a zero-filled page at the file tail.
//!
//! [`Pager::free_page`] is the inverse: the page's header is rewritten to
//! `Freelist`, it becomes the new head, and both it and page 0 are left
//! dirty. Allocation order is therefore LIFO.
//!
//! ## Failure Semantics
//!
//! Stream errors surface as `eyre` errors tagged with the page id. The
//! cache is never half-updated: a failed read leaves no cache entry and a
//! failed flush leaves the page dirty, so operations may be retried.

use std::io::{Read, Seek, SeekFrom, Write};

use eyre::{ensure, eyre, Result};
use hashbrown::{HashMap, HashSet};

use crate::encoding::codec;

use super::{
    FirstHeader, FreelistHeader, Page, PageId, PageType, FIRST_PAGE_ID, PAGE_SIZE,
};

#[derive(Debug)]
pub struct Pager<S> {
    stream: S,
    pages: HashMap<PageId, Box<Page>>,
    dirty: HashSet<PageId>,
    file_size: u64,
}

impl<S: Read + Write + Seek> Pager<S> {
    /// Opens a database over `stream`.
    ///
    /// An empty stream becomes a fresh database: the first page is
    /// constructed in cache and written through. Otherwise page 0 is
    /// faulted in so the database header is always available.
    pub fn open(mut stream: S) -> Result<Self> {
        let file_size = stream
            .seek(SeekFrom::End(0))
            .map_err(|e| eyre!("failed to determine database size: {e}"))?;
        ensure!(
            file_size % PAGE_SIZE as u64 == 0,
            "database size {} is not a multiple of the page size {}",
            file_size,
            PAGE_SIZE
        );

        let mut pager = Self {
            stream,
            pages: HashMap::new(),
            dirty: HashSet::new(),
            file_size,
        };

        if file_size == 0 {
            pager.pages.insert(FIRST_PAGE_ID, Page::new(PageType::First));
            pager.flush_page(FIRST_PAGE_ID)?;
            pager.file_size = PAGE_SIZE as u64;
        } else {
            pager.fault(FIRST_PAGE_ID)?;
        }

        Ok(pager)
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn page_count(&self) -> u32 {
        (self.file_size / PAGE_SIZE as u64) as u32
    }

    fn fault(&mut self, id: PageId) -> Result<()> {
        if self.pages.contains_key(&id) {
            return Ok(());
        }

        let mut page = Page::zeroed();
        self.stream
            .seek(SeekFrom::Start(id as u64 * PAGE_SIZE as u64))
            .map_err(|e| eyre!("page {id}: failed to seek for read: {e}"))?;
        codec::read_exact_bytes(&mut self.stream, page.bytes_mut())
            .map_err(|e| eyre!("page {id}: failed to read: {e}"))?;

        self.pages.insert(id, page);
        Ok(())
    }

    pub fn get_page(&mut self, id: PageId) -> Result<&Page> {
        self.fault(id)?;
        // INVARIANT: fault populated the cache entry
        Ok(self.pages.get(&id).unwrap())
    }

    /// Like [`Pager::get_page`] but marks the page dirty.
    pub fn get_page_mut(&mut self, id: PageId) -> Result<&mut Page> {
        self.fault(id)?;
        self.dirty.insert(id);
        // INVARIANT: fault populated the cache entry
        Ok(self.pages.get_mut(&id).unwrap())
    }

    pub fn is_dirty(&self, id: PageId) -> bool {
        self.dirty.contains(&id)
    }

    pub fn first_header(&mut self) -> Result<&FirstHeader> {
        Ok(self.get_page(FIRST_PAGE_ID)?.view())
    }

    pub fn first_header_mut(&mut self) -> Result<&mut FirstHeader> {
        Ok(self.get_page_mut(FIRST_PAGE_ID)?.view_mut())
    }

    /// Returns a free page id, preferring the freelist over growing the
    /// file.
    ///
    /// The returned page keeps whatever bytes it had; callers that need a
    /// typed page go through [`Pager::from_next_free`].
    pub fn next_free(&mut self) -> Result<PageId> {
        let head = self.first_header()?.freelist_head();
        if head != 0 {
            let (head_type, next) = {
                let page = self.get_page(head)?;
                let next = match page.page_type() {
                    PageType::Freelist => page.view::<FreelistHeader>().next(),
                    _ => 0,
                };
                (page.page_type(), next)
            };

            if head_type == PageType::Freelist {
                self.first_header_mut()?.set_freelist_head(next);
                return Ok(head);
            }

            // the chain behind a bad head is unreachable from here on
            tracing::warn!(
                page = head,
                page_type = ?head_type,
                "freelist head does not point at a freelist page, dropping the chain"
            );
            self.first_header_mut()?.set_freelist_head(0);
        }

        let id = (self.file_size / PAGE_SIZE as u64) as PageId;
        self.pages.insert(id, Page::zeroed());
        self.flush_page(id)?;
        self.file_size += PAGE_SIZE as u64;
        Ok(id)
    }

    /// Allocates a free page and constructs it in place as `page_type`.
    pub fn from_next_free(&mut self, page_type: PageType) -> Result<(PageId, &mut Page)> {
        let id = self.next_free()?;
        self.dirty.insert(id);
        // INVARIANT: next_free leaves the returned page in cache
        let page = self.pages.get_mut(&id).unwrap();
        page.format(page_type);
        Ok((id, page))
    }

    /// Pushes `id` onto the freelist.
    ///
    /// The page's header is rewritten to `Freelist` with the current head
    /// as its successor; the freed page and page 0 both become dirty.
    pub fn free_page(&mut self, id: PageId) -> Result<()> {
        ensure!(id != FIRST_PAGE_ID, "page 0 cannot be freed");

        let head = self.first_header()?.freelist_head();
        let page = self.get_page_mut(id)?;
        page.set_page_type(PageType::Freelist);
        page.view_mut::<FreelistHeader>().set_next(head);
        self.first_header_mut()?.set_freelist_head(id);
        Ok(())
    }

    /// Writes the full page back to the stream and clears its dirty mark.
    pub fn flush_page(&mut self, id: PageId) -> Result<()> {
        let page = self
            .pages
            .get(&id)
            .ok_or_else(|| eyre!("page {id}: cannot flush a page that was never loaded"))?;

        self.stream
            .seek(SeekFrom::Start(id as u64 * PAGE_SIZE as u64))
            .map_err(|e| eyre!("page {id}: failed to seek for flush: {e}"))?;
        codec::write_bytes(&mut self.stream, page.bytes())
            .map_err(|e| eyre!("page {id}: failed to flush: {e}"))?;

        self.dirty.remove(&id);
        Ok(())
    }

    pub fn flush_all(&mut self) -> Result<()> {
        let mut ids: Vec<PageId> = self.dirty.iter().copied().collect();
        ids.sort_unstable();
        for id in ids {
            self.flush_page(id)?;
        }
        Ok(())
    }

    /// Drops clean cached pages; dirty pages and page 0 are retained.
    pub fn clear_cache(&mut self) {
        let dirty = &self.dirty;
        self.pages
            .retain(|id, _| *id == FIRST_PAGE_ID || dirty.contains(id));
    }
}
