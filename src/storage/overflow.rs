//! # Overflow Chains
//!
//! Payloads too large for a cell spill into forward-linked overflow pages.
//! Each page carries the common header, a `next` pointer, and as much
//! payload as fits in the remainder (504 bytes). The chain length is not
//! stored here; the owning cell records the total payload size.

use std::io::{Read, Seek, Write};

use eyre::{ensure, Result};

use super::{OverflowHeader, PageId, PageType, Pager, PAGE_SIZE};

pub const OVERFLOW_HEADER_SIZE: usize = 8;

/// Payload bytes carried by one overflow page.
pub const OVERFLOW_CAPACITY: usize = PAGE_SIZE - OVERFLOW_HEADER_SIZE;

/// Writes `data` across freshly allocated overflow pages and returns the
/// head of the chain. Pages are allocated back to front so each one knows
/// its successor at construction time.
pub fn write_chain<S: Read + Write + Seek>(pager: &mut Pager<S>, data: &[u8]) -> Result<PageId> {
    ensure!(!data.is_empty(), "overflow chain cannot be empty");

    let mut next: PageId = 0;
    for chunk in data.chunks(OVERFLOW_CAPACITY).rev() {
        let (id, page) = pager.from_next_free(PageType::Overflow)?;
        page.view_mut::<OverflowHeader>().set_next(next);
        page.bytes_mut()[OVERFLOW_HEADER_SIZE..OVERFLOW_HEADER_SIZE + chunk.len()]
            .copy_from_slice(chunk);
        next = id;
    }
    Ok(next)
}

/// Reads `len` bytes starting at the chain head, following `next` pointers.
/// A chain that runs out before `len` bytes are collected is corrupt.
pub fn read_chain<S: Read + Write + Seek>(
    pager: &mut Pager<S>,
    head: PageId,
    len: usize,
) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(len);
    let mut current = head;

    while data.len() < len {
        ensure!(
            current != 0,
            "overflow chain ended after {} of {} bytes",
            data.len(),
            len
        );
        let page = pager.get_page(current)?;
        ensure!(
            page.page_type() == PageType::Overflow,
            "page {}: expected Overflow page in chain, got {:?}",
            current,
            page.page_type()
        );

        let take = (len - data.len()).min(OVERFLOW_CAPACITY);
        data.extend_from_slice(&page.bytes()[OVERFLOW_HEADER_SIZE..OVERFLOW_HEADER_SIZE + take]);
        current = page.view::<OverflowHeader>().next();
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn open_empty() -> Pager<Cursor<Vec<u8>>> {
        Pager::open(Cursor::new(Vec::new())).unwrap()
    }

    #[test]
    fn single_page_chain_round_trip() {
        let mut pager = open_empty();
        let data = vec![0x5A; 100];

        let head = write_chain(&mut pager, &data).unwrap();

        assert_eq!(head, 1);
        assert_eq!(read_chain(&mut pager, head, data.len()).unwrap(), data);
    }

    #[test]
    fn multi_page_chain_round_trip() {
        let mut pager = open_empty();
        let data: Vec<u8> = (0..1200u32).map(|i| (i % 251) as u8).collect();

        let head = write_chain(&mut pager, &data).unwrap();

        // 1200 bytes over 504-byte pages -> three pages
        assert_eq!(pager.page_count(), 4);
        assert_eq!(read_chain(&mut pager, head, data.len()).unwrap(), data);
    }

    #[test]
    fn chain_pages_link_forward() {
        let mut pager = open_empty();
        let data = vec![1u8; OVERFLOW_CAPACITY * 2];

        let head = write_chain(&mut pager, &data).unwrap();

        let first = pager.get_page(head).unwrap();
        assert_eq!(first.page_type(), PageType::Overflow);
        let second = first.view::<OverflowHeader>().next();
        assert_ne!(second, 0);

        let tail = pager.get_page(second).unwrap();
        assert_eq!(tail.view::<OverflowHeader>().next(), 0);
    }

    #[test]
    fn exact_capacity_needs_one_page() {
        let mut pager = open_empty();
        let data = vec![9u8; OVERFLOW_CAPACITY];

        let head = write_chain(&mut pager, &data).unwrap();

        assert_eq!(pager.page_count(), 2);
        assert_eq!(
            pager
                .get_page(head)
                .unwrap()
                .view::<OverflowHeader>()
                .next(),
            0
        );
    }

    #[test]
    fn truncated_chain_is_an_error() {
        let mut pager = open_empty();
        let data = vec![2u8; 100];
        let head = write_chain(&mut pager, &data).unwrap();

        let result = read_chain(&mut pager, head, OVERFLOW_CAPACITY + 50);

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("overflow chain ended"));
    }

    #[test]
    fn empty_payload_is_rejected() {
        let mut pager = open_empty();

        let result = write_chain(&mut pager, &[]);

        assert!(result.is_err());
    }

    #[test]
    fn chain_reuses_freed_pages() {
        let mut pager = open_empty();
        let spare = pager.next_free().unwrap();
        pager.free_page(spare).unwrap();

        let head = write_chain(&mut pager, &[7u8; 10]).unwrap();

        assert_eq!(head, spare);
    }
}
