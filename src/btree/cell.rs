//! # B+Tree Cells
//!
//! The records stored inside slotted pages. Two shapes share one payload:
//!
//! ```text
//! NodeCell     = payload_size:u32 + CellPayload(32)            (36 bytes)
//! InteriorCell = left_child:u32 + NodeCell                     (40 bytes)
//! ```
//!
//! A payload of up to 32 bytes is stored inline. A larger payload keeps its
//! first 28 bytes inline and spills the rest into an overflow chain whose
//! head page id occupies the last 4 payload bytes; `payload_size > 32` is
//! the marker for that layout.
//!
//! ## End Cells
//!
//! An [`InteriorCell`] with `payload_size == 0` is the end cell: it sorts
//! strictly after every real cell and its `left_child` covers everything
//! greater than or equal to the last real separator. Every interior node
//! carries exactly one, always in the highest slot.
//!
//! ## Typed Payloads
//!
//! Tree operations are generic over [`CellValue`], a fixed-width ordered
//! value encoded big-endian into the payload array. The comparators used
//! for sorted insertion ([`leaf_less`], [`interior_less`]) decode the value
//! back out of raw cell bytes, so the ordering seen by searches is exactly
//! the ordering used at insertion time.

use std::io::{Read, Seek, Write};

use eyre::Result;
use zerocopy::byteorder::{BigEndian, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::storage::{overflow, PageId, Pager};

/// Largest payload a cell stores without overflowing.
pub const MAX_CELL_PAYLOAD: usize = 32;

/// Inline payload bytes of an overflowing cell; the remaining 4 bytes of
/// the payload array hold the overflow chain head.
pub const LARGE_CELL_INLINE: usize = MAX_CELL_PAYLOAD - size_of::<PageId>();

/// A fixed-width value that can live in a cell payload.
///
/// `ENCODED_LEN` must not exceed [`MAX_CELL_PAYLOAD`]. Integers encode
/// big-endian, consistent with the rest of the file format.
pub trait CellValue: Copy + Ord {
    const ENCODED_LEN: usize;

    fn encode(&self, buf: &mut [u8; MAX_CELL_PAYLOAD]);
    fn decode(buf: &[u8; MAX_CELL_PAYLOAD]) -> Self;
}

macro_rules! impl_cell_value {
    ($($ty:ty),*) => {
        $(impl CellValue for $ty {
            const ENCODED_LEN: usize = size_of::<$ty>();

            fn encode(&self, buf: &mut [u8; MAX_CELL_PAYLOAD]) {
                buf[..Self::ENCODED_LEN].copy_from_slice(&self.to_be_bytes());
            }

            fn decode(buf: &[u8; MAX_CELL_PAYLOAD]) -> Self {
                let mut raw = [0u8; size_of::<$ty>()];
                raw.copy_from_slice(&buf[..Self::ENCODED_LEN]);
                <$ty>::from_be_bytes(raw)
            }
        })*
    };
}

impl_cell_value!(u16, u32, u64, i64);

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct CellPayload {
    bytes: [u8; MAX_CELL_PAYLOAD],
}

impl CellPayload {
    fn zeroed() -> Self {
        Self {
            bytes: [0u8; MAX_CELL_PAYLOAD],
        }
    }

    pub fn bytes(&self) -> &[u8; MAX_CELL_PAYLOAD] {
        &self.bytes
    }

    /// The inline portion of the payload: everything for a small payload,
    /// the leading 28 bytes for an overflowing one.
    pub fn inline(&self, payload_size: u32) -> &[u8] {
        if payload_size as usize > MAX_CELL_PAYLOAD {
            &self.bytes[..LARGE_CELL_INLINE]
        } else {
            &self.bytes[..payload_size as usize]
        }
    }

    /// Overflow chain head of a large payload.
    pub fn overflow_head(&self) -> PageId {
        let tail = &self.bytes[LARGE_CELL_INLINE..];
        u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]])
    }

    fn set_overflow_head(&mut self, head: PageId) {
        self.bytes[LARGE_CELL_INLINE..].copy_from_slice(&head.to_be_bytes());
    }
}

/// Size + payload cell; every cell in a leaf node is one of these.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct NodeCell {
    payload_size: U32<BigEndian>,
    payload: CellPayload,
}

pub type LeafCell = NodeCell;

impl NodeCell {
    pub fn new<V: CellValue>(value: V) -> Self {
        debug_assert!(V::ENCODED_LEN <= MAX_CELL_PAYLOAD);
        let mut payload = CellPayload::zeroed();
        value.encode(&mut payload.bytes);
        Self {
            payload_size: U32::new(V::ENCODED_LEN as u32),
            payload,
        }
    }

    /// Builds a cell from raw payload bytes, spilling into an overflow
    /// chain when they do not fit inline.
    pub fn from_payload<S: Read + Write + Seek>(
        pager: &mut Pager<S>,
        data: &[u8],
    ) -> Result<Self> {
        let mut payload = CellPayload::zeroed();
        if data.len() <= MAX_CELL_PAYLOAD {
            payload.bytes[..data.len()].copy_from_slice(data);
        } else {
            payload.bytes[..LARGE_CELL_INLINE].copy_from_slice(&data[..LARGE_CELL_INLINE]);
            let head = overflow::write_chain(pager, &data[LARGE_CELL_INLINE..])?;
            payload.set_overflow_head(head);
        }
        Ok(Self {
            payload_size: U32::new(data.len() as u32),
            payload,
        })
    }

    /// Reassembles the full payload, walking the overflow chain when the
    /// cell spilled.
    pub fn read_payload<S: Read + Write + Seek>(&self, pager: &mut Pager<S>) -> Result<Vec<u8>> {
        let size = self.payload_size.get() as usize;
        if size <= MAX_CELL_PAYLOAD {
            return Ok(self.payload.bytes[..size].to_vec());
        }

        let mut data = self.payload.bytes[..LARGE_CELL_INLINE].to_vec();
        let rest = overflow::read_chain(
            pager,
            self.payload.overflow_head(),
            size - LARGE_CELL_INLINE,
        )?;
        data.extend_from_slice(&rest);
        Ok(data)
    }

    pub fn from_cell_bytes(bytes: &[u8]) -> Result<&Self> {
        crate::storage::parse_zerocopy(bytes)
    }

    pub fn payload_size(&self) -> u32 {
        self.payload_size.get()
    }

    pub fn payload(&self) -> &CellPayload {
        &self.payload
    }

    pub fn is_overflowing(&self) -> bool {
        self.payload_size.get() as usize > MAX_CELL_PAYLOAD
    }

    pub fn value<V: CellValue>(&self) -> V {
        V::decode(&self.payload.bytes)
    }

    /// Bytes this cell needs when stored compactly: the full struct for an
    /// overflowing payload, size prefix plus payload otherwise.
    pub fn cell_size(&self) -> u32 {
        if self.is_overflowing() {
            size_of::<NodeCell>() as u32
        } else {
            size_of::<u32>() as u32 + self.payload_size.get()
        }
    }
}

/// Interior-node cell: a left-child pointer plus the separator payload.
/// The subtree at `left_child` holds keys strictly below this separator.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct InteriorCell {
    left_child: U32<BigEndian>,
    cell: NodeCell,
}

impl InteriorCell {
    pub fn new<V: CellValue>(value: V, left_child: PageId) -> Self {
        Self {
            left_child: U32::new(left_child),
            cell: NodeCell::new(value),
        }
    }

    /// The sentinel that closes an interior node: empty payload, sorts
    /// after every real cell, points at the rightmost subtree.
    pub fn end(left_child: PageId) -> Self {
        Self {
            left_child: U32::new(left_child),
            cell: NodeCell {
                payload_size: U32::new(0),
                payload: CellPayload::zeroed(),
            },
        }
    }

    pub fn from_cell_bytes(bytes: &[u8]) -> Result<&Self> {
        crate::storage::parse_zerocopy(bytes)
    }

    pub fn is_end(&self) -> bool {
        self.cell.payload_size.get() == 0
    }

    pub fn left_child(&self) -> PageId {
        self.left_child.get()
    }

    pub fn set_left_child(&mut self, left_child: PageId) {
        self.left_child.set(left_child);
    }

    pub fn cell(&self) -> &NodeCell {
        &self.cell
    }
}

const _: () = {
    assert!(size_of::<NodeCell>() == 36);
    assert!(size_of::<InteriorCell>() == 40);
};

/// Ordering over raw leaf cells: compare decoded payload values.
pub fn leaf_less<V: CellValue>(a: &[u8], b: &[u8]) -> bool {
    // INVARIANT: leaf pages only ever store whole NodeCells
    let a = NodeCell::from_cell_bytes(a).unwrap();
    let b = NodeCell::from_cell_bytes(b).unwrap();
    a.value::<V>() < b.value::<V>()
}

/// Ordering over raw interior cells: the end cell ranks strictly greatest,
/// real cells compare by decoded payload value.
pub fn interior_less<V: CellValue>(a: &[u8], b: &[u8]) -> bool {
    // INVARIANT: interior pages only ever store whole InteriorCells
    let a = InteriorCell::from_cell_bytes(a).unwrap();
    let b = InteriorCell::from_cell_bytes(b).unwrap();
    if a.is_end() {
        return false;
    }
    if b.is_end() {
        return true;
    }
    a.cell().value::<V>() < b.cell().value::<V>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_sizes_are_fixed() {
        assert_eq!(size_of::<CellPayload>(), 32);
        assert_eq!(size_of::<NodeCell>(), 36);
        assert_eq!(size_of::<InteriorCell>(), 40);
    }

    #[test]
    fn node_cell_value_round_trip() {
        assert_eq!(NodeCell::new(123u32).value::<u32>(), 123);
        assert_eq!(NodeCell::new(u64::MAX).value::<u64>(), u64::MAX);
        assert_eq!(NodeCell::new(-7i64).value::<i64>(), -7);
        assert_eq!(NodeCell::new(513u16).value::<u16>(), 513);
    }

    #[test]
    fn node_cell_records_encoded_len() {
        let cell = NodeCell::new(99u32);

        assert_eq!(cell.payload_size(), 4);
        assert!(!cell.is_overflowing());
    }

    #[test]
    fn payload_is_big_endian() {
        let cell = NodeCell::new(0x01020304u32);

        assert_eq!(&cell.payload().bytes()[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn cell_size_is_compact_for_small_payloads() {
        assert_eq!(NodeCell::new(5u32).cell_size(), 8);
        assert_eq!(NodeCell::new(5u64).cell_size(), 12);
    }

    #[test]
    fn struct_round_trips_through_bytes() {
        let cell = InteriorCell::new(42u32, 7);
        let bytes = cell.as_bytes().to_vec();

        let read = InteriorCell::from_cell_bytes(&bytes).unwrap();
        assert_eq!(read.left_child(), 7);
        assert_eq!(read.cell().value::<u32>(), 42);
        assert!(!read.is_end());
    }

    #[test]
    fn end_cell_has_empty_payload() {
        let end = InteriorCell::end(9);

        assert!(end.is_end());
        assert_eq!(end.left_child(), 9);
        assert_eq!(end.cell().payload_size(), 0);
    }

    #[test]
    fn leaf_ordering_follows_values() {
        let small = NodeCell::new(10u32);
        let large = NodeCell::new(20u32);

        assert!(leaf_less::<u32>(small.as_bytes(), large.as_bytes()));
        assert!(!leaf_less::<u32>(large.as_bytes(), small.as_bytes()));
        assert!(!leaf_less::<u32>(small.as_bytes(), small.as_bytes()));
    }

    #[test]
    fn end_cell_sorts_strictly_last() {
        let real = InteriorCell::new(u32::MAX, 1);
        let end = InteriorCell::end(2);

        assert!(interior_less::<u32>(real.as_bytes(), end.as_bytes()));
        assert!(!interior_less::<u32>(end.as_bytes(), real.as_bytes()));
        assert!(!interior_less::<u32>(end.as_bytes(), end.as_bytes()));
    }

    #[test]
    fn interior_ordering_follows_values() {
        let a = InteriorCell::new(3u32, 1);
        let b = InteriorCell::new(5u32, 2);

        assert!(interior_less::<u32>(a.as_bytes(), b.as_bytes()));
        assert!(!interior_less::<u32>(b.as_bytes(), a.as_bytes()));
    }

    #[test]
    fn negative_values_order_correctly() {
        let neg = NodeCell::new(-100i64);
        let pos = NodeCell::new(100i64);

        assert!(leaf_less::<i64>(neg.as_bytes(), pos.as_bytes()));
    }

    #[test]
    fn inline_view_respects_payload_size() {
        let cell = NodeCell::new(7u16);

        assert_eq!(cell.payload().inline(cell.payload_size()).len(), 2);
    }
}
