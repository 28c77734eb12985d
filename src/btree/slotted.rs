//! # Slotted Page
//!
//! Cell allocator within a page: a sorted array of fixed-size slots growing
//! from the front of the region, a heap of variable-size cells growing from
//! the back, and a shrinking band of free space in between.
//!
//! ## Region Layout
//!
//! The view manages a contiguous byte region whose first 4 bytes are the
//! embedded header. All slot and cell offsets are relative to the start of
//! the area after that header:
//!
//! ```text
//! +-------------+-------------+---------------------------------------+
//! | free_start  | free_length |  slots -> ... free ... <- cells       |
//! |   (2B BE)   |   (2B BE)   |                                       |
//! +-------------+-------------+---------------------------------------+
//!               header        0         fs    fs+fl                end
//! ```
//!
//! - Slots occupy `[0, free_start)` as a contiguous array sorted by the
//!   caller-supplied ordering over their cells.
//! - Cells occupy `[free_start + free_length, end)`, allocated tail-first.
//! - `entry_count = free_start / 4`.
//!
//! ## Non-Reclamation
//!
//! Deleting a slot reclaims the slot bytes but never the cell bytes: the
//! cell heap is append-only for the lifetime of the page. Repeated
//! insert/delete cycles therefore fragment the heap until the node is
//! rewritten wholesale.
//!
//! ## Sorted Insertion
//!
//! [`SlottedPageMut::insert_cell`] binary-searches the slot array using a
//! comparator over raw cell bytes and shifts the tail of the array right by
//! one. A new cell that compares equal to an existing one lands after it,
//! so insertion order is stable for equal keys.

use eyre::{ensure, Result};
use zerocopy::byteorder::{BigEndian, U16};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

pub const SLOT_SIZE: usize = 4;
const SLOT_HEADER_SIZE: usize = 4;

/// Slot number within a page, also used by callers as a stable-ish record
/// locator between mutations.
pub type SlotNum = u16;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct Slot {
    offset: U16<BigEndian>,
    size: U16<BigEndian>,
}

impl Slot {
    pub fn new(offset: u16, size: u16) -> Self {
        Self {
            offset: U16::new(offset),
            size: U16::new(size),
        }
    }

    /// Cell offset, relative to the start of the slot/cell area.
    pub fn offset(&self) -> u16 {
        self.offset.get()
    }

    pub fn size(&self) -> u16 {
        self.size.get()
    }
}

const _: () = assert!(size_of::<Slot>() == SLOT_SIZE);

/// Read-only view over a slotted region.
#[derive(Debug, Clone, Copy)]
pub struct SlottedPage<'a> {
    data: &'a [u8],
}

/// Mutable view over a slotted region.
pub struct SlottedPageMut<'a> {
    data: &'a mut [u8],
}

fn validate(data: &[u8]) -> Result<()> {
    ensure!(
        data.len() > SLOT_HEADER_SIZE,
        "slotted region too small: {} <= {}",
        data.len(),
        SLOT_HEADER_SIZE
    );
    let area = data.len() - SLOT_HEADER_SIZE;
    ensure!(
        area <= u16::MAX as usize,
        "slotted region too large: {} > {}",
        area,
        u16::MAX
    );

    let free_start = u16::from_be_bytes([data[0], data[1]]) as usize;
    let free_length = u16::from_be_bytes([data[2], data[3]]) as usize;
    ensure!(
        free_start + free_length <= area,
        "slotted region header out of bounds: {} + {} > {}",
        free_start,
        free_length,
        area
    );
    ensure!(
        free_start % SLOT_SIZE == 0,
        "free_start {} is not slot aligned",
        free_start
    );
    Ok(())
}

impl<'a> SlottedPage<'a> {
    pub fn open(data: &'a [u8]) -> Result<Self> {
        validate(data)?;
        Ok(Self { data })
    }

    fn area(&self) -> &'a [u8] {
        &self.data[SLOT_HEADER_SIZE..]
    }

    pub fn free_start(&self) -> u16 {
        u16::from_be_bytes([self.data[0], self.data[1]])
    }

    pub fn free_length(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    pub fn entry_count(&self) -> u16 {
        self.free_start() / SLOT_SIZE as u16
    }

    pub fn is_empty(&self) -> bool {
        self.free_start() == 0
    }

    /// Returns the slot at `slot_no`.
    ///
    /// The boundary position `slot_no == entry_count` is readable so that
    /// callers may peek at where the next slot would go; anything past it
    /// is out of range.
    pub fn get_slot(&self, slot_no: SlotNum) -> Result<Slot> {
        let at = slot_no as usize * SLOT_SIZE;
        ensure!(
            at <= self.free_start() as usize && at + SLOT_SIZE <= self.area().len(),
            "slot index {} out of bounds (free_start={})",
            slot_no,
            self.free_start()
        );
        let slot = Slot::read_from_bytes(&self.area()[at..at + SLOT_SIZE])
            .map_err(|e| eyre::eyre!("failed to read slot {}: {:?}", slot_no, e))?;
        Ok(slot)
    }

    /// Returns the cell bytes at `offset`. Interpretation is up to the
    /// caller and the enclosing node type.
    pub fn cell(&self, offset: u16, size: u16) -> Result<&'a [u8]> {
        let start = offset as usize;
        let end = start + size as usize;
        ensure!(
            end <= self.area().len(),
            "cell [{}, {}) extends beyond the region end {}",
            start,
            end,
            self.area().len()
        );
        Ok(&self.area()[start..end])
    }

    /// Cell bytes addressed by a slot number.
    pub fn slot_cell(&self, slot_no: SlotNum) -> Result<(Slot, &'a [u8])> {
        ensure!(
            slot_no < self.entry_count(),
            "slot index {} out of bounds (entry_count={})",
            slot_no,
            self.entry_count()
        );
        let slot = self.get_slot(slot_no)?;
        Ok((slot, self.cell(slot.offset(), slot.size())?))
    }

    /// Iterates slots in ascending sorted order.
    pub fn slots(&self) -> impl Iterator<Item = (SlotNum, Slot)> + 'a {
        let area = self.area();
        (0..self.entry_count()).map(move |slot_no| {
            let at = slot_no as usize * SLOT_SIZE;
            // INVARIANT: the populated slot array is always in bounds
            let slot = Slot::read_from_bytes(&area[at..at + SLOT_SIZE]).unwrap();
            (slot_no, slot)
        })
    }
}

impl<'a> SlottedPageMut<'a> {
    /// Opens an existing region.
    pub fn open(data: &'a mut [u8]) -> Result<Self> {
        validate(data)?;
        Ok(Self { data })
    }

    /// Initializes an empty region: no slots, the whole area free.
    pub fn init(data: &'a mut [u8]) -> Result<Self> {
        ensure!(
            data.len() > SLOT_HEADER_SIZE,
            "slotted region too small: {} <= {}",
            data.len(),
            SLOT_HEADER_SIZE
        );
        let area = data.len() - SLOT_HEADER_SIZE;
        ensure!(
            area <= u16::MAX as usize,
            "slotted region too large: {} > {}",
            area,
            u16::MAX
        );

        data[0..2].copy_from_slice(&0u16.to_be_bytes());
        data[2..4].copy_from_slice(&(area as u16).to_be_bytes());
        Ok(Self { data })
    }

    pub fn as_ref(&self) -> SlottedPage<'_> {
        SlottedPage { data: self.data }
    }

    pub fn free_start(&self) -> u16 {
        self.as_ref().free_start()
    }

    pub fn free_length(&self) -> u16 {
        self.as_ref().free_length()
    }

    pub fn entry_count(&self) -> u16 {
        self.as_ref().entry_count()
    }

    pub fn get_slot(&self, slot_no: SlotNum) -> Result<Slot> {
        self.as_ref().get_slot(slot_no)
    }

    pub fn cell(&self, offset: u16, size: u16) -> Result<&[u8]> {
        let start = offset as usize;
        let end = start + size as usize;
        let area = &self.data[SLOT_HEADER_SIZE..];
        ensure!(
            end <= area.len(),
            "cell [{}, {}) extends beyond the region end {}",
            start,
            end,
            area.len()
        );
        Ok(&area[start..end])
    }

    pub fn cell_mut(&mut self, offset: u16, size: u16) -> Result<&mut [u8]> {
        let area = &mut self.data[SLOT_HEADER_SIZE..];
        let start = offset as usize;
        let end = start + size as usize;
        ensure!(
            end <= area.len(),
            "cell [{}, {}) extends beyond the region end {}",
            start,
            end,
            area.len()
        );
        Ok(&mut area[start..end])
    }

    fn set_free_start(&mut self, value: u16) {
        self.data[0..2].copy_from_slice(&value.to_be_bytes());
    }

    fn set_free_length(&mut self, value: u16) {
        self.data[2..4].copy_from_slice(&value.to_be_bytes());
    }

    fn set_slot(&mut self, slot_no: SlotNum, slot: Slot) {
        let at = SLOT_HEADER_SIZE + slot_no as usize * SLOT_SIZE;
        self.data[at..at + SLOT_SIZE].copy_from_slice(slot.as_bytes());
    }

    /// Carves `size` bytes off the cell heap and returns the new cell's
    /// offset. The heap grows from the tail toward the slot array.
    pub fn alloc_next_cell(&mut self, size: u16) -> Result<u16> {
        ensure!(size > 0, "cannot allocate an empty cell");
        ensure!(
            self.free_length() >= size,
            "not enough free space: need {}, have {}",
            size,
            self.free_length()
        );
        let new_length = self.free_length() - size;
        self.set_free_length(new_length);
        Ok(self.free_start() + new_length)
    }

    /// Appends a fresh slot recording `cell_size`, with the offset left
    /// zero for the caller to fill. Fails unless the free band can hold the
    /// slot and a cell of `cell_size`.
    pub fn create_next_slot(&mut self, cell_size: u16) -> Result<SlotNum> {
        ensure!(
            self.free_length() as usize >= cell_size as usize + SLOT_SIZE,
            "not enough free space: need {}, have {}",
            cell_size as usize + SLOT_SIZE,
            self.free_length()
        );
        let slot_no = self.entry_count();
        let free_start = self.free_start();
        self.set_free_start(free_start + SLOT_SIZE as u16);
        self.set_free_length(self.free_length() - SLOT_SIZE as u16);
        self.set_slot(slot_no, Slot::new(0, cell_size));
        Ok(slot_no)
    }

    /// Appends a slot and its cell in one step; the slot's offset points at
    /// the freshly allocated cell.
    pub fn create_next_slot_with_cell(&mut self, cell_size: u16) -> Result<(SlotNum, u16)> {
        let slot_no = self.create_next_slot(cell_size)?;
        let offset = self.alloc_next_cell(cell_size)?;
        self.set_slot(slot_no, Slot::new(offset, cell_size));
        Ok((slot_no, offset))
    }

    /// Removes the slot at `slot_no`, shifting the tail of the array left.
    /// The cell bytes stay allocated.
    pub fn delete_slot(&mut self, slot_no: SlotNum) -> Result<()> {
        ensure!(
            slot_no < self.entry_count(),
            "slot index {} out of bounds (entry_count={})",
            slot_no,
            self.entry_count()
        );

        let free_start = self.free_start() as usize;
        let from = (slot_no as usize + 1) * SLOT_SIZE;
        let to = slot_no as usize * SLOT_SIZE;
        let area = &mut self.data[SLOT_HEADER_SIZE..];
        area.copy_within(from..free_start, to);

        self.set_free_start(free_start as u16 - SLOT_SIZE as u16);
        self.set_free_length(self.free_length() + SLOT_SIZE as u16);
        Ok(())
    }

    /// Inserts `cell` at its sorted position according to `less` and
    /// returns the new slot number and cell offset.
    ///
    /// `less` ranks raw cell bytes; it must be consistent with the ordering
    /// used by later searches over this page. A cell equal to an existing
    /// one is placed after it.
    pub fn insert_cell<F>(&mut self, cell: &[u8], less: F) -> Result<(SlotNum, u16)>
    where
        F: Fn(&[u8], &[u8]) -> bool,
    {
        ensure!(!cell.is_empty(), "cannot insert an empty cell");
        ensure!(
            cell.len() <= u16::MAX as usize,
            "cell of {} bytes exceeds the addressable size",
            cell.len()
        );
        let size = cell.len() as u16;
        ensure!(
            self.free_length() as usize >= cell.len() + SLOT_SIZE,
            "not enough free space: need {}, have {}",
            cell.len() + SLOT_SIZE,
            self.free_length()
        );

        let mut low: i32 = 0;
        let mut high: i32 = self.entry_count() as i32 - 1;
        while low <= high {
            let mid = low + (high - low) / 2;
            let slot = self.get_slot(mid as SlotNum)?;
            let mid_cell = self.cell(slot.offset(), slot.size())?;
            if less(cell, mid_cell) {
                high = mid - 1;
            } else {
                low = mid + 1;
            }
        }
        let slot_no = low as SlotNum;

        // shift slots [slot_no, entry_count) right to open the gap
        let free_start = self.free_start() as usize;
        let from = slot_no as usize * SLOT_SIZE;
        let area = &mut self.data[SLOT_HEADER_SIZE..];
        area.copy_within(from..free_start, from + SLOT_SIZE);
        self.set_free_start(free_start as u16 + SLOT_SIZE as u16);
        self.set_free_length(self.free_length() - SLOT_SIZE as u16);

        let offset = self.alloc_next_cell(size)?;
        self.cell_mut(offset, size)?.copy_from_slice(cell);
        self.set_slot(slot_no, Slot::new(offset, size));
        Ok((slot_no, offset))
    }

    pub fn slots(&self) -> impl Iterator<Item = (SlotNum, Slot)> + '_ {
        self.as_ref().slots()
    }

    /// Rebuilds the cell heap from the live slots, reclaiming the bytes of
    /// cells whose slots were deleted. Slot order and numbering are
    /// preserved; only offsets change.
    pub fn compact(&mut self) -> Result<()> {
        let count = self.entry_count();
        let area_len = self.data.len() - SLOT_HEADER_SIZE;

        let mut staged: Vec<Vec<u8>> = Vec::with_capacity(count as usize);
        for slot_no in 0..count {
            let slot = self.get_slot(slot_no)?;
            staged.push(self.cell(slot.offset(), slot.size())?.to_vec());
        }

        let mut tail = area_len;
        for (slot_no, bytes) in staged.iter().enumerate() {
            tail -= bytes.len();
            let area = &mut self.data[SLOT_HEADER_SIZE..];
            area[tail..tail + bytes.len()].copy_from_slice(bytes);
            self.set_slot(slot_no as SlotNum, Slot::new(tail as u16, bytes.len() as u16));
        }

        let free_start = count as usize * SLOT_SIZE;
        self.set_free_length((tail - free_start) as u16);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test cell: a 2-byte length tag followed by 10 bytes of key data,
    /// ordered lexicographically.
    const TEST_CELL_SIZE: usize = 12;

    fn test_cell(key: &str) -> [u8; TEST_CELL_SIZE] {
        let mut cell = [0u8; TEST_CELL_SIZE];
        cell[0..2].copy_from_slice(&(TEST_CELL_SIZE as u16).to_be_bytes());
        cell[2..2 + key.len()].copy_from_slice(key.as_bytes());
        cell
    }

    fn lex_less(a: &[u8], b: &[u8]) -> bool {
        a[2..] < b[2..]
    }

    fn region() -> Vec<u8> {
        // 4-byte header + 128-byte slot/cell area
        vec![0u8; 132]
    }

    #[test]
    fn init_leaves_whole_area_free() {
        let mut buf = region();
        let page = SlottedPageMut::init(&mut buf).unwrap();

        assert_eq!(page.free_start(), 0);
        assert_eq!(page.free_length(), 128);
        assert_eq!(page.entry_count(), 0);
    }

    #[test]
    fn create_slots_and_cells_updates_free_pointers() {
        let mut buf = region();
        let mut page = SlottedPageMut::init(&mut buf).unwrap();
        let cell_size = 8u16;

        let slot_no = page.create_next_slot(cell_size).unwrap();
        let offset = page.alloc_next_cell(cell_size).unwrap();
        page.set_slot(slot_no, Slot::new(offset, cell_size));

        assert_eq!(slot_no, 0);
        assert_eq!(offset as usize, 128 - cell_size as usize);
        assert_eq!(page.free_start() as usize, SLOT_SIZE);
        assert_eq!(
            page.free_length() as usize,
            128 - SLOT_SIZE - cell_size as usize
        );

        let slot_no2 = page.create_next_slot(cell_size).unwrap();
        let offset2 = page.alloc_next_cell(cell_size).unwrap();
        page.set_slot(slot_no2, Slot::new(offset2, cell_size));

        assert_eq!(slot_no2, 1);
        assert_eq!(offset2 as usize, 128 - 2 * cell_size as usize);
        assert_eq!(page.free_start() as usize, 2 * SLOT_SIZE);
        assert_eq!(
            page.free_length() as usize,
            128 - 2 * SLOT_SIZE - 2 * cell_size as usize
        );
    }

    #[test]
    fn write_then_read_cell_through_slot() {
        let mut buf = region();
        let mut page = SlottedPageMut::init(&mut buf).unwrap();

        let (slot_no, offset) = page.create_next_slot_with_cell(8).unwrap();
        page.cell_mut(offset, 8)
            .unwrap()
            .copy_from_slice(b"payload!");

        let slot = page.get_slot(slot_no).unwrap();
        assert_eq!(slot.offset(), offset);
        assert_eq!(slot.size(), 8);
        assert_eq!(page.cell(slot.offset(), slot.size()).unwrap(), b"payload!");
    }

    #[test]
    fn get_slot_boundary_peek_is_allowed() {
        let mut buf = region();
        let page = SlottedPageMut::init(&mut buf).unwrap();

        // the next-free-slot position is readable, one past it is not
        assert!(page.get_slot(0).is_ok());
        let result = page.get_slot(1);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("out of bounds"));
    }

    #[test]
    fn sorted_insertion_orders_slots() {
        let mut buf = region();
        let mut page = SlottedPageMut::init(&mut buf).unwrap();

        let (n1, o1) = page.insert_cell(&test_cell("key1"), lex_less).unwrap();
        assert_eq!(n1, 0);
        assert_eq!(o1, page.free_start() + page.free_length());
        assert_eq!(&page.cell(o1, 12).unwrap()[2..6], b"key1");

        let (n2, _) = page.insert_cell(&test_cell("key2"), lex_less).unwrap();
        assert_eq!(n2, 1);

        let (n3, _) = page.insert_cell(&test_cell("key0"), lex_less).unwrap();
        assert_eq!(n3, 0);

        let keys: Vec<Vec<u8>> = page
            .slots()
            .map(|(_, s)| page.cell(s.offset(), s.size()).unwrap()[2..6].to_vec())
            .collect();
        assert_eq!(keys, vec![b"key0".to_vec(), b"key1".to_vec(), b"key2".to_vec()]);
    }

    #[test]
    fn equal_cells_insert_after_existing() {
        let mut buf = region();
        let mut page = SlottedPageMut::init(&mut buf).unwrap();

        let (first, first_offset) = page.insert_cell(&test_cell("same"), lex_less).unwrap();
        let (second, second_offset) = page.insert_cell(&test_cell("same"), lex_less).unwrap();

        assert_eq!(first, 0);
        assert_eq!(second, 1);
        // the earlier cell keeps the earlier slot
        assert_eq!(page.get_slot(0).unwrap().offset(), first_offset);
        assert_eq!(page.get_slot(1).unwrap().offset(), second_offset);
    }

    #[test]
    fn delete_slot_shifts_survivors_down() {
        let mut buf = region();
        let mut page = SlottedPageMut::init(&mut buf).unwrap();

        page.insert_cell(&test_cell("key1"), lex_less).unwrap();
        let (middle, _) = page.insert_cell(&test_cell("key3"), lex_less).unwrap();
        let (_, key4_offset) = page.insert_cell(&test_cell("key4"), lex_less).unwrap();

        page.delete_slot(middle).unwrap();

        assert_eq!(page.entry_count(), 2);
        // key4 moved down into the vacated slot index
        assert_eq!(page.get_slot(middle).unwrap().offset(), key4_offset);
    }

    #[test]
    fn insert_after_delete_reuses_slot_but_not_cell() {
        let mut buf = region();
        let mut page = SlottedPageMut::init(&mut buf).unwrap();

        page.insert_cell(&test_cell("key1"), lex_less).unwrap();
        let (deleted, _) = page.insert_cell(&test_cell("key3"), lex_less).unwrap();
        page.insert_cell(&test_cell("key4"), lex_less).unwrap();

        let free_start = page.free_start();
        let free_length = page.free_length();

        page.delete_slot(deleted).unwrap();
        assert_eq!(page.free_start(), free_start - SLOT_SIZE as u16);
        assert_eq!(page.free_length(), free_length + SLOT_SIZE as u16);

        let (slot_no, _) = page.insert_cell(&test_cell("key2"), lex_less).unwrap();

        assert_eq!(slot_no, deleted);
        assert_eq!(page.free_start(), free_start);
        // the old key3 cell bytes were not reclaimed
        assert_eq!(page.free_length(), free_length - TEST_CELL_SIZE as u16);
    }

    #[test]
    fn capacity_check_rejects_oversized_cell() {
        let mut buf = region();
        let mut page = SlottedPageMut::init(&mut buf).unwrap();

        let result = page.alloc_next_cell(200);

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("not enough free space"));
    }

    #[test]
    fn insert_cell_fails_once_region_is_full() {
        let mut buf = region();
        let mut page = SlottedPageMut::init(&mut buf).unwrap();

        // 128 / (12 + 4) = 8 cells fill the region exactly
        for i in 0..8 {
            page.insert_cell(&test_cell(&format!("key{}", i)), lex_less)
                .unwrap();
        }
        assert_eq!(page.free_length(), 0);

        let result = page.insert_cell(&test_cell("key9"), lex_less);
        assert!(result.is_err());
    }

    #[test]
    fn free_pointers_stay_consistent() {
        let mut buf = region();
        let mut page = SlottedPageMut::init(&mut buf).unwrap();

        for key in ["d", "a", "c", "b"] {
            page.insert_cell(&test_cell(key), lex_less).unwrap();

            let free_start = page.free_start() as usize;
            let free_length = page.free_length() as usize;
            assert!(free_start + free_length <= 128);
            assert_eq!(free_start % SLOT_SIZE, 0);

            for (_, slot) in page.slots() {
                let start = slot.offset() as usize;
                assert!(start >= free_start + free_length);
                assert!(start + slot.size() as usize <= 128);
            }
        }
    }

    #[test]
    fn open_rejects_corrupt_header() {
        let mut buf = region();
        SlottedPageMut::init(&mut buf).unwrap();
        // free_start + free_length beyond the area
        buf[0..2].copy_from_slice(&40u16.to_be_bytes());
        buf[2..4].copy_from_slice(&120u16.to_be_bytes());

        let result = SlottedPage::open(&buf);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("out of bounds"));
    }

    #[test]
    fn open_rejects_misaligned_free_start() {
        let mut buf = region();
        SlottedPageMut::init(&mut buf).unwrap();
        buf[0..2].copy_from_slice(&6u16.to_be_bytes());
        buf[2..4].copy_from_slice(&0u16.to_be_bytes());

        let result = SlottedPage::open(&buf);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not slot aligned"));
    }

    #[test]
    fn compact_reclaims_dead_cell_bytes() {
        let mut buf = region();
        let mut page = SlottedPageMut::init(&mut buf).unwrap();

        page.insert_cell(&test_cell("key1"), lex_less).unwrap();
        let (dead, _) = page.insert_cell(&test_cell("key2"), lex_less).unwrap();
        page.insert_cell(&test_cell("key3"), lex_less).unwrap();
        page.delete_slot(dead).unwrap();
        let fragmented = page.free_length();

        page.compact().unwrap();

        // the deleted cell's bytes came back
        assert_eq!(page.free_length(), fragmented + TEST_CELL_SIZE as u16);
        assert_eq!(page.entry_count(), 2);

        let keys: Vec<Vec<u8>> = page
            .slots()
            .map(|(_, s)| page.cell(s.offset(), s.size()).unwrap()[2..6].to_vec())
            .collect();
        assert_eq!(keys, vec![b"key1".to_vec(), b"key3".to_vec()]);
    }

    #[test]
    fn compact_on_full_page_is_a_no_op() {
        let mut buf = region();
        let mut page = SlottedPageMut::init(&mut buf).unwrap();
        for i in 0..8 {
            page.insert_cell(&test_cell(&format!("key{}", i)), lex_less)
                .unwrap();
        }
        let before = buf.clone();

        let mut page = SlottedPageMut::open(&mut buf).unwrap();
        page.compact().unwrap();
        let free_length = page.free_length();

        assert_eq!(free_length, 0);
        assert_eq!(buf, before);
    }

    #[test]
    fn iteration_yields_ascending_slot_numbers() {
        let mut buf = region();
        let mut page = SlottedPageMut::init(&mut buf).unwrap();
        for key in ["b", "c", "a"] {
            page.insert_cell(&test_cell(key), lex_less).unwrap();
        }

        let numbers: Vec<SlotNum> = page.slots().map(|(n, _)| n).collect();

        assert_eq!(numbers, vec![0, 1, 2]);
    }
}
