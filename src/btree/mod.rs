//! # B+Tree Index
//!
//! A B+tree over slotted pages: interior nodes hold separator cells with
//! child pointers, leaves hold the record cells, and all of it lives in
//! pager-owned 512-byte pages.
//!
//! ```text
//!                  (7 END)              <- interior: separators + end cell
//!                 /      \
//!           [3 5 6]     [7 9]           <- leaves, linked by sibling ids
//!              └──────────┘
//! ```
//!
//! ## Node Capacity
//!
//! [`BTREE_ORDER`] bounds the number of cells per node (the end cell
//! counts). It is derived from the page geometry assuming worst-case cell
//! spacing, so an order-full node always fit its cells; the byte-level
//! capacity of the slotted region is reclaimed by compaction when repeated
//! splits leave dead cell bytes behind.
//!
//! ## Module Organization
//!
//! - `slotted`: the in-page slot/cell allocator
//! - `cell`: cell layouts, typed payload values, orderings
//! - `node`: adapters from pages to slotted regions
//! - `tree`: search, insertion, splitting, debug rendering

pub mod cell;
pub mod node;
pub mod slotted;
pub mod tree;

pub use cell::{
    interior_less, leaf_less, CellPayload, CellValue, InteriorCell, LeafCell, NodeCell,
    LARGE_CELL_INLINE, MAX_CELL_PAYLOAD,
};
pub use slotted::{Slot, SlotNum, SlottedPage, SlottedPageMut, SLOT_SIZE};
pub use tree::{print_tree, BTree};

use crate::storage::{BTREE_HEADER_SIZE, PAGE_SIZE};

/// Worst-case bytes a single cell may occupy in a node, payload headroom
/// included.
pub const MAX_CELL_SIZE: usize = {
    let node = size_of::<NodeCell>();
    let interior = size_of::<InteriorCell>();
    let largest = if node > interior { node } else { interior };
    largest + MAX_CELL_PAYLOAD
};

/// Maximum cells per node, end cell included, derived from the page
/// geometry.
pub const BTREE_ORDER: usize = (PAGE_SIZE - BTREE_HEADER_SIZE) / (MAX_CELL_SIZE + SLOT_SIZE);

const _: () = assert!(BTREE_ORDER >= 1, "b-tree order must be at least 1");
