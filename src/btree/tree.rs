//! # B+Tree Operations
//!
//! Search, insertion, and node splitting over pager-owned pages.
//!
//! ## Descent
//!
//! Interior slots are walked in ascending order. A real cell routes the
//! query to its `left_child` when the query is strictly below the cell's
//! separator; the end cell (always the highest slot) catches everything
//! else. Equal keys therefore descend right of their separator, matching
//! insertion, which places equals after existing cells.
//!
//! ## Splitting
//!
//! A node at capacity splits by moving its lowest `ceil(n/2)` slots into a
//! freshly allocated node of the same type. The new node holds the lower
//! half of the keys and the original keeps the upper half, so the separator
//! promoted to the parent is simply the smallest key still in the original:
//!
//! ```text
//!      before                        after
//!   N: [1 2 3 4]          M: [1 2]        N: [3 4]
//!                               \          /
//!                           parent gains (3, left=M)
//! ```
//!
//! The original node's cell heap is never compacted by a split; only its
//! slot array shrinks. The new node's heap is built fresh.
//!
//! When the split node was the root, a new interior root is allocated with
//! a single end cell pointing at the old root, the separator is inserted
//! into it, and both halves are reparented. Split propagation recurses
//! toward the root; tree depth keeps the recursion shallow.
//!
//! ## Leaf Chain
//!
//! Leaves link forward in key order through the reserved sibling pointer.
//! After a leaf split the new lower leaf points at the upper half, which
//! keeps whatever sibling it already had.

use std::fmt::{Display, Write as FmtWrite};
use std::io::{Read, Seek, Write};

use eyre::{bail, ensure, eyre, Result};
use smallvec::SmallVec;
use zerocopy::IntoBytes;

use crate::storage::{BTreeHeader, PageId, PageType, Pager};

use super::cell::{interior_less, leaf_less, CellValue, InteriorCell, NodeCell};
use super::node;
use super::slotted::{SlotNum, SLOT_SIZE};
use super::{BTREE_ORDER, MAX_CELL_SIZE};

/// A cell staged for insertion while a split is in flight.
enum PendingCell {
    Leaf(NodeCell),
    Interior(InteriorCell),
}

impl PendingCell {
    fn value<V: CellValue>(&self) -> V {
        match self {
            PendingCell::Leaf(cell) => cell.value::<V>(),
            PendingCell::Interior(cell) => cell.cell().value::<V>(),
        }
    }
}

/// B+tree handle over pager-owned pages.
///
/// The tree stores page ids, never memory pointers; the root id moves when
/// the root splits, so callers should re-read [`BTree::root`] after
/// mutations if they persist it elsewhere.
#[derive(Debug)]
pub struct BTree<'p, S> {
    pager: &'p mut Pager<S>,
    root: PageId,
}

impl<'p, S: Read + Write + Seek> BTree<'p, S> {
    /// Creates a new tree whose root is a fresh empty leaf.
    pub fn create(pager: &'p mut Pager<S>) -> Result<Self> {
        let (root, _) = pager.from_next_free(PageType::Leaf)?;
        Ok(Self { pager, root })
    }

    /// Opens an existing tree rooted at `root`.
    pub fn open(pager: &'p mut Pager<S>, root: PageId) -> Result<Self> {
        let page_type = pager.get_page(root)?.page_type();
        ensure!(
            page_type.is_btree(),
            "page {}: expected a b-tree root, got {:?}",
            root,
            page_type
        );
        Ok(Self { pager, root })
    }

    pub fn root(&self) -> PageId {
        self.root
    }

    pub fn pager(&mut self) -> &mut Pager<S> {
        self.pager
    }

    /// Descends to the leaf that would contain `query`.
    ///
    /// Existence is not checked; pair with [`BTree::search_get_slot`].
    pub fn search_get_leaf<V: CellValue>(&mut self, query: V) -> Result<PageId> {
        let mut current = self.root;

        loop {
            let page = self.pager.get_page(current)?;
            match page.page_type() {
                PageType::Leaf => return Ok(current),
                PageType::Interior => {
                    let slots = node::slotted(page)?;
                    let mut next = None;
                    for (_, slot) in slots.slots() {
                        let cell =
                            InteriorCell::from_cell_bytes(slots.cell(slot.offset(), slot.size())?)?;
                        ensure!(
                            cell.left_child() != 0,
                            "page {}: interior cell without a child, tree is unbalanced",
                            current
                        );
                        if cell.is_end() || query < cell.cell().value::<V>() {
                            next = Some(cell.left_child());
                            break;
                        }
                    }
                    current = next.ok_or_else(|| {
                        eyre!("page {}: interior node is missing its end cell", current)
                    })?;
                }
                other => bail!(
                    "page {}: unexpected page type {:?} during descent",
                    current,
                    other
                ),
            }
        }
    }

    /// Equality scan within a leaf; returns the slot and cell holding
    /// `query`, or `None`.
    pub fn search_get_slot<V: CellValue>(
        &mut self,
        leaf: PageId,
        query: V,
    ) -> Result<Option<(SlotNum, NodeCell)>> {
        let page = self.pager.get_page(leaf)?;
        ensure!(
            page.page_type() == PageType::Leaf,
            "page {}: expected Leaf, got {:?}",
            leaf,
            page.page_type()
        );

        let slots = node::slotted(page)?;
        for (slot_no, slot) in slots.slots() {
            let cell = NodeCell::from_cell_bytes(slots.cell(slot.offset(), slot.size())?)?;
            let value = cell.value::<V>();
            if value == query {
                return Ok(Some((slot_no, *cell)));
            }
            if query < value {
                break;
            }
        }
        Ok(None)
    }

    /// Searches the whole tree for `query`.
    pub fn get<V: CellValue>(&mut self, query: V) -> Result<Option<NodeCell>> {
        let leaf = self.search_get_leaf(query)?;
        Ok(self.search_get_slot(leaf, query)?.map(|(_, cell)| cell))
    }

    /// Inserts `value` into the tree, splitting along the way as needed.
    pub fn insert<V: CellValue>(&mut self, value: V) -> Result<()> {
        let leaf = self.search_get_leaf(value)?;
        self.leaf_insert(leaf, value)
    }

    /// Inserts `value` into a known leaf.
    pub fn leaf_insert<V: CellValue>(&mut self, leaf: PageId, value: V) -> Result<()> {
        let count = node::entry_count(self.pager.get_page(leaf)?)?;
        let cell = NodeCell::new(value);

        if (count as usize) < BTREE_ORDER {
            return self.insert_into_node(leaf, cell.as_bytes(), leaf_less::<V>);
        }

        self.split_and_insert::<V>(leaf, PendingCell::Leaf(cell))
    }

    /// Inserts a separator cell into a known interior node.
    pub fn interior_insert<V: CellValue>(
        &mut self,
        node_id: PageId,
        cell: InteriorCell,
    ) -> Result<()> {
        let count = node::entry_count(self.pager.get_page(node_id)?)?;

        if (count as usize) < BTREE_ORDER {
            return self.insert_into_node(node_id, cell.as_bytes(), interior_less::<V>);
        }

        self.split_and_insert::<V>(node_id, PendingCell::Interior(cell))
    }

    /// Sorted-inserts raw cell bytes into a node below the order limit,
    /// compacting the node's heap first when splits have starved it of
    /// contiguous free bytes.
    fn insert_into_node(
        &mut self,
        id: PageId,
        cell: &[u8],
        less: fn(&[u8], &[u8]) -> bool,
    ) -> Result<()> {
        let page = self.pager.get_page_mut(id)?;
        let mut slots = node::slotted_mut(page)?;
        if (slots.free_length() as usize) < cell.len() + SLOT_SIZE {
            slots.compact()?;
        }
        slots.insert_cell(cell, less)?;
        Ok(())
    }

    /// Splits the node at `id` and returns the id of the new node holding
    /// the lower half of its cells.
    fn split(&mut self, id: PageId) -> Result<PageId> {
        // pop the lowest half out of the original, staging the raw cells
        let (page_type, parent, moved) = {
            let page = self.pager.get_page_mut(id)?;
            let page_type = page.page_type();
            let parent = page.view::<BTreeHeader>().parent();
            let mut slots = node::slotted_mut(page)?;

            let count = slots.entry_count();
            let half = count / 2 + (count & 1);
            let mut moved: SmallVec<[SmallVec<[u8; MAX_CELL_SIZE]>; BTREE_ORDER]> =
                SmallVec::new();
            for _ in 0..half {
                let slot = slots.get_slot(0)?;
                let bytes = slots.cell(slot.offset(), slot.size())?;
                moved.push(SmallVec::from_slice(bytes));
                slots.delete_slot(0)?;
            }
            (page_type, parent, moved)
        };

        let new_id = {
            let (new_id, new_page) = self.pager.from_next_free(page_type)?;
            new_page.view_mut::<BTreeHeader>().set_parent(parent);
            let mut slots = node::slotted_mut(new_page)?;
            for bytes in &moved {
                let (_, offset) = slots.create_next_slot_with_cell(bytes.len() as u16)?;
                slots.cell_mut(offset, bytes.len() as u16)?.copy_from_slice(bytes);
            }
            new_id
        };

        if page_type == PageType::Interior {
            // subtrees that moved across now hang off the new node
            for bytes in &moved {
                let child = InteriorCell::from_cell_bytes(bytes)?.left_child();
                if child != 0 {
                    self.pager
                        .get_page_mut(child)?
                        .view_mut::<BTreeHeader>()
                        .set_parent(new_id);
                }
            }
        } else {
            // the new lower leaf precedes the original in key order
            self.pager.get_page_mut(new_id)?.set_sibling(id)?;
        }

        Ok(new_id)
    }

    fn split_and_insert<V: CellValue>(&mut self, id: PageId, pending: PendingCell) -> Result<()> {
        let key_replaces_value = matches!(pending, PendingCell::Interior(_));
        let lower_id = self.split(id)?;

        // the smallest key still in the original becomes the separator
        let (parent, median, promoted_child) = {
            let page = self.pager.get_page(id)?;
            let parent = page.view::<BTreeHeader>().parent();
            let slots = node::slotted(page)?;
            let (_, bytes) = slots.slot_cell(0)?;
            if key_replaces_value {
                let cell = InteriorCell::from_cell_bytes(bytes)?;
                (parent, cell.cell().value::<V>(), cell.left_child())
            } else {
                (parent, NodeCell::from_cell_bytes(bytes)?.value::<V>(), 0)
            }
        };
        let separator = InteriorCell::new(median, lower_id);

        if key_replaces_value {
            // the promoted separator's subtree becomes the lower node's
            // rightmost child, and the promoted cell leaves the original
            let end = InteriorCell::end(promoted_child);
            self.insert_into_node(lower_id, end.as_bytes(), interior_less::<V>)?;
            if promoted_child != 0 {
                self.pager
                    .get_page_mut(promoted_child)?
                    .view_mut::<BTreeHeader>()
                    .set_parent(lower_id);
            }
            let page = self.pager.get_page_mut(id)?;
            node::slotted_mut(page)?.delete_slot(0)?;
        }

        // the pending cell lands in whichever half owns its key range
        let target = if pending.value::<V>() < median {
            lower_id
        } else {
            id
        };
        match &pending {
            PendingCell::Leaf(cell) => {
                self.insert_into_node(target, cell.as_bytes(), leaf_less::<V>)?;
            }
            PendingCell::Interior(cell) => {
                self.insert_into_node(target, cell.as_bytes(), interior_less::<V>)?;
                // the pending separator's subtree follows it to its new home
                if cell.left_child() != 0 {
                    self.pager
                        .get_page_mut(cell.left_child())?
                        .view_mut::<BTreeHeader>()
                        .set_parent(target);
                }
            }
        }

        if parent == 0 {
            // the root split: grow the tree upward
            let new_root = {
                let (new_root, page) = self.pager.from_next_free(PageType::Interior)?;
                let end = InteriorCell::end(id);
                node::slotted_mut(page)?.insert_cell(end.as_bytes(), interior_less::<V>)?;
                new_root
            };
            for child in [id, lower_id] {
                self.pager
                    .get_page_mut(child)?
                    .view_mut::<BTreeHeader>()
                    .set_parent(new_root);
            }
            self.root = new_root;
            self.interior_insert::<V>(new_root, separator)
        } else {
            self.interior_insert::<V>(parent, separator)
        }
    }

    /// Collects every value in key order by an in-order walk from the root.
    pub fn values<V: CellValue>(&mut self) -> Result<Vec<V>> {
        let mut out = Vec::new();
        let root = self.root;
        self.collect_values(root, &mut out)?;
        Ok(out)
    }

    fn collect_values<V: CellValue>(&mut self, page_id: PageId, out: &mut Vec<V>) -> Result<()> {
        enum Entry<V> {
            Value(V),
            Child(PageId),
        }

        let entries: Vec<Entry<V>> = {
            let page = self.pager.get_page(page_id)?;
            let slots = node::slotted(page)?;
            match page.page_type() {
                PageType::Leaf => slots
                    .slots()
                    .map(|(_, slot)| {
                        let bytes = slots.cell(slot.offset(), slot.size())?;
                        Ok(Entry::Value(NodeCell::from_cell_bytes(bytes)?.value::<V>()))
                    })
                    .collect::<Result<_>>()?,
                PageType::Interior => slots
                    .slots()
                    .map(|(_, slot)| {
                        let bytes = slots.cell(slot.offset(), slot.size())?;
                        Ok(Entry::Child(InteriorCell::from_cell_bytes(bytes)?.left_child()))
                    })
                    .collect::<Result<_>>()?,
                other => bail!("page {}: unexpected page type {:?} in tree", page_id, other),
            }
        };

        for entry in entries {
            match entry {
                Entry::Value(value) => out.push(value),
                Entry::Child(child) => self.collect_values(child, out)?,
            }
        }
        Ok(())
    }
}

/// Renders the subtree at `root` for debugging: `(k1 k2 END child...)` for
/// interior nodes, `[v1 v2 ...]` for leaves.
pub fn print_tree<V, S, W>(pager: &mut Pager<S>, root: PageId, out: &mut W) -> Result<()>
where
    V: CellValue + Display,
    S: Read + Write + Seek,
    W: FmtWrite,
{
    enum Part<V> {
        Value(V),
        End,
        Child(PageId),
    }

    let (is_leaf, parts) = {
        let page = pager.get_page(root)?;
        let slots = node::slotted(page)?;
        match page.page_type() {
            PageType::Leaf => {
                let mut parts = Vec::new();
                for (_, slot) in slots.slots() {
                    let bytes = slots.cell(slot.offset(), slot.size())?;
                    parts.push(Part::Value(NodeCell::from_cell_bytes(bytes)?.value::<V>()));
                }
                (true, parts)
            }
            PageType::Interior => {
                let mut parts = Vec::new();
                let mut children = Vec::new();
                for (_, slot) in slots.slots() {
                    let bytes = slots.cell(slot.offset(), slot.size())?;
                    let cell = InteriorCell::from_cell_bytes(bytes)?;
                    if cell.is_end() {
                        parts.push(Part::End);
                    } else {
                        parts.push(Part::Value(cell.cell().value::<V>()));
                    }
                    children.push(Part::Child(cell.left_child()));
                }
                parts.extend(children);
                (false, parts)
            }
            other => bail!("page {}: unexpected page type {:?} in tree", root, other),
        }
    };

    out.write_char(if is_leaf { '[' } else { '(' })
        .map_err(|e| eyre!("failed to render tree: {e}"))?;
    let mut first = true;
    for part in parts {
        if !first {
            out.write_char(' ')
                .map_err(|e| eyre!("failed to render tree: {e}"))?;
        }
        first = false;
        match part {
            Part::Value(value) => out
                .write_fmt(format_args!("{value}"))
                .map_err(|e| eyre!("failed to render tree: {e}"))?,
            Part::End => out
                .write_str("END")
                .map_err(|e| eyre!("failed to render tree: {e}"))?,
            Part::Child(child) => print_tree::<V, S, W>(pager, child, out)?,
        }
    }
    out.write_char(if is_leaf { ']' } else { ')' })
        .map_err(|e| eyre!("failed to render tree: {e}"))?;
    Ok(())
}
