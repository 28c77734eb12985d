//! # slotdb - Single-File Embedded Storage Engine
//!
//! A small embedded database core: a paged storage engine over one
//! seekable stream, and a B+tree index built on slotted pages. Records are
//! fixed-width typed values persisted in 512-byte pages; search, insertion,
//! and free-page management are the exposed operations.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::fs::OpenOptions;
//! use slotdb::{BTree, Database};
//!
//! let file = OpenOptions::new()
//!     .read(true)
//!     .write(true)
//!     .create(true)
//!     .open("records.db")?;
//!
//! let mut db = Database::open(file)?;
//! let mut tree = BTree::create(&mut db.pager)?;
//! tree.insert(42u32)?;
//! assert!(tree.get(42u32)?.is_some());
//! db.pager.flush_all()?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        Database (ownership root)     │
//! ├─────────────────────────────────────┤
//! │   B+Tree (search / insert / split)   │
//! ├─────────────────────────────────────┤
//! │  Slotted pages (slots + cell heap)   │
//! ├─────────────────────────────────────┤
//! │  Pager (cache, freelist, flushing)   │
//! ├─────────────────────────────────────┤
//! │  Byte codec over a seekable stream   │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## File Format
//!
//! The file is a sequence of 512-byte pages. Page 0 carries the format
//! version and the freelist head; every other page declares its type in
//! the first header byte. All multibyte fields are big-endian. Freed pages
//! chain into an intrusive LIFO freelist and are reused before the file
//! grows.
//!
//! ## Scope
//!
//! Single-threaded and synchronous by design: one handle, one pager, one
//! stream. There is no write-ahead log; durability is a best-effort
//! in-place flush of dirty pages.
//!
//! ## Module Overview
//!
//! - [`storage`]: page buffers, typed header views, pager, overflow chains
//! - [`btree`]: slotted pages, cells, tree operations
//! - [`encoding`]: big-endian stream codec
//! - [`database`]: the owning handle

pub mod btree;
pub mod database;
pub mod encoding;
pub mod storage;

pub use btree::{print_tree, BTree, CellValue, InteriorCell, LeafCell, NodeCell, BTREE_ORDER};
pub use database::Database;
pub use storage::{Page, PageId, PageType, Pager, FIRST_PAGE_ID, PAGE_SIZE};
