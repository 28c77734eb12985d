//! Database handle: ownership root for the storage stack.

use std::io::{Read, Seek, Write};

use eyre::Result;

use crate::storage::Pager;

/// A single-file database over a seekable byte stream.
///
/// The handle exclusively owns the pager, which in turn exclusively owns
/// the stream and every cached page. Index structures borrow the pager for
/// the duration of their operations.
pub struct Database<S> {
    pub pager: Pager<S>,
}

impl<S: Read + Write + Seek> Database<S> {
    /// Opens a database over `stream`, initializing the first page when
    /// the stream is empty.
    pub fn open(stream: S) -> Result<Self> {
        Ok(Self {
            pager: Pager::open(stream)?,
        })
    }
}
