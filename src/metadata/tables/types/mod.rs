//! Core infrastructure of the `#~` schema decoder.
//!
//! - [`TableId`] names the 45 tables in stream order
//! - [`CodedIndexType`] and [`CodedIndex`] describe multi-table references
//! - [`TableInfo`] derives every column width and row size from the heap-size flags and row
//!   counts
//! - [`RowReadable`] is implemented by each decoded row type, and [`MetadataTable`] holds the
//!   rows of one decoded table
//!
//! # Reference
//! - [ECMA-335 II.22 and II.24.2.6](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

mod codedindex;
mod tableid;
mod tableinfo;

use crate::Result;

pub use codedindex::{CodedIndex, CodedIndexType};
pub use tableid::TableId;
pub use tableinfo::{TableInfo, TableRowInfo};

/// A row type that can be decoded from table data
pub trait RowReadable: Sized + Send + Sync {
    /// The table this row type belongs to
    const TABLE_ID: TableId;

    /// Size of one row under the column widths in `sizes`
    #[must_use]
    fn row_size(sizes: &TableInfo) -> u32 {
        sizes.row_size(Self::TABLE_ID)
    }

    /// Decode the row with 1-based id `rid` at `offset`, advancing `offset` past it
    ///
    /// `offset` is relative to `data`, which is expected to start at the first row of the table.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the row does not fit in `data`, and
    /// [`crate::Error::Malformed`] for undecodable columns
    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self>;
}

/// The decoded rows of one metadata table
pub struct MetadataTable<T> {
    rows: Vec<T>,
    row_size: u32,
}

impl<T: RowReadable> MetadataTable<T> {
    /// Decode `row_count` rows from `data`
    ///
    /// # Errors
    /// Returns an error if any row fails to decode
    pub fn new(data: &[u8], row_count: u32, sizes: &TableInfo) -> Result<Self> {
        let row_size = T::row_size(sizes);

        let mut rows = Vec::with_capacity(row_count as usize);
        let mut offset = 0;
        for rid in 1..=row_count {
            let start = offset;
            rows.push(T::row_read(data, &mut offset, rid, sizes)?);

            debug_assert_eq!(offset - start, row_size as usize);
        }

        Ok(MetadataTable { rows, row_size })
    }

    /// An empty table, for tables absent from the stream
    #[must_use]
    pub fn empty(sizes: &TableInfo) -> Self {
        MetadataTable {
            rows: Vec::new(),
            row_size: T::row_size(sizes),
        }
    }

    /// Size of one row in bytes
    #[must_use]
    pub fn row_size(&self) -> u32 {
        self.row_size
    }

    /// Number of rows
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Total size of the table in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::from(self.row_count()) * u64::from(self.row_size)
    }

    /// Get the row with 1-based id `rid`
    #[must_use]
    pub fn get(&self, rid: u32) -> Option<&T> {
        if rid == 0 {
            return None;
        }

        self.rows.get(rid as usize - 1)
    }

    /// Iterate over the rows in id order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }
}

impl<'t, T: RowReadable> IntoIterator for &'t MetadataTable<T> {
    type Item = &'t T;
    type IntoIter = std::slice::Iter<'t, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
