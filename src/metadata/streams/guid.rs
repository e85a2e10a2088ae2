//! The `#GUID` heap: 16-byte records addressed by 1-based index.

use crate::Result;

/// Size of one `#GUID` record
const GUID_SIZE: usize = 16;

/// View over the `#GUID` heap
pub struct Guid<'a> {
    data: &'a [u8],
}

impl<'a> Guid<'a> {
    /// Wrap the heap bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the heap size is not a multiple of 16
    pub fn from(data: &'a [u8]) -> Result<Guid<'a>> {
        if data.len() % GUID_SIZE != 0 {
            return Err(malformed_error!(
                "#GUID heap size {} is not a multiple of {}",
                data.len(),
                GUID_SIZE
            ));
        }

        Ok(Guid { data })
    }

    /// Number of records in the heap
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / GUID_SIZE
    }

    /// Returns true if the heap holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the record with 1-based `index`; index 0 is the null GUID
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for an index past the last record
    pub fn get(&self, index: usize) -> Result<uguid::Guid> {
        if index == 0 {
            return Ok(uguid::Guid::ZERO);
        }

        let start = (index - 1) * GUID_SIZE;
        let Some(record) = self.data.get(start..start + GUID_SIZE) else {
            return Err(out_of_bounds_error!(start, GUID_SIZE, self.data.len()));
        };

        let mut buffer = [0u8; GUID_SIZE];
        buffer.copy_from_slice(record);
        Ok(uguid::Guid::from_bytes(buffer))
    }
}
