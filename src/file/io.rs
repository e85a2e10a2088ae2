//! Bounds-checked little-endian primitive access on raw byte slices.
//!
//! [`CilIO`] abstracts over the integer widths found in PE and metadata structures, so that
//! [`read_le_at`] can serve every field. [`read_le_at_dyn`] reads the
//! 2-or-4 byte indices whose width is only known once the tables header has been decoded.

use crate::Result;

/// Decoding of primitive integers from their little-endian byte representation.
pub trait CilIO: Sized {
    /// Fixed-size byte array holding one encoded value
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Decode a value from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_cil_io {
    ($($ty:ty => $len:literal),* $(,)?) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; $len];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_cil_io!(u8 => 1, i8 => 1, u16 => 2, i16 => 2, u32 => 4, i32 => 4, u64 => 8, i64 => 8);

/// Reads a `T` at `offset` and advances `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let size = std::mem::size_of::<T>();
    let end = offset
        .checked_add(size)
        .ok_or(out_of_bounds_error!(*offset, size, data.len()))?;
    if end > data.len() {
        return Err(out_of_bounds_error!(*offset, size, data.len()));
    }

    let Ok(bytes) = T::Bytes::try_from(&data[*offset..end]) else {
        return Err(out_of_bounds_error!(*offset, size, data.len()));
    };

    *offset = end;
    Ok(T::from_le_bytes(bytes))
}

/// Reads a 4-byte value if `is_large` is set, otherwise a 2-byte one, widened to `u32`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit in `data`.
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, is_large: bool) -> Result<u32> {
    if is_large {
        read_le_at::<u32>(data, offset)
    } else {
        Ok(u32::from(read_le_at::<u16>(data, offset)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_widths() {
        let mut offset = 0;
        assert_eq!(read_le_at::<u8>(&TEST_BUFFER, &mut offset).unwrap(), 0x01);
        assert_eq!(read_le_at::<u16>(&TEST_BUFFER, &mut offset).unwrap(), 0x0302);
        assert_eq!(read_le_at::<u32>(&TEST_BUFFER, &mut offset).unwrap(), 0x0706_0504);
        assert_eq!(offset, 7);

        let mut offset = 0;
        assert_eq!(
            read_le_at::<u64>(&TEST_BUFFER, &mut offset).unwrap(),
            0x0807_0605_0403_0201
        );
        assert_eq!(offset, 8);
    }

    #[test]
    fn read_dyn() {
        let mut offset = 0;
        assert_eq!(read_le_at_dyn(&TEST_BUFFER, &mut offset, false).unwrap(), 0x0201);
        assert_eq!(read_le_at_dyn(&TEST_BUFFER, &mut offset, true).unwrap(), 0x0605_0403);
        assert_eq!(offset, 6);
    }

    #[test]
    fn read_past_end() {
        let mut offset = 6;
        let result = read_le_at::<u32>(&TEST_BUFFER, &mut offset);
        assert!(matches!(
            result,
            Err(Error::OutOfBounds {
                offset: 6,
                needed: 4,
                available: 8
            })
        ));
        assert_eq!(offset, 6);

        let mut offset = usize::MAX;
        assert!(matches!(
            read_le_at::<u8>(&TEST_BUFFER, &mut offset),
            Err(Error::OutOfBounds { .. })
        ));
    }
}
