use crate::error::{LibError, LibResult};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

/// The oldest library version that can be read.
pub const MIN_LIBRARY_VERSION: i32 = 2;

/// The first version that carries a frame table.
pub const FRAME_TABLE_VERSION: i32 = 3;

/// Represents the fixed header at the start of a library archive.
///
/// Layout (little-endian):
///
///   Offset | Length | Name               | Description
///   ------:| ------:|:------------------:| -------------------------------------------
///        0 |      4 | version            | Format version, at least 2.
///        4 |      4 | record_count       | Number of image records in the offset index.
///        8 |      4 | frame_table_offset | Absolute offset of the frame table (version 3+ only).
///
/// The offset index (`record_count` x `i32`) follows immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryHeader {
    /// The format version of the archive.
    pub version: i32,
    /// The number of image records in the archive.
    pub record_count: u32,
    /// The absolute offset of the frame table, present from version 3 onwards.
    pub frame_table_offset: Option<u32>,
}

impl LibraryHeader {
    /// Reads the header from the current position of `reader`.
    pub(crate) fn read<R: Read>(reader: &mut R) -> LibResult<Self> {
        let version = reader.read_i32::<LittleEndian>()?;
        if version < MIN_LIBRARY_VERSION {
            return Err(LibError::UnsupportedVersion(version));
        }

        let record_count = reader.read_i32::<LittleEndian>()?;
        let record_count = u32::try_from(record_count).map_err(|_| {
            LibError::InvalidData(format!("Negative record count {record_count}"))
        })?;

        let frame_table_offset = if version >= FRAME_TABLE_VERSION {
            let offset = reader.read_i32::<LittleEndian>()?;
            let offset = u32::try_from(offset).map_err(|_| {
                LibError::InvalidData(format!("Negative frame table offset {offset}"))
            })?;
            Some(offset)
        } else {
            None
        };

        Ok(LibraryHeader {
            version,
            record_count,
            frame_table_offset,
        })
    }

    /// Reads the offset index that follows the header.
    pub(crate) fn read_offsets<R: Read>(&self, reader: &mut R) -> LibResult<Vec<u32>> {
        let mut offsets = Vec::new();
        offsets
            .try_reserve_exact(self.record_count as usize)
            .map_err(|e| LibError::InvalidData(format!("Offset index too large: {e}")))?;

        for index in 0..self.record_count {
            let offset = reader.read_i32::<LittleEndian>()?;
            let offset = u32::try_from(offset).map_err(|_| {
                LibError::InvalidData(format!("Negative offset {offset} for image {index}"))
            })?;
            offsets.push(offset);
        }
        Ok(offsets)
    }
}
