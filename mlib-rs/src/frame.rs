use crate::error::{LibError, LibResult};
use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::HashMap;
use std::io::Read;

/// Animation frames of a library, keyed by frame type.
///
/// Frame types are not contiguous, so the table is a map rather than a list.
pub type FrameTable = HashMap<u8, Frame>;

/// Animation timing for one frame type.
///
/// On disk a frame is 34 bytes: eight little-endian `i32` fields followed by
/// the `reverse` and `blend` flags as one byte each. Inside a frame table each
/// frame is prefixed by its one-byte frame type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// First image index of the primary cycle.
    pub start: i32,
    /// Number of images in the primary cycle.
    pub count: i32,
    /// Images skipped between two consecutive directions.
    pub skip: i32,
    /// Delay between two images, in milliseconds.
    pub interval: i32,
    pub effect_start: i32,
    pub effect_count: i32,
    pub effect_skip: i32,
    pub effect_interval: i32,
    /// Play the cycle backwards.
    pub reverse: bool,
    /// Draw the effect cycle with additive blending.
    pub blend: bool,
}

impl Frame {
    /// Size of a frame on disk, without its frame type prefix.
    pub const SIZE: usize = 34;

    /// Creates a frame from its primary and effect cycles.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        start: i32,
        count: i32,
        skip: i32,
        interval: i32,
        effect_start: i32,
        effect_count: i32,
        effect_skip: i32,
        effect_interval: i32,
    ) -> Self {
        Frame {
            start,
            count,
            skip,
            interval,
            effect_start,
            effect_count,
            effect_skip,
            effect_interval,
            reverse: false,
            blend: false,
        }
    }

    /// Reads a frame from the current position of `reader`.
    pub fn read<R: Read>(reader: &mut R) -> LibResult<Self> {
        Ok(Frame {
            start: reader.read_i32::<LittleEndian>()?,
            count: reader.read_i32::<LittleEndian>()?,
            skip: reader.read_i32::<LittleEndian>()?,
            interval: reader.read_i32::<LittleEndian>()?,
            effect_start: reader.read_i32::<LittleEndian>()?,
            effect_count: reader.read_i32::<LittleEndian>()?,
            effect_skip: reader.read_i32::<LittleEndian>()?,
            effect_interval: reader.read_i32::<LittleEndian>()?,
            reverse: reader.read_u8()? != 0,
            blend: reader.read_u8()? != 0,
        })
    }

    /// Stride between the first images of two consecutive directions.
    pub fn offset(&self) -> i32 {
        self.count + self.skip
    }

    /// Stride of the effect cycle.
    pub fn effect_offset(&self) -> i32 {
        self.effect_count + self.effect_skip
    }
}

/// Reads one `(frame type, frame)` entry of a frame table.
pub(crate) fn read_frame_entry<R: Read>(reader: &mut R) -> LibResult<(u8, Frame)> {
    let frame_type = reader.read_u8()?;
    let frame = Frame::read(reader)?;
    Ok((frame_type, frame))
}

/// Reads a complete frame table: an `i32` count followed by that many entries.
///
/// A later entry with the same frame type replaces an earlier one.
pub(crate) fn read_frame_table<R: Read>(reader: &mut R) -> LibResult<FrameTable> {
    let frame_count = reader.read_i32::<LittleEndian>()?;
    let frame_count = u32::try_from(frame_count)
        .map_err(|_| LibError::InvalidData(format!("Negative frame count {frame_count}")))?;

    let mut frames = FrameTable::new();
    for _ in 0..frame_count {
        let (frame_type, frame) = read_frame_entry(reader)?;
        frames.insert(frame_type, frame);
    }
    Ok(frames)
}
