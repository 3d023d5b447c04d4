use crate::error::{LibError, LibResult};
use crate::ext::io_ext::{BufferReadExt, SeekExt};
use crate::shadow_flags::ShadowFlags;
use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::MultiGzDecoder;
use log::{trace, warn};
use std::io::{self, Read, Seek};

/// Bytes per decoded pixel (B, G, R, A).
pub const BYTES_PER_PIXEL: usize = 4;

/// The fixed header at the start of every image record.
///
///   Offset | Length | Name     | Description
///   ------:| ------:|:--------:| ------------------------------------------
///        0 |      2 | width    | Width in pixels.
///        2 |      2 | height   | Height in pixels.
///        4 |      2 | x        | Horizontal draw offset.
///        6 |      2 | y        | Vertical draw offset.
///        8 |      2 | shadow_x | Horizontal shadow draw offset.
///       10 |      2 | shadow_y | Vertical shadow draw offset.
///       12 |      1 | shadow   | Shadow flags, the high bit marks a mask layer.
///       13 |      4 | length   | Length of the gzip compressed pixel payload.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImageGeometry {
    pub width: i16,
    pub height: i16,
    pub x: i16,
    pub y: i16,
    pub shadow_x: i16,
    pub shadow_y: i16,
    pub shadow: ShadowFlags,
    pub length: u32,
}

impl ImageGeometry {
    /// Size of the header on disk.
    pub const SIZE: u64 = 17;

    pub(crate) fn read<R: Read>(reader: &mut R) -> LibResult<Self> {
        Ok(ImageGeometry {
            width: reader.read_i16::<LittleEndian>()?,
            height: reader.read_i16::<LittleEndian>()?,
            x: reader.read_i16::<LittleEndian>()?,
            y: reader.read_i16::<LittleEndian>()?,
            shadow_x: reader.read_i16::<LittleEndian>()?,
            shadow_y: reader.read_i16::<LittleEndian>()?,
            shadow: ShadowFlags::from_bits_retain(reader.read_u8()?),
            length: reader.read_u32::<LittleEndian>()?,
        })
    }

    /// Whether the record has no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// The header of the mask layer that follows the primary payload of a masked record.
///
/// It is 12 bytes on disk: four `i16` fields then the `u32` payload length.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MaskHeader {
    pub width: i16,
    pub height: i16,
    pub x: i16,
    pub y: i16,
    pub length: u32,
}

impl MaskHeader {
    /// Size of the mask header on disk.
    pub const SIZE: u64 = 12;

    pub(crate) fn read<R: Read>(reader: &mut R) -> LibResult<Self> {
        Ok(MaskHeader {
            width: reader.read_i16::<LittleEndian>()?,
            height: reader.read_i16::<LittleEndian>()?,
            x: reader.read_i16::<LittleEndian>()?,
            y: reader.read_i16::<LittleEndian>()?,
            length: reader.read_u32::<LittleEndian>()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Pending,
    Decoded,
    Failed,
}

/// A single sprite of a library.
///
/// The header is read when the record is first looked up; the pixel payload is
/// only inflated once something asks for it.
#[derive(Debug)]
pub struct ImageRecord {
    index: usize,
    geometry: ImageGeometry,
    mask: Option<MaskHeader>,
    pixels: Option<Vec<u8>>,
    mask_pixels: Option<Vec<u8>>,
    state: DecodeState,
}

impl ImageRecord {
    /// Reads the record header at the current position of `reader`.
    ///
    /// For masked records the cursor is moved past the primary payload to read
    /// the mask header, so the cursor position afterwards is unspecified.
    pub(crate) fn read_header<R: Read + Seek>(reader: &mut R, index: usize) -> LibResult<Self> {
        let geometry = ImageGeometry::read(reader)?;
        if geometry.width < 0 || geometry.height < 0 {
            return Err(LibError::InvalidGeometry {
                index,
                width: geometry.width,
                height: geometry.height,
            });
        }

        let mask = if geometry.shadow.has_mask() {
            reader.skip(geometry.length)?;
            Some(MaskHeader::read(reader)?)
        } else {
            None
        };

        trace!(
            "image {index}: {}x{} at ({}, {}), mask: {}",
            geometry.width,
            geometry.height,
            geometry.x,
            geometry.y,
            mask.is_some()
        );

        Ok(ImageRecord {
            index,
            geometry,
            mask,
            pixels: None,
            mask_pixels: None,
            state: DecodeState::Pending,
        })
    }

    /// Inflates the pixel payload, and the mask payload if present.
    ///
    /// `reader` must be positioned right after the record header. The record
    /// only becomes decoded once every layer has been inflated; any failure
    /// leaves it permanently un-decoded.
    pub(crate) fn decode_pixels<R: Read + Seek>(&mut self, reader: &mut R) -> LibResult<()> {
        match self.state {
            DecodeState::Decoded => return Ok(()),
            DecodeState::Failed => return Err(LibError::RecordUnavailable(self.index)),
            DecodeState::Pending => {}
        }

        match self.inflate_layers(reader) {
            Ok((pixels, mask_pixels)) => {
                self.pixels = Some(pixels);
                self.mask_pixels = mask_pixels;
                self.state = DecodeState::Decoded;
                Ok(())
            }
            Err(err) => {
                self.state = DecodeState::Failed;
                Err(err)
            }
        }
    }

    fn inflate_layers<R: Read + Seek>(
        &self,
        reader: &mut R,
    ) -> LibResult<(Vec<u8>, Option<Vec<u8>>)> {
        let compressed = self.read_payload(reader, self.geometry.length)?;
        let pixels = inflate(&compressed, self.index)?;

        let required = self.pixel_len();
        if pixels.len() < required {
            return Err(LibError::Decompression {
                index: self.index,
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("decoded {} bytes, expected {required}", pixels.len()),
                ),
            });
        }
        if pixels.len() > required {
            warn!(
                "image {} decoded to {} bytes, {} more than its geometry needs",
                self.index,
                pixels.len(),
                pixels.len() - required
            );
        }

        let mask_pixels = match self.mask {
            Some(mask) => {
                reader.skip(MaskHeader::SIZE)?;
                let compressed = self.read_payload(reader, mask.length)?;
                Some(inflate(&compressed, self.index)?)
            }
            None => None,
        };

        trace!(
            "image {}: inflated {} bytes of pixels",
            self.index,
            pixels.len()
        );
        Ok((pixels, mask_pixels))
    }

    /// Reads a compressed payload; a short read counts as a truncated gzip stream.
    fn read_payload<R: Read>(&self, reader: &mut R, length: u32) -> LibResult<Vec<u8>> {
        reader
            .read_buffer(length as usize)
            .map_err(|source| LibError::Decompression {
                index: self.index,
                source,
            })
    }

    /// Number of bytes a fully decoded pixel buffer covers.
    pub fn pixel_len(&self) -> usize {
        if self.geometry.is_empty() {
            return 0;
        }
        self.geometry.width as usize * self.geometry.height as usize * BYTES_PER_PIXEL
    }

    /// Index of the record within its library.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn geometry(&self) -> &ImageGeometry {
        &self.geometry
    }

    pub fn width(&self) -> i16 {
        self.geometry.width
    }

    pub fn height(&self) -> i16 {
        self.geometry.height
    }

    /// Whether the record carries a mask layer.
    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    /// The mask header, if the record carries a mask layer.
    pub fn mask(&self) -> Option<&MaskHeader> {
        self.mask.as_ref()
    }

    /// Whether the pixel buffer (and mask buffer, if any) is resident.
    pub fn is_decoded(&self) -> bool {
        self.state == DecodeState::Decoded
    }

    /// Whether a previous decode attempt failed.
    pub fn is_failed(&self) -> bool {
        self.state == DecodeState::Failed
    }

    /// The decoded BGRA pixels, row-major from the top row down.
    pub fn pixels(&self) -> Option<&[u8]> {
        self.pixels.as_deref()
    }

    /// The decoded mask pixels.
    pub fn mask_pixels(&self) -> Option<&[u8]> {
        self.mask_pixels.as_deref()
    }
}

/// Inflates a gzip stream held in memory. Concatenated gzip members are
/// inflated back to back into one buffer.
fn inflate(compressed: &[u8], index: usize) -> LibResult<Vec<u8>> {
    if compressed.is_empty() {
        return Ok(Vec::new());
    }
    let mut decoder = MultiGzDecoder::new(compressed);
    let mut data = Vec::new();
    decoder
        .read_to_end(&mut data)
        .map_err(|source| LibError::Decompression { index, source })?;
    Ok(data)
}
