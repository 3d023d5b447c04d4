use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;

/// A trait that reads byte buffers of a known length from any `Read` type.
pub trait BufferReadExt: Read {
    /// Reads exactly `length` bytes into a freshly allocated buffer.
    ///
    /// The buffer only grows as data arrives, so a corrupt length over a short
    /// stream fails with `UnexpectedEof` instead of allocating `length` bytes up front.
    fn read_buffer(&mut self, length: usize) -> io::Result<Vec<u8>>;
}

impl<T> BufferReadExt for T
where
    T: Read,
{
    fn read_buffer(&mut self, length: usize) -> io::Result<Vec<u8>> {
        let mut result: Vec<u8> = Vec::new();

        self.by_ref().take(length as u64).read_to_end(&mut result)?;
        if result.len() < length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {length} bytes, found {}", result.len()),
            ));
        }

        Ok(result)
    }
}

/// Utility methods for working with seekable streams.
pub trait SeekExt: Seek {
    /// Moves the cursor to an absolute position from the start of the stream.
    fn seek_to(&mut self, offset: u64) -> io::Result<u64>;

    /// Skips over the given number of bytes from the current position.
    fn skip<P: Copy + 'static>(&mut self, size: P) -> io::Result<u64>
    where
        u64: TryFrom<P>;
}

impl<T> SeekExt for T
where
    T: Seek,
{
    fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
        self.seek(SeekFrom::Start(offset))
    }

    fn skip<P: Copy + 'static>(&mut self, size: P) -> io::Result<u64>
    where
        u64: TryFrom<P>,
    {
        let size = u64::try_from(size).map_err(|_| io::Error::from(io::ErrorKind::InvalidData))?;
        let size = i64::try_from(size).map_err(|_| io::Error::from(io::ErrorKind::InvalidData))?;

        self.seek(SeekFrom::Current(size))
    }
}
