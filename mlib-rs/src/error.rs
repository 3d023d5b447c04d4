/// Represents all possible errors that can occur while reading a library archive.
///
/// Header-level errors (`UnsupportedVersion`, `InvalidData` raised during
/// initialization, `Io`) leave the whole library unusable. Record-level errors
/// (`Decompression`, `RecordUnavailable`) only affect the record that raised them.
/// An index outside the archive is never an error; lookups return `None` instead.
#[derive(Debug)]
pub enum LibError {
    /// The archive declares a version older than the minimum supported one (2).
    UnsupportedVersion(i32),
    /// The header, index or frame table is truncated or holds a value that cannot
    /// be valid, or a grid layout is too large to address.
    InvalidData(String),
    /// The compressed payload of a record could not be inflated, or inflated to
    /// fewer bytes than its geometry requires.
    Decompression {
        /// Index of the record within the library.
        index: usize,
        /// The underlying gzip error.
        source: std::io::Error,
    },
    /// The record already failed to decode once and is left un-decoded.
    RecordUnavailable(usize),
    /// A record header decoded to a negative dimension, which means the stream
    /// cursor was not where the offset index said the record starts.
    InvalidGeometry {
        index: usize,
        width: i16,
        height: i16,
    },
    /// Represents an error that occurs during I/O operations.
    Io(std::io::Error),
}

pub type LibResult<T> = Result<T, LibError>;

impl LibError {
    /// Whether the error only affects a single record, leaving the library usable.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            LibError::Decompression { .. } | LibError::RecordUnavailable(_)
        )
    }
}

impl std::fmt::Display for LibError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibError::UnsupportedVersion(version) => {
                write!(f, "Unsupported library version {version}, expected 2 or later")
            }
            LibError::InvalidData(err) => write!(f, "Invalid data: {err}"),
            LibError::Decompression { index, source } => {
                write!(f, "Failed to decompress image {index}: {source}")
            }
            LibError::RecordUnavailable(index) => {
                write!(f, "Image {index} previously failed to decode")
            }
            LibError::InvalidGeometry {
                index,
                width,
                height,
            } => write!(f, "Invalid geometry for image {index}: {width}x{height}"),
            LibError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for LibError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LibError::Decompression { source, .. } => Some(source),
            LibError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Allows automatic conversion from `std::io::Error` to `LibError`.
impl From<std::io::Error> for LibError {
    fn from(error: std::io::Error) -> Self {
        LibError::Io(error)
    }
}
