use crate::{
    atlas::{Canvas, GridLayout},
    error::{LibError, LibResult},
    ext::io_ext::SeekExt,
    frame::{read_frame_table, Frame, FrameTable},
    image_record::{ImageGeometry, ImageRecord},
    library_header::LibraryHeader,
};
use log::{debug, warn};
use std::{
    fs::File,
    io::{self, BufReader, Read, Seek},
    path::{Path, PathBuf},
};

type Opener<R> = fn(&Path) -> io::Result<R>;

fn open_buffered(path: &Path) -> io::Result<BufReader<File>> {
    File::open(path).map(BufReader::new)
}

/// A single `.Lib` sprite archive.
///
/// A `Library` owns the only cursor into its backing stream. Every access is
/// an explicit seek to an absolute offset followed by a read, so operations
/// never depend on where a previous one left the cursor. The library is not
/// synchronized; callers sharing one across threads must wrap it in a lock.
///
/// Image records are read on first lookup and kept until the library is
/// dropped. Pixel payloads are only inflated by [`Library::ensure_decoded`].
///
/// ```rust,no_run
/// use mlib_rs::library::Library;
///
/// let mut library = Library::open("Data/ChrSel.Lib");
/// library.initialize().unwrap();
///
/// for index in 0..library.count() {
///     if library.ensure_decoded(index).unwrap() {
///         let image = library.image(index).unwrap();
///         println!("{index}: {}x{}", image.width(), image.height());
///     }
/// }
/// ```
pub struct Library<R = BufReader<File>> {
    /// Path of the archive, if the library is file backed.
    file_name: Option<PathBuf>,
    /// Opens the backing stream on initialization.
    opener: Option<Opener<R>>,
    /// The backing stream, present once an existing archive was initialized.
    reader: Option<R>,
    initialized: bool,
    header: Option<LibraryHeader>,
    /// Absolute offset of every image record, by record index.
    offsets: Vec<u32>,
    frames: FrameTable,
    /// Records read so far, one slot per record index.
    images: Vec<Option<ImageRecord>>,
}

impl<R> std::fmt::Debug for Library<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("file_name", &self.file_name)
            .field("initialized", &self.initialized)
            .field("header", &self.header)
            .field("count", &self.offsets.len())
            .field("frames", &self.frames.len())
            .finish()
    }
}

impl Library<BufReader<File>> {
    /// Binds a library to an archive path. Nothing is read until
    /// [`Library::initialize`] or the first lookup.
    pub fn open<P: AsRef<Path>>(file_name: P) -> Self {
        Library {
            file_name: Some(file_name.as_ref().to_path_buf()),
            opener: Some(open_buffered as Opener<BufReader<File>>),
            reader: None,
            initialized: false,
            header: None,
            offsets: Vec::new(),
            frames: FrameTable::new(),
            images: Vec::new(),
        }
    }
}

impl<R: Read + Seek> Library<R> {
    /// Parses a library from an already open stream.
    pub fn from_reader(mut reader: R) -> LibResult<Self> {
        let (header, offsets, frames) = Self::load(&mut reader)?;
        let mut library = Library {
            file_name: None,
            opener: None,
            reader: None,
            initialized: false,
            header: None,
            offsets: Vec::new(),
            frames: FrameTable::new(),
            images: Vec::new(),
        };
        library.install(reader, header, offsets, frames);
        Ok(library)
    }

    /// Reads the header, the offset index and the frame table.
    ///
    /// A missing archive file is not an error: the library stays empty. Any
    /// other failure leaves the library uninitialized, and the stream is
    /// closed again before returning.
    pub fn initialize(&mut self) -> LibResult<()> {
        if self.initialized {
            return Ok(());
        }
        let (Some(file_name), Some(opener)) = (self.file_name.as_deref(), self.opener) else {
            return Err(LibError::InvalidData(
                "Library has no archive to initialize from".to_string(),
            ));
        };

        let mut reader = match opener(file_name) {
            Ok(reader) => reader,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist, using an empty library", file_name.display());
                self.initialized = true;
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let (header, offsets, frames) = Self::load(&mut reader)?;
        debug!(
            "{} version is {}, {} images, {} frames",
            file_name.display(),
            header.version,
            header.record_count,
            frames.len()
        );
        self.install(reader, header, offsets, frames);
        Ok(())
    }

    /// Reads every header section. Running out of data anywhere in them means
    /// the archive is malformed, so a short read is reported as `InvalidData`.
    fn load(reader: &mut R) -> LibResult<(LibraryHeader, Vec<u32>, FrameTable)> {
        Self::read_sections(reader).map_err(|err| match err {
            LibError::Io(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                LibError::InvalidData(format!("Truncated library header: {err}"))
            }
            err => err,
        })
    }

    fn read_sections(reader: &mut R) -> LibResult<(LibraryHeader, Vec<u32>, FrameTable)> {
        reader.seek_to(0)?;
        let header = LibraryHeader::read(reader)?;
        let offsets = header.read_offsets(reader)?;

        let frames = match header.frame_table_offset {
            Some(frame_table_offset) => {
                let resume = reader.stream_position()?;
                reader.seek_to(frame_table_offset as u64)?;
                let frames = read_frame_table(reader)?;
                reader.seek_to(resume)?;
                frames
            }
            None => FrameTable::new(),
        };

        Ok((header, offsets, frames))
    }

    fn install(&mut self, reader: R, header: LibraryHeader, offsets: Vec<u32>, frames: FrameTable) {
        self.images = (0..offsets.len()).map(|_| None).collect();
        self.offsets = offsets;
        self.frames = frames;
        self.header = Some(header);
        self.reader = Some(reader);
        self.initialized = true;
    }

    /// Looks up an image record, reading its header on first access.
    ///
    /// Returns `Ok(None)` for an index outside the library. The pixel payload
    /// is not touched; see [`Library::ensure_decoded`].
    pub fn get(&mut self, index: usize) -> LibResult<Option<&ImageRecord>> {
        self.initialize()?;
        if index >= self.images.len() {
            return Ok(None);
        }

        if self.images[index].is_none() {
            let reader = self.reader.as_mut().ok_or_else(|| {
                LibError::InvalidData("Library stream is not open".to_string())
            })?;
            reader.seek_to(self.offsets[index] as u64)?;
            let record = ImageRecord::read_header(reader, index)?;
            self.images[index] = Some(record);
        }
        Ok(self.images[index].as_ref())
    }

    /// Makes sure the pixel buffer of a record (and its mask, if any) is resident.
    ///
    /// Returns `Ok(false)` for an index outside the library or a record without
    /// pixels. The payload is inflated at most once; a record that failed to
    /// decode keeps failing with [`LibError::RecordUnavailable`].
    pub fn ensure_decoded(&mut self, index: usize) -> LibResult<bool> {
        match self.get(index)? {
            None => return Ok(false),
            Some(record) if record.geometry().is_empty() => return Ok(false),
            Some(record) if record.is_decoded() => return Ok(true),
            Some(_) => {}
        }

        let (Some(reader), Some(record)) = (self.reader.as_mut(), self.images[index].as_mut())
        else {
            return Ok(false);
        };
        reader.seek_to(self.offsets[index] as u64 + ImageGeometry::SIZE)?;
        record.decode_pixels(reader)?;
        Ok(true)
    }

    /// Returns a record that has already been looked up, without any I/O.
    pub fn image(&self, index: usize) -> Option<&ImageRecord> {
        self.images.get(index).and_then(Option::as_ref)
    }

    /// Decodes a record and copies it onto `canvas` with its top-left corner at `(x, y)`.
    ///
    /// Returns `Ok(false)` when the record has no pixels.
    pub fn place(&mut self, canvas: &mut Canvas, x: i32, y: i32, index: usize) -> LibResult<bool> {
        if !self.ensure_decoded(index)? {
            return Ok(false);
        }
        Ok(self
            .image(index)
            .is_some_and(|record| canvas.place(x, y, record)))
    }

    /// Decodes a record into a canvas of exactly its size.
    pub fn to_canvas(&mut self, index: usize) -> LibResult<Option<Canvas>> {
        if !self.ensure_decoded(index)? {
            return Ok(None);
        }
        Ok(self.image(index).and_then(Canvas::from_record))
    }

    /// Places every record of the library on a grid.
    ///
    /// Records that fail to decode are logged and left blank; any other error
    /// aborts the whole atlas.
    pub fn build_atlas(&mut self, layout: &GridLayout) -> LibResult<Canvas> {
        self.initialize()?;
        let count = self.count();
        let mut canvas = layout.canvas_for(count)?;

        for index in 0..count {
            let (x, y) = layout.position(index).ok_or_else(|| {
                LibError::InvalidData(format!("Image {index} falls outside the atlas"))
            })?;
            match self.place(&mut canvas, x, y, index) {
                Ok(_) => {}
                Err(err) if err.is_record_level() => {
                    warn!("skipping image {index} of {}: {err}", self.display_name());
                }
                Err(err) => return Err(err),
            }
        }
        Ok(canvas)
    }

    /// Number of image records, zero until initialized or for a missing archive.
    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The archive header, absent for a missing archive.
    pub fn header(&self) -> Option<&LibraryHeader> {
        self.header.as_ref()
    }

    pub fn version(&self) -> Option<i32> {
        self.header.map(|header| header.version)
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    /// Absolute offset of every image record.
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// The animation frame table, empty before version 3.
    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    pub fn frame(&self, frame_type: u8) -> Option<&Frame> {
        self.frames.get(&frame_type)
    }

    fn display_name(&self) -> String {
        self.file_name
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<stream>".to_string())
    }
}
