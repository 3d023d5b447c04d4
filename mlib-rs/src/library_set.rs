use crate::{
    error::{LibError, LibResult},
    library::Library,
};
use glob::{glob, Pattern};
use log::{debug, warn};
use std::{collections::BTreeMap, path::Path};

/// File name suffix of library archives. Matching is case sensitive.
pub const LIBRARY_EXTENSION: &str = "Lib";

/// The numbered libraries found in one data directory, e.g. `Mon1.Lib`, `Mon2.Lib`.
///
/// Libraries are bound but not initialized; each reads its archive on first use.
#[derive(Debug, Default)]
pub struct LibrarySet {
    libraries: BTreeMap<u32, Library>,
}

impl LibrarySet {
    /// Finds every `*.Lib` file directly inside `directory`, keyed by the first
    /// number in its file name.
    ///
    /// Files without a number are skipped. When two files share a number the
    /// one sorting last wins. A missing directory gives an empty set.
    pub fn discover<P: AsRef<Path>>(directory: P) -> LibResult<Self> {
        let directory = directory.as_ref();
        let escaped = Pattern::escape(&directory.display().to_string());
        let pattern = format!("{escaped}/*.{LIBRARY_EXTENSION}");

        let mut libraries = BTreeMap::new();
        let entries = glob(&pattern)
            .map_err(|e| LibError::InvalidData(format!("Invalid library pattern: {e}")))?;
        for entry in entries {
            let path = entry.map_err(|e| LibError::Io(e.into_error()))?;
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                warn!("skipping library with a non UTF-8 name: {}", path.display());
                continue;
            };
            let Some(key) = library_key(name) else {
                warn!("file name invalid: {name}");
                continue;
            };
            if let Some(previous) = libraries.insert(key, Library::open(&path)) {
                warn!(
                    "library {key} found twice, {} replaces {}",
                    path.display(),
                    previous
                        .file_name()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                );
            }
            debug!("found library {key}: {name}");
        }

        Ok(LibrarySet { libraries })
    }

    pub fn get(&self, key: u32) -> Option<&Library> {
        self.libraries.get(&key)
    }

    pub fn get_mut(&mut self, key: u32) -> Option<&mut Library> {
        self.libraries.get_mut(&key)
    }

    /// Library keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.libraries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Library)> {
        self.libraries.iter().map(|(key, library)| (*key, library))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut Library)> {
        self.libraries
            .iter_mut()
            .map(|(key, library)| (*key, library))
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }
}

/// Extracts the first run of decimal digits in `file_name`.
pub fn library_key(file_name: &str) -> Option<u32> {
    let start = file_name.find(|c: char| c.is_ascii_digit())?;
    let digits = &file_name[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}
