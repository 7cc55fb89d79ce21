//! Read-only memory mapping for loaded trie files.

#![cfg(feature = "mmap")]

use crate::error::Result;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// A whole file mapped read-only.
///
/// The mapping lives as long as the owning trie instance; loaded tries borrow
/// their sections straight out of it, so nothing is copied on load.
pub struct MappedFile {
    mmap: Mmap,
}

impl MappedFile {
    /// Map the file at `path` read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        // Safety: the mapping is private and read-only; mutation of the
        // underlying file by another process is outside the supported model.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap })
    }

    /// Total length of the mapping in bytes.
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// The mapped bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }
}

impl std::fmt::Debug for MappedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedFile").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_and_read() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"mapped contents").unwrap();
        tmp.flush().unwrap();

        let map = MappedFile::open(tmp.path()).unwrap();
        assert_eq!(map.len(), 15);
        assert_eq!(&map.as_slice()[..6], b"mapped");
    }
}
