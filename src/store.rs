use std::io::{self, Read};

use crate::errors::{SearchError, SearchResult};

/// One file inside an [`Archive`]: a path plus the location of its bytes in
/// the archive's backing buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcFile {
    /// The file's path within the archive, using `/` separators.
    pub name: String,
    off: usize,
    len: usize,
}

/// An in-memory bundle of files, typically decoded from a zip fetched for
/// the repository revision under search. All file contents live in one
/// contiguous buffer; [`SrcFile`] entries index into it.
///
/// The archive is read-only once built and may be shared freely across
/// scanner workers.
#[derive(Debug, Default)]
pub struct Archive {
    files: Vec<SrcFile>,
    data: Vec<u8>,
    max_file_len: usize,
}

impl Archive {
    /// The files in the archive, in insertion order.
    pub fn files(&self) -> &[SrcFile] {
        &self.files
    }

    /// The contents of `file`.
    pub fn data_for(&self, file: &SrcFile) -> &[u8] {
        &self.data[file.off..file.off + file.len]
    }

    /// Length in bytes of the largest file. Used to size scratch buffers
    /// once per worker instead of once per file.
    pub fn max_file_len(&self) -> usize {
        self.max_file_len
    }

    /// Number of files in the archive.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Builds an [`Archive`] from decoded file entries.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    files: Vec<SrcFile>,
    data: Vec<u8>,
    max_file_len: usize,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a file with the given contents.
    pub fn add(&mut self, name: impl Into<String>, contents: &[u8]) -> &mut Self {
        let off = self.data.len();
        self.data.extend_from_slice(contents);
        self.max_file_len = self.max_file_len.max(contents.len());
        self.files.push(SrcFile {
            name: name.into(),
            off,
            len: contents.len(),
        });
        self
    }

    /// Appends a file by draining `reader`, whose uncompressed size is
    /// known to be exactly `len` bytes. A reader that yields more than
    /// `len` bytes fails with [`SearchError::ReaderTooLarge`] and leaves
    /// the builder unchanged.
    pub fn add_from_reader<R: Read>(
        &mut self,
        name: impl Into<String>,
        reader: &mut R,
        len: usize,
    ) -> SearchResult<&mut Self> {
        let mut buf = vec![0u8; len];
        let n = read_all(reader, &mut buf)?;
        buf.truncate(n);
        Ok(self.add(name, &buf))
    }

    pub fn build(self) -> Archive {
        Archive {
            files: self.files,
            data: self.data,
            max_file_len: self.max_file_len,
        }
    }
}

/// Reads `reader` until EOF into `buf`, returning the number of bytes
/// read. If the reader still has data once `buf` is full, returns
/// [`SearchError::ReaderTooLarge`].
pub fn read_all<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> SearchResult<usize> {
    let mut n = 0;
    loop {
        if n == buf.len() {
            // The buffer is full but the reader may be exactly at EOF and
            // not have reported it yet. Probe with a one-byte read.
            let mut probe = [0u8; 1];
            return match reader.read(&mut probe) {
                Ok(0) => Ok(n),
                Ok(_) => Err(SearchError::ReaderTooLarge),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => Err(e.into()),
            };
        }
        match reader.read(&mut buf[n..]) {
            Ok(0) => return Ok(n),
            Ok(m) => n += m,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::fs::File;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn test_builder_tracks_offsets_and_max_len() {
        let mut b = ArchiveBuilder::new();
        b.add("a.txt", b"hello");
        b.add("b.txt", b"a longer file\n");
        b.add("empty", b"");
        let archive = b.build();

        assert_eq!(archive.len(), 3);
        assert_eq!(archive.max_file_len(), 14);
        assert_eq!(archive.data_for(&archive.files()[0]), b"hello");
        assert_eq!(archive.data_for(&archive.files()[1]), b"a longer file\n");
        assert_eq!(archive.data_for(&archive.files()[2]), b"");
    }

    #[test]
    fn test_read_all_exact_fit() {
        let mut buf = [0u8; 5];
        let n = read_all(&mut Cursor::new(b"hello"), &mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn test_read_all_short_read() {
        let mut buf = [0u8; 10];
        let n = read_all(&mut Cursor::new(b"hi"), &mut buf).unwrap();
        assert_eq!(n, 2);
        assert_eq!(&buf[..n], b"hi");
    }

    #[test]
    fn test_read_all_too_large() {
        let mut buf = [0u8; 4];
        let err = read_all(&mut Cursor::new(b"hello"), &mut buf).unwrap_err();
        assert!(matches!(err, SearchError::ReaderTooLarge));
    }

    #[test]
    fn test_add_from_reader_with_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entry.txt");
        fs::write(&path, b"archive entry contents").unwrap();

        let mut b = ArchiveBuilder::new();
        let mut f = File::open(&path).unwrap();
        b.add_from_reader("entry.txt", &mut f, 22).unwrap();
        let archive = b.build();

        assert_eq!(
            archive.data_for(&archive.files()[0]),
            b"archive entry contents"
        );
    }

    #[test]
    fn test_add_from_reader_oversized_entry() {
        let mut b = ArchiveBuilder::new();
        let err = b
            .add_from_reader("bad", &mut Cursor::new(b"0123456789"), 4)
            .unwrap_err();
        assert!(matches!(err, SearchError::ReaderTooLarge));
        assert_eq!(b.build().len(), 0);
    }
}
