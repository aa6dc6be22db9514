use super::{transfer, ArchiveHeader, Error, HeaderEntry, Options, Result};
use crate::common::ReadStructExt;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tracing::{debug, trace, warn};

/// A stream for reading archives.
///
/// The header is decoded up front. Entry data can only be read once, in header order, so the
/// unpacking methods consume the reader.
pub struct ArchiveReader<R: Read> {
    reader: BufReader<R>,
    header: ArchiveHeader,
}

impl<R: Read> ArchiveReader<R> {
    /// Constructs a new `ArchiveReader` which reads the header from `reader` and leaves it
    /// positioned at the start of the data section. `ArchiveReader` does its own buffering, so
    /// `reader` should not be buffered.
    pub fn open(reader: R) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        let header: ArchiveHeader = reader.read_struct()?;
        debug!("Read archive header with {} entries", header.len());
        Ok(Self { reader, header })
    }

    /// The archive's header.
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Copies each entry's data, in order, into the writer that `open` returns for it. Data is
    /// copied through `buf`. Stops at the first entry which fails.
    pub fn unpack_with<W, F>(mut self, buf: &mut [u8], mut open: F) -> Result<()>
    where
        W: Write,
        F: FnMut(&HeaderEntry) -> Result<W>,
    {
        for entry in self.header.entries() {
            let mut writer = open(entry)?;
            transfer(&mut self.reader, &mut writer, entry, buf)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Extracts every entry into a file named by joining the entry name onto `dir`. Existing files
    /// are overwritten. Data is copied through `buf`.
    ///
    /// If an entry cannot be fully extracted, its output file is deleted and extraction stops.
    /// Entries which were already extracted are kept.
    pub fn extract_all_to(mut self, dir: impl AsRef<Path>, buf: &mut [u8]) -> Result<()> {
        let dir = dir.as_ref();
        for entry in self.header.entries() {
            let path = dir.join(entry.name());
            trace!("Extracting \"{}\" ({} bytes)", entry.name(), entry.size());
            let mut file = File::create(&path).map_err(|e| Error::file(&path, e))?;
            let result = transfer(&mut self.reader, &mut file, entry, buf)
                .and_then(|()| file.flush().map_err(Error::from));
            if let Err(e) = result {
                drop(file);
                if let Err(remove_err) = fs::remove_file(&path) {
                    warn!("Could not remove {}: {}", path.display(), remove_err);
                }
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Extracts every file in the archive at `archive_path` using the default `Options`. Each file is
/// written to the path stored in the archive.
pub fn extract(archive_path: impl AsRef<Path>) -> Result<()> {
    extract_with(archive_path, &Options::default())
}

/// Extracts every file in the archive at `archive_path`. Each file is written to the path stored
/// in the archive, relative to the current directory.
///
/// Nothing is written if the header cannot be read.
pub fn extract_with(archive_path: impl AsRef<Path>, options: &Options) -> Result<()> {
    let archive_path = archive_path.as_ref();
    let file = File::open(archive_path).map_err(|e| Error::file(archive_path, e))?;
    let archive = ArchiveReader::open(file)?;
    let count = archive.header().len();
    let mut buf = options.io_buffer();
    archive.extract_all_to("", &mut buf)?;
    debug!("Extracted {} entries from {}", count, archive_path.display());
    Ok(())
}
