//! Reading and writing archives.
//!
//! An archive is laid out as follows. All integers are little-endian two's-complement 32-bit
//! values, and there is no padding anywhere.
//!
//! ```text
//! [count: i32]
//! count times:
//!     [name: bytes, then a single 0x00 terminator]
//!     [size: i32]
//! count times, in the same order:
//!     [size bytes of file data]
//! ```

mod builder;
mod reader;

pub use builder::{create, create_with, ArchiveBuilder};
pub use reader::{extract, extract_with, ArchiveReader};

use crate::common::io::{copy_exact, read_until_nul, BUFFER_SIZE};
use crate::common::{ReadFrom, WriteTo};
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::cmp;
use std::io::{self, ErrorKind, Read, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::trace;

/// The byte which ends an entry name.
const NAME_TERMINATOR: u8 = 0;

/// The largest entry count or entry size which fits in a header field.
pub const MAX_FIELD_VALUE: u32 = i32::MAX as u32;

/// The smallest I/O buffer size that `Options` will hand out.
const MIN_BUFFER_SIZE: usize = 0x200;

/// The result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for archive operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("no files were given to archive")]
    NoFiles,

    #[error("archive header is truncated")]
    Truncated,

    #[error("archive has a negative entry count: {0}")]
    NegativeCount(i32),

    #[error("too many archive entries: {0}")]
    TooManyEntries(usize),

    #[error("archive entry has an empty name")]
    EmptyName,

    #[error("archive entry name is not null-terminated")]
    UnterminatedName,

    #[error("archive entry name is not valid UTF-8: {0:?}")]
    NonUtf8Name(String),

    #[error("entry name contains a null byte: {0:?}")]
    NulInName(String),

    #[error("entry \"{name}\" has a negative size: {size}")]
    NegativeSize { name: String, size: i32 },

    #[error("\"{name}\" is too large to archive ({size} bytes)")]
    FileTooLarge { name: String, size: u64 },

    #[error("entry \"{name}\" is missing data (expected {expected} bytes)")]
    ShortTransfer { name: String, expected: u32 },

    #[error("could not access {path:?}")]
    File {
        path: PathBuf,
        #[source]
        source: Box<io::Error>,
    },

    #[error(transparent)]
    Io(Box<io::Error>),
}

from_error_boxed!(Error::Io, io::Error);

impl Error {
    /// Wraps an I/O error which occurred while opening or reading `path`.
    fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File { path: path.into(), source: Box::new(source) }
    }
}

/// Maps an end-of-stream error inside the header to `Error::Truncated`.
fn header_error(err: io::Error) -> Error {
    if err.kind() == ErrorKind::UnexpectedEof {
        Error::Truncated
    } else {
        err.into()
    }
}

/// Options which control how archives are created and extracted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Options {
    /// Write new archives to a temporary file and only move it into place once it is complete.
    pub atomic: bool,
    /// Size of the buffer used to move file data.
    pub buffer_size: usize,
}

impl Options {
    /// Allocates an I/O buffer of the configured size.
    pub fn io_buffer(&self) -> Box<[u8]> {
        vec![0u8; cmp::max(self.buffer_size, MIN_BUFFER_SIZE)].into_boxed_slice()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self { atomic: true, buffer_size: BUFFER_SIZE }
    }
}

/// Metadata for one file stored in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    name: String,
    size: u32,
}

impl HeaderEntry {
    /// Constructs a new `HeaderEntry`. `name` must be non-empty and must not contain a null byte,
    /// and `size` must fit in a header field.
    pub fn new(name: impl Into<String>, size: u64) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        if name.as_bytes().contains(&NAME_TERMINATOR) {
            return Err(Error::NulInName(name));
        }
        match u32::try_from(size) {
            Ok(size) if size <= MAX_FIELD_VALUE => Ok(Self { name, size }),
            _ => Err(Error::FileTooLarge { name, size }),
        }
    }

    /// The entry's name, which is also the path it extracts to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of bytes the entry occupies in the data section.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The number of bytes this entry occupies in the header.
    fn encoded_len(&self) -> u64 {
        self.name.len() as u64 + 1 + 4
    }
}

impl<R: Read + ?Sized> ReadFrom<R> for HeaderEntry {
    type Error = Error;
    fn read_from(reader: &mut R) -> Result<Self> {
        let bytes = read_until_nul(reader).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => Error::UnterminatedName,
            _ => e.into(),
        })?;
        if bytes.is_empty() {
            return Err(Error::EmptyName);
        }
        let name = match String::from_utf8(bytes) {
            Ok(name) => name,
            Err(e) => {
                return Err(Error::NonUtf8Name(String::from_utf8_lossy(e.as_bytes()).into_owned()))
            }
        };
        let size = reader.read_i32::<LE>().map_err(header_error)?;
        match u32::try_from(size) {
            Ok(size) => Ok(Self { name, size }),
            Err(_) => Err(Error::NegativeSize { name, size }),
        }
    }
}

impl<W: Write + ?Sized> WriteTo<W> for HeaderEntry {
    type Error = Error;
    fn write_to(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.name.as_bytes())?;
        writer.write_u8(NAME_TERMINATOR)?;
        // `size` never exceeds i32::MAX, so its encoding matches the signed field
        writer.write_u32::<LE>(self.size)?;
        Ok(())
    }
}

/// The header at the start of an archive, listing every entry in data order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveHeader {
    entries: Vec<HeaderEntry>,
}

impl ArchiveHeader {
    /// Constructs a new `ArchiveHeader` from `entries`.
    pub fn new(entries: Vec<HeaderEntry>) -> Result<Self> {
        if entries.len() as u64 > u64::from(MAX_FIELD_VALUE) {
            return Err(Error::TooManyEntries(entries.len()));
        }
        Ok(Self { entries })
    }

    /// The archive's entries in order.
    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }

    /// The number of entries in the archive.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The total size of the data section that should follow the header.
    pub fn data_size(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.size)).sum()
    }

    /// The number of bytes the header occupies when it is written out.
    pub fn encoded_len(&self) -> u64 {
        4 + self.entries.iter().map(HeaderEntry::encoded_len).sum::<u64>()
    }
}

impl<R: Read + ?Sized> ReadFrom<R> for ArchiveHeader {
    type Error = Error;
    fn read_from(reader: &mut R) -> Result<Self> {
        let count = reader.read_i32::<LE>().map_err(header_error)?;
        let count = usize::try_from(count).map_err(|_| Error::NegativeCount(count))?;
        trace!("Reading {} header entries", count);
        let mut entries = Vec::new();
        entries.try_reserve_exact(count).map_err(|_| Error::TooManyEntries(count))?;
        for _ in 0..count {
            entries.push(HeaderEntry::read_from(reader)?);
        }
        Ok(Self { entries })
    }
}

impl<W: Write + ?Sized> WriteTo<W> for ArchiveHeader {
    type Error = Error;
    fn write_to(&self, writer: &mut W) -> Result<()> {
        let count =
            u32::try_from(self.entries.len()).map_err(|_| Error::TooManyEntries(self.len()))?;
        writer.write_u32::<LE>(count)?;
        HeaderEntry::write_all_to(writer, &self.entries)?;
        Ok(())
    }
}

/// Copies the data for `entry` from `reader` to `writer`. Running out of data is reported as
/// `Error::ShortTransfer`.
fn transfer(
    reader: &mut (impl Read + ?Sized),
    writer: &mut (impl Write + ?Sized),
    entry: &HeaderEntry,
    buf: &mut [u8],
) -> Result<()> {
    match copy_exact(reader, writer, entry.size.into(), buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            Err(Error::ShortTransfer { name: entry.name.clone(), expected: entry.size })
        }
        Err(e) => Err(e.into()),
    }
}
