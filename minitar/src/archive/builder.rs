use super::{transfer, ArchiveHeader, Error, HeaderEntry, Options, Result};
use crate::common::io::stream_len;
use crate::common::WriteStructExt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, trace};

/// Opens a file which is going into an archive.
fn open_source(path: &str) -> Result<File> {
    File::open(path).map_err(|e| Error::file(path, e))
}

/// Builds archive files out of files on disk.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBuilder {
    /// The paths of the files to put in the archive. Each path is also used as the entry name.
    paths: Vec<String>,
}

impl ArchiveBuilder {
    /// Constructs a new `ArchiveBuilder` with no files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the file at `path` to the end of the archive. The path is stored as-is.
    pub fn add(&mut self, path: impl Into<String>) -> &mut Self {
        self.paths.push(path.into());
        self
    }

    /// The number of files that have been added.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` if no files have been added.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Builds a header describing the files as they currently are. Each file is read to the end to
    /// measure it, using `buf` as the I/O buffer.
    pub fn build_header(&self, buf: &mut [u8]) -> Result<ArchiveHeader> {
        let mut entries = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            let mut file = open_source(path)?;
            let size = stream_len(&mut file, buf).map_err(|e| Error::file(path, e))?;
            trace!("Measured \"{}\": {} bytes", path, size);
            entries.push(HeaderEntry::new(path.clone(), size)?);
        }
        ArchiveHeader::new(entries)
    }

    /// Writes out an archive file and returns the header that was written. File data is copied
    /// through `buf`.
    ///
    /// A file which shrinks after it has been measured fails with `Error::ShortTransfer`. If it
    /// grows, only the measured number of bytes are stored.
    pub fn write_to(&self, writer: impl Write, buf: &mut [u8]) -> Result<ArchiveHeader> {
        let header = self.build_header(buf)?;
        write_archive(&header, writer, buf)?;
        Ok(header)
    }
}

/// Writes `header` followed by the data of each file it names.
fn write_archive(header: &ArchiveHeader, mut writer: impl Write, buf: &mut [u8]) -> Result<()> {
    debug!(
        "Writing archive with {} entries ({} header bytes, {} data bytes)",
        header.len(),
        header.encoded_len(),
        header.data_size()
    );

    let mut out = BufWriter::new(&mut writer);
    out.write_struct(header)?;
    for entry in header.entries() {
        trace!("Writing archive entry \"{}\" ({} bytes)", entry.name(), entry.size());
        let mut file = open_source(entry.name())?;
        transfer(&mut file, &mut out, entry, buf)?;
    }
    out.flush()?;
    Ok(())
}

/// Creates a temporary file in `dir` which ends up with the same permissions that
/// `File::create` would have given it.
fn create_temp(dir: &Path) -> io::Result<NamedTempFile> {
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        // The umask still applies, just like it does for `File::create`
        builder.permissions(Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Creates an archive at `archive_path` containing the files at `paths`, in order, using the
/// default `Options`.
pub fn create<P: AsRef<str>>(paths: &[P], archive_path: impl AsRef<Path>) -> Result<()> {
    create_with(paths, archive_path, &Options::default())
}

/// Creates an archive at `archive_path` containing the files at `paths`, in order.
///
/// With `options.atomic` set, the archive is written to a temporary file next to `archive_path`
/// which is only moved into place once it is complete. Otherwise a failure can leave a partial
/// archive behind.
pub fn create_with<P: AsRef<str>>(
    paths: &[P],
    archive_path: impl AsRef<Path>,
    options: &Options,
) -> Result<()> {
    let archive_path = archive_path.as_ref();
    let mut builder = ArchiveBuilder::new();
    for path in paths {
        builder.add(path.as_ref());
    }
    if builder.is_empty() {
        return Err(Error::NoFiles);
    }

    // Measure everything before touching the destination so a bad source leaves it alone
    let mut buf = options.io_buffer();
    let header = builder.build_header(&mut buf)?;
    if options.atomic {
        let dir = match archive_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut temp = create_temp(dir).map_err(|e| Error::file(dir, e))?;
        debug!("Writing new archive to {}", temp.path().display());
        write_archive(&header, temp.as_file_mut(), &mut buf)?;
        temp.persist(archive_path).map_err(|e| Error::file(archive_path, e.error))?;
    } else {
        let file = File::create(archive_path).map_err(|e| Error::file(archive_path, e))?;
        write_archive(&header, file, &mut buf)?;
    }

    debug!("Created {} with {} entries", archive_path.display(), header.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::io::BUFFER_SIZE;
    use std::fs;
    use tempfile::tempdir;

    fn path_string(path: &Path) -> String {
        path.to_str().unwrap().to_owned()
    }

    #[test]
    fn test_write_to() -> Result<()> {
        let dir = tempdir()?;
        let a = path_string(&dir.path().join("a.bin"));
        let b = path_string(&dir.path().join("b.bin"));
        fs::write(&a, [0u8, 1, 2, 0xff])?;
        fs::write(&b, b"")?;

        let mut buf = [0u8; 3];
        let mut bytes: Vec<u8> = vec![];
        let header =
            ArchiveBuilder::new().add(a.as_str()).add(b.as_str()).write_to(&mut bytes, &mut buf)?;
        assert_eq!(header.len(), 2);
        assert_eq!(header.entries()[0], HeaderEntry::new(a.as_str(), 4)?);
        assert_eq!(header.entries()[1], HeaderEntry::new(b.as_str(), 0)?);

        let mut expected: Vec<u8> = vec![];
        expected.write_struct(&header)?;
        expected.extend_from_slice(&[0, 1, 2, 0xff]);
        assert_eq!(bytes, expected);
        Ok(())
    }

    #[test]
    fn test_missing_source() -> Result<()> {
        let dir = tempdir()?;
        let missing = path_string(&dir.path().join("missing.txt"));
        let mut buf = [0u8; BUFFER_SIZE];
        let mut bytes: Vec<u8> = vec![];
        match ArchiveBuilder::new().add(missing.as_str()).write_to(&mut bytes, &mut buf) {
            Err(Error::File { path, .. }) => assert_eq!(path, Path::new(&missing)),
            other => panic!("unexpected result: {:?}", other),
        }
        // Nothing is written until every file has been measured
        assert!(bytes.is_empty());
        Ok(())
    }

    #[test]
    fn test_create_without_files() -> Result<()> {
        let dir = tempdir()?;
        let archive = dir.path().join("empty.tar");
        let paths: [&str; 0] = [];
        assert!(matches!(create(&paths, &archive), Err(Error::NoFiles)));
        assert!(!archive.exists());
        Ok(())
    }

    #[test]
    fn test_create_non_atomic() -> Result<()> {
        let dir = tempdir()?;
        let source = path_string(&dir.path().join("hello.txt"));
        fs::write(&source, "hello")?;
        let archive = dir.path().join("out.tar");
        let options = Options { atomic: false, ..Options::default() };
        create_with(&[source.as_str()], &archive, &options)?;

        let bytes = fs::read(&archive)?;
        let header_len = 4 + source.len() + 1 + 4;
        assert_eq!(bytes.len(), header_len + 5);
        assert_eq!(&bytes[header_len..], b"hello");
        Ok(())
    }

    #[test]
    fn test_create_non_atomic_keeps_archive_on_missing_source() -> Result<()> {
        let dir = tempdir()?;
        let missing = path_string(&dir.path().join("missing.txt"));
        let archive = dir.path().join("out.tar");
        fs::write(&archive, "previous archive")?;
        let options = Options { atomic: false, ..Options::default() };
        let result = create_with(&[missing.as_str()], &archive, &options);
        assert!(matches!(result, Err(Error::File { .. })));
        assert_eq!(fs::read(&archive)?, b"previous archive");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_create_permissions() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let source = path_string(&dir.path().join("hello.txt"));
        fs::write(&source, "hello")?;
        let mode = |path: &Path| -> Result<u32> {
            Ok(fs::metadata(path)?.permissions().mode() & 0o777)
        };

        let atomic = dir.path().join("atomic.tar");
        create_with(&[source.as_str()], &atomic, &Options::default())?;
        let plain = dir.path().join("plain.tar");
        let options = Options { atomic: false, ..Options::default() };
        create_with(&[source.as_str()], &plain, &options)?;

        assert_eq!(mode(&atomic)?, mode(&plain)?);
        Ok(())
    }
}
