use byteorder::ReadBytesExt;
use std::cmp;
use std::io::{self, ErrorKind, Read, Write};

/// The default size of the buffer used to move file data around.
pub const BUFFER_SIZE: usize = 0x8000;

/// Implementation of `std::io::copy` which uses `buf` as the buffer. This can be much faster than
/// the built-in implementation.
pub fn copy_buffered(
    reader: &mut (impl Read + ?Sized),
    writer: &mut (impl Write + ?Sized),
    buf: &mut [u8],
) -> io::Result<u64> {
    let mut total = 0;
    loop {
        let num_read = match reader.read(buf) {
            Ok(0) => return Ok(total),
            Ok(len) => len,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..num_read])?;
        total += num_read as u64;
    }
}

/// Copies exactly `len` bytes from `reader` to `writer` using `buf` as the buffer, so at most
/// `buf.len()` bytes are held in memory at a time.
///
/// If `reader` runs out of data first, this fails with `ErrorKind::UnexpectedEof` after writing
/// whatever was read. A writer which stops accepting data fails with `ErrorKind::WriteZero`.
pub fn copy_exact(
    reader: &mut (impl Read + ?Sized),
    writer: &mut (impl Write + ?Sized),
    len: u64,
    buf: &mut [u8],
) -> io::Result<()> {
    if buf.is_empty() && len > 0 {
        return Err(io::Error::new(ErrorKind::InvalidInput, "copy buffer is empty"));
    }
    let mut remaining = len;
    while remaining != 0 {
        let chunk_len = cmp::min(buf.len() as u64, remaining) as usize;
        let num_read = match reader.read(&mut buf[..chunk_len]) {
            Ok(0) => {
                let msg = format!("stream ended {} bytes short of {}", remaining, len);
                return Err(io::Error::new(ErrorKind::UnexpectedEof, msg));
            }
            Ok(n) => n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..num_read])?;
        remaining -= num_read as u64;
    }
    Ok(())
}

/// Measures how many bytes can be read from `reader` before it ends. The stream is consumed.
pub fn stream_len(reader: &mut (impl Read + ?Sized), buf: &mut [u8]) -> io::Result<u64> {
    copy_buffered(reader, &mut io::sink(), buf)
}

/// Reads bytes from `reader` up to the next null byte. The null byte is consumed but is not part
/// of the returned bytes. Fails with `ErrorKind::UnexpectedEof` if the stream ends first.
pub fn read_until_nul(reader: &mut (impl Read + ?Sized)) -> io::Result<Vec<u8>> {
    let mut bytes: Vec<u8> = vec![];
    loop {
        let b = reader.read_u8()?;
        if b == 0 {
            return Ok(bytes);
        }
        bytes.push(b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Seek, SeekFrom};

    /// A reader which hands out one byte per call and is interrupted before every read.
    struct Trickle<R: Read> {
        inner: R,
        interrupt: bool,
    }

    impl<R: Read> Read for Trickle<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(ErrorKind::Interrupted.into());
            }
            let len = cmp::min(buf.len(), 1);
            self.inner.read(&mut buf[..len])
        }
    }

    fn make_bytes(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7) as u8).collect()
    }

    #[test]
    fn test_copy_buffered() -> io::Result<()> {
        let bytes = make_bytes(0x100000);
        let mut writer = Cursor::new(Vec::with_capacity(bytes.len()));
        let mut reader = Cursor::new(bytes);
        let mut buf = [0u8; BUFFER_SIZE];
        assert_eq!(copy_buffered(&mut reader, &mut writer, &mut buf)?, 0x100000);
        assert_eq!(reader.into_inner(), writer.into_inner());
        Ok(())
    }

    #[test]
    fn test_copy_exact() -> io::Result<()> {
        let bytes = make_bytes(100);
        let mut reader = Cursor::new(&bytes);
        let mut writer: Vec<u8> = vec![];
        let mut buf = [0u8; 16];
        copy_exact(&mut reader, &mut writer, 40, &mut buf)?;
        assert_eq!(writer, &bytes[..40]);
        assert_eq!(reader.position(), 40);

        // The next copy continues where the last one stopped
        writer.clear();
        copy_exact(&mut reader, &mut writer, 60, &mut buf)?;
        assert_eq!(writer, &bytes[40..]);
        Ok(())
    }

    #[test]
    fn test_copy_exact_zero_len() -> io::Result<()> {
        let mut reader = Cursor::new([1u8, 2, 3]);
        let mut writer: Vec<u8> = vec![];
        copy_exact(&mut reader, &mut writer, 0, &mut [0u8; 0])?;
        assert!(writer.is_empty());
        assert_eq!(reader.position(), 0);
        Ok(())
    }

    #[test]
    fn test_copy_exact_short_read() {
        let mut reader = Cursor::new([1u8, 2, 3]);
        let mut writer: Vec<u8> = vec![];
        let mut buf = [0u8; 8];
        let err = copy_exact(&mut reader, &mut writer, 10, &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        assert_eq!(writer, &[1, 2, 3]);
    }

    #[test]
    fn test_copy_exact_short_write() {
        let mut reader = Cursor::new(make_bytes(16));
        let mut out = [0u8; 4];
        let mut writer = &mut out[..];
        let mut buf = [0u8; 8];
        let err = copy_exact(&mut reader, &mut writer, 16, &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteZero);
    }

    #[test]
    fn test_copy_exact_retries_interrupted() -> io::Result<()> {
        let bytes = make_bytes(10);
        let mut reader = Trickle { inner: Cursor::new(&bytes), interrupt: false };
        let mut writer: Vec<u8> = vec![];
        let mut buf = [0u8; 4];
        copy_exact(&mut reader, &mut writer, 10, &mut buf)?;
        assert_eq!(writer, bytes);
        Ok(())
    }

    #[test]
    fn test_copy_exact_empty_buffer() {
        let mut reader = Cursor::new([1u8]);
        let mut writer: Vec<u8> = vec![];
        let err = copy_exact(&mut reader, &mut writer, 1, &mut [0u8; 0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_stream_len() -> io::Result<()> {
        let mut buf = [0u8; 16];
        let mut cursor = Cursor::new(make_bytes(1000));
        assert_eq!(stream_len(&mut cursor, &mut buf)?, 1000);
        cursor.seek(SeekFrom::Start(998))?;
        assert_eq!(stream_len(&mut cursor, &mut buf)?, 2);
        assert_eq!(stream_len(&mut io::empty(), &mut buf)?, 0);
        Ok(())
    }

    #[test]
    fn test_read_until_nul() -> io::Result<()> {
        let mut cursor = Cursor::new(b"abc\0\0de\0".to_vec());
        assert_eq!(read_until_nul(&mut cursor)?, b"abc");
        assert_eq!(cursor.position(), 4);
        assert_eq!(read_until_nul(&mut cursor)?, b"");
        assert_eq!(read_until_nul(&mut cursor)?, b"de");
        assert_eq!(read_until_nul(&mut cursor).unwrap_err().kind(), ErrorKind::UnexpectedEof);
        Ok(())
    }

    #[test]
    fn test_read_until_nul_unterminated() {
        let mut cursor = Cursor::new(b"abc".to_vec());
        assert_eq!(read_until_nul(&mut cursor).unwrap_err().kind(), ErrorKind::UnexpectedEof);
    }
}
