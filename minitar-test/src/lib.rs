use anyhow::Result;
use log::debug;
use simplelog::{Color, ColorChoice, ConfigBuilder, Level, LevelFilter, TermLogger, TerminalMode};
use std::env;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use time::macros::format_description;

static INIT_LOGGING: Once = Once::new();

/// Configures logging at the beginning of a test.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let config = ConfigBuilder::new()
            .set_time_format_custom(format_description!(
                "[hour]:[minute]:[second].[subsecond digits:3]"
            ))
            .set_level_color(Level::Info, Some(Color::Green))
            .build();
        TermLogger::init(LevelFilter::Trace, config, TerminalMode::Stderr, ColorChoice::Auto)
            .unwrap();
    });
}

/// Compares the contents of two streams for equality.
pub fn compare_streams(mut a: impl Read, mut b: impl Read) -> Result<bool> {
    let mut a_buf = [0u8; 0x8000];
    let mut b_buf = [0u8; 0x8000];
    loop {
        let a_len = read_fully(&mut a, &mut a_buf)?;
        let b_len = read_fully(&mut b, &mut b_buf)?;
        if a_len != b_len {
            return Ok(false);
        }
        if a_len == 0 {
            return Ok(true);
        }
        if a_buf[..a_len] != b_buf[..a_len] {
            return Ok(false);
        }
    }
}

/// Reads until `buf` is full or the stream ends, so that short reads do not look like mismatches.
fn read_fully(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..])? {
            0 => break,
            len => total += len,
        }
    }
    Ok(total)
}

/// Compares the contents of a file with `expected`.
pub fn file_matches(path: impl AsRef<Path>, expected: &[u8]) -> Result<bool> {
    compare_streams(File::open(path)?, expected)
}

/// Writes each `(name, contents)` pair into `dir` and returns the full paths as strings.
pub fn write_files(dir: &Path, files: &[(&str, &[u8])]) -> Result<Vec<String>> {
    let mut paths = vec![];
    for &(name, contents) in files {
        let path = dir.join(name);
        fs::write(&path, contents)?;
        paths.push(path.to_string_lossy().into_owned());
    }
    Ok(paths)
}

/// Switches the process's working directory to a new temporary directory for as long as the
/// guard is alive. Tests using this must be `#[serial]`.
pub struct WorkingDir {
    dir: TempDir,
    previous: PathBuf,
}

impl WorkingDir {
    /// Creates a temporary directory and makes it the working directory.
    pub fn enter() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let previous = env::current_dir()?;
        env::set_current_dir(dir.path())?;
        debug!("Working directory is now {}", dir.path().display());
        Ok(Self { dir, previous })
    }

    /// The temporary directory's path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for WorkingDir {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.previous);
    }
}
