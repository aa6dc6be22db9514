use crate::config::Config;
use crate::opt::{Mode, Opt};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use minitar::ArchiveReader;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Runs the operation selected by `opt`.
pub fn execute(config: &Config, opt: &Opt) -> Result<()> {
    let mode = opt.mode();
    if mode != Mode::Create && !opt.files.is_empty() {
        bail!("File arguments are only accepted when creating an archive");
    }
    match mode {
        Mode::Create => command_create(config, &opt.archive, &opt.files),
        Mode::Extract => command_extract(config, &opt.archive, opt.directory.as_deref()),
        Mode::List => command_list(&opt.archive, opt.long),
    }
}

/// `minitar -c`
fn command_create(config: &Config, archive: &Path, files: &[String]) -> Result<()> {
    if files.is_empty() {
        bail!("No files were given to archive");
    }
    info!("Creating {}", archive.display());
    minitar::create_with(files, archive, &config.options())
        .with_context(|| format!("Could not create {}", archive.display()))?;
    info!("Archived {} files", files.len());
    Ok(())
}

/// Opens the archive at `archive` and reads its header.
fn open_archive(archive: &Path) -> Result<ArchiveReader<File>> {
    let file =
        File::open(archive).with_context(|| format!("Could not open {}", archive.display()))?;
    ArchiveReader::open(file).with_context(|| format!("Could not read {}", archive.display()))
}

/// `minitar -x`
fn command_extract(config: &Config, archive: &Path, dir: Option<&Path>) -> Result<()> {
    info!("Extracting {}", archive.display());
    let options = config.options();
    let context = || format!("Could not extract {}", archive.display());
    match dir {
        Some(dir) => {
            let reader = open_archive(archive)?;
            debug!("Extracting {} entries into {}", reader.header().len(), dir.display());
            fs::create_dir_all(dir)?;
            let mut buf = options.io_buffer();
            reader.extract_all_to(dir, &mut buf).with_context(context)?;
        }
        None => minitar::extract_with(archive, &options).with_context(context)?,
    }
    Ok(())
}

/// `minitar -t`
fn command_list(archive: &Path, long: bool) -> Result<()> {
    let reader = open_archive(archive)?;
    let header = reader.header();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for entry in header.entries() {
        if long {
            writeln!(out, "{:>10}  {}", entry.size(), entry.name())?;
        } else {
            writeln!(out, "{}", entry.name())?;
        }
    }
    if long {
        writeln!(out, "{:>10}  {} files", header.data_size(), header.len())?;
    }
    Ok(())
}
