use clap::{ArgAction, ArgGroup, Args, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "minitar", version)]
#[command(about = "Packs files into a single archive and restores them")]
#[command(group(ArgGroup::new("mode").required(true).args(["create", "extract", "list"])))]
pub struct Opt {
    /// Enables debug logging
    ///
    /// Use -vv to enable trace logging
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub config: ConfigOpt,

    /// Creates a new archive from FILEs
    #[arg(short = 'c', long)]
    pub create: bool,

    /// Extracts every file in the archive
    #[arg(short = 'x', long)]
    pub extract: bool,

    /// Lists the files in the archive
    #[arg(short = 't', long)]
    pub list: bool,

    /// Path to the archive
    #[arg(short = 'f', long = "file", value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Extracts into DIR instead of the current directory
    #[arg(short = 'C', long, value_name = "DIR", requires = "extract")]
    pub directory: Option<PathBuf>,

    /// Lists file sizes along with names
    #[arg(short, long, requires = "list")]
    pub long: bool,

    /// Files to put in the archive. Each path is stored exactly as written.
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ConfigOpt {
    /// Path to the config file to use. If it does not exist, it will be created.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Do not load or create a config file and use default settings instead.
    #[arg(long, conflicts_with = "config")]
    pub no_config: bool,
}

/// The operation selected on the command line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    Create,
    Extract,
    List,
}

impl Opt {
    /// Returns the selected operation. clap guarantees that exactly one is set.
    pub fn mode(&self) -> Mode {
        if self.create {
            Mode::Create
        } else if self.extract {
            Mode::Extract
        } else {
            Mode::List
        }
    }
}
