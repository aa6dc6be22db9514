use anyhow::Result;
use clap::Parser;
use log::error;
use minitar_cli::config::Config;
use minitar_cli::opt::{ConfigOpt, Opt};
use minitar_cli::{commands, terminal};
use std::process;

fn load_config(opt: &ConfigOpt) -> Config {
    if opt.no_config {
        return Config::default();
    }
    let result = match &opt.config {
        Some(path) => Config::load_from(path.clone()),
        None => Config::load(),
    };
    result.unwrap_or_else(|e| {
        error!("Failed to load the config file: {:#}", e);
        Config::default()
    })
}

fn run_app() -> Result<()> {
    let opt = Opt::parse();
    terminal::init_logging(opt.verbose)?;
    let config = load_config(&opt.config);
    commands::execute(&config, &opt)
}

fn main() {
    process::exit(match run_app() {
        Ok(_) => 0,
        Err(err) => {
            error!("Fatal: {:#}", err);
            1
        }
    });
}
