use anyhow::Result;
use log::Level;
use simplelog::{Color, ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use time::macros::format_description;

/// Picks the log level for a `-v` count.
fn level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initializes logging to the terminal.
pub fn init_logging(verbosity: u8) -> Result<()> {
    let config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Trace)
        .set_time_format_custom(format_description!(
            "[hour]:[minute]:[second].[subsecond digits:3]"
        ))
        .set_level_color(Level::Info, Some(Color::Green))
        .build();
    let filter = level_filter(verbosity);
    TermLogger::init(filter, config, TerminalMode::Stderr, ColorChoice::Auto)?;
    Ok(())
}
