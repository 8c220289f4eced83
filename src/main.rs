mod beep;
mod display;
mod emulator;
mod input;
mod settings;

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

/// The terminal belongs to the UI, so logs only go to stderr when asked for
/// through `RUST_LOG`. With a log file the default level is debug.
fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            builder
                .filter_level(LevelFilter::Debug)
                .parse_default_env()
                .target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(LevelFilter::Off).parse_default_env();
        }
    }
    builder.init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let settings = settings::Settings::parse();
    init_logging(settings.log_file.as_deref())?;

    let mut emulator = emulator::Emulator::new(settings);
    emulator.run()
}
