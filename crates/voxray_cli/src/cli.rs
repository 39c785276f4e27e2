use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Log levels selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "voxray")]
#[command(about = "Ray trace ellipsoids and CT volumes from a JSON scene")]
pub struct Args {
    /// Scene description (JSON)
    pub scene: PathBuf,

    /// Output PNG path
    #[arg(short, long, default_value = "output.png")]
    pub output: PathBuf,

    /// Image width in pixels, overrides the scene file
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels, overrides the scene file
    #[arg(long)]
    pub height: Option<u32>,

    /// Set the logging level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}
