use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "source_selector")]
#[command(version)]
#[command(about = "Selects the source files within a set of paths, each one once, following symbolic links safely")]
pub struct Cli {
    /// Files or directories to select from
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Comma-separated extensions to select, e.g. "h,c,cpp" (default: every file)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// What to do with the selected files
    #[arg(short, long, value_enum, default_value_t = Mode::List)]
    pub mode: Mode,

    /// In events mode, also leave the directories still open at the end
    #[arg(long)]
    pub balanced: bool,

    /// off, error, warn, info, debug or trace (default: configured level, else warn)
    #[arg(long)]
    pub log_level: Option<LevelFilter>,

    /// Read settings from this JSON file instead of the per-user one
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Store the effective filter and log level as the new defaults
    #[arg(long)]
    pub save_config: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Print each selected file
    List,
    /// Print the enter/file/leave events of the traversal
    Events,
    /// Print the SHA-256 checksum of each selected file
    Checksum,
}
