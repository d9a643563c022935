mod cli;
mod core;

use crate::cli::{Cli, Mode};
use crate::core::{
    ChecksumProcessor, ConfigManagerOperations, CoreConfigManager, Dataset, Driver,
    FileProcessorOperations, ListingProcessor, SelectionConfig, Selector, TreeEvent,
    load_config_file, save_config_file,
};
use clap::Parser;
use log::LevelFilter;
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

const APP_NAME: &str = "source_selector";

// Exit statuses.
const EXIT_OK: u8 = 0;
const EXIT_ERRORS: u8 = 1;
const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let stored = match &cli.config {
        Some(file_path) => load_config_file(file_path).map(Some),
        None => CoreConfigManager::new().load_config(APP_NAME),
    };
    let effective = effective_config(&cli, stored.as_ref().ok().and_then(Option::as_ref));
    let level = effective_log_level(&effective);
    if let Err(e) = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Err(e) = &stored {
        if cli.config.is_some() {
            log::error!("Main: {e}");
            return ExitCode::from(EXIT_ERRORS);
        }
        log::warn!("Main: Ignoring stored configuration: {e}");
    }
    log::debug!("Main: Effective configuration {effective:?}");

    if cli.save_config {
        let saved = match &cli.config {
            Some(file_path) => save_config_file(file_path, &effective),
            None => CoreConfigManager::new().save_config(APP_NAME, &effective),
        };
        if let Err(e) = saved {
            log::error!("Main: Failed to save configuration: {e}");
            return ExitCode::from(EXIT_ERRORS);
        }
    }

    ExitCode::from(run(&cli, &effective))
}

/*
 * Command-line options override the stored settings. A missing or unreadable
 * stored config falls back to selecting every file.
 */
fn effective_config(cli: &Cli, stored: Option<&SelectionConfig>) -> SelectionConfig {
    let mut config = stored.cloned().unwrap_or_default();
    if let Some(filter) = &cli.filter {
        config.extensions = filter.clone();
    }
    if let Some(level) = cli.log_level {
        config.log_level = Some(level.to_string().to_lowercase());
    }
    config
}

fn effective_log_level(config: &SelectionConfig) -> LevelFilter {
    config
        .log_level
        .as_deref()
        .and_then(|text| text.parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

fn run(cli: &Cli, config: &SelectionConfig) -> u8 {
    let mut dataset = Dataset::new(Selector::new(&config.extensions));
    let mut unresolved = 0;
    for path in &cli.paths {
        match dataset.add(path) {
            Ok(added) => log::debug!("Main: {added} file(s) selected from {path:?}"),
            Err(e) if e.is_fatal() => {
                log::error!("{e}");
                return EXIT_FATAL;
            }
            Err(e) => {
                log::error!("{e}");
                unresolved += 1;
            }
        }
    }

    let stdout = BufWriter::new(io::stdout().lock());
    let (done_files, error_files) = match cli.mode {
        Mode::List => drive(&dataset, ListingProcessor::new(stdout), ListingProcessor::into_inner),
        Mode::Checksum => drive(
            &dataset,
            ChecksumProcessor::new(stdout),
            ChecksumProcessor::into_inner,
        ),
        Mode::Events => match write_events(&dataset, cli.balanced, stdout) {
            Ok(files) => (files, 0),
            Err(e) => {
                log::error!("Main: Failed to write events: {e}");
                (0, dataset.files())
            }
        },
    };

    for line in summary(&dataset, done_files, error_files) {
        log::info!("{line}");
    }

    if unresolved > 0 || error_files > 0 {
        EXIT_ERRORS
    } else {
        EXIT_OK
    }
}

fn summary(dataset: &Dataset, done_files: usize, error_files: usize) -> [String; 3] {
    let selector = dataset.selector();
    let infiles = dataset.files();
    [
        format!(
            "{} files were accepted by the filter {:?}",
            selector.accepted(),
            selector.extensions()
        ),
        format!(
            "{done_files} out of {infiles} input files were reached; {} files were not reached",
            infiles.saturating_sub(done_files)
        ),
        format!(
            "{} out of {done_files} files reached were valid; {error_files} were abandoned due to errors",
            done_files.saturating_sub(error_files)
        ),
    ]
}

fn drive<P, W, F>(dataset: &Dataset, processor: P, into_inner: F) -> (usize, usize)
where
    P: FileProcessorOperations,
    W: Write,
    F: FnOnce(P) -> W,
{
    let mut driver = Driver::new(processor);
    dataset.traverse(&mut driver);
    let (done_files, mut error_files) = (driver.done_files(), driver.error_files());
    if let Err(e) = into_inner(driver.into_processor()).flush() {
        log::error!("Main: Failed to flush output: {e}");
        error_files = done_files;
    }
    (done_files, error_files)
}

// Writes one `enter`, `file` or `leave` line per event; returns the file count.
fn write_events<W: Write>(dataset: &Dataset, balanced: bool, mut out: W) -> io::Result<usize> {
    let events = dataset.tree().events();
    let events: Box<dyn Iterator<Item = TreeEvent> + '_> = if balanced {
        Box::new(events.balanced())
    } else {
        Box::new(events)
    };
    let mut files = 0;
    for event in events {
        let tag = match &event {
            TreeEvent::EnterDirectory(_) => "enter",
            TreeEvent::AtFile(_) => {
                files += 1;
                "file"
            }
            TreeEvent::LeaveDirectory(_) => "leave",
        };
        writeln!(out, "{tag} {}", event.path().display())?;
    }
    out.flush()?;
    Ok(files)
}
