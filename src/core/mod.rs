/*
 * The platform-agnostic core: path cursors, filesystem probes and directory
 * enumeration at the bottom; the deduplicating file tree and its traverser
 * above them; and the dataset, processors and configuration the command line
 * front end drives.
 */
pub mod checksum_utils;
pub mod config;
pub mod dataset;
pub mod directory;
pub mod file_tree;
pub mod fs_probe;
pub mod path_cursor;
pub mod path_utils;
pub mod processors;
pub mod traverser;

pub use config::{
    ConfigManagerOperations, CoreConfigManager, SelectionConfig, load_config_file,
    save_config_file,
};
pub use dataset::{Dataset, Driver, Selector};
pub use processors::{ChecksumProcessor, FileProcessorOperations, ListingProcessor};
pub use traverser::TreeEvent;
