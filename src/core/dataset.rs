/*
 * The dataset: the input files selected for processing, held in a `FileTree`
 * together with the `Selector` that decided which files qualify. The
 * `Driver` walks a dataset and hands each file to a downstream processor,
 * keeping the tallies the run summary reports.
 */
use super::file_tree::{FileTree, Result, SelectionFilter};
use super::processors::FileProcessorOperations;
use super::traverser::TraversalHandler;
use std::path::Path;

/*
 * Selects files by the extension of the leaf name: the text after its final
 * `.`. A leaf without a `.` has no extension and is never selected, while a
 * leaf that starts with its only `.` (e.g. `.bashrc`) has the rest as its
 * extension. Matching is exact and case-sensitive. With no extensions
 * configured every file is selected.
 *
 * List items are trimmed and empty items are dropped, so `"h,"` means just
 * `h` and a leaf ending in a bare `.` (e.g. `foo.`) is never selected.
 */
#[derive(Debug, Clone, Default)]
pub struct Selector {
    extensions: Vec<String>,
    accepted: usize,
}

impl Selector {
    /// `extensions` is a comma-separated list such as `"h,c,cpp"`.
    pub fn new(extensions: &str) -> Self {
        let extensions: Vec<String> = extensions
            .split(',')
            .map(str::trim)
            .filter(|ext| !ext.is_empty())
            .map(String::from)
            .collect();
        log::debug!("Selector: Selecting extensions {extensions:?}");
        Selector {
            extensions,
            accepted: 0,
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// The number of files this selector has accepted.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    fn matches(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let Some(leaf) = path.file_name() else {
            return false;
        };
        let leaf = leaf.to_string_lossy();
        match leaf.rsplit_once('.') {
            Some((_, ext)) => self.extensions.iter().any(|wanted| wanted == ext),
            None => false,
        }
    }
}

impl SelectionFilter for Selector {
    fn select(&mut self, path: &Path) -> bool {
        if !self.matches(path) {
            return false;
        }
        self.accepted += 1;
        log::info!("To do ({}) {:?}", self.accepted, path);
        true
    }
}

/*
 * Feeds every file of a traversal to a processor. A processor failure on one
 * file abandons that file only; the walk carries on.
 */
pub struct Driver<P: FileProcessorOperations> {
    processor: P,
    done_files: usize,
    error_files: usize,
}

impl<P: FileProcessorOperations> Driver<P> {
    pub fn new(processor: P) -> Self {
        Driver {
            processor,
            done_files: 0,
            error_files: 0,
        }
    }

    /// The number of files reached.
    pub fn done_files(&self) -> usize {
        self.done_files
    }

    /// The number of files abandoned due to errors.
    pub fn error_files(&self) -> usize {
        self.error_files
    }

    pub fn into_processor(self) -> P {
        self.processor
    }
}

impl<P: FileProcessorOperations> TraversalHandler for Driver<P> {
    fn at_file(&mut self, path: &Path) {
        self.done_files += 1;
        log::info!("Processing file ({}) {:?}", self.done_files, path);
        if let Err(e) = self.processor.process(path) {
            self.error_files += 1;
            log::warn!("Driver: Abandoned {path:?}: {e}");
        }
    }
}

pub struct Dataset {
    tree: FileTree,
    selector: Selector,
}

impl Dataset {
    pub fn new(selector: Selector) -> Self {
        Dataset {
            tree: FileTree::new(),
            selector,
        }
    }

    /// Adds the files `selector` accepts within `path`; see `FileTree::add`.
    pub fn add(&mut self, path: &Path) -> Result<usize> {
        self.tree.add(path, &mut self.selector)
    }

    pub fn traverse<H: TraversalHandler + ?Sized>(&self, handler: &mut H) {
        self.tree.traverse(handler);
    }

    /// The number of files in the dataset.
    pub fn files(&self) -> usize {
        self.tree.files()
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}
