/*
 * Low-level filesystem probes used by the file tree: classifying the object a
 * path names, and resolving a path to its real (canonical, symlink-free) form.
 * They sit behind `FilesystemProbeOperations`, together with the factory for
 * directory enumerators, so tree construction can be exercised against the
 * real filesystem with individual probes replaced.
 */
use super::directory::{Directory, DirectoryOperations};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsObjectKind {
    File,
    Directory,
    Symlink,
    /*
     * Anything that is none of the above: FIFOs, sockets, devices, and paths
     * that vanished between enumeration and classification.
     */
    Other,
}

pub trait FilesystemProbeOperations {
    /*
     * Classifies the object at `path` without following a final symbolic
     * link, i.e. a link is reported as `Symlink` whatever it points to. A
     * non-link is `File` or `Directory` only for regular files and
     * directories.
     */
    fn classify(&self, path: &Path) -> FsObjectKind;

    /*
     * Resolves `path` to an absolute path with every symbolic link resolved.
     * The path must exist.
     */
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// An unopened enumerator for the directory at `path`.
    fn directory(&self, path: &Path) -> Box<dyn DirectoryOperations> {
        Box::new(Directory::new(path))
    }
}

pub struct CoreFilesystemProbe {}

impl CoreFilesystemProbe {
    pub fn new() -> Self {
        CoreFilesystemProbe {}
    }
}

impl Default for CoreFilesystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl FilesystemProbeOperations for CoreFilesystemProbe {
    fn classify(&self, path: &Path) -> FsObjectKind {
        match std::fs::symlink_metadata(path) {
            Ok(metadata) => {
                let file_type = metadata.file_type();
                if file_type.is_symlink() {
                    FsObjectKind::Symlink
                } else if file_type.is_dir() {
                    FsObjectKind::Directory
                } else if file_type.is_file() {
                    FsObjectKind::File
                } else {
                    FsObjectKind::Other
                }
            }
            Err(e) => {
                log::trace!("FilesystemProbe: Cannot stat {path:?}: {e}");
                FsObjectKind::Other
            }
        }
    }

    /*
     * `dunce` strips the `\\?\` verbatim prefix that `std::fs::canonicalize`
     * produces on Windows whenever the plain form is equivalent, so the tree is
     * keyed by the same drive-letter paths users type.
     */
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        dunce::canonicalize(path)
    }
}
