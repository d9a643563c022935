/*
 * Unix directory enumeration over opendir/readdir/closedir, through `nix`.
 * `nix` clears errno before each readdir, so a failed read is reported as an
 * error item rather than being mistaken for the end of the directory.
 */
use super::{DirectoryOperations, is_dot_name};
use nix::dir::{Dir, OwningIter};
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

pub struct Directory {
    abs_path: PathBuf,
    last_error: i32,
    entries: Option<OwningIter>,
}

impl Directory {
    pub fn new(path: &Path) -> Self {
        Directory {
            abs_path: path.to_path_buf(),
            last_error: 0,
            entries: None,
        }
    }
}

impl DirectoryOperations for Directory {
    fn path(&self) -> &Path {
        &self.abs_path
    }

    fn open(&mut self) -> bool {
        if self.entries.is_some() {
            return true;
        }
        let flags = OFlag::O_RDONLY | OFlag::O_DIRECTORY | OFlag::O_CLOEXEC;
        match Dir::open(self.abs_path.as_path(), flags, Mode::empty()) {
            Ok(dir) => {
                self.entries = Some(dir.into_iter());
                true
            }
            Err(errno) => {
                log::trace!("Directory: opendir {:?} failed: {errno}", self.abs_path);
                self.last_error = errno as i32;
                false
            }
        }
    }

    // closedir errors are swallowed by `nix` when the stream is dropped.
    fn close(&mut self) -> bool {
        self.entries = None;
        true
    }

    fn next_entry(&mut self) -> OsString {
        let Some(entries) = self.entries.as_mut() else {
            return OsString::new();
        };
        for item in entries.by_ref() {
            match item {
                Ok(entry) => {
                    let name = OsStr::from_bytes(entry.file_name().to_bytes());
                    if !is_dot_name(name) {
                        return name.to_os_string();
                    }
                }
                Err(errno) => {
                    log::trace!("Directory: readdir {:?} failed: {errno}", self.abs_path);
                    self.last_error = errno as i32;
                    break;
                }
            }
        }
        OsString::new()
    }

    fn last_error(&self) -> i32 {
        self.last_error
    }

    fn clear_error(&mut self) {
        self.last_error = 0;
    }
}

impl Drop for Directory {
    fn drop(&mut self) {
        self.close();
    }
}
