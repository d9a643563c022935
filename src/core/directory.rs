/*
 * OS-neutral directory enumeration contract. A `Directory` is opened on an
 * absolute path, yields the leaf names of its entries one at a time, and keeps
 * the last system error code so callers can tell "exhausted" from "failed".
 * The housekeeping entries `.` and `..` are never surfaced.
 *
 * Exactly one implementation is compiled in, selected by target OS.
 */
use std::ffi::OsStr;
use std::io;
use std::path::Path;

#[cfg(unix)]
#[path = "directory_nix.rs"]
mod platform;

#[cfg(windows)]
#[path = "directory_win.rs"]
mod platform;

pub use platform::Directory;

pub trait DirectoryOperations {
    /// The absolute path the directory was constructed with.
    fn path(&self) -> &Path;

    /// Opens the directory for reading. Returns false and records the system
    /// error code on failure. Opening an open directory is a no-op.
    fn open(&mut self) -> bool;

    /// Releases the OS handle, if any. Returns false and records the system
    /// error code if the OS reports a failure.
    fn close(&mut self) -> bool;

    /*
     * Moves to the next entry and returns its leaf name. An empty name means
     * "no more entries"; whether that is the end of the directory or a read
     * failure is told by `good()` afterwards.
     */
    fn next_entry(&mut self) -> std::ffi::OsString;

    fn last_error(&self) -> i32;

    fn clear_error(&mut self);

    fn good(&self) -> bool {
        self.last_error() == 0
    }

    /// The last error as an `io::Error`, which renders the platform's text.
    fn io_error(&self) -> io::Error {
        io::Error::from_raw_os_error(self.last_error())
    }
}

pub(super) fn is_dot_name(leafname: &OsStr) -> bool {
    leafname == "." || leafname == ".."
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::ffi::OsString;
    use std::fs;
    use tempfile::tempdir;

    fn drain(dir: &mut Directory) -> BTreeSet<OsString> {
        let mut names = BTreeSet::new();
        loop {
            let entry = dir.next_entry();
            if entry.is_empty() {
                break;
            }
            names.insert(entry);
        }
        names
    }

    #[test]
    fn test_enumerates_entries_without_dot_names() -> io::Result<()> {
        let temp = tempdir()?;
        fs::write(temp.path().join("a.c"), "")?;
        fs::write(temp.path().join(".hidden"), "")?;
        fs::create_dir(temp.path().join("sub"))?;

        let mut dir = Directory::new(temp.path());
        assert!(dir.open(), "open failed: {}", dir.io_error());
        let names = drain(&mut dir);
        assert!(dir.good());
        assert!(dir.close());

        let expected: BTreeSet<OsString> = ["a.c", ".hidden", "sub"]
            .iter()
            .map(OsString::from)
            .collect();
        assert_eq!(names, expected);
        Ok(())
    }

    #[test]
    fn test_empty_directory_is_exhausted_immediately() -> io::Result<()> {
        let temp = tempdir()?;
        let mut dir = Directory::new(temp.path());
        assert!(dir.open());
        assert!(dir.next_entry().is_empty());
        assert!(dir.good());
        Ok(())
    }

    #[test]
    fn test_open_missing_directory_records_error() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("not_there");
        let mut dir = Directory::new(&missing);

        assert!(!dir.open());
        assert!(!dir.good());
        assert_eq!(dir.io_error().kind(), io::ErrorKind::NotFound);
        assert!(dir.next_entry().is_empty());

        dir.clear_error();
        assert!(dir.good());
        assert_eq!(dir.path(), missing.as_path());
    }

    #[test]
    fn test_is_dot_name() {
        assert!(is_dot_name(OsStr::new(".")));
        assert!(is_dot_name(OsStr::new("..")));
        assert!(!is_dot_name(OsStr::new("...")));
        assert!(!is_dot_name(OsStr::new(".git")));
    }
}
