/*
 * A path held as an ordered sequence of elements with a movable read position.
 * The file tree descends one element at a time, so it needs a path it can
 * extend, shorten and read at a cursor without re-parsing strings. Elements
 * are `OsString`s, which keeps non-UTF-8 file names intact on Unix.
 *
 * The first element of an absolute path carries the root: `/` on Unix, and the
 * prefix plus root (e.g. `C:\`) on Windows.
 */
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathCursor {
    elements: Vec<OsString>,
    posn: usize,
}

impl PathCursor {
    /*
     * Splits a path into elements. `.` components are dropped; `..` is kept
     * verbatim, since the paths handed to the tree are already canonical and
     * never contain it. The cursor starts at the first element.
     */
    pub fn from_path(path: &Path) -> Self {
        let mut elements: Vec<OsString> = Vec::new();
        let mut pending_prefix: Option<OsString> = None;
        for component in path.components() {
            match component {
                Component::Prefix(prefix) => {
                    pending_prefix = Some(prefix.as_os_str().to_os_string());
                }
                Component::RootDir => {
                    let mut root = pending_prefix.take().unwrap_or_default();
                    root.push(component.as_os_str());
                    elements.push(root);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::Normal(_) => {
                    if let Some(prefix) = pending_prefix.take() {
                        elements.push(prefix);
                    }
                    elements.push(component.as_os_str().to_os_string());
                }
            }
        }
        if let Some(prefix) = pending_prefix {
            elements.push(prefix);
        }
        PathCursor { elements, posn: 0 }
    }

    pub fn elements(&self) -> usize {
        self.elements.len()
    }

    pub fn posn(&self) -> usize {
        self.posn
    }

    /// Positions past the last element are clamped to "fully consumed".
    pub fn set_posn(&mut self, posn: usize) {
        self.posn = posn.min(self.elements.len());
    }

    pub fn advance(&mut self) {
        self.set_posn(self.posn + 1);
    }

    pub fn is_consumed(&self) -> bool {
        self.posn >= self.elements.len()
    }

    pub fn element(&self, which: usize) -> Option<&OsStr> {
        self.elements.get(which).map(OsString::as_os_str)
    }

    pub fn cur_element(&self) -> Option<&OsStr> {
        self.element(self.posn)
    }

    pub fn push_back(&mut self, element: impl Into<OsString>) {
        self.elements.push(element.into());
    }

    pub fn pop_back(&mut self) -> Option<OsString> {
        let popped = self.elements.pop();
        if self.posn > self.elements.len() {
            self.posn = self.elements.len();
        }
        popped
    }

    /*
     * Sets the cursor to index the final element, or to 0 if the path is
     * empty. After a `push_back` this makes the appended element the next one
     * to be consumed.
     */
    pub fn to_end(&mut self) -> usize {
        self.posn = self.elements.len().saturating_sub(1);
        self.posn
    }

    /// A copy of the first `depth` elements, cursor at its end.
    pub fn truncated(&self, depth: usize) -> PathCursor {
        let elements: Vec<OsString> = self.elements.iter().take(depth).cloned().collect();
        let posn = elements.len();
        PathCursor { elements, posn }
    }

    /*
     * True iff every element of `self` equals the element at the same index of
     * `other`. The empty path is a prefix of everything, and a path is a
     * prefix of itself.
     */
    pub fn is_prefix_of(&self, other: &PathCursor) -> bool {
        self.elements.len() <= other.elements.len()
            && self
                .elements
                .iter()
                .zip(other.elements.iter())
                .all(|(mine, theirs)| mine == theirs)
    }

    pub fn to_path_buf(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for element in &self.elements {
            path.push(element);
        }
        path
    }
}

impl From<&Path> for PathCursor {
    fn from(path: &Path) -> Self {
        PathCursor::from_path(path)
    }
}

impl fmt::Display for PathCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_buf().display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_from_path_splits_root_and_names() {
        let cursor = PathCursor::from_path(Path::new("/usr/local/include"));
        assert_eq!(cursor.elements(), 4);
        assert_eq!(cursor.element(0), Some(OsStr::new("/")));
        assert_eq!(cursor.element(3), Some(OsStr::new("include")));
        assert_eq!(cursor.posn(), 0);
        assert_eq!(cursor.to_path_buf(), PathBuf::from("/usr/local/include"));
    }

    #[cfg(windows)]
    #[test]
    fn test_from_path_keeps_drive_with_root() {
        let cursor = PathCursor::from_path(Path::new(r"C:\src\lib.rs"));
        assert_eq!(cursor.elements(), 3);
        assert_eq!(cursor.element(0), Some(OsStr::new(r"C:\")));
        assert_eq!(cursor.to_path_buf(), PathBuf::from(r"C:\src\lib.rs"));
    }

    #[test]
    fn test_push_pop_and_cursor_movement() {
        let mut cursor = PathCursor::from_path(Path::new("a/b"));
        cursor.push_back("c");
        assert_eq!(cursor.to_end(), 2);
        assert_eq!(cursor.cur_element(), Some(OsStr::new("c")));
        cursor.advance();
        assert!(cursor.is_consumed());
        assert_eq!(cursor.cur_element(), None);

        assert_eq!(cursor.pop_back(), Some(OsString::from("c")));
        assert_eq!(cursor.posn(), 2);
        assert!(cursor.is_consumed());
        assert_eq!(cursor.element(1), Some(OsStr::new("b")));
    }

    #[test]
    fn test_to_end_on_empty_path() {
        let mut cursor = PathCursor::default();
        assert_eq!(cursor.to_end(), 0);
        assert!(cursor.is_consumed());
    }

    #[test]
    fn test_is_prefix_of_is_element_wise() {
        let base = PathCursor::from_path(Path::new("x/src"));
        let inside = PathCursor::from_path(Path::new("x/src/main.c"));
        let sibling = PathCursor::from_path(Path::new("x/src2/main.c"));

        assert!(base.is_prefix_of(&inside));
        assert!(base.is_prefix_of(&base));
        assert!(!base.is_prefix_of(&sibling), "src is not a prefix of src2");
        assert!(!inside.is_prefix_of(&base));
        assert!(PathCursor::default().is_prefix_of(&base));
    }

    #[test]
    fn test_truncated_keeps_leading_elements() {
        let cursor = PathCursor::from_path(Path::new("x/y/z"));
        let head = cursor.truncated(2);
        assert_eq!(head.to_path_buf(), PathBuf::from("x/y"));
        assert!(head.is_consumed());
        assert!(head.is_prefix_of(&cursor));
    }
}
