/*
 * Replays a file tree as a stream of directory-enter, file and directory-leave
 * events, depth first, children in key order. The root itself produces no
 * event; its children are the top-level entries (`/` on Unix).
 *
 * A leave event is emitted lazily, when the walk reaches an entry whose parent
 * is not the directory currently entered. The directories still entered when
 * the walk runs out are therefore not left unless the stream is asked to flush
 * them with `Events::balanced`.
 */
use super::file_tree::{FileTree, Node, NodeId, ROOT};
use super::fs_probe::FilesystemProbeOperations;
use super::path_cursor::PathCursor;
use std::collections::{VecDeque, btree_map};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    EnterDirectory(PathBuf),
    AtFile(PathBuf),
    LeaveDirectory(PathBuf),
}

impl TreeEvent {
    pub fn path(&self) -> &Path {
        match self {
            TreeEvent::EnterDirectory(path)
            | TreeEvent::AtFile(path)
            | TreeEvent::LeaveDirectory(path) => path,
        }
    }
}

/*
 * Hooks for the three kinds of event. Implementors override the ones they
 * care about.
 */
pub trait TraversalHandler {
    fn enter_dir(&mut self, _path: &Path) {}

    fn at_file(&mut self, _path: &Path) {}

    fn leave_dir(&mut self, _path: &Path) {}
}

// The walker's state between entries: the directory entered last and its path.
#[derive(Debug, Default)]
pub(super) struct Traverser {
    cur_dir: Option<NodeId>,
    path: PathCursor,
}

impl Traverser {
    pub(super) fn new() -> Self {
        Traverser::default()
    }

    fn visit(&mut self, nodes: &[Node], id: NodeId, name: &OsStr, out: &mut VecDeque<TreeEvent>) {
        let parent = nodes[id.0].parent();
        while self.path.elements() > 0 && parent != self.cur_dir {
            self.leave(nodes, out);
        }
        self.path.push_back(name);
        if nodes[id.0].is_file() {
            out.push_back(TreeEvent::AtFile(self.path.to_path_buf()));
            self.path.pop_back();
        } else {
            self.cur_dir = Some(id);
            out.push_back(TreeEvent::EnterDirectory(self.path.to_path_buf()));
        }
    }

    fn leave(&mut self, nodes: &[Node], out: &mut VecDeque<TreeEvent>) {
        out.push_back(TreeEvent::LeaveDirectory(self.path.to_path_buf()));
        self.path.pop_back();
        self.cur_dir = self.cur_dir.and_then(|dir| nodes[dir.0].parent());
    }

    /// Leaves every directory still entered, innermost first.
    pub(super) fn finish(&mut self, nodes: &[Node], out: &mut VecDeque<TreeEvent>) {
        while self.path.elements() > 0 {
            self.leave(nodes, out);
        }
    }
}

pub struct Events<'a> {
    nodes: &'a [Node],
    walk: Vec<btree_map::Iter<'a, OsString, NodeId>>,
    traverser: Traverser,
    pending: VecDeque<TreeEvent>,
    balanced: bool,
    exhausted: bool,
}

impl<'a> Events<'a> {
    fn new(nodes: &'a [Node]) -> Self {
        let walk = nodes[ROOT.0].children().map(|c| c.iter()).into_iter().collect();
        Events {
            nodes,
            walk,
            traverser: Traverser::new(),
            pending: VecDeque::new(),
            balanced: false,
            exhausted: false,
        }
    }

    /// Ends the stream with a leave event for every directory still entered.
    pub fn balanced(mut self) -> Self {
        self.balanced = true;
        self
    }
}

impl Iterator for Events<'_> {
    type Item = TreeEvent;

    fn next(&mut self) -> Option<TreeEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.exhausted {
                return None;
            }
            let Some(siblings) = self.walk.last_mut() else {
                self.exhausted = true;
                if self.balanced {
                    self.traverser.finish(self.nodes, &mut self.pending);
                }
                continue;
            };
            let step = siblings.next();
            match step {
                None => {
                    self.walk.pop();
                }
                Some((name, &id)) => {
                    self.traverser
                        .visit(self.nodes, id, name, &mut self.pending);
                    if let Some(children) = self.nodes[id.0].children() {
                        self.walk.push(children.iter());
                    }
                }
            }
        }
    }
}

impl<P: FilesystemProbeOperations> FileTree<P> {
    /// A fresh walk over the tree as it is now.
    pub fn events(&self) -> Events<'_> {
        Events::new(self.nodes())
    }

    /*
     * Feeds the walk to `handler`. The leave events for the last directories
     * entered are not delivered; call `events().balanced()` to get them.
     */
    pub fn traverse<H: TraversalHandler + ?Sized>(&self, handler: &mut H) {
        for event in self.events() {
            match event {
                TreeEvent::EnterDirectory(path) => handler.enter_dir(&path),
                TreeEvent::AtFile(path) => handler.at_file(&path),
                TreeEvent::LeaveDirectory(path) => handler.leave_dir(&path),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::file_tree::{NoFilter, Result};
    use std::fs;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq)]
    enum Seen {
        Enter(PathBuf),
        File(PathBuf),
        Leave(PathBuf),
    }

    // Events below `base`, with paths made relative to it.
    fn seen_below(events: impl Iterator<Item = TreeEvent>, base: &Path) -> Vec<Seen> {
        events
            .filter_map(|event| {
                let rel = event.path().strip_prefix(base).ok()?.to_path_buf();
                if rel.as_os_str().is_empty() {
                    return None;
                }
                Some(match event {
                    TreeEvent::EnterDirectory(_) => Seen::Enter(rel),
                    TreeEvent::AtFile(_) => Seen::File(rel),
                    TreeEvent::LeaveDirectory(_) => Seen::Leave(rel),
                })
            })
            .collect()
    }

    fn make_files(base: &Path, rels: &[&str]) {
        for rel in rels {
            let path = base.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
    }

    #[test]
    fn test_nested_directories_leave_lazily() -> Result<()> {
        let dir = tempdir().unwrap();
        let base = dunce::canonicalize(dir.path()).unwrap();
        make_files(&base, &["x/a.txt", "x/y/b.txt"]);
        let mut tree = FileTree::new();
        tree.add(&base.join("x"), &mut NoFilter)?;

        let seen = seen_below(tree.events(), &base);

        assert_eq!(
            seen,
            vec![
                Seen::Enter("x".into()),
                Seen::File("x/a.txt".into()),
                Seen::Enter("x/y".into()),
                Seen::File("x/y/b.txt".into()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_leave_is_emitted_before_a_later_sibling() -> Result<()> {
        let dir = tempdir().unwrap();
        let base = dunce::canonicalize(dir.path()).unwrap();
        make_files(&base, &["x/y/b.txt", "x/z.txt", "w.txt"]);
        let mut tree = FileTree::new();
        tree.add(&base, &mut NoFilter)?;

        let seen = seen_below(tree.events(), &base);

        assert_eq!(
            seen,
            vec![
                Seen::File("w.txt".into()),
                Seen::Enter("x".into()),
                Seen::Enter("x/y".into()),
                Seen::File("x/y/b.txt".into()),
                Seen::Leave("x/y".into()),
                Seen::File("x/z.txt".into()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_balanced_stream_leaves_every_entered_directory() -> Result<()> {
        let dir = tempdir().unwrap();
        let base = dunce::canonicalize(dir.path()).unwrap();
        make_files(&base, &["x/a.txt", "x/y/b.txt"]);
        let mut tree = FileTree::new();
        tree.add(&base.join("x"), &mut NoFilter)?;

        let events: Vec<TreeEvent> = tree.events().balanced().collect();
        let enters = events
            .iter()
            .filter(|e| matches!(e, TreeEvent::EnterDirectory(_)))
            .count();
        let leaves: Vec<&Path> = events
            .iter()
            .filter(|e| matches!(e, TreeEvent::LeaveDirectory(_)))
            .map(TreeEvent::path)
            .collect();

        assert_eq!(enters, leaves.len());
        assert_eq!(leaves[0], base.join("x").join("y"));
        assert_eq!(leaves[1], base.join("x"));
        assert!(matches!(events.last(), Some(TreeEvent::LeaveDirectory(p)) if p.parent().is_none()));
        Ok(())
    }

    #[test]
    fn test_empty_tree_has_no_events() {
        let tree = FileTree::new();
        assert_eq!(tree.events().count(), 0);
        assert_eq!(tree.events().balanced().count(), 0);
    }

    #[test]
    fn test_walk_can_be_restarted() -> Result<()> {
        let dir = tempdir().unwrap();
        let base = dunce::canonicalize(dir.path()).unwrap();
        make_files(&base, &["k/m.c", "k/n.c", "l.c"]);
        let mut tree = FileTree::new();
        tree.add(&base, &mut NoFilter)?;

        let first: Vec<TreeEvent> = tree.events().collect();
        let second: Vec<TreeEvent> = tree.events().collect();
        assert_eq!(first, second);
        Ok(())
    }

    #[derive(Default)]
    struct Recorder {
        entered: usize,
        files: Vec<PathBuf>,
        left: usize,
    }

    impl TraversalHandler for Recorder {
        fn enter_dir(&mut self, _path: &Path) {
            self.entered += 1;
        }

        fn at_file(&mut self, path: &Path) {
            self.files.push(path.to_path_buf());
        }

        fn leave_dir(&mut self, _path: &Path) {
            self.left += 1;
        }
    }

    #[test]
    fn test_traverse_delivers_files_in_key_order() -> Result<()> {
        let dir = tempdir().unwrap();
        let base = dunce::canonicalize(dir.path()).unwrap();
        make_files(&base, &["b/2.c", "a/1.c", "a/sub/0.c", "c.c"]);
        let mut tree = FileTree::new();
        tree.add(&base, &mut NoFilter)?;

        let mut recorder = Recorder::default();
        tree.traverse(&mut recorder);

        let expected: Vec<PathBuf> = ["a/1.c", "a/sub/0.c", "b/2.c", "c.c"]
            .iter()
            .map(|rel| base.join(rel))
            .collect();
        assert_eq!(recorder.files, expected);
        assert!(recorder.left < recorder.entered);
        Ok(())
    }
}
