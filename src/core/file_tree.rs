/*
 * The file tree: a deduplicated logical tree of the files selected from a set
 * of input paths, united under a root node that represents no filesystem
 * object. Nodes live in an arena and refer to each other by `NodeId`; each node
 * keeps its parent's id and a name-ordered map of its children, so traversal
 * order is the lexicographic order of the keys.
 *
 * Insertion is build-then-commit. A node for a path element that is not yet in
 * the tree starts life as an unlinked candidate, is built recursively, and is
 * linked into its parent only if that build selected at least one file.
 * Directories that select nothing never appear in the tree.
 *
 * Symbolic links are never nodes. A link found while exploring a directory is
 * replaced by a fresh insertion of its real path from the root, unless the real
 * path lies inside a directory that is still being explored further up the
 * current build. That build will reach the same files through their real path,
 * so the link adds nothing, and skipping it is what stops self-including and
 * mutually-including links from recursing forever.
 */
use super::directory::DirectoryOperations;
use super::fs_probe::{CoreFilesystemProbe, FilesystemProbeOperations, FsObjectKind};
use super::path_cursor::PathCursor;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum FileTreeError {
    /// A directory could not be opened for reading. Fatal to the run.
    CantOpenDir { path: PathBuf, source: io::Error },
    /// Reading the entries of an open directory failed. Fatal to the run.
    CantReadDir { path: PathBuf, source: io::Error },
    /// An input path could not be resolved to its real path.
    CantGetRealPath { path: PathBuf, source: io::Error },
}

impl FileTreeError {
    /*
     * Directory errors abort the whole run. A bad input path only spoils that
     * one input, so callers may carry on with the next.
     */
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FileTreeError::CantGetRealPath { .. })
    }
}

impl std::fmt::Display for FileTreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileTreeError::CantOpenDir { path, source } => write!(
                f,
                "Can't open directory \"{}\" for reading: {source}",
                path.display()
            ),
            FileTreeError::CantReadDir { path, source } => {
                write!(f, "Read error on directory \"{}\": {source}", path.display())
            }
            FileTreeError::CantGetRealPath { path, source } => write!(
                f,
                "Can't obtain real path of \"{}\": {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for FileTreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileTreeError::CantOpenDir { source, .. }
            | FileTreeError::CantReadDir { source, .. }
            | FileTreeError::CantGetRealPath { source, .. } => Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, FileTreeError>;

/*
 * Decides whether a file, given by its absolute real path, is selected. A
 * filter may keep a running tally of what it accepted but must not touch the
 * filesystem.
 */
pub trait SelectionFilter {
    fn select(&mut self, path: &Path) -> bool;
}

impl<F> SelectionFilter for F
where
    F: FnMut(&Path) -> bool,
{
    fn select(&mut self, path: &Path) -> bool {
        self(path)
    }
}

/// The null filter: every file is selected.
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilter;

#[cfg(test)]
impl SelectionFilter for NoFilter {
    fn select(&mut self, _path: &Path) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(super) usize);

pub const ROOT: NodeId = NodeId(0);

/*
 * A file node has no child map. A directory node has one, which is empty only
 * for the root or while the node is still an unlinked candidate.
 */
#[derive(Debug, Default)]
pub(super) struct Node {
    parent: Option<NodeId>,
    children: Option<BTreeMap<OsString, NodeId>>,
    explored: bool,
}

impl Node {
    pub(super) fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(super) fn children(&self) -> Option<&BTreeMap<OsString, NodeId>> {
        self.children.as_ref()
    }

    pub(super) fn is_file(&self) -> bool {
        self.children.is_none()
    }
}

// A directory whose entries are currently being inserted.
#[derive(Debug)]
struct BuildFrame {
    node: NodeId,
    path: PathCursor,
}

pub struct FileTree<P: FilesystemProbeOperations = CoreFilesystemProbe> {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    files: usize,
    probe: P,
    building: Vec<BuildFrame>,
}

impl FileTree<CoreFilesystemProbe> {
    pub fn new() -> Self {
        FileTree::with_probe(CoreFilesystemProbe::new())
    }
}

impl Default for FileTree<CoreFilesystemProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: FilesystemProbeOperations> FileTree<P> {
    pub fn with_probe(probe: P) -> Self {
        let root = Node {
            parent: None,
            children: Some(BTreeMap::new()),
            explored: false,
        };
        FileTree {
            nodes: vec![root],
            free: Vec::new(),
            files: 0,
            probe,
            building: Vec::new(),
        }
    }

    /// The number of files selected into the tree so far.
    pub fn files(&self) -> usize {
        self.files
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.nodes[ROOT.0].children.as_ref().is_none_or(BTreeMap::is_empty)
    }

    pub(super) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /*
     * Adds the files selected by `filter` within `path` to the tree. `path`
     * may be relative or contain links; it is resolved to its real path first.
     * Returns the number of files newly selected by this call, including files
     * reached through symbolic links.
     *
     * A directory that cannot be opened or read aborts the insertion with a
     * fatal error. Whatever was selected before the failure stays in the tree,
     * but the run is not expected to continue.
     */
    pub fn add<F>(&mut self, path: &Path, filter: &mut F) -> Result<usize>
    where
        F: SelectionFilter + ?Sized,
    {
        let real_path =
            self.probe
                .canonicalize(path)
                .map_err(|source| FileTreeError::CantGetRealPath {
                    path: path.to_path_buf(),
                    source,
                })?;
        log::debug!("FileTree: Adding {path:?} (real path {real_path:?}).");
        let before = self.files;
        let mut abs_path = PathCursor::from_path(&real_path);
        self.insert(ROOT, &mut abs_path, filter)?;
        let added = self.files - before;
        log::debug!("FileTree: {added} new file(s) selected from {path:?}.");
        Ok(added)
    }

    /*
     * Descends from `node` along `abs_path`, starting at the element under
     * the cursor. Returns the number of newly selected files that now belong
     * to `node`'s subtree. The cursor is restored before returning.
     */
    fn insert<F>(&mut self, node: NodeId, abs_path: &mut PathCursor, filter: &mut F) -> Result<usize>
    where
        F: SelectionFilter + ?Sized,
    {
        let Some(key) = abs_path.cur_element().map(OsStr::to_os_string) else {
            debug_assert!(false, "insert called with a consumed path");
            return Ok(0);
        };
        let posn = abs_path.posn();
        abs_path.advance();
        let outcome = match self.find(node, &key) {
            Some(child) if abs_path.is_consumed() => self.revisit(child, abs_path, filter),
            Some(child) => self.insert(child, abs_path, filter),
            None => self.insert_candidate(node, key, abs_path, filter),
        };
        abs_path.set_posn(posn);
        outcome
    }

    fn insert_candidate<F>(
        &mut self,
        parent: NodeId,
        key: OsString,
        abs_path: &mut PathCursor,
        filter: &mut F,
    ) -> Result<usize>
    where
        F: SelectionFilter + ?Sized,
    {
        let candidate = self.alloc(parent);
        let outcome = if abs_path.is_consumed() {
            self.terminal_insert(candidate, abs_path, filter)
        } else {
            self.insert(candidate, abs_path, filter)
        };
        match outcome {
            Ok(0) => {
                self.release(candidate);
                Ok(0)
            }
            Ok(new_files) => {
                self.link_child(parent, key, candidate);
                Ok(new_files)
            }
            Err(e) => {
                self.release(candidate);
                Err(e)
            }
        }
    }

    /*
     * The path ends at a node that is already linked. A file is already
     * selected. A directory is explored unless that already happened: it may
     * have been linked only as a path segment of an earlier, deeper input.
     */
    fn revisit<F>(&mut self, node: NodeId, abs_path: &mut PathCursor, filter: &mut F) -> Result<usize>
    where
        F: SelectionFilter + ?Sized,
    {
        let existing = &self.nodes[node.0];
        if existing.is_file() || existing.explored {
            return Ok(0);
        }
        self.explore(node, abs_path, filter)
    }

    fn terminal_insert<F>(
        &mut self,
        candidate: NodeId,
        abs_path: &mut PathCursor,
        filter: &mut F,
    ) -> Result<usize>
    where
        F: SelectionFilter + ?Sized,
    {
        let path = abs_path.to_path_buf();
        match self.probe.classify(&path) {
            FsObjectKind::Symlink => self.follow_link(abs_path, &path, filter),
            FsObjectKind::File => {
                if filter.select(&path) {
                    self.files += 1;
                    Ok(1)
                } else {
                    Ok(0)
                }
            }
            FsObjectKind::Directory => self.explore(candidate, abs_path, filter),
            FsObjectKind::Other => {
                log::warn!("FileTree: Skipping {path:?}: not a regular file or directory.");
                Ok(0)
            }
        }
    }

    /*
     * Files reached through the link are selected under their real path and
     * counted in the tree total, but none of them belongs to the link's own
     * candidate, so the link always reports 0.
     */
    fn follow_link<F>(&mut self, cur_path: &PathCursor, link: &Path, filter: &mut F) -> Result<usize>
    where
        F: SelectionFilter + ?Sized,
    {
        let real_path = match self.probe.canonicalize(link) {
            Ok(real_path) => real_path,
            Err(e) => {
                log::warn!("FileTree: Can't obtain real path of {link:?}: {e}");
                return Ok(0);
            }
        };
        let mut real_cursor = PathCursor::from_path(&real_path);
        if let Some(ancestor) = self.ancestral_candidate_for_real_path(cur_path, &real_cursor) {
            log::trace!(
                "FileTree: Link {link:?} resolves to {real_path:?} within {ancestor:?}, which is under construction."
            );
            return Ok(0);
        }
        log::debug!("FileTree: Following link {link:?} to {real_path:?}.");
        let reached = self.insert(ROOT, &mut real_cursor, filter)?;
        log::trace!("FileTree: Link {link:?} reached {reached} new file(s).");
        Ok(0)
    }

    /*
     * Ancestor probe for symbolic links. `cur_path` keys the link's own
     * candidate and `real_path` is what the link resolves to.
     *
     * Walks upward through the directories whose builds are still in
     * progress, innermost first, and returns the first one whose path is an
     * initial subpath of `real_path`. The innermost of those is the directory
     * containing the link. The walk does not stop at the link's structural
     * ancestors: a link followed from the root starts a new branch of the same
     * build, so the builds that led to that link are ancestors too. The tree
     * root is never being built, so an ascent that gets past every frame finds
     * nothing, and the link is safe to follow.
     */
    fn ancestral_candidate_for_real_path(
        &self,
        cur_path: &PathCursor,
        real_path: &PathCursor,
    ) -> Option<NodeId> {
        debug_assert!(
            self.building
                .last()
                .is_none_or(|frame| frame.path.is_prefix_of(cur_path)),
            "a link is only met while exploring its directory"
        );
        self.building
            .iter()
            .rev()
            .find(|frame| frame.path.is_prefix_of(real_path))
            .map(|frame| frame.node)
    }

    /*
     * Inserts every entry of the directory at `abs_path` (cursor consumed)
     * beneath `node`. A directory that an enclosing build is already exploring
     * is left to that build.
     */
    fn explore<F>(&mut self, node: NodeId, abs_path: &mut PathCursor, filter: &mut F) -> Result<usize>
    where
        F: SelectionFilter + ?Sized,
    {
        let frame_path = abs_path.truncated(abs_path.elements());
        if self.building.iter().any(|frame| frame.path == frame_path) {
            log::trace!("FileTree: {frame_path} is already being explored.");
            return Ok(0);
        }
        self.building.push(BuildFrame {
            node,
            path: frame_path,
        });
        let outcome = self.explore_entries(node, abs_path, filter);
        self.building.pop();
        if outcome.is_ok() {
            self.nodes[node.0].explored = true;
        }
        outcome
    }

    fn explore_entries<F>(
        &mut self,
        node: NodeId,
        abs_path: &mut PathCursor,
        filter: &mut F,
    ) -> Result<usize>
    where
        F: SelectionFilter + ?Sized,
    {
        let mut dir = self.probe.directory(&abs_path.to_path_buf());
        if !dir.open() {
            return Err(FileTreeError::CantOpenDir {
                source: dir.io_error(),
                path: dir.path().to_path_buf(),
            });
        }
        let mut new_files = 0;
        loop {
            let entry = dir.next_entry();
            if !dir.good() {
                return Err(FileTreeError::CantReadDir {
                    source: dir.io_error(),
                    path: dir.path().to_path_buf(),
                });
            }
            if entry.is_empty() {
                break;
            }
            abs_path.push_back(entry);
            abs_path.to_end();
            let outcome = self.insert(node, abs_path, filter);
            abs_path.pop_back();
            new_files += outcome?;
        }
        if !dir.close() {
            log::warn!("FileTree: Failed to close {:?}: {}", dir.path(), dir.io_error());
        }
        Ok(new_files)
    }

    fn find(&self, node: NodeId, key: &OsStr) -> Option<NodeId> {
        self.nodes[node.0]
            .children
            .as_ref()
            .and_then(|children| children.get(key).copied())
    }

    fn alloc(&mut self, parent: NodeId) -> NodeId {
        let node = Node {
            parent: Some(parent),
            children: None,
            explored: false,
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    // Returns a candidate and everything beneath it to the free list.
    fn release(&mut self, id: NodeId) {
        let node = std::mem::take(&mut self.nodes[id.0]);
        if let Some(children) = node.children {
            for child in children.into_values() {
                self.release(child);
            }
        }
        self.free.push(id);
    }

    /*
     * Commits `child` under `key`. A link followed from the root while the
     * child was being built may have committed the same key already, e.g.
     * the shared leading directories of two sibling inputs; the candidate is
     * then merged into that node.
     */
    fn link_child(&mut self, parent: NodeId, key: OsString, child: NodeId) {
        if let Some(existing) = self.find(parent, &key) {
            self.merge(existing, child);
            return;
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0]
            .children
            .get_or_insert_with(BTreeMap::new)
            .insert(key, child);
    }

    fn merge(&mut self, into: NodeId, from: NodeId) {
        let from_node = std::mem::take(&mut self.nodes[from.0]);
        debug_assert!(
            from_node.children.is_none() || !self.nodes[into.0].is_file(),
            "a file and a directory cannot share a path"
        );
        self.nodes[into.0].explored |= from_node.explored;
        if let Some(children) = from_node.children {
            for (key, grandchild) in children {
                self.link_child(into, key, grandchild);
            }
        }
        self.free.push(from);
    }
}
