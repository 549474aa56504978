/// A single node in the scanned file tree.
///
/// Unlike an arena, every `Entry` owns its children outright. Subtrees are
/// built independently by scanner workers and folded into their parent once
/// all of them have returned, so no node ever needs a back-reference.
use compact_str::CompactString;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::PathBuf;

/// Whether an entry is a plain file or a directory.
///
/// Sockets, fifos and device nodes are reported as `File`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Why a subtree could not be measured completely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Reading the directory or its metadata was refused by the OS.
    AccessDenied,
    /// Any other I/O failure (vanished entry, bad filesystem, ...).
    Io,
    /// The directory resolves to one of its own ancestors.
    Cycle,
    /// A symlink whose target does not exist.
    DanglingLink,
}

/// A non-fatal problem attached to the node where it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanWarning {
    pub kind: WarningKind,
    pub path: PathBuf,
    pub message: String,
}

impl ScanWarning {
    pub fn new(kind: WarningKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Classify an I/O error against the path that produced it.
    pub fn from_io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::PermissionDenied => WarningKind::AccessDenied,
            _ => WarningKind::Io,
        };
        Self::new(kind, path, err.to_string())
    }
}

/// One filesystem object with its aggregated size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Last path component only.
    pub name: CompactString,

    pub kind: EntryKind,

    /// Bytes occupied by this object alone. Always 0 for directories.
    pub own_size: u64,

    /// `own_size` plus the `total_size` of every child.
    /// Computed by the constructors; never supplied by callers.
    pub total_size: u64,

    /// Number of descendant files (1 for a file itself).
    pub file_count: u64,

    /// Children sorted by descending `total_size`, ties by ascending name.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Entry>,

    /// Problems encountered while scanning this node.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ScanWarning>,
}

impl Entry {
    /// Create a file entry.
    pub fn file(name: impl Into<CompactString>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            own_size: size,
            total_size: size,
            file_count: 1,
            children: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Create a directory entry from already-built children.
    ///
    /// This is the aggregation step: sizes and counts are summed here and
    /// the children are put into their canonical order, regardless of the
    /// order in which parallel workers returned them.
    pub fn directory(name: impl Into<CompactString>, mut children: Vec<Entry>) -> Self {
        children.sort_by(canonical_order);
        let total_size = children.iter().map(|c| c.total_size).sum();
        let file_count = children.iter().map(|c| c.file_count).sum();
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            own_size: 0,
            total_size,
            file_count,
            children,
            warnings: Vec::new(),
        }
    }

    /// Create an empty placeholder for a node that could not be measured.
    /// The node stays in the tree so callers can see where errors occurred.
    pub fn unreadable(name: impl Into<CompactString>, kind: EntryKind, warning: ScanWarning) -> Self {
        Self {
            name: name.into(),
            kind,
            own_size: 0,
            total_size: 0,
            file_count: 0,
            children: Vec::new(),
            warnings: vec![warning],
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Depth-first iterator over this entry and all of its descendants.
    pub fn iter(&self) -> EntryIter<'_> {
        EntryIter { stack: vec![self] }
    }

    /// Every warning recorded anywhere in this subtree.
    pub fn all_warnings(&self) -> impl Iterator<Item = &ScanWarning> {
        self.iter().flat_map(|e| e.warnings.iter())
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }
}

/// Descending size, then ascending name.
pub fn canonical_order(a: &Entry, b: &Entry) -> Ordering {
    b.total_size
        .cmp(&a.total_size)
        .then_with(|| a.name.as_bytes().cmp(b.name.as_bytes()))
}

/// Pre-order traversal returned by [`Entry::iter`].
pub struct EntryIter<'a> {
    stack: Vec<&'a Entry>,
}

impl<'a> Iterator for EntryIter<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.stack.pop()?;
        self.stack.extend(entry.children.iter().rev());
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_aggregation() {
        let users = Entry::directory(
            "Users",
            vec![Entry::file("a.txt", 100), Entry::file("b.txt", 200)],
        );
        let root = Entry::directory("root", vec![users, Entry::file("c.bin", 50)]);

        assert_eq!(root.children[0].total_size, 300);
        assert_eq!(root.total_size, 350);
        assert_eq!(root.own_size, 0);
        assert_eq!(root.file_count, 3);
        assert_eq!(root.children[0].file_count, 2);
    }

    #[test]
    fn test_children_sorted_by_size_then_name() {
        let root = Entry::directory(
            "root",
            vec![
                Entry::file("small", 10),
                Entry::file("beta", 500),
                Entry::file("alpha", 500),
                Entry::directory("empty", Vec::new()),
            ],
        );
        let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["alpha", "beta", "small", "empty"]);
    }

    #[test]
    fn test_unreadable_is_empty_with_warning() {
        let warning = ScanWarning::new(WarningKind::AccessDenied, "/x/locked", "denied");
        let node = Entry::unreadable("locked", EntryKind::Directory, warning.clone());
        assert_eq!(node.total_size, 0);
        assert!(node.children.is_empty());
        assert_eq!(node.warnings, vec![warning]);
    }

    #[test]
    fn test_iter_is_preorder() {
        let root = Entry::directory(
            "root",
            vec![
                Entry::directory("d", vec![Entry::file("x", 5)]),
                Entry::file("f", 1),
            ],
        );
        let names: Vec<&str> = root.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["root", "d", "x", "f"]);
        assert_eq!(root.node_count(), 4);
    }

    #[test]
    fn test_all_warnings_collects_nested() {
        let inner = Entry::unreadable(
            "locked",
            EntryKind::Directory,
            ScanWarning::new(WarningKind::AccessDenied, "/r/d/locked", "denied"),
        );
        let mut root = Entry::directory("r", vec![Entry::directory("d", vec![inner])]);
        root.warnings
            .push(ScanWarning::new(WarningKind::Io, "/r/?", "bad entry"));
        assert_eq!(root.all_warnings().count(), 2);
    }

    #[test]
    fn test_io_warning_classification() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let gone = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert_eq!(ScanWarning::from_io("/a", &denied).kind, WarningKind::AccessDenied);
        assert_eq!(ScanWarning::from_io("/a", &gone).kind, WarningKind::Io);
    }
}
