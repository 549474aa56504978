/// Directory identities and the per-path lineage used for cycle detection.
///
/// The lineage is a linked list borrowed down the call stack: each recursive
/// scan pushes one frame that lives exactly as long as that directory's
/// scan. Siblings therefore never see each other's frames, and two siblings
/// that legitimately point at the same target outside their ancestry are
/// both measured.
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

/// A stable identity for a directory on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Device and inode number (Unix).
    Inode { dev: u64, ino: u64 },
    /// Fully resolved path (platforms without inode numbers).
    Path(PathBuf),
}

impl Identity {
    /// Identity of `path`, whose (followed) metadata is `meta`.
    #[cfg(unix)]
    pub fn of(_path: &Path, meta: &Metadata) -> io::Result<Self> {
        use std::os::unix::fs::MetadataExt;
        Ok(Self::Inode {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    /// Identity of `path`, whose (followed) metadata is `meta`.
    #[cfg(not(unix))]
    pub fn of(path: &Path, _meta: &Metadata) -> io::Result<Self> {
        Ok(Self::Path(std::fs::canonicalize(path)?))
    }
}

/// One frame of the current descent path.
#[derive(Debug)]
pub struct Lineage<'a> {
    identity: Identity,
    parent: Option<&'a Lineage<'a>>,
}

impl<'a> Lineage<'a> {
    /// Start a lineage at the scan root.
    pub fn root(identity: Identity) -> Self {
        Self {
            identity,
            parent: None,
        }
    }

    /// Extend the lineage by one directory.
    pub fn child(&'a self, identity: Identity) -> Lineage<'a> {
        Lineage {
            identity,
            parent: Some(self),
        }
    }

    /// `true` if `identity` is this directory or one of its ancestors.
    pub fn contains(&self, identity: &Identity) -> bool {
        let mut frame = Some(self);
        while let Some(f) = frame {
            if f.identity == *identity {
                return true;
            }
            frame = f.parent;
        }
        false
    }
}
