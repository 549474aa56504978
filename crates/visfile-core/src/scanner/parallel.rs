/// Parallel recursive walker: the scanner's engine.
///
/// Each directory lists its entries, then measures them with `rayon`'s
/// `par_iter` on a bounded pool. Every child scan returns an owned `Entry`;
/// the parent folds them with [`Entry::directory`], which re-sorts into
/// canonical order. Workers share nothing mutable, so the result does not
/// depend on the order in which subtrees complete.
///
/// Failures below the root never abort the walk: the affected node is kept
/// with zero size and a warning. Only cancellation propagates upward.
use crate::model::{Entry, EntryKind, ScanWarning, WarningKind};
use crate::scanner::identity::{Identity, Lineage};
use crate::scanner::progress::{report, ScanProgress};
use crate::scanner::{CancelToken, ScanError};
use compact_str::CompactString;
use crossbeam_channel::Sender;
use rayon::prelude::*;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// State shared read-only by every worker for the duration of one scan.
pub(crate) struct Walker<'a> {
    pub follow_symlinks: bool,
    pub cancel: Option<&'a CancelToken>,
    pub deadline: Option<Instant>,
    pub progress: Option<&'a Sender<ScanProgress>>,
}

impl Walker<'_> {
    pub fn check_cancelled(&self) -> Result<(), ScanError> {
        if self.cancel.is_some_and(|c| c.is_cancelled()) {
            return Err(ScanError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(ScanError::Cancelled);
        }
        Ok(())
    }

    /// Scan the children of a directory that has already been opened.
    ///
    /// `listing` is the result of `read_dir`, done by the caller so the root
    /// can turn its own failures into fatal errors.
    pub fn scan_listing(
        &self,
        path: &Path,
        name: CompactString,
        listing: fs::ReadDir,
        lineage: &Lineage<'_>,
    ) -> Result<Entry, ScanError> {
        let mut warnings = Vec::new();
        let mut items: Vec<DirEntry> = Vec::new();
        for item in listing {
            match item {
                Ok(item) => items.push(item),
                Err(err) => {
                    warn!("Unreadable entry in {}: {err}", path.display());
                    warnings.push(self.warning(ScanWarning::from_io(path, &err)));
                }
            }
        }

        let children = items
            .par_iter()
            .map(|item| self.scan_item(item, lineage))
            .collect::<Result<Vec<Entry>, ScanError>>()?;

        let mut dir = Entry::directory(name, children);
        dir.warnings.extend(warnings);

        report(
            self.progress,
            ScanProgress::DirectoryScanned {
                path: path.to_path_buf(),
                files: dir.file_count,
                bytes: dir.total_size,
            },
        );
        Ok(dir)
    }

    /// Measure one directory item: a file, a directory, or a symlink.
    fn scan_item(&self, item: &DirEntry, lineage: &Lineage<'_>) -> Result<Entry, ScanError> {
        let path = item.path();
        let name = CompactString::new(item.file_name().to_string_lossy());

        let file_type = match item.file_type() {
            Ok(ft) => ft,
            Err(err) => return Ok(self.unreadable(name, EntryKind::File, &path, &err)),
        };

        if file_type.is_symlink() {
            return self.scan_symlink(&path, name, lineage);
        }
        if file_type.is_dir() {
            let meta = match item.metadata() {
                Ok(meta) => meta,
                Err(err) => return Ok(self.unreadable(name, EntryKind::Directory, &path, &err)),
            };
            return self.scan_subdir(&path, name, &meta, lineage);
        }
        Ok(self.measure_file(&path, name, item.metadata()))
    }

    fn scan_symlink(
        &self,
        path: &Path,
        name: CompactString,
        lineage: &Lineage<'_>,
    ) -> Result<Entry, ScanError> {
        if !self.follow_symlinks {
            let meta = fs::symlink_metadata(path);
            return Ok(self.measure_file(path, name, meta));
        }

        // Follow the link: `fs::metadata` resolves the whole chain.
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => self.scan_subdir(path, name, &meta, lineage),
            Ok(meta) => Ok(Entry::file(name, meta.len())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("Dangling symlink {}", path.display());
                let warning = self.warning(ScanWarning::new(
                    WarningKind::DanglingLink,
                    path,
                    format!("symlink target does not exist: {err}"),
                ));
                Ok(Entry::unreadable(name, EntryKind::File, warning))
            }
            Err(err) => Ok(self.unreadable(name, EntryKind::File, path, &err)),
        }
    }

    fn scan_subdir(
        &self,
        path: &Path,
        name: CompactString,
        meta: &fs::Metadata,
        lineage: &Lineage<'_>,
    ) -> Result<Entry, ScanError> {
        self.check_cancelled()?;

        let identity = match Identity::of(path, meta) {
            Ok(id) => id,
            Err(err) => return Ok(self.unreadable(name, EntryKind::Directory, path, &err)),
        };
        if lineage.contains(&identity) {
            debug!("Cycle detected at {}", path.display());
            let warning = self.warning(ScanWarning::new(
                WarningKind::Cycle,
                path,
                "directory resolves to one of its ancestors; not descended into",
            ));
            return Ok(Entry::unreadable(name, EntryKind::Directory, warning));
        }

        let listing = match fs::read_dir(path) {
            Ok(listing) => listing,
            Err(err) => return Ok(self.unreadable(name, EntryKind::Directory, path, &err)),
        };
        let child_lineage = lineage.child(identity);
        self.scan_listing(path, name, listing, &child_lineage)
    }

    fn measure_file(
        &self,
        path: &Path,
        name: CompactString,
        meta: std::io::Result<fs::Metadata>,
    ) -> Entry {
        match meta {
            Ok(meta) => Entry::file(name, meta.len()),
            Err(err) => self.unreadable(name, EntryKind::File, path, &err),
        }
    }

    /// Record an absorbed failure: zero-size node plus a warning.
    fn unreadable(
        &self,
        name: CompactString,
        kind: EntryKind,
        path: &Path,
        err: &std::io::Error,
    ) -> Entry {
        warn!("Skipping {}: {err}", path.display());
        let warning = self.warning(ScanWarning::from_io(path, err));
        Entry::unreadable(name, kind, warning)
    }

    /// Mirror a warning onto the progress channel and hand it back.
    fn warning(&self, warning: ScanWarning) -> ScanWarning {
        report(
            self.progress,
            ScanProgress::Warning {
                path: warning.path.clone(),
                message: warning.message.clone(),
            },
        );
        warning
    }
}

/// Display name for the scan root: the last component, or the whole path
/// for roots like `/`.
pub(crate) fn root_display_name(path: &Path) -> CompactString {
    match path.file_name() {
        Some(name) => CompactString::new(name.to_string_lossy()),
        None => {
            let s = path.to_string_lossy();
            let trimmed = s.trim_end_matches(['/', '\\']);
            if trimmed.is_empty() {
                CompactString::new(s)
            } else {
                CompactString::new(trimmed)
            }
        }
    }
}

/// Absolute form of `path` without resolving symlinks in its last component.
pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display_name() {
        assert_eq!(root_display_name(Path::new("/home/user/docs")), "docs");
        assert_eq!(root_display_name(Path::new("/")), "/");
    }
}
