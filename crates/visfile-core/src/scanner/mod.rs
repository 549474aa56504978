/// Scanner module: builds the size-annotated `Entry` tree.
///
/// Two entry points share one engine:
/// - [`scan`] runs on the calling thread (the work itself fans out over a
///   bounded `rayon` pool) and returns the finished tree.
/// - [`start_scan`] runs the same scan on a background thread and returns a
///   [`ScanHandle`] for progress messages, cancellation, and joining.
///
/// Cancellation policy: a cancelled scan (explicit cancel or passed
/// deadline) fails with [`ScanError::Cancelled`]. No partial tree is
/// returned.
pub mod identity;
pub mod parallel;
pub mod progress;

use crate::config::ScanConfig;
use crate::model::Entry;
use identity::{Identity, Lineage};
use parallel::{absolute, root_display_name, Walker};
use progress::{report, ScanProgress};

use crossbeam_channel::{Receiver, Sender};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Stack size for scanner workers. Recursion depth follows directory depth,
/// and unoptimised builds need tens of KB per level; this covers chains as
/// deep as `PATH_MAX` allows.
const WORKER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Maximum number of progress messages that may queue up in the channel.
///
/// Messages beyond this are dropped rather than blocking the workers, so a
/// receiver that is never drained cannot stall a scan.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Fatal scan failures. Anything below the root is recorded as a warning on
/// the affected node instead.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("access denied: {0}")]
    AccessDenied(PathBuf),

    #[error("scan cancelled")]
    Cancelled,

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot start scanner workers: {0}")]
    WorkerPool(String),
}

impl ScanError {
    /// Map a root-level I/O failure onto the error taxonomy.
    fn from_root_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::AccessDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Shared cancellation flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the scan to stop as soon as possible.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-invocation controls that are not configuration: cancellation,
/// deadline, and an optional progress sink.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub cancel: Option<CancelToken>,
    pub deadline: Option<Instant>,
    pub progress: Option<Sender<ScanProgress>>,
}

/// Scan `root` and return the fully aggregated tree.
///
/// Fails with `NotFound`, `NotADirectory` or `AccessDenied` when the root
/// itself is unusable (including when it vanishes between a caller's
/// pre-check and this call), and with `Cancelled` when `options` asks it
/// to stop.
pub fn scan(root: &Path, config: &ScanConfig, options: &ScanOptions) -> Result<Entry, ScanError> {
    let start = Instant::now();
    let root = absolute(root);

    let meta = std::fs::metadata(&root).map_err(|e| ScanError::from_root_io(&root, e))?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root));
    }
    let identity = Identity::of(&root, &meta).map_err(|e| ScanError::from_root_io(&root, e))?;
    let listing = std::fs::read_dir(&root).map_err(|e| ScanError::from_root_io(&root, e))?;

    let workers = config.worker_count();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .stack_size(WORKER_STACK_SIZE)
        .thread_name(|i| format!("visfile-scan-{i}"))
        .build()
        .map_err(|e| ScanError::WorkerPool(e.to_string()))?;

    info!("Scanning {} with {workers} workers", root.display());

    let walker = Walker {
        follow_symlinks: config.follow_symlinks,
        cancel: options.cancel.as_ref(),
        deadline: options.deadline,
        progress: options.progress.as_ref(),
    };
    walker.check_cancelled()?;
    let lineage = Lineage::root(identity);
    let name = root_display_name(&root);

    let tree = pool.install(|| walker.scan_listing(&root, name, listing, &lineage))?;

    debug!(
        "Scan of {} complete: {} files, {} bytes, {} nodes in {:?}",
        root.display(),
        tree.file_count,
        tree.total_size,
        tree.node_count(),
        start.elapsed()
    );
    Ok(tree)
}

/// Handle to a scan running on a background thread.
pub struct ScanHandle {
    /// Receiver for progress updates from the scan.
    pub progress_rx: Receiver<ScanProgress>,
    cancel: CancelToken,
    thread: thread::JoinHandle<Result<Entry, ScanError>>,
}

impl ScanHandle {
    /// Request the scan to stop as soon as possible.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the scan to finish and take its result.
    pub fn join(self) -> Result<Entry, ScanError> {
        self.thread
            .join()
            .unwrap_or_else(|_| Err(ScanError::WorkerPool("scanner thread panicked".into())))
    }
}

/// Start a scan on a background thread.
pub fn start_scan(root: PathBuf, config: ScanConfig) -> io::Result<ScanHandle> {
    start_scan_with(root, config, ScanOptions::default())
}

/// Like [`start_scan`], with a deadline or an externally owned cancel
/// token. Any progress sender in `options` is replaced by the handle's.
pub fn start_scan_with(
    root: PathBuf,
    config: ScanConfig,
    options: ScanOptions,
) -> io::Result<ScanHandle> {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel = options.cancel.unwrap_or_default();
    let options = ScanOptions {
        cancel: Some(cancel.clone()),
        deadline: options.deadline,
        progress: Some(progress_tx.clone()),
    };

    let thread = thread::Builder::new()
        .name("visfile-scanner".into())
        .spawn(move || {
            let start = Instant::now();
            let result = scan(&root, &config, &options);
            let terminal = match &result {
                Ok(tree) => ScanProgress::Complete {
                    duration: start.elapsed(),
                    total_size: tree.total_size,
                    warning_count: tree.all_warnings().count(),
                },
                Err(ScanError::Cancelled) => ScanProgress::Cancelled,
                Err(err) => ScanProgress::Failed {
                    message: err.to_string(),
                },
            };
            report(Some(&progress_tx), terminal);
            result
        })?;

    Ok(ScanHandle {
        progress_rx,
        cancel,
        thread,
    })
}
