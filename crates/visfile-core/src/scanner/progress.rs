/// Scan progress reporting: lightweight messages sent from scanner
/// workers to whoever holds the receiving end of the channel.
///
/// The finished tree is never sent through the channel; it is returned by
/// the scan itself. These messages only carry counters and diagnostics.
use crossbeam_channel::{Sender, TrySendError};
use std::path::PathBuf;
use std::time::Duration;
use tracing::trace;

/// Progress updates emitted during a scan.
#[derive(Debug, Clone)]
pub enum ScanProgress {
    /// One directory finished, with its aggregated totals.
    DirectoryScanned {
        path: PathBuf,
        files: u64,
        bytes: u64,
    },
    /// A non-fatal problem (e.g. permission denied on one subtree).
    Warning { path: PathBuf, message: String },
    /// Scanning completed successfully.
    Complete {
        duration: Duration,
        total_size: u64,
        warning_count: usize,
    },
    /// The root could not be scanned; the handle's `join` has the error.
    Failed { message: String },
    /// Scanning stopped because it was cancelled or its deadline passed.
    Cancelled,
}

/// Non-blocking send. Progress is best-effort: when the receiver falls
/// behind, messages are dropped instead of stalling the workers.
pub(crate) fn report(tx: Option<&Sender<ScanProgress>>, msg: ScanProgress) {
    let Some(tx) = tx else {
        return;
    };
    match tx.try_send(msg) {
        Ok(()) => {}
        Err(TrySendError::Full(msg)) => trace!("progress channel full, dropping {msg:?}"),
        Err(TrySendError::Disconnected(_)) => {}
    }
}
