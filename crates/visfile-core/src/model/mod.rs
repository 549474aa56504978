/// Data model for the scanned tree.
///
/// Re-exports the owned `Entry` tree and the size formatting helpers.
pub mod entry;
pub mod size;

pub use entry::{canonical_order, Entry, EntryKind, ScanWarning, WarningKind};
pub use size::{format_count, format_size};
