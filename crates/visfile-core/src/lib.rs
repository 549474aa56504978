/// Visfile Core: scanning, layout, and data model.
///
/// This crate has no rendering or I/O-format dependencies; it turns a
/// directory into a size-annotated tree and that tree into chart geometry.
///
/// # Modules
///
/// - [`model`]: Owned `Entry` tree and size formatting.
/// - [`scanner`]: Parallel filesystem scan with progress and cancellation.
/// - [`layout`]: Squarified treemap and pie layouts.
/// - [`palette`]: Deterministic per-node colours.
/// - [`config`]: Tunables for the above.
pub mod config;
pub mod layout;
pub mod model;
pub mod palette;
pub mod scanner;
