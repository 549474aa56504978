/// Visfile Render: rasterization and image output.
///
/// Turns chart geometry from `visfile-core` into pixels and writes them out.
///
/// # Modules
///
/// - [`canvas`]: RGBA pixel buffers.
/// - [`text`]: Label glyphs via `fontdue`.
/// - [`theme`]: Background, border and label colours.
/// - [`raster`]: Treemap and pie rasterizer.
/// - [`sink`]: Atomic PNG output.
/// - [`pipeline`]: Scan → layout → render → write, plus the config file.
pub mod canvas;
pub mod pipeline;
pub mod raster;
pub mod sink;
pub mod text;
pub mod theme;

pub use pipeline::{scan_and_render, scan_and_render_with, Config, Error, ErrorKind};
