/// End-to-end rendering tests.
///
/// These go from a real temporary directory all the way to a PNG on disk
/// and decode it again with `image` to check what was written.
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use visfile_core::layout::ChartKind;
use visfile_core::scanner::ScanError;
use visfile_render::pipeline::render_tree;
use visfile_render::raster::{RenderConfig, RenderError};
use visfile_render::sink::{PngSink, SinkError};
use visfile_render::{scan_and_render, scan_and_render_with, Config, Error, ErrorKind};

// ── Helpers ──────────────────────────────────────────────────────────────────

/// ```text
/// root/
///   docs/
///     guide.md   (4 000 bytes)
///     notes.md   (1 000 bytes)
///   src/
///     main.rs    (3 000 bytes)
///   big.bin      (8 000 bytes)
/// ```
fn build_test_tree(root: &Path) {
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    write_bytes(&root.join("docs").join("guide.md"), 4_000);
    write_bytes(&root.join("docs").join("notes.md"), 1_000);
    write_bytes(&root.join("src").join("main.rs"), 3_000);
    write_bytes(&root.join("big.bin"), 8_000);
}

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

fn config(width: u32, height: u32) -> Config {
    Config {
        render: RenderConfig {
            width,
            height,
            ..Default::default()
        },
        ..Default::default()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// The default entry point writes a 1200×800 PNG.
#[test]
fn treemap_png_is_written() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    build_test_tree(input.path());
    let png = output.path().join("treemap.png");

    scan_and_render(input.path(), &png, ChartKind::Treemap).unwrap();

    let img = image::open(&png).unwrap();
    assert_eq!((img.width(), img.height()), (1200, 800));
}

#[test]
fn pie_png_is_written() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    build_test_tree(input.path());
    let png = output.path().join("pie.png");

    let tree = scan_and_render_with(
        input.path(),
        &png,
        ChartKind::Pie,
        &config(400, 300),
        &PngSink,
    )
    .unwrap();
    assert_eq!(tree.total_size, 16_000);

    let img = image::open(&png).unwrap();
    assert_eq!((img.width(), img.height()), (400, 300));
}

/// Rendering the same tree twice produces byte-identical pixels.
#[test]
fn rendering_is_deterministic() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    build_test_tree(input.path());

    for kind in [ChartKind::Treemap, ChartKind::Pie] {
        let one = output.path().join(format!("{kind}-1.png"));
        let two = output.path().join(format!("{kind}-2.png"));
        scan_and_render_with(input.path(), &one, kind, &config(320, 200), &PngSink).unwrap();
        scan_and_render_with(input.path(), &two, kind, &config(320, 200), &PngSink).unwrap();

        let a = image::open(&one).unwrap().to_rgba8();
        let b = image::open(&two).unwrap().to_rgba8();
        assert_eq!(a.as_raw(), b.as_raw(), "{kind} differs between runs");
    }
}

/// A tree of empty files still renders: equal areas, equal angles.
#[test]
fn zero_size_tree_renders() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    for name in ["a", "b", "c"] {
        write_bytes(&input.path().join(name), 0);
    }

    for kind in [ChartKind::Treemap, ChartKind::Pie] {
        let png = output.path().join(format!("{kind}.png"));
        let tree =
            scan_and_render_with(input.path(), &png, kind, &config(300, 300), &PngSink).unwrap();
        assert_eq!(tree.total_size, 0);
        assert!(image::open(&png).is_ok());
    }
}

/// An empty directory renders as an image too.
#[test]
fn empty_directory_renders() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let png = output.path().join("empty.png");

    scan_and_render_with(input.path(), &png, ChartKind::Treemap, &config(64, 48), &PngSink)
        .unwrap();
    assert!(png.exists());
}

#[test]
fn missing_root_is_scan_error() {
    let output = TempDir::new().unwrap();
    let err = scan_and_render(
        Path::new("/path/does/not/exist"),
        &output.path().join("x.png"),
        ChartKind::Treemap,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Scan);
    assert!(matches!(err, Error::Scan(ScanError::NotFound(_))));
}

#[test]
fn unwritable_output_is_sink_error() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    build_test_tree(input.path());
    let png = output.path().join("missing-dir").join("out.png");

    let err = scan_and_render_with(input.path(), &png, ChartKind::Pie, &config(100, 100), &PngSink)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Sink);
    assert!(matches!(err, Error::Sink(SinkError::WriteFailed { .. })));
    assert!(!png.exists());
}

#[test]
fn invalid_canvas_is_render_error() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let png = output.path().join("x.png");

    let err = scan_and_render_with(input.path(), &png, ChartKind::Treemap, &config(0, 600), &PngSink)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Render(RenderError::InvalidCanvas { width: 0, height: 600 })
    ));
    assert!(!png.exists());
}

/// A tree scanned once can be rendered as both chart kinds.
#[test]
fn render_tree_reuses_scan() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    build_test_tree(input.path());

    let cfg = config(200, 200);
    let tree = scan_and_render_with(
        input.path(),
        &output.path().join("t.png"),
        ChartKind::Treemap,
        &cfg,
        &PngSink,
    )
    .unwrap();
    render_tree(&tree, &output.path().join("p.png"), ChartKind::Pie, &cfg, &PngSink).unwrap();
    assert!(output.path().join("p.png").exists());
}
