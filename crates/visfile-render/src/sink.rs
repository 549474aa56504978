/// Image sinks: persist a finished [`Frame`].
///
/// [`PngSink`] never leaves a half-written file at the destination: the
/// image is encoded into a temporary file in the same directory and then
/// renamed over the final path. The result carries the permissions a plain
/// write would: those of the file it replaces, or `0o666` under the umask.
use crate::canvas::Frame;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SinkError {
    fn write_failed(path: &Path, source: io::Error) -> Self {
        Self::WriteFailed {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Somewhere a frame can be written.
pub trait ImageSink {
    fn write(&self, frame: &Frame, path: &Path) -> Result<(), SinkError>;
}

/// PNG encoder with atomic replace.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngSink;

impl ImageSink for PngSink {
    fn write(&self, frame: &Frame, path: &Path) -> Result<(), SinkError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = create_temp(dir).map_err(|e| SinkError::write_failed(path, e))?;
        if let Ok(existing) = fs::metadata(path) {
            tmp.as_file()
                .set_permissions(existing.permissions())
                .map_err(|e| SinkError::write_failed(path, e))?;
        }

        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            PngEncoder::new(&mut out)
                .write_image(
                    frame.as_raw(),
                    frame.width(),
                    frame.height(),
                    ExtendedColorType::Rgba8,
                )
                .map_err(|e| SinkError::write_failed(path, io::Error::other(e)))?;
            out.flush().map_err(|e| SinkError::write_failed(path, e))?;
        }

        tmp.persist(path)
            .map_err(|e| SinkError::write_failed(path, e.error))?;
        tracing::debug!("Wrote {}x{} PNG to {}", frame.width(), frame.height(), path.display());
        Ok(())
    }
}

/// Temp file next to the destination, created with the default file mode.
fn create_temp(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix(".visfile").suffix(".png.tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}
