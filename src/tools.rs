//! Capability traits for the external collaborators of a title run.
//!
//! The rotation controller only talks to these traits, so the process-spawning
//! implementations ([`crate::raster`], [`crate::ocr`]) can be swapped for
//! in-memory fakes.

use anyhow::Result;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Produces one raster image for a source document inside `dest_dir`.
pub trait Rasterize {
    fn rasterize(&self, source: &Path, dest_dir: &Path) -> Result<PathBuf>;
}

/// Rotates a raster image by `angle` degrees, writing next to the input.
pub trait Rotate {
    fn rotate(&self, image: &Path, angle: u32) -> Result<PathBuf>;
}

/// Runs recognition on an image, writing its outputs under `prefix`.
pub trait Recognize {
    fn recognize(&self, image: &Path, prefix: &Path) -> Result<OcrArtifacts>;
}

/// Files an OCR attempt leaves behind.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OcrArtifacts {
    pub hocr: PathBuf,
    pub text: PathBuf,
    pub pdf: Option<PathBuf>,
    /// Ranked word dump written by the controller, not by the OCR engine.
    pub ranking: PathBuf,
}

impl OcrArtifacts {
    /// Paths tesseract derives from an output base name.
    pub fn at_prefix(prefix: &Path, with_pdf: bool) -> Self {
        Self {
            hocr: with_suffix(prefix, ".hocr"),
            text: with_suffix(prefix, ".txt"),
            pdf: with_pdf.then(|| with_suffix(prefix, ".pdf")),
            ranking: with_suffix(prefix, "-title.txt"),
        }
    }

    /// Outputs the OCR engine is expected to produce.
    pub fn outputs(&self) -> Vec<&Path> {
        let mut files = vec![self.hocr.as_path(), self.text.as_path()];
        if let Some(pdf) = self.pdf.as_deref() {
            files.push(pdf);
        }
        files
    }

    /// Everything that belongs to the attempt, including the ranking dump.
    pub fn files(&self) -> Vec<&Path> {
        let mut files = self.outputs();
        files.push(self.ranking.as_path());
        files
    }

    pub fn missing(&self) -> Vec<&Path> {
        self.outputs()
            .into_iter()
            .filter(|path| !path.is_file())
            .collect()
    }
}

pub(crate) fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Best-effort delete of scratch files; failures are only logged.
pub(crate) fn remove_files<'a>(paths: impl IntoIterator<Item = &'a Path>) {
    for path in paths {
        if let Err(err) = fs::remove_file(path) {
            debug!("could not remove {}: {}", path.display(), err);
        }
    }
}
