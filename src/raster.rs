use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

use crate::tools::Rasterize;

pub const PDF_MIME: &str = "application/pdf";

/// Renders the first page of a PDF with mutool, or pdftoppm as a fallback.
#[derive(Debug, Clone)]
pub struct PdfRasterizer {
    pub dpi: u32,
}

impl Rasterize for PdfRasterizer {
    fn rasterize(&self, source: &Path, dest_dir: &Path) -> Result<PathBuf> {
        let output_path = dest_dir.join("page.png");
        let dpi = self.dpi.to_string();
        if command_exists("mutool") {
            let output = Command::new("mutool")
                .arg("draw")
                .arg("-r")
                .arg(&dpi)
                .arg("-o")
                .arg(&output_path)
                .arg(source)
                .arg("1")
                .output()
                .with_context(|| "failed to run mutool")?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(anyhow!("mutool failed: {}", stderr.trim()));
            }
        } else if command_exists("pdftoppm") {
            let output = Command::new("pdftoppm")
                .arg("-png")
                .arg("-r")
                .arg(&dpi)
                .arg("-f")
                .arg("1")
                .arg("-l")
                .arg("1")
                .arg("-singlefile")
                .arg(source)
                .arg(dest_dir.join("page"))
                .output()
                .with_context(|| "failed to run pdftoppm")?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(anyhow!("pdftoppm failed: {}", stderr.trim()));
            }
        } else {
            return Err(anyhow!(
                "pdf rendering requires mutool or pdftoppm (install mupdf or poppler)"
            ));
        }

        if !output_path.is_file() {
            return Err(anyhow!(
                "pdf renderer produced no image at {}",
                output_path.display()
            ));
        }
        Ok(output_path)
    }
}

/// Accepts an already-rasterized scan and re-encodes it as PNG.
#[derive(Debug, Clone, Default)]
pub struct ImageSource;

impl Rasterize for ImageSource {
    fn rasterize(&self, source: &Path, dest_dir: &Path) -> Result<PathBuf> {
        let image = image::open(source)
            .with_context(|| format!("failed to decode image: {}", source.display()))?;
        let output_path = dest_dir.join("page.png");
        image
            .save_with_format(&output_path, image::ImageFormat::Png)
            .with_context(|| format!("failed to write image: {}", output_path.display()))?;
        Ok(output_path)
    }
}

/// Picks a rasterizer from the sniffed file type of the source.
#[derive(Debug, Clone)]
pub struct SourceRasterizer {
    pub dpi: u32,
}

impl Rasterize for SourceRasterizer {
    fn rasterize(&self, source: &Path, dest_dir: &Path) -> Result<PathBuf> {
        let bytes = fs::read(source)
            .with_context(|| format!("failed to read source: {}", source.display()))?;
        match sniff_mime(&bytes) {
            Some(PDF_MIME) => {
                info!("source: pdf");
                PdfRasterizer { dpi: self.dpi }.rasterize(source, dest_dir)
            }
            Some(mime) if mime.starts_with("image/") => {
                info!("source: image (mime={})", mime);
                ImageSource.rasterize(source, dest_dir)
            }
            Some(mime) => Err(anyhow!("unsupported source type: {}", mime)),
            None => Err(anyhow!(
                "unable to detect file type of '{}'",
                source.display()
            )),
        }
    }
}

pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let kind = infer::get(bytes)?;
    Some(kind.mime_type())
}

pub(crate) fn command_exists(cmd: &str) -> bool {
    let path = Path::new(cmd);
    if path.components().count() > 1 {
        return is_executable(path);
    }

    let Some(path_var) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&path_var).any(|dir| is_executable(&dir.join(cmd)))
}

fn is_executable(path: &Path) -> bool {
    let metadata = match fs::metadata(path) {
        Ok(value) => value,
        Err(_) => return false,
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
