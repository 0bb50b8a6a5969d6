use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use crate::settings::OcrSettings;
use crate::tools::{OcrArtifacts, Recognize};

pub fn list_tesseract_languages() -> Result<Vec<String>> {
    let output = Command::new("tesseract")
        .arg("--list-langs")
        .output()
        .with_context(|| "failed to run tesseract --list-langs")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract --list-langs failed: {}", stderr.trim()));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_language_list(&stdout))
}

fn parse_language_list(stdout: &str) -> Vec<String> {
    let mut langs = Vec::new();
    for (idx, line) in stdout.lines().enumerate() {
        if idx == 0 {
            continue;
        }
        let value = line.trim();
        if !value.is_empty() {
            langs.push(value.to_string());
        }
    }
    langs
}

/// Keeps the requested languages that tesseract has installed, joined with `+`.
/// If the installed list cannot be read the request is passed through.
pub fn normalize_ocr_languages(requested: &str) -> Result<String> {
    let available = match list_tesseract_languages() {
        Ok(list) => list,
        Err(_) => {
            let trimmed = requested.trim();
            if trimmed.is_empty() {
                return Err(anyhow!("ocr languages is empty"));
            }
            return Ok(trimmed.to_string());
        }
    };
    select_languages(requested, &available)
}

fn select_languages(requested: &str, available: &[String]) -> Result<String> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("ocr languages is empty"));
    }

    let mut chosen = Vec::new();
    let mut missing = Vec::new();
    for raw in trimmed.split(['+', ',', ' ']) {
        let lang = raw.trim();
        if lang.is_empty() {
            continue;
        }
        if available.iter().any(|value| value == lang) {
            chosen.push(lang.to_string());
        } else {
            missing.push(lang.to_string());
        }
    }

    if chosen.is_empty() {
        return Err(anyhow!(
            "ocr language(s) not available: {} (available: {})",
            missing.join(", "),
            available.join(", ")
        ));
    }
    if !missing.is_empty() {
        warn!(
            "ocr language(s) not available: {} (available: {})",
            missing.join(", "),
            available.join(", ")
        );
    }

    Ok(chosen.join("+"))
}

/// Runs the `tesseract` binary, asking for hOCR with font info, plain text
/// and optionally a searchable PDF.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    languages: String,
    psm: u32,
    dpi: u32,
    tessdata_prefix: Option<String>,
    render_pdf: bool,
}

impl TesseractRecognizer {
    pub fn new(languages: String, settings: &OcrSettings) -> Self {
        Self {
            languages,
            psm: settings.psm,
            dpi: settings.dpi,
            tessdata_prefix: settings.tessdata_prefix.clone(),
            render_pdf: settings.render_pdf,
        }
    }

    fn command(&self, image: &Path, prefix: &Path) -> Command {
        let mut command = Command::new("tesseract");
        command
            .arg(image)
            .arg(prefix)
            .arg("-l")
            .arg(&self.languages)
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("--dpi")
            .arg(self.dpi.to_string())
            .arg("-c")
            .arg("hocr_font_info=1")
            .arg("hocr")
            .arg("txt");
        if self.render_pdf {
            command.arg("pdf");
        }
        if let Some(prefix) = self.tessdata_prefix.as_deref() {
            command.env("TESSDATA_PREFIX", prefix);
        }
        command
    }
}

impl Recognize for TesseractRecognizer {
    fn recognize(&self, image: &Path, prefix: &Path) -> Result<OcrArtifacts> {
        debug!(
            "tesseract {} -> {} (lang={}, psm={})",
            image.display(),
            prefix.display(),
            self.languages,
            self.psm
        );
        let output = self
            .command(image, prefix)
            .output()
            .with_context(|| "failed to run tesseract (is it installed?)")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract failed: {}", stderr.trim()));
        }

        let artifacts = OcrArtifacts::at_prefix(prefix, self.render_pdf);
        let missing = artifacts.missing();
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
            return Err(anyhow!("tesseract produced no {}", names.join(", ")));
        }
        Ok(artifacts)
    }
}
