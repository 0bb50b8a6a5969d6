use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod error;
pub mod logging;
pub mod ocr;
pub mod paths;
pub mod raster;
pub mod rotation;
pub mod settings;
#[cfg(test)]
mod test_util;
pub mod title;
pub mod tools;

pub use error::{Stage, TitleError};
pub use rotation::{Attempt, RotationController, Selection, candidate_angles, required_angle};
pub use title::{Ranking, TitleExtractor, TitleGuess, WordScorer};

#[derive(Debug, Clone)]
pub struct Config {
    pub source: PathBuf,
    /// Display name used for the rotation directive and artifact names.
    pub name: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub settings_path: Option<PathBuf>,
    pub angle: Option<u32>,
    pub lang: Option<String>,
    pub json: bool,
    pub keep_all: bool,
    pub show_languages: bool,
}

pub fn run(config: Config) -> Result<String> {
    if config.show_languages {
        return Ok(ocr::list_tesseract_languages()?.join("\n"));
    }

    let settings = settings::load_settings(config.settings_path.as_deref())?;
    if !config.source.is_file() {
        return Err(anyhow!("source not found: {}", config.source.display()));
    }
    let display_name = config
        .name
        .clone()
        .or_else(|| {
            config
                .source
                .file_name()
                .and_then(|value| value.to_str())
                .map(|value| value.to_string())
        })
        .unwrap_or_default();

    let angles = match config.angle {
        Some(angle) => vec![angle % 360],
        None => candidate_angles(&display_name, &settings.rotation),
    };
    info!("candidates for {:?}: {:?}", display_name, angles);

    let work_dir = resolve_work_dir(config.out_dir.as_deref(), &display_name);
    fs::create_dir_all(&work_dir)
        .with_context(|| format!("failed to create work dir: {}", work_dir.display()))?;

    let requested = config.lang.as_deref().unwrap_or(settings.ocr.languages.as_str());
    let languages = ocr::normalize_ocr_languages(requested)?;

    let controller = RotationController::new(
        raster::SourceRasterizer {
            dpi: settings.raster_dpi,
        },
        ocr::ImageRotator,
        ocr::TesseractRecognizer::new(languages, &settings.ocr),
        &settings.title,
        &settings.rotation,
    )
    .keep_all(config.keep_all);

    let selection = controller
        .run(&config.source, &display_name, &angles, &work_dir)
        .with_context(|| format!("failed to extract title from {}", config.source.display()))?;

    if config.json {
        serde_json::to_string_pretty(&selection).with_context(|| "failed to encode selection")
    } else {
        Ok(format_selection(&selection))
    }
}

/// `--out-dir` when given, otherwise a per-document directory under the
/// persistent work dir so the winner's artifacts outlive the run.
fn resolve_work_dir(out_dir: Option<&Path>, display_name: &str) -> PathBuf {
    match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => paths::work_dir().join(paths::document_stem(display_name)),
    }
}

pub fn format_selection(selection: &Selection) -> String {
    format!(
        "{}\t{:.2}\t{}\t{}",
        selection.title,
        selection.confidence,
        selection.angle,
        selection.prefix.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_dir_wins_over_default_work_dir() {
        let dir = resolve_work_dir(Some(Path::new("/tmp/scans")), "Miete 2024.pdf");
        assert_eq!(dir, PathBuf::from("/tmp/scans"));
    }

    #[test]
    fn default_work_dir_is_per_document() {
        let dir = resolve_work_dir(None, "Miete 2024.pdf");
        assert!(dir.ends_with(Path::new("work").join("Miete_2024")));
    }
}
