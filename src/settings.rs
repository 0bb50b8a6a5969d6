use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub title: TitleSettings,
    pub rotation: RotationSettings,
    pub ocr: OcrSettings,
    pub raster_dpi: u32,
}

/// Scoring and synthesis knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleSettings {
    pub denylist: Vec<String>,
    pub tall_height: i32,
    pub tall_penalty: i32,
    pub denylist_penalty: i32,
    /// Added per bold word. Zero keeps emphasis out of the ranking.
    pub strong_bonus: i32,
    /// Added per emphasized word. Zero keeps emphasis out of the ranking.
    pub em_bonus: i32,
    pub word_confidence: i32,
    pub max_title_chars: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotationSettings {
    pub angles: Vec<u32>,
    pub good_enough: f64,
    pub selection: SelectionPolicy,
    pub directive: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrSettings {
    pub languages: String,
    pub psm: u32,
    pub dpi: u32,
    pub tessdata_prefix: Option<String>,
    pub render_pdf: bool,
}

/// How a finished candidate that is not good enough competes with the
/// provisional best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Keep the first usable result; only a good-enough result replaces it.
    #[default]
    First,
    /// Also replace the provisional best with any numerically better result.
    Highest,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: TitleSettings::default(),
            rotation: RotationSettings::default(),
            ocr: OcrSettings::default(),
            raster_dpi: 300,
        }
    }
}

impl Default for TitleSettings {
    fn default() -> Self {
        Self {
            denylist: Vec::new(),
            tall_height: 1400,
            tall_penalty: 50,
            denylist_penalty: 100,
            strong_bonus: 0,
            em_bonus: 0,
            word_confidence: 70,
            max_title_chars: 80,
        }
    }
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            angles: vec![0, 180, 90, 270],
            good_enough: 70.0,
            selection: SelectionPolicy::First,
            directive: "rotate".to_string(),
        }
    }
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            languages: "deu+eng".to_string(),
            psm: 1,
            dpi: 300,
            tessdata_prefix: None,
            render_pdf: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    title: Option<TitleFile>,
    rotation: Option<RotationFile>,
    ocr: Option<OcrFile>,
    raster: Option<RasterFile>,
}

#[derive(Debug, Default, Deserialize)]
struct TitleFile {
    denylist: Option<Vec<String>>,
    tall_height: Option<i32>,
    tall_penalty: Option<i32>,
    denylist_penalty: Option<i32>,
    strong_bonus: Option<i32>,
    em_bonus: Option<i32>,
    word_confidence: Option<i32>,
    max_title_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RotationFile {
    angles: Option<Vec<u32>>,
    good_enough: Option<f64>,
    selection: Option<SelectionPolicy>,
    directive: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrFile {
    languages: Option<String>,
    psm: Option<u32>,
    dpi: Option<u32>,
    tessdata_prefix: Option<String>,
    render_pdf: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RasterFile {
    dpi: Option<u32>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile = toml::from_str(DEFAULT_SETTINGS_TOML)
        .with_context(|| "failed to parse built-in settings")?;
    settings.merge(defaults);

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = paths::settings_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            settings.merge_file(&path)?;
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings: {}", path.display()))?;
        let parsed: SettingsFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(title) = incoming.title {
            if let Some(denylist) = title.denylist {
                self.title.denylist = denylist;
            }
            if let Some(height) = title.tall_height {
                self.title.tall_height = height;
            }
            if let Some(penalty) = title.tall_penalty {
                self.title.tall_penalty = penalty;
            }
            if let Some(penalty) = title.denylist_penalty {
                self.title.denylist_penalty = penalty;
            }
            if let Some(bonus) = title.strong_bonus {
                self.title.strong_bonus = bonus;
            }
            if let Some(bonus) = title.em_bonus {
                self.title.em_bonus = bonus;
            }
            if let Some(gate) = title.word_confidence {
                self.title.word_confidence = gate;
            }
            if let Some(limit) = title.max_title_chars {
                if limit > 0 {
                    self.title.max_title_chars = limit;
                }
            }
        }
        if let Some(rotation) = incoming.rotation {
            if let Some(angles) = rotation.angles {
                if !angles.is_empty() {
                    self.rotation.angles = angles.into_iter().map(|a| a % 360).collect();
                }
            }
            if let Some(threshold) = rotation.good_enough {
                self.rotation.good_enough = threshold;
            }
            if let Some(selection) = rotation.selection {
                self.rotation.selection = selection;
            }
            if let Some(directive) = rotation.directive {
                if !directive.trim().is_empty() {
                    self.rotation.directive = directive.trim().to_string();
                }
            }
        }
        if let Some(ocr) = incoming.ocr {
            if let Some(languages) = ocr.languages {
                if !languages.trim().is_empty() {
                    self.ocr.languages = languages;
                }
            }
            if let Some(psm) = ocr.psm {
                self.ocr.psm = psm;
            }
            if let Some(dpi) = ocr.dpi {
                if dpi > 0 {
                    self.ocr.dpi = dpi;
                }
            }
            if let Some(prefix) = ocr.tessdata_prefix {
                if !prefix.trim().is_empty() {
                    self.ocr.tessdata_prefix = Some(prefix);
                }
            }
            if let Some(render_pdf) = ocr.render_pdf {
                self.ocr.render_pdf = render_pdf;
            }
        }
        if let Some(raster) = incoming.raster {
            if let Some(dpi) = raster.dpi {
                if dpi > 0 {
                    self.raster_dpi = dpi;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn builtin_settings_parse() {
        let parsed: SettingsFile = toml::from_str(DEFAULT_SETTINGS_TOML).expect("parse defaults");
        let mut settings = Settings::default();
        settings.merge(parsed);
        assert!(settings.title.denylist.iter().any(|word| word == "Herr"));
        assert!(settings.title.denylist.iter().any(|word| word == "8052"));
        assert_eq!(settings.rotation.angles, vec![0, 180, 90, 270]);
        assert_eq!(settings.rotation.selection, SelectionPolicy::First);
        assert_eq!(settings.title.strong_bonus, 0);
        assert_eq!(settings.title.em_bonus, 0);
    }

    #[test]
    fn later_file_overrides_single_keys() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("extra.toml");
        fs::write(
            &path,
            "[rotation]\nselection = \"highest\"\nangles = [450]\n[title]\nmax_title_chars = 40\n",
        )
        .expect("write settings");

        let mut settings = Settings::default();
        settings.merge_file(&path).expect("merge");
        assert_eq!(settings.rotation.selection, SelectionPolicy::Highest);
        assert_eq!(settings.rotation.angles, vec![90]);
        assert_eq!(settings.title.max_title_chars, 40);
        assert_eq!(settings.title.word_confidence, 70);
        assert_eq!(settings.ocr.languages, "deu+eng");
    }

    #[test]
    fn missing_extra_settings_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        let err = load_settings(Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("settings file not found"));
    }
}
