use std::path::{Path, PathBuf};

const BASE_DIR_ENV: &str = "SCANTITLE_DIR";

pub(crate) fn settings_dir() -> Option<PathBuf> {
    if let Some(dir) = base_dir_override() {
        return Some(dir);
    }
    default_base_dir()
}

/// Default location for per-document OCR artifacts.
pub(crate) fn work_dir() -> PathBuf {
    settings_dir()
        .map(|dir| dir.join("work"))
        .unwrap_or_else(|| PathBuf::from(".scantitle/work"))
}

/// Artifact prefix for one rotation attempt, e.g. `work/scan-rot180`.
pub fn candidate_prefix(work_dir: &Path, stem: &str, angle: u32) -> PathBuf {
    work_dir.join(format!("{}-rot{}", stem, angle))
}

/// File stem used for artifact names; falls back to `document`.
pub fn document_stem(display_name: &str) -> String {
    let stem = Path::new(display_name.trim())
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("");
    let cleaned: String = stem
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

fn base_dir_override() -> Option<PathBuf> {
    std::env::var(BASE_DIR_ENV)
        .ok()
        .and_then(|value| normalize_dir(&value))
}

fn default_base_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".scantitle"))
        }
    })
}

fn normalize_dir(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = expand_tilde(trimmed);
    let mut normalized = PathBuf::new();
    for component in Path::new(&expanded).components() {
        normalized.push(component.as_os_str());
    }
    Some(normalized)
}

fn expand_tilde(value: &str) -> String {
    if value == "~" || value.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            let home = home.trim();
            if home.is_empty() {
                return value.to_string();
            }
            if value == "~" {
                return home.to_string();
            }
            return format!("{}{}", home, &value[1..]);
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_is_sanitized() {
        assert_eq!(document_stem("Scan 2024.pdf"), "Scan_2024");
        assert_eq!(document_stem("invoice_rotate90.pdf"), "invoice_rotate90");
        assert_eq!(document_stem(""), "document");
    }

    #[test]
    fn prefix_embeds_angle() {
        let prefix = candidate_prefix(Path::new("/tmp/work"), "scan", 180);
        assert_eq!(prefix, PathBuf::from("/tmp/work/scan-rot180"));
    }
}
