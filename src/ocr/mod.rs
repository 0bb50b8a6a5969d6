mod engine;

pub use engine::{
    ImageRotator, TesseractRecognizer, list_tesseract_languages, normalize_ocr_languages,
    parse_hocr_words,
};

/// One recognized word as reported by the OCR engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Word {
    pub text: String,
    /// `x_fsize`, 0 when the engine did not report it.
    pub font_size: i32,
    /// `x_wconf`, 0..=100.
    pub confidence: i32,
    /// Second `bbox` coordinate (top edge in page pixels), so large values
    /// mean the word sits low on the page.
    pub height: i32,
    pub is_strong: bool,
    pub is_em: bool,
    /// Ranking score, recomputed by the scorer on every run.
    pub weight: i32,
}

impl Word {
    pub fn new(text: &str, font_size: i32, confidence: i32, height: i32) -> Self {
        Self {
            text: text.to_string(),
            font_size,
            confidence,
            height,
            ..Self::default()
        }
    }

    pub fn has_alphanumeric(&self) -> bool {
        self.text.chars().any(char::is_alphanumeric)
    }

    pub fn alphanumeric_count(&self) -> usize {
        self.text.chars().filter(|ch| ch.is_alphanumeric()).count()
    }
}
