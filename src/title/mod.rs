mod score;
mod synth;

pub use score::WordScorer;
pub use synth::{TitleGuess, rank_words, synthesize};

use crate::error::TitleError;
use crate::ocr::{self, Word};
use crate::settings::TitleSettings;

/// Scored words in rank order together with the title built from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub words: Vec<Word>,
    pub guess: TitleGuess,
}

impl Ranking {
    /// One JSON object per word, heaviest first, then a blank line and the
    /// title.
    pub fn render(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for word in &self.words {
            out.push_str(&serde_json::to_string(word)?);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.guess.title);
        out.push('\n');
        Ok(out)
    }
}

/// Markup → words → weights → title.
#[derive(Debug, Clone)]
pub struct TitleExtractor {
    scorer: WordScorer,
    word_confidence: i32,
    max_title_chars: usize,
}

impl TitleExtractor {
    pub fn new(settings: &TitleSettings) -> Self {
        Self {
            scorer: WordScorer::new(settings),
            word_confidence: settings.word_confidence,
            max_title_chars: settings.max_title_chars,
        }
    }

    pub fn extract_from_hocr(&self, hocr: &str) -> Result<TitleGuess, TitleError> {
        self.rank_hocr(hocr).map(|ranking| ranking.guess)
    }

    pub fn rank_hocr(&self, hocr: &str) -> Result<Ranking, TitleError> {
        let mut words = ocr::parse_hocr_words(hocr)?;
        self.scorer.score_all(&mut words);
        rank_words(&mut words);
        let guess = synthesize(words.clone(), self.word_confidence, self.max_title_chars);
        Ok(Ranking { words, guess })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{hocr_page, hocr_word};

    #[test]
    fn large_print_wins_over_address_block() {
        let settings = TitleSettings {
            denylist: vec!["Herrn".to_string()],
            ..TitleSettings::default()
        };
        let hocr = hocr_page(&[
            hocr_word("Herrn", "bbox 100 150 200 180; x_wconf 96; x_fsize 10"),
            hocr_word("Max", "bbox 210 150 260 180; x_wconf 96; x_fsize 10"),
            hocr_word("Kontoauszug", "bbox 100 400 700 480; x_wconf 91; x_fsize 28"),
            hocr_word("März", "bbox 720 400 900 480; x_wconf 88; x_fsize 28"),
            hocr_word("Seite", "bbox 100 3300 200 3330; x_wconf 95; x_fsize 10"),
        ]);
        let guess = TitleExtractor::new(&settings)
            .extract_from_hocr(&hocr)
            .expect("extract");
        assert_eq!(guess.title, "Kontoauszug März Max Seite Herrn");
        let expected = (96.0 * 5.0 + 96.0 * 3.0 + 91.0 * 11.0 + 88.0 * 4.0 + 95.0 * 5.0) / 28.0;
        assert!((guess.confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn ranking_lists_words_heaviest_first_then_title() {
        let hocr = hocr_page(&[
            hocr_word("Seite", "bbox 100 3300 200 3330; x_wconf 95; x_fsize 10"),
            hocr_word("Mahnung", "bbox 100 400 700 480; x_wconf 93; x_fsize 26"),
        ]);
        let ranking = TitleExtractor::new(&TitleSettings::default())
            .rank_hocr(&hocr)
            .expect("rank");
        let order: Vec<_> = ranking.words.iter().map(|w| w.weight).collect();
        assert_eq!(order, vec![260, 50]);

        let rendered = ranking.render().expect("render");
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("\"text\":\"Mahnung\""));
        assert!(lines[0].contains("\"weight\":260"));
        assert!(lines[1].contains("\"text\":\"Seite\""));
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Mahnung Seite");
    }

    #[test]
    fn parse_errors_surface() {
        let extractor = TitleExtractor::new(&TitleSettings::default());
        assert!(extractor.extract_from_hocr("<html>").is_err());
    }
}
