use std::collections::HashSet;

use crate::ocr::Word;
use crate::settings::TitleSettings;

/// Ranks words by how likely they belong to a document title.
#[derive(Debug, Clone)]
pub struct WordScorer {
    denylist: HashSet<String>,
    tall_height: i32,
    tall_penalty: i32,
    denylist_penalty: i32,
    strong_bonus: i32,
    em_bonus: i32,
}

impl WordScorer {
    pub fn new(settings: &TitleSettings) -> Self {
        Self {
            denylist: settings.denylist.iter().cloned().collect(),
            tall_height: settings.tall_height,
            tall_penalty: settings.tall_penalty,
            denylist_penalty: settings.denylist_penalty,
            strong_bonus: settings.strong_bonus,
            em_bonus: settings.em_bonus,
        }
    }

    pub fn weight(&self, word: &Word) -> i32 {
        let mut weight = word.font_size * 10;
        if word.height > self.tall_height {
            weight -= self.tall_penalty;
        }
        if self.denylist.contains(&word.text) {
            weight -= self.denylist_penalty;
        }
        if word.is_strong {
            weight += self.strong_bonus;
        }
        if word.is_em {
            weight += self.em_bonus;
        }
        weight
    }

    /// Recomputes `weight` on every word in place.
    pub fn score_all(&self, words: &mut [Word]) {
        for word in words.iter_mut() {
            word.weight = self.weight(word);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer(denylist: &[&str]) -> WordScorer {
        WordScorer::new(&TitleSettings {
            denylist: denylist.iter().map(|s| s.to_string()).collect(),
            ..TitleSettings::default()
        })
    }

    #[test]
    fn font_size_drives_weight() {
        let scorer = scorer(&[]);
        assert_eq!(scorer.weight(&Word::new("Vertrag", 18, 90, 300)), 180);
        assert_eq!(scorer.weight(&Word::new("x", 0, 90, 300)), 0);
    }

    #[test]
    fn low_words_lose_fifty() {
        let scorer = scorer(&[]);
        assert_eq!(scorer.weight(&Word::new("Seite", 12, 90, 1400)), 120);
        assert_eq!(scorer.weight(&Word::new("Seite", 12, 90, 1401)), 70);
    }

    #[test]
    fn denylisted_words_lose_hundred_regardless_of_size() {
        let scorer = scorer(&["Herr"]);
        assert_eq!(scorer.weight(&Word::new("Herr", 30, 90, 100)), 200);
        assert_eq!(scorer.weight(&Word::new("Herr", 0, 90, 100)), -100);
        // exact match only
        assert_eq!(scorer.weight(&Word::new("Herrn", 10, 90, 100)), 100);
    }

    #[test]
    fn penalties_stack() {
        let scorer = scorer(&["Frau"]);
        assert_eq!(scorer.weight(&Word::new("Frau", 10, 90, 2000)), 100 - 50 - 100);
    }

    #[test]
    fn emphasis_is_inert_by_default() {
        let scorer = scorer(&[]);
        let mut word = Word::new("Kündigung", 14, 90, 100);
        let plain = scorer.weight(&word);
        word.is_strong = true;
        word.is_em = true;
        assert_eq!(scorer.weight(&word), plain);
    }

    #[test]
    fn emphasis_bonus_applies_when_configured() {
        let scorer = WordScorer::new(&TitleSettings {
            strong_bonus: 15,
            em_bonus: 5,
            ..TitleSettings::default()
        });
        let mut word = Word::new("Mahnung", 10, 90, 100);
        word.is_strong = true;
        assert_eq!(scorer.weight(&word), 115);
        word.is_em = true;
        assert_eq!(scorer.weight(&word), 120);
    }

    #[test]
    fn weight_depends_only_on_size_height_and_text() {
        let scorer = scorer(&["Str."]);
        let a = Word::new("Str.", 11, 95, 1500);
        let mut b = Word::new("Str.", 11, 12, 1500);
        b.weight = 999;
        assert_eq!(scorer.weight(&a), scorer.weight(&b));
        assert_eq!(scorer.weight(&a), scorer.weight(&a));
    }
}
