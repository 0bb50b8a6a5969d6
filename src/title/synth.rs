use crate::ocr::Word;

/// Title candidate for one OCR attempt.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TitleGuess {
    pub title: String,
    /// Mean word confidence, sampled once per alphanumeric character.
    pub confidence: f64,
}

impl TitleGuess {
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            confidence: 0.0,
        }
    }
}

/// Heaviest first; equal weights keep reading order.
pub fn rank_words(words: &mut [Word]) {
    words.sort_by(|a, b| b.weight.cmp(&a.weight));
}

/// Builds a title from scored words.
///
/// Words are visited heaviest first (stable, so equal weights keep reading
/// order). Every word feeds the confidence average; only words with an
/// alphanumeric character and confidence above `word_confidence` make it
/// into the title. Once the title grows past `max_chars` the word that crossed
/// the limit is kept whole and the rest are dropped.
pub fn synthesize(mut words: Vec<Word>, word_confidence: i32, max_chars: usize) -> TitleGuess {
    rank_words(&mut words);

    let mut title = String::new();
    let mut title_chars = 0usize;
    let mut samples: Vec<i32> = Vec::new();
    for word in &words {
        let alnum = word.alphanumeric_count();
        samples.extend(std::iter::repeat_n(word.confidence, alnum));

        if alnum > 0 && word.confidence > word_confidence {
            title.push_str(&word.text);
            title.push(' ');
            title_chars += word.text.chars().count() + 1;
            if title_chars > max_chars {
                break;
            }
        }
    }

    let confidence = if samples.is_empty() {
        0.0
    } else {
        samples.iter().map(|&value| f64::from(value)).sum::<f64>() / samples.len() as f64
    };

    TitleGuess {
        title: title.trim_end().to_string(),
        confidence,
    }
}
