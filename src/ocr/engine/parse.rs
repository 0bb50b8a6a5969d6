use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::TitleError;
use crate::ocr::Word;

const FIRST_PAGE_ID: &str = "page_1";
const WORD_CLASS: &str = "ocrx_word";

#[derive(Default)]
struct WordBuilder {
    text: String,
    font_size: i32,
    confidence: i32,
    height: i32,
    is_strong: bool,
    is_em: bool,
}

impl WordBuilder {
    fn from_title(title: &str) -> Result<Self, TitleError> {
        let mut word = WordBuilder::default();
        for (name, value) in parse_properties(title)? {
            match name {
                "x_fsize" => word.font_size = parse_int(value),
                "x_wconf" => word.confidence = parse_int(value),
                "bbox" => word.height = value.split_whitespace().nth(1).map(parse_int).unwrap_or(0),
                _ => {}
            }
        }
        Ok(word)
    }

    fn mark_inline(&mut self, name: &[u8]) {
        match name {
            b"strong" | b"b" => self.is_strong = true,
            b"em" | b"i" => self.is_em = true,
            _ => {}
        }
    }

    fn finish(self) -> Word {
        Word {
            text: self.text.trim().to_string(),
            font_size: self.font_size,
            confidence: self.confidence,
            height: self.height,
            is_strong: self.is_strong,
            is_em: self.is_em,
            weight: 0,
        }
    }
}

/// Parses tesseract hOCR into words of the first page, in document order.
pub fn parse_hocr_words(hocr: &str) -> Result<Vec<Word>, TitleError> {
    let mut reader = Reader::from_str(hocr);
    reader.trim_text(false);

    let mut words = Vec::new();
    let mut depth = 0usize;
    let mut page_depth: Option<usize> = None;
    let mut page_seen = false;
    let mut current: Option<(WordBuilder, usize)> = None;

    loop {
        let event = reader.read_event().map_err(|err| {
            TitleError::parse(format!("{} (at byte {})", err, reader.buffer_position()))
        })?;
        match event {
            Event::Eof => break,
            Event::Start(start) => {
                depth += 1;
                if let Some((word, _)) = current.as_mut() {
                    word.mark_inline(start.local_name().as_ref());
                } else if !page_seen && is_first_page(&start)? {
                    page_seen = true;
                    page_depth = Some(depth);
                } else if page_depth.is_some() && is_word(&start)? {
                    current = Some((word_from_element(&start)?, depth));
                }
            }
            Event::Empty(start) => {
                if let Some((word, _)) = current.as_mut() {
                    word.mark_inline(start.local_name().as_ref());
                } else if !page_seen && is_first_page(&start)? {
                    page_seen = true;
                } else if page_depth.is_some() && is_word(&start)? {
                    words.push(word_from_element(&start)?.finish());
                }
            }
            Event::Text(text) => {
                if let Some((word, _)) = current.as_mut() {
                    let decoded = text
                        .unescape()
                        .map_err(|err| TitleError::parse(format!("bad word text: {}", err)))?;
                    word.text.push_str(&decoded);
                }
            }
            Event::CData(cdata) => {
                if let Some((word, _)) = current.as_mut() {
                    let raw = std::str::from_utf8(&cdata)
                        .map_err(|err| TitleError::parse(format!("bad word text: {}", err)))?;
                    word.text.push_str(raw);
                }
            }
            Event::End(_) => {
                if current.as_ref().is_some_and(|(_, at)| *at == depth) {
                    if let Some((word, _)) = current.take() {
                        words.push(word.finish());
                    }
                }
                if page_depth == Some(depth) {
                    page_depth = None;
                }
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| TitleError::parse("unbalanced closing tag"))?;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(TitleError::parse("document ended inside an open element"));
    }
    if !page_seen {
        return Err(TitleError::parse(format!(
            "no element with id `{}`",
            FIRST_PAGE_ID
        )));
    }
    Ok(words)
}

fn word_from_element(start: &BytesStart<'_>) -> Result<WordBuilder, TitleError> {
    let title = attribute(start, b"title")?
        .ok_or_else(|| TitleError::parse("word without a `title` attribute"))?;
    WordBuilder::from_title(&title)
}

fn is_first_page(start: &BytesStart<'_>) -> Result<bool, TitleError> {
    Ok(attribute(start, b"id")?.as_deref() == Some(FIRST_PAGE_ID))
}

fn is_word(start: &BytesStart<'_>) -> Result<bool, TitleError> {
    Ok(attribute(start, b"class")?
        .map(|class| class.split_whitespace().any(|value| value == WORD_CLASS))
        .unwrap_or(false))
}

fn attribute(start: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, TitleError> {
    for attr in start.attributes() {
        let attr = attr.map_err(|err| TitleError::parse(format!("bad attribute: {}", err)))?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|err| TitleError::parse(format!("bad attribute value: {}", err)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Splits `key value; key value` into pairs. An empty segment or a property
/// without a value is rejected.
fn parse_properties(title: &str) -> Result<Vec<(&str, &str)>, TitleError> {
    let mut properties = Vec::new();
    for raw in title.split(';') {
        let property = raw.trim_start();
        if property.is_empty() {
            return Err(TitleError::parse(format!("empty property in `{}`", title)));
        }
        match property.split_once(' ') {
            Some((name, value)) if !value.trim().is_empty() => properties.push((name, value)),
            _ => {
                return Err(TitleError::parse(format!(
                    "property `{}` has no value",
                    property.trim()
                )));
            }
        }
    }
    Ok(properties)
}

/// Whole numbers only; anything else reads as 0.
fn parse_int(value: &str) -> i32 {
    value.trim().parse::<i32>().unwrap_or(0)
}
