mod parse;
mod rotate;
mod tesseract;

pub use parse::parse_hocr_words;
pub use rotate::ImageRotator;
pub use tesseract::{TesseractRecognizer, list_tesseract_languages, normalize_ocr_languages};
