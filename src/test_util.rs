use anyhow::{Result, anyhow};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::tools::{OcrArtifacts, Rasterize, Recognize, Rotate};

pub(crate) fn hocr_word(text: &str, title: &str) -> String {
    format!("<span class='ocrx_word' title='{}'>{}</span>", title, text)
}

pub(crate) fn hocr_page(words: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="en" lang="en">
 <head><title></title><meta name='ocr-system' content='tesseract' /></head>
 <body>
  <div class='ocr_page' id='page_1' title='image "page.png"; bbox 0 0 2480 3508; ppageno 0'>
   <span class='ocr_line' id='line_1_1' title='bbox 0 0 2480 100'>
    {}
   </span>
  </div>
 </body>
</html>
"#,
        words.join("\n    ")
    )
}

/// A page whose only word is `title` at the given confidence.
pub(crate) fn single_word_page(title: &str, confidence: i32) -> String {
    hocr_page(&[hocr_word(
        title,
        &format!("bbox 10 10 200 60; x_wconf {}; x_fsize 20", confidence),
    )])
}

pub(crate) struct FakeRasterizer;

impl Rasterize for FakeRasterizer {
    fn rasterize(&self, _source: &Path, dest_dir: &Path) -> Result<PathBuf> {
        let page = dest_dir.join("page.png");
        fs::write(&page, b"raster")?;
        Ok(page)
    }
}

#[derive(Default)]
pub(crate) struct FakeRotator {
    pub(crate) angles: RefCell<Vec<u32>>,
    pub(crate) fail: bool,
}

impl Rotate for FakeRotator {
    fn rotate(&self, image: &Path, angle: u32) -> Result<PathBuf> {
        if self.fail {
            return Err(anyhow!("convert exited with status 1"));
        }
        self.angles.borrow_mut().push(angle);
        let output = image.with_file_name(format!("page-rot{}.png", angle));
        fs::write(&output, b"rotated")?;
        Ok(output)
    }
}

/// Hands out scripted hOCR documents in call order.
pub(crate) struct ScriptedRecognizer {
    outputs: RefCell<VecDeque<String>>,
    pub(crate) prefixes: RefCell<Vec<PathBuf>>,
}

impl ScriptedRecognizer {
    pub(crate) fn new(outputs: Vec<String>) -> Self {
        Self {
            outputs: RefCell::new(outputs.into()),
            prefixes: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.prefixes.borrow().len()
    }
}

impl Recognize for ScriptedRecognizer {
    fn recognize(&self, _image: &Path, prefix: &Path) -> Result<OcrArtifacts> {
        self.prefixes.borrow_mut().push(prefix.to_path_buf());
        let hocr = self
            .outputs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("tesseract produced no output"))?;
        let artifacts = OcrArtifacts::at_prefix(prefix, false);
        fs::write(&artifacts.hocr, hocr)?;
        fs::write(&artifacts.text, "")?;
        Ok(artifacts)
    }
}
