use std::fmt;
use thiserror::Error;

/// Which external collaborator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Rasterize,
    Rotate,
    Recognize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Rasterize => "rasterize",
            Stage::Rotate => "rotate",
            Stage::Recognize => "recognize",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum TitleError {
    /// hOCR markup is malformed or lacks the first page.
    #[error("hocr parse error: {reason}")]
    Parse { reason: String },

    /// A rasterize/rotate/OCR step failed or left no output behind.
    #[error("{stage} failed{}: {reason}", candidate_label(.angle))]
    ExternalTool {
        stage: Stage,
        angle: Option<u32>,
        reason: String,
    },

    #[error("no rotation candidates configured")]
    NoCandidates,
}

impl TitleError {
    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        TitleError::Parse {
            reason: reason.into(),
        }
    }

    pub(crate) fn tool(stage: Stage, angle: Option<u32>, err: &anyhow::Error) -> Self {
        TitleError::ExternalTool {
            stage,
            angle,
            reason: format!("{:#}", err),
        }
    }
}

fn candidate_label(angle: &Option<u32>) -> String {
    match angle {
        Some(angle) => format!(" for candidate {}°", angle),
        None => String::new(),
    }
}
