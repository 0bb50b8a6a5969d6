//! Rotation retry: one OCR attempt per candidate angle, keeping the best
//! title and stopping early once a result is good enough.

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Stage, TitleError};
use crate::paths;
use crate::settings::{RotationSettings, SelectionPolicy, TitleSettings};
use crate::title::{Ranking, TitleExtractor, TitleGuess};
use crate::tools::{OcrArtifacts, Rasterize, Recognize, Rotate, remove_files};

/// Angle requested by a `_<directive><digits>` marker in a document name,
/// e.g. `scan_rotate90.pdf`. The match is case-sensitive and needs the
/// underscore.
pub fn required_angle(display_name: &str, directive: &str) -> Option<u32> {
    let pattern = format!(r"_{}(\d+)", regex::escape(directive));
    let regex = Regex::new(&pattern).ok()?;
    let digits = regex.captures(display_name)?.get(1)?.as_str();
    digits.parse::<u32>().ok().map(|angle| angle % 360)
}

/// Angles to try for a document, in order.
pub fn candidate_angles(display_name: &str, settings: &RotationSettings) -> Vec<u32> {
    match required_angle(display_name, &settings.directive) {
        Some(angle) => vec![angle],
        None => settings.angles.clone(),
    }
}

/// Outcome of one candidate, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Attempt {
    pub angle: u32,
    pub title: String,
    pub confidence: f64,
    pub parsed: bool,
}

/// The winning candidate. Its artifacts stay on disk for the caller.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Selection {
    pub title: String,
    pub confidence: f64,
    pub angle: u32,
    pub prefix: PathBuf,
    pub artifacts: OcrArtifacts,
    pub attempts: Vec<Attempt>,
}

struct Candidate {
    angle: u32,
    guess: TitleGuess,
    prefix: PathBuf,
    artifacts: OcrArtifacts,
    rotated_image: Option<PathBuf>,
}

pub struct RotationController<R, T, C> {
    rasterizer: R,
    rotator: T,
    recognizer: C,
    extractor: TitleExtractor,
    good_enough: f64,
    selection: SelectionPolicy,
    keep_all: bool,
}

impl<R, T, C> RotationController<R, T, C>
where
    R: Rasterize,
    T: Rotate,
    C: Recognize,
{
    pub fn new(
        rasterizer: R,
        rotator: T,
        recognizer: C,
        title: &TitleSettings,
        rotation: &RotationSettings,
    ) -> Self {
        Self {
            rasterizer,
            rotator,
            recognizer,
            extractor: TitleExtractor::new(title),
            good_enough: rotation.good_enough,
            selection: rotation.selection,
            keep_all: false,
        }
    }

    /// Keep the artifacts of losing candidates too.
    pub fn keep_all(mut self, keep_all: bool) -> Self {
        self.keep_all = keep_all;
        self
    }

    pub fn rotator(&self) -> &T {
        &self.rotator
    }

    pub fn recognizer(&self) -> &C {
        &self.recognizer
    }

    /// Rasterizes `source` once into `work_dir`, then tries each angle in
    /// order. Tool failures abort the run; unreadable markup only zeroes that
    /// candidate unless no candidate parses at all.
    pub fn run(
        &self,
        source: &Path,
        display_name: &str,
        angles: &[u32],
        work_dir: &Path,
    ) -> Result<Selection> {
        if angles.is_empty() {
            return Err(TitleError::NoCandidates.into());
        }
        let stem = paths::document_stem(display_name);
        let page = self
            .rasterizer
            .rasterize(source, work_dir)
            .map_err(|err| TitleError::tool(Stage::Rasterize, None, &err))?;
        info!("rasterized {} -> {}", source.display(), page.display());

        let mut best: Option<Candidate> = None;
        let mut attempts = Vec::new();
        let mut parse_failure: Option<TitleError> = None;
        let mut parsed_any = false;

        for &angle in angles {
            let rotated_image = if angle == 0 {
                None
            } else {
                Some(
                    self.rotator
                        .rotate(&page, angle)
                        .map_err(|err| TitleError::tool(Stage::Rotate, Some(angle), &err))?,
                )
            };
            let image = rotated_image.as_deref().unwrap_or(page.as_path());
            let prefix = paths::candidate_prefix(work_dir, &stem, angle);
            let artifacts = self
                .recognizer
                .recognize(image, &prefix)
                .map_err(|err| TitleError::tool(Stage::Recognize, Some(angle), &err))?;
            let markup = fs::read_to_string(&artifacts.hocr).map_err(|err| {
                TitleError::ExternalTool {
                    stage: Stage::Recognize,
                    angle: Some(angle),
                    reason: format!("failed to read {}: {}", artifacts.hocr.display(), err),
                }
            })?;

            let (guess, parsed) = match self.extractor.rank_hocr(&markup) {
                Ok(ranking) => {
                    write_ranking(&artifacts.ranking, &ranking)?;
                    (ranking.guess, true)
                }
                Err(err) => {
                    warn!("candidate {}°: {}", angle, err);
                    parse_failure = Some(err);
                    (TitleGuess::empty(), false)
                }
            };
            parsed_any |= parsed;
            info!(
                "candidate {}°: confidence {:.1}, title {:?}",
                angle, guess.confidence, guess.title
            );
            attempts.push(Attempt {
                angle,
                title: guess.title.clone(),
                confidence: guess.confidence,
                parsed,
            });

            let good_enough = guess.confidence > self.good_enough;
            let candidate = Candidate {
                angle,
                guess,
                prefix,
                artifacts,
                rotated_image,
            };
            if replaces_best(
                best.as_ref().map(|c| &c.guess),
                &candidate.guess,
                good_enough,
                self.selection,
            ) {
                if let Some(previous) = best.replace(candidate) {
                    self.discard(previous);
                }
            } else {
                self.discard(candidate);
            }
            if good_enough {
                info!("candidate {}° is good enough; stopping", angle);
                break;
            }
        }

        if !parsed_any {
            if let Some(err) = parse_failure {
                return Err(err.into());
            }
        }
        let best = best.ok_or(TitleError::NoCandidates)?;
        Ok(Selection {
            title: best.guess.title,
            confidence: best.guess.confidence,
            angle: best.angle,
            prefix: best.prefix,
            artifacts: best.artifacts,
            attempts,
        })
    }

    fn discard(&self, candidate: Candidate) {
        if self.keep_all {
            return;
        }
        debug!("discarding artifacts of candidate {}°", candidate.angle);
        remove_files(candidate.artifacts.files());
        if let Some(image) = candidate.rotated_image.as_deref() {
            remove_files([image]);
        }
    }
}

fn write_ranking(path: &Path, ranking: &Ranking) -> Result<()> {
    let rendered = ranking
        .render()
        .with_context(|| "failed to encode title ranking")?;
    fs::write(path, rendered)
        .with_context(|| format!("failed to write title ranking: {}", path.display()))?;
    debug!("wrote title ranking {}", path.display());
    Ok(())
}

/// Whether a finished candidate takes over the provisional best.
///
/// The first result always does and a good-enough result always does. After
/// that a weaker result only wins while the provisional title is empty, unless
/// the policy is [`SelectionPolicy::Highest`].
fn replaces_best(
    best: Option<&TitleGuess>,
    guess: &TitleGuess,
    good_enough: bool,
    policy: SelectionPolicy,
) -> bool {
    let Some(best) = best else {
        return true;
    };
    if good_enough {
        return true;
    }
    if best.title.is_empty() {
        return true;
    }
    match policy {
        SelectionPolicy::First => false,
        SelectionPolicy::Highest => guess.confidence > best.confidence,
    }
}
