//! Accept/reject policy for a single candidate patch
//!
//! A candidate must first be covered by tissue in at least
//! [`TISSUE_THRESHOLD`] of its cells. When annotations are configured it must
//! then match its class's annotation pixel value in at least the run's
//! annotation threshold. A fraction equal to a threshold passes.

use crate::io::configuration::TISSUE_THRESHOLD;
use crate::io::error::Result;
use crate::sampling::frame::PatchRecord;
use crate::sampling::sources::{
    AnnotationSource, ClassLabel, LabelReader, PatchRequest, Seed, SlideSource, TissueSource,
    fraction_matching,
};

/// Why a candidate was turned down
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rejection {
    /// Too little tissue under the patch
    TissueCoverage {
        /// Measured tissue fraction
        fraction: f64,
    },
    /// Too few annotation pixels of the sampled class
    AnnotationPurity {
        /// Measured fraction of matching annotation pixels
        fraction: f64,
    },
}

/// Outcome of evaluating one seed
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    /// Patch passed every test
    Accepted(PatchRecord),
    /// Patch failed a test
    Rejected(Rejection),
}

impl Verdict {
    /// Whether the patch was accepted
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Annotation mask paired with the reader that decodes its pixels
#[derive(Clone, Copy)]
pub struct AnnotationCheck<'a> {
    /// Annotation patch provider
    pub source: &'a dyn AnnotationSource,
    /// Class to pixel translation
    pub reader: &'a dyn LabelReader,
    /// Minimum fraction of matching pixels
    pub threshold: f64,
}

/// Evaluates candidates for one run's magnification and patch size
pub struct PatchEvaluator<'a> {
    slide: &'a dyn SlideSource,
    tissue: &'a dyn TissueSource,
    annotation: Option<AnnotationCheck<'a>>,
    magnification: f64,
    patch_size: u32,
}

impl<'a> PatchEvaluator<'a> {
    /// Bind the sources and scanning parameters of a run
    pub fn new(
        slide: &'a dyn SlideSource,
        tissue: &'a dyn TissueSource,
        annotation: Option<AnnotationCheck<'a>>,
        magnification: f64,
        patch_size: u32,
    ) -> Self {
        Self {
            slide,
            tissue,
            annotation,
            magnification,
            patch_size,
        }
    }

    /// Evaluate the patch whose top-left corner is `seed`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A mask patch cannot be read
    /// - The label reader has no pixel value for `class`
    pub fn evaluate(&self, class: ClassLabel, seed: Seed) -> Result<Verdict> {
        let request = PatchRequest::at_seed(seed, self.magnification, self.patch_size);

        let tissue_patch = self.tissue.label_patch(&request)?;
        let coverage = fraction_matching(&tissue_patch, |value| value != 0);
        if coverage < TISSUE_THRESHOLD {
            return Ok(Verdict::Rejected(Rejection::TissueCoverage {
                fraction: coverage,
            }));
        }

        if let Some(check) = self.annotation {
            let pixel = check.reader.label_to_pixel(class)?;
            let annotation_patch = check.source.label_patch(&request)?;
            let purity = fraction_matching(&annotation_patch, |value| value == pixel);
            if purity < check.threshold {
                return Ok(Verdict::Rejected(Rejection::AnnotationPurity {
                    fraction: purity,
                }));
            }
        }

        Ok(Verdict::Accepted(self.record(class, &request)))
    }

    fn record(&self, class: ClassLabel, request: &PatchRequest) -> PatchRecord {
        PatchRecord {
            slide_id: self.slide.id().to_string(),
            x: request.x,
            y: request.y,
            class,
            magnification: self.magnification,
            size: self.patch_size,
            parent: self.slide.path().to_path_buf(),
            level0: self.slide.level0(),
        }
    }
}
