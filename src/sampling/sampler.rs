//! Two-phase sampling orchestration for one slide
//!
//! `prepare` fixes magnification and patch size and plans every class's
//! seeds. `sample` then consumes those seeds exactly once: each class is
//! walked in order, candidates are evaluated, and accepted patches are
//! appended to the run's patch frame until the seeds run out or the class
//! quota is reached.

use std::path::PathBuf;
use std::sync::Arc;

use rand::Rng;

use crate::io::configuration::{BACKGROUND_CLASS, SamplingOptions};
use crate::io::error::{Result, SamplingError, invalid_parameter};
use crate::io::persistence::save_patchframe;
use crate::sampling::evaluator::{AnnotationCheck, PatchEvaluator, Rejection, Verdict};
use crate::sampling::frame::PatchFrame;
use crate::sampling::quota::QuotaTracker;
use crate::sampling::seeds::{ClassSeeds, plan_classes};
use crate::sampling::sources::{
    AnnotationSource, ClassLabel, LabelReader, SlideSource, TissueSource,
};

/// Annotation capability of a slide
pub enum Annotations {
    /// No annotation mask; only class 0 is sampled and purity is never tested
    Absent,
    /// Annotation mask and the reader translating its pixels
    Present {
        /// Annotation mask
        source: Box<dyn AnnotationSource>,
        /// Label translation, shareable across samplers
        reader: Arc<dyn LabelReader>,
    },
}

impl Annotations {
    /// Whether an annotation mask is configured
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }
}

/// Hooks called while a run progresses
pub trait SamplingObserver {
    /// A class is about to be walked
    fn class_started(&mut self, _class: ClassLabel, _seeds: usize) {}

    /// A seed has been evaluated
    fn seed_evaluated(&mut self, _class: ClassLabel, _verdict: &Verdict) {}
}

impl SamplingObserver for () {}

/// Result of one sampling run
#[derive(Debug)]
pub struct SampleOutcome {
    /// Slide the run belongs to
    pub slide_id: String,
    /// Accepted patches in acceptance order
    pub frame: PatchFrame,
    /// Candidates rejected by either test, across all classes
    pub rejected: usize,
}

struct PreparedRun {
    magnification: f64,
    patch_size: u32,
    classes: Vec<ClassSeeds>,
}

/// Patch sampler for one slide
pub struct Sampler {
    slide: Box<dyn SlideSource>,
    tissue: Box<dyn TissueSource>,
    annotations: Annotations,
    prepared: Option<PreparedRun>,
}

impl Sampler {
    /// Assemble a sampler from its sources
    pub fn new(
        slide: Box<dyn SlideSource>,
        tissue: Box<dyn TissueSource>,
        annotations: Annotations,
    ) -> Self {
        Self {
            slide,
            tissue,
            annotations,
            prepared: None,
        }
    }

    /// Slide being sampled
    pub fn slide(&self) -> &dyn SlideSource {
        self.slide.as_ref()
    }

    /// Annotation capability of the slide
    pub const fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Classes planned by the last `prepare`, in sampling order
    ///
    /// Empty when no run is pending.
    pub fn class_list(&self) -> Vec<ClassLabel> {
        self.prepared
            .as_ref()
            .map(|run| run.classes.iter().map(|entry| entry.class).collect())
            .unwrap_or_default()
    }

    /// Plan classes and seeds with thread-local randomness
    ///
    /// # Errors
    ///
    /// See [`Sampler::prepare_with_rng`]
    pub fn prepare(&mut self, magnification: f64, patch_size: u32) -> Result<()> {
        let mut rng = rand::rng();
        self.prepare_with_rng(magnification, patch_size, &mut rng)
    }

    /// Plan classes and seeds for the next run
    ///
    /// No patch is read. Any pending, unsampled preparation is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `magnification` is not positive and finite, or `patch_size` is zero
    /// - The slide has no pyramid level matching the tissue mask
    /// - The annotation mask cannot be read or has no class 0
    pub fn prepare_with_rng<R>(
        &mut self,
        magnification: f64,
        patch_size: u32,
        rng: &mut R,
    ) -> Result<()>
    where
        R: Rng + ?Sized,
    {
        if !(magnification.is_finite() && magnification > 0.0) {
            return Err(invalid_parameter(
                "magnification",
                &magnification,
                &"must be positive and finite",
            ));
        }
        if patch_size == 0 {
            return Err(invalid_parameter(
                "patch_size",
                &patch_size,
                &"must be positive",
            ));
        }

        let level = self.tissue.level();
        let tissue_factor = self.slide.level_downsample(level).ok_or_else(|| {
            invalid_parameter(
                "tissue_level",
                &level,
                &format!("slide '{}' has no such pyramid level", self.slide.id()),
            )
        })?;

        let annotation = match &self.annotations {
            Annotations::Absent => None,
            Annotations::Present { source, reader } => Some(source.low_res(reader.as_ref())?),
        };

        let classes = plan_classes(
            self.tissue.grid(),
            tissue_factor,
            annotation.as_ref().map(|(grid, factor)| (grid, *factor)),
            rng,
        )?;

        log::debug!(
            "Prepared {} classes for slide {} at magnification {magnification}, patch size {patch_size}",
            classes.len(),
            self.slide.id()
        );

        self.prepared = Some(PreparedRun {
            magnification,
            patch_size,
            classes,
        });
        Ok(())
    }

    /// Run the prepared sampling pass
    ///
    /// # Errors
    ///
    /// See [`Sampler::sample_observed`]
    pub fn sample(&mut self, options: &SamplingOptions) -> Result<SampleOutcome> {
        self.sample_observed(options, &mut ())
    }

    /// Run the prepared sampling pass, reporting progress to `observer`
    ///
    /// Consumes the preparation; the next run needs a new `prepare`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The options are out of range
    /// - The sampler has not been prepared since its last run
    /// - A mask patch cannot be read or a class has no annotation pixel value
    pub fn sample_observed(
        &mut self,
        options: &SamplingOptions,
        observer: &mut dyn SamplingObserver,
    ) -> Result<SampleOutcome> {
        options.validate()?;
        let run = self
            .prepared
            .take()
            .ok_or_else(|| SamplingError::NotPrepared {
                slide_id: self.slide.id().to_string(),
            })?;

        let annotation = match &self.annotations {
            Annotations::Absent => None,
            Annotations::Present { source, reader } => Some(AnnotationCheck {
                source: source.as_ref(),
                reader: reader.as_ref(),
                threshold: options.anno_threshold,
            }),
        };
        let evaluator = PatchEvaluator::new(
            self.slide.as_ref(),
            self.tissue.as_ref(),
            annotation,
            run.magnification,
            run.patch_size,
        );

        let mut records = Vec::new();
        let mut rejected = 0;

        for ClassSeeds { class, seeds } in run.classes {
            if options.ignore_background && class == BACKGROUND_CLASS {
                continue;
            }

            observer.class_started(class, seeds.remaining());
            let mut quota = QuotaTracker::new(options.max_per_class);

            for seed in seeds {
                let verdict = evaluator.evaluate(class, seed)?;
                observer.seed_evaluated(class, &verdict);

                match verdict {
                    Verdict::Accepted(record) => {
                        records.push(record);
                        quota.record(true);
                    }
                    Verdict::Rejected(reason) => {
                        rejected += 1;
                        match reason {
                            Rejection::TissueCoverage { fraction } => log::trace!(
                                "Rejected ({}, {}) for class {class}: tissue {fraction:.3}",
                                seed.col,
                                seed.row
                            ),
                            Rejection::AnnotationPurity { fraction } => log::trace!(
                                "Rejected ({}, {}) for class {class}: annotation {fraction:.3}",
                                seed.col,
                                seed.row
                            ),
                        }
                        quota.record(false);
                    }
                }

                if quota.is_reached() {
                    break;
                }
            }

            log::debug!(
                "Accepted {} patches of class {class} for file {}",
                quota.accepted(),
                self.slide.id()
            );
        }

        log::info!("Rejected {rejected} patches for file {}", self.slide.id());

        Ok(SampleOutcome {
            slide_id: self.slide.id().to_string(),
            frame: PatchFrame::from_records(records),
            rejected,
        })
    }

    /// Run the prepared sampling pass and write the patch frame to
    /// `options.output_dir`
    ///
    /// # Errors
    ///
    /// Returns an error if sampling fails or the frame cannot be written
    pub fn sample_and_save(
        &mut self,
        options: &SamplingOptions,
        observer: &mut dyn SamplingObserver,
    ) -> Result<(SampleOutcome, PathBuf)> {
        let outcome = self.sample_observed(options, observer)?;
        let path = save_patchframe(&outcome.frame, &options.output_dir, &outcome.slide_id)?;
        Ok((outcome, path))
    }
}
