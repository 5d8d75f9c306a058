//! Command-line interface for batch patch sampling over slide files

use crate::io::configuration::{
    DEFAULT_ANNO_THRESHOLD, Level0, MaxPerClass, SLIDE_EXTENSIONS, SamplingOptions,
};
use crate::io::discovery::{files_with_extensions, has_extension};
use crate::io::error::{Result, invalid_parameter};
use crate::io::labels::{IdentityLabels, LabelPalette};
use crate::io::loader::SlideLoader;
use crate::io::persistence::{export_patch_images, patchframe_path};
use crate::io::progress::ProgressManager;
use crate::io::slide::slide_id;
use crate::sampling::sources::LabelReader;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "patchsample")]
#[command(
    author,
    version,
    about = "Sample class-balanced patches from whole-slide images"
)]
/// Command-line arguments for the patch sampling tool
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Slide image or directory of slide images
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Directory holding `<slide_id>*` tissue masks
    #[arg(short, long)]
    pub tissue_dir: PathBuf,

    /// Directory holding `<slide_id>*` annotation masks
    #[arg(short, long)]
    pub annotation_dir: Option<PathBuf>,

    /// JSON palette mapping classes to annotation pixel values
    #[arg(short, long)]
    pub labels: Option<PathBuf>,

    /// Magnification patches are read at
    #[arg(short, long)]
    pub magnification: f64,

    /// Patch edge length in pixels
    #[arg(short = 's', long)]
    pub patch_size: u32,

    /// Level-0 magnification, or 'infer' to read `<stem>.meta.json`
    #[arg(long, default_value = "infer")]
    pub level0: Level0,

    /// Sample class 0 (unannotated tissue) as well
    #[arg(short = 'b', long)]
    pub include_background: bool,

    /// Per-class patch cap, or 'all'
    #[arg(short = 'n', long, default_value_t = MaxPerClass::All)]
    pub max_per_class: MaxPerClass,

    /// Minimum fraction of annotation pixels matching the sampled class
    #[arg(long, default_value_t = DEFAULT_ANNO_THRESHOLD)]
    pub anno_threshold: f64,

    /// Directory patch frames are written to
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Random seed for reproducible seed ordering
    #[arg(long)]
    pub seed: Option<u64>,

    /// Also write the pixels of accepted patches as PNG
    #[arg(short, long)]
    pub export_patches: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Process slides even if their patch frame exists
    #[arg(long)]
    pub no_skip: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Check if existing patch frames should be skipped
    pub const fn skip_existing(&self) -> bool {
        !self.no_skip
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Options of each sampling run
    pub fn sampling_options(&self) -> SamplingOptions {
        SamplingOptions {
            ignore_background: !self.include_background,
            max_per_class: self.max_per_class,
            output_dir: self.output.clone(),
            anno_threshold: self.anno_threshold,
        }
    }

    /// Label reader selected by `--labels`
    ///
    /// # Errors
    ///
    /// Returns an error if the palette file cannot be read
    pub fn label_reader(&self) -> Result<Arc<dyn LabelReader>> {
        match &self.labels {
            Some(path) => Ok(Arc::new(LabelPalette::from_json_file(path)?)),
            None => Ok(Arc::new(IdentityLabels)),
        }
    }
}

/// Orchestrates batch sampling of slide files with progress tracking
pub struct FileProcessor {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
    rng: Option<StdRng>,
}

impl FileProcessor {
    /// Create a new file processor with the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);
        let rng = cli.seed.map(StdRng::seed_from_u64);

        Self {
            cli,
            progress_manager,
            rng,
        }
    }

    /// Sample every slide named by the CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if target validation, label loading or any slide's
    /// sampling fails
    pub fn process(&mut self) -> Result<()> {
        self.cli.sampling_options().validate()?;
        let files = self.collect_files()?;

        if files.is_empty() {
            return Ok(());
        }

        let loader = SlideLoader {
            tissue_dir: self.cli.tissue_dir.clone(),
            annotation_dir: self.cli.annotation_dir.clone(),
            labels: self.cli.label_reader()?,
            level0: self.cli.level0,
        };

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(files.len());
        }

        for (index, file) in files.iter().enumerate() {
            self.process_file(&loader, file, index)?;
        }

        if let Some(ref pm) = self.progress_manager {
            pm.finish();
        }

        Ok(())
    }

    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let target = &self.cli.target;
        let candidates = if target.is_file() {
            if !has_extension(target, SLIDE_EXTENSIONS) {
                return Err(invalid_parameter(
                    "target",
                    &target.display(),
                    &"slide must be a PNG, TIFF or JPEG image",
                ));
            }
            vec![target.clone()]
        } else if target.is_dir() {
            files_with_extensions(target, SLIDE_EXTENSIONS)?
        } else {
            return Err(invalid_parameter(
                "target",
                &target.display(),
                &"must be a slide image or directory",
            ));
        };

        Ok(candidates
            .into_iter()
            .filter(|path| self.should_process_file(path))
            .collect())
    }

    fn should_process_file(&self, slide_path: &Path) -> bool {
        if !self.cli.skip_existing() {
            return true;
        }

        let output_path = patchframe_path(&self.cli.output, &slide_id(slide_path));
        if output_path.exists() {
            log::info!("Skipping: {} (patch frame exists)", slide_path.display());
            false
        } else {
            true
        }
    }

    fn process_file(&mut self, loader: &SlideLoader, slide_path: &Path, index: usize) -> Result<()> {
        let mut sampler = loader.open(slide_path)?;
        let options = self.cli.sampling_options();

        match self.rng.as_mut() {
            Some(rng) => {
                sampler.prepare_with_rng(self.cli.magnification, self.cli.patch_size, rng)?;
            }
            None => sampler.prepare(self.cli.magnification, self.cli.patch_size)?,
        }

        let (outcome, path) = match self.progress_manager.as_mut() {
            Some(pm) => {
                pm.start_slide(index, sampler.slide().id());
                sampler.sample_and_save(&options, pm)?
            }
            None => sampler.sample_and_save(&options, &mut ())?,
        };

        log::info!(
            "Sampled {} patches ({} rejected) from {} into {}",
            outcome.frame.len(),
            outcome.rejected,
            outcome.slide_id,
            path.display()
        );

        if self.cli.export_patches {
            let written =
                export_patch_images(sampler.slide(), &outcome.frame, &self.cli.output)?;
            log::info!("Exported {written} patch images for {}", outcome.slide_id);
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.complete_slide(index);
        }

        Ok(())
    }
}
