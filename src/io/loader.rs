//! Assembling samplers from slide files and mask directories

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::io::configuration::{Level0, MASK_EXTENSIONS};
use crate::io::discovery::find_item;
use crate::io::error::{Result, SamplingError};
use crate::io::masks::{LabelGridMask, load_label_grid};
use crate::io::slide::ImageSlide;
use crate::sampling::sampler::{Annotations, Sampler};
use crate::sampling::sources::{LabelReader, SlideSource};

/// Where masks live and how slides and annotations are interpreted
pub struct SlideLoader {
    /// Directory searched for `<slide_id>*` tissue masks
    pub tissue_dir: PathBuf,
    /// Directory searched for `<slide_id>*` annotation masks
    pub annotation_dir: Option<PathBuf>,
    /// Translation of annotation pixels, shared by every sampler built
    pub labels: Arc<dyn LabelReader>,
    /// Level-0 magnification of every slide
    pub level0: Level0,
}

impl SlideLoader {
    /// Build a sampler for the slide stored at `slide_path`
    ///
    /// A missing, ambiguous or unreadable annotation mask is logged and the
    /// sampler proceeds without annotations.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The slide cannot be decoded or its magnification resolved
    /// - No tissue mask exists for the slide, several could belong to it, or
    ///   it cannot be decoded
    /// - The tissue mask matches no pyramid level of the slide
    pub fn open(&self, slide_path: &Path) -> Result<Sampler> {
        let slide = ImageSlide::open(slide_path, self.level0)?;

        let tissue_path = find_item(&self.tissue_dir, slide.id(), MASK_EXTENSIONS)?.ok_or_else(
            || SamplingError::MissingMask {
                kind: "tissue",
                slide_id: slide.id().to_string(),
                search_dir: self.tissue_dir.clone(),
            },
        )?;
        let tissue = LabelGridMask::tissue_for(load_label_grid(&tissue_path)?, &slide)?;

        let annotations = self.open_annotations(&slide);

        Ok(Sampler::new(Box::new(slide), Box::new(tissue), annotations))
    }

    fn open_annotations(&self, slide: &ImageSlide) -> Annotations {
        let Some(dir) = &self.annotation_dir else {
            return Annotations::Absent;
        };

        let path = match find_item(dir, slide.id(), MASK_EXTENSIONS) {
            Ok(Some(path)) => path,
            Ok(None) => {
                log::info!("No annotation mask found for {}. Skipping.", slide.id());
                return Annotations::Absent;
            }
            Err(error) => {
                log::warn!("Annotation lookup failed for {}: {error}", slide.id());
                return Annotations::Absent;
            }
        };

        log::info!(
            "Annotation mask found for {}. Loading {}.",
            slide.id(),
            path.display()
        );
        let mask = load_label_grid(&path).and_then(|grid| LabelGridMask::annotation_for(grid, slide));
        match mask {
            Ok(mask) => Annotations::Present {
                source: Box::new(mask),
                reader: Arc::clone(&self.labels),
            },
            Err(error) => {
                log::warn!(
                    "Ignoring malformed annotation mask for {}: {error}",
                    slide.id()
                );
                Annotations::Absent
            }
        }
    }
}
