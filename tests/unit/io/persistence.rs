//! Tests for patch frame files and patch image export

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use patchsampler::io::persistence::{
        export_patch_images, load_patchframe, patchframe_path, save_patchframe,
    };
    use patchsampler::io::slide::ImageSlide;
    use patchsampler::{PatchFrame, PatchRecord, SamplingError};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn record(x: u64, y: u64, class: u32) -> PatchRecord {
        PatchRecord {
            slide_id: "case".to_string(),
            x,
            y,
            class,
            magnification: 20.0,
            size: 4,
            parent: PathBuf::from("case.png"),
            level0: 20.0,
        }
    }

    // Tests frame file naming
    // Verified by changing the suffix
    #[test]
    fn test_patchframe_path() {
        assert_eq!(
            patchframe_path(Path::new("/out"), "case"),
            PathBuf::from("/out/case_patchframe.json")
        );
    }

    // Tests saved frames load back unchanged
    // Verified by writing rows instead of columns
    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let frame = PatchFrame::from_records(vec![record(0, 4, 1), record(8, 12, 2)]);

        let path = save_patchframe(&frame, temp_dir.path(), "case").unwrap();
        let loaded = load_patchframe(&path).unwrap();

        assert_eq!(path, temp_dir.path().join("case_patchframe.json"));
        assert_eq!(loaded, frame);
    }

    // Tests the output directory is created
    // Verified by removing create_dir_all
    #[test]
    fn test_save_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");

        let path = save_patchframe(&PatchFrame::default(), &nested, "case").unwrap();

        assert!(path.is_file());
    }

    // Tests an existing frame is replaced
    // Verified by appending to existing files
    #[test]
    fn test_save_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let first = PatchFrame::from_records(vec![record(0, 0, 1), record(4, 0, 1)]);
        let second = PatchFrame::from_records(vec![record(8, 8, 3)]);

        save_patchframe(&first, temp_dir.path(), "case").unwrap();
        let path = save_patchframe(&second, temp_dir.path(), "case").unwrap();

        assert_eq!(load_patchframe(&path).unwrap(), second);
    }

    // Tests load failures
    // Verified by returning an empty frame for unreadable files
    #[test]
    fn test_load_errors() {
        let temp_dir = TempDir::new().unwrap();
        let ragged = temp_dir.path().join("ragged.json");
        let garbage = temp_dir.path().join("garbage.json");
        fs::write(
            &ragged,
            r#"{"id":["a","b"],"w":[1],"h":[1],"class":[0],"mag":[1.0],"size":[4],"parent":["p"],"lvl0":[1.0]}"#,
        )
        .unwrap();
        fs::write(&garbage, "{").unwrap();

        assert!(matches!(
            load_patchframe(&ragged),
            Err(SamplingError::InvalidParameter { .. })
        ));
        assert!(matches!(
            load_patchframe(&garbage),
            Err(SamplingError::Serialization { .. })
        ));
        assert!(matches!(
            load_patchframe(&temp_dir.path().join("absent.json")),
            Err(SamplingError::FileSystem { .. })
        ));
    }

    // Tests exported patches land in per-class directories
    // Verified by swapping x and y in the file name
    #[test]
    fn test_export_patch_images() {
        let temp_dir = TempDir::new().unwrap();
        let image = RgbaImage::from_fn(20, 20, |x, y| Rgba([x as u8, y as u8, 9, 255]));
        let slide = ImageSlide::from_image("case", "case.png", image, 20.0);
        let frame = PatchFrame::from_records(vec![record(4, 8, 1), record(12, 0, 2)]);

        let written = export_patch_images(&slide, &frame, temp_dir.path()).unwrap();

        assert_eq!(written, 2);
        let first = temp_dir.path().join("case").join("1").join("case_4_8.png");
        let second = temp_dir.path().join("case").join("2").join("case_12_0.png");
        assert!(second.is_file());

        let patch = image::open(&first).unwrap().to_rgba8();
        assert_eq!(patch.dimensions(), (4, 4));
        assert_eq!(*patch.get_pixel(0, 0), Rgba([4, 8, 9, 255]));
    }

    // Tests exporting an empty frame writes nothing
    // Verified by creating the slide directory eagerly
    #[test]
    fn test_export_empty_frame() {
        let temp_dir = TempDir::new().unwrap();
        let slide = ImageSlide::from_image("case", "case.png", RgbaImage::new(4, 4), 20.0);

        let written = export_patch_images(&slide, &PatchFrame::default(), temp_dir.path()).unwrap();

        assert_eq!(written, 0);
        assert!(!temp_dir.path().join("case").exists());
    }
}
