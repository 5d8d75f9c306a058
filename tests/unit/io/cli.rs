//! Tests for command-line interface parsing and batch processing

#[cfg(test)]
mod tests {
    use clap::Parser;
    use image::{GrayImage, Luma, RgbaImage};
    use patchsampler::MaxPerClass;
    use patchsampler::io::cli::{Cli, FileProcessor};
    use patchsampler::io::configuration::{DEFAULT_ANNO_THRESHOLD, Level0};
    use patchsampler::io::persistence::load_patchframe;
    use patchsampler::sampling::sources::LabelReader;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const REQUIRED: [&str; 6] = ["-t", "masks", "-m", "20", "-s", "4"];

    fn parse(extra: &[&str]) -> Cli {
        let mut args = vec!["program", "slides"];
        args.extend(REQUIRED);
        args.extend(extra);
        Cli::parse_from(args)
    }

    // Slide directory with a 20x20 slide and a fully tissue 5x5 mask
    struct Workspace {
        root: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            fs::create_dir(root.path().join("slides")).unwrap();
            fs::create_dir(root.path().join("tissue")).unwrap();
            RgbaImage::new(20, 20)
                .save(root.path().join("slides").join("case.png"))
                .unwrap();
            GrayImage::from_pixel(5, 5, Luma([255]))
                .save(root.path().join("tissue").join("case_tissue.png"))
                .unwrap();
            Self { root }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.root.path().join(name)
        }

        fn cli(&self, target: &Path, extra: &[&str]) -> Cli {
            let tissue = self.path("tissue");
            let output = self.path("out");
            let mut args = vec![
                "program".to_string(),
                target.display().to_string(),
                "-t".to_string(),
                tissue.display().to_string(),
                "-o".to_string(),
                output.display().to_string(),
                "-m".to_string(),
                "20".to_string(),
                "-s".to_string(),
                "4".to_string(),
                "--level0".to_string(),
                "20".to_string(),
                "-q".to_string(),
            ];
            args.extend(extra.iter().map(ToString::to_string));
            Cli::parse_from(args)
        }
    }

    // Tests CLI parsing with only required arguments
    // Verified by changing default values to ensure defaults are used
    #[test]
    fn test_cli_parse_minimal_args() {
        let cli = parse(&[]);

        assert_eq!(cli.target, PathBuf::from("slides"));
        assert_eq!(cli.tissue_dir, PathBuf::from("masks"));
        assert!((cli.magnification - 20.0).abs() < f64::EPSILON);
        assert_eq!(cli.patch_size, 4);
        assert_eq!(cli.level0, Level0::Infer);
        assert_eq!(cli.max_per_class, MaxPerClass::All);
        assert!((cli.anno_threshold - DEFAULT_ANNO_THRESHOLD).abs() < f64::EPSILON);
        assert_eq!(cli.output, PathBuf::from("."));
        assert_eq!(cli.seed, None);
        assert!(cli.annotation_dir.is_none());
        assert!(!cli.include_background);
        assert!(!cli.quiet);
    }

    // Tests CLI parsing with all available arguments
    // Verified by modifying custom parsers to ensure they're invoked
    #[test]
    fn test_cli_parse_all_args() {
        let cli = parse(&[
            "-a",
            "annotations",
            "-l",
            "labels.json",
            "--level0",
            "40",
            "-b",
            "-n",
            "50",
            "--anno-threshold",
            "0.75",
            "-o",
            "frames",
            "--seed",
            "7",
            "-e",
            "-q",
            "--no-skip",
            "-vv",
        ]);

        assert_eq!(cli.annotation_dir, Some(PathBuf::from("annotations")));
        assert_eq!(cli.labels, Some(PathBuf::from("labels.json")));
        assert_eq!(cli.level0, Level0::Magnification(40.0));
        assert!(cli.include_background);
        assert_eq!(cli.max_per_class, MaxPerClass::Limit(50));
        assert!((cli.anno_threshold - 0.75).abs() < f64::EPSILON);
        assert_eq!(cli.output, PathBuf::from("frames"));
        assert_eq!(cli.seed, Some(7));
        assert!(cli.export_patches);
        assert!(cli.quiet);
        assert!(!cli.skip_existing());
        assert_eq!(cli.verbose, 2);
    }

    // Tests invalid values are refused by the parser
    // Verified by parsing the cap as a plain integer
    #[test]
    fn test_cli_rejects_invalid_values() {
        let base = ["program", "slides", "-t", "masks", "-m", "20", "-s", "4"];

        let zero_cap = Cli::try_parse_from(base.iter().copied().chain(["-n", "0"]));
        let bad_level0 = Cli::try_parse_from(base.iter().copied().chain(["--level0", "x"]));
        let missing_size =
            Cli::try_parse_from(["program", "slides", "-t", "masks", "-m", "20"]);

        assert!(zero_cap.is_err());
        assert!(bad_level0.is_err());
        assert!(missing_size.is_err());
    }

    // Tests flags mapping onto sampling options
    // Verified by passing include_background through uninverted
    #[test]
    fn test_sampling_options() {
        let options = parse(&["-b", "-n", "3", "--anno-threshold", "0.5", "-o", "x"])
            .sampling_options();

        assert!(!options.ignore_background);
        assert_eq!(options.max_per_class, MaxPerClass::Limit(3));
        assert!((options.anno_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(options.output_dir, PathBuf::from("x"));

        assert!(parse(&[]).sampling_options().ignore_background);
    }

    // Tests skip and progress toggles
    // Verified by inverting boolean logic in the helpers
    #[test]
    fn test_skip_and_progress_toggles() {
        assert!(parse(&[]).skip_existing());
        assert!(parse(&[]).should_show_progress());
        assert!(!parse(&["--no-skip"]).skip_existing());
        assert!(!parse(&["--quiet"]).should_show_progress());
    }

    // Tests the label reader is identity without a palette
    // Verified by requiring a palette file
    #[test]
    fn test_label_reader_selection() {
        let identity = parse(&[]).label_reader().unwrap();
        assert_eq!(identity.label_to_pixel(4).unwrap(), 4);

        let temp_dir = TempDir::new().unwrap();
        let palette_path = temp_dir.path().join("labels.json");
        fs::write(
            &palette_path,
            r#"{"labels":[{"name":"tumour","class":1,"pixel":255}]}"#,
        )
        .unwrap();
        let palette_arg = palette_path.display().to_string();
        let palette = parse(&["-l", &palette_arg]).label_reader().unwrap();
        assert_eq!(palette.label_to_pixel(1).unwrap(), 255);

        assert!(parse(&["-l", "/nonexistent/labels.json"]).label_reader().is_err());
    }

    // Tests error handling for missing targets
    // Verified by removing error return for nonexistent targets
    #[test]
    fn test_process_nonexistent_target() {
        let workspace = Workspace::new();
        let cli = workspace.cli(&workspace.path("absent.png"), &[]);

        assert!(FileProcessor::new(cli).process().is_err());
    }

    // Tests error handling for non-image targets
    // Verified by removing file type validation
    #[test]
    fn test_process_invalid_file_type() {
        let workspace = Workspace::new();
        let notes = workspace.path("notes.txt");
        fs::write(&notes, "not a slide").unwrap();
        let cli = workspace.cli(&notes, &[]);

        assert!(FileProcessor::new(cli).process().is_err());
    }

    // Tests processing empty directories
    // Verified by adding error for empty directories
    #[test]
    fn test_process_empty_directory() {
        let workspace = Workspace::new();
        let empty = workspace.path("empty");
        fs::create_dir(&empty).unwrap();
        let cli = workspace.cli(&empty, &[]);

        assert!(FileProcessor::new(cli).process().is_ok());
        assert!(!workspace.path("out").exists());
    }

    // Tests a directory run writes one patch frame per slide
    // Verified by skipping class 0 despite --include-background
    #[test]
    fn test_process_directory_writes_frames() {
        let workspace = Workspace::new();
        let cli = workspace.cli(&workspace.path("slides"), &["-b", "--seed", "3"]);

        FileProcessor::new(cli).process().unwrap();

        let frame =
            load_patchframe(&workspace.path("out").join("case_patchframe.json")).unwrap();
        assert_eq!(frame.len(), 25);
        assert_eq!(frame.class_counts().get(&0), Some(&25));
    }

    // Tests existing patch frames are left untouched
    // Verified by removing skip check
    #[test]
    fn test_skip_existing_frame() {
        let workspace = Workspace::new();
        let output = workspace.path("out");
        fs::create_dir(&output).unwrap();
        let existing = output.join("case_patchframe.json");
        fs::write(&existing, "placeholder").unwrap();

        let cli = workspace.cli(&workspace.path("slides"), &["-b"]);
        FileProcessor::new(cli).process().unwrap();
        assert_eq!(fs::read_to_string(&existing).unwrap(), "placeholder");

        let cli = workspace.cli(&workspace.path("slides"), &["-b", "--no-skip"]);
        FileProcessor::new(cli).process().unwrap();
        assert!(load_patchframe(&existing).is_ok());
    }

    // Tests a slide without a tissue mask aborts the batch
    // Verified by silently skipping the slide
    #[test]
    fn test_process_missing_tissue_mask() {
        let workspace = Workspace::new();
        fs::remove_file(workspace.path("tissue").join("case_tissue.png")).unwrap();
        let cli = workspace.cli(&workspace.path("slides"), &["-b"]);

        assert!(FileProcessor::new(cli).process().is_err());
    }

    // Tests patch export alongside the frame
    // Verified by exporting only the first record
    #[test]
    fn test_process_exports_patches() {
        let workspace = Workspace::new();
        let cli = workspace.cli(
            &workspace.path("slides").join("case.png"),
            &["-b", "-n", "4", "-e"],
        );

        FileProcessor::new(cli).process().unwrap();

        let class_dir = workspace.path("out").join("case").join("0");
        let exported = fs::read_dir(&class_dir).unwrap().count();
        assert_eq!(exported, 3);
    }
}
