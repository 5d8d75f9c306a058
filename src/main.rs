//! CLI entry point for whole-slide patch sampling

use clap::Parser;
use patchsampler::io::cli::{Cli, FileProcessor};

fn main() -> patchsampler::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    let mut processor = FileProcessor::new(cli);
    processor.process()
}
