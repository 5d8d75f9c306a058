//! Keeps `tests/unit` a mirror of `src`: one test file per source file

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

const SRC_DIR: &str = "src";
const UNIT_DIR: &str = "tests/unit";
const TESTS_DIR: &str = "tests";

// Entry points and module declaration files carry no logic of their own
fn is_exempt(relative: &str) -> bool {
    relative == "main.rs" || relative == "lib.rs" || relative.ends_with("mod.rs")
}

fn rust_files(dir: &Path, base: &Path, found: &mut BTreeSet<String>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let relative = path
            .strip_prefix(base)
            .map_err(|_| io::Error::other("entry outside base directory"))?
            .to_string_lossy()
            .replace('\\', "/");

        if path.is_dir() {
            found.insert(relative);
            rust_files(&path, base, found)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            found.insert(relative);
        }
    }
    Ok(())
}

fn tree(dir: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let base = Path::new(dir);
    if let Err(error) = rust_files(base, base, &mut found) {
        panic!("failed to scan {dir}: {error}");
    }
    found
}

#[test]
fn test_every_source_file_has_unit_tests() {
    let tests = tree(UNIT_DIR);

    let missing: Vec<String> = tree(SRC_DIR)
        .into_iter()
        .filter(|path| !is_exempt(path) && !tests.contains(path))
        .map(|path| format!("  - src/{path} -> {UNIT_DIR}/{path}"))
        .collect();

    assert!(
        missing.is_empty(),
        "Source files without unit tests:\n{}",
        missing.join("\n")
    );
}

#[test]
fn test_every_unit_test_has_a_source_file() {
    let sources = tree(SRC_DIR);

    let orphaned: Vec<String> = tree(UNIT_DIR)
        .into_iter()
        .filter(|path| !path.ends_with("mod.rs") && !sources.contains(path))
        .map(|path| format!("  - {UNIT_DIR}/{path} -> src/{path} (missing)"))
        .collect();

    assert!(
        orphaned.is_empty(),
        "Unit tests without a source file:\n{}",
        orphaned.join("\n")
    );
}

#[test]
fn test_every_test_file_contains_tests() {
    let empty: Vec<String> = tree(TESTS_DIR)
        .into_iter()
        .filter(|path| Path::new(path).extension().is_some_and(|ext| ext == "rs"))
        .filter(|path| !path.ends_with("main.rs") && !path.ends_with("mod.rs"))
        .filter(|path| {
            !fs::read_to_string(Path::new(TESTS_DIR).join(path))
                .is_ok_and(|content| content.contains("#[test]"))
        })
        .map(|path| format!("  - {TESTS_DIR}/{path}"))
        .collect();

    assert!(
        empty.is_empty(),
        "Test files without a #[test] function:\n{}",
        empty.join("\n")
    );
}
