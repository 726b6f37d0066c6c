//! Temporary directory and fixture file helpers.

use std::fs;
use std::path::{Path, PathBuf};

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Writes `contents` to `dir/relative`, creating parent directories.
///
/// Returns the full path of the written file.
pub fn write_fixture(dir: &Path, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    fs::write(&path, contents).expect("Failed to write fixture file");
    path
}

/// Lays out a small static asset tree the way the viewer page expects it.
///
/// ```text
/// static/
///   theme/default/style.css
///   viewer.css
///   viewer.js
///   index.html
///   white.png
///   notes.txt
/// ```
///
/// Returns the path of the `static` directory.
pub fn static_asset_tree(dir: &Path) -> PathBuf {
    let root = dir.join("static");
    write_fixture(&root, "theme/default/style.css", "body { margin: 0; }\n");
    write_fixture(&root, "viewer.css", "#map { width: 100%; }\n");
    write_fixture(&root, "viewer.js", "var viewer = {};\n");
    write_fixture(&root, "index.html", "<html></html>\n");
    write_fixture(&root, "white.png", crate::fixtures::WHITE_PNG);
    write_fixture(&root, "notes.txt", "not served\n");
    root
}
