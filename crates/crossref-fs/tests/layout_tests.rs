use assert_fs::prelude::*;
use crossref_fs::{Error, NormalizedPath, WorkspaceLayout};
use predicates::prelude::*;

#[test]
fn test_detect_from_nested_subdir() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child(".git").create_dir_all().unwrap();
    let subdir = temp.child("src").child("core");
    subdir.create_dir_all().unwrap();

    let layout = WorkspaceLayout::detect(subdir.path()).unwrap();

    assert_eq!(layout.root, NormalizedPath::canonicalize(temp.path()).unwrap());
    assert!(layout.config_path().as_str().ends_with("/.gitcrossref"));
    assert!(layout.schema_path().as_str().ends_with("/gitcrossref-schema.json"));
}

#[test]
fn test_discover_falls_back_to_start() {
    let temp = assert_fs::TempDir::new().unwrap();
    let layout = WorkspaceLayout::discover(temp.path()).unwrap();

    // Only meaningful when no ancestor of the temp dir is itself a git checkout
    if layout.git_dir.is_none() && !layout.root.join(".git").exists() {
        assert_eq!(layout.root, NormalizedPath::canonicalize(temp.path()).unwrap());
    }
}

#[test]
fn test_detect_missing_start_is_io_error() {
    let temp = assert_fs::TempDir::new().unwrap();
    let missing = temp.child("missing");
    missing.assert(predicate::path::missing());

    let err = WorkspaceLayout::detect(missing.path()).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}
