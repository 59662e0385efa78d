use std::path::Path;

use pinset_core::name::PackageName;
use pinset_resolver::index::{IndexError, IndexProvider};
use tempfile::TempDir;

#[test]
fn load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.toml");
    std::fs::write(
        &path,
        r#"
[packages.Foo_Bar]
"1.0" = {}
"2.0" = { dependencies = ["six"] }
"#,
    )
    .unwrap();

    let index = IndexProvider::from_path(&path).unwrap();
    let versions: Vec<String> = index
        .versions(&PackageName::new("foo-bar").unwrap())
        .iter()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(versions, ["1.0", "2.0"]);
}

#[test]
fn missing_file_is_io_error() {
    let err = IndexProvider::from_path(Path::new("/nonexistent/index.toml")).unwrap_err();
    assert!(matches!(err, IndexError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/index.toml"));
}

#[test]
fn malformed_toml_is_parse_error() {
    let err = IndexProvider::from_toml_str("[packages\n").unwrap_err();
    assert!(matches!(err, IndexError::Parse(_)));
}

#[test]
fn unknown_release_keys_are_rejected() {
    let err = IndexProvider::from_toml_str("[packages.foo.\"1.0\"]\nrequires = []\n").unwrap_err();
    assert!(matches!(err, IndexError::Parse(_)));
}

#[test]
fn fixture_index_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/index.toml");
    let index = IndexProvider::from_path(&path).unwrap();
    assert!(index.package_count() > 20);
    assert_eq!(index.versions(&PackageName::new("celery").unwrap()).len(), 3);
}
