// tests/clean_target.rs

//! Built-in clean target: keep-list semantics.

use std::fs;
use std::path::Path;

use assetpipe::clean::clean;
use assetpipe::config::CleanSection;

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn keep_entries_survive_everything_else_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let dist = dir.path().join("dist");
    write(&dist.join("css/style.css"), "body{}");
    write(&dist.join("img/logo.webp"), "webp");
    write(&dist.join("fonts/a.woff2"), "woff");
    write(&dist.join("index.html"), "<html>");

    let cfg = CleanSection {
        keep: vec!["img".to_string(), "fonts".to_string()],
    };
    clean(&dist, &cfg).unwrap();

    assert!(!dist.join("css").exists(), "unkept directory must be removed");
    assert!(!dist.join("index.html").exists(), "unkept file must be removed");
    assert!(dist.join("img/logo.webp").is_file());
    assert!(dist.join("fonts/a.woff2").is_file());
}

#[test]
fn empty_keep_list_empties_dist() {
    let dir = tempfile::tempdir().unwrap();
    let dist = dir.path().join("dist");
    write(&dist.join("css/style.css"), "body{}");
    write(&dist.join("index.html"), "<html>");

    clean(&dist, &CleanSection::default()).unwrap();

    assert!(dist.is_dir(), "dist itself stays");
    assert_eq!(fs::read_dir(&dist).unwrap().count(), 0);
}

#[test]
fn missing_dist_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let dist = dir.path().join("dist");

    clean(&dist, &CleanSection::default()).unwrap();
    assert!(!dist.exists());
}
