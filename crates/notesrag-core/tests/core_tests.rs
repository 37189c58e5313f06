use std::fs;
use std::io::Write;
use tempfile::TempDir;

use notesrag_core::loader::DocumentLoader;
use notesrag_core::types::DocumentFormat;
use notesrag_core::Error;

#[test]
fn load_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text").unwrap();

    let report = DocumentLoader::new().load_directory(dir).expect("load");

    assert_eq!(report.documents.len(), 1);
    assert!(report.failures.is_empty());
    assert_eq!(report.documents[0].raw_text, "Short text\n");
    assert_eq!(report.documents[0].path, file_path);
}

#[test]
fn load_directory_recurses_and_skips_unsupported() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("notes/deep")).unwrap();
    fs::write(dir.join("notes/a.md"), "Paris is the capital of France.").unwrap();
    fs::write(dir.join("notes/deep/b.txt"), "bravo").unwrap();
    fs::write(dir.join("notes/image.png"), [0u8, 1, 2]).unwrap();
    fs::write(dir.join("README"), "no extension").unwrap();

    let report = DocumentLoader::new().load_directory(dir).expect("load");

    let names: Vec<String> = report.documents.iter().map(|d| d.file_name()).collect();
    assert_eq!(names, vec!["a.md", "b.txt"]);
    assert!(report.documents.iter().all(|d| d.format == DocumentFormat::Text));
    assert!(report.failures.is_empty(), "unsupported files are skipped silently");
}

#[test]
fn load_directory_order_is_deterministic() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    for name in ["zulu.md", "alpha.txt", "mike.md"] {
        fs::write(dir.join(name), name).unwrap();
    }
    let loader = DocumentLoader::new();
    let first: Vec<_> = loader.load_directory(dir).unwrap().documents.into_iter().map(|d| d.path).collect();
    let second: Vec<_> = loader.load_directory(dir).unwrap().documents.into_iter().map(|d| d.path).collect();
    assert_eq!(first, second);
    assert_eq!(first[0].file_name().unwrap(), "alpha.txt");
}

#[test]
fn one_broken_file_does_not_stop_the_rest() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.md"), "alpha").unwrap();
    fs::write(dir.join("b.pdf"), b"%PDF-garbage").unwrap();
    fs::write(dir.join("c.txt"), [0xffu8, 0xfe, 0xfd]).unwrap();
    fs::write(dir.join("d.md"), "delta").unwrap();

    let report = DocumentLoader::new().load_directory(dir).expect("load");

    let names: Vec<String> = report.documents.iter().map(|d| d.file_name()).collect();
    assert_eq!(names, vec!["a.md", "d.md"]);
    assert_eq!(report.failures.len(), 2);
    for failure in &report.failures {
        assert!(matches!(failure.error, Error::Load { .. }), "{:?}", failure.error);
    }
}

#[test]
fn missing_root_is_created_and_empty() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("notes");
    assert!(!root.exists());

    let report = DocumentLoader::new().load_directory(&root).expect("cold start is not an error");

    assert!(root.is_dir());
    assert!(report.is_empty());
    assert!(report.failures.is_empty());
}
