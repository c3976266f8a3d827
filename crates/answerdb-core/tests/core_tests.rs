use std::fs;
use std::path::Path;
use tempfile::TempDir;

use answerdb_core::config::{expand_path, Config};
use answerdb_core::corpus::{CorpusExtractor, CorpusLayout};
use answerdb_core::error::Error;
use figment::providers::{Format, Toml};
use figment::Figment;

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn extract_pairs_question_with_preferred_solution() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(&root.join("GA1/q1.txt"), b"  What is 2+2?\n");
    write(&root.join("GA1/q1.sh"), b"echo 4");
    write(&root.join("GA1/q1.py"), b"print(4)");
    write(&root.join("GA1/nested/q2.txt"), b"Capital of France?");
    write(&root.join("GA1/nested/q2.sh"), b"echo Paris");
    write(&root.join("GA2/q3.txt"), b"Unsolved question");

    let corpus = CorpusExtractor::default().extract(root).expect("extract");

    assert_eq!(corpus.len(), 3);
    assert_eq!(corpus.get("What is 2+2?"), Some(Some(root.join("GA1/q1.py").as_path())), "py preferred over sh");
    assert_eq!(corpus.get("Capital of France?"), Some(Some(root.join("GA1/nested/q2.sh").as_path())));
    assert_eq!(corpus.get("Unsolved question"), Some(None));
}

#[test]
fn duplicate_question_keeps_last_processed_occurrence() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(&root.join("GA1/a.txt"), b"Same question");
    write(&root.join("GA1/a.py"), b"print('first')");
    write(&root.join("GA2/b.txt"), b"Same question\n");
    write(&root.join("GA2/b.sh"), b"echo second");

    let corpus = CorpusExtractor::default().extract(root).expect("extract");

    assert_eq!(corpus.len(), 1, "duplicates collapse into one entry");
    assert_eq!(corpus.get("Same question"), Some(Some(root.join("GA2/b.sh").as_path())));
}

#[test]
fn unreadable_and_empty_questions_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(&root.join("GA1/bad.txt"), &[0xff, 0xfe, 0x00, 0xc3]);
    write(&root.join("GA1/blank.txt"), b"   \n");
    write(&root.join("GA1/good.txt"), b"Good question");

    let corpus = CorpusExtractor::default().extract(root).expect("extract");

    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus.skipped(), 2);
    assert!(corpus.get("Good question").is_some());
}

#[test]
fn missing_folders_are_skipped_and_other_folders_ignored() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(&root.join("GA2/q.txt"), b"Only question");
    write(&root.join("OTHER/q.txt"), b"Not scanned");

    let corpus = CorpusExtractor::default().extract(root).expect("extract");

    let questions: Vec<&str> = corpus.iter().map(|(q, _)| q).collect();
    assert_eq!(questions, vec!["Only question"]);
}

#[test]
fn missing_root_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let err = CorpusExtractor::default().extract(&tmp.path().join("nope")).unwrap_err();
    assert!(matches!(err, Error::RootNotFound(_)));
}

#[test]
fn layout_rejects_solution_extension_equal_to_question_extension() {
    let tmp = TempDir::new().unwrap();
    let layout = CorpusLayout {
        folders: vec!["GA1".to_string()],
        question_extension: "txt".to_string(),
        solution_extensions: vec!["txt".to_string()],
    };
    let err = CorpusExtractor::new(layout).extract(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::InvalidLayout(_)));
}

#[test]
fn settings_fall_back_to_defaults_and_accept_overrides() {
    let figment = Figment::from(Toml::string(
        r#"
        [corpus]
        folders = ["GA3"]
        solution_extensions = [".sh"]

        [exec]
        timeout_secs = 5
        "#,
    ));
    let settings = Config::from_figment(figment).settings().expect("settings");

    assert_eq!(settings.corpus.folders, vec!["GA3".to_string()]);
    assert_eq!(settings.corpus.question_extension, "txt");
    assert_eq!(settings.exec.timeout_secs, 5);
    assert_eq!(settings.exec.max_concurrent, 4);
    assert_eq!(settings.server.port, 5000);

    let layout = CorpusLayout::from(&settings.corpus);
    assert_eq!(layout.solution_extensions, vec!["sh".to_string()], "leading dot is stripped");
}

#[test]
fn expand_path_leaves_plain_paths_untouched() {
    assert_eq!(expand_path("data/index.json"), Path::new("data/index.json"));
}
