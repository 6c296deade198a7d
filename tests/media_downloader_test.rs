use notesift::config::DownloadConfig;
use notesift::media::downloader;
use std::fs;
use tempfile::tempdir;

const CORPUS: &str = r#"{"title":"a b/c","text":"x","text_processed":"x","images":["https://img.example/1","https://img.example/2"]}
not json at all

{"text":"y","text_processed":"y","images":["https://img.example/3"]}
{"title":"","images":[]}
"#;

#[test]
fn test_plan_skips_malformed_lines() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("preprocessed_data.jsonl");
    fs::write(&input, CORPUS).unwrap();
    let out = dir.path().join("images");

    let (jobs, stats) = downloader::plan_jobs(&input, &out).unwrap();
    assert_eq!(stats.records, 3);
    assert_eq!(stats.malformed_lines, 1);

    let names: Vec<String> = jobs
        .iter()
        .map(|j| j.dest.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a_b_c_1.webp", "a_b_c_2.webp", "untitled_1.webp"]);
    assert_eq!(jobs[2].url, "https://img.example/3");
    assert!(jobs.iter().all(|j| j.dest.starts_with(&out)));
}

#[test]
fn test_plan_missing_input_is_fatal() {
    let dir = tempdir().unwrap();
    assert!(downloader::plan_jobs(&dir.path().join("missing.jsonl"), dir.path()).is_err());
}

#[tokio::test]
async fn test_failed_downloads_are_counted_not_fatal() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("preprocessed_data.jsonl");
    fs::write(
        &input,
        r#"{"title":"t","images":["not a url","also not a url"]}"#,
    )
    .unwrap();

    let config = DownloadConfig {
        input,
        output_dir: dir.path().join("images"),
        requests_per_second: 100,
        concurrency: 2,
        ..Default::default()
    };
    let stats = downloader::run(&config).await.unwrap();
    assert_eq!(stats.attempted, 2);
    assert_eq!(stats.saved, 0);
    assert_eq!(stats.failed, 2);
    assert!(config.output_dir.is_dir());
    assert_eq!(fs::read_dir(&config.output_dir).unwrap().count(), 0);
}

#[test]
fn test_shared_titles_plan_each_file_once() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("preprocessed_data.jsonl");
    fs::write(
        &input,
        concat!(
            r#"{"title":"same","images":["https://img.example/old1","https://img.example/old2"]}"#,
            "\n",
            r#"{"title":"same","images":["https://img.example/new1"]}"#,
            "\n",
        ),
    )
    .unwrap();
    let out = dir.path().join("images");

    let (jobs, stats) = downloader::plan_jobs(&input, &out).unwrap();
    assert_eq!(stats.records, 2);
    assert_eq!(stats.superseded, 1);
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].dest, out.join("same_1.webp"));
    assert_eq!(jobs[0].url, "https://img.example/new1");
    assert_eq!(jobs[1].dest, out.join("same_2.webp"));
    assert_eq!(jobs[1].url, "https://img.example/old2");
}
