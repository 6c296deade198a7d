use chrono::NaiveDate;
use notesift::config::NormalizerConfig;
use notesift::persistence::{read_jsonl, Note};
use notesift::refinery::{self, RefineryError};
use std::fs;
use tempfile::tempdir;

// * End-to-end normalize stage over a small raw file

fn raw_line(url: &str, title: &str, likes: &str, time: &str) -> String {
    format!(
        r#"{{"keyword":"kw","note_url":"{}","title":"{}","text":"body","likes":"{}","favorites":"收藏","comments":"12","time":"{}"}}"#,
        url, title, likes, time
    )
}

fn config_for(dir: &std::path::Path, lines: &[String]) -> NormalizerConfig {
    let input = dir.join("notes.jsonl");
    fs::write(&input, lines.join("\n")).unwrap();
    NormalizerConfig {
        input,
        output: dir.join("processed_notes.jsonl"),
        reference_date: NaiveDate::from_ymd_opt(2025, 1, 26).unwrap(),
    }
}

#[test]
fn test_normalize_filters_and_deduplicates() {
    let dir = tempdir().unwrap();
    let lines = vec![
        raw_line("https://www.xiaohongshu.com/search_result/aaa?xsec_token=1", "first", "2.3万", "01-20 美国"),
        raw_line("https://www.xiaohongshu.com/search_result/bbb", "domestic", "5", "01-21 广东"),
        raw_line("https://www.xiaohongshu.com/user/profile/xyz", "no id", "5", "01-21 美国"),
        raw_line("https://www.xiaohongshu.com/search_result/aaa", "updated", "1.5万", "昨天 08:01 美国"),
        raw_line("https://www.xiaohongshu.com/search_result/ccc", "third", "点赞", "3 天前 日本"),
    ];
    let config = config_for(dir.path(), &lines);

    let stats = refinery::run(&config).unwrap();
    assert_eq!(stats.read, 5);
    assert_eq!(stats.kept, 2);
    assert_eq!(stats.domestic, 1);
    assert_eq!(stats.missing_id, 1);
    assert_eq!(stats.replaced, 1);

    let notes: Vec<Note> = read_jsonl(&config.output).unwrap();
    assert_eq!(notes.len(), 2);

    // later duplicate wins but keeps the first position
    assert_eq!(notes[0].id, "aaa");
    assert_eq!(notes[0].title, "updated");
    assert_eq!(notes[0].likes, 15_000);
    assert_eq!(notes[0].favorites, 0);
    assert_eq!(notes[0].comments, 12);
    assert_eq!(notes[0].time, "01-25");
    assert_eq!(notes[0].ip, "美国");

    assert_eq!(notes[1].id, "ccc");
    assert_eq!(notes[1].likes, 0);
    assert_eq!(notes[1].time, "01-23");
    assert_eq!(notes[1].ip, "日本");
}

#[test]
fn test_output_uses_canonical_key_order() {
    let dir = tempdir().unwrap();
    let lines = vec![raw_line(
        "https://www.xiaohongshu.com/search_result/aaa",
        "t",
        "1",
        "01-20 美国",
    )];
    let config = config_for(dir.path(), &lines);
    refinery::run(&config).unwrap();

    let out = fs::read_to_string(&config.output).unwrap();
    assert!(out.starts_with(r#"{"id":"aaa","user_nickname":"","title":"t""#));
    assert!(!out.contains("keyword"));
}

#[test]
fn test_malformed_counter_stops_the_stage() {
    let dir = tempdir().unwrap();
    let lines = vec![raw_line(
        "https://www.xiaohongshu.com/search_result/aaa",
        "t",
        "lots",
        "01-20 美国",
    )];
    let config = config_for(dir.path(), &lines);

    assert!(matches!(
        refinery::run(&config),
        Err(RefineryError::InvalidNumber(_))
    ));
    assert!(!config.output.exists());
}
