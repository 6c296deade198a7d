use notesift::analytics::tokenizer::{self, MixedTokenizer};
use notesift::analytics::StopWords;
use notesift::config::TokenizerConfig;
use notesift::persistence::{read_jsonl, write_jsonl, Note, TokenizedNote};
use std::fs;
use tempfile::tempdir;

fn note(id: &str, text: &str) -> Note {
    Note {
        id: id.to_string(),
        user_nickname: "nick".to_string(),
        title: format!("title {}", id),
        text: text.to_string(),
        tags: vec![],
        likes: 1,
        favorites: 2,
        comments: 3,
        time: "01-20".to_string(),
        ip: "美国".to_string(),
        note_url: format!("https://www.xiaohongshu.com/search_result/{}", id),
        images: vec![],
        user_home: String::new(),
        avatar_image: String::new(),
    }
}

#[test]
fn test_mixed_script_tokens() {
    let tokenizer = MixedTokenizer::new(StopWords::bundled());
    assert_eq!(tokenizer.tokenize("hello世界test"), vec!["hello", "世界", "test"]);
    assert_eq!(tokenizer.process("Hello, World!"), "hello , world !");
}

#[test]
fn test_tokenize_stage_appends_text_processed() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("processed_notes.jsonl");
    let cn = dir.path().join("cn_stopwords.txt");
    fs::write(&cn, "的\n").unwrap();
    write_jsonl(&input, &[note("a", "hello世界test 的"), note("b", ""), note("c", "The END")]).unwrap();

    let config = TokenizerConfig {
        input,
        output: dir.path().join("preprocessed_data.jsonl"),
        cn_stopwords: Some(cn),
        en_stopwords: Some(dir.path().join("missing.txt")),
        user_dict: None,
    };
    let stats = tokenizer::run(&config).unwrap();
    assert_eq!(stats.read, 3);
    assert_eq!(stats.written, 2);
    assert_eq!(stats.skipped_empty, 1);

    let out: Vec<TokenizedNote> = read_jsonl(&config.output).unwrap();
    assert_eq!(out[0].note.id, "a");
    assert_eq!(out[0].text_processed, "hello 世界 test");
    assert_eq!(out[1].note.id, "c");
    assert_eq!(out[1].text_processed, "end");

    // the note fields pass through unchanged, flattened next to text_processed
    let raw = fs::read_to_string(&config.output).unwrap();
    let first = raw.lines().next().unwrap();
    assert!(first.starts_with(r#"{"id":"a""#));
    assert!(first.ends_with(r#""text_processed":"hello 世界 test"}"#));
}
