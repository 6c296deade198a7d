// * Mixed-script tokenizer
// * Text is split into alternating CJK and non-CJK runs. CJK runs go through
// * jieba word segmentation; other runs are lowercased and split on Unicode
// * word boundaries. Stop-words and blank tokens are dropped.

use jieba_rs::Jieba;
use regex::Regex;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{info, warn};
use unicode_segmentation::UnicodeSegmentation;

use super::stopwords::StopWords;
use super::AnalyticsError;
use crate::config::TokenizerConfig;
use crate::persistence::{read_jsonl, write_jsonl, Note, TokenizedNote};

// * CJK Unified Ideographs basic block as used for segmentation
static CJK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\u{4e00}-\u{9fa5}]+").unwrap());

/// A maximal run of one script class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Run<'a> {
    Cjk(&'a str),
    Other(&'a str),
}

/// Splits `text` into trimmed, non-empty runs, preserving order
pub fn split_runs(text: &str) -> Vec<Run<'_>> {
    fn push_other<'a>(runs: &mut Vec<Run<'a>>, s: &'a str) {
        let s = s.trim();
        if !s.is_empty() {
            runs.push(Run::Other(s));
        }
    }

    let mut runs = Vec::new();
    let mut cursor = 0;

    for m in CJK_RUN.find_iter(text) {
        push_other(&mut runs, &text[cursor..m.start()]);
        runs.push(Run::Cjk(m.as_str()));
        cursor = m.end();
    }
    push_other(&mut runs, &text[cursor..]);

    runs
}

pub struct MixedTokenizer {
    jieba: Jieba,
    stopwords: StopWords,
}

impl MixedTokenizer {
    pub fn new(stopwords: StopWords) -> Self {
        Self {
            jieba: Jieba::new(),
            stopwords,
        }
    }

    /// Adds a user dictionary (jieba format: `word [freq] [tag]` per line).
    /// Failures are logged; the default dictionary stays usable.
    pub fn load_user_dict(&mut self, path: &Path) {
        let loaded = File::open(path)
            .map_err(|e| e.to_string())
            .and_then(|file| {
                self.jieba
                    .load_dict(&mut BufReader::new(file))
                    .map_err(|e| e.to_string())
            });
        match loaded {
            Ok(()) => info!(path = %path.display(), "User dictionary loaded"),
            Err(e) => warn!(path = %path.display(), error = %e, "User dictionary not loaded"),
        }
    }

    /// Tokens of `text` in reading order, stop-words removed
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();

        for run in split_runs(text) {
            match run {
                Run::Cjk(segment) => {
                    tokens.extend(self.jieba.cut(segment, true).into_iter().map(str::to_string));
                }
                Run::Other(segment) => {
                    let lowered = segment.to_lowercase();
                    tokens.extend(lowered.split_word_bounds().map(str::to_string));
                }
            }
        }

        tokens
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && !self.stopwords.contains(t))
            .collect()
    }

    /// Space-joined token string
    pub fn process(&self, text: &str) -> String {
        self.tokenize(text).join(" ")
    }
}

/// Counters for one tokenize run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizeStats {
    pub read: usize,
    pub written: usize,
    pub skipped_empty: usize,
}

/// Runs the tokenize stage from file to file
pub fn run(config: &TokenizerConfig) -> Result<TokenizeStats, AnalyticsError> {
    let stopwords = StopWords::load(config.cn_stopwords.as_deref(), config.en_stopwords.as_deref());
    let mut tokenizer = MixedTokenizer::new(stopwords);
    if let Some(dict) = &config.user_dict {
        tokenizer.load_user_dict(dict);
    }

    let notes: Vec<Note> = read_jsonl(&config.input)?;
    let mut stats = TokenizeStats {
        read: notes.len(),
        ..Default::default()
    };
    info!(input = %config.input.display(), records = notes.len(), "Tokenizing notes");

    let tokenized: Vec<TokenizedNote> = notes
        .into_iter()
        .filter(|note| {
            let keep = !note.text.is_empty();
            if !keep {
                stats.skipped_empty += 1;
            }
            keep
        })
        .map(|note| {
            let text_processed = tokenizer.process(&note.text);
            TokenizedNote {
                note,
                text_processed,
            }
        })
        .collect();

    stats.written = write_jsonl(&config.output, &tokenized)?;
    info!(
        output = %config.output.display(),
        written = stats.written,
        skipped_empty = stats.skipped_empty,
        "Tokenization complete"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_runs_alternates() {
        assert_eq!(
            split_runs("hello世界test"),
            vec![Run::Other("hello"), Run::Cjk("世界"), Run::Other("test")]
        );
    }

    #[test]
    fn test_split_runs_trims_and_drops_blank() {
        assert_eq!(
            split_runs("  你好 , world  "),
            vec![Run::Cjk("你好"), Run::Other(", world")]
        );
        assert!(split_runs("   ").is_empty());
    }

    #[test]
    fn test_mixed_text() {
        let tokenizer = MixedTokenizer::new(StopWords::bundled());
        assert_eq!(tokenizer.tokenize("hello世界test"), vec!["hello", "世界", "test"]);
    }

    #[test]
    fn test_english_is_lowercased_and_filtered() {
        let tokenizer = MixedTokenizer::new(StopWords::bundled());
        let tokens = tokenizer.tokenize("The Refugees are HERE");
        assert_eq!(tokens, vec!["refugees"]);
    }

    #[test]
    fn test_custom_stopwords_apply_to_cjk() {
        let mut stop = StopWords::bundled();
        stop.extend_lines("世界", false);
        let tokenizer = MixedTokenizer::new(stop);
        assert_eq!(tokenizer.process("hello世界"), "hello");
    }
}
