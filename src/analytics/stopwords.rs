// * Combined stop-word set: CJK list file + English list file + bundled English defaults

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Bundled English stop-words (the common NLTK English list)
pub const DEFAULT_ENGLISH: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Only the bundled English defaults
    pub fn bundled() -> Self {
        Self {
            words: DEFAULT_ENGLISH.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Bundled defaults plus the optional on-disk lists. A missing or
    /// unreadable list is logged and skipped.
    pub fn load(cn_list: Option<&Path>, en_list: Option<&Path>) -> Self {
        let mut set = Self::bundled();

        match cn_list.map(|p| (p, fs::read_to_string(p))) {
            Some((path, Ok(content))) => {
                let added = set.extend_lines(&content, false);
                info!(path = %path.display(), added = added, "CJK stop-words loaded");
            }
            Some((path, Err(e))) => {
                warn!(path = %path.display(), error = %e, "CJK stop-word list unavailable, skipping")
            }
            None => {}
        }

        match en_list.map(|p| (p, fs::read_to_string(p))) {
            Some((path, Ok(content))) => {
                let added = set.extend_lines(&content, true);
                info!(path = %path.display(), added = added, "English stop-words loaded");
            }
            Some((path, Err(e))) => {
                warn!(path = %path.display(), error = %e, "English stop-word list unavailable, using bundled list only")
            }
            None => {}
        }

        set
    }

    /// Adds one term per non-blank line; returns how many were new
    pub fn extend_lines(&mut self, content: &str, lowercase: bool) -> usize {
        let before = self.words.len();
        for line in content.lines() {
            let term = line.trim();
            if term.is_empty() {
                continue;
            }
            if lowercase {
                self.words.insert(term.to_lowercase());
            } else {
                self.words.insert(term.to_string());
            }
        }
        self.words.len() - before
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_bundled_list() {
        let set = StopWords::bundled();
        assert!(set.contains("the"));
        assert!(set.contains("don't"));
        assert!(!set.contains("hello"));
        assert_eq!(set.len(), DEFAULT_ENGLISH.len());
    }

    #[test]
    fn test_load_merges_files() {
        let dir = tempdir().unwrap();
        let cn = dir.path().join("cn.txt");
        let en = dir.path().join("en.txt");
        fs::write(&cn, "的\n  了 \n\n").unwrap();
        fs::write(&en, "Refugee\nTHE\n").unwrap();

        let set = StopWords::load(Some(&cn), Some(&en));
        assert!(set.contains("的"));
        assert!(set.contains("了"));
        assert!(set.contains("refugee"));
        assert!(!set.contains("Refugee"));
        assert_eq!(set.len(), DEFAULT_ENGLISH.len() + 3);
    }

    #[test]
    fn test_missing_files_fall_back_to_bundled() {
        let set = StopWords::load(
            Some(Path::new("/no/such/cn.txt")),
            Some(Path::new("/no/such/en.txt")),
        );
        assert_eq!(set.len(), DEFAULT_ENGLISH.len());
    }
}
