// * Record schema flowing between the pipeline stages
// * RawNote (collector) -> Note (normalizer) -> TokenizedNote (tokenizer)

use serde::{Deserialize, Serialize};

/// Counter placeholder used when a counter element is missing
pub const ZERO_COUNT: &str = "0";

fn zero_count() -> String {
    ZERO_COUNT.to_string()
}

/// One note as scraped from its detail page. Counters and time are kept
/// exactly as rendered; the normalizer parses them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNote {
    #[serde(default)]
    pub keyword: String,
    pub note_url: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub user_home: String,
    #[serde(default)]
    pub avatar_image: String,
    #[serde(default)]
    pub user_nickname: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub time: String,
    #[serde(default = "zero_count")]
    pub likes: String,
    #[serde(default = "zero_count")]
    pub favorites: String,
    #[serde(default = "zero_count")]
    pub comments: String,
}

impl RawNote {
    /// A record with every field at its default, as produced when no lookup succeeds
    pub fn empty(keyword: &str, note_url: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            note_url: note_url.to_string(),
            images: Vec::new(),
            user_home: String::new(),
            avatar_image: String::new(),
            user_nickname: String::new(),
            title: String::new(),
            tags: Vec::new(),
            text: String::new(),
            time: String::new(),
            likes: zero_count(),
            favorites: zero_count(),
            comments: zero_count(),
        }
    }

    /// Row for the spreadsheet mirror, in `CSV_HEADER` order
    pub fn csv_row(&self) -> [String; 12] {
        [
            self.note_url.clone(),
            self.title.clone(),
            self.likes.clone(),
            self.favorites.clone(),
            self.comments.clone(),
            self.time.clone(),
            self.images.join("|"),
            self.user_home.clone(),
            self.avatar_image.clone(),
            self.user_nickname.clone(),
            self.tags.join("|"),
            self.text.clone(),
        ]
    }
}

/// Header of the collector's CSV mirror
pub const CSV_HEADER: [&str; 12] = [
    "笔记链接", "标题", "喜欢数", "收藏数", "评论数", "时间", "笔记图片", "用户主页", "头像图片",
    "用户昵称", "标签", "文本",
];

/// A normalized note. Field order here is the canonical output key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub user_nickname: String,
    pub title: String,
    pub text: String,
    pub tags: Vec<String>,
    pub likes: i64,
    pub favorites: i64,
    pub comments: i64,
    /// Resolved `MM-DD` date (or the raw string when unrecognized)
    pub time: String,
    /// Region label; empty when the time string carried none
    pub ip: String,
    pub note_url: String,
    pub images: Vec<String>,
    pub user_home: String,
    pub avatar_image: String,
}

/// A normalized note with its space-joined token string appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizedNote {
    #[serde(flatten)]
    pub note: Note,
    pub text_processed: String,
}

impl TokenizedNote {
    /// Whitespace-delimited tokens of `text_processed`
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.text_processed.split_whitespace()
    }
}

/// Lenient view of a tokenized record used by the analytics consumers.
/// Only the fields they read are required to be well-formed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusDoc {
    pub title: Option<String>,
    pub text: String,
    pub text_processed: String,
    pub images: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note() -> Note {
        Note {
            id: "abc123".into(),
            user_nickname: "nick".into(),
            title: "t".into(),
            text: "body".into(),
            tags: vec!["#tag".into()],
            likes: 12000,
            favorites: 3,
            comments: 0,
            time: "01-26".into(),
            ip: "美国".into(),
            note_url: "https://www.xiaohongshu.com/search_result/abc123".into(),
            images: vec![],
            user_home: String::new(),
            avatar_image: String::new(),
        }
    }

    #[test]
    fn test_note_serializes_in_canonical_order() {
        let json = serde_json::to_string(&sample_note()).unwrap();
        let keys = [
            "\"id\"", "\"user_nickname\"", "\"title\"", "\"text\"", "\"tags\"", "\"likes\"",
            "\"favorites\"", "\"comments\"", "\"time\"", "\"ip\"", "\"note_url\"", "\"images\"",
            "\"user_home\"", "\"avatar_image\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_tokenized_note_appends_text_processed_last() {
        let tokenized = TokenizedNote {
            note: sample_note(),
            text_processed: "hello 世界".into(),
        };
        let json = serde_json::to_string(&tokenized).unwrap();
        assert!(json.ends_with("\"text_processed\":\"hello 世界\"}"));

        let back: TokenizedNote = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tokenized);
        assert_eq!(back.tokens().collect::<Vec<_>>(), vec!["hello", "世界"]);
    }

    #[test]
    fn test_raw_note_defaults_missing_counters() {
        let raw: RawNote = serde_json::from_str(r#"{"note_url":"u"}"#).unwrap();
        assert_eq!(raw.likes, "0");
        assert_eq!(raw.comments, "0");
        assert!(raw.images.is_empty());
    }

    #[test]
    fn test_csv_row_joins_lists() {
        let mut raw = RawNote::empty("k", "u");
        raw.images = vec!["a".into(), "b".into()];
        raw.tags = vec!["#x".into(), "#y".into()];
        let row = raw.csv_row();
        assert_eq!(row[6], "a|b");
        assert_eq!(row[10], "#x|#y");
        assert_eq!(row.len(), CSV_HEADER.len());
    }

    #[test]
    fn test_corpus_doc_tolerates_missing_fields() {
        let doc: CorpusDoc = serde_json::from_str(r#"{"text_processed":"a b"}"#).unwrap();
        assert_eq!(doc.text_processed, "a b");
        assert!(doc.title.is_none());
    }
}
