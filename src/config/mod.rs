// * Typed per-stage configuration
// * Every struct defaults to the values in `constants`; the CLI overrides individual fields.

pub mod constants;

use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use constants::*;

/// A fixed delay plus a uniformly drawn extra delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    pub base: Duration,
    pub min_extra: Duration,
    pub max_extra: Duration,
}

impl Jitter {
    pub const fn from_millis(base: u64, extra: (u64, u64)) -> Self {
        Self {
            base: Duration::from_millis(base),
            min_extra: Duration::from_millis(extra.0),
            max_extra: Duration::from_millis(extra.1),
        }
    }

    /// No delay at all. Used by tests and dry runs.
    pub const fn none() -> Self {
        Self::from_millis(0, (0, 0))
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub proxy: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            proxy: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub keywords: Vec<String>,
    pub max_notes: usize,
    pub site_root: String,
    pub search_base_url: String,
    pub jsonl_output: PathBuf,
    pub csv_dir: PathBuf,
    /// Chrome profile directory so a manual login survives between runs
    pub user_data_dir: Option<PathBuf>,
    pub headless: bool,
    /// Wait for the operator to log in before scraping
    pub login_prompt: bool,
    pub page_timeout: Duration,
    pub search_settle: Jitter,
    pub scroll_pause: Jitter,
    pub detail_settle: Jitter,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            keywords: vec![DEFAULT_KEYWORD.to_string()],
            max_notes: MAX_NOTES,
            site_root: SITE_ROOT.to_string(),
            search_base_url: SEARCH_BASE_URL.to_string(),
            jsonl_output: PathBuf::from(RAW_NOTES_FILE),
            csv_dir: PathBuf::from(CSV_DIR),
            user_data_dir: None,
            headless: false,
            login_prompt: true,
            page_timeout: Duration::from_millis(PAGE_TIMEOUT_MS),
            search_settle: Jitter::from_millis(SEARCH_SETTLE_BASE_MS, SEARCH_SETTLE_JITTER_MS),
            scroll_pause: Jitter::from_millis(SCROLL_BASE_MS, SCROLL_JITTER_MS),
            detail_settle: Jitter::from_millis(DETAIL_BASE_MS, DETAIL_JITTER_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Date that "今天" refers to; should be the collection date
    pub reference_date: NaiveDate,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(RAW_NOTES_FILE),
            output: PathBuf::from(PROCESSED_NOTES_FILE),
            reference_date: chrono::Local::now().date_naive(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub cn_stopwords: Option<PathBuf>,
    pub en_stopwords: Option<PathBuf>,
    pub user_dict: Option<PathBuf>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(PROCESSED_NOTES_FILE),
            output: PathBuf::from(TOKENIZED_NOTES_FILE),
            cn_stopwords: Some(PathBuf::from(CN_STOPWORDS_FILE)),
            en_stopwords: Some(PathBuf::from(EN_STOPWORDS_FILE)),
            user_dict: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TfidfConfig {
    pub input: PathBuf,
    pub output_json: PathBuf,
    pub output_image: PathBuf,
    pub stopwords: Option<PathBuf>,
    pub max_features: usize,
    /// TrueType/OpenType font able to render the corpus script
    pub font: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub max_font_px: f32,
    pub min_font_px: f32,
    pub seed: u64,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(TOKENIZED_NOTES_FILE),
            output_json: PathBuf::from(TFIDF_OUTPUT_FILE),
            output_image: PathBuf::from(WORDCLOUD_OUTPUT_FILE),
            stopwords: None,
            max_features: TFIDF_MAX_FEATURES,
            font: None,
            width: WORDCLOUD_WIDTH,
            height: WORDCLOUD_HEIGHT,
            max_font_px: WORDCLOUD_MAX_FONT_PX,
            min_font_px: WORDCLOUD_MIN_FONT_PX,
            seed: 0,
        }
    }
}

/// Topic coherence score reported by the sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoherenceMeasure {
    /// NPMI context vectors over a boolean sliding window
    #[default]
    Cv,
    /// Document co-occurrence log conditional probability
    UMass,
}

impl FromStr for CoherenceMeasure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "c_v" | "cv" => Ok(Self::Cv),
            "u_mass" | "umass" => Ok(Self::UMass),
            other => Err(format!("unknown coherence measure '{}', expected c_v or u_mass", other)),
        }
    }
}

impl fmt::Display for CoherenceMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cv => write!(f, "c_v"),
            Self::UMass => write!(f, "u_mass"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TopicConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub min_topics: usize,
    pub max_topics: usize,
    pub iterations: usize,
    pub top_words: usize,
    pub max_features: usize,
    pub max_df: f64,
    pub min_df: usize,
    pub seed: u64,
    pub coherence: CoherenceMeasure,
    /// Sliding window for c_v, in tokens
    pub coherence_window: usize,
    /// Font for the sweep chart labels; the chart is drawn unlabelled without one
    pub font: Option<PathBuf>,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(TOKENIZED_NOTES_FILE),
            output_dir: PathBuf::from(TOPIC_OUTPUT_DIR),
            min_topics: TOPIC_MIN,
            max_topics: TOPIC_MAX,
            iterations: TOPIC_ITERATIONS,
            top_words: TOPIC_TOP_WORDS,
            max_features: TOPIC_MAX_FEATURES,
            max_df: TOPIC_MAX_DF,
            min_df: TOPIC_MIN_DF,
            seed: TOPIC_SEED,
            coherence: CoherenceMeasure::default(),
            coherence_window: TOPIC_COHERENCE_WINDOW,
            font: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NetworkGraphConfig {
    pub input: PathBuf,
    pub nodes_csv: PathBuf,
    pub edges_csv: PathBuf,
    pub window: usize,
}

impl Default for NetworkGraphConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(TOKENIZED_NOTES_FILE),
            nodes_csv: PathBuf::from(NODES_CSV),
            edges_csv: PathBuf::from(EDGES_CSV),
            window: COOCCURRENCE_WINDOW,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub requests_per_second: u32,
    pub concurrency: usize,
    pub http: HttpConfig,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(TOKENIZED_NOTES_FILE),
            output_dir: PathBuf::from(IMAGE_DIR),
            requests_per_second: DOWNLOAD_REQUESTS_PER_SECOND,
            concurrency: DOWNLOAD_CONCURRENCY,
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollageConfig {
    pub image_dir: PathBuf,
    pub output: PathBuf,
    pub rows: u32,
    pub cols: u32,
    pub max_width: u32,
    pub jpeg_quality: u8,
    /// Fixed shuffle seed; `None` draws from the OS
    pub seed: Option<u64>,
}

impl Default for CollageConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from(IMAGE_DIR),
            output: PathBuf::from(COLLAGE_OUTPUT_FILE),
            rows: COLLAGE_ROWS,
            cols: COLLAGE_COLS,
            max_width: COLLAGE_MAX_WIDTH,
            jpeg_quality: COLLAGE_JPEG_QUALITY,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_defaults_match_constants() {
        let config = CollectorConfig::default();
        assert_eq!(config.max_notes, MAX_NOTES);
        assert_eq!(config.keywords, vec![DEFAULT_KEYWORD.to_string()]);
        assert_eq!(config.scroll_pause.base, Duration::from_millis(SCROLL_BASE_MS));
        assert!(config.login_prompt);
    }

    #[test]
    fn test_stage_files_chain() {
        // * Each stage reads what the previous one writes
        assert_eq!(CollectorConfig::default().jsonl_output, NormalizerConfig::default().input);
        assert_eq!(NormalizerConfig::default().output, TokenizerConfig::default().input);
        assert_eq!(TokenizerConfig::default().output, TfidfConfig::default().input);
        assert_eq!(TokenizerConfig::default().output, DownloadConfig::default().input);
        assert_eq!(DownloadConfig::default().output_dir, CollageConfig::default().image_dir);
    }

    #[test]
    fn test_coherence_measure_names() {
        assert_eq!("c_v".parse::<CoherenceMeasure>().unwrap(), CoherenceMeasure::Cv);
        assert_eq!("u-mass".parse::<CoherenceMeasure>().unwrap(), CoherenceMeasure::UMass);
        assert!("npmi".parse::<CoherenceMeasure>().is_err());
        assert_eq!(TopicConfig::default().coherence.to_string(), "c_v");
        assert_eq!(TopicConfig::default().coherence_window, 110);
    }

    #[test]
    fn test_jitter_none_is_zero() {
        let j = Jitter::none();
        assert_eq!(j.base, Duration::ZERO);
        assert_eq!(j.max_extra, Duration::ZERO);
    }
}
