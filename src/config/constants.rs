// * Configuration Constants
// * Central location for all default paths, thresholds and delays

// --- Collector ---

// * Site root used to resolve relative links
pub const SITE_ROOT: &str = "https://www.xiaohongshu.com";

// * Search results page, keyword is appended percent-encoded
pub const SEARCH_BASE_URL: &str = "https://www.xiaohongshu.com/search_result?keyword=";

// * Maximum note links collected per keyword
pub const MAX_NOTES: usize = 500;

// * Keyword searched when none is given on the command line
pub const DEFAULT_KEYWORD: &str = "tiktokrefugee";

// * Settle delay after opening the search page (base + uniform jitter), in ms
pub const SEARCH_SETTLE_BASE_MS: u64 = 3_000;
pub const SEARCH_SETTLE_JITTER_MS: (u64, u64) = (1_000, 3_000);

// * Delay after each scroll-to-bottom, in ms
pub const SCROLL_BASE_MS: u64 = 2_000;
pub const SCROLL_JITTER_MS: (u64, u64) = (1_000, 2_000);

// * Delay after opening a note detail page, in ms
pub const DETAIL_BASE_MS: u64 = 1_000;
pub const DETAIL_JITTER_MS: (u64, u64) = (500, 2_000);

// * Page navigation timeout in milliseconds
pub const PAGE_TIMEOUT_MS: u64 = 60_000;

// * Progress is logged every N extracted notes
pub const PROGRESS_EVERY: usize = 10;

pub const RAW_NOTES_FILE: &str = "notes.jsonl";
pub const CSV_DIR: &str = "csv";

// --- Normalizer ---

pub const PROCESSED_NOTES_FILE: &str = "processed_notes.jsonl";

// --- Tokenizer ---

pub const TOKENIZED_NOTES_FILE: &str = "preprocessed_data.jsonl";
pub const CN_STOPWORDS_FILE: &str = "stopword_cn.txt";
pub const EN_STOPWORDS_FILE: &str = "stopwords_en.txt";

// --- TF-IDF / Word cloud ---

pub const TFIDF_MAX_FEATURES: usize = 100;
pub const TFIDF_OUTPUT_FILE: &str = "tfidf_result.json";
pub const WORDCLOUD_OUTPUT_FILE: &str = "wordcloud.png";
pub const WORDCLOUD_WIDTH: u32 = 800;
pub const WORDCLOUD_HEIGHT: u32 = 400;
pub const WORDCLOUD_MAX_FONT_PX: f32 = 96.0;
pub const WORDCLOUD_MIN_FONT_PX: f32 = 10.0;

// --- Topic sweep ---

pub const TOPIC_MIN: usize = 4;
pub const TOPIC_MAX: usize = 12;
pub const TOPIC_ITERATIONS: usize = 50;
pub const TOPIC_TOP_WORDS: usize = 20;
pub const TOPIC_SEED: u64 = 0;
pub const TOPIC_MAX_FEATURES: usize = 1_000;
// * Proportion of documents
pub const TOPIC_MAX_DF: f64 = 0.5;
// * Absolute document count
pub const TOPIC_MIN_DF: usize = 10;
pub const TOPIC_OUTPUT_DIR: &str = "topics";
// * Boolean sliding window of the c_v coherence measure, in tokens
pub const TOPIC_COHERENCE_WINDOW: usize = 110;
pub const TOPIC_CHART_FILE: &str = "perplexity_coherence.png";

// --- Co-occurrence network ---

pub const COOCCURRENCE_WINDOW: usize = 2;
pub const NODES_CSV: &str = "network_nodes.csv";
pub const EDGES_CSV: &str = "network_edges.csv";

// --- Images ---

pub const IMAGE_DIR: &str = "downloaded_images";
pub const IMAGE_EXTENSION: &str = "webp";
pub const DOWNLOAD_REQUESTS_PER_SECOND: u32 = 5;
pub const DOWNLOAD_CONCURRENCY: usize = 1;
pub const HTTP_TIMEOUT_SECS: u64 = 30;

pub const COLLAGE_OUTPUT_FILE: &str = "final_collage.jpg";
pub const COLLAGE_ROWS: u32 = 20;
pub const COLLAGE_COLS: u32 = 50;
pub const COLLAGE_MAX_WIDTH: u32 = 5_000;
pub const COLLAGE_JPEG_QUALITY: u8 = 95;
