// * Text analytics over the normalized corpus
// * tokenizer -> (tfidf + wordcloud | lda + topics + coherence + chart | network)

pub mod chart;
pub mod coherence;
pub mod lda;
pub mod network;
pub mod stopwords;
pub mod tfidf;
pub mod tokenizer;
pub mod topics;
pub mod wordcloud;

pub use network::CooccurrenceGraph;
pub use stopwords::StopWords;
pub use tfidf::TermScore;
pub use tokenizer::MixedTokenizer;

use std::path::PathBuf;
use thiserror::Error;

use crate::persistence::StoreError;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Font {path} is not a usable TrueType/OpenType font")]
    Font { path: PathBuf },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Vocabulary is empty after pruning: {0}")]
    EmptyVocabulary(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl AnalyticsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
