// * TF-IDF keyword ranking
// * Smoothed idf, L2-normalized document rows, score = column sum.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{info, warn};

use super::stopwords::StopWords;
use super::wordcloud;
use super::AnalyticsError;
use crate::config::TfidfConfig;
use crate::persistence::{ensure_parent, read_jsonl, CorpusDoc};

static WORD_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermScore {
    pub word: String,
    pub score: f64,
}

/// Lowercased word tokens of one document, stop-words removed
fn analyze(doc: &str, stopwords: &StopWords) -> Vec<String> {
    let lowered = doc.to_lowercase();
    WORD_TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .filter(|t| !stopwords.contains(t))
        .collect()
}

/// Ranks terms over `docs`, keeping the `max_features` most frequent terms
pub fn rank_terms<S: AsRef<str>>(
    docs: &[S],
    stopwords: &StopWords,
    max_features: usize,
) -> Vec<TermScore> {
    let n_docs = docs.len();
    let counts: Vec<HashMap<String, usize>> = docs
        .iter()
        .map(|doc| {
            let mut tf: HashMap<String, usize> = HashMap::new();
            for token in analyze(doc.as_ref(), stopwords) {
                *tf.entry(token).or_default() += 1;
            }
            tf
        })
        .collect();

    // * corpus frequency and document frequency per term, term-sorted
    let mut corpus: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for tf in &counts {
        for (term, &c) in tf {
            let entry = corpus.entry(term.as_str()).or_default();
            entry.0 += c;
            entry.1 += 1;
        }
    }

    let mut vocab: Vec<(&str, usize, usize)> = corpus.into_iter().map(|(t, (c, df))| (t, c, df)).collect();
    if vocab.len() > max_features {
        vocab.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        vocab.truncate(max_features);
        vocab.sort_by(|a, b| a.0.cmp(b.0));
    }

    let idf: Vec<f64> = vocab
        .iter()
        .map(|&(_, _, df)| ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0)
        .collect();

    let mut totals = vec![0.0f64; vocab.len()];
    for tf in &counts {
        let row: Vec<f64> = vocab
            .iter()
            .zip(&idf)
            .map(|(&(term, _, _), w)| tf.get(term).copied().unwrap_or(0) as f64 * w)
            .collect();
        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (total, v) in totals.iter_mut().zip(&row) {
                *total += v / norm;
            }
        }
    }

    let mut scores: Vec<TermScore> = vocab
        .iter()
        .zip(totals)
        .map(|(&(term, _, _), score)| TermScore {
            word: term.to_string(),
            score,
        })
        .collect();
    // stable: equal scores stay in term order
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    scores
}

/// Pretty JSON with four-space indentation
pub fn write_scores(path: &Path, scores: &[TermScore]) -> Result<(), AnalyticsError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    scores
        .serialize(&mut ser)
        .map_err(|e| AnalyticsError::Store(e.into()))?;

    ensure_parent(path)?;
    fs::write(path, buf).map_err(|e| AnalyticsError::io(path, e))
}

fn load_stopwords(path: Option<&Path>) -> StopWords {
    let mut set = StopWords::default();
    if let Some(path) = path {
        match fs::read_to_string(path) {
            Ok(content) => {
                let added = set.extend_lines(&content, false);
                info!(path = %path.display(), added = added, "TF-IDF stop-words loaded");
            }
            Err(e) => warn!(path = %path.display(), error = %e, "TF-IDF stop-word list unavailable"),
        }
    }
    set
}

/// Runs the TF-IDF stage and renders the word cloud when a font is configured
pub fn run(config: &TfidfConfig) -> Result<Vec<TermScore>, AnalyticsError> {
    let docs: Vec<CorpusDoc> = read_jsonl(&config.input)?;
    let texts: Vec<&str> = docs.iter().map(|d| d.text_processed.as_str()).collect();
    let stopwords = load_stopwords(config.stopwords.as_deref());

    let scores = rank_terms(&texts, &stopwords, config.max_features);
    write_scores(&config.output_json, &scores)?;
    info!(
        documents = texts.len(),
        terms = scores.len(),
        output = %config.output_json.display(),
        "TF-IDF scores written"
    );

    match &config.font {
        Some(font) => {
            wordcloud::render_to_file(&scores, font, config)?;
            info!(output = %config.output_image.display(), "Word cloud written");
        }
        None => warn!("No font configured, word cloud image skipped"),
    }

    Ok(scores)
}
