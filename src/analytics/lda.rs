// * Count vectorization and LDA by collapsed Gibbs sampling

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;
use tracing::debug;

use super::AnalyticsError;

// * Two or more word characters
static TERM_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Sparse document-term counts over a sorted vocabulary
#[derive(Debug, Clone, PartialEq)]
pub struct CountMatrix {
    pub vocab: Vec<String>,
    /// Per document: (term index, count), term index ascending
    pub rows: Vec<Vec<(usize, u32)>>,
}

impl CountMatrix {
    pub fn n_docs(&self) -> usize {
        self.rows.len()
    }

    pub fn n_terms(&self) -> usize {
        self.vocab.len()
    }

    pub fn doc_len(&self, doc: usize) -> u64 {
        self.rows[doc].iter().map(|&(_, c)| c as u64).sum()
    }

    /// Corpus-wide count per term
    pub fn term_totals(&self) -> Vec<u64> {
        let mut totals = vec![0u64; self.vocab.len()];
        for row in &self.rows {
            for &(w, c) in row {
                totals[w] += c as u64;
            }
        }
        totals
    }
}

/// Builds the document-term matrix.
///
/// Terms in more than `max_df * n_docs` documents or fewer than `min_df`
/// documents are pruned, then the `max_features` most frequent terms are kept.
pub fn vectorize<S: AsRef<str>>(
    texts: &[S],
    max_features: usize,
    max_df: f64,
    min_df: usize,
) -> Result<CountMatrix, AnalyticsError> {
    let n_docs = texts.len();
    let max_doc_count = max_df * n_docs as f64;
    if max_doc_count < min_df as f64 {
        return Err(AnalyticsError::InvalidParameter(format!(
            "max_df {} covers {:.1} documents, fewer than min_df {}",
            max_df, max_doc_count, min_df
        )));
    }

    let counts: Vec<HashMap<String, u32>> = texts
        .iter()
        .map(|text| {
            let lowered = text.as_ref().to_lowercase();
            let mut tf: HashMap<String, u32> = HashMap::new();
            for m in TERM_TOKEN.find_iter(&lowered) {
                *tf.entry(m.as_str().to_string()).or_default() += 1;
            }
            tf
        })
        .collect();

    // * term -> (corpus count, document frequency)
    let mut stats: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
    for tf in &counts {
        for (term, &c) in tf {
            let entry = stats.entry(term.as_str()).or_default();
            entry.0 += c as u64;
            entry.1 += 1;
        }
    }
    let seen = stats.len();

    let mut kept: Vec<(&str, u64)> = stats
        .into_iter()
        .filter(|&(_, (_, df))| df >= min_df && df as f64 <= max_doc_count)
        .map(|(term, (total, _))| (term, total))
        .collect();

    if kept.len() > max_features {
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        kept.truncate(max_features);
        kept.sort_by(|a, b| a.0.cmp(b.0));
    }

    if kept.is_empty() {
        return Err(AnalyticsError::EmptyVocabulary(format!(
            "{} candidate terms over {} documents, none within min_df={} max_df={}",
            seen, n_docs, min_df, max_df
        )));
    }

    let vocab: Vec<String> = kept.iter().map(|(t, _)| t.to_string()).collect();
    let index: HashMap<&str, usize> = vocab.iter().enumerate().map(|(i, t)| (t.as_str(), i)).collect();

    let rows = counts
        .iter()
        .map(|tf| {
            let mut row: Vec<(usize, u32)> = tf
                .iter()
                .filter_map(|(term, &c)| index.get(term.as_str()).map(|&w| (w, c)))
                .collect();
            row.sort_unstable();
            row
        })
        .collect();

    debug!(candidates = seen, vocabulary = vocab.len(), documents = n_docs, "Vectorized corpus");
    Ok(CountMatrix { vocab, rows })
}

/// Fitted topic model
#[derive(Debug, Clone)]
pub struct LdaModel {
    pub n_topics: usize,
    pub alpha: f64,
    pub beta: f64,
    /// K x V, rows sum to 1
    pub topic_word: Vec<Vec<f64>>,
    /// D x K, rows sum to 1
    pub doc_topic: Vec<Vec<f64>>,
}

/// Fits LDA with symmetric priors alpha = beta = 1/K
pub fn fit(matrix: &CountMatrix, n_topics: usize, iterations: usize, seed: u64) -> LdaModel {
    let k = n_topics.max(1);
    let v = matrix.n_terms();
    let alpha = 1.0 / k as f64;
    let beta = alpha;
    let v_beta = v as f64 * beta;
    let mut rng = StdRng::seed_from_u64(seed);

    // * expand counts into token streams with random initial topics
    let tokens: Vec<Vec<usize>> = matrix
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .flat_map(|&(w, c)| std::iter::repeat(w).take(c as usize))
                .collect()
        })
        .collect();

    let mut n_dk = vec![vec![0u32; k]; tokens.len()];
    let mut n_kw = vec![vec![0u32; v]; k];
    let mut n_k = vec![0u32; k];
    let mut z: Vec<Vec<usize>> = Vec::with_capacity(tokens.len());

    for (d, doc) in tokens.iter().enumerate() {
        let mut assignments = Vec::with_capacity(doc.len());
        for &w in doc {
            let t = rng.gen_range(0..k);
            n_dk[d][t] += 1;
            n_kw[t][w] += 1;
            n_k[t] += 1;
            assignments.push(t);
        }
        z.push(assignments);
    }

    let mut weights = vec![0.0f64; k];
    for sweep in 0..iterations {
        for (d, doc) in tokens.iter().enumerate() {
            for (i, &w) in doc.iter().enumerate() {
                let old = z[d][i];
                n_dk[d][old] -= 1;
                n_kw[old][w] -= 1;
                n_k[old] -= 1;

                let mut total = 0.0;
                for t in 0..k {
                    total += (n_dk[d][t] as f64 + alpha) * (n_kw[t][w] as f64 + beta)
                        / (n_k[t] as f64 + v_beta);
                    weights[t] = total;
                }

                let u = rng.gen::<f64>() * total;
                let new = weights.iter().position(|&cum| u < cum).unwrap_or(k - 1);

                z[d][i] = new;
                n_dk[d][new] += 1;
                n_kw[new][w] += 1;
                n_k[new] += 1;
            }
        }
        if (sweep + 1) % 10 == 0 {
            debug!(n_topics = k, sweep = sweep + 1, "Gibbs sweep");
        }
    }

    let topic_word = (0..k)
        .map(|t| {
            let denom = n_k[t] as f64 + v_beta;
            (0..v).map(|w| (n_kw[t][w] as f64 + beta) / denom).collect()
        })
        .collect();

    let k_alpha = k as f64 * alpha;
    let doc_topic = tokens
        .iter()
        .enumerate()
        .map(|(d, doc)| {
            let denom = doc.len() as f64 + k_alpha;
            (0..k).map(|t| (n_dk[d][t] as f64 + alpha) / denom).collect()
        })
        .collect();

    LdaModel {
        n_topics: k,
        alpha,
        beta,
        topic_word,
        doc_topic,
    }
}

impl LdaModel {
    /// exp(-log-likelihood per token) over the training counts
    pub fn perplexity(&self, matrix: &CountMatrix) -> f64 {
        let mut log_likelihood = 0.0;
        let mut tokens = 0u64;
        for (d, row) in matrix.rows.iter().enumerate() {
            for &(w, c) in row {
                let p: f64 = (0..self.n_topics)
                    .map(|t| self.doc_topic[d][t] * self.topic_word[t][w])
                    .sum();
                log_likelihood += c as f64 * p.ln();
                tokens += c as u64;
            }
        }
        if tokens == 0 {
            return f64::NAN;
        }
        (-log_likelihood / tokens as f64).exp()
    }

    /// Term indices of topic `t` by descending weight
    pub fn top_terms(&self, t: usize, n: usize) -> Vec<usize> {
        let weights = &self.topic_word[t];
        let mut order: Vec<usize> = (0..weights.len()).collect();
        order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]).then(a.cmp(&b)));
        order.truncate(n);
        order
    }

    /// 0-based index of the dominant topic of document `d`
    pub fn dominant_topic(&self, d: usize) -> usize {
        let row = &self.doc_topic[d];
        let mut best = 0;
        for (t, &p) in row.iter().enumerate() {
            if p > row[best] {
                best = t;
            }
        }
        best
    }

    /// Share of all tokens assigned to each topic
    pub fn prevalence(&self, matrix: &CountMatrix) -> Vec<f64> {
        let mut mass = vec![0.0f64; self.n_topics];
        let mut total = 0.0;
        for (d, theta) in self.doc_topic.iter().enumerate() {
            let len = matrix.doc_len(d) as f64;
            total += len;
            for (m, p) in mass.iter_mut().zip(theta) {
                *m += p * len;
            }
        }
        if total > 0.0 {
            mass.iter_mut().for_each(|m| *m /= total);
        }
        mass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        let mut docs = Vec::new();
        for _ in 0..10 {
            docs.push("apple banana cherry apple banana".to_string());
            docs.push("rocket orbit launch rocket orbit".to_string());
        }
        docs
    }

    #[test]
    fn test_vectorize_prunes_by_document_frequency() {
        let texts = ["aa bb cc", "aa bb", "aa dd", "aa x"];
        // aa in all 4 docs (> 0.75 * 4 = 3), single-letter x never matches
        let m = vectorize(&texts, 100, 0.75, 2).unwrap();
        assert_eq!(m.vocab, vec!["bb"]);
        assert_eq!(m.rows[0], vec![(0, 1)]);
        assert!(m.rows[2].is_empty());
    }

    #[test]
    fn test_vectorize_caps_features_by_count() {
        let texts = ["zz zz zz yy yy xx"];
        let m = vectorize(&texts, 2, 1.0, 1).unwrap();
        assert_eq!(m.vocab, vec!["yy", "zz"]);
        assert_eq!(m.rows[0], vec![(0, 2), (1, 3)]);
    }

    #[test]
    fn test_vectorize_empty_vocabulary() {
        let texts = ["aa", "bb"];
        assert!(matches!(
            vectorize(&texts, 10, 1.0, 2),
            Err(AnalyticsError::EmptyVocabulary(_))
        ));
    }

    #[test]
    fn test_vectorize_inconsistent_bounds() {
        let texts = ["aa", "bb"];
        assert!(matches!(
            vectorize(&texts, 10, 0.5, 10),
            Err(AnalyticsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_distributions_are_normalized() {
        let m = vectorize(&corpus(), 100, 1.0, 1).unwrap();
        let model = fit(&m, 3, 20, 0);
        for row in &model.topic_word {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
        for row in &model.doc_topic {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
        assert!((model.prevalence(&m).iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_is_deterministic_for_seed() {
        let m = vectorize(&corpus(), 100, 1.0, 1).unwrap();
        let a = fit(&m, 2, 30, 7);
        let b = fit(&m, 2, 30, 7);
        assert_eq!(a.topic_word, b.topic_word);
        assert_eq!(a.perplexity(&m), b.perplexity(&m));
    }

    #[test]
    fn test_two_themes_separate() {
        let m = vectorize(&corpus(), 100, 1.0, 1).unwrap();
        let model = fit(&m, 2, 50, 0);
        // documents of different themes land on different dominant topics
        assert_ne!(model.dominant_topic(0), model.dominant_topic(1));
        let perplexity = model.perplexity(&m);
        // six equiprobable-ish terms; a good fit is well under the vocabulary size
        assert!(perplexity > 1.0 && perplexity < 6.0, "perplexity {}", perplexity);
    }
}
