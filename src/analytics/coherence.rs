// * Topic coherence over the tokenized corpus
// * c_v: top words are counted over a boolean sliding window, paired by NPMI
// * and each word's context vector is compared to its topic's summed vector.
// * u_mass: document co-occurrence log conditional probability.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::config::CoherenceMeasure;

// * Keeps log(0) out of every ratio
const EPSILON: f64 = 1e-12;

/// Scores `topics` with the requested measure
pub fn score<S: AsRef<str>>(
    measure: CoherenceMeasure,
    topics: &[Vec<S>],
    texts: &[Vec<&str>],
    window: usize,
) -> f64 {
    match measure {
        CoherenceMeasure::Cv => cv_coherence(topics, texts, window),
        CoherenceMeasure::UMass => umass_coherence(topics, texts),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Occurrence counts of the top words over virtual documents.
///
/// A text at most `window` tokens long is one virtual document; a longer one
/// yields `len - window + 1` overlapping windows. A word counts once per window.
#[derive(Debug, Clone)]
pub struct WindowCounts {
    ids: HashMap<String, usize>,
    occurrences: Vec<u64>,
    co_occurrences: Vec<u64>,
    windows: u64,
}

impl WindowCounts {
    pub fn accumulate<S: AsRef<str>>(words: &[S], texts: &[Vec<&str>], window: usize) -> Self {
        let mut ids: HashMap<String, usize> = HashMap::new();
        for w in words {
            let next = ids.len();
            ids.entry(AsRef::<str>::as_ref(w).to_string()).or_insert(next);
        }
        let n = ids.len();
        let mut counts = Self {
            ids,
            occurrences: vec![0; n],
            co_occurrences: vec![0; n * n],
            windows: 0,
        };

        let window = window.max(1);
        let mut present: Vec<usize> = Vec::new();
        for text in texts {
            let mapped: Vec<Option<usize>> = text.iter().map(|t| counts.ids.get(*t).copied()).collect();
            let spans = if mapped.len() <= window {
                vec![&mapped[..]]
            } else {
                mapped.windows(window).collect()
            };
            for span in spans {
                present.clear();
                present.extend(span.iter().flatten().copied());
                present.sort_unstable();
                present.dedup();
                counts.observe(&present);
            }
        }
        counts
    }

    fn observe(&mut self, present: &[usize]) {
        let n = self.occurrences.len();
        self.windows += 1;
        for (i, &a) in present.iter().enumerate() {
            self.occurrences[a] += 1;
            for &b in &present[i + 1..] {
                self.co_occurrences[a * n + b] += 1;
                self.co_occurrences[b * n + a] += 1;
            }
        }
    }

    pub fn windows(&self) -> u64 {
        self.windows
    }

    pub fn occurrences(&self, word: &str) -> u64 {
        self.ids.get(word).map(|&i| self.occurrences[i]).unwrap_or(0)
    }

    fn joint(&self, a: usize, b: usize) -> u64 {
        if a == b {
            self.occurrences[a]
        } else {
            self.co_occurrences[a * self.occurrences.len() + b]
        }
    }

    /// Normalized PMI of two word ids; 0 when either word never occurs
    fn npmi(&self, a: usize, b: usize) -> f64 {
        let total = self.windows as f64;
        let (ca, cb) = (self.occurrences[a], self.occurrences[b]);
        if total == 0.0 || ca == 0 || cb == 0 {
            return 0.0;
        }
        let joint = self.joint(a, b) as f64 / total;
        let pmi = ((joint + EPSILON) / ((ca as f64 / total) * (cb as f64 / total))).ln();
        pmi / -(joint + EPSILON).ln()
    }
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm = a.iter().map(|x| x * x).sum::<f64>().sqrt() * b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm == 0.0 {
        0.0
    } else {
        dot / norm
    }
}

/// c_v coherence averaged over topics.
///
/// Each top word w gets the context vector `[npmi(w, wj)]` over the topic's
/// words; the topic vector is the sum of those. A topic scores the mean cosine
/// between each word vector and the topic vector.
pub fn cv_coherence<S: AsRef<str>>(topics: &[Vec<S>], texts: &[Vec<&str>], window: usize) -> f64 {
    let all_words: Vec<&str> = topics
        .iter()
        .flatten()
        .map(|w| AsRef::<str>::as_ref(w))
        .collect();
    let counts = WindowCounts::accumulate(&all_words, texts, window);

    let mut topic_scores = Vec::with_capacity(topics.len());
    for words in topics {
        let ids: Vec<usize> = words
            .iter()
            .filter_map(|w| counts.ids.get(AsRef::<str>::as_ref(w)).copied())
            .collect();
        if ids.is_empty() {
            continue;
        }

        let vectors: Vec<Vec<f64>> = ids
            .iter()
            .map(|&a| ids.iter().map(|&b| counts.npmi(a, b)).collect())
            .collect();
        let topic_vector: Vec<f64> = (0..ids.len())
            .map(|j| vectors.iter().map(|v| v[j]).sum())
            .collect();

        let sims: Vec<f64> = vectors.iter().map(|v| cosine(v, &topic_vector)).collect();
        topic_scores.push(mean(&sims));
    }
    mean(&topic_scores)
}

fn docs_with<'a>(postings: &'a HashMap<&str, Vec<usize>>, word: &str) -> &'a [usize] {
    postings.get(word).map(Vec::as_slice).unwrap_or(&[])
}

/// Size of the intersection of two ascending document lists
fn co_docs(a: &[usize], b: &[usize]) -> usize {
    let (mut i, mut j, mut n) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                n += 1;
                i += 1;
                j += 1;
            }
        }
    }
    n
}

/// UMass coherence averaged over topics.
///
/// For each topic with top words w1..wn the score is the mean over i > j of
/// ln((D(wi, wj) / D + eps) / (D(wj) / D)), where D(..) counts documents
/// containing the words. Pairs whose conditioning word never occurs are skipped.
pub fn umass_coherence<S: AsRef<str>>(topics: &[Vec<S>], texts: &[Vec<&str>]) -> f64 {
    let n_docs = texts.len() as f64;
    if n_docs == 0.0 {
        return 0.0;
    }

    let wanted: HashSet<&str> = topics
        .iter()
        .flatten()
        .map(|w| AsRef::<str>::as_ref(w))
        .collect();
    let mut postings: HashMap<&str, Vec<usize>> = HashMap::new();
    for (d, text) in texts.iter().enumerate() {
        let unique: HashSet<&str> = text.iter().copied().filter(|t| wanted.contains(t)).collect();
        for token in unique {
            postings.entry(token).or_default().push(d);
        }
    }

    let mut topic_scores = Vec::with_capacity(topics.len());
    for words in topics {
        let mut sum = 0.0;
        let mut pairs = 0usize;
        for i in 1..words.len() {
            let wi = docs_with(&postings, AsRef::<str>::as_ref(&words[i]));
            for word_j in &words[..i] {
                let wj = docs_with(&postings, AsRef::<str>::as_ref(word_j));
                if wj.is_empty() {
                    continue;
                }
                let joint = co_docs(wi, wj) as f64 / n_docs;
                sum += ((joint + EPSILON) / (wj.len() as f64 / n_docs)).ln();
                pairs += 1;
            }
        }
        if pairs > 0 {
            topic_scores.push(sum / pairs as f64);
        }
    }
    mean(&topic_scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    // npmi of two words that never share a window, each in half of them
    fn disjoint_npmi() -> f64 {
        (EPSILON / 0.25).ln() / -EPSILON.ln()
    }

    #[test]
    fn test_short_texts_are_single_windows() {
        let texts = vec![vec!["a", "x", "b"], vec!["a"]];
        let counts = WindowCounts::accumulate(&["a", "b"], &texts, 110);
        assert_eq!(counts.windows(), 2);
        assert_eq!(counts.occurrences("a"), 2);
        assert_eq!(counts.occurrences("b"), 1);
    }

    #[test]
    fn test_long_texts_slide() {
        let texts = vec![vec!["a", "a", "x", "b"]];
        let counts = WindowCounts::accumulate(&["a", "b"], &texts, 2);
        // [a a] [a x] [x b]; repeated words count once per window
        assert_eq!(counts.windows(), 3);
        assert_eq!(counts.occurrences("a"), 2);
        assert_eq!(counts.occurrences("b"), 1);
    }

    #[test]
    fn test_cv_perfect_cooccurrence_is_one() {
        let texts = vec![vec!["a", "b"], vec!["a", "b"], vec!["c"]];
        let topics = vec![vec!["a", "b"]];
        assert!((cv_coherence(&topics, &texts, 110) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cv_disjoint_words_hand_computed() {
        let texts = vec![vec!["a"], vec!["b"]];
        let topics = vec![vec!["a", "b"]];
        // v(a) = [1, n], v(b) = [n, 1], topic vector = [1 + n, 1 + n]
        let n = disjoint_npmi();
        let expected = (1.0 + n) / (2.0 * (1.0 + n * n)).sqrt();
        let score = cv_coherence(&topics, &texts, 110);
        assert!((score - expected).abs() < 1e-9);
        assert!(score > 0.0 && score < 0.1);
    }

    #[test]
    fn test_cv_depends_on_window() {
        let texts = vec![vec!["a", "x", "b"]];
        let topics = vec![vec!["a", "b"]];
        // window 2: [a x] [x b], the words never meet
        let n = disjoint_npmi();
        let narrow = cv_coherence(&topics, &texts, 2);
        assert!((narrow - (1.0 + n) / (2.0 * (1.0 + n * n)).sqrt()).abs() < 1e-9);
        // window 3: one window holding both; every npmi is -1, vectors stay parallel
        assert!((cv_coherence(&topics, &texts, 3) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cv_averages_topics_and_skips_empty_ones() {
        let texts = vec![vec!["a", "b"], vec!["a", "b"], vec!["c"], vec!["d"]];
        let topics = vec![vec!["a", "b"], vec!["c", "d"], vec![]];
        let disjoint = cv_coherence(&[vec!["c", "d"]], &texts, 110);
        let score = cv_coherence(&topics, &texts, 110);
        assert!((score - (1.0 + disjoint) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_dispatches() {
        let texts = vec![vec!["a", "b"], vec!["a", "b"], vec!["c"]];
        let topics = vec![vec!["a", "b"]];
        assert!((score(CoherenceMeasure::Cv, &topics, &texts, 110) - 1.0).abs() < 1e-9);
        assert!(score(CoherenceMeasure::UMass, &topics, &texts, 110).abs() < 1e-9);
    }

    #[test]
    fn test_umass_penalizes_disjoint_words() {
        let texts = vec![vec!["a"], vec!["b"]];
        let topics = vec![vec!["a", "b"]];
        let score = umass_coherence(&topics, &texts);
        // ln((0 + eps) / 0.5)
        assert!((score - (EPSILON / 0.5).ln()).abs() < 1e-6);
    }

    #[test]
    fn test_umass_skips_unknown_words() {
        let texts = vec![vec!["a", "b"]];
        let topics = vec![vec!["zz", "a", "b"]];
        // pairs conditioned on zz are skipped, (b | a) = ln(1)
        assert!(umass_coherence(&topics, &texts).abs() < 1e-9);
    }
}
