// * Topic-count sweep
// * For every K in the configured range: fit, score (perplexity + coherence)
// * and export per-K artifacts. The sweep summary goes to topic_sweep.json
// * and perplexity_coherence.png.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::lda::{self, CountMatrix, LdaModel};
use super::{chart, coherence, AnalyticsError};
use crate::config::constants::TOPIC_CHART_FILE;
use crate::config::TopicConfig;
use crate::persistence::{read_jsonl, write_jsonl, CorpusDoc, CsvTable};

pub const SWEEP_REPORT_FILE: &str = "topic_sweep.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub n_topics: usize,
    pub perplexity: f64,
    pub coherence: f64,
}

/// Per-K file names inside the output directory
pub fn artifact_paths(dir: &Path, k: usize) -> (PathBuf, PathBuf, PathBuf) {
    (
        dir.join(format!("lda_visualization_{}.html", k)),
        dir.join(format!("data_with_topics_{}.jsonl", k)),
        dir.join(format!("lda_topics_{}.csv", k)),
    )
}

/// `{"topic1": p1, "topic2": p2, ...}` in topic order
#[derive(Debug, Clone, Copy)]
pub struct TopicDistribution<'a>(pub &'a [f64]);

impl Serialize for TopicDistribution<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, p) in self.0.iter().enumerate() {
            map.serialize_entry(&format!("topic{}", i + 1), p)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
pub struct TopicAssignment<'a> {
    pub text: &'a str,
    pub text_processed: &'a str,
    /// 1-based
    pub max_topic: usize,
    pub topic_distribution: TopicDistribution<'a>,
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Standalone HTML page: topics by prevalence, each with its top terms
pub fn render_report(model: &LdaModel, matrix: &CountMatrix, top_n: usize) -> String {
    let prevalence = model.prevalence(matrix);
    let totals = matrix.term_totals();

    let mut order: Vec<usize> = (0..model.n_topics).collect();
    order.sort_by(|&a, &b| prevalence[b].total_cmp(&prevalence[a]).then(a.cmp(&b)));

    let mut html = String::new();
    // write! into a String cannot fail
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>LDA topics (K={k})</title>\n\
         <style>body{{font-family:sans-serif;margin:2em}}table{{border-collapse:collapse;margin-bottom:2em}}\
         td,th{{border:1px solid #ccc;padding:2px 8px}}.bar{{background:#4a90d9;height:10px}}</style>\n\
         </head>\n<body>\n<h1>LDA topics (K={k})</h1>\n<p>{docs} documents, {terms} terms</p>\n",
        k = model.n_topics,
        docs = matrix.n_docs(),
        terms = matrix.n_terms(),
    );

    for t in order {
        let _ = write!(
            html,
            "<h2>Topic {} ({:.1}% of tokens)</h2>\n<table>\n<tr><th>Term</th><th>Weight</th><th>Corpus count</th><th></th></tr>\n",
            t + 1,
            prevalence[t] * 100.0
        );
        let terms = model.top_terms(t, top_n);
        let top_weight = terms.first().map(|&w| model.topic_word[t][w]).unwrap_or(1.0);
        for w in terms {
            let weight = model.topic_word[t][w];
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{:.4}</td><td>{}</td><td><div class=\"bar\" style=\"width:{}px\"></div></td></tr>",
                escape_html(&matrix.vocab[w]),
                weight,
                totals[w],
                (200.0 * weight / top_weight).round() as u32
            );
        }
        html.push_str("</table>\n");
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn top_words(model: &LdaModel, matrix: &CountMatrix, n: usize) -> Vec<Vec<String>> {
    (0..model.n_topics)
        .map(|t| {
            model
                .top_terms(t, n)
                .into_iter()
                .map(|w| matrix.vocab[w].clone())
                .collect()
        })
        .collect()
}

/// Word table with one `topicN_word` column per topic
fn write_topic_table(path: &Path, topics: &[Vec<String>]) -> Result<(), AnalyticsError> {
    let header = (1..=topics.len()).map(|i| format!("topic{}_word", i));
    let mut table = CsvTable::create_with_bom(path, header)?;
    let depth = topics.iter().map(Vec::len).max().unwrap_or(0);
    for r in 0..depth {
        table.write_row(topics.iter().map(|words| words.get(r).map(String::as_str).unwrap_or("")))?;
    }
    Ok(())
}

/// Fits one K and writes its artifacts
fn evaluate_k(
    k: usize,
    config: &TopicConfig,
    docs: &[&CorpusDoc],
    matrix: &CountMatrix,
    split_texts: &[Vec<&str>],
) -> Result<SweepPoint, AnalyticsError> {
    let model = lda::fit(matrix, k, config.iterations, config.seed);
    let perplexity = model.perplexity(matrix);
    let topics = top_words(&model, matrix, config.top_words);
    let coherence = coherence::score(config.coherence, &topics, split_texts, config.coherence_window);

    let (html_path, jsonl_path, csv_path) = artifact_paths(&config.output_dir, k);

    fs::write(&html_path, render_report(&model, matrix, config.top_words))
        .map_err(|e| AnalyticsError::io(&html_path, e))?;

    let assignments: Vec<TopicAssignment<'_>> = docs
        .iter()
        .enumerate()
        .map(|(d, doc)| TopicAssignment {
            text: &doc.text,
            text_processed: &doc.text_processed,
            max_topic: model.dominant_topic(d) + 1,
            topic_distribution: TopicDistribution(&model.doc_topic[d]),
        })
        .collect();
    write_jsonl(&jsonl_path, &assignments)?;

    write_topic_table(&csv_path, &topics)?;

    info!(
        n_topics = k,
        perplexity = perplexity,
        coherence = coherence,
        "Topic model evaluated"
    );
    Ok(SweepPoint {
        n_topics: k,
        perplexity,
        coherence,
    })
}

/// Runs the sweep over `min_topics..=max_topics`
pub fn run(config: &TopicConfig) -> Result<Vec<SweepPoint>, AnalyticsError> {
    if config.min_topics == 0 || config.min_topics > config.max_topics {
        return Err(AnalyticsError::InvalidParameter(format!(
            "topic range {}..={} is empty or starts at zero",
            config.min_topics, config.max_topics
        )));
    }

    let corpus: Vec<CorpusDoc> = read_jsonl(&config.input)?;
    let docs: Vec<&CorpusDoc> = corpus
        .iter()
        .filter(|d| !d.text_processed.trim().is_empty())
        .collect();
    info!(
        records = corpus.len(),
        documents = docs.len(),
        "Topic sweep input loaded"
    );

    let texts: Vec<&str> = docs.iter().map(|d| d.text_processed.as_str()).collect();
    let matrix = lda::vectorize(&texts, config.max_features, config.max_df, config.min_df)?;
    let split_texts: Vec<Vec<&str>> = texts.iter().map(|t| t.split_whitespace().collect()).collect();
    info!(vocabulary = matrix.n_terms(), "Document-term matrix built");

    fs::create_dir_all(&config.output_dir).map_err(|e| AnalyticsError::io(&config.output_dir, e))?;

    let sweep = (config.min_topics..=config.max_topics)
        .map(|k| evaluate_k(k, config, &docs, &matrix, &split_texts))
        .collect::<Result<Vec<_>, _>>()?;

    let report_path = config.output_dir.join(SWEEP_REPORT_FILE);
    let report = serde_json::to_vec_pretty(&sweep).map_err(|e| AnalyticsError::Store(e.into()))?;
    fs::write(&report_path, report).map_err(|e| AnalyticsError::io(&report_path, e))?;

    let chart_path = config.output_dir.join(TOPIC_CHART_FILE);
    if config.font.is_none() {
        warn!(path = %chart_path.display(), "No font configured, sweep chart drawn without labels");
    }
    chart::save_sweep_chart(&sweep, &chart_path, config.font.as_deref())?;

    if let Some(best) = sweep
        .iter()
        .max_by(|a, b| a.coherence.total_cmp(&b.coherence))
    {
        info!(
            n_topics = best.n_topics,
            coherence = best.coherence,
            measure = %config.coherence,
            report = %report_path.display(),
            "Topic sweep complete"
        );
    }
    Ok(sweep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_distribution_keeps_numeric_order() {
        let probs: Vec<f64> = (0..11).map(|i| i as f64 / 100.0).collect();
        let json = serde_json::to_string(&TopicDistribution(&probs)).unwrap();
        let t2 = json.find("\"topic2\"").unwrap();
        let t10 = json.find("\"topic10\"").unwrap();
        assert!(t2 < t10);
        assert!(json.starts_with("{\"topic1\":0.0"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a&\"b'>"), "&lt;a&amp;&quot;b&#39;&gt;");
    }
}
