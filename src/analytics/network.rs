// * Word co-occurrence graph
// * Undirected, weighted by how often two tokens fall inside the same window.

use std::collections::HashMap;
use tracing::info;

use super::AnalyticsError;
use crate::config::NetworkGraphConfig;
use crate::persistence::{read_jsonl, CorpusDoc, CsvTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub weight: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CooccurrenceGraph {
    nodes: Vec<String>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
    // (min id, max id) -> position in `edges`
    edge_index: HashMap<(usize, usize), usize>,
}

impl CooccurrenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, label: &str) -> usize {
        if let Some(&id) = self.node_index.get(label) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(label.to_string());
        self.node_index.insert(label.to_string(), id);
        id
    }

    fn bump(&mut self, a: &str, b: &str) {
        let source = self.node(a);
        let target = self.node(b);
        let key = (source.min(target), source.max(target));
        match self.edge_index.get(&key) {
            Some(&pos) => self.edges[pos].weight += 1,
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(Edge {
                    source,
                    target,
                    weight: 1,
                });
            }
        }
    }

    /// Counts every pair (tokens[i], tokens[j]) with i < j < i + window.
    /// Tokens only enter the graph through a pair.
    pub fn add_document(&mut self, tokens: &[&str], window: usize) {
        for i in 0..tokens.len() {
            let end = (i + window).min(tokens.len());
            for j in i + 1..end {
                self.bump(tokens[i], tokens[j]);
            }
        }
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn weight(&self, a: &str, b: &str) -> Option<u64> {
        let ia = *self.node_index.get(a)?;
        let ib = *self.node_index.get(b)?;
        let pos = *self.edge_index.get(&(ia.min(ib), ia.max(ib)))?;
        Some(self.edges[pos].weight)
    }

    /// `Id,Label` and `Source,Target,Weight` tables, labels used as ids
    pub fn write_tables(
        &self,
        nodes_csv: &std::path::Path,
        edges_csv: &std::path::Path,
    ) -> Result<(), AnalyticsError> {
        let mut nodes = CsvTable::create(nodes_csv, ["Id", "Label"])?;
        for label in &self.nodes {
            nodes.write_row([label.as_str(), label.as_str()])?;
        }

        let mut edges = CsvTable::create(edges_csv, ["Source", "Target", "Weight"])?;
        for edge in &self.edges {
            let weight = edge.weight.to_string();
            edges.write_row([
                self.nodes[edge.source].as_str(),
                self.nodes[edge.target].as_str(),
                weight.as_str(),
            ])?;
        }
        Ok(())
    }
}

/// Builds the graph over the whole corpus and writes both tables
pub fn run(config: &NetworkGraphConfig) -> Result<CooccurrenceGraph, AnalyticsError> {
    if config.window < 2 {
        return Err(AnalyticsError::InvalidParameter(format!(
            "co-occurrence window must be at least 2, got {}",
            config.window
        )));
    }

    let docs: Vec<CorpusDoc> = read_jsonl(&config.input)?;
    let mut graph = CooccurrenceGraph::new();
    for doc in &docs {
        let tokens: Vec<&str> = doc.text_processed.split_whitespace().collect();
        graph.add_document(&tokens, config.window);
    }

    graph.write_tables(&config.nodes_csv, &config.edges_csv)?;
    info!(
        documents = docs.len(),
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        nodes_csv = %config.nodes_csv.display(),
        edges_csv = %config.edges_csv.display(),
        "Co-occurrence network written"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_pairs_window_two() {
        let mut g = CooccurrenceGraph::new();
        g.add_document(&["a", "b", "c"], 2);
        assert_eq!(g.nodes(), &["a", "b", "c"]);
        assert_eq!(g.weight("a", "b"), Some(1));
        assert_eq!(g.weight("b", "c"), Some(1));
        assert_eq!(g.weight("a", "c"), None);
    }

    #[test]
    fn test_weights_accumulate_across_documents_and_orientation() {
        let mut g = CooccurrenceGraph::new();
        g.add_document(&["a", "b"], 2);
        g.add_document(&["b", "a"], 2);
        g.add_document(&["a", "b", "a"], 2);
        assert_eq!(g.weight("a", "b"), Some(4));
        assert_eq!(g.edges().len(), 1);
        // first-seen orientation
        assert_eq!(g.edges()[0].source, 0);
        assert_eq!(g.edges()[0].target, 1);
    }

    #[test]
    fn test_wider_window() {
        let mut g = CooccurrenceGraph::new();
        g.add_document(&["a", "b", "c", "d"], 3);
        assert_eq!(g.weight("a", "c"), Some(1));
        assert_eq!(g.weight("c", "d"), Some(1));
        assert_eq!(g.weight("a", "d"), None);
        assert_eq!(g.edges().len(), 5);
    }

    #[test]
    fn test_single_token_adds_nothing() {
        let mut g = CooccurrenceGraph::new();
        g.add_document(&["lonely"], 2);
        assert!(g.nodes().is_empty());
        assert!(g.edges().is_empty());
    }

    #[test]
    fn test_self_pairs_are_loops() {
        let mut g = CooccurrenceGraph::new();
        g.add_document(&["ha", "ha", "ha"], 2);
        assert_eq!(g.nodes().len(), 1);
        assert_eq!(g.weight("ha", "ha"), Some(2));
    }
}
