// * The Collector: keyword search -> note links -> note details
// * Writes each note to the JSONL file as soon as it is extracted, plus a CSV
// * mirror per keyword for spreadsheet use.

pub mod detail;
pub mod links;

pub use detail::{extract_note, extract_video_poster_url, Lookup};
pub use links::{collect_links, scan_note_links, LinkHarvest, StopReason};

use std::path::PathBuf;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::constants::PROGRESS_EVERY;
use crate::config::CollectorConfig;
use crate::engine::browser::{BrowserError, PageDriver};
use crate::engine::rate_limiter::pause;
use crate::persistence::{CsvTable, JsonlAppender, StoreError, CSV_HEADER};

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed reading operator confirmation: {0}")]
    Stdin(#[source] std::io::Error),
}

/// Per-keyword outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSummary {
    pub keyword: String,
    pub links_found: usize,
    pub details_collected: usize,
    pub stop: StopReason,
}

/// Outcome of a whole collection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub expected_links: usize,
    pub links_found: usize,
    pub details_collected: usize,
    pub keywords: Vec<KeywordSummary>,
}

/// Search URL for a keyword, the keyword form-encoded
pub fn search_url(search_base_url: &str, keyword: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
    format!("{}{}", search_base_url, encoded)
}

/// CSV mirror path for a keyword; path separators in the keyword are replaced
pub fn csv_path(config: &CollectorConfig, keyword: &str) -> PathBuf {
    let safe: String = keyword
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    config.csv_dir.join(format!("{}.csv", safe))
}

pub struct Collector<D: PageDriver> {
    driver: D,
    config: CollectorConfig,
}

impl<D: PageDriver> Collector<D> {
    pub fn new(driver: D, config: CollectorConfig) -> Self {
        Self { driver, config }
    }

    /// Gives the driver back, e.g. to shut the browser down
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Opens the site and blocks until the operator confirms a manual login
    /// on stdin, then reloads so the session cookies apply.
    pub async fn login(&mut self) -> Result<(), CollectorError> {
        self.driver.goto(&self.config.site_root).await?;
        info!(
            site = %self.config.site_root,
            "Log in manually in the opened browser window, then press Enter to continue"
        );

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(CollectorError::Stdin)?;

        self.driver.goto(&self.config.site_root).await?;
        info!("Login confirmed, starting collection");
        Ok(())
    }

    /// Runs every configured keyword
    pub async fn run(&mut self) -> Result<CollectSummary, CollectorError> {
        let mut appender = JsonlAppender::open(&self.config.jsonl_output)?;
        let mut summary = CollectSummary {
            expected_links: self.config.keywords.len() * self.config.max_notes,
            ..Default::default()
        };

        let keywords = self.config.keywords.clone();
        for keyword in &keywords {
            let outcome = self.collect_keyword(keyword, &mut appender).await?;
            summary.links_found += outcome.links_found;
            summary.details_collected += outcome.details_collected;
            summary.keywords.push(outcome);
        }

        info!(
            expected_links = summary.expected_links,
            links_found = summary.links_found,
            details_collected = summary.details_collected,
            output = %self.config.jsonl_output.display(),
            "Collection finished"
        );
        Ok(summary)
    }

    async fn collect_keyword(
        &mut self,
        keyword: &str,
        appender: &mut JsonlAppender,
    ) -> Result<KeywordSummary, CollectorError> {
        info!(keyword = keyword, "Processing keyword");

        // * Phase 1: scroll the result page for note links
        self.driver
            .goto(&search_url(&self.config.search_base_url, keyword))
            .await?;
        pause(&self.config.search_settle, "search settle").await;

        let harvest = collect_links(
            &mut self.driver,
            &self.config.site_root,
            self.config.max_notes,
            &self.config.scroll_pause,
        )
        .await;
        info!(
            keyword = keyword,
            links = harvest.links.len(),
            "Link collection complete"
        );

        // * Phase 2: visit every link
        let csv_file = csv_path(&self.config, keyword);
        let mut table = CsvTable::create(&csv_file, CSV_HEADER)?;
        let mut details = 0usize;

        for url in &harvest.links {
            if let Err(e) = self.driver.goto(url).await {
                warn!(url = %url, error = %e, "Skipping note, navigation failed");
                continue;
            }
            pause(&self.config.detail_settle, "detail settle").await;

            let html = match self.driver.markup().await {
                Ok(html) => html,
                Err(e) => {
                    warn!(url = %url, error = %e, "Skipping note, page unreadable");
                    continue;
                }
            };

            let note = extract_note(&html, url, keyword, &self.config.site_root);
            table.write_row(note.csv_row())?;
            appender.append(&note)?;
            details += 1;

            if details % PROGRESS_EVERY == 0 {
                info!(keyword = keyword, details = details, "Note details collected");
            }
        }

        info!(
            keyword = keyword,
            details = details,
            csv = %csv_file.display(),
            "Keyword details complete"
        );

        Ok(KeywordSummary {
            keyword: keyword.to_string(),
            links_found: harvest.links.len(),
            details_collected: details,
            stop: harvest.stop,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_keyword() {
        assert_eq!(
            search_url("https://www.xiaohongshu.com/search_result?keyword=", "tiktok refugee"),
            "https://www.xiaohongshu.com/search_result?keyword=tiktok+refugee"
        );
        assert!(search_url("https://x/?keyword=", "难民").contains("%E9%9A%BE"));
    }

    #[test]
    fn test_csv_path_sanitizes_separators() {
        let config = CollectorConfig {
            csv_dir: PathBuf::from("csv"),
            ..Default::default()
        };
        assert_eq!(csv_path(&config, "a/b"), PathBuf::from("csv/a_b.csv"));
    }
}
