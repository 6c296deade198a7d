// * Image downloader
// * Walks the tokenized corpus and saves every image URL as
// * <dir>/<title>_<n>.webp. Failures are per image: logged, counted, skipped.

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::MediaError;
use crate::config::constants::{IMAGE_EXTENSION, SITE_ROOT};
use crate::config::DownloadConfig;
use crate::engine::rate_limiter::DownloadThrottle;
use crate::network::{IdentityProfile, MediaClient};
use crate::persistence::{CorpusDoc, JsonlReader, StoreError};

const UNTITLED: &str = "untitled";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub records: usize,
    pub malformed_lines: usize,
    /// Planned images whose file name a later record claimed
    pub superseded: usize,
    pub attempted: usize,
    pub saved: usize,
    pub failed: usize,
}

/// One image to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    pub url: String,
    pub dest: PathBuf,
}

/// Title usable as a file-name stem: spaces and slashes become underscores
pub fn safe_title(title: Option<&str>) -> String {
    match title {
        Some(t) if !t.is_empty() => t.replace([' ', '/'], "_"),
        _ => UNTITLED.to_string(),
    }
}

/// `<title>_<index + 1>.webp`
pub fn image_file_name(title: Option<&str>, index: usize) -> String {
    format!("{}_{}.{}", safe_title(title), index + 1, IMAGE_EXTENSION)
}

/// Reads the corpus leniently: malformed lines are logged and skipped,
/// unreadable files are fatal.
///
/// Every destination appears once. Notes sharing a title map to the same
/// file names; the later record's URL takes the earlier slot, which is the
/// file a sequential run would leave on disk.
pub fn plan_jobs(input: &Path, output_dir: &Path) -> Result<(Vec<ImageJob>, DownloadStats), MediaError> {
    let mut stats = DownloadStats::default();
    let mut jobs: Vec<ImageJob> = Vec::new();
    let mut slots: HashMap<PathBuf, usize> = HashMap::new();

    for item in JsonlReader::<CorpusDoc>::open(input)? {
        let doc = match item {
            Ok((_, doc)) => doc,
            Err(StoreError::Json { line, source, .. }) => {
                warn!(line = line, error = %source, "Skipping malformed record");
                stats.malformed_lines += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        stats.records += 1;

        for (i, url) in doc.images.iter().enumerate() {
            let dest = output_dir.join(image_file_name(doc.title.as_deref(), i));
            match slots.get(&dest) {
                Some(&slot) => {
                    debug!(path = %dest.display(), url = %url, "Destination already planned, keeping later image");
                    jobs[slot].url = url.clone();
                    stats.superseded += 1;
                }
                None => {
                    slots.insert(dest.clone(), jobs.len());
                    jobs.push(ImageJob { url: url.clone(), dest });
                }
            }
        }
    }

    Ok((jobs, stats))
}

/// Downloads every image of the corpus into the configured directory
pub async fn run(config: &DownloadConfig) -> Result<DownloadStats, MediaError> {
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| MediaError::io(&config.output_dir, e))?;

    let (jobs, mut stats) = plan_jobs(&config.input, &config.output_dir)?;
    info!(
        records = stats.records,
        images = jobs.len(),
        malformed = stats.malformed_lines,
        superseded = stats.superseded,
        "Download plan ready"
    );

    let identity = IdentityProfile::desktop_chrome(SITE_ROOT);
    let client = MediaClient::new(&config.http, &identity)?;
    let throttle = DownloadThrottle::per_second(config.requests_per_second);

    let outcomes: Vec<bool> = stream::iter(jobs)
        .map(|job| {
            let client = &client;
            let throttle = &throttle;
            async move {
                throttle.acquire().await;
                match client.download_to(&job.url, &job.dest).await {
                    Ok(bytes) => {
                        info!(path = %job.dest.display(), bytes = bytes, "Image saved");
                        true
                    }
                    Err(e) => {
                        warn!(url = %job.url, error = %e, "Image download failed");
                        false
                    }
                }
            }
        })
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    stats.attempted = outcomes.len();
    stats.saved = outcomes.iter().filter(|ok| **ok).count();
    stats.failed = stats.attempted - stats.saved;

    info!(
        attempted = stats.attempted,
        saved = stats.saved,
        failed = stats.failed,
        dir = %config.output_dir.display(),
        "Image download finished"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_title() {
        assert_eq!(safe_title(Some("a b/c")), "a_b_c");
        assert_eq!(safe_title(Some("")), "untitled");
        assert_eq!(safe_title(Some(" x ")), "_x_");
        assert_eq!(safe_title(None), "untitled");
        assert_eq!(safe_title(Some("难民 日记")), "难民_日记");
    }

    #[test]
    fn test_image_file_name_is_one_based() {
        assert_eq!(image_file_name(Some("hello world"), 0), "hello_world_1.webp");
        assert_eq!(image_file_name(None, 2), "untitled_3.webp");
    }
}
