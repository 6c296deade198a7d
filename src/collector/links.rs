// * Search-result link harvesting by repeated scroll-to-bottom

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::config::Jitter;
use crate::engine::browser::PageDriver;
use crate::engine::normalization::{is_note_link, resolve_link};
use crate::engine::rate_limiter::pause;

// * Result cards wrap their cover image in an anchor to the note
static SELECTOR_COVER_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.cover[href]").unwrap());

/// Why link harvesting stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The requested number of links was collected
    Reached,
    /// The page stopped growing after a scroll
    Stalled,
    /// The page could not be read or scrolled; links so far are kept
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkHarvest {
    pub links: Vec<String>,
    pub stop: StopReason,
    pub scrolls: usize,
}

/// Note links present in `html`, absolute, in document order (may repeat)
pub fn scan_note_links(html: &str, site_root: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&SELECTOR_COVER_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| is_note_link(href))
        .filter_map(|href| resolve_link(href, site_root))
        .collect()
}

/// Scrolls the current page until `max_links` unique note links are known or
/// the scroll height stops changing.
pub async fn collect_links<D: PageDriver>(
    driver: &mut D,
    site_root: &str,
    max_links: usize,
    scroll_pause: &Jitter,
) -> LinkHarvest {
    let mut links: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut last_height: i64 = 0;
    let mut scrolls = 0;

    let stop = loop {
        if links.len() >= max_links {
            break StopReason::Reached;
        }

        let html = match driver.markup().await {
            Ok(html) => html,
            Err(e) => break StopReason::Failed(e.to_string()),
        };

        for link in scan_note_links(&html, site_root) {
            if links.len() >= max_links {
                break;
            }
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
        debug!(collected = links.len(), target = max_links, "Scanned result page");

        if links.len() >= max_links {
            break StopReason::Reached;
        }

        if let Err(e) = driver.scroll_to_bottom().await {
            break StopReason::Failed(e.to_string());
        }
        scrolls += 1;
        pause(scroll_pause, "scroll").await;

        let new_height = match driver.scroll_height().await {
            Ok(h) => h,
            Err(e) => break StopReason::Failed(e.to_string()),
        };
        if new_height == last_height {
            break StopReason::Stalled;
        }
        last_height = new_height;
    };

    match &stop {
        StopReason::Failed(reason) => {
            warn!(collected = links.len(), reason = %reason, "Link harvesting interrupted")
        }
        _ => info!(collected = links.len(), scrolls = scrolls, stop = ?stop, "Link harvesting finished"),
    }

    LinkHarvest {
        links,
        stop,
        scrolls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "https://www.xiaohongshu.com";

    #[test]
    fn test_scan_filters_non_note_anchors() {
        let html = r#"
            <a class="cover" href="/search_result/aaa?xsec_token=1"></a>
            <a class="cover" href="/explore/bbb"></a>
            <a class="cover" href="/user/profile/ccc"></a>
            <a class="title" href="/search_result/ddd"></a>
            <a class="cover"></a>
        "#;
        let links = scan_note_links(html, ROOT);
        assert_eq!(
            links,
            vec![
                "https://www.xiaohongshu.com/search_result/aaa?xsec_token=1".to_string(),
                "https://www.xiaohongshu.com/explore/bbb".to_string(),
            ]
        );
    }
}
