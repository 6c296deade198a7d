use std::collections::{BTreeMap, HashSet};
use url::Url;

// * Joins a scraped href against base_url; None for blanks and non-web schemes
fn join_web(href: &str, base_url: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let base = Url::parse(base_url).ok()?;
    let url = base.join(href).ok()?;

    // * Only web resources; javascript:, data: and friends are not links we can visit
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    Some(url)
}

/// Absolute form of a scraped media or profile URL.
///
/// Only relative references are joined against `base_url`; query and fragment
/// stay as served. Image CDNs use bare processing queries such as
/// `?imageView2/2/w/80/format/jpg` that must reach the server unchanged.
pub fn absolute_link(href: &str, base_url: &str) -> Option<String> {
    join_web(href, base_url).map(String::from)
}

// * Resolves a scraped note href into an absolute, deterministic URL.
// * Used for note links so that the same note always produces the same
// * string for deduplication.
// *
// * Logic:
// * 1. Join href with base_url (absolute hrefs pass through).
// * 2. Strip Fragment (#).
// * 3. Lowercase Hostname.
// * 4. Remove Tracking Parameters (utm_*, gclid, ...).
// * 5. Sort remaining Query Parameters alphabetically.
pub fn resolve_link(href: &str, base_url: &str) -> Option<String> {
    let mut url = join_web(href, base_url)?;

    url.set_fragment(None);

    if let Some(host) = url.host_str() {
        let lower_host = host.to_lowercase();
        if url.set_host(Some(&lower_host)).is_err() {
            return None;
        }
    }

    // ! Keep xsec_token: note pages refuse to render without it
    let drop_params: HashSet<&str> = [
        "utm_source", "utm_medium", "utm_campaign", "utm_term", "utm_content",
        "gclid", "fbclid", "yclid", "_ga",
    ]
    .into();

    if url.query().is_some() {
        let clean_pairs: BTreeMap<String, String> = url
            .query_pairs()
            .filter(|(k, _)| !drop_params.contains(k.to_lowercase().as_str()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if clean_pairs.is_empty() {
            url.set_query(None);
        } else {
            let mut serializer = url.query_pairs_mut();
            serializer.clear();
            for (k, v) in clean_pairs {
                serializer.append_pair(&k, &v);
            }
        }
    }

    Some(url.to_string())
}

// * Note links on the search page point to either the explore or the search_result route
pub fn is_note_link(href: &str) -> bool {
    href.contains("/explore/") || href.contains("/search_result/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "https://www.xiaohongshu.com";

    #[test]
    fn test_relative_note_link() {
        assert_eq!(
            resolve_link("/search_result/abc123?xsec_token=T1", ROOT).unwrap(),
            "https://www.xiaohongshu.com/search_result/abc123?xsec_token=T1"
        );
    }

    #[test]
    fn test_absolute_link_passes_through() {
        assert_eq!(
            resolve_link("https://sns-img.example.com/a.jpg", ROOT).unwrap(),
            "https://sns-img.example.com/a.jpg"
        );
    }

    #[test]
    fn test_non_web_schemes_rejected() {
        assert_eq!(resolve_link("javascript:void(0)", ROOT), None);
        assert_eq!(resolve_link("", ROOT), None);
    }

    #[test]
    fn test_absolute_link_keeps_bare_query() {
        let avatar = "https://sns-avatar-qc.xhscdn.com/avatar/u1.jpg?imageView2/2/w/80/format/jpg";
        assert_eq!(absolute_link(avatar, ROOT).unwrap(), avatar);
        assert_eq!(
            absolute_link("/user/profile/u1?xsec_token=B&xsec_source=pc_note", ROOT).unwrap(),
            "https://www.xiaohongshu.com/user/profile/u1?xsec_token=B&xsec_source=pc_note"
        );
        assert_eq!(absolute_link("javascript:void(0)", ROOT), None);
    }

    #[test]
    fn test_is_note_link() {
        assert!(is_note_link("/explore/abc"));
        assert!(is_note_link("/search_result/abc?x=1"));
        assert!(!is_note_link("/user/profile/abc"));
    }
}
