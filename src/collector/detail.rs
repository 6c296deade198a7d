// * Note detail extraction from the rendered note page
// * Every field is an independent lookup. A lookup that finds nothing yields
// * `Lookup::Missing` and the field falls back to its default; one missing
// * element never spoils the rest of the record.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::engine::normalization::absolute_link;
use crate::persistence::{RawNote, ZERO_COUNT};

// * Media carousel images
static SELECTOR_IMAGES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#noteContainer > div:nth-of-type(2) > div > div > div:nth-of-type(2) > div > div img")
        .unwrap()
});
// * Video notes render a poster element with a CSS background instead of images
static SELECTOR_POSTER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#noteContainer > div:nth-of-type(2) > div > div > xg-poster").unwrap()
});
static SELECTOR_AUTHOR_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "#noteContainer > div:nth-of-type(4) > div:nth-of-type(1) > div > div:nth-of-type(1) > a:nth-of-type(1)",
    )
    .unwrap()
});
static SELECTOR_AVATAR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "#noteContainer > div:nth-of-type(4) > div:nth-of-type(1) > div > div:nth-of-type(1) > a:nth-of-type(1) > img",
    )
    .unwrap()
});
static SELECTOR_NICKNAME: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "#noteContainer > div:nth-of-type(4) > div:nth-of-type(1) > div > div:nth-of-type(1) > a:nth-of-type(2) > span",
    )
    .unwrap()
});
static SELECTOR_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#detail-title").unwrap());
static SELECTOR_DESC: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#detail-desc > span").unwrap());
static SELECTOR_ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static SELECTOR_DATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.date").unwrap());
static SELECTOR_LIKES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "#noteContainer > div:nth-of-type(4) > div:nth-of-type(3) > div > div > div:nth-of-type(1) > div:nth-of-type(2) > div > div:nth-of-type(1) > span:nth-of-type(1) > span:nth-of-type(2)",
    )
    .unwrap()
});
static SELECTOR_FAVORITES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#note-page-collect-board-guide > span").unwrap());
static SELECTOR_COMMENTS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "#noteContainer > div:nth-of-type(4) > div:nth-of-type(3) > div > div > div:nth-of-type(1) > div:nth-of-type(2) > div > div:nth-of-type(1) > span:nth-of-type(3) > span",
    )
    .unwrap()
});

// * background-image: url("https://...")
static POSTER_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"url\("(.*?)"\)"#).unwrap());

/// Outcome of a single element lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Missing,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Lookup::Found(value) => value,
            Lookup::Missing => default,
        }
    }
}

impl<T: Default> Lookup<T> {
    pub fn unwrap_or_default(self) -> T {
        self.unwrap_or(T::default())
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Lookup::Found(v),
            None => Lookup::Missing,
        }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first<'a>(doc: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    doc.select(selector).next()
}

/// Trimmed text of the first match; blank text counts as missing
fn lookup_text(doc: &Html, selector: &Selector) -> Lookup<String> {
    first(doc, selector)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .into()
}

/// Attribute of the first match as an absolute URL, query untouched
fn lookup_link(doc: &Html, selector: &Selector, attr: &str, base: &str) -> Lookup<String> {
    first(doc, selector)
        .and_then(|el| el.value().attr(attr))
        .and_then(|href| absolute_link(href, base))
        .into()
}

/// Extracts the poster URL from an inline style attribute
pub fn extract_video_poster_url(style: &str) -> Option<String> {
    POSTER_URL
        .captures(style)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Image URLs of the carousel plus the video poster, deduplicated
pub fn lookup_images(doc: &Html, base: &str) -> Lookup<Vec<String>> {
    let mut urls: BTreeSet<String> = doc
        .select(&SELECTOR_IMAGES)
        .filter_map(|img| img.value().attr("src"))
        .filter_map(|src| absolute_link(src, base))
        .collect();

    let poster = first(doc, &SELECTOR_POSTER)
        .and_then(|el| el.value().attr("style"))
        .and_then(extract_video_poster_url)
        .and_then(|src| absolute_link(&src, base));
    urls.extend(poster);

    if urls.is_empty() {
        Lookup::Missing
    } else {
        Lookup::Found(urls.into_iter().collect())
    }
}

/// Full description text and the hashtag anchors embedded in it
pub fn lookup_description(doc: &Html) -> Lookup<(String, Vec<String>)> {
    first(doc, &SELECTOR_DESC)
        .map(|desc| {
            let tags = desc
                .select(&SELECTOR_ANCHOR)
                .map(element_text)
                .filter(|t| t.starts_with('#'))
                .collect();
            (element_text(desc), tags)
        })
        .into()
}

/// Builds a raw note record from a rendered note page
pub fn extract_note(html: &str, note_url: &str, keyword: &str, site_root: &str) -> RawNote {
    let doc = Html::parse_document(html);
    let zero = || ZERO_COUNT.to_string();

    let (text, tags) = lookup_description(&doc).unwrap_or_default();

    RawNote {
        keyword: keyword.to_string(),
        note_url: note_url.to_string(),
        images: lookup_images(&doc, site_root).unwrap_or_default(),
        user_home: lookup_link(&doc, &SELECTOR_AUTHOR_LINK, "href", site_root).unwrap_or_default(),
        avatar_image: lookup_link(&doc, &SELECTOR_AVATAR, "src", site_root).unwrap_or_default(),
        user_nickname: lookup_text(&doc, &SELECTOR_NICKNAME).unwrap_or_default(),
        title: lookup_text(&doc, &SELECTOR_TITLE).unwrap_or_default(),
        tags,
        text,
        time: lookup_text(&doc, &SELECTOR_DATE).unwrap_or_default(),
        likes: lookup_text(&doc, &SELECTOR_LIKES).unwrap_or(zero()),
        favorites: lookup_text(&doc, &SELECTOR_FAVORITES).unwrap_or(zero()),
        comments: lookup_text(&doc, &SELECTOR_COMMENTS).unwrap_or(zero()),
    }
}
