// * Relative date resolution for the rendered note time
// * Forms seen on the site: "今天 12:30", "昨天 08:01 广东", "3 天前 美国",
// * "01-20 上海", "编辑于 01-20 上海", and full dates that are passed through.

use chrono::{Duration, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

use super::RefineryError;

static EDITED_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^编辑于 ").unwrap());
static TODAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^今天 \d{2}:\d{2}").unwrap());
static YESTERDAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^昨天 \d{2}:\d{2}").unwrap());
static DAYS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+) 天前(?:\s+(.*))?").unwrap());
static MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2}-\d{2}) (.+)").unwrap());

const DATE_FORMAT: &str = "%m-%d";

/// A note time split into its date and trailing label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedAt {
    /// `MM-DD`, or the raw string when the form is not recognized
    pub date: String,
    /// Trailing token: the region when present, the clock time for
    /// today/yesterday forms without a region, otherwise empty
    pub region: String,
}

impl PostedAt {
    fn new(date: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            region: region.into(),
        }
    }
}

fn last_token(s: &str) -> &str {
    s.split_whitespace().last().unwrap_or("")
}

fn shift(reference: NaiveDate, days: i64, raw: &str) -> Result<String, RefineryError> {
    Duration::try_days(days)
        .and_then(|d| reference.checked_sub_signed(d))
        .map(|date| date.format(DATE_FORMAT).to_string())
        .ok_or_else(|| RefineryError::InvalidDate(raw.to_string()))
}

/// Resolves a rendered note time against `reference` (the collection date).
pub fn process_time(raw: &str, reference: NaiveDate) -> Result<PostedAt, RefineryError> {
    let time_str = EDITED_PREFIX.replace(raw, "");
    let time_str = time_str.as_ref();

    if TODAY.is_match(time_str) {
        return Ok(PostedAt::new(shift(reference, 0, raw)?, last_token(time_str)));
    }

    if YESTERDAY.is_match(time_str) {
        return Ok(PostedAt::new(shift(reference, 1, raw)?, last_token(time_str)));
    }

    if let Some(caps) = DAYS_AGO.captures(time_str) {
        let days: i64 = caps[1]
            .parse()
            .map_err(|_| RefineryError::InvalidDate(raw.to_string()))?;
        let rest = caps.get(2).map(|m| last_token(m.as_str())).unwrap_or("");
        return Ok(PostedAt::new(shift(reference, days, raw)?, rest));
    }

    if let Some(caps) = MONTH_DAY.captures(time_str) {
        return Ok(PostedAt::new(&caps[1], &caps[2]));
    }

    Ok(PostedAt::new(time_str, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 26).unwrap()
    }

    #[test]
    fn test_today_with_clock_only() {
        let at = process_time("今天 12:30", reference()).unwrap();
        assert_eq!(at, PostedAt::new("01-26", "12:30"));
    }

    #[test]
    fn test_today_with_region() {
        let at = process_time("今天 12:30 广东", reference()).unwrap();
        assert_eq!(at, PostedAt::new("01-26", "广东"));
    }

    #[test]
    fn test_yesterday_crosses_month_boundary() {
        let first = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let at = process_time("昨天 23:59", first).unwrap();
        assert_eq!(at, PostedAt::new("02-28", "23:59"));
    }

    #[test]
    fn test_days_ago_without_region_has_empty_label() {
        let at = process_time("3 天前", reference()).unwrap();
        assert_eq!(at, PostedAt::new("01-23", ""));
    }

    #[test]
    fn test_days_ago_with_region() {
        let at = process_time("30 天前 美国", reference()).unwrap();
        assert_eq!(at, PostedAt::new("12-27", "美国"));
    }

    #[test]
    fn test_month_day_with_region_and_edit_prefix() {
        let at = process_time("编辑于 01-20 上海", reference()).unwrap();
        assert_eq!(at, PostedAt::new("01-20", "上海"));
    }

    #[test]
    fn test_unrecognized_passes_through() {
        let at = process_time("2024-12-01 日本", reference()).unwrap();
        assert_eq!(at, PostedAt::new("2024-12-01 日本", ""));

        let empty = process_time("", reference()).unwrap();
        assert_eq!(empty, PostedAt::new("", ""));
    }

    #[test]
    fn test_absurd_day_count_is_error() {
        let result = process_time("99999999999999 天前", reference());
        assert!(matches!(result, Err(RefineryError::InvalidDate(_))));
    }
}
