// * Field parsers for raw note values: note id and localized counters

use regex::Regex;
use std::sync::LazyLock;

use super::RefineryError;

// * The id is the path segment after /search_result/
static NOTE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/search_result/(\w+)").unwrap());

// * Labels rendered in place of a counter when it is zero
const COUNTER_PLACEHOLDERS: [&str; 3] = ["点赞", "收藏", "评论"];

// * Ten-thousand unit
const WAN: char = '万';

/// Extracts the note id from a note URL. `None` means the record cannot be
/// identified and must be dropped.
pub fn extract_id(note_url: &str) -> Option<String> {
    NOTE_ID
        .captures(note_url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Converts a rendered counter ("1.2万", "356", "点赞") into an integer.
///
/// Placeholder labels count as zero. Values with the 万 unit are scaled by
/// 10 000 and rounded to the nearest integer. Anything else must parse as an
/// integer; malformed values are an error.
pub fn process_numbers(value: &str) -> Result<i64, RefineryError> {
    let trimmed = value.trim();

    if COUNTER_PLACEHOLDERS.contains(&trimmed) {
        return Ok(0);
    }

    if trimmed.contains(WAN) {
        let mantissa = trimmed.replace(WAN, "");
        let parsed: f64 = mantissa
            .trim()
            .parse()
            .map_err(|_| RefineryError::InvalidNumber(value.to_string()))?;
        if !parsed.is_finite() {
            return Err(RefineryError::InvalidNumber(value.to_string()));
        }
        return Ok((parsed * 10_000.0).round() as i64);
    }

    trimmed
        .parse::<i64>()
        .map_err(|_| RefineryError::InvalidNumber(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_id_from_search_result_url() {
        assert_eq!(
            extract_id("https://www.xiaohongshu.com/search_result/6789abcdef012345?xsec_token=x"),
            Some("6789abcdef012345".to_string())
        );
    }

    #[test]
    fn test_extract_id_absent_for_other_paths() {
        assert_eq!(extract_id("https://www.xiaohongshu.com/explore/6789abcdef"), None);
        assert_eq!(extract_id(""), None);
    }

    #[test]
    fn test_placeholders_are_zero() {
        for label in COUNTER_PLACEHOLDERS {
            assert_eq!(process_numbers(label).unwrap(), 0);
        }
    }

    #[test]
    fn test_wan_unit_scaling() {
        assert_eq!(process_numbers("1.2万").unwrap(), 12_000);
        assert_eq!(process_numbers("2.3万").unwrap(), 23_000);
        assert_eq!(process_numbers("10万").unwrap(), 100_000);
        assert_eq!(process_numbers("0.05万").unwrap(), 500);
    }

    #[test]
    fn test_plain_integers() {
        assert_eq!(process_numbers("356").unwrap(), 356);
        assert_eq!(process_numbers(" 7 ").unwrap(), 7);
        assert_eq!(process_numbers("0").unwrap(), 0);
    }

    #[test]
    fn test_malformed_values_error() {
        assert!(matches!(process_numbers("abc"), Err(RefineryError::InvalidNumber(_))));
        assert!(matches!(process_numbers("万"), Err(RefineryError::InvalidNumber(_))));
        assert!(matches!(process_numbers(""), Err(RefineryError::InvalidNumber(_))));
        assert!(process_numbers("1.5").is_err());
    }
}
