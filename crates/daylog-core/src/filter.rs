//! Listing query parameters and the predicate they compile to.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::domain::Post;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Highest page number accepted; keeps every offset inside `i64`.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

/// Listing parameters decoded from the request query string.
///
/// Decoding never fails: anything unparseable or out of range falls back
/// to the default for that field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryFilter {
    pub page: u64,
    pub page_size: u64,
    pub year: Option<i32>,
    pub search: Option<String>,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            year: None,
            search: None,
        }
    }
}

impl QueryFilter {
    /// Decode from raw query pairs.
    ///
    /// Recognized keys: `p` or `page`, `s`, `y` or `year`, `q`. The short
    /// form wins when both are present.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let lookup = |keys: &[&str]| {
            keys.iter().find_map(|key| {
                pairs
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.trim())
            })
        };

        let page = lookup(&["p", "page"])
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&p| p >= 1)
            .map(|p| p.min(MAX_PAGE))
            .unwrap_or(1);

        let page_size = lookup(&["s"])
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&s| s >= 1)
            .map(|s| s.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let year = lookup(&["y", "year"])
            .and_then(|v| v.parse::<i32>().ok())
            .filter(|y| (1..=9999).contains(y));

        let search = lookup(&["q"])
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Self {
            page,
            page_size,
            year,
            search,
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// Storage-level query derived from a [`QueryFilter`] and the caller's
/// archive access. All set conditions are combined with AND.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostQuery {
    /// Case-insensitive substring on `body`.
    pub search: Option<String>,
    /// Calendar year of `event_time`, UTC.
    pub year: Option<i32>,
    /// Strict lower bound on `event_time`.
    pub newer_than: Option<DateTime<Utc>>,
    pub offset: u64,
    pub limit: u64,
}

impl PostQuery {
    /// In-memory evaluation of the predicate. Storage adapters must agree
    /// with this; ordering and slicing are left to the caller.
    pub fn matches(&self, post: &Post) -> bool {
        if post.is_deleted() {
            return false;
        }
        if let Some(needle) = &self.search {
            if !post.body.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(year) = self.year {
            match year_bounds(year) {
                Some((start, end)) => {
                    if post.event_time < start || post.event_time >= end {
                        return false;
                    }
                }
                None => return false,
            }
        }
        if let Some(cutoff) = self.newer_than {
            if post.event_time <= cutoff {
                return false;
            }
        }
        true
    }
}

/// Half-open UTC range `[Jan 1 year, Jan 1 year+1)`.
pub fn year_bounds(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
    let end = Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).single()?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostDraft;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn post_at(event_time: &str, body: &str) -> Post {
        Post::new(&PostDraft::parse(event_time, "", body, "").unwrap())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(QueryFilter::from_pairs(&[]), QueryFilter::default());
        assert_eq!(QueryFilter::default().offset(), 0);
    }

    #[test]
    fn test_decodes_all_keys() {
        let filter =
            QueryFilter::from_pairs(&pairs(&[("p", "3"), ("s", "5"), ("y", "2023"), ("q", " tea ")]));

        assert_eq!(filter.page, 3);
        assert_eq!(filter.page_size, 5);
        assert_eq!(filter.year, Some(2023));
        assert_eq!(filter.search.as_deref(), Some("tea"));
        assert_eq!(filter.offset(), 10);
    }

    #[test]
    fn test_short_keys_win_over_aliases() {
        let filter = QueryFilter::from_pairs(&pairs(&[
            ("page", "9"),
            ("p", "2"),
            ("year", "2001"),
            ("y", "2020"),
        ]));
        assert_eq!(filter.page, 2);
        assert_eq!(filter.year, Some(2020));

        let filter = QueryFilter::from_pairs(&pairs(&[("page", "4"), ("year", "2019")]));
        assert_eq!(filter.page, 4);
        assert_eq!(filter.year, Some(2019));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let filter = QueryFilter::from_pairs(&pairs(&[
            ("p", "0"),
            ("s", "-4"),
            ("y", "twenty"),
            ("q", "   "),
        ]));
        assert_eq!(filter, QueryFilter::default());

        let filter = QueryFilter::from_pairs(&pairs(&[("p", "abc"), ("s", "100000"), ("y", "0")]));
        assert_eq!(filter.page, 1);
        assert_eq!(filter.page_size, MAX_PAGE_SIZE);
        assert_eq!(filter.year, None);
    }

    #[test]
    fn test_huge_page_is_clamped() {
        for raw in ["9223372036854775807", "18446744073709551615"] {
            let filter = QueryFilter::from_pairs(&pairs(&[("p", raw), ("s", "100")]));
            assert_eq!(filter.page, MAX_PAGE);
            assert!(i64::try_from(filter.offset()).is_ok(), "{raw}");
        }
    }

    #[test]
    fn test_offset_saturates() {
        let filter = QueryFilter {
            page: u64::MAX,
            page_size: MAX_PAGE_SIZE,
            ..QueryFilter::default()
        };
        assert_eq!(filter.offset(), u64::MAX);
    }

    #[test]
    fn test_year_is_half_open() {
        let query = PostQuery {
            year: Some(2023),
            ..PostQuery::default()
        };

        assert!(query.matches(&post_at("2023-01-01T00:00", "a")));
        assert!(query.matches(&post_at("2023-12-31T23:59", "a")));
        assert!(!query.matches(&post_at("2024-01-01T00:00", "a")));
        assert!(!query.matches(&post_at("2022-12-31T23:59", "a")));
    }

    #[test]
    fn test_search_ignores_case() {
        let query = PostQuery {
            search: Some("HeRoN".to_string()),
            ..PostQuery::default()
        };
        assert!(query.matches(&post_at("2023-05-01T08:00", "Saw a heron by the lake")));
        assert!(!query.matches(&post_at("2023-05-01T08:00", "Saw a crane")));
    }

    #[test]
    fn test_recency_cutoff_is_strict() {
        let post = post_at("2023-05-01T08:00", "a");
        let at_cutoff = PostQuery {
            newer_than: Some(post.event_time),
            ..PostQuery::default()
        };
        assert!(!at_cutoff.matches(&post));

        let before = PostQuery {
            newer_than: Some(post.event_time - chrono::Duration::seconds(1)),
            ..PostQuery::default()
        };
        assert!(before.matches(&post));
    }

    #[test]
    fn test_deleted_never_matches() {
        let mut post = post_at("2023-05-01T08:00", "a");
        post.soft_delete(Utc::now());
        assert!(!PostQuery::default().matches(&post));
    }
}
