//! Page link calculation for listings.

use serde::Serialize;
use url::form_urlencoded;

/// A link to one page of the current listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationLink {
    /// 1-based page number.
    pub ord: u64,
    /// Encoded query string (no leading `?`) that reaches this page.
    pub params: String,
}

/// Number of pages needed to show `total` items. The last page may be partial.
pub fn page_count(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Build one link per page, keeping every other query parameter as given.
///
/// `p` is set to the page number in place (or appended); the `page` alias
/// is dropped so the link cannot disagree with itself.
pub fn pagination_links(
    total: u64,
    page_size: u64,
    query: &[(String, String)],
) -> Vec<PaginationLink> {
    (1..=page_count(total, page_size))
        .map(|ord| PaginationLink {
            ord,
            params: with_page(query, ord),
        })
        .collect()
}

fn with_page(query: &[(String, String)], page: u64) -> String {
    let page = page.to_string();
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut placed = false;

    for (key, value) in query {
        match key.as_str() {
            "page" => {}
            "p" if placed => {}
            "p" => {
                serializer.append_pair("p", &page);
                placed = true;
            }
            _ => {
                serializer.append_pair(key, value);
            }
        }
    }
    if !placed {
        serializer.append_pair("p", &page);
    }

    serializer.finish()
}
