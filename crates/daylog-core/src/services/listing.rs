//! Content filter engine - turns listing parameters into a bounded page.

use std::sync::Arc;

use crate::domain::Post;
use crate::error::RepoError;
use crate::filter::{PostQuery, QueryFilter};
use crate::ports::{PostRepository, YearCount};
use crate::services::auth_gate::ArchiveAccess;

/// A rendered-ready listing result.
#[derive(Debug, Clone)]
pub struct Listing {
    pub posts: Vec<Post>,
    /// Matching posts before pagination.
    pub total: u64,
    /// Live posts per year over the whole journal, newest first.
    pub years: Vec<YearCount>,
    pub filter: QueryFilter,
    /// Year filter that was applied; `None` when a search replaced it.
    pub year: Option<i32>,
    /// The recency horizon was applied because archive access has lapsed.
    pub archive_restricted: bool,
}

pub struct ContentFilterEngine {
    posts: Arc<dyn PostRepository>,
}

impl ContentFilterEngine {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    /// Compile a filter into a storage query.
    ///
    /// A non-empty search replaces the year filter. The recency cutoff of
    /// a restricted session is added on top of whatever else applies.
    pub fn build_query(filter: &QueryFilter, access: ArchiveAccess) -> PostQuery {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let year = if search.is_some() { None } else { filter.year };

        PostQuery {
            search,
            year,
            newer_than: access.newer_than(),
            offset: filter.offset(),
            limit: filter.page_size,
        }
    }

    pub async fn list(
        &self,
        filter: QueryFilter,
        access: ArchiveAccess,
    ) -> Result<Listing, RepoError> {
        let query = Self::build_query(&filter, access);
        let page = self.posts.query(&query).await?;
        let years = self.posts.year_counts().await?;

        tracing::debug!(
            total = page.total,
            returned = page.posts.len(),
            page = filter.page,
            restricted = access.is_restricted(),
            "Listing computed"
        );

        Ok(Listing {
            posts: page.posts,
            total: page.total,
            years,
            filter,
            year: query.year,
            archive_restricted: access.is_restricted(),
        })
    }
}
