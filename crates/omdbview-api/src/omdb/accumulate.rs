//! Paged search accumulation.

use tracing::instrument;

use super::api::OmdbApi;
use super::types::{SearchParams, SearchResultItem};

/// Result of [`accumulate_search`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulated {
    /// Items in page order, truncated to the target count.
    pub items: Vec<SearchResultItem>,
    /// Number of pages requested.
    pub pages: u32,
    /// `true` when OMDB ran out of results before the target was reached.
    pub exhausted: bool,
}

/// Failure modes of [`accumulate_search`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccumulateError {
    /// The page ceiling was hit while more results were still available.
    #[error("page ceiling of {max_pages} reached with {collected} of {target} items")]
    PageCeilingExceeded {
        /// Configured page ceiling.
        max_pages: u32,
        /// Items collected before giving up.
        collected: usize,
        /// Requested item count.
        target: usize,
    },
    /// A page request failed. Accumulation is not retried.
    #[error("search request failed on page {page}: {message}")]
    Request {
        /// Page whose request failed.
        page: u32,
        /// Error chain of the failed request.
        message: String,
    },
}

/// Fetches consecutive search pages starting at `params.page` until at least
/// `target` items are collected, then truncates to `target`.
///
/// Pagination stops early when a page comes back empty or the collected
/// count reaches OMDB's `totalResults`; the shorter list is returned with
/// `exhausted` set. At most `max_pages` requests are issued.
///
/// # Errors
///
/// - [`AccumulateError::PageCeilingExceeded`] if `max_pages` pages were
///   fetched without reaching either the target or the end of results.
/// - [`AccumulateError::Request`] if any page request fails.
#[instrument(skip_all, fields(query = %params.query, wanted = target, max_pages = max_pages))]
pub async fn accumulate_search(
    api: &(impl OmdbApi + Sync),
    params: &SearchParams,
    target: usize,
    max_pages: u32,
) -> Result<Accumulated, AccumulateError> {
    if target == 0 {
        return Ok(Accumulated::default());
    }

    let mut items: Vec<SearchResultItem> = Vec::new();
    let mut pages: u32 = 0;
    let mut page_no = params.page.max(1);

    let exhausted = loop {
        if pages >= max_pages {
            tracing::debug!(
                pages = pages,
                collected = items.len(),
                "page ceiling reached"
            );
            return Err(AccumulateError::PageCeilingExceeded {
                max_pages,
                collected: items.len(),
                target,
            });
        }

        let page_params = params.clone().page(page_no);
        let page = api.search(&page_params).await.map_err(|err| {
            tracing::debug!(page = page_no, error = %err, "search page failed");
            AccumulateError::Request {
                page: page_no,
                message: format!("{err:#}"),
            }
        })?;
        pages = pages.saturating_add(1);

        tracing::debug!(
            page = page_no,
            fetched = page.items.len(),
            collected = items.len(),
            "search page completed"
        );

        if page.items.is_empty() {
            break true;
        }
        items.extend(page.items);

        if items.len() >= target {
            break false;
        }
        if page.total_results.is_some_and(|total| items.len() >= total) {
            break true;
        }

        let Some(next) = page_no.checked_add(1) else {
            break true;
        };
        page_no = next;
    };

    items.truncate(target);

    tracing::debug!(
        total = items.len(),
        pages = pages,
        exhausted = exhausted,
        "search accumulation completed"
    );

    Ok(Accumulated {
        items,
        pages,
        exhausted,
    })
}
