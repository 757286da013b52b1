//! Fetch plan generation.
//!
//! Turns one search URL into the ordered list of paginated listing requests.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::errors::InvalidInputError;

/// Path of the paginated listing endpoint.
pub const LISTING_ENDPOINT_PATH: &str = "/jobs-guest/jobs/api/seeMoreJobPostings/search";

/// Default paginated listing endpoint.
pub const DEFAULT_LISTING_ENDPOINT: &str =
    "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";

/// Query parameters that carry pagination state and are rewritten.
pub const PAGINATION_PARAMS: [&str; 3] = ["start", "position", "pageNum"];

/// One planned page request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchDescriptor {
    /// 1-based position in the plan.
    pub page_index: usize,
    /// Item offset of the page.
    pub offset: usize,
    /// Fully formed request URL.
    pub url: String,
}

/// Builds fetch plans against a listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlanner {
    listing_endpoint: String,
}

impl Default for FetchPlanner {
    fn default() -> Self {
        Self {
            listing_endpoint: DEFAULT_LISTING_ENDPOINT.to_string(),
        }
    }
}

impl FetchPlanner {
    /// Creates a planner for the default listing endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a planner for a custom listing endpoint.
    #[must_use]
    pub fn with_endpoint(listing_endpoint: impl Into<String>) -> Self {
        Self {
            listing_endpoint: listing_endpoint.into(),
        }
    }

    /// The endpoint search URLs are rewritten to.
    #[must_use]
    pub fn listing_endpoint(&self) -> &str {
        &self.listing_endpoint
    }

    /// Number of pages needed for `target_items`, capped at `max_pages`.
    #[must_use]
    pub fn page_count(target_items: usize, page_size: usize, max_pages: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        target_items.div_ceil(page_size).min(max_pages)
    }

    /// Produces the ordered fetch plan for a search URL.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError`] when `base_url` is not an absolute URL,
    /// when the listing endpoint is not one, or when `page_size` is zero.
    pub fn plan(
        &self,
        base_url: &str,
        target_items: usize,
        page_size: usize,
        max_pages: usize,
    ) -> Result<Vec<FetchDescriptor>, InvalidInputError> {
        if page_size == 0 {
            return Err(InvalidInputError::new(
                page_size.to_string(),
                "page size must be positive",
            ));
        }

        let search = Url::parse(base_url.trim())
            .map_err(|e| InvalidInputError::new(base_url, format!("not a valid URL: {e}")))?;
        if search.cannot_be_a_base() {
            return Err(InvalidInputError::new(base_url, "not a hierarchical URL"));
        }

        let mut listing = self.listing_base(&search)?;
        let retained: Vec<(String, String)> = search
            .query_pairs()
            .filter(|(key, _)| !PAGINATION_PARAMS.contains(&key.as_ref()))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        listing.set_query(None);
        listing.set_fragment(None);

        let page_count = Self::page_count(target_items, page_size, max_pages);
        debug!(
            page_count,
            target_items,
            page_size,
            max_pages,
            endpoint = %listing,
            "Planned listing pages"
        );

        let descriptors = (0..page_count)
            .map(|i| {
                let offset = i * page_size;
                let mut url = listing.clone();
                url.query_pairs_mut()
                    .extend_pairs(retained.iter())
                    .append_pair("start", &offset.to_string());
                FetchDescriptor {
                    page_index: i + 1,
                    offset,
                    url: url.into(),
                }
            })
            .collect();

        Ok(descriptors)
    }

    fn listing_base(&self, search: &Url) -> Result<Url, InvalidInputError> {
        if search.path().contains(LISTING_ENDPOINT_PATH) {
            return Ok(search.clone());
        }
        Url::parse(&self.listing_endpoint).map_err(|e| {
            InvalidInputError::new(
                self.listing_endpoint.as_str(),
                format!("listing endpoint is not a valid URL: {e}"),
            )
        })
    }
}

/// Produces a fetch plan against the default listing endpoint.
///
/// # Examples
///
/// ```
/// use jobcrawl::plan::plan;
///
/// let plan = plan("https://x/jobs/search?keywords=dev", 60, 25, 40).unwrap();
/// let offsets: Vec<_> = plan.iter().map(|d| d.offset).collect();
/// assert_eq!(offsets, vec![0, 25, 50]);
/// ```
///
/// # Errors
///
/// See [`FetchPlanner::plan`].
pub fn plan(
    base_url: &str,
    target_items: usize,
    page_size: usize,
    max_pages: usize,
) -> Result<Vec<FetchDescriptor>, InvalidInputError> {
    FetchPlanner::default().plan(base_url, target_items, page_size, max_pages)
}
