use jamkick_http::HttpError;
use thiserror::Error;

/// Why a search did not complete.
#[derive(Debug, Error)]
pub enum PagerError {
    /// Another sequence is still running on this fetcher. Nothing was done.
    #[error("a search is already in progress")]
    Busy,

    #[error("fetching page {page} failed: {source}")]
    Source { page: u32, source: HttpError },

    #[error("no completion marker after {limit} pages")]
    PageLimit { limit: u32 },

    #[error("search cancelled at page {page}")]
    Cancelled { page: u32 },
}

impl PagerError {
    /// Failures the user is told about. Rejected and cancelled searches stay quiet.
    pub fn is_alerted(&self) -> bool {
        matches!(self, PagerError::Source { .. } | PagerError::PageLimit { .. })
    }
}
