//! Sequential result pagination for the jamkick search.
//!
//! A [`PaginatedFetcher`] takes a [`Query`], asks a [`PageSource`] for page 1,
//! 2, 3, ... one at a time, hands each fragment to a [`ResultsView`] and stops
//! as soon as a [`CompletionMarker`] recognises the last page. At most one
//! sequence runs per fetcher; a second `start_search` while one is active is
//! rejected with [`PagerError::Busy`].
//!
//! - `source`: the page source seam and its HTTP implementation
//! - `view`: the display seam and an in-memory buffer
//! - `marker`: last-page detection (`id="loading-complete"` by default)
//! - `markup`: a light tag stripper for text rendering

pub mod error;
pub mod fetcher;
pub mod marker;
pub mod markup;
pub mod query;
pub mod source;
pub mod view;

pub use error::PagerError;
pub use fetcher::{
    FetchState, FetcherOptions, PageResponse, PaginatedFetcher, SearchReport, UpdateMode,
};
pub use marker::{CompletionMarker, SentinelError, SentinelId};
pub use query::Query;
pub use source::{HttpPageSource, PageSource};
pub use view::{BufferView, ResultsView};
