//! The pagination loop.
//!
//! One search is a *fetch sequence*: page 1, then page 2, ... each requested
//! only after the previous response has been shown. The sequence ends when a
//! page carries the completion marker, when a request fails, when the page
//! limit is hit, or when [`PaginatedFetcher::cancel`] is called.
//!
//! ```text
//! Idle ─ start_search ─▶ Fetching{1} ─▶ Fetching{2} ─▶ … ─▶ Idle
//! ```

use crate::error::PagerError;
use crate::marker::CompletionMarker;
use crate::query::Query;
use crate::source::PageSource;
use crate::view::ResultsView;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Observable state of a fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    /// Waiting on, or processing, `page`.
    Fetching { page: u32 },
}

/// How each page lands in the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Page 1 replaces the loading indicator, later pages are appended.
    #[default]
    Append,
    /// Every page replaces the view (for servers returning cumulative pages).
    Replace,
}

#[derive(Debug, Clone)]
pub struct FetcherOptions {
    pub mode: UpdateMode,
    /// `None` keeps requesting until the server sends the marker.
    pub max_pages: Option<u32>,
    pub loading_markup: String,
    pub failure_message: String,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            mode: UpdateMode::Append,
            max_pages: Some(100),
            loading_markup: r#"<p id="loading">Loading, please wait!</p>"#.to_string(),
            failure_message: "Something went wrong!".to_string(),
        }
    }
}

/// One page as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub page: u32,
    pub fragment: String,
    pub is_last: bool,
}

/// Summary of a sequence that reached the completion marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchReport {
    pub pages: u32,
}

#[derive(Default)]
struct Slot {
    state: FetchState,
    cancel: Option<CancellationToken>,
}

pub struct PaginatedFetcher {
    source: Arc<dyn PageSource>,
    view: Arc<dyn ResultsView>,
    marker: Arc<dyn CompletionMarker>,
    options: FetcherOptions,
    slot: Mutex<Slot>,
}

impl PaginatedFetcher {
    pub fn new(
        source: Arc<dyn PageSource>,
        view: Arc<dyn ResultsView>,
        marker: Arc<dyn CompletionMarker>,
    ) -> Self {
        Self {
            source,
            view,
            marker,
            options: FetcherOptions::default(),
            slot: Mutex::new(Slot::default()),
        }
    }

    pub fn with_options(mut self, options: FetcherOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &FetcherOptions {
        &self.options
    }

    pub fn state(&self) -> FetchState {
        self.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.state() != FetchState::Idle
    }

    /// Abort the running sequence, if any. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        match &self.lock().cancel {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Run a whole fetch sequence for `query`.
    ///
    /// Returns [`PagerError::Busy`] without touching the view when a sequence
    /// is already active. Network/server failures and the page limit raise one
    /// alert on the view; content shown before the failure stays in place.
    pub async fn start_search(&self, query: Query) -> Result<SearchReport, PagerError> {
        let sequence = match self.begin() {
            Ok(sequence) => sequence,
            Err(err) => {
                tracing::debug!(
                    target: "pager",
                    username = %query.username,
                    location = %query.location,
                    "pager.search.busy"
                );
                return Err(err);
            }
        };

        let history_url = self.source.history_url(&query);
        tracing::info!(
            target: "pager",
            username = %query.username,
            location = %query.location,
            history_url = history_url.as_ref().map(|u| u.as_str()).unwrap_or("-"),
            max_pages = ?self.options.max_pages,
            "pager.search.start"
        );
        self.view.set_content(&self.options.loading_markup);

        let result = self.run(&query, &sequence).await;
        drop(sequence);

        match &result {
            Ok(report) => {
                tracing::info!(target: "pager", pages = report.pages, "pager.search.complete");
            }
            Err(PagerError::Cancelled { page }) => {
                tracing::info!(target: "pager", page, "pager.search.cancelled");
            }
            Err(err) => {
                tracing::warn!(target: "pager", error = %err, "pager.search.failed");
            }
        }
        if let Err(err) = &result {
            if err.is_alerted() {
                self.view.alert(&self.options.failure_message);
            }
        }
        result
    }

    async fn run(
        &self,
        query: &Query,
        sequence: &Sequence<'_>,
    ) -> Result<SearchReport, PagerError> {
        let limit = self.options.max_pages.map(|m| m.max(1));
        let mut page: u32 = 1;

        loop {
            if let Some(limit) = limit {
                if page > limit {
                    return Err(PagerError::PageLimit { limit });
                }
            }
            sequence.advance(page);

            let response = self.request_page(query, page, &sequence.token).await?;
            self.show(&response);

            if response.is_last {
                return Ok(SearchReport { pages: page });
            }
            page = match page.checked_add(1) {
                Some(next) => next,
                None => return Err(PagerError::PageLimit { limit: page }),
            };
        }
    }

    /// Fetch one page and check it for the completion marker.
    async fn request_page(
        &self,
        query: &Query,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<PageResponse, PagerError> {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PagerError::Cancelled { page }),
            res = self.source.fetch_page(query, page) => res,
        };
        let fragment = fetched.map_err(|source| PagerError::Source { page, source })?;

        let is_last = self.marker.is_last_page(&fragment);
        tracing::debug!(
            target: "pager",
            page,
            bytes = fragment.len(),
            is_last,
            "pager.page.fetched"
        );
        Ok(PageResponse {
            page,
            fragment,
            is_last,
        })
    }

    fn show(&self, response: &PageResponse) {
        match self.options.mode {
            UpdateMode::Append if response.page > 1 => {
                self.view.append_content(&response.fragment)
            }
            _ => self.view.set_content(&response.fragment),
        }
    }

    fn begin(&self) -> Result<Sequence<'_>, PagerError> {
        let mut slot = self.lock();
        if slot.state != FetchState::Idle {
            return Err(PagerError::Busy);
        }
        let token = CancellationToken::new();
        slot.state = FetchState::Fetching { page: 1 };
        slot.cancel = Some(token.clone());
        Ok(Sequence {
            fetcher: self,
            token,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Holds the active flag for one sequence; dropping it returns the fetcher to Idle.
struct Sequence<'a> {
    fetcher: &'a PaginatedFetcher,
    token: CancellationToken,
}

impl Sequence<'_> {
    fn advance(&self, page: u32) {
        self.fetcher.lock().state = FetchState::Fetching { page };
    }
}

impl Drop for Sequence<'_> {
    fn drop(&mut self) {
        let mut slot = self.fetcher.lock();
        slot.state = FetchState::Idle;
        slot.cancel = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::SentinelId;
    use crate::view::BufferView;
    use async_trait::async_trait;
    use jamkick_http::HttpError;
    use std::time::Duration;
    use tokio::sync::Notify;

    const DONE: &str = r#"<div id="loading-complete"></div>"#;

    /// Serves `pages` in order; the last one carries the marker unless
    /// `endless` is set. Optionally fails at a given page.
    #[derive(Default)]
    struct ScriptedSource {
        pages: Vec<String>,
        fail_at: Option<u32>,
        endless: bool,
        seen: Mutex<Vec<(Query, u32)>>,
        hold_first: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl ScriptedSource {
        fn with_pages(n: u32) -> Self {
            let pages = (1..=n)
                .map(|i| {
                    if i == n {
                        format!("<li>page {i}</li>{DONE}")
                    } else {
                        format!("<li>page {i}</li>")
                    }
                })
                .collect();
            Self {
                pages,
                ..Default::default()
            }
        }

        fn requested_pages(&self) -> Vec<u32> {
            self.seen.lock().unwrap().iter().map(|(_, p)| *p).collect()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(&self, query: &Query, page: u32) -> Result<String, HttpError> {
            self.seen.lock().unwrap().push((query.clone(), page));
            if page == 1 {
                if let Some((entered, release)) = &self.hold_first {
                    entered.notify_one();
                    release.notified().await;
                }
            }
            if self.fail_at == Some(page) {
                return Err(HttpError::Network("connection reset".into()));
            }
            if self.endless {
                return Ok(format!("<li>page {page}</li>"));
            }
            Ok(self.pages[(page - 1) as usize].clone())
        }
    }

    fn fetcher(source: Arc<ScriptedSource>, view: Arc<BufferView>) -> PaginatedFetcher {
        PaginatedFetcher::new(
            source,
            view,
            Arc::new(SentinelId::new("loading-complete").unwrap()),
        )
    }

    fn query() -> Query {
        Query::new("alice", "London")
    }

    #[tokio::test]
    async fn single_page_with_marker_makes_one_request() {
        let source = Arc::new(ScriptedSource {
            pages: vec![DONE.to_string()],
            ..Default::default()
        });
        let view = Arc::new(BufferView::new());
        let f = fetcher(source.clone(), view.clone());

        let report = f.start_search(query()).await.unwrap();

        assert_eq!(report, SearchReport { pages: 1 });
        assert_eq!(source.requested_pages(), vec![1]);
        assert_eq!(f.state(), FetchState::Idle);
        assert_eq!(view.content(), DONE);
    }

    #[tokio::test]
    async fn k_pages_are_requested_in_order_and_concatenated() {
        let source = Arc::new(ScriptedSource::with_pages(4));
        let view = Arc::new(BufferView::new());
        let f = fetcher(source.clone(), view.clone());

        let report = f.start_search(query()).await.unwrap();

        assert_eq!(report.pages, 4);
        assert_eq!(source.requested_pages(), vec![1, 2, 3, 4]);
        assert_eq!(view.content(), source.pages.concat());
        assert!(view.alerts().is_empty());
        assert!(!f.is_active());
        for (q, _) in source.seen.lock().unwrap().iter() {
            assert_eq!(q, &query());
        }
    }

    #[tokio::test]
    async fn replace_mode_keeps_only_the_last_page() {
        let source = Arc::new(ScriptedSource::with_pages(3));
        let view = Arc::new(BufferView::new());
        let f = fetcher(source.clone(), view.clone()).with_options(FetcherOptions {
            mode: UpdateMode::Replace,
            ..Default::default()
        });

        f.start_search(query()).await.unwrap();
        assert_eq!(view.content(), source.pages[2]);
    }

    #[tokio::test]
    async fn failure_at_page_m_stops_and_alerts_once() {
        let source = Arc::new(ScriptedSource {
            fail_at: Some(3),
            ..ScriptedSource::with_pages(5)
        });
        let view = Arc::new(BufferView::new());
        let f = fetcher(source.clone(), view.clone());

        let err = f.start_search(query()).await.unwrap_err();

        assert!(matches!(err, PagerError::Source { page: 3, .. }));
        assert_eq!(source.requested_pages(), vec![1, 2, 3]);
        assert_eq!(view.alerts(), vec!["Something went wrong!"]);
        assert!(!f.is_active());
        // Pages shown before the failure stay visible.
        assert_eq!(view.content(), "<li>page 1</li><li>page 2</li>");
    }

    #[tokio::test]
    async fn failure_on_first_page_leaves_loading_indicator() {
        let source = Arc::new(ScriptedSource {
            fail_at: Some(1),
            ..ScriptedSource::with_pages(2)
        });
        let view = Arc::new(BufferView::new());
        let f = fetcher(source.clone(), view.clone());

        f.start_search(query()).await.unwrap_err();

        assert_eq!(source.requested_pages(), vec![1]);
        assert_eq!(view.content(), FetcherOptions::default().loading_markup);
        assert_eq!(view.alerts().len(), 1);
    }

    #[tokio::test]
    async fn endless_server_is_stopped_by_page_limit() {
        let source = Arc::new(ScriptedSource {
            endless: true,
            ..Default::default()
        });
        let view = Arc::new(BufferView::new());
        let f = fetcher(source.clone(), view.clone()).with_options(FetcherOptions {
            max_pages: Some(7),
            failure_message: "Too many pages".into(),
            ..Default::default()
        });

        let err = f.start_search(query()).await.unwrap_err();

        assert!(matches!(err, PagerError::PageLimit { limit: 7 }));
        assert_eq!(source.requested_pages(), (1..=7).collect::<Vec<_>>());
        assert_eq!(view.alerts(), vec!["Too many pages"]);
        assert!(!f.is_active());
    }

    #[tokio::test]
    async fn marker_on_exactly_the_last_allowed_page_succeeds() {
        let source = Arc::new(ScriptedSource::with_pages(5));
        let view = Arc::new(BufferView::new());
        let f = fetcher(source.clone(), view.clone()).with_options(FetcherOptions {
            max_pages: Some(5),
            ..Default::default()
        });

        let report = f.start_search(query()).await.unwrap();

        assert_eq!(report.pages, 5);
        assert_eq!(source.requested_pages(), vec![1, 2, 3, 4, 5]);
        assert!(view.alerts().is_empty());
    }

    #[tokio::test]
    async fn unbounded_search_runs_until_the_marker() {
        let source = Arc::new(ScriptedSource::with_pages(150));
        let view = Arc::new(BufferView::new());
        let f = fetcher(source.clone(), view.clone()).with_options(FetcherOptions {
            max_pages: None,
            ..Default::default()
        });

        let report = f.start_search(query()).await.unwrap();

        assert_eq!(report.pages, 150);
        assert_eq!(source.requested_pages(), (1..=150).collect::<Vec<_>>());
        assert_eq!(view.content(), source.pages.concat());
        assert!(view.alerts().is_empty());
    }

    #[tokio::test]
    async fn marker_is_only_honoured_on_real_elements() {
        let source = Arc::new(ScriptedSource {
            pages: vec![
                r#"<li>one</li><!-- <div id="loading-complete"></div> -->"#.to_string(),
                r#"<li title="a > b">two</li><script>'<i id="loading-complete">'</script>"#
                    .to_string(),
                r#"<li>three</li><div class="x > y" id="loading-complete"></div>"#.to_string(),
            ],
            ..Default::default()
        });
        let view = Arc::new(BufferView::new());
        let f = fetcher(source.clone(), view.clone()).with_options(FetcherOptions {
            max_pages: Some(3),
            ..Default::default()
        });

        let report = f.start_search(query()).await.unwrap();

        assert_eq!(report.pages, 3);
        assert_eq!(source.requested_pages(), vec![1, 2, 3]);
        assert!(view.alerts().is_empty());
    }

    #[tokio::test]
    async fn zero_page_limit_still_requests_first_page() {
        let source = Arc::new(ScriptedSource::with_pages(1));
        let view = Arc::new(BufferView::new());
        let f = fetcher(source.clone(), view).with_options(FetcherOptions {
            max_pages: Some(0),
            ..Default::default()
        });

        assert_eq!(f.start_search(query()).await.unwrap().pages, 1);
    }

    #[tokio::test]
    async fn second_start_while_active_is_rejected() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let source = Arc::new(ScriptedSource {
            hold_first: Some((entered.clone(), release.clone())),
            ..ScriptedSource::with_pages(2)
        });
        let view = Arc::new(BufferView::new());
        let f = Arc::new(fetcher(source.clone(), view.clone()));

        let running = {
            let f = f.clone();
            tokio::spawn(async move { f.start_search(query()).await })
        };
        entered.notified().await;

        assert_eq!(f.state(), FetchState::Fetching { page: 1 });
        let shown = view.content();
        let second = f.start_search(Query::new("bob", "Paris")).await;
        assert!(matches!(second, Err(PagerError::Busy)));
        assert_eq!(view.content(), shown);
        assert!(view.alerts().is_empty());
        assert_eq!(f.state(), FetchState::Fetching { page: 1 });
        assert_eq!(source.requested_pages(), vec![1]);

        release.notify_one();
        let report = running.await.unwrap().unwrap();

        assert_eq!(report.pages, 2);
        assert_eq!(source.requested_pages(), vec![1, 2]);
        assert!(source.seen.lock().unwrap().iter().all(|(q, _)| q.username == "alice"));
        assert!(view.alerts().is_empty());
        assert!(!f.is_active());
    }

    #[tokio::test]
    async fn repeated_searches_each_start_at_page_one() {
        let source = Arc::new(ScriptedSource::with_pages(3));
        let view = Arc::new(BufferView::new());
        let f = fetcher(source.clone(), view.clone());

        f.start_search(query()).await.unwrap();
        let first = view.content();
        f.start_search(query()).await.unwrap();

        assert_eq!(source.requested_pages(), vec![1, 2, 3, 1, 2, 3]);
        assert_eq!(view.content(), first);
    }

    #[tokio::test]
    async fn cancel_stops_the_sequence_without_alert() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let source = Arc::new(ScriptedSource {
            hold_first: Some((entered.clone(), release)),
            ..ScriptedSource::with_pages(3)
        });
        let view = Arc::new(BufferView::new());
        let f = Arc::new(fetcher(source.clone(), view.clone()));

        let running = {
            let f = f.clone();
            tokio::spawn(async move { f.start_search(query()).await })
        };
        entered.notified().await;
        assert!(f.cancel());

        let err = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .expect("cancelled search returns")
            .unwrap()
            .unwrap_err();

        assert!(matches!(err, PagerError::Cancelled { page: 1 }));
        assert!(view.alerts().is_empty());
        assert!(!f.is_active());
        assert!(!f.cancel());
    }

    #[tokio::test]
    async fn dropping_the_search_future_resets_state() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let source = Arc::new(ScriptedSource {
            hold_first: Some((entered.clone(), release)),
            ..ScriptedSource::with_pages(1)
        });
        let view = Arc::new(BufferView::new());
        let f = Arc::new(fetcher(source, view));

        let running = {
            let f = f.clone();
            tokio::spawn(async move { f.start_search(query()).await })
        };
        entered.notified().await;
        running.abort();
        let _ = running.await;

        assert_eq!(f.state(), FetchState::Idle);
    }
}
