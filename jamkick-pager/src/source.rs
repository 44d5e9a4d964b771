use crate::query::Query;
use async_trait::async_trait;
use jamkick_http::{HttpClient, HttpError, RequestOpts};
use url::Url;

/// Supplies one page of results at a time.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the markup fragment for `page` (1-based) of `query`.
    async fn fetch_page(&self, query: &Query, page: u32) -> Result<String, HttpError>;

    /// URL a user could bookmark to repeat this search, if the source has one.
    fn history_url(&self, _query: &Query) -> Option<Url> {
        None
    }
}

/// `GET <base><path>?username=..&location=..&page=N` over [`HttpClient`].
#[derive(Clone, Debug)]
pub struct HttpPageSource {
    http: HttpClient,
    path: String,
}

impl HttpPageSource {
    pub fn new(http: HttpClient, path: impl Into<String>) -> Self {
        Self {
            http,
            path: path.into(),
        }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, query: &Query, page: u32) -> Result<String, HttpError> {
        self.http
            .get_text(
                &self.path,
                RequestOpts {
                    query: Some(query.page_params(page)),
                    ..Default::default()
                },
            )
            .await
    }

    fn history_url(&self, query: &Query) -> Option<Url> {
        let endpoint = self.http.url_for(&self.path).ok()?;
        Some(query.history_url(&endpoint))
    }
}
