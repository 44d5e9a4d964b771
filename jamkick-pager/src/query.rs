use std::borrow::Cow;
use url::Url;

/// The two search form fields. Values are passed to the server verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub username: String,
    pub location: String,
}

impl Query {
    pub fn new(username: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            location: location.into(),
        }
    }

    /// Query parameters for one page request.
    ///
    /// ```
    /// use jamkick_pager::Query;
    ///
    /// let q = Query::new("alice", "London");
    /// let params = q.page_params(3);
    /// assert_eq!(params[0], ("username", "alice".into()));
    /// assert_eq!(params[1], ("location", "London".into()));
    /// assert_eq!(params[2], ("page", "3".into()));
    /// ```
    pub fn page_params(&self, page: u32) -> Vec<(&'static str, Cow<'_, str>)> {
        vec![
            ("username", Cow::Borrowed(self.username.as_str())),
            ("location", Cow::Borrowed(self.location.as_str())),
            ("page", Cow::Owned(page.to_string())),
        ]
    }

    /// Shareable URL for this search: the endpoint plus the form fields, no page.
    pub fn history_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("username", &self.username)
            .append_pair("location", &self.location);
        url
    }
}
