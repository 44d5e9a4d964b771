use scraper::{ElementRef, Html};
use thiserror::Error;

/// Decides whether a page fragment is the last one of a sequence.
pub trait CompletionMarker: Send + Sync {
    fn is_last_page(&self, fragment: &str) -> bool;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SentinelError {
    #[error("sentinel id is empty")]
    Empty,
    #[error("sentinel id contains whitespace: {0:?}")]
    Whitespace(String),
}

/// Recognises the last page by an element whose `id` equals a given value.
///
/// The fragment is parsed as HTML, so only real elements count: the id
/// showing up in a comment, in `<script>` text or inside another attribute's
/// value does not end the sequence. The comparison is case-sensitive.
///
/// ```
/// use jamkick_pager::{CompletionMarker, SentinelId};
///
/// let marker = SentinelId::new("loading-complete").unwrap();
/// assert!(marker.is_last_page(r#"<ul></ul><div id="loading-complete"></div>"#));
/// assert!(!marker.is_last_page("<ul><li>more soon</li></ul>"));
/// ```
#[derive(Debug, Clone)]
pub struct SentinelId {
    id: String,
}

impl SentinelId {
    pub fn new(id: &str) -> Result<Self, SentinelError> {
        if id.is_empty() {
            return Err(SentinelError::Empty);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(SentinelError::Whitespace(id.to_string()));
        }
        Ok(Self { id: id.to_string() })
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl CompletionMarker for SentinelId {
    fn is_last_page(&self, fragment: &str) -> bool {
        let doc = Html::parse_fragment(fragment);
        doc.root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .any(|el| el.value().id() == Some(self.id.as_str()))
    }
}
