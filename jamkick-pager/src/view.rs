use std::sync::{Mutex, MutexGuard};

/// Where fetched fragments go and how failures reach the user.
pub trait ResultsView: Send + Sync {
    /// Replace everything currently shown.
    fn set_content(&self, markup: &str);
    /// Add to the end of what is shown.
    fn append_content(&self, markup: &str);
    /// Tell the user something went wrong.
    fn alert(&self, message: &str);
}

/// In-memory view: keeps the current markup and every alert raised.
#[derive(Debug, Default)]
pub struct BufferView {
    content: Mutex<String>,
    alerts: Mutex<Vec<String>>,
}

impl BufferView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> String {
        lock(&self.content).clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        lock(&self.alerts).clone()
    }
}

impl ResultsView for BufferView {
    fn set_content(&self, markup: &str) {
        let mut content = lock(&self.content);
        content.clear();
        content.push_str(markup);
    }

    fn append_content(&self, markup: &str) {
        lock(&self.content).push_str(markup);
    }

    fn alert(&self, message: &str) {
        lock(&self.alerts).push(message.to_string());
    }
}

// A panic while holding the lock cannot leave a String half-written, so the
// poisoned value is still usable.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_and_append_extends() {
        let view = BufferView::new();
        view.set_content("<p>loading</p>");
        view.set_content("<li>a</li>");
        view.append_content("<li>b</li>");
        assert_eq!(view.content(), "<li>a</li><li>b</li>");
        assert!(view.alerts().is_empty());
    }

    #[test]
    fn alerts_are_recorded_in_order() {
        let view = BufferView::new();
        view.alert("first");
        view.alert("second");
        assert_eq!(view.alerts(), vec!["first", "second"]);
    }
}
