use jamkick_pager::ResultsView;
use jamkick_pager::markup::text_content;
use std::sync::Mutex;

/// Display region for the command line: buffers the markup the fetcher puts
/// on screen and writes alerts straight to stderr.
pub struct TerminalView {
    raw: bool,
    content: Mutex<String>,
}

impl TerminalView {
    pub fn new(raw: bool) -> Self {
        Self {
            raw,
            content: Mutex::new(String::new()),
        }
    }

    /// What the user should see now: markup when `raw`, else its text.
    pub fn render(&self) -> String {
        let content = self.content.lock().unwrap_or_else(|p| p.into_inner());
        if self.raw {
            content.clone()
        } else {
            text_content(&content)
        }
    }
}

impl ResultsView for TerminalView {
    fn set_content(&self, markup: &str) {
        let mut content = self.content.lock().unwrap_or_else(|p| p.into_inner());
        content.clear();
        content.push_str(markup);
        tracing::debug!(target: "view", bytes = content.len(), "view.set");
    }

    fn append_content(&self, markup: &str) {
        let mut content = self.content.lock().unwrap_or_else(|p| p.into_inner());
        content.push_str(markup);
        tracing::debug!(target: "view", bytes = content.len(), "view.append");
    }

    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }
}
