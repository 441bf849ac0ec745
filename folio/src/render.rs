//! Error-state panel shared by every section that loads remote data.

/// Label shown on the retry control while a retry is in flight.
pub const RETRYING_LABEL: &str = "Retrying…";
pub const RETRY_LABEL: &str = "Retry";

/// Escape the characters that matter inside HTML text and attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn error_markup(message: &str) -> String {
    format!(
        r#"
    <div class="error-state">
      <div class="error-icon">⚠️</div>
      <p>{}</p>
      <button class="retry-btn">{}</button>
    </div>"#,
        escape_html(message),
        RETRY_LABEL
    )
}

/// Retry control of an error panel. Disabled after the first click.
pub struct RetryButton {
    disabled: bool,
    label: String,
    on_retry: Box<dyn FnMut() + Send>,
}

impl RetryButton {
    fn new(on_retry: Box<dyn FnMut() + Send>) -> Self {
        Self {
            disabled: false,
            label: RETRY_LABEL.to_string(),
            on_retry,
        }
    }

    /// Returns whether the click was delivered. Disabled buttons ignore clicks.
    pub fn click(&mut self) -> bool {
        if self.disabled {
            return false;
        }
        self.disabled = true;
        self.label = RETRYING_LABEL.to_string();
        (self.on_retry)();
        true
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Debug for RetryButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryButton")
            .field("disabled", &self.disabled)
            .field("label", &self.label)
            .finish()
    }
}

/// A region of the page whose content is replaced wholesale.
#[derive(Debug, Default)]
pub struct Container {
    html: String,
    retry: Option<RetryButton>,
}

impl Container {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            retry: None,
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Replace the content. Any previous retry control goes away with it.
    pub fn set_html(&mut self, html: impl Into<String>) {
        self.html = html.into();
        self.retry = None;
    }

    pub fn retry_button(&self) -> Option<&RetryButton> {
        self.retry.as_ref()
    }

    pub fn retry_button_mut(&mut self) -> Option<&mut RetryButton> {
        self.retry.as_mut()
    }
}

/// Replace `container` with the error panel for `message` and wire its retry control.
pub fn render_error<F>(container: &mut Container, message: &str, retry: F)
where
    F: FnMut() + Send + 'static,
{
    container.set_html(error_markup(message));
    container.retry = Some(RetryButton::new(Box::new(retry)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_render_error_escapes_script() {
        let mut container = Container::new("<p>loading</p>");
        render_error(&mut container, r#"<script>alert("xss")</script>"#, || {});

        let html = container.html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&quot;xss&quot;)&lt;/script&gt;"));
        assert!(html.contains(r#"<div class="error-state">"#));
        assert!(html.contains(r#"<div class="error-icon">⚠️</div>"#));
        assert!(html.contains(r#"<button class="retry-btn">Retry</button>"#));
        assert!(!html.contains("loading"));
    }

    #[test]
    fn test_retry_click_disables_and_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut container = Container::default();
        render_error(&mut container, "API error (500)", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let button = container.retry_button_mut().expect("retry button");
        assert!(!button.is_disabled());
        assert_eq!(button.label(), "Retry");

        assert!(button.click());
        assert!(button.is_disabled());
        assert_eq!(button.label(), "Retrying…");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(!button.click());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rerender_gives_fresh_button() {
        let mut container = Container::default();
        render_error(&mut container, "first", || {});
        container.retry_button_mut().unwrap().click();

        render_error(&mut container, "second", || {});
        let button = container.retry_button().unwrap();
        assert!(!button.is_disabled());
        assert!(container.html().contains("<p>second</p>"));
    }

    #[test]
    fn test_set_html_drops_retry() {
        let mut container = Container::default();
        render_error(&mut container, "oops", || {});
        container.set_html("<div class=\"timeline-loading\"></div>");
        assert!(container.retry_button().is_none());
    }
}
