//! Markdown Rendering Capability
//!
//! The host platform owns the markdown pipeline used for challenge
//! descriptions; the view adapter only needs a `render(markdown) -> html`
//! handle to it. `CmarkRenderer` is the default implementation for
//! standalone deployments.

use pulldown_cmark::{html, Options, Parser};

/// Handle to a markdown rendering capability
pub trait MarkdownRenderer: Send + Sync {
    /// Render markdown source to an HTML string
    fn render(&self, markdown: &str) -> String;
}

/// Default renderer backed by pulldown-cmark
#[derive(Debug, Default, Clone, Copy)]
pub struct CmarkRenderer;

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let parser = Parser::new_ext(markdown, options);
        let mut out = String::new();
        html::push_html(&mut out, parser);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_basic_markdown() {
        let renderer = CmarkRenderer;
        let html = renderer.render("# AWD\n\nkeep your service **alive**");
        assert!(html.contains("<h1>AWD</h1>"));
        assert!(html.contains("<strong>alive</strong>"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(CmarkRenderer.render(""), "");
    }
}
