//! The third-party comment widget embedded at the bottom of article pages.
//! The widget is a single `<script>` element; the script replaces itself with
//! a comment thread matched to the page.

use crate::htmlrenderer::{EscapeHref, EscapeHtml};
use serde::Deserialize;

const DEFAULT_SOURCE: &str = "https://utteranc.es/client.js";

/// Configuration for the comment widget.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CommentsWidget {
    /// The widget script's URL.
    #[serde(default = "default_source")]
    pub src: String,

    /// The repository whose issues hold the comment threads, as
    /// `owner/name`.
    pub repo: String,

    #[serde(default = "default_theme")]
    pub theme: String,

    /// How a page is matched to its issue (e.g. `pathname`, `url`, `title`).
    #[serde(default = "default_issue_term")]
    pub issue_term: String,
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_owned()
}

fn default_theme() -> String {
    String::from("github-dark")
}

fn default_issue_term() -> String {
    String::from("pathname")
}

impl CommentsWidget {
    /// Renders the widget's script element.
    pub fn render(&self) -> String {
        format!(
            r#"<script src="{}" repo="{}" issue-term="{}" theme="{}" crossorigin="anonymous" async></script>"#,
            EscapeHref(&self.src),
            EscapeHtml(&self.repo),
            EscapeHtml(&self.issue_term),
            EscapeHtml(&self.theme),
        )
    }
}
