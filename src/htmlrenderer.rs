//! Renders rich text ([`crate::richtext`]) into HTML. Spans are character
//! ranges that may overlap arbitrarily in the source data, so the renderer
//! closes and reopens enclosing tags wherever ranges cross to keep the output
//! well nested. Consecutive list items are grouped into a single `<ul>` or
//! `<ol>`. Hyperlinks to other documents are resolved against the posts URL.

use crate::richtext::{Block, BlockKind, Span, SpanData, SpanKind};
use pulldown_cmark::escape::{escape_href, escape_html, StrWrite};
use std::fmt::{self, Display};
use std::io;
use url::Url;

struct Adaptor<'a, T> {
    formatter: &'a mut T,
    result: fmt::Result,
}

impl<T> Adaptor<'_, T> {
    fn handle_result(&mut self, result: fmt::Result) -> io::Result<()> {
        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                self.result = result;
                Err(io::Error::new(io::ErrorKind::Other, e))
            }
        }
    }
}

impl<T: fmt::Write> StrWrite for Adaptor<'_, T> {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        let result = self.formatter.write_str(s);
        self.handle_result(result)
    }

    fn write_fmt(&mut self, args: fmt::Arguments) -> io::Result<()> {
        let result = self.formatter.write_fmt(args);
        self.handle_result(result)
    }
}

pub(crate) struct EscapeHref<'a>(pub &'a str);

impl Display for EscapeHref<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut adaptor = Adaptor {
            formatter: f,
            result: Ok(()),
        };
        let _ = escape_href(&mut adaptor, self.0);
        adaptor.result
    }
}

pub(crate) struct EscapeHtml<'a>(pub &'a str);

impl Display for EscapeHtml<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut adaptor = Adaptor {
            formatter: f,
            result: Ok(()),
        };
        let _ = escape_html(&mut adaptor, self.0);
        adaptor.result
    }
}

/// Escapes `s` for use as HTML text or a quoted attribute value.
pub fn escape(s: &str) -> String {
    EscapeHtml(s).to_string()
}

/// Renders rich-text [`Block`]s into HTML. Modeled after an event-driven
/// writer: one call per block, with [`HtmlRenderer::finish`] closing any list
/// left open by the final block.
struct HtmlRenderer<'a> {
    /// The kind of list item whose list is currently open, if any.
    list: Option<BlockKind>,

    /// Base URL for links to other documents (`{posts_url}{uid}.html`).
    posts_url: &'a Url,
}

impl<'a> HtmlRenderer<'a> {
    fn new(posts_url: &'a Url) -> Self {
        HtmlRenderer {
            list: None,
            posts_url,
        }
    }

    fn on_block<W: StrWrite>(
        &mut self,
        w: &mut W,
        block: &Block,
    ) -> io::Result<()> {
        let list = match block.kind {
            BlockKind::ListItem | BlockKind::OrderedListItem => Some(block.kind),
            _ => None,
        };
        if self.list != list {
            self.close_list(w)?;
            if let Some(kind) = list {
                w.write_str(match kind {
                    BlockKind::OrderedListItem => "<ol>",
                    _ => "<ul>",
                })?;
                self.list = Some(kind);
            }
        }

        if let Some(level) = block.kind.heading_level() {
            write!(w, "<h{}>", level)?;
            self.on_text(w, block)?;
            return write!(w, "</h{}>", level);
        }

        match block.kind {
            BlockKind::Paragraph => {
                w.write_str("<p>")?;
                self.on_text(w, block)?;
                w.write_str("</p>")
            }
            BlockKind::Preformatted => {
                w.write_str("<pre>")?;
                self.on_text(w, block)?;
                w.write_str("</pre>")
            }
            BlockKind::ListItem | BlockKind::OrderedListItem => {
                w.write_str("<li>")?;
                self.on_text(w, block)?;
                w.write_str("</li>")
            }
            BlockKind::Image => self.on_image(w, block),
            BlockKind::Embed => self.on_embed(w, block),
            _ => {
                tracing::warn!(kind = ?block.kind, "skipping rich-text block");
                Ok(())
            }
        }
    }

    fn finish<W: StrWrite>(&mut self, w: &mut W) -> io::Result<()> {
        self.close_list(w)
    }

    fn close_list<W: StrWrite>(&mut self, w: &mut W) -> io::Result<()> {
        match self.list.take() {
            Some(BlockKind::OrderedListItem) => w.write_str("</ol>"),
            Some(_) => w.write_str("</ul>"),
            None => Ok(()),
        }
    }

    fn on_image<W: StrWrite>(&self, w: &mut W, block: &Block) -> io::Result<()> {
        match &block.url {
            Some(url) => write!(
                w,
                r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                EscapeHref(url),
                EscapeHtml(block.alt.as_deref().unwrap_or_default()),
            ),
            None => Ok(()),
        }
    }

    fn on_embed<W: StrWrite>(&self, w: &mut W, block: &Block) -> io::Result<()> {
        let embed = match &block.oembed {
            Some(embed) => embed,
            None => return Ok(()),
        };
        write!(
            w,
            r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">"#,
            EscapeHref(embed.embed_url.as_deref().unwrap_or_default()),
            EscapeHtml(embed.kind.as_deref().unwrap_or_default()),
            EscapeHtml(embed.provider_name.as_deref().unwrap_or_default()),
        )?;
        // The provider's markup is trusted as-is.
        w.write_str(embed.html.as_deref().unwrap_or_default())?;
        w.write_str("</div>")
    }

    /// Writes a block's text with its spans applied.
    fn on_text<W: StrWrite>(&self, w: &mut W, block: &Block) -> io::Result<()> {
        let chars: Vec<char> = block.text.chars().collect();
        let len = chars.len();
        let end = |span: &Span| span.end.min(len);

        let mut spans: Vec<&Span> = block
            .spans
            .iter()
            .filter(|s| {
                s.kind != SpanKind::Unknown && s.start < s.end && s.start < len
            })
            .collect();
        // Among spans starting together, the longest opens first so it
        // encloses the others.
        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut open: Vec<&Span> = Vec::new();
        let mut next = 0;
        let mut segment = String::new();
        for i in 0..=len {
            let closing = open.iter().any(|&s| end(s) == i);
            let opening = next < spans.len() && spans[next].start == i;
            if closing || opening {
                self.on_segment(w, &segment)?;
                segment.clear();
            }

            if closing {
                let mut reopen = Vec::new();
                while open.iter().any(|&s| end(s) == i) {
                    match open.pop() {
                        Some(span) => {
                            self.close_span(w, span)?;
                            if end(span) != i {
                                reopen.push(span);
                            }
                        }
                        None => break,
                    }
                }
                for span in reopen.into_iter().rev() {
                    self.open_span(w, span)?;
                    open.push(span);
                }
            }

            while next < spans.len() && spans[next].start == i {
                self.open_span(w, spans[next])?;
                open.push(spans[next]);
                next += 1;
            }

            if i < len {
                segment.push(chars[i]);
            }
        }
        self.on_segment(w, &segment)
    }

    fn on_segment<W: StrWrite>(&self, w: &mut W, s: &str) -> io::Result<()> {
        for (i, line) in s.split('\n').enumerate() {
            if i > 0 {
                w.write_str("<br />")?;
            }
            escape_html(&mut *w, line)?;
        }
        Ok(())
    }

    fn open_span<W: StrWrite>(&self, w: &mut W, span: &Span) -> io::Result<()> {
        match span.kind {
            SpanKind::Strong => w.write_str("<strong>"),
            SpanKind::Em => w.write_str("<em>"),
            SpanKind::Label => write!(
                w,
                r#"<span class="{}">"#,
                EscapeHtml(
                    span.data
                        .as_ref()
                        .and_then(|d| d.label.as_deref())
                        .unwrap_or_default()
                ),
            ),
            SpanKind::Hyperlink => {
                let data = span.data.as_ref();
                match data.and_then(|d| self.resolve_link(d)) {
                    None => w.write_str("<a>"),
                    Some(href) => {
                        write!(w, r#"<a href="{}""#, EscapeHref(&href))?;
                        if let Some(target) = data.and_then(|d| d.target.as_deref()) {
                            write!(
                                w,
                                r#" target="{}" rel="noopener""#,
                                EscapeHtml(target)
                            )?;
                        }
                        w.write_str(">")
                    }
                }
            }
            SpanKind::Unknown => Ok(()),
        }
    }

    fn close_span<W: StrWrite>(&self, w: &mut W, span: &Span) -> io::Result<()> {
        match span.kind {
            SpanKind::Strong => w.write_str("</strong>"),
            SpanKind::Em => w.write_str("</em>"),
            SpanKind::Label => w.write_str("</span>"),
            SpanKind::Hyperlink => w.write_str("</a>"),
            SpanKind::Unknown => Ok(()),
        }
    }

    /// Document links point at the linked post's page; every other link type
    /// carries its own URL.
    fn resolve_link(&self, data: &SpanData) -> Option<String> {
        match data.link_type.as_deref() {
            Some("Document") => {
                let uid = data.uid.as_deref()?;
                self.posts_url
                    .join(&format!("{}.html", uid))
                    .ok()
                    .map(|url| url.to_string())
            }
            _ => data.url.clone(),
        }
    }
}

/// Converts rich-text blocks into an HTML string, appending to `out`.
/// Document links are resolved relative to `posts_url`, which should end in a
/// trailing slash.
pub fn push_html(
    out: &mut String,
    blocks: &[Block],
    posts_url: &Url,
) -> io::Result<()> {
    let mut renderer = HtmlRenderer::new(posts_url);
    for block in blocks {
        renderer.on_block(out, block)?;
    }
    renderer.finish(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::richtext::RichText;

    fn render(json: &str) -> String {
        let blocks: RichText = serde_json::from_str(json).unwrap();
        let posts_url = Url::parse("https://example.org/posts/").unwrap();
        let mut out = String::new();
        push_html(&mut out, &blocks, &posts_url).unwrap();
        out
    }

    #[test]
    fn test_paragraph_escaped() {
        assert_eq!(
            "<p>a &lt; b &amp; c</p>",
            render(r#"[{"type": "paragraph", "text": "a < b & c", "spans": []}]"#)
        );
    }

    #[test]
    fn test_headings_and_preformatted() {
        assert_eq!(
            "<h2>Title</h2><pre>let x = 1;</pre>",
            render(
                r#"[
                    {"type": "heading2", "text": "Title", "spans": []},
                    {"type": "preformatted", "text": "let x = 1;", "spans": []}
                ]"#
            )
        );
    }

    #[test]
    fn test_nested_spans() {
        assert_eq!(
            "<p><strong>Hello <em>big</em></strong> world</p>",
            render(
                r#"[{"type": "paragraph", "text": "Hello big world", "spans": [
                    {"start": 6, "end": 9, "type": "em"},
                    {"start": 0, "end": 9, "type": "strong"}
                ]}]"#
            )
        );
    }

    #[test]
    fn test_overlapping_spans() {
        assert_eq!(
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>",
            render(
                r#"[{"type": "paragraph", "text": "abcdef", "spans": [
                    {"start": 0, "end": 4, "type": "strong"},
                    {"start": 2, "end": 6, "type": "em"}
                ]}]"#
            )
        );
    }

    #[test]
    fn test_span_offsets_count_characters() {
        assert_eq!(
            "<p>não <em>é</em></p>",
            render(
                r#"[{"type": "paragraph", "text": "não é", "spans": [
                    {"start": 4, "end": 5, "type": "em"}
                ]}]"#
            )
        );
    }

    #[test]
    fn test_hyperlinks() {
        assert_eq!(
            concat!(
                r#"<p><a href="https://rust-lang.org" target="_blank" rel="noopener">web</a> "#,
                r#"<a href="https://example.org/posts/other-post.html">doc</a></p>"#,
            ),
            render(
                r#"[{"type": "paragraph", "text": "web doc", "spans": [
                    {"start": 0, "end": 3, "type": "hyperlink",
                     "data": {"link_type": "Web", "url": "https://rust-lang.org", "target": "_blank"}},
                    {"start": 4, "end": 7, "type": "hyperlink",
                     "data": {"link_type": "Document", "uid": "other-post"}}
                ]}]"#
            )
        );
    }

    #[test]
    fn test_label_and_line_breaks() {
        assert_eq!(
            r#"<p><span class="note">one</span><br />two</p>"#,
            render(
                r#"[{"type": "paragraph", "text": "one\ntwo", "spans": [
                    {"start": 0, "end": 3, "type": "label", "data": {"label": "note"}}
                ]}]"#
            )
        );
    }

    #[test]
    fn test_lists_grouped() {
        assert_eq!(
            "<ul><li>a</li><li>b</li></ul><ol><li>1</li></ol><p>end</p>",
            render(
                r#"[
                    {"type": "list-item", "text": "a", "spans": []},
                    {"type": "list-item", "text": "b", "spans": []},
                    {"type": "o-list-item", "text": "1", "spans": []},
                    {"type": "paragraph", "text": "end", "spans": []}
                ]"#
            )
        );
    }

    #[test]
    fn test_trailing_list_closed() {
        assert_eq!(
            "<ol><li>only</li></ol>",
            render(r#"[{"type": "o-list-item", "text": "only", "spans": []}]"#)
        );
    }

    #[test]
    fn test_image_and_unknown_block() {
        assert_eq!(
            r#"<p class="block-img"><img src="https://images.example.org/a.png" alt="A &lt;chart&gt;" /></p>"#,
            render(
                r#"[
                    {"type": "image", "url": "https://images.example.org/a.png", "alt": "A <chart>"},
                    {"type": "table", "text": "ignored", "spans": []}
                ]"#
            )
        );
    }

    #[test]
    fn test_embed() {
        assert_eq!(
            r#"<div data-oembed="https://youtu.be/x" data-oembed-type="video" data-oembed-provider="YouTube"><iframe></iframe></div>"#,
            render(
                r#"[{"type": "embed", "oembed": {
                    "embed_url": "https://youtu.be/x",
                    "type": "video",
                    "provider_name": "YouTube",
                    "html": "<iframe></iframe>"
                }}]"#
            )
        );
    }
}
