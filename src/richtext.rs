//! Defines the structured rich-text model the CMS returns for article bodies:
//! a sequence of [`Block`]s, each carrying plain text plus formatting
//! [`Span`]s over character ranges. See [`crate::htmlrenderer`] for the HTML
//! conversion.

use serde::Deserialize;

/// A rich-text field is an ordered sequence of blocks.
pub type RichText = Vec<Block>;

/// One block of rich text (a paragraph, heading, list item, image, ...).
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<Span>,

    /// Source URL, only present on image blocks.
    #[serde(default)]
    pub url: Option<String>,

    /// Alternative text, only present on image blocks.
    #[serde(default)]
    pub alt: Option<String>,

    /// The oEmbed payload, only present on embed blocks.
    #[serde(default)]
    pub oembed: Option<Embed>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum BlockKind {
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "heading4")]
    Heading4,
    #[serde(rename = "heading5")]
    Heading5,
    #[serde(rename = "heading6")]
    Heading6,
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "preformatted")]
    Preformatted,
    #[serde(rename = "list-item")]
    ListItem,
    #[serde(rename = "o-list-item")]
    OrderedListItem,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "embed")]
    Embed,
    #[serde(other)]
    Unknown,
}

impl BlockKind {
    /// Returns the heading level (1-6) for heading blocks.
    pub fn heading_level(self) -> Option<u8> {
        match self {
            BlockKind::Heading1 => Some(1),
            BlockKind::Heading2 => Some(2),
            BlockKind::Heading3 => Some(3),
            BlockKind::Heading4 => Some(4),
            BlockKind::Heading5 => Some(5),
            BlockKind::Heading6 => Some(6),
            _ => None,
        }
    }
}

/// Formatting applied to the characters in `start..end` of a block's text.
/// Offsets count characters, not bytes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,

    #[serde(rename = "type")]
    pub kind: SpanKind,

    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

/// Span payload. Hyperlinks carry `link_type` plus either a `url` (web and
/// media links) or a document `uid`; labels carry `label`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SpanData {
    #[serde(default)]
    pub link_type: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Embed {
    #[serde(default)]
    pub embed_url: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub provider_name: Option<String>,

    #[serde(default)]
    pub html: Option<String>,
}

/// Extracts the plain text of a rich-text field, joining blocks with a single
/// space.
pub fn as_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_deserialize_block() -> serde_json::Result<()> {
        let block: Block = serde_json::from_str(
            r#"{
                "type": "paragraph",
                "text": "Hello, world",
                "spans": [
                    {"start": 0, "end": 5, "type": "strong"},
                    {
                        "start": 7,
                        "end": 12,
                        "type": "hyperlink",
                        "data": {"link_type": "Web", "url": "https://example.org"}
                    }
                ]
            }"#,
        )?;
        assert_eq!(BlockKind::Paragraph, block.kind);
        assert_eq!(2, block.spans.len());
        assert_eq!(SpanKind::Hyperlink, block.spans[1].kind);
        assert_eq!(
            Some("https://example.org"),
            block.spans[1].data.as_ref().and_then(|d| d.url.as_deref())
        );
        Ok(())
    }

    #[test]
    fn test_deserialize_unknown_kinds() -> serde_json::Result<()> {
        let block: Block = serde_json::from_str(
            r#"{"type": "table", "spans": [{"start": 0, "end": 1, "type": "mark"}]}"#,
        )?;
        assert_eq!(BlockKind::Unknown, block.kind);
        assert_eq!(SpanKind::Unknown, block.spans[0].kind);
        assert_eq!("", block.text);
        Ok(())
    }

    #[test]
    fn test_as_text() -> serde_json::Result<()> {
        let blocks: RichText = serde_json::from_str(
            r#"[
                {"type": "heading2", "text": "Title", "spans": []},
                {"type": "paragraph", "text": "First paragraph.", "spans": []},
                {"type": "list-item", "text": "item", "spans": []}
            ]"#,
        )?;
        assert_eq!("Title First paragraph. item", as_text(&blocks));
        assert_eq!("", as_text(&[]));
        Ok(())
    }
}
