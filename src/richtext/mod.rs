//! Structured rich text
//!
//! The repository stores long-form fields as a list of blocks, each with
//! its text and a list of styled spans addressed by UTF-16 offsets.
//! [`as_text`] flattens them for word counts, [`as_html`] renders markup.

mod html;

use serde::{Deserialize, Serialize};

pub use html::{as_html, LinkResolver};

/// A rich-text field
pub type RichText = Vec<RichTextBlock>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<Span>,

    /// Image source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Image alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    /// Embed payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<serde_json::Value>,
}

impl RichTextBlock {
    pub fn new(kind: BlockKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: None,
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Self::new(BlockKind::Paragraph, text)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "preformatted")]
    Preformatted,
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

/// Styling over `[start, end)` of a block's text, in UTF-16 code units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Span {
    pub fn new(kind: SpanKind, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            kind,
            data: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

/// Plain text of a rich-text field, blocks joined by a single space
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_blocks() {
        let json = r#"[
            {"type": "paragraph", "text": "Hello world", "spans": [{"start": 0, "end": 5, "type": "strong"}]},
            {"type": "image", "url": "https://images.example/a.png", "alt": "A", "dimensions": {"width": 10, "height": 10}},
            {"type": "something-new", "text": "?"}
        ]"#;
        let blocks: RichText = serde_json::from_str(json).unwrap();
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
        assert_eq!(blocks[0].spans[0].kind, SpanKind::Strong);
        assert_eq!(blocks[1].kind, BlockKind::Image);
        assert_eq!(blocks[1].text, "");
        assert_eq!(blocks[2].kind, BlockKind::Unknown);
    }

    #[test]
    fn test_as_text() {
        let blocks = vec![
            RichTextBlock::paragraph("Lorem ipsum"),
            RichTextBlock::new(BlockKind::ListItem, "dolor"),
        ];
        assert_eq!(as_text(&blocks), "Lorem ipsum dolor");
        assert_eq!(as_text(&[]), "");
    }
}
