//! Rich text to HTML

use super::{BlockKind, RichTextBlock, Span, SpanKind};
use crate::helpers::{html_escape, image_tag, link_to, text_to_html};

/// Maps links to repository documents onto site routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResolver {
    document_type: String,
    base: String,
}

impl LinkResolver {
    /// Documents of `document_type` link to `{base}{uid}`, anything else to `/`
    pub fn new(document_type: &str, base: &str) -> Self {
        Self {
            document_type: document_type.to_string(),
            base: base.to_string(),
        }
    }

    /// Target of a hyperlink span
    fn resolve(&self, data: &serde_json::Value) -> String {
        let get = |name: &str| data.get(name).and_then(|v| v.as_str());
        match get("link_type") {
            Some("Document") => match (get("type"), get("uid")) {
                (Some(doc_type), Some(uid)) if doc_type == self.document_type => {
                    format!("{}{}", self.base, uid)
                }
                _ => "/".to_string(),
            },
            _ => get("url").unwrap_or("").to_string(),
        }
    }
}

/// Render a rich-text field as HTML
///
/// Consecutive list items are grouped into a single `<ul>` / `<ol>`.
pub fn as_html(blocks: &[RichTextBlock], links: &LinkResolver) -> String {
    let mut out = String::new();
    let mut open_list: Option<BlockKind> = None;

    for block in blocks {
        let is_list = matches!(block.kind, BlockKind::ListItem | BlockKind::OrderedListItem);
        if open_list.is_some() && open_list != Some(block.kind) {
            close_list(&mut out, open_list.take());
        }
        if is_list && open_list.is_none() {
            out.push_str(if block.kind == BlockKind::ListItem {
                "<ul>"
            } else {
                "<ol>"
            });
            open_list = Some(block.kind);
        }

        let inner = || serialize_spans(&block.text, &block.spans, links);
        match block.kind {
            BlockKind::Paragraph => out.push_str(&format!("<p>{}</p>", inner())),
            BlockKind::Preformatted => out.push_str(&format!("<pre>{}</pre>", inner())),
            BlockKind::Heading1 => out.push_str(&format!("<h1>{}</h1>", inner())),
            BlockKind::Heading2 => out.push_str(&format!("<h2>{}</h2>", inner())),
            BlockKind::Heading3 => out.push_str(&format!("<h3>{}</h3>", inner())),
            BlockKind::Heading4 => out.push_str(&format!("<h4>{}</h4>", inner())),
            BlockKind::Heading5 => out.push_str(&format!("<h5>{}</h5>", inner())),
            BlockKind::Heading6 => out.push_str(&format!("<h6>{}</h6>", inner())),
            BlockKind::ListItem | BlockKind::OrderedListItem => {
                out.push_str(&format!("<li>{}</li>", inner()))
            }
            BlockKind::Image => {
                if let Some(url) = &block.url {
                    out.push_str(&format!(
                        r#"<p class="block-img">{}</p>"#,
                        image_tag(url, block.alt.as_deref())
                    ));
                }
            }
            BlockKind::Embed => {
                if let Some(oembed) = &block.oembed {
                    out.push_str(&render_embed(oembed));
                }
            }
            BlockKind::Unknown => {
                tracing::debug!("Skipping unsupported rich-text block");
            }
        }
    }

    close_list(&mut out, open_list);
    out
}

fn close_list(out: &mut String, kind: Option<BlockKind>) {
    match kind {
        Some(BlockKind::ListItem) => out.push_str("</ul>"),
        Some(BlockKind::OrderedListItem) => out.push_str("</ol>"),
        _ => {}
    }
}

fn render_embed(oembed: &serde_json::Value) -> String {
    let field = |name: &str| oembed.get(name).and_then(|v| v.as_str()).unwrap_or("");
    format!(
        r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
        html_escape(field("embed_url")),
        html_escape(field("type")),
        html_escape(&field("provider_name").to_lowercase()),
        field("html")
    )
}

fn open_tag(span: &Span, links: &LinkResolver) -> String {
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Label => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.get("label"))
                .and_then(|v| v.as_str())
                .unwrap_or("");
            format!(r#"<span class="{}">"#, html_escape(label))
        }
        SpanKind::Hyperlink => {
            let href = span
                .data
                .as_ref()
                .map(|data| links.resolve(data))
                .unwrap_or_default();
            let blank = span
                .data
                .as_ref()
                .and_then(|d| d.get("target"))
                .and_then(|v| v.as_str())
                == Some("_blank");
            // strip the closing tag, the body is emitted segment by segment
            let anchor = link_to(&href, "", blank);
            anchor.trim_end_matches("</a>").to_string()
        }
        SpanKind::Unknown => String::new(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Label => "</span>",
        SpanKind::Hyperlink => "</a>",
        SpanKind::Unknown => "",
    }
}

/// Render text with its spans, splitting overlapping spans so tags nest
fn serialize_spans(text: &str, spans: &[Span], links: &LinkResolver) -> String {
    // utf16 offset -> byte offset at every char boundary
    let mut boundaries: Vec<(usize, usize)> = Vec::with_capacity(text.len() + 1);
    let mut unit = 0;
    for (byte, ch) in text.char_indices() {
        boundaries.push((unit, byte));
        unit += ch.len_utf16();
    }
    boundaries.push((unit, text.len()));
    let text_len = unit;
    let byte_at = |pos: usize| -> usize {
        boundaries
            .iter()
            .find(|(u, _)| *u >= pos)
            .map(|(_, b)| *b)
            .unwrap_or(text.len())
    };

    let spans: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.start < text_len && s.kind != SpanKind::Unknown)
        .collect();
    if spans.is_empty() {
        return text_to_html(text);
    }

    let mut points: Vec<usize> = vec![0, text_len];
    for span in &spans {
        points.push(span.start);
        points.push(span.end.min(text_len));
    }
    points.sort_unstable();
    points.dedup();

    let mut out = String::new();
    let mut stack: Vec<&Span> = Vec::new();

    for (i, &point) in points.iter().enumerate() {
        // close everything from the outermost span that ends here, reopen survivors
        if let Some(depth) = stack.iter().position(|s| s.end.min(text_len) <= point) {
            let closing: Vec<&Span> = stack.drain(depth..).collect();
            for span in closing.iter().rev() {
                out.push_str(close_tag(span));
            }
            for span in closing {
                if span.end.min(text_len) > point {
                    out.push_str(&open_tag(span, links));
                    stack.push(span);
                }
            }
        }

        let mut starting: Vec<&Span> = spans.iter().copied().filter(|s| s.start == point).collect();
        starting.sort_by(|a, b| b.end.cmp(&a.end));
        for span in starting {
            out.push_str(&open_tag(span, links));
            stack.push(span);
        }

        if let Some(&next) = points.get(i + 1) {
            out.push_str(&text_to_html(&text[byte_at(point)..byte_at(next)]));
        }
    }

    for span in stack.iter().rev() {
        out.push_str(close_tag(span));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::{BlockKind, RichTextBlock, Span, SpanKind};

    fn links() -> LinkResolver {
        LinkResolver::new("posts", "/post/")
    }

    #[test]
    fn test_paragraph_and_heading() {
        let blocks = vec![
            RichTextBlock::new(BlockKind::Heading3, "Title"),
            RichTextBlock::paragraph("a < b"),
        ];
        assert_eq!(as_html(&blocks, &links()), "<h3>Title</h3><p>a &lt; b</p>");
    }

    #[test]
    fn test_strong_and_em_spans() {
        let block = RichTextBlock::paragraph("Hello brave world")
            .with_span(Span::new(SpanKind::Strong, 0, 5))
            .with_span(Span::new(SpanKind::Em, 6, 11));
        assert_eq!(
            as_html(&[block], &links()),
            "<p><strong>Hello</strong> <em>brave</em> world</p>"
        );
    }

    #[test]
    fn test_overlapping_spans_are_split() {
        let block = RichTextBlock::paragraph("abcdef")
            .with_span(Span::new(SpanKind::Strong, 0, 4))
            .with_span(Span::new(SpanKind::Em, 2, 6));
        assert_eq!(
            as_html(&[block], &links()),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_nested_spans() {
        let block = RichTextBlock::paragraph("abcdef")
            .with_span(Span::new(SpanKind::Em, 2, 4))
            .with_span(Span::new(SpanKind::Strong, 0, 6));
        assert_eq!(
            as_html(&[block], &links()),
            "<p><strong>ab<em>cd</em>ef</strong></p>"
        );
    }

    #[test]
    fn test_hyperlink_span() {
        let mut span = Span::new(SpanKind::Hyperlink, 4, 8);
        span.data = Some(serde_json::json!({
            "link_type": "Web",
            "url": "https://rust-lang.org",
            "target": "_blank"
        }));
        let block = RichTextBlock::paragraph("See Rust now").with_span(span);
        assert_eq!(
            as_html(&[block], &links()),
            r#"<p>See <a target="_blank" rel="noopener noreferrer" href="https://rust-lang.org">Rust</a> now</p>"#
        );
    }

    #[test]
    fn test_document_link_resolves_to_post_route() {
        let data = serde_json::json!({"link_type": "Document", "type": "posts", "uid": "hooks"});
        assert_eq!(links().resolve(&data), "/post/hooks");
    }

    #[test]
    fn test_document_link_follows_configured_type_and_base() {
        let links = LinkResolver::new("articles", "/blog/");
        let article = serde_json::json!({"link_type": "Document", "type": "articles", "uid": "hooks"});
        assert_eq!(links.resolve(&article), "/blog/hooks");
        let post = serde_json::json!({"link_type": "Document", "type": "posts", "uid": "hooks"});
        assert_eq!(links.resolve(&post), "/");
    }

    #[test]
    fn test_spans_use_utf16_offsets() {
        // "é" is one UTF-16 unit, "🚀" is two
        let block = RichTextBlock::paragraph("é🚀ok")
            .with_span(Span::new(SpanKind::Strong, 3, 5));
        assert_eq!(as_html(&[block], &links()), "<p>é🚀<strong>ok</strong></p>");
    }

    #[test]
    fn test_list_grouping() {
        let blocks = vec![
            RichTextBlock::new(BlockKind::ListItem, "one"),
            RichTextBlock::new(BlockKind::ListItem, "two"),
            RichTextBlock::new(BlockKind::OrderedListItem, "first"),
            RichTextBlock::paragraph("end"),
        ];
        assert_eq!(
            as_html(&blocks, &links()),
            "<ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><p>end</p>"
        );
    }

    #[test]
    fn test_image_and_line_breaks() {
        let mut image = RichTextBlock::new(BlockKind::Image, "");
        image.url = Some("https://images.example/a.png".to_string());
        image.alt = Some("Rocket".to_string());
        let blocks = vec![RichTextBlock::new(BlockKind::Preformatted, "a\nb"), image];
        assert_eq!(
            as_html(&blocks, &links()),
            r#"<pre>a<br />b</pre><p class="block-img"><img src="https://images.example/a.png" alt="Rocket" /></p>"#
        );
    }
}
