//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape text content and turn line breaks into `<br />`
pub fn text_to_html(s: &str) -> String {
    html_escape(s).replace('\n', "<br />")
}

/// Generate an anchor tag, opening in a new tab when `blank` is set
pub fn link_to(href: &str, inner_html: &str, blank: bool) -> String {
    if blank {
        format!(
            r#"<a target="_blank" rel="noopener noreferrer" href="{}">{}</a>"#,
            html_escape(href),
            inner_html
        )
    } else {
        format!(r#"<a href="{}">{}</a>"#, html_escape(href), inner_html)
    }
}

/// Generate an image tag
pub fn image_tag(src: &str, alt: Option<&str>) -> String {
    format!(
        r#"<img src="{}" alt="{}" />"#,
        html_escape(src),
        html_escape(alt.unwrap_or(""))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_text_to_html() {
        assert_eq!(text_to_html("a < b\nc"), "a &lt; b<br />c");
    }

    #[test]
    fn test_link_to() {
        assert_eq!(link_to("/post/x", "X", false), r#"<a href="/post/x">X</a>"#);
        assert!(link_to("https://rust-lang.org", "Rust", true).contains(r#"target="_blank""#));
    }

    #[test]
    fn test_image_tag() {
        assert_eq!(
            image_tag("/a.png", Some("A \"quote\"")),
            r#"<img src="/a.png" alt="A &quot;quote&quot;" />"#
        );
    }
}
