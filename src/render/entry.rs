use std::fmt::Write;

use super::escape::{escape_attr, escape_body};
use super::template::PageTemplate;
use super::text::visible_text;
use crate::feed::AggregatedItem;

/// How untrusted entry summaries are embedded in the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Summary goes into a sandboxed `<iframe srcdoc>` that cannot run
    /// scripts, reach the parent origin, or navigate the top window. A
    /// plain-text copy is the iframe's fallback content.
    #[default]
    Safe,
    /// Summary is attribute-escaped and placed straight into the page body.
    /// No containment: the operator who enables this owns the consequences.
    Unsafe,
}

impl RenderMode {
    pub fn from_unsafe_flag(unsafe_html: bool) -> Self {
        if unsafe_html {
            Self::Unsafe
        } else {
            Self::Safe
        }
    }
}

/// Sandbox flags for the safe-mode frame: forms and popups only.
pub const SANDBOX_FLAGS: &str = "allow-forms allow-popups";

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Renders one aggregated entry as an HTML fragment.
pub fn render_entry(item: &AggregatedItem, mode: RenderMode) -> String {
    let entry = &item.entry;
    let date = entry
        .effective_date()
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default();

    let mut out = String::with_capacity(256 + entry.summary_html.len() * 2);
    // Writing to a String cannot fail
    let _ = write!(
        out,
        "<h2><a href=\"{}\">{}</a></h2>\n\
         <p><time>{}</time> <i>//</i> <b>{}</b></p>\n",
        escape_attr(&entry.link),
        escape_body(&entry.title),
        date,
        escape_body(&item.feed_title),
    );

    match mode {
        RenderMode::Safe => {
            let _ = write!(
                out,
                "<iframe srcdoc=\"{}\" sandbox=\"{}\">\n<p>{}</p>\n</iframe>\n",
                escape_attr(&entry.summary_html),
                SANDBOX_FLAGS,
                escape_body(&visible_text(&entry.summary_html)),
            );
        }
        RenderMode::Unsafe => {
            let _ = writeln!(out, "<p>{}</p>", escape_attr(&entry.summary_html));
        }
    }

    out
}

/// Renders every item in order and inserts the result into `template`.
pub fn render_page(items: &[AggregatedItem], mode: RenderMode, template: &PageTemplate) -> String {
    let content: String = items.iter().map(|item| render_entry(item, mode)).collect();
    template.render(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Entry;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn item(summary: &str) -> AggregatedItem {
        AggregatedItem {
            entry: Entry {
                title: "A <b>bold</b> & title".into(),
                link: "https://example.com/post?a=1&b=\"2\"".into(),
                summary_html: summary.into(),
                published_at: Some(Utc.with_ymd_and_hms(2021, 3, 1, 9, 5, 59).unwrap()),
                updated_at: None,
            },
            feed_title: "<Feed>".into(),
        }
    }

    #[test]
    fn test_safe_fragment() {
        let html = render_entry(&item("<p>Hi & 'bye'</p>"), RenderMode::Safe);
        assert_eq!(
            html,
            "<h2><a href=\"https://example.com/post?a=1&amp;b=&quot;2&quot;\">A &lt;b&gt;bold&lt;/b&gt; & title</a></h2>\n\
             <p><time>2021-03-01T09:05</time> <i>//</i> <b>&lt;Feed&gt;</b></p>\n\
             <iframe srcdoc=\"&lt;p&gt;Hi &amp; &#39;bye&#39;&lt;/p&gt;\" sandbox=\"allow-forms allow-popups\">\n\
             <p>Hi & 'bye'</p>\n\
             </iframe>\n"
        );
    }

    #[test]
    fn test_unsafe_fragment() {
        let html = render_entry(&item("<i>x</i>"), RenderMode::Unsafe);
        assert_eq!(
            html,
            "<h2><a href=\"https://example.com/post?a=1&amp;b=&quot;2&quot;\">A &lt;b&gt;bold&lt;/b&gt; & title</a></h2>\n\
             <p><time>2021-03-01T09:05</time> <i>//</i> <b>&lt;Feed&gt;</b></p>\n\
             <p>&lt;i&gt;x&lt;/i&gt;</p>\n"
        );
    }

    #[test]
    fn test_script_summary_is_contained() {
        let summary = "<script>alert(1)</script>";

        let unsafe_html = render_entry(&item(summary), RenderMode::Unsafe);
        assert!(!unsafe_html.contains("<script>"));
        assert!(unsafe_html.contains("<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"));

        let safe_html = render_entry(&item(summary), RenderMode::Safe);
        assert!(!safe_html.contains("<script>"));
        assert!(safe_html.contains("sandbox=\"allow-forms allow-popups\""));
        assert!(!safe_html.contains("allow-scripts"));
        assert!(!safe_html.contains("allow-same-origin"));
        assert!(!safe_html.contains("allow-top-navigation"));
        // script text is not visible text
        assert!(safe_html.contains("<p></p>\n</iframe>"));
    }

    #[test]
    fn test_safe_fallback_has_no_tags_even_from_entities() {
        let html = render_entry(&item("&lt;img src=x onerror=alert(1)&gt;"), RenderMode::Safe);
        let fallback = html
            .split_once("\">\n<p>")
            .and_then(|(_, rest)| rest.split_once("</p>\n</iframe>"))
            .map(|(text, _)| text)
            .unwrap();
        assert!(!fallback.contains('<'));
        assert!(!fallback.contains('>'));
    }

    #[test]
    fn test_undated_entry_renders_empty_time() {
        let mut undated = item("x");
        undated.entry.published_at = None;
        let html = render_entry(&undated, RenderMode::Unsafe);
        assert!(html.contains("<time></time>"));
    }

    #[test]
    fn test_render_page_concatenates_in_order() {
        let mut first = item("one");
        first.entry.title = "First".into();
        let mut second = item("two");
        second.entry.title = "Second".into();

        let template = PageTemplate::new("<main>{content}</main>").unwrap();
        let page = render_page(&[first, second], RenderMode::Unsafe, &template);
        assert!(page.starts_with("<main><h2>"));
        assert!(page.ends_with("</p>\n</main>"));
        let first_at = page.find("First").unwrap();
        let second_at = page.find("Second").unwrap();
        assert!(first_at < second_at);
    }

    #[test]
    fn test_render_page_with_no_items() {
        let template = PageTemplate::new("<main>{content}</main>").unwrap();
        assert_eq!(render_page(&[], RenderMode::Safe, &template), "<main></main>");
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(RenderMode::from_unsafe_flag(true), RenderMode::Unsafe);
        assert_eq!(RenderMode::from_unsafe_flag(false), RenderMode::Safe);
        assert_eq!(RenderMode::default(), RenderMode::Safe);
    }
}
