use pulldown_cmark::{html, Options, Parser};
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Renders CommonMark (plus tables and strikethrough) to HTML.
pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Returns the `href` of every `<a>` in `html`, in document order.
pub fn extract_links(html: &str) -> Vec<String> {
    static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

    Html::parse_document(html)
        .select(&ANCHORS)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_owned)
        .collect()
}
