use scraper::Html;

/// Elements whose text is never shown to a reader.
const HIDDEN_PARENTS: [&str; 5] = ["style", "script", "head", "title", "meta"];

/// Extracts the human-visible text of an HTML snippet.
///
/// The snippet is wrapped in a `<p>` and parsed as a fragment. Text nodes
/// directly inside `style`, `script`, `head`, `title` or `meta` are dropped,
/// and comments are not text nodes so they never appear. Each remaining
/// piece is trimmed and the non-empty pieces are joined with single spaces.
///
/// Entities are decoded, so the result is plain text and must still be
/// escaped before it goes back into markup.
pub fn visible_text(html: &str) -> String {
    let fragment = Html::parse_fragment(&format!("<p>{html}</p>"));

    let pieces: Vec<&str> = fragment
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element().map(|el| el.name()))
                .is_some_and(|name| HIDDEN_PARENTS.iter().any(|hidden| *hidden == name));
            if hidden {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        })
        .collect();

    pieces.join(" ")
}
