use std::borrow::Cow;

/// Escapes text for an HTML body context.
///
/// Only `<` and `>` are replaced. `&` is deliberately left alone: this is the
/// narrow policy titles have always been rendered with, and widening it
/// would change existing output.
///
/// Returns `Cow::Borrowed` when there is nothing to escape (common case).
pub fn escape_body(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escapes text for a double- or single-quoted HTML attribute value.
///
/// Replaces `&`, `<`, `>`, `"` and `'`. The same output is safe to place in
/// a body context, where it renders as literal text.
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
