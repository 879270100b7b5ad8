use thiserror::Error;

/// Marker replaced by the rendered entries.
pub const CONTENT_PLACEHOLDER: &str = "{content}";

/// Minimal HTML5 page used when no template is configured.
pub const DEFAULT_TEMPLATE: &str = r#"<!doctype html>
<html>
    <head>
        <title>Fancy-RSS</title>
        <meta charset="UTF-8">
    </head>
    <body>
        {content}
    </body>
</html>
"#;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template has no {{content}} placeholder")]
    MissingPlaceholder,
    #[error("template has {0} {{content}} placeholders, expected exactly one")]
    DuplicatePlaceholder(usize),
}

/// The outer page that rendered fragments are inserted into.
///
/// Validated on construction to contain exactly one `{content}` marker.
/// Everything else in the template, braces included, is copied verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    source: String,
}

impl PageTemplate {
    pub fn new(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        match source.matches(CONTENT_PLACEHOLDER).count() {
            0 => Err(TemplateError::MissingPlaceholder),
            1 => Ok(Self { source }),
            n => Err(TemplateError::DuplicatePlaceholder(n)),
        }
    }

    pub fn render(&self, content: &str) -> String {
        self.source.replacen(CONTENT_PLACEHOLDER, content, 1)
    }
}

impl Default for PageTemplate {
    fn default() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
        }
    }
}
