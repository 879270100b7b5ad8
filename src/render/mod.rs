//! HTML rendering of aggregated feed entries.
//!
//! Every value interpolated into markup goes through the escaping function
//! for its context: [`escape_body`] for element text, [`escape_attr`] for
//! attribute values. Untrusted summaries are either confined to a sandboxed
//! frame ([`RenderMode::Safe`]) or escaped into the page ([`RenderMode::Unsafe`]).

mod entry;
mod escape;
mod template;
mod text;

pub use entry::{render_entry, render_page, RenderMode, SANDBOX_FLAGS};
pub use escape::{escape_attr, escape_body};
pub use template::{PageTemplate, TemplateError, CONTENT_PLACEHOLDER, DEFAULT_TEMPLATE};
pub use text::visible_text;
