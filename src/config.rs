//! Configuration file parser for ~/.config/md-tools/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos. Environment variables are applied on top of
//! the file by [`Config::apply_env`].
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::render::{PageTemplate, RenderMode, TemplateError};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Set either template or template_file, not both")]
    ConflictingTemplate,

    #[error("Failed to read template file {}: {source}", path.display())]
    TemplateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid page template: {0}")]
    Template(#[from] TemplateError),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Incomplete [{section}] configuration: missing {missing}")]
    Incomplete {
        section: &'static str,
        missing: &'static str,
    },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TCP port the server listens on.
    pub port: u16,

    /// Upper bound on each feed fetch, in seconds.
    pub fetch_timeout_secs: u64,

    /// Feed URLs, in display order for ties.
    pub feeds: Vec<String>,

    /// Embed summaries directly instead of in a sandboxed frame.
    #[serde(rename = "unsafe")]
    pub unsafe_html: bool,

    /// Literal outer page template containing `{content}`.
    pub template: Option<String>,

    /// Path to a file holding the outer page template.
    pub template_file: Option<PathBuf>,

    /// Markdown RSS feed; the `/rss.xml` route exists only when set.
    pub rss: Option<RssConfig>,

    /// Sitemap; the `/sitemap.txt` route exists only when set.
    pub sitemap: Option<SitemapConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RssConfig {
    pub directory: PathBuf,
    pub title: String,
    /// Base URL post paths are joined onto; also the channel link.
    pub link: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SitemapConfig {
    pub index_file: PathBuf,
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8003,
            fetch_timeout_secs: 30,
            feeds: Vec::new(),
            unsafe_html: false,
            template: None,
            template_file: None,
            rss: None,
            sitemap: None,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "port",
        "fetch_timeout_secs",
        "feeds",
        "unsafe",
        "template",
        "template_file",
        "rss",
        "sitemap",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.iter().any(|known| known == key) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), feeds = config.feeds.len(), "Loaded configuration");
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides using `lookup` in place of the process environment.
    ///
    /// | Variable | Effect |
    /// |----------|--------|
    /// | `FEEDS` | comma-separated feed URLs, replacing `feeds` |
    /// | `FEEDS_UNSAFE` | `1`/`true`/`yes` or `0`/`false`/`no` |
    /// | `FEEDS_TEMPLATE` / `FEEDS_TEMPLATE_FILE` | outer page template |
    /// | `WSGI_PORT` | listen port |
    /// | `RSS_DIRECTORY`, `RSS_TITLE`, `RSS_LINK`, `RSS_DESCRIPTION` | `[rss]` fields |
    /// | `MAP_INDEXFILE`, `MAP_BASEURL` | `[sitemap]` fields |
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(feeds) = lookup("FEEDS") {
            self.feeds = feeds
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_owned)
                .collect();
        }

        if let Some(value) = lookup("FEEDS_UNSAFE") {
            self.unsafe_html = parse_flag("FEEDS_UNSAFE", &value)?;
        }

        // Either template variable replaces both template keys from the file
        let env_template = lookup("FEEDS_TEMPLATE");
        let env_template_file = lookup("FEEDS_TEMPLATE_FILE");
        if env_template.is_some() || env_template_file.is_some() {
            self.template = env_template;
            self.template_file = env_template_file.map(PathBuf::from);
        }

        if let Some(port) = lookup("WSGI_PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "WSGI_PORT",
                value: port,
            })?;
        }

        let rss_vars = [
            lookup("RSS_DIRECTORY"),
            lookup("RSS_TITLE"),
            lookup("RSS_LINK"),
            lookup("RSS_DESCRIPTION"),
        ];
        if rss_vars.iter().any(Option::is_some) {
            let [directory, title, link, description] = rss_vars;
            let mut rss = self.rss.take().unwrap_or_default();
            if let Some(directory) = directory {
                rss.directory = PathBuf::from(directory);
            }
            if let Some(title) = title {
                rss.title = title;
            }
            if let Some(link) = link {
                rss.link = link;
            }
            if let Some(description) = description {
                rss.description = description;
            }
            self.rss = Some(rss);
        }

        let map_vars = [lookup("MAP_INDEXFILE"), lookup("MAP_BASEURL")];
        if map_vars.iter().any(Option::is_some) {
            let [index_file, base_url] = map_vars;
            let mut sitemap = self.sitemap.take().unwrap_or_default();
            if let Some(index_file) = index_file {
                sitemap.index_file = PathBuf::from(index_file);
            }
            if let Some(base_url) = base_url {
                sitemap.base_url = base_url;
            }
            self.sitemap = Some(sitemap);
        }

        self.validate()
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.template.is_some() && self.template_file.is_some() {
            return Err(ConfigError::ConflictingTemplate);
        }

        if let Some(rss) = &self.rss {
            if rss.directory.as_os_str().is_empty() {
                return Err(incomplete("rss", "directory"));
            }
            if rss.title.is_empty() {
                return Err(incomplete("rss", "title"));
            }
            if rss.link.is_empty() {
                return Err(incomplete("rss", "link"));
            }
        }

        if let Some(sitemap) = &self.sitemap {
            if sitemap.index_file.as_os_str().is_empty() {
                return Err(incomplete("sitemap", "index_file"));
            }
            if sitemap.base_url.is_empty() {
                return Err(incomplete("sitemap", "base_url"));
            }
        }

        Ok(())
    }

    /// Resolves the outer page template: literal, from file, or the default.
    pub fn page_template(&self) -> Result<PageTemplate, ConfigError> {
        match (&self.template, &self.template_file) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingTemplate),
            (Some(template), None) => Ok(PageTemplate::new(template.as_str())?),
            (None, Some(path)) => {
                let source =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::TemplateFile {
                        path: path.clone(),
                        source,
                    })?;
                Ok(PageTemplate::new(source)?)
            }
            (None, None) => Ok(PageTemplate::default()),
        }
    }

    pub fn render_mode(&self) -> RenderMode {
        RenderMode::from_unsafe_flag(self.unsafe_html)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

fn incomplete(section: &'static str, missing: &'static str) -> ConfigError {
    ConfigError::Incomplete { section, missing }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_owned(),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
