//! Site configuration module.
//!
//! Handles loading, validating, and merging `cms.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top, so a
//! site only needs to spell out what it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! site_title = "Site"
//! base_url = ""                     # Prefix for canonical/alternate URLs
//! default_language = "en"
//! language_available = ["en"]
//! pagination_limit = 10
//! static_page_slug = "pages"        # Content type that serves /{lang}/{page}
//! front_page_slug = "home"          # Slug of the front page
//! fallback_content_type = "posts"   # Tried when a static page is not found
//! # preview_token = "secret"        # Bearer token for ?preview=true
//!
//! [cache]
//! ttl_secs = 86400
//! path = ".cms-cache.json"
//!
//! [content_models.posts]
//! slug = "blog"                     # URL segment (defaults to the key)
//! model = "post"                    # Record collection under content/
//! type = "content"                  # "content" or "taxonomy"
//! has_archive = true
//! has_single = true
//! relations = ["categories", "tags"]
//! ```
//!
//! ## Content Types
//!
//! Every `[content_models.<key>]` block registers a content type. Blocks are
//! resolved once at load time into [`ContentTypeConfig`]: the URL slug falls
//! back to the key, the model falls back to the key, and a taxonomy's
//! `display_content_from` is checked against its declared `relations`.
//!
//! Unknown keys are rejected to catch typos early. Two content types sharing
//! a URL slug is a validation error rather than a silent overwrite.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the configuration file inside the site root.
pub const CONFIG_FILENAME: &str = "cms.toml";

/// Relation a taxonomy lists when `display_content_from` is unset or unknown.
pub const DEFAULT_DISPLAY_RELATION: &str = "posts";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `cms.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CmsConfig {
    /// Site name shown by the built-in templates and in SEO titles.
    pub site_title: String,
    /// Absolute URL prefix for canonical and alternate links. Empty = relative.
    pub base_url: String,
    /// Locale every translatable field falls back to.
    pub default_language: String,
    /// Locales accepted as the `{lang}` URL segment.
    pub language_available: Vec<String>,
    /// Archive page size for content types without `per_page`.
    pub pagination_limit: u32,
    /// Content-type key whose records are served as static pages.
    pub static_page_slug: String,
    /// Slug (in the default language) of the page rendered at `/{lang}/`.
    pub front_page_slug: String,
    /// Content type tried when `/{lang}/{slug}` matches no static page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_content_type: Option<String>,
    /// Bearer token that authenticates preview requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_token: Option<String>,
    /// Slug/config map caching.
    pub cache: CacheConfig,
    /// Registered content types, keyed by canonical key.
    pub content_models: BTreeMap<String, ContentModelConfig>,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            site_title: "Site".to_string(),
            base_url: String::new(),
            default_language: "en".to_string(),
            language_available: vec!["en".to_string()],
            pagination_limit: 10,
            static_page_slug: "pages".to_string(),
            front_page_slug: "home".to_string(),
            fallback_content_type: Some("posts".to_string()),
            preview_token: None,
            cache: CacheConfig::default(),
            content_models: default_content_models(),
        }
    }
}

/// Cache settings for the slug and content-type maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Time-to-live of each cached map, in seconds.
    pub ttl_secs: u64,
    /// File cache location, relative to the site root.
    pub path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            path: ".cms-cache.json".to_string(),
        }
    }
}

/// Whether a content type stands alone or groups other content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Content,
    Taxonomy,
}

/// One `[content_models.<key>]` block as written in `cms.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentModelConfig {
    /// URL segment override. Defaults to the block key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Record collection (directory under `content/`). Defaults to the block key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: ContentKind,
    #[serde(default)]
    pub has_archive: bool,
    #[serde(default = "default_true")]
    pub has_single: bool,
    /// Relation listed on a taxonomy term page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_content_from: Option<String>,
    /// Explicit archive template name, tried before the generated candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// Declared relationship names; each names another content-type key.
    #[serde(default)]
    pub relations: Vec<String>,
    /// Fields stored as locale-keyed maps.
    #[serde(default = "default_translatable")]
    pub translatable: Vec<String>,
    /// Whether records are tombstoned instead of removed.
    #[serde(default = "default_true")]
    pub soft_deletes: bool,
}

fn default_true() -> bool {
    true
}

fn default_translatable() -> Vec<String> {
    ["title", "slug", "content", "excerpt", "section"]
        .iter()
        .map(|f| f.to_string())
        .collect()
}

impl ContentModelConfig {
    fn new(model: &str, kind: ContentKind) -> Self {
        Self {
            slug: None,
            model: Some(model.to_string()),
            kind,
            has_archive: false,
            has_single: true,
            display_content_from: None,
            archive_view: None,
            per_page: None,
            relations: Vec::new(),
            translatable: default_translatable(),
            soft_deletes: true,
        }
    }
}

fn default_content_models() -> BTreeMap<String, ContentModelConfig> {
    let mut models = BTreeMap::new();
    models.insert(
        "pages".to_string(),
        ContentModelConfig::new("page", ContentKind::Content),
    );
    models.insert(
        "posts".to_string(),
        ContentModelConfig {
            has_archive: true,
            relations: vec!["categories".to_string(), "tags".to_string()],
            ..ContentModelConfig::new("post", ContentKind::Content)
        },
    );
    for (key, model) in [("categories", "category"), ("tags", "tag")] {
        models.insert(
            key.to_string(),
            ContentModelConfig {
                display_content_from: Some("posts".to_string()),
                relations: vec!["posts".to_string()],
                ..ContentModelConfig::new(model, ContentKind::Taxonomy)
            },
        );
    }
    models
}

/// A registered content type, fully resolved.
///
/// This is what the slug index caches and what controllers consult.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeConfig {
    pub key: String,
    pub slug: String,
    pub model: String,
    pub kind: ContentKind,
    pub has_archive: bool,
    pub has_single: bool,
    /// Relation a taxonomy term page lists, already checked against `relations`.
    pub display_content_from: Option<String>,
    pub archive_view: Option<String>,
    pub per_page: Option<u32>,
    pub relations: BTreeSet<String>,
    pub translatable: BTreeSet<String>,
    pub soft_deletes: bool,
}

impl ContentTypeConfig {
    pub fn is_taxonomy(&self) -> bool {
        self.kind == ContentKind::Taxonomy
    }

    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.contains(name)
    }

    /// Page size for this type's archive.
    pub fn page_size(&self, pagination_limit: u32) -> u32 {
        self.per_page.unwrap_or(pagination_limit)
    }
}

impl CmsConfig {
    /// Validate config values and cross-references between content types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.language_available.is_empty() {
            return Err(ConfigError::Validation(
                "language_available must not be empty".into(),
            ));
        }
        if !self.language_available.contains(&self.default_language) {
            return Err(ConfigError::Validation(format!(
                "default_language '{}' is not listed in language_available",
                self.default_language
            )));
        }
        if self.pagination_limit == 0 {
            return Err(ConfigError::Validation(
                "pagination_limit must be greater than 0".into(),
            ));
        }
        if !self.content_models.contains_key(&self.static_page_slug) {
            return Err(ConfigError::Validation(format!(
                "static_page_slug '{}' is not a registered content model",
                self.static_page_slug
            )));
        }
        if let Some(fallback) = &self.fallback_content_type
            && !self.content_models.contains_key(fallback)
        {
            return Err(ConfigError::Validation(format!(
                "fallback_content_type '{fallback}' is not a registered content model"
            )));
        }

        let mut slugs: BTreeMap<&str, &str> = BTreeMap::new();
        for (key, model) in &self.content_models {
            if model.per_page == Some(0) {
                return Err(ConfigError::Validation(format!(
                    "content_models.{key}.per_page must be greater than 0"
                )));
            }
            if model.model.as_deref() == Some("") {
                return Err(ConfigError::Validation(format!(
                    "content_models.{key}.model must not be empty"
                )));
            }
            for relation in &model.relations {
                if !self.content_models.contains_key(relation) {
                    return Err(ConfigError::Validation(format!(
                        "content_models.{key}.relations names unknown content model '{relation}'"
                    )));
                }
            }
            let slug = model.slug.as_deref().unwrap_or(key);
            if let Some(other) = slugs.insert(slug, key) {
                return Err(ConfigError::Validation(format!(
                    "content models '{other}' and '{key}' share the slug '{slug}'"
                )));
            }
        }
        Ok(())
    }

    /// Resolve every `[content_models]` block into a [`ContentTypeConfig`].
    ///
    /// A taxonomy whose `display_content_from` is not among its declared
    /// relations falls back to [`DEFAULT_DISPLAY_RELATION`] with a warning.
    pub fn content_types(&self) -> Vec<ContentTypeConfig> {
        self.content_models
            .iter()
            .map(|(key, model)| {
                let display_content_from = match model.kind {
                    ContentKind::Content => model.display_content_from.clone(),
                    ContentKind::Taxonomy => Some(resolve_display_relation(key, model)),
                };
                ContentTypeConfig {
                    key: key.clone(),
                    slug: model.slug.clone().unwrap_or_else(|| key.clone()),
                    model: model.model.clone().unwrap_or_else(|| key.clone()),
                    kind: model.kind,
                    has_archive: model.has_archive,
                    has_single: model.has_single,
                    display_content_from,
                    archive_view: model.archive_view.clone(),
                    per_page: model.per_page,
                    relations: model.relations.iter().cloned().collect(),
                    translatable: model.translatable.iter().cloned().collect(),
                    soft_deletes: model.soft_deletes,
                }
            })
            .collect()
    }

    /// Whether `lang` is one of the configured locales.
    pub fn is_available_language(&self, lang: &str) -> bool {
        self.language_available.iter().any(|l| l == lang)
    }
}

fn resolve_display_relation(key: &str, model: &ContentModelConfig) -> String {
    let requested = model
        .display_content_from
        .as_deref()
        .unwrap_or(DEFAULT_DISPLAY_RELATION);
    if model.relations.iter().any(|r| r == requested) {
        return requested.to_string();
    }
    tracing::warn!(
        content_type = key,
        relation = requested,
        fallback = DEFAULT_DISPLAY_RELATION,
        "display_content_from names an undeclared relation, falling back"
    );
    DEFAULT_DISPLAY_RELATION.to_string()
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(CmsConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `cms.toml` from the site root as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<CmsConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CmsConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the site configuration from `<root>/cms.toml` over stock defaults.
pub fn load_config(root: &Path) -> Result<CmsConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `cms.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# lingua-cms Configuration
# ========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Site name used by the built-in templates and in page titles.
site_title = "Site"

# Absolute prefix for canonical and hreflang links, e.g. "https://example.com".
# Leave empty to emit root-relative URLs.
base_url = ""

# Locale every translatable field falls back to when a translation is missing.
default_language = "en"

# Locales accepted as the first URL segment.
language_available = ["en"]

# Archive page size for content types that do not set per_page.
pagination_limit = 10

# Content type whose records are served at /{lang}/{page_slug}.
static_page_slug = "pages"

# Slug of the page rendered at /{lang}/. Requests for /{lang}/{front_page_slug}
# redirect there.
front_page_slug = "home"

# Content type tried when /{lang}/{slug} matches no static page.
fallback_content_type = "posts"

# Bearer token that lets a request use ?preview=true to see drafts.
# preview_token = "change-me"

# ---------------------------------------------------------------------------
# Cache for the slug and content-type maps
# ---------------------------------------------------------------------------
[cache]
ttl_secs = 86400
path = ".cms-cache.json"

# ---------------------------------------------------------------------------
# Content types
# ---------------------------------------------------------------------------
# slug          URL segment (defaults to the key)
# model         record directory under content/ (defaults to the key)
# type          "content" or "taxonomy"
# relations     declared relationship names, each another content type key
# translatable  fields stored per locale
[content_models.pages]
model = "page"
type = "content"
has_archive = false
has_single = true
relations = []
translatable = ["title", "slug", "content", "excerpt", "section"]
soft_deletes = true

[content_models.posts]
model = "post"
type = "content"
has_archive = true
has_single = true
relations = ["categories", "tags"]
translatable = ["title", "slug", "content", "excerpt", "section"]
soft_deletes = true

[content_models.categories]
model = "category"
type = "taxonomy"
has_archive = false
has_single = true
display_content_from = "posts"
relations = ["posts"]
translatable = ["title", "slug", "content", "excerpt", "section"]
soft_deletes = true

[content_models.tags]
model = "tag"
type = "taxonomy"
has_archive = false
has_single = true
display_content_from = "posts"
relations = ["posts"]
translatable = ["title", "slug", "content", "excerpt", "section"]
soft_deletes = true
"##
}
