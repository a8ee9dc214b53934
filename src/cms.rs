//! The assembled site: configuration, slug index, repository, and theme.
//!
//! [`Cms`] is built once per process and shared by every request. It owns
//! no per-request state; controllers borrow it to reach the locator,
//! the resolver, and the renderer.

use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::cache::{CacheStore, FileCache, MemoryCache, hash_config};
use crate::config::{self, CmsConfig, ConfigError, ContentTypeConfig};
use crate::locator::{ContentLocator, Visibility};
use crate::record::ContentRecord;
use crate::repository::ContentRepository;
use crate::router::{CmsRequest, Route};
use crate::slug_index::SlugIndex;
use crate::store::{ContentStore, StoreError};
use crate::templates::TemplateResolver;
use crate::theme::{RenderError, Theme};
use crate::view::ResolvedPage;

/// Request-level failure.
#[derive(Error, Debug)]
pub enum CmsError {
    /// The request names a content type or model that is not set up.
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("No template found among: {}", candidates.join(", "))]
    TemplateResolution { candidates: Vec<String> },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl CmsError {
    /// HTTP status for this failure.
    pub fn status(&self) -> u16 {
        match self {
            CmsError::Configuration(_) | CmsError::NotFound(_) => 404,
            _ => 500,
        }
    }
}

/// Failure assembling a [`Cms`] from a site directory.
#[derive(Error, Debug)]
pub enum OpenError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Theme error: {0}")]
    Theme(#[from] RenderError),
}

pub struct Cms {
    config: CmsConfig,
    index: SlugIndex,
    repo: Arc<dyn ContentRepository>,
    theme: Theme,
}

impl Cms {
    pub fn new(
        config: CmsConfig,
        repo: Arc<dyn ContentRepository>,
        cache: Arc<dyn CacheStore>,
        theme: Theme,
    ) -> Self {
        let ttl = Duration::seconds(i64::try_from(config.cache.ttl_secs).unwrap_or(i64::MAX));
        let index = SlugIndex::new(config.content_types(), cache, ttl);
        Self {
            config,
            index,
            repo,
            theme,
        }
    }

    /// Open a site directory with the shared on-disk cache.
    pub fn open(root: &Path) -> Result<Self, OpenError> {
        Self::open_with(root, |config| {
            let path = root.join(&config.cache.path);
            Arc::new(FileCache::open(path, &hash_config(config))) as Arc<dyn CacheStore>
        })
    }

    /// Open a site directory with a process-local cache.
    pub fn open_in_memory(root: &Path) -> Result<Self, OpenError> {
        Self::open_with(root, |_| Arc::new(MemoryCache::new()) as Arc<dyn CacheStore>)
    }

    fn open_with(
        root: &Path,
        cache: impl FnOnce(&CmsConfig) -> Arc<dyn CacheStore>,
    ) -> Result<Self, OpenError> {
        let config = config::load_config(root)?;
        let store = ContentStore::load(root, &config.content_types())?;
        let theme = Theme::load(root)?;
        let cache = cache(&config);
        tracing::info!(
            root = %root.display(),
            models = store.models().len(),
            theme_templates = theme.template_count(),
            "site opened"
        );
        Ok(Self::new(config, Arc::new(store), cache, theme))
    }

    pub fn config(&self) -> &CmsConfig {
        &self.config
    }

    pub fn index(&self) -> &SlugIndex {
        &self.index
    }

    pub fn repository(&self) -> &dyn ContentRepository {
        self.repo.as_ref()
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn locator(&self) -> ContentLocator<'_> {
        ContentLocator::new(self.repo.as_ref(), &self.config.default_language)
    }

    pub fn resolver(&self) -> TemplateResolver<'_> {
        TemplateResolver::new(&self.theme)
    }

    pub fn visibility(&self, request: &CmsRequest) -> Visibility {
        Visibility::for_request(request.wants_preview(), request.authenticated)
    }

    /// Configuration of a registered content-type key.
    pub fn content_type(&self, key: &str) -> Result<ContentTypeConfig, CmsError> {
        self.index.config_for(key).ok_or_else(|| {
            CmsError::Configuration(format!("content type '{key}' is not registered"))
        })
    }

    /// The content type serving static pages.
    pub fn static_type(&self) -> Result<ContentTypeConfig, CmsError> {
        self.content_type(&self.config.static_page_slug)
    }

    /// Fail unless the repository holds the type's model.
    pub fn require_model(&self, content_type: &ContentTypeConfig) -> Result<(), CmsError> {
        if self.repo.has_model(&content_type.model) {
            Ok(())
        } else {
            Err(CmsError::Configuration(format!(
                "model '{}' of content type '{}' is missing",
                content_type.model, content_type.key
            )))
        }
    }

    /// Run the scheduled-publish sweep against the live repository, so
    /// records that came due become visible without reopening the site.
    pub fn publish_due(&self, now: DateTime<Utc>) -> Result<Vec<ContentRecord>, StoreError> {
        let changed = self.repo.publish_due(now)?;
        for record in &changed {
            tracing::info!(model = %record.model, id = record.id, "published scheduled record");
        }
        Ok(changed)
    }

    /// Whether `record` of `content_type` is the configured front page.
    pub fn is_front_page(&self, content_type: &ContentTypeConfig, record: &ContentRecord) -> bool {
        content_type.key == self.config.static_page_slug
            && record.slug_in(&self.config.default_language)
                == Some(self.config.front_page_slug.as_str())
    }

    /// Canonical route of a record in `lang`.
    pub fn record_route(
        &self,
        content_type: &ContentTypeConfig,
        record: &ContentRecord,
        lang: &str,
    ) -> Route {
        let lang = lang.to_string();
        if self.is_front_page(content_type, record) {
            return Route::Home { lang };
        }
        let slug = record
            .translate("slug", &lang, &self.config.default_language)
            .map(str::to_string)
            .unwrap_or_else(|| record.id.to_string());
        if content_type.key == self.config.static_page_slug {
            Route::StaticPage {
                lang,
                page_slug: slug,
            }
        } else if content_type.is_taxonomy() {
            Route::Taxonomy {
                lang,
                type_slug: content_type.slug.clone(),
                slug,
            }
        } else {
            Route::Single {
                lang,
                type_slug: content_type.slug.clone(),
                slug,
            }
        }
    }

    /// Absolute URL of a path under `base_url`.
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    pub fn render(&self, page: &ResolvedPage) -> Result<String, CmsError> {
        Ok(self.theme.render(page)?)
    }
}
