//! Locale/slug index: URL slugs ↔ content-type keys.
//!
//! Content types are registered under a canonical key (`posts`) but may be
//! addressed in URLs by a different slug (`blog`). Two maps are derived
//! from the resolved configuration and cached for a day:
//!
//! | cache key | value |
//! |-----------|-------|
//! | `cms.slug_to_key_map` | slug → key |
//! | `cms.key_to_config_map` | key → [`ContentTypeConfig`] |
//!
//! Both are computed lazily on first access and shared through the
//! injected [`CacheStore`]. [`SlugIndex::forget`] (and `lingua-cms
//! cache-clear`) drops them. Lookups never fail: an unmapped slug is
//! returned unchanged.

use chrono::Duration;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::{CacheStore, remember};
use crate::config::ContentTypeConfig;

pub const SLUG_TO_KEY_CACHE_KEY: &str = "cms.slug_to_key_map";
pub const KEY_TO_CONFIG_CACHE_KEY: &str = "cms.key_to_config_map";

pub struct SlugIndex {
    types: Vec<ContentTypeConfig>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl SlugIndex {
    pub fn new(types: Vec<ContentTypeConfig>, cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { types, cache, ttl }
    }

    pub fn slug_to_key_map(&self) -> BTreeMap<String, String> {
        remember(self.cache.as_ref(), SLUG_TO_KEY_CACHE_KEY, self.ttl, || {
            self.types
                .iter()
                .map(|ct| (ct.slug.clone(), ct.key.clone()))
                .collect()
        })
    }

    pub fn key_to_config_map(&self) -> BTreeMap<String, ContentTypeConfig> {
        remember(self.cache.as_ref(), KEY_TO_CONFIG_CACHE_KEY, self.ttl, || {
            self.types
                .iter()
                .map(|ct| (ct.key.clone(), ct.clone()))
                .collect()
        })
    }

    /// Canonical key for a URL slug, or the slug itself when unmapped.
    pub fn original_content_type_key(&self, slug: &str) -> String {
        self.slug_to_key_map()
            .remove(slug)
            .unwrap_or_else(|| slug.to_string())
    }

    /// Configuration of a registered key.
    pub fn config_for(&self, key: &str) -> Option<ContentTypeConfig> {
        self.key_to_config_map().remove(key)
    }

    /// Configuration of the content type a URL segment addresses.
    pub fn resolve(&self, segment: &str) -> Option<ContentTypeConfig> {
        self.config_for(&self.original_content_type_key(segment))
    }

    /// Drop both cached maps.
    pub fn forget(&self) {
        self.cache.forget(SLUG_TO_KEY_CACHE_KEY);
        self.cache.forget(KEY_TO_CONFIG_CACHE_KEY);
    }
}
