//! # Lingua CMS
//!
//! A multi-language content router. A site directory holds TOML records
//! grouped by model, an optional Tera theme, and a `cms.toml` that declares
//! content types. Requests of the form `/{lang}/...` are resolved to a
//! record, redirected to their canonical localized URL when needed, and
//! rendered through the first template that exists.
//!
//! # Request Pipeline
//!
//! ```text
//! 1. Route     /{lang}/{segment}/{slug}  →  controller       (slug index)
//! 2. Locate    controller + slug         →  record           (locale fallback)
//! 3. Resolve   candidate names           →  template         (theme, then built-ins)
//! 4. Render    template + view data      →  HTML
//! ```
//!
//! Every stage is a plain function over borrowed state held by [`cms::Cms`],
//! so the whole pipeline can be exercised in tests without a socket: build a
//! `Cms` over in-memory records, hand [`router::respond`] a request, and
//! inspect the status, location, and body.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `cms.toml` loading, merging over stock defaults, validation |
//! | [`record`] | Content records with translatable fields and soft deletes |
//! | [`repository`] | Repository port: record queries and pagination |
//! | [`store`] | TOML-file backed repository, scheduled-publish sweep |
//! | [`cache`] | TTL cache port with memory and JSON-file stores |
//! | [`slug_index`] | URL slug ↔ content-type key maps, cached |
//! | [`locator`] | Slug lookup with default-locale fallback and canonical redirects |
//! | [`templates`] | Candidate lists and the two-namespace template resolver |
//! | [`theme`] | Tera theme loading and rendering, built-in dispatch |
//! | [`builtin`] | Built-in templates written with Maud |
//! | [`view`] | View data, SEO metadata, body classes |
//! | [`controllers`] | Home, static page, single, archive, taxonomy |
//! | [`router`] | Request parsing, dispatch, error pages |
//! | [`cms`] | The assembled site shared by every request |
//! | [`server`] | HTTP/1.1 adapter for `lingua-cms serve` |
//! | [`naming`] | File ordering, template names, CSS classes |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Two Template Namespaces
//!
//! Every candidate name is tried first in the site's theme and then among
//! the built-in templates, and each namespace's `templates.default` is the
//! last resort within it. A theme can therefore override a single template
//! without shipping the rest, and a site with no theme at all still renders.
//!
//! ## Canonical URLs Are Redirects
//!
//! A record reached through the default-language slug under another
//! locale, or through a content-type key instead of its configured slug,
//! answers with a permanent redirect to the canonical URL. Query strings
//! survive the redirect.
//!
//! ## Capabilities By Composition
//!
//! Which fields are translatable, which relations a type declares, and
//! whether records are soft-deleted are data in `cms.toml`, not traits on
//! record types. One [`record::ContentRecord`] struct serves every model.

pub mod builtin;
pub mod cache;
pub mod cms;
pub mod config;
pub mod controllers;
pub mod locator;
pub mod naming;
pub mod output;
pub mod record;
pub mod repository;
pub mod router;
pub mod server;
pub mod slug_index;
pub mod store;
pub mod templates;
pub mod theme;
pub mod view;

#[cfg(test)]
pub(crate) mod test_helpers;
