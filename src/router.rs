//! Request routing.
//!
//! ```text
//! GET /                              → 302 /{default_language}/
//! GET /{lang}/                       → Home
//! GET /{lang}/{x}                    → Archive if x names a type with has_archive,
//!                                      StaticPage otherwise
//! GET /{lang}/{a}/{b}                → Taxonomy if a names a taxonomy type,
//!                                      SingleContent otherwise
//! ```
//!
//! Path segments are percent-decoded before matching, and [`Route::path`]
//! encodes them again, so non-ASCII slugs round-trip through `Location`
//! headers and links.
//!
//! `{lang}` must be one of `language_available`; anything else, and any
//! deeper path, is a 404. Type segments are looked up through the slug
//! index, so both a type's configured slug and its bare key resolve (the
//! controllers redirect the latter to the former).
//!
//! [`respond`] turns the outcome into a [`Response`], rendering error pages
//! for failures.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::Serialize;

use crate::builtin;
use crate::cms::{Cms, CmsError};
use crate::controllers::{self, Outcome};

/// Bytes escaped inside one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// A URL the router can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    Home {
        lang: String,
    },
    StaticPage {
        lang: String,
        page_slug: String,
    },
    Single {
        lang: String,
        type_slug: String,
        slug: String,
    },
    Archive {
        lang: String,
        type_slug: String,
    },
    Taxonomy {
        lang: String,
        type_slug: String,
        slug: String,
    },
}

impl Route {
    /// Absolute path with every segment percent-encoded.
    pub fn path(&self) -> String {
        let segments: Vec<&str> = match self {
            Route::Home { lang } => return format!("/{}/", encode_segment(lang)),
            Route::StaticPage { lang, page_slug } => vec![lang.as_str(), page_slug.as_str()],
            Route::Archive { lang, type_slug } => vec![lang.as_str(), type_slug.as_str()],
            Route::Single {
                lang,
                type_slug,
                slug,
            }
            | Route::Taxonomy {
                lang,
                type_slug,
                slug,
            } => vec![lang.as_str(), type_slug.as_str(), slug.as_str()],
        };
        segments
            .into_iter()
            .map(|segment| format!("/{}", encode_segment(segment)))
            .collect()
    }

    /// Path plus an encoded query string, if `query` is non-empty.
    pub fn url(&self, query: &[(String, String)]) -> String {
        with_query(self.path(), query)
    }
}

fn with_query(path: String, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return path;
    }
    match serde_urlencoded::to_string(query) {
        Ok(encoded) => format!("{path}?{encoded}"),
        Err(_) => path,
    }
}

/// A redirect decided by a controller or the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
    pub permanent: bool,
}

impl Redirect {
    /// 301.
    pub fn permanent(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            permanent: true,
        }
    }

    /// 302.
    pub fn found(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            permanent: false,
        }
    }

    pub fn status(&self) -> u16 {
        if self.permanent { 301 } else { 302 }
    }
}

/// Transport-independent request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmsRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
    /// The caller proved it may preview unpublished content.
    pub authenticated: bool,
}

impl CmsRequest {
    /// Split a request target (`/en/about?preview=true`) into path and query.
    ///
    /// A malformed query string is treated as empty.
    pub fn parse(target: &str, authenticated: bool) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        let query = serde_urlencoded::from_str::<Vec<(String, String)>>(query).unwrap_or_else(|err| {
            tracing::debug!(target, error = %err, "ignoring malformed query string");
            Vec::new()
        });
        Self {
            path: path.to_string(),
            query,
            authenticated,
        }
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `?preview=true` (or `1`).
    pub fn wants_preview(&self) -> bool {
        matches!(self.query_value("preview"), Some("true" | "1"))
    }

    /// Requested listing page, `?page=N`, 1 when absent or invalid.
    pub fn page(&self) -> u32 {
        self.query_value("page")
            .and_then(|p| p.parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1)
    }

    /// The query with `page` replaced, for pagination links.
    pub fn query_with_page(&self, page: u32) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = self
            .query
            .iter()
            .filter(|(k, _)| k != "page")
            .cloned()
            .collect();
        if page > 1 {
            query.push(("page".to_string(), page.to_string()));
        }
        query
    }

    /// Non-empty path segments, percent-decoded.
    fn segments(&self) -> Vec<String> {
        self.path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect()
    }
}

/// Transport-independent response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

impl Response {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            location: None,
            body,
        }
    }

    fn redirect(redirect: Redirect) -> Self {
        Self {
            status: redirect.status(),
            body: format!("Redirecting to {}", redirect.location),
            location: Some(redirect.location),
        }
    }
}

/// Route a request to its controller.
pub fn dispatch(cms: &Cms, request: &CmsRequest) -> Result<Outcome, CmsError> {
    let segments = request.segments();
    let Some((lang, rest)) = segments.split_first() else {
        let home = Route::Home {
            lang: cms.config().default_language.clone(),
        };
        return Ok(Outcome::Redirect(Redirect::found(home.path())));
    };
    let lang = lang.as_str();
    if !cms.config().is_available_language(lang) {
        return Err(CmsError::NotFound(format!("language '{lang}' is not available")));
    }
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
    match rest.as_slice() {
        [] => controllers::home::show(cms, request, lang),
        [segment] => match cms.index().resolve(segment) {
            Some(ct) if ct.has_archive => controllers::archive::show(cms, request, lang, segment),
            _ => controllers::static_page::show(cms, request, lang, segment),
        },
        [type_slug, slug] => match cms.index().resolve(type_slug) {
            Some(ct) if ct.is_taxonomy() => {
                controllers::taxonomy::show(cms, request, lang, type_slug, slug)
            }
            _ => controllers::single::show(cms, request, lang, type_slug, slug),
        },
        _ => Err(CmsError::NotFound(format!("no route for '{}'", request.path))),
    }
}

/// Dispatch, render, and map errors to status codes.
pub fn respond(cms: &Cms, request: &CmsRequest) -> Response {
    let result = dispatch(cms, request).and_then(|outcome| match outcome {
        Outcome::Redirect(redirect) => Ok(Response::redirect(redirect)),
        Outcome::Page(page) => {
            tracing::debug!(path = %request.path, template = %page.template, "rendering");
            Ok(Response::html(200, cms.render(&page)?))
        }
    });
    result.unwrap_or_else(|err| error_response(cms, request, &err))
}

fn error_response(cms: &Cms, request: &CmsRequest, err: &CmsError) -> Response {
    let status = err.status();
    match err {
        CmsError::NotFound(_) => tracing::debug!(path = %request.path, error = %err, "not found"),
        CmsError::Configuration(_) => {
            tracing::warn!(path = %request.path, error = %err, "configuration error")
        }
        _ => tracing::error!(path = %request.path, error = %err, "request failed"),
    }
    let body = builtin::error_page(&cms.config().site_title, status, err).into_string();
    Response::html(status, body)
}
