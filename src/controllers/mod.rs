//! Request controllers.
//!
//! One module per request flavor. Each is a linear pipeline that can
//! short-circuit with a redirect:
//!
//! | controller | route | short-circuits |
//! |------------|-------|----------------|
//! | [`home`] | `/{lang}/` | none |
//! | [`static_page`] | `/{lang}/{page}` | front-page alias, localized slug |
//! | [`single`] | `/{lang}/{type}/{slug}` | static-type alias, canonical type slug, localized slug |
//! | [`archive`] | `/{lang}/{type}` | canonical type slug |
//! | [`taxonomy`] | `/{lang}/{taxonomy}/{slug}` | canonical type slug, localized slug |
//!
//! Every controller ends in [`finish`], which resolves the template and
//! assembles the [`ResolvedPage`].
//!
//! ## Template names
//!
//! Candidates are tried in order, in the theme and then among the built-ins.
//! `{key}` is the content-type key (`posts`, never the URL slug) and
//! `{slug}` the record's slug in the requested language, both passed
//! through [`naming::template_segment`](crate::naming::template_segment).
//! Static pages are named by slug alone; every other type prefixes its key.
//!
//! | controller | candidates |
//! |------------|------------|
//! | [`home`] | record `template`, `templates.home`, `templates.singles.{slug}`, `templates.page`, `templates.singles.default` |
//! | [`static_page`] | record `template`, `templates.singles.{slug}`, `templates.page`, `templates.singles.default` |
//! | [`single`] | record `template`, `templates.singles.{key}-{slug}`, `templates.singles.{key}`, `templates.singles.default` |
//! | [`archive`] | `archive_view`, backing page `template`, `templates.archives.{key}`, `templates.archives.default` |
//! | [`taxonomy`] | term `template`, `templates.taxonomies.{key}-{slug}`, `templates.taxonomies.{key}`, `templates.taxonomies.default`, `templates.archives.default` |
//!
//! So `theme/templates/singles/about.html` styles the page at `/en/about`,
//! while a post with slug `about` looks for `singles/posts-about.html`.

pub mod archive;
pub mod home;
pub mod single;
pub mod static_page;
pub mod taxonomy;

use crate::cms::{Cms, CmsError};
use crate::config::ContentTypeConfig;
use crate::locator::Visibility;
use crate::record::ContentRecord;
use crate::repository::Paginated;
use crate::router::{CmsRequest, Redirect, Route};
use crate::templates::Candidates;
use crate::view::{
    BodyClassContext, LanguageLink, PageItem, PageKind, PaginationView, RecordView, ResolvedPage,
    SeoMeta, ViewData, body_classes,
};

/// Result of a controller.
#[derive(Debug)]
pub enum Outcome {
    Page(Box<ResolvedPage>),
    Redirect(Redirect),
}

/// A page before its template is chosen.
pub(crate) struct PageDraft<'a> {
    pub kind: PageKind,
    pub lang: &'a str,
    pub content_type: &'a ContentTypeConfig,
    /// Slug of the item in the request language, for body classes.
    pub slug: Option<String>,
    pub candidates: Candidates,
    pub item: PageItem,
    pub listing: Option<Listing>,
    pub canonical: Route,
    pub alternates: Vec<LanguageLink>,
}

pub(crate) struct Listing {
    pub items: Vec<RecordView>,
    pub pagination: PaginationView,
}

pub(crate) fn finish(
    cms: &Cms,
    request: &CmsRequest,
    draft: PageDraft<'_>,
) -> Result<Outcome, CmsError> {
    let template = cms
        .resolver()
        .find_first_existing_template(draft.candidates.as_slice())?;
    tracing::debug!(
        kind = draft.kind.as_str(),
        content_type = %draft.content_type.key,
        %template,
        "template chosen"
    );

    let preview = cms.visibility(request) == Visibility::Any;
    let body_classes = body_classes(&BodyClassContext {
        lang: draft.lang,
        kind: draft.kind,
        type_key: Some(&draft.content_type.key),
        slug: draft.slug.as_deref(),
        template: &template,
        preview,
    });
    let seo = SeoMeta {
        title: draft.item.title().to_string(),
        description: draft.item.description().map(str::to_string),
        canonical: cms.absolute_url(&draft.canonical.path()),
        alternates: draft.alternates,
        og_type: match draft.kind {
            PageKind::Single => "article",
            _ => "website",
        }
        .to_string(),
    };
    let (items, pagination) = match draft.listing {
        Some(listing) => (listing.items, Some(listing.pagination)),
        None => (Vec::new(), None),
    };
    let view_data = ViewData {
        site_title: cms.config().site_title.clone(),
        lang: draft.lang.to_string(),
        kind: draft.kind,
        title: draft.item.title().to_string(),
        items,
        pagination,
        preview,
    };
    Ok(Outcome::Page(Box::new(ResolvedPage {
        template,
        item: draft.item,
        body_classes,
        seo,
        view_data,
    })))
}

/// 301 to `route`, keeping the request's query string.
pub(crate) fn redirect_to(route: Route, request: &CmsRequest) -> Outcome {
    let location = route.url(&request.query);
    tracing::debug!(from = %request.path, to = %location, "canonical redirect");
    Outcome::Redirect(Redirect::permanent(location))
}

/// One link per available language, built by `route_for`.
pub(crate) fn alternates(
    cms: &Cms,
    current: &str,
    route_for: impl Fn(&str) -> Route,
) -> Vec<LanguageLink> {
    cms.config()
        .language_available
        .iter()
        .map(|lang| LanguageLink {
            lang: lang.clone(),
            url: cms.absolute_url(&route_for(lang).path()),
            current: lang == current,
        })
        .collect()
}

pub(crate) fn record_alternates(
    cms: &Cms,
    content_type: &ContentTypeConfig,
    record: &ContentRecord,
    current: &str,
) -> Vec<LanguageLink> {
    alternates(cms, current, |lang| cms.record_route(content_type, record, lang))
}

pub(crate) fn record_view(
    cms: &Cms,
    content_type: &ContentTypeConfig,
    record: &ContentRecord,
    lang: &str,
) -> RecordView {
    let url = cms.record_route(content_type, record, lang).path();
    RecordView::new(record, lang, &cms.config().default_language, url)
}

/// Slug of `record` in `lang`, with default-locale fallback.
pub(crate) fn slug_for(cms: &Cms, record: &ContentRecord, lang: &str) -> Option<String> {
    record
        .translate("slug", lang, &cms.config().default_language)
        .map(str::to_string)
}

/// Listing entries of `entries_type` with pagination links under `route`.
pub(crate) fn listing(
    cms: &Cms,
    request: &CmsRequest,
    lang: &str,
    route: &Route,
    entries_type: &ContentTypeConfig,
    paginated: Paginated<ContentRecord>,
) -> Listing {
    let pagination = PaginationView::new(&paginated, |page| {
        route.url(&request.query_with_page(page))
    });
    let items = paginated
        .items
        .iter()
        .map(|record| record_view(cms, entries_type, record, lang))
        .collect();
    Listing { items, pagination }
}
