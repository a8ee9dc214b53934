//! View data handed to templates.
//!
//! Controllers produce a [`ResolvedPage`]: the chosen template, the item
//! being shown (a record or an archive descriptor), the body classes, SEO
//! metadata, and the rest of the view data. Records are flattened into
//! [`RecordView`]s with every translatable field already resolved for the
//! request language, so templates never deal with locale maps.
//!
//! ## Body classes
//!
//! Synthesised from the request context, in this order:
//!
//! | class | example |
//! |-------|---------|
//! | `lang-{lang}` | `lang-id` |
//! | `{kind}` | `single` |
//! | `{kind}-{type}` | `single-posts` |
//! | `{kind}-{slug}` | `single-hello-world` |
//! | `template-{name}` | `template-templates-singles-default` |
//! | `preview` | only in preview mode |
//!
//! Each class is reduced to `[a-z0-9-]`; empty and repeated classes are
//! dropped.

use chrono::{DateTime, Utc};
use pulldown_cmark::{Parser, html as md_html};
use serde::Serialize;

use crate::config::ContentTypeConfig;
use crate::naming;
use crate::record::{ContentRecord, Status};
use crate::repository::Paginated;
use crate::templates::TemplateRef;

/// Which controller produced a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Home,
    Page,
    Single,
    Archive,
    Taxonomy,
}

impl PageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PageKind::Home => "home",
            PageKind::Page => "page",
            PageKind::Single => "single",
            PageKind::Archive => "archive",
            PageKind::Taxonomy => "taxonomy",
        }
    }
}

/// A record with its fields resolved for one language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordView {
    pub id: u64,
    pub model: String,
    pub title: String,
    pub slug: Option<String>,
    pub url: String,
    pub excerpt: Option<String>,
    /// Markdown `content` rendered to HTML.
    pub content_html: Option<String>,
    pub section: Option<String>,
    pub template: Option<String>,
    pub status: Status,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub views: u64,
}

impl RecordView {
    pub fn new(record: &ContentRecord, lang: &str, default_language: &str, url: String) -> Self {
        let field = |name: &str| {
            record
                .translate(name, lang, default_language)
                .map(str::to_string)
        };
        let slug = field("slug");
        let title = field("title")
            .or_else(|| slug.clone())
            .unwrap_or_else(|| format!("#{}", record.id));
        Self {
            id: record.id,
            model: record.model.clone(),
            title,
            slug,
            url,
            excerpt: field("excerpt"),
            content_html: field("content").map(|md| markdown_to_html(&md)),
            section: field("section"),
            template: record.template.clone(),
            status: record.status,
            published_at: record.published_at,
            created_at: record.created_at,
            views: record.views,
        }
    }
}

pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut html = String::new();
    md_html::push_html(&mut html, parser);
    html
}

/// Stand-in item for an archive listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveDescriptor {
    pub title: String,
    pub description: Option<String>,
    /// Content-type key being listed.
    pub post_type: String,
    pub config: ContentTypeConfig,
    pub per_page: u32,
}

/// What a page is about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PageItem {
    Record(RecordView),
    Archive(ArchiveDescriptor),
}

impl PageItem {
    pub fn title(&self) -> &str {
        match self {
            PageItem::Record(record) => &record.title,
            PageItem::Archive(archive) => &archive.title,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            PageItem::Record(record) => record.excerpt.as_deref(),
            PageItem::Archive(archive) => archive.description.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationView {
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
    pub last_page: u32,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
}

impl PaginationView {
    pub fn new<T>(paginated: &Paginated<T>, url_for: impl Fn(u32) -> String) -> Self {
        Self {
            page: paginated.page,
            per_page: paginated.per_page,
            total: paginated.total,
            last_page: paginated.last_page(),
            previous_url: paginated
                .has_previous()
                .then(|| url_for(paginated.page - 1)),
            next_url: paginated.has_next().then(|| url_for(paginated.page + 1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageLink {
    pub lang: String,
    pub url: String,
    pub current: bool,
}

/// Metadata for `<head>`: title, description, canonical and hreflang links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeoMeta {
    pub title: String,
    pub description: Option<String>,
    pub canonical: String,
    pub alternates: Vec<LanguageLink>,
    pub og_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewData {
    pub site_title: String,
    pub lang: String,
    pub kind: PageKind,
    pub title: String,
    /// Listing entries for archives and taxonomies; empty otherwise.
    pub items: Vec<RecordView>,
    pub pagination: Option<PaginationView>,
    pub preview: bool,
}

/// Everything needed to render one response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPage {
    pub template: TemplateRef,
    pub item: PageItem,
    pub body_classes: String,
    pub seo: SeoMeta,
    pub view_data: ViewData,
}

impl ResolvedPage {
    pub fn context(&self) -> TemplateContext<'_> {
        TemplateContext {
            page: &self.view_data,
            item: &self.item,
            items: &self.view_data.items,
            pagination: self.view_data.pagination.as_ref(),
            seo: &self.seo,
            body_classes: &self.body_classes,
            lang: &self.view_data.lang,
            site_title: &self.view_data.site_title,
        }
    }
}

/// Top-level variables of a theme template.
#[derive(Debug, Serialize)]
pub struct TemplateContext<'a> {
    pub page: &'a ViewData,
    pub item: &'a PageItem,
    pub items: &'a [RecordView],
    pub pagination: Option<&'a PaginationView>,
    pub seo: &'a SeoMeta,
    pub body_classes: &'a str,
    pub lang: &'a str,
    pub site_title: &'a str,
}

/// Inputs to [`body_classes`].
pub struct BodyClassContext<'a> {
    pub lang: &'a str,
    pub kind: PageKind,
    pub type_key: Option<&'a str>,
    pub slug: Option<&'a str>,
    pub template: &'a TemplateRef,
    pub preview: bool,
}

pub fn body_classes(ctx: &BodyClassContext<'_>) -> String {
    let kind = ctx.kind.as_str();
    let mut raw = vec![format!("lang-{}", ctx.lang), kind.to_string()];
    if let Some(type_key) = ctx.type_key {
        raw.push(format!("{kind}-{type_key}"));
    }
    if let Some(slug) = ctx.slug {
        raw.push(format!("{kind}-{slug}"));
    }
    raw.push(format!("template-{}", ctx.template.name));
    if ctx.preview {
        raw.push("preview".to_string());
    }

    let mut classes: Vec<String> = Vec::with_capacity(raw.len());
    for class in raw.iter().map(|c| naming::css_class(c)) {
        if !class.is_empty() && !classes.contains(&class) {
            classes.push(class);
        }
    }
    classes.join(" ")
}
