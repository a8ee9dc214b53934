//! Built-in templates: the package namespace.
//!
//! These are what a site gets when its theme does not override a template.
//! They are plain Maud functions over a [`ResolvedPage`], so the markup is
//! checked at compile time and every interpolated value is escaped. The
//! one exception is `content_html`, which is rendered from the record's
//! Markdown and inserted as-is.
//!
//! ## Templates
//!
//! | name | renders |
//! |------|---------|
//! | `templates.default` | the item, plus its listing if it has one |
//! | `templates.home` | front page |
//! | `templates.page` | static page |
//! | `templates.singles.default` | single record |
//! | `templates.archives.default` | archive listing |
//! | `templates.taxonomies.default` | taxonomy term listing |
//!
//! Error pages are not part of the resolvable set; see [`error_page`].

use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fmt::Display;

use crate::templates::DEFAULT_TEMPLATE;
use crate::theme::RenderError;
use crate::view::{PageItem, RecordView, ResolvedPage};

const CSS: &str = include_str!("../static/style.css");

const TEMPLATES: &[&str] = &[
    DEFAULT_TEMPLATE,
    "templates.home",
    "templates.page",
    "templates.singles.default",
    "templates.archives.default",
    "templates.taxonomies.default",
];

pub fn names() -> &'static [&'static str] {
    TEMPLATES
}

pub fn exists(name: &str) -> bool {
    TEMPLATES.contains(&name)
}

/// Render built-in template `name` for `page`.
pub fn render(name: &str, page: &ResolvedPage) -> Result<Markup, RenderError> {
    let content = match name {
        "templates.home" | "templates.page" | "templates.singles.default" => render_item(page),
        "templates.archives.default" | "templates.taxonomies.default" => render_listing(page),
        DEFAULT_TEMPLATE => html! {
            (render_item(page))
            @if page.view_data.pagination.is_some() {
                (render_entries(page))
            }
        },
        other => return Err(RenderError::UnknownBuiltin(other.to_string())),
    };
    Ok(base_document(page, content))
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(page: &ResolvedPage, content: Markup) -> Markup {
    let seo = &page.seo;
    let title = if seo.title == page.view_data.site_title {
        seo.title.clone()
    } else {
        format!("{} | {}", seo.title, page.view_data.site_title)
    };
    html! {
        (DOCTYPE)
        html lang=(page.view_data.lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @if let Some(description) = &seo.description {
                    meta name="description" content=(description);
                }
                link rel="canonical" href=(seo.canonical);
                @for alternate in &seo.alternates {
                    link rel="alternate" hreflang=(alternate.lang) href=(alternate.url);
                }
                meta property="og:type" content=(seo.og_type);
                meta property="og:title" content=(seo.title);
                style { (PreEscaped(CSS)) }
            }
            body class=(page.body_classes) {
                @if page.view_data.preview {
                    div.preview-banner { "Preview: this page may not be published." }
                }
                (site_header(page))
                main {
                    (content)
                }
            }
        }
    }
}

/// Renders the site header with the home link and language switcher
fn site_header(page: &ResolvedPage) -> Markup {
    let lang = &page.view_data.lang;
    html! {
        header.site-header {
            a.site-title href={ "/" (lang) "/" } { (page.view_data.site_title) }
            @if page.seo.alternates.len() > 1 {
                nav.languages {
                    ul {
                        @for alternate in &page.seo.alternates {
                            li class=[alternate.current.then_some("current")] {
                                a href=(alternate.url) hreflang=(alternate.lang) { (alternate.lang) }
                            }
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_item(page: &ResolvedPage) -> Markup {
    match &page.item {
        PageItem::Record(record) => render_record(record),
        PageItem::Archive(archive) => html! {
            header.archive-header {
                h1 { (archive.title) }
                @if let Some(description) = &archive.description {
                    p.excerpt { (description) }
                }
            }
        },
    }
}

fn render_record(record: &RecordView) -> Markup {
    html! {
        article.entry {
            h1 { (record.title) }
            @if let Some(excerpt) = &record.excerpt {
                p.excerpt { (excerpt) }
            }
            @if let Some(body) = &record.content_html {
                div.entry-content { (PreEscaped(body)) }
            }
        }
    }
}

fn render_listing(page: &ResolvedPage) -> Markup {
    html! {
        section.listing {
            (render_item(page))
            (render_entries(page))
        }
    }
}

fn render_entries(page: &ResolvedPage) -> Markup {
    html! {
        @if page.view_data.items.is_empty() {
            p.empty { "Nothing here yet." }
        } @else {
            ul.entries {
                @for entry in &page.view_data.items {
                    li {
                        a.entry-title href=(entry.url) { (entry.title) }
                        @if let Some(excerpt) = &entry.excerpt {
                            p.excerpt { (excerpt) }
                        }
                    }
                }
            }
        }
        @if let Some(pagination) = &page.view_data.pagination {
            @if pagination.last_page > 1 {
                nav.pagination {
                    @if let Some(previous) = &pagination.previous_url {
                        a rel="prev" href=(previous) { "← Newer" }
                    }
                    span { (pagination.page) " / " (pagination.last_page) }
                    @if let Some(next) = &pagination.next_url {
                        a rel="next" href=(next) { "Older →" }
                    }
                }
            }
        }
    }
}

/// Standalone page for a failed request.
pub fn error_page(site_title: &str, status: u16, error: &dyn Display) -> Markup {
    let heading = match status {
        404 => "Not found",
        _ => "Something went wrong",
    };
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (heading) " | " (site_title) }
                style { (PreEscaped(CSS)) }
            }
            body.error-page {
                main {
                    h1 { (status) }
                    p { (heading) }
                    p.error-detail { (error) }
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
