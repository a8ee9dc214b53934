//! CLI output formatting for the `check`, `publish-scheduled`, and
//! `cache-clear` commands.
//!
//! Output is information-first: every content type is shown by its key and
//! the URL it answers to, with the backing model and record count as
//! indented context lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Lingua Test
//!     Languages: en (default), id
//!
//! Content types
//! 001 categories → /{lang}/categories/{slug}
//!     Taxonomy listing posts
//!     Model: category (1 record)
//! 002 pages → /{lang}/{slug}
//!     Static pages, front page "home"
//!     Model: page (6 records)
//! 003 posts → /{lang}/blog
//!     Single: /{lang}/blog/{slug}
//!     Model: post (4 records)
//! 004 tags → /{lang}/tags/{slug}
//!     Taxonomy listing posts
//!     Model: tag (missing)
//!
//! Templates
//!     Theme: templates.singles.about
//!     Built-in: templates.default, templates.home, ...
//! ```
//!
//! ## Publish
//!
//! ```text
//! post #4 Overdue
//! Published 1 scheduled record
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use std::path::Path;

use crate::builtin;
use crate::cms::Cms;
use crate::config::ContentTypeConfig;
use crate::record::ContentRecord;
use crate::repository::RecordQuery;
use crate::store::StoreError;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// URL pattern a content type answers to, as shown in the header line.
fn route_pattern(cms: &Cms, ct: &ContentTypeConfig) -> String {
    if ct.key == cms.config().static_page_slug {
        "/{lang}/{slug}".to_string()
    } else if ct.is_taxonomy() || !ct.has_archive {
        format!("/{{lang}}/{}/{{slug}}", ct.slug)
    } else {
        format!("/{{lang}}/{}", ct.slug)
    }
}

fn content_type_lines(
    cms: &Cms,
    index: usize,
    ct: &ContentTypeConfig,
) -> Result<Vec<String>, StoreError> {
    let mut lines = vec![format!(
        "{} {} → {}",
        format_index(index),
        ct.key,
        route_pattern(cms, ct)
    )];
    let config = cms.config();

    if ct.key == config.static_page_slug {
        lines.push(format!(
            "{}Static pages, front page \"{}\"",
            indent(1),
            config.front_page_slug
        ));
    } else if ct.is_taxonomy() {
        let relation = ct.display_content_from.as_deref().unwrap_or("posts");
        lines.push(format!("{}Taxonomy listing {relation}", indent(1)));
    } else {
        if ct.has_archive && ct.has_single {
            lines.push(format!("{}Single: /{{lang}}/{}/{{slug}}", indent(1), ct.slug));
        }
        if let Some(per_page) = ct.per_page {
            lines.push(format!("{}Per page: {per_page}", indent(1)));
        }
        if let Some(view) = &ct.archive_view {
            lines.push(format!("{}Archive view: {view}", indent(1)));
        }
    }

    let repo = cms.repository();
    let model = if repo.has_model(&ct.model) {
        let count = repo.query(&RecordQuery::model(&ct.model))?.len();
        format!("{} ({})", ct.model, plural(count, "record"))
    } else {
        format!("{} (missing)", ct.model)
    };
    lines.push(format!("{}Model: {model}", indent(1)));
    Ok(lines)
}

/// Inventory of a site: languages, content types, and templates.
pub fn format_check_output(cms: &Cms) -> Result<Vec<String>, StoreError> {
    let config = cms.config();
    let mut lines = vec![config.site_title.clone()];

    let languages: Vec<String> = config
        .language_available
        .iter()
        .map(|lang| {
            if *lang == config.default_language {
                format!("{lang} (default)")
            } else {
                lang.clone()
            }
        })
        .collect();
    lines.push(format!("{}Languages: {}", indent(1), languages.join(", ")));
    if !config.base_url.is_empty() {
        lines.push(format!("{}Base URL: {}", indent(1), config.base_url));
    }

    lines.push(String::new());
    lines.push("Content types".to_string());
    for (i, ct) in cms.index().key_to_config_map().values().enumerate() {
        lines.extend(content_type_lines(cms, i + 1, ct)?);
    }

    lines.push(String::new());
    lines.push("Templates".to_string());
    let theme = cms.theme().template_names();
    if theme.is_empty() {
        lines.push(format!("{}Theme: (none)", indent(1)));
    } else {
        lines.push(format!("{}Theme: {}", indent(1), theme.join(", ")));
    }
    lines.push(format!("{}Built-in: {}", indent(1), builtin::names().join(", ")));
    Ok(lines)
}

pub fn print_check_output(cms: &Cms) -> Result<(), StoreError> {
    for line in format_check_output(cms)? {
        println!("{}", line);
    }
    Ok(())
}

/// Records promoted by the scheduled-publish sweep.
pub fn format_publish_output(changed: &[ContentRecord], default_language: &str) -> Vec<String> {
    let mut lines: Vec<String> = changed
        .iter()
        .map(|record| {
            match record.translate("title", default_language, default_language) {
                Some(title) => format!("{} #{} {}", record.model, record.id, title),
                None => format!("{} #{}", record.model, record.id),
            }
        })
        .collect();
    if changed.is_empty() {
        lines.push("No scheduled records due".to_string());
    } else {
        lines.push(format!("Published {}", plural(changed.len(), "scheduled record")));
    }
    lines
}

pub fn print_publish_output(changed: &[ContentRecord], default_language: &str) {
    for line in format_publish_output(changed, default_language) {
        println!("{}", line);
    }
}

pub fn format_cache_clear_output(path: &Path) -> Vec<String> {
    vec![format!("Cleared slug and content-type maps → {}", path.display())]
}

pub fn print_cache_clear_output(path: &Path) {
    for line in format_cache_clear_output(path) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn plural_words() {
        assert_eq!(plural(1, "record"), "1 record");
        assert_eq!(plural(0, "record"), "0 records");
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_lists_fixture_site() {
        let (_tmp, cms) = fixture_cms();
        let lines = format_check_output(&cms).unwrap();
        assert_eq!(lines[0], "Lingua Test");
        assert_eq!(lines[1], "    Languages: en (default), id");
        assert!(lines.contains(&"003 posts → /{lang}/blog".to_string()));
        assert!(lines.contains(&"    Single: /{lang}/blog/{slug}".to_string()));
        assert!(lines.contains(&"    Model: page (6 records)".to_string()));
        assert!(lines.contains(&"    Model: category (1 record)".to_string()));
        assert!(lines.contains(&"    Model: tag (missing)".to_string()));
        assert!(lines.contains(&"    Theme: templates.singles.about".to_string()));
    }

    #[test]
    fn check_static_type_pattern() {
        let cms = memory_cms(bilingual_config(), vec![]);
        let lines = format_check_output(&cms).unwrap();
        assert!(lines.contains(&"002 pages → /{lang}/{slug}".to_string()));
        assert!(lines.contains(&"    Static pages, front page \"home\"".to_string()));
        assert!(lines.contains(&"001 categories → /{lang}/categories/{slug}".to_string()));
        assert!(lines.contains(&"    Theme: (none)".to_string()));
    }

    // =========================================================================
    // Publish
    // =========================================================================

    #[test]
    fn publish_output_lists_records() {
        let records = vec![
            RecordBuilder::new(4, "post").title("en", "Overdue").build(),
            RecordBuilder::new(9, "post").build(),
        ];
        assert_eq!(
            format_publish_output(&records, "en"),
            vec![
                "post #4 Overdue",
                "post #9",
                "Published 2 scheduled records"
            ]
        );
    }

    #[test]
    fn publish_output_when_nothing_due() {
        assert_eq!(format_publish_output(&[], "en"), vec!["No scheduled records due"]);
    }

    #[test]
    fn cache_clear_names_path() {
        let lines = format_cache_clear_output(Path::new("site/.cms-cache.json"));
        assert_eq!(lines, vec!["Cleared slug and content-type maps → site/.cms-cache.json"]);
    }
}
