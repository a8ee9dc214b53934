//! Name conventions shared by the store, the template resolver, and the
//! view helper.
//!
//! ## Record file ordering
//!
//! Record files may carry an optional numeric prefix (`NNN-`). Prefixed
//! files sort first by number, the rest follow alphabetically:
//! - `002-home.toml` before `010-about.toml`
//! - `010-about.toml` before `draft.toml`
//!
//! ## Template names
//!
//! Templates are addressed with dotted names (`templates.singles.about`).
//! In the theme directory a name maps to a file path by turning dots into
//! separators and appending `.html`. Segments derived from user content
//! (slugs, content-type keys) are reduced to `[a-z0-9_-]` first so a slug
//! can never escape its directory.

use std::cmp::Ordering;

/// Sort key for a record file name following the `NNN-name` convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOrder {
    number: Option<u32>,
    name: String,
}

impl Ord for EntryOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.number, other.number) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.name.cmp(&other.name)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.name.cmp(&other.name),
        }
    }
}

impl PartialOrd for EntryOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parse the ordering key of a file name like `010-about.toml`.
pub fn entry_order(file_name: &str) -> EntryOrder {
    let number = file_name
        .split_once('-')
        .map(|(prefix, _)| prefix)
        .or_else(|| file_name.split_once('.').map(|(stem, _)| stem))
        .and_then(|prefix| prefix.parse::<u32>().ok());
    EntryOrder {
        number,
        name: file_name.to_string(),
    }
}

/// Reduce a value to a safe template-name segment: lowercase `[a-z0-9_-]`,
/// anything else becomes `-`.
pub fn template_segment(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '-' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '-',
        })
        .collect()
}

/// Qualify a record's `template` override: `landing` → `templates.landing`.
pub fn template_override(value: &str) -> String {
    let value = value.trim();
    if value.starts_with("templates.") {
        value.to_string()
    } else {
        format!("templates.{value}")
    }
}

/// Theme-relative file path of a dotted template name.
///
/// `templates.singles.about` → `templates/singles/about.html`. Returns
/// `None` for names with empty segments.
pub fn template_path(name: &str) -> Option<String> {
    if name.split('.').any(str::is_empty) {
        return None;
    }
    Some(format!("{}.html", name.replace('.', "/")))
}

/// CSS class from arbitrary text: lowercase, `[a-z0-9-]`, runs of other
/// characters collapsed to one dash, no leading or trailing dash.
pub fn css_class(value: &str) -> String {
    let mut class = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            class.push(c.to_ascii_lowercase());
        } else if !class.is_empty() && !class.ends_with('-') {
            class.push('-');
        }
    }
    while class.ends_with('-') {
        class.pop();
    }
    class
}

/// Display title for a content-type key: `blog-posts` → `Blog posts`.
pub fn humanize(key: &str) -> String {
    let spaced = key.replace(['-', '_'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
