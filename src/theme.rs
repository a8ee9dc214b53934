//! The application template namespace and the renderer.
//!
//! A site may ship a `theme/` directory of Tera templates. A dotted
//! template name maps to a file under it:
//!
//! ```text
//! theme/
//! └── templates/
//!     ├── default.html          # templates.default
//!     ├── singles/
//!     │   ├── about.html        # templates.singles.about
//!     │   └── default.html      # templates.singles.default
//!     └── archives/
//!         └── posts.html        # templates.archives.posts
//! ```
//!
//! Theme templates receive `page`, `item`, `items`, `pagination`, `seo`,
//! `body_classes`, `lang`, and `site_title`. Autoescaping is on; use
//! `{{ item.content_html | safe }}` for rendered Markdown.
//!
//! Names the theme does not define fall through to the built-in Maud
//! templates in [`builtin`](crate::builtin).

use std::collections::BTreeSet;
use std::path::Path;
use tera::Tera;
use thiserror::Error;

use crate::builtin;
use crate::naming;
use crate::templates::{Namespace, TemplateRegistry};
use crate::view::ResolvedPage;

/// Directory under the site root holding theme templates.
pub const THEME_DIR: &str = "theme";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Tera(#[from] tera::Error),
    #[error("Template '{0}' is not in the theme")]
    MissingTemplate(String),
    #[error("Unknown built-in template '{0}'")]
    UnknownBuiltin(String),
}

pub struct Theme {
    tera: Tera,
    /// Theme-relative paths of every loaded template.
    paths: BTreeSet<String>,
}

impl Theme {
    /// A theme with no templates; everything resolves to built-ins.
    pub fn empty() -> Self {
        Self::from_tera(Tera::default())
    }

    /// Load `<root>/theme/**/*.html`. A missing directory is an empty theme.
    pub fn load(root: &Path) -> Result<Self, RenderError> {
        let dir = root.join(THEME_DIR);
        if !dir.is_dir() {
            return Ok(Self::empty());
        }
        let glob = format!("{}/**/*.html", dir.display());
        let tera = Tera::new(&glob)?;
        Ok(Self::from_tera(tera))
    }

    /// Build a theme from `(path, source)` pairs, e.g.
    /// `("templates/singles/about.html", "...")`.
    pub fn from_sources(sources: &[(&str, &str)]) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(sources.iter().copied())?;
        Ok(Self::from_tera(tera))
    }

    fn from_tera(tera: Tera) -> Self {
        let paths = tera.get_template_names().map(str::to_string).collect();
        Self { tera, paths }
    }

    pub fn template_count(&self) -> usize {
        self.paths.len()
    }

    /// Dotted names of the theme's templates, sorted.
    pub fn template_names(&self) -> Vec<String> {
        self.paths
            .iter()
            .filter_map(|path| path.strip_suffix(".html"))
            .map(|stem| stem.replace('/', "."))
            .collect()
    }

    pub fn render(&self, page: &ResolvedPage) -> Result<String, RenderError> {
        let name = &page.template.name;
        match page.template.namespace {
            Namespace::App => {
                let path = naming::template_path(name)
                    .filter(|path| self.paths.contains(path))
                    .ok_or_else(|| RenderError::MissingTemplate(name.clone()))?;
                let context = tera::Context::from_serialize(page.context())?;
                Ok(self.tera.render(&path, &context)?)
            }
            Namespace::Package => Ok(builtin::render(name, page)?.into_string()),
        }
    }
}

impl TemplateRegistry for Theme {
    fn exists(&self, namespace: Namespace, name: &str) -> bool {
        match namespace {
            Namespace::App => {
                naming::template_path(name).is_some_and(|path| self.paths.contains(&path))
            }
            Namespace::Package => builtin::exists(name),
        }
    }
}
