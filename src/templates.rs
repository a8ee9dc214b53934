//! Template resolution across the application and package namespaces.
//!
//! Controllers build an ordered list of candidate names, most specific
//! first. The resolver walks it in two passes:
//!
//! 1. the first candidate that exists in the application (theme) namespace;
//! 2. the application's own `templates.default`;
//! 3. the first candidate that exists in the package namespace;
//! 4. the package's `templates.default`;
//! 5. otherwise [`CmsError::TemplateResolution`].
//!
//! A site can therefore override any template at any granularity, from one
//! page's slug up to the catch-all default, without touching the package.

use serde::Serialize;
use std::fmt;

use crate::cms::CmsError;
use crate::naming;

/// Name of the catch-all template in either namespace.
pub const DEFAULT_TEMPLATE: &str = "templates.default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// The site's theme directory.
    App,
    /// Templates built into this crate.
    Package,
}

/// A template chosen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateRef {
    pub namespace: Namespace,
    pub name: String,
}

impl TemplateRef {
    pub fn app(name: &str) -> Self {
        Self {
            namespace: Namespace::App,
            name: name.to_string(),
        }
    }

    pub fn package(name: &str) -> Self {
        Self {
            namespace: Namespace::Package,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace {
            Namespace::App => write!(f, "{}", self.name),
            Namespace::Package => write!(f, "cms::{}", self.name),
        }
    }
}

/// Answers whether a named template exists.
pub trait TemplateRegistry: Send + Sync {
    fn exists(&self, namespace: Namespace, name: &str) -> bool;
}

/// Ordered, de-duplicated candidate list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates(Vec<String>);

impl Candidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate unless it is already listed.
    pub fn push(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.0.contains(&name) {
            self.0.push(name);
        }
        self
    }

    /// Append a record's `template` override, if it has one.
    pub fn push_override(self, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => self.push(naming::template_override(v)),
            None => self,
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

pub struct TemplateResolver<'a> {
    registry: &'a dyn TemplateRegistry,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(registry: &'a dyn TemplateRegistry) -> Self {
        Self { registry }
    }

    pub fn find_first_existing_template(
        &self,
        candidates: &[String],
    ) -> Result<TemplateRef, CmsError> {
        let chain = [Namespace::App, Namespace::Package];
        for namespace in chain {
            if let Some(name) = candidates
                .iter()
                .find(|name| self.registry.exists(namespace, name))
            {
                return Ok(TemplateRef {
                    namespace,
                    name: name.clone(),
                });
            }
            if self.registry.exists(namespace, DEFAULT_TEMPLATE) {
                return Ok(TemplateRef {
                    namespace,
                    name: DEFAULT_TEMPLATE.to_string(),
                });
            }
        }
        Err(CmsError::TemplateResolution {
            candidates: candidates.to_vec(),
        })
    }
}
