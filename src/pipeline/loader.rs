//! Template and style loading.
//!
//! A [`ResourceLoader`] turns a `template_url` / `style_urls` entry into
//! text. [`TemplateCache`] sits on top: it caches fetched text per URL and
//! parsed templates per component selector, so a component that mounts many
//! times is fetched and parsed once.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::component::ComponentMeta;
use crate::error::LoadError;
use crate::template::{parse, Template};

/// Source of template and style text.
pub trait ResourceLoader {
    fn load(&self, url: &str) -> Result<String, LoadError>;
}

/// Reads resources from a directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceLoader for FsLoader {
    fn load(&self, url: &str) -> Result<String, LoadError> {
        let path = self.root.join(url.trim_start_matches('/'));
        std::fs::read_to_string(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound { url: url.to_string() },
            _ => LoadError::Io { url: url.to_string(), source },
        })
    }
}

/// Serves resources from memory.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: RefCell<HashMap<String, String>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(url, content);
        self
    }

    pub fn insert(&self, url: impl Into<String>, content: impl Into<String>) {
        self.files.borrow_mut().insert(url.into(), content.into());
    }
}

impl ResourceLoader for MemoryLoader {
    fn load(&self, url: &str) -> Result<String, LoadError> {
        self.files
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| LoadError::NotFound { url: url.to_string() })
    }
}

/// Everything a component needs before its first render.
#[derive(Debug, Clone)]
pub struct LoadedComponent {
    pub template: Template,
    pub styles: Vec<String>,
}

pub struct TemplateCache {
    loader: Box<dyn ResourceLoader>,
    texts: RefCell<HashMap<String, Rc<str>>>,
    templates: RefCell<HashMap<String, Template>>,
}

impl TemplateCache {
    pub fn new(loader: Box<dyn ResourceLoader>) -> Self {
        Self {
            loader,
            texts: RefCell::new(HashMap::new()),
            templates: RefCell::new(HashMap::new()),
        }
    }

    /// Text behind `url`, fetched once.
    pub fn fetch(&self, url: &str) -> Result<Rc<str>, LoadError> {
        if let Some(text) = self.texts.borrow().get(url) {
            return Ok(text.clone());
        }
        let text: Rc<str> = self.loader.load(url)?.into();
        self.texts.borrow_mut().insert(url.to_string(), text.clone());
        Ok(text)
    }

    /// Template (inline before `template_url`; neither means an empty
    /// template) and styles (inline first, then `style_urls` in order).
    pub fn load_component(&self, meta: &ComponentMeta) -> Result<LoadedComponent, LoadError> {
        let cached = self.templates.borrow().get(&meta.selector).cloned();
        let template = match cached {
            Some(template) => template,
            None => {
                let source: Rc<str> = match (&meta.template, &meta.template_url) {
                    (Some(inline), _) => inline.as_str().into(),
                    (None, Some(url)) => self.fetch(url)?,
                    (None, None) => "".into(),
                };
                let template = parse(&source).map_err(|source| LoadError::Template {
                    selector: meta.selector.clone(),
                    source,
                })?;
                self.templates.borrow_mut().insert(meta.selector.clone(), template.clone());
                template
            }
        };

        let mut styles = meta.styles.clone();
        for url in &meta.style_urls {
            styles.push(self.fetch(url)?.to_string());
        }

        Ok(LoadedComponent { template, styles })
    }

    pub fn cached_templates(&self) -> usize {
        self.templates.borrow().len()
    }
}

impl fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateCache")
            .field("texts", &self.texts.borrow().len())
            .field("templates", &self.cached_templates())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingLoader {
        inner: MemoryLoader,
        calls: Rc<Cell<usize>>,
    }

    impl ResourceLoader for CountingLoader {
        fn load(&self, url: &str) -> Result<String, LoadError> {
            self.calls.set(self.calls.get() + 1);
            self.inner.load(url)
        }
    }

    #[test]
    fn test_inline_template_wins() {
        let cache = TemplateCache::new(Box::new(MemoryLoader::new()));
        let meta = ComponentMeta::new("app-x").template("<p>inline</p>").template_url("x.html");
        let loaded = cache.load_component(&meta).unwrap();
        assert_eq!(loaded.template.nodes().len(), 1);
    }

    #[test]
    fn test_urls_are_fetched_once() {
        let calls = Rc::new(Cell::new(0));
        let loader = CountingLoader {
            inner: MemoryLoader::new()
                .with("timer.html", "<span>{{left}}</span>")
                .with("timer.css", "span { color: red }"),
            calls: calls.clone(),
        };
        let cache = TemplateCache::new(Box::new(loader));
        let meta = ComponentMeta::new("app-timer")
            .template_url("timer.html")
            .style("span { font-weight: bold }")
            .style_url("timer.css");

        let first = cache.load_component(&meta).unwrap();
        let second = cache.load_component(&meta).unwrap();

        assert_eq!(first.styles, vec!["span { font-weight: bold }", "span { color: red }"]);
        assert_eq!(second.template, first.template);
        assert_eq!(calls.get(), 2, "one fetch per url");
    }

    #[test]
    fn test_missing_resource() {
        let cache = TemplateCache::new(Box::new(MemoryLoader::new()));
        let meta = ComponentMeta::new("app-gone").template_url("gone.html");
        assert!(matches!(cache.load_component(&meta), Err(LoadError::NotFound { .. })));
    }

    #[test]
    fn test_parse_failure_is_a_load_error() {
        let cache = TemplateCache::new(Box::new(MemoryLoader::new()));
        let meta = ComponentMeta::new("app-bad").template("@if (x { y }");
        assert!(matches!(cache.load_component(&meta), Err(LoadError::Template { .. })));
    }

    #[test]
    fn test_fs_loader_not_found() {
        let loader = FsLoader::new("/nonexistent-mini-ng-assets");
        assert!(matches!(loader.load("/a.html"), Err(LoadError::NotFound { .. })));
    }
}
