//! Page templating applied when a source file is read.
//!
//! For HTML builds every page is rendered as a Jinja template before it is
//! parsed. The shared macro file is imported at the top of each page under a
//! short alias, so pages can call `{{ opp.some_macro(...) }}` without an
//! import of their own. Other output formats see the source untouched.

use indexmap::IndexMap;
use log::debug;
use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::config::{DocsConfig, MacroOptions};
use crate::error::{DocsError, Result};
use crate::format::OutputFormat;

/// Variables visible to page templates. Read-only while a build runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderContext(IndexMap<String, serde_json::Value>);

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context built from the configured `html.context` plus the project
    /// metadata (`project`, `version`, `release`, `copyright`, `author`).
    /// Explicit context entries win over the metadata.
    pub fn from_config(config: &DocsConfig) -> Self {
        let mut context = Self::new();
        context.insert("project", config.project.name.clone());
        context.insert("version", config.project.version.clone());
        context.insert("release", config.project.release.clone());
        context.insert("copyright", config.project.copyright.clone());
        context.insert("author", config.project.author.clone());
        for (key, value) in &config.html.context {
            context.0.insert(key.clone(), value.clone());
        }
        context
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The template engine as seen by the preprocessor.
pub trait TemplateRenderer: Send + Sync {
    /// Render `source` against `context`. Undefined names and syntax errors
    /// are errors.
    fn render(
        &self,
        source: &str,
        context: &RenderContext,
    ) -> std::result::Result<String, minijinja::Error>;
}

/// Jinja renderer that resolves imports from a list of template directories.
pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl JinjaRenderer {
    pub fn new(template_dirs: Vec<PathBuf>) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_loader(move |name| {
            for dir in &template_dirs {
                let path = dir.join(name);
                if path.is_file() {
                    return fs::read_to_string(&path).map(Some).map_err(|err| {
                        minijinja::Error::new(
                            ErrorKind::InvalidOperation,
                            format!("could not read template {}", path.display()),
                        )
                        .with_source(err)
                    });
                }
            }
            Ok(None)
        });
        Self { env }
    }

    /// Register an extra named template, e.g. macros that do not live on disk.
    pub fn add_template(
        &mut self,
        name: &str,
        source: &str,
    ) -> std::result::Result<(), minijinja::Error> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())
    }
}

impl TemplateRenderer for JinjaRenderer {
    fn render(
        &self,
        source: &str,
        context: &RenderContext,
    ) -> std::result::Result<String, minijinja::Error> {
        self.env.render_str(source, context)
    }
}

/// Hook run on every source file right after it is read.
pub trait SourceReadHook: Send + Sync {
    fn name(&self) -> &str;

    /// Rewrite `source` in place.
    fn on_source_read(
        &self,
        docname: &str,
        source: &mut String,
        format: OutputFormat,
        context: &RenderContext,
    ) -> Result<()>;
}

/// Renders HTML pages as templates with the macro namespace pre-imported.
pub struct SourcePreprocessor {
    renderer: Box<dyn TemplateRenderer>,
    header: String,
}

impl SourcePreprocessor {
    pub fn new(renderer: Box<dyn TemplateRenderer>, macros: &MacroOptions) -> Self {
        Self {
            renderer,
            header: format!("{{% import '{}' as {} %}}\n", macros.file, macros.alias),
        }
    }

    /// The line prepended to every page before rendering.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Render `source` in place when building HTML; leave it alone otherwise.
    pub fn process(
        &self,
        docname: &str,
        source: &mut String,
        format: OutputFormat,
        context: &RenderContext,
    ) -> Result<()> {
        match format {
            OutputFormat::Html => {
                let mut template = String::with_capacity(self.header.len() + source.len());
                template.push_str(&self.header);
                template.push_str(source);

                let rendered = self
                    .renderer
                    .render(&template, context)
                    .map_err(|source| DocsError::Template {
                        docname: docname.to_string(),
                        source,
                    })?;
                debug!(
                    "Rendered '{}' as template ({} -> {} bytes)",
                    docname,
                    source.len(),
                    rendered.len()
                );
                *source = rendered;
                Ok(())
            }
            OutputFormat::Latex | OutputFormat::Texinfo | OutputFormat::Man => Ok(()),
        }
    }
}

impl SourceReadHook for SourcePreprocessor {
    fn name(&self) -> &str {
        "template-preprocessor"
    }

    fn on_source_read(
        &self,
        docname: &str,
        source: &mut String,
        format: OutputFormat,
        context: &RenderContext,
    ) -> Result<()> {
        self.process(docname, source, format, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MACROS: &str = "{% macro video(id) %}<video {{ id }}>{% endmacro %}";

    fn preprocessor() -> SourcePreprocessor {
        let mut renderer = JinjaRenderer::new(Vec::new());
        renderer.add_template("global-macros.inc", MACROS).unwrap();
        SourcePreprocessor::new(Box::new(renderer), &MacroOptions::default())
    }

    #[test]
    fn test_header() {
        assert_eq!(
            preprocessor().header(),
            "{% import 'global-macros.inc' as opp %}\n"
        );
    }

    #[test]
    fn test_plain_page_only_gains_header_line() {
        let mut source = "Title\n=====\n\nSome text.\n".to_string();
        preprocessor()
            .process("index", &mut source, OutputFormat::Html, &RenderContext::new())
            .unwrap();
        assert_eq!(source, "\nTitle\n=====\n\nSome text.\n");
    }

    #[test]
    fn test_other_formats_are_untouched() {
        for format in [OutputFormat::Latex, OutputFormat::Texinfo, OutputFormat::Man] {
            let mut source = "{{ undefined }} {% broken".to_string();
            preprocessor()
                .process("index", &mut source, format, &RenderContext::new())
                .unwrap();
            assert_eq!(source, "{{ undefined }} {% broken");
        }
    }

    #[test]
    fn test_variables_and_macros() {
        let mut context = RenderContext::new();
        context.insert("version", "4.0.0");
        let mut source = "INET {{ version }} {{ opp.video('intro.mp4') }}".to_string();
        preprocessor()
            .process("index", &mut source, OutputFormat::Html, &context)
            .unwrap();
        assert_eq!(source, "\nINET 4.0.0 <video intro.mp4>");
    }

    #[test]
    fn test_undefined_variable_fails() {
        let mut source = "{{ missing }}".to_string();
        let err = preprocessor()
            .process("guide/intro", &mut source, OutputFormat::Html, &RenderContext::new())
            .unwrap_err();
        assert!(matches!(err, DocsError::Template { ref docname, .. } if docname == "guide/intro"));
        assert_eq!(source, "{{ missing }}");
    }

    #[test]
    fn test_syntax_error_fails() {
        let mut source = "{% if %}".to_string();
        assert!(preprocessor()
            .process("index", &mut source, OutputFormat::Html, &RenderContext::new())
            .is_err());
    }

    #[test]
    fn test_context_from_config() {
        let mut config = DocsConfig::default();
        config
            .html
            .context
            .insert("version".to_string(), serde_json::json!("override"));
        let context = RenderContext::from_config(&config);
        assert_eq!(context.get("project").unwrap(), "INET Framework");
        assert_eq!(context.get("version").unwrap(), "override");
    }
}
