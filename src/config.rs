//! Build configuration for the manual.
//!
//! Mirrors the documentation tool's configuration surface. Every field has a
//! default matching the manual's own settings, so an empty file is a valid
//! configuration. Files are read through the `config` crate (TOML, YAML or
//! JSON by extension) and can be overridden from the environment with
//! `INET_DOCS__<SECTION>__<KEY>` variables.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DocsError, Result};

/// Prefix of environment variables overriding file settings.
pub const ENV_PREFIX: &str = "INET_DOCS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInfo {
    pub name: String,
    pub copyright: String,
    pub author: String,
    /// Short X.Y version.
    pub version: String,
    /// Full version including alpha/beta/rc tags.
    pub release: String,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            name: "INET Framework".to_string(),
            copyright: "2018, OpenSim Ltd.".to_string(),
            author: "OpenSim Ltd".to_string(),
            version: "4.0.0".to_string(),
            release: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlOptions {
    pub theme: String,
    pub theme_options: IndexMap<String, serde_json::Value>,
    pub static_path: Vec<PathBuf>,
    pub htmlhelp_basename: String,
    /// Variables available to page templates.
    pub context: IndexMap<String, serde_json::Value>,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        let theme_options = [
            ("canonical_url", serde_json::json!("")),
            ("analytics_id", serde_json::json!("")),
            ("logo_only", serde_json::json!(false)),
            ("display_version", serde_json::json!(true)),
            ("prev_next_buttons_location", serde_json::json!("bottom")),
            ("style_external_links", serde_json::json!(false)),
            ("collapse_navigation", serde_json::json!(true)),
            ("sticky_navigation", serde_json::json!(false)),
            ("navigation_depth", serde_json::json!(3)),
            ("includehidden", serde_json::json!(false)),
            ("titles_only", serde_json::json!(false)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            theme: "sphinx_rtd_theme".to_string(),
            theme_options,
            static_path: vec![PathBuf::from("_static")],
            htmlhelp_basename: "INETFrameworkdoc".to_string(),
            context: IndexMap::new(),
        }
    }
}

/// One LaTeX output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatexDocument {
    pub start_doc: String,
    pub target: String,
    pub title: String,
    pub author: String,
    /// `manual`, `howto` or a custom class.
    pub document_class: String,
}

/// One manual page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManPage {
    pub start_doc: String,
    pub name: String,
    pub description: String,
    pub authors: Vec<String>,
    pub section: u8,
}

/// One Texinfo output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TexinfoDocument {
    pub start_doc: String,
    pub target: String,
    pub title: String,
    pub author: String,
    pub dir_entry: String,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodoOptions {
    pub include_todos: bool,
    pub emit_warnings: bool,
}

impl Default for TodoOptions {
    fn default() -> Self {
        Self {
            include_todos: true,
            emit_warnings: false,
        }
    }
}

/// The macro template implicitly imported into every page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroOptions {
    /// Template name, looked up in `templates_path`.
    pub file: String,
    /// Namespace the macros are imported under.
    pub alias: String,
}

impl Default for MacroOptions {
    fn default() -> Self {
        Self {
            file: "global-macros.inc".to_string(),
            alias: "opp".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    pub project: ProjectInfo,
    pub extensions: Vec<String>,
    pub templates_path: Vec<PathBuf>,
    pub source_suffix: Vec<String>,
    pub master_doc: String,
    pub language: Option<String>,
    pub exclude_patterns: Vec<String>,
    pub pygments_style: String,
    pub graphviz_output_format: String,
    pub html: HtmlOptions,
    pub latex_documents: Vec<LatexDocument>,
    pub man_pages: Vec<ManPage>,
    pub texinfo_documents: Vec<TexinfoDocument>,
    /// File whose content is prepended to every page after preprocessing.
    pub rst_prolog: Option<PathBuf>,
    pub todo: TodoOptions,
    pub macros: MacroOptions,
}

impl Default for DocsConfig {
    fn default() -> Self {
        let project = ProjectInfo::default();
        let master_doc = "index".to_string();
        let title = format!("{} Documentation", project.name);

        Self {
            extensions: [
                "sphinx.ext.mathjax",
                "sphinx.ext.extlinks",
                "sphinx.ext.ifconfig",
                "sphinx.ext.todo",
                "sphinx.ext.githubpages",
                "sphinx.ext.graphviz",
                "sphinx.ext.imgconverter",
                "sphinxcontrib.doxylink",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            templates_path: vec![PathBuf::from("_templates")],
            source_suffix: vec![".rst".to_string()],
            language: None,
            exclude_patterns: [
                "_build",
                "_deploy",
                "Thumbs.db",
                ".DS_Store",
                "**/_docs",
                "global.rst",
                "showcases/**",
                "tutorials/**",
                "reference/**",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            pygments_style: "sphinx".to_string(),
            graphviz_output_format: "svg".to_string(),
            html: HtmlOptions::default(),
            latex_documents: vec![LatexDocument {
                start_doc: master_doc.clone(),
                target: "INETFramework.tex".to_string(),
                title: title.clone(),
                author: "OpenSim Ltd.".to_string(),
                document_class: "manual".to_string(),
            }],
            man_pages: vec![ManPage {
                start_doc: master_doc.clone(),
                name: "inetframework".to_string(),
                description: title.clone(),
                authors: vec![project.author.clone()],
                section: 1,
            }],
            texinfo_documents: vec![TexinfoDocument {
                start_doc: master_doc.clone(),
                target: "INETFramework".to_string(),
                title,
                author: project.author.clone(),
                dir_entry: "INETFramework".to_string(),
                description: "One line description of project.".to_string(),
                category: "Miscellaneous".to_string(),
            }],
            rst_prolog: Some(PathBuf::from("global.rst")),
            todo: TodoOptions::default(),
            macros: MacroOptions::default(),
            master_doc,
            project,
        }
    }
}

impl DocsConfig {
    /// Load a configuration file layered with environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DocsError::Config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: DocsConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults layered with environment overrides only.
    pub fn from_env() -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::Config::try_from(&DocsConfig::default())?)
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: DocsConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.master_doc.trim().is_empty() {
            return Err(DocsError::Config("master_doc must not be empty".to_string()));
        }
        if self.source_suffix.is_empty() {
            return Err(DocsError::Config(
                "source_suffix must list at least one suffix".to_string(),
            ));
        }
        for suffix in &self.source_suffix {
            if !suffix.starts_with('.') || suffix.len() < 2 {
                return Err(DocsError::Config(format!(
                    "source suffix '{}' must start with '.'",
                    suffix
                )));
            }
        }

        let alias = &self.macros.alias;
        let valid_alias = alias
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false)
            && alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_alias {
            return Err(DocsError::Config(format!(
                "macro alias '{}' is not a valid identifier",
                alias
            )));
        }
        if self.macros.file.trim().is_empty() {
            return Err(DocsError::Config("macro file name must not be empty".to_string()));
        }

        for doc in &self.latex_documents {
            if doc.target.is_empty() || doc.start_doc.is_empty() {
                return Err(DocsError::Config(
                    "latex document needs a start document and a target".to_string(),
                ));
            }
        }
        for page in &self.man_pages {
            if page.name.is_empty() || page.start_doc.is_empty() {
                return Err(DocsError::Config(
                    "man page needs a start document and a name".to_string(),
                ));
            }
        }
        for doc in &self.texinfo_documents {
            if doc.target.is_empty() || doc.start_doc.is_empty() {
                return Err(DocsError::Config(
                    "texinfo document needs a start document and a target".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Resolve a configured path against the directory holding the sources.
    pub fn resolve(&self, source_dir: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            source_dir.join(path)
        }
    }

    /// Template search directories, resolved against `source_dir`.
    pub fn template_dirs(&self, source_dir: &Path) -> Vec<PathBuf> {
        self.templates_path
            .iter()
            .map(|p| self.resolve(source_dir, p))
            .collect()
    }
}
