//! Extension registration.
//!
//! [`setup`] is the one-time start-up step: it builds the lexers, source-read
//! hooks and directives for a configuration and hands them to the build
//! driver as a plain value.

use log::info;
use std::path::Path;
use std::sync::Arc;

use crate::config::DocsConfig;
use crate::directives::{CodeBlockHighlighter, DirectiveRegistry, EmbedDirective, VideoDirective};
use crate::error::Result;
use crate::highlighting::LexerRegistry;
use crate::preprocess::{JinjaRenderer, RenderContext, SourcePreprocessor, SourceReadHook};

/// Everything registered for a build.
#[derive(Clone)]
pub struct Extensions {
    pub lexers: LexerRegistry,
    pub source_read_hooks: Vec<Arc<dyn SourceReadHook>>,
    pub directives: DirectiveRegistry,
    pub context: Arc<RenderContext>,
}

impl Extensions {
    /// Append a hook; hooks run in registration order.
    pub fn add_source_read_hook(&mut self, hook: Arc<dyn SourceReadHook>) {
        self.source_read_hooks.push(hook);
    }

    /// Names of the registered source-read hooks, in run order.
    pub fn hook_names(&self) -> Vec<&str> {
        self.source_read_hooks.iter().map(|h| h.name()).collect()
    }
}

/// Register the manual's extensions. Templates are looked up in the
/// configured `templates_path`, relative to `source_dir`.
pub fn setup(config: &DocsConfig, source_dir: &Path) -> Result<Extensions> {
    config.validate()?;

    let lexers = LexerRegistry::with_builtin_lexers();

    let renderer = JinjaRenderer::new(config.template_dirs(source_dir));
    let preprocessor = SourcePreprocessor::new(Box::new(renderer), &config.macros);

    let mut directives = DirectiveRegistry::new();
    directives.register(Arc::new(EmbedDirective::youtube()));
    directives.register(Arc::new(EmbedDirective::vimeo()));
    directives.register(Arc::new(VideoDirective::new()));
    directives.register(Arc::new(CodeBlockHighlighter::new(lexers.clone())));

    let mut extensions = Extensions {
        lexers,
        source_read_hooks: Vec::new(),
        directives,
        context: Arc::new(RenderContext::from_config(config)),
    };
    extensions.add_source_read_hook(Arc::new(preprocessor));

    info!(
        "Registered lexers [{}], directives [{}], hooks [{}]",
        extensions.lexers.languages().join(", "),
        extensions.directives.names().join(", "),
        extensions.hook_names().join(", ")
    );
    Ok(extensions)
}
