//! INET Framework documentation extensions
//!
//! Syntax highlighters for message-definition and ini files, page templating
//! for HTML builds, and video directives, wired together by [`app::setup`].

pub mod app;
pub mod builder;
pub mod config;
pub mod directives;
pub mod error;
pub mod format;
pub mod highlighting;
pub mod matching;
pub mod preprocess;

pub use app::{setup, Extensions};
pub use builder::{BuildStats, DocsBuilder, Pipeline};
pub use config::DocsConfig;
pub use directives::{Directive, DirectiveRegistry, ParsedDirective};
pub use error::DocsError;
pub use format::OutputFormat;
pub use highlighting::{LexerRegistry, RegexLexer, Token, TokenKind};
pub use preprocess::{
    JinjaRenderer, RenderContext, SourcePreprocessor, SourceReadHook, TemplateRenderer,
};
