//! Syntax highlighting for the manual's custom code-block languages.
//!
//! Two lexers are provided: [`msg`] for message-definition files and [`ini`]
//! for simulation configuration files. Both are display-only: they classify
//! text for colorizing and never validate it.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::error::{DocsError, Result};
use crate::matching;

pub mod html;
pub mod ini;
pub mod lexer;
pub mod msg;

pub use lexer::{Action, RegexLexer, Rule, Tokens, Transition};

/// Token categories produced by the lexers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Comment,
    CommentSingle,
    CommentMultiline,
    Text,
    Operator,
    String,
    NameAttribute,
}

impl TokenKind {
    /// Short CSS class used by highlighting stylesheets. Plain text carries
    /// no class.
    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            TokenKind::Keyword => Some("k"),
            TokenKind::Comment => Some("c"),
            TokenKind::CommentSingle => Some("c1"),
            TokenKind::CommentMultiline => Some("cm"),
            TokenKind::Text => None,
            TokenKind::Operator => Some("o"),
            TokenKind::String => Some("s"),
            TokenKind::NameAttribute => Some("na"),
        }
    }

    /// True for all comment kinds.
    pub fn is_comment(&self) -> bool {
        matches!(
            self,
            TokenKind::Comment | TokenKind::CommentSingle | TokenKind::CommentMultiline
        )
    }
}

/// A classified slice of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'t> {
    pub kind: TokenKind,
    pub text: &'t str,
}

impl<'t> Token<'t> {
    /// Token of `kind` covering `text`.
    pub fn new(kind: TokenKind, text: &'t str) -> Self {
        Self { kind, text }
    }
}

/// Lexers available to code blocks, keyed by language name.
#[derive(Default, Clone)]
pub struct LexerRegistry {
    lexers: HashMap<String, Arc<RegexLexer>>,
}

impl LexerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `msg` and `OppIni` lexers. `ini` is left to the
    /// renderer's stock highlighter.
    pub fn with_builtin_lexers() -> Self {
        let mut registry = Self::new();
        registry.register("msg", msg::lexer());
        registry.register("OppIni", ini::lexer());
        registry
    }

    /// Register `lexer` under the code-block language `name`. A later
    /// registration under the same name replaces the earlier one.
    pub fn register(&mut self, name: &str, lexer: Arc<RegexLexer>) {
        debug!("Registering lexer '{}' as '{}'", lexer.name(), name);
        self.lexers.insert(name.to_string(), lexer);
    }

    /// Lexer registered for the code-block language `language`.
    pub fn get(&self, language: &str) -> Option<&Arc<RegexLexer>> {
        self.lexers.get(language)
    }

    /// Whether code blocks in `language` are highlighted by this registry.
    pub fn contains(&self, language: &str) -> bool {
        self.lexers.contains_key(language)
    }

    /// Registered language names, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.lexers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Find a lexer whose filename patterns match the file name of `path`.
    pub fn for_filename(&self, path: &Path) -> Option<&Arc<RegexLexer>> {
        let file_name = path.file_name()?.to_string_lossy();
        let mut candidates: Vec<(&String, &Arc<RegexLexer>)> = self.lexers.iter().collect();
        candidates.sort_by(|a, b| a.0.cmp(b.0));
        candidates
            .into_iter()
            .map(|(_, lexer)| lexer)
            .find(|lexer| {
                lexer
                    .filenames()
                    .iter()
                    .any(|pattern| matching::pattern_match(&file_name, pattern).unwrap_or(false))
            })
    }

    /// Highlight `code` as HTML with the lexer registered for `language`.
    pub fn highlight_html(&self, language: &str, code: &str) -> Result<String> {
        let lexer = self
            .get(language)
            .ok_or_else(|| DocsError::UnknownLexer(language.to_string()))?;
        Ok(html::format_html(lexer.tokens(code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_languages() {
        let registry = LexerRegistry::with_builtin_lexers();
        assert_eq!(registry.languages(), vec!["OppIni", "msg"]);
        assert!(!registry.contains("ini"));
        assert!(registry.contains("OppIni"));
    }

    #[test]
    fn test_lexer_for_filename() {
        let registry = LexerRegistry::with_builtin_lexers();
        let lexer = registry.for_filename(Path::new("src/inet/Packet.msg")).unwrap();
        assert_eq!(lexer.name(), "msg");
        let lexer = registry.for_filename(Path::new("showcases/omnetpp.ini")).unwrap();
        assert_eq!(lexer.name(), "OMNeT++ Ini File");
        assert!(registry.for_filename(Path::new("README.md")).is_none());
    }

    #[test]
    fn test_unknown_language() {
        let registry = LexerRegistry::with_builtin_lexers();
        assert!(matches!(
            registry.highlight_html("ned", "module Foo {}"),
            Err(DocsError::UnknownLexer(lang)) if lang == "ned"
        ));
    }

    #[test]
    fn test_css_classes() {
        assert_eq!(TokenKind::Keyword.css_class(), Some("k"));
        assert_eq!(TokenKind::Text.css_class(), None);
        assert!(TokenKind::CommentSingle.is_comment());
        assert!(!TokenKind::String.is_comment());
    }
}
