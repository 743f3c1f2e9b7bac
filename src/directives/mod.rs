//! Block directives expanded at the source level.
//!
//! A directive turns a `.. name:: args` block into replacement source for the
//! active output format, or leaves it for the renderer by returning `None`.

use log::debug;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use crate::error::{DocsError, Result};
use crate::format::OutputFormat;

pub mod code;
pub mod parser;
pub mod video;

pub use code::CodeBlockHighlighter;
pub use parser::{DirectiveParser, ParsedDirective, SourceLocation};
pub use video::{EmbedDirective, VideoDirective, VideoProvider};

pub trait Directive: Send + Sync {
    /// Primary name used in sources.
    fn name(&self) -> &str;

    /// Further names the directive answers to.
    fn aliases(&self) -> &[&'static str] {
        &[]
    }

    /// Options accepted in the field list; anything else is an error.
    fn valid_options(&self) -> &[&'static str];

    /// Replacement source (without the block's own indentation), or `None`
    /// to keep the block as written.
    fn run(&self, directive: &ParsedDirective, format: OutputFormat) -> Result<Option<String>>;
}

/// Build a [`DocsError::Directive`] for `directive`.
pub fn directive_error(directive: &ParsedDirective, message: impl Into<String>) -> DocsError {
    DocsError::Directive {
        directive: directive.name.clone(),
        file: directive.location.file.clone(),
        line: directive.location.line,
        message: message.into(),
    }
}

/// Indent every non-empty line of `text` by `indent`.
pub fn indent_block(text: &str, indent: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", indent, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A `.. raw:: html` block holding `html`.
pub fn raw_html_block(html: &str) -> String {
    format!(".. raw:: html\n\n{}", indent_block(html, "   "))
}

/// Directives whose body is shown verbatim, so markup inside it is never
/// expanded.
pub const LITERAL_DIRECTIVES: &[&str] = &[
    "code-block",
    "code",
    "sourcecode",
    "literalinclude",
    "parsed-literal",
];

#[derive(Default, Clone)]
pub struct DirectiveRegistry {
    directives: HashMap<String, Arc<dyn Directive>>,
}

impl DirectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the directive's name and aliases, replacing any
    /// earlier registration of the same name.
    pub fn register(&mut self, directive: Arc<dyn Directive>) {
        debug!("Registering directive '{}'", directive.name());
        for alias in directive.aliases() {
            self.directives.insert(alias.to_string(), directive.clone());
        }
        self.directives
            .insert(directive.name().to_string(), directive);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Directive>> {
        self.directives.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.directives.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Replace every registered directive block in `source`. Blocks nested
    /// inside an already replaced block are left to the outer directive.
    /// Markers inside literal content (`::` blocks and the bodies of
    /// [`LITERAL_DIRECTIVES`]) are text and stay as written.
    pub fn expand(&self, docname: &str, source: &str, format: OutputFormat) -> Result<String> {
        let parsed = DirectiveParser::new(docname).extract_directives(source);
        if parsed.is_empty() {
            return Ok(source.to_string());
        }

        let mut literal = DirectiveParser::literal_blocks(source);
        literal.extend(
            parsed
                .iter()
                .filter(|d| LITERAL_DIRECTIVES.contains(&d.name.as_str()))
                .map(|d| d.lines.start + 1..d.lines.end),
        );

        let mut replacements: Vec<(Range<usize>, String)> = Vec::new();
        let mut covered_until = 0;
        for directive in &parsed {
            let Some(handler) = self.get(&directive.name) else {
                continue;
            };
            if directive.lines.start < covered_until {
                continue;
            }
            let marker = directive.lines.start;
            if literal.iter().any(|block| block.contains(&marker)) {
                debug!(
                    "Leaving literal '{}' at {}:{}",
                    directive.name, docname, directive.location.line
                );
                continue;
            }

            let valid = handler.valid_options();
            if let Some(unknown) = directive
                .options
                .keys()
                .find(|option| !valid.contains(&option.as_str()))
            {
                return Err(directive_error(
                    directive,
                    format!("unknown option '{}'", unknown),
                ));
            }

            if let Some(replacement) = handler.run(directive, format)? {
                covered_until = directive.lines.end;
                replacements.push((
                    directive.lines.clone(),
                    indent_block(&replacement, &directive.indent),
                ));
            }
        }

        if replacements.is_empty() {
            return Ok(source.to_string());
        }
        debug!("Expanded {} directive(s) in '{}'", replacements.len(), docname);

        let lines: Vec<&str> = source.lines().collect();
        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        let mut next = 0;
        for (range, replacement) in replacements {
            out.extend(lines[next..range.start].iter().map(|l| l.to_string()));
            out.push(replacement);
            next = range.end;
        }
        out.extend(lines[next..].iter().map(|l| l.to_string()));

        let mut result = out.join("\n");
        if source.ends_with('\n') {
            result.push('\n');
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Directive for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn aliases(&self) -> &[&'static str] {
            &["shout"]
        }

        fn valid_options(&self) -> &[&'static str] {
            &["class"]
        }

        fn run(&self, directive: &ParsedDirective, format: OutputFormat) -> Result<Option<String>> {
            if format != OutputFormat::Html {
                return Ok(None);
            }
            Ok(Some(format!("{}\n\nmore", directive.content.to_uppercase())))
        }
    }

    fn registry() -> DirectiveRegistry {
        let mut registry = DirectiveRegistry::new();
        registry.register(Arc::new(Upper));
        registry
    }

    #[test]
    fn test_names_include_aliases() {
        assert_eq!(registry().names(), vec!["shout", "upper"]);
    }

    #[test]
    fn test_expand_replaces_block() {
        let source = "Before\n\n.. upper::\n\n   hello\n\nAfter\n";
        let out = registry().expand("doc", source, OutputFormat::Html).unwrap();
        assert_eq!(out, "Before\n\nHELLO\n\nmore\n\nAfter\n");
    }

    #[test]
    fn test_expand_keeps_indentation() {
        let source = ".. note::\n\n   .. shout::\n\n      hi\n";
        let out = registry().expand("doc", source, OutputFormat::Html).unwrap();
        assert_eq!(out, ".. note::\n\n   HI\n\n   more\n");
    }

    #[test]
    fn test_directive_may_decline() {
        let source = ".. upper::\n\n   hello\n";
        let out = registry().expand("doc", source, OutputFormat::Latex).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_unknown_directives_are_ignored() {
        let source = ".. figure:: a.png\n   :width: 10\n";
        let out = registry().expand("doc", source, OutputFormat::Html).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_markup_in_code_block_is_literal() {
        for name in ["code-block", "sourcecode"] {
            let source = format!(".. {}:: rst\n\n   .. upper::\n      :bogus: 1\n\n      hi\n", name);
            let out = registry().expand("doc", &source, OutputFormat::Html).unwrap();
            assert_eq!(out, source);
        }
    }

    #[test]
    fn test_markup_in_literal_paragraph_is_literal() {
        let source = "Write::\n\n   .. upper::\n      :bogus: 1\n\n.. upper::\n\n   hi\n";
        let out = registry().expand("doc", source, OutputFormat::Html).unwrap();
        assert_eq!(
            out,
            "Write::\n\n   .. upper::\n      :bogus: 1\n\nHI\n\nmore\n"
        );
    }

    #[test]
    fn test_unknown_option_is_an_error() {
        let source = "x\n\n.. upper::\n   :bogus: 1\n\n   hello\n";
        let err = registry().expand("guide", source, OutputFormat::Html).unwrap_err();
        assert_eq!(
            err.to_string(),
            "guide:3: upper directive: unknown option 'bogus'"
        );
    }
}
