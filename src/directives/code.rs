//! Colorizes code blocks written in one of the custom languages.

use log::debug;

use super::{raw_html_block, Directive, ParsedDirective};
use crate::error::Result;
use crate::format::OutputFormat;
use crate::highlighting::LexerRegistry;

/// Handles `code-block` (and its `code` / `sourcecode` spellings) when the
/// language has a registered lexer. Blocks in other languages, and all
/// blocks in non-HTML builds, are left to the renderer.
pub struct CodeBlockHighlighter {
    lexers: LexerRegistry,
}

impl CodeBlockHighlighter {
    pub fn new(lexers: LexerRegistry) -> Self {
        Self { lexers }
    }
}

impl Directive for CodeBlockHighlighter {
    fn name(&self) -> &str {
        "code-block"
    }

    fn aliases(&self) -> &[&'static str] {
        &["code", "sourcecode"]
    }

    fn valid_options(&self) -> &[&'static str] {
        &[
            "linenos",
            "lineno-start",
            "emphasize-lines",
            "caption",
            "name",
            "class",
            "dedent",
            "force",
        ]
    }

    fn run(&self, directive: &ParsedDirective, format: OutputFormat) -> Result<Option<String>> {
        if !format.is_html() {
            return Ok(None);
        }
        let Some(language) = directive.argument(0) else {
            return Ok(None);
        };
        if !self.lexers.contains(language) {
            return Ok(None);
        }

        debug!(
            "Highlighting {} block at {}:{}",
            language, directive.location.file, directive.location.line
        );
        let highlighted = self.lexers.highlight_html(language, &directive.content)?;

        let mut html = format!(
            "<div class=\"highlight-{} notranslate\">",
            html_escape::encode_double_quoted_attribute(language)
        );
        if let Some(caption) = directive.option("caption").filter(|c| !c.is_empty()) {
            html.push_str(&format!(
                "<div class=\"code-block-caption\"><span class=\"caption-text\">{}</span></div>",
                html_escape::encode_text(caption)
            ));
        }
        html.push_str(&highlighted);
        html.push_str("</div>");

        Ok(Some(raw_html_block(&html)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::DirectiveParser;

    fn run(source: &str, format: OutputFormat) -> Option<String> {
        let directive = DirectiveParser::new("doc")
            .extract_directives(source)
            .into_iter()
            .next()
            .unwrap();
        CodeBlockHighlighter::new(LexerRegistry::with_builtin_lexers())
            .run(&directive, format)
            .unwrap()
    }

    #[test]
    fn test_msg_block_is_highlighted() {
        let out = run(".. code-block:: msg\n\n   packet Foo // comment\n", OutputFormat::Html).unwrap();
        assert!(out.starts_with(".. raw:: html\n\n   <div class=\"highlight-msg notranslate\">"));
        assert!(out.contains("<span class=\"k\">packet</span>"));
        assert!(out.contains("<span class=\"c1\">// comment</span>"));
    }

    #[test]
    fn test_ini_alias_with_caption() {
        let out = run(
            ".. code:: ini\n   :caption: omnetpp.ini\n\n   [General]\n",
            OutputFormat::Html,
        )
        .unwrap();
        assert!(out.contains("<span class=\"caption-text\">omnetpp.ini</span>"));
        assert!(out.contains("<span class=\"k\">[General]</span>"));
    }

    #[test]
    fn test_other_languages_are_left_alone() {
        assert!(run(".. code-block:: cpp\n\n   int x;\n", OutputFormat::Html).is_none());
        assert!(run(".. code-block::\n\n   text\n", OutputFormat::Html).is_none());
    }

    #[test]
    fn test_non_html_is_left_alone() {
        assert!(run(".. code-block:: msg\n\n   packet Foo\n", OutputFormat::Latex).is_none());
    }
}
