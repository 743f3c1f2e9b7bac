//! Locates directive blocks in reStructuredText sources.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;

lazy_static! {
    static ref DIRECTIVE_REGEX: Regex =
        Regex::new(r"^([ \t]*)\.\.[ \t]+([a-zA-Z][a-zA-Z0-9_:-]*?)::(?:[ \t]+(.*?))?[ \t]*$")
            .unwrap();
    static ref OPTION_REGEX: Regex =
        Regex::new(r"^[ \t]+:([a-zA-Z][a-zA-Z0-9_-]*):(?:[ \t]+(.*?))?[ \t]*$").unwrap();
}

/// Where a directive starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    /// 1-based line of the `.. name::` marker.
    pub line: usize,
}

/// A directive block as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDirective {
    pub name: String,
    /// Whitespace-separated arguments after `::`.
    pub arguments: Vec<String>,
    /// Field-list options in source order; flags have an empty value.
    pub options: IndexMap<String, String>,
    /// Body with the common indentation removed.
    pub content: String,
    /// Indentation of the marker line.
    pub indent: String,
    /// 0-based line range covered by the block, trailing blank lines excluded.
    pub lines: Range<usize>,
    pub location: SourceLocation,
}

impl ParsedDirective {
    pub fn argument(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).map(String::as_str)
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }
}

/// Width in bytes of the leading spaces and tabs of `line`.
fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Exclusive end of the block starting at `start`: lines that are blank or
/// indented past `indent`, trailing blank lines excluded.
fn block_end(lines: &[&str], start: usize, indent: usize) -> usize {
    let mut end = start;
    for (index, line) in lines.iter().enumerate().skip(start) {
        if is_blank(line) {
            continue;
        }
        if indent_width(line) <= indent {
            break;
        }
        end = index + 1;
    }
    end
}

pub struct DirectiveParser {
    source_file: String,
}

impl DirectiveParser {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
        }
    }

    /// All directive blocks in `content`, including nested ones, in order of
    /// their marker lines.
    pub fn extract_directives(&self, content: &str) -> Vec<ParsedDirective> {
        let lines: Vec<&str> = content.lines().collect();
        let mut directives = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let Some(captures) = DIRECTIVE_REGEX.captures(line) else {
                continue;
            };
            let indent = captures.get(1).map_or("", |m| m.as_str());
            let name = captures.get(2).map_or("", |m| m.as_str());
            let arguments = captures
                .get(3)
                .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
                .unwrap_or_default();

            let (options, body, end) = Self::parse_body(&lines, index + 1, indent.len());

            directives.push(ParsedDirective {
                name: name.to_string(),
                arguments,
                options,
                content: body,
                indent: indent.to_string(),
                lines: index..end,
                location: SourceLocation {
                    file: self.source_file.clone(),
                    line: index + 1,
                },
            });
        }

        directives
    }

    /// Parse options and content following a marker at `marker_indent`.
    /// Returns the exclusive end line of the block.
    fn parse_body(
        lines: &[&str],
        start: usize,
        marker_indent: usize,
    ) -> (IndexMap<String, String>, String, usize) {
        let mut options = IndexMap::new();
        let end = block_end(lines, start, marker_indent);

        // Options directly follow the marker, before any blank line.
        let mut current = start;
        while current < end {
            match OPTION_REGEX.captures(lines[current]) {
                Some(captures) => {
                    let name = captures.get(1).map_or("", |m| m.as_str());
                    let value = captures.get(2).map_or("", |m| m.as_str());
                    options.insert(name.to_string(), value.to_string());
                    current += 1;
                }
                None => break,
            }
        }

        let body = &lines[current..end];
        let common = body
            .iter()
            .filter(|line| !is_blank(line))
            .map(|line| indent_width(line))
            .min()
            .unwrap_or(0);
        // Blank lines may hold non-ASCII whitespace, so they are not sliced.
        let mut content: Vec<&str> = body
            .iter()
            .map(|line| if is_blank(line) { "" } else { &line[common..] })
            .collect();
        while content.first().is_some_and(|line| line.is_empty()) {
            content.remove(0);
        }

        (options, content.join("\n"), end)
    }

    /// 0-based line ranges of literal blocks introduced by a paragraph
    /// ending in `::`. Directive markers ending in `::` do not open one.
    pub fn literal_blocks(content: &str) -> Vec<Range<usize>> {
        let lines: Vec<&str> = content.lines().collect();
        let mut blocks = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let text = line.trim();
            if !text.ends_with("::") || text.starts_with("..") {
                continue;
            }
            let start = index + 1;
            let end = block_end(&lines, start, indent_width(line));
            if end > start {
                blocks.push(start..end);
            }
        }

        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_with_options() {
        let source = "Intro\n\n.. youtube:: dQw4w9WgXcQ\n   :width: 640\n   :autoplay:\n\nAfter\n";
        let directives = DirectiveParser::new("index").extract_directives(source);
        assert_eq!(directives.len(), 1);

        let d = &directives[0];
        assert_eq!(d.name, "youtube");
        assert_eq!(d.arguments, vec!["dQw4w9WgXcQ"]);
        assert_eq!(d.option("width"), Some("640"));
        assert!(d.has_flag("autoplay"));
        assert_eq!(d.option("autoplay"), Some(""));
        assert_eq!(d.content, "");
        assert_eq!(d.lines, 2..5);
        assert_eq!(d.location.line, 3);
        assert_eq!(d.location.file, "index");
    }

    #[test]
    fn test_directive_content_is_dedented() {
        let source = ".. code-block:: msg\n\n   packet Foo\n   {\n       int x;\n   }\n\nText\n";
        let directives = DirectiveParser::new("doc").extract_directives(source);
        assert_eq!(directives[0].arguments, vec!["msg"]);
        assert_eq!(directives[0].content, "packet Foo\n{\n    int x;\n}");
        assert_eq!(directives[0].lines, 0..6);
    }

    #[test]
    fn test_nested_directive() {
        let source = ".. note::\n\n   .. vimeo:: 12345\n\n   Text\n";
        let directives = DirectiveParser::new("doc").extract_directives(source);
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[1].name, "vimeo");
        assert_eq!(directives[1].indent, "   ");
        assert_eq!(directives[1].lines, 2..3);
        assert_eq!(directives[0].lines, 0..5);
    }

    #[test]
    fn test_block_at_end_of_file() {
        let source = ".. video:: media/intro.mp4";
        let directives = DirectiveParser::new("doc").extract_directives(source);
        assert_eq!(directives[0].lines, 0..1);
        assert!(directives[0].options.is_empty());
    }

    #[test]
    fn test_blank_line_with_unicode_whitespace() {
        let source = ".. note::\n\n  text\n \u{a0}\n  more\n";
        let directives = DirectiveParser::new("doc").extract_directives(source);
        assert_eq!(directives[0].content, "text\n\nmore");
        assert_eq!(directives[0].lines, 0..5);
    }

    #[test]
    fn test_literal_blocks() {
        let source = "Example::\n\n   .. youtube:: abc\n\n   more\n\nText\n\n.. note::\n\n   body\n";
        assert_eq!(DirectiveParser::literal_blocks(source), vec![1..5]);
    }

    #[test]
    fn test_literal_marker_without_block() {
        assert!(DirectiveParser::literal_blocks("Trailing::\nNext\n").is_empty());
        assert!(DirectiveParser::literal_blocks("Trailing::").is_empty());
    }
}
