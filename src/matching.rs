//! Glob matching for source discovery and lexer file names.
//!
//! Patterns follow the documentation tool's exclusion syntax: `**` spans
//! directories, `*` and `?` stay within one path component, and `[seq]` /
//! `[!seq]` are character classes.

use lazy_static::lazy_static;
use log::debug;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{DocsError, Result};

lazy_static! {
    static ref PATTERN_CACHE: Mutex<HashMap<String, Regex>> = Mutex::new(HashMap::new());
}

/// Translate a glob into an anchored regular expression.
pub fn translate_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:[^/]+/)*");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push('[');
                    let mut k = i + 1;
                    if matches!(chars[k], '!' | '^') {
                        out.push('^');
                        k += 1;
                    }
                    for &c in &chars[k..end] {
                        if c == '\\' || c == '[' {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                    out.push(']');
                    i = end + 1;
                }
                None => {
                    out.push_str("\\[");
                    i += 1;
                }
            },
            c => {
                out.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }
    }

    out.push('$');
    out
}

/// Index of the `]` closing the class opened at `start`, if any. A `]`
/// directly after the opening bracket (or its negation) is literal.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if j < chars.len() && matches!(chars[j], '!' | '^') {
        j += 1;
    }
    if j < chars.len() && chars[j] == ']' {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

/// Compile a glob, reusing earlier compilations.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    let mut cache = PATTERN_CACHE.lock();
    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }

    let regex = Regex::new(&translate_pattern(pattern)).map_err(|source| DocsError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;
    cache.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

pub fn pattern_match(name: &str, pattern: &str) -> Result<bool> {
    Ok(compile_pattern(pattern)?.is_match(name))
}

/// Forward-slash form of a relative path.
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// A source file found under the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Path relative to the source directory, with forward slashes.
    pub relative: String,
    /// Relative path without its suffix, e.g. `users-guide/ch-intro`.
    pub docname: String,
}

/// Find all documents under `source_dir` whose name ends in one of
/// `suffixes` and that match none of `exclude_patterns`. Excluded
/// directories are not descended into. Results are sorted by relative path.
pub fn find_sources(
    source_dir: &Path,
    suffixes: &[String],
    exclude_patterns: &[String],
) -> Result<Vec<SourceFile>> {
    let excludes = exclude_patterns
        .iter()
        .map(|p| compile_pattern(p))
        .collect::<Result<Vec<_>>>()?;
    let is_excluded = |relative: &str| excludes.iter().any(|re| re.is_match(relative));

    let mut found = Vec::new();
    let walker = WalkDir::new(source_dir).follow_links(true).into_iter();
    for entry in walker.filter_entry(|entry| {
        entry.depth() == 0
            || entry
                .path()
                .strip_prefix(source_dir)
                .map(|rel| !is_excluded(&normalize_path(rel)))
                .unwrap_or(true)
    }) {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(source_dir).to_path_buf();
            let io = err
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            DocsError::io(path, io)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(source_dir) {
            Ok(rel) => normalize_path(rel),
            Err(_) => continue,
        };
        let Some(suffix) = suffixes.iter().find(|s| relative.ends_with(s.as_str())) else {
            continue;
        };

        debug!("Found source '{}'", relative);
        found.push(SourceFile {
            path: entry.path().to_path_buf(),
            docname: relative[..relative.len() - suffix.len()].to_string(),
            relative,
        });
    }

    found.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(found)
}
