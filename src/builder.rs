use anyhow::{Context, Result};
use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app::{self, Extensions};
use crate::config::DocsConfig;
use crate::error::DocsError;
use crate::format::OutputFormat;
use crate::matching::{self, SourceFile};

lazy_static! {
    /// Bibliographic field at the top of a page (`:orphan:`, `:author: x`).
    static ref DOCINFO_REGEX: Regex = Regex::new(r"^:\w+:.*?").unwrap();
}

/// Source-level processing of a single document: source-read hooks, the
/// prolog, then directive expansion.
pub struct Pipeline {
    extensions: Extensions,
    prolog: Option<String>,
}

impl Pipeline {
    pub fn new(extensions: Extensions, prolog: Option<String>) -> Self {
        Self { extensions, prolog }
    }

    /// Register extensions for `config` and load the prolog file, if any.
    /// A configured prolog file that does not exist is skipped with a warning.
    pub fn from_config(config: &DocsConfig, source_dir: &Path) -> Result<Self> {
        let extensions = app::setup(config, source_dir)?;

        let prolog = match &config.rst_prolog {
            Some(path) => {
                let path = config.resolve(source_dir, path);
                if path.is_file() {
                    let text = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read prolog {}", path.display()))?;
                    Some(text)
                } else {
                    warn!("Prolog file {} not found, continuing without it", path.display());
                    None
                }
            }
            None => None,
        };

        Ok(Self::new(extensions, prolog))
    }

    pub fn process(
        &self,
        docname: &str,
        text: &str,
        format: OutputFormat,
    ) -> std::result::Result<String, DocsError> {
        let mut source = text.to_string();
        for hook in &self.extensions.source_read_hooks {
            debug!("Running hook '{}' on '{}'", hook.name(), docname);
            hook.on_source_read(docname, &mut source, format, &self.extensions.context)?;
        }

        if let Some(prolog) = &self.prolog {
            source = prepend_prolog(&source, prolog);
        }

        self.extensions.directives.expand(docname, &source, format)
    }
}

/// Insert `prolog` after any leading docinfo fields, separated by blank lines.
pub fn prepend_prolog(source: &str, prolog: &str) -> String {
    if prolog.is_empty() {
        return source.to_string();
    }

    let lines: Vec<&str> = source.lines().collect();
    let docinfo = lines
        .iter()
        .take_while(|line| DOCINFO_REGEX.is_match(line))
        .count();

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + prolog.lines().count() + 2);
    out.extend_from_slice(&lines[..docinfo]);
    if docinfo > 0 {
        out.push("");
    }
    out.extend(prolog.lines());
    out.push("");
    out.extend_from_slice(&lines[docinfo..]);

    let mut result = out.join("\n");
    if source.ends_with('\n') {
        result.push('\n');
    }
    result
}

#[derive(Debug, Clone)]
pub struct BuildStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub build_time: Duration,
    pub output_bytes: u64,
}

/// Runs the pipeline over every source document and writes the results.
pub struct DocsBuilder {
    config: DocsConfig,
    source_dir: PathBuf,
    output_dir: PathBuf,
    format: OutputFormat,
    parallel_jobs: usize,
    pipeline: Pipeline,
}

impl DocsBuilder {
    pub fn new(
        config: DocsConfig,
        source_dir: PathBuf,
        output_dir: PathBuf,
        format: OutputFormat,
    ) -> Result<Self> {
        let pipeline = Pipeline::from_config(&config, &source_dir)?;
        let parallel_jobs = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Ok(Self {
            config,
            source_dir,
            output_dir,
            format,
            parallel_jobs,
            pipeline,
        })
    }

    pub fn set_parallel_jobs(&mut self, jobs: usize) {
        self.parallel_jobs = jobs.max(1);
    }

    /// Process every document. All documents are attempted; if any failed,
    /// the build fails after reporting each error.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        info!(
            "Building {} sources from {} into {}",
            self.format,
            self.source_dir.display(),
            self.output_dir.display()
        );

        let sources = matching::find_sources(
            &self.source_dir,
            &self.config.source_suffix,
            &self.config.exclude_patterns,
        )
        .with_context(|| format!("Failed to scan {}", self.source_dir.display()))?;
        info!("Found {} source files", sources.len());

        if !sources.iter().any(|s| s.docname == self.config.master_doc) {
            warn!("Master document '{}' not found", self.config.master_doc);
        }

        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallel_jobs)
            .build()
            .context("Failed to create worker pool")?;
        let results: Vec<(String, std::result::Result<u64, DocsError>)> = pool.install(|| {
            sources
                .par_iter()
                .map(|source| (source.docname.clone(), self.process_file(source)))
                .collect()
        });

        let mut stats = BuildStats {
            files_processed: 0,
            files_failed: 0,
            build_time: Duration::ZERO,
            output_bytes: 0,
        };
        let mut first_error = None;
        for (docname, result) in results {
            match result {
                Ok(bytes) => {
                    stats.files_processed += 1;
                    stats.output_bytes += bytes;
                }
                Err(err) => {
                    error!("{}: {}", docname, err);
                    stats.files_failed += 1;
                    first_error.get_or_insert(err);
                }
            }
        }
        stats.build_time = start.elapsed();

        if let Some(err) = first_error {
            return Err(anyhow::Error::new(err).context(format!(
                "{} of {} documents failed",
                stats.files_failed,
                stats.files_failed + stats.files_processed
            )));
        }

        info!(
            "Processed {} documents ({} bytes) in {:.2?}",
            stats.files_processed, stats.output_bytes, stats.build_time
        );
        Ok(stats)
    }

    fn process_file(&self, source: &SourceFile) -> std::result::Result<u64, DocsError> {
        let text = fs::read_to_string(&source.path).map_err(|e| DocsError::io(&source.path, e))?;
        let output = self.pipeline.process(&source.docname, &text, self.format)?;

        let target = self.output_dir.join(&source.relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| DocsError::io(parent, e))?;
        }
        fs::write(&target, &output).map_err(|e| DocsError::io(&target, e))?;
        debug!("Wrote {}", target.display());
        Ok(output.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prolog_goes_first() {
        assert_eq!(
            prepend_prolog("Title\n=====\n", ".. |INET| replace:: INET"),
            ".. |INET| replace:: INET\n\nTitle\n=====\n"
        );
    }

    #[test]
    fn test_prolog_after_docinfo() {
        assert_eq!(
            prepend_prolog(":orphan:\n\nText\n", ".. |x| replace:: y"),
            ":orphan:\n\n.. |x| replace:: y\n\n\nText\n"
        );
    }

    #[test]
    fn test_empty_prolog() {
        assert_eq!(prepend_prolog("Text", ""), "Text");
    }
}
