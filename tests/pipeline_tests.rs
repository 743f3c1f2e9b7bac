//! End-to-end tests of the source pipeline and the builder.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use inet_docs::{DocsBuilder, DocsConfig, DocsError, OutputFormat, Pipeline};

const MACROS: &str = "{% macro issue(n) %}`#{{ n }} <https://github.com/inet-framework/inet/issues/{{ n }}>`__{% endmacro %}";

fn source_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path();
    fs::create_dir_all(base.join("_templates")).unwrap();
    fs::create_dir_all(base.join("users-guide")).unwrap();
    fs::create_dir_all(base.join("showcases/wireless")).unwrap();
    fs::write(base.join("_templates/global-macros.inc"), MACROS).unwrap();
    fs::write(base.join("global.rst"), ".. |INET| replace:: INET Framework").unwrap();
    fs::write(base.join("index.rst"), "Welcome to |INET| {{ version }}\n").unwrap();
    fs::write(
        base.join("users-guide/ch-video.rst"),
        "Videos\n======\n\nSee {{ opp.issue(42) }}.\n\n.. youtube:: abc123\n   :width: 320\n\nDone.\n",
    )
    .unwrap();
    fs::write(base.join("showcases/wireless/doc.rst"), "{{ broken").unwrap();
    temp_dir
}

fn config() -> DocsConfig {
    let mut config = DocsConfig::default();
    config
        .html
        .context
        .insert("version".to_string(), serde_json::json!("4.0.0"));
    config
}

#[test]
fn html_pipeline_renders_templates_and_directives() {
    let tree = source_tree();
    let pipeline = Pipeline::from_config(&config(), tree.path()).unwrap();
    let text = fs::read_to_string(tree.path().join("users-guide/ch-video.rst")).unwrap();

    let out = pipeline
        .process("users-guide/ch-video", &text, OutputFormat::Html)
        .unwrap();

    assert!(out.starts_with(".. |INET| replace:: INET Framework\n\n"));
    assert!(out.contains("See `#42 <https://github.com/inet-framework/inet/issues/42>`__."));
    assert!(out.contains(".. raw:: html\n\n   <div class=\"video-wrapper\">"));
    assert!(out.contains("width: 320px; height: 180px;"));
    assert!(out.ends_with("\nDone.\n"));
}

#[test]
fn latex_pipeline_keeps_template_syntax() {
    let tree = source_tree();
    let pipeline = Pipeline::from_config(&config(), tree.path()).unwrap();
    let text = fs::read_to_string(tree.path().join("users-guide/ch-video.rst")).unwrap();

    let out = pipeline
        .process("users-guide/ch-video", &text, OutputFormat::Latex)
        .unwrap();

    assert!(out.contains("See {{ opp.issue(42) }}."));
    assert!(out.contains("`Video <https://www.youtube.com/watch?v=abc123>`__"));
    assert!(!out.contains("raw:: html"));
}

#[test]
fn code_blocks_in_custom_languages_are_highlighted() {
    let tree = source_tree();
    let pipeline = Pipeline::from_config(&config(), tree.path()).unwrap();
    let text = ".. code-block:: OppIni\n\n   [General]\n   network = Wireless ; comment\n\nAfter\n";

    let out = pipeline.process("doc", text, OutputFormat::Html).unwrap();
    assert!(out.contains("<div class=\"highlight-OppIni notranslate\">"));
    assert!(out.contains("<span class=\"na\">network</span>"));
    assert!(out.ends_with("\nAfter\n"));
}

#[test]
fn example_markup_is_not_expanded() {
    let tree = source_tree();
    let pipeline = Pipeline::from_config(&config(), tree.path()).unwrap();
    let text = "Embed a video like this:\n\n.. code-block:: rst\n\n   .. youtube:: abc123\n\nOr without an id::\n\n   .. youtube::\n\nEnd\n";

    for format in [OutputFormat::Html, OutputFormat::Man] {
        let out = pipeline.process("doc", text, format).unwrap();
        assert!(out.contains("\n   .. youtube:: abc123\n"));
        assert!(out.contains("\n   .. youtube::\n"));
        assert!(!out.contains("raw:: html"));
        assert!(!out.contains("`Video <"));
    }
}

#[test]
fn unicode_whitespace_in_directive_body() {
    let tree = source_tree();
    let pipeline = Pipeline::from_config(&config(), tree.path()).unwrap();
    let text = ".. note::\n\n  text\n \u{a0}\n  more\n";

    let out = pipeline.process("doc", text, OutputFormat::Latex).unwrap();
    assert!(out.ends_with(text));
}

#[test]
fn missing_macro_file_fails_html_build() {
    let tree = source_tree();
    fs::remove_file(tree.path().join("_templates/global-macros.inc")).unwrap();
    let pipeline = Pipeline::from_config(&config(), tree.path()).unwrap();

    let err = pipeline
        .process("index", "plain text", OutputFormat::Html)
        .unwrap_err();
    assert!(matches!(err, DocsError::Template { .. }));

    // Non-HTML builds never touch the template engine.
    assert!(pipeline
        .process("index", "plain text", OutputFormat::Man)
        .is_ok());
}

#[test]
fn builder_writes_processed_sources() {
    let tree = source_tree();
    let output = TempDir::new().unwrap();

    let mut builder = DocsBuilder::new(
        config(),
        tree.path().to_path_buf(),
        output.path().to_path_buf(),
        OutputFormat::Html,
    )
    .unwrap();
    builder.set_parallel_jobs(2);
    let stats = builder.build().unwrap();

    // showcases/** and global.rst are excluded by default.
    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.files_failed, 0);
    assert!(!output.path().join("showcases").exists());
    assert!(!output.path().join("global.rst").exists());

    let index = fs::read_to_string(output.path().join("index.rst")).unwrap();
    assert!(index.contains("Welcome to |INET| 4.0.0"));
    assert!(Path::new(&output.path().join("users-guide/ch-video.rst")).is_file());
}

#[test]
fn builder_fails_when_a_document_fails() {
    let tree = source_tree();
    let output = TempDir::new().unwrap();
    let mut config = config();
    config.exclude_patterns.retain(|p| p != "showcases/**");

    let builder = DocsBuilder::new(
        config,
        tree.path().to_path_buf(),
        output.path().to_path_buf(),
        OutputFormat::Html,
    )
    .unwrap();
    let err = builder.build().unwrap_err();
    assert!(err.to_string().contains("1 of 3 documents failed"));

    // The other documents were still written.
    assert!(output.path().join("index.rst").is_file());
}

#[test]
fn config_file_drives_the_build() {
    let tree = source_tree();
    let config_path = tree.path().join("docs.yaml");
    fs::write(
        &config_path,
        "exclude_patterns: [\"showcases/**\", \"global.rst\", \"users-guide/**\"]\nrst_prolog: null\nhtml:\n  context:\n    version: \"5.0\"\n",
    )
    .unwrap();
    let config = DocsConfig::from_file(&config_path).unwrap();
    let output = TempDir::new().unwrap();

    let stats = DocsBuilder::new(
        config,
        tree.path().to_path_buf(),
        output.path().to_path_buf(),
        OutputFormat::Html,
    )
    .unwrap()
    .build()
    .unwrap();
    assert_eq!(stats.files_processed, 1);

    let index = fs::read_to_string(output.path().join("index.rst")).unwrap();
    assert_eq!(index, "\nWelcome to |INET| 5.0\n");
}
