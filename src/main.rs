use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use inet_docs::{DocsBuilder, DocsConfig, LexerRegistry, OutputFormat, Pipeline};

#[derive(Parser)]
#[command(name = "inet-docs")]
#[command(about = "Documentation build extensions for the INET Framework manual")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every source document into the output directory
    Build {
        /// Source directory
        #[arg(short, long, default_value = ".")]
        source: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "_build")]
        output: PathBuf,

        /// Output format the sources are prepared for
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
        format: OutputFormat,

        /// Number of parallel jobs
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// Print one processed source document
    Preprocess {
        file: PathBuf,

        /// Source directory the document belongs to
        #[arg(short, long)]
        source: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
        format: OutputFormat,
    },
    /// Highlight a message-definition or ini file
    Highlight {
        file: PathBuf,

        /// Language; defaults to the one matching the file name
        #[arg(short, long)]
        lang: Option<String>,

        /// Print HTML instead of a token listing
        #[arg(long)]
        html: bool,
    },
    /// Print the resolved configuration
    Config {
        #[arg(short, long, value_enum, default_value_t = DumpFormat::Toml)]
        format: DumpFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DumpFormat {
    Toml,
    Yaml,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Build {
            source,
            output,
            format,
            jobs,
        } => {
            let mut builder = DocsBuilder::new(config, source, output, format)?;
            if let Some(jobs) = jobs {
                builder.set_parallel_jobs(jobs);
            }
            let stats = builder.build()?;
            println!(
                "Processed {} documents in {:.2?}",
                stats.files_processed, stats.build_time
            );
        }
        Commands::Preprocess {
            file,
            source,
            format,
        } => {
            let source_dir = source
                .or_else(|| file.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from("."));
            let pipeline = Pipeline::from_config(&config, &source_dir)?;
            let docname = docname_for(&file, &source_dir);
            let text = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let output = pipeline.process(&docname, &text, format)?;
            print!("{}", output);
        }
        Commands::Highlight { file, lang, html } => {
            let registry = LexerRegistry::with_builtin_lexers();
            let lexer = match &lang {
                Some(lang) => registry.get(lang),
                None => registry.for_filename(&file),
            }
            .with_context(|| match &lang {
                Some(lang) => format!("No lexer registered for '{}'", lang),
                None => format!("No lexer matches {}", file.display()),
            })?;
            info!("Highlighting {} as {}", file.display(), lexer.name());

            let text = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            if html {
                println!("{}", inet_docs::highlighting::html::format_html(lexer.tokens(&text)));
            } else {
                for token in lexer.tokens(&text) {
                    println!("{:?}\t{:?}", token.kind, token.text);
                }
            }
        }
        Commands::Config { format } => {
            let text = match format {
                DumpFormat::Toml => toml::to_string_pretty(&config)?,
                DumpFormat::Yaml => serde_yaml::to_string(&config)?,
                DumpFormat::Json => serde_json::to_string_pretty(&config)?,
            };
            println!("{}", text);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<DocsConfig> {
    let config = match path {
        Some(path) => DocsConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => DocsConfig::from_env().context("Failed to load configuration")?,
    };
    info!("Configuration loaded for project '{}'", config.project.name);
    Ok(config)
}

/// Document name of `file` relative to `source_dir`, without its suffix.
fn docname_for(file: &Path, source_dir: &Path) -> String {
    let relative = file.strip_prefix(source_dir).unwrap_or(file);
    inet_docs::matching::normalize_path(&relative.with_extension(""))
}
