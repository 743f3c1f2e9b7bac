//! Output formats a build can target.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DocsError;

/// The closed set of output formats. Preprocessing and directive expansion
/// branch on this instead of comparing builder name strings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Latex,
    Texinfo,
    Man,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Latex => "latex",
            OutputFormat::Texinfo => "texinfo",
            OutputFormat::Man => "man",
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, OutputFormat::Html)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = DocsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "latex" => Ok(OutputFormat::Latex),
            "texinfo" => Ok(OutputFormat::Texinfo),
            "man" => Ok(OutputFormat::Man),
            other => Err(DocsError::Config(format!("unknown output format '{}'", other))),
        }
    }
}
