//! Video embedding directives: `youtube`, `vimeo` and `video`.
//!
//! HTML builds get an embedded player as a raw HTML block. Other formats get
//! a plain link to the video.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use super::{directive_error, raw_html_block, Directive, ParsedDirective};
use crate::error::Result;
use crate::format::OutputFormat;

lazy_static! {
    static ref LENGTH_REGEX: Regex =
        Regex::new(r"^(\d+(?:\.\d+)?)\s*(px|%|em|rem|ex|vw|vh|pt|cm|mm|in)?$").unwrap();
    static ref ASPECT_REGEX: Regex = Regex::new(r"^(\d+)\s*:\s*(\d+)$").unwrap();
    static ref VIDEO_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

const DEFAULT_ASPECT: (u32, u32) = (16, 9);

/// A CSS length; bare numbers are pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: String,
}

impl Length {
    pub fn parse(text: &str) -> Option<Self> {
        let captures = LENGTH_REGEX.captures(text.trim())?;
        let value = captures[1].parse().ok()?;
        let unit = captures.get(2).map_or("px", |m| m.as_str()).to_string();
        Some(Self { value, unit })
    }

    pub fn px(value: f64) -> Self {
        Self {
            value,
            unit: "px".to_string(),
        }
    }

    pub fn is_px(&self) -> bool {
        self.unit == "px"
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", format_number(self.value), self.unit)
    }
}

fn format_number(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

/// Placement and size options shared by all video directives.
#[derive(Debug, Clone, PartialEq)]
struct Geometry {
    width: Option<Length>,
    height: Option<Length>,
    aspect: (u32, u32),
    align: Option<String>,
}

impl Geometry {
    fn from_directive(directive: &ParsedDirective) -> Result<Self> {
        let length = |name: &str| -> Result<Option<Length>> {
            match directive.option(name) {
                None => Ok(None),
                Some(text) => Length::parse(text).map(Some).ok_or_else(|| {
                    directive_error(directive, format!("invalid {} '{}'", name, text))
                }),
            }
        };
        let width = length("width")?;
        let height = length("height")?;

        let aspect = match directive.option("aspect") {
            None => DEFAULT_ASPECT,
            Some(text) => ASPECT_REGEX
                .captures(text.trim())
                .and_then(|c| Some((c[1].parse().ok()?, c[2].parse().ok()?)))
                .filter(|&(w, h): &(u32, u32)| w > 0 && h > 0)
                .ok_or_else(|| directive_error(directive, format!("invalid aspect '{}'", text)))?,
        };

        let align = match directive.option("align") {
            None => None,
            Some(value @ ("left" | "center" | "right")) => Some(value.to_string()),
            Some(other) => {
                return Err(directive_error(
                    directive,
                    format!("align must be left, center or right, not '{}'", other),
                ))
            }
        };

        Ok(Self {
            width,
            height,
            aspect,
            align,
        })
    }

    fn class(&self, base: &str) -> String {
        match &self.align {
            Some(align) => format!("{} align-{}", base, align),
            None => base.to_string(),
        }
    }

    /// Fill in a missing pixel dimension from the aspect ratio.
    fn resolved_size(&self) -> (Option<Length>, Option<Length>) {
        let (w, h) = (self.aspect.0 as f64, self.aspect.1 as f64);
        match (&self.width, &self.height) {
            (Some(width), None) if width.is_px() => {
                (Some(width.clone()), Some(Length::px(width.value * h / w)))
            }
            (None, Some(height)) if height.is_px() => {
                (Some(Length::px(height.value * w / h)), Some(height.clone()))
            }
            (width, height) => (width.clone(), height.clone()),
        }
    }

    fn size_style(&self) -> String {
        let (width, height) = self.resolved_size();
        let mut style = String::new();
        if let Some(width) = width {
            style.push_str(&format!("width: {};", width));
        }
        if let Some(height) = height {
            if !style.is_empty() {
                style.push(' ');
            }
            style.push_str(&format!("height: {};", height));
        }
        style
    }
}

fn attr(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}

fn require_argument<'d>(directive: &'d ParsedDirective, what: &str) -> Result<&'d str> {
    if !directive.content.trim().is_empty() {
        return Err(directive_error(directive, "does not allow content"));
    }
    match directive.arguments.as_slice() {
        [single] => Ok(single.as_str()),
        [] => Err(directive_error(directive, format!("{} argument required", what))),
        _ => Err(directive_error(
            directive,
            format!("expects exactly one {} argument", what),
        )),
    }
}

/// Link paragraph used for non-HTML output.
fn link_paragraph(url: &str) -> String {
    format!("`Video <{}>`__", url)
}

/// Hosted video services with an embeddable player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoProvider {
    Youtube,
    Vimeo,
}

impl VideoProvider {
    pub fn directive_name(&self) -> &'static str {
        match self {
            VideoProvider::Youtube => "youtube",
            VideoProvider::Vimeo => "vimeo",
        }
    }

    pub fn embed_url(&self, id: &str) -> String {
        match self {
            VideoProvider::Youtube => format!("https://www.youtube.com/embed/{}", id),
            VideoProvider::Vimeo => format!("https://player.vimeo.com/video/{}", id),
        }
    }

    pub fn watch_url(&self, id: &str) -> String {
        match self {
            VideoProvider::Youtube => format!("https://www.youtube.com/watch?v={}", id),
            VideoProvider::Vimeo => format!("https://vimeo.com/{}", id),
        }
    }

    fn valid_id(&self, id: &str) -> bool {
        match self {
            VideoProvider::Youtube => VIDEO_ID_REGEX.is_match(id),
            VideoProvider::Vimeo => !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()),
        }
    }
}

/// `youtube` / `vimeo`: embed a hosted video by its id.
#[derive(Debug, Clone)]
pub struct EmbedDirective {
    provider: VideoProvider,
}

impl EmbedDirective {
    pub fn new(provider: VideoProvider) -> Self {
        Self { provider }
    }

    pub fn youtube() -> Self {
        Self::new(VideoProvider::Youtube)
    }

    pub fn vimeo() -> Self {
        Self::new(VideoProvider::Vimeo)
    }

    fn embed_html(&self, id: &str, geometry: &Geometry) -> String {
        let src = attr(&self.provider.embed_url(id));
        if geometry.width.is_none() && geometry.height.is_none() {
            let padding = geometry.aspect.1 as f64 * 100.0 / geometry.aspect.0 as f64;
            format!(
                "<div class=\"{}\" style=\"position: relative; padding-bottom: {}%; height: 0; overflow: hidden;\">\n\
                 <iframe src=\"{}\" style=\"position: absolute; top: 0; left: 0; width: 100%; height: 100%; border: 0;\" allowfullscreen=\"true\"></iframe>\n\
                 </div>",
                geometry.class("video-wrapper"),
                format_number(padding),
                src
            )
        } else {
            format!(
                "<div class=\"{}\">\n\
                 <iframe src=\"{}\" style=\"border: 0; {}\" allowfullscreen=\"true\"></iframe>\n\
                 </div>",
                geometry.class("video-wrapper"),
                src,
                geometry.size_style()
            )
        }
    }
}

impl Directive for EmbedDirective {
    fn name(&self) -> &str {
        self.provider.directive_name()
    }

    fn valid_options(&self) -> &[&'static str] {
        &["width", "height", "aspect", "align"]
    }

    fn run(&self, directive: &ParsedDirective, format: OutputFormat) -> Result<Option<String>> {
        let id = require_argument(directive, "video id")?;
        if !self.provider.valid_id(id) {
            return Err(directive_error(directive, format!("invalid video id '{}'", id)));
        }
        let geometry = Geometry::from_directive(directive)?;

        Ok(Some(match format {
            OutputFormat::Html => raw_html_block(&self.embed_html(id, &geometry)),
            OutputFormat::Latex | OutputFormat::Texinfo | OutputFormat::Man => {
                link_paragraph(&self.provider.watch_url(id))
            }
        }))
    }
}

/// `video`: play a video file with the browser's native player.
#[derive(Debug, Clone, Default)]
pub struct VideoDirective;

impl VideoDirective {
    pub fn new() -> Self {
        Self
    }

    /// MIME type for the file's extension, if it is a known video format.
    pub fn mime_type(path: &str) -> Option<&'static str> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let extension = path.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "mp4" | "m4v" => Some("video/mp4"),
            "webm" => Some("video/webm"),
            "ogg" | "ogv" => Some("video/ogg"),
            "mov" => Some("video/quicktime"),
            _ => None,
        }
    }

    fn video_html(&self, src: &str, mime: &str, directive: &ParsedDirective, geometry: &Geometry) -> String {
        let mut attributes = String::new();
        let style = geometry.size_style();
        if !style.is_empty() {
            attributes.push_str(&format!(" style=\"{}\"", style));
        }
        if !directive.has_flag("nocontrols") {
            attributes.push_str(" controls");
        }
        for flag in ["autoplay", "loop", "muted"] {
            if directive.has_flag(flag) {
                attributes.push(' ');
                attributes.push_str(flag);
            }
        }

        format!(
            "<div class=\"{}\">\n\
             <video{}>\n\
             <source src=\"{}\" type=\"{}\">\n\
             Your browser does not support the video tag.\n\
             </video>\n\
             </div>",
            geometry.class("video-wrapper"),
            attributes,
            attr(src),
            mime
        )
    }
}

impl Directive for VideoDirective {
    fn name(&self) -> &str {
        "video"
    }

    fn valid_options(&self) -> &[&'static str] {
        &["width", "height", "align", "autoplay", "loop", "muted", "nocontrols"]
    }

    fn run(&self, directive: &ParsedDirective, format: OutputFormat) -> Result<Option<String>> {
        let src = require_argument(directive, "video file")?;
        let mime = Self::mime_type(src).ok_or_else(|| {
            directive_error(directive, format!("unsupported video format '{}'", src))
        })?;
        for flag in ["autoplay", "loop", "muted", "nocontrols"] {
            if directive.option(flag).is_some_and(|value| !value.is_empty()) {
                return Err(directive_error(
                    directive,
                    format!("option '{}' is a flag and takes no value", flag),
                ));
            }
        }
        let geometry = Geometry::from_directive(directive)?;

        Ok(Some(match format {
            OutputFormat::Html => raw_html_block(&self.video_html(src, mime, directive, &geometry)),
            OutputFormat::Latex | OutputFormat::Texinfo | OutputFormat::Man => link_paragraph(src),
        }))
    }
}
