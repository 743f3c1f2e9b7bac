//! HTML output for token streams.

use super::{Token, TokenKind};

/// Render tokens as a highlighted `<pre>` block. Adjacent tokens of the same
/// kind are merged into one span.
pub fn format_html<'t>(tokens: impl IntoIterator<Item = Token<'t>>) -> String {
    let mut html = String::from("<div class=\"highlight\"><pre>");
    let mut run: Option<(TokenKind, String)> = None;

    for token in tokens {
        if token.text.is_empty() {
            continue;
        }
        match &mut run {
            Some((kind, text)) if *kind == token.kind => text.push_str(token.text),
            _ => {
                if let Some((kind, text)) = run.take() {
                    push_span(&mut html, kind, &text);
                }
                run = Some((token.kind, token.text.to_string()));
            }
        }
    }
    if let Some((kind, text)) = run {
        push_span(&mut html, kind, &text);
    }

    html.push_str("</pre></div>");
    html
}

fn push_span(html: &mut String, kind: TokenKind, text: &str) {
    let escaped = html_escape::encode_text(text);
    match kind.css_class() {
        Some(class) => {
            html.push_str(&format!("<span class=\"{}\">{}</span>", class, escaped));
        }
        None => html.push_str(&escaped),
    }
}
