//! Lexer for simulation configuration (`.ini`) files.

use lazy_static::lazy_static;
use std::sync::Arc;

use super::lexer::{Action, RegexLexer, Rule, Tokens, Transition};
use super::TokenKind;
use crate::error::Result;

lazy_static! {
    static ref INI_LEXER: Arc<RegexLexer> =
        Arc::new(build().expect("ini lexer rules are valid"));
}

fn build() -> Result<RegexLexer> {
    RegexLexer::builder("OMNeT++ Ini File")
        .filename("*.ini")
        .state(
            "root",
            vec![
                Rule::emit(r"\s+", TokenKind::Text)?,
                Rule::emit(r";.*?$", TokenKind::Comment)?,
                Rule::emit(r"\[.*?\]$", TokenKind::Keyword)?,
                Rule::new(
                    r"(.*?)(\s*)(=)(\s*)(.*?)$",
                    Action::ByGroups(vec![
                        TokenKind::NameAttribute,
                        TokenKind::Text,
                        TokenKind::Operator,
                        TokenKind::Text,
                        TokenKind::String,
                    ]),
                    Transition::Stay,
                )?,
                // Lines that are neither comment, section nor assignment.
                Rule::emit(r".+", TokenKind::Text)?,
            ],
        )
        .build()
}

/// Shared instance of the ini lexer.
pub fn lexer() -> Arc<RegexLexer> {
    INI_LEXER.clone()
}

/// Lazily tokenize ini source.
pub fn tokenize(text: &str) -> Tokens<'static, '_> {
    let lexer: &'static RegexLexer = &INI_LEXER;
    lexer.tokens(text)
}
