//! Lexer for message-definition (`.msg`) files.
//!
//! Word runs are keywords, `//` and (nested) `/* */` comments are comments,
//! everything else is text. The explicit `extends` rule is shadowed by the
//! general word rule; both classify as keywords, so every word-like run is
//! highlighted the same way.

use lazy_static::lazy_static;
use std::sync::Arc;

use super::lexer::{Action, RegexLexer, Rule, Tokens, Transition};
use super::TokenKind;
use crate::error::Result;

lazy_static! {
    static ref MSG_LEXER: Arc<RegexLexer> =
        Arc::new(build().expect("message-definition lexer rules are valid"));
}

fn build() -> Result<RegexLexer> {
    RegexLexer::builder("msg")
        .filename("*.msg")
        .state(
            "root",
            vec![
                Rule::emit(r"extends", TokenKind::Keyword)?,
                Rule::emit(r"\w+", TokenKind::Keyword)?,
                Rule::emit(r"[^/]+", TokenKind::Text)?,
                Rule::new(
                    r"/\*",
                    Action::Emit(TokenKind::CommentMultiline),
                    Transition::Push("comment"),
                )?,
                Rule::emit(r"//.*?$", TokenKind::CommentSingle)?,
                Rule::emit(r"/", TokenKind::Text)?,
            ],
        )
        .state(
            "comment",
            vec![
                Rule::emit(r"[^*/]", TokenKind::CommentMultiline)?,
                Rule::new(
                    r"/\*",
                    Action::Emit(TokenKind::CommentMultiline),
                    Transition::PushCurrent,
                )?,
                Rule::new(
                    r"\*/",
                    Action::Emit(TokenKind::CommentMultiline),
                    Transition::Pop,
                )?,
                Rule::emit(r"[*/]", TokenKind::CommentMultiline)?,
            ],
        )
        .build()
}

/// Shared instance of the message-definition lexer.
pub fn lexer() -> Arc<RegexLexer> {
    MSG_LEXER.clone()
}

/// Lazily tokenize message-definition source.
pub fn tokenize(text: &str) -> Tokens<'static, '_> {
    let lexer: &'static RegexLexer = &MSG_LEXER;
    lexer.tokens(text)
}
