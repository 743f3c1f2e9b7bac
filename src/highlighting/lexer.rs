//! State-machine regex lexer.
//!
//! A lexer is a set of named states, each an ordered list of rules. At every
//! position the rules of the state on top of the stack are tried in order and
//! the first non-empty match wins. A rule emits either one token for the whole
//! match or one token per capture group, and may push or pop states.
//!
//! Lexing never fails: when no rule matches, a single character is emitted as
//! [`TokenKind::Text`]. A newline consumed this way also resets the stack to
//! the root state.

use regex::Regex;
use std::collections::VecDeque;

use super::{Token, TokenKind};
use crate::error::{DocsError, Result};

/// Name of the state every lexing pass starts in.
pub const ROOT_STATE: &str = "root";

/// What a matching rule emits.
#[derive(Debug, Clone)]
pub enum Action {
    /// One token spanning the whole match.
    Emit(TokenKind),
    /// One token per capture group, in group order. Groups that are empty or
    /// did not participate still produce an (empty) token.
    ByGroups(Vec<TokenKind>),
}

/// State change applied after a rule matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Push(&'static str),
    /// Push another instance of the current state (nesting).
    PushCurrent,
    /// Return to the state below; the root state is never popped.
    Pop,
}

/// A single lexing rule.
#[derive(Debug, Clone)]
pub struct Rule {
    regex: Regex,
    action: Action,
    transition: Transition,
}

impl Rule {
    /// Compile a rule. Patterns are matched anchored at the current position
    /// in multi-line mode, so `$` means end of line.
    pub fn new(pattern: &str, action: Action, transition: Transition) -> Result<Self> {
        let regex = Regex::new(&format!(r"\A(?m:{})", pattern)).map_err(|source| {
            DocsError::Pattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(Self {
            regex,
            action,
            transition,
        })
    }

    /// Rule emitting one `kind` token for the whole match, without a state
    /// change.
    pub fn emit(pattern: &str, kind: TokenKind) -> Result<Self> {
        Self::new(pattern, Action::Emit(kind), Transition::Stay)
    }
}

#[derive(Debug, Clone)]
struct State {
    name: &'static str,
    rules: Vec<Rule>,
}

#[derive(Debug, Clone, Copy)]
enum ResolvedTransition {
    Stay,
    Push(usize),
    PushCurrent,
    Pop,
}

/// An immutable, compiled lexer. Cheap to share between threads.
#[derive(Debug, Clone)]
pub struct RegexLexer {
    name: String,
    filenames: Vec<String>,
    states: Vec<State>,
    /// Transition of each rule, resolved to state indices.
    transitions: Vec<Vec<ResolvedTransition>>,
}

impl RegexLexer {
    /// Start describing a lexer with the human-readable `name`.
    pub fn builder(name: impl Into<String>) -> RegexLexerBuilder {
        RegexLexerBuilder {
            name: name.into(),
            filenames: Vec::new(),
            states: Vec::new(),
        }
    }

    /// Human-readable name, e.g. `OMNeT++ Ini File`. Not the name code
    /// blocks use; that is chosen when registering.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Glob patterns (e.g. `*.msg`) of files this lexer handles.
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// State names, root first, then in declaration order.
    pub fn state_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.states.iter().map(|s| s.name)
    }

    /// Start a new lexing pass over `text`. Each call is independent.
    pub fn tokens<'l, 't>(&'l self, text: &'t str) -> Tokens<'l, 't> {
        Tokens {
            lexer: self,
            text,
            pos: 0,
            stack: vec![0],
            pending: VecDeque::new(),
        }
    }

    /// Collect all tokens of `text`.
    pub fn tokenize<'t>(&self, text: &'t str) -> Vec<Token<'t>> {
        self.tokens(text).collect()
    }
}

/// Collects states for a [`RegexLexer`]; nothing is checked until
/// [`build`](Self::build).
pub struct RegexLexerBuilder {
    name: String,
    filenames: Vec<String>,
    states: Vec<State>,
}

impl RegexLexerBuilder {
    /// Add a glob pattern of file names the lexer handles.
    pub fn filename(mut self, pattern: impl Into<String>) -> Self {
        self.filenames.push(pattern.into());
        self
    }

    /// Add a state with its rules in priority order.
    pub fn state(mut self, name: &'static str, rules: Vec<Rule>) -> Self {
        self.states.push(State { name, rules });
        self
    }

    /// Resolve state references. The root state is moved to index 0.
    /// Fails when there is no root state or a rule pushes an unknown state.
    pub fn build(mut self) -> Result<RegexLexer> {
        let root = self
            .states
            .iter()
            .position(|s| s.name == ROOT_STATE)
            .ok_or_else(|| {
                DocsError::Config(format!("lexer '{}' has no '{}' state", self.name, ROOT_STATE))
            })?;
        let root_state = self.states.remove(root);
        self.states.insert(0, root_state);

        let mut transitions = Vec::with_capacity(self.states.len());
        for state in &self.states {
            let mut resolved = Vec::with_capacity(state.rules.len());
            for rule in &state.rules {
                resolved.push(match rule.transition {
                    Transition::Stay => ResolvedTransition::Stay,
                    Transition::PushCurrent => ResolvedTransition::PushCurrent,
                    Transition::Pop => ResolvedTransition::Pop,
                    Transition::Push(target) => {
                        let index = self
                            .states
                            .iter()
                            .position(|s| s.name == target)
                            .ok_or_else(|| {
                                DocsError::Config(format!(
                                    "lexer '{}': state '{}' pushes unknown state '{}'",
                                    self.name, state.name, target
                                ))
                            })?;
                        ResolvedTransition::Push(index)
                    }
                });
            }
            transitions.push(resolved);
        }

        Ok(RegexLexer {
            name: self.name,
            filenames: self.filenames,
            states: self.states,
            transitions,
        })
    }
}

/// Lazy token stream of one lexing pass.
pub struct Tokens<'l, 't> {
    lexer: &'l RegexLexer,
    text: &'t str,
    pos: usize,
    /// State indices; never empty, index 0 is root.
    stack: Vec<usize>,
    pending: VecDeque<Token<'t>>,
}

impl<'l, 't> Tokens<'l, 't> {
    /// Name of the state on top of the stack.
    pub fn current_state(&self) -> &'static str {
        let top = self.stack.last().copied().unwrap_or(0);
        self.lexer.states[top].name
    }

    /// Number of states on the stack; 1 when in the root state.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Consume one rule match, or one character, and queue its tokens.
    fn step(&mut self) {
        let lexer: &'l RegexLexer = self.lexer;
        let text: &'t str = self.text;
        let rest = &text[self.pos..];
        let state = self.stack.last().copied().unwrap_or(0);

        for (rule, transition) in lexer.states[state]
            .rules
            .iter()
            .zip(&lexer.transitions[state])
        {
            let consumed = match &rule.action {
                Action::Emit(kind) => match rule.regex.find(rest) {
                    Some(m) if m.end() > 0 => {
                        self.pending.push_back(Token::new(*kind, m.as_str()));
                        m.end()
                    }
                    _ => continue,
                },
                Action::ByGroups(kinds) => match rule.regex.captures(rest) {
                    Some(caps) if !caps[0].is_empty() => {
                        let end = caps[0].len();
                        let mut cursor = 0;
                        for (i, kind) in kinds.iter().enumerate() {
                            match caps.get(i + 1) {
                                Some(group) if group.start() >= cursor => {
                                    if group.start() > cursor {
                                        self.pending.push_back(Token::new(
                                            TokenKind::Text,
                                            &rest[cursor..group.start()],
                                        ));
                                    }
                                    self.pending.push_back(Token::new(*kind, group.as_str()));
                                    cursor = group.end();
                                }
                                _ => {
                                    self.pending
                                        .push_back(Token::new(*kind, &rest[cursor..cursor]));
                                }
                            }
                        }
                        if cursor < end {
                            self.pending
                                .push_back(Token::new(TokenKind::Text, &rest[cursor..end]));
                        }
                        end
                    }
                    _ => continue,
                },
            };

            match transition {
                ResolvedTransition::Stay => {}
                ResolvedTransition::Push(index) => self.stack.push(*index),
                ResolvedTransition::PushCurrent => self.stack.push(state),
                ResolvedTransition::Pop => {
                    if self.stack.len() > 1 {
                        self.stack.pop();
                    }
                }
            }
            self.pos += consumed;
            return;
        }

        // Catch-all
        let width = rest.chars().next().map(char::len_utf8).unwrap_or(1);
        if rest.starts_with('\n') {
            self.stack.truncate(1);
        }
        self.pending
            .push_back(Token::new(TokenKind::Text, &rest[..width]));
        self.pos += width;
    }
}

impl<'l, 't> Iterator for Tokens<'l, 't> {
    type Item = Token<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.pos >= self.text.len() {
                return None;
            }
            self.step();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brackets() -> RegexLexer {
        RegexLexer::builder("brackets")
            .state(
                "inner",
                vec![
                    Rule::new(r"\(", Action::Emit(TokenKind::Operator), Transition::PushCurrent)
                        .unwrap(),
                    Rule::new(r"\)", Action::Emit(TokenKind::Operator), Transition::Pop).unwrap(),
                    Rule::emit(r"[^()\n]+", TokenKind::String).unwrap(),
                ],
            )
            .state(
                "root",
                vec![
                    Rule::new(r"\(", Action::Emit(TokenKind::Operator), Transition::Push("inner"))
                        .unwrap(),
                    Rule::emit(r"[a-z]+", TokenKind::Keyword).unwrap(),
                ],
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_root_is_first_state() {
        let lexer = brackets();
        assert_eq!(lexer.state_names().next(), Some(ROOT_STATE));
    }

    #[test]
    fn test_push_and_pop() {
        let lexer = brackets();
        let mut tokens = lexer.tokens("ab(c(d)e)f");
        let collected: Vec<_> = tokens.by_ref().collect();
        assert_eq!(tokens.current_state(), ROOT_STATE);
        assert_eq!(tokens.depth(), 1);
        let kinds: Vec<_> = collected.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword,
                TokenKind::Operator,
                TokenKind::String,
                TokenKind::Operator,
                TokenKind::String,
                TokenKind::Operator,
                TokenKind::String,
                TokenKind::Operator,
                TokenKind::Keyword,
            ]
        );
    }

    #[test]
    fn test_catch_all_keeps_every_character() {
        let lexer = brackets();
        let input = "abc 123 ünï\n(x";
        let out: String = lexer.tokens(input).map(|t| t.text).collect();
        assert_eq!(out, input);
    }

    #[test]
    fn test_newline_fallback_resets_to_root() {
        let lexer = brackets();
        let mut tokens = lexer.tokens("(\nab");
        let collected: Vec<_> = tokens.by_ref().collect();
        assert_eq!(tokens.depth(), 1);
        // After the reset, "ab" is a root keyword rather than an inner string.
        assert_eq!(collected.last().unwrap().kind, TokenKind::Keyword);
    }

    #[test]
    fn test_unknown_push_target_is_rejected() {
        let result = RegexLexer::builder("broken")
            .state(
                "root",
                vec![Rule::new("x", Action::Emit(TokenKind::Text), Transition::Push("nowhere"))
                    .unwrap()],
            )
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let result = RegexLexer::builder("rootless")
            .state("other", vec![Rule::emit("x", TokenKind::Text).unwrap()])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            Rule::emit("(", TokenKind::Text),
            Err(DocsError::Pattern { .. })
        ));
    }
}
