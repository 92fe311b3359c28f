//! The three lexical grammars and their push/pop rules.
//!
//! A grammar is an ordered list of rules. At each position the first rule that
//! matches at the start of the remaining input wins, even if a later rule would
//! match more text. Nothing is skipped: whitespace and comments are ordinary
//! tokens.
//!
//! The document and raw CSS grammars overlap heavily (`map` is a tag name unless
//! it opens `map.get(...)`, `css` is a tag name unless `{` follows), so they are
//! tables of anchored regexes tried in order. The each-clause grammar has
//! pairwise disjoint rules and is a logos lexer.
//!
//! Context switches are data on the rule ([`Rule`]): `css {` pushes the raw CSS
//! grammar, which pushes itself on every nested `{` and pops on `}`; `@each`
//! pushes the each-clause grammar, which pops on `in`.

use std::sync::LazyLock;

use logos::Logos;
use regex::Regex;

use crate::syntax::token::TokenKind;

/// Whitespace as the source language sees it, byte order mark included.
const WS: &str = r"[\s\x{FEFF}]";

/// Lexical mode: which grammar is on top of the tokenizer's stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Top-level document syntax: selectors, strings, directives.
    Document,
    /// Variable list of an `@each` clause, up to `in`.
    EachClause,
    /// Verbatim capture inside `css { ... }`.
    RawCss,
}

/// What the tokenizer does with its grammar stack after a token matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rule {
    /// Pop the current grammar.
    pub pop: bool,
    /// Push a nested grammar (applied after `pop`).
    pub push: Option<Grammar>,
}

impl Rule {
    const STAY: Rule = Rule {
        pop: false,
        push: None,
    };

    const fn push(grammar: Grammar) -> Rule {
        Rule {
            pop: false,
            push: Some(grammar),
        }
    }

    const POP: Rule = Rule {
        pop: true,
        push: None,
    };
}

/// A successful match of one token at the start of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub kind: TokenKind,
    /// Length in bytes of the matched text.
    pub len: usize,
    pub rule: Rule,
    /// Capture groups of the matching rule, in order; unmatched groups are empty.
    pub groups: Vec<String>,
}

impl Grammar {
    /// Human-readable grammar name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Grammar::Document => "document",
            Grammar::EachClause => "each clause",
            Grammar::RawCss => "raw css",
        }
    }

    /// Match a single token at position 0 of `input`.
    ///
    /// Returns `None` if no rule of this grammar matches there.
    pub fn match_prefix(self, input: &str) -> Option<Match> {
        match self {
            Grammar::Document => first_match(&DOCUMENT, input),
            Grammar::EachClause => each_clause_match(input),
            Grammar::RawCss => first_match(&RAW_CSS, input),
        }
    }
}

// ---------------------------------------------------------------------------
// Ordered rule tables
// ---------------------------------------------------------------------------

struct LexRule {
    kind: TokenKind,
    rule: Rule,
    pattern: Regex,
}

/// Compile `(kind, rule, pattern)` triples, anchoring each pattern at the start.
///
/// `{ws}` in a pattern expands to the whitespace class.
fn table(rules: &[(TokenKind, Rule, &str)]) -> Vec<LexRule> {
    rules
        .iter()
        .map(|&(kind, rule, pattern)| LexRule {
            kind,
            rule,
            pattern: Regex::new(&format!("^(?:{})", pattern.replace("{ws}", WS)))
                .expect("static regex"),
        })
        .collect()
}

fn first_match(rules: &[LexRule], input: &str) -> Option<Match> {
    rules.iter().find_map(|lex| {
        let caps = lex.pattern.captures(input)?;
        let whole = caps.get(0)?;
        if whole.is_empty() {
            return None;
        }
        Some(Match {
            kind: lex.kind,
            len: whole.end(),
            rule: lex.rule,
            groups: caps
                .iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        })
    })
}

/// `#{$var}` or `#{map.get($var, 'key')}` embedded in a name.
const INTERP: &str = r"#\{(?:\$[A-Za-z0-9_-]+|map{ws}*\.{ws}*get{ws}*\({ws}*\$[A-Za-z0-9_-]+{ws}*,{ws}*'(?:[^'\r\n\\]|\\.)*'{ws}*\))\}";

static DOCUMENT: LazyLock<Vec<LexRule>> = LazyLock::new(|| {
    let name = format!(r"(?:[A-Za-z0-9_-]|{INTERP})+");
    let id = format!("#{name}");
    let class = format!(r"\.{name}");
    table(&[
        (
            TokenKind::MultilineString,
            Rule::STAY,
            r#""""(?:[^"\\]|\\.)*(?:"{1,2}(?:[^"\\]|\\.)+)*""""#,
        ),
        (TokenKind::String, Rule::STAY, r#""(?:[^"\r\n\\]|\\.)*""#),
        (TokenKind::Comment, Rule::STAY, r"//[^\r\n\x{2028}\x{2029}]*"),
        (TokenKind::CssRawBegin, Rule::push(Grammar::RawCss), r"css{ws}*\{"),
        (TokenKind::LParen, Rule::STAY, r"\("),
        (TokenKind::RParen, Rule::STAY, r"\)"),
        (TokenKind::LBracket, Rule::STAY, r"\["),
        (TokenKind::RBracket, Rule::STAY, r"\]"),
        (TokenKind::LCurly, Rule::STAY, r"\{"),
        (TokenKind::RCurly, Rule::STAY, r"\}"),
        (TokenKind::Equal, Rule::STAY, "="),
        (TokenKind::Semicolon, Rule::STAY, ";"),
        (TokenKind::Colon, Rule::STAY, ":"),
        (TokenKind::Import, Rule::STAY, "@import"),
        (
            TokenKind::ImportFunc,
            Rule::STAY,
            r#"import{ws}*\({ws}*("(?:[^"\r\n\\]|\\.)*"){ws}*\)"#,
        ),
        (TokenKind::Each, Rule::push(Grammar::EachClause), "@each"),
        (
            TokenKind::MapGet,
            Rule::STAY,
            r"map{ws}*\.{ws}*get{ws}*\({ws}*(\$[A-Za-z0-9_-]+){ws}*,{ws}*'((?:[^'\r\n\\]|\\.)*)'{ws}*\)",
        ),
        (TokenKind::IdName, Rule::STAY, id.as_str()),
        (TokenKind::ClassName, Rule::STAY, class.as_str()),
        (TokenKind::TagName, Rule::STAY, name.as_str()),
        (TokenKind::Whitespace, Rule::STAY, "{ws}+"),
    ])
});

static RAW_CSS: LazyLock<Vec<LexRule>> = LazyLock::new(|| {
    table(&[
        (TokenKind::Comment, Rule::STAY, r"//[^\r\n\x{2028}\x{2029}]*"),
        (
            TokenKind::String,
            Rule::STAY,
            r#""(?:[^"\r\n\\]|\\.)*"|'(?:[^'\r\n\\]|\\.)*'"#,
        ),
        (TokenKind::LCurly, Rule::push(Grammar::RawCss), r"{ws}*\{{ws}*"),
        (TokenKind::RCurly, Rule::POP, r"{ws}*\}{ws}*"),
        (TokenKind::Semicolon, Rule::STAY, "{ws}*;{ws}*"),
        (TokenKind::Colon, Rule::STAY, "{ws}*:{ws}*"),
        (TokenKind::Separator, Rule::STAY, "{ws}*,{ws}*"),
        (TokenKind::Whitespace, Rule::STAY, "{ws}+"),
        (TokenKind::AnythingElse, Rule::STAY, r"[^{}:,\s\x{FEFF}]+"),
    ])
});

// ---------------------------------------------------------------------------
// Each-clause grammar
// ---------------------------------------------------------------------------

/// Tokens between `@each` and `in`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum EachClauseToken {
    #[token("in")]
    In,

    #[regex(r"\$[A-Za-z0-9_-]+")]
    Variable,

    #[token(",")]
    Separator,

    #[regex(r"[\s\x{FEFF}]+")]
    Whitespace,
}

fn each_clause_match(input: &str) -> Option<Match> {
    let mut lexer = EachClauseToken::lexer(input);
    let token = lexer.next()?.ok()?;
    let (kind, rule) = match token {
        EachClauseToken::In => (TokenKind::In, Rule::POP),
        EachClauseToken::Variable => (TokenKind::Variable, Rule::STAY),
        EachClauseToken::Separator => (TokenKind::Separator, Rule::STAY),
        EachClauseToken::Whitespace => (TokenKind::Whitespace, Rule::STAY),
    };
    Some(Match {
        kind,
        len: lexer.span().end,
        rule,
        groups: Vec::new(),
    })
}
