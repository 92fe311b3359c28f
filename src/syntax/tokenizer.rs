//! Grammar-stack driven tokenizer.
//!
//! [`Tokenizer`] is a lazy iterator over [`Token`]s. At each step it asks the
//! grammar on top of its stack for a match at the current position, applies the
//! matched rule's pop/push, and emits the token. The whole input is covered with
//! no gaps; if nothing matches, iteration ends with a [`LexError`].

use crate::error::LexError;
use crate::syntax::grammar::Grammar;
use crate::syntax::token::Token;

/// Lazily tokenizes a source string.
#[derive(Debug)]
pub struct Tokenizer<'src> {
    source: &'src str,
    offset: usize,
    grammars: Vec<Grammar>,
    failed: bool,
}

impl<'src> Tokenizer<'src> {
    /// Start tokenizing `source` in the document grammar.
    pub fn new(source: &'src str) -> Self {
        Self::with_grammar(source, Grammar::Document)
    }

    /// Start tokenizing `source` in an arbitrary grammar.
    pub fn with_grammar(source: &'src str, grammar: Grammar) -> Self {
        Self {
            source,
            offset: 0,
            grammars: vec![grammar],
            failed: false,
        }
    }

    /// Current depth of the grammar stack.
    pub fn depth(&self) -> usize {
        self.grammars.len()
    }

    fn error(&mut self, grammar: Option<Grammar>) -> LexError {
        self.failed = true;
        LexError::new(self.source, self.offset, grammar.map_or("<none>", Grammar::name))
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.source.len() {
            return None;
        }
        let rest = &self.source[self.offset..];

        let Some(&grammar) = self.grammars.last() else {
            return Some(Err(self.error(None)));
        };
        let Some(found) = grammar.match_prefix(rest) else {
            return Some(Err(self.error(Some(grammar))));
        };

        // An empty stack with input left is reported on the next call.
        if found.rule.pop {
            self.grammars.pop();
        }
        if let Some(nested) = found.rule.push {
            self.grammars.push(nested);
        }

        let text = &rest[..found.len];
        self.offset += found.len;
        Some(Ok(Token::new(found.kind, text).with_groups(found.groups)))
    }
}

/// Tokenize the whole input eagerly.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Tokenizer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::token::TokenKind;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .expect("tokenizes")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_selector_statement() {
        use TokenKind::*;
        assert_eq!(
            kinds("a.link#home[href=\"/\"]{}"),
            vec![
                TagName, ClassName, IdName, LBracket, TagName, Equal, String, RBracket, LCurly,
                RCurly
            ]
        );
    }

    #[test]
    fn test_tokens_cover_input_without_gaps() {
        let input = "div.a {\n  content: \"x\"; // note\n}\n";
        let joined: std::string::String = tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(joined, input);
    }

    #[test]
    fn test_each_clause_pushes_and_pops() {
        use TokenKind::*;
        assert_eq!(
            kinds("@each $k, $v in map.get($site, 'links') {}"),
            vec![
                Each, Whitespace, Variable, Separator, Whitespace, Variable, Whitespace, In,
                Whitespace, MapGet, Whitespace, LCurly, RCurly
            ]
        );
    }

    #[test]
    fn test_raw_css_nesting_returns_to_document() {
        use TokenKind::*;
        assert_eq!(
            kinds("css { .a { color: red; } } p;"),
            vec![
                CssRawBegin, Whitespace, AnythingElse, LCurly, AnythingElse, Colon, AnythingElse,
                RCurly, RCurly, TagName, Semicolon
            ]
        );
    }

    #[test]
    fn test_grammar_depth_tracks_raw_css() {
        let mut tokenizer = Tokenizer::new("css { a { b } }");
        let mut depths = Vec::new();
        while let Some(token) = tokenizer.next() {
            token.unwrap();
            depths.push(tokenizer.depth());
        }
        // css {, ' ', a, ' { ', b, ' } ', '}'
        assert_eq!(depths, vec![2, 2, 2, 3, 3, 2, 1]);
    }

    #[test]
    fn test_import_func_groups() {
        let tokens = tokenize("@each $x in import(\"data/list.yml\"){}").unwrap();
        let func = tokens
            .iter()
            .find(|t| t.kind == TokenKind::ImportFunc)
            .unwrap();
        assert_eq!(func.group(0), Some("\"data/list.yml\""));
    }

    #[test]
    fn test_map_get_groups() {
        let tokens = tokenize("@each $x in map.get( $page , 'it\\'s' ){}").unwrap();
        let get = tokens.iter().find(|t| t.kind == TokenKind::MapGet).unwrap();
        assert_eq!(get.group(0), Some("$page"));
        assert_eq!(get.group(1), Some("it\\'s"));
    }

    #[test]
    fn test_lex_error_reports_position_and_rest() {
        let err = tokenize("div {\n  %bad\n}").unwrap_err();
        assert_eq!(err.offset, 8);
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 3);
        assert_eq!(err.grammar, "document");
        assert_eq!(err.remaining, "%bad\n}");
    }

    #[test]
    fn test_iteration_stops_after_error() {
        let mut tokenizer = Tokenizer::new("a %");
        assert!(tokenizer.next().unwrap().is_ok());
        assert!(tokenizer.next().unwrap().is_ok());
        assert!(tokenizer.next().unwrap().is_err());
        assert!(tokenizer.next().is_none());
    }

    #[test]
    fn test_keywords_without_their_syntax_are_tag_names() {
        use TokenKind::*;
        assert_eq!(
            kinds("map { area; }"),
            vec![TagName, Whitespace, LCurly, Whitespace, TagName, Semicolon, Whitespace, RCurly]
        );
        assert_eq!(kinds("map.x {}"), vec![TagName, ClassName, Whitespace, LCurly, RCurly]);
        assert_eq!(
            kinds("css .theme {}"),
            vec![TagName, Whitespace, ClassName, Whitespace, LCurly, RCurly]
        );
        assert_eq!(kinds("css p;"), vec![TagName, Whitespace, TagName, Semicolon]);
        assert_eq!(kinds("import {}"), vec![TagName, Whitespace, LCurly, RCurly]);
    }

    #[test]
    fn test_byte_order_mark_is_whitespace() {
        use TokenKind::*;
        assert_eq!(kinds("\u{feff}p;"), vec![Whitespace, TagName, Semicolon]);
        assert_eq!(kinds("p;\u{a0}hr;"), vec![TagName, Semicolon, Whitespace, TagName, Semicolon]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
    }
}
