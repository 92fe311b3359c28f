//! Lexical layer: tokens, grammars, the grammar-stack tokenizer, literals.

pub mod grammar;
pub mod literal;
pub mod token;
pub mod tokenizer;

pub use grammar::Grammar;
pub use token::{Token, TokenKind};
pub use tokenizer::{tokenize, Tokenizer};
