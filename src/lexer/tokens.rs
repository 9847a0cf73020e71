use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("let", TokenKind::Let);
        map.insert("maybe", TokenKind::Maybe);
        map.insert("and", TokenKind::And);
        map.insert("match", TokenKind::Match);
        map.insert("if", TokenKind::If);
        map.insert("await", TokenKind::Await);
        map.insert("return", TokenKind::Return);
        map.insert("context", TokenKind::Context);
        map.insert("provide", TokenKind::Provide);
        map.insert("decorator", TokenKind::Decorator);
        map.insert("use", TokenKind::Use);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);
        map.insert("null", TokenKind::Null);
        map.insert("input", TokenKind::Input);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Newline,
    Number,
    String,
    Template,
    Identifier,

    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,
    BlockOpen,  // {-- label --}
    BlockClose, // {/--}

    // Pipe family
    Pipe,          // />
    SpreadPipe,    // />>>
    ReversePipe,   // </
    ParallelPipe,  // \>
    ReactivePipe,  // @>
    Bidirectional, // </>

    Arrow,        // ->
    ReverseArrow, // <-
    Walrus,       // :=
    DoubleColon,  // ::
    Assignment,   // =
    Equals,       // ==
    Not,          // !
    NotEquals,    // !=

    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Or,
    AndAnd,

    Dot,
    Ellipsis,
    Semicolon,
    Colon,
    Question,
    Comma,
    Bar,
    Hash,
    At,

    PlusPlus,
    Plus,
    Dash,
    Slash,
    Star,
    Percent,

    // Reserved
    Let,
    Maybe,
    And,
    Match,
    If,
    Await,
    Return,
    Context,
    Provide,
    Decorator,
    Use,
    True,
    False,
    Null,
    Input,
}

impl TokenKind {
    pub fn is_pipe_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Pipe
                | TokenKind::SpreadPipe
                | TokenKind::ReversePipe
                | TokenKind::ParallelPipe
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One piece of a template string.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpolationFragment {
    Text(String),
    Source(String),
}

/// Decoded value of a literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Interpolated(Vec<InterpolationFragment>),
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub literal: Option<Literal>,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token {{\nkind: {},\nvalue: {}}}", self.kind, self.value)
    }
}

impl Token {
    pub fn line(&self) -> u32 {
        self.span.start.line
    }

    pub fn column(&self) -> u32 {
        self.span.start.column
    }

    fn is_one_of_many(&self, tokens: &[TokenKind]) -> bool {
        tokens.contains(&self.kind)
    }

    pub fn debug(&self) {
        if self.is_one_of_many(&[
            TokenKind::String,
            TokenKind::Template,
            TokenKind::Identifier,
            TokenKind::Number,
            TokenKind::BlockOpen,
        ]) {
            println!("{}:{} {} ({})", self.line(), self.column(), self.kind, self.value);
        } else {
            println!("{}:{} {} ()", self.line(), self.column(), self.kind);
        }
    }
}
