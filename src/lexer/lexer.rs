use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{errors::errors::{Error, ErrorImpl}, Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN};

use super::tokens::{InterpolationFragment, Literal, Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex) -> Result<(), Error>;

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

lazy_static! {
    // Order matters: longer operators must come before their prefixes.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern { regex: Regex::new("^[ \t\r]+").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new("^\n").unwrap(), handler: newline_handler },
        RegexPattern { regex: Regex::new("^\\{--[^}\n]*--\\}").unwrap(), handler: block_open_handler },
        RegexPattern { regex: Regex::new("^\\{/--[^}\n]*\\}").unwrap(), handler: block_close_handler },
        RegexPattern { regex: Regex::new("^--[^\n]*").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new("^[0-9]+(\\.[0-9]+)?").unwrap(), handler: number_handler },
        RegexPattern { regex: Regex::new("^\"").unwrap(), handler: string_handler },
        RegexPattern { regex: Regex::new("^`").unwrap(), handler: template_handler },
        RegexPattern { regex: Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*").unwrap(), handler: symbol_handler },
        RegexPattern { regex: Regex::new("^/>>>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::SpreadPipe, "/>>>") },
        RegexPattern { regex: Regex::new("^/>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Pipe, "/>") },
        RegexPattern { regex: Regex::new("^</>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Bidirectional, "</>") },
        RegexPattern { regex: Regex::new("^</").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::ReversePipe, "</") },
        RegexPattern { regex: Regex::new("^\\\\>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::ParallelPipe, "\\>") },
        RegexPattern { regex: Regex::new("^@>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::ReactivePipe, "@>") },
        RegexPattern { regex: Regex::new("^->").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Arrow, "->") },
        RegexPattern { regex: Regex::new("^<-").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::ReverseArrow, "<-") },
        RegexPattern { regex: Regex::new("^:=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Walrus, ":=") },
        RegexPattern { regex: Regex::new("^::").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::DoubleColon, "::") },
        RegexPattern { regex: Regex::new("^\\.\\.\\.").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Ellipsis, "...") },
        RegexPattern { regex: Regex::new("^==").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Equals, "==") },
        RegexPattern { regex: Regex::new("^!=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "!=") },
        RegexPattern { regex: Regex::new("^<=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=") },
        RegexPattern { regex: Regex::new("^>=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=") },
        RegexPattern { regex: Regex::new("^&&").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::AndAnd, "&&") },
        RegexPattern { regex: Regex::new("^\\|\\|").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Or, "||") },
        RegexPattern { regex: Regex::new("^\\+\\+").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::PlusPlus, "++") },
        RegexPattern { regex: Regex::new("^<").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Less, "<") },
        RegexPattern { regex: Regex::new("^>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Greater, ">") },
        RegexPattern { regex: Regex::new("^\\+").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Plus, "+") },
        RegexPattern { regex: Regex::new("^-").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Dash, "-") },
        RegexPattern { regex: Regex::new("^\\*").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Star, "*") },
        RegexPattern { regex: Regex::new("^/").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Slash, "/") },
        RegexPattern { regex: Regex::new("^%").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Percent, "%") },
        RegexPattern { regex: Regex::new("^=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Assignment, "=") },
        RegexPattern { regex: Regex::new("^!").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Not, "!") },
        RegexPattern { regex: Regex::new("^\\?").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Question, "?") },
        RegexPattern { regex: Regex::new("^:").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Colon, ":") },
        RegexPattern { regex: Regex::new("^\\.").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Dot, ".") },
        RegexPattern { regex: Regex::new("^,").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Comma, ",") },
        RegexPattern { regex: Regex::new("^;").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";") },
        RegexPattern { regex: Regex::new("^\\|").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Bar, "|") },
        RegexPattern { regex: Regex::new("^#").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Hash, "#") },
        RegexPattern { regex: Regex::new("^@").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::At, "@") },
        RegexPattern { regex: Regex::new("^\\[").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenBracket, "[") },
        RegexPattern { regex: Regex::new("^\\]").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseBracket, "]") },
        RegexPattern { regex: Regex::new("^\\{").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{") },
        RegexPattern { regex: Regex::new("^\\}").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}") },
        RegexPattern { regex: Regex::new("^\\(").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(") },
        RegexPattern { regex: Regex::new("^\\)").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")") },
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    pos: usize,
    line: u32,
    line_start: usize,
    file: Rc<String>,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            tokens: vec![],
            source,
            pos: 0,
            line: 1,
            line_start: 0,
            file: file_name,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn at(&self) -> char {
        self.remainder().chars().next().unwrap_or('\0')
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Position of the byte offset `pos` on the current line.
    pub fn position_at(&self, pos: usize) -> Position {
        let column = self.source[self.line_start..pos].chars().count() as u32 + 1;
        Position::new(self.line, column, Rc::clone(&self.file))
    }

    /// Span of the next `len` bytes.
    pub fn span_for(&self, len: usize) -> Span {
        Span {
            start: self.position_at(self.pos),
            end: self.position_at(self.pos + len),
        }
    }
}

fn matched_len(lexer: &Lexer, regex: &Regex) -> usize {
    regex.find(lexer.remainder()).map(|m| m.end()).unwrap_or(0)
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let matched = matched_len(lexer, regex);
    lexer.advance_n(matched);
    Ok(())
}

fn newline_handler(lexer: &mut Lexer, _regex: &Regex) -> Result<(), Error> {
    let span = lexer.span_for(1);
    lexer.push(MK_TOKEN!(TokenKind::Newline, String::from("\n"), span));
    lexer.advance_n(1);
    lexer.line += 1;
    lexer.line_start = lexer.pos;
    Ok(())
}

fn block_open_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let len = matched_len(lexer, regex);
    let raw = lexer.remainder()[..len].to_string();
    let label = raw[3..raw.len() - 3].trim().to_string();

    let span = lexer.span_for(len);
    lexer.push(MK_TOKEN!(TokenKind::BlockOpen, label.clone(), Literal::String(label), span));
    lexer.advance_n(len);
    Ok(())
}

fn block_close_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let len = matched_len(lexer, regex);
    let raw = lexer.remainder()[..len].to_string();

    let span = lexer.span_for(len);
    lexer.push(MK_TOKEN!(TokenKind::BlockClose, raw, span));
    lexer.advance_n(len);
    Ok(())
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let len = matched_len(lexer, regex);
    let matched = lexer.remainder()[..len].to_string();
    let span = lexer.span_for(len);

    let value: f64 = matched.parse().map_err(|_| {
        Error::new(
            ErrorImpl::NumberParseError {
                token: matched.clone(),
            },
            span.start.clone(),
        )
    })?;

    lexer.push(MK_TOKEN!(TokenKind::Number, matched, Literal::Number(value), span));
    lexer.advance_n(len);
    Ok(())
}

/// Decodes one escape sequence; `chars` is positioned just after the backslash.
fn decode_escape(chars: &mut std::iter::Peekable<std::str::Chars>, result: &mut String) {
    match chars.peek().copied() {
        Some('n') => {
            result.push('\n');
            chars.next();
        }
        Some('t') => {
            result.push('\t');
            chars.next();
        }
        Some('r') => {
            result.push('\r');
            chars.next();
        }
        Some('0') => {
            result.push('\0');
            chars.next();
        }
        Some(c @ ('\\' | '"' | '`' | '$')) => {
            result.push(c);
            chars.next();
        }
        Some('x') => {
            chars.next();
            let mut hex = String::new();
            for _ in 0..2 {
                match chars.peek() {
                    Some(ch) if ch.is_ascii_hexdigit() => {
                        hex.push(*ch);
                        chars.next();
                    }
                    _ => break,
                }
            }
            match u8::from_str_radix(&hex, 16) {
                Ok(byte) => result.push(byte as char),
                Err(_) => {
                    result.push_str("\\x");
                    result.push_str(&hex);
                }
            }
        }
        // Keep the backslash
        _ => result.push('\\'),
    }
}

/// Byte length of a quoted literal starting at the cursor, or `None` if it never closes.
fn quoted_len(remainder: &str, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (i, ch) in remainder.char_indices().skip(1) {
        match ch {
            '\n' => return None,
            '\\' if !escaped => escaped = true,
            c if c == quote && !escaped => return Some(i + c.len_utf8()),
            _ => escaped = false,
        }
    }
    None
}

fn string_handler(lexer: &mut Lexer, _regex: &Regex) -> Result<(), Error> {
    let Some(len) = quoted_len(lexer.remainder(), '"') else {
        return Err(Error::new(
            ErrorImpl::UnterminatedString {
                token: lexer.remainder().lines().next().unwrap_or("").to_string(),
            },
            lexer.position_at(lexer.pos),
        ));
    };

    let raw = lexer.remainder()[..len].to_string();
    let mut result = String::new();
    let mut chars = raw[1..len - 1].chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            decode_escape(&mut chars, &mut result);
        } else {
            result.push(ch);
        }
    }

    let span = lexer.span_for(len);
    lexer.push(MK_TOKEN!(TokenKind::String, raw, Literal::String(result), span));
    lexer.advance_n(len);
    Ok(())
}

fn template_handler(lexer: &mut Lexer, _regex: &Regex) -> Result<(), Error> {
    let unterminated = |lexer: &Lexer| {
        Error::new(
            ErrorImpl::UnterminatedString {
                token: lexer.remainder().lines().next().unwrap_or("").to_string(),
            },
            lexer.position_at(lexer.pos),
        )
    };

    let remainder = lexer.remainder().to_string();
    let mut fragments = vec![];
    let mut text = String::new();
    let mut chars = remainder.char_indices().skip(1).peekable();
    let mut end = None;

    while let Some((i, ch)) = chars.next() {
        match ch {
            '`' => {
                end = Some(i + 1);
                break;
            }
            '\n' => break,
            '\\' => {
                let mut rest = remainder[i + 1..].chars().peekable();
                let before = rest.clone().count();
                decode_escape(&mut rest, &mut text);
                for _ in 0..before - rest.count() {
                    chars.next();
                }
            }
            '$' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                if !text.is_empty() {
                    fragments.push(InterpolationFragment::Text(std::mem::take(&mut text)));
                }

                let mut depth = 1;
                let mut source = String::new();
                for (_, inner) in chars.by_ref() {
                    match inner {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        '\n' => return Err(unterminated(lexer)),
                        _ => (),
                    }
                    source.push(inner);
                }
                if depth != 0 {
                    return Err(unterminated(lexer));
                }
                fragments.push(InterpolationFragment::Source(source.trim().to_string()));
            }
            _ => text.push(ch),
        }
    }

    let Some(len) = end else {
        return Err(unterminated(lexer));
    };

    if !text.is_empty() {
        fragments.push(InterpolationFragment::Text(text));
    }

    let span = lexer.span_for(len);
    lexer.push(MK_TOKEN!(
        TokenKind::Template,
        remainder[..len].to_string(),
        Literal::Interpolated(fragments),
        span
    ));
    lexer.advance_n(len);
    Ok(())
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let len = matched_len(lexer, regex);
    let value = lexer.remainder()[..len].to_string();
    let span = lexer.span_for(len);

    let kind = RESERVED_LOOKUP
        .get(value.as_str())
        .copied()
        .unwrap_or(TokenKind::Identifier);
    lexer.push(MK_TOKEN!(kind, value, span));

    lexer.advance_n(len);
    Ok(())
}

pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source, file);

    while !lex.at_eof() {
        let pattern = PATTERNS
            .iter()
            .find(|pattern| pattern.regex.is_match(lex.remainder()));

        match pattern {
            Some(pattern) => (pattern.handler)(&mut lex, &pattern.regex)?,
            None => {
                return Err(Error::new(
                    ErrorImpl::UnrecognisedToken {
                        token: lex.at().to_string(),
                    },
                    lex.position_at(lex.pos),
                ))
            }
        }
    }

    let span = lex.span_for(0);
    lex.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), span));
    Ok(lex.tokens)
}
