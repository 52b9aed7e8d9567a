//! Lexical analysis for CSS source text
//!
//! Implements the tokenization algorithm of CSS Syntax Level 3. The lexer
//! never fails: malformed input is reported as an [`ErrorToken`] and replaced
//! with a best-effort recovery token, so the parser always receives a
//! well-formed stream ending in [`TokenType::Eof`].

use crate::diagnostics::{ErrorToken, ValidationCode};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

const MAX_ALLOWED_CODEPOINT: u32 = 0x10FFFF;
const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    /// The name would start an identifier, so it can be used as an id selector.
    Id,
    Unrestricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Integer,
    Number,
}

/// A numeric literal. `repr` is the exact source text of the number.
#[derive(Debug, Clone, PartialEq)]
pub struct Numeric {
    pub value: f64,
    pub repr: String,
    pub kind: NumericKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    Ident(String),
    Function(String),
    AtKeyword(String),
    Hash { value: String, kind: HashKind },
    String(String),
    Url(String),
    BadUrl,
    Delim(char),
    Number(Numeric),
    Percentage(Numeric),
    Dimension { number: Numeric, unit: String },
    Whitespace,
    Cdo,
    Cdc,
    Colon,
    Semicolon,
    Comma,
    OpenSquare,
    CloseSquare,
    OpenParen,
    CloseParen,
    OpenCurly,
    CloseCurly,
    IncludeMatch,
    DashMatch,
    PrefixMatch,
    SuffixMatch,
    SubstringMatch,
    Column,
    Eof,
}

impl TokenType {
    /// Stable name used in JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::Ident(_) => "IDENT",
            TokenType::Function(_) => "FUNCTION_TOKEN",
            TokenType::AtKeyword(_) => "AT_KEYWORD",
            TokenType::Hash { .. } => "HASH",
            TokenType::String(_) => "STRING",
            TokenType::Url(_) => "URL",
            TokenType::BadUrl => "BAD_URL",
            TokenType::Delim(_) => "DELIM",
            TokenType::Number(_) => "NUMBER",
            TokenType::Percentage(_) => "PERCENTAGE",
            TokenType::Dimension { .. } => "DIMENSION",
            TokenType::Whitespace => "WHITESPACE",
            TokenType::Cdo => "CDO",
            TokenType::Cdc => "CDC",
            TokenType::Colon => "COLON",
            TokenType::Semicolon => "SEMICOLON",
            TokenType::Comma => "COMMA",
            TokenType::OpenSquare => "OPEN_SQUARE",
            TokenType::CloseSquare => "CLOSE_SQUARE",
            TokenType::OpenParen => "OPEN_PAREN",
            TokenType::CloseParen => "CLOSE_PAREN",
            TokenType::OpenCurly => "OPEN_CURLY",
            TokenType::CloseCurly => "CLOSE_CURLY",
            TokenType::IncludeMatch => "INCLUDE_MATCH",
            TokenType::DashMatch => "DASH_MATCH",
            TokenType::PrefixMatch => "PREFIX_MATCH",
            TokenType::SuffixMatch => "SUFFIX_MATCH",
            TokenType::SubstringMatch => "SUBSTRING_MATCH",
            TokenType::Column => "COLUMN",
            TokenType::Eof => "EOF_TOKEN",
        }
    }

    pub fn is_delim(&self, c: char) -> bool {
        matches!(self, TokenType::Delim(d) if *d == c)
    }

    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, TokenType::Ident(v) if v.eq_ignore_ascii_case(name))
    }
}

/// CSS text for the token, close to how it was written.
impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Ident(v) => write!(f, "{}", v),
            TokenType::Function(v) => write!(f, "{}(", v),
            TokenType::AtKeyword(v) => write!(f, "@{}", v),
            TokenType::Hash { value, .. } => write!(f, "#{}", value),
            TokenType::String(v) => write!(f, "\"{}\"", v),
            TokenType::Url(v) => write!(f, "url({})", v),
            TokenType::BadUrl => write!(f, "url()"),
            TokenType::Delim(c) => write!(f, "{}", c),
            TokenType::Number(n) => write!(f, "{}", n.repr),
            TokenType::Percentage(n) => write!(f, "{}%", n.repr),
            TokenType::Dimension { number, unit } => write!(f, "{}{}", number.repr, unit),
            TokenType::Whitespace => write!(f, " "),
            TokenType::Cdo => write!(f, "<!--"),
            TokenType::Cdc => write!(f, "-->"),
            TokenType::Colon => write!(f, ":"),
            TokenType::Semicolon => write!(f, ";"),
            TokenType::Comma => write!(f, ","),
            TokenType::OpenSquare => write!(f, "["),
            TokenType::CloseSquare => write!(f, "]"),
            TokenType::OpenParen => write!(f, "("),
            TokenType::CloseParen => write!(f, ")"),
            TokenType::OpenCurly => write!(f, "{{"),
            TokenType::CloseCurly => write!(f, "}}"),
            TokenType::IncludeMatch => write!(f, "~="),
            TokenType::DashMatch => write!(f, "|="),
            TokenType::PrefixMatch => write!(f, "^="),
            TokenType::SuffixMatch => write!(f, "$="),
            TokenType::SubstringMatch => write!(f, "*="),
            TokenType::Column => write!(f, "||"),
            TokenType::Eof => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn new(token_type: TokenType, line: usize, col: usize) -> Self {
        Self {
            token_type,
            line,
            col,
        }
    }

    /// An end-of-input marker at this token's position.
    pub fn eof_at(&self) -> Token {
        Token::new(TokenType::Eof, self.line, self.col)
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.token_type, TokenType::Eof)
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self.token_type, TokenType::Whitespace)
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("line", &self.line)?;
        map.serialize_entry("col", &self.col)?;
        map.serialize_entry("tokenType", self.token_type.name())?;
        match &self.token_type {
            TokenType::Ident(v)
            | TokenType::Function(v)
            | TokenType::AtKeyword(v)
            | TokenType::String(v)
            | TokenType::Url(v) => {
                map.serialize_entry("value", v)?;
            }
            TokenType::Hash { value, kind } => {
                let kind = match kind {
                    HashKind::Id => "id",
                    HashKind::Unrestricted => "unrestricted",
                };
                map.serialize_entry("type", kind)?;
                map.serialize_entry("value", value)?;
            }
            TokenType::Delim(c) => {
                map.serialize_entry("value", &c.to_string())?;
            }
            TokenType::Number(n) => {
                map.serialize_entry("repr", &n.repr)?;
                map.serialize_entry("type", numeric_kind_name(n.kind))?;
                map.serialize_entry("value", &n.value)?;
            }
            TokenType::Percentage(n) => {
                map.serialize_entry("repr", &n.repr)?;
                map.serialize_entry("value", &n.value)?;
            }
            TokenType::Dimension { number, unit } => {
                map.serialize_entry("repr", &number.repr)?;
                map.serialize_entry("type", numeric_kind_name(number.kind))?;
                map.serialize_entry("unit", unit)?;
                map.serialize_entry("value", &number.value)?;
            }
            _ => {}
        }
        map.end()
    }
}

fn numeric_kind_name(kind: NumericKind) -> &'static str {
    match kind {
        NumericKind::Integer => "integer",
        NumericKind::Number => "number",
    }
}

fn is_whitespace(c: Option<char>) -> bool {
    matches!(c, Some('\n') | Some('\t') | Some(' '))
}

fn is_digit(c: Option<char>) -> bool {
    matches!(c, Some(c) if c.is_ascii_digit())
}

fn is_hex_digit(c: Option<char>) -> bool {
    matches!(c, Some(c) if c.is_ascii_hexdigit())
}

fn is_name_start_char(c: Option<char>) -> bool {
    matches!(c, Some(c) if c.is_ascii_alphabetic() || !c.is_ascii() || c == '_')
}

fn is_name_char(c: Option<char>) -> bool {
    is_name_start_char(c) || is_digit(c) || c == Some('-')
}

fn is_non_printable(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{E}'..='\u{1F}' | '\u{7F}')
}

fn is_valid_escape(c1: Option<char>, c2: Option<char>) -> bool {
    c1 == Some('\\') && c2 != Some('\n')
}

fn would_start_identifier(c1: Option<char>, c2: Option<char>, c3: Option<char>) -> bool {
    match c1 {
        Some('-') => is_name_start_char(c2) || c2 == Some('-') || is_valid_escape(c2, c3),
        Some('\\') => is_valid_escape(c1, c2),
        _ => is_name_start_char(c1),
    }
}

fn would_start_number(c1: Option<char>, c2: Option<char>, c3: Option<char>) -> bool {
    match c1 {
        Some('+') | Some('-') => is_digit(c2) || (c2 == Some('.') && is_digit(c3)),
        Some('.') => is_digit(c2),
        _ => is_digit(c1),
    }
}

/// Normalizes newlines and replaces NUL, per the CSS input stream rules.
fn preprocess(input: &str) -> Vec<char> {
    let mut chars = Vec::with_capacity(input.len());
    let mut iter = input.chars().peekable();
    while let Some(ch) = iter.next() {
        match ch {
            '\r' => {
                if iter.peek() == Some(&'\n') {
                    iter.next();
                }
                chars.push('\n');
            }
            '\u{C}' => chars.push('\n'),
            '\u{0}' => chars.push(REPLACEMENT_CHARACTER),
            _ => chars.push(ch),
        }
    }
    chars
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: preprocess(input),
            position: 0,
            line: 1,
            column: 0,
        }
    }

    /// Sets the document position of the first character, for stylesheets
    /// embedded in a larger document.
    pub fn with_start(mut self, line: usize, column: usize) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn tokenize(&mut self, errors: &mut Vec<ErrorToken>) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            self.consume_comments(errors);
            if self.is_at_end() {
                break;
            }
            let line = self.line;
            let column = self.column;
            let token_type = self.next_token(line, column, errors);
            tokens.push(Token::new(token_type, line, column));
        }

        tokens.push(Token::new(TokenType::Eof, self.line, self.column));
        log::trace!("Tokenized {} tokens", tokens.len());
        tokens
    }

    fn next_token(&mut self, line: usize, column: usize, errors: &mut Vec<ErrorToken>) -> TokenType {
        let ch = match self.peek() {
            Some(ch) => ch,
            None => return TokenType::Eof,
        };

        match ch {
            '\n' | '\t' | ' ' => {
                while is_whitespace(self.peek()) {
                    self.advance();
                }
                TokenType::Whitespace
            }
            '"' | '\'' => {
                self.advance();
                self.read_string(ch, line, column, errors)
            }
            '#' => {
                self.advance();
                if is_name_char(self.peek()) || is_valid_escape(self.peek(), self.peek_at(1)) {
                    let kind = if would_start_identifier(self.peek(), self.peek_at(1), self.peek_at(2)) {
                        HashKind::Id
                    } else {
                        HashKind::Unrestricted
                    };
                    TokenType::Hash {
                        value: self.read_name(),
                        kind,
                    }
                } else {
                    TokenType::Delim('#')
                }
            }
            '$' => self.read_match_or_delim(ch, TokenType::SuffixMatch),
            '*' => self.read_match_or_delim(ch, TokenType::SubstringMatch),
            '^' => self.read_match_or_delim(ch, TokenType::PrefixMatch),
            '~' => self.read_match_or_delim(ch, TokenType::IncludeMatch),
            '(' => self.single(TokenType::OpenParen),
            ')' => self.single(TokenType::CloseParen),
            '[' => self.single(TokenType::OpenSquare),
            ']' => self.single(TokenType::CloseSquare),
            '{' => self.single(TokenType::OpenCurly),
            '}' => self.single(TokenType::CloseCurly),
            ',' => self.single(TokenType::Comma),
            ':' => self.single(TokenType::Colon),
            ';' => self.single(TokenType::Semicolon),
            '+' | '.' => {
                if self.starts_with_number() {
                    self.read_numeric()
                } else {
                    self.single(TokenType::Delim(ch))
                }
            }
            '-' => {
                if self.starts_with_number() {
                    self.read_numeric()
                } else if self.peek_at(1) == Some('-') && self.peek_at(2) == Some('>') {
                    self.advance_by(3);
                    TokenType::Cdc
                } else if self.starts_with_identifier() {
                    self.read_identlike(line, column, errors)
                } else {
                    self.single(TokenType::Delim(ch))
                }
            }
            '<' => {
                if self.peek_at(1) == Some('!') && self.peek_at(2) == Some('-') && self.peek_at(3) == Some('-') {
                    self.advance_by(4);
                    TokenType::Cdo
                } else {
                    self.single(TokenType::Delim(ch))
                }
            }
            '@' => {
                self.advance();
                if would_start_identifier(self.peek(), self.peek_at(1), self.peek_at(2)) {
                    TokenType::AtKeyword(self.read_name())
                } else {
                    TokenType::Delim('@')
                }
            }
            '\\' => {
                if is_valid_escape(self.peek(), self.peek_at(1)) {
                    self.read_identlike(line, column, errors)
                } else {
                    self.advance();
                    errors.push(ErrorToken::style(
                        line,
                        column,
                        ValidationCode::CssSyntaxStrayTrailingBackslash,
                    ));
                    TokenType::Delim('\\')
                }
            }
            '|' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenType::DashMatch
                } else if self.peek() == Some('|') {
                    self.advance();
                    TokenType::Column
                } else {
                    TokenType::Delim('|')
                }
            }
            _ if ch.is_ascii_digit() => self.read_numeric(),
            _ if is_name_start_char(Some(ch)) => self.read_identlike(line, column, errors),
            _ => self.single(TokenType::Delim(ch)),
        }
    }

    fn consume_comments(&mut self, errors: &mut Vec<ErrorToken>) {
        while self.peek() == Some('/') && self.peek_at(1) == Some('*') {
            let line = self.line;
            let column = self.column;
            self.advance_by(2);
            loop {
                if self.is_at_end() {
                    errors.push(ErrorToken::style(line, column, ValidationCode::CssSyntaxUnterminatedComment));
                    return;
                }
                if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                    self.advance_by(2);
                    break;
                }
                self.advance();
            }
        }
    }

    fn read_match_or_delim(&mut self, ch: char, matched: TokenType) -> TokenType {
        self.advance();
        if self.peek() == Some('=') {
            self.advance();
            matched
        } else {
            TokenType::Delim(ch)
        }
    }

    fn single(&mut self, token_type: TokenType) -> TokenType {
        self.advance();
        token_type
    }

    fn read_string(&mut self, ending: char, line: usize, column: usize, errors: &mut Vec<ErrorToken>) -> TokenType {
        let mut value = String::new();

        loop {
            match self.peek() {
                None => {
                    errors.push(ErrorToken::style(line, column, ValidationCode::CssSyntaxEofInString));
                    return TokenType::String(value);
                }
                Some(ch) if ch == ending => {
                    self.advance();
                    return TokenType::String(value);
                }
                Some('\n') => {
                    // The newline is left for the following whitespace token.
                    errors.push(ErrorToken::style(line, column, ValidationCode::CssSyntaxUnterminatedString));
                    return TokenType::String(value);
                }
                Some('\\') => match self.peek_at(1) {
                    None => {
                        self.advance();
                    }
                    Some('\n') => {
                        self.advance_by(2);
                    }
                    Some(_) => {
                        self.advance();
                        value.push(self.read_escape());
                    }
                },
                Some(ch) => {
                    self.advance();
                    value.push(ch);
                }
            }
        }
    }

    /// Reads an escape; the backslash has already been consumed.
    fn read_escape(&mut self) -> char {
        let first = match self.advance() {
            Some(ch) => ch,
            None => return REPLACEMENT_CHARACTER,
        };

        if !first.is_ascii_hexdigit() {
            return first;
        }

        let mut digits = String::from(first);
        while digits.len() < 6 && is_hex_digit(self.peek()) {
            if let Some(ch) = self.advance() {
                digits.push(ch);
            }
        }
        if is_whitespace(self.peek()) {
            self.advance();
        }

        let code = u32::from_str_radix(&digits, 16).unwrap_or(0);
        if code == 0 || code > MAX_ALLOWED_CODEPOINT {
            return REPLACEMENT_CHARACTER;
        }
        char::from_u32(code).unwrap_or(REPLACEMENT_CHARACTER)
    }

    fn read_name(&mut self) -> String {
        let mut result = String::new();
        loop {
            let ch = self.peek();
            if is_name_char(ch) {
                self.advance();
                result.extend(ch);
            } else if is_valid_escape(ch, self.peek_at(1)) {
                self.advance();
                result.push(self.read_escape());
            } else {
                return result;
            }
        }
    }

    fn read_number(&mut self) -> Numeric {
        let mut repr = String::new();
        let mut kind = NumericKind::Integer;

        if matches!(self.peek(), Some('+') | Some('-')) {
            repr.extend(self.advance());
        }
        self.read_digits(&mut repr);

        if self.peek() == Some('.') && is_digit(self.peek_at(1)) {
            repr.extend(self.advance());
            kind = NumericKind::Number;
            self.read_digits(&mut repr);
        }

        let has_exponent = matches!(self.peek(), Some('e') | Some('E'));
        if has_exponent && is_digit(self.peek_at(1)) {
            repr.extend(self.advance());
            kind = NumericKind::Number;
            self.read_digits(&mut repr);
        } else if has_exponent
            && matches!(self.peek_at(1), Some('+') | Some('-'))
            && is_digit(self.peek_at(2))
        {
            repr.extend(self.advance());
            repr.extend(self.advance());
            kind = NumericKind::Number;
            self.read_digits(&mut repr);
        }

        let value = repr.parse::<f64>().unwrap_or(0.0);
        Numeric { value, repr, kind }
    }

    fn read_digits(&mut self, repr: &mut String) {
        while is_digit(self.peek()) {
            repr.extend(self.advance());
        }
    }

    fn read_numeric(&mut self) -> TokenType {
        let number = self.read_number();
        if would_start_identifier(self.peek(), self.peek_at(1), self.peek_at(2)) {
            let unit = self.read_name();
            TokenType::Dimension { number, unit }
        } else if self.peek() == Some('%') {
            self.advance();
            TokenType::Percentage(number)
        } else {
            TokenType::Number(number)
        }
    }

    fn read_identlike(&mut self, line: usize, column: usize, errors: &mut Vec<ErrorToken>) -> TokenType {
        let name = self.read_name();

        if name.eq_ignore_ascii_case("url") && self.peek() == Some('(') {
            self.advance();
            while is_whitespace(self.peek()) && is_whitespace(self.peek_at(1)) {
                self.advance();
            }
            let is_quote = |c: Option<char>| matches!(c, Some('"') | Some('\''));
            if is_quote(self.peek()) || (is_whitespace(self.peek()) && is_quote(self.peek_at(1))) {
                TokenType::Function(name)
            } else {
                self.read_url(line, column, errors)
            }
        } else if self.peek() == Some('(') {
            self.advance();
            TokenType::Function(name)
        } else {
            TokenType::Ident(name)
        }
    }

    fn read_url(&mut self, line: usize, column: usize, errors: &mut Vec<ErrorToken>) -> TokenType {
        let mut value = String::new();
        while is_whitespace(self.peek()) {
            self.advance();
        }

        loop {
            match self.peek() {
                None => return TokenType::Url(value),
                Some(')') => {
                    self.advance();
                    return TokenType::Url(value);
                }
                Some(ch) if is_whitespace(Some(ch)) => {
                    while is_whitespace(self.peek()) {
                        self.advance();
                    }
                    match self.peek() {
                        None => return TokenType::Url(value),
                        Some(')') => {
                            self.advance();
                            return TokenType::Url(value);
                        }
                        Some(_) => return self.bad_url(line, column, errors),
                    }
                }
                Some('"') | Some('\'') | Some('(') => {
                    self.advance();
                    return self.bad_url(line, column, errors);
                }
                Some(ch) if is_non_printable(ch) => {
                    self.advance();
                    return self.bad_url(line, column, errors);
                }
                Some('\\') => {
                    if is_valid_escape(self.peek(), self.peek_at(1)) {
                        self.advance();
                        value.push(self.read_escape());
                    } else {
                        self.advance();
                        return self.bad_url(line, column, errors);
                    }
                }
                Some(ch) => {
                    self.advance();
                    value.push(ch);
                }
            }
        }
    }

    /// Skips what is left of a malformed url, through the closing paren.
    fn bad_url(&mut self, line: usize, column: usize, errors: &mut Vec<ErrorToken>) -> TokenType {
        loop {
            match self.advance() {
                None | Some(')') => break,
                Some('\\') => {
                    if is_valid_escape(Some('\\'), self.peek()) {
                        self.read_escape();
                    }
                }
                Some(_) => {}
            }
        }
        errors.push(ErrorToken::style(line, column, ValidationCode::CssSyntaxBadUrl));
        TokenType::BadUrl
    }

    fn starts_with_number(&self) -> bool {
        would_start_number(self.peek(), self.peek_at(1), self.peek_at(2))
    }

    fn starts_with_identifier(&self) -> bool {
        would_start_identifier(self.peek(), self.peek_at(1), self.peek_at(2))
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}

/// Tokenizes `css`, reporting positions relative to `start_line`/`start_col`.
pub fn tokenize(css: &str, start_line: usize, start_col: usize, errors: &mut Vec<ErrorToken>) -> Vec<Token> {
    Lexer::new(css).with_start(start_line, start_col).tokenize(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(css: &str) -> (Vec<Token>, Vec<ErrorToken>) {
        let mut errors = Vec::new();
        let tokens = tokenize(css, 1, 0, &mut errors);
        (tokens, errors)
    }

    #[test]
    fn test_basic_tokens() {
        let (tokens, errors) = lex("foo { bar: baz; }");
        assert!(errors.is_empty());

        let types: Vec<&str> = tokens.iter().map(|t| t.token_type.name()).collect();
        assert_eq!(
            types,
            vec![
                "IDENT", "WHITESPACE", "OPEN_CURLY", "WHITESPACE", "IDENT", "COLON",
                "WHITESPACE", "IDENT", "SEMICOLON", "WHITESPACE", "CLOSE_CURLY", "EOF_TOKEN"
            ]
        );

        let cols: Vec<usize> = tokens.iter().map(|t| t.col).collect();
        assert_eq!(cols, vec![0, 3, 4, 5, 6, 9, 10, 11, 14, 15, 16, 17]);
        assert!(tokens.iter().all(|t| t.line == 1));
    }

    #[test]
    fn test_numbers() {
        let (tokens, errors) = lex("12 -3.5 +.5e2 10px 50% 1e-3");
        assert!(errors.is_empty());

        match &tokens[0].token_type {
            TokenType::Number(n) => {
                assert_eq!(n.value, 12.0);
                assert_eq!(n.kind, NumericKind::Integer);
            }
            _ => panic!("Expected number token"),
        }
        match &tokens[2].token_type {
            TokenType::Number(n) => {
                assert_eq!(n.value, -3.5);
                assert_eq!(n.repr, "-3.5");
                assert_eq!(n.kind, NumericKind::Number);
            }
            _ => panic!("Expected number token"),
        }
        match &tokens[4].token_type {
            TokenType::Number(n) => {
                assert_eq!(n.value, 50.0);
                assert_eq!(n.repr, "+.5e2");
            }
            _ => panic!("Expected number token"),
        }
        match &tokens[6].token_type {
            TokenType::Dimension { number, unit } => {
                assert_eq!(number.value, 10.0);
                assert_eq!(unit, "px");
            }
            _ => panic!("Expected dimension token"),
        }
        match &tokens[8].token_type {
            TokenType::Percentage(n) => assert_eq!(n.repr, "50"),
            _ => panic!("Expected percentage token"),
        }
        match &tokens[10].token_type {
            TokenType::Number(n) => assert_eq!(n.value, 0.001),
            _ => panic!("Expected number token"),
        }
    }

    #[test]
    fn test_unterminated_strings_with_start_position() {
        let mut errors = Vec::new();
        let tokens = tokenize("line 1 \"unterminated\nline 2 \"unterminated\n", 5, 5, &mut errors);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].code, ValidationCode::CssSyntaxUnterminatedString);
        assert_eq!((errors[0].line, errors[0].col), (5, 12));
        assert_eq!((errors[1].line, errors[1].col), (6, 7));
        assert_eq!(errors[1].params, vec!["style".to_string()]);

        let strings: Vec<&Token> = tokens
            .iter()
            .filter(|t| matches!(t.token_type, TokenType::String(_)))
            .collect();
        assert_eq!(strings.len(), 2);
        assert_eq!(strings[0].token_type, TokenType::String("unterminated".to_string()));
    }

    #[test]
    fn test_eof_in_string() {
        let (tokens, errors) = lex("'abc");
        assert_eq!(tokens[0].token_type, TokenType::String("abc".to_string()));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ValidationCode::CssSyntaxEofInString);
        assert_eq!((errors[0].line, errors[0].col), (1, 0));
    }

    #[test]
    fn test_stray_trailing_backslash() {
        let (tokens, errors) = lex("a trailing \\\nbackslash");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ValidationCode::CssSyntaxStrayTrailingBackslash);
        assert_eq!((errors[0].line, errors[0].col), (1, 11));
        assert_eq!(tokens[4].token_type, TokenType::Delim('\\'));
        assert_eq!(tokens.last().unwrap().line, 2);
    }

    #[test]
    fn test_unterminated_comment() {
        let (tokens, errors) = lex("h1 {color: red; } /*");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ValidationCode::CssSyntaxUnterminatedComment);
        assert_eq!((errors[0].line, errors[0].col), (1, 18));
        assert!(tokens.last().unwrap().is_eof());
    }

    #[test]
    fn test_bad_url() {
        let (tokens, errors) = lex("oh hi url(foo\"bar)");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ValidationCode::CssSyntaxBadUrl);
        assert_eq!((errors[0].line, errors[0].col), (1, 6));
        assert_eq!(tokens[4].token_type, TokenType::BadUrl);
        assert!(tokens[5].is_eof());
    }

    #[test]
    fn test_url_forms() {
        let (tokens, errors) = lex("url(http://a.com/x.png) url( \"y.png\" )");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].token_type, TokenType::Url("http://a.com/x.png".to_string()));
        assert_eq!(tokens[2].token_type, TokenType::Function("url".to_string()));
        assert_eq!(tokens[3].token_type, TokenType::Whitespace);
        assert_eq!(tokens[4].token_type, TokenType::String("y.png".to_string()));
        assert_eq!(tokens[6].token_type, TokenType::CloseParen);
    }

    #[test]
    fn test_hash_kinds() {
        let (tokens, _) = lex("#foo #123 # ");
        assert_eq!(
            tokens[0].token_type,
            TokenType::Hash { value: "foo".to_string(), kind: HashKind::Id }
        );
        assert_eq!(
            tokens[2].token_type,
            TokenType::Hash { value: "123".to_string(), kind: HashKind::Unrestricted }
        );
        assert_eq!(tokens[4].token_type, TokenType::Delim('#'));
    }

    #[test]
    fn test_match_and_cdo_tokens() {
        let (tokens, _) = lex("<!-- --> ~= |= ^= $= *= || @media -webkit-box");
        let types: Vec<&str> = tokens
            .iter()
            .filter(|t| !t.is_whitespace())
            .map(|t| t.token_type.name())
            .collect();
        assert_eq!(
            types,
            vec![
                "CDO", "CDC", "INCLUDE_MATCH", "DASH_MATCH", "PREFIX_MATCH", "SUFFIX_MATCH",
                "SUBSTRING_MATCH", "COLUMN", "AT_KEYWORD", "IDENT", "EOF_TOKEN"
            ]
        );
        assert_eq!(tokens[16].token_type, TokenType::AtKeyword("media".to_string()));
        assert_eq!(tokens[18].token_type, TokenType::Ident("-webkit-box".to_string()));
    }

    #[test]
    fn test_escapes_and_newline_normalization() {
        let (tokens, errors) = lex("\\66 oo\r\nb\\110000");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].token_type, TokenType::Ident("foo".to_string()));
        assert_eq!(tokens[2].line, 2);
        assert_eq!(tokens[2].col, 0);
        assert_eq!(tokens[2].token_type, TokenType::Ident("b\u{FFFD}".to_string()));
    }

    #[test]
    fn test_token_json() {
        let (tokens, _) = lex("10px");
        let json = serde_json::to_string(&tokens[0]).unwrap();
        assert_eq!(
            json,
            r#"{"line":1,"col":0,"tokenType":"DIMENSION","repr":"10","type":"integer","unit":"px","value":10.0}"#
        );
    }
}
