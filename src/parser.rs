//! Stylesheet parser
//!
//! Builds a [`Stylesheet`] from a token list following the CSS Syntax Level 3
//! parsing algorithms. How the block of each at-rule is read is decided by a
//! caller-supplied [`AtRuleSpec`]. Parsing never fails; structural problems are
//! reported as [`ErrorToken`]s and the parser recovers, treating EOF as the
//! close of anything still open.

use crate::ast::{AtRule, Declaration, QualifiedRule, Rule, Stylesheet};
use crate::constants::MAXIMUM_CSS_RECURSION;
use crate::diagnostics::{ErrorToken, ValidationCode};
use crate::lexer::{Token, TokenType};
use crate::utils::normalize_name;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the block of an at-rule is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    ParseAsRules,
    ParseAsDeclarations,
    /// The block is consumed, balanced, and dropped.
    ParseAsIgnore,
}

/// Block type per at-rule name. Names are unprefixed and lowercase.
pub type AtRuleSpec = HashMap<String, BlockType>;

/// Cursor over a token list. Reading past the end keeps returning an EOF
/// token, so callers never index out of bounds.
pub struct TokenStream<'a> {
    tokens: &'a [Token],
    current: usize,
    eof: Token,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let eof = match tokens.last() {
            Some(last) => last.eof_at(),
            None => Token::new(TokenType::Eof, 1, 0),
        };
        Self {
            tokens,
            current: 0,
            eof,
        }
    }

    pub fn current(&self) -> &Token {
        self.token_at(self.current)
    }

    pub fn next(&self) -> &Token {
        self.token_at(self.current + 1)
    }

    pub fn advance(&mut self) {
        if self.current < self.tokens.len() {
            self.current += 1;
        }
    }

    pub fn check(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(&self.current().token_type) == std::mem::discriminant(token_type)
    }

    pub fn is_at_end(&self) -> bool {
        self.current().is_eof()
    }

    fn token_at(&self, index: usize) -> &Token {
        self.tokens.get(index).unwrap_or(&self.eof)
    }
}

pub struct Parser<'s> {
    at_rule_spec: &'s AtRuleSpec,
    default_block_type: BlockType,
}

impl<'s> Parser<'s> {
    pub fn new(at_rule_spec: &'s AtRuleSpec, default_block_type: BlockType) -> Self {
        Self {
            at_rule_spec,
            default_block_type,
        }
    }

    pub fn block_type_for(&self, name: &str) -> BlockType {
        self.at_rule_spec
            .get(&normalize_name(name))
            .copied()
            .unwrap_or(self.default_block_type)
    }

    pub fn parse_stylesheet(&self, tokens: &[Token], errors: &mut Vec<ErrorToken>) -> Stylesheet {
        let mut stream = TokenStream::new(tokens);
        let (line, col) = (stream.current().line, stream.current().col);
        let rules = self.parse_a_list_of_rules(&mut stream, true, errors);
        report_unclosed_block(tokens, errors);
        let eof = match tokens.last() {
            Some(last) if last.is_eof() => last.clone(),
            Some(last) => last.eof_at(),
            None => Token::new(TokenType::Eof, line, col),
        };
        log::debug!("Parsed stylesheet with {} top-level rules", rules.len());
        Stylesheet { line, col, rules, eof }
    }

    fn parse_a_list_of_rules(
        &self,
        stream: &mut TokenStream,
        top_level: bool,
        errors: &mut Vec<ErrorToken>,
    ) -> Vec<Rule> {
        let mut rules = Vec::new();
        loop {
            match &stream.current().token_type {
                TokenType::Whitespace => stream.advance(),
                TokenType::Eof => return rules,
                TokenType::Cdo | TokenType::Cdc if top_level => stream.advance(),
                TokenType::AtKeyword(_) => rules.push(Rule::At(self.parse_an_at_rule(stream, errors))),
                _ => {
                    if let Some(rule) = self.parse_a_qualified_rule(stream, errors) {
                        rules.push(Rule::Qualified(rule));
                    }
                }
            }
        }
    }

    fn parse_an_at_rule(&self, stream: &mut TokenStream, errors: &mut Vec<ErrorToken>) -> AtRule {
        let start = stream.current().clone();
        let name = match &start.token_type {
            TokenType::AtKeyword(name) => name.clone(),
            _ => String::new(),
        };
        stream.advance();

        let mut rule = AtRule {
            line: start.line,
            col: start.col,
            name,
            prelude: Vec::new(),
            rules: Vec::new(),
            declarations: Vec::new(),
        };

        loop {
            let current = stream.current().clone();
            match current.token_type {
                TokenType::Semicolon => {
                    rule.prelude.push(current);
                    stream.advance();
                    return rule;
                }
                TokenType::Eof => {
                    rule.prelude.push(current);
                    return rule;
                }
                TokenType::OpenCurly => {
                    rule.prelude.push(current.eof_at());
                    let contents = extract_a_simple_block(stream, errors);
                    match self.block_type_for(&rule.name) {
                        BlockType::ParseAsRules => {
                            let mut inner = TokenStream::new(&contents);
                            rule.rules = self.parse_a_list_of_rules(&mut inner, false, errors);
                        }
                        BlockType::ParseAsDeclarations => {
                            rule.declarations = self.parse_a_list_of_declarations(&contents, errors);
                        }
                        BlockType::ParseAsIgnore => {
                            log::trace!("Ignoring block of @{}", rule.name);
                        }
                    }
                    return rule;
                }
                _ => {
                    consume_or_report(stream, &mut rule.prelude, errors);
                }
            }
        }
    }

    /// Returns `None` when EOF is reached before the rule's block.
    fn parse_a_qualified_rule(
        &self,
        stream: &mut TokenStream,
        errors: &mut Vec<ErrorToken>,
    ) -> Option<QualifiedRule> {
        let start = stream.current();
        let mut rule = QualifiedRule {
            line: start.line,
            col: start.col,
            prelude: Vec::new(),
            declarations: Vec::new(),
        };

        loop {
            let current = stream.current();
            match current.token_type {
                TokenType::Eof => {
                    errors.push(ErrorToken::style(
                        rule.line,
                        rule.col,
                        ValidationCode::CssSyntaxEofInPreludeOfQualifiedRule,
                    ));
                    return None;
                }
                TokenType::OpenCurly => {
                    rule.prelude.push(current.eof_at());
                    let contents = extract_a_simple_block(stream, errors);
                    rule.declarations = self.parse_a_list_of_declarations(&contents, errors);
                    return Some(rule);
                }
                _ => {
                    consume_or_report(stream, &mut rule.prelude, errors);
                }
            }
        }
    }

    pub fn parse_a_list_of_declarations(&self, tokens: &[Token], errors: &mut Vec<ErrorToken>) -> Vec<Declaration> {
        let mut stream = TokenStream::new(tokens);
        let mut declarations = Vec::new();

        loop {
            let current = stream.current();
            match &current.token_type {
                TokenType::Whitespace | TokenType::Semicolon => stream.advance(),
                TokenType::Eof => return declarations,
                TokenType::AtKeyword(_) => {
                    // Only declarations are allowed here; the at-rule is parsed
                    // to keep the stream balanced, then reported.
                    let at_rule = self.parse_an_at_rule(&mut stream, errors);
                    errors.push(ErrorToken::new(
                        at_rule.line,
                        at_rule.col,
                        ValidationCode::CssSyntaxInvalidAtRule,
                        vec!["style".to_string(), at_rule.name],
                    ));
                }
                TokenType::Ident(_) => {
                    if let Some(declaration) = parse_a_declaration(&mut stream, errors) {
                        declarations.push(declaration);
                    }
                }
                _ => {
                    errors.push(ErrorToken::style(
                        current.line,
                        current.col,
                        ValidationCode::CssSyntaxInvalidDeclaration,
                    ));
                    let mut skipped = Vec::new();
                    while !matches!(stream.current().token_type, TokenType::Semicolon | TokenType::Eof) {
                        consume_or_report(&mut stream, &mut skipped, errors);
                    }
                }
            }
        }
    }
}

fn parse_a_declaration(stream: &mut TokenStream, errors: &mut Vec<ErrorToken>) -> Option<Declaration> {
    let start = stream.current().clone();
    let name = match &start.token_type {
        TokenType::Ident(name) => name.clone(),
        _ => return None,
    };
    stream.advance();

    while stream.current().is_whitespace() {
        stream.advance();
    }

    if !stream.check(&TokenType::Colon) {
        errors.push(ErrorToken::style(
            start.line,
            start.col,
            ValidationCode::CssSyntaxIncompleteDeclaration,
        ));
        while !matches!(stream.current().token_type, TokenType::Semicolon | TokenType::Eof) {
            stream.advance();
        }
        return None;
    }
    stream.advance();

    let mut value = Vec::new();
    while !matches!(stream.current().token_type, TokenType::Semicolon | TokenType::Eof) {
        consume_or_report(stream, &mut value, errors);
    }
    value.push(stream.current().eof_at());

    let important = strip_important(&mut value);

    Some(Declaration {
        line: start.line,
        col: start.col,
        name,
        value,
        important,
    })
}

/// Removes a trailing `! important` from a value that ends in EOF.
fn strip_important(value: &mut Vec<Token>) -> bool {
    let mut found_important = false;
    let last = value.len().saturating_sub(1);

    for i in (0..last).rev() {
        match &value[i].token_type {
            TokenType::Whitespace => continue,
            TokenType::Ident(ident) if !found_important && ident.eq_ignore_ascii_case("important") => {
                found_important = true;
            }
            TokenType::Delim('!') if found_important => {
                value.drain(i..last);
                return true;
            }
            _ => break,
        }
    }
    false
}

/// Consumes one component value into `out`; deep nesting is reported and the
/// offending token is skipped.
fn consume_or_report(stream: &mut TokenStream, out: &mut Vec<Token>, errors: &mut Vec<ErrorToken>) {
    if !consume_a_component_value(stream, out, 0) {
        let current = stream.current();
        errors.push(ErrorToken::style(current.line, current.col, ValidationCode::CssExcessivelyNested));
        stream.advance();
    }
}

fn consume_a_component_value(stream: &mut TokenStream, out: &mut Vec<Token>, depth: usize) -> bool {
    if depth > MAXIMUM_CSS_RECURSION {
        return false;
    }
    match stream.current().token_type {
        TokenType::OpenCurly | TokenType::OpenSquare | TokenType::OpenParen => {
            consume_a_simple_block(stream, out, depth + 1)
        }
        TokenType::Function(_) => consume_a_function(stream, out, depth + 1),
        _ => {
            out.push(stream.current().clone());
            stream.advance();
            true
        }
    }
}

fn mirror_of(token_type: &TokenType) -> TokenType {
    match token_type {
        TokenType::OpenCurly => TokenType::CloseCurly,
        TokenType::OpenSquare => TokenType::CloseSquare,
        _ => TokenType::CloseParen,
    }
}

/// Reports the outermost block or function still open when the input ends.
/// EOF closes it and everything nested in it, so one error covers them all.
/// Close tokens only match the innermost open one, as during consumption.
fn report_unclosed_block(tokens: &[Token], errors: &mut Vec<ErrorToken>) {
    let mut open: Vec<&Token> = Vec::new();
    for token in tokens {
        match &token.token_type {
            TokenType::OpenCurly | TokenType::OpenSquare | TokenType::OpenParen | TokenType::Function(_) => {
                open.push(token)
            }
            TokenType::CloseCurly | TokenType::CloseSquare | TokenType::CloseParen => {
                if open.last().map_or(false, |top| mirror_of(&top.token_type) == token.token_type) {
                    open.pop();
                }
            }
            TokenType::Eof => break,
            _ => {}
        }
    }
    if let Some(outermost) = open.first() {
        errors.push(ErrorToken::new(
            outermost.line,
            outermost.col,
            ValidationCode::CssSyntaxEofInBlock,
            vec!["style".to_string(), outermost.token_type.to_string()],
        ));
    }
}

/// Appends a block including its open and close tokens. An unclosed block
/// ends with the EOF token; `report_unclosed_block` reports it once per input.
fn consume_a_simple_block(stream: &mut TokenStream, out: &mut Vec<Token>, depth: usize) -> bool {
    if depth > MAXIMUM_CSS_RECURSION {
        return false;
    }
    let mirror = mirror_of(&stream.current().token_type);
    out.push(stream.current().clone());
    stream.advance();

    loop {
        let current = stream.current();
        if current.is_eof() {
            out.push(current.clone());
            return true;
        }
        if current.token_type == mirror {
            out.push(current.clone());
            stream.advance();
            return true;
        }
        if !consume_a_component_value(stream, out, depth + 1) {
            return false;
        }
    }
}

fn consume_a_function(stream: &mut TokenStream, out: &mut Vec<Token>, depth: usize) -> bool {
    if depth > MAXIMUM_CSS_RECURSION {
        return false;
    }
    out.push(stream.current().clone());
    stream.advance();

    loop {
        let current = stream.current();
        if current.is_eof() {
            out.push(current.clone());
            return true;
        }
        if matches!(current.token_type, TokenType::CloseParen) {
            out.push(current.clone());
            stream.advance();
            return true;
        }
        if !consume_a_component_value(stream, out, depth + 1) {
            return false;
        }
    }
}

/// Returns the contents of the block starting at the current token, without
/// its open token and with the close token replaced by EOF.
pub fn extract_a_simple_block(stream: &mut TokenStream, errors: &mut Vec<ErrorToken>) -> Vec<Token> {
    let mut consumed = Vec::new();
    if !consume_a_simple_block(stream, &mut consumed, 0) {
        let current = stream.current();
        errors.push(ErrorToken::style(current.line, current.col, ValidationCode::CssExcessivelyNested));
        stream.advance();
    }
    if let Some(last) = consumed.last_mut() {
        *last = last.eof_at();
    }
    if !consumed.is_empty() {
        consumed.remove(0);
    }
    consumed
}

/// Returns the function starting at the current token, including the function
/// token, with the close paren replaced by EOF.
pub fn extract_a_function(stream: &mut TokenStream, errors: &mut Vec<ErrorToken>) -> Vec<Token> {
    let mut consumed = Vec::new();
    if !consume_a_function(stream, &mut consumed, 0) {
        let current = stream.current();
        errors.push(ErrorToken::style(current.line, current.col, ValidationCode::CssExcessivelyNested));
        stream.advance();
    }
    if let Some(last) = consumed.last_mut() {
        *last = last.eof_at();
    }
    consumed
}

/// Parses `tokens` into a stylesheet, reading at-rule blocks per `at_rule_spec`
/// and falling back to `default_block_type` for unlisted at-rules.
pub fn parse_a_stylesheet(
    tokens: &[Token],
    at_rule_spec: &AtRuleSpec,
    default_block_type: BlockType,
    errors: &mut Vec<ErrorToken>,
) -> Stylesheet {
    Parser::new(at_rule_spec, default_block_type).parse_stylesheet(tokens, errors)
}

/// Parses a bare declaration list, such as the contents of a `style` attribute.
pub fn parse_inline_style(tokens: &[Token], errors: &mut Vec<ErrorToken>) -> Vec<Declaration> {
    let spec = AtRuleSpec::new();
    let declarations = Parser::new(&spec, BlockType::ParseAsDeclarations).parse_a_list_of_declarations(tokens, errors);
    report_unclosed_block(tokens, errors);
    declarations
}
