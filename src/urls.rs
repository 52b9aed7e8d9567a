//! URL extraction from declaration values

use crate::ast::{AtRule, Declaration, QualifiedRule, RuleVisitor, Stylesheet};
use crate::diagnostics::{ErrorToken, ValidationCode};
use crate::lexer::{Token, TokenType};
use serde::Serialize;

/// A URL found in `url(...)` or `url("...")`, positioned at the token that
/// starts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCssUrl {
    pub line: usize,
    pub col: usize,
    /// Decoded value, without quotes or escapes.
    pub utf8_url: String,
    /// Name of the enclosing at-rule, or empty at the top level.
    pub at_rule_scope: String,
}

fn skip_whitespace(tokens: &[Token], mut index: usize) -> usize {
    while tokens.get(index).map_or(false, Token::is_whitespace) {
        index += 1;
    }
    index
}

/// Parses `url(` optional-whitespace string optional-whitespace `)` starting
/// at the function token. Returns the URL and the index past the close paren.
fn parse_url_function(tokens: &[Token], start: usize) -> Option<(String, usize)> {
    let index = skip_whitespace(tokens, start + 1);
    let url = match tokens.get(index).map(|t| &t.token_type) {
        Some(TokenType::String(value)) => value.clone(),
        _ => return None,
    };
    let index = skip_whitespace(tokens, index + 1);
    match tokens.get(index).map(|t| &t.token_type) {
        Some(TokenType::CloseParen) => Some((url, index + 1)),
        _ => None,
    }
}

struct UrlVisitor<'u, 'e> {
    urls: &'u mut Vec<ParsedCssUrl>,
    errors: &'e mut Vec<ErrorToken>,
    at_rule_scope: String,
}

impl UrlVisitor<'_, '_> {
    fn push(&mut self, token: &Token, utf8_url: String) {
        self.urls.push(ParsedCssUrl {
            line: token.line,
            col: token.col,
            utf8_url,
            at_rule_scope: self.at_rule_scope.clone(),
        });
    }
}

impl RuleVisitor for UrlVisitor<'_, '_> {
    fn visit_at_rule(&mut self, at_rule: &AtRule) {
        self.at_rule_scope = at_rule.name.clone();
    }

    fn leave_at_rule(&mut self, _at_rule: &AtRule) {
        self.at_rule_scope.clear();
    }

    fn visit_qualified_rule(&mut self, _qualified_rule: &QualifiedRule) {
        self.at_rule_scope.clear();
    }

    fn visit_declaration(&mut self, declaration: &Declaration) {
        let tokens = &declaration.value;
        let mut index = 0;
        while index + 1 < tokens.len() {
            let token = &tokens[index];
            match &token.token_type {
                TokenType::Url(value) => {
                    self.push(token, value.clone());
                    index += 1;
                }
                TokenType::Function(name) if name.eq_ignore_ascii_case("url") => {
                    match parse_url_function(tokens, index) {
                        Some((url, next)) => {
                            self.push(token, url);
                            index = next;
                        }
                        None => {
                            self.errors
                                .push(ErrorToken::style(token.line, token.col, ValidationCode::CssSyntaxBadUrl));
                            return;
                        }
                    }
                }
                _ => index += 1,
            }
        }
    }
}

/// Appends the URLs used in declarations to `urls`. If any `url(` is malformed
/// an error is reported and none of this stylesheet's URLs are kept.
pub fn extract_urls(stylesheet: &Stylesheet, urls: &mut Vec<ParsedCssUrl>, errors: &mut Vec<ErrorToken>) {
    let urls_before = urls.len();
    let errors_before = errors.len();

    let mut visitor = UrlVisitor {
        urls: &mut *urls,
        errors: &mut *errors,
        at_rule_scope: String::new(),
    };
    stylesheet.accept(&mut visitor);

    if errors.len() != errors_before {
        urls.truncate(urls_before);
    }
    log::debug!("Extracted {} urls", urls.len() - urls_before);
}
