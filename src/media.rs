//! Media query parsing for `@media` preludes
//!
//! Grammar (CSS3 Media Queries):
//!
//! ```text
//! media_query_list : S* [ media_query [ ',' S* media_query ]* ]?
//! media_query      : ( expression | [ ONLY | NOT ]? S* media_type S* ) [ AND S* expression ]*
//! expression       : '(' S* media_feature S* [ ':' S* expr ]? ')' S*
//! ```
//!
//! Media types and features are collected as the identifier tokens that
//! name them.

use crate::ast::{AtRule, RuleVisitor, Stylesheet};
use crate::diagnostics::{ErrorToken, ValidationCode};
use crate::lexer::{Token, TokenType};
use crate::parser::TokenStream;

struct MediaQueryParser<'t> {
    types: &'t mut Vec<Token>,
    features: &'t mut Vec<Token>,
}

impl MediaQueryParser<'_> {
    fn skip_whitespace(stream: &mut TokenStream) {
        if stream.current().is_whitespace() {
            stream.advance();
        }
    }

    fn parse_media_query_list(&mut self, stream: &mut TokenStream) -> bool {
        Self::skip_whitespace(stream);
        if !stream.is_at_end() {
            if !self.parse_media_query(stream) {
                return false;
            }
            while matches!(stream.current().token_type, TokenType::Comma) {
                stream.advance();
                Self::skip_whitespace(stream);
                if !self.parse_media_query(stream) {
                    return false;
                }
            }
        }
        stream.is_at_end()
    }

    fn parse_media_query(&mut self, stream: &mut TokenStream) -> bool {
        if matches!(stream.current().token_type, TokenType::OpenParen) {
            if !self.parse_media_expression(stream) {
                return false;
            }
        } else {
            let current = &stream.current().token_type;
            if current.is_ident("only") || current.is_ident("not") {
                stream.advance();
            }
            Self::skip_whitespace(stream);
            if !self.parse_media_type(stream) {
                return false;
            }
            Self::skip_whitespace(stream);
        }

        while stream.current().token_type.is_ident("and") {
            stream.advance();
            Self::skip_whitespace(stream);
            if !self.parse_media_expression(stream) {
                return false;
            }
        }
        true
    }

    fn parse_media_type(&mut self, stream: &mut TokenStream) -> bool {
        match stream.current().token_type {
            TokenType::Ident(_) => {
                self.types.push(stream.current().clone());
                stream.advance();
                true
            }
            _ => false,
        }
    }

    fn parse_media_expression(&mut self, stream: &mut TokenStream) -> bool {
        if !matches!(stream.current().token_type, TokenType::OpenParen) {
            return false;
        }
        stream.advance();
        Self::skip_whitespace(stream);
        if !self.parse_media_feature(stream) {
            return false;
        }
        Self::skip_whitespace(stream);

        if matches!(stream.current().token_type, TokenType::Colon) {
            stream.advance();
            // Feature values are single keywords, numbers or dimensions
            // (aspect ratios aside), so no nested parens are expected.
            while !matches!(stream.current().token_type, TokenType::Eof | TokenType::CloseParen) {
                stream.advance();
            }
        }

        if !matches!(stream.current().token_type, TokenType::CloseParen) {
            return false;
        }
        stream.advance();
        Self::skip_whitespace(stream);
        true
    }

    fn parse_media_feature(&mut self, stream: &mut TokenStream) -> bool {
        match stream.current().token_type {
            TokenType::Ident(_) => {
                self.features.push(stream.current().clone());
                stream.advance();
                true
            }
            _ => false,
        }
    }
}

struct MediaQueryVisitor<'t> {
    parser: MediaQueryParser<'t>,
    errors: &'t mut Vec<ErrorToken>,
}

impl RuleVisitor for MediaQueryVisitor<'_> {
    fn visit_at_rule(&mut self, at_rule: &AtRule) {
        if !at_rule.name.eq_ignore_ascii_case("media") {
            return;
        }
        let mut stream = TokenStream::new(&at_rule.prelude);
        if !self.parser.parse_media_query_list(&mut stream) {
            log::debug!("Malformed media query at {}:{}", at_rule.line, at_rule.col);
            self.errors.push(ErrorToken::style(
                at_rule.line,
                at_rule.col,
                ValidationCode::CssSyntaxMalformedMediaQuery,
            ));
        }
    }
}

/// Collects the media types and features named by every `@media` rule.
/// Preludes that do not follow the media query grammar are reported.
pub fn parse_media_queries(
    stylesheet: &Stylesheet,
    media_types: &mut Vec<Token>,
    media_features: &mut Vec<Token>,
    errors: &mut Vec<ErrorToken>,
) {
    let mut visitor = MediaQueryVisitor {
        parser: MediaQueryParser {
            types: media_types,
            features: media_features,
        },
        errors,
    };
    stylesheet.accept(&mut visitor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::amp4ads_at_rule_spec;
    use crate::lexer::tokenize;
    use crate::parser::{parse_a_stylesheet, BlockType};

    fn media(css: &str) -> (Vec<String>, Vec<String>, Vec<ErrorToken>) {
        let mut errors = Vec::new();
        let tokens = tokenize(css, 1, 0, &mut errors);
        let stylesheet = parse_a_stylesheet(&tokens, &amp4ads_at_rule_spec(), BlockType::ParseAsIgnore, &mut errors);
        let mut types = Vec::new();
        let mut features = Vec::new();
        parse_media_queries(&stylesheet, &mut types, &mut features, &mut errors);
        let names = |tokens: Vec<Token>| -> Vec<String> { tokens.iter().map(|t| t.token_type.to_string()).collect() };
        (names(types), names(features), errors)
    }

    #[test]
    fn test_media_queries() {
        let (types, features, errors) = media(
            "@media screen and (min-width: 100px), only print and (color) {}\n@media (orientation:landscape) {}",
        );
        assert!(errors.is_empty());
        assert_eq!(types, vec!["screen", "print"]);
        assert_eq!(features, vec!["min-width", "color", "orientation"]);
    }

    #[test]
    fn test_empty_media_query_list() {
        let (types, features, errors) = media("@media {}");
        assert!(errors.is_empty());
        assert!(types.is_empty());
        assert!(features.is_empty());
    }

    #[test]
    fn test_malformed_media_queries() {
        let (_, _, errors) = media("@media screen, {}\n.a {}\n  @MEDIA (100px) {}\n@media screen and print {}");
        let positions: Vec<_> = errors.iter().map(|e| (e.code, e.line, e.col)).collect();
        let code = ValidationCode::CssSyntaxMalformedMediaQuery;
        assert_eq!(positions, vec![(code, 1, 0), (code, 3, 2), (code, 4, 0)]);
    }
}
