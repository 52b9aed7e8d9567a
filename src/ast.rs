//! Rule tree produced by the stylesheet parser
//!
//! Nodes carry the position of their first token and own their children.
//! Preludes and declaration values are kept as token lists terminated by an
//! [`TokenType::Eof`] token positioned at whatever ended them.

use crate::lexer::{Token, TokenType};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    pub line: usize,
    pub col: usize,
    pub rules: Vec<Rule>,
    pub eof: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    At(AtRule),
    Qualified(QualifiedRule),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    pub line: usize,
    pub col: usize,
    pub name: String,
    pub prelude: Vec<Token>,
    pub rules: Vec<Rule>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedRule {
    pub line: usize,
    pub col: usize,
    pub prelude: Vec<Token>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub line: usize,
    pub col: usize,
    pub name: String,
    pub value: Vec<Token>,
    pub important: bool,
}

/// Callbacks for a depth-first walk of the rule tree. Every method defaults to
/// doing nothing, so visitors only implement what they inspect.
pub trait RuleVisitor {
    fn visit_stylesheet(&mut self, _stylesheet: &Stylesheet) {}
    fn leave_stylesheet(&mut self, _stylesheet: &Stylesheet) {}
    fn visit_at_rule(&mut self, _at_rule: &AtRule) {}
    fn leave_at_rule(&mut self, _at_rule: &AtRule) {}
    fn visit_qualified_rule(&mut self, _qualified_rule: &QualifiedRule) {}
    fn leave_qualified_rule(&mut self, _qualified_rule: &QualifiedRule) {}
    fn visit_declaration(&mut self, _declaration: &Declaration) {}
    fn leave_declaration(&mut self, _declaration: &Declaration) {}
}

impl Stylesheet {
    pub fn accept<V: RuleVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_stylesheet(self);
        for rule in &self.rules {
            rule.accept(visitor);
        }
        visitor.leave_stylesheet(self);
    }

    pub fn rule_count(&self) -> usize {
        self.rules.iter().map(Rule::rule_count).sum()
    }

    pub fn declaration_count(&self) -> usize {
        self.rules.iter().map(Rule::declaration_count).sum()
    }
}

impl Rule {
    pub fn accept<V: RuleVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            Rule::At(at_rule) => at_rule.accept(visitor),
            Rule::Qualified(qualified_rule) => qualified_rule.accept(visitor),
        }
    }

    pub fn position(&self) -> (usize, usize) {
        match self {
            Rule::At(r) => (r.line, r.col),
            Rule::Qualified(r) => (r.line, r.col),
        }
    }

    fn rule_count(&self) -> usize {
        match self {
            Rule::At(r) => 1 + r.rules.iter().map(Rule::rule_count).sum::<usize>(),
            Rule::Qualified(_) => 1,
        }
    }

    fn declaration_count(&self) -> usize {
        match self {
            Rule::At(r) => {
                r.declarations.len() + r.rules.iter().map(Rule::declaration_count).sum::<usize>()
            }
            Rule::Qualified(r) => r.declarations.len(),
        }
    }
}

impl AtRule {
    /// Nested rules are visited before the at-rule's own declarations.
    pub fn accept<V: RuleVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_at_rule(self);
        for rule in &self.rules {
            rule.accept(visitor);
        }
        for declaration in &self.declarations {
            declaration.accept(visitor);
        }
        visitor.leave_at_rule(self);
    }
}

impl QualifiedRule {
    pub fn accept<V: RuleVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_qualified_rule(self);
        for declaration in &self.declarations {
            declaration.accept(visitor);
        }
        visitor.leave_qualified_rule(self);
    }

    /// The prelude as compact text, e.g. `.foo` or `from`.
    pub fn rule_name(&self) -> String {
        self.prelude
            .iter()
            .filter(|t| !t.is_whitespace())
            .map(|t| t.token_type.to_string())
            .collect()
    }
}

impl Declaration {
    pub fn accept<V: RuleVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_declaration(self);
        visitor.leave_declaration(self);
    }

    /// The first identifier of the value, allowing one leading whitespace
    /// token; empty when the value does not start with an identifier.
    pub fn first_ident(&self) -> &str {
        let mut tokens = self.value.iter().peekable();
        if tokens.peek().map_or(false, |t| t.is_whitespace()) {
            tokens.next();
        }
        match tokens.next().map(|t| &t.token_type) {
            Some(TokenType::Ident(value)) => value,
            _ => "",
        }
    }
}

impl Serialize for Stylesheet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("line", &self.line)?;
        map.serialize_entry("col", &self.col)?;
        map.serialize_entry("tokenType", "STYLESHEET")?;
        map.serialize_entry("rules", &self.rules)?;
        map.serialize_entry("eof", &self.eof)?;
        map.end()
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Rule::At(r) => r.serialize(serializer),
            Rule::Qualified(r) => r.serialize(serializer),
        }
    }
}

impl Serialize for AtRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("line", &self.line)?;
        map.serialize_entry("col", &self.col)?;
        map.serialize_entry("tokenType", "AT_RULE")?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("prelude", &self.prelude)?;
        map.serialize_entry("declarations", &self.declarations)?;
        map.serialize_entry("rules", &self.rules)?;
        map.end()
    }
}

impl Serialize for QualifiedRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("line", &self.line)?;
        map.serialize_entry("col", &self.col)?;
        map.serialize_entry("tokenType", "QUALIFIED_RULE")?;
        map.serialize_entry("prelude", &self.prelude)?;
        map.serialize_entry("declarations", &self.declarations)?;
        map.end()
    }
}

impl Serialize for Declaration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("line", &self.line)?;
        map.serialize_entry("col", &self.col)?;
        map.serialize_entry("tokenType", "DECLARATION")?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("value", &self.value)?;
        map.serialize_entry("important", &self.important)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(token_type: TokenType, col: usize) -> Token {
        Token::new(token_type, 1, col)
    }

    fn declaration(name: &str, value: Vec<Token>) -> Declaration {
        Declaration {
            line: 1,
            col: 0,
            name: name.to_string(),
            value,
            important: false,
        }
    }

    #[derive(Default)]
    struct Trace {
        events: Vec<String>,
    }

    impl RuleVisitor for Trace {
        fn visit_at_rule(&mut self, at_rule: &AtRule) {
            self.events.push(format!("enter @{}", at_rule.name));
        }
        fn leave_at_rule(&mut self, at_rule: &AtRule) {
            self.events.push(format!("leave @{}", at_rule.name));
        }
        fn visit_qualified_rule(&mut self, rule: &QualifiedRule) {
            self.events.push(format!("enter {}", rule.rule_name()));
        }
        fn visit_declaration(&mut self, declaration: &Declaration) {
            self.events.push(format!("decl {}", declaration.name));
        }
    }

    #[test]
    fn test_first_ident() {
        let decl = declaration(
            "position",
            vec![token(TokenType::Whitespace, 9), token(TokenType::Ident("fixed".into()), 10), token(TokenType::Eof, 15)],
        );
        assert_eq!(decl.first_ident(), "fixed");

        let decl = declaration("width", vec![token(TokenType::Delim('+'), 6), token(TokenType::Eof, 7)]);
        assert_eq!(decl.first_ident(), "");

        let decl = declaration("empty", vec![]);
        assert_eq!(decl.first_ident(), "");
    }

    #[test]
    fn test_visit_order() {
        let inner = QualifiedRule {
            line: 1,
            col: 10,
            prelude: vec![token(TokenType::Ident("from".into()), 10), token(TokenType::Eof, 15)],
            declarations: vec![declaration("opacity", vec![])],
        };
        let stylesheet = Stylesheet {
            line: 1,
            col: 0,
            rules: vec![Rule::At(AtRule {
                line: 1,
                col: 0,
                name: "page".into(),
                prelude: vec![],
                rules: vec![Rule::Qualified(inner)],
                declarations: vec![declaration("margin", vec![])],
            })],
            eof: token(TokenType::Eof, 40),
        };

        let mut trace = Trace::default();
        stylesheet.accept(&mut trace);
        assert_eq!(
            trace.events,
            vec!["enter @page", "enter from", "decl opacity", "decl margin", "leave @page"]
        );
        assert_eq!(stylesheet.rule_count(), 2);
        assert_eq!(stylesheet.declaration_count(), 2);
    }

    #[test]
    fn test_rule_name() {
        let rule = QualifiedRule {
            line: 1,
            col: 0,
            prelude: vec![
                token(TokenType::Delim('.'), 0),
                token(TokenType::Ident("foo".into()), 1),
                token(TokenType::Whitespace, 4),
                token(TokenType::Eof, 5),
            ],
            declarations: vec![],
        };
        assert_eq!(rule.rule_name(), ".foo");
    }

    #[test]
    fn test_declaration_json() {
        let decl = declaration("color", vec![token(TokenType::Ident("red".into()), 7), token(TokenType::Eof, 10)]);
        let json = serde_json::to_value(&decl).unwrap();
        assert_eq!(json["tokenType"], "DECLARATION");
        assert_eq!(json["value"][0]["value"], "red");
        assert_eq!(json["value"][1]["tokenType"], "EOF_TOKEN");
        assert_eq!(json["important"], false);
    }
}
