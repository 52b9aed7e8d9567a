//! Selector parsing
//!
//! Parses qualified rule preludes into selector trees following the
//! `selectors_group` production of CSS3 Selectors. Selector nodes carry the
//! position of their first token. A [`SelectorVisitor`] can be run over a tree
//! with [`traverse_selectors`], which visits nodes breadth-first.

use crate::ast::{AtRule, QualifiedRule, RuleVisitor, Stylesheet};
use crate::constants::KEYFRAMES_AT_RULE;
use crate::diagnostics::{ErrorToken, ValidationCode};
use crate::utils::normalize_name;
use crate::lexer::{Token, TokenType};
use crate::parser::{extract_a_function, TokenStream};
use std::collections::VecDeque;

/// A type or universal selector. `namespace_prefix` is `None` when no `|` was
/// written, `Some("")` for `|name` and `Some("*")` for `*|name`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSelector {
    pub line: usize,
    pub col: usize,
    pub namespace_prefix: Option<String>,
    pub element_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdSelector {
    pub line: usize,
    pub col: usize,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassSelector {
    pub line: usize,
    pub col: usize,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttrSelector {
    pub line: usize,
    pub col: usize,
    pub namespace_prefix: Option<String>,
    pub attr_name: String,
    /// One of `""`, `=`, `~=`, `|=`, `^=`, `$=`, `*=`.
    pub match_operator: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PseudoSelector {
    pub line: usize,
    pub col: usize,
    /// `:name` is a pseudo class, `::name` a pseudo element.
    pub is_class: bool,
    pub name: String,
    /// Tokens of a functional pseudo selector such as `:lang(fr)`.
    pub func: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleSelectorSequence {
    pub line: usize,
    pub col: usize,
    pub type_selector: TypeSelector,
    pub other_selectors: Vec<Selector>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinatorType {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

impl CombinatorType {
    fn for_token(token: &Token) -> Option<Self> {
        match token.token_type {
            TokenType::Whitespace => Some(CombinatorType::Descendant),
            TokenType::Delim('>') => Some(CombinatorType::Child),
            TokenType::Delim('+') => Some(CombinatorType::AdjacentSibling),
            TokenType::Delim('~') => Some(CombinatorType::GeneralSibling),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Combinator {
    pub line: usize,
    pub col: usize,
    pub combinator_type: CombinatorType,
    pub left: Box<Selector>,
    pub right: SimpleSelectorSequence,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorsGroup {
    pub line: usize,
    pub col: usize,
    pub elements: Vec<Selector>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Id(IdSelector),
    Class(ClassSelector),
    Attr(AttrSelector),
    Pseudo(PseudoSelector),
    SimpleSequence(SimpleSelectorSequence),
    Combinator(Combinator),
    Group(SelectorsGroup),
}

pub trait SelectorVisitor {
    fn visit_type_selector(&mut self, _selector: &TypeSelector) {}
    fn visit_id_selector(&mut self, _selector: &IdSelector) {}
    fn visit_class_selector(&mut self, _selector: &ClassSelector) {}
    fn visit_attr_selector(&mut self, _selector: &AttrSelector) {}
    fn visit_pseudo_selector(&mut self, _selector: &PseudoSelector) {}
    fn visit_simple_selector_sequence(&mut self, _sequence: &SimpleSelectorSequence) {}
    fn visit_combinator(&mut self, _combinator: &Combinator) {}
    fn visit_selectors_group(&mut self, _group: &SelectorsGroup) {}
}

#[derive(Clone, Copy)]
enum SelectorNode<'a> {
    Type(&'a TypeSelector),
    Sequence(&'a SimpleSelectorSequence),
    Selector(&'a Selector),
}

impl<'a> SelectorNode<'a> {
    fn accept<V: SelectorVisitor + ?Sized>(self, visitor: &mut V) {
        match self {
            SelectorNode::Type(s) => visitor.visit_type_selector(s),
            SelectorNode::Sequence(s) => visitor.visit_simple_selector_sequence(s),
            SelectorNode::Selector(selector) => match selector {
                Selector::Id(s) => visitor.visit_id_selector(s),
                Selector::Class(s) => visitor.visit_class_selector(s),
                Selector::Attr(s) => visitor.visit_attr_selector(s),
                Selector::Pseudo(s) => visitor.visit_pseudo_selector(s),
                Selector::SimpleSequence(s) => visitor.visit_simple_selector_sequence(s),
                Selector::Combinator(s) => visitor.visit_combinator(s),
                Selector::Group(s) => visitor.visit_selectors_group(s),
            },
        }
    }

    fn push_children(self, queue: &mut VecDeque<SelectorNode<'a>>) {
        let sequence = match self {
            SelectorNode::Type(_) => return,
            SelectorNode::Sequence(s) => s,
            SelectorNode::Selector(selector) => match selector {
                Selector::SimpleSequence(s) => s,
                Selector::Combinator(c) => {
                    queue.push_back(SelectorNode::Selector(&*c.left));
                    queue.push_back(SelectorNode::Sequence(&c.right));
                    return;
                }
                Selector::Group(g) => {
                    queue.extend(g.elements.iter().map(SelectorNode::Selector));
                    return;
                }
                _ => return,
            },
        };
        queue.push_back(SelectorNode::Type(&sequence.type_selector));
        queue.extend(sequence.other_selectors.iter().map(SelectorNode::Selector));
    }
}

/// Visits `selector` and all of its descendants, breadth-first.
pub fn traverse_selectors<V: SelectorVisitor + ?Sized>(selector: &Selector, visitor: &mut V) {
    let mut to_visit = VecDeque::new();
    to_visit.push_back(SelectorNode::Selector(selector));
    while let Some(node) = to_visit.pop_front() {
        node.accept(visitor);
        node.push_children(&mut to_visit);
    }
}

struct ClassFinder<'n> {
    name: &'n str,
    found: bool,
}

impl SelectorVisitor for ClassFinder<'_> {
    fn visit_class_selector(&mut self, selector: &ClassSelector) {
        if selector.value == self.name {
            self.found = true;
        }
    }
}

/// Whether any simple selector in the tree is the class selector `.name`.
pub fn has_class_selector(selector: &Selector, name: &str) -> bool {
    let mut finder = ClassFinder { name, found: false };
    traverse_selectors(selector, &mut finder);
    finder.found
}

fn is_delim(token: &Token, c: char) -> bool {
    token.token_type.is_delim(c)
}

fn skip_whitespace(stream: &mut TokenStream) {
    if stream.current().is_whitespace() {
        stream.advance();
    }
}

fn is_simple_selector_sequence_start(token: &Token) -> bool {
    matches!(
        token.token_type,
        TokenType::Delim('*')
            | TokenType::Delim('|')
            | TokenType::Delim('.')
            | TokenType::Ident(_)
            | TokenType::Hash { .. }
            | TokenType::OpenSquare
            | TokenType::Colon
    )
}

fn error_at(token: &Token, code: ValidationCode) -> ErrorToken {
    ErrorToken::style(token.line, token.col, code)
}

/// Reads an optional `prefix|` before a type or attribute name.
fn parse_namespace_prefix(stream: &mut TokenStream) -> Option<String> {
    if is_delim(stream.current(), '|') {
        stream.advance();
        return Some(String::new());
    }
    if is_delim(stream.current(), '*') && is_delim(stream.next(), '|') {
        stream.advance();
        stream.advance();
        return Some("*".to_string());
    }
    if let TokenType::Ident(prefix) = &stream.current().token_type {
        if is_delim(stream.next(), '|') {
            let prefix = prefix.clone();
            stream.advance();
            stream.advance();
            return Some(prefix);
        }
    }
    None
}

pub fn parse_a_type_selector(stream: &mut TokenStream) -> TypeSelector {
    let (line, col) = (stream.current().line, stream.current().col);
    let namespace_prefix = parse_namespace_prefix(stream);

    let element_name = match &stream.current().token_type {
        TokenType::Delim('*') => {
            stream.advance();
            "*".to_string()
        }
        TokenType::Ident(name) => {
            let name = name.clone();
            stream.advance();
            name
        }
        _ => "*".to_string(),
    };

    TypeSelector {
        line,
        col,
        namespace_prefix,
        element_name,
    }
}

pub fn parse_an_attr_selector(stream: &mut TokenStream) -> Result<AttrSelector, ErrorToken> {
    let start = stream.current().clone();
    stream.advance();
    skip_whitespace(stream);

    let namespace_prefix = parse_namespace_prefix(stream);

    let attr_name = match &stream.current().token_type {
        TokenType::Ident(name) => name.clone(),
        _ => return Err(error_at(&start, ValidationCode::CssSyntaxInvalidAttrSelector)),
    };
    stream.advance();
    skip_whitespace(stream);

    let match_operator = match stream.current().token_type {
        TokenType::Delim('=') => "=",
        TokenType::IncludeMatch => "~=",
        TokenType::DashMatch => "|=",
        TokenType::PrefixMatch => "^=",
        TokenType::SuffixMatch => "$=",
        TokenType::SubstringMatch => "*=",
        _ => "",
    };
    if !match_operator.is_empty() {
        stream.advance();
    }
    skip_whitespace(stream);

    let mut value = String::new();
    if !match_operator.is_empty() {
        if let TokenType::Ident(v) | TokenType::String(v) = &stream.current().token_type {
            value = v.clone();
            stream.advance();
        }
    }
    skip_whitespace(stream);

    if !matches!(stream.current().token_type, TokenType::CloseSquare) {
        return Err(error_at(&start, ValidationCode::CssSyntaxInvalidAttrSelector));
    }
    stream.advance();

    Ok(AttrSelector {
        line: start.line,
        col: start.col,
        namespace_prefix,
        attr_name,
        match_operator: match_operator.to_string(),
        value,
    })
}

pub fn parse_a_pseudo_selector(stream: &mut TokenStream) -> Result<PseudoSelector, ErrorToken> {
    let first_colon = stream.current().clone();
    stream.advance();

    let mut is_class = true;
    if matches!(stream.current().token_type, TokenType::Colon) {
        is_class = false;
        stream.advance();
    }

    match &stream.current().token_type {
        TokenType::Ident(name) => {
            let name = name.clone();
            stream.advance();
            Ok(PseudoSelector {
                line: first_colon.line,
                col: first_colon.col,
                is_class,
                name,
                func: Vec::new(),
            })
        }
        TokenType::Function(name) => {
            let name = name.clone();
            // Nesting problems inside the function are folded into the
            // pseudo selector error.
            let mut nested = Vec::new();
            let func = extract_a_function(stream, &mut nested);
            if !nested.is_empty() {
                return Err(error_at(&first_colon, ValidationCode::CssSyntaxErrorInPseudoSelector));
            }
            Ok(PseudoSelector {
                line: first_colon.line,
                col: first_colon.col,
                is_class,
                name,
                func,
            })
        }
        _ => Err(error_at(&first_colon, ValidationCode::CssSyntaxErrorInPseudoSelector)),
    }
}

pub fn parse_a_simple_selector_sequence(stream: &mut TokenStream) -> Result<SimpleSelectorSequence, ErrorToken> {
    let (line, col) = (stream.current().line, stream.current().col);

    let mut type_selector = None;
    if matches!(
        stream.current().token_type,
        TokenType::Delim('*') | TokenType::Delim('|') | TokenType::Ident(_)
    ) {
        type_selector = Some(parse_a_type_selector(stream));
    }

    let mut other_selectors = Vec::new();
    loop {
        let current = stream.current();
        match &current.token_type {
            TokenType::Hash { value, .. } => {
                other_selectors.push(Selector::Id(IdSelector {
                    line: current.line,
                    col: current.col,
                    value: value.clone(),
                }));
                stream.advance();
            }
            TokenType::Delim('.') if matches!(stream.next().token_type, TokenType::Ident(_)) => {
                let (dot_line, dot_col) = (current.line, current.col);
                stream.advance();
                if let TokenType::Ident(value) = &stream.current().token_type {
                    other_selectors.push(Selector::Class(ClassSelector {
                        line: dot_line,
                        col: dot_col,
                        value: value.clone(),
                    }));
                }
                stream.advance();
            }
            TokenType::OpenSquare => {
                other_selectors.push(Selector::Attr(parse_an_attr_selector(stream)?));
            }
            TokenType::Colon => {
                other_selectors.push(Selector::Pseudo(parse_a_pseudo_selector(stream)?));
            }
            _ => break,
        }
    }

    let type_selector = match type_selector {
        Some(type_selector) => type_selector,
        None if other_selectors.is_empty() => {
            return Err(error_at(stream.current(), ValidationCode::CssSyntaxMissingSelector));
        }
        // No type selector means the universal selector is implied.
        None => TypeSelector {
            line,
            col,
            namespace_prefix: None,
            element_name: "*".to_string(),
        },
    };

    Ok(SimpleSelectorSequence {
        line,
        col,
        type_selector,
        other_selectors,
    })
}

/// A simple selector sequence or a chain of them joined by combinators.
pub fn parse_a_selector(stream: &mut TokenStream) -> Result<Selector, ErrorToken> {
    if !is_simple_selector_sequence_start(stream.current()) {
        return Err(error_at(stream.current(), ValidationCode::CssSyntaxNotASelectorStart));
    }
    let mut left = Selector::SimpleSequence(parse_a_simple_selector_sequence(stream)?);

    loop {
        // Whitespace is only a combinator when another sequence follows it.
        if stream.current().is_whitespace() && !is_simple_selector_sequence_start(stream.next()) {
            stream.advance();
        }
        let combinator_token = stream.current().clone();
        let combinator_type = match CombinatorType::for_token(&combinator_token) {
            Some(CombinatorType::Descendant) if !is_simple_selector_sequence_start(stream.next()) => {
                return Ok(left)
            }
            Some(combinator_type) => combinator_type,
            None => return Ok(left),
        };
        stream.advance();
        skip_whitespace(stream);

        let right = parse_a_simple_selector_sequence(stream)?;
        left = Selector::Combinator(Combinator {
            line: combinator_token.line,
            col: combinator_token.col,
            combinator_type,
            left: Box::new(left),
            right,
        });
    }
}

/// Comma separated selectors. All input must be consumed; a single selector
/// is returned as-is rather than wrapped in a group.
pub fn parse_a_selectors_group(stream: &mut TokenStream) -> Result<Selector, ErrorToken> {
    if !is_simple_selector_sequence_start(stream.current()) {
        return Err(error_at(stream.current(), ValidationCode::CssSyntaxNotASelectorStart));
    }
    let (line, col) = (stream.current().line, stream.current().col);
    let mut elements = vec![parse_a_selector(stream)?];

    loop {
        skip_whitespace(stream);
        if matches!(stream.current().token_type, TokenType::Comma) {
            stream.advance();
            skip_whitespace(stream);
            elements.push(parse_a_selector(stream)?);
            continue;
        }
        if !stream.is_at_end() {
            return Err(error_at(
                stream.current(),
                ValidationCode::CssSyntaxUnparsedInputRemainsInSelector,
            ));
        }
        if elements.len() == 1 {
            return Ok(elements.remove(0));
        }
        return Ok(Selector::Group(SelectorsGroup { line, col, elements }));
    }
}

/// Parses a qualified rule prelude (which ends in EOF) as a selectors group.
pub fn parse_prelude_selectors(prelude: &[Token]) -> Result<Selector, ErrorToken> {
    let mut stream = TokenStream::new(prelude);
    parse_a_selectors_group(&mut stream)
}

struct SelectorCheck<'e> {
    errors: &'e mut Vec<ErrorToken>,
    keyframes_depth: usize,
}

impl RuleVisitor for SelectorCheck<'_> {
    fn visit_at_rule(&mut self, at_rule: &AtRule) {
        if normalize_name(&at_rule.name) == KEYFRAMES_AT_RULE {
            self.keyframes_depth += 1;
        }
    }

    fn leave_at_rule(&mut self, at_rule: &AtRule) {
        if normalize_name(&at_rule.name) == KEYFRAMES_AT_RULE {
            self.keyframes_depth -= 1;
        }
    }

    fn visit_qualified_rule(&mut self, qualified_rule: &QualifiedRule) {
        // Keyframe preludes are offsets (`from`, `50%`), not selectors.
        if self.keyframes_depth > 0 {
            return;
        }
        if let Err(error) = parse_prelude_selectors(&qualified_rule.prelude) {
            self.errors.push(error);
        }
    }
}

/// Reports every style rule whose prelude is not a valid selectors group.
pub fn validate_selectors(stylesheet: &Stylesheet, errors: &mut Vec<ErrorToken>) {
    let mut check = SelectorCheck {
        errors,
        keyframes_depth: 0,
    };
    stylesheet.accept(&mut check);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(selector: &str) -> Result<Selector, ErrorToken> {
        let mut errors = Vec::new();
        let tokens = tokenize(selector, 1, 0, &mut errors);
        assert!(errors.is_empty());
        parse_prelude_selectors(&tokens)
    }

    #[derive(Default)]
    struct Collector {
        visited: Vec<String>,
    }

    impl SelectorVisitor for Collector {
        fn visit_type_selector(&mut self, s: &TypeSelector) {
            self.visited.push(format!("type:{}", s.element_name));
        }
        fn visit_id_selector(&mut self, s: &IdSelector) {
            self.visited.push(format!("id:{}", s.value));
        }
        fn visit_class_selector(&mut self, s: &ClassSelector) {
            self.visited.push(format!("class:{}", s.value));
        }
        fn visit_attr_selector(&mut self, s: &AttrSelector) {
            self.visited.push(format!("attr:{}", s.attr_name));
        }
        fn visit_pseudo_selector(&mut self, s: &PseudoSelector) {
            self.visited.push(format!("pseudo:{}", s.name));
        }
        fn visit_simple_selector_sequence(&mut self, _: &SimpleSelectorSequence) {
            self.visited.push("sequence".to_string());
        }
        fn visit_combinator(&mut self, c: &Combinator) {
            self.visited.push(format!("combinator:{:?}", c.combinator_type));
        }
        fn visit_selectors_group(&mut self, _: &SelectorsGroup) {
            self.visited.push("group".to_string());
        }
    }

    #[test]
    fn test_type_selectors() {
        match parse("*|foo").unwrap() {
            Selector::SimpleSequence(seq) => {
                assert_eq!(seq.type_selector.namespace_prefix.as_deref(), Some("*"));
                assert_eq!(seq.type_selector.element_name, "foo");
            }
            _ => panic!("Expected simple selector sequence"),
        }
        match parse("svg|*").unwrap() {
            Selector::SimpleSequence(seq) => {
                assert_eq!(seq.type_selector.namespace_prefix.as_deref(), Some("svg"));
                assert_eq!(seq.type_selector.element_name, "*");
            }
            _ => panic!("Expected simple selector sequence"),
        }
    }

    #[test]
    fn test_simple_sequence_with_others() {
        match parse("a#main.nav:hover[href^=\"http\"]").unwrap() {
            Selector::SimpleSequence(seq) => {
                assert_eq!(seq.type_selector.element_name, "a");
                assert_eq!(seq.other_selectors.len(), 4);
                match &seq.other_selectors[3] {
                    Selector::Attr(attr) => {
                        assert_eq!(attr.attr_name, "href");
                        assert_eq!(attr.match_operator, "^=");
                        assert_eq!(attr.value, "http");
                        assert_eq!(attr.col, 16);
                    }
                    _ => panic!("Expected attribute selector"),
                }
            }
            _ => panic!("Expected simple selector sequence"),
        }
    }

    #[test]
    fn test_implied_universal_selector() {
        match parse(".foo").unwrap() {
            Selector::SimpleSequence(seq) => {
                assert_eq!(seq.type_selector.element_name, "*");
                assert_eq!(seq.type_selector.namespace_prefix, None);
            }
            _ => panic!("Expected simple selector sequence"),
        }
    }

    #[test]
    fn test_combinators() {
        match parse("a > b + c ~ d e").unwrap() {
            Selector::Combinator(c) => {
                assert_eq!(c.combinator_type, CombinatorType::Descendant);
                assert_eq!(c.right.type_selector.element_name, "e");
                match *c.left {
                    Selector::Combinator(ref inner) => {
                        assert_eq!(inner.combinator_type, CombinatorType::GeneralSibling)
                    }
                    _ => panic!("Expected combinator"),
                }
            }
            _ => panic!("Expected combinator"),
        }
    }

    #[test]
    fn test_selectors_group_and_traversal() {
        let selector = parse("a.x, b").unwrap();
        let mut collector = Collector::default();
        traverse_selectors(&selector, &mut collector);
        assert_eq!(
            collector.visited,
            vec!["group", "sequence", "sequence", "type:a", "class:x", "type:b"]
        );
    }

    #[test]
    fn test_has_class_selector() {
        let selector = parse(".amp-animate .box, p").unwrap();
        assert!(has_class_selector(&selector, "amp-animate"));
        assert!(!has_class_selector(&selector, "box-2"));
        let selector = parse("p:not(.amp-animate)").unwrap();
        assert!(!has_class_selector(&selector, "amp-animate"));
    }

    #[test]
    fn test_functional_pseudo_selector() {
        match parse("p::first-line, :lang(fr)").unwrap() {
            Selector::Group(group) => {
                match &group.elements[1] {
                    Selector::SimpleSequence(seq) => match &seq.other_selectors[0] {
                        Selector::Pseudo(pseudo) => {
                            assert!(pseudo.is_class);
                            assert_eq!(pseudo.name, "lang");
                            assert_eq!(pseudo.func.len(), 3);
                        }
                        _ => panic!("Expected pseudo selector"),
                    },
                    _ => panic!("Expected simple selector sequence"),
                }
            }
            _ => panic!("Expected selectors group"),
        }
    }

    #[test]
    fn test_selector_errors() {
        let err = parse("!foo").unwrap_err();
        assert_eq!(err.code, ValidationCode::CssSyntaxNotASelectorStart);
        assert_eq!(err.col, 0);

        let err = parse("[=x]").unwrap_err();
        assert_eq!(err.code, ValidationCode::CssSyntaxInvalidAttrSelector);

        let err = parse("a[href").unwrap_err();
        assert_eq!(err.code, ValidationCode::CssSyntaxInvalidAttrSelector);
        assert_eq!(err.col, 1);

        let err = parse("a:'x'").unwrap_err();
        assert_eq!(err.code, ValidationCode::CssSyntaxErrorInPseudoSelector);

        let err = parse("a > ").unwrap_err();
        assert_eq!(err.code, ValidationCode::CssSyntaxMissingSelector);

        let err = parse("a {").unwrap_err();
        assert_eq!(err.code, ValidationCode::CssSyntaxUnparsedInputRemainsInSelector);
        assert_eq!(err.col, 2);

        let err = parse("a, ").unwrap_err();
        assert_eq!(err.code, ValidationCode::CssSyntaxNotASelectorStart);
    }

    #[test]
    fn test_validate_selectors() {
        use crate::constants::amp4ads_at_rule_spec;
        use crate::parser::{parse_a_stylesheet, BlockType};

        let mut errors = Vec::new();
        let css = "a > .b {} @keyframes k { 50% { opacity: 1 } } @media print { 10px {} } c:: {}";
        let tokens = tokenize(css, 1, 0, &mut errors);
        let stylesheet = parse_a_stylesheet(&tokens, &amp4ads_at_rule_spec(), BlockType::ParseAsIgnore, &mut errors);
        validate_selectors(&stylesheet, &mut errors);

        let codes: Vec<_> = errors.iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            vec![
                ValidationCode::CssSyntaxNotASelectorStart,
                ValidationCode::CssSyntaxErrorInPseudoSelector,
            ]
        );
    }
}
