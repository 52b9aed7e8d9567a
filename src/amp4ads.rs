//! AMP4ADS animation policy
//!
//! Walks a parsed stylesheet and checks every declaration against a fixed
//! table of policy rules. Rules are tried in priority order and the first one
//! that matches reports a single error positioned at the declaration, so
//! errors come out in document order.

use crate::ast::{AtRule, Declaration, QualifiedRule, RuleVisitor, Stylesheet};
use crate::constants::{
    disallowed_values_for, AMP_ANIMATE_CLASS, AMP_ANIMATE_QUALIFIER, ANIMATION_ALLOWED_PROPERTIES,
    ANIMATION_TRIGGER_PROPERTIES, KEYFRAMES_ALLOWED_PROPERTIES, KEYFRAMES_AT_RULE, TRANSITION_ALLOWED_VALUES,
};
use crate::diagnostics::{ErrorToken, ValidationCode};
use crate::lexer::{Token, TokenType};
use crate::selectors::{has_class_selector, parse_prelude_selectors};
use crate::utils::{format_allowed_set, normalize_name};

/// Everything a policy rule needs to know about one declaration.
struct DeclarationContext<'a> {
    declaration: &'a Declaration,
    /// Lowercased, vendor-stripped property name.
    property: String,
    /// Name of the enclosing keyframes-family at-rule, as written.
    keyframes: Option<&'a str>,
    animate_qualified: bool,
    /// First animation trigger declared in the enclosing rule, as written.
    trigger: Option<&'a str>,
}

impl DeclarationContext<'_> {
    fn error(&self, code: ValidationCode, params: Vec<String>) -> ErrorToken {
        let mut all = Vec::with_capacity(params.len() + 1);
        all.push("style".to_string());
        all.extend(params);
        ErrorToken::new(self.declaration.line, self.declaration.col, code, all)
    }
}

type PolicyRule = fn(&DeclarationContext) -> Option<ErrorToken>;

/// Highest priority first.
const POLICY_RULES: &[PolicyRule] = &[
    disallowed_value,
    animation_co_occurrence,
    animation_qualification,
    transition_value_hint,
    keyframes_scoping,
];

fn disallowed_value(ctx: &DeclarationContext) -> Option<ErrorToken> {
    let value = ctx.declaration.first_ident();
    let disallowed = disallowed_values_for(&ctx.property);
    if value.is_empty() || !disallowed.contains(&normalize_name(value).as_str()) {
        return None;
    }
    Some(ctx.error(
        ValidationCode::CssSyntaxDisallowedPropertyValue,
        vec![ctx.declaration.name.clone(), value.to_string()],
    ))
}

fn animation_co_occurrence(ctx: &DeclarationContext) -> Option<ErrorToken> {
    if ctx.keyframes.is_some() || !ctx.animate_qualified {
        return None;
    }
    let trigger = ctx.trigger?;
    if ANIMATION_ALLOWED_PROPERTIES.contains(&ctx.property.as_str()) {
        return None;
    }
    Some(ctx.error(
        ValidationCode::CssSyntaxPropertyDisallowedTogetherWith,
        vec![
            ctx.declaration.name.clone(),
            trigger.to_string(),
            format_allowed_set(ANIMATION_ALLOWED_PROPERTIES),
        ],
    ))
}

fn animation_qualification(ctx: &DeclarationContext) -> Option<ErrorToken> {
    if ctx.keyframes.is_some() || ctx.animate_qualified {
        return None;
    }
    if !ANIMATION_TRIGGER_PROPERTIES.contains(&ctx.property.as_str()) {
        return None;
    }
    Some(ctx.error(
        ValidationCode::CssSyntaxPropertyRequiresQualification,
        vec![ctx.declaration.name.clone(), AMP_ANIMATE_QUALIFIER.to_string()],
    ))
}

fn transition_value_hint(ctx: &DeclarationContext) -> Option<ErrorToken> {
    if ctx.property != "transition" {
        return None;
    }
    let value = ctx.declaration.first_ident();
    if value.is_empty() || TRANSITION_ALLOWED_VALUES.contains(&normalize_name(value).as_str()) {
        return None;
    }
    Some(ctx.error(
        ValidationCode::CssSyntaxDisallowedPropertyValueWithHint,
        vec![
            ctx.declaration.name.clone(),
            value.to_string(),
            format_allowed_set(TRANSITION_ALLOWED_VALUES),
        ],
    ))
}

fn keyframes_scoping(ctx: &DeclarationContext) -> Option<ErrorToken> {
    let at_rule_name = ctx.keyframes?;
    if KEYFRAMES_ALLOWED_PROPERTIES.contains(&ctx.property.as_str()) {
        return None;
    }
    Some(ctx.error(
        ValidationCode::CssSyntaxPropertyDisallowedWithinAtRule,
        vec![
            ctx.declaration.name.clone(),
            at_rule_name.to_string(),
            format_allowed_set(KEYFRAMES_ALLOWED_PROPERTIES),
        ],
    ))
}

/// Whether the rule's selector contains `.amp-animate`. Preludes that are not
/// valid selectors are scanned token by token instead.
fn is_animate_qualified(prelude: &[Token]) -> bool {
    match parse_prelude_selectors(prelude) {
        Ok(selector) => has_class_selector(&selector, AMP_ANIMATE_CLASS),
        Err(_) => prelude.windows(2).any(|pair| {
            pair[0].token_type.is_delim('.')
                && matches!(&pair[1].token_type, TokenType::Ident(name) if name == AMP_ANIMATE_CLASS)
        }),
    }
}

struct RuleContext {
    animate_qualified: bool,
    trigger: Option<String>,
}

struct Amp4AdsVisitor<'e> {
    errors: &'e mut Vec<ErrorToken>,
    at_rules: Vec<String>,
    rule: Option<RuleContext>,
    reported: usize,
}

impl<'e> Amp4AdsVisitor<'e> {
    fn new(errors: &'e mut Vec<ErrorToken>) -> Self {
        Self {
            errors,
            at_rules: Vec::new(),
            rule: None,
            reported: 0,
        }
    }

    fn enclosing_keyframes(&self) -> Option<&str> {
        self.at_rules
            .iter()
            .rev()
            .find(|name| normalize_name(name) == KEYFRAMES_AT_RULE)
            .map(String::as_str)
    }
}

impl RuleVisitor for Amp4AdsVisitor<'_> {
    fn visit_at_rule(&mut self, at_rule: &AtRule) {
        self.at_rules.push(at_rule.name.clone());
    }

    fn leave_at_rule(&mut self, _at_rule: &AtRule) {
        self.at_rules.pop();
    }

    fn visit_qualified_rule(&mut self, qualified_rule: &QualifiedRule) {
        let trigger = qualified_rule
            .declarations
            .iter()
            .find(|d| ANIMATION_TRIGGER_PROPERTIES.contains(&normalize_name(&d.name).as_str()))
            .map(|d| d.name.clone());
        self.rule = Some(RuleContext {
            animate_qualified: is_animate_qualified(&qualified_rule.prelude),
            trigger,
        });
    }

    fn leave_qualified_rule(&mut self, _qualified_rule: &QualifiedRule) {
        self.rule = None;
    }

    fn visit_declaration(&mut self, declaration: &Declaration) {
        let found = {
            let ctx = DeclarationContext {
                declaration,
                property: normalize_name(&declaration.name),
                keyframes: self.enclosing_keyframes(),
                animate_qualified: self.rule.as_ref().map_or(false, |r| r.animate_qualified),
                trigger: self.rule.as_ref().and_then(|r| r.trigger.as_deref()),
            };
            POLICY_RULES.iter().find_map(|rule| rule(&ctx))
        };

        if let Some(error) = found {
            log::trace!("{} on '{}' at {}:{}", error.code, declaration.name, error.line, error.col);
            self.errors.push(error);
            self.reported += 1;
        }
    }
}

/// Appends an error for each declaration that breaks the AMP4ADS animation
/// policy, in document order.
pub fn validate_amp4ads_css(stylesheet: &Stylesheet, errors: &mut Vec<ErrorToken>) {
    let mut visitor = Amp4AdsVisitor::new(errors);
    stylesheet.accept(&mut visitor);
    log::debug!("AMP4ADS policy reported {} errors", visitor.reported);
}

/// Declarations marked `!important`, in document order.
pub fn extract_important_declarations(stylesheet: &Stylesheet) -> Vec<Declaration> {
    struct ImportantCollector {
        found: Vec<Declaration>,
    }

    impl RuleVisitor for ImportantCollector {
        fn visit_declaration(&mut self, declaration: &Declaration) {
            if declaration.important {
                self.found.push(declaration.clone());
            }
        }
    }

    let mut collector = ImportantCollector { found: Vec::new() };
    stylesheet.accept(&mut collector);
    collector.found
}
