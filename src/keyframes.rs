//! Checks for stylesheets that may only contain keyframes animations

use crate::ast::{AtRule, QualifiedRule, RuleVisitor, Stylesheet};
use crate::constants::KEYFRAMES_AT_RULE;
use crate::diagnostics::{ErrorToken, ValidationCode};
use crate::utils::normalize_name;

struct KeyframesVisitor<'e> {
    errors: &'e mut Vec<ErrorToken>,
    /// One entry per open at-rule, true for keyframes-family rules.
    open_at_rules: Vec<bool>,
}

impl KeyframesVisitor<'_> {
    fn inside_keyframes(&self) -> bool {
        self.open_at_rules.iter().any(|&is_keyframes| is_keyframes)
    }
}

impl RuleVisitor for KeyframesVisitor<'_> {
    fn visit_at_rule(&mut self, at_rule: &AtRule) {
        let is_keyframes = normalize_name(&at_rule.name) == KEYFRAMES_AT_RULE;
        if is_keyframes && self.inside_keyframes() {
            self.errors.push(ErrorToken::style(
                at_rule.line,
                at_rule.col,
                ValidationCode::CssSyntaxDisallowedKeyframeInsideKeyframe,
            ));
        }
        self.open_at_rules.push(is_keyframes);
    }

    fn leave_at_rule(&mut self, _at_rule: &AtRule) {
        self.open_at_rules.pop();
    }

    fn visit_qualified_rule(&mut self, qualified_rule: &QualifiedRule) {
        if self.inside_keyframes() || qualified_rule.declarations.is_empty() {
            return;
        }
        self.errors.push(ErrorToken::new(
            qualified_rule.line,
            qualified_rule.col,
            ValidationCode::CssSyntaxDisallowedQualifiedRuleMustBeInsideKeyframe,
            vec!["style".to_string(), qualified_rule.rule_name()],
        ));
    }
}

/// Reports style rules that live outside any `@keyframes` block, and
/// `@keyframes` blocks nested in one another.
pub fn validate_keyframes_css(stylesheet: &Stylesheet, errors: &mut Vec<ErrorToken>) {
    let before = errors.len();
    let mut visitor = KeyframesVisitor {
        errors: &mut *errors,
        open_at_rules: Vec::new(),
    };
    stylesheet.accept(&mut visitor);
    log::debug!("Keyframes check reported {} errors", errors.len() - before);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::keyframes_at_rule_spec;
    use crate::lexer::tokenize;
    use crate::parser::{parse_a_stylesheet, BlockType};

    fn validate(css: &str) -> Vec<ErrorToken> {
        let mut errors = Vec::new();
        let tokens = tokenize(css, 1, 0, &mut errors);
        let stylesheet = parse_a_stylesheet(&tokens, &keyframes_at_rule_spec(), BlockType::ParseAsIgnore, &mut errors);
        validate_keyframes_css(&stylesheet, &mut errors);
        errors
    }

    #[test]
    fn test_keyframes_only() {
        let errors = validate(
            "@keyframes a { from { opacity: 0 } to { opacity: 1 } }\n\
             @media print { @-webkit-keyframes b { 50% { opacity: .5 } } }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_rule_outside_keyframes() {
        let errors = validate("@media print { .foo > p { color: red } }\n.empty {}");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ValidationCode::CssSyntaxDisallowedQualifiedRuleMustBeInsideKeyframe);
        assert_eq!(errors[0].params, vec!["style".to_string(), ".foo>p".to_string()]);
        assert_eq!((errors[0].line, errors[0].col), (1, 15));
    }

    #[test]
    fn test_nested_keyframes() {
        let errors = validate("@keyframes a { @-moz-keyframes b { } }");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ValidationCode::CssSyntaxDisallowedKeyframeInsideKeyframe);
        assert_eq!(errors[0].col, 15);
    }
}
