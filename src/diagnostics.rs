//! Structured diagnostics produced while validating CSS
//!
//! Every problem found in a stylesheet is reported as an [`ErrorToken`]: a
//! source position, a [`ValidationCode`] from a fixed vocabulary and an ordered
//! list of string parameters. The first parameter is always the kind of
//! stylesheet (`style` unless the caller substitutes a tag name).

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::fmt;

/// Machine-readable diagnostic codes.
///
/// The string forms are matched literally by downstream tooling, so they must
/// never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationCode {
    // Lexical
    CssSyntaxStrayTrailingBackslash,
    CssSyntaxUnterminatedComment,
    CssSyntaxUnterminatedString,
    CssSyntaxEofInString,
    CssSyntaxBadUrl,

    // Structural
    CssSyntaxEofInPreludeOfQualifiedRule,
    CssSyntaxEofInBlock,
    CssSyntaxInvalidDeclaration,
    CssSyntaxIncompleteDeclaration,
    CssSyntaxInvalidAtRule,
    CssExcessivelyNested,
    CssSyntaxMalformedMediaQuery,
    StylesheetTooLong,

    // Selectors
    CssSyntaxNotASelectorStart,
    CssSyntaxMissingSelector,
    CssSyntaxInvalidAttrSelector,
    CssSyntaxErrorInPseudoSelector,
    CssSyntaxUnparsedInputRemainsInSelector,

    // Policy
    CssSyntaxDisallowedPropertyValue,
    CssSyntaxDisallowedPropertyValueWithHint,
    CssSyntaxPropertyDisallowedTogetherWith,
    CssSyntaxPropertyRequiresQualification,
    CssSyntaxPropertyDisallowedWithinAtRule,
    CssSyntaxDisallowedQualifiedRuleMustBeInsideKeyframe,
    CssSyntaxDisallowedKeyframeInsideKeyframe,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::CssSyntaxStrayTrailingBackslash => "CSS_SYNTAX_STRAY_TRAILING_BACKSLASH",
            ValidationCode::CssSyntaxUnterminatedComment => "CSS_SYNTAX_UNTERMINATED_COMMENT",
            ValidationCode::CssSyntaxUnterminatedString => "CSS_SYNTAX_UNTERMINATED_STRING",
            ValidationCode::CssSyntaxEofInString => "CSS_SYNTAX_EOF_IN_STRING",
            ValidationCode::CssSyntaxBadUrl => "CSS_SYNTAX_BAD_URL",
            ValidationCode::CssSyntaxEofInPreludeOfQualifiedRule => {
                "CSS_SYNTAX_EOF_IN_PRELUDE_OF_QUALIFIED_RULE"
            }
            ValidationCode::CssSyntaxEofInBlock => "CSS_SYNTAX_EOF_IN_BLOCK",
            ValidationCode::CssSyntaxInvalidDeclaration => "CSS_SYNTAX_INVALID_DECLARATION",
            ValidationCode::CssSyntaxIncompleteDeclaration => "CSS_SYNTAX_INCOMPLETE_DECLARATION",
            ValidationCode::CssSyntaxInvalidAtRule => "CSS_SYNTAX_INVALID_AT_RULE",
            ValidationCode::CssExcessivelyNested => "CSS_EXCESSIVELY_NESTED",
            ValidationCode::CssSyntaxMalformedMediaQuery => "CSS_SYNTAX_MALFORMED_MEDIA_QUERY",
            ValidationCode::StylesheetTooLong => "STYLESHEET_TOO_LONG",
            ValidationCode::CssSyntaxNotASelectorStart => "CSS_SYNTAX_NOT_A_SELECTOR_START",
            ValidationCode::CssSyntaxMissingSelector => "CSS_SYNTAX_MISSING_SELECTOR",
            ValidationCode::CssSyntaxInvalidAttrSelector => "CSS_SYNTAX_INVALID_ATTR_SELECTOR",
            ValidationCode::CssSyntaxErrorInPseudoSelector => "CSS_SYNTAX_ERROR_IN_PSEUDO_SELECTOR",
            ValidationCode::CssSyntaxUnparsedInputRemainsInSelector => {
                "CSS_SYNTAX_UNPARSED_INPUT_REMAINS_IN_SELECTOR"
            }
            ValidationCode::CssSyntaxDisallowedPropertyValue => "CSS_SYNTAX_DISALLOWED_PROPERTY_VALUE",
            ValidationCode::CssSyntaxDisallowedPropertyValueWithHint => {
                "CSS_SYNTAX_DISALLOWED_PROPERTY_VALUE_WITH_HINT"
            }
            ValidationCode::CssSyntaxPropertyDisallowedTogetherWith => {
                "CSS_SYNTAX_PROPERTY_DISALLOWED_TOGETHER_WITH"
            }
            ValidationCode::CssSyntaxPropertyRequiresQualification => {
                "CSS_SYNTAX_PROPERTY_REQUIRES_QUALIFICATION"
            }
            ValidationCode::CssSyntaxPropertyDisallowedWithinAtRule => {
                "CSS_SYNTAX_PROPERTY_DISALLOWED_WITHIN_AT_RULE"
            }
            ValidationCode::CssSyntaxDisallowedQualifiedRuleMustBeInsideKeyframe => {
                "CSS_SYNTAX_DISALLOWED_QUALIFIED_RULE_MUST_BE_INSIDE_KEYFRAME"
            }
            ValidationCode::CssSyntaxDisallowedKeyframeInsideKeyframe => {
                "CSS_SYNTAX_DISALLOWED_KEYFRAME_INSIDE_KEYFRAME"
            }
        }
    }

    /// Human-readable template; `%1`, `%2`, ... refer to the params.
    pub fn format(&self) -> &'static str {
        match self {
            ValidationCode::CssSyntaxStrayTrailingBackslash => {
                "CSS syntax error in tag '%1' - stray trailing backslash."
            }
            ValidationCode::CssSyntaxUnterminatedComment => {
                "CSS syntax error in tag '%1' - unterminated comment."
            }
            ValidationCode::CssSyntaxUnterminatedString => {
                "CSS syntax error in tag '%1' - unterminated string."
            }
            ValidationCode::CssSyntaxEofInString => {
                "CSS syntax error in tag '%1' - end of stylesheet encountered in string."
            }
            ValidationCode::CssSyntaxBadUrl => "CSS syntax error in tag '%1' - bad url.",
            ValidationCode::CssSyntaxEofInPreludeOfQualifiedRule => {
                "CSS syntax error in tag '%1' - end of stylesheet encountered in prelude of a qualified rule."
            }
            ValidationCode::CssSyntaxEofInBlock => {
                "CSS syntax error in tag '%1' - end of stylesheet encountered in block opened by '%2'."
            }
            ValidationCode::CssSyntaxInvalidDeclaration => {
                "CSS syntax error in tag '%1' - invalid declaration."
            }
            ValidationCode::CssSyntaxIncompleteDeclaration => {
                "CSS syntax error in tag '%1' - incomplete declaration."
            }
            ValidationCode::CssSyntaxInvalidAtRule => {
                "CSS syntax error in tag '%1' - saw invalid at rule '@%2'."
            }
            ValidationCode::CssExcessivelyNested => "CSS excessively nested in tag '%1'.",
            ValidationCode::CssSyntaxMalformedMediaQuery => {
                "CSS syntax error in tag '%1' - malformed media query."
            }
            ValidationCode::StylesheetTooLong => {
                "The author stylesheet specified in tag '%1' is too long - document contains %2 bytes whereas the limit is %3 bytes."
            }
            ValidationCode::CssSyntaxNotASelectorStart => {
                "CSS syntax error in tag '%1' - not a selector start."
            }
            ValidationCode::CssSyntaxMissingSelector => {
                "CSS syntax error in tag '%1' - missing selector."
            }
            ValidationCode::CssSyntaxInvalidAttrSelector => {
                "CSS syntax error in tag '%1' - bad attribute selector."
            }
            ValidationCode::CssSyntaxErrorInPseudoSelector => {
                "CSS syntax error in tag '%1' - error in pseudo selector."
            }
            ValidationCode::CssSyntaxUnparsedInputRemainsInSelector => {
                "CSS syntax error in tag '%1' - unparsed input remains in selector."
            }
            ValidationCode::CssSyntaxDisallowedPropertyValue => {
                "CSS syntax error in tag '%1' - the property '%2' is set to the disallowed value '%3'."
            }
            ValidationCode::CssSyntaxDisallowedPropertyValueWithHint => {
                "CSS syntax error in tag '%1' - the property '%2' is set to the disallowed value '%3'. Allowed values: %4."
            }
            ValidationCode::CssSyntaxPropertyDisallowedTogetherWith => {
                "CSS syntax error in tag '%1' - the property '%2' is disallowed together with '%3'. Allowed properties: %4."
            }
            ValidationCode::CssSyntaxPropertyRequiresQualification => {
                "CSS syntax error in tag '%1' - the property '%2' is disallowed unless the enclosing rule is prefixed with the '%3' qualification."
            }
            ValidationCode::CssSyntaxPropertyDisallowedWithinAtRule => {
                "CSS syntax error in tag '%1' - the property '%2' is disallowed within @%3. Allowed properties: %4."
            }
            ValidationCode::CssSyntaxDisallowedQualifiedRuleMustBeInsideKeyframe => {
                "CSS syntax error in tag '%1' - qualified rule '%2' must be located inside of a keyframe."
            }
            ValidationCode::CssSyntaxDisallowedKeyframeInsideKeyframe => {
                "CSS syntax error in tag '%1' - keyframe inside keyframe is not allowed."
            }
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ValidationCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single diagnostic. Immutable value type once pushed to an accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorToken {
    pub line: usize,
    pub col: usize,
    pub code: ValidationCode,
    pub params: Vec<String>,
}

impl ErrorToken {
    pub fn new(line: usize, col: usize, code: ValidationCode, params: Vec<String>) -> Self {
        Self {
            line,
            col,
            code,
            params,
        }
    }

    /// An error whose only parameter is the stylesheet kind.
    pub fn style(line: usize, col: usize, code: ValidationCode) -> Self {
        Self::new(line, col, code, vec!["style".to_string()])
    }

    /// Shared with lexical tokens in the JSON form; always `ERROR` here.
    pub fn token_type(&self) -> &'static str {
        "ERROR"
    }

    /// Replaces the stylesheet kind parameter, as done when a stylesheet is
    /// validated on behalf of a specific tag.
    pub fn with_kind(mut self, kind: &str) -> Self {
        if let Some(first) = self.params.first_mut() {
            *first = kind.to_string();
        }
        self
    }

    /// Renders the code's template with this token's params.
    pub fn message(&self) -> String {
        let mut message = self.code.format().to_string();
        // Highest index first so %1 never clobbers the prefix of %10.
        for (i, param) in self.params.iter().enumerate().rev() {
            message = message.replace(&format!("%{}", i + 1), param);
        }
        message
    }
}

impl fmt::Display for ErrorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}:{} {}", self.line, self.col, self.message())
    }
}

impl Serialize for ErrorToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ErrorToken", 5)?;
        state.serialize_field("line", &self.line)?;
        state.serialize_field("col", &self.col)?;
        state.serialize_field("tokenType", self.token_type())?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field("params", &self.params)?;
        state.end()
    }
}

/// Sorts diagnostics by source position, keeping emission order for ties.
pub fn sort_by_position(errors: &mut [ErrorToken]) {
    errors.sort_by_key(|e| (e.line, e.col));
}
