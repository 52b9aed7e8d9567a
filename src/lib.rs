//! AMP CSS Validator
//!
//! A CSS Syntax Level 3 tokenizer and parser together with the constraint
//! checks the AMP validator runs on `<style>` contents, most notably the
//! AMP4ADS animation policy.
//!
//! # Features
//!
//! - Error-tolerant tokenizer with line/column provenance
//! - Stylesheet parser driven by a block type per at-rule name
//! - Rule tree and selector visitors
//! - Table-driven AMP4ADS policy engine
//! - Structured, JSON-serializable diagnostics with a stable code vocabulary
//! - URL extraction, media query parsing and keyframes-document checks
//!
//! # Basic Usage
//!
//! ```rust
//! use ampcss::{validate_source, Result};
//!
//! fn main() -> Result<()> {
//!     let report = validate_source(".box { position: fixed; }")?;
//!     assert_eq!(report.errors.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! # Validation Pipeline
//!
//! 1. **Phase 0**: Size check - Reject stylesheets over the byte limit
//! 2. **Phase 1**: Lexer - Tokenize the source
//! 3. **Phase 2**: Parser - Build the rule tree per the at-rule spec
//! 4. **Phase 3**: Structure - Unknown at-rules and selector syntax
//! 5. **Phase 4**: Extraction - URLs, media queries, `!important` declarations
//! 6. **Phase 5**: Policy - AMP4ADS rules or keyframes-document rules
//! 7. **Phase 6**: Report - Apply the tag name and order errors by position

pub mod amp4ads;
pub mod ast;
pub mod cli;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod keyframes;
pub mod lexer;
pub mod media;
pub mod parser;
pub mod selectors;
pub mod urls;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::path::Path;

// Re-export commonly used types and functions
pub use amp4ads::{extract_important_declarations, validate_amp4ads_css};
pub use ast::{AtRule, Declaration, QualifiedRule, Rule, RuleVisitor, Stylesheet};
pub use cli::EnhancedCli;
pub use constants::{amp4ads_at_rule_spec, keyframes_at_rule_spec};
pub use diagnostics::{ErrorToken, ValidationCode};
pub use error::{Result, ValidatorError};
pub use keyframes::validate_keyframes_css;
pub use lexer::{tokenize, Lexer, Token, TokenType};
pub use media::parse_media_queries;
pub use parser::{parse_a_stylesheet, parse_inline_style, AtRuleSpec, BlockType};
pub use selectors::{parse_a_selectors_group, traverse_selectors, Selector, SelectorVisitor};
pub use urls::{extract_urls, ParsedCssUrl};
pub use utils::{strip_min_max_prefix, strip_vendor_prefix};

/// Validator version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Which policy the pipeline applies after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationProfile {
    /// AMP4ADS creatives: animation policy and disallowed values.
    Amp4ads,
    /// Stylesheets that may only hold `@keyframes`.
    Keyframes,
    /// Syntax checks only.
    Plain,
}

impl ValidationProfile {
    pub fn at_rule_spec(&self) -> AtRuleSpec {
        match self {
            ValidationProfile::Amp4ads | ValidationProfile::Plain => amp4ads_at_rule_spec(),
            ValidationProfile::Keyframes => keyframes_at_rule_spec(),
        }
    }
}

/// Validation options and settings
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    /// Enable debug logging of each pipeline phase
    pub debug_mode: bool,

    /// Document position of the first character
    pub start_line: usize,
    pub start_col: usize,

    /// Substituted for `style` as the first parameter of every error
    pub tag_name: String,

    pub profile: ValidationProfile,

    /// Block type per at-rule name; names outside it are reported
    pub at_rule_spec: AtRuleSpec,

    /// Block type for at-rules missing from `at_rule_spec`
    pub default_block_type: BlockType,

    pub check_unknown_at_rules: bool,
    pub check_selectors: bool,
    pub check_media_queries: bool,
    pub extract_urls: bool,

    /// Maximum stylesheet size in bytes (0 = no limit)
    pub max_bytes: usize,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self::for_profile(ValidationProfile::Amp4ads)
    }
}

impl ValidatorOptions {
    pub fn for_profile(profile: ValidationProfile) -> Self {
        Self {
            debug_mode: false,
            start_line: 1,
            start_col: 0,
            tag_name: constants::DEFAULT_TAG_NAME.to_string(),
            profile,
            at_rule_spec: profile.at_rule_spec(),
            default_block_type: BlockType::ParseAsIgnore,
            check_unknown_at_rules: true,
            check_selectors: true,
            check_media_queries: true,
            extract_urls: true,
            max_bytes: constants::DEFAULT_MAX_STYLESHEET_BYTES,
        }
    }
}

/// Validation statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationStats {
    /// Source size in bytes
    pub source_bytes: usize,

    /// Number of tokens including the final EOF
    pub token_count: usize,

    /// Number of rules, nested ones included
    pub rule_count: usize,

    pub declaration_count: usize,

    pub error_count: usize,

    /// Validation time in milliseconds
    pub validation_time_ms: u64,
}

/// Everything learned about one stylesheet.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ErrorToken>,
    pub urls: Vec<ParsedCssUrl>,
    pub media_types: Vec<String>,
    /// Feature names with any `min-`/`max-` prefix removed
    pub media_features: Vec<String>,
    pub important_declarations: usize,
    pub stats: ValidationStats,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

struct UnknownAtRuleVisitor<'a, 'e> {
    at_rule_spec: &'a AtRuleSpec,
    errors: &'e mut Vec<ErrorToken>,
}

impl RuleVisitor for UnknownAtRuleVisitor<'_, '_> {
    fn visit_at_rule(&mut self, at_rule: &AtRule) {
        if !self.at_rule_spec.contains_key(&utils::normalize_name(&at_rule.name)) {
            self.errors.push(ErrorToken::new(
                at_rule.line,
                at_rule.col,
                ValidationCode::CssSyntaxInvalidAtRule,
                vec!["style".to_string(), at_rule.name.clone()],
            ));
        }
    }
}

/// Validate a stylesheet with default options
pub fn validate_source(css: &str) -> Result<ValidationReport> {
    validate_source_with_options(css, &ValidatorOptions::default())
}

/// Validate a stylesheet with custom options
pub fn validate_source_with_options(css: &str, options: &ValidatorOptions) -> Result<ValidationReport> {
    use std::time::Instant;

    if options.start_line == 0 {
        return Err(ValidatorError::invalid_argument("start line must be at least 1"));
    }

    let start_time = Instant::now();
    let mut report = ValidationReport::default();
    let mut errors = Vec::new();
    report.stats.source_bytes = css.len();

    // Phase 0: Size check
    if options.max_bytes > 0 && css.len() > options.max_bytes {
        errors.push(ErrorToken::new(
            options.start_line,
            options.start_col,
            ValidationCode::StylesheetTooLong,
            vec!["style".to_string(), css.len().to_string(), options.max_bytes.to_string()],
        ));
    }

    // Phase 1: Lexical analysis
    let tokens = Lexer::new(css)
        .with_start(options.start_line, options.start_col)
        .tokenize(&mut errors);
    report.stats.token_count = tokens.len();

    if options.debug_mode {
        log::debug!("Phase 1 complete. Tokenized {} tokens", tokens.len());
    }

    // Phase 2: Parsing
    let stylesheet = parse_a_stylesheet(&tokens, &options.at_rule_spec, options.default_block_type, &mut errors);
    report.stats.rule_count = stylesheet.rule_count();
    report.stats.declaration_count = stylesheet.declaration_count();

    if options.debug_mode {
        log::debug!(
            "Phase 2 complete. {} rules, {} declarations, {} errors so far",
            report.stats.rule_count,
            report.stats.declaration_count,
            errors.len()
        );
    }

    // Phase 3: Structure
    if options.check_unknown_at_rules {
        stylesheet.accept(&mut UnknownAtRuleVisitor {
            at_rule_spec: &options.at_rule_spec,
            errors: &mut errors,
        });
    }
    if options.check_selectors {
        selectors::validate_selectors(&stylesheet, &mut errors);
    }

    // Phase 4: Extraction
    if options.extract_urls {
        extract_urls(&stylesheet, &mut report.urls, &mut errors);
    }
    if options.check_media_queries {
        let mut types = Vec::new();
        let mut features = Vec::new();
        parse_media_queries(&stylesheet, &mut types, &mut features, &mut errors);
        report.media_types = types.iter().map(|t| t.token_type.to_string()).collect();
        report.media_features = features
            .iter()
            .map(|t| utils::strip_min_max_prefix(&t.token_type.to_string()).to_string())
            .collect();
    }
    report.important_declarations = extract_important_declarations(&stylesheet).len();

    if options.debug_mode {
        log::debug!(
            "Phase 4 complete. {} urls, {} media types, {} !important declarations",
            report.urls.len(),
            report.media_types.len(),
            report.important_declarations
        );
    }

    // Phase 5: Policy
    match options.profile {
        ValidationProfile::Amp4ads => validate_amp4ads_css(&stylesheet, &mut errors),
        ValidationProfile::Keyframes => validate_keyframes_css(&stylesheet, &mut errors),
        ValidationProfile::Plain => {}
    }

    // Phase 6: Report
    diagnostics::sort_by_position(&mut errors);
    report.errors = errors
        .into_iter()
        .map(|e| e.with_kind(&options.tag_name))
        .collect();
    report.stats.error_count = report.errors.len();
    report.stats.validation_time_ms = start_time.elapsed().as_millis() as u64;

    if options.debug_mode {
        log::debug!("Validation finished with {} errors", report.stats.error_count);
        log::debug!("Full stats: {:?}", report.stats);
    }

    Ok(report)
}

/// Validate a file with default options
pub fn validate_file<P: AsRef<Path>>(path: P) -> Result<ValidationReport> {
    validate_file_with_options(path, &ValidatorOptions::default())
}

/// Validate a file with custom options
pub fn validate_file_with_options<P: AsRef<Path>>(path: P, options: &ValidatorOptions) -> Result<ValidationReport> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ValidatorError::file_not_found(path.display().to_string()),
        _ => ValidatorError::Io(e),
    })?;

    if options.debug_mode {
        log::info!("Validating '{}' ({} bytes)", path.display(), source.len());
    }

    validate_source_with_options(&source, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_source_defaults() {
        let report = validate_source(".amp-animate .box { transform: rotate(180deg); transition: transform 2s; }").unwrap();
        assert!(report.is_valid());
        assert_eq!(report.stats.rule_count, 1);
        assert_eq!(report.stats.declaration_count, 2);
    }

    #[test]
    fn test_errors_sorted_across_phases() {
        let css = ".a { position: fixed }\n@import 'x.css';\n1px { color: red }\n@media screen and print { .b { c: d } }";
        let report = validate_source(css).unwrap();
        let found: Vec<_> = report.errors.iter().map(|e| (e.line, e.col, e.code)).collect();
        assert_eq!(
            found,
            vec![
                (1, 5, ValidationCode::CssSyntaxDisallowedPropertyValue),
                (2, 0, ValidationCode::CssSyntaxInvalidAtRule),
                (3, 0, ValidationCode::CssSyntaxNotASelectorStart),
                (4, 0, ValidationCode::CssSyntaxMalformedMediaQuery),
            ]
        );
        assert_eq!(report.errors[1].params, vec!["style".to_string(), "import".to_string()]);
    }

    #[test]
    fn test_tag_name_and_start_position() {
        let options = ValidatorOptions {
            tag_name: "style amp-custom".to_string(),
            start_line: 5,
            start_col: 10,
            ..ValidatorOptions::default()
        };
        let report = validate_source_with_options(".box { position: sticky }", &options).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!((report.errors[0].line, report.errors[0].col), (5, 17));
        assert_eq!(report.errors[0].params[0], "style amp-custom");
    }

    #[test]
    fn test_stylesheet_too_long() {
        let options = ValidatorOptions {
            max_bytes: 10,
            ..ValidatorOptions::default()
        };
        let report = validate_source_with_options(".a { color: red }", &options).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, ValidationCode::StylesheetTooLong);
        assert_eq!(report.errors[0].params, vec!["style", "17", "10"]);
    }

    #[test]
    fn test_invalid_start_line() {
        let options = ValidatorOptions {
            start_line: 0,
            ..ValidatorOptions::default()
        };
        match validate_source_with_options("", &options) {
            Err(ValidatorError::InvalidArgument { .. }) => {}
            _ => panic!("Expected InvalidArgument error"),
        }
    }

    #[test]
    fn test_profiles() {
        let css = "@keyframes k { from { width: 0 } } .a { color: red }";

        let report = validate_source(css).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, ValidationCode::CssSyntaxPropertyDisallowedWithinAtRule);

        let options = ValidatorOptions::for_profile(ValidationProfile::Keyframes);
        let report = validate_source_with_options(css, &options).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            report.errors[0].code,
            ValidationCode::CssSyntaxDisallowedQualifiedRuleMustBeInsideKeyframe
        );

        let options = ValidatorOptions::for_profile(ValidationProfile::Plain);
        assert!(validate_source_with_options(css, &options).unwrap().is_valid());
    }

    #[test]
    fn test_report_extraction() {
        let css = "@media print and (min-width: 10px) and (color) { .a { background: url(a.png) !important } }";
        let report = validate_source(css).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.urls.len(), 1);
        assert_eq!(report.urls[0].at_rule_scope, "");
        assert_eq!(report.media_types, vec!["print"]);
        assert_eq!(report.media_features, vec!["width", "color"]);
        assert_eq!(report.important_declarations, 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["urls"][0]["utf8Url"], "a.png");
        assert_eq!(json["stats"]["rule_count"], 2);
    }

    #[test]
    fn test_validate_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, ".box {{ position: fixed; position:sticky; }}").unwrap();

        let report = validate_file(file.path()).unwrap();
        let cols: Vec<usize> = report.errors.iter().map(|e| e.col).collect();
        assert_eq!(cols, vec![7, 24]);
    }

    #[test]
    fn test_validate_missing_file() {
        match validate_file("/nonexistent/path/style.css") {
            Err(ValidatorError::FileNotFound { path }) => assert!(path.contains("style.css")),
            _ => panic!("Expected FileNotFound error"),
        }
    }

    #[test]
    fn test_options_default() {
        let options = ValidatorOptions::default();
        assert_eq!(options.profile, ValidationProfile::Amp4ads);
        assert_eq!(options.start_line, 1);
        assert_eq!(options.tag_name, "style");
        assert_eq!(options.default_block_type, BlockType::ParseAsIgnore);
        assert!(options.at_rule_spec.contains_key("keyframes"));
    }
}
