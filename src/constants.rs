use crate::parser::{AtRuleSpec, BlockType};

// Parser limits
pub const MAXIMUM_CSS_RECURSION: usize = 100;
pub const DEFAULT_MAX_STYLESHEET_BYTES: usize = 50_000;

// Diagnostics
pub const DEFAULT_TAG_NAME: &str = "style";
pub const AMP_ANIMATE_CLASS: &str = "amp-animate";
pub const AMP_ANIMATE_QUALIFIER: &str = ".amp-animate";

// AMP4ADS animation policy

/// Declaring one of these in a rule restricts the rest of the rule to
/// [`ANIMATION_ALLOWED_PROPERTIES`] and requires `.amp-animate` qualification.
pub const ANIMATION_TRIGGER_PROPERTIES: &[&str] = &["animation", "transition"];

pub const ANIMATION_ALLOWED_PROPERTIES: &[&str] =
    &["animation", "opacity", "transform", "transition", "visibility"];

pub const TRANSITION_ALLOWED_VALUES: &[&str] = &["opacity", "transform"];

pub const KEYFRAMES_ALLOWED_PROPERTIES: &[&str] =
    &["animation-timing-function", "opacity", "transform"];

pub const KEYFRAMES_AT_RULE: &str = "keyframes";

/// Property/value pairs rejected in every context.
pub const DISALLOWED_PROPERTY_VALUES: &[(&str, &[&str])] = &[("position", &["fixed", "sticky"])];

// At-rules understood by AMP4ADS documents
pub const AMP4ADS_AT_RULES: &[(&str, BlockType)] = &[
    ("font-face", BlockType::ParseAsDeclarations),
    ("keyframes", BlockType::ParseAsRules),
    ("media", BlockType::ParseAsRules),
    ("page", BlockType::ParseAsDeclarations),
    ("supports", BlockType::ParseAsRules),
];

// At-rules understood by standalone keyframes documents
pub const KEYFRAMES_DOCUMENT_AT_RULES: &[(&str, BlockType)] = &[
    ("keyframes", BlockType::ParseAsRules),
    ("media", BlockType::ParseAsRules),
    ("supports", BlockType::ParseAsRules),
];

pub fn at_rule_spec_from(entries: &[(&str, BlockType)]) -> AtRuleSpec {
    entries
        .iter()
        .map(|(name, block_type)| (name.to_string(), *block_type))
        .collect()
}

pub fn amp4ads_at_rule_spec() -> AtRuleSpec {
    at_rule_spec_from(AMP4ADS_AT_RULES)
}

pub fn keyframes_at_rule_spec() -> AtRuleSpec {
    at_rule_spec_from(KEYFRAMES_DOCUMENT_AT_RULES)
}

pub fn disallowed_values_for(property: &str) -> &'static [&'static str] {
    DISALLOWED_PROPERTY_VALUES
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, values)| *values)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amp4ads_at_rule_spec() {
        let spec = amp4ads_at_rule_spec();
        assert_eq!(spec.len(), 5);
        assert_eq!(spec.get("media"), Some(&BlockType::ParseAsRules));
        assert_eq!(spec.get("font-face"), Some(&BlockType::ParseAsDeclarations));
        assert_eq!(spec.get("import"), None);
    }

    #[test]
    fn test_disallowed_values_for() {
        assert_eq!(disallowed_values_for("position"), &["fixed", "sticky"]);
        assert!(disallowed_values_for("color").is_empty());
    }
}
