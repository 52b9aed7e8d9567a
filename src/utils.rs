//! Utility functions for the AMP CSS validator

/// Strips one leading vendor prefix such as `-moz-` or `-webkit-`.
///
/// A prefix is `-`, one or more ASCII alphanumerics, then `-`, and it is only
/// removed when a base name follows that does not itself begin with `-`.
/// Anything else comes back unchanged, so the function is idempotent.
pub fn strip_vendor_prefix(name: &str) -> &str {
    let rest = match name.strip_prefix('-') {
        Some(rest) => rest,
        None => return name,
    };

    let vendor_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if vendor_len == 0 {
        return name;
    }

    match rest[vendor_len..].strip_prefix('-') {
        Some(base) if !base.is_empty() && !base.starts_with('-') => base,
        _ => name,
    }
}

/// Strips a leading `min-` or `max-`, as used by range media features.
pub fn strip_min_max_prefix(name: &str) -> &str {
    name.strip_prefix("min-")
        .or_else(|| name.strip_prefix("max-"))
        .unwrap_or(name)
}

/// Renders a set of names the way diagnostics quote them:
/// sorted, single quoted, comma separated, in brackets.
pub fn format_allowed_set(names: &[&str]) -> String {
    let mut sorted: Vec<&str> = names.to_vec();
    sorted.sort_unstable();
    let quoted: Vec<String> = sorted.iter().map(|n| format!("'{}'", n)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Lowercased, vendor-stripped form used for policy lookups.
pub fn normalize_name(name: &str) -> String {
    strip_vendor_prefix(&name.to_ascii_lowercase()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_vendor_prefix() {
        assert_eq!(strip_vendor_prefix("-moz-foo"), "foo");
        assert_eq!(strip_vendor_prefix("-webkit-transition"), "transition");
        assert_eq!(strip_vendor_prefix("-o-keyframes"), "keyframes");
        assert_eq!(strip_vendor_prefix("-d-foo-foo"), "foo-foo");
        assert_eq!(strip_vendor_prefix("-foo"), "-foo");
        assert_eq!(strip_vendor_prefix("foo"), "foo");
        assert_eq!(strip_vendor_prefix("foo-foo"), "foo-foo");
        assert_eq!(strip_vendor_prefix(""), "");
        assert_eq!(strip_vendor_prefix("-"), "-");
        assert_eq!(strip_vendor_prefix("-moz-"), "-moz-");
        assert_eq!(strip_vendor_prefix("--custom"), "--custom");
        assert_eq!(strip_vendor_prefix("-moz--foo"), "-moz--foo");
    }

    #[test]
    fn test_strip_vendor_prefix_idempotent() {
        let inputs = [
            "-moz-foo", "-d-foo-foo", "-foo", "foo", "foo-foo", "", "-a-b-c-d", "-x--y",
            "-webkit-", "--", "-1-2", "-é-x",
        ];
        for input in inputs {
            let once = strip_vendor_prefix(input);
            assert_eq!(strip_vendor_prefix(once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_strip_min_max_prefix() {
        assert_eq!(strip_min_max_prefix("min-width"), "width");
        assert_eq!(strip_min_max_prefix("max-height"), "height");
        assert_eq!(strip_min_max_prefix("width"), "width");
        assert_eq!(strip_min_max_prefix("minimum"), "minimum");
    }

    #[test]
    fn test_format_allowed_set() {
        assert_eq!(
            format_allowed_set(&["transform", "opacity"]),
            "['opacity', 'transform']"
        );
        assert_eq!(format_allowed_set(&[]), "[]");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("-WEBKIT-Transition"), "transition");
        assert_eq!(normalize_name("Position"), "position");
    }
}
