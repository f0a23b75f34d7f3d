//! Derive framework-legal identifiers from test declaration lines.
//!
//! The derivation must stay byte-for-byte stable: hand-written counterparts of generated stubs are matched by
//! name, so any change here silently orphans them.

use std::collections::HashMap;

/// The DSL keyword that introduces a test case.
pub const TEST_KEYWORD: &str = "test";

/// Characters replaced by a single underscore during derivation.
const SEPARATORS: [char; 10] = ['{', '}', '"', ',', '#', ':', ' ', '-', '(', ')'];

/// Derive an identifier from the text of a declaration line.
///
/// ## Parameters
/// - `declaration`: the trimmed declaration line. A leading `test` keyword is dropped before derivation.
///
/// ## Returns
/// - `String`: lowercase identifier with `/` spelled as `_or_`, separators folded to `_`, runs of `_`
///   collapsed and no leading or trailing `_`. May be empty.
pub fn derive_identifier(declaration: &str) -> String {
    let body = declaration.strip_prefix(TEST_KEYWORD).unwrap_or(declaration);
    let lowered = body.to_lowercase().replace('/', "_or_");

    let mut out = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        let ch = if SEPARATORS.contains(&ch) { '_' } else { ch };
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }

    out.trim_matches('_').to_string()
}

/// Build the pytest function name for an identifier.
///
/// pytest only collects functions prefixed with `test`, so the keyword is put back in front.
pub fn function_name(identifier: &str) -> String {
    if identifier.is_empty() {
        TEST_KEYWORD.to_string()
    } else {
        format!("{TEST_KEYWORD}_{identifier}")
    }
}

/// Check whether an identifier only uses ASCII word characters.
///
/// Derivation keeps punctuation it has no rule for (`.`, `[`, `$`, ...), so a stub name can still be rejected by
/// the target framework. Callers use this to warn about such declarations.
pub fn is_legal_identifier(identifier: &str) -> bool {
    identifier
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
}

/// How colliding identifiers within one file are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupePolicy {
    /// Emit duplicates unchanged; a later stub shadows an earlier one.
    #[default]
    Keep,
    /// Append `_2`, `_3`, ... to the second and later occurrences.
    OrdinalSuffix,
}

/// Tracks identifiers seen in one file and applies a [`DedupePolicy`].
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    policy: DedupePolicy,
    seen: HashMap<String, usize>,
}

impl IdentifierRegistry {
    pub fn new(policy: DedupePolicy) -> Self {
        Self {
            policy,
            seen: HashMap::new(),
        }
    }

    /// Register an identifier and return the one to emit.
    ///
    /// ## Returns
    /// - `(String, bool)`: the identifier to use and whether it collided with an earlier one.
    pub fn register(&mut self, identifier: String) -> (String, bool) {
        let count = self.seen.entry(identifier.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            return (identifier, false);
        }

        match self.policy {
            DedupePolicy::Keep => (identifier, true),
            DedupePolicy::OrdinalSuffix => {
                let mut ordinal = *count;
                loop {
                    let candidate = if identifier.is_empty() {
                        ordinal.to_string()
                    } else {
                        format!("{identifier}_{ordinal}")
                    };
                    if !self.seen.contains_key(&candidate) {
                        self.seen.insert(candidate.clone(), 1);
                        return (candidate, true);
                    }
                    ordinal += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incr_declaration() {
        assert_eq!(
            derive_identifier("test {INCR against non existing key} {"),
            "incr_against_non_existing_key"
        );
    }

    #[test]
    fn test_slash_becomes_or() {
        assert_eq!(derive_identifier("test {foo/bar thing}"), "foo_or_bar_thing");
    }

    #[test]
    fn test_all_separators_fold() {
        assert_eq!(
            derive_identifier(r#"test "SET/GET (big-value), #1: ok" {"#),
            "set_or_get_big_value_1_ok"
        );
    }

    #[test]
    fn test_other_punctuation_survives() {
        assert_eq!(derive_identifier("test {INCRBYFLOAT 1.5}"), "incrbyfloat_1.5");
        assert_eq!(derive_identifier("test {SETNX [x]}"), "setnx_[x]");
    }

    #[test]
    fn test_legal_identifier() {
        assert!(is_legal_identifier("incr_against_non_existing_key"));
        assert!(!is_legal_identifier("incrbyfloat_1.5"));
        assert!(!is_legal_identifier("çava"));
    }

    #[test]
    fn test_bare_keyword_is_empty() {
        assert_eq!(derive_identifier("test"), "");
        assert_eq!(derive_identifier("test {} {"), "");
    }

    #[test]
    fn test_function_name() {
        assert_eq!(function_name("incr_basics"), "test_incr_basics");
        assert_eq!(function_name(""), "test");
    }

    #[test]
    fn test_keep_policy_reports_collision() {
        let mut registry = IdentifierRegistry::new(DedupePolicy::Keep);
        assert_eq!(registry.register("a".into()), ("a".to_string(), false));
        assert_eq!(registry.register("a".into()), ("a".to_string(), true));
    }

    #[test]
    fn test_ordinal_suffix_policy() {
        let mut registry = IdentifierRegistry::new(DedupePolicy::OrdinalSuffix);
        assert_eq!(registry.register("a".into()).0, "a");
        assert_eq!(registry.register("a".into()).0, "a_2");
        assert_eq!(registry.register("a".into()).0, "a_3");
    }

    #[test]
    fn test_ordinal_suffix_skips_taken_names() {
        let mut registry = IdentifierRegistry::new(DedupePolicy::OrdinalSuffix);
        registry.register("a_2".into());
        registry.register("a".into());
        assert_eq!(registry.register("a".into()).0, "a_3");
    }
}
