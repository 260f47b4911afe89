//! Namespace display names, patterns, and token-streaming eligibility.
//!
//! A namespace identifies one execution scope as an ordered sequence of
//! `(node, task)` pairs. Its display name joins all components with `:`;
//! the empty sequence is the root and displays as `main`. The *pattern* of
//! a namespace keeps only the node-name components (even indices), which is
//! what enable/exclude filters match against:
//!
//! ```
//! use weir_stream::namespace;
//!
//! assert_eq!(namespace::format_namespace::<&str>(&[]), "main");
//! assert_eq!(
//!     namespace::namespace_pattern("clarify:t1:validator:t2"),
//!     "clarify:validator"
//! );
//! ```

use weir_contract::{TokenStreamingConfig, ALL_NAMESPACES, ROOT_NAMESPACE};

/// Join namespace components into a display name. Empty means root.
pub fn format_namespace<S: AsRef<str>>(components: &[S]) -> String {
    if components.is_empty() {
        return ROOT_NAMESPACE.to_string();
    }
    components
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(":")
}

/// Extract the pattern of a display name: the components at even indices,
/// rejoined with `:`.
pub fn namespace_pattern(namespace: &str) -> String {
    if !namespace.contains(':') {
        return namespace.to_string();
    }
    namespace
        .split(':')
        .step_by(2)
        .collect::<Vec<_>>()
        .join(":")
}

/// Split a display name into `(node_name, task_id)`.
///
/// The leaf pair carries the node name and its task id; the root has no
/// task. A single dangling component is its own node name.
pub fn split_components(namespace: &str) -> (String, Option<String>) {
    if namespace == ROOT_NAMESPACE {
        return (ROOT_NAMESPACE.to_string(), None);
    }
    let parts: Vec<&str> = namespace.split(':').collect();
    if parts.len() >= 2 {
        let node = parts[parts.len() - 2].to_string();
        let task = parts[parts.len() - 1].to_string();
        (node, Some(task))
    } else {
        (namespace.to_string(), None)
    }
}

/// Decide whether tokens from `namespace` are eligible under `config`.
///
/// Rules, in order:
/// 1. A pattern matching any excluded entry is never eligible.
/// 2. The [`ALL_NAMESPACES`] sentinel enables everything else.
/// 3. Enabled entries ending in `:*` match by whole-segment prefix;
///    all others match exactly.
pub fn should_stream_tokens(namespace: &str, config: &TokenStreamingConfig) -> bool {
    if !config.is_enabled() {
        return false;
    }

    let pattern = namespace_pattern(namespace);

    if config
        .excluded_namespaces()
        .iter()
        .any(|entry| entry_matches(entry, &pattern))
    {
        return false;
    }

    if config
        .enabled_namespaces()
        .contains(ALL_NAMESPACES)
    {
        return true;
    }

    config
        .enabled_namespaces()
        .iter()
        .any(|entry| entry_matches(entry, &pattern))
}

/// Match one filter entry against an extracted pattern.
///
/// `a:*` matches `a`, `a:b`, `a:b:c` but not `ab`; entries without the
/// wildcard require exact equality.
fn entry_matches(entry: &str, pattern: &str) -> bool {
    match entry.strip_suffix(":*") {
        Some(prefix) => match pattern.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with(':'),
            None => false,
        },
        None => entry == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(
        enabled: &[&str],
        excluded: &[&str],
    ) -> TokenStreamingConfig {
        TokenStreamingConfig::new(enabled.iter().copied())
            .unwrap()
            .exclude(excluded.iter().copied())
            .unwrap()
    }

    #[test]
    fn test_format_namespace() {
        assert_eq!(format_namespace::<&str>(&[]), "main");
        assert_eq!(format_namespace(&["clarify", "t1"]), "clarify:t1");
        assert_eq!(
            format_namespace(&["clarify", "t1", "validator", "t2"]),
            "clarify:t1:validator:t2"
        );
    }

    #[test]
    fn test_namespace_pattern() {
        assert_eq!(namespace_pattern("main"), "main");
        assert_eq!(namespace_pattern("clarify:t1"), "clarify");
        assert_eq!(
            namespace_pattern("clarify:t1:validator:t2"),
            "clarify:validator"
        );
    }

    #[test]
    fn test_split_components() {
        assert_eq!(split_components("main"), ("main".to_string(), None));
        assert_eq!(
            split_components("clarify:t1"),
            ("clarify".to_string(), Some("t1".to_string()))
        );
        assert_eq!(
            split_components("clarify:t1:validator:t2"),
            ("validator".to_string(), Some("t2".to_string()))
        );
        assert_eq!(split_components("solo"), ("solo".to_string(), None));
    }

    #[test]
    fn test_exact_enablement() {
        let config = config(&["main"], &[]);
        assert!(should_stream_tokens("main", &config));
        assert!(!should_stream_tokens("clarify:t1", &config));
    }

    #[test]
    fn test_prefix_enablement() {
        let config = config(&["clarify:*"], &[]);
        assert!(should_stream_tokens("clarify:t1", &config));
        assert!(should_stream_tokens("clarify:t1:validator:t2", &config));
        // Prefix is whole-segment: "clarifying" is not under "clarify".
        assert!(!should_stream_tokens("clarifying:t1", &config));
        assert!(!should_stream_tokens("other:t4", &config));
    }

    #[test]
    fn test_exclusion_wins() {
        let config = config(&["clarify:*"], &["clarify:internal"]);
        assert!(should_stream_tokens("clarify:t1", &config));
        assert!(should_stream_tokens("clarify:t1:validator:t2", &config));
        assert!(!should_stream_tokens("clarify:t0:internal:t3", &config));
        assert!(!should_stream_tokens("other:t4", &config));
    }

    #[test]
    fn test_all_sentinel() {
        let config = config(&["all"], &["internal"]);
        assert!(should_stream_tokens("main", &config));
        assert!(should_stream_tokens("anything:t9", &config));
        assert!(!should_stream_tokens("internal:t1", &config));
    }

    #[test]
    fn test_disabled_config_streams_nothing() {
        let config = TokenStreamingConfig::disabled();
        assert!(!should_stream_tokens("main", &config));
    }

    #[test]
    fn test_excluded_prefix_entries() {
        let config = config(&["all"], &["debug:*"]);
        assert!(!should_stream_tokens("debug:t1", &config));
        assert!(!should_stream_tokens("debug:t1:sub:t2", &config));
        assert!(should_stream_tokens("debugger:t1", &config));
    }
}
