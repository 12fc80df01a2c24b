use serde::{Deserialize, Serialize};

/// Describes one search request: the content pattern, how to interpret it,
/// which file paths are eligible, and how many file matches to return.
///
/// Instances arrive from the search frontend and are treated as immutable
/// for the lifetime of the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatternInfo {
    /// The content pattern. Empty means "match every file's content".
    pub pattern: String,

    /// Interpret `pattern` as a regular expression rather than a literal.
    pub is_reg_exp: bool,

    /// Anchor the pattern at word boundaries.
    pub is_word_match: bool,

    /// Match case-sensitively. When false, matching is case-insensitive
    /// using the ASCII fast path (pattern and input are both lowercased).
    pub is_case_sensitive: bool,

    /// Path patterns a file's name must match, all of them, in order.
    pub include_patterns: Vec<String>,

    /// Path pattern a file's name must not match. Empty disables it.
    pub exclude_pattern: String,

    /// Interpret path patterns as regular expressions rather than globs.
    pub path_patterns_are_reg_exps: bool,

    /// Match path patterns case-sensitively.
    pub path_patterns_are_case_sensitive: bool,

    /// Search file contents for the pattern.
    pub pattern_matches_content: bool,

    /// Search file paths for the pattern.
    pub pattern_matches_paths: bool,

    /// Maximum number of file matches to return. Zero means the engine
    /// default; values above the engine cap are clamped down to it.
    pub file_match_limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_are_camel_case() {
        let p = PatternInfo {
            pattern: "foo".to_string(),
            is_reg_exp: true,
            ..Default::default()
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"isRegExp\":true"));
        assert!(json.contains("\"fileMatchLimit\":0"));
        assert!(!json.contains("is_reg_exp"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let p: PatternInfo = serde_json::from_str(r#"{"pattern":"x"}"#).unwrap();
        assert_eq!(p.pattern, "x");
        assert!(!p.is_case_sensitive);
        assert!(p.include_patterns.is_empty());
        assert_eq!(p.file_match_limit, 0);
    }
}
