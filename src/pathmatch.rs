use std::fmt;

use glob::{MatchOptions, Pattern};
use regex::RegexBuilder;

use crate::errors::SearchResult;

/// How path patterns are interpreted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathPatternOptions {
    /// Treat patterns as regular expressions instead of globs.
    pub regexp: bool,
    /// Match patterns case-sensitively.
    pub case_sensitive: bool,
}

#[derive(Debug, Clone)]
enum PathPattern {
    Glob(Pattern),
    Regex(regex::Regex),
}

impl PathPattern {
    fn matches(&self, name: &str, options: &PathPatternOptions) -> bool {
        match self {
            PathPattern::Glob(pattern) => pattern.matches_with(
                name,
                MatchOptions {
                    case_sensitive: options.case_sensitive,
                    require_literal_separator: false,
                    require_literal_leading_dot: false,
                },
            ),
            PathPattern::Regex(re) => re.is_match(name),
        }
    }
}

/// Compiled include/exclude path filters. A path is eligible when it
/// matches every include pattern and does not match the exclude pattern.
///
/// Cloning is cheap and produces an independent matcher for use on another
/// worker.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    include: Vec<PathPattern>,
    exclude: Option<PathPattern>,
    options: PathPatternOptions,
    source: String,
}

impl PathMatcher {
    /// Compiles the path filters. An empty `exclude` disables exclusion;
    /// an empty include list accepts every path.
    pub fn compile(
        include_patterns: &[String],
        exclude_pattern: &str,
        options: PathPatternOptions,
    ) -> SearchResult<Self> {
        let include = include_patterns
            .iter()
            .map(|p| Self::compile_pattern(p, options))
            .collect::<SearchResult<Vec<_>>>()?;
        let exclude = if exclude_pattern.is_empty() {
            None
        } else {
            Some(Self::compile_pattern(exclude_pattern, options)?)
        };
        let source = format!(
            "include:{:?} exclude:{:?}",
            include_patterns, exclude_pattern
        );
        Ok(PathMatcher {
            include,
            exclude,
            options,
            source,
        })
    }

    fn compile_pattern(pattern: &str, options: PathPatternOptions) -> SearchResult<PathPattern> {
        if options.regexp {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(!options.case_sensitive)
                .build()?;
            Ok(PathPattern::Regex(re))
        } else {
            Ok(PathPattern::Glob(Pattern::new(pattern)?))
        }
    }

    /// Reports whether `name` passes the include and exclude filters.
    pub fn match_path(&self, name: &str) -> bool {
        if !self
            .include
            .iter()
            .all(|p| p.matches(name, &self.options))
        {
            return false;
        }
        match &self.exclude {
            Some(p) => !p.matches(name, &self.options),
            None => true,
        }
    }
}

impl fmt::Display for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(include: &[&str], exclude: &str, options: PathPatternOptions) -> PathMatcher {
        let include: Vec<String> = include.iter().map(|s| s.to_string()).collect();
        PathMatcher::compile(&include, exclude, options).unwrap()
    }

    #[test]
    fn test_empty_patterns_accept_everything() {
        let m = compile(&[], "", PathPatternOptions::default());
        assert!(m.match_path("a.go"));
        assert!(m.match_path("deeply/nested/path.txt"));
    }

    #[test]
    fn test_glob_include() {
        let m = compile(&["*.go"], "", PathPatternOptions::default());
        assert!(m.match_path("main.go"));
        assert!(m.match_path("pkg/util.go"));
        assert!(!m.match_path("main.rs"));
    }

    #[test]
    fn test_all_includes_must_match() {
        let m = compile(&["*.go", "*test*"], "", PathPatternOptions::default());
        assert!(m.match_path("foo_test.go"));
        assert!(!m.match_path("foo.go"));
        assert!(!m.match_path("foo_test.rs"));
    }

    #[test]
    fn test_exclude_wins() {
        let m = compile(&["*.go"], "*vendor*", PathPatternOptions::default());
        assert!(m.match_path("main.go"));
        assert!(!m.match_path("vendor/lib.go"));
    }

    #[test]
    fn test_glob_case_sensitivity() {
        let insensitive = compile(&["*.GO"], "", PathPatternOptions::default());
        assert!(insensitive.match_path("main.go"));

        let sensitive = compile(
            &["*.GO"],
            "",
            PathPatternOptions {
                case_sensitive: true,
                ..Default::default()
            },
        );
        assert!(!sensitive.match_path("main.go"));
    }

    #[test]
    fn test_regex_patterns() {
        let options = PathPatternOptions {
            regexp: true,
            case_sensitive: true,
        };
        let m = compile(&[r"\.(go|rs)$"], r"^vendor/", options);
        assert!(m.match_path("src/lib.rs"));
        assert!(m.match_path("main.go"));
        assert!(!m.match_path("main.py"));
        assert!(!m.match_path("vendor/lib.go"));
    }

    #[test]
    fn test_regex_case_insensitive() {
        let options = PathPatternOptions {
            regexp: true,
            case_sensitive: false,
        };
        let m = compile(&["readme"], "", options);
        assert!(m.match_path("README.md"));
    }

    #[test]
    fn test_invalid_patterns_fail_compilation() {
        let globs = vec!["[".to_string()];
        assert!(PathMatcher::compile(&globs, "", PathPatternOptions::default()).is_err());

        let regexes = vec!["(".to_string()];
        let options = PathPatternOptions {
            regexp: true,
            ..Default::default()
        };
        assert!(PathMatcher::compile(&regexes, "", options).is_err());
    }

    #[test]
    fn test_display_names_both_sides() {
        let m = compile(&["*.go"], "vendor", PathPatternOptions::default());
        let s = m.to_string();
        assert!(s.contains("*.go"));
        assert!(s.contains("vendor"));
    }
}
