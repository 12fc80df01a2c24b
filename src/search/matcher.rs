use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::bytes::{Regex, RegexBuilder};
use regex_syntax::hir::literal::Extractor;
use regex_syntax::hir::Hir;
use regex_syntax::ParserBuilder;
use tracing::trace;

use super::fold::lower_regex_ascii;
use super::literal::longest_literal;
use crate::errors::SearchResult;
use crate::pathmatch::{PathMatcher, PathPatternOptions};
use crate::protocol::PatternInfo;

/// Compiled patterns keyed by the final expression text and case flag.
/// Identical requests are common (retries, pagination, fan-out across
/// repositories), and folding plus compilation is the expensive part.
static PATTERN_CACHE: Lazy<DashMap<(String, bool), CompiledPattern>> = Lazy::new(DashMap::new);

/// The immutable, shareable output of pattern compilation.
#[derive(Debug, Clone)]
struct CompiledPattern {
    re: Regex,
    literal_substring: Vec<u8>,
}

/// A compiled matching program: the content regex, the path filters, the
/// literal prefilter, and the case-folding scratch buffer.
///
/// A `PatternMatcher` is built once per request and cloned once per worker;
/// the scratch buffer makes a single instance unsafe for concurrent use,
/// which `find`'s `&mut self` receiver enforces.
#[derive(Debug)]
pub struct PatternMatcher {
    /// The regex to match, or `None` for an empty pattern, which matches
    /// every file's content.
    pub(crate) re: Option<Regex>,

    /// True when matching is case-insensitive: input is ASCII-lowercased
    /// into `transform_buf` and `re` has been folded to match it.
    pub(crate) ignore_case: bool,

    /// Reused between files to avoid re-allocating. Grown once to the
    /// archive's maximum file length on first use.
    pub(crate) transform_buf: Vec<u8>,

    match_path: PathMatcher,

    /// Guaranteed to appear in any match of `re`. Only set when the
    /// engine reports no literal prefix of its own; empty otherwise.
    pub(crate) literal_substring: Vec<u8>,
}

impl PatternMatcher {
    /// Builds the matching program for `p`. Fails if the content pattern
    /// or any path pattern does not compile.
    pub fn compile(p: &PatternInfo) -> SearchResult<PatternMatcher> {
        let mut re = None;
        let mut literal_substring = Vec::new();

        if !p.pattern.is_empty() {
            let mut expr = if p.is_reg_exp {
                p.pattern.clone()
            } else {
                regex::escape(&p.pattern)
            };
            if p.is_word_match {
                expr = format!(r"\b{expr}\b");
            }
            if p.is_reg_exp {
                // Matching runs over whole files, not line by line, so ^
                // and $ must anchor at newlines.
                expr = format!("(?m:{expr})");
            }
            let compiled = compiled_pattern(&expr, !p.is_case_sensitive)?;
            re = Some(compiled.re);
            literal_substring = compiled.literal_substring;
        }

        let match_path = PathMatcher::compile(
            &p.include_patterns,
            &p.exclude_pattern,
            PathPatternOptions {
                regexp: p.path_patterns_are_reg_exps,
                case_sensitive: p.path_patterns_are_case_sensitive,
            },
        )?;

        Ok(PatternMatcher {
            re,
            ignore_case: !p.is_case_sensitive,
            transform_buf: Vec::new(),
            match_path,
            literal_substring,
        })
    }

    /// True when a content regex is present. Absent means every file's
    /// content matches vacuously.
    pub fn has_pattern(&self) -> bool {
        self.re.is_some()
    }

    /// The compiled path filters.
    pub fn match_path(&self) -> &PathMatcher {
        &self.match_path
    }

    /// Reports whether the content regex matches `name`. Used to match
    /// file paths; an absent regex matches everything.
    pub fn match_string(&self, name: &str) -> bool {
        match &self.re {
            None => true,
            Some(re) if self.ignore_case => re.is_match(name.to_lowercase().as_bytes()),
            Some(re) => re.is_match(name.as_bytes()),
        }
    }
}

impl Clone for PatternMatcher {
    /// Produces an independent copy for another worker. The compiled regex
    /// and path matcher are cheaply cloned; the scratch buffer starts
    /// empty so clones never alias each other's working memory.
    fn clone(&self) -> Self {
        PatternMatcher {
            re: self.re.clone(),
            ignore_case: self.ignore_case,
            transform_buf: Vec::new(),
            match_path: self.match_path.clone(),
            literal_substring: self.literal_substring.clone(),
        }
    }
}

fn compiled_pattern(expr: &str, ignore_case: bool) -> SearchResult<CompiledPattern> {
    let key = (expr.to_string(), ignore_case);
    if let Some(hit) = PATTERN_CACHE.get(&key) {
        trace!(expr, "pattern cache hit");
        return Ok(hit.value().clone());
    }
    let compiled = build_pattern(expr, ignore_case)?;
    PATTERN_CACHE.insert(key, compiled.clone());
    Ok(compiled)
}

fn build_pattern(expr: &str, ignore_case: bool) -> SearchResult<CompiledPattern> {
    let mut expr = expr.to_string();
    if ignore_case {
        // Fold the pattern instead of compiling with (?i): the engine's
        // case-insensitive mode disables its literal optimizations, and
        // the scanner lowercases the input anyway.
        let hir = parse_expr(&expr)?;
        expr = lower_regex_ascii(hir).to_string();
    }

    let re = RegexBuilder::new(&expr).build()?;

    // The substring prefilter only pays off when the engine has no literal
    // prefix of its own to hunt for.
    let hir = parse_expr(&expr)?;
    let mut extractor = Extractor::new();
    let prefix = extractor.extract(&hir);
    let no_prefix = match prefix.longest_common_prefix() {
        Some(p) => p.is_empty(),
        None => true,
    };
    let literal_substring = if no_prefix {
        longest_literal(&hir)
    } else {
        Vec::new()
    };

    Ok(CompiledPattern {
        re,
        literal_substring,
    })
}

fn parse_expr(expr: &str) -> SearchResult<Hir> {
    let mut parser = ParserBuilder::new().utf8(false).build();
    Ok(parser.parse(expr)?)
}
