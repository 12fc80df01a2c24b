//! ASCII case-folding of parsed regular expressions.
//!
//! Case-insensitive searches do not use the engine's `(?i)` flag: it
//! defeats the engine's literal optimizations. Instead the input bytes are
//! ASCII-lowercased into a scratch buffer and the pattern is rewritten so
//! that matching the lowered input is equivalent to matching the original
//! case-insensitively. The engine does not expose a mutable AST, so the
//! rewrite consumes the parsed HIR and rebuilds an equivalent folded one,
//! which is then re-serialized and recompiled.

use regex_syntax::hir::{
    Capture, Class, ClassBytes, ClassBytesRange, ClassUnicode, ClassUnicodeRange, Hir, HirKind,
    Literal, Repetition,
};

/// Rewrites `hir` so its matches over ASCII-lowercased input are the
/// case-insensitive matches over the original input.
///
/// Literals are lowered per code point. Character classes grow (or, when
/// negated, shrink) lowercase counterparts for any `A-Z` content. Regex
/// shorthands such as `\S` or `\b` pass through untouched, which is the
/// reason this cannot simply lowercase the pattern string.
pub fn lower_regex_ascii(hir: Hir) -> Hir {
    match hir.into_kind() {
        HirKind::Empty => Hir::empty(),
        HirKind::Literal(lit) => lower_literal(lit),
        HirKind::Class(Class::Unicode(cls)) => Hir::class(Class::Unicode(lower_unicode_class(cls))),
        HirKind::Class(Class::Bytes(cls)) => Hir::class(Class::Bytes(lower_byte_class(cls))),
        HirKind::Look(look) => Hir::look(look),
        HirKind::Repetition(rep) => Hir::repetition(Repetition {
            min: rep.min,
            max: rep.max,
            greedy: rep.greedy,
            sub: Box::new(lower_regex_ascii(*rep.sub)),
        }),
        HirKind::Capture(cap) => Hir::capture(Capture {
            index: cap.index,
            name: cap.name,
            sub: Box::new(lower_regex_ascii(*cap.sub)),
        }),
        HirKind::Concat(subs) => Hir::concat(subs.into_iter().map(lower_regex_ascii).collect()),
        HirKind::Alternation(subs) => {
            Hir::alternation(subs.into_iter().map(lower_regex_ascii).collect())
        }
    }
}

fn lower_literal(lit: Literal) -> Hir {
    match std::str::from_utf8(&lit.0) {
        Ok(s) => {
            let lowered: String = s
                .chars()
                .map(|c| c.to_lowercase().next().unwrap_or(c))
                .collect();
            Hir::literal(lowered.into_bytes())
        }
        // Raw byte literals have no case to fold.
        Err(_) => Hir::literal(lit.0),
    }
}

fn lower_unicode_class(cls: ClassUnicode) -> ClassUnicode {
    let ranges = cls.ranges();
    let n = ranges.len();

    // A negated class like [^A-Z] arrives as its complement: ranges that
    // start at NUL and run to the maximum code point, with the negated
    // content appearing as gaps. [^A-Z] must fold to [^a-z]-equivalent
    // behavior, so the gaps intersecting A-Z are mapped into a-z and
    // removed from the included ranges. Unusual ranges like [^\x00-B] are
    // not recognized as negations, matching the engine's own heuristic
    // limits.
    let is_exclusion = n >= 2 && ranges[0].start() == '\0' && ranges[n - 1].end() == char::MAX;
    if is_exclusion {
        let mut excluded: Vec<(u32, u32)> = Vec::new();
        for w in ranges.windows(2) {
            let gap_lo = (w[0].end() as u32 + 1).max('A' as u32);
            let gap_hi = (w[1].start() as u32).saturating_sub(1).min('Z' as u32);
            if gap_lo > gap_hi {
                continue;
            }
            excluded.push((gap_lo + 32, gap_hi + 32));
        }
        if excluded.is_empty() {
            return cls;
        }
        let mut out: Vec<ClassUnicodeRange> = Vec::with_capacity(n + excluded.len());
        for r in ranges {
            let mut lo = r.start() as u32;
            let hi = r.end() as u32;
            for &(ex_lo, ex_hi) in &excluded {
                if ex_hi < lo || ex_lo > hi {
                    continue;
                }
                if lo < ex_lo {
                    push_unicode_range(&mut out, lo, ex_lo - 1);
                }
                lo = ex_hi + 1;
                if lo > hi {
                    break;
                }
            }
            if lo <= hi {
                push_unicode_range(&mut out, lo, hi);
            }
        }
        return ClassUnicode::new(out);
    }

    // A class that already includes all of a-z needs no folding.
    if ranges.iter().any(|r| r.start() <= 'a' && r.end() >= 'z') {
        return cls;
    }

    let mut out: Vec<ClassUnicodeRange> = Vec::with_capacity(n + 2);
    for r in ranges {
        let a = r.start() as u32;
        let b = r.end() as u32;
        if a > 'Z' as u32 || b < 'A' as u32 {
            out.push(*r);
            continue;
        }
        if a >= 'A' as u32 && b <= 'Z' as u32 {
            // Entirely within A-Z: only the lowered form can occur in the
            // lowered input.
            push_unicode_range(&mut out, a + 32, b + 32);
        } else {
            // Spills outside A-Z: keep the original and add the lowered
            // intersection.
            out.push(*r);
            let lo = a.max('A' as u32) + 32;
            let hi = b.min('Z' as u32) + 32;
            push_unicode_range(&mut out, lo, hi);
        }
    }
    ClassUnicode::new(out)
}

fn push_unicode_range(out: &mut Vec<ClassUnicodeRange>, lo: u32, hi: u32) {
    if let (Some(lo), Some(hi)) = (char::from_u32(lo), char::from_u32(hi)) {
        out.push(ClassUnicodeRange::new(lo, hi));
    }
}

fn lower_byte_class(cls: ClassBytes) -> ClassBytes {
    let ranges = cls.ranges();
    let n = ranges.len();

    let is_exclusion = n >= 2 && ranges[0].start() == 0 && ranges[n - 1].end() == u8::MAX;
    if is_exclusion {
        let mut excluded: Vec<(u8, u8)> = Vec::new();
        for w in ranges.windows(2) {
            let gap_lo = (w[0].end() + 1).max(b'A');
            let gap_hi = (w[1].start() - 1).min(b'Z');
            if gap_lo > gap_hi {
                continue;
            }
            excluded.push((gap_lo + 32, gap_hi + 32));
        }
        if excluded.is_empty() {
            return cls;
        }
        let mut out: Vec<ClassBytesRange> = Vec::with_capacity(n + excluded.len());
        for r in ranges {
            let mut lo = r.start();
            let hi = r.end();
            for &(ex_lo, ex_hi) in &excluded {
                if ex_hi < lo || ex_lo > hi {
                    continue;
                }
                if lo < ex_lo {
                    out.push(ClassBytesRange::new(lo, ex_lo - 1));
                }
                lo = ex_hi + 1;
                if lo > hi {
                    break;
                }
            }
            if lo <= hi {
                out.push(ClassBytesRange::new(lo, hi));
            }
        }
        return ClassBytes::new(out);
    }

    if ranges.iter().any(|r| r.start() <= b'a' && r.end() >= b'z') {
        return cls;
    }

    let mut out: Vec<ClassBytesRange> = Vec::with_capacity(n + 2);
    for r in ranges {
        let a = r.start();
        let b = r.end();
        if a > b'Z' || b < b'A' {
            out.push(*r);
            continue;
        }
        if a >= b'A' && b <= b'Z' {
            out.push(ClassBytesRange::new(a + 32, b + 32));
        } else {
            out.push(*r);
            out.push(ClassBytesRange::new(a.max(b'A') + 32, b.min(b'Z') + 32));
        }
    }
    ClassBytes::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex_syntax::ParserBuilder;

    fn fold(pattern: &str) -> String {
        let hir = ParserBuilder::new()
            .utf8(false)
            .build()
            .parse(pattern)
            .unwrap();
        lower_regex_ascii(hir).to_string()
    }

    fn folded_matches(pattern: &str, lowered_input: &str) -> bool {
        regex::bytes::Regex::new(&fold(pattern))
            .unwrap()
            .is_match(lowered_input.as_bytes())
    }

    #[test]
    fn test_literal_is_lowered() {
        assert!(folded_matches("FooBar", "foobar"));
        assert!(!folded_matches("FooBar", "FooBar"));
    }

    #[test]
    fn test_lowercase_literal_unchanged() {
        assert_eq!(fold("foo"), fold("foo"));
        assert!(folded_matches("foo", "foo"));
    }

    #[test]
    fn test_upper_class_becomes_lower() {
        assert!(folded_matches("[A-Z]+", "hello"));
        assert!(!folded_matches("[A-Z]+", "HELLO"));
        assert!(!folded_matches("[A-Z]+", "123"));
    }

    #[test]
    fn test_partial_upper_class() {
        // M-Z folds to m-z; the lowered input never contains M-Z.
        assert!(folded_matches("[M-Z]", "q"));
        assert!(!folded_matches("[M-Z]", "b"));
    }

    #[test]
    fn test_class_spilling_outside_upper_keeps_original() {
        // ?-T covers some punctuation plus A-T; the folded class must
        // still accept the punctuation and also accept a-t.
        assert!(folded_matches("[?-T]", "?"));
        assert!(folded_matches("[?-T]", "@"));
        assert!(folded_matches("[?-T]", "g"));
        assert!(!folded_matches("[?-T]", "w"));
    }

    #[test]
    fn test_class_covering_all_lowercase_unchanged() {
        assert!(folded_matches("[a-z]", "q"));
        assert!(folded_matches("[A-z]", "q"));
    }

    #[test]
    fn test_negated_upper_class_excludes_lower() {
        // [^A-Z] over lowered input: bytes that were A-Z arrive as a-z,
        // so the folded class must reject them.
        assert!(!folded_matches("[^A-Z]", "q"));
        assert!(!folded_matches("[^A-Z]", "Q"));
        assert!(folded_matches("[^A-Z]", "_"));
        assert!(folded_matches("[^A-Z]", "7"));
    }

    #[test]
    fn test_negated_partial_class() {
        assert!(!folded_matches("[^M-Z]", "q"));
        assert!(folded_matches("[^M-Z]", "b"));
        assert!(folded_matches("[^M-Z]", "!"));
    }

    #[test]
    fn test_negated_class_without_upper_content_unchanged() {
        assert!(!folded_matches("[^a-z]", "q"));
        assert!(folded_matches("[^a-z]", "!"));
    }

    #[test]
    fn test_shorthands_survive_folding() {
        assert!(folded_matches(r"Foo\d+", "foo123"));
        assert!(!folded_matches(r"Foo\d+", "foo"));
        assert!(folded_matches(r"\bFoo\b", "a foo b"));
    }

    #[test]
    fn test_alternation_and_repetition() {
        assert!(folded_matches("(Foo|BAR)+", "foobarfoo"));
        assert!(folded_matches("X{2,3}", "xx"));
        assert!(!folded_matches("X{2,3}", "x"));
    }

    #[test]
    fn test_folding_is_idempotent() {
        for pattern in ["FooBar", "[A-Z]+", "[^A-Z]", r"(Foo|BAR)\d{2,}"] {
            let once = fold(pattern);
            let twice = fold(&once);
            assert_eq!(once, twice, "folding {pattern} twice diverged");
        }
    }

    #[test]
    fn test_byte_class_folding() {
        assert!(folded_matches(r"(?-u)[A-Z]", "h"));
        assert!(!folded_matches(r"(?-u)[A-Z]", "H"));
        assert!(!folded_matches(r"(?-u)[^A-Z]", "h"));
    }
}
