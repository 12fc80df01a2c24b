use regex_syntax::hir::{Hir, HirKind};

/// Finds the longest literal guaranteed to appear in every match of the
/// expression, for use as a substring prefilter. Returns an empty vector
/// when no such literal can be proven.
///
/// The walk is deliberately conservative: alternations contribute nothing
/// even when their branches share a common substring, and only repetitions
/// with a minimum count of at least one are entered.
pub fn longest_literal(hir: &Hir) -> Vec<u8> {
    match hir.kind() {
        HirKind::Literal(lit) => lit.0.to_vec(),
        HirKind::Capture(cap) => longest_literal(&cap.sub),
        HirKind::Repetition(rep) if rep.min >= 1 => longest_literal(&rep.sub),
        HirKind::Concat(subs) => {
            let mut longest = Vec::new();
            for sub in subs {
                let lit = longest_literal(sub);
                if lit.len() > longest.len() {
                    longest = lit;
                }
            }
            longest
        }
        _ => Vec::new(),
    }
}
