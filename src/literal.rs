use regex_syntax::hir::literal::{ExtractKind, Extractor};

/// Prefix literals every match of `pattern` must start with, lowercased, for
/// use as Aho-Corasick prefilter needles.
///
/// Returns `None` when the rule cannot be prefiltered and must always be
/// tried: the pattern does not parse with `regex_syntax` (lookaround and
/// other fancy-regex-only syntax), the literal set is infinite, or any
/// literal is shorter than `min_len` (dropping it would make the filter
/// reject inputs the regex accepts).
pub(crate) fn required_prefixes(pattern: &str, min_len: usize) -> Option<Vec<String>> {
    let hir = regex_syntax::parse(pattern).ok()?;

    let mut extractor = Extractor::new();
    extractor.kind(ExtractKind::Prefix);
    let seq = extractor.extract(&hir);

    let literals = seq.literals()?;
    if literals.is_empty() {
        return None;
    }

    let mut out = Vec::with_capacity(literals.len());
    for lit in literals {
        let s = std::str::from_utf8(lit.as_bytes()).ok()?;
        if s.len() < min_len {
            return None;
        }
        let lower = s.to_lowercase();
        if !out.contains(&lower) {
            out.push(lower);
        }
    }
    Some(out)
}
