use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CITATION_RE: Regex =
        Regex::new(r"\[Source ([0-9]+)\]").expect("citation pattern is a valid regex");
}

/// Every `[Source <n>]` marker in `text`, in order of appearance.
///
/// Integers too large for `u64` come back as `u64::MAX`, which no context can address.
pub fn extract_citations(text: &str) -> Vec<u64> {
    CITATION_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
        .collect()
}
