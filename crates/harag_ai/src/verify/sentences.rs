use unicode_segmentation::UnicodeSegmentation;

// Lowercased, without the final period. A period after one of these does not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "approx", "dept", "dr", "e.g", "etc", "fig", "i.e", "jr", "mr", "mrs", "ms", "mt", "prof", "sr", "st", "vs",
];

/// Split text into trimmed sentences.
///
/// Boundaries come from Unicode sentence segmentation, except that a period after a known
/// abbreviation (`Dr.`, `etc.`) or a capital initial (`J.`) does not close the sentence.
/// Whitespace-only segments are dropped; punctuation-only segments are kept.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, segment) in text.split_sentence_bound_indices() {
        if segment.trim().is_empty() {
            continue;
        }
        let from = *start.get_or_insert(idx);
        let candidate = text[from..idx + segment.len()].trim();
        if ends_with_abbreviation(candidate) {
            continue;
        }
        out.push(candidate.to_string());
        start = None;
    }

    if let Some(from) = start {
        let rest = text[from..].trim();
        if !rest.is_empty() {
            out.push(rest.to_string());
        }
    }
    out
}

fn ends_with_abbreviation(segment: &str) -> bool {
    let Some(last) = segment.split_whitespace().last() else {
        return false;
    };
    let Some(stem) = last.strip_suffix('.') else {
        return false;
    };
    let stem = stem.trim_start_matches(|c: char| !c.is_alphanumeric());

    let mut chars = stem.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return c.is_uppercase();
    }
    ABBREVIATIONS.contains(&stem.to_lowercase().as_str())
}
