/// Locate all occurrences of `needle` within `haystack`.
///
/// Positions are 1-based and inclusive. Scanning is left-to-right and the
/// anchor advances one past the *start* of each hit, not past the whole
/// match, so overlapping occurrences at distinct offsets are all reported.
///
/// An empty needle, or one longer than the haystack, yields no occurrences.
/// No case normalization is performed; sequences are expected to be
/// pre-uppercased single-letter codes.
pub fn find_occurrences(needle: &str, haystack: &str) -> Vec<(u32, u32)> {
    let mut hits = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return hits;
    }
    let mut anchor = 0;
    while let Some(idx) = haystack[anchor..].find(needle) {
        let start = anchor + idx;
        hits.push((start as u32 + 1, (start + needle.len()) as u32));
        anchor = start + 1;
    }
    hits
}
