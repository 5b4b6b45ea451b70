//! Approximate closest-match index over character n-grams.
//!
//! Candidates are indexed by their 2- and 3-character n-gram bags; a query
//! matches the candidate sharing the most n-grams. Candidates are expected
//! to be pre-normalized (see `normalize`).

use std::collections::HashSet;

const GRAM_SIZES: [usize; 2] = [2, 3];

pub struct ClosestMatcher {
    candidates: Vec<(String, HashSet<String>)>,
}

impl ClosestMatcher {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates = candidates
            .into_iter()
            .map(Into::into)
            .filter(|c| !c.is_empty())
            .map(|c| {
                let grams = ngrams(&c);
                (c, grams)
            })
            .collect();
        Self { candidates }
    }

    /// Candidate sharing the most n-grams with the query, if any overlap at
    /// all. Earlier candidates win ties.
    pub fn closest(&self, query: &str) -> Option<&str> {
        let query_grams = ngrams(query);
        let mut best: Option<(&str, usize)> = None;
        for (candidate, grams) in &self.candidates {
            let shared = grams.intersection(&query_grams).count();
            if shared == 0 {
                continue;
            }
            match best {
                Some((_, count)) if count >= shared => {}
                _ => best = Some((candidate, shared)),
            }
        }
        best.map(|(candidate, _)| candidate)
    }
}

fn ngrams(text: &str) -> HashSet<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut grams = HashSet::new();
    for size in GRAM_SIZES {
        if chars.len() < size {
            continue;
        }
        for window in chars.windows(size) {
            grams.insert(window.iter().collect());
        }
    }
    grams
}

/// Normalized Levenshtein similarity in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(a, b);
    1.0 - distance as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_finds_the_contained_province() {
        let matcher = ClosestMatcher::new(["vung tau", "da lat", "ha noi"]);
        assert_eq!(matcher.closest("khach san 4 sao vung tau"), Some("vung tau"));
        assert_eq!(matcher.closest("homestay da lat gia re"), Some("da lat"));
    }

    #[test]
    fn no_overlap_yields_none() {
        let matcher = ClosestMatcher::new(["vung tau"]);
        assert_eq!(matcher.closest("xyz"), None);
    }

    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity("", ""), 1.0);
        assert!(similarity("ho boi", "ho boi") > 0.99);
        assert!(similarity("ho boi", "bai do xe") < 0.5);
    }
}
