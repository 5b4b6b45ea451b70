//! Text normalization for fuzzy matching.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Trim, strip diacritics and lowercase.
///
/// NFD decomposition separates combining marks so they can be dropped;
/// `đ`/`Đ` do not decompose and are mapped by hand.
pub fn normalize(input: &str) -> String {
    input
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            c => c,
        })
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_vietnamese_diacritics() {
        assert_eq!(normalize("Vũng Tàu"), "vung tau");
        assert_eq!(normalize("  Đà Lạt  "), "da lat");
        assert_eq!(normalize("khách sạn"), "khach san");
    }

    #[test]
    fn plain_ascii_is_folded_only() {
        assert_eq!(normalize("Sea View Hotel"), "sea view hotel");
    }
}
