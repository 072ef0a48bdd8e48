//! Title normalization: reduce a noisy candidate to a product-type label.

use std::sync::OnceLock;

use regex::Regex;

fn variant_badge_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\+\d+").expect("variant badge regex is valid"))
}

fn trailing_price_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[$€][^\n]*").expect("trailing price regex is valid"))
}

/// Normalize a raw title candidate.
///
/// Drops `+N` variant badges and, on every line, anything from a currency
/// sign to the end of that line. The result is trimmed, then cut before the
/// first remaining line break. The first line keeps its trailing spaces.
pub fn normalize_title(raw: &str) -> String {
    let without_badges = variant_badge_re().replace_all(raw, "");
    let without_price = trailing_price_re().replace_all(&without_badges, "");

    let trimmed = without_price.trim();
    match trimmed.split_once('\n') {
        Some((first, _)) => first.to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_badge_and_price() {
        assert_eq!(normalize_title("Slim jeans +3\n$49.90"), "Slim jeans");
    }

    #[test]
    fn test_normalize_keeps_first_line() {
        assert_eq!(
            normalize_title("  Blazer structuré\nNouveau\nÉdition limitée "),
            "Blazer structuré"
        );
    }

    #[test]
    fn test_normalize_inline_price() {
        assert_eq!(normalize_title("Pull côtelé 39,90 $"), "Pull côtelé 39,90");
        assert_eq!(normalize_title("Chemise en lin $ 59,90"), "Chemise en lin");
        assert_eq!(normalize_title("Sac bandoulière € 49"), "Sac bandoulière");
    }

    #[test]
    fn test_normalize_is_total() {
        assert_eq!(normalize_title(""), "");
        assert_eq!(normalize_title("$ 19,90"), "");
        assert_eq!(normalize_title("+12"), "");
    }

    #[test]
    fn test_first_line_keeps_trailing_space() {
        assert_eq!(normalize_title("Top +2\nNouveau"), "Top ");
        assert_eq!(normalize_title("Jean slim +3\nNouveau"), "Jean slim ");
        assert_eq!(normalize_title("Jean slim\nNouveau"), "Jean slim");
    }

    #[test]
    fn test_price_cut_stops_at_line_end() {
        assert_eq!(normalize_title("$ 49,90\nJean slim"), "Jean slim");
        assert_eq!(normalize_title("Chino $ 49,90\nNouveau"), "Chino ");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_title("Veste matelassée +2\n$ 129,00");
        assert_eq!(normalize_title(&once), once);
    }
}
