use lazy_static::lazy_static;
use regex::Regex;

/// Rule-based and statistical gibberish detection.
///
/// Checks run in order; the first positive signal fails the text and its
/// reason is returned. The external ML classifier is layered on top by the
/// validator and is deliberately absent here so this module stays pure.

const VOWELS: &str = "aeiou";

/// Letter ratio at or above which a text is considered a consonant run.
const CONSONANT_RATIO_THRESHOLD: f64 = 0.85;

/// Vowel ratio below which longer texts are rejected.
const VOWEL_RATIO_THRESHOLD: f64 = 0.1;

/// Mean token length at or above which a text is statistically implausible.
const MEAN_TOKEN_LENGTH_THRESHOLD: f64 = 20.0;

/// Fraction of vowel-free tokens above which a text is rejected.
const VOWELLESS_TOKEN_FRACTION: f64 = 0.7;

/// Plausible character-frequency entropy range (bits) for natural language.
const ENTROPY_RANGE: (f64, f64) = (2.0, 4.75);

lazy_static! {
    // Keyboard-row walks and trivially mashed sequences, both directions
    static ref KEYBOARD_PATTERNS: Regex = Regex::new(
        r"(?i)qwerty|ytrewq|asdf|fdsa|zxcv|vcxz|qazwsx|wsxedc|rfvtgb|yhnujm|abcdef|123456|aaaaaa|xxxxxx|zzzzz"
    ).unwrap();
}

/// Run all checks against `text`. Returns the failure reason, or `None` for
/// clean text.
pub fn detect(text: &str) -> Option<&'static str> {
    let cleaned = text.trim().to_lowercase();

    if let Some(reason) = rule_based_check(&cleaned) {
        return Some(reason);
    }
    statistical_check(&cleaned)
}

fn rule_based_check(text: &str) -> Option<&'static str> {
    if text.len() < 3 {
        return Some("content too short");
    }

    let distinct: std::collections::HashSet<char> =
        text.chars().filter(|c| !c.is_whitespace()).collect();
    if distinct.len() < 3 {
        return Some("repeated characters");
    }

    if KEYBOARD_PATTERNS.is_match(text) {
        return Some("keyboard pattern");
    }

    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        // No letters at all; leave the verdict to the statistical pass
        return None;
    }

    let vowel_count = letters.iter().filter(|c| VOWELS.contains(**c)).count();
    let vowel_ratio = vowel_count as f64 / letters.len() as f64;
    let consonant_ratio = 1.0 - vowel_ratio;

    if consonant_ratio >= CONSONANT_RATIO_THRESHOLD {
        return Some("excessive consonants");
    }
    if vowel_ratio < VOWEL_RATIO_THRESHOLD && letters.len() > 8 {
        return Some("too few vowels");
    }

    None
}

fn statistical_check(text: &str) -> Option<&'static str> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    // Too little signal for statistics
    if tokens.len() < 3 {
        return None;
    }

    let word_tokens: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| t.chars().any(|c| c.is_alphabetic()))
        .collect();

    if !word_tokens.is_empty() {
        let mean_length = word_tokens.iter().map(|t| t.len()).sum::<usize>() as f64
            / word_tokens.len() as f64;
        if mean_length >= MEAN_TOKEN_LENGTH_THRESHOLD {
            return Some("implausible word length");
        }

        let vowelless = word_tokens
            .iter()
            .filter(|t| !t.chars().any(|c| VOWELS.contains(c)))
            .count();
        if vowelless as f64 / word_tokens.len() as f64 > VOWELLESS_TOKEN_FRACTION {
            return Some("vowel-free words");
        }
    }

    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() >= 20 {
        let entropy = char_entropy(&letters);
        if entropy < ENTROPY_RANGE.0 || entropy > ENTROPY_RANGE.1 {
            return Some("implausible character distribution");
        }
    }

    None
}

/// Shannon entropy (bits) of the letter-frequency distribution.
fn char_entropy(letters: &[char]) -> f64 {
    let mut counts = std::collections::HashMap::new();
    for c in letters {
        *counts.entry(*c).or_insert(0usize) += 1;
    }

    let total = letters.len() as f64;
    counts
        .values()
        .map(|count| {
            let p = *count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_mash_is_rejected() {
        assert_eq!(detect("asdfghjkl qwerty zxcvbn"), Some("keyboard pattern"));
    }

    #[test]
    fn short_text_is_rejected() {
        assert_eq!(detect("hi"), Some("content too short"));
        assert_eq!(detect("  a  "), Some("content too short"));
    }

    #[test]
    fn repeated_characters_are_rejected() {
        assert_eq!(detect("ababababab"), Some("repeated characters"));
    }

    #[test]
    fn consonant_runs_are_rejected() {
        assert_eq!(detect("bcdfg hjklm npqrs"), Some("excessive consonants"));
    }

    #[test]
    fn vowel_free_words_are_rejected() {
        // Enough vowels overall to pass the ratio rules, but three of the
        // four words have none at all.
        assert_eq!(detect("aeiaoe brz klm vst"), Some("vowel-free words"));
    }

    #[test]
    fn implausible_word_length_is_rejected() {
        let text = "pneumonoultramicroscopicsil anotherabsurdlylongtokenhere athirdevenlongerimpossibleword";
        assert_eq!(detect(text), Some("implausible word length"));
    }

    #[test]
    fn uniform_letter_soup_fails_entropy() {
        // Plenty of letters, vowels sprinkled in, but only four distinct
        // characters: entropy collapses below the natural-language floor.
        let text = "eaes asee seaa esas aese ssea aees";
        assert_eq!(detect(text), Some("implausible character distribution"));
    }

    #[test]
    fn ordinary_prose_passes() {
        for text in [
            "Thoughtful essay about consensus algorithms.",
            "Just returned from a breathtaking trip to the coast. The deep blue of the ocean was mesmerizing.",
            "This is a valid post with an image",
            "a tree",
        ] {
            assert_eq!(detect(text), None, "rejected: {}", text);
        }
    }

    #[test]
    fn case_is_irrelevant() {
        assert_eq!(detect("ASDFGHJKL QWERTY"), Some("keyboard pattern"));
    }
}
