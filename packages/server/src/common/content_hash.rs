use sha2::{Digest, Sha256};

/// Hash of normalized post text, used as an exact-duplicate fast path before
/// the vector similarity query.
///
/// Normalization: lowercase, strip non-alphanumeric characters (spaces kept),
/// collapse runs of whitespace, trim. Two posts that differ only in casing,
/// punctuation, or spacing therefore hash identically.
pub fn content_hash(text: &str) -> String {
    let normalized = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_case_are_ignored() {
        let a = content_hash("Thoughtful essay about consensus algorithms.");
        let b = content_hash("thoughtful essay about CONSENSUS algorithms");
        assert_eq!(a, b);
    }

    #[test]
    fn whitespace_is_collapsed() {
        let a = content_hash("  a   brand new   post ");
        let b = content_hash("a brand new post");
        assert_eq!(a, b);
    }

    #[test]
    fn different_content_differs() {
        assert_ne!(content_hash("first post"), content_hash("second post"));
    }

    #[test]
    fn output_is_sha256_hex() {
        let hash = content_hash("anything");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
