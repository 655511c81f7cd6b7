//! Six-character invite codes that resolve to a trip.
//!
//! The alphabet leaves out `0`, `O`, `1` and `I` so codes survive being read
//! aloud or copied from a screenshot.

use uuid::Uuid;

pub const CODE_LEN: usize = 6;
pub const ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub fn generate() -> String {
    // 32 divides 256, so taking bytes modulo the alphabet length stays uniform.
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(CODE_LEN)
        .map(|byte| ALPHABET[usize::from(*byte) % ALPHABET.len()] as char)
        .collect()
}

/// Canonical form used for lookups: trimmed and uppercased.
pub fn normalize(input: &str) -> String {
    input.trim().to_uppercase()
}

pub fn is_valid(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_uppercase_alphanumerics() {
        for _ in 0..200 {
            let code = generate();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
            assert!(is_valid(&code));
        }
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize("  ab3kq9 \n"), "AB3KQ9");
    }

    #[test]
    fn lookalike_characters_are_rejected() {
        assert!(!is_valid("ABC0EF"));
        assert!(!is_valid("ABCDE"));
        assert!(!is_valid("abcdef"));
    }
}
