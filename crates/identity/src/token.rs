//! Random hex tokens

use contracts::Token;
use rand::RngCore;

/// Entropy of correlation and trace ids
pub const CORRELATION_TOKEN_BYTES: usize = 16;

/// Entropy of record ids (and therefore span ids)
pub const RECORD_TOKEN_BYTES: usize = 8;

/// `len` random bytes from the thread-local CSPRNG, hex-encoded
pub fn random_token(len: usize) -> Token {
    let mut buf = vec![0u8; len];
    rand::rng().fill_bytes(&mut buf);
    Token::from(hex::encode(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length_is_twice_byte_count() {
        assert_eq!(random_token(CORRELATION_TOKEN_BYTES).len(), 32);
        assert_eq!(random_token(RECORD_TOKEN_BYTES).len(), 16);
    }

    #[test]
    fn test_token_is_lowercase_hex() {
        let token = random_token(16);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
