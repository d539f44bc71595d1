//! Opaque token generation.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Tokens are 256 characters from the 62-symbol alphanumeric alphabet,
/// roughly 1523 bits of entropy. They carry no structure; equality is exact
/// string match.
pub(crate) const TOKEN_LENGTH: usize = 256;

pub(crate) fn random_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Mint a token that does not collide with any currently-issued token of the
/// same kind, as reported by `in_use`.
pub(crate) fn unique_token<F>(mut in_use: F) -> String
where
    F: FnMut(&str) -> bool,
{
    loop {
        let token = random_token();
        if !in_use(&token) {
            return token;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_fixed_length_ascii() {
        let token = random_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn unique_token_skips_taken_values() {
        let taken = random_token();
        let mut asked = 0;
        let token = unique_token(|candidate| {
            asked += 1;
            candidate == taken
        });
        assert_ne!(token, taken);
        assert!(asked >= 1);
    }
}
