//! Challenge message template

/// Fixed text preceding the nonce in every challenge
pub const CHALLENGE_PREFIX: &str = "Sign this message to verify your wallet ownership: ";

/// Render the message a wallet must sign for `nonce`
pub fn build_message(nonce: &str) -> String {
    format!("{}{}", CHALLENGE_PREFIX, nonce)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_message() {
        assert_eq!(
            build_message("n1"),
            "Sign this message to verify your wallet ownership: n1"
        );
    }

    #[test]
    fn test_build_message_is_exact() {
        let message = build_message("abc");
        assert_ne!(message, build_message("abd"));
        assert_ne!(message, format!("{} ", message));
        assert_ne!(message, format!("abc {}", CHALLENGE_PREFIX.trim_end()));
    }
}
