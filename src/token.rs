use rand::Rng;

/// Length of an auth token key: 20 random bytes, hex-encoded.
pub const TOKEN_LEN: usize = 40;

/// Generate a fresh opaque auth token key.
pub fn generate_token() -> String {
    let bytes: [u8; 20] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Validate that a string has the shape of an auth token key (40 lowercase hex chars).
pub fn is_valid_token(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
