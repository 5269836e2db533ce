use sha2::{Digest, Sha256};

/// Normalized-text digest used for question deduplication.
/// Case and whitespace runs do not affect the result.
pub fn signature_of_text(text: &str) -> String {
    let normalized = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    hex::encode(Sha256::digest(normalized.as_bytes()))
}
