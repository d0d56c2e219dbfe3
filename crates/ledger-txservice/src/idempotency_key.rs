//! Idempotency-key construction (§4.4): stable across re-ingest of the
//! same file, because it is derived entirely from the file's content
//! hash and the row's position and natural identity, never from a
//! database-assigned id.

/// Builds `"{kind}:{file_hash[:8]}:{row_idx}:{natural_id}"`, e.g.
/// `stock:ab12cd34:17:AAPL:2024-03-15:100:BUY`.
pub fn build(kind: &str, file_hash: &str, row_idx: usize, natural_id: &str) -> String {
    let short_hash: String = file_hash.chars().take(8).collect();
    format!("{kind}:{short_hash}:{row_idx}:{natural_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_the_hash_to_eight_characters() {
        let key = build("stock", "ab12cd34ef567890", 17, "AAPL:2024-03-15:100:BUY");
        assert_eq!(key, "stock:ab12cd34:17:AAPL:2024-03-15:100:BUY");
    }

    #[test]
    fn short_hashes_pass_through_unchanged() {
        let key = build("mf", "short", 0, "F1:SCHEME");
        assert_eq!(key, "mf:short:0:F1:SCHEME");
    }
}
