use sha2::{Digest, Sha256};

/// Cross-source identity hash: `sha256(title|event_date)`. Unique globally
/// across `events` (§3) — first insert wins, later inserts are duplicates.
pub fn content_hash(title: &str, event_date: &str) -> String {
    hex_sha256(&format!("{title}|{event_date}"))
}

/// Per-source identity hash: `sha256(title|event_date|source_id)`. Unique
/// scoped to `source_id`.
pub fn event_fingerprint(title: &str, event_date: &str, source_id: uuid::Uuid) -> String {
    hex_sha256(&format!("{title}|{event_date}|{source_id}"))
}

fn hex_sha256(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fast, process-restart-stable change-detection hash (FNV-1a). Used for
/// "did this page's bytes change since last poll" checks where cryptographic
/// strength isn't needed — `DefaultHasher` is unsuitable since its seed is
/// randomized per process.
pub fn fast_hash(content: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in content.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// lowercase, trim, collapse internal whitespace — the normalization every
/// title comparison in the dedup ladder and fingerprinting relies on.
pub fn normalize_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(
            content_hash("Jazz in Park", "2026-07-01"),
            content_hash("Jazz in Park", "2026-07-01")
        );
    }

    #[test]
    fn content_hash_ignores_source() {
        let a = content_hash("Jazz in Park", "2026-07-01");
        let b = event_fingerprint("Jazz in Park", "2026-07-01", uuid::Uuid::nil());
        assert_ne!(a, b, "content_hash and fingerprint must differ");
    }

    #[test]
    fn fingerprint_scoped_by_source() {
        let s1 = uuid::Uuid::new_v4();
        let s2 = uuid::Uuid::new_v4();
        let a = event_fingerprint("Same Title", "2026-07-01", s1);
        let b = event_fingerprint("Same Title", "2026-07-01", s2);
        assert_ne!(a, b);
    }

    #[test]
    fn normalize_title_collapses_whitespace_and_case() {
        assert_eq!(normalize_title("  Jazz   in   Park  "), "jazz in park");
        assert_eq!(normalize_title("JAZZ IN PARK"), "jazz in park");
    }

    #[test]
    fn fast_hash_stable_for_same_input() {
        assert_eq!(fast_hash("abc"), fast_hash("abc"));
        assert_ne!(fast_hash("abc"), fast_hash("abd"));
    }
}
