use chrono::{DateTime, Utc};

/// Which rung caught the duplicate (§4.5). Priority is strict: content hash
/// first, then fingerprint, then semantic — a caller that has a content-hash
/// hit never needs to run the embedding lookup at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    ContentHash,
    Fingerprint,
    Semantic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupVerdict {
    Admit,
    Duplicate(DuplicateKind),
}

/// Pure decision over the three rung lookups (§4.5.1). The caller does the
/// three DB round trips (skipping later ones once an earlier rung already
/// hit) and hands the booleans here.
pub fn dedup_verdict(content_hash_hit: bool, fingerprint_hit: bool, semantic_hit: bool) -> DedupVerdict {
    if content_hash_hit {
        DedupVerdict::Duplicate(DuplicateKind::ContentHash)
    } else if fingerprint_hit {
        DedupVerdict::Duplicate(DuplicateKind::Fingerprint)
    } else if semantic_hit {
        DedupVerdict::Duplicate(DuplicateKind::Semantic)
    } else {
        DedupVerdict::Admit
    }
}

/// Rung 3 (§4.5 step 3): the ANN query already applies the cosine-distance
/// cutoff, so this only has to check the nearest candidate's `event_date`
/// falls within the 24h window of the new event.
pub fn semantic_match(candidate_date: DateTime<Utc>, event_date: DateTime<Utc>) -> bool {
    (candidate_date - event_date).num_hours().abs() <= 24
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn content_hash_wins_over_everything() {
        assert_eq!(dedup_verdict(true, true, true), DedupVerdict::Duplicate(DuplicateKind::ContentHash));
        assert_eq!(dedup_verdict(true, false, false), DedupVerdict::Duplicate(DuplicateKind::ContentHash));
    }

    #[test]
    fn fingerprint_wins_over_semantic() {
        assert_eq!(dedup_verdict(false, true, true), DedupVerdict::Duplicate(DuplicateKind::Fingerprint));
        assert_eq!(dedup_verdict(false, true, false), DedupVerdict::Duplicate(DuplicateKind::Fingerprint));
    }

    #[test]
    fn semantic_only_hit() {
        assert_eq!(dedup_verdict(false, false, true), DedupVerdict::Duplicate(DuplicateKind::Semantic));
    }

    #[test]
    fn no_hits_admits() {
        assert_eq!(dedup_verdict(false, false, false), DedupVerdict::Admit);
    }

    #[test]
    fn semantic_window_boundary_24h_is_duplicate() {
        let base = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let within = base + Duration::hours(24);
        let just_over = base + Duration::hours(25);
        assert!(semantic_match(within, base));
        assert!(!semantic_match(just_over, base));
    }

    #[test]
    fn semantic_window_symmetric_for_earlier_candidates() {
        let base = DateTime::<Utc>::from_timestamp(100_000, 0).unwrap();
        let earlier = base - Duration::hours(12);
        assert!(semantic_match(earlier, base));
    }
}
