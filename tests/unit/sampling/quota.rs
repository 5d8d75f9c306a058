//! Tests for the per-class quota boundary

#[cfg(test)]
mod tests {
    use patchsampler::MaxPerClass;
    use patchsampler::sampling::quota::QuotaTracker;

    // Tests an unbounded class never stops early
    // Verified by treating All as a limit of zero
    #[test]
    fn test_unbounded_quota_is_never_reached() {
        let mut quota = QuotaTracker::new(MaxPerClass::All);

        for _ in 0..1000 {
            quota.record(true);
            assert!(!quota.is_reached());
        }
        assert_eq!(quota.accepted(), 1000);
    }

    // Tests a limit of 3 stops after 2 accepted patches
    // Verified by comparing against the limit itself
    #[test]
    fn test_limit_stops_one_below_the_cap() {
        let mut quota = QuotaTracker::new(MaxPerClass::Limit(3));

        quota.record(true);
        assert!(!quota.is_reached());
        quota.record(true);
        assert!(quota.is_reached());
        assert_eq!(quota.accepted(), 2);
    }

    // Tests rejected seeds do not advance the quota
    // Verified by counting every evaluated seed
    #[test]
    fn test_rejections_do_not_count() {
        let mut quota = QuotaTracker::new(MaxPerClass::Limit(3));

        for _ in 0..10 {
            quota.record(false);
        }
        assert!(!quota.is_reached());
        assert_eq!(quota.accepted(), 0);
    }

    // Tests a limit of 1 is reached before any patch is accepted
    // Verified by saturating at one instead of zero
    #[test]
    fn test_limit_of_one_is_reached_immediately() {
        let quota = QuotaTracker::new(MaxPerClass::Limit(1));

        assert!(quota.is_reached());
    }
}
