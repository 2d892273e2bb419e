/// Age after which a cached series must be refreshed (24h).
pub const STALE_THRESHOLD_MS: u64 = 86_400_000;

/// `true` when a series refreshed at `last_refreshed_ms` may still be served
/// at `now_ms`. A zero stamp means "never refreshed" and is always stale.
pub fn is_fresh(last_refreshed_ms: u64, now_ms: u64) -> bool {
    last_refreshed_ms != 0 && now_ms.saturating_sub(last_refreshed_ms) <= STALE_THRESHOLD_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const T: u64 = 1_700_000_000_000;

    #[test]
    fn boundary_is_exactly_one_day() {
        assert!(is_fresh(T, T + 86_399_999));
        assert!(is_fresh(T, T + 86_400_000));
        assert!(!is_fresh(T, T + 86_400_001));
    }

    #[test]
    fn same_instant_is_fresh() {
        assert!(is_fresh(T, T));
    }

    #[test]
    fn clock_behind_stamp_counts_as_fresh() {
        assert!(is_fresh(T, T - 1_000));
    }

    proptest! {
        #[test]
        fn never_refreshed_is_always_stale(now in any::<u64>()) {
            prop_assert!(!is_fresh(0, now));
        }

        #[test]
        fn fresh_within_window(last in 1u64..=u64::MAX / 2, age in 0u64..=STALE_THRESHOLD_MS) {
            prop_assert!(is_fresh(last, last + age));
        }

        #[test]
        fn stale_past_window(last in 1u64..=u64::MAX / 2, extra in 1u64..=1_000_000_000_000) {
            prop_assert!(!is_fresh(last, last + STALE_THRESHOLD_MS + extra));
        }
    }
}
